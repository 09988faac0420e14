//! Slots derivation by derangement. Given a `top` color grid, produces a
//! `slots` grid with the same occupancy mask and per-color histogram in
//! which no occupied cell keeps its top color.

use crate::error::{InfeasibleReason, PsldError, Result};
use crate::grid::{Cell, ColorGrid, ColorIndex, Grid, Position};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotsMode {
    /// Debugging mode: copies top verbatim. Every occupied cell matches.
    Same,
    /// Cyclic shift of the scan-order color sequence, chosen to minimize
    /// (not necessarily eliminate) same-cell matches.
    Rotate,
    /// Transportation-flow derangement: the primary mode, guaranteeing zero
    /// same-cell matches whenever no color exceeds half the occupied cells.
    Derangement,
}

/// A minimal Dinic's max-flow graph over small integer node counts, as used
/// by the derangement transportation problem. Edges are stored in pairs so
/// that `rev(e) = e ^ 1` gives the reverse edge.
struct Dinic {
    to: Vec<usize>,
    cap: Vec<i64>,
    head: Vec<Vec<usize>>,
}

impl Dinic {
    fn new(n: usize) -> Dinic {
        Dinic {
            to: Vec::new(),
            cap: Vec::new(),
            head: vec![Vec::new(); n],
        }
    }

    fn add_edge(&mut self, from: usize, to: usize, cap: i64) -> usize {
        let e = self.to.len();
        self.to.push(to);
        self.cap.push(cap);
        self.head[from].push(e);
        self.to.push(from);
        self.cap.push(0);
        self.head[to].push(e + 1);
        e
    }

    fn bfs_levels(&self, source: usize, sink: usize) -> Option<Vec<i32>> {
        let mut level = vec![-1; self.head.len()];
        level[source] = 0;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &e in &self.head[u] {
                let v = self.to[e];
                if self.cap[e] > 0 && level[v] < 0 {
                    level[v] = level[u] + 1;
                    queue.push_back(v);
                }
            }
        }
        if level[sink] < 0 {
            None
        } else {
            Some(level)
        }
    }

    fn dfs_blocking(
        &mut self,
        u: usize,
        sink: usize,
        pushed: i64,
        level: &[i32],
        iter: &mut [usize],
    ) -> i64 {
        if u == sink || pushed == 0 {
            return pushed;
        }
        while iter[u] < self.head[u].len() {
            let e = self.head[u][iter[u]];
            let v = self.to[e];
            if self.cap[e] > 0 && level[v] == level[u] + 1 {
                let d = self.dfs_blocking(v, sink, pushed.min(self.cap[e]), level, iter);
                if d > 0 {
                    self.cap[e] -= d;
                    self.cap[e ^ 1] += d;
                    return d;
                }
            }
            iter[u] += 1;
        }
        0
    }

    fn max_flow(&mut self, source: usize, sink: usize) -> i64 {
        let mut flow = 0i64;
        while let Some(level) = self.bfs_levels(source, sink) {
            let mut iter = vec![0usize; self.head.len()];
            loop {
                let pushed = self.dfs_blocking(source, sink, i64::MAX, &level, &mut iter);
                if pushed == 0 {
                    break;
                }
                flow += pushed;
            }
        }
        flow
    }

    /// Flow actually carried on the forward edge returned by `add_edge`.
    fn edge_flow(&self, forward_edge: usize, original_cap: i64) -> i64 {
        original_cap - self.cap[forward_edge]
    }
}

fn cells_by_color(top: &ColorGrid) -> BTreeMap<ColorIndex, Vec<Position>> {
    let mut by_color: BTreeMap<ColorIndex, Vec<Position>> = BTreeMap::new();
    for p in top.iter_positions() {
        if let Some(c) = *top.get(p.x, p.y) {
            by_color.entry(c).or_default().push(p);
        }
    }
    by_color
}

fn derive_same(top: &ColorGrid) -> ColorGrid {
    top.clone()
}

fn derive_rotate(top: &ColorGrid) -> ColorGrid {
    let mut positions = Vec::new();
    let mut vals = Vec::new();
    for p in top.iter_positions() {
        if let Some(c) = *top.get(p.x, p.y) {
            positions.push(p);
            vals.push(c);
        }
    }
    let n = vals.len();
    let mut out = top.clone();
    if n >= 2 {
        let mut best_k = 1usize;
        let mut best_matches = usize::MAX;
        for k in 1..n {
            let matches = (0..n).filter(|&i| vals[i] == vals[(i + k) % n]).count();
            if matches < best_matches {
                best_matches = matches;
                best_k = k;
            }
        }
        for (i, p) in positions.iter().enumerate() {
            out.set(p.x, p.y, Some(vals[(i + best_k) % n]));
        }
    }
    out
}

fn derive_derangement(top: &ColorGrid) -> Result<ColorGrid> {
    let by_color = cells_by_color(top);
    let colors: Vec<ColorIndex> = by_color.keys().copied().collect();
    let k = colors.len();
    let n: usize = by_color.values().map(|v| v.len()).sum();

    log::debug!(
        "derive_slots(derangement): {} colors, {} occupied cells",
        k,
        n
    );

    if n == 0 {
        return Ok(top.clone());
    }
    if k == 1 {
        return Err(PsldError::Infeasible(InfeasibleReason::SingleColor));
    }

    let counts: Vec<usize> = colors.iter().map(|c| by_color[c].len()).collect();
    if let Some((i, &count)) = counts.iter().enumerate().find(|(_, &c)| 2 * c > n) {
        return Err(PsldError::Infeasible(InfeasibleReason::DominantColor {
            color: colors[i],
            count,
            total: n,
        }));
    }

    // Node layout: source=0, group[i]=1+i, assigned[j]=1+k+j, sink=1+2k.
    let source = 0;
    let sink = 1 + 2 * k;
    let group = |i: usize| 1 + i;
    let assigned = |j: usize| 1 + k + j;
    let mut dinic = Dinic::new(2 + 2 * k);

    let mut source_edges = Vec::with_capacity(k);
    for i in 0..k {
        source_edges.push((dinic.add_edge(source, group(i), counts[i] as i64), counts[i] as i64));
    }
    let mut sink_edges = Vec::with_capacity(k);
    for j in 0..k {
        sink_edges.push((dinic.add_edge(assigned(j), sink, counts[j] as i64), counts[j] as i64));
    }
    let mut mid_edges = vec![vec![None; k]; k];
    for i in 0..k {
        for j in 0..k {
            if i != j {
                let cap = n as i64;
                mid_edges[i][j] = Some((dinic.add_edge(group(i), assigned(j), cap), cap));
            }
        }
    }

    let flow = dinic.max_flow(source, sink);
    log::trace!("derive_slots(derangement): dinic max flow = {flow} (target {n})");

    if (flow as usize) < n {
        return Err(PsldError::internal(
            "flow failed to saturate despite no dominant color; this should be unreachable",
        ));
    }

    let mut out = top.clone();
    for (i, &color_i) in colors.iter().enumerate() {
        let cells_i = &by_color[&color_i];
        let mut cursor = 0usize;
        for (j, &color_j) in colors.iter().enumerate() {
            if i == j {
                continue;
            }
            let (edge, cap) = mid_edges[i][j].unwrap();
            let amount = dinic.edge_flow(edge, cap) as usize;
            for p in &cells_i[cursor..cursor + amount] {
                out.set(p.x, p.y, Some(color_j));
            }
            cursor += amount;
        }
        if cursor != cells_i.len() {
            return Err(PsldError::internal(format!(
                "flow assignment for color {color_i} covered {cursor}/{} cells",
                cells_i.len()
            )));
        }
    }

    for p in top.iter_positions() {
        let t: Cell = *top.get(p.x, p.y);
        let s: Cell = *out.get(p.x, p.y);
        if t.is_some() && t == s {
            return Err(PsldError::internal(format!(
                "derangement post-condition violated at ({}, {})",
                p.x, p.y
            )));
        }
    }

    Ok(out)
}

/// Derives a `slots` grid from `top` under the requested mode. See
/// [`SlotsMode`] for the guarantees each mode makes.
pub fn derive_slots(top: &ColorGrid, mode: SlotsMode) -> Result<ColorGrid> {
    match mode {
        SlotsMode::Same => Ok(derive_same(top)),
        SlotsMode::Rotate => Ok(derive_rotate(top)),
        SlotsMode::Derangement => derive_derangement(top),
    }
}

fn histogram(grid: &ColorGrid) -> BTreeMap<ColorIndex, usize> {
    let mut h = BTreeMap::new();
    for p in grid.iter_positions() {
        if let Some(c) = *grid.get(p.x, p.y) {
            *h.entry(c).or_insert(0) += 1;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cg(rows: Vec<Vec<Cell>>) -> ColorGrid {
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn rotate_preserves_histogram_and_reduces_matches() {
        let top = cg(vec![vec![Some(0), Some(0), Some(1)], vec![Some(1), None, Some(2)]]);
        let slots = derive_slots(&top, SlotsMode::Rotate).unwrap();
        assert_eq!(histogram(&top), histogram(&slots));
        assert_eq!(slots.mask(), top.mask());

        let matches = top
            .iter_positions()
            .filter(|p| {
                let t = *top.get(p.x, p.y);
                t.is_some() && t == *slots.get(p.x, p.y)
            })
            .count();
        assert!(matches < 5);
    }

    #[test]
    fn derangement_feasible_has_zero_matches() {
        // `RUST_LOG=debug` surfaces the `log::debug!`/`log::trace!` lines
        // this solve emits; `try_init` so running the whole suite doesn't
        // panic on a second logger registration.
        let _ = env_logger::try_init();
        let top = cg(vec![
            vec![Some(0), Some(0), Some(1), Some(1)],
            vec![Some(2), Some(2), Some(3), Some(3)],
        ]);
        let slots = derive_slots(&top, SlotsMode::Derangement).unwrap();
        assert_eq!(histogram(&top), histogram(&slots));
        assert_eq!(slots.mask(), top.mask());
        for p in top.iter_positions() {
            let t = *top.get(p.x, p.y);
            let s = *slots.get(p.x, p.y);
            if t.is_some() {
                assert_ne!(t, s, "cell ({}, {}) kept its top color", p.x, p.y);
            }
        }
    }

    #[test]
    fn derangement_infeasible_reports_dominant_color() {
        let top = cg(vec![
            vec![Some(0), Some(0), Some(0), Some(0)],
            vec![Some(0), Some(0), Some(0), Some(1)],
        ]);
        let err = derive_slots(&top, SlotsMode::Derangement).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("dominant color"), "unexpected message: {msg}");
    }

    #[test]
    fn single_color_derangement_is_infeasible() {
        let top = cg(vec![vec![Some(0), Some(0)], vec![Some(0), None]]);
        assert!(matches!(
            derive_slots(&top, SlotsMode::Derangement).unwrap_err(),
            PsldError::Infeasible(InfeasibleReason::SingleColor)
        ));
    }

    #[test]
    fn same_mode_copies_verbatim() {
        let top = cg(vec![vec![Some(0), None], vec![Some(1), Some(2)]]);
        let slots = derive_slots(&top, SlotsMode::Same).unwrap();
        assert_eq!(slots, top);
    }
}
