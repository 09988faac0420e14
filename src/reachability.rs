//! Lane-reachability ordering. Produces a deterministic removal order in
//! which every step removes a cell that is currently "exposed" — the
//! extremal occupied cell of its row or column — and the inverse
//! construction order this certifies.

use crate::error::{PsldError, Result};
use crate::grid::{Mask, Position};
use std::collections::HashSet;

/// For each occupied cell, the Manhattan distance along the mask to the
/// nearest empty cell or grid boundary in the four cardinal directions
/// (the minimum over all four). Computed once from the original mask;
/// lower depth means closer to the shape's exterior in some direction.
fn depth_grid(mask: &Mask) -> Vec<Vec<usize>> {
    let w = mask.w();
    let h = mask.h();
    let mut depth = vec![vec![usize::MAX; w]; h];

    for y in 0..h {
        let mut run_start = 0usize;
        for x in 0..w {
            if !*mask.get(x, y) {
                run_start = x + 1;
                continue;
            }
            if x == 0 || !*mask.get(x - 1, y) {
                run_start = x;
            }
            let mut run_end = x;
            while run_end + 1 < w && *mask.get(run_end + 1, y) {
                run_end += 1;
            }
            depth[y][x] = depth[y][x].min((x - run_start).min(run_end - x) + 1);
        }
    }

    for x in 0..w {
        let mut run_start = 0usize;
        for y in 0..h {
            if !*mask.get(x, y) {
                run_start = y + 1;
                continue;
            }
            if y == 0 || !*mask.get(x, y - 1) {
                run_start = y;
            }
            let mut run_end = y;
            while run_end + 1 < h && *mask.get(x, run_end + 1) {
                run_end += 1;
            }
            depth[y][x] = depth[y][x].min((y - run_start).min(run_end - y) + 1);
        }
    }

    depth
}

/// True iff `p` is the minimum- or maximum-x occupied cell in its row, or
/// the minimum- or maximum-y occupied cell in its column, within `present`.
fn is_exposed(present: &HashSet<Position>, w: usize, h: usize, p: Position) -> bool {
    if !present.contains(&p) {
        return false;
    }
    let row_xs: Vec<usize> = (0..w)
        .filter(|&x| present.contains(&Position::new(x, p.y)))
        .collect();
    if row_xs.first() == Some(&p.x) || row_xs.last() == Some(&p.x) {
        return true;
    }
    let col_ys: Vec<usize> = (0..h)
        .filter(|&y| present.contains(&Position::new(p.x, y)))
        .collect();
    col_ys.first() == Some(&p.y) || col_ys.last() == Some(&p.y)
}

fn exposed_cells(present: &HashSet<Position>, w: usize, h: usize) -> Vec<Position> {
    let mut rows_min = vec![None; h];
    let mut rows_max = vec![None; h];
    let mut cols_min = vec![None; w];
    let mut cols_max = vec![None; w];
    for &p in present {
        let e: &mut Option<usize> = &mut rows_min[p.y];
        *e = Some(e.map_or(p.x, |v: usize| v.min(p.x)));
        let e = &mut rows_max[p.y];
        *e = Some(e.map_or(p.x, |v: usize| v.max(p.x)));
        let e = &mut cols_min[p.x];
        *e = Some(e.map_or(p.y, |v: usize| v.min(p.y)));
        let e = &mut cols_max[p.x];
        *e = Some(e.map_or(p.y, |v: usize| v.max(p.y)));
    }
    let mut out = Vec::new();
    for &p in present {
        let row_extreme = rows_min[p.y] == Some(p.x) || rows_max[p.y] == Some(p.x);
        let col_extreme = cols_min[p.x] == Some(p.y) || cols_max[p.x] == Some(p.y);
        if row_extreme || col_extreme {
            out.push(p);
        }
    }
    out
}

/// Forward removal order: at every step, removes the exposed cell minimizing
/// `(depth, y, x)`. Never fails for a rectangular mask.
pub fn generate_forward_remove_order(mask: &Mask) -> Vec<Position> {
    let w = mask.w();
    let h = mask.h();
    let depth = depth_grid(mask);

    let mut present: HashSet<Position> = HashSet::new();
    for p in mask.iter_positions() {
        if *mask.get(p.x, p.y) {
            present.insert(p);
        }
    }

    let mut order = Vec::with_capacity(present.len());
    while !present.is_empty() {
        let candidates = exposed_cells(&present, w, h);
        let best = candidates
            .into_iter()
            .min_by_key(|p| (depth[p.y][p.x], p.y, p.x))
            .expect("a non-empty present set always has at least one exposed cell");
        present.remove(&best);
        order.push(best);
    }
    order
}

/// Reverses a forward removal order into a constructive placement order.
/// Fails validation if the mask has no occupied cells.
pub fn generate_backward_place_order(mask: &Mask) -> Result<Vec<Position>> {
    let order = generate_forward_remove_order(mask);
    if order.is_empty() {
        return Err(PsldError::validation(
            "cannot generate a backward place order for an empty mask",
        ));
    }
    let mut backward = order;
    backward.reverse();
    Ok(backward)
}

/// Simulates `order` as a sequence of removals from `mask`'s occupied cells,
/// erroring if any step removes a cell that is absent or not exposed, or if
/// cells remain once the order is exhausted.
pub fn verify_forward_remove_order(mask: &Mask, order: &[Position]) -> Result<()> {
    let w = mask.w();
    let h = mask.h();
    let mut present: HashSet<Position> = HashSet::new();
    for p in mask.iter_positions() {
        if *mask.get(p.x, p.y) {
            present.insert(p);
        }
    }

    for &p in order {
        if !is_exposed(&present, w, h, p) {
            return Err(PsldError::validation(format!(
                "position ({}, {}) is not exposed or not present at its removal step",
                p.x, p.y
            )));
        }
        present.remove(&p);
    }

    if !present.is_empty() {
        return Err(PsldError::validation(format!(
            "{} cell(s) remain after exhausting the removal order",
            present.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn ring_5x5() -> Mask {
        // Border all true, center false, one interior cell at (2,2) true.
        let mut rows = vec![vec![false; 5]; 5];
        for y in 0..5 {
            for x in 0..5 {
                if y == 0 || y == 4 || x == 0 || x == 4 {
                    rows[y][x] = true;
                }
            }
        }
        rows[2][2] = true;
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn hollow_ring_produces_every_occupied_cell_exactly_once() {
        let mask = ring_5x5();
        let backward = generate_backward_place_order(&mask).unwrap();
        assert_eq!(backward.len(), 17);
        let mut seen = HashSet::new();
        for p in &backward {
            assert!(seen.insert(*p), "duplicate position in backward order");
        }

        let mut forward = backward.clone();
        forward.reverse();
        verify_forward_remove_order(&mask, &forward).unwrap();
    }

    #[test]
    fn single_cell_mask_is_trivially_valid() {
        let mask: Mask = Grid::from_rows(vec![vec![true]]).unwrap();
        let backward = generate_backward_place_order(&mask).unwrap();
        assert_eq!(backward, vec![Position::new(0, 0)]);
    }

    #[test]
    fn empty_mask_is_a_validation_error() {
        let mask: Mask = Grid::from_rows(vec![vec![false, false]]).unwrap();
        assert!(generate_backward_place_order(&mask).is_err());
    }

    #[test]
    fn verify_rejects_removing_an_interior_cell_first() {
        let mask: Mask = Grid::from_rows(vec![vec![true, true, true]]).unwrap();
        let bad_order = vec![Position::new(1, 0), Position::new(0, 0), Position::new(2, 0)];
        assert!(verify_forward_remove_order(&mask, &bad_order).is_err());
    }

    #[test]
    fn verify_rejects_leftover_cells() {
        let mask: Mask = Grid::from_rows(vec![vec![true, true]]).unwrap();
        let short_order = vec![Position::new(0, 0)];
        assert!(verify_forward_remove_order(&mask, &short_order).is_err());
    }

    #[test]
    fn solid_rectangle_round_trips_for_several_sizes() {
        for (w, h) in [(1, 1), (2, 3), (4, 4), (5, 2)] {
            let mask: Mask = Grid::fill(w, h, true).unwrap();
            let backward = generate_backward_place_order(&mask).unwrap();
            assert_eq!(backward.len(), w * h);
            let mut forward = backward.clone();
            forward.reverse();
            verify_forward_remove_order(&mask, &forward).unwrap();
        }
    }
}
