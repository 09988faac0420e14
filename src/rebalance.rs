//! Top rebalancer. When the derangement is infeasible because one
//! color exceeds half the occupied cells, recolors minimal seams inside
//! that color's largest component until feasibility is restored.

use crate::components::components_by_color;
use crate::error::Result;
use crate::grid::{ColorGrid, ColorIndex};
use crate::splitter::{split_large_components, SplitMode, SplitOptions};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct RebalanceOptions {
    pub max_dominant_share: f64,
    pub max_iters: usize,
}

impl Default for RebalanceOptions {
    fn default() -> Self {
        RebalanceOptions {
            max_dominant_share: 0.5,
            max_iters: 6,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RebalanceResult {
    pub top: ColorGrid,
    pub ok: bool,
    pub iterations: usize,
    pub dominant_color: Option<ColorIndex>,
    pub dominant_share: f64,
}

/// Per-color counts with ties broken by the smallest color index, matching
/// the tie-break used throughout the splitter/rebalancer pair.
fn dominant_color_stats(grid: &ColorGrid) -> (Option<ColorIndex>, usize, usize) {
    let mut counts: BTreeMap<ColorIndex, usize> = BTreeMap::new();
    for p in grid.iter_positions() {
        if let Some(c) = *grid.get(p.x, p.y) {
            *counts.entry(c).or_insert(0) += 1;
        }
    }
    let occupied: usize = counts.values().sum();
    let mut best: Option<(ColorIndex, usize)> = None;
    for (&c, &n) in &counts {
        match best {
            None => best = Some((c, n)),
            Some((_, bn)) if n > bn => best = Some((c, n)),
            _ => {}
        }
    }
    match best {
        Some((c, n)) => (Some(c), n, occupied),
        None => (None, 0, occupied),
    }
}

/// Rewrites `top` minimally until the dominant color's share of occupied
/// cells is at most `opts.max_dominant_share`, by repeatedly cutting a seam
/// through the dominant color's largest component. Never errors: if
/// `max_iters` is exhausted without reaching feasibility, returns `ok: false`
/// with whatever partial progress was made.
pub fn rebalance_top_for_derangement(
    top: &ColorGrid,
    opts: &RebalanceOptions,
) -> Result<RebalanceResult> {
    let mut grid = top.clone();
    let mut iterations = 0usize;

    loop {
        let (dominant_color, dominant_count, occupied) = dominant_color_stats(&grid);
        let dominant_share = if occupied == 0 {
            0.0
        } else {
            dominant_count as f64 / occupied as f64
        };

        let Some(dominant) = dominant_color else {
            return Ok(RebalanceResult {
                top: grid,
                ok: true,
                iterations,
                dominant_color: None,
                dominant_share,
            });
        };

        if dominant_share <= opts.max_dominant_share {
            return Ok(RebalanceResult {
                top: grid,
                ok: true,
                iterations,
                dominant_color: Some(dominant),
                dominant_share,
            });
        }

        if iterations >= opts.max_iters {
            log::warn!(
                "rebalance_top_for_derangement: exhausted {} iterations, dominant color {} still at share {:.3}",
                opts.max_iters,
                dominant,
                dominant_share
            );
            return Ok(RebalanceResult {
                top: grid,
                ok: false,
                iterations,
                dominant_color: Some(dominant),
                dominant_share,
            });
        }

        log::debug!(
            "rebalance_top_for_derangement: iteration {iterations}, dominant color {dominant} share {dominant_share:.3}"
        );

        let mut dominant_sizes: Vec<usize> = components_by_color(&grid)
            .into_iter()
            .filter(|(c, _)| *c == dominant)
            .map(|(_, pts)| pts.len())
            .collect();
        dominant_sizes.sort_unstable_by(|a, b| b.cmp(a));
        let max_component_size = match dominant_sizes.as_slice() {
            [_largest, second, ..] => *second,
            [largest] => (*largest / 2).max(1),
            [] => break,
        };

        let palette_size = grid
            .iter_positions()
            .filter_map(|p| *grid.get(p.x, p.y))
            .max()
            .map(|m| m as usize + 1)
            .unwrap_or(0)
            .max(2);

        split_large_components(
            &mut grid,
            &SplitOptions {
                palette_size,
                max_component_size,
                mode: SplitMode::Cuts,
                cut_thickness: 2,
                max_splits: 2,
                only_color: Some(dominant),
            },
        )?;

        iterations += 1;
    }

    let (dominant_color, dominant_count, occupied) = dominant_color_stats(&grid);
    let dominant_share = if occupied == 0 {
        0.0
    } else {
        dominant_count as f64 / occupied as f64
    };
    Ok(RebalanceResult {
        top: grid,
        ok: dominant_share <= opts.max_dominant_share,
        iterations,
        dominant_color,
        dominant_share,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derangement::{derive_slots, SlotsMode};
    use crate::grid::{Cell, Grid};

    fn cg(rows: Vec<Vec<Cell>>) -> ColorGrid {
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn leaves_balanced_top_unchanged() {
        let top = cg(vec![vec![Some(0), Some(1)], vec![Some(1), Some(0)]]);
        let result = rebalance_top_for_derangement(&top, &RebalanceOptions::default()).unwrap();
        assert!(result.ok);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.top, top);
    }

    #[test]
    fn rebalances_a_dominant_color_until_derangement_succeeds() {
        let _ = env_logger::try_init();
        // 4x4 block of color 0 dominates; a thin strip of color 1 at the edge.
        let mut rows = vec![vec![Some(0u8); 6]; 4];
        rows[0][5] = Some(1);
        rows[1][5] = Some(1);
        rows[2][5] = Some(1);
        rows[3][5] = Some(1);
        let top = cg(rows);

        let result = rebalance_top_for_derangement(&top, &RebalanceOptions::default()).unwrap();
        assert!(result.ok, "expected rebalancing to reach feasibility");
        assert!(result.dominant_share <= 0.5 + 1e-9);

        derive_slots(&result.top, SlotsMode::Derangement)
            .expect("rebalanced top should admit a derangement");
    }
}
