//! 4-neighborhood connected components over colored grids and boolean
//! masks.

use crate::grid::{Cell, ColorGrid, ColorIndex, Mask, Position};
use std::collections::VecDeque;

const NEIGHBORS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn flood_fill(
    w: usize,
    h: usize,
    seen: &mut Vec<Vec<bool>>,
    start: (usize, usize),
    same: impl Fn(usize, usize) -> bool,
) -> Vec<Position> {
    let mut out = Vec::new();
    let mut q = VecDeque::new();
    q.push_back(start);
    seen[start.1][start.0] = true;
    while let Some((x, y)) = q.pop_front() {
        out.push(Position::new(x, y));
        for (dx, dy) in NEIGHBORS {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 {
                continue;
            }
            let (nx, ny) = (nx as usize, ny as usize);
            if nx < w && ny < h && !seen[ny][nx] && same(nx, ny) {
                seen[ny][nx] = true;
                q.push_back((nx, ny));
            }
        }
    }
    out
}

/// All maximal monochrome components of a colored grid, 4-connected.
///
/// Emitted in scan order of each component's first-visited (seed) cell:
/// y-major, then x-major.
pub fn components_by_color(grid: &ColorGrid) -> Vec<(ColorIndex, Vec<Position>)> {
    let w = grid.w();
    let h = grid.h();
    let mut seen = vec![vec![false; w]; h];
    let mut out = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if seen[y][x] {
                continue;
            }
            let color: Cell = *grid.get(x, y);
            let color = match color {
                None => continue,
                Some(c) => c,
            };
            let pts = flood_fill(w, h, &mut seen, (x, y), |nx, ny| *grid.get(nx, ny) == Some(color));
            out.push((color, pts));
        }
    }
    out
}

/// Maximal foreground components of a boolean mask, 4-connected, in the same
/// scan-order convention as [`components_by_color`].
pub fn components(mask: &Mask) -> Vec<Vec<Position>> {
    let w = mask.w();
    let h = mask.h();
    let mut seen = vec![vec![false; w]; h];
    let mut out = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if seen[y][x] || !*mask.get(x, y) {
                continue;
            }
            let pts = flood_fill(w, h, &mut seen, (x, y), |nx, ny| *mask.get(nx, ny));
            out.push(pts);
        }
    }
    out
}

/// The connected component of `grid` containing `at`, or `None` if `at` is
/// empty. Used by the simulator's `tap` to find what a shot consumes
/// without re-scanning the whole grid for every other component.
pub fn component_containing(grid: &ColorGrid, at: Position) -> Option<Vec<Position>> {
    let color = (*grid.get(at.x, at.y))?;
    let w = grid.w();
    let h = grid.h();
    let mut seen = vec![vec![false; w]; h];
    Some(flood_fill(w, h, &mut seen, (at.x, at.y), |nx, ny| {
        *grid.get(nx, ny) == Some(color)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    fn cg(rows: Vec<Vec<Cell>>) -> ColorGrid {
        Grid::from_rows(rows).unwrap()
    }

    #[test]
    fn components_by_color_splits_disjoint_regions() {
        let g = cg(vec![
            vec![Some(0), Some(0), None, Some(1)],
            vec![Some(0), None, None, Some(1)],
        ]);
        let comps = components_by_color(&g);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].0, 0);
        assert_eq!(comps[0].1.len(), 3);
        assert_eq!(comps[1].0, 1);
        assert_eq!(comps[1].1.len(), 2);
    }

    #[test]
    fn components_by_color_scan_order_is_y_major_then_x_major() {
        // Two single-cell components of the same color, not adjacent.
        let g = cg(vec![vec![Some(0), None, Some(0)]]);
        let comps = components_by_color(&g);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].1[0], Position::new(0, 0));
        assert_eq!(comps[1].1[0], Position::new(2, 0));
    }

    #[test]
    fn components_on_mask_matches_colored_variant() {
        let m: Mask = Grid::from_rows(vec![vec![true, true, false, true], vec![true, false, false, true]])
            .unwrap();
        let comps = components(&m);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].len(), 3);
        assert_eq!(comps[1].len(), 2);
    }
}
