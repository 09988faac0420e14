//! Removes small foreground specks from a mask prior to colorizing,
//! always preserving the largest connected component.

use crate::components::components;
use crate::grid::{Mask, Position};

fn component_key(pts: &[Position]) -> (usize, usize, usize) {
    let size = pts.len();
    let top = pts.iter().map(|p| p.y).min().expect("component is non-empty");
    let left = pts.iter().map(|p| p.x).min().expect("component is non-empty");
    (size, top, left)
}

/// Clears every foreground component smaller than `min_size` to background,
/// except the largest component (ties broken by lowest topmost row, then
/// lowest leftmost column), which is always kept regardless of size.
/// `min_size <= 1` is a no-op.
pub fn remove_small_foreground_components(mask: &Mask, min_size: usize) -> Mask {
    if min_size <= 1 {
        return mask.clone();
    }
    let comps = components(mask);
    if comps.is_empty() {
        return mask.clone();
    }

    let mut largest = 0usize;
    for i in 1..comps.len() {
        let (size, top, left) = component_key(&comps[i]);
        let (best_size, best_top, best_left) = component_key(&comps[largest]);
        if size > best_size || (size == best_size && (top, left) < (best_top, best_left)) {
            largest = i;
        }
    }

    let mut out = mask.clone();
    for (idx, pts) in comps.iter().enumerate() {
        if idx == largest || pts.len() >= min_size {
            continue;
        }
        for p in pts {
            out.set(p.x, p.y, false);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn clears_specks_smaller_than_min_size() {
        let mask: Mask = Grid::from_rows(vec![
            vec![true, true, true, false, true],
            vec![true, true, true, false, false],
        ])
        .unwrap();
        let cleaned = remove_small_foreground_components(&mask, 3);
        assert!(!*cleaned.get(4, 0));
        assert!(*cleaned.get(0, 0));
        assert!(*cleaned.get(2, 1));
    }

    #[test]
    fn always_keeps_the_largest_component_even_if_small() {
        let mask: Mask = Grid::from_rows(vec![vec![true]]).unwrap();
        let cleaned = remove_small_foreground_components(&mask, 100);
        assert!(*cleaned.get(0, 0));
    }

    #[test]
    fn min_size_of_one_or_zero_is_a_no_op() {
        let mask: Mask = Grid::from_rows(vec![vec![true, false]]).unwrap();
        assert_eq!(remove_small_foreground_components(&mask, 1), mask);
        assert_eq!(remove_small_foreground_components(&mask, 0), mask);
    }

    #[test]
    fn ties_in_size_break_by_topmost_then_leftmost() {
        // Two single-cell components of equal size; the one at (0,0) wins
        // the tie over the one at (2,0), so it survives a min_size=2 sweep
        // that would otherwise clear both.
        let mask: Mask = Grid::from_rows(vec![vec![true, false, true]]).unwrap();
        let cleaned = remove_small_foreground_components(&mask, 2);
        assert!(*cleaned.get(0, 0));
        assert!(!*cleaned.get(2, 0));
    }
}
