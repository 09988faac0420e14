//! Deterministic mask → color-grid assignment, used before rebalancing
//! and derangement when no external quantizer has already supplied a top
//! grid.

use crate::error::Result;
use crate::grid::{ColorGrid, ColorIndex, Grid, HexColor, Mask, Palette};

/// A small built-in default palette, used when a caller asks for a
/// colorization but has no palette of their own (an external image
/// quantizer would normally supply one).
pub const DEFAULT_PALETTE_HEX: [&str; 5] = ["#E63946", "#457B9D", "#2A9D8F", "#F4A261", "#E9C46A"];

pub fn default_palette(k: usize) -> Result<Palette> {
    let k = k.clamp(1, DEFAULT_PALETTE_HEX.len());
    let colors = DEFAULT_PALETTE_HEX[..k]
        .iter()
        .map(|hex| HexColor::parse(hex))
        .collect::<Result<Vec<_>>>()?;
    Palette::new(colors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorizeMode {
    Solid,
    VerticalStripes,
    Quadrants,
}

/// The raw bucket index `[0, k)` that `mode` assigns to `(x, y)`, before any
/// remapping (e.g. excluding a background index in the `_filled` variant).
fn bucket(mode: ColorizeMode, w: usize, h: usize, x: usize, y: usize, k: usize) -> usize {
    match mode {
        ColorizeMode::Solid => 0,
        ColorizeMode::VerticalStripes => {
            let stripe_w = (w / k.max(2)).max(1);
            (x / stripe_w) % k
        }
        ColorizeMode::Quadrants => {
            let top_half = if y < h / 2 { 0 } else { 1 };
            let left_half = if x < w / 2 { 0 } else { 1 };
            (2 * top_half + left_half) % k
        }
    }
}

/// Assigns palette indices to `mask`'s occupied cells deterministically,
/// leaving unoccupied cells empty. `palette_size` is clamped to
/// `[1, DEFAULT_PALETTE_HEX.len()]` against the built-in default palette.
pub fn colorize_mask(mask: &Mask, palette_size: usize, mode: ColorizeMode) -> Result<(Palette, ColorGrid)> {
    let k = palette_size.clamp(1, DEFAULT_PALETTE_HEX.len());
    let palette = default_palette(k)?;
    let w = mask.w();
    let h = mask.h();
    let mut rows = vec![vec![None; w]; h];
    for y in 0..h {
        for x in 0..w {
            if *mask.get(x, y) {
                rows[y][x] = Some(bucket(mode, w, h, x, y, k) as ColorIndex);
            }
        }
    }
    Ok((palette, Grid::from_rows(rows)?))
}

/// Like [`colorize_mask`], but guarantees no empty cells remain: background
/// cells get `background_index`, and the foreground cycle excludes it.
pub fn colorize_mask_filled(
    mask: &Mask,
    palette_size: usize,
    mode: ColorizeMode,
    background_index: ColorIndex,
) -> Result<(Palette, ColorGrid)> {
    let k = palette_size.clamp(2, DEFAULT_PALETTE_HEX.len());
    let palette = default_palette(k)?;
    let available: Vec<ColorIndex> = (0..k as ColorIndex).filter(|&c| c != background_index).collect();
    let k_eff = available.len().max(1);

    let w = mask.w();
    let h = mask.h();
    let mut rows = vec![vec![Some(background_index); w]; h];
    for y in 0..h {
        for x in 0..w {
            if *mask.get(x, y) {
                let raw = bucket(mode, w, h, x, y, k_eff);
                rows[y][x] = Some(available[raw % available.len().max(1)]);
            }
        }
    }
    Ok((palette, Grid::from_rows(rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_mode_assigns_index_zero_to_every_occupied_cell() {
        let mask: Mask = Grid::from_rows(vec![vec![true, false, true]]).unwrap();
        let (_palette, top) = colorize_mask(&mask, 3, ColorizeMode::Solid).unwrap();
        assert_eq!(*top.get(0, 0), Some(0));
        assert_eq!(*top.get(1, 0), None);
        assert_eq!(*top.get(2, 0), Some(0));
    }

    #[test]
    fn vertical_stripes_assigns_distinct_colors_across_a_wide_mask() {
        let mask: Mask = Grid::fill(8, 1, true).unwrap();
        let (_palette, top) = colorize_mask(&mask, 4, ColorizeMode::VerticalStripes).unwrap();
        let colors: std::collections::HashSet<_> = top.rows().into_iter().flatten().flatten().collect();
        assert!(colors.len() > 1);
    }

    #[test]
    fn quadrants_assigns_four_colors_to_a_four_quadrant_mask() {
        let mask: Mask = Grid::fill(4, 4, true).unwrap();
        let (_palette, top) = colorize_mask(&mask, 4, ColorizeMode::Quadrants).unwrap();
        assert_eq!(*top.get(0, 0), Some(0));
        assert_eq!(*top.get(3, 0), Some(1));
        assert_eq!(*top.get(0, 3), Some(2));
        assert_eq!(*top.get(3, 3), Some(3));
    }

    #[test]
    fn filled_variant_leaves_no_empty_cells_and_skips_background_index() {
        let mask: Mask = Grid::from_rows(vec![vec![true, false, true]]).unwrap();
        let (_palette, top) = colorize_mask_filled(&mask, 3, ColorizeMode::Solid, 1).unwrap();
        assert_eq!(*top.get(1, 0), Some(1));
        for p in top.iter_positions() {
            if *mask.get(p.x, p.y) {
                assert_ne!(*top.get(p.x, p.y), Some(1));
            }
        }
    }

    #[test]
    fn palette_size_clamps_to_default_palette_length() {
        let palette = default_palette(1000).unwrap();
        assert_eq!(palette.len(), DEFAULT_PALETTE_HEX.len());
    }
}
