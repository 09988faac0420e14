//! Per-color region statistics and threshold-based validation gating.

use crate::components::components_by_color;
use crate::grid::{ColorGrid, ColorIndex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRegionStats {
    pub color_index: ColorIndex,
    pub regions: usize,
    pub total_cells: usize,
    pub largest: usize,
    pub smallest: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRegionStats {
    pub occupied_cells: usize,
    pub empty_cells: usize,
    pub total_regions: usize,
    /// Sorted by `color_index`.
    pub colors: Vec<ColorRegionStats>,
}

impl GridRegionStats {
    /// Regions per occupied cell (lower is better); `0.0` for an empty grid.
    pub fn fragmentation(&self) -> f64 {
        if self.occupied_cells == 0 {
            0.0
        } else {
            self.total_regions as f64 / self.occupied_cells as f64
        }
    }
}

pub fn analyze_grid_regions(grid: &ColorGrid) -> GridRegionStats {
    let comps = components_by_color(grid);
    let empty_cells = grid
        .rows()
        .into_iter()
        .flatten()
        .filter(|c| c.is_none())
        .count();
    let occupied_cells = grid.w() * grid.h() - empty_cells;

    let mut by_color: std::collections::BTreeMap<ColorIndex, Vec<usize>> =
        std::collections::BTreeMap::new();
    for (color, pts) in &comps {
        by_color.entry(*color).or_default().push(pts.len());
    }

    let colors = by_color
        .into_iter()
        .map(|(color_index, mut sizes)| {
            sizes.sort_unstable();
            ColorRegionStats {
                color_index,
                regions: sizes.len(),
                total_cells: sizes.iter().sum(),
                largest: *sizes.last().unwrap(),
                smallest: *sizes.first().unwrap(),
            }
        })
        .collect();

    GridRegionStats {
        occupied_cells,
        empty_cells,
        total_regions: comps.len(),
        colors,
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegionThresholds {
    pub min_largest_region: Option<usize>,
    pub max_total_regions: Option<usize>,
    pub max_fragmentation: Option<f64>,
    pub min_occupied_cells: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub ok: bool,
    pub reasons: Vec<String>,
    pub stats: GridRegionStats,
}

pub fn validate_grid_regions(grid: &ColorGrid, thresholds: &RegionThresholds) -> ValidationResult {
    let stats = analyze_grid_regions(grid);
    let mut reasons = Vec::new();

    if let Some(min_occ) = thresholds.min_occupied_cells {
        if stats.occupied_cells < min_occ {
            reasons.push(format!(
                "occupied_cells {} < min_occupied_cells {}",
                stats.occupied_cells, min_occ
            ));
        }
    }

    if let Some(max_total) = thresholds.max_total_regions {
        if stats.total_regions > max_total {
            reasons.push(format!(
                "total_regions {} > max_total_regions {}",
                stats.total_regions, max_total
            ));
        }
    }

    if let Some(max_frag) = thresholds.max_fragmentation {
        let frag = stats.fragmentation();
        if frag > max_frag {
            reasons.push(format!(
                "fragmentation {:.4} > max_fragmentation {:.4}",
                frag, max_frag
            ));
        }
    }

    if let Some(min_largest) = thresholds.min_largest_region {
        for cs in &stats.colors {
            if cs.largest < min_largest {
                reasons.push(format!(
                    "color {}: largest_region {} < min_largest_region {}",
                    cs.color_index, cs.largest, min_largest
                ));
            }
        }
    }

    let ok = reasons.is_empty();
    ValidationResult { ok, reasons, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;

    #[test]
    fn analyze_grid_regions_counts_per_color() {
        let g: ColorGrid = Grid::from_rows(vec![
            vec![Some(0), Some(0), None, Some(1)],
            vec![None, None, None, Some(1)],
        ])
        .unwrap();
        let stats = analyze_grid_regions(&g);
        assert_eq!(stats.occupied_cells, 4);
        assert_eq!(stats.empty_cells, 4);
        assert_eq!(stats.total_regions, 2);
        assert_eq!(stats.colors.len(), 2);
        assert_eq!(stats.colors[0].color_index, 0);
        assert_eq!(stats.colors[0].largest, 2);
        assert_eq!(stats.colors[1].color_index, 1);
        assert_eq!(stats.colors[1].largest, 2);
    }

    #[test]
    fn validate_grid_regions_reports_violations() {
        let g: ColorGrid = Grid::from_rows(vec![vec![Some(0), None], vec![None, Some(1)]]).unwrap();
        let thresholds = RegionThresholds {
            min_occupied_cells: Some(4),
            max_total_regions: Some(1),
            ..Default::default()
        };
        let result = validate_grid_regions(&g, &thresholds);
        assert!(!result.ok);
        assert_eq!(result.reasons.len(), 2);
    }

    #[test]
    fn validate_grid_regions_ok_when_no_thresholds_set() {
        let g: ColorGrid = Grid::from_rows(vec![vec![Some(0)]]).unwrap();
        let result = validate_grid_regions(&g, &RegionThresholds::default());
        assert!(result.ok);
    }
}
