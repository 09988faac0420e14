//! Deterministic splitting of oversized same-color components by
//! recoloring cells in place. Never invents or removes occupied cells; it
//! only reassigns palette indices within a component's existing footprint.

use crate::components::components_by_color;
use crate::error::{PsldError, Result};
use crate::grid::ColorGrid;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    Sectors,
    StripesX,
    StripesY,
    Cuts,
}

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub palette_size: usize,
    pub max_component_size: usize,
    pub mode: SplitMode,
    pub cut_thickness: usize,
    pub max_splits: usize,
    pub only_color: Option<u8>,
}

impl Default for SplitOptions {
    fn default() -> Self {
        SplitOptions {
            palette_size: 0,
            max_component_size: usize::MAX,
            mode: SplitMode::Sectors,
            cut_thickness: 1,
            max_splits: 12,
            only_color: None,
        }
    }
}

fn color_cycle(color: u8, palette_size: usize) -> Vec<u8> {
    let mut cycle = vec![color];
    cycle.extend((0..palette_size as u16).filter_map(|i| {
        let i = i as u8;
        if i != color {
            Some(i)
        } else {
            None
        }
    }));
    cycle
}

/// Splits every component larger than `opts.max_component_size` into roughly
/// `opts.max_splits`-bounded chunks, recoloring in place. Mutates `grid`.
pub fn split_large_components(grid: &mut ColorGrid, opts: &SplitOptions) -> Result<()> {
    if opts.max_component_size == 0 {
        return Err(PsldError::validation("max_component_size must be positive"));
    }
    if opts.cut_thickness == 0 {
        return Err(PsldError::validation("cut_thickness must be positive"));
    }
    if opts.palette_size < 2 {
        return Ok(());
    }

    let comps = components_by_color(grid);
    for (color, pts) in comps {
        if let Some(only) = opts.only_color {
            if color != only {
                continue;
            }
        }
        let n = pts.len();
        if n <= opts.max_component_size {
            continue;
        }

        let splits = (n + opts.max_component_size - 1) / opts.max_component_size;
        let splits = splits.clamp(2, opts.max_splits);
        if splits <= 1 {
            continue;
        }

        let cycle = color_cycle(color, opts.palette_size);
        if cycle.is_empty() {
            continue;
        }

        match opts.mode {
            SplitMode::Sectors => split_sectors(grid, &pts, splits, &cycle),
            SplitMode::StripesX => split_stripes_x(grid, &pts, splits, &cycle),
            SplitMode::StripesY => split_stripes_y(grid, &pts, splits, &cycle),
            SplitMode::Cuts => split_cuts(grid, &pts, splits, &cycle, opts.cut_thickness),
        }
    }

    Ok(())
}

fn split_sectors(grid: &mut ColorGrid, pts: &[crate::grid::Position], splits: usize, cycle: &[u8]) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p.x as f64).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p.y as f64).sum::<f64>() / n;
    for p in pts {
        let theta = (p.y as f64 - cy).atan2(p.x as f64 - cx);
        let t = (theta + std::f64::consts::PI) / (2.0 * std::f64::consts::PI);
        let mut b = (t * splits as f64) as usize;
        if b >= splits {
            b = splits - 1;
        }
        grid.set(p.x, p.y, Some(cycle[b % cycle.len()]));
    }
}

fn split_stripes_x(grid: &mut ColorGrid, pts: &[crate::grid::Position], splits: usize, cycle: &[u8]) {
    let minx = pts.iter().map(|p| p.x).min().unwrap();
    let maxx = pts.iter().map(|p| p.x).max().unwrap();
    let span = (maxx - minx + 1).max(1) as f64;
    for p in pts {
        let t = (p.x - minx) as f64 / span;
        let mut b = (t * splits as f64) as usize;
        if b >= splits {
            b = splits - 1;
        }
        grid.set(p.x, p.y, Some(cycle[b % cycle.len()]));
    }
}

fn split_stripes_y(grid: &mut ColorGrid, pts: &[crate::grid::Position], splits: usize, cycle: &[u8]) {
    let miny = pts.iter().map(|p| p.y).min().unwrap();
    let maxy = pts.iter().map(|p| p.y).max().unwrap();
    let span = (maxy - miny + 1).max(1) as f64;
    for p in pts {
        let t = (p.y - miny) as f64 / span;
        let mut b = (t * splits as f64) as usize;
        if b >= splits {
            b = splits - 1;
        }
        grid.set(p.x, p.y, Some(cycle[b % cycle.len()]));
    }
}

fn split_cuts(
    grid: &mut ColorGrid,
    pts: &[crate::grid::Position],
    splits: usize,
    cycle: &[u8],
    cut_thickness: usize,
) {
    let pts_set: HashSet<(usize, usize)> = pts.iter().map(|p| (p.x, p.y)).collect();
    let is_boundary = |x: usize, y: usize| -> bool {
        const DIRS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        DIRS.iter().any(|(dx, dy)| {
            let nx = x as isize + dx;
            let ny = y as isize + dy;
            if nx < 0 || ny < 0 {
                return true;
            }
            !pts_set.contains(&(nx as usize, ny as usize))
        })
    };

    let interior: Vec<(usize, usize)> = pts
        .iter()
        .map(|p| (p.x, p.y))
        .filter(|&(x, y)| !is_boundary(x, y))
        .collect();
    let use_pts: Vec<(usize, usize)> = if interior.is_empty() {
        pts.iter().map(|p| (p.x, p.y)).collect()
    } else {
        interior
    };
    let use_set: HashSet<(usize, usize)> = use_pts.iter().copied().collect();

    let mut xs: Vec<usize> = use_pts.iter().map(|&(x, _)| x).collect();
    let mut ys: Vec<usize> = use_pts.iter().map(|&(_, y)| y).collect();
    let (minx, maxx) = (*xs.iter().min().unwrap(), *xs.iter().max().unwrap());
    let (miny, maxy) = (*ys.iter().min().unwrap(), *ys.iter().max().unwrap());
    xs.sort_unstable();
    ys.sort_unstable();

    for cut_i in 0..splits.saturating_sub(1) {
        let sep_color = cycle[(1 + cut_i) % cycle.len()];

        if cut_i % 2 == 0 {
            let mid = xs[xs.len() / 2] as isize;
            let mut best_x: Option<isize> = None;
            let mut best_cnt: isize = -1;
            for dx in 0..=(maxx as isize - minx as isize) {
                for x0 in [mid - dx, mid + dx] {
                    if x0 < minx as isize || x0 > maxx as isize {
                        continue;
                    }
                    let cnt = use_pts.iter().filter(|&&(x, _)| x as isize == x0).count() as isize;
                    if cnt > best_cnt {
                        best_cnt = cnt;
                        best_x = Some(x0);
                    }
                }
                if best_cnt >= 3 {
                    break;
                }
            }
            let (best_x, best_cnt) = match (best_x, best_cnt) {
                (Some(x), c) if c > 0 => (x, c),
                _ => continue,
            };
            let _ = best_cnt;
            for t in 0..cut_thickness {
                let xline = best_x + (t as isize - (cut_thickness / 2) as isize);
                for p in pts {
                    if p.x as isize == xline && use_set.contains(&(p.x, p.y)) {
                        grid.set(p.x, p.y, Some(sep_color));
                    }
                }
            }
        } else {
            let mid = ys[ys.len() / 2] as isize;
            let mut best_y: Option<isize> = None;
            let mut best_cnt: isize = -1;
            for dy in 0..=(maxy as isize - miny as isize) {
                for y0 in [mid - dy, mid + dy] {
                    if y0 < miny as isize || y0 > maxy as isize {
                        continue;
                    }
                    let cnt = use_pts.iter().filter(|&&(_, y)| y as isize == y0).count() as isize;
                    if cnt > best_cnt {
                        best_cnt = cnt;
                        best_y = Some(y0);
                    }
                }
                if best_cnt >= 3 {
                    break;
                }
            }
            let (best_y, best_cnt) = match (best_y, best_cnt) {
                (Some(y), c) if c > 0 => (y, c),
                _ => continue,
            };
            let _ = best_cnt;
            for t in 0..cut_thickness {
                let yline = best_y + (t as isize - (cut_thickness / 2) as isize);
                for p in pts {
                    if p.y as isize == yline && use_set.contains(&(p.x, p.y)) {
                        grid.set(p.x, p.y, Some(sep_color));
                    }
                }
            }
        }
    }
}
