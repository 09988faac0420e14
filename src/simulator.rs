//! The perimeter-shooter simulator — taps, ticks, and the win/deadlock
//! predicates the solver (C8) searches over.

use crate::components::component_containing;
use crate::grid::{Cell, ColorGrid, ColorIndex, Position};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Shooter {
    pub color: ColorIndex,
    pub ammo: usize,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub conveyor_capacity: usize,
    pub entrance_pos: usize,
    pub move_then_fire: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// `L = 2w + 2h`, the length of the clockwise perimeter cycle.
pub fn perimeter_len(w: usize, h: usize) -> usize {
    2 * w + 2 * h
}

/// Maps a perimeter position to its side and in-side lane (an x for
/// top/bottom, a y for left/right), per the clockwise walk starting
/// top-left: top (x ascending), right (y ascending), bottom (x descending),
/// left (y descending).
pub fn pos_to_side_lane(w: usize, h: usize, pos: usize) -> (Side, usize) {
    let pos = pos % perimeter_len(w, h);
    if pos < w {
        (Side::Top, pos)
    } else if pos < w + h {
        (Side::Right, pos - w)
    } else if pos < 2 * w + h {
        (Side::Bottom, 2 * w + h - 1 - pos)
    } else {
        (Side::Left, 2 * w + 2 * h - 1 - pos)
    }
}

#[derive(Debug, Clone)]
struct Extrema {
    row_min: Vec<Option<usize>>,
    row_max: Vec<Option<usize>>,
    col_min: Vec<Option<usize>>,
    col_max: Vec<Option<usize>>,
}

fn compute_extrema(grid: &ColorGrid) -> Extrema {
    let w = grid.w();
    let h = grid.h();
    let mut row_min = vec![None; h];
    let mut row_max = vec![None; h];
    let mut col_min = vec![None; w];
    let mut col_max = vec![None; w];
    for y in 0..h {
        for x in 0..w {
            if grid.get(x, y).is_some() {
                row_min[y] = Some(row_min[y].map_or(x, |v: usize| v.min(x)));
                row_max[y] = Some(row_max[y].map_or(x, |v: usize| v.max(x)));
                col_min[x] = Some(col_min[x].map_or(y, |v: usize| v.min(y)));
                col_max[x] = Some(col_max[x].map_or(y, |v: usize| v.max(y)));
            }
        }
    }
    Extrema {
        row_min,
        row_max,
        col_min,
        col_max,
    }
}

fn target_for(ext: &Extrema, side: Side, lane: usize) -> Option<(usize, usize)> {
    match side {
        Side::Top => ext.col_min[lane].map(|y| (lane, y)),
        Side::Bottom => ext.col_max[lane].map(|y| (lane, y)),
        Side::Left => ext.row_min[lane].map(|x| (x, lane)),
        Side::Right => ext.row_max[lane].map(|x| (x, lane)),
    }
}

/// Converts a connected top component into a new shooter on the perimeter.
/// Fails (returns `None`) if the conveyor is already at capacity, or if
/// `at` is an empty top cell, expressed as an `Option` so callers (notably
/// the solver) can skip the action rather than propagate an error.
pub fn tap(
    top: &ColorGrid,
    shooters: &[Shooter],
    at: Position,
    config: &GameConfig,
) -> Option<(ColorGrid, Vec<Shooter>)> {
    if shooters.len() >= config.conveyor_capacity {
        return None;
    }
    let color = (*top.get(at.x, at.y))?;
    let component = component_containing(top, at)?;

    let mut new_top = top.clone();
    for p in &component {
        new_top.set(p.x, p.y, None);
    }
    let mut new_shooters = shooters.to_vec();
    new_shooters.push(Shooter {
        color,
        ammo: component.len(),
        pos: config.entrance_pos,
    });
    Some((new_top, new_shooters))
}

/// Advances shooters and fires one round, in deterministic `(pos, color,
/// ammo)` order. Returns the updated `(top, slots, shooters, shots_fired)`.
pub fn tick(
    top: &ColorGrid,
    slots: &ColorGrid,
    shooters: &[Shooter],
    config: &GameConfig,
) -> (ColorGrid, ColorGrid, Vec<Shooter>, usize) {
    let l = perimeter_len(top.w(), top.h());
    let mut ordered: Vec<Shooter> = shooters.to_vec();
    if config.move_then_fire {
        for s in ordered.iter_mut() {
            s.pos = (s.pos + 1) % l.max(1);
        }
    }
    ordered.sort_by_key(|s| (s.pos, s.color, s.ammo));

    let mut new_top = top.clone();
    let mut new_slots = slots.clone();
    let mut extrema = compute_extrema(&new_slots);
    let mut shots_fired = 0usize;
    let mut survivors = Vec::with_capacity(ordered.len());

    for mut shooter in ordered {
        let (side, lane) = pos_to_side_lane(new_top.w(), new_top.h(), shooter.pos);
        if let Some((tx, ty)) = target_for(&extrema, side, lane) {
            let target_color: Cell = *new_slots.get(tx, ty);
            if target_color == Some(shooter.color) {
                new_slots.set(tx, ty, None);
                new_top.set(tx, ty, None);
                shooter.ammo -= 1;
                shots_fired += 1;
                extrema = compute_extrema(&new_slots);
            }
        }
        if shooter.ammo > 0 {
            survivors.push(shooter);
        }
    }

    if !config.move_then_fire {
        for s in survivors.iter_mut() {
            s.pos = (s.pos + 1) % l.max(1);
        }
    }

    (new_top, new_slots, survivors, shots_fired)
}

/// True once every slot cell has been cleared.
pub fn is_win(slots: &ColorGrid) -> bool {
    slots.iter_positions().all(|p| slots.get(p.x, p.y).is_none())
}

/// True if some live shooter's color matches a currently-exposed slot color.
pub fn any_shot_possible(slots: &ColorGrid, shooters: &[Shooter]) -> bool {
    let ext = compute_extrema(slots);
    let mut exposed: HashSet<ColorIndex> = HashSet::new();
    for y in 0..slots.h() {
        if let Some(x) = ext.row_min[y] {
            exposed.insert(slots.get(x, y).unwrap());
        }
        if let Some(x) = ext.row_max[y] {
            exposed.insert(slots.get(x, y).unwrap());
        }
    }
    for x in 0..slots.w() {
        if let Some(y) = ext.col_min[x] {
            exposed.insert(slots.get(x, y).unwrap());
        }
        if let Some(y) = ext.col_max[x] {
            exposed.insert(slots.get(x, y).unwrap());
        }
    }
    shooters.iter().any(|s| exposed.contains(&s.color))
}

/// True when the conveyor is full and no live shooter can fire.
pub fn is_deadlock(slots: &ColorGrid, shooters: &[Shooter], config: &GameConfig) -> bool {
    shooters.len() >= config.conveyor_capacity && !any_shot_possible(slots, shooters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Grid};

    fn cg(rows: Vec<Vec<Cell>>) -> ColorGrid {
        Grid::from_rows(rows).unwrap()
    }

    fn cfg() -> GameConfig {
        GameConfig {
            conveyor_capacity: 3,
            entrance_pos: 0,
            move_then_fire: false,
        }
    }

    #[test]
    fn perimeter_len_matches_formula() {
        assert_eq!(perimeter_len(3, 2), 10);
    }

    #[test]
    fn pos_to_side_lane_walks_clockwise_from_top_left() {
        // 3x2 board: L = 10. top: 0,1,2. right: 3,4. bottom: 5,6,7. left: 8,9.
        assert_eq!(pos_to_side_lane(3, 2, 0), (Side::Top, 0));
        assert_eq!(pos_to_side_lane(3, 2, 2), (Side::Top, 2));
        assert_eq!(pos_to_side_lane(3, 2, 3), (Side::Right, 0));
        assert_eq!(pos_to_side_lane(3, 2, 4), (Side::Right, 1));
        assert_eq!(pos_to_side_lane(3, 2, 5), (Side::Bottom, 2));
        assert_eq!(pos_to_side_lane(3, 2, 7), (Side::Bottom, 0));
        assert_eq!(pos_to_side_lane(3, 2, 8), (Side::Left, 1));
        assert_eq!(pos_to_side_lane(3, 2, 9), (Side::Left, 0));
    }

    #[test]
    fn tap_removes_component_and_spawns_a_shooter() {
        let top = cg(vec![vec![Some(0), Some(0)], vec![None, Some(1)]]);
        let (new_top, shooters) = tap(&top, &[], Position::new(0, 0), &cfg()).unwrap();
        assert_eq!(*new_top.get(0, 0), None);
        assert_eq!(*new_top.get(1, 0), None);
        assert_eq!(*new_top.get(1, 1), Some(1));
        assert_eq!(shooters.len(), 1);
        assert_eq!(shooters[0].color, 0);
        assert_eq!(shooters[0].ammo, 2);
    }

    #[test]
    fn tap_fails_on_empty_cell_or_full_conveyor() {
        let top = cg(vec![vec![Some(0)]]);
        assert!(tap(&top, &[], Position::new(0, 0), &cfg()).is_some());
        let empty = cg(vec![vec![None]]);
        assert!(tap(&empty, &[], Position::new(0, 0), &cfg()).is_none());

        let full_cfg = GameConfig {
            conveyor_capacity: 1,
            ..cfg()
        };
        let existing = vec![Shooter { color: 0, ammo: 1, pos: 0 }];
        assert!(tap(&top, &existing, Position::new(0, 0), &full_cfg).is_none());
    }

    #[test]
    fn tick_fires_matching_shooter_and_clears_slot_and_top() {
        let top = cg(vec![vec![None]]);
        let slots = cg(vec![vec![Some(0)]]);
        let shooters = vec![Shooter { color: 0, ammo: 1, pos: 0 }];
        let (new_top, new_slots, survivors, shots) = tick(&top, &slots, &shooters, &cfg());
        assert_eq!(shots, 1);
        assert!(survivors.is_empty());
        assert!(is_win(&new_slots));
        assert_eq!(*new_top.get(0, 0), None);
    }

    #[test]
    fn tick_keeps_nonmatching_shooter_with_unchanged_ammo() {
        let top = cg(vec![vec![None]]);
        let slots = cg(vec![vec![Some(1)]]);
        let shooters = vec![Shooter { color: 0, ammo: 2, pos: 0 }];
        let (_top, new_slots, survivors, shots) = tick(&top, &slots, &shooters, &cfg());
        assert_eq!(shots, 0);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].ammo, 2);
        assert!(!is_win(&new_slots));
    }

    #[test]
    fn deadlock_when_conveyor_full_and_no_shot_possible() {
        let slots = cg(vec![vec![Some(1)]]);
        let shooters = vec![Shooter { color: 0, ammo: 1, pos: 0 }];
        let full_cfg = GameConfig {
            conveyor_capacity: 1,
            ..cfg()
        };
        assert!(is_deadlock(&slots, &shooters, &full_cfg));
        assert!(!any_shot_possible(&slots, &shooters));
    }
}
