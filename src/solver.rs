//! BFS solver over `(top, slots, shooters)` states, certifying that a
//! level admits a winning action sequence and reconstructing one.

use crate::components::components_by_color;
use crate::grid::{ColorGrid, Position};
use crate::simulator::{self, GameConfig, Shooter};
use itertools::Itertools;
use std::collections::{HashMap, VecDeque};

/// An action the solver considers at an expanded state: tap a component's
/// top-leftmost cell, or let a tick pass without tapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Tap(Position),
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveReason {
    AlreadyClear,
    Solved,
    SearchExhausted,
    MaxExpanded,
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub solvable: bool,
    pub steps: Option<usize>,
    pub expanded: usize,
    pub reason: SolveReason,
    pub solution: Option<Vec<Action>>,
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub max_expanded: usize,
    pub max_steps: usize,
    pub allow_wait: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            max_expanded: 50_000,
            max_steps: 80,
            allow_wait: true,
        }
    }
}

/// Canonical, hashable encoding of a `(top, slots, shooters)` state: grids
/// flattened row-major with `-1` for empty, shooters as a sorted tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StateKey {
    top: Vec<i16>,
    slots: Vec<i16>,
    shooters: Vec<(usize, u8, usize)>,
}

fn encode_grid(grid: &ColorGrid) -> Vec<i16> {
    grid.rows()
        .into_iter()
        .flatten()
        .map(|c| c.map(|v| v as i16).unwrap_or(-1))
        .collect()
}

fn encode_shooters(shooters: &[Shooter]) -> Vec<(usize, u8, usize)> {
    let mut out: Vec<(usize, u8, usize)> = shooters.iter().map(|s| (s.pos, s.color, s.ammo)).collect();
    out.sort_unstable();
    out
}

fn encode_state(top: &ColorGrid, slots: &ColorGrid, shooters: &[Shooter]) -> StateKey {
    StateKey {
        top: encode_grid(top),
        slots: encode_grid(slots),
        shooters: encode_shooters(shooters),
    }
}

/// All top components' top-leftmost cells, largest component first, then
/// by top-leftmost cell.
fn tap_actions(top: &ColorGrid) -> Vec<Action> {
    let top_leftmost = |pts: &[Position]| {
        pts.iter()
            .map(|p| (p.y, p.x))
            .min()
            .expect("component is non-empty")
    };
    components_by_color(top)
        .into_iter()
        .map(|(_, pts)| (std::cmp::Reverse(pts.len()), top_leftmost(&pts)))
        .sorted()
        .map(|(_, (y, x))| Action::Tap(Position::new(x, y)))
        .collect()
}

/// BFS over reachable `(top, slots, shooters)` states, certifying that `top`
/// and `slots` admit a winning tap/wait sequence. Bounded by
/// `opts.max_expanded` expansions and `opts.max_steps` depth.
pub fn solve(
    top: &ColorGrid,
    slots: &ColorGrid,
    shooters: &[Shooter],
    config: &GameConfig,
    opts: &SolveOptions,
) -> SolveResult {
    if simulator::is_win(slots) {
        return SolveResult {
            solvable: true,
            steps: Some(0),
            expanded: 0,
            reason: SolveReason::AlreadyClear,
            solution: Some(Vec::new()),
        };
    }

    let root_key = encode_state(top, slots, shooters);
    let mut visited: HashMap<StateKey, usize> = HashMap::new();
    visited.insert(root_key.clone(), 0);
    let mut prev: HashMap<StateKey, (StateKey, Action)> = HashMap::new();

    let mut queue: VecDeque<(ColorGrid, ColorGrid, Vec<Shooter>, StateKey, usize)> = VecDeque::new();
    queue.push_back((top.clone(), slots.clone(), shooters.to_vec(), root_key, 0));

    let mut expanded = 0usize;

    while let Some((cur_top, cur_slots, cur_shooters, cur_key, depth)) = queue.pop_front() {
        if expanded >= opts.max_expanded {
            return SolveResult {
                solvable: false,
                steps: None,
                expanded,
                reason: SolveReason::MaxExpanded,
                solution: None,
            };
        }
        expanded += 1;
        if expanded.is_power_of_two() {
            log::debug!("solve: expanded {expanded} states, queue depth {depth}");
        }

        let mut actions = tap_actions(&cur_top);
        if opts.allow_wait {
            actions.push(Action::Wait);
        }

        for action in actions {
            log::trace!("solve: considering {action:?} at depth {depth}");
            let (tapped_top, tapped_shooters) = match action {
                Action::Tap(pos) => match simulator::tap(&cur_top, &cur_shooters, pos, config) {
                    Some(result) => result,
                    None => continue,
                },
                Action::Wait => (cur_top.clone(), cur_shooters.clone()),
            };

            let (new_top, new_slots, new_shooters, _shots) =
                simulator::tick(&tapped_top, &cur_slots, &tapped_shooters, config);

            if simulator::is_win(&new_slots) {
                let mut path = vec![action];
                let mut cursor = cur_key.clone();
                while let Some((parent, taken)) = prev.get(&cursor) {
                    path.push(*taken);
                    cursor = parent.clone();
                }
                path.reverse();
                log::debug!(
                    "solve: solved in {} steps after expanding {expanded} states",
                    depth + 1
                );
                return SolveResult {
                    solvable: true,
                    steps: Some(depth + 1),
                    expanded,
                    reason: SolveReason::Solved,
                    solution: Some(path),
                };
            }

            if simulator::is_deadlock(&new_slots, &new_shooters, config) {
                continue;
            }

            let new_depth = depth + 1;
            if new_depth > opts.max_steps {
                continue;
            }

            let new_key = encode_state(&new_top, &new_slots, &new_shooters);
            if visited.contains_key(&new_key) {
                continue;
            }
            visited.insert(new_key.clone(), new_depth);
            prev.insert(new_key.clone(), (cur_key.clone(), action));
            queue.push_back((new_top, new_slots, new_shooters, new_key, new_depth));
        }
    }

    log::debug!("solve: search exhausted after expanding {expanded} states");
    SolveResult {
        solvable: false,
        steps: None,
        expanded,
        reason: SolveReason::SearchExhausted,
        solution: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, Grid};

    fn cg(rows: Vec<Vec<Cell>>) -> ColorGrid {
        Grid::from_rows(rows).unwrap()
    }

    fn cfg(capacity: usize) -> GameConfig {
        GameConfig {
            conveyor_capacity: capacity,
            entrance_pos: 0,
            move_then_fire: false,
        }
    }

    #[test]
    fn trivial_1x1_level_is_solved_by_tapping() {
        let top = cg(vec![vec![Some(0)]]);
        let slots = cg(vec![vec![Some(0)]]);
        let result = solve(&top, &slots, &[], &cfg(3), &SolveOptions::default());
        assert!(result.solvable);
        assert!(result.steps.unwrap() >= 1);
        let solution = result.solution.unwrap();
        assert_eq!(solution[0], Action::Tap(Position::new(0, 0)));
    }

    #[test]
    fn empty_top_with_a_slot_is_unsolvable() {
        let top = cg(vec![vec![None]]);
        let slots = cg(vec![vec![Some(0)]]);
        let opts = SolveOptions {
            max_expanded: 100,
            ..SolveOptions::default()
        };
        let result = solve(&top, &slots, &[], &cfg(3), &opts);
        assert!(!result.solvable);
        assert!(matches!(
            result.reason,
            SolveReason::SearchExhausted | SolveReason::MaxExpanded
        ));
    }

    #[test]
    fn already_clear_short_circuits_with_zero_steps() {
        let top = cg(vec![vec![None]]);
        let slots = cg(vec![vec![None]]);
        let result = solve(&top, &slots, &[], &cfg(3), &SolveOptions::default());
        assert!(result.solvable);
        assert_eq!(result.steps, Some(0));
        assert_eq!(result.reason, SolveReason::AlreadyClear);
        assert_eq!(result.solution, Some(Vec::new()));
    }

    #[test]
    fn two_cell_level_solves_within_a_couple_of_ticks() {
        let _ = env_logger::try_init();
        let top = cg(vec![vec![Some(0), Some(1)]]);
        let slots = cg(vec![vec![Some(1), Some(0)]]);
        let result = solve(&top, &slots, &[], &cfg(3), &SolveOptions::default());
        assert!(result.solvable);

        // Replaying the action sequence should actually clear the slots.
        let mut cur_top = top;
        let mut cur_slots = slots;
        let mut cur_shooters: Vec<Shooter> = Vec::new();
        for action in result.solution.unwrap() {
            if let Action::Tap(pos) = action {
                if let Some((t, s)) = simulator::tap(&cur_top, &cur_shooters, pos, &cfg(3)) {
                    cur_top = t;
                    cur_shooters = s;
                }
            }
            let (t, s, sh, _) = simulator::tick(&cur_top, &cur_slots, &cur_shooters, &cfg(3));
            cur_top = t;
            cur_slots = s;
            cur_shooters = sh;
        }
        assert!(simulator::is_win(&cur_slots));
    }
}
