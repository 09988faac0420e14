//! Seeded fuzz test: throws random rectangular masks at the lane-reachability
//! ordering and the derangement slots derivation, checking structural
//! properties rather than any fixed oracle.

use anyhow::Context;
use laneclear::derangement::{derive_slots, SlotsMode};
use laneclear::error::{InfeasibleReason, PsldError};
use laneclear::grid::{ColorGrid, Grid, Mask};
use laneclear::reachability::{generate_backward_place_order, verify_forward_remove_order};
use rand::{Rng, SeedableRng};

fn random_mask(rng: &mut impl Rng, max_dim: usize) -> Mask {
    let w = rng.gen_range(1..=max_dim);
    let h = rng.gen_range(1..=max_dim);
    let mut rows = vec![vec![false; w]; h];
    let mut any = false;
    for row in rows.iter_mut() {
        for cell in row.iter_mut() {
            *cell = rng.gen_bool(0.6);
            any |= *cell;
        }
    }
    if !any {
        rows[0][0] = true;
    }
    Grid::from_rows(rows).expect("random_mask builds a rectangular grid")
}

fn random_top(rng: &mut impl Rng, mask: &Mask, num_colors: u8) -> ColorGrid {
    let rows = mask
        .rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|occ| if occ { Some(rng.gen_range(0..num_colors)) } else { None })
                .collect()
        })
        .collect();
    Grid::from_rows(rows).expect("random_top builds a rectangular grid")
}

#[test]
fn reachability_ordering_is_sound_on_random_masks() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    for case in 0..500 {
        let mask = random_mask(&mut rng, 12);
        let backward: Vec<_> = generate_backward_place_order(&mask)
            .map_err(|e| anyhow::anyhow!(e.to_string()))
            .with_context(|| format!("fuzz case {case}: backward order failed"))
            .unwrap();

        let occupied: usize = mask
            .rows()
            .into_iter()
            .flatten()
            .filter(|&occ| occ)
            .count();
        assert_eq!(
            backward.len(),
            occupied,
            "fuzz case {case}: backward order length mismatch"
        );

        let mut forward = backward.clone();
        forward.reverse();
        verify_forward_remove_order(&mask, &forward)
            .unwrap_or_else(|e| panic!("fuzz case {case}: verification failed: {e}"));
    }
}

#[test]
fn derangement_is_sound_on_random_tops() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for case in 0..500 {
        let mask = random_mask(&mut rng, 10);
        let num_colors = rng.gen_range(2..=5);
        let top = random_top(&mut rng, &mask, num_colors);

        match derive_slots(&top, SlotsMode::Derangement) {
            Ok(slots) => {
                assert_eq!(slots.mask(), top.mask(), "fuzz case {case}: occupancy mask changed");
                for p in top.iter_positions() {
                    let t = *top.get(p.x, p.y);
                    let s = *slots.get(p.x, p.y);
                    if t.is_some() {
                        assert_ne!(t, s, "fuzz case {case}: cell ({}, {}) kept its top color", p.x, p.y);
                    }
                }
            }
            Err(PsldError::Infeasible(InfeasibleReason::DominantColor { count, total, .. })) => {
                assert!(
                    2 * count > total,
                    "fuzz case {case}: DominantColor reported without an actual majority"
                );
            }
            Err(PsldError::Infeasible(InfeasibleReason::SingleColor)) => {
                let colors: std::collections::HashSet<_> = top
                    .iter_positions()
                    .filter_map(|p| *top.get(p.x, p.y))
                    .collect();
                assert!(colors.len() <= 1, "fuzz case {case}: SingleColor reported with multiple colors present");
            }
            Err(e) => panic!("fuzz case {case}: unexpected error: {e}"),
        }
    }
}
