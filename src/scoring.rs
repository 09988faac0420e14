//! Deterministic scoring used to pick among mask candidates an external
//! generator proposes.

use crate::grid::Mask;
use crate::simulator::perimeter_len;

const COMPACT_WEIGHT: f32 = 3.0;
const SYMMETRY_WEIGHT: f32 = 2.0;
const TOUCH_PENALTY_WEIGHT: f32 = -2.0;

fn bounding_box(mask: &Mask) -> Option<(usize, usize, usize, usize)> {
    let mut minx = None;
    let mut maxx = None;
    let mut miny = None;
    let mut maxy = None;
    for p in mask.iter_positions() {
        if *mask.get(p.x, p.y) {
            minx = Some(minx.map_or(p.x, |v: usize| v.min(p.x)));
            maxx = Some(maxx.map_or(p.x, |v: usize| v.max(p.x)));
            miny = Some(miny.map_or(p.y, |v: usize| v.min(p.y)));
            maxy = Some(maxy.map_or(p.y, |v: usize| v.max(p.y)));
        }
    }
    Some((minx?, maxx?, miny?, maxy?))
}

fn compactness(mask: &Mask, area: usize) -> f32 {
    match bounding_box(mask) {
        Some((minx, maxx, miny, maxy)) => {
            let bbox_area = (maxx - minx + 1) * (maxy - miny + 1);
            area as f32 / bbox_area as f32
        }
        None => 0.0,
    }
}

fn horizontal_symmetry(mask: &Mask) -> f32 {
    let w = mask.w();
    let h = mask.h();
    let half = w / 2;
    if half == 0 {
        return 1.0;
    }
    let mut agree = 0usize;
    let mut total = 0usize;
    for y in 0..h {
        for x in 0..half {
            total += 1;
            if *mask.get(x, y) == *mask.get(w - 1 - x, y) {
                agree += 1;
            }
        }
    }
    if total == 0 {
        1.0
    } else {
        agree as f32 / total as f32
    }
}

fn boundary_touch_penalty(mask: &Mask) -> f32 {
    let w = mask.w();
    let h = mask.h();
    let mut touching = 0usize;
    for x in 0..w {
        if *mask.get(x, 0) {
            touching += 1;
        }
        if h > 1 && *mask.get(x, h - 1) {
            touching += 1;
        }
    }
    for y in 1..h.saturating_sub(1) {
        if *mask.get(0, y) {
            touching += 1;
        }
        if w > 1 && *mask.get(w - 1, y) {
            touching += 1;
        }
    }
    let l = perimeter_len(w, h).max(1);
    touching as f32 / l as f32
}

/// In the top quarter of rows, finds the first row with any foreground and
/// counts contiguous foreground segments in it, scoring a graduated bonus
/// that peaks at exactly 2 segments (a pair of cat/kitten ears).
fn ear_bump_bonus(mask: &Mask) -> f32 {
    let w = mask.w();
    let h = mask.h();
    let quarter = (h / 4).max(1);
    for y in 0..quarter.min(h) {
        let mut segments = 0usize;
        let mut in_segment = false;
        let mut any = false;
        for x in 0..w {
            let occ = *mask.get(x, y);
            any |= occ;
            if occ && !in_segment {
                segments += 1;
                in_segment = true;
            } else if !occ {
                in_segment = false;
            }
        }
        if any {
            return match segments {
                2 => 1.0,
                1 | 3 => 0.5,
                _ => 0.0,
            };
        }
    }
    0.0
}

fn wants_ear_bump(keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|k| k.eq_ignore_ascii_case("cat") || k.eq_ignore_ascii_case("kitten"))
}

/// A deterministic scalar combining bounding-box compactness, horizontal
/// symmetry, a border-touch penalty, and optional per-keyword heuristics.
pub fn score_mask_candidate(mask: &Mask, keywords: &[String]) -> f32 {
    let area = mask
        .iter_positions()
        .filter(|p| *mask.get(p.x, p.y))
        .count();
    let mut score = COMPACT_WEIGHT * compactness(mask, area)
        + SYMMETRY_WEIGHT * horizontal_symmetry(mask)
        + TOUCH_PENALTY_WEIGHT * boundary_touch_penalty(mask);
    if wants_ear_bump(keywords) {
        score += ear_bump_bonus(mask);
    }
    score
}

/// Picks the arg-max index among `masks` (first on ties, since comparison
/// is a strict `>`). Returns `0` if `masks` is empty (the caller should not
/// call this without at least one candidate).
pub fn score_mask_candidates(masks: &[Mask], keywords: &[String]) -> usize {
    let mut best_idx = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, mask) in masks.iter().enumerate() {
        let score = score_mask_candidate(mask, keywords);
        if score > best_score {
            best_score = score;
            best_idx = i;
        }
    }
    best_idx
}
