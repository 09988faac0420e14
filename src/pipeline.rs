//! Orchestrates the core's data flow end to end: a boolean silhouette mask
//! in, a certified [`Level`] out.

use crate::colorize::{colorize_mask, ColorizeMode};
use crate::denoise::remove_small_foreground_components;
use crate::derangement::{derive_slots, SlotsMode};
use crate::error::Result;
use crate::grid::Mask;
use crate::level::Level;
use crate::reachability::generate_backward_place_order;
use crate::rebalance::{rebalance_top_for_derangement, RebalanceOptions};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub palette_size: usize,
    pub colorize_mode: ColorizeMode,
    /// `<= 1` disables denoising.
    pub denoise_min_size: usize,
    pub rebalance: RebalanceOptions,
    pub slots_mode: SlotsMode,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            palette_size: 5,
            colorize_mode: ColorizeMode::Quadrants,
            denoise_min_size: 0,
            rebalance: RebalanceOptions::default(),
            slots_mode: SlotsMode::Derangement,
        }
    }
}

/// Compiles a boolean silhouette mask into a certified, playable [`Level`]:
/// optional denoise → colorize → rebalance → derive slots → lane-reachability
/// ordering → validate.
pub fn compile_level(mask: &Mask, opts: &CompileOptions) -> Result<Level> {
    let denoised = remove_small_foreground_components(mask, opts.denoise_min_size);
    let (palette, top0) = colorize_mask(&denoised, opts.palette_size, opts.colorize_mode)?;
    let rebalanced = rebalance_top_for_derangement(&top0, &opts.rebalance)?;
    let top = rebalanced.top;
    let slots = derive_slots(&top, opts.slots_mode)?;
    let backward_place_order = generate_backward_place_order(&top.mask())?;

    let level = Level::new(palette, top, slots, backward_place_order, BTreeMap::new())?;
    level.validate()?;
    Ok(level)
}
