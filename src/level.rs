//! The `Level` type and its stable JSON schema. Every other component
//! produces or consumes the pieces a `Level` bundles together; this module
//! is the only one that touches serialization.

use crate::error::{PsldError, Result};
use crate::grid::{Cell, ColorGrid, Palette, Position};
use crate::reachability::verify_forward_remove_order;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A compiled level: a palette, the two color grids, and a reverse-time
/// placement plan certifying solvability under the lane-reachability rule.
///
/// Field order matches the sorted-key order of the JSON schema in the
/// external interfaces section, so deriving `Serialize` emits sorted keys
/// without a secondary sort pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub backward_place_order: Vec<Position>,
    pub forward_remove_order: Vec<Position>,
    pub h: usize,
    #[serde(rename = "meta")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub palette: Palette,
    pub slots: ColorGrid,
    pub top: ColorGrid,
    pub version: u32,
    pub w: usize,
}

impl Level {
    /// Assembles a `Level` from its already-derived pieces. Does not
    /// validate; call [`Level::validate`] before trusting the result.
    pub fn new(
        palette: Palette,
        top: ColorGrid,
        slots: ColorGrid,
        backward_place_order: Vec<Position>,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Result<Level> {
        if top.w() != slots.w() || top.h() != slots.h() {
            return Err(PsldError::validation("top and slots must share dimensions"));
        }
        let mut forward_remove_order = backward_place_order.clone();
        forward_remove_order.reverse();
        Ok(Level {
            version: 1,
            w: top.w(),
            h: top.h(),
            palette,
            top,
            slots,
            backward_place_order,
            forward_remove_order,
            metadata,
        })
    }

    /// Converts to a `serde_json::Value` with sorted keys, `null` for empty
    /// cells, and `{"x":..,"y":..}` positions.
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| PsldError::internal(format!("level serialization failed: {e}")))
    }

    /// Renders the level as a JSON string with sorted keys.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| PsldError::internal(format!("level serialization failed: {e}")))
    }

    /// Checks every invariant, returning the first violation found rather
    /// than an aggregated list.
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PsldError::validation(format!("unsupported level version {}", self.version)));
        }
        if self.w == 0 || self.h == 0 {
            return Err(PsldError::validation("level dimensions must be positive"));
        }
        if self.top.w() != self.w || self.top.h() != self.h {
            return Err(PsldError::validation("top grid dimensions do not match level w/h"));
        }
        if self.slots.w() != self.w || self.slots.h() != self.h {
            return Err(PsldError::validation("slots grid dimensions do not match level w/h"));
        }

        let mut top_hist: BTreeMap<u8, usize> = BTreeMap::new();
        let mut slots_hist: BTreeMap<u8, usize> = BTreeMap::new();
        let mut occupied = 0usize;
        for p in self.top.iter_positions() {
            let t: Cell = *self.top.get(p.x, p.y);
            let s: Cell = *self.slots.get(p.x, p.y);
            if t.is_some() != s.is_some() {
                return Err(PsldError::validation(format!(
                    "top and slots disagree on occupancy at ({}, {})",
                    p.x, p.y
                )));
            }
            if let Some(tc) = t {
                *top_hist.entry(tc).or_insert(0) += 1;
                occupied += 1;
            }
            if let Some(sc) = s {
                *slots_hist.entry(sc).or_insert(0) += 1;
                if t == s {
                    return Err(PsldError::validation(format!(
                        "slot at ({}, {}) keeps its top color",
                        p.x, p.y
                    )));
                }
            }
            for idx in [t, s].into_iter().flatten() {
                if self.palette.get(idx).is_none() {
                    return Err(PsldError::validation(format!(
                        "color index {idx} out of range for a palette of length {}",
                        self.palette.len()
                    )));
                }
            }
        }
        if top_hist != slots_hist {
            return Err(PsldError::validation(
                "top and slots per-color occupancy histograms differ",
            ));
        }

        if self.backward_place_order.len() != occupied {
            return Err(PsldError::validation(format!(
                "backward_place_order has {} entries but {occupied} cells are occupied",
                self.backward_place_order.len()
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for p in &self.backward_place_order {
            if !self.top.in_bounds(p.x, p.y) || self.top.get(p.x, p.y).is_none() {
                return Err(PsldError::validation(format!(
                    "backward_place_order references an unoccupied or out-of-bounds cell ({}, {})",
                    p.x, p.y
                )));
            }
            if !seen.insert(*p) {
                return Err(PsldError::validation(format!(
                    "backward_place_order repeats cell ({}, {})",
                    p.x, p.y
                )));
            }
        }
        if self.forward_remove_order.len() != self.backward_place_order.len() {
            return Err(PsldError::validation(
                "forward_remove_order length does not match backward_place_order",
            ));
        }
        let mut reversed = self.backward_place_order.clone();
        reversed.reverse();
        if reversed != self.forward_remove_order {
            return Err(PsldError::validation(
                "forward_remove_order is not the reverse of backward_place_order",
            ));
        }
        verify_forward_remove_order(&self.top.mask(), &self.forward_remove_order)?;

        Ok(())
    }
}

impl TryFrom<serde_json::Value> for Level {
    type Error = PsldError;
    fn try_from(value: serde_json::Value) -> Result<Level> {
        serde_json::from_value(value).map_err(|e| PsldError::validation(format!("invalid level JSON: {e}")))
    }
}
