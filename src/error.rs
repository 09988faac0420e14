//! Error taxonomy shared by every component in the crate.
//!
//! Variants are ordered by severity, matching the design note that callers
//! should be able to match on the variant rather than parse message text.

use thiserror::Error;

/// Why a derangement-style recoloring could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibleReason {
    /// A single color accounts for more than half of the occupied cells.
    DominantColor {
        color: u8,
        count: usize,
        total: usize,
    },
    /// Only one distinct color is occupied; no cell can differ from it.
    SingleColor,
}

impl std::fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibleReason::DominantColor {
                color,
                count,
                total,
            } => write!(
                f,
                "dominant color {color} has {count}/{total} occupied cells (>50%)"
            ),
            InfeasibleReason::SingleColor => {
                write!(f, "only one color is occupied; no per-cell mismatch is possible")
            }
        }
    }
}

/// The crate-wide error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PsldError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("infeasible: {0}")]
    Infeasible(InfeasibleReason),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PsldError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PsldError::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        PsldError::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PsldError>;
