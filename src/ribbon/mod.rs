//! Ribbon layout around the wrapped gift.
//!
//! The ribbon is computed from the wrapped bounding box only: [`RibbonLayout`]
//! places every anatomical point, [`RibbonLayout::curve`] strings them into the
//! seven tie segments, and [`sweep_segment`] turns a segment into a triangle
//! mesh with the rectangular cross-section from [`profile_outline`].
//!
//! # Example
//! ```ignore
//! use wrap_engine::fold::TieSegment;
//! use wrap_engine::ribbon::{ribbon_width, RibbonDimensions, RibbonLayout, RibbonSize};
//!
//! let width = ribbon_width(RibbonSize::M, 1.0, 2.0);
//! let dims = RibbonDimensions::new(1.04, 1.04, 2.04, 1.0, 0.02).with_ribbon_width(width);
//! let layout = RibbonLayout::compute(dims)?;
//! let knot = layout.curve(TieSegment::Knot)?;
//! assert_eq!(knot.len(), 5);
//! ```

mod layout;
mod profile;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use layout::{RibbonDimensions, RibbonLayout};
pub use profile::{ProfileSlot, SegmentStyle, build_ribbon_mesh, profile_outline, segment_style, sweep_segment};

use crate::geom::SweepError;

/// Base ribbon width as a fraction of the smaller of the two sides.
pub const WIDTH_FACTOR: f64 = 0.09;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RibbonError {
    #[error("ribbon dimensions must be finite and positive ({0})")]
    InvalidDimensions(&'static str),
    #[error("ribbon point `{0}` is not part of the layout")]
    MissingPoint(String),
    #[error("ribbon curve `{segment}` is degenerate: {reason}")]
    DegenerateCurve { segment: String, reason: String },
    #[error("unknown ribbon size `{0}`, expected S, M or L")]
    UnknownSize(String),
    #[error(transparent)]
    Sweep(#[from] SweepError),
}

/// Ribbon size preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RibbonSize {
    S,
    M,
    #[default]
    L,
}

impl RibbonSize {
    pub const ALL: [Self; 3] = [Self::S, Self::M, Self::L];

    /// Width multiplier applied to the base width.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::S => 1.0,
            Self::M => 2.5,
            Self::L => 4.0,
        }
    }

    /// Scale applied to an existing profile when switching from `self` to `to`.
    ///
    /// The factors are fixed presets; going `L → S → L` does not land exactly
    /// on the starting width.
    #[must_use]
    pub const fn transition_factor(self, to: Self) -> f64 {
        match (self, to) {
            (Self::S, Self::L) => 3.5,
            (Self::S, Self::M) => 2.5,
            (Self::M, Self::S) => 0.4,
            (Self::M, Self::L) => 1.4,
            (Self::L, Self::S) => 0.25,
            (Self::L, Self::M) => 0.625,
            _ => 1.0,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
        }
    }
}

impl fmt::Display for RibbonSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RibbonSize {
    type Err = RibbonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(Self::S),
            "M" => Ok(Self::M),
            "L" => Ok(Self::L),
            _ => Err(RibbonError::UnknownSize(s.to_owned())),
        }
    }
}

/// Ribbon width for a box whose two non-width sides are `side_d` and `side_e`.
#[must_use]
pub fn ribbon_width(size: RibbonSize, side_d: f64, side_e: f64) -> f64 {
    side_d.min(side_e) * WIDTH_FACTOR * size.multiplier()
}
