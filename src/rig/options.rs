//! Run-time options for creating a wrap.

use super::color::ColorChoice;
use crate::ribbon::RibbonSize;

/// Thinnest paper the rig will build; thinner requests are clamped.
pub const MIN_THICKNESS: f64 = 0.02;

/// Options for [`GiftWrap::create`](super::GiftWrap::create).
#[derive(Debug, Clone, PartialEq)]
pub struct WrapOptions {
    pub ribbon_size: RibbonSize,
    /// Paper thickness in scene units; the ribbon uses the same value.
    pub thickness: f64,
    pub paper_color: ColorChoice,
    pub ribbon_color: ColorChoice,
    pub anim_start: i32,
    pub anim_end: i32,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            ribbon_size: RibbonSize::L,
            thickness: MIN_THICKNESS,
            paper_color: ColorChoice::Random,
            ribbon_color: ColorChoice::Random,
            anim_start: 1,
            anim_end: 24,
        }
    }
}

impl WrapOptions {
    #[must_use]
    pub const fn with_thickness(mut self, thickness: f64) -> Self {
        self.thickness = thickness;
        self
    }

    #[must_use]
    pub const fn with_ribbon_size(mut self, size: RibbonSize) -> Self {
        self.ribbon_size = size;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, paper: ColorChoice, ribbon: ColorChoice) -> Self {
        self.paper_color = paper;
        self.ribbon_color = ribbon;
        self
    }

    #[must_use]
    pub const fn with_animation_range(mut self, start: i32, end: i32) -> Self {
        self.anim_start = start;
        self.anim_end = end;
        self
    }

    /// Thickness after the floor is applied.
    #[must_use]
    pub fn effective_thickness(&self) -> f64 {
        if self.thickness.is_finite() && self.thickness > MIN_THICKNESS { self.thickness } else { MIN_THICKNESS }
    }
}
