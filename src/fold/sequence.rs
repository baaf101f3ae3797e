//! Fold sequencing and driver keys.
//!
//! The fold state is a single count `0..=16`. Each step is one record; a
//! state activates every step whose index is at most the count and puts all
//! other pivots back at rest. The same records drive the keyframes placed on
//! the control's `animation` channel, followed by the gift flip and the
//! ribbon tie.

use std::fmt;

use super::FoldError;
use super::pivots::{Axis, PivotId, PivotPose};

/// Sign of the corrective translate on the third folds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateFix {
    None,
    Plus,
    Minus,
}

impl TranslateFix {
    #[must_use]
    pub const fn offset(self, fold_fix: f64) -> f64 {
        match self {
            Self::None => 0.0,
            Self::Plus => fold_fix,
            Self::Minus => -fold_fix,
        }
    }
}

/// One hinge rotation of the fold sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldStep {
    /// Fold count at which the step becomes active, `1..=16`.
    pub index: u8,
    pub pivot: PivotId,
    pub angle: f64,
    pub fix: TranslateFix,
}

impl FoldStep {
    const fn new(index: u8, pivot: PivotId, angle: f64, fix: TranslateFix) -> Self {
        Self { index, pivot, angle, fix }
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.pivot.axis()
    }

    #[must_use]
    pub const fn folded(&self, fold_fix: f64) -> PivotPose {
        PivotPose::new(self.angle, self.fix.offset(fold_fix))
    }
}

pub const FOLD_STEPS: [FoldStep; 16] = [
    FoldStep::new(1, PivotId::B1, -90.0, TranslateFix::None),
    FoldStep::new(2, PivotId::B2, -90.0, TranslateFix::None),
    FoldStep::new(3, PivotId::U1, 90.0, TranslateFix::None),
    FoldStep::new(4, PivotId::U2, 89.8, TranslateFix::None),
    FoldStep::new(5, PivotId::UL3, 178.0, TranslateFix::Plus),
    FoldStep::new(6, PivotId::BL3, 178.0, TranslateFix::Minus),
    FoldStep::new(7, PivotId::UR3, 178.0, TranslateFix::Minus),
    FoldStep::new(8, PivotId::BR3, 178.0, TranslateFix::Plus),
    FoldStep::new(9, PivotId::UL4, 178.0, TranslateFix::None),
    FoldStep::new(10, PivotId::BL4, 178.0, TranslateFix::None),
    FoldStep::new(11, PivotId::UR4, 178.0, TranslateFix::None),
    FoldStep::new(12, PivotId::BR4, 178.0, TranslateFix::None),
    FoldStep::new(13, PivotId::L5, 86.0, TranslateFix::None),
    FoldStep::new(14, PivotId::R5, -86.0, TranslateFix::None),
    FoldStep::new(15, PivotId::L6, -84.0, TranslateFix::None),
    FoldStep::new(16, PivotId::R6, 84.0, TranslateFix::None),
];

/// Driver values bracketing the folds: step `n` holds at `[n - 1]` and
/// lands at `[n]`.
pub const DRIVER_POSITIONS: [f64; 17] = [0.0, 1.0, 2.0, 3.0, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5, 10.0];

/// Corrective translate for the third folds.
#[must_use]
pub fn fold_fix(height: f64) -> f64 {
    height / 113.0
}

/// Pose of every pivot for one fold count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldState {
    folds: u8,
    poses: [PivotPose; 16],
}

impl Default for FoldState {
    fn default() -> Self {
        Self::rest()
    }
}

impl FoldState {
    #[must_use]
    pub const fn rest() -> Self {
        Self { folds: 0, poses: [PivotPose::REST; 16] }
    }

    #[must_use]
    pub const fn folds(&self) -> u8 {
        self.folds
    }

    #[must_use]
    pub const fn pose(&self, pivot: PivotId) -> PivotPose {
        self.poses[pivot.index()]
    }

    /// Move to fold count `k`.
    ///
    /// Steps up to `k` take their folded pose; every later step is reset.
    ///
    /// # Errors
    /// Returns [`FoldError::InvalidFoldCount`] when `k > 16`.
    pub fn apply(&mut self, k: u8, fold_fix: f64) -> Result<(), FoldError> {
        if usize::from(k) > FOLD_STEPS.len() {
            return Err(FoldError::InvalidFoldCount(k));
        }
        for step in &FOLD_STEPS {
            self.poses[step.pivot.index()] = if step.index <= k { step.folded(fold_fix) } else { PivotPose::REST };
        }
        self.folds = k;
        Ok(())
    }
}

/// Fold state for count `k`, starting from rest.
///
/// # Errors
/// Returns [`FoldError::InvalidFoldCount`] when `k > 16`.
pub fn apply_fold_state(k: u8, fold_fix: f64) -> Result<FoldState, FoldError> {
    let mut state = FoldState::rest();
    state.apply(k, fold_fix)?;
    Ok(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Ribbon tie
// ─────────────────────────────────────────────────────────────────────────────

/// Ribbon extrusions revealed by the tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TieSegment {
    Up,
    Down,
    Left,
    Right,
    BowLeft,
    BowRight,
    Knot,
}

impl TieSegment {
    pub const ALL: [Self; 7] = [Self::Up, Self::Down, Self::Left, Self::Right, Self::BowLeft, Self::BowRight, Self::Knot];

    /// Segment name used in node names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Up => "1U",
            Self::Down => "1D",
            Self::Left => "2L",
            Self::Right => "2R",
            Self::BowLeft => "3L",
            Self::BowRight => "3R",
            Self::Knot => "4",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Tie stage (1..=4) that reveals this segment.
    #[must_use]
    pub const fn stage(self) -> u8 {
        match self {
            Self::Up | Self::Down => 1,
            Self::Left | Self::Right => 2,
            Self::BowLeft | Self::BowRight => 3,
            Self::Knot => 4,
        }
    }
}

impl fmt::Display for TieSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reveal keys placed at one driver value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TieStep {
    pub driver: f64,
    pub keys: &'static [(TieSegment, f64)],
}

pub const TIE_STEPS: [TieStep; 5] = [
    TieStep { driver: 11.0, keys: &[(TieSegment::Up, 0.0), (TieSegment::Down, 0.0)] },
    TieStep {
        driver: 12.0,
        keys: &[(TieSegment::Up, 1.0), (TieSegment::Down, 1.0), (TieSegment::Left, 0.0), (TieSegment::Right, 0.0)],
    },
    TieStep {
        driver: 13.0,
        keys: &[
            (TieSegment::Left, 1.0),
            (TieSegment::Right, 1.0),
            (TieSegment::BowLeft, 0.0),
            (TieSegment::BowRight, 0.0),
        ],
    },
    TieStep {
        driver: 14.0,
        keys: &[(TieSegment::BowLeft, 1.0), (TieSegment::BowRight, 1.0), (TieSegment::Knot, 0.0)],
    },
    TieStep {
        driver: 15.0,
        keys: &[(TieSegment::BowLeft, 1.0), (TieSegment::BowRight, 1.0), (TieSegment::Knot, 1.0)],
    },
];

/// Reveal value of every segment after `stages` tie stages.
#[must_use]
pub fn tie_reveal(stages: u8) -> [(TieSegment, f64); 7] {
    TieSegment::ALL.map(|s| (s, if s.stage() <= stages { 1.0 } else { 0.0 }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Driver keys
// ─────────────────────────────────────────────────────────────────────────────

/// Animated channel of a keyed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    RotateX,
    RotateZ,
    TranslateX,
    TranslateY,
    Reveal,
}

impl Channel {
    #[must_use]
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::RotateX => "rotateX",
            Self::RotateZ => "rotateZ",
            Self::TranslateX => "translateX",
            Self::TranslateY => "translateY",
            Self::Reveal => "maxValue",
        }
    }

    #[must_use]
    pub const fn for_axis(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::RotateX,
            Axis::Z => Self::RotateZ,
        }
    }
}

/// Node a driven key is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyTarget {
    Pivot(PivotId),
    Gift,
    Ribbon(TieSegment),
}

/// One key on the driver curve of `target.channel`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivenKey {
    pub target: KeyTarget,
    pub channel: Channel,
    pub driver: f64,
    pub value: f64,
}

impl DrivenKey {
    const fn new(target: KeyTarget, channel: Channel, driver: f64, value: f64) -> Self {
        Self { target, channel, driver, value }
    }
}

/// Every driven key of a wrap: the sixteen folds on `0..10`, the gift flip
/// on `10..11` and the ribbon tie on `11..15`.
#[must_use]
pub fn driver_schedule(fold_fix: f64, gift_height: f64) -> Vec<DrivenKey> {
    let mut keys = Vec::new();
    for step in &FOLD_STEPS {
        let n = usize::from(step.index);
        let (hold, land) = (DRIVER_POSITIONS[n - 1], DRIVER_POSITIONS[n]);
        let target = KeyTarget::Pivot(step.pivot);
        let channel = Channel::for_axis(step.axis());
        let folded = step.folded(fold_fix);
        keys.push(DrivenKey::new(target, channel, hold, 0.0));
        keys.push(DrivenKey::new(target, channel, land, folded.rotation));
        if step.fix != TranslateFix::None {
            keys.push(DrivenKey::new(target, Channel::TranslateX, hold, 0.0));
            keys.push(DrivenKey::new(target, Channel::TranslateX, land, folded.translate_x));
        }
    }

    keys.extend([
        DrivenKey::new(KeyTarget::Gift, Channel::RotateX, 10.0, 0.0),
        DrivenKey::new(KeyTarget::Gift, Channel::RotateX, 11.0, 180.0),
        DrivenKey::new(KeyTarget::Gift, Channel::TranslateY, 10.0, 0.0),
        DrivenKey::new(KeyTarget::Gift, Channel::TranslateY, 10.5, gift_height / 2.0),
        DrivenKey::new(KeyTarget::Gift, Channel::TranslateY, 11.0, 0.0),
    ]);

    for step in &TIE_STEPS {
        for &(segment, value) in step.keys {
            keys.push(DrivenKey::new(KeyTarget::Ribbon(segment), Channel::Reveal, step.driver, value));
        }
    }
    log::debug!("driver schedule: {} keys", keys.len());
    keys
}
