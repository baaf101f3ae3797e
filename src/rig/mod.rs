//! The gift-wrap rig: creation, persistence, edits and batch tools.
//!
//! A wrap is built on a [`SceneHost`](crate::host::SceneHost) around one
//! target node and stores its settings on its control handle, so a later
//! session can rebuild a [`GiftWrap`] from the handle name alone.
//!
//! # Example
//! ```ignore
//! use wrap_engine::host::MemoryScene;
//! use wrap_engine::rig::{GiftWrap, WrapOptions};
//!
//! let mut scene = MemoryScene::new();
//! scene.create_box("present", [2.0, 1.0, 3.0].into(), [0.0, 0.5, 0.0].into())?;
//! let wrap = GiftWrap::wrap(&mut scene, "present", &WrapOptions::default())?;
//! wrap.fold_to(&mut scene, 8)?;
//! ```

mod batch;
mod color;
mod naming;
mod options;
mod state;
mod wrap;

pub use batch::{
    MAX_BATCH, ScanReport, edit_animation, edit_colors, edit_paper_weight, edit_ribbon_size, render_scan_table,
    scan_wraps, wrap_all,
};
pub use color::{ColorChoice, Palette, PaperColor, RibbonColor};
pub use naming::{ID_LEN, WrapNames, control_name, generate_id, is_valid_id};
pub use options::{MIN_THICKNESS, WrapOptions};
pub use state::{ATTR_ANIMATION, STATE_ATTRIBUTES, StateError, WrapState};
pub use wrap::{ANIMATION_END, GiftWrap};

use crate::fold::FoldError;
use crate::host::HostError;
use crate::ribbon::RibbonError;

/// Failures of the wrap facade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WrapError {
    /// The node to wrap does not exist; nothing was changed.
    #[error("cannot wrap `{0}`: no such node")]
    NodeNotFound(String),
    #[error("fold pipeline failed: {0}")]
    Topology(#[from] FoldError),
    #[error("ribbon failed: {0}")]
    Ribbon(#[from] RibbonError),
    #[error("stored wrap state is unusable: {0}")]
    State(#[from] StateError),
    #[error("cannot load wrap from `{control}`: {reason}")]
    Lookup { control: String, reason: String },
    #[error(transparent)]
    Host(#[from] HostError),
}

impl WrapError {
    pub(crate) fn lookup(control: &str, reason: impl Into<String>) -> Self {
        Self::Lookup { control: control.to_owned(), reason: reason.into() }
    }
}
