#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Procedural gift-wrap rig.
//!
//! Given a box-shaped node in a scene, the crate solves a folding pattern
//! for a sheet of paper, builds the fold plane and its hinge clusters, lays
//! out a ribbon with a bow, and wires everything to a single `animation`
//! driver so the paper folds around the box and the ribbon ties itself.
//!
//! - [`geom`]: vectors, transforms, the editable polygon mesh, polylines and sweeps.
//! - [`fold`]: orientation, folding pattern, fold plane, pivots, clusters and the fold sequence.
//! - [`ribbon`]: ribbon width, layout points, profiles and sweeps.
//! - [`host`]: the [`SceneHost`](host::SceneHost) capability trait and the in-memory scene.
//! - [`rig`]: the [`GiftWrap`](rig::GiftWrap) facade, persisted state and batch tools.

pub mod fold;
pub mod geom;
pub mod host;
pub mod ribbon;
pub mod rig;

pub use rig::{GiftWrap, WrapError, WrapOptions};

/// Trace output for the fold pipeline, compiled in with the `debug_logs`
/// feature and routed through `log::debug!`.
#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        if cfg!(feature = "debug_logs") {
            ::log::debug!($($t)*);
        }
    }};
}
