//! Folding pattern, fold-plane mesh and fold sequencing.
//!
//! The pipeline runs one way: [`normalize`] picks the box orientation,
//! [`FoldingPattern::solve`] derives every named fold point, [`build_fold_mesh`]
//! turns the points into the keyed fold plane, and the pivot, cluster and
//! sequence modules describe how the plane creases around the box.
//!
//! # Example
//! ```ignore
//! use wrap_engine::fold::{build_fold_mesh, BoxExtent, FoldingPattern};
//!
//! let extent = BoxExtent::new(1.0, 1.0, 1.0);
//! let mut pattern = FoldingPattern::solve(extent, 0.02)?;
//! let plane = build_fold_mesh(&mut pattern)?;
//! assert_eq!(plane.vertex_count(), 40);
//! ```

mod builder;
mod clusters;
mod normalize;
mod pattern;
mod pivots;
mod sequence;
pub mod tables;

pub use builder::{FoldMesh, FoldMeshDiagnostics, FoldMeshOptions, build_fold_mesh, build_fold_mesh_with};
pub use clusters::{ClusterSet, FoldCluster, cluster_keys, derive_clusters};
pub use normalize::{BoxExtent, FaceArea, Orientation, normalize};
pub use pattern::{FoldPoint, FoldTopology, FoldingPattern, PatternParams};
pub use pivots::{Axis, PivotId, PivotPoint, PivotPose, PivotSet, derive_pivots};
pub use sequence::{
    Channel, DRIVER_POSITIONS, DrivenKey, FOLD_STEPS, FoldState, FoldStep, KeyTarget, TIE_STEPS, TieSegment, TieStep,
    TranslateFix, apply_fold_state, driver_schedule, fold_fix, tie_reveal,
};

use crate::geom::TopologyError;

/// Failures raised by the fold pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FoldError {
    #[error("box extents must be finite and positive, got {width} x {height} x {depth}")]
    InvalidExtent { width: f64, height: f64, depth: f64 },
    #[error("thickness must be finite and positive, got {0}")]
    InvalidThickness(f64),
    #[error("fold point `{0}` does not exist in this topology")]
    MissingPoint(String),
    #[error("fold point `{0}` has no vertex index yet")]
    UnindexedPoint(String),
    #[error("fold point `{0}` already has a vertex index")]
    IndexReassigned(String),
    #[error("fold-plane vertex `{0}` is not at its fold point")]
    MisplacedVertex(String),
    #[error("fold count {0} is outside 0..=16")]
    InvalidFoldCount(u8),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}
