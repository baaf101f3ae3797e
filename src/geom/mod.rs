//! Geometry kernel for the wrap rig: vector math, the editable fold-plane
//! mesh, polylines and profile sweeps.

mod core;
mod curve;
mod mesh;
mod poly;
mod sweep;

pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use curve::Polyline3;
pub use mesh::GeomMesh;
pub use poly::{Lattice, PolyDiagnostics, PolyEdge, PolyFace, PolyMesh, PolyVertex, TopologyError};
pub use sweep::{SweepDiagnostics, SweepError, SweepOptions, sweep_profile};

#[cfg(test)]
mod tests;
