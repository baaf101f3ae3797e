//! Fold-plane construction.
//!
//! Builds the base `4 x 7` grid, runs every region plan of the topology
//! (subdivide, place, weld), applies the closing merges and edge deletions,
//! and finally renumbers the vertices to the topology's vertex table.

use super::FoldError;
use super::pattern::{FoldTopology, FoldingPattern};
use super::tables::{BASE_ROWS, grid_key};
use crate::geom::{GeomMesh, Point3, PolyMesh, Tolerance};

/// Validation switches for [`build_fold_mesh_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldMeshOptions {
    /// Reject edges shared by more than two faces.
    pub check_manifold: bool,
    /// Reject vertices that moved away from their fold point.
    pub check_positions: bool,
    pub tolerance: Tolerance,
}

impl Default for FoldMeshOptions {
    fn default() -> Self {
        Self { check_manifold: true, check_positions: true, tolerance: Tolerance::LOOSE }
    }
}

impl FoldMeshOptions {
    #[must_use]
    pub const fn with_manifold_check(mut self, enabled: bool) -> Self {
        self.check_manifold = enabled;
        self
    }

    #[must_use]
    pub const fn with_position_check(mut self, enabled: bool) -> Self {
        self.check_positions = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FoldMeshDiagnostics {
    pub regions: usize,
    pub welded: usize,
    pub merged: usize,
    pub deleted_edges: usize,
    pub face_count: usize,
    pub boundary_edges: usize,
}

/// The finished fold plane.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldMesh {
    pub topology: FoldTopology,
    pub mesh: PolyMesh,
    pub diagnostics: FoldMeshDiagnostics,
}

impl FoldMesh {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Rest positions indexed by vertex number.
    #[must_use]
    pub fn positions(&self) -> Vec<Point3> {
        self.mesh.positions()
    }

    #[must_use]
    pub fn to_triangle_mesh(&self) -> GeomMesh {
        self.mesh.to_triangle_mesh().0
    }
}

/// Build the fold plane with the default checks.
///
/// # Errors
/// See [`build_fold_mesh_with`].
pub fn build_fold_mesh(pattern: &mut FoldingPattern) -> Result<FoldMesh, FoldError> {
    build_fold_mesh_with(pattern, FoldMeshOptions::default())
}

/// Build the fold plane and record each fold point's vertex index.
///
/// # Errors
/// Any topology error is a contract violation between the pattern, the
/// region plans and the vertex table of the selected topology.
pub fn build_fold_mesh_with(pattern: &mut FoldingPattern, options: FoldMeshOptions) -> Result<FoldMesh, FoldError> {
    let topology = pattern.topology();
    let plan = topology.plan();

    let mut base = Vec::with_capacity(BASE_ROWS.len() * 4);
    for row in BASE_ROWS {
        for col in 0..4 {
            base.push(pattern.position(grid_key(row, col))?);
        }
    }
    let mut mesh = PolyMesh::grid(4, BASE_ROWS.len(), |c, r| base[r * 4 + c], |c, r| grid_key(BASE_ROWS[r], c).to_owned());

    let mut diagnostics = FoldMeshDiagnostics::default();
    for region in plan.regions {
        let lattice = mesh.subdivide_face(region.corners, region.du, region.dv)?;
        for &((i, j), key) in region.placements {
            mesh.place(lattice.node(i, j), pattern.position(key)?, key);
        }
        let welded = mesh.weld_keys();
        crate::debug_log!("region {}: {}x{} subdivision, {welded} welded, {} vertices", region.name, region.du, region.dv, mesh.vertex_count());
        diagnostics.regions += 1;
        diagnostics.welded += welded;
    }
    for (from, into) in plan.merges {
        mesh.merge_key_into(from, into)?;
        diagnostics.merged += 1;
    }
    for (a, b) in plan.deleted_edges {
        mesh.delete_edge(a, b)?;
        diagnostics.deleted_edges += 1;
    }

    if options.check_manifold {
        mesh.check_manifold()?;
    }
    let table = topology.vertex_table();
    mesh.reorder_by_keys(table)?;

    if options.check_positions {
        for v in &mesh.vertices {
            let key = v.key.as_deref().unwrap_or_default();
            let expected = pattern.position(key)?;
            if !options.tolerance.approx_eq_point3(v.position, expected) {
                return Err(FoldError::MisplacedVertex(key.to_owned()));
            }
        }
    }

    pattern.assign_vertex_indices(table)?;

    diagnostics.face_count = mesh.faces.len();
    diagnostics.boundary_edges = mesh.boundary_edge_count();
    log::debug!(
        "fold plane ({topology}): {} vertices, {} faces, {} boundary edges",
        mesh.vertex_count(),
        diagnostics.face_count,
        diagnostics.boundary_edges
    );
    Ok(FoldMesh { topology, mesh, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::BoxExtent;

    fn build(w: f64, h: f64, d: f64) -> (FoldingPattern, FoldMesh) {
        let mut pattern = FoldingPattern::solve(BoxExtent::new(w, h, d), 0.02).expect("solves");
        let mesh = build_fold_mesh(&mut pattern).expect("builds");
        (pattern, mesh)
    }

    #[test]
    fn simple_plane_matches_table() {
        let (pattern, plane) = build(6.0, 1.0, 6.0);
        assert_eq!(plane.topology, FoldTopology::Simple);
        assert_eq!(plane.vertex_count(), 36);
        assert_eq!(plane.diagnostics.regions, 6);
        assert_eq!(pattern.vertex_index("I4b"), Ok(28));
        assert_eq!(pattern.vertex_index("F1a"), Ok(33));
        let positions = plane.positions();
        assert_eq!(positions[19], pattern.position("I3").expect("exists"));
    }

    #[test]
    fn overlap_plane_matches_table() {
        let (pattern, plane) = build(1.0, 1.0, 1.0);
        assert_eq!(plane.topology, FoldTopology::Overlap);
        assert_eq!(plane.vertex_count(), 40);
        assert_eq!(plane.diagnostics.merged, 4);
        assert_eq!(plane.diagnostics.deleted_edges, 2);
        assert_eq!(pattern.vertex_index("HI4"), Ok(28));
        assert_eq!(pattern.vertex_index("I1c"), Ok(39));
        assert!(matches!(pattern.vertex_index("F8"), Err(FoldError::UnindexedPoint(_))));
    }

    #[test]
    fn plane_is_manifold_and_triangulates() {
        for (w, h, d) in [(1.0, 1.0, 1.0), (6.0, 1.0, 6.0), (2.0, 0.7, 1.3), (3.0, 0.2, 5.0)] {
            let (_, plane) = build(w, h, d);
            assert!(plane.mesh.check_manifold().is_ok());
            let tri = plane.to_triangle_mesh();
            assert!(tri.validate().is_ok());
            assert_eq!(tri.vertex_count(), plane.vertex_count());
        }
    }

    #[test]
    fn vertex_count_is_stable_across_sizes() {
        for (w, h, d) in [(0.5, 0.5, 0.5), (10.0, 2.0, 3.0), (1.0, 1.0, 1.5)] {
            let (pattern, plane) = build(w, h, d);
            assert_eq!(plane.vertex_count(), pattern.topology().vertex_count());
        }
    }

    #[test]
    fn second_build_of_same_pattern_is_rejected() {
        let (mut pattern, _) = build(1.0, 1.0, 1.0);
        assert!(matches!(build_fold_mesh(&mut pattern), Err(FoldError::IndexReassigned(_))));
    }
}
