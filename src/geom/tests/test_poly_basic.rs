use crate::geom::{Point3, PolyMesh, TopologyError};

/// 3x3 vertices, 2x2 quads, keys "c{col}r{row}".
fn keyed_grid() -> PolyMesh {
    PolyMesh::grid(
        3,
        3,
        |c, r| Point3::new(c as f64, 0.0, -(r as f64)),
        |c, r| format!("c{c}r{r}"),
    )
}

fn face_sizes(mesh: &PolyMesh) -> Vec<usize> {
    let mut sizes: Vec<usize> = mesh.faces.iter().map(|f| f.vertices.len()).collect();
    sizes.sort_unstable();
    sizes
}

#[test]
fn grid_has_expected_counts() {
    let mesh = keyed_grid();
    assert_eq!(mesh.vertex_count(), 9);
    assert_eq!(mesh.faces.len(), 4);
    assert_eq!(mesh.edges.len(), 12);
    assert_eq!(mesh.boundary_edge_count(), 8);
    assert!(mesh.check_manifold().is_ok());
}

#[test]
fn subdivide_threads_nodes_into_neighbour() {
    let mut mesh = keyed_grid();
    let lattice = mesh
        .subdivide_face(["c0r0", "c1r0", "c1r1", "c0r1"], 1, 2)
        .expect("face exists");
    assert_eq!(lattice.dims(), (1, 2));

    // Two new nodes on the left and right sides of the split face.
    assert_eq!(mesh.vertex_count(), 11);
    // The right neighbour picked up the node on the shared edge.
    assert_eq!(face_sizes(&mesh), vec![4, 4, 4, 4, 5]);
    // No T-junction: every interior edge still has two faces.
    assert!(mesh.check_manifold().is_ok());
    assert_eq!(mesh.boundary_edge_count(), 9);

    let mid = mesh.vertices[lattice.node(1, 1)].position;
    assert_eq!(mid, Point3::new(1.0, 0.0, -0.5));
}

#[test]
fn weld_collapses_split_nodes_back() {
    let mut mesh = keyed_grid();
    let lattice = mesh
        .subdivide_face(["c0r0", "c1r0", "c1r1", "c0r1"], 1, 2)
        .expect("face exists");
    let left = lattice.node(0, 1);
    let right = lattice.node(1, 1);
    mesh.place(left, Point3::new(0.0, 0.0, -0.5), "c0r0");
    mesh.place(right, Point3::new(1.2, 0.0, -0.5), "split");

    assert_eq!(mesh.weld_keys(), 1);
    assert_eq!(mesh.vertex_count(), 10);
    // The split face's upper cell became a triangle; the neighbour stays a pentagon.
    assert_eq!(face_sizes(&mesh), vec![3, 4, 4, 4, 5]);
    assert!(mesh.vertex_by_key("split").is_ok());
}

#[test]
fn merge_and_delete_edge() {
    let mut mesh = keyed_grid();
    mesh.merge_key_into("c0r0", "c0r1").expect("both keys exist");
    assert_eq!(mesh.vertex_count(), 8);
    // The top-left quad lost a corner and is now a triangle.
    assert_eq!(face_sizes(&mesh), vec![3, 4, 4, 4]);

    // Interior edge: the two faces join into one hexagon.
    mesh.delete_edge("c1r1", "c2r1").expect("edge exists");
    assert_eq!(face_sizes(&mesh), vec![3, 4, 6]);

    // Boundary edge: its single face goes away.
    mesh.delete_edge("c1r0", "c0r1").expect("edge exists");
    assert_eq!(face_sizes(&mesh), vec![4, 6]);

    assert_eq!(
        mesh.delete_edge("c0r2", "c2r2"),
        Err(TopologyError::MissingEdge("c0r2".into(), "c2r2".into()))
    );
}

#[test]
fn reorder_checks_table() {
    let mut mesh = keyed_grid();
    let keys: Vec<String> = (0..3).flat_map(|r| (0..3).map(move |c| format!("c{c}r{r}"))).collect();
    let table: Vec<(&str, usize)> = keys.iter().rev().enumerate().map(|(i, k)| (k.as_str(), i)).collect();

    mesh.reorder_by_keys(&table).expect("table matches");
    assert_eq!(mesh.vertices[0].key.as_deref(), Some("c2r2"));
    assert_eq!(mesh.vertices[8].key.as_deref(), Some("c0r0"));
    assert!(mesh.check_manifold().is_ok());

    let short = &table[..8];
    assert_eq!(
        mesh.reorder_by_keys(short),
        Err(TopologyError::VertexCountMismatch { expected: 8, actual: 9 })
    );
}

#[test]
fn missing_face_is_reported() {
    let mut mesh = keyed_grid();
    let err = mesh.subdivide_face(["c0r0", "c2r0", "c2r2", "c0r2"], 1, 1).unwrap_err();
    assert!(matches!(err, TopologyError::MissingFace(_)));
}

#[test]
fn triangulation_keeps_vertex_ids() {
    let mesh = keyed_grid();
    let (tri, diag) = mesh.to_triangle_mesh();
    assert_eq!(tri.vertex_count(), 9);
    assert_eq!(diag.triangle_count, 8);
    assert_eq!(diag.degenerate_faces, 0);
    assert!(tri.validate().is_ok());
}
