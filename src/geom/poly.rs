//! Polygon mesh with explicit vertex/edge/face bookkeeping.
//!
//! `PolyMesh` is the editable representation behind the fold plane. Each
//! vertex can carry a string key naming the pattern point it stands for, and
//! every topology edit (lattice subdivision of a quad, key-driven welding,
//! edge deletion) keeps face loops consistent with their neighbours so the
//! result never has T-junctions.
//!
//! # Example
//! ```ignore
//! use wrap_engine::geom::{Point3, PolyMesh};
//!
//! let mut mesh = PolyMesh::grid(2, 2, |c, r| Point3::new(c as f64, 0.0, r as f64), |c, r| format!("{c}{r}"));
//! let lattice = mesh.subdivide_face(["00", "10", "11", "01"], 2, 1)?;
//! mesh.place(lattice.node(1, 0), Point3::new(0.5, 0.0, 0.0), "mid");
//! mesh.weld_keys();
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use super::core::{BBox, Point3};
use super::mesh::GeomMesh;

// ============================================================================
// Error types
// ============================================================================

/// Contract violations raised while editing or validating a keyed mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// A key referenced by an edit is not present on any vertex.
    MissingKey(String),
    /// No quad face has the requested corner loop.
    MissingFace(String),
    /// No edge joins the two requested vertices.
    MissingEdge(String, String),
    /// Two surviving vertices carry the same key.
    DuplicateKey(String),
    /// A vertex survived without a key.
    UnkeyedVertex(usize),
    /// A vertex key has no slot in the index table.
    UnexpectedKey(String),
    /// The vertex count disagrees with the index table.
    VertexCountMismatch { expected: usize, actual: usize },
    /// An edge is shared by more than two faces.
    NonManifoldEdge { a: usize, b: usize, faces: usize },
    /// Subdivision factors must be at least one.
    InvalidSubdivision { du: usize, dv: usize },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingKey(key) => write!(f, "no vertex carries key `{key}`"),
            Self::MissingFace(corners) => write!(f, "no quad face with corners {corners}"),
            Self::MissingEdge(a, b) => write!(f, "no edge between `{a}` and `{b}`"),
            Self::DuplicateKey(key) => write!(f, "key `{key}` is carried by more than one vertex"),
            Self::UnkeyedVertex(id) => write!(f, "vertex {id} has no key"),
            Self::UnexpectedKey(key) => write!(f, "key `{key}` is not in the index table"),
            Self::VertexCountMismatch { expected, actual } => {
                write!(f, "index table declares {expected} vertices but the mesh has {actual}")
            }
            Self::NonManifoldEdge { a, b, faces } => {
                write!(f, "edge ({a}, {b}) is shared by {faces} faces")
            }
            Self::InvalidSubdivision { du, dv } => {
                write!(f, "invalid subdivision factors {du}x{dv}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

// ============================================================================
// Mesh elements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PolyVertex {
    pub id: usize,
    pub position: Point3,
    /// Pattern point this vertex stands for, once assigned.
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyEdge {
    pub id: usize,
    /// Vertex ids, smaller first.
    pub vertices: (usize, usize),
    pub faces: Vec<usize>,
}

impl PolyEdge {
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyFace {
    pub id: usize,
    /// Vertex loop, counter-clockwise seen from +Y for the fold plane.
    pub vertices: Vec<usize>,
    pub edges: Vec<usize>,
}

/// Node ids of a subdivided face, addressed by `(i, j)` lattice position.
///
/// `i` runs from the first corner toward the second, `j` from the first
/// corner toward the fourth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    du: usize,
    dv: usize,
    nodes: Vec<usize>,
}

impl Lattice {
    #[must_use]
    pub fn node(&self, i: usize, j: usize) -> usize {
        self.nodes[j * (self.du + 1) + i]
    }

    #[must_use]
    pub const fn dims(&self) -> (usize, usize) {
        (self.du, self.dv)
    }
}

/// Counters reported by triangulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolyDiagnostics {
    pub face_count: usize,
    pub triangle_count: usize,
    pub degenerate_faces: usize,
}

// ============================================================================
// PolyMesh
// ============================================================================

/// Editable polygon mesh.
///
/// # Vertex ID Invariant
/// Vertex, edge and face ids always match their index in the owning `Vec`
/// after every public operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    pub vertices: Vec<PolyVertex>,
    pub edges: Vec<PolyEdge>,
    pub faces: Vec<PolyFace>,
}

impl PolyMesh {
    /// Build a `cols` x `rows` vertex grid with quad faces between them.
    ///
    /// Vertices are stored row by row. Face `(c, r)` has the loop
    /// `[(c, r), (c + 1, r), (c + 1, r + 1), (c, r + 1)]`.
    #[must_use]
    pub fn grid(
        cols: usize,
        rows: usize,
        position: impl Fn(usize, usize) -> Point3,
        key: impl Fn(usize, usize) -> String,
    ) -> Self {
        let mut vertices = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                vertices.push(PolyVertex {
                    id: vertices.len(),
                    position: position(c, r),
                    key: Some(key(c, r)),
                });
            }
        }

        let at = |c: usize, r: usize| r * cols + c;
        let mut faces = Vec::new();
        for r in 0..rows.saturating_sub(1) {
            for c in 0..cols.saturating_sub(1) {
                faces.push(PolyFace {
                    id: faces.len(),
                    vertices: vec![at(c, r), at(c + 1, r), at(c + 1, r + 1), at(c, r + 1)],
                    edges: Vec::new(),
                });
            }
        }

        let mut mesh = Self { vertices, edges: Vec::new(), faces };
        mesh.rebuild_topology();
        mesh
    }

    /// Rebuild edges and face-edge links from the face loops.
    pub fn rebuild_topology(&mut self) {
        for (i, v) in self.vertices.iter_mut().enumerate() {
            v.id = i;
        }
        for (i, f) in self.faces.iter_mut().enumerate() {
            f.id = i;
        }

        let mut edge_map: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        let mut edges: Vec<PolyEdge> = Vec::new();
        for face in &mut self.faces {
            face.edges.clear();
            let n = face.vertices.len();
            for i in 0..n {
                let pair = normalized_edge_pair(face.vertices[i], face.vertices[(i + 1) % n]);
                let edge_id = *edge_map.entry(pair).or_insert_with(|| {
                    edges.push(PolyEdge { id: edges.len(), vertices: pair, faces: Vec::new() });
                    edges.len() - 1
                });
                if !edges[edge_id].faces.contains(&face.id) {
                    edges[edge_id].faces.push(face.id);
                }
                face.edges.push(edge_id);
            }
        }
        self.edges = edges;
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Id of the vertex carrying `key`.
    ///
    /// # Errors
    /// Returns [`TopologyError::MissingKey`] when no vertex has the key.
    pub fn vertex_by_key(&self, key: &str) -> Result<usize, TopologyError> {
        self.vertices
            .iter()
            .find(|v| v.key.as_deref() == Some(key))
            .map(|v| v.id)
            .ok_or_else(|| TopologyError::MissingKey(key.to_owned()))
    }

    #[must_use]
    pub fn positions(&self) -> Vec<Point3> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<BBox> {
        BBox::from_points(&self.positions())
    }

    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary()).count()
    }

    /// Fail on the first edge shared by more than two faces.
    ///
    /// # Errors
    /// Returns [`TopologyError::NonManifoldEdge`].
    pub fn check_manifold(&self) -> Result<(), TopologyError> {
        match self.edges.iter().find(|e| e.faces.len() > 2) {
            Some(e) => Err(TopologyError::NonManifoldEdge {
                a: e.vertices.0,
                b: e.vertices.1,
                faces: e.faces.len(),
            }),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Move a vertex and assign its key.
    pub fn place(&mut self, vertex: usize, position: Point3, key: &str) {
        if let Some(v) = self.vertices.get_mut(vertex) {
            v.position = position;
            v.key = Some(key.to_owned());
        }
    }

    /// Split the quad with corner loop `corners` into a `du` x `dv` lattice.
    ///
    /// New vertices are unkeyed and sit at bilinear positions. Nodes created
    /// on a shared edge are threaded into the neighbouring face loop.
    ///
    /// # Errors
    /// Returns an error when a corner key is missing, when no quad has the
    /// corners in this cyclic order, or when a factor is zero.
    pub fn subdivide_face(&mut self, corners: [&str; 4], du: usize, dv: usize) -> Result<Lattice, TopologyError> {
        if du == 0 || dv == 0 {
            return Err(TopologyError::InvalidSubdivision { du, dv });
        }
        let ids = [
            self.vertex_by_key(corners[0])?,
            self.vertex_by_key(corners[1])?,
            self.vertex_by_key(corners[2])?,
            self.vertex_by_key(corners[3])?,
        ];
        let face_index = self
            .faces
            .iter()
            .position(|f| is_cyclic_match(&f.vertices, &ids))
            .ok_or_else(|| TopologyError::MissingFace(corners.join("-")))?;

        let p = ids.map(|id| self.vertices[id].position);
        let mut nodes = Vec::with_capacity((du + 1) * (dv + 1));
        for j in 0..=dv {
            for i in 0..=du {
                let node = match (i, j) {
                    (0, 0) => ids[0],
                    (i, 0) if i == du => ids[1],
                    (i, j) if i == du && j == dv => ids[2],
                    (0, j) if j == dv => ids[3],
                    _ => {
                        let u = ratio(i, du);
                        let v = ratio(j, dv);
                        let position = p[0].lerp(p[1], u).lerp(p[3].lerp(p[2], u), v);
                        self.vertices.push(PolyVertex { id: self.vertices.len(), position, key: None });
                        self.vertices.len() - 1
                    }
                };
                nodes.push(node);
            }
        }
        let lattice = Lattice { du, dv, nodes };

        let sides: [Vec<usize>; 4] = [
            (0..=du).map(|i| lattice.node(i, 0)).collect(),
            (0..=dv).map(|j| lattice.node(du, j)).collect(),
            (0..=du).rev().map(|i| lattice.node(i, dv)).collect(),
            (0..=dv).rev().map(|j| lattice.node(0, j)).collect(),
        ];
        for side in &sides {
            self.thread_edge_nodes(face_index, side);
        }

        let mut cells = Vec::with_capacity(du * dv);
        for j in 0..dv {
            for i in 0..du {
                cells.push(vec![
                    lattice.node(i, j),
                    lattice.node(i + 1, j),
                    lattice.node(i + 1, j + 1),
                    lattice.node(i, j + 1),
                ]);
            }
        }
        let mut cells = cells.into_iter();
        if let Some(first) = cells.next() {
            self.faces[face_index].vertices = first;
        }
        self.faces.extend(cells.map(|vertices| PolyFace { id: 0, vertices, edges: Vec::new() }));

        self.rebuild_topology();
        Ok(lattice)
    }

    /// Insert the interior nodes of `side` into the loop of the face across
    /// that edge, if any.
    fn thread_edge_nodes(&mut self, skip_face: usize, side: &[usize]) {
        let (Some(&a), Some(&b)) = (side.first(), side.last()) else {
            return;
        };
        let interior = &side[1..side.len() - 1];
        if interior.is_empty() {
            return;
        }
        for (index, face) in self.faces.iter_mut().enumerate() {
            if index == skip_face {
                continue;
            }
            let n = face.vertices.len();
            for pos in 0..n {
                let here = face.vertices[pos];
                let next = face.vertices[(pos + 1) % n];
                if here == a && next == b {
                    face.vertices.splice(pos + 1..pos + 1, interior.iter().copied());
                    return;
                }
                if here == b && next == a {
                    face.vertices.splice(pos + 1..pos + 1, interior.iter().rev().copied());
                    return;
                }
            }
        }
    }

    /// Merge every group of vertices sharing a key into its oldest member.
    ///
    /// Returns the number of vertices removed.
    pub fn weld_keys(&mut self) -> usize {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for v in &self.vertices {
            if let Some(key) = v.key.as_deref() {
                groups.entry(key).or_default().push(v.id);
            }
        }
        let remap: HashMap<usize, usize> = groups
            .values()
            .filter(|ids| ids.len() > 1)
            .flat_map(|ids| ids[1..].iter().map(move |&id| (id, ids[0])))
            .collect();
        self.collapse(&remap)
    }

    /// Merge the vertex keyed `from` into the vertex keyed `into`.
    ///
    /// # Errors
    /// Returns [`TopologyError::MissingKey`] when either key is absent.
    pub fn merge_key_into(&mut self, from: &str, into: &str) -> Result<(), TopologyError> {
        let src = self.vertex_by_key(from)?;
        let dst = self.vertex_by_key(into)?;
        self.collapse(&HashMap::from([(src, dst)]));
        Ok(())
    }

    /// Remove the edge between two keyed vertices.
    ///
    /// An interior edge joins its two faces into one; a boundary edge takes
    /// its only face with it.
    ///
    /// # Errors
    /// Returns an error when a key or the edge is missing.
    pub fn delete_edge(&mut self, a_key: &str, b_key: &str) -> Result<(), TopologyError> {
        let a = self.vertex_by_key(a_key)?;
        let b = self.vertex_by_key(b_key)?;
        let pair = normalized_edge_pair(a, b);
        let edge = self
            .edges
            .iter()
            .find(|e| e.vertices == pair)
            .ok_or_else(|| TopologyError::MissingEdge(a_key.to_owned(), b_key.to_owned()))?;

        match edge.faces.as_slice() {
            [only] => {
                self.faces.remove(*only);
            }
            [f0, f1] => {
                let (f0, f1) = (*f0, *f1);
                let joined = join_loops(&self.faces[f0].vertices, &self.faces[f1].vertices, a, b);
                self.faces[f0].vertices = clean_loop(joined);
                self.faces.remove(f1);
                self.faces.retain(|f| f.vertices.len() >= 3);
            }
            _ => {}
        }
        self.rebuild_topology();
        Ok(())
    }

    /// Renumber vertices so each keyed vertex lands on its table slot.
    ///
    /// # Errors
    /// Fails when the vertex count differs from the table, a vertex has no
    /// key, a key is duplicated, or a key has no slot.
    pub fn reorder_by_keys(&mut self, table: &[(&str, usize)]) -> Result<(), TopologyError> {
        if self.vertices.len() != table.len() {
            return Err(TopologyError::VertexCountMismatch {
                expected: table.len(),
                actual: self.vertices.len(),
            });
        }
        let slots: HashMap<&str, usize> = table.iter().copied().collect();
        let mut seen = BTreeSet::new();
        let mut new_id = vec![0; self.vertices.len()];
        for v in &self.vertices {
            let key = v.key.as_deref().ok_or(TopologyError::UnkeyedVertex(v.id))?;
            if !seen.insert(key) {
                return Err(TopologyError::DuplicateKey(key.to_owned()));
            }
            let slot = *slots.get(key).ok_or_else(|| TopologyError::UnexpectedKey(key.to_owned()))?;
            if slot >= new_id.len() {
                return Err(TopologyError::UnexpectedKey(key.to_owned()));
            }
            new_id[v.id] = slot;
        }

        let mut reordered = self.vertices.clone();
        for v in &self.vertices {
            reordered[new_id[v.id]] = v.clone();
        }
        self.vertices = reordered;
        for face in &mut self.faces {
            for id in &mut face.vertices {
                *id = new_id[*id];
            }
        }
        self.rebuild_topology();
        Ok(())
    }

    /// Fan-triangulate every face from its first vertex.
    ///
    /// Vertex ids carry over unchanged to the triangle mesh.
    #[must_use]
    pub fn to_triangle_mesh(&self) -> (GeomMesh, PolyDiagnostics) {
        let positions = self.vertices.iter().map(|v| v.position.to_array()).collect();
        let mut indices = Vec::new();
        let mut diagnostics = PolyDiagnostics { face_count: self.faces.len(), ..PolyDiagnostics::default() };

        for face in &self.faces {
            if face.vertices.len() < 3 {
                diagnostics.degenerate_faces += 1;
                continue;
            }
            let anchor = face.vertices[0];
            for pair in face.vertices[1..].windows(2) {
                indices.extend([anchor, pair[0], pair[1]].map(index_u32));
            }
        }
        diagnostics.triangle_count = indices.len() / 3;
        (GeomMesh::new(positions, indices), diagnostics)
    }

    /// Apply a vertex remap, clean the face loops and drop the merged vertices.
    fn collapse(&mut self, remap: &HashMap<usize, usize>) -> usize {
        if remap.is_empty() {
            return 0;
        }
        let resolve = |mut id: usize| {
            while let Some(&next) = remap.get(&id) {
                id = next;
            }
            id
        };
        for face in &mut self.faces {
            let mapped = face.vertices.iter().map(|&id| resolve(id)).collect();
            face.vertices = clean_loop(mapped);
        }
        self.faces.retain(|f| f.vertices.len() >= 3);

        let doomed: BTreeSet<usize> = remap.keys().copied().collect();
        let mut new_id = vec![usize::MAX; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len() - doomed.len());
        for v in &self.vertices {
            if !doomed.contains(&v.id) {
                new_id[v.id] = kept.len();
                kept.push(v.clone());
            }
        }
        self.vertices = kept;
        for face in &mut self.faces {
            for id in &mut face.vertices {
                *id = new_id[*id];
            }
        }
        self.rebuild_topology();
        doomed.len()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

#[inline]
fn normalized_edge_pair(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(step: usize, count: usize) -> f64 {
    step as f64 / count as f64
}

#[allow(clippy::cast_possible_truncation)]
fn index_u32(id: usize) -> u32 {
    id as u32
}

/// True when `face` is exactly `corners` up to a cyclic shift.
fn is_cyclic_match(face: &[usize], corners: &[usize; 4]) -> bool {
    face.len() == 4 && (0..4).any(|shift| (0..4).all(|k| face[(k + shift) % 4] == corners[k]))
}

/// Drop consecutive repeats, including the wrap from last to first.
fn clean_loop(mut ids: Vec<usize>) -> Vec<usize> {
    ids.dedup();
    while ids.len() > 1 && ids.first() == ids.last() {
        ids.pop();
    }
    ids
}

/// Join two loops that share the edge `a`-`b` into one loop without it.
fn join_loops(first: &[usize], second: &[usize], a: usize, b: usize) -> Vec<usize> {
    // Rotate each loop so the shared edge sits at its ends.
    let rotate_after = |ids: &[usize], end: usize| -> Vec<usize> {
        let n = ids.len();
        let at = ids.iter().position(|&id| id == end).unwrap_or(0);
        (1..=n).map(|k| ids[(at + k) % n]).collect()
    };
    let starts_after_b = |ids: &[usize]| {
        let n = ids.len();
        ids.iter().enumerate().any(|(i, &id)| id == a && ids[(i + 1) % n] == b)
    };
    // The loop holding a->b runs b..a once rotated; the other runs a..b.
    let (ab, ba) = if starts_after_b(first) { (first, second) } else { (second, first) };
    let mut joined = rotate_after(ab, a);
    let tail = rotate_after(ba, b);
    joined.extend(tail.iter().copied().filter(|&id| id != a && id != b));
    joined
}
