//! In-process scene used by the tests and the CLI.
//!
//! Nodes live in a map keyed by [`NodeId`] with a name index next to it.
//! World matrices walk the parent chain (stopping at nodes that do not
//! inherit), meshes evaluate their wrap binding and cluster stack on every
//! query, and setting an attribute pushes the new value through the driven
//! keys that read it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use wildmatch::WildMatch;

use super::{HostError, MeshEdit, MetaMap, MetaValue, NodeTransform, Plug, SceneHost};
use crate::geom::{BBox, Point3, PolyMesh, Transform, Vec3};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct ClusterBinding {
    handle: NodeId,
    vertices: Vec<usize>,
    bind_inverse: Transform,
}

#[derive(Debug, Clone)]
struct WrapBinding {
    driver: NodeId,
    /// Nearest driver vertex and offset to it, in driver object space.
    anchors: Vec<(usize, Vec3)>,
}

#[derive(Debug, Clone, Default)]
struct MeshShape {
    rest: Vec<Point3>,
    faces: Vec<Vec<usize>>,
    clusters: Vec<ClusterBinding>,
    wrap: Option<WrapBinding>,
    edits: Vec<MeshEdit>,
}

#[derive(Debug, Clone, Copy)]
struct ExtrusionShape {
    profile: NodeId,
    path: NodeId,
    reveal: f64,
    scale: f64,
}

#[derive(Debug, Clone)]
enum Geometry {
    Group,
    Mesh(MeshShape),
    Curve { points: Vec<Point3>, closed: bool },
    Instance(NodeId),
    Extrusion(ExtrusionShape),
}

impl Geometry {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Mesh(_) => "mesh",
            Self::Curve { .. } | Self::Instance(_) => "curve",
            Self::Extrusion(_) => "extrusion",
        }
    }
}

#[derive(Debug, Clone)]
struct SceneNode {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: NodeTransform,
    geometry: Geometry,
    attributes: MetaMap,
    keyable: BTreeSet<String>,
    shader: Option<String>,
}

#[derive(Debug, Clone)]
struct DrivenCurve {
    driver: (NodeId, String),
    driven: (NodeId, String),
    /// `(driver value, driven value)`, sorted by driver value.
    keys: Vec<(f64, f64)>,
}

/// Read-only view of an extrusion node.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionInfo {
    pub profile: String,
    pub path: String,
    pub reveal: f64,
    pub scale: f64,
}

/// Scene host kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: HashMap<NodeId, SceneNode>,
    name_index: HashMap<String, NodeId>,
    roots: Vec<NodeId>,
    next_id: usize,
    shaders: BTreeMap<String, [f64; 3]>,
    driven: Vec<DrivenCurve>,
    keyframes: BTreeMap<(NodeId, String), Vec<(f64, f64)>>,
}

impl MemoryScene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Add an axis-aligned box mesh of `size` centred on `center`.
    ///
    /// # Errors
    /// Fails when `name` is taken.
    pub fn create_box(&mut self, name: &str, size: Vec3, center: Point3) -> Result<(), HostError> {
        let h = size * 0.5;
        let rest = (0..8)
            .map(|i| {
                let sx = if i & 1 == 0 { -h.x } else { h.x };
                let sy = if i & 2 == 0 { -h.y } else { h.y };
                let sz = if i & 4 == 0 { -h.z } else { h.z };
                center.offset(sx, sy, sz)
            })
            .collect();
        let faces = vec![
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ];
        let shape = MeshShape { rest, faces, ..MeshShape::default() };
        self.insert_node(name, None, Geometry::Mesh(shape))?;
        Ok(())
    }

    /// World matrix of a node.
    ///
    /// # Errors
    /// Fails when the node does not exist.
    pub fn world_matrix(&self, name: &str) -> Result<Transform, HostError> {
        Ok(self.world(self.id(name)?))
    }

    /// Direct children, in creation order.
    ///
    /// # Errors
    /// Fails when the node does not exist.
    pub fn children(&self, name: &str) -> Result<Vec<String>, HostError> {
        let id = self.id(name)?;
        Ok(self.nodes[&id].children.iter().map(|c| self.nodes[c].name.clone()).collect())
    }

    #[must_use]
    pub fn shader_of(&self, name: &str) -> Option<&str> {
        self.name_index.get(name).and_then(|id| self.nodes[id].shader.as_deref())
    }

    #[must_use]
    pub fn shader_color(&self, shader: &str) -> Option<[f64; 3]> {
        self.shaders.get(shader).copied()
    }

    #[must_use]
    pub fn shader_count(&self) -> usize {
        self.shaders.len()
    }

    /// # Errors
    /// Fails when the node is missing or not an extrusion.
    pub fn extrusion(&self, name: &str) -> Result<ExtrusionInfo, HostError> {
        let id = self.id(name)?;
        match &self.nodes[&id].geometry {
            Geometry::Extrusion(ext) => Ok(ExtrusionInfo {
                profile: self.name_of(ext.profile),
                path: self.name_of(ext.path),
                reveal: ext.reveal,
                scale: ext.scale,
            }),
            _ => Err(HostError::WrongKind { node: name.to_owned(), expected: "extrusion" }),
        }
    }

    /// Object-space points of a curve (or of the curve an instance shares),
    /// with its closed flag.
    ///
    /// # Errors
    /// Fails when the node is missing or not a curve.
    pub fn curve(&self, name: &str) -> Result<(Vec<Point3>, bool), HostError> {
        let mut id = self.id(name)?;
        if let Geometry::Instance(source) = &self.nodes[&id].geometry {
            id = *source;
        }
        match self.nodes.get(&id).map(|n| &n.geometry) {
            Some(Geometry::Curve { points, closed }) => Ok((points.clone(), *closed)),
            _ => Err(HostError::WrongKind { node: name.to_owned(), expected: "curve" }),
        }
    }

    /// Edits applied to a mesh, oldest first.
    ///
    /// # Errors
    /// Fails when the node is missing or not a mesh.
    pub fn mesh_edits(&self, name: &str) -> Result<Vec<MeshEdit>, HostError> {
        Ok(self.mesh(name)?.edits.clone())
    }

    /// Number of clusters bound to a mesh.
    ///
    /// # Errors
    /// Fails when the node is missing or not a mesh.
    pub fn cluster_count(&self, name: &str) -> Result<usize, HostError> {
        Ok(self.mesh(name)?.clusters.len())
    }

    #[must_use]
    pub fn is_keyable(&self, node: &str, attribute: &str) -> bool {
        self.name_index.get(node).is_some_and(|id| self.nodes[id].keyable.contains(attribute))
    }

    /// Keys of the driven curve feeding `driven`, as `(driver, value)` pairs.
    #[must_use]
    pub fn driven_keys(&self, driven: Plug<'_>) -> Vec<(f64, f64)> {
        let Some(&id) = self.name_index.get(driven.node) else {
            return Vec::new();
        };
        self.driven
            .iter()
            .filter(|c| c.driven.0 == id && c.driven.1 == driven.attribute)
            .flat_map(|c| c.keys.iter().copied())
            .collect()
    }

    #[must_use]
    pub fn driven_key_count(&self) -> usize {
        self.driven.iter().map(|c| c.keys.len()).sum()
    }

    /// Time keys of `node.attribute`, as `(time, value)` pairs.
    #[must_use]
    pub fn keyframes(&self, node: &str, attribute: &str) -> Vec<(f64, f64)> {
        self.name_index
            .get(node)
            .and_then(|id| self.keyframes.get(&(*id, attribute.to_owned())))
            .cloned()
            .unwrap_or_default()
    }

    /// Evaluate every keyframed attribute at `time`.
    ///
    /// # Errors
    /// Propagates failures from setting the evaluated values.
    pub fn set_time(&mut self, time: f64) -> Result<(), HostError> {
        let updates: Vec<(NodeId, String, f64)> =
            self.keyframes.iter().map(|((id, attr), keys)| (*id, attr.clone(), interpolate(keys, time))).collect();
        for (id, attr, value) in updates {
            self.set_value(id, &attr, MetaValue::Number(value))?;
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // internals
    // ─────────────────────────────────────────────────────────────────────

    fn id(&self, name: &str) -> Result<NodeId, HostError> {
        self.name_index.get(name).copied().ok_or_else(|| HostError::NodeNotFound(name.to_owned()))
    }

    fn name_of(&self, id: NodeId) -> String {
        self.nodes.get(&id).map(|n| n.name.clone()).unwrap_or_default()
    }

    fn parent_id(&self, parent: Option<&str>) -> Result<Option<NodeId>, HostError> {
        parent.map(|p| self.id(p)).transpose()
    }

    fn mesh(&self, name: &str) -> Result<&MeshShape, HostError> {
        let id = self.id(name)?;
        match &self.nodes[&id].geometry {
            Geometry::Mesh(shape) => Ok(shape),
            _ => Err(HostError::WrongKind { node: name.to_owned(), expected: "mesh" }),
        }
    }

    fn mesh_mut(&mut self, name: &str) -> Result<&mut MeshShape, HostError> {
        let id = self.id(name)?;
        match self.nodes.get_mut(&id).map(|n| &mut n.geometry) {
            Some(Geometry::Mesh(shape)) => Ok(shape),
            _ => Err(HostError::WrongKind { node: name.to_owned(), expected: "mesh" }),
        }
    }

    fn insert_node(&mut self, name: &str, parent: Option<&str>, geometry: Geometry) -> Result<NodeId, HostError> {
        if self.name_index.contains_key(name) {
            return Err(HostError::DuplicateNode(name.to_owned()));
        }
        let parent = self.parent_id(parent)?;
        let id = NodeId(self.next_id);
        self.next_id += 1;

        self.nodes.insert(
            id,
            SceneNode {
                name: name.to_owned(),
                parent,
                children: Vec::new(),
                transform: NodeTransform::IDENTITY,
                geometry,
                attributes: MetaMap::new(),
                keyable: BTreeSet::new(),
                shader: None,
            },
        );
        self.name_index.insert(name.to_owned(), id);
        self.link(id, parent);
        Ok(id)
    }

    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = parent;
        }
    }

    fn unlink(&mut self, id: NodeId) {
        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(p) => p.children.retain(|c| *c != id),
            None => self.roots.retain(|c| *c != id),
        }
    }

    fn world(&self, id: NodeId) -> Transform {
        let Some(node) = self.nodes.get(&id) else {
            return Transform::identity();
        };
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) if node.transform.inherits_transform => self.world(parent) * local,
            _ => local,
        }
    }

    fn parent_world(&self, parent: Option<NodeId>) -> Transform {
        parent.map_or_else(Transform::identity, |p| self.world(p))
    }

    fn is_descendant(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut cursor = Some(candidate);
        while let Some(id) = cursor {
            if id == of {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            let Some(node) = self.nodes.get(&c) else { break };
            parts.push(node.name.as_str());
            cursor = node.parent;
        }
        parts.reverse();
        parts.join("|")
    }

    /// Every node in depth-first creation order.
    fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            out.push(c);
            if let Some(node) = self.nodes.get(&c) {
                stack.extend(node.children.iter());
            }
        }
        out
    }

    /// Object-space mesh positions after the wrap binding and clusters.
    fn deformed(&self, id: NodeId) -> Vec<Point3> {
        let Some(Geometry::Mesh(shape)) = self.nodes.get(&id).map(|n| &n.geometry) else {
            return Vec::new();
        };

        let mut points = match &shape.wrap {
            Some(wrap) if self.nodes.contains_key(&wrap.driver) => {
                let driver = self.deformed(wrap.driver);
                let to_local = self.world(id).inverse().unwrap_or_default() * self.world(wrap.driver);
                wrap.anchors
                    .iter()
                    .map(|&(i, offset)| to_local.apply_point(driver.get(i).copied().unwrap_or_default() + offset))
                    .collect()
            }
            _ => shape.rest.clone(),
        };

        for cluster in &shape.clusters {
            if !self.nodes.contains_key(&cluster.handle) {
                continue;
            }
            let motion = self.world(cluster.handle) * cluster.bind_inverse;
            for &v in &cluster.vertices {
                if let Some(p) = points.get_mut(v) {
                    *p = motion.apply_point(*p);
                }
            }
        }
        points
    }

    /// Object-space points of a node's own geometry.
    fn local_points(&self, id: NodeId) -> Vec<Point3> {
        match self.nodes.get(&id).map(|n| &n.geometry) {
            Some(Geometry::Mesh(_)) => self.deformed(id),
            Some(Geometry::Curve { points, .. }) => points.clone(),
            Some(Geometry::Instance(source)) => match self.nodes.get(source).map(|n| &n.geometry) {
                Some(Geometry::Curve { points, .. }) => points.clone(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn world_points(&self, id: NodeId) -> Vec<Point3> {
        if let Some(Geometry::Extrusion(ext)) = self.nodes.get(&id).map(|n| &n.geometry) {
            let path_local = self.nodes.get(&ext.path).map_or_else(Transform::identity, |n| n.transform.matrix());
            let world = self.world(id) * path_local;
            return self.local_points(ext.path).into_iter().map(|p| world.apply_point(p)).collect();
        }
        let world = self.world(id);
        self.local_points(id).into_iter().map(|p| world.apply_point(p)).collect()
    }

    fn value(&self, id: NodeId, attribute: &str) -> Result<MetaValue, HostError> {
        let node = &self.nodes[&id];
        if let Some(v) = node.transform.channel(attribute) {
            return Ok(MetaValue::Number(v));
        }
        if let Geometry::Extrusion(ext) = &node.geometry {
            match attribute {
                "maxValue" => return Ok(MetaValue::Number(ext.reveal)),
                "scale" => return Ok(MetaValue::Number(ext.scale)),
                _ => {}
            }
        }
        node.attributes.get(attribute).cloned().ok_or_else(|| HostError::AttributeNotFound {
            node: node.name.clone(),
            attribute: attribute.to_owned(),
        })
    }

    fn set_value(&mut self, id: NodeId, attribute: &str, value: MetaValue) -> Result<(), HostError> {
        let node = self.nodes.get_mut(&id).ok_or_else(|| HostError::NodeNotFound(format!("#{}", id.0)))?;
        let type_error = |expected: &'static str, found: &MetaValue, node: &SceneNode| HostError::AttributeType {
            node: node.name.clone(),
            attribute: attribute.to_owned(),
            expected,
            found: found.kind(),
        };

        if node.transform.channel(attribute).is_some() {
            let number = value.as_number().ok_or_else(|| type_error("number", &value, node))?;
            node.transform.set_channel(attribute, number);
        } else if let (Geometry::Extrusion(ext), "maxValue" | "scale") = (&mut node.geometry, attribute) {
            let number = value.as_number().ok_or_else(|| HostError::AttributeType {
                node: node.name.clone(),
                attribute: attribute.to_owned(),
                expected: "number",
                found: value.kind(),
            })?;
            if attribute == "maxValue" {
                ext.reveal = number.clamp(0.0, 1.0);
            } else {
                ext.scale = number;
            }
        } else {
            let Some(current) = node.attributes.get(attribute) else {
                return Err(HostError::AttributeNotFound { node: node.name.clone(), attribute: attribute.to_owned() });
            };
            let compatible = current.kind() == value.kind() || (current.as_number().is_some() && value.as_number().is_some());
            if !compatible {
                return Err(type_error(current.kind(), &value, node));
            }
            let stored = match (current, &value) {
                (MetaValue::Number(_), v) => MetaValue::Number(v.as_number().unwrap_or_default()),
                _ => value,
            };
            node.attributes.insert(attribute.to_owned(), stored);
        }

        self.propagate(id, attribute)
    }

    /// Push a changed driver value through its driven curves.
    fn propagate(&mut self, id: NodeId, attribute: &str) -> Result<(), HostError> {
        let driving: Vec<usize> = self
            .driven
            .iter()
            .enumerate()
            .filter(|(_, c)| c.driver.0 == id && c.driver.1 == attribute)
            .map(|(i, _)| i)
            .collect();
        if driving.is_empty() {
            return Ok(());
        }
        let input = self.value(id, attribute)?.as_number().unwrap_or_default();
        for i in driving {
            let (target, attr, value) = {
                let curve = &self.driven[i];
                (curve.driven.0, curve.driven.1.clone(), interpolate(&curve.keys, input))
            };
            self.set_value(target, &attr, MetaValue::Number(value))?;
        }
        Ok(())
    }
}

/// Piecewise-linear lookup, clamped at both ends.
fn interpolate(keys: &[(f64, f64)], x: f64) -> f64 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if x <= first.0 {
        return first.1;
    }
    if x >= last.0 {
        return last.1;
    }
    for w in keys.windows(2) {
        let ((x0, y0), (x1, y1)) = (w[0], w[1]);
        if x <= x1 {
            let t = if x1 > x0 { (x - x0) / (x1 - x0) } else { 1.0 };
            return y0 + (y1 - y0) * t;
        }
    }
    last.1
}

fn insert_key(keys: &mut Vec<(f64, f64)>, at: f64, value: f64) {
    match keys.iter_mut().find(|(k, _)| (*k - at).abs() < 1e-9) {
        Some(slot) => slot.1 = value,
        None => {
            keys.push((at, value));
            keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
    }
}

impl SceneHost for MemoryScene {
    fn exists(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    fn bbox(&self, name: &str) -> Result<BBox, HostError> {
        let id = self.id(name)?;
        let points: Vec<Point3> = self.subtree(id).into_iter().flat_map(|n| self.world_points(n)).collect();
        BBox::from_points(&points).ok_or_else(|| HostError::EmptyBounds(name.to_owned()))
    }

    fn parent_of(&self, name: &str) -> Result<Option<String>, HostError> {
        let id = self.id(name)?;
        Ok(self.nodes[&id].parent.map(|p| self.name_of(p)))
    }

    fn list(&self, pattern: &str) -> Vec<String> {
        let wm = WildMatch::new(pattern);
        self.walk().into_iter().map(|id| self.name_of(id)).filter(|name| wm.matches(name)).collect()
    }

    fn list_paths(&self) -> Vec<String> {
        self.walk().into_iter().map(|id| self.path(id)).collect()
    }

    fn create_group(&mut self, name: &str, parent: Option<&str>) -> Result<(), HostError> {
        self.insert_node(name, parent, Geometry::Group)?;
        Ok(())
    }

    fn reparent(&mut self, name: &str, parent: Option<&str>) -> Result<(), HostError> {
        let id = self.id(name)?;
        let new_parent = self.parent_id(parent)?;
        if let Some(p) = new_parent {
            if self.is_descendant(p, id) {
                return Err(HostError::ParentCycle { child: name.to_owned(), parent: self.name_of(p) });
            }
        }

        let transform = self.nodes[&id].transform;
        if transform.inherits_transform {
            let world = self.world(id);
            let parent_inv = self
                .parent_world(new_parent)
                .inverse()
                .ok_or_else(|| HostError::SingularTransform(parent.unwrap_or_default().to_owned()))?;
            let refit = transform.refit(parent_inv * world);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.transform = refit;
            }
        }
        self.unlink(id);
        self.link(id, new_parent);
        Ok(())
    }

    fn transform(&self, name: &str) -> Result<NodeTransform, HostError> {
        Ok(self.nodes[&self.id(name)?].transform)
    }

    fn set_transform(&mut self, name: &str, transform: NodeTransform) -> Result<(), HostError> {
        let id = self.id(name)?;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform = transform;
        }
        Ok(())
    }

    fn freeze(&mut self, name: &str) -> Result<(), HostError> {
        let id = self.id(name)?;
        let Some(node) = self.nodes.get_mut(&id) else {
            return Err(HostError::NodeNotFound(name.to_owned()));
        };
        let matrix = node.transform.matrix();
        match &mut node.geometry {
            Geometry::Mesh(shape) => shape.rest.iter_mut().for_each(|p| *p = matrix.apply_point(*p)),
            Geometry::Curve { points, .. } => points.iter_mut().for_each(|p| *p = matrix.apply_point(*p)),
            _ => {}
        }
        let pivot = matrix.apply_point(node.transform.pivot);
        node.transform = NodeTransform {
            pivot,
            inherits_transform: node.transform.inherits_transform,
            visible: node.transform.visible,
            ..NodeTransform::IDENTITY
        };
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), HostError> {
        let id = self.id(name)?;
        self.unlink(id);
        let removed: BTreeSet<NodeId> = self.subtree(id).into_iter().collect();
        for r in &removed {
            if let Some(node) = self.nodes.remove(r) {
                self.name_index.remove(&node.name);
            }
        }
        self.driven.retain(|c| !removed.contains(&c.driver.0) && !removed.contains(&c.driven.0));
        self.keyframes.retain(|(n, _), _| !removed.contains(n));
        log::debug!("deleted `{name}` and {} descendants", removed.len() - 1);
        Ok(())
    }

    fn create_mesh(&mut self, name: &str, parent: Option<&str>, mesh: &PolyMesh) -> Result<(), HostError> {
        let shape = MeshShape {
            rest: mesh.positions(),
            faces: mesh.faces.iter().map(|f| f.vertices.clone()).collect(),
            ..MeshShape::default()
        };
        self.insert_node(name, parent, Geometry::Mesh(shape))?;
        Ok(())
    }

    fn mesh_positions(&self, name: &str) -> Result<Vec<Point3>, HostError> {
        self.mesh(name)?;
        Ok(self.deformed(self.id(name)?))
    }

    fn set_vertex_position(&mut self, name: &str, index: usize, position: Point3) -> Result<(), HostError> {
        let shape = self.mesh_mut(name)?;
        let count = shape.rest.len();
        let slot = shape
            .rest
            .get_mut(index)
            .ok_or_else(|| HostError::VertexOutOfRange { node: name.to_owned(), index, count })?;
        *slot = position;
        Ok(())
    }

    fn duplicate(&mut self, source: &str, name: &str) -> Result<(), HostError> {
        let id = self.id(source)?;
        let original = self.nodes[&id].clone();
        let geometry = match &original.geometry {
            Geometry::Mesh(shape) => Geometry::Mesh(MeshShape {
                rest: self.deformed(id),
                faces: shape.faces.clone(),
                edits: shape.edits.clone(),
                ..MeshShape::default()
            }),
            other => other.clone(),
        };
        let parent = original.parent.map(|p| self.name_of(p));
        let copy = self.insert_node(name, parent.as_deref(), geometry)?;
        if let Some(node) = self.nodes.get_mut(&copy) {
            node.transform = original.transform;
            node.attributes = original.attributes;
            node.keyable = original.keyable;
            node.shader = original.shader;
        }
        Ok(())
    }

    fn edit_mesh(&mut self, name: &str, edit: MeshEdit) -> Result<(), HostError> {
        let shape = self.mesh_mut(name)?;
        if let MeshEdit::ExtrudeFaces { offset } = edit {
            let base = shape.rest.len();
            let shifted: Vec<Point3> = shape.rest.iter().map(|p| p.offset(0.0, offset, 0.0)).collect();
            shape.rest.extend(shifted);
            let caps: Vec<Vec<usize>> =
                shape.faces.iter().map(|f| f.iter().rev().map(|v| v + base).collect()).collect();
            shape.faces.extend(caps);
        }
        shape.edits.push(edit);
        Ok(())
    }

    fn bind_wrap(&mut self, driven: &str, driver: &str) -> Result<(), HostError> {
        let driven_id = self.id(driven)?;
        let driver_id = self.id(driver)?;
        self.mesh(driver)?;
        self.mesh(driven)?;
        let mut cursor = Some(driver_id);
        while let Some(c) = cursor {
            if c == driven_id {
                return Err(HostError::ParentCycle { child: driven.to_owned(), parent: driver.to_owned() });
            }
            cursor = match &self.nodes[&c].geometry {
                Geometry::Mesh(MeshShape { wrap: Some(w), .. }) => Some(w.driver),
                _ => None,
            };
        }

        let driver_points = self.deformed(driver_id);
        let to_driver = self
            .world(driver_id)
            .inverse()
            .ok_or_else(|| HostError::SingularTransform(driver.to_owned()))?
            * self.world(driven_id);
        let anchors = self
            .deformed(driven_id)
            .into_iter()
            .map(|p| {
                let local = to_driver.apply_point(p);
                let nearest = driver_points
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.distance_to(local).total_cmp(&b.1.distance_to(local)))
                    .map_or(0, |(i, _)| i);
                let anchor = driver_points.get(nearest).copied().unwrap_or_default();
                (nearest, local - anchor)
            })
            .collect();
        let shape = self.mesh_mut(driven)?;
        shape.wrap = Some(WrapBinding { driver: driver_id, anchors });
        Ok(())
    }

    fn bind_cluster(&mut self, mesh: &str, handle: &str, vertices: &[usize]) -> Result<(), HostError> {
        let handle_id = self.id(handle)?;
        let bind_inverse = self.world(handle_id).inverse().ok_or_else(|| HostError::SingularTransform(handle.to_owned()))?;
        let shape = self.mesh_mut(mesh)?;
        let count = shape.rest.len();
        if let Some(&index) = vertices.iter().find(|&&v| v >= count) {
            return Err(HostError::VertexOutOfRange { node: mesh.to_owned(), index, count });
        }
        shape.clusters.push(ClusterBinding { handle: handle_id, vertices: vertices.to_vec(), bind_inverse });
        Ok(())
    }

    fn create_curve(&mut self, name: &str, parent: Option<&str>, points: &[Point3], closed: bool) -> Result<(), HostError> {
        self.insert_node(name, parent, Geometry::Curve { points: points.to_vec(), closed })?;
        Ok(())
    }

    fn instance(&mut self, source: &str, name: &str, parent: Option<&str>) -> Result<(), HostError> {
        let source_id = self.id(source)?;
        let shape = match &self.nodes[&source_id].geometry {
            Geometry::Curve { .. } => source_id,
            Geometry::Instance(inner) => *inner,
            _ => return Err(HostError::WrongKind { node: source.to_owned(), expected: "curve" }),
        };
        let id = self.insert_node(name, parent, Geometry::Instance(shape))?;
        let transform = self.nodes[&source_id].transform;
        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform = transform;
        }
        Ok(())
    }

    fn extrude(&mut self, name: &str, parent: Option<&str>, profile: &str, path: &str) -> Result<(), HostError> {
        let profile_id = self.id(profile)?;
        let path_id = self.id(path)?;
        for (id, label) in [(profile_id, profile), (path_id, path)] {
            if self.nodes[&id].geometry.kind() != "curve" {
                return Err(HostError::WrongKind { node: label.to_owned(), expected: "curve" });
            }
        }
        let shape = ExtrusionShape { profile: profile_id, path: path_id, reveal: 1.0, scale: 1.0 };
        self.insert_node(name, parent, Geometry::Extrusion(shape))?;
        Ok(())
    }

    fn add_attribute(&mut self, node: &str, attribute: &str, value: MetaValue, keyable: bool) -> Result<(), HostError> {
        let id = self.id(node)?;
        if self.value(id, attribute).is_ok() {
            return Err(HostError::DuplicateAttribute { node: node.to_owned(), attribute: attribute.to_owned() });
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.attributes.insert(attribute.to_owned(), value);
            if keyable {
                n.keyable.insert(attribute.to_owned());
            }
        }
        Ok(())
    }

    fn attribute(&self, node: &str, attribute: &str) -> Result<MetaValue, HostError> {
        self.value(self.id(node)?, attribute)
    }

    fn set_attribute(&mut self, node: &str, attribute: &str, value: MetaValue) -> Result<(), HostError> {
        let id = self.id(node)?;
        self.set_value(id, attribute, value)
    }

    fn set_driven_key(&mut self, driver: Plug<'_>, driven: Plug<'_>, driver_value: f64, value: f64) -> Result<(), HostError> {
        let driver_id = self.id(driver.node)?;
        let driven_id = self.id(driven.node)?;
        self.value(driver_id, driver.attribute)?;
        self.value(driven_id, driven.attribute)?;

        let driver_key = (driver_id, driver.attribute.to_owned());
        let driven_key = (driven_id, driven.attribute.to_owned());
        match self.driven.iter_mut().find(|c| c.driver == driver_key && c.driven == driven_key) {
            Some(curve) => insert_key(&mut curve.keys, driver_value, value),
            None => self.driven.push(DrivenCurve { driver: driver_key, driven: driven_key, keys: vec![(driver_value, value)] }),
        }
        Ok(())
    }

    fn set_keyframe(&mut self, node: &str, attribute: &str, time: f64, value: f64) -> Result<(), HostError> {
        let id = self.id(node)?;
        self.value(id, attribute)?;
        insert_key(self.keyframes.entry((id, attribute.to_owned())).or_default(), time, value);
        Ok(())
    }

    fn clear_keyframes(&mut self, node: &str, attribute: &str) -> Result<(), HostError> {
        let id = self.id(node)?;
        self.keyframes.remove(&(id, attribute.to_owned()));
        Ok(())
    }

    fn ensure_shader(&mut self, name: &str, color: [f64; 3]) -> bool {
        if self.shaders.contains_key(name) {
            return false;
        }
        self.shaders.insert(name.to_owned(), color);
        true
    }

    fn assign_shader(&mut self, shader: &str, node: &str) -> Result<(), HostError> {
        if !self.shaders.contains_key(shader) {
            return Err(HostError::NodeNotFound(shader.to_owned()));
        }
        let id = self.id(node)?;
        if let Some(n) = self.nodes.get_mut(&id) {
            n.shader = Some(shader.to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    fn scene_with_box() -> MemoryScene {
        let mut scene = MemoryScene::new();
        scene.create_box("box", Vec3::new(2.0, 1.0, 4.0), Point3::new(0.0, 0.5, 0.0)).expect("box");
        scene
    }

    #[test]
    fn world_bounds_follow_parent_chain() {
        let mut scene = scene_with_box();
        scene.create_group("grp", None).expect("group");
        scene.reparent("box", Some("grp")).expect("reparent");
        let moved = NodeTransform::IDENTITY.with_translate(Vec3::new(10.0, 0.0, 0.0));
        scene.set_transform("grp", moved).expect("move");

        let bounds = scene.bbox("grp").expect("bounds");
        assert!(Tolerance::DEFAULT.approx_eq_point3(bounds.min, Point3::new(9.0, 0.0, -2.0)));
        assert_eq!(scene.list_paths(), vec!["grp".to_owned(), "grp|box".to_owned()]);
    }

    #[test]
    fn reparent_keeps_world_placement() {
        let mut scene = scene_with_box();
        scene.create_group("grp", None).expect("group");
        let turned = NodeTransform::IDENTITY.with_rotate(Vec3::new(0.0, 90.0, 0.0)).with_translate(Vec3::new(1.0, 2.0, 3.0));
        scene.set_transform("grp", turned).expect("turn");
        let before = scene.bbox("box").expect("bounds");
        scene.reparent("box", Some("grp")).expect("into");
        let inside = scene.bbox("box").expect("bounds");
        scene.reparent("box", None).expect("out");
        let after = scene.bbox("box").expect("bounds");
        let tol = Tolerance::LOOSE;
        assert!(tol.approx_eq_point3(before.min, inside.min) && tol.approx_eq_point3(before.max, inside.max));
        assert!(tol.approx_eq_point3(before.min, after.min) && tol.approx_eq_point3(before.max, after.max));
        assert!(matches!(scene.reparent("grp", Some("box")), Err(HostError::ParentCycle { .. })));
    }

    #[test]
    fn inherit_off_ignores_parent() {
        let mut scene = MemoryScene::new();
        scene.create_group("root", None).expect("root");
        scene.create_group("free", Some("root")).expect("free");
        scene.create_curve("crv", Some("free"), &[Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)], false).expect("curve");
        let mut free = scene.transform("free").expect("transform");
        free.inherits_transform = false;
        scene.set_transform("free", free).expect("set");
        scene.set_transform("root", NodeTransform::IDENTITY.with_translate(Vec3::new(0.0, 5.0, 0.0))).expect("move");
        assert!(scene.bbox("crv").expect("bounds").max.y.abs() < 1e-12);
    }

    #[test]
    fn freeze_bakes_geometry_and_keeps_pivot() {
        let mut scene = scene_with_box();
        let t = NodeTransform::IDENTITY.with_rotate(Vec3::new(0.0, 0.0, 90.0)).with_pivot(Point3::new(0.0, 0.5, 0.0));
        scene.set_transform("box", t).expect("set");
        let before = scene.bbox("box").expect("bounds");
        scene.freeze("box").expect("freeze");
        let frozen = scene.transform("box").expect("transform");
        assert_eq!(frozen.rotate, Vec3::ZERO);
        assert!(Tolerance::DEFAULT.approx_eq_point3(frozen.pivot, Point3::new(0.0, 0.5, 0.0)));
        let after = scene.bbox("box").expect("bounds");
        assert!(Tolerance::LOOSE.approx_eq_vec3(after.size(), before.size()));
        assert!(Tolerance::LOOSE.approx_eq_vec3(after.size(), Vec3::new(1.0, 2.0, 4.0)));
    }

    #[test]
    fn clusters_follow_their_handle() {
        let mut scene = scene_with_box();
        scene.create_group("handle", None).expect("handle");
        scene.bind_cluster("box", "handle", &[0, 1]).expect("bind");
        scene.set_attribute("handle", "translateY", MetaValue::Number(2.0)).expect("move");
        let pts = scene.mesh_positions("box").expect("mesh");
        assert!((pts[0].y - 2.0).abs() < 1e-12);
        assert!((pts[2].y - 1.0).abs() < 1e-12);
        assert!(matches!(scene.bind_cluster("box", "handle", &[99]), Err(HostError::VertexOutOfRange { .. })));
    }

    #[test]
    fn wrap_binding_follows_driver() {
        let mut scene = scene_with_box();
        scene.duplicate("box", "skin").expect("dup");
        scene.edit_mesh("skin", MeshEdit::ExtrudeFaces { offset: -0.1 }).expect("extrude");
        scene.bind_wrap("skin", "box").expect("wrap");
        scene.set_vertex_position("box", 7, Point3::new(1.0, 3.0, 2.0)).expect("move");
        let skin = scene.mesh_positions("skin").expect("skin");
        assert_eq!(skin.len(), 16);
        assert!((skin[7].y - 3.0).abs() < 1e-12);
        assert!((skin[15].y - 2.9).abs() < 1e-12);
        assert!(matches!(scene.bind_wrap("box", "skin"), Err(HostError::ParentCycle { .. })));
    }

    #[test]
    fn driven_keys_interpolate_and_clamp() {
        let mut scene = scene_with_box();
        scene.create_group("ctrl", None).expect("ctrl");
        scene.add_attribute("ctrl", "animation", MetaValue::Number(0.0), true).expect("attr");
        let driver = Plug::new("ctrl", "animation");
        let driven = Plug::new("box", "rotateX");
        scene.set_driven_key(driver, driven, 1.0, 0.0).expect("key");
        scene.set_driven_key(driver, driven, 2.0, 90.0).expect("key");

        scene.set_attribute("ctrl", "animation", MetaValue::Number(1.5)).expect("drive");
        assert_eq!(scene.attribute("box", "rotateX").expect("value").as_number(), Some(45.0));
        scene.set_attribute("ctrl", "animation", MetaValue::Number(12.0)).expect("drive");
        assert_eq!(scene.attribute("box", "rotateX").expect("value").as_number(), Some(90.0));
        assert_eq!(scene.driven_keys(driven).len(), 2);
        assert!(scene.is_keyable("ctrl", "animation"));
    }

    #[test]
    fn attributes_are_typed() {
        let mut scene = scene_with_box();
        scene.add_attribute("box", "wrap_id", MetaValue::from("ABCDE"), false).expect("attr");
        assert!(matches!(
            scene.set_attribute("box", "wrap_id", MetaValue::Number(1.0)),
            Err(HostError::AttributeType { .. })
        ));
        assert!(matches!(scene.attribute("box", "wrap_name"), Err(HostError::AttributeNotFound { .. })));
        assert!(matches!(
            scene.add_attribute("box", "wrap_id", MetaValue::from("X"), false),
            Err(HostError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn keyframes_evaluate_at_time() {
        let mut scene = scene_with_box();
        scene.add_attribute("box", "animation", MetaValue::Number(0.0), true).expect("attr");
        scene.set_keyframe("box", "animation", 1.0, 0.0).expect("key");
        scene.set_keyframe("box", "animation", 24.0, 15.0).expect("key");
        scene.set_time(24.0).expect("time");
        assert_eq!(scene.attribute("box", "animation").expect("value").as_number(), Some(15.0));
        scene.clear_keyframes("box", "animation").expect("clear");
        assert!(scene.keyframes("box", "animation").is_empty());
    }

    #[test]
    fn extrusions_expose_reveal_and_scale() {
        let mut scene = MemoryScene::new();
        scene.create_curve("path", None, &[Point3::ORIGIN, Point3::new(0.0, 0.0, 3.0)], false).expect("path");
        let square = [Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)];
        scene.create_curve("profile", None, &square, true).expect("profile");
        scene.instance("profile", "profile_2", None).expect("instance");
        scene.extrude("ext", None, "profile_2", "path").expect("extrude");
        scene.set_attribute("ext", "maxValue", MetaValue::Number(3.0)).expect("reveal");
        scene.set_attribute("ext", "scale", MetaValue::Number(0.3)).expect("taper");
        let info = scene.extrusion("ext").expect("extrusion");
        assert_eq!((info.reveal, info.scale), (1.0, 0.3));
        assert_eq!(info.profile, "profile_2");
        assert!(matches!(scene.extrude("bad", None, "ext", "path"), Err(HostError::WrongKind { .. })));
    }

    #[test]
    fn delete_removes_subtree_and_wiring() {
        let mut scene = scene_with_box();
        scene.create_group("main", None).expect("main");
        scene.create_group("ctrl", Some("main")).expect("ctrl");
        scene.add_attribute("ctrl", "animation", MetaValue::Number(0.0), true).expect("attr");
        scene.set_driven_key(Plug::new("ctrl", "animation"), Plug::new("box", "rotateY"), 0.0, 1.0).expect("key");
        scene.delete("main").expect("delete");
        assert!(!scene.exists("ctrl"));
        assert_eq!(scene.driven_key_count(), 0);
        assert_eq!(scene.list("*"), vec!["box".to_owned()]);
        assert!(matches!(scene.delete("main"), Err(HostError::NodeNotFound(_))));
    }

    #[test]
    fn shaders_are_created_once() {
        let mut scene = scene_with_box();
        assert!(scene.ensure_shader("shd_paper_RED", [0.8, 0.3, 0.3]));
        assert!(!scene.ensure_shader("shd_paper_RED", [0.0, 0.0, 0.0]));
        scene.assign_shader("shd_paper_RED", "box").expect("assign");
        assert_eq!(scene.shader_of("box"), Some("shd_paper_RED"));
        assert_eq!(scene.shader_color("shd_paper_RED"), Some([0.8, 0.3, 0.3]));
        assert!(scene.assign_shader("shd_missing", "box").is_err());
    }
}
