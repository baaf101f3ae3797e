//! Scene host capability interface.
//!
//! The rig never touches a scene directly: every query and mutation goes
//! through [`SceneHost`]. Topology edits on the fold plane happen on the
//! crate's own [`PolyMesh`](crate::geom::PolyMesh); the host only receives
//! finished meshes, curves and the animation wiring. [`MemoryScene`] is a
//! complete in-process host used by the tests and the CLI.
//!
//! # Example
//! ```ignore
//! use wrap_engine::host::{MemoryScene, SceneHost};
//!
//! let mut scene = MemoryScene::new();
//! scene.create_box("present", [2.0, 1.0, 3.0].into(), [0.0, 0.5, 0.0].into())?;
//! assert!(scene.exists("present"));
//! ```

mod memory;
mod meta;

pub use memory::{ExtrusionInfo, MemoryScene};
pub use meta::{MetaLookupExt, MetaMap, MetaValue};

use crate::geom::{BBox, Point3, PolyMesh, Transform, Vec3};

/// Failures reported by a scene host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    #[error("node `{0}` does not exist")]
    NodeNotFound(String),
    #[error("node `{0}` already exists")]
    DuplicateNode(String),
    #[error("node `{node}` is not a {expected}")]
    WrongKind { node: String, expected: &'static str },
    #[error("node `{node}` has no attribute `{attribute}`")]
    AttributeNotFound { node: String, attribute: String },
    #[error("node `{node}` already has an attribute `{attribute}`")]
    DuplicateAttribute { node: String, attribute: String },
    #[error("attribute `{node}.{attribute}` expects a {expected} value, got {found}")]
    AttributeType { node: String, attribute: String, expected: &'static str, found: &'static str },
    #[error("vertex {index} is out of range for `{node}` ({count} vertices)")]
    VertexOutOfRange { node: String, index: usize, count: usize },
    #[error("cannot parent `{child}` under its own descendant `{parent}`")]
    ParentCycle { child: String, parent: String },
    #[error("node `{0}` has no geometry to measure")]
    EmptyBounds(String),
    #[error("transform of `{0}` is singular")]
    SingularTransform(String),
}

/// Local transform channels of a node.
///
/// The local matrix is `T(translate) * T(pivot) * R(rotate) * S(scale) * T(-pivot)`
/// with `rotate` in XYZ euler degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translate: Vec3,
    pub rotate: Vec3,
    pub scale: Vec3,
    pub pivot: Point3,
    /// When false the node ignores its parent's transform.
    pub inherits_transform: bool,
    pub visible: bool,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl NodeTransform {
    pub const IDENTITY: Self = Self {
        translate: Vec3::ZERO,
        rotate: Vec3::ZERO,
        scale: Vec3::new(1.0, 1.0, 1.0),
        pivot: Point3::ORIGIN,
        inherits_transform: true,
        visible: true,
    };

    #[must_use]
    pub const fn with_translate(mut self, translate: Vec3) -> Self {
        self.translate = translate;
        self
    }

    #[must_use]
    pub const fn with_rotate(mut self, rotate: Vec3) -> Self {
        self.rotate = rotate;
        self
    }

    #[must_use]
    pub const fn with_pivot(mut self, pivot: Point3) -> Self {
        self.pivot = pivot;
        self
    }

    #[must_use]
    pub fn matrix(&self) -> Transform {
        let linear = Transform::euler_xyz_deg(self.rotate) * Transform::scale(self.scale);
        Transform::translate(self.translate) * Transform::about_pivot(self.pivot, linear)
    }

    /// Channels that reproduce `matrix`, keeping this transform's pivot and
    /// scale. The linear part of `matrix` must be a rotation times the
    /// current scale.
    #[must_use]
    pub fn refit(&self, matrix: Transform) -> Self {
        let unscale = Transform::scale(Vec3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z));
        let rotate = (matrix.linear() * unscale).to_euler_xyz_deg();
        let pivot = self.pivot.to_vec3();
        let translate = matrix.translation() - pivot + matrix.apply_vec(pivot);
        Self { translate, rotate, ..*self }
    }

    /// Value of a named channel (`translateX`, `rotateY`, `scaleZ`, `visibility`, ...).
    #[must_use]
    pub fn channel(&self, name: &str) -> Option<f64> {
        let v = match name {
            "translateX" => self.translate.x,
            "translateY" => self.translate.y,
            "translateZ" => self.translate.z,
            "rotateX" => self.rotate.x,
            "rotateY" => self.rotate.y,
            "rotateZ" => self.rotate.z,
            "scaleX" => self.scale.x,
            "scaleY" => self.scale.y,
            "scaleZ" => self.scale.z,
            "visibility" => f64::from(u8::from(self.visible)),
            _ => return None,
        };
        Some(v)
    }

    /// Set a named channel; returns false for names that are not channels.
    pub fn set_channel(&mut self, name: &str, value: f64) -> bool {
        let slot = match name {
            "translateX" => &mut self.translate.x,
            "translateY" => &mut self.translate.y,
            "translateZ" => &mut self.translate.z,
            "rotateX" => &mut self.rotate.x,
            "rotateY" => &mut self.rotate.y,
            "rotateZ" => &mut self.rotate.z,
            "scaleX" => &mut self.scale.x,
            "scaleY" => &mut self.scale.y,
            "scaleZ" => &mut self.scale.z,
            "visibility" => {
                self.visible = value >= 0.5;
                return true;
            }
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// Edits applied to a host mesh after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeshEdit {
    Bevel { offset: f64 },
    Subdivide { divisions: u32 },
    /// Extrude every face along Y by `offset`.
    ExtrudeFaces { offset: f64 },
    PlanarUv,
}

/// `node.attribute` reference used by driven keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plug<'a> {
    pub node: &'a str,
    pub attribute: &'a str,
}

impl<'a> Plug<'a> {
    #[must_use]
    pub const fn new(node: &'a str, attribute: &'a str) -> Self {
        Self { node, attribute }
    }
}

/// Everything the rig needs from a scene.
///
/// Node names are unique. Parent arguments of `None` mean the scene root.
pub trait SceneHost {
    // ── queries ────────────────────────────────────────────────────────────
    fn exists(&self, name: &str) -> bool;

    /// World-space bounds of the node's geometry and all its descendants,
    /// with deformers evaluated.
    fn bbox(&self, name: &str) -> Result<BBox, HostError>;

    fn parent_of(&self, name: &str) -> Result<Option<String>, HostError>;

    /// Node names matching a glob pattern (`*`, `?`).
    fn list(&self, pattern: &str) -> Vec<String>;

    /// Full `|`-separated path of every node.
    fn list_paths(&self) -> Vec<String>;

    // ── transforms ────────────────────────────────────────────────────────
    fn create_group(&mut self, name: &str, parent: Option<&str>) -> Result<(), HostError>;

    /// Move `name` under `parent`, keeping its world placement.
    fn reparent(&mut self, name: &str, parent: Option<&str>) -> Result<(), HostError>;

    fn transform(&self, name: &str) -> Result<NodeTransform, HostError>;

    fn set_transform(&mut self, name: &str, transform: NodeTransform) -> Result<(), HostError>;

    /// Bake the local transform into the node's geometry and reset the
    /// channels; the pivot keeps its world position.
    fn freeze(&mut self, name: &str) -> Result<(), HostError>;

    /// Delete a node and everything below it.
    fn delete(&mut self, name: &str) -> Result<(), HostError>;

    // ── meshes ────────────────────────────────────────────────────────────
    fn create_mesh(&mut self, name: &str, parent: Option<&str>, mesh: &PolyMesh) -> Result<(), HostError>;

    /// Object-space vertex positions with deformers evaluated.
    fn mesh_positions(&self, name: &str) -> Result<Vec<Point3>, HostError>;

    fn set_vertex_position(&mut self, name: &str, index: usize, position: Point3) -> Result<(), HostError>;

    /// Copy a node (geometry, transform, attributes) under the same parent.
    fn duplicate(&mut self, source: &str, name: &str) -> Result<(), HostError>;

    fn edit_mesh(&mut self, name: &str, edit: MeshEdit) -> Result<(), HostError>;

    /// Let `driven` follow the deformed shape of `driver`.
    fn bind_wrap(&mut self, driven: &str, driver: &str) -> Result<(), HostError>;

    /// Bind `vertices` of `mesh` to the transform `handle`. Clusters deform
    /// in bind order.
    fn bind_cluster(&mut self, mesh: &str, handle: &str, vertices: &[usize]) -> Result<(), HostError>;

    // ── curves ────────────────────────────────────────────────────────────
    fn create_curve(&mut self, name: &str, parent: Option<&str>, points: &[Point3], closed: bool) -> Result<(), HostError>;

    /// New transform sharing the shape of `source`.
    fn instance(&mut self, source: &str, name: &str, parent: Option<&str>) -> Result<(), HostError>;

    /// Sweep `profile` along `path`. The extrusion exposes `maxValue`
    /// (revealed fraction of the path) and `scale` (section scale at the end).
    fn extrude(&mut self, name: &str, parent: Option<&str>, profile: &str, path: &str) -> Result<(), HostError>;

    // ── attributes and animation ──────────────────────────────────────────
    fn add_attribute(&mut self, node: &str, attribute: &str, value: MetaValue, keyable: bool) -> Result<(), HostError>;

    fn attribute(&self, node: &str, attribute: &str) -> Result<MetaValue, HostError>;

    fn set_attribute(&mut self, node: &str, attribute: &str, value: MetaValue) -> Result<(), HostError>;

    /// Key `driven` to take `value` when `driver` equals `driver_value`.
    fn set_driven_key(&mut self, driver: Plug<'_>, driven: Plug<'_>, driver_value: f64, value: f64) -> Result<(), HostError>;

    fn set_keyframe(&mut self, node: &str, attribute: &str, time: f64, value: f64) -> Result<(), HostError>;

    fn clear_keyframes(&mut self, node: &str, attribute: &str) -> Result<(), HostError>;

    // ── shading ───────────────────────────────────────────────────────────
    /// Create `name` unless it exists; returns true when created.
    fn ensure_shader(&mut self, name: &str, color: [f64; 3]) -> bool;

    fn assign_shader(&mut self, shader: &str, node: &str) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    #[test]
    fn matrix_rotates_about_pivot() {
        let t = NodeTransform::IDENTITY.with_rotate(Vec3::new(0.0, 0.0, 90.0)).with_pivot(Point3::new(1.0, 0.0, 0.0));
        let moved = t.matrix().apply_point(Point3::new(2.0, 0.0, 0.0));
        assert!(Tolerance::DEFAULT.approx_eq_point3(moved, Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn refit_reproduces_matrix() {
        let base = NodeTransform::IDENTITY.with_pivot(Point3::new(0.5, -1.0, 2.0));
        let target = Transform::translate(Vec3::new(3.0, 1.0, -2.0)) * Transform::rotate_y_deg(30.0) * base.matrix();
        let fitted = base.refit(target);
        assert!(fitted.matrix().max_abs_diff(&target) < 1e-9);
        assert_eq!(fitted.pivot, base.pivot);
    }

    #[test]
    fn channels_by_name() {
        let mut t = NodeTransform::IDENTITY;
        assert!(t.set_channel("rotateX", 45.0));
        assert!(t.set_channel("visibility", 0.0));
        assert!(!t.set_channel("maxValue", 1.0));
        assert_eq!(t.channel("rotateX"), Some(45.0));
        assert_eq!(t.channel("visibility"), Some(0.0));
        assert!(!t.visible);
    }
}
