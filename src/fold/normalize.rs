//! Box orientation normalizer.
//!
//! The largest face goes down and, for some area orders, the box takes an
//! extra quarter turn about Y. The canonical extents are read in that frame.

use serde::{Deserialize, Serialize};

use super::FoldError;
use crate::geom::{Transform, Vec3};

/// Canonical box extents: `width` along X, `height` along Y, `depth` along Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxExtent {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl BoxExtent {
    #[must_use]
    pub const fn new(width: f64, height: f64, depth: f64) -> Self {
        Self { width, height, depth }
    }

    #[must_use]
    pub const fn from_size(size: Vec3) -> Self {
        Self::new(size.x, size.y, size.z)
    }

    #[must_use]
    pub const fn to_size(self) -> Vec3 {
        Vec3::new(self.width, self.height, self.depth)
    }

    /// All extents finite and strictly positive.
    #[must_use]
    pub fn is_valid(self) -> bool {
        [self.width, self.height, self.depth].iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Box faces named by the two extents spanning them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceArea {
    DepthWidth,
    DepthHeight,
    WidthHeight,
}

/// Rotation that brings a box into the canonical frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    /// Face that ends up facing down.
    pub down: FaceArea,
    /// Face with the smallest area.
    pub smallest: FaceArea,
    /// Base rotation in degrees, baked into the object before the turn.
    pub base_rotation: Vec3,
    /// Extra quarter turn about Y applied on top of the baked rotation.
    pub turn_y: bool,
}

impl Orientation {
    #[must_use]
    pub fn base_transform(&self) -> Transform {
        Transform::euler_xyz_deg(self.base_rotation)
    }

    /// Degrees about Y applied after the base rotation is baked.
    #[must_use]
    pub const fn turn_degrees(&self) -> f64 {
        if self.turn_y { 90.0 } else { 0.0 }
    }

    /// Full rotation from the object frame to the canonical frame.
    #[must_use]
    pub fn rotation(&self) -> Transform {
        Transform::rotate_y_deg(self.turn_degrees()) * self.base_transform()
    }
}

/// Pick the canonical orientation for an axis-aligned box of `size`.
///
/// Face areas are sorted with a stable sort, so ties keep the order
/// depth-width, depth-height, width-height.
///
/// # Errors
/// Returns [`FoldError::InvalidExtent`] for non-finite or non-positive sizes.
pub fn normalize(size: Vec3) -> Result<(BoxExtent, Orientation), FoldError> {
    let (w, h, d) = (size.x, size.y, size.z);
    if !BoxExtent::new(w, h, d).is_valid() {
        return Err(FoldError::InvalidExtent { width: w, height: h, depth: d });
    }

    let mut areas = [(FaceArea::DepthWidth, d * w), (FaceArea::DepthHeight, d * h), (FaceArea::WidthHeight, w * h)];
    areas.sort_by(|a, b| a.1.total_cmp(&b.1));
    let smallest = areas[0].0;
    let down = areas[2].0;

    let (base_rotation, mut sides) = match down {
        FaceArea::DepthWidth => (Vec3::ZERO, [w, h, d]),
        FaceArea::DepthHeight => (Vec3::new(0.0, 0.0, 90.0), [h, w, d]),
        FaceArea::WidthHeight => (Vec3::new(90.0, 0.0, 0.0), [w, d, h]),
    };

    let turn_y = matches!(
        (down, smallest),
        (FaceArea::DepthWidth | FaceArea::DepthHeight, FaceArea::WidthHeight)
            | (FaceArea::WidthHeight, FaceArea::DepthWidth)
    );
    if turn_y {
        sides.swap(0, 2);
    }

    log::debug!("orientation: {down:?} down, {smallest:?} smallest, turn_y = {turn_y}");
    let orientation = Orientation { down, smallest, base_rotation, turn_y };
    Ok((BoxExtent::new(sides[0], sides[1], sides[2]), orientation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BBox, Point3, Tolerance};

    fn rotated_size(size: Vec3, orientation: &Orientation) -> Vec3 {
        let half = size * 0.5;
        let bbox = BBox::new(Point3::from(-half), Point3::from(half));
        bbox.transform(orientation.rotation()).size()
    }

    #[test]
    fn flat_box_stays_put() {
        let (extent, o) = normalize(Vec3::new(6.0, 1.0, 6.0)).expect("valid");
        assert_eq!(o.down, FaceArea::DepthWidth);
        assert!(!o.turn_y);
        assert_eq!(extent, BoxExtent::new(6.0, 1.0, 6.0));
    }

    #[test]
    fn cube_ties_pick_width_height_down() {
        let (extent, o) = normalize(Vec3::new(1.0, 1.0, 1.0)).expect("valid");
        assert_eq!(o.down, FaceArea::WidthHeight);
        assert_eq!(o.smallest, FaceArea::DepthWidth);
        assert!(o.turn_y);
        assert_eq!(extent, BoxExtent::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn tall_box_lies_down() {
        let (extent, o) = normalize(Vec3::new(1.0, 3.0, 4.0)).expect("valid");
        assert_eq!(o.down, FaceArea::DepthHeight);
        assert_eq!(o.smallest, FaceArea::WidthHeight);
        assert!(o.turn_y);
        assert_eq!(extent, BoxExtent::new(4.0, 1.0, 3.0));
    }

    #[test]
    fn extents_match_rotated_bounding_box() {
        let tol = Tolerance::LOOSE;
        for size in [Vec3::new(1.0, 3.0, 4.0), Vec3::new(2.0, 4.0, 1.0), Vec3::new(5.0, 1.0, 2.0), Vec3::new(3.0, 2.0, 0.5)] {
            let (extent, o) = normalize(size).expect("valid");
            assert!(tol.approx_eq_vec3(rotated_size(size, &o), extent.to_size()), "{size:?}");
            assert!(extent.height <= extent.width.max(extent.depth) + 1e-12);
        }
    }

    #[test]
    fn rejects_degenerate_box() {
        assert!(normalize(Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(normalize(Vec3::new(f64::INFINITY, 1.0, 1.0)).is_err());
    }
}
