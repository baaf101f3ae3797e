//! Hinge pivots of the sixteen folds.

use std::fmt;

use super::FoldError;
use super::pattern::FoldingPattern;
use crate::geom::{Point3, Transform, Vec3};

/// The sixteen fold pivots, in cluster stack order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PivotId {
    U1,
    B1,
    U2,
    B2,
    UR3,
    UL3,
    BR3,
    BL3,
    UR4,
    UL4,
    BR4,
    BL4,
    L5,
    R5,
    L6,
    R6,
}

impl PivotId {
    /// Every pivot in the order its cluster is evaluated.
    pub const ALL: [Self; 16] = [
        Self::U1,
        Self::B1,
        Self::U2,
        Self::B2,
        Self::UR3,
        Self::UL3,
        Self::BR3,
        Self::BL3,
        Self::UR4,
        Self::UL4,
        Self::BR4,
        Self::BL4,
        Self::L5,
        Self::R5,
        Self::L6,
        Self::R6,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U1 => "1U",
            Self::B1 => "1B",
            Self::U2 => "2U",
            Self::B2 => "2B",
            Self::UR3 => "3UR",
            Self::UL3 => "3UL",
            Self::BR3 => "3BR",
            Self::BL3 => "3BL",
            Self::UR4 => "4UR",
            Self::UL4 => "4UL",
            Self::BR4 => "4BR",
            Self::BL4 => "4BL",
            Self::L5 => "5L",
            Self::R5 => "5R",
            Self::L6 => "6L",
            Self::R6 => "6R",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Local hinge axis; the side folds turn about Z, everything else about X.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::L5 | Self::R5 | Self::L6 | Self::R6 => Axis::Z,
            _ => Axis::X,
        }
    }

    /// Fixed euler frame (degrees) of the diagonal hinges; `None` for
    /// world-aligned hinges.
    #[must_use]
    pub const fn frame(self) -> Option<Vec3> {
        let deg = match self {
            Self::UR3 => (0.0, -45.0, 0.0),
            Self::BR3 => (180.0, 225.0, 0.0),
            Self::UL3 => (0.0, 45.0, 0.0),
            Self::BL3 => (0.0, 45.0, 180.0),
            Self::UR4 => (0.0, 135.0, 0.0),
            Self::BR4 => (0.0, 45.0, 0.0),
            Self::UL4 => (0.0, 225.0, 0.0),
            Self::BL4 => (180.0, 225.0, 180.0),
            _ => return None,
        };
        Some(Vec3::new(deg.0, deg.1, deg.2))
    }
}

impl fmt::Display for PivotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hinge rotation axis in the pivot's frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    #[must_use]
    pub fn rotation(self, degrees: f64) -> Transform {
        match self {
            Self::X => Transform::rotate_x_deg(degrees),
            Self::Z => Transform::rotate_z_deg(degrees),
        }
    }
}

/// Animated state of one pivot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PivotPose {
    /// Degrees about the pivot's hinge axis.
    pub rotation: f64,
    /// Offset along the frame's X axis.
    pub translate_x: f64,
}

impl PivotPose {
    pub const REST: Self = Self { rotation: 0.0, translate_x: 0.0 };

    #[must_use]
    pub const fn new(rotation: f64, translate_x: f64) -> Self {
        Self { rotation, translate_x }
    }

    #[must_use]
    pub fn is_rest(self) -> bool {
        self.rotation.abs() < f64::EPSILON && self.translate_x.abs() < f64::EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotPoint {
    pub id: PivotId,
    pub position: Point3,
}

impl PivotPoint {
    /// Fixed frame rotation, identity for world-aligned hinges.
    #[must_use]
    pub fn frame_transform(&self) -> Transform {
        self.id.frame().map_or_else(Transform::identity, Transform::euler_xyz_deg)
    }

    /// World direction of the hinge's local X axis.
    #[must_use]
    pub fn hinge_x(&self) -> Vec3 {
        self.frame_transform().apply_vec(Vec3::X)
    }

    /// World-space motion of the pivot's cluster for `pose`.
    ///
    /// The hinge passes through the pivot position; the translate offset is
    /// taken along the frame's X axis.
    #[must_use]
    pub fn deformation(&self, pose: PivotPose) -> Transform {
        let frame = self.frame_transform();
        let hinge = match frame.inverse() {
            Some(inv) => frame * self.id.axis().rotation(pose.rotation) * inv,
            None => self.id.axis().rotation(pose.rotation),
        };
        let shift = frame.apply_vec(Vec3::new(pose.translate_x, 0.0, 0.0));
        Transform::translate(shift) * Transform::about_pivot(self.position, hinge)
    }
}

/// All sixteen pivots of one wrap.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSet {
    pivots: [PivotPoint; 16],
}

impl PivotSet {
    #[must_use]
    pub const fn get(&self, id: PivotId) -> &PivotPoint {
        &self.pivots[id.index()]
    }

    #[must_use]
    pub fn position(&self, id: PivotId) -> Point3 {
        self.get(id).position
    }

    pub fn iter(&self) -> impl Iterator<Item = &PivotPoint> {
        self.pivots.iter()
    }
}

/// Derive every pivot from the pattern.
///
/// # Errors
/// Returns [`FoldError::MissingPoint`] when a referenced fold point is absent.
pub fn derive_pivots(pattern: &FoldingPattern) -> Result<PivotSet, FoldError> {
    let p = |key: &str| pattern.position(key);

    let u1 = p("I3")?.midpoint(p("F3")?);
    let b1 = p("I5")?.midpoint(p("F5")?);
    let u2 = u1.with_y(u1.y + (p("F3")?.z - p("F2")?.z));
    let b2 = u2.with_z(-u2.z);

    let temp = (p("I3")?.x - p("H3")?.x) / 2.0;
    let ur3 = p("H3")?.offset(temp, 0.0, temp);
    let br3 = p("H5")?.offset(temp, 0.0, -temp);
    let ul3 = p("G3")?.offset(-temp, 0.0, temp);
    let bl3 = p("G5")?.offset(-temp, 0.0, -temp);

    let top = u2.y;
    let r6 = p("H4")?;
    let l6 = p("G4")?;

    let positions = [
        u1,
        b1,
        u2,
        b2,
        ur3,
        ul3,
        br3,
        bl3,
        ur3.with_y(top),
        ul3.with_y(top),
        br3.with_y(top),
        bl3.with_y(top),
        l6.with_y(top),
        r6.with_y(top),
        l6,
        r6,
    ];
    let pivots = std::array::from_fn(|i| PivotPoint { id: PivotId::ALL[i], position: positions[i] });
    crate::debug_log!("pivots: 2U at {:?}, 3UR at {:?}", u2, ur3);
    Ok(PivotSet { pivots })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::BoxExtent;
    use crate::geom::Tolerance;

    fn pattern() -> FoldingPattern {
        FoldingPattern::solve(BoxExtent::new(2.0, 1.0, 3.0), 0.02).expect("solves")
    }

    #[test]
    fn names_round_trip_and_follow_stack_order() {
        for (i, id) in PivotId::ALL.into_iter().enumerate() {
            assert_eq!(id.index(), i);
            assert_eq!(PivotId::from_name(id.name()), Some(id));
        }
        assert_eq!(PivotId::from_name("7X"), None);
    }

    #[test]
    fn pivots_follow_pattern() {
        let pattern = pattern();
        let pivots = derive_pivots(&pattern).expect("derives");
        let params = *pattern.params();
        let tol = Tolerance::DEFAULT;

        let u1 = pivots.position(PivotId::U1);
        assert!(tol.approx_eq_point3(u1, Point3::new(0.0, params.y, params.row_z(3))));
        let u2 = pivots.position(PivotId::U2);
        assert!(tol.approx_eq_f64(u2.y, params.y + params.d));
        assert!(tol.approx_eq_f64(pivots.position(PivotId::B2).z, -u2.z));
        let ur3 = pivots.position(PivotId::UR3);
        assert!(tol.approx_eq_f64(ur3.x, params.column_x(2) + params.b / 2.0));
        assert!(tol.approx_eq_f64(pivots.position(PivotId::UR4).y, u2.y));
        assert!(tol.approx_eq_point3(pivots.position(PivotId::R6), pattern.position("H4").expect("exists")));
        assert!(tol.approx_eq_f64(pivots.position(PivotId::L5).x, params.column_x(1)));
    }

    #[test]
    fn diagonal_hinges_pass_through_their_corner_line() {
        let pattern = pattern();
        let pivots = derive_pivots(&pattern).expect("derives");
        let tol = Tolerance::LOOSE;
        let cases = [(PivotId::UR3, "H3", "I4a"), (PivotId::BR3, "H5", "I4b"), (PivotId::UL3, "G3", "F4a"), (PivotId::BL3, "G5", "F4b")];
        for (id, from, to) in cases {
            let line = (pattern.position(to).expect("exists") - pattern.position(from).expect("exists"))
                .normalized()
                .expect("non-degenerate");
            let axis = pivots.get(id).hinge_x();
            assert!(tol.approx_eq_f64(axis.cross(line).length(), 0.0), "{id}");
        }
    }

    #[test]
    fn hinge_rotation_keeps_pivot_fixed() {
        let pivots = derive_pivots(&pattern()).expect("derives");
        let tol = Tolerance::LOOSE;
        for pivot in pivots.iter() {
            let moved = pivot.deformation(PivotPose::new(178.0, 0.0)).apply_point(pivot.position);
            assert!(tol.approx_eq_point3(moved, pivot.position), "{}", pivot.id);
        }
        let ur3 = pivots.get(PivotId::UR3);
        let shifted = ur3.deformation(PivotPose::new(0.0, 1.0)).apply_point(ur3.position);
        assert!(tol.approx_eq_vec3(shifted - ur3.position, ur3.hinge_x()));
    }

    #[test]
    fn diagonal_corner_folds_upward() {
        let pattern = pattern();
        let pivots = derive_pivots(&pattern).expect("derives");
        let corners = [(PivotId::UR3, "I3"), (PivotId::BR3, "I5"), (PivotId::UL3, "F3"), (PivotId::BL3, "F5")];
        for (id, key) in corners {
            let rest = pattern.position(key).expect("exists");
            let lifted = pivots.get(id).deformation(PivotPose::new(90.0, 0.0)).apply_point(rest);
            assert!(lifted.y > rest.y + 0.1, "{id}");
        }
    }

    #[test]
    fn straight_hinges_have_no_frame() {
        let pivots = derive_pivots(&pattern()).expect("derives");
        assert!(PivotId::U1.frame().is_none());
        assert!(Tolerance::DEFAULT.approx_eq_vec3(pivots.get(PivotId::R5).hinge_x(), Vec3::X));
    }
}
