use std::ops::{Add, Div, Mul, Neg, Sub};

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[must_use]
    pub const fn cross(self, rhs: Self) -> Self {
        Self {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    /// Unit-length copy, or `None` for zero or non-finite input.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        (len.is_finite() && len > 0.0).then(|| self / len)
    }

    /// Component-wise product.
    #[must_use]
    pub const fn scale_by(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    #[must_use]
    pub fn min(self, rhs: Self) -> Self {
        Self::new(self.x.min(rhs.x), self.y.min(rhs.y), self.z.min(rhs.z))
    }

    #[must_use]
    pub fn max(self, rhs: Self) -> Self {
        Self::new(self.x.max(rhs.x), self.y.max(rhs.y), self.z.max(rhs.z))
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;
    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Copy with the X coordinate replaced.
    #[must_use]
    pub const fn with_x(self, x: f64) -> Self {
        Self::new(x, self.y, self.z)
    }

    /// Copy with the Y coordinate replaced.
    #[must_use]
    pub const fn with_y(self, y: f64) -> Self {
        Self::new(self.x, y, self.z)
    }

    /// Copy with the Z coordinate replaced.
    #[must_use]
    pub const fn with_z(self, z: f64) -> Self {
        Self::new(self.x, self.y, z)
    }

    /// Copy moved by the given per-axis offsets.
    #[must_use]
    pub const fn offset(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    #[must_use]
    pub fn midpoint(self, rhs: Self) -> Self {
        self.lerp(rhs, 0.5)
    }

    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

impl From<Vec3> for Point3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl Add<Vec3> for Point3 {
    type Output = Self;
    fn add(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub<Vec3> for Point3 {
    type Output = Self;
    fn sub(self, rhs: Vec3) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Vec3;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transform
// ─────────────────────────────────────────────────────────────────────────────

/// Affine 4x4 transform acting on column vectors (`p' = M * p`).
///
/// Composition reads right to left: `a * b` applies `b` first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [[f64; 4]; 4],
}

impl Transform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub const fn translate(offset: Vec3) -> Self {
        Self {
            m: [
                [1.0, 0.0, 0.0, offset.x],
                [0.0, 1.0, 0.0, offset.y],
                [0.0, 0.0, 1.0, offset.z],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub const fn scale(s: Vec3) -> Self {
        Self {
            m: [
                [s.x, 0.0, 0.0, 0.0],
                [0.0, s.y, 0.0, 0.0],
                [0.0, 0.0, s.z, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Rotation about X by `degrees` (right-handed).
    #[must_use]
    pub fn rotate_x_deg(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_linear([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    /// Rotation about Y by `degrees` (right-handed).
    #[must_use]
    pub fn rotate_y_deg(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_linear([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    /// Rotation about Z by `degrees` (right-handed).
    #[must_use]
    pub fn rotate_z_deg(degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        Self::from_linear([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Euler rotation in XYZ order: X is applied first, then Y, then Z.
    #[must_use]
    pub fn euler_xyz_deg(angles: Vec3) -> Self {
        Self::rotate_z_deg(angles.z) * Self::rotate_y_deg(angles.y) * Self::rotate_x_deg(angles.x)
    }

    /// Conjugates `inner` so it acts about `pivot` instead of the origin.
    #[must_use]
    pub fn about_pivot(pivot: Point3, inner: Self) -> Self {
        Self::translate(pivot.to_vec3()) * inner * Self::translate(-pivot.to_vec3())
    }

    const fn from_linear(l: [[f64; 3]; 3]) -> Self {
        Self {
            m: [
                [l[0][0], l[0][1], l[0][2], 0.0],
                [l[1][0], l[1][1], l[1][2], 0.0],
                [l[2][0], l[2][1], l[2][2], 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    #[must_use]
    pub fn compose(self, other: Self) -> Self {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        Self { m: out }
    }

    /// Inverse of an affine transform, or `None` when the linear part is singular.
    #[must_use]
    pub fn inverse(self) -> Option<Self> {
        let a = &self.m;
        let cof = |r0: usize, r1: usize, c0: usize, c1: usize| a[r0][c0] * a[r1][c1] - a[r0][c1] * a[r1][c0];

        // Adjugate of the 3x3 linear block.
        let adj = [
            [cof(1, 2, 1, 2), -cof(0, 2, 1, 2), cof(0, 1, 1, 2)],
            [-cof(1, 2, 0, 2), cof(0, 2, 0, 2), -cof(0, 1, 0, 2)],
            [cof(1, 2, 0, 1), -cof(0, 2, 0, 1), cof(0, 1, 0, 1)],
        ];
        let det = a[0][0] * adj[0][0] + a[0][1] * adj[1][0] + a[0][2] * adj[2][0];
        if !det.is_finite() || det.abs() < 1e-15 {
            return None;
        }

        let mut inv = [[0.0; 3]; 3];
        for (i, row) in inv.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = adj[i][j] / det;
            }
        }
        let t = self.translation();
        let mut out = Self::from_linear(inv);
        for (i, row) in inv.iter().enumerate() {
            out.m[i][3] = -(row[0] * t.x + row[1] * t.y + row[2] * t.z);
        }
        Some(out)
    }

    #[must_use]
    pub const fn translation(self) -> Vec3 {
        Vec3::new(self.m[0][3], self.m[1][3], self.m[2][3])
    }

    #[must_use]
    pub fn apply_point(self, p: Point3) -> Point3 {
        let v = self.apply_vec(p.to_vec3());
        Point3::new(v.x + self.m[0][3], v.y + self.m[1][3], v.z + self.m[2][3])
    }

    #[must_use]
    pub fn apply_vec(self, v: Vec3) -> Vec3 {
        let row = |i: usize| self.m[i][0] * v.x + self.m[i][1] * v.y + self.m[i][2] * v.z;
        Vec3::new(row(0), row(1), row(2))
    }

    /// Largest absolute element-wise difference to `other`.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        self.m
            .iter()
            .flatten()
            .zip(other.m.iter().flatten())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    #[must_use]
    pub const fn as_matrix(&self) -> &[[f64; 4]; 4] {
        &self.m
    }

    /// Linear part only, translation dropped.
    #[must_use]
    pub const fn linear(self) -> Self {
        let m = self.m;
        Self::from_linear([[m[0][0], m[0][1], m[0][2]], [m[1][0], m[1][1], m[1][2]], [m[2][0], m[2][1], m[2][2]]])
    }

    /// XYZ euler angles (degrees) of a pure rotation; inverse of
    /// [`Transform::euler_xyz_deg`]. At gimbal lock X is reported as zero.
    #[must_use]
    pub fn to_euler_xyz_deg(self) -> Vec3 {
        let m = &self.m;
        let sy = (-m[2][0]).clamp(-1.0, 1.0);
        let y = sy.asin();
        if y.cos().abs() > 1e-9 {
            let x = m[2][1].atan2(m[2][2]);
            let z = m[1][0].atan2(m[0][0]);
            Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
        } else {
            let z = (-m[0][1]).atan2(m[1][1]);
            Vec3::new(0.0, y.to_degrees(), z.to_degrees())
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// BBox
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min: Point3,
    pub max: Point3,
}

impl BBox {
    #[must_use]
    pub const fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Tight box around `points`, `None` when the slice is empty.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::new(*first, *first), |b, p| b.expand_point(*p)))
    }

    #[must_use]
    pub fn center(self) -> Point3 {
        self.min.midpoint(self.max)
    }

    #[must_use]
    pub fn size(self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn expand_point(self, p: Point3) -> Self {
        Self::new(
            Point3::from(self.min.to_vec3().min(p.to_vec3())),
            Point3::from(self.max.to_vec3().max(p.to_vec3())),
        )
    }

    /// Grow uniformly on every side.
    #[must_use]
    pub fn expand_by(self, amount: f64) -> Self {
        let d = Vec3::new(amount, amount, amount);
        Self::new(self.min - d, self.max + d)
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        self.expand_point(other.min).expand_point(other.max)
    }

    #[must_use]
    pub fn corners(self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Axis-aligned box around the transformed corners.
    #[must_use]
    pub fn transform(self, t: Transform) -> Self {
        let moved = self.corners().map(|c| t.apply_point(c));
        Self::from_points(&moved).unwrap_or(self)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Comparison tolerance for geometric checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// General comparisons (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };
    /// Loose comparisons after chained rotations (1e-6).
    pub const LOOSE: Self = Self { eps: 1e-6 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_eq_point3(self, a: Point3, b: Point3) -> bool {
        self.approx_eq_f64(a.x, b.x) && self.approx_eq_f64(a.y, b.y) && self.approx_eq_f64(a.z, b.z)
    }

    #[must_use]
    pub fn approx_eq_vec3(self, a: Vec3, b: Vec3) -> bool {
        self.approx_eq_point3(Point3::from(a), Point3::from(b))
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Tolerance = Tolerance::new(1e-12);

    #[test]
    fn test_point_copy_helpers() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(p.with_x(-4.0), Point3::new(-4.0, 2.0, 3.0));
        assert_eq!(p.with_y(0.5), Point3::new(1.0, 0.5, 3.0));
        assert_eq!(p.with_z(9.0), Point3::new(1.0, 2.0, 9.0));
        assert_eq!(p.offset(1.0, -2.0, 0.5), Point3::new(2.0, 0.0, 3.5));
        assert_eq!(p.midpoint(Point3::new(3.0, 2.0, 1.0)), Point3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn test_rotation_directions_are_right_handed() {
        let up = Transform::rotate_x_deg(90.0).apply_vec(Vec3::Z);
        assert!(TOL.approx_eq_vec3(up, -Vec3::Y));

        let side = Transform::rotate_z_deg(90.0).apply_vec(Vec3::X);
        assert!(TOL.approx_eq_vec3(side, Vec3::Y));

        let yaw = Transform::rotate_y_deg(90.0).apply_vec(Vec3::Z);
        assert!(TOL.approx_eq_vec3(yaw, Vec3::X));
    }

    #[test]
    fn test_euler_order_applies_x_first() {
        let r = Transform::euler_xyz_deg(Vec3::new(90.0, 0.0, 90.0));
        // X turns +Y into +Z, then Z leaves +Z alone.
        assert!(TOL.approx_eq_vec3(r.apply_vec(Vec3::Y), Vec3::Z));
        // X leaves +X alone, then Z turns it into +Y.
        assert!(TOL.approx_eq_vec3(r.apply_vec(Vec3::X), Vec3::Y));
    }

    #[test]
    fn test_about_pivot_keeps_pivot_fixed() {
        let pivot = Point3::new(2.0, 1.0, -3.0);
        let t = Transform::about_pivot(pivot, Transform::rotate_y_deg(37.0));
        assert!(TOL.approx_eq_point3(t.apply_point(pivot), pivot));
    }

    #[test]
    fn test_inverse_undoes_scaled_rotation() {
        let t = Transform::translate(Vec3::new(1.0, -2.0, 3.0))
            * Transform::euler_xyz_deg(Vec3::new(10.0, 20.0, 30.0))
            * Transform::scale(Vec3::new(2.0, 0.5, 1.5));
        let inv = t.inverse().expect("invertible");
        assert!((t * inv).max_abs_diff(&Transform::identity()) < 1e-12);

        assert!(Transform::scale(Vec3::new(1.0, 0.0, 1.0)).inverse().is_none());
    }

    #[test]
    fn test_euler_extraction_round_trips() {
        for angles in [Vec3::new(10.0, 20.0, 30.0), Vec3::new(-90.0, 45.0, 180.0), Vec3::new(0.0, -30.0, 0.0)] {
            let r = Transform::euler_xyz_deg(angles);
            let back = Transform::euler_xyz_deg(r.to_euler_xyz_deg());
            assert!(r.max_abs_diff(&back) < 1e-9, "{angles:?}");
        }
        let locked = Transform::euler_xyz_deg(Vec3::new(30.0, 90.0, 0.0));
        assert!(locked.max_abs_diff(&Transform::euler_xyz_deg(locked.to_euler_xyz_deg())) < 1e-9);
    }

    #[test]
    fn test_bbox_transform_and_expand() {
        let b = BBox::new(Point3::new(-1.0, 0.0, -2.0), Point3::new(1.0, 1.0, 2.0));
        let turned = b.transform(Transform::rotate_y_deg(90.0));
        assert!(TOL.approx_eq_vec3(turned.size(), Vec3::new(4.0, 1.0, 2.0)));

        let grown = b.expand_by(0.5);
        assert!(TOL.approx_eq_vec3(grown.size(), Vec3::new(3.0, 2.0, 5.0)));
        assert_eq!(BBox::from_points(&[]), None);
    }
}
