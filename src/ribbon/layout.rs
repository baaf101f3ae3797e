//! Anatomical ribbon points.
//!
//! Coordinates are relative to the bottom centre of the wrapped gift. Each
//! face crossing gets three points: the edge point just inside the face
//! border, a `mid` point halfway back towards the face centre and an `end`
//! point that rounds the corner.

use std::collections::BTreeMap;

use super::RibbonError;
use crate::fold::TieSegment;
use crate::geom::Point3;

/// Inputs of the layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonDimensions {
    /// Wrapped box size along X.
    pub width: f64,
    /// Wrapped box size along Y.
    pub height: f64,
    /// Wrapped box size along Z.
    pub depth: f64,
    /// Unwrapped object width.
    pub side_a: f64,
    /// Paper thickness.
    pub thickness: f64,
    pub ribbon_thickness: f64,
    pub ribbon_width: f64,
}

impl RibbonDimensions {
    /// Dimensions with the ribbon as thick as the paper and a zero width.
    #[must_use]
    pub const fn new(width: f64, height: f64, depth: f64, side_a: f64, thickness: f64) -> Self {
        Self { width, height, depth, side_a, thickness, ribbon_thickness: thickness, ribbon_width: 0.0 }
    }

    #[must_use]
    pub const fn with_ribbon_width(mut self, ribbon_width: f64) -> Self {
        self.ribbon_width = ribbon_width;
        self
    }

    #[must_use]
    pub const fn with_ribbon_thickness(mut self, ribbon_thickness: f64) -> Self {
        self.ribbon_thickness = ribbon_thickness;
        self
    }

    fn validate(&self) -> Result<(), RibbonError> {
        let fields = [
            (self.width, "width"),
            (self.height, "height"),
            (self.depth, "depth"),
            (self.side_a, "side_a"),
            (self.thickness, "thickness"),
            (self.ribbon_thickness, "ribbon thickness"),
            (self.ribbon_width, "ribbon width"),
        ];
        match fields.iter().find(|(v, _)| !(v.is_finite() && *v > 0.0)) {
            Some((_, name)) => Err(RibbonError::InvalidDimensions(name)),
            None => Ok(()),
        }
    }
}

/// Named ribbon points of one wrapped gift.
#[derive(Debug, Clone, PartialEq)]
pub struct RibbonLayout {
    dims: RibbonDimensions,
    points: BTreeMap<String, Point3>,
}

#[derive(Debug, Clone, Copy)]
enum Coord {
    X,
    Z,
}

fn get(p: Point3, c: Coord) -> f64 {
    match c {
        Coord::X => p.x,
        Coord::Z => p.z,
    }
}

fn set(p: Point3, c: Coord, v: f64) -> Point3 {
    match c {
        Coord::X => p.with_x(v),
        Coord::Z => p.with_z(v),
    }
}

impl RibbonLayout {
    /// Compute the full layout.
    ///
    /// # Errors
    /// Fails when any dimension is not finite and positive.
    pub fn compute(dims: RibbonDimensions) -> Result<Self, RibbonError> {
        dims.validate()?;
        let mut layout = Self { dims, points: BTreeMap::new() };
        layout.place_anchors();
        layout.place_faces()?;
        layout.place_bows()?;
        layout.place_knot()?;
        crate::debug_log!("ribbon layout: {} points", layout.points.len());
        Ok(layout)
    }

    #[must_use]
    pub const fn dimensions(&self) -> RibbonDimensions {
        self.dims
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// # Errors
    /// Fails when `key` is not a layout point.
    pub fn point(&self, key: &str) -> Result<Point3, RibbonError> {
        self.points.get(key).copied().ok_or_else(|| RibbonError::MissingPoint(key.to_owned()))
    }

    pub fn points(&self) -> impl Iterator<Item = (&str, Point3)> {
        self.points.iter().map(|(k, p)| (k.as_str(), *p))
    }

    /// Point keys of a tie segment, in drawing order.
    #[must_use]
    pub fn curve_keys(segment: TieSegment) -> Vec<String> {
        let around = |first: &str, side: &str, last: &str| -> Vec<String> {
            let (f, s, l) = (first, side, last);
            [
                f.to_owned(),
                format!("{f}{s}mid"),
                format!("{f}{s}end"),
                format!("{f}{s}"),
                format!("{s}{f}"),
                format!("{s}{f}end"),
                format!("{s}{f}mid"),
                s.to_owned(),
                format!("{s}{l}mid"),
                format!("{s}{l}end"),
                format!("{s}{l}"),
                format!("{l}{s}"),
                format!("{l}{s}end"),
                format!("{l}{s}mid"),
                l.to_owned(),
            ]
            .into()
        };
        match segment {
            TieSegment::Up => around("U", "B", "D"),
            TieSegment::Down => around("U", "F", "D"),
            TieSegment::Left => around("D", "L", "U"),
            TieSegment::Right => around("D", "R", "U"),
            TieSegment::BowLeft => (1..=7).map(|i| format!("bow_L{i}")).collect(),
            TieSegment::BowRight => (1..=6).map(|i| format!("bow_R{i}")).collect(),
            TieSegment::Knot => (1..=5).map(|i| format!("knot_{i}")).collect(),
        }
    }

    /// Control points of a tie segment.
    ///
    /// # Errors
    /// Fails when a key of the segment is missing from the layout.
    pub fn curve(&self, segment: TieSegment) -> Result<Vec<Point3>, RibbonError> {
        Self::curve_keys(segment).iter().map(|k| self.point(k)).collect()
    }

    // ─────────────────────────────────────────────────────────────────────
    // placement
    // ─────────────────────────────────────────────────────────────────────

    fn put(&mut self, key: impl Into<String>, p: Point3) {
        self.points.insert(key.into(), p);
    }

    fn at(&self, key: &str) -> Result<Point3, RibbonError> {
        self.point(key)
    }

    fn y_pos(&self) -> f64 {
        self.dims.height + self.dims.ribbon_thickness / 3.0
    }

    fn edge_margin(&self) -> f64 {
        self.dims.thickness / 2.0
    }

    fn end_margin(&self) -> f64 {
        2.0 * self.dims.thickness
    }

    fn x_edge(&self) -> f64 {
        self.dims.side_a / 2.0
    }

    fn place_anchors(&mut self) {
        let d = self.dims;
        let x_pos = d.width / 2.0 + d.ribbon_thickness + d.thickness;
        let z_pos = d.depth / 2.0 + d.ribbon_thickness / 3.0;
        let mid_h = d.height / 2.0;

        self.put("U", Point3::new(0.0, self.y_pos(), 0.0));
        self.put("D", Point3::ORIGIN);
        self.put("L", Point3::new(-x_pos, mid_h, 0.0));
        self.put("R", Point3::new(x_pos, mid_h, 0.0));
        self.put("F", Point3::new(0.0, mid_h, z_pos));
        self.put("B", Point3::new(0.0, mid_h, -z_pos));
    }

    /// Edge, mid and end point of `face` towards `side` along `coord`.
    fn edge(&mut self, face: &str, side: &str, coord: Coord, edge: f64, end_delta: f64) -> Result<(), RibbonError> {
        let base = set(self.at(face)?, coord, edge);
        let key = format!("{face}{side}");
        self.put(format!("{key}mid"), set(base, coord, get(base, coord) * 0.5));
        self.put(format!("{key}end"), set(base, coord, get(base, coord) + end_delta));
        self.put(key, base);
        Ok(())
    }

    /// Edge, mid and end point on a side face rising towards `U` or `D`.
    fn vertical(
        &mut self,
        face: &str,
        toward: &str,
        edge_y: f64,
        mid: Point3,
        end_dy: f64,
        end_dx: f64,
    ) -> Result<(), RibbonError> {
        let key = format!("{face}{toward}");
        let base = self.at(face)?.with_y(edge_y);
        let base = match face {
            "L" => base.with_x(-(self.x_edge() + self.dims.thickness)),
            "R" => base.with_x(self.x_edge() + self.dims.thickness),
            _ => base,
        };
        self.put(format!("{key}mid"), mid);
        self.put(format!("{key}end"), base.offset(end_dx, end_dy, 0.0));
        self.put(key, base);
        Ok(())
    }

    fn place_faces(&mut self) -> Result<(), RibbonError> {
        let edg = self.edge_margin();
        let end = self.end_margin();
        let x_edge = self.x_edge();
        let t = self.dims.thickness;
        let quarter = self.y_pos() / 4.0;
        let third = self.y_pos() / 3.0;
        let (u_y, d_y) = (self.at("U")?.y, self.at("D")?.y);
        let (b_z, f_z) = (self.at("B")?.z, self.at("F")?.z);
        let (l_x, r_x) = (self.at("L")?.x, self.at("R")?.x);

        for face in ["U", "D"] {
            self.edge(face, "L", Coord::X, -x_edge, 2.0 * end)?;
            self.edge(face, "R", Coord::X, x_edge, -2.0 * end)?;
            self.edge(face, "B", Coord::Z, b_z + edg, end)?;
            self.edge(face, "F", Coord::Z, f_z - edg, -end)?;
        }

        for (face, sign) in [("L", -1.0), ("R", 1.0)] {
            let anchor = self.at(face)?;
            let up_x = sign * (x_edge + t);
            let up_mid = anchor.offset((up_x - anchor.x) / 2.0, quarter, 0.0);
            self.vertical(face, "U", u_y - edg, up_mid, -end, sign * t)?;
            self.vertical(face, "D", d_y + edg, anchor.offset(0.0, -third, 0.0), end, sign * t)?;
            self.edge(face, "B", Coord::Z, b_z + edg, end)?;
            self.edge(face, "F", Coord::Z, f_z - edg, -end)?;
        }

        for face in ["B", "F"] {
            let anchor = self.at(face)?;
            let up = anchor.with_y(u_y - edg);
            let down = anchor.with_y(d_y + edg);
            self.vertical(face, "U", up.y, up.offset(0.0, -quarter, 0.0), -end, 0.0)?;
            self.vertical(face, "D", down.y, down.offset(0.0, quarter, 0.0), end, 0.0)?;
            self.edge(face, "L", Coord::X, l_x + edg, end)?;
            self.edge(face, "R", Coord::X, r_x - edg, -end)?;
        }
        Ok(())
    }

    fn place_bows(&mut self) -> Result<(), RibbonError> {
        let d = self.dims;
        let u = self.at("U")?;
        let loop_w = d.width / 3.0;
        let loop_h = d.width / 4.0;
        let (rt, rw) = (d.ribbon_thickness, d.ribbon_width);

        for (side, sign) in [("L", -1.0), ("R", 1.0)] {
            let second = u.with_x(sign * loop_w).offset(0.0, rt, 0.0);
            let fifth = u.offset(sign * 0.85 * rw, rt, 0.0);
            self.put(format!("bow_{side}1"), u);
            self.put(format!("bow_{side}2"), second);
            self.put(format!("bow_{side}3"), second.offset(sign * rw / 2.0, loop_h / 2.0, 0.0));
            self.put(format!("bow_{side}4"), second.offset(-sign * 0.25 * rw, loop_h, 0.0));
            self.put(format!("bow_{side}5"), fifth);
            self.put(format!("bow_{side}6"), fifth.offset(-sign * rw / 2.0, 0.0, 0.0));
            self.put(format!("bow_{side}7"), u.offset(0.0, 0.5 * rt, 0.0));
        }
        Ok(())
    }

    fn place_knot(&mut self) -> Result<(), RibbonError> {
        let d = self.dims;
        let u = self.at("U")?;
        let (rt, rw) = (d.ribbon_thickness, d.ribbon_width);
        let first = u.offset(0.0, 0.0, rw / 2.0);
        let second = first.offset(0.0, 2.0 * rt, 0.0);
        self.put("knot_1", first);
        self.put("knot_2", second);
        self.put("knot_3", u.offset(0.0, 2.0 * rt, 0.0));
        self.put("knot_4", second.offset(0.0, 0.15 * rw, -1.5 * rw));
        self.put("knot_5", u.offset(0.0, 0.0, -rw / 2.0));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Tolerance;

    fn cube_layout() -> RibbonLayout {
        let dims = RibbonDimensions::new(1.04, 1.04, 1.04, 1.0, 0.02).with_ribbon_width(0.36);
        RibbonLayout::compute(dims).expect("layout")
    }

    #[test]
    fn anchors_surround_the_box() {
        let layout = cube_layout();
        let tol = Tolerance::DEFAULT;
        let rt = 0.02;
        assert!(tol.approx_eq_point3(layout.point("U").expect("U"), Point3::new(0.0, 1.04 + rt / 3.0, 0.0)));
        assert!(tol.approx_eq_point3(layout.point("D").expect("D"), Point3::ORIGIN));
        assert!(tol.approx_eq_f64(layout.point("R").expect("R").x, 0.52 + 0.04));
        assert!(tol.approx_eq_f64(layout.point("B").expect("B").z, -(0.52 + rt / 3.0)));
    }

    #[test]
    fn face_points_follow_margins() {
        let layout = cube_layout();
        let tol = Tolerance::DEFAULT;
        let ul = layout.point("UL").expect("UL");
        assert!(tol.approx_eq_f64(ul.x, -0.5));
        assert!(tol.approx_eq_f64(layout.point("ULmid").expect("mid").x, -0.25));
        assert!(tol.approx_eq_f64(layout.point("ULend").expect("end").x, -0.5 + 0.08));

        let lu = layout.point("LU").expect("LU");
        assert!(tol.approx_eq_f64(lu.x, -0.52));
        assert!(tol.approx_eq_f64(lu.y, layout.point("U").expect("U").y - 0.01));
        assert!(tol.approx_eq_f64(layout.point("LUend").expect("end").x, -0.54));

        let fr = layout.point("FR").expect("FR");
        let fl = layout.point("FL").expect("FL");
        assert!(tol.approx_eq_f64(fr.x, -fl.x));
    }

    #[test]
    fn segments_have_expected_lengths() {
        let layout = cube_layout();
        for segment in TieSegment::ALL {
            let expected = match segment {
                TieSegment::BowLeft => 7,
                TieSegment::BowRight => 6,
                TieSegment::Knot => 5,
                _ => 15,
            };
            assert_eq!(layout.curve(segment).expect("curve").len(), expected, "{segment}");
        }
        let up = layout.curve(TieSegment::Up).expect("curve");
        assert_eq!(up[0], layout.point("U").expect("U"));
        assert_eq!(up[14], layout.point("D").expect("D"));
        assert!(up[1..14].iter().all(|p| p.z <= 0.0));
    }

    #[test]
    fn bows_mirror_across_x() {
        let layout = cube_layout();
        for i in 1..=7 {
            let l = layout.point(&format!("bow_L{i}")).expect("left");
            let r = layout.point(&format!("bow_R{i}")).expect("right");
            assert!(Tolerance::DEFAULT.approx_eq_point3(l, r.with_x(-r.x)), "bow {i}");
        }
    }

    #[test]
    fn rejects_bad_dimensions() {
        let dims = RibbonDimensions::new(1.0, 0.0, 1.0, 1.0, 0.02).with_ribbon_width(0.1);
        assert_eq!(RibbonLayout::compute(dims), Err(RibbonError::InvalidDimensions("height")));
        assert!(matches!(cube_layout().point("nope"), Err(RibbonError::MissingPoint(_))));
    }

    #[test]
    fn unknown_face_is_reported_not_placed_at_origin() {
        let mut layout = cube_layout();
        let before = layout.points.len();
        assert_eq!(layout.edge("Q", "L", Coord::X, -0.5, 0.1), Err(RibbonError::MissingPoint("Q".into())));
        assert_eq!(
            layout.vertical("Q", "U", 1.0, Point3::ORIGIN, -0.1, 0.0),
            Err(RibbonError::MissingPoint("Q".into()))
        );
        assert_eq!(layout.points.len(), before);
        assert!(layout.point("QL").is_err());
    }

    #[test]
    fn edge_points_move_along_one_axis() {
        let layout = cube_layout();
        let u = layout.point("U").expect("U");
        for (key, along_x) in [("UL", true), ("UR", true), ("UB", false), ("UF", false)] {
            let p = layout.point(key).expect(key);
            let end = layout.point(&format!("{key}end")).expect("end");
            assert_eq!(p.y, u.y, "{key}");
            if along_x {
                assert_eq!((p.z, end.z), (u.z, u.z), "{key}");
            } else {
                assert_eq!((p.x, end.x), (u.x, u.x), "{key}");
            }
        }
    }

    #[test]
    fn every_curve_key_is_placed() {
        let layout = cube_layout();
        for segment in TieSegment::ALL {
            for key in RibbonLayout::curve_keys(segment) {
                assert!(layout.point(&key).is_ok(), "{segment}: {key}");
            }
        }
    }
}
