//! Ribbon cross-section, per-segment styling and sweeps.

use super::{RibbonError, RibbonLayout};
use crate::fold::TieSegment;
use crate::geom::{GeomMesh, Point3, Polyline3, SweepDiagnostics, SweepOptions, Transform, Vec3, sweep_profile};

/// Turn applied to the bow curves and their profiles, in degrees.
pub const BOW_TURN: f64 = 10.0;

/// Closed `width × thickness` rectangle with mid-edge points, counter-clockwise.
#[must_use]
pub fn profile_outline(width: f64, thickness: f64) -> [[f64; 2]; 8] {
    let (w, t) = (width / 2.0, thickness / 2.0);
    [[w, t], [0.0, t], [-w, t], [-w, 0.0], [-w, -t], [0.0, -t], [w, -t], [w, 0.0]]
}

/// The profile shapes of the ribbon. `Base` is the source shape; the others
/// are placed instances of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileSlot {
    Base,
    Side,
    BowLeft,
    BowRight,
    Knot,
}

impl ProfileSlot {
    pub const ALL: [Self; 5] = [Self::Base, Self::Side, Self::BowLeft, Self::BowRight, Self::Knot];

    /// Name fragment used in `ribbon_{name}_profile_{id}`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Base => "1",
            Self::Side => "2",
            Self::BowLeft => "3L",
            Self::BowRight => "3R",
            Self::Knot => "4",
        }
    }

    /// Y rotation of the instance, in degrees.
    #[must_use]
    pub const fn rotate_y(self) -> f64 {
        match self {
            Self::Base | Self::Knot => 0.0,
            Self::Side => 90.0,
            Self::BowLeft => 90.0 + BOW_TURN,
            Self::BowRight => 90.0 - BOW_TURN,
        }
    }

    /// Translation of the instance in the layout frame.
    ///
    /// # Errors
    /// Fails when the layout lacks its anchors.
    pub fn translate(self, layout: &RibbonLayout) -> Result<Vec3, RibbonError> {
        let up = layout.point("U")?.to_vec3();
        Ok(match self {
            Self::Side => Vec3::new(up.x, layout.point("D")?.y, up.z),
            Self::Knot => up + Vec3::new(0.0, 0.0, layout.dimensions().ribbon_width / 2.0),
            _ => up,
        })
    }
}

/// How one tie segment is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentStyle {
    pub profile: ProfileSlot,
    /// Section scale at the end of the extrusion.
    pub taper: f64,
    /// Y rotation of the segment curve, in degrees.
    pub curve_turn: f64,
}

#[must_use]
pub const fn segment_style(segment: TieSegment) -> SegmentStyle {
    let (profile, taper, curve_turn) = match segment {
        TieSegment::Up | TieSegment::Down => (ProfileSlot::Base, 1.0, 0.0),
        TieSegment::Left | TieSegment::Right => (ProfileSlot::Side, 1.0, 0.0),
        TieSegment::BowLeft => (ProfileSlot::BowLeft, 0.8, -BOW_TURN),
        TieSegment::BowRight => (ProfileSlot::BowRight, 0.8, BOW_TURN),
        TieSegment::Knot => (ProfileSlot::Knot, 0.3, 0.0),
    };
    SegmentStyle { profile, taper, curve_turn }
}

/// Sweep one segment, revealing the leading `reveal` fraction of its curve.
///
/// # Errors
/// Fails on a degenerate curve or an invalid sweep.
pub fn sweep_segment(
    layout: &RibbonLayout,
    segment: TieSegment,
    reveal: f64,
) -> Result<(GeomMesh, SweepDiagnostics), RibbonError> {
    let style = segment_style(segment);
    let turn = Transform::rotate_y_deg(style.curve_turn);
    let points: Vec<Point3> = layout.curve(segment)?.into_iter().map(|p| turn.apply_point(p)).collect();
    let rail = Polyline3::new(points)
        .map_err(|reason| RibbonError::DegenerateCurve { segment: segment.name().to_owned(), reason })?;

    let dims = layout.dimensions();
    let outline = profile_outline(dims.ribbon_width, dims.ribbon_thickness);
    let options = SweepOptions::default().with_taper(style.taper).with_reveal(reveal);
    Ok(sweep_profile(&outline, &rail, options)?)
}

/// Sweep every segment and merge the results.
///
/// # Errors
/// Fails when any segment fails to sweep.
pub fn build_ribbon_mesh(layout: &RibbonLayout, reveal: impl Fn(TieSegment) -> f64) -> Result<GeomMesh, RibbonError> {
    let mut mesh = GeomMesh::default();
    for segment in TieSegment::ALL {
        let (part, diagnostics) = sweep_segment(layout, segment, reveal(segment))?;
        crate::debug_log!("ribbon {segment}: {} rings, {} triangles", diagnostics.ring_count, diagnostics.triangle_count);
        mesh.append(&part);
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ribbon::RibbonDimensions;

    fn layout() -> RibbonLayout {
        let dims = RibbonDimensions::new(2.04, 1.04, 3.04, 2.0, 0.02).with_ribbon_width(0.36);
        RibbonLayout::compute(dims).expect("layout")
    }

    #[test]
    fn outline_is_a_closed_rectangle() {
        let outline = profile_outline(0.4, 0.02);
        let xs: Vec<f64> = outline.iter().map(|p| p[0]).collect();
        let ys: Vec<f64> = outline.iter().map(|p| p[1]).collect();
        assert_eq!(xs.iter().copied().fold(f64::MIN, f64::max), 0.2);
        assert_eq!(ys.iter().copied().fold(f64::MAX, f64::min), -0.01);
        let area: f64 = (0..8)
            .map(|i| {
                let (a, b) = (outline[i], outline[(i + 1) % 8]);
                a[0] * b[1] - b[0] * a[1]
            })
            .sum::<f64>()
            / 2.0;
        assert!((area.abs() - 0.4 * 0.02).abs() < 1e-12);
    }

    #[test]
    fn styles_taper_bows_and_knot() {
        assert_eq!(segment_style(TieSegment::BowLeft).taper, 0.8);
        assert_eq!(segment_style(TieSegment::Knot).taper, 0.3);
        assert_eq!(segment_style(TieSegment::Left).profile, ProfileSlot::Side);
        assert_eq!(ProfileSlot::BowRight.rotate_y(), 80.0);
        let knot = ProfileSlot::Knot.translate(&layout()).expect("translate");
        assert!((knot.z - 0.18).abs() < 1e-12);
    }

    #[test]
    fn hidden_segments_sweep_to_nothing() {
        let layout = layout();
        let (empty, diagnostics) = sweep_segment(&layout, TieSegment::Up, 0.0).expect("sweep");
        assert_eq!(empty.triangle_count(), 0);
        assert_eq!(diagnostics.ring_count, 0);

        let (full, diagnostics) = sweep_segment(&layout, TieSegment::Up, 1.0).expect("sweep");
        assert_eq!(diagnostics.ring_count, 15);
        assert_eq!(full.triangle_count(), 14 * 8 * 2);
    }

    #[test]
    fn full_ribbon_merges_all_segments() {
        let mesh = build_ribbon_mesh(&layout(), |_| 1.0).expect("ribbon");
        assert!(mesh.validate().is_ok());
        let half = build_ribbon_mesh(&layout(), |s| if s.stage() <= 2 { 1.0 } else { 0.0 }).expect("ribbon");
        assert!(half.triangle_count() < mesh.triangle_count());
    }
}
