use super::core::{Point3, Vec3};

/// Open polyline with cached cumulative arc lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline3 {
    points: Vec<Point3>,
    cumulative_lengths: Vec<f64>,
    total_length: f64,
}

impl Polyline3 {
    /// Build a polyline, dropping consecutive duplicate points.
    ///
    /// # Errors
    /// Fails when fewer than two distinct points remain or a point is not finite.
    pub fn new(mut points: Vec<Point3>) -> Result<Self, String> {
        if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite())) {
            return Err("polyline points must be finite".to_string());
        }
        points.dedup_by(|b, a| a.distance_to(*b) <= f64::EPSILON);
        if points.len() < 2 {
            return Err("polyline requires at least 2 distinct points".to_string());
        }

        let mut cumulative_lengths = Vec::with_capacity(points.len());
        let mut total = 0.0;
        cumulative_lengths.push(total);
        for w in points.windows(2) {
            total += w[0].distance_to(w[1]);
            cumulative_lengths.push(total);
        }

        Ok(Self { points, cumulative_lengths, total_length: total })
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub const fn length(&self) -> f64 {
        self.total_length
    }

    /// Arc length from the start to each vertex.
    #[must_use]
    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.cumulative_lengths
    }

    /// Point at arc length `s`, clamped to the curve.
    #[must_use]
    pub fn point_at_length(&self, s: f64) -> Point3 {
        let s = s.clamp(0.0, self.total_length);
        let seg = self
            .cumulative_lengths
            .windows(2)
            .position(|w| s <= w[1])
            .unwrap_or(self.points.len() - 2);
        let (s0, s1) = (self.cumulative_lengths[seg], self.cumulative_lengths[seg + 1]);
        let t = if s1 > s0 { (s - s0) / (s1 - s0) } else { 0.0 };
        self.points[seg].lerp(self.points[seg + 1], t)
    }

    /// Leading part of the curve covering `fraction` of its length.
    ///
    /// Returns `None` when nothing is revealed.
    #[must_use]
    pub fn reveal(&self, fraction: f64) -> Option<Self> {
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction <= 0.0 {
            return None;
        }
        let cut = fraction * self.total_length;
        let mut points: Vec<Point3> = self
            .points
            .iter()
            .zip(&self.cumulative_lengths)
            .take_while(|(_, s)| **s < cut)
            .map(|(p, _)| *p)
            .collect();
        points.push(self.point_at_length(cut));
        Self::new(points).ok()
    }

    /// Unit direction of each segment, repeated for the last vertex.
    #[must_use]
    pub fn vertex_tangents(&self) -> Vec<Vec3> {
        let segs: Vec<Vec3> = self
            .points
            .windows(2)
            .map(|w| (w[1] - w[0]).normalized().unwrap_or(Vec3::Z))
            .collect();
        let mut out = Vec::with_capacity(self.points.len());
        out.push(segs[0]);
        for w in segs.windows(2) {
            out.push((w[0] + w[1]).normalized().unwrap_or(w[1]));
        }
        out.push(segs[segs.len() - 1]);
        out
    }
}
