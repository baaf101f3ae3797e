//! Profile sweep along an open polyline rail.
//!
//! The ribbon surfaces are produced by sweeping a closed cross-section along a
//! rail using parallel-transported frames, optionally revealing only a leading
//! fraction of the rail and tapering the section toward the end.
//!
//! # Profile Coordinate Conventions
//!
//! Profile points are given in a local plane: X maps to the frame normal and Y
//! to the binormal. The first normal is world X projected off the tangent, or
//! world Z when the rail starts along X.

use super::core::{Point3, Tolerance, Vec3};
use super::curve::Polyline3;
use super::mesh::GeomMesh;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    #[error("profile requires at least {min} points")]
    NotEnoughProfilePoints { min: usize },
    #[error("profile points must be finite")]
    NonFiniteProfile,
    #[error("taper must be finite and non-negative, got {0}")]
    InvalidTaper(f64),
}

/// Sweep settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepOptions {
    /// Section scale reached at the end of the revealed rail.
    pub taper: f64,
    /// Leading fraction of the rail to sweep, in `[0, 1]`.
    pub reveal: f64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self { taper: 1.0, reveal: 1.0 }
    }
}

impl SweepOptions {
    #[must_use]
    pub const fn with_taper(mut self, taper: f64) -> Self {
        self.taper = taper;
        self
    }

    #[must_use]
    pub const fn with_reveal(mut self, reveal: f64) -> Self {
        self.reveal = reveal;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepDiagnostics {
    pub ring_count: usize,
    pub triangle_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    tangent: Vec3,
    normal: Vec3,
    binormal: Vec3,
}

/// Sweep a closed `profile` loop along `rail`.
///
/// An empty mesh is returned when `options.reveal` is zero.
///
/// # Errors
/// Fails on a profile with fewer than three points, non-finite profile
/// coordinates, or an invalid taper.
pub fn sweep_profile(
    profile: &[[f64; 2]],
    rail: &Polyline3,
    options: SweepOptions,
) -> Result<(GeomMesh, SweepDiagnostics), SweepError> {
    if profile.len() < 3 {
        return Err(SweepError::NotEnoughProfilePoints { min: 3 });
    }
    if profile.iter().flatten().any(|c| !c.is_finite()) {
        return Err(SweepError::NonFiniteProfile);
    }
    if !options.taper.is_finite() || options.taper < 0.0 {
        return Err(SweepError::InvalidTaper(options.taper));
    }
    let Some(path) = rail.reveal(options.reveal) else {
        return Ok((GeomMesh::default(), SweepDiagnostics::default()));
    };

    let frames = transport_frames(&path.vertex_tangents());
    let total = path.length().max(Tolerance::DEFAULT.eps);
    let n = profile.len();

    let mut positions = Vec::with_capacity(path.points().len() * n);
    for ((origin, frame), s) in path.points().iter().zip(&frames).zip(path.cumulative_lengths()) {
        let scale = 1.0 + (options.taper - 1.0) * (s / total);
        for &[x, y] in profile {
            let p: Point3 = *origin + frame.normal * (x * scale) + frame.binormal * (y * scale);
            positions.push(p.to_array());
        }
    }

    let rings = path.points().len();
    let mut indices = Vec::with_capacity((rings - 1) * n * 6);
    for r in 0..rings - 1 {
        for i in 0..n {
            let j = (i + 1) % n;
            let [a, b, c, d] = [r * n + i, r * n + j, (r + 1) * n + j, (r + 1) * n + i].map(to_u32);
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    let diagnostics = SweepDiagnostics { ring_count: rings, triangle_count: indices.len() / 3 };
    Ok((GeomMesh::new(positions, indices), diagnostics))
}

fn transport_frames(tangents: &[Vec3]) -> Vec<Frame> {
    let Some(&t0) = tangents.first() else {
        return Vec::new();
    };
    let seed = if t0.cross(Vec3::X).length() < 1e-6 { Vec3::Z } else { Vec3::X };
    let normal = (seed - t0 * seed.dot(t0)).normalized().unwrap_or(Vec3::Y);
    let mut frames = vec![Frame { tangent: t0, normal, binormal: t0.cross(normal) }];

    for &t in &tangents[1..] {
        let prev = frames[frames.len() - 1];
        let axis = prev.tangent.cross(t);
        let normal = match axis.normalized() {
            Some(k) => {
                let angle = prev.tangent.dot(t).clamp(-1.0, 1.0).acos();
                rotate_vector(prev.normal, k, angle)
            }
            None => prev.normal,
        };
        frames.push(Frame { tangent: t, normal, binormal: t.cross(normal) });
    }
    frames
}

fn rotate_vector(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    v * c + axis.cross(v) * s + axis * (axis.dot(v) * (1.0 - c))
}

#[allow(clippy::cast_possible_truncation)]
fn to_u32(i: usize) -> u32 {
    i as u32
}
