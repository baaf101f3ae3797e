//! Folding-pattern solver.
//!
//! Maps the canonical box extents and the paper thickness to the named fold
//! points of the flat paper. The `F..I` columns and rows `1..8` form the
//! rectilinear grid; the diagonal keys exist per topology only.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::FoldError;
use super::normalize::BoxExtent;
use super::tables::{
    GRID_KEYS, OVERLAP_DIAGONAL_KEYS, OVERLAP_PLAN, OVERLAP_VERTEX_TABLE, SIMPLE_DIAGONAL_KEYS,
    SIMPLE_PLAN, SIMPLE_VERTEX_TABLE, TopologyPlan,
};
use crate::geom::Point3;

/// The two fold-plane variants.
///
/// `Overlap` is used when the side flaps are long enough to cover each other
/// once folded, which needs fanned diagonal points instead of single ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoldTopology {
    Simple,
    Overlap,
}

impl FoldTopology {
    /// Pick the topology for a padded depth `e_prime` and flap length `b`.
    #[must_use]
    pub fn select(e_prime: f64, b: f64) -> Self {
        if e_prime < 2.0 * b { Self::Overlap } else { Self::Simple }
    }

    #[must_use]
    pub const fn is_overlap(self) -> bool {
        matches!(self, Self::Overlap)
    }

    #[must_use]
    pub const fn vertex_table(self) -> &'static [(&'static str, usize)] {
        match self {
            Self::Simple => &SIMPLE_VERTEX_TABLE,
            Self::Overlap => &OVERLAP_VERTEX_TABLE,
        }
    }

    #[must_use]
    pub const fn plan(self) -> TopologyPlan {
        match self {
            Self::Simple => SIMPLE_PLAN,
            Self::Overlap => OVERLAP_PLAN,
        }
    }

    #[must_use]
    pub const fn diagonal_keys(self) -> &'static [&'static str] {
        match self {
            Self::Simple => &SIMPLE_DIAGONAL_KEYS,
            Self::Overlap => &OVERLAP_DIAGONAL_KEYS,
        }
    }

    /// Vertex count of the finished fold plane.
    #[must_use]
    pub const fn vertex_count(self) -> usize {
        self.vertex_table().len()
    }
}

impl fmt::Display for FoldTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Simple => "simple",
            Self::Overlap => "overlap",
        })
    }
}

/// A named point of the flat pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldPoint {
    pub key: &'static str,
    pub position: Point3,
    vertex_index: Option<usize>,
}

impl FoldPoint {
    const fn new(key: &'static str, position: Point3) -> Self {
        Self { key, position, vertex_index: None }
    }

    /// Fold-plane vertex standing for this point, once the plane is built.
    #[must_use]
    pub const fn vertex_index(&self) -> Option<usize> {
        self.vertex_index
    }
}

/// Scalars derived from the box extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternParams {
    pub thickness: f64,
    /// Plane height, half the thickness.
    pub y: f64,
    /// Padded width `side_a + t`.
    pub a: f64,
    /// Padded height `side_d + t`.
    pub d: f64,
    /// Side flap length, `0.6 * d`.
    pub b: f64,
    /// Half depth plus half thickness.
    pub c: f64,
    /// Padded depth `side_e + t`.
    pub e: f64,
    /// Flap overhang, `|c - b|` signed by topology.
    pub f: f64,
    /// Column x positions for `F, G, H, I`.
    pub columns: [f64; 4],
    /// Row z positions for rows `1..=8`.
    pub rows: [f64; 8],
}

impl PatternParams {
    #[must_use]
    pub const fn column_x(&self, col: usize) -> f64 {
        self.columns[col]
    }

    #[must_use]
    pub const fn row_z(&self, row: u8) -> f64 {
        self.rows[row as usize - 1]
    }
}

/// Every fold point of one wrap, keyed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldingPattern {
    topology: FoldTopology,
    extent: BoxExtent,
    params: PatternParams,
    points: BTreeMap<&'static str, FoldPoint>,
}

impl FoldingPattern {
    /// Solve the pattern for a normalized box.
    ///
    /// # Errors
    /// Returns [`FoldError::InvalidExtent`] or [`FoldError::InvalidThickness`]
    /// for non-finite or non-positive inputs.
    pub fn solve(extent: BoxExtent, thickness: f64) -> Result<Self, FoldError> {
        if !extent.is_valid() {
            return Err(FoldError::InvalidExtent {
                width: extent.width,
                height: extent.height,
                depth: extent.depth,
            });
        }
        if !thickness.is_finite() || thickness <= 0.0 {
            return Err(FoldError::InvalidThickness(thickness));
        }

        let y = thickness / 2.0;
        let a = extent.width + thickness;
        let d = extent.height + thickness;
        let b = 0.6 * d;
        let c = extent.depth / 2.0 + y;
        let e = extent.depth + thickness;
        let topology = FoldTopology::select(e, b);
        let f = if topology.is_overlap() { b - c } else { c - b };

        let x_h = a / 2.0;
        let x_i = x_h + b;
        let columns = [-x_i, -x_h, x_h, x_i];

        let z5 = e / 2.0;
        let z6 = z5 + d;
        let z7 = z6 + c;
        let (z3, z2) = (-z5, -z6);
        let (z1, z8) = match topology {
            FoldTopology::Overlap => (z2 - b, z7),
            FoldTopology::Simple => (-z7, z7 + f),
        };
        let rows = [z1, z2, z3, 0.0, z5, z6, z7, z8];

        let params = PatternParams { thickness, y, a, d, b, c, e, f, columns, rows };

        let mut points = BTreeMap::new();
        for (r, row_keys) in GRID_KEYS.iter().enumerate() {
            for (col, key) in row_keys.iter().enumerate() {
                points.insert(*key, FoldPoint::new(*key, Point3::new(columns[col], y, rows[r])));
            }
        }
        for (key, position) in diagonal_points(topology, &params) {
            points.insert(key, FoldPoint::new(key, position));
        }

        crate::debug_log!("solved {topology} pattern with {} points (b = {b:.4}, e' = {e:.4})", points.len());
        Ok(Self { topology, extent, params, points })
    }

    #[must_use]
    pub const fn topology(&self) -> FoldTopology {
        self.topology
    }

    #[must_use]
    pub const fn extent(&self) -> BoxExtent {
        self.extent
    }

    #[must_use]
    pub const fn params(&self) -> &PatternParams {
        &self.params
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.points.contains_key(key)
    }

    pub fn points(&self) -> impl Iterator<Item = &FoldPoint> {
        self.points.values()
    }

    /// # Errors
    /// Returns [`FoldError::MissingPoint`] when the key does not exist in this topology.
    pub fn point(&self, key: &str) -> Result<&FoldPoint, FoldError> {
        self.points.get(key).ok_or_else(|| FoldError::MissingPoint(key.to_owned()))
    }

    /// # Errors
    /// Returns [`FoldError::MissingPoint`] when the key does not exist in this topology.
    pub fn position(&self, key: &str) -> Result<Point3, FoldError> {
        self.point(key).map(|p| p.position)
    }

    /// Fold-plane vertex for `key`.
    ///
    /// # Errors
    /// Fails when the key is missing or the plane has not been built yet.
    pub fn vertex_index(&self, key: &str) -> Result<usize, FoldError> {
        self.point(key)?.vertex_index.ok_or_else(|| FoldError::UnindexedPoint(key.to_owned()))
    }

    /// Record the vertex index of every key in `table`.
    ///
    /// # Errors
    /// Fails when a key is missing or already carries an index.
    pub fn assign_vertex_indices(&mut self, table: &[(&str, usize)]) -> Result<(), FoldError> {
        for (key, _) in table {
            let point = self.point(key)?;
            if point.vertex_index.is_some() {
                return Err(FoldError::IndexReassigned((*key).to_owned()));
            }
        }
        for (key, index) in table {
            if let Some(point) = self.points.get_mut(*key) {
                point.vertex_index = Some(*index);
            }
        }
        Ok(())
    }
}

fn diagonal_points(topology: FoldTopology, p: &PatternParams) -> Vec<(&'static str, Point3)> {
    let [x_f, _, x_h, x_i] = p.columns;
    let x_g = -x_h;
    let (z1, z2, z3, z5, z6, z7) = (p.rows[0], p.rows[1], p.rows[2], p.rows[4], p.rows[5], p.rows[6]);
    let at = |x: f64, z: f64| Point3::new(x, p.y, z);
    let b = p.b;

    let mut out = vec![
        ("I4a", at(x_i, z3 + b)),
        ("I4b", at(x_i, z5 - b)),
        ("F4a", at(x_f, z3 + b)),
        ("F4b", at(x_f, z5 - b)),
    ];
    match topology {
        FoldTopology::Simple => out.extend([
            ("I1a", at(x_i, z2 - b)),
            ("I7a", at(x_i, z6 + b)),
            ("F1a", at(x_f, z2 - b)),
            ("F7a", at(x_f, z6 + b)),
        ]),
        FoldTopology::Overlap => {
            let delta = b - p.c;
            out.extend([
                ("HI4", at(x_h + p.e / 2.0, 0.0)),
                ("FG4", at(x_g - p.e / 2.0, 0.0)),
                ("I1a", at(x_i - delta, z1 + delta)),
                ("I1b", at(x_i, z1 + 2.0 * delta)),
                ("I1c", at(x_i - 2.0 * delta, z1)),
                ("I7a", at(x_i, z7 - delta)),
                ("I7b", at(x_i - delta, z7)),
                ("F1a", at(x_f + delta, z1 + delta)),
                ("F1b", at(x_f, z1 + 2.0 * delta)),
                ("F1c", at(x_f + 2.0 * delta, z1)),
                ("F7a", at(x_f, z7 - delta)),
                ("F7b", at(x_f + delta, z7)),
            ]);
        }
    }
    debug_assert_eq!(out.len(), topology.diagonal_keys().len());
    out
}
