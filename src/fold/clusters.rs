//! Vertex clusters driven by the fold pivots.
//!
//! Clusters are evaluated as a deformation stack in [`PivotId::ALL`] order:
//! a vertex shared by several clusters is moved by each of them in turn,
//! starting from the position the previous cluster left it at.

use std::collections::BTreeSet;

use super::FoldError;
use super::pattern::{FoldTopology, FoldingPattern};
use super::pivots::{PivotId, PivotPose, PivotSet};
use super::tables::grid_key;
use crate::geom::Point3;

/// Vertices moved by one pivot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldCluster {
    pub pivot: PivotId,
    pub keys: Vec<&'static str>,
    /// Sorted, unique fold-plane vertex indices.
    pub vertices: Vec<usize>,
}

impl FoldCluster {
    #[must_use]
    pub fn contains(&self, vertex: usize) -> bool {
        self.vertices.binary_search(&vertex).is_ok()
    }
}

fn row(row: u8) -> [&'static str; 4] {
    [0, 1, 2, 3].map(|col| grid_key(row, col))
}

fn push_keys(keys: &mut Vec<&'static str>, overlap: bool, always: &[&'static str], simple: &[&'static str], extra: &[&'static str]) {
    keys.extend_from_slice(always);
    keys.extend_from_slice(if overlap { extra } else { simple });
}

/// Fold-point keys bound to `pivot` in `topology`.
#[must_use]
pub fn cluster_keys(pivot: PivotId, topology: FoldTopology) -> Vec<&'static str> {
    const FRONT_FAN: [&str; 6] = ["F1a", "I1a", "F1b", "I1b", "F1c", "I1c"];
    let o = topology.is_overlap();
    let mut keys: Vec<&'static str> = Vec::new();
    let k = &mut keys;

    match pivot {
        PivotId::U1 => {
            push_keys(k, o, &row(1), &[], &[]);
            push_keys(k, o, &row(2), &FRONT_FAN[..2], &FRONT_FAN);
        }
        PivotId::B1 => {
            push_keys(k, o, &row(6), &[], &[]);
            push_keys(k, o, &row(7), &row(8), &[]);
            push_keys(k, o, &["F7a", "I7a"], &[], &["F7b", "I7b"]);
        }
        PivotId::U2 => push_keys(k, o, &row(1), &FRONT_FAN[..2], &FRONT_FAN),
        PivotId::B2 => {
            push_keys(k, o, &row(7), &row(8), &[]);
            push_keys(k, o, &["F7a", "I7a"], &[], &["F7b", "I7b"]);
        }
        PivotId::UR3 => push_keys(k, o, &["I3"], &[], &["I4a", "I4b"]),
        PivotId::BR3 => push_keys(k, o, &["I5"], &[], &["I4a", "I4b"]),
        PivotId::UL3 => push_keys(k, o, &["F3"], &[], &["F4a", "F4b"]),
        PivotId::BL3 => push_keys(k, o, &["F5"], &[], &["F4a", "F4b"]),
        PivotId::UR4 => push_keys(k, o, &["I2"], &[], &["I1b", "I7"]),
        PivotId::BR4 => push_keys(k, o, &["I6"], &[], &["I7a", "I1", "I7"]),
        PivotId::UL4 => push_keys(k, o, &["F2"], &[], &["F1b", "F7"]),
        PivotId::BL4 => push_keys(k, o, &["F6"], &[], &["F7a", "F1", "F7"]),
        PivotId::R5 => push_keys(k, o, &["I7", "I1", "I1a", "I7a"], &["I8"], &["I7b", "I1b", "I1c"]),
        PivotId::L5 => push_keys(k, o, &["F7", "F1", "F1a", "F7a"], &["F8"], &["F7b", "F1b", "F1c"]),
        PivotId::R6 => push_keys(k, o, &["I4a", "I4b"], &[], &["HI4"]),
        PivotId::L6 => push_keys(k, o, &["F4a", "F4b"], &[], &["FG4"]),
    }
    keys
}

/// The sixteen clusters of one fold plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: Vec<FoldCluster>,
}

impl ClusterSet {
    #[must_use]
    pub fn get(&self, pivot: PivotId) -> &FoldCluster {
        &self.clusters[pivot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoldCluster> {
        self.clusters.iter()
    }

    /// Pivots whose cluster moves `vertex`, in stack order.
    #[must_use]
    pub fn membership(&self, vertex: usize) -> Vec<PivotId> {
        self.clusters.iter().filter(|c| c.contains(vertex)).map(|c| c.pivot).collect()
    }

    /// Run the deformation stack over `rest` positions.
    ///
    /// `pose` supplies the current state of each pivot; clusters at rest are
    /// skipped.
    #[must_use]
    pub fn deform(&self, rest: &[Point3], pivots: &PivotSet, pose: impl Fn(PivotId) -> PivotPose) -> Vec<Point3> {
        let mut out = rest.to_vec();
        for cluster in &self.clusters {
            let pose = pose(cluster.pivot);
            if pose.is_rest() {
                continue;
            }
            let motion = pivots.get(cluster.pivot).deformation(pose);
            for &v in &cluster.vertices {
                if let Some(p) = out.get_mut(v) {
                    *p = motion.apply_point(*p);
                }
            }
        }
        out
    }
}

/// Resolve every cluster's keys to fold-plane vertices.
///
/// # Errors
/// Fails when a key is absent from the pattern or the fold plane has not
/// been built, which means the cluster lists and the topology disagree.
pub fn derive_clusters(pattern: &FoldingPattern) -> Result<ClusterSet, FoldError> {
    let topology = pattern.topology();
    let mut clusters = Vec::with_capacity(PivotId::ALL.len());
    for pivot in PivotId::ALL {
        let keys = cluster_keys(pivot, topology);
        let vertices: BTreeSet<usize> = keys.iter().map(|k| pattern.vertex_index(k)).collect::<Result<_, _>>()?;
        crate::debug_log!("cluster {pivot}: {} vertices", vertices.len());
        clusters.push(FoldCluster { pivot, keys, vertices: vertices.into_iter().collect() });
    }
    Ok(ClusterSet { clusters })
}
