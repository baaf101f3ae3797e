//! Fixed contract data for the fold plane.
//!
//! The vertex tables fix the final vertex number of every named fold point,
//! one table per topology. The region plans describe how each base-grid face
//! is subdivided and which lattice nodes land on which fold points; welding
//! after each plan collapses nodes that landed on the same key.

/// Base grid keys in construction order: rows top (8) to bottom (1), skipping
/// row 4 which only exists after the side regions are subdivided.
pub const BASE_ROWS: [u8; 7] = [8, 7, 6, 5, 3, 2, 1];

/// Column letters from `-x` to `+x`.
pub const COLUMNS: [char; 4] = ['F', 'G', 'H', 'I'];

/// Every rectilinear key, row-major by row number.
pub const GRID_KEYS: [[&str; 4]; 8] = [
    ["F1", "G1", "H1", "I1"],
    ["F2", "G2", "H2", "I2"],
    ["F3", "G3", "H3", "I3"],
    ["F4", "G4", "H4", "I4"],
    ["F5", "G5", "H5", "I5"],
    ["F6", "G6", "H6", "I6"],
    ["F7", "G7", "H7", "I7"],
    ["F8", "G8", "H8", "I8"],
];

/// Grid key for `row` (1..=8) and column index (0..4).
#[must_use]
pub fn grid_key(row: u8, col: usize) -> &'static str {
    GRID_KEYS[usize::from(row) - 1][col]
}

pub const SIMPLE_DIAGONAL_KEYS: [&str; 8] = ["F1a", "I1a", "F7a", "I7a", "F4a", "F4b", "I4a", "I4b"];

pub const OVERLAP_DIAGONAL_KEYS: [&str; 16] = [
    "F1a", "F1b", "F1c", "I1a", "I1b", "I1c", "F7a", "F7b", "I7a", "I7b", "F4a", "F4b", "I4a", "I4b", "HI4", "FG4",
];

pub const SIMPLE_VERTEX_TABLE: [(&str, usize); 36] = [
    ("F8", 0),
    ("G8", 1),
    ("H8", 2),
    ("I8", 3),
    ("F7", 4),
    ("G7", 5),
    ("H7", 6),
    ("I7", 7),
    ("F7a", 35),
    ("I7a", 34),
    ("F6", 8),
    ("G6", 9),
    ("H6", 10),
    ("I6", 11),
    ("F5", 12),
    ("G5", 13),
    ("H5", 14),
    ("I5", 15),
    ("F4a", 31),
    ("F4b", 30),
    ("I4a", 29),
    ("I4b", 28),
    ("F3", 16),
    ("G3", 17),
    ("H3", 18),
    ("I3", 19),
    ("F2", 20),
    ("G2", 21),
    ("H2", 22),
    ("I2", 23),
    ("F1", 24),
    ("G1", 25),
    ("H1", 26),
    ("I1", 27),
    ("F1a", 33),
    ("I1a", 32),
];

pub const OVERLAP_VERTEX_TABLE: [(&str, usize); 40] = [
    ("F7", 0),
    ("G7", 1),
    ("H7", 2),
    ("I7", 3),
    ("F7a", 4),
    ("F7b", 37),
    ("I7a", 7),
    ("I7b", 36),
    ("F6", 8),
    ("G6", 5),
    ("H6", 6),
    ("I6", 9),
    ("F5", 10),
    ("G5", 11),
    ("H5", 12),
    ("I5", 13),
    ("FG4", 31),
    ("F4a", 29),
    ("F4b", 30),
    ("HI4", 28),
    ("I4a", 26),
    ("I4b", 27),
    ("F3", 14),
    ("G3", 15),
    ("H3", 16),
    ("I3", 17),
    ("F2", 18),
    ("G2", 19),
    ("H2", 20),
    ("I2", 21),
    ("F1", 22),
    ("G1", 23),
    ("H1", 24),
    ("I1", 25),
    ("F1a", 35),
    ("F1b", 34),
    ("F1c", 38),
    ("I1a", 33),
    ("I1b", 32),
    ("I1c", 39),
];

/// One base face subdivided into a `du x dv` lattice.
///
/// Corners run `c0 -> c1` along `i` and `c0 -> c3` along `j`. Every lattice
/// node that is not a corner must appear in `placements`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionPlan {
    pub name: &'static str,
    pub corners: [&'static str; 4],
    pub du: usize,
    pub dv: usize,
    pub placements: &'static [((usize, usize), &'static str)],
}

/// Complete construction recipe for one topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyPlan {
    pub regions: &'static [RegionPlan],
    /// `(from, into)` key merges applied after all regions.
    pub merges: &'static [(&'static str, &'static str)],
    /// Edges removed last, given by their end keys.
    pub deleted_edges: &'static [(&'static str, &'static str)],
}

pub const SIMPLE_PLAN: TopologyPlan = TopologyPlan {
    regions: &[
        RegionPlan {
            name: "HI5-3",
            corners: ["H5", "I5", "I3", "H3"],
            du: 1,
            dv: 3,
            placements: &[((0, 1), "H5"), ((0, 2), "H3"), ((1, 1), "I4b"), ((1, 2), "I4a")],
        },
        RegionPlan {
            name: "FG5-3",
            corners: ["F5", "G5", "G3", "F3"],
            du: 1,
            dv: 3,
            placements: &[((0, 1), "F4b"), ((0, 2), "F4a"), ((1, 1), "G5"), ((1, 2), "G3")],
        },
        RegionPlan {
            name: "HI2-1",
            corners: ["H2", "I2", "I1", "H1"],
            du: 1,
            dv: 2,
            placements: &[((0, 1), "H2"), ((1, 1), "I1a")],
        },
        RegionPlan {
            name: "FG2-1",
            corners: ["F2", "G2", "G1", "F1"],
            du: 1,
            dv: 2,
            placements: &[((0, 1), "F1a"), ((1, 1), "G2")],
        },
        RegionPlan {
            name: "HI7-6",
            corners: ["H7", "I7", "I6", "H6"],
            du: 1,
            dv: 2,
            placements: &[((0, 1), "H6"), ((1, 1), "I7a")],
        },
        RegionPlan {
            name: "FG7-6",
            corners: ["F7", "G7", "G6", "F6"],
            du: 1,
            dv: 2,
            placements: &[((0, 1), "F7a"), ((1, 1), "G6")],
        },
    ],
    merges: &[],
    deleted_edges: &[],
};

pub const OVERLAP_PLAN: TopologyPlan = TopologyPlan {
    regions: &[
        RegionPlan {
            name: "HI5-3",
            corners: ["H5", "I5", "I3", "H3"],
            du: 2,
            dv: 3,
            placements: &[
                ((1, 0), "H5"),
                ((0, 1), "H5"),
                ((0, 2), "H3"),
                ((1, 3), "H3"),
                ((1, 1), "HI4"),
                ((1, 2), "HI4"),
                ((2, 1), "I4a"),
                ((2, 2), "I4b"),
            ],
        },
        RegionPlan {
            name: "FG5-3",
            corners: ["F5", "G5", "G3", "F3"],
            du: 2,
            dv: 3,
            placements: &[
                ((1, 0), "G5"),
                ((2, 1), "G5"),
                ((2, 2), "G3"),
                ((1, 3), "G3"),
                ((0, 1), "F4a"),
                ((0, 2), "F4b"),
                ((1, 1), "FG4"),
                ((1, 2), "FG4"),
            ],
        },
        RegionPlan {
            name: "HI2-1",
            corners: ["H2", "I2", "I1", "H1"],
            du: 2,
            dv: 2,
            placements: &[((1, 0), "H2"), ((0, 1), "H2"), ((1, 1), "I1a"), ((2, 1), "I1b"), ((1, 2), "I1c")],
        },
        RegionPlan {
            name: "FG2-1",
            corners: ["F2", "G2", "G1", "F1"],
            du: 2,
            dv: 2,
            placements: &[((1, 0), "G2"), ((2, 1), "G2"), ((1, 1), "F1a"), ((0, 1), "F1b"), ((1, 2), "F1c")],
        },
        RegionPlan {
            name: "HI7-6",
            corners: ["H7", "I7", "I6", "H6"],
            du: 2,
            dv: 2,
            placements: &[((1, 0), "I7b"), ((1, 1), "I7b"), ((2, 1), "I7a"), ((0, 1), "H6"), ((1, 2), "H6")],
        },
        RegionPlan {
            name: "FG7-6",
            corners: ["F7", "G7", "G6", "F6"],
            du: 2,
            dv: 2,
            placements: &[((1, 0), "F7b"), ((1, 1), "F7b"), ((0, 1), "F7a"), ((2, 1), "G6"), ((1, 2), "G6")],
        },
    ],
    merges: &[("F8", "F7"), ("G8", "G7"), ("H8", "H7"), ("I8", "I7")],
    deleted_edges: &[("F7", "G7"), ("H7", "I7")],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn assert_permutation(table: &[(&str, usize)]) {
        let indices: BTreeSet<usize> = table.iter().map(|(_, i)| *i).collect();
        assert_eq!(indices.len(), table.len());
        assert_eq!(indices.iter().copied().collect::<Vec<_>>(), (0..table.len()).collect::<Vec<_>>());
        let keys: BTreeSet<&str> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys.len(), table.len());
    }

    #[test]
    fn vertex_tables_are_permutations() {
        assert_permutation(&SIMPLE_VERTEX_TABLE);
        assert_permutation(&OVERLAP_VERTEX_TABLE);
    }

    #[test]
    fn every_lattice_node_is_placed() {
        for plan in [SIMPLE_PLAN, OVERLAP_PLAN] {
            for region in plan.regions {
                let placed: BTreeSet<(usize, usize)> = region.placements.iter().map(|(n, _)| *n).collect();
                for j in 0..=region.dv {
                    for i in 0..=region.du {
                        let corner = (i == 0 || i == region.du) && (j == 0 || j == region.dv);
                        assert_eq!(placed.contains(&(i, j)), !corner, "{} node ({i},{j})", region.name);
                    }
                }
            }
        }
    }

    #[test]
    fn overlap_table_drops_top_row() {
        let keys: BTreeSet<&str> = OVERLAP_VERTEX_TABLE.iter().map(|(k, _)| *k).collect();
        for col in 0..4 {
            assert!(!keys.contains(grid_key(8, col)));
            assert!(!keys.contains(grid_key(4, col)));
        }
        for key in OVERLAP_DIAGONAL_KEYS {
            assert!(keys.contains(key), "{key}");
        }
    }

    #[test]
    fn grid_key_lookup() {
        assert_eq!(grid_key(1, 0), "F1");
        assert_eq!(grid_key(8, 3), "I8");
        assert_eq!(COLUMNS.len(), GRID_KEYS[0].len());
    }
}
