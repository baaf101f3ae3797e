//! Node names of one wrap, all derived from `(object name, wrap id)`.

use rand::Rng;

use crate::fold::{PivotId, TieSegment};
use crate::ribbon::ProfileSlot;

/// Length of a wrap id.
pub const ID_LEN: usize = 5;

const ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fresh wrap id of upper-case letters and digits.
pub fn generate_id(rng: &mut impl Rng) -> String {
    (0..ID_LEN).map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())])).collect()
}

#[must_use]
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapNames {
    pub object: String,
    pub id: String,
}

impl WrapNames {
    #[must_use]
    pub fn new(object: impl Into<String>, id: impl Into<String>) -> Self {
        Self { object: object.into(), id: id.into() }
    }

    #[must_use]
    pub fn main_group(&self) -> String {
        format!("{}_gift_wrap_{}_GRP", self.object, self.id)
    }

    #[must_use]
    pub fn control(&self) -> String {
        control_name(&self.id)
    }

    #[must_use]
    pub fn gift_group(&self) -> String {
        format!("gift_{}_GRP", self.id)
    }

    #[must_use]
    pub fn fold_group(&self) -> String {
        format!("fold_{}_GRP", self.id)
    }

    #[must_use]
    pub fn object_group(&self) -> String {
        format!("obj_{}_GRP", self.id)
    }

    #[must_use]
    pub fn ribbon_group(&self) -> String {
        format!("ribbon_{}_GRP", self.id)
    }

    #[must_use]
    pub fn cluster_group(&self) -> String {
        format!("cluster_{}_GRP", self.id)
    }

    #[must_use]
    pub fn ribbon_curve_group(&self) -> String {
        format!("ribbon_crv_{}_GRP", self.id)
    }

    #[must_use]
    pub fn plane(&self) -> String {
        format!("folding_plane_{}", self.id)
    }

    #[must_use]
    pub fn paper(&self) -> String {
        format!("wrap_paper_{}", self.id)
    }

    /// Rotated frame group holding a pivot handle.
    #[must_use]
    pub fn pivot_frame(&self, pivot: PivotId) -> String {
        format!("GRP_gift_{}_pivot_{pivot}", self.id)
    }

    /// Cluster handle of a pivot.
    #[must_use]
    pub fn cluster(&self, pivot: PivotId) -> String {
        format!("gift_{}_cluster_{pivot}", self.id)
    }

    #[must_use]
    pub fn ribbon_curve(&self, segment: TieSegment) -> String {
        format!("ribbon_{segment}_crv_{}", self.id)
    }

    #[must_use]
    pub fn ribbon_extrusion(&self, segment: TieSegment) -> String {
        format!("ribbon_ext_{segment}{}", self.id)
    }

    #[must_use]
    pub fn profile(&self, slot: ProfileSlot) -> String {
        format!("ribbon_{}_profile_{}", slot.name(), self.id)
    }
}

#[must_use]
pub fn control_name(id: &str) -> String {
    format!("CTRL_gift_{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn ids_use_upper_case_and_digits() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            assert!(is_valid_id(&generate_id(&mut rng)));
        }
        assert!(!is_valid_id("abc12"));
        assert!(!is_valid_id("ABC1"));
    }

    #[test]
    fn names_follow_the_scene_layout() {
        let names = WrapNames::new("present", "K3Z9Q");
        assert_eq!(names.main_group(), "present_gift_wrap_K3Z9Q_GRP");
        assert_eq!(names.control(), "CTRL_gift_K3Z9Q");
        assert_eq!(names.cluster(PivotId::UR3), "gift_K3Z9Q_cluster_3UR");
        assert_eq!(names.ribbon_extrusion(TieSegment::BowLeft), "ribbon_ext_3LK3Z9Q");
        assert_eq!(names.ribbon_curve(TieSegment::Knot), "ribbon_4_crv_K3Z9Q");
        assert_eq!(names.profile(ProfileSlot::Side), "ribbon_2_profile_K3Z9Q");
    }
}
