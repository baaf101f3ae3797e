//! Paper and ribbon colour vocabularies.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A fixed colour vocabulary with a shader per colour.
pub trait Palette: Copy + PartialEq + fmt::Display + 'static {
    const ALL: &'static [Self];
    /// Shader name prefix, completed by the upper-case colour name.
    const SHADER_PREFIX: &'static str;

    /// Upper-case colour name as stored on the control handle.
    fn name(self) -> &'static str;

    fn rgb(self) -> [f64; 3];

    fn shader_name(self) -> String {
        format!("{}{}", Self::SHADER_PREFIX, self.name())
    }

    fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim();
        Self::ALL.iter().copied().find(|c| c.name().eq_ignore_ascii_case(wanted))
    }

    fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaperColor {
    Green,
    Red,
    Blue,
    Yellow,
    White,
    Black,
}

impl Palette for PaperColor {
    const ALL: &'static [Self] = &[Self::Green, Self::Red, Self::Blue, Self::Yellow, Self::White, Self::Black];
    const SHADER_PREFIX: &'static str = "shd_paper_";

    fn name(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Yellow => "YELLOW",
            Self::White => "WHITE",
            Self::Black => "BLACK",
        }
    }

    fn rgb(self) -> [f64; 3] {
        match self {
            Self::Green => [0.2, 0.6, 0.2],
            Self::Red => [0.8, 0.3, 0.3],
            Self::Blue => [0.3, 0.3, 0.8],
            Self::Yellow => [0.8, 0.75, 0.3],
            Self::White => [0.98, 0.98, 0.98],
            Self::Black => [0.1, 0.1, 0.1],
        }
    }
}

/// Ribbon colours; there is no white or black ribbon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RibbonColor {
    Green,
    Red,
    Blue,
    Yellow,
}

impl Palette for RibbonColor {
    const ALL: &'static [Self] = &[Self::Green, Self::Red, Self::Blue, Self::Yellow];
    const SHADER_PREFIX: &'static str = "shd_ribbon_";

    fn name(self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Red => "RED",
            Self::Blue => "BLUE",
            Self::Yellow => "YELLOW",
        }
    }

    fn rgb(self) -> [f64; 3] {
        match self {
            Self::Green => [0.1, 0.6, 0.1],
            Self::Red => [0.6, 0.1, 0.1],
            Self::Blue => [0.1, 0.1, 0.6],
            Self::Yellow => [0.8, 0.7, 0.1],
        }
    }
}

impl fmt::Display for PaperColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for RibbonColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Colour requested by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Keep the stored colour; random when there is none yet.
    Current,
    #[default]
    Random,
    Named(String),
}

impl ColorChoice {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Pick the concrete colour.
    ///
    /// Unknown names fall back to a random pick with a warning that carries
    /// the closest known name.
    pub fn resolve<C: Palette>(&self, current: Option<C>, rng: &mut impl Rng) -> C {
        match self {
            Self::Current => current.unwrap_or_else(|| C::random(rng)),
            Self::Random => C::random(rng),
            Self::Named(name) => C::from_name(name).unwrap_or_else(|| {
                let picked = C::random(rng);
                match closest_name::<C>(name) {
                    Some(hint) => log::warn!("unknown colour `{name}` (did you mean `{hint}`?), using {picked}"),
                    None => log::warn!("unknown colour `{name}`, using {picked}"),
                }
                picked
            }),
        }
    }
}

impl FromStr for ColorChoice {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "current" => Self::Current,
            "random" | "" => Self::Random,
            _ => Self::Named(s.trim().to_owned()),
        })
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("current"),
            Self::Random => f.write_str("random"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Closest vocabulary entry within an edit distance of 3.
fn closest_name<C: Palette>(name: &str) -> Option<String> {
    let needle = name.to_ascii_lowercase();
    C::ALL
        .iter()
        .map(|c| c.name().to_ascii_lowercase())
        .map(|candidate| (levenshtein::levenshtein(&needle, &candidate), candidate))
        .filter(|(distance, _)| *distance <= 3)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn names_resolve_case_insensitively() {
        let mut rng = StdRng::seed_from_u64(7);
        let red: PaperColor = ColorChoice::named("red").resolve(None, &mut rng);
        assert_eq!(red, PaperColor::Red);
        assert_eq!(red.shader_name(), "shd_paper_RED");
        assert_eq!(RibbonColor::Blue.shader_name(), "shd_ribbon_BLUE");
    }

    #[test]
    fn ribbon_vocabulary_has_no_white() {
        assert_eq!(RibbonColor::from_name("white"), None);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..32 {
            let c: RibbonColor = ColorChoice::named("white").resolve(None, &mut rng);
            assert!(RibbonColor::ALL.contains(&c));
        }
    }

    #[test]
    fn current_keeps_the_stored_colour() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(ColorChoice::Current.resolve(Some(PaperColor::Black), &mut rng), PaperColor::Black);
        assert_eq!("Current".parse::<ColorChoice>(), Ok(ColorChoice::Current));
        assert_eq!("".parse::<ColorChoice>(), Ok(ColorChoice::Random));
    }

    #[test]
    fn suggestions_use_edit_distance() {
        assert_eq!(closest_name::<PaperColor>("yelow"), Some("yellow".to_owned()));
        assert_eq!(closest_name::<RibbonColor>("magenta"), None);
    }
}
