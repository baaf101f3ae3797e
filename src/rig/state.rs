//! Persisted wrap state.
//!
//! The control handle carries eight hidden attributes. [`WrapState`] is the
//! typed view of them; conversion to and from the attribute map is exact, and
//! the same record can be written as a small XML sidecar.

use serde::{Deserialize, Serialize};

use super::color::{Palette, PaperColor, RibbonColor};
use crate::host::{MetaLookupExt, MetaMap, MetaValue};
use crate::ribbon::RibbonSize;

pub const ATTR_NAME: &str = "wrap_name";
pub const ATTR_ID: &str = "wrap_id";
pub const ATTR_THICKNESS: &str = "wrap_thickness";
pub const ATTR_PAPER_COLOR: &str = "wrap_color";
pub const ATTR_RIBBON_SIZE: &str = "ribbon_size";
pub const ATTR_RIBBON_COLOR: &str = "ribbon_color";
pub const ATTR_ANIM_START: &str = "animation_start";
pub const ATTR_ANIM_END: &str = "animation_end";

/// Persisted attributes, in the order they are added to the handle.
pub const STATE_ATTRIBUTES: [&str; 8] = [
    ATTR_NAME,
    ATTR_ID,
    ATTR_THICKNESS,
    ATTR_PAPER_COLOR,
    ATTR_RIBBON_SIZE,
    ATTR_RIBBON_COLOR,
    ATTR_ANIM_START,
    ATTR_ANIM_END,
];

/// Keyable driver attribute on the control handle.
pub const ATTR_ANIMATION: &str = "animation";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("attribute `{0}` is missing")]
    MissingAttribute(&'static str),
    #[error("attribute `{attribute}` should be {expected}, found {found}")]
    WrongType { attribute: &'static str, expected: &'static str, found: &'static str },
    #[error("attribute `{attribute}` has an invalid value `{value}`")]
    InvalidValue { attribute: &'static str, value: String },
    #[error("wrap state XML: {0}")]
    Xml(String),
}

/// Everything needed to rebuild or edit a wrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapState {
    /// Name of the wrapped object.
    pub name: String,
    pub id: String,
    pub thickness: f64,
    pub paper_color: PaperColor,
    pub ribbon_color: RibbonColor,
    pub ribbon_size: RibbonSize,
    pub anim_start: i32,
    pub anim_end: i32,
}

impl WrapState {
    #[must_use]
    pub fn to_attributes(&self) -> MetaMap {
        let mut map = MetaMap::new();
        map.insert(ATTR_NAME.to_owned(), MetaValue::from(self.name.as_str()));
        map.insert(ATTR_ID.to_owned(), MetaValue::from(self.id.as_str()));
        map.insert(ATTR_THICKNESS.to_owned(), MetaValue::Number(self.thickness));
        map.insert(ATTR_PAPER_COLOR.to_owned(), MetaValue::from(self.paper_color.name()));
        map.insert(ATTR_RIBBON_SIZE.to_owned(), MetaValue::from(self.ribbon_size.as_str()));
        map.insert(ATTR_RIBBON_COLOR.to_owned(), MetaValue::from(self.ribbon_color.name()));
        map.insert(ATTR_ANIM_START.to_owned(), MetaValue::Integer(i64::from(self.anim_start)));
        map.insert(ATTR_ANIM_END.to_owned(), MetaValue::Integer(i64::from(self.anim_end)));
        map
    }

    /// Read the state back from a handle's attributes.
    ///
    /// # Errors
    /// Reports the first missing, mistyped or unparseable attribute.
    pub fn from_attributes(map: &MetaMap) -> Result<Self, StateError> {
        let paper = text(map, ATTR_PAPER_COLOR)?;
        let ribbon = text(map, ATTR_RIBBON_COLOR)?;
        let size = text(map, ATTR_RIBBON_SIZE)?;
        Ok(Self {
            name: text(map, ATTR_NAME)?.to_owned(),
            id: text(map, ATTR_ID)?.to_owned(),
            thickness: number(map, ATTR_THICKNESS)?,
            paper_color: PaperColor::from_name(paper).ok_or_else(|| invalid(ATTR_PAPER_COLOR, paper))?,
            ribbon_color: RibbonColor::from_name(ribbon).ok_or_else(|| invalid(ATTR_RIBBON_COLOR, ribbon))?,
            ribbon_size: size.parse().map_err(|_| invalid(ATTR_RIBBON_SIZE, size))?,
            anim_start: frame(map, ATTR_ANIM_START)?,
            anim_end: frame(map, ATTR_ANIM_END)?,
        })
    }

    /// # Errors
    /// Fails when the serializer rejects the record.
    pub fn to_xml(&self) -> Result<String, StateError> {
        quick_xml::se::to_string(&StateDocument::from(self)).map_err(|e| StateError::Xml(e.to_string()))
    }

    /// # Errors
    /// Fails on malformed XML or invalid field values.
    pub fn from_xml(input: &str) -> Result<Self, StateError> {
        let doc: StateDocument = quick_xml::de::from_str(input).map_err(|e| StateError::Xml(e.to_string()))?;
        Self::from_attributes(&doc.into_attributes())
    }
}

fn lookup<'a>(map: &'a MetaMap, attribute: &'static str) -> Result<&'a MetaValue, StateError> {
    map.get_normalized(attribute).ok_or(StateError::MissingAttribute(attribute))
}

fn text<'a>(map: &'a MetaMap, attribute: &'static str) -> Result<&'a str, StateError> {
    let value = lookup(map, attribute)?;
    value.as_text().ok_or(StateError::WrongType { attribute, expected: "text", found: value.kind() })
}

fn number(map: &MetaMap, attribute: &'static str) -> Result<f64, StateError> {
    let value = lookup(map, attribute)?;
    value.as_number().ok_or(StateError::WrongType { attribute, expected: "number", found: value.kind() })
}

#[allow(clippy::cast_possible_truncation)]
fn frame(map: &MetaMap, attribute: &'static str) -> Result<i32, StateError> {
    let value = lookup(map, attribute)?;
    match value {
        MetaValue::Integer(v) => i32::try_from(*v).map_err(|_| invalid(attribute, &v.to_string())),
        other => match other.as_number() {
            Some(v) if v.fract().abs() < f64::EPSILON && v.abs() <= f64::from(i32::MAX) => Ok(v as i32),
            Some(v) => Err(invalid(attribute, &v.to_string())),
            None => Err(StateError::WrongType { attribute, expected: "integer", found: other.kind() }),
        },
    }
}

fn invalid(attribute: &'static str, value: &str) -> StateError {
    StateError::InvalidValue { attribute, value: value.to_owned() }
}

/// XML shape of the state: one element, every field an attribute.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "wrap_state")]
struct StateDocument {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@thickness")]
    thickness: f64,
    #[serde(rename = "@paper_color")]
    paper_color: String,
    #[serde(rename = "@ribbon_color")]
    ribbon_color: String,
    #[serde(rename = "@ribbon_size")]
    ribbon_size: String,
    #[serde(rename = "@animation_start")]
    anim_start: i32,
    #[serde(rename = "@animation_end")]
    anim_end: i32,
}

impl From<&WrapState> for StateDocument {
    fn from(state: &WrapState) -> Self {
        Self {
            name: state.name.clone(),
            id: state.id.clone(),
            thickness: state.thickness,
            paper_color: state.paper_color.name().to_owned(),
            ribbon_color: state.ribbon_color.name().to_owned(),
            ribbon_size: state.ribbon_size.as_str().to_owned(),
            anim_start: state.anim_start,
            anim_end: state.anim_end,
        }
    }
}

impl StateDocument {
    fn into_attributes(self) -> MetaMap {
        let mut map = MetaMap::new();
        map.insert(ATTR_NAME.to_owned(), MetaValue::Text(self.name));
        map.insert(ATTR_ID.to_owned(), MetaValue::Text(self.id));
        map.insert(ATTR_THICKNESS.to_owned(), MetaValue::Number(self.thickness));
        map.insert(ATTR_PAPER_COLOR.to_owned(), MetaValue::Text(self.paper_color));
        map.insert(ATTR_RIBBON_SIZE.to_owned(), MetaValue::Text(self.ribbon_size));
        map.insert(ATTR_RIBBON_COLOR.to_owned(), MetaValue::Text(self.ribbon_color));
        map.insert(ATTR_ANIM_START.to_owned(), MetaValue::Integer(i64::from(self.anim_start)));
        map.insert(ATTR_ANIM_END.to_owned(), MetaValue::Integer(i64::from(self.anim_end)));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WrapState {
        WrapState {
            name: "present".to_owned(),
            id: "A1B2C".to_owned(),
            thickness: 0.035,
            paper_color: PaperColor::Yellow,
            ribbon_color: RibbonColor::Red,
            ribbon_size: RibbonSize::M,
            anim_start: 5,
            anim_end: 48,
        }
    }

    #[test]
    fn attributes_restore_the_state_exactly() {
        let state = sample();
        let map = state.to_attributes();
        assert_eq!(map.len(), STATE_ATTRIBUTES.len());
        assert!(STATE_ATTRIBUTES.iter().all(|a| map.contains_key(*a)));
        assert_eq!(WrapState::from_attributes(&map), Ok(state));
    }

    #[test]
    fn missing_and_bad_attributes_are_reported() {
        let mut map = sample().to_attributes();
        map.remove(ATTR_RIBBON_SIZE);
        assert_eq!(WrapState::from_attributes(&map), Err(StateError::MissingAttribute(ATTR_RIBBON_SIZE)));

        let mut map = sample().to_attributes();
        map.insert(ATTR_PAPER_COLOR.to_owned(), MetaValue::from("PURPLE"));
        assert!(matches!(WrapState::from_attributes(&map), Err(StateError::InvalidValue { .. })));

        let mut map = sample().to_attributes();
        map.insert(ATTR_THICKNESS.to_owned(), MetaValue::from("thick"));
        assert!(matches!(WrapState::from_attributes(&map), Err(StateError::WrongType { .. })));
    }

    #[test]
    fn whole_number_frames_are_accepted() {
        let mut map = sample().to_attributes();
        map.insert(ATTR_ANIM_END.to_owned(), MetaValue::Number(30.0));
        assert_eq!(WrapState::from_attributes(&map).map(|s| s.anim_end), Ok(30));
        map.insert(ATTR_ANIM_END.to_owned(), MetaValue::Number(30.5));
        assert!(WrapState::from_attributes(&map).is_err());
    }

    #[test]
    fn xml_sidecar_restores_the_state() {
        let state = sample();
        let xml = state.to_xml().expect("serialize");
        assert!(xml.starts_with("<wrap_state"));
        assert!(xml.contains("ribbon_size=\"M\""));
        assert_eq!(WrapState::from_xml(&xml), Ok(state));
        assert!(matches!(WrapState::from_xml("<wrap_state/>"), Err(StateError::Xml(_))));
    }
}
