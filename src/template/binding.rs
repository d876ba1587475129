//! Binding declarations.
//!
//! # Responsibilities
//! - Describe which markers a template requires
//! - Decide how each resolved value is written into its element
//! - Enforce marker uniqueness within one spec
//!
//! # Design Decisions
//! - Entries keep their declared order; rendering walks them in that order
//! - The write target is derived once, when the entry is built

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while building a binding spec.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("binding marker must not be empty")]
    EmptyMarker,

    #[error("invalid attribute '{attribute}' for marker '{marker}'")]
    InvalidAttribute { marker: String, attribute: String },

    #[error("marker '{0}' is declared more than once")]
    DuplicateMarker(String),
}

/// Where a resolved value is written on the marked element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    /// Replace the element content with escaped text.
    Text,
    /// Replace the element content with raw markup.
    Html,
    /// Set (or replace) the named attribute.
    Attribute(String),
}

impl WriteTarget {
    /// Map a binding `attribute` name onto a write target.
    ///
    /// DOM property names with a differently spelled attribute (`className`,
    /// `htmlFor`) are translated. Returns `None` when the name cannot be used
    /// as an HTML attribute, including nested property paths such as
    /// `style.color`.
    pub fn from_attribute(attribute: &str) -> Option<Self> {
        match attribute {
            "text" | "textContent" | "innerText" => Some(WriteTarget::Text),
            "html" | "innerHTML" => Some(WriteTarget::Html),
            "className" => Some(WriteTarget::Attribute("class".to_string())),
            "htmlFor" => Some(WriteTarget::Attribute("for".to_string())),
            name if name.contains('.') => None,
            name if is_attribute_name(name) => Some(WriteTarget::Attribute(name.to_string())),
            _ => None,
        }
    }
}

/// Returns true if `name` is usable as an HTML attribute name.
pub fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && !name.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '/')
        })
}

/// A single `{marker, attribute}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawBindingEntry")]
pub struct BindingEntry {
    marker: String,
    attribute: String,
    target: WriteTarget,
}

#[derive(Deserialize)]
struct RawBindingEntry {
    marker: String,
    attribute: String,
}

impl TryFrom<RawBindingEntry> for BindingEntry {
    type Error = BindingError;

    fn try_from(raw: RawBindingEntry) -> Result<Self, Self::Error> {
        BindingEntry::new(raw.marker, raw.attribute)
    }
}

impl BindingEntry {
    pub fn new(
        marker: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Result<Self, BindingError> {
        let marker = marker.into();
        let attribute = attribute.into();
        if marker.is_empty() {
            return Err(BindingError::EmptyMarker);
        }
        let target = WriteTarget::from_attribute(&attribute).ok_or_else(|| {
            BindingError::InvalidAttribute {
                marker: marker.clone(),
                attribute: attribute.clone(),
            }
        })?;
        Ok(Self {
            marker,
            attribute,
            target,
        })
    }

    /// Marker value, also used as the payload dot-path.
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Attribute name as declared.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn target(&self) -> &WriteTarget {
        &self.target
    }
}

/// Ordered, marker-unique list of bindings for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSpec {
    entries: Vec<BindingEntry>,
}

impl BindingSpec {
    pub fn new(entries: Vec<BindingEntry>) -> Result<Self, BindingError> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.marker.as_str()) {
                return Err(BindingError::DuplicateMarker(entry.marker.clone()));
            }
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &BindingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// On-disk shape of a `bindings.toml` file.
#[derive(Debug, Default, Deserialize)]
pub struct BindingFile {
    #[serde(default)]
    pub bindings: Vec<BindingEntry>,
}

impl TryFrom<BindingFile> for BindingSpec {
    type Error = BindingError;

    fn try_from(file: BindingFile) -> Result<Self, Self::Error> {
        BindingSpec::new(file.bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_target_mapping() {
        assert_eq!(WriteTarget::from_attribute("text"), Some(WriteTarget::Text));
        assert_eq!(WriteTarget::from_attribute("innerText"), Some(WriteTarget::Text));
        assert_eq!(WriteTarget::from_attribute("innerHTML"), Some(WriteTarget::Html));
        assert_eq!(
            WriteTarget::from_attribute("src"),
            Some(WriteTarget::Attribute("src".into()))
        );
        assert_eq!(WriteTarget::from_attribute(""), None);
        assert_eq!(WriteTarget::from_attribute("on click"), None);
        assert_eq!(WriteTarget::from_attribute("a\"b"), None);
    }

    #[test]
    fn test_dom_property_names() {
        assert_eq!(
            WriteTarget::from_attribute("className"),
            Some(WriteTarget::Attribute("class".into()))
        );
        assert_eq!(
            WriteTarget::from_attribute("htmlFor"),
            Some(WriteTarget::Attribute("for".into()))
        );
        assert_eq!(WriteTarget::from_attribute("style.color"), None);
        assert!(matches!(
            BindingEntry::new("title", "dataset.title"),
            Err(BindingError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn test_entry_rejects_empty_marker() {
        assert_eq!(BindingEntry::new("", "text"), Err(BindingError::EmptyMarker));
    }

    #[test]
    fn test_spec_rejects_duplicate_markers() {
        let entries = vec![
            BindingEntry::new("name", "text").unwrap(),
            BindingEntry::new("logo", "src").unwrap(),
            BindingEntry::new("name", "html").unwrap(),
        ];
        assert_eq!(
            BindingSpec::new(entries),
            Err(BindingError::DuplicateMarker("name".into()))
        );
    }

    #[test]
    fn test_binding_file_parse() {
        let content = r#"
            [[bindings]]
            marker = "user.name"
            attribute = "text"

            [[bindings]]
            marker = "logo"
            attribute = "src"
        "#;
        let file: BindingFile = toml::from_str(content).unwrap();
        let spec = BindingSpec::try_from(file).unwrap();
        let markers: Vec<_> = spec.iter().map(|e| e.marker()).collect();
        assert_eq!(markers, vec!["user.name", "logo"]);
        assert_eq!(spec.iter().nth(1).unwrap().target(), &WriteTarget::Attribute("src".into()));
    }

    #[test]
    fn test_binding_file_invalid_attribute() {
        let content = r#"
            [[bindings]]
            marker = "name"
            attribute = "bad attr"
        "#;
        assert!(toml::from_str::<BindingFile>(content).is_err());
    }
}
