//! Template rendering.
//!
//! # Responsibilities
//! - Bind payload values into a template, one binding entry at a time
//! - Report the first missing marker or missing value
//!
//! # Design Decisions
//! - Pure function of (template, bindings, payload); the renderer only
//!   carries the marker attribute name
//! - Works on a private clone of the parsed template, so a failed render
//!   leaves nothing behind and concurrent renders never share a tree
//! - Payload fields without a binding are ignored

use serde_json::Value;
use thiserror::Error;

use crate::template::binding::BindingSpec;
use crate::template::document::{Document, MarkupError};
use crate::template::payload;

/// Default attribute identifying injection points.
pub const DEFAULT_MARKER_ATTRIBUTE: &str = "data-bind";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("The key '{0}' is not defined inside the html document")]
    MissingMarker(String),

    #[error("Missing data '{0}'")]
    MissingData(String),
}

/// Immutable template markup with its parsed tree.
#[derive(Debug, Clone)]
pub struct Template {
    markup: String,
    document: Document,
}

impl Template {
    pub fn parse(markup: impl Into<String>) -> Result<Self, MarkupError> {
        let markup = markup.into();
        let document = Document::parse(&markup)?;
        Ok(Self { markup, document })
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    marker_attribute: String,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_ATTRIBUTE)
    }
}

impl TemplateRenderer {
    pub fn new(marker_attribute: impl Into<String>) -> Self {
        Self {
            marker_attribute: marker_attribute.into(),
        }
    }

    pub fn marker_attribute(&self) -> &str {
        &self.marker_attribute
    }

    /// Render `template` with `payload`, following `bindings` in order.
    pub fn render(
        &self,
        template: &Template,
        bindings: &BindingSpec,
        payload: &Value,
    ) -> Result<String, RenderError> {
        let mut document = template.document().clone();

        for entry in bindings.iter() {
            let element = document
                .find_marker_mut(&self.marker_attribute, entry.marker())
                .ok_or_else(|| RenderError::MissingMarker(entry.marker().to_string()))?;
            let value = payload::resolve(payload, entry.marker())
                .ok_or_else(|| RenderError::MissingData(entry.marker().to_string()))?;
            element.write(entry.target(), &payload::to_text(value));
        }

        Ok(document.to_html())
    }

    /// Markers declared in `bindings` that have no element in `template`.
    pub fn unmatched_markers<'a>(
        &self,
        template: &Template,
        bindings: &'a BindingSpec,
    ) -> Vec<&'a str> {
        bindings
            .iter()
            .map(|entry| entry.marker())
            .filter(|marker| !template.document().has_marker(&self.marker_attribute, marker))
            .collect()
    }
}
