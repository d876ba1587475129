//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up a route by name
//! - Return the route or an explicit absence
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) lookup via HashMap
//! - Absence is not an error here; the caller decides what it means

use std::collections::HashMap;

use thiserror::Error;

use crate::template::{BindingSpec, Template};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("invalid route name '{0}'")]
    InvalidName(String),
}

/// A named template and its bindings.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    name: String,
    template: Template,
    bindings: BindingSpec,
}

impl RouteEntry {
    pub fn new(name: impl Into<String>, template: Template, bindings: BindingSpec) -> Self {
        Self {
            name: name.into(),
            template,
            bindings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn bindings(&self) -> &BindingSpec {
        &self.bindings
    }
}

/// Route name must fit in a single path segment.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '?', '#']) && !name.chars().any(char::is_whitespace)
}

#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: HashMap<String, RouteEntry>,
}

impl RouteRegistry {
    pub fn new(entries: impl IntoIterator<Item = RouteEntry>) -> Result<Self, RegistryError> {
        let mut routes = HashMap::new();
        for entry in entries {
            if !is_valid_name(&entry.name) {
                return Err(RegistryError::InvalidName(entry.name));
            }
            if routes.contains_key(&entry.name) {
                return Err(RegistryError::DuplicateRoute(entry.name));
            }
            routes.insert(entry.name.clone(), entry);
        }
        Ok(Self { routes })
    }

    pub fn lookup(&self, name: &str) -> Option<&RouteEntry> {
        self.routes.get(name)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
