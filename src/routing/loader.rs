//! Template directory loader.
//!
//! Layout: one sub-directory per route, holding `template.html` and
//! `bindings.toml`. The directory name is the route name.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::routing::registry::{RegistryError, RouteEntry, RouteRegistry};
use crate::template::binding::BindingFile;
use crate::template::{BindingError, BindingSpec, MarkupError, Template, TemplateRenderer};

pub const TEMPLATE_FILE: &str = "template.html";
pub const BINDINGS_FILE: &str = "bindings.toml";

#[derive(Debug, Error)]
pub enum TemplateLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Bindings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid bindings for route '{route}': {source}")]
    Binding {
        route: String,
        #[source]
        source: BindingError,
    },

    #[error("invalid template for route '{route}': {source}")]
    Markup {
        route: String,
        #[source]
        source: MarkupError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn read(path: &Path) -> Result<String, TemplateLoadError> {
    fs::read_to_string(path).map_err(|source| TemplateLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load one route from its directory.
pub fn load_route(name: &str, dir: &Path) -> Result<RouteEntry, TemplateLoadError> {
    let markup = read(&dir.join(TEMPLATE_FILE))?;
    let bindings_path = dir.join(BINDINGS_FILE);
    let content = read(&bindings_path)?;

    let file: BindingFile = toml::from_str(&content).map_err(|source| TemplateLoadError::Bindings {
        path: bindings_path,
        source,
    })?;
    let bindings = BindingSpec::try_from(file).map_err(|source| TemplateLoadError::Binding {
        route: name.to_string(),
        source,
    })?;
    let template = Template::parse(markup).map_err(|source| TemplateLoadError::Markup {
        route: name.to_string(),
        source,
    })?;

    Ok(RouteEntry::new(name, template, bindings))
}

/// Scan `root` and build the registry.
///
/// Markers without a matching element are reported but not rejected;
/// the render-time check stays authoritative.
pub fn load_directory(
    root: &Path,
    renderer: &TemplateRenderer,
) -> Result<RouteRegistry, TemplateLoadError> {
    let dir = fs::read_dir(root).map_err(|source| TemplateLoadError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for item in dir {
        let item = item.map_err(|source| TemplateLoadError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        let path = item.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = ?path, "Skipping template directory with non UTF-8 name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let route = load_route(name, &path)?;
        for marker in renderer.unmatched_markers(route.template(), route.bindings()) {
            tracing::warn!(
                route = %name,
                marker = %marker,
                "Binding marker has no element in template"
            );
        }
        tracing::debug!(route = %name, bindings = route.bindings().len(), "Route loaded");
        entries.push(route);
    }

    let registry = RouteRegistry::new(entries)?;
    if registry.is_empty() {
        tracing::warn!(path = ?root, "No routes found in template directory");
    }
    Ok(registry)
}
