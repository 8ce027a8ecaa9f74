//! Multi-service compose descriptor.
//!
//! Only the fields the orchestrator needs are modelled: each service's image
//! name template and the definition file it builds from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::CatalogError;
use crate::consts::REGISTRY_PLACEHOLDER;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeFile {
  #[serde(default)]
  pub services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeService {
  /// Image name containing the registry placeholder.
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub build: Option<ComposeBuild>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComposeBuild {
  /// Build context, relative to the descriptor's directory. Defaults to `.`.
  #[serde(default)]
  pub context: Option<String>,
  /// Definition file, relative to the build context.
  pub dockerfile: String,
}

impl ComposeBuild {
  /// Definition file resolved against `base`, the descriptor's directory.
  pub fn dockerfile_path(&self, base: &Path) -> PathBuf {
    base.join(self.context.as_deref().unwrap_or(".")).join(&self.dockerfile)
  }
}

impl ComposeFile {
  /// Load a descriptor; a missing file declares no services.
  pub fn load(path: &Path) -> Result<Self, CatalogError> {
    if !path.exists() {
      debug!(path = %path.display(), "no compose descriptor");
      return Ok(Self::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::ComposeRead {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content).map_err(|source| CatalogError::ComposeParse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(content)
  }

  pub fn has_service(&self, name: &str) -> bool {
    self.services.contains_key(name)
  }

  /// Definition files claimed by compose services, resolved against `base`.
  pub fn dockerfiles<'a>(&'a self, base: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
    self
      .services
      .values()
      .filter_map(|service| service.build.as_ref())
      .map(move |build| build.dockerfile_path(base))
  }

  /// Image name of `service` with the registry placeholder replaced.
  pub fn image_for(&self, service: &str, registry: &str) -> Option<String> {
    let image = self.services.get(service)?.image.as_ref()?;
    Some(image.replace(REGISTRY_PLACEHOLDER, registry))
  }
}
