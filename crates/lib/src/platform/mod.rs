//! Build platforms.
//!
//! A platform is either defined by a standalone `Dockerfile.<name>` or by a
//! service of the compose descriptor. The variant is decided solely by
//! membership in the compose service set, see [`Catalog::resolve`].

pub mod arch;
pub mod catalog;
pub mod compose;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::consts::{ARM_KEYWORDS, BUILD_PREFIX, PUBLISH_PREFIX};

pub use arch::Arch;
pub use catalog::{Catalog, enumerate};
pub use compose::ComposeFile;

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("unknown platform '{name}': {path} does not exist")]
  UnknownPlatform { name: String, path: PathBuf },

  #[error("failed to read docker directory {path}: {source}")]
  ReadDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to read compose descriptor {path}: {source}")]
  ComposeRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid compose descriptor {path}: {source}")]
  ComposeParse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("compose service '{service}' declares no image name")]
  ComposeImageMissing { service: String },
}

/// A resolved build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
  /// Built from a standalone definition file.
  Dockerfile { name: String, dockerfile: PathBuf },
  /// Built as a service of the compose descriptor.
  Compose { name: String, service: String },
}

impl Platform {
  /// Prefixed platform name, e.g. `build.ubuntu_cpu`.
  pub fn name(&self) -> &str {
    match self {
      Platform::Dockerfile { name, .. } | Platform::Compose { name, .. } => name,
    }
  }

  /// Name without its `build.`/`publish.` prefix.
  pub fn short_name(&self) -> &str {
    strip_prefix(self.name())
  }

  pub fn is_compose(&self) -> bool {
    matches!(self, Platform::Compose { .. })
  }

  /// Command run inside the container when the caller gives none.
  pub fn default_command(&self) -> Vec<String> {
    vec![
      crate::consts::RUNTIME_FUNCTIONS.to_string(),
      format!("build_{}", self.short_name()),
    ]
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// Prefix a bare name with `build.`.
pub fn normalize(name: &str) -> String {
  if name.starts_with(BUILD_PREFIX) || name.starts_with(PUBLISH_PREFIX) {
    name.to_string()
  } else {
    format!("{}{}", BUILD_PREFIX, name)
  }
}

/// Drop a leading `build.` or `publish.`.
pub fn strip_prefix(name: &str) -> &str {
  name
    .strip_prefix(BUILD_PREFIX)
    .or_else(|| name.strip_prefix(PUBLISH_PREFIX))
    .unwrap_or(name)
}

/// Whether a platform name denotes an ARM variant.
pub fn is_arm(name: &str) -> bool {
  ARM_KEYWORDS.iter().any(|keyword| name.contains(keyword))
}

/// Whether a platform name is a build (not publish) target.
pub fn is_buildable(name: &str) -> bool {
  name.starts_with(BUILD_PREFIX)
}
