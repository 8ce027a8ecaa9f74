//! Enumeration and resolution of build platforms.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::arch::Arch;
use super::compose::ComposeFile;
use super::{CatalogError, Platform, is_arm, normalize, strip_prefix};
use crate::config::Config;
use crate::consts::{BUILD_PREFIX, COMPOSE_FILE, DOCKERFILE_PREFIX};

/// Platforms declared in a docker directory.
#[derive(Debug, Clone)]
pub struct Catalog {
  docker_dir: PathBuf,
  compose: ComposeFile,
}

impl Catalog {
  pub fn load(config: &Config) -> Result<Self, CatalogError> {
    Self::from_dir(&config.docker_dir)
  }

  pub fn from_dir(docker_dir: &Path) -> Result<Self, CatalogError> {
    let compose = ComposeFile::load(&docker_dir.join(COMPOSE_FILE))?;
    Ok(Self {
      docker_dir: docker_dir.to_path_buf(),
      compose,
    })
  }

  pub fn docker_dir(&self) -> &Path {
    &self.docker_dir
  }

  pub fn compose(&self) -> &ComposeFile {
    &self.compose
  }

  /// Whether the un-prefixed form of `name` is a compose service.
  pub fn is_docker_compose(&self, name: &str) -> bool {
    self.compose.has_service(strip_prefix(name))
  }

  /// Definition file for a dockerfile-based platform name.
  pub fn dockerfile_path(&self, name: &str) -> PathBuf {
    self
      .docker_dir
      .join(format!("{}{}", DOCKERFILE_PREFIX, normalize(name)))
  }

  /// Resolve a caller-supplied name to exactly one build context.
  pub fn resolve(&self, name: &str) -> Result<Platform, CatalogError> {
    let normalized = normalize(name);
    let service = strip_prefix(&normalized);
    if self.compose.has_service(service) {
      return Ok(Platform::Compose {
        service: service.to_string(),
        name: normalized,
      });
    }

    let dockerfile = self.dockerfile_path(&normalized);
    if !dockerfile.is_file() {
      return Err(CatalogError::UnknownPlatform {
        name: name.to_string(),
        path: dockerfile,
      });
    }
    Ok(Platform::Dockerfile {
      name: normalized,
      dockerfile,
    })
  }

  /// Every platform name, unfiltered.
  pub fn names(&self) -> Result<BTreeSet<String>, CatalogError> {
    let claimed: BTreeSet<PathBuf> = self.compose.dockerfiles(&self.docker_dir).collect();

    let entries = std::fs::read_dir(&self.docker_dir).map_err(|source| CatalogError::ReadDir {
      path: self.docker_dir.clone(),
      source,
    })?;

    let mut names = BTreeSet::new();
    for entry in entries {
      let entry = entry.map_err(|source| CatalogError::ReadDir {
        path: self.docker_dir.clone(),
        source,
      })?;
      let file_name = entry.file_name();
      let Some(file_name) = file_name.to_str() else {
        continue;
      };
      let Some(name) = file_name.strip_prefix(DOCKERFILE_PREFIX) else {
        continue;
      };
      if name.is_empty() || name.ends_with('~') || claimed.contains(&entry.path()) {
        continue;
      }
      names.insert(name.to_string());
    }

    names.extend(
      self
        .compose
        .services
        .keys()
        .map(|service| format!("{}{}", BUILD_PREFIX, service)),
    );
    Ok(names)
  }

  /// Sorted platform names available for `arch`.
  ///
  /// `x86_64` drops ARM variants, `aarch64` keeps only ARM variants and any
  /// other architecture returns the full catalog.
  pub fn enumerate(&self, arch: &Arch) -> Result<Vec<String>, CatalogError> {
    let names = self.names()?;
    let filtered: Vec<String> = match arch {
      Arch::X86_64 => names.into_iter().filter(|n| !is_arm(n)).collect(),
      Arch::Aarch64 => names.into_iter().filter(|n| is_arm(n)).collect(),
      Arch::Other(_) => names.into_iter().collect(),
    };
    debug!(arch = %arch, count = filtered.len(), "enumerated platforms");
    Ok(filtered)
  }
}

/// Enumerate the platforms declared under `docker_dir` for `arch`.
pub fn enumerate(docker_dir: &Path, arch: &Arch) -> Result<Vec<String>, CatalogError> {
  Catalog::from_dir(docker_dir)?.enumerate(arch)
}
