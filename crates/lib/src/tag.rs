//! Content-addressable image tags.
//!
//! A dockerfile-based platform is tagged `{registry}:{platform}-{digest}`,
//! where the digest covers the definition file followed by every file its
//! `COPY` instructions pull in, in the order those instructions appear.
//! Compose-based platforms use the image name declared by their service.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::consts::{LOCAL_REGISTRY, TAG_DIGEST_LEN};
use crate::platform::{Catalog, CatalogError, Platform};
use crate::util::hash::{FileHashError, update_from_file};

/// Literal prefix of a copy instruction. Multi-line and JSON-form copies are not recognized.
const COPY_PREFIX: &str = "COPY ";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Tag(pub String);

impl Tag {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Error)]
pub enum TagError {
  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error(transparent)]
  Hash(#[from] FileHashError),
}

/// Compute the tag for `platform` against `registry`.
pub fn compute_tag(catalog: &Catalog, platform: &Platform, registry: &str) -> Result<Tag, TagError> {
  match platform {
    Platform::Compose { service, .. } => {
      let image = catalog
        .compose()
        .image_for(service, registry)
        .ok_or_else(|| CatalogError::ComposeImageMissing {
          service: service.clone(),
        })?;
      Ok(Tag(image))
    }
    Platform::Dockerfile { name, dockerfile } => dockerfile_tag(name, dockerfile, registry),
  }
}

/// Tag for a standalone definition file.
pub fn dockerfile_tag(name: &str, dockerfile: &Path, registry: &str) -> Result<Tag, TagError> {
  let registry = if registry.is_empty() { LOCAL_REGISTRY } else { registry };

  let mut hasher = Sha256::new();
  update_from_file(&mut hasher, dockerfile)?;
  for copied in find_copied_files(dockerfile)? {
    update_from_file(&mut hasher, &copied)?;
  }
  let digest = hex::encode(hasher.finalize());

  let tag = Tag(format!("{}:{}-{}", registry, name, &digest[..TAG_DIGEST_LEN]));
  debug!(tag = %tag, dockerfile = %dockerfile.display(), "computed tag");
  Ok(tag)
}

/// Source files referenced by `COPY` lines, relative to the definition's directory.
pub fn find_copied_files(dockerfile: &Path) -> Result<Vec<PathBuf>, FileHashError> {
  let content = std::fs::read(dockerfile).map_err(|source| FileHashError {
    path: dockerfile.to_path_buf(),
    source,
  })?;
  let base = dockerfile.parent().unwrap_or(Path::new(""));

  Ok(
    String::from_utf8_lossy(&content)
      .lines()
      .filter(|line| line.starts_with(COPY_PREFIX))
      .filter_map(|line| line.split_whitespace().nth(1))
      .map(|source| base.join(source))
      .collect(),
  )
}
