//! Errors of the composite single-platform and matrix flows.

use thiserror::Error;

use crate::builder::BuildError;
use crate::cache::CacheError;
use crate::matrix::MatrixError;
use crate::platform::CatalogError;
use crate::runner::RunError;
use crate::tag::TagError;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Catalog(#[from] CatalogError),

  #[error(transparent)]
  Tag(#[from] TagError),

  #[error(transparent)]
  Cache(#[from] CacheError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error(transparent)]
  Run(#[from] RunError),

  #[error(transparent)]
  Matrix(#[from] MatrixError),
}

impl Error {
  /// Exit status to terminate the process with.
  ///
  /// The triggering engine exit code where there is one, otherwise 1.
  pub fn exit_status(&self) -> i32 {
    match self {
      Error::Cache(e) => e.exit_status(),
      Error::Build(e) => e.exit_status(),
      Error::Run(e) => e.exit_status(),
      Error::Matrix(e) => e.exit_status(),
      Error::Catalog(_) | Error::Tag(_) => 1,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
