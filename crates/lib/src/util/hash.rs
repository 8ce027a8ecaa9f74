//! Streaming file hashing.
//!
//! Files are fed into the digest in fixed-size chunks so large build inputs
//! never have to be held in memory.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::consts::HASH_CHUNK_SIZE;

/// Error while reading a file into a digest.
#[derive(Debug, thiserror::Error)]
#[error("failed to read {path}: {source}")]
pub struct FileHashError {
  pub path: PathBuf,
  #[source]
  pub source: std::io::Error,
}

/// Feed the contents of `path` into `hasher`.
pub fn update_from_file(hasher: &mut Sha256, path: &Path) -> Result<(), FileHashError> {
  let err = |source| FileHashError {
    path: path.to_path_buf(),
    source,
  };
  let mut file = fs::File::open(path).map_err(err)?;
  let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(err)?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(())
}
