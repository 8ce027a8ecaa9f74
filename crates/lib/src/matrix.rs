//! Sequential build of every platform for one architecture.
//!
//! All platforms share the workspace build directory. Before each run it is
//! cleared, and afterwards it is moved to a per-platform sibling of the
//! workspace (see [`Config::platform_output_dir`]). A platform whose
//! destination already exists is skipped, so an interrupted matrix can be
//! resumed by running it again.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::builder::build_image;
use crate::cache::load_cache;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::pipeline::{BuildSettings, RunSettings};
use crate::platform::{Arch, Catalog, is_buildable};
use crate::runner::run_container;
use crate::tag::compute_tag;

#[derive(Debug, Error)]
pub enum MatrixError {
  #[error("{platform}: container command exited with status {code}")]
  CommandFailed { platform: String, code: i32 },

  #[error("failed to clear build directory {path}: {source}")]
  ClearBuildDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to move {from} to {to}: {source}")]
  Relocate {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },
}

impl MatrixError {
  pub fn exit_status(&self) -> i32 {
    match self {
      MatrixError::CommandFailed { code, .. } => *code,
      _ => 1,
    }
  }
}

#[derive(Debug, Clone)]
pub struct MatrixOptions {
  pub arch: Arch,
  pub build: BuildSettings,
  pub run: RunSettings,
  /// Build every image but run nothing.
  pub build_only: bool,
}

/// What happened to one platform of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlatformOutcome {
  Built,
  Relocated { path: PathBuf },
  Skipped { path: PathBuf },
}

impl fmt::Display for PlatformOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PlatformOutcome::Built => write!(f, "built"),
      PlatformOutcome::Relocated { path } => write!(f, "output in {}", path.display()),
      PlatformOutcome::Skipped { path } => write!(f, "skipped, {} exists", path.display()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformResult {
  pub platform: String,
  #[serde(flatten)]
  pub outcome: PlatformOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatrixReport {
  pub platforms: Vec<PlatformResult>,
}

impl MatrixReport {
  fn push(&mut self, platform: &str, outcome: PlatformOutcome) {
    self.platforms.push(PlatformResult {
      platform: platform.to_string(),
      outcome,
    });
  }

  pub fn skipped(&self) -> usize {
    self
      .platforms
      .iter()
      .filter(|r| matches!(r.outcome, PlatformOutcome::Skipped { .. }))
      .count()
  }
}

/// Build, and unless `build_only` run, every buildable platform for `options.arch`.
///
/// Stops at the first fatal error.
pub async fn build_all<E: Engine>(
  config: &Config,
  engine: &E,
  catalog: &Catalog,
  options: &MatrixOptions,
) -> Result<MatrixReport> {
  let names: Vec<String> = catalog
    .enumerate(&options.arch)?
    .into_iter()
    .filter(|name| is_buildable(name))
    .collect();
  info!(arch = %options.arch, count = names.len(), "building platform matrix");

  let registry = options.build.registry.as_str();
  let mut report = MatrixReport::default();

  for name in &names {
    let platform = catalog.resolve(name)?;
    let tag = compute_tag(catalog, &platform, registry)?;
    load_cache(config, engine, &platform, &tag, registry).await?;
    build_image(config, engine, catalog, &options.build.descriptor(&platform)).await?;

    if options.build_only {
      report.push(name, PlatformOutcome::Built);
      continue;
    }

    let build_dir = config.build_dir();
    clear_dir(&build_dir).await?;

    let destination = config.platform_output_dir(platform.short_name());
    if tokio::fs::try_exists(&destination).await.unwrap_or(false) {
      warn!(platform = %name, path = %destination.display(), "output already exists, skipping");
      report.push(name, PlatformOutcome::Skipped { path: destination });
      continue;
    }

    let descriptor = options
      .run
      .descriptor(&platform, registry, platform.default_command(), false);
    let code = run_container(config, engine, catalog, &descriptor).await?;
    if code != 0 {
      return Err(
        MatrixError::CommandFailed {
          platform: name.clone(),
          code,
        }
        .into(),
      );
    }

    relocate(&build_dir, &destination).await?;
    info!(platform = %name, path = %destination.display(), "build output relocated");
    report.push(name, PlatformOutcome::Relocated { path: destination });
  }

  Ok(report)
}

async fn clear_dir(path: &Path) -> Result<(), MatrixError> {
  match tokio::fs::remove_dir_all(path).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(MatrixError::ClearBuildDir {
      path: path.to_path_buf(),
      source,
    }),
  }
}

/// Move `from` to `to`, copying across filesystems when a rename is refused.
async fn relocate(from: &Path, to: &Path) -> Result<(), MatrixError> {
  let err = |source: io::Error| MatrixError::Relocate {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  };

  if tokio::fs::rename(from, to).await.is_ok() {
    return Ok(());
  }

  let (src, dst) = (from.to_path_buf(), to.to_path_buf());
  tokio::task::spawn_blocking(move || copy_tree(&src, &dst).and_then(|()| std::fs::remove_dir_all(&src)))
    .await
    .map_err(io::Error::other)
    .and_then(|res| res)
    .map_err(err)
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
  for entry in WalkDir::new(from).follow_links(false) {
    let entry = entry.map_err(io::Error::other)?;
    let relative = entry.path().strip_prefix(from).map_err(io::Error::other)?;
    let target = to.join(relative);
    let file_type = entry.file_type();
    if file_type.is_dir() {
      std::fs::create_dir_all(&target)?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
    } else {
      std::fs::copy(entry.path(), &target)?;
    }
  }
  Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(std::fs::read_link(link)?, target)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> io::Result<()> {
  std::fs::copy(link, target).map(|_| ())
}
