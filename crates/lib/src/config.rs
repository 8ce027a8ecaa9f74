//! Process-wide configuration.
//!
//! A [`Config`] is assembled once at startup from the environment and then
//! passed by reference through every operation. Nothing below the CLI reads
//! environment variables, the working directory or the invoking user itself.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::consts::{COMPOSE_FILE, PASSTHROUGH_ENV};

pub const ROOT_ENV: &str = "DOCKBUILD_ROOT";
pub const ENGINE_ENV: &str = "DOCKBUILD_DOCKER";
pub const COMPOSE_ENV: &str = "DOCKBUILD_COMPOSE";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to determine current directory: {0}")]
  CurrentDir(#[source] std::io::Error),

  #[error("workspace root {path} does not exist")]
  MissingRoot { path: PathBuf },

  #[error("HOME is not set, cannot pick a compile cache directory")]
  NoHome,
}

/// Numeric identity of the invoking user, forwarded to builds and runs so
/// files written inside the container stay owned by that user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIds {
  pub uid: u32,
  pub gid: u32,
}

impl UserIds {
  #[cfg(unix)]
  pub fn current() -> Self {
    Self {
      uid: rustix::process::getuid().as_raw(),
      gid: rustix::process::getgid().as_raw(),
    }
  }

  #[cfg(not(unix))]
  pub fn current() -> Self {
    Self { uid: 0, gid: 0 }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  /// Top-level workspace, mounted read-write into every container.
  pub root: PathBuf,
  /// Directory holding the `Dockerfile.*` definitions and the compose descriptor.
  pub docker_dir: PathBuf,
  /// Container engine binary.
  pub engine: String,
  /// Compose binary.
  pub compose: String,
  pub user: UserIds,
  /// Host values of the variables forwarded into containers.
  pub host_env: BTreeMap<String, String>,
  /// Compile-object cache pinned for every run. When unset,
  /// [`Config::resolve_ccache_dir`] falls back to [`default_ccache_dir`].
  pub ccache_dir: Option<PathBuf>,
}

impl Config {
  /// Configuration rooted at `root` with default tool names and no host state.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    Self {
      docker_dir: root.join("ci").join("docker"),
      ccache_dir: None,
      root,
      engine: "docker".to_string(),
      compose: "docker-compose".to_string(),
      user: UserIds::current(),
      host_env: BTreeMap::new(),
    }
  }

  /// Build the configuration from the process environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    let root = match std::env::var_os(ROOT_ENV) {
      Some(root) => PathBuf::from(root),
      None => std::env::current_dir().map_err(ConfigError::CurrentDir)?,
    };
    if !root.is_dir() {
      return Err(ConfigError::MissingRoot { path: root });
    }
    let root = dunce::canonicalize(&root).unwrap_or(root);

    let mut config = Self::new(root);
    if let Ok(engine) = std::env::var(ENGINE_ENV) {
      config.engine = engine;
    }
    if let Ok(compose) = std::env::var(COMPOSE_ENV) {
      config.compose = compose;
    }
    config.host_env = PASSTHROUGH_ENV
      .iter()
      .filter_map(|key| std::env::var(key).ok().map(|value| (key.to_string(), value)))
      .collect();
    debug!(root = %config.root.display(), engine = %config.engine, "configuration loaded");
    Ok(config)
  }

  /// Compile-object cache directory for container runs.
  ///
  /// Only resolved when a container is about to run, so commands that never
  /// run one do not create `CCACHE_DIR` or require `HOME`.
  pub fn resolve_ccache_dir(&self) -> Result<PathBuf, ConfigError> {
    match &self.ccache_dir {
      Some(dir) => Ok(dir.clone()),
      None => default_ccache_dir(),
    }
  }

  pub fn compose_file(&self) -> PathBuf {
    self.docker_dir.join(COMPOSE_FILE)
  }

  /// Shared build-output directory, mounted at `/work/build`.
  pub fn build_dir(&self) -> PathBuf {
    self.root.join("build")
  }

  /// Sibling of the workspace that receives one platform's matrix output.
  pub fn platform_output_dir(&self, short_name: &str) -> PathBuf {
    let parent = self.root.parent().unwrap_or(&self.root);
    parent.join(format!("mxnet_build_{}", short_name))
  }
}

/// Pick the compile cache directory shared across containers.
///
/// Prefers a creatable `CCACHE_DIR`, then a fixed temp location on macOS
/// (the default temp dir is not mountable there), then `~/.ccache`.
pub fn default_ccache_dir() -> Result<PathBuf, ConfigError> {
  if let Some(dir) = std::env::var_os("CCACHE_DIR") {
    let dir = PathBuf::from(dir);
    match std::fs::create_dir_all(&dir) {
      Ok(()) => return Ok(dunce::canonicalize(&dir).unwrap_or(dir)),
      Err(e) => info!(path = %dir.display(), error = %e, "unable to create ccache dir, falling back"),
    }
  }

  if cfg!(target_os = "macos") {
    let dir = Path::new("/tmp/_mxnet_ccache");
    if std::fs::create_dir_all(dir).is_ok() {
      return Ok(dir.to_path_buf());
    }
  }

  let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
  Ok(PathBuf::from(home).join(".ccache"))
}
