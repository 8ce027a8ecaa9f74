//! Container execution.
//!
//! Runs a command in a fresh container of the platform's image as the
//! invoking user, with the workspace, the build-output directory and the
//! compile cache mounted read-write.
//!
//! GPU access is requested with `--gpus all` first. Engines that predate that
//! option exit with status 125, in which case the run is repeated exactly once
//! with the legacy `--runtime nvidia` flag. See [`GpuFlag`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::consts::{
  CCACHE_BASELINE_ENV, CONTAINER_BUILD_DIR, CONTAINER_CCACHE_DIR, CONTAINER_WORKSPACE, ENGINE_UNSUPPORTED_OPTION,
};
use crate::engine::{Engine, EngineCommand};
use crate::platform::{Catalog, Platform};
use crate::tag::{Tag, TagError, compute_tag};

/// Everything needed to run one command in a platform's container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
  pub platform: Platform,
  pub registry: String,
  pub gpu: bool,
  /// Value for `--shm-size`, e.g. `500m`.
  pub shared_memory_size: String,
  /// Host compile cache, mounted at `/work/ccache`.
  pub ccache_dir: PathBuf,
  /// Caller-supplied variables, overriding the compile-cache baseline.
  pub environment: BTreeMap<String, String>,
  pub command: Vec<String>,
  /// Log the invocation instead of executing it.
  pub dry_run: bool,
}

/// GPU request flag, a two-state machine.
///
/// Runs start in [`GpuFlag::Modern`]. The only transition is to
/// [`GpuFlag::Legacy`] when the engine rejects the modern flag; `Legacy` is
/// terminal, so at most one fallback run can ever happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuFlag {
  Modern,
  Legacy,
}

impl GpuFlag {
  pub fn args(self) -> [&'static str; 2] {
    match self {
      GpuFlag::Modern => ["--gpus", "all"],
      GpuFlag::Legacy => ["--runtime", "nvidia"],
    }
  }

  /// State to retry in after a run exited with `code`, if any.
  pub fn fallback(self, code: Option<i32>) -> Option<GpuFlag> {
    match (self, code) {
      (GpuFlag::Modern, Some(ENGINE_UNSUPPORTED_OPTION)) => Some(GpuFlag::Legacy),
      _ => None,
    }
  }
}

#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Tag(#[from] TagError),

  #[error("failed to create {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("container for {tag} was terminated by a signal")]
  Terminated { tag: Tag },
}

impl RunError {
  pub fn exit_status(&self) -> i32 {
    1
  }
}

/// Environment passed into the container.
///
/// Layers, lowest precedence first: the compile-cache baseline, host values of
/// the pass-through variables, then the caller's variables.
pub fn container_environment(config: &Config, caller: &BTreeMap<String, String>) -> BTreeMap<String, String> {
  let mut env: BTreeMap<String, String> = CCACHE_BASELINE_ENV
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
  env.extend(config.host_env.iter().map(|(k, v)| (k.clone(), v.clone())));
  env.extend(caller.iter().map(|(k, v)| (k.clone(), v.clone())));
  env
}

/// Full `run` invocation, with the GPU flag for `gpu` when requested.
pub fn run_command(config: &Config, descriptor: &RunDescriptor, tag: &Tag, gpu: Option<GpuFlag>) -> EngineCommand {
  let mut cmd = EngineCommand::new(&config.engine).arg("run");
  if let Some(flag) = gpu {
    cmd = cmd.args(flag.args());
  }

  cmd = cmd
    .args(["--cap-add", "SYS_PTRACE", "--rm"])
    .arg(format!("--shm-size={}", descriptor.shared_memory_size))
    .arg("-v")
    .arg(format!("{}:{}", config.root.display(), CONTAINER_WORKSPACE))
    .arg("-v")
    .arg(format!("{}:{}", config.build_dir().display(), CONTAINER_BUILD_DIR))
    .arg("-v")
    .arg(format!("{}:{}", descriptor.ccache_dir.display(), CONTAINER_CCACHE_DIR))
    .arg("-u")
    .arg(format!("{}:{}", config.user.uid, config.user.gid));

  for (key, value) in container_environment(config, &descriptor.environment) {
    cmd = cmd.arg("-e").arg(format!("{}={}", key, value));
  }

  cmd.arg(tag.as_str()).args(descriptor.command.iter().map(String::as_str))
}

async fn ensure_dir(path: PathBuf) -> Result<(), RunError> {
  // Created up front so the engine does not create them owned by root.
  tokio::fs::create_dir_all(&path)
    .await
    .map_err(|source| RunError::CreateDir { path, source })
}

/// Run `descriptor.command` in the platform's container and return its exit code.
pub async fn run_container<E: Engine>(
  config: &Config,
  engine: &E,
  catalog: &Catalog,
  descriptor: &RunDescriptor,
) -> Result<i32, RunError> {
  let tag = compute_tag(catalog, &descriptor.platform, &descriptor.registry)?;

  ensure_dir(config.build_dir()).await?;
  ensure_dir(descriptor.ccache_dir.clone()).await?;
  info!(path = %descriptor.ccache_dir.display(), "using ccache directory");

  let mut gpu = descriptor.gpu.then_some(GpuFlag::Modern);

  if descriptor.dry_run {
    let cmd = run_command(config, descriptor, &tag, gpu);
    info!("dry run, not executing:\n{}\n", cmd.render_multiline());
    return Ok(0);
  }

  loop {
    let cmd = run_command(config, descriptor, &tag, gpu);
    info!(command = ?descriptor.command, tag = %tag, "running in container");
    info!("executing command:\n{}\n", cmd.render_multiline());

    let code = engine.status(&cmd).await.map_err(|source| RunError::Spawn {
      program: cmd.program.clone(),
      source,
    })?;

    if let Some(next) = gpu.and_then(|flag| flag.fallback(code)) {
      warn!(code = ?code, "engine rejected --gpus, retrying with --runtime nvidia");
      gpu = Some(next);
      continue;
    }

    return code.ok_or(RunError::Terminated { tag });
  }
}
