//! Single-platform flow: cache load, image build, container run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::builder::{BuildDescriptor, build_image};
use crate::cache::load_cache;
use crate::config::Config;
use crate::consts::{DEFAULT_REGISTRY, DEFAULT_RETRIES, DEFAULT_SHM_SIZE};
use crate::engine::Engine;
use crate::error::Result;
use crate::platform::{Catalog, Platform};
use crate::runner::{RunDescriptor, run_container};
use crate::tag::compute_tag;

/// Image build settings shared by every platform of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
  pub registry: String,
  pub retries: u32,
  pub no_cache: bool,
  pub cache_intermediate: bool,
}

impl Default for BuildSettings {
  fn default() -> Self {
    Self {
      registry: DEFAULT_REGISTRY.to_string(),
      retries: DEFAULT_RETRIES,
      no_cache: false,
      cache_intermediate: false,
    }
  }
}

impl BuildSettings {
  pub fn descriptor(&self, platform: &Platform) -> BuildDescriptor {
    BuildDescriptor {
      platform: platform.clone(),
      registry: self.registry.clone(),
      retries: self.retries,
      no_cache: self.no_cache,
      cache_intermediate: self.cache_intermediate,
    }
  }
}

/// Container settings shared by every platform of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
  pub gpu: bool,
  pub shared_memory_size: String,
  pub ccache_dir: PathBuf,
  pub environment: BTreeMap<String, String>,
}

impl RunSettings {
  pub fn new(ccache_dir: PathBuf) -> Self {
    Self {
      gpu: false,
      shared_memory_size: DEFAULT_SHM_SIZE.to_string(),
      ccache_dir,
      environment: BTreeMap::new(),
    }
  }

  pub fn descriptor(&self, platform: &Platform, registry: &str, command: Vec<String>, dry_run: bool) -> RunDescriptor {
    RunDescriptor {
      platform: platform.clone(),
      registry: registry.to_string(),
      gpu: self.gpu,
      shared_memory_size: self.shared_memory_size.clone(),
      ccache_dir: self.ccache_dir.clone(),
      environment: self.environment.clone(),
      command,
      dry_run,
    }
  }
}

/// Options of a single-platform invocation.
#[derive(Debug, Clone)]
pub struct PlatformOptions {
  pub build: BuildSettings,
  pub run: RunSettings,
  /// Stop after the image is built.
  pub build_only: bool,
  /// Reuse the existing image without building.
  pub run_only: bool,
  /// Log the run invocation instead of executing it when no command is given.
  pub print_docker_run: bool,
  /// Command to run; empty selects the platform's default build.
  pub command: Vec<String>,
}

/// Load, build and run `platform`, returning the container's exit code.
pub async fn run_platform<E: Engine>(
  config: &Config,
  engine: &E,
  catalog: &Catalog,
  platform: &Platform,
  options: &PlatformOptions,
) -> Result<i32> {
  let registry = options.build.registry.as_str();
  let tag = compute_tag(catalog, platform, registry)?;
  load_cache(config, engine, platform, &tag, registry).await?;

  if options.run_only {
    info!("skipping docker build step");
  } else {
    let image = build_image(config, engine, catalog, &options.build.descriptor(platform)).await?;
    info!(image = %image, tag = %tag, "image ready");
  }

  if options.build_only {
    warn!("container was just built, exiting due to build-only");
    return Ok(0);
  }

  let (command, dry_run) = if !options.command.is_empty() {
    (options.command.clone(), false)
  } else if options.print_docker_run {
    (Vec::new(), true)
  } else {
    let command = platform.default_command();
    info!(command = %command.join(" "), "no command specified, trying default build");
    (command, false)
  };

  let descriptor = options.run.descriptor(platform, registry, command, dry_run);
  let code = run_container(config, engine, catalog, &descriptor).await?;
  if code != 0 {
    error!(command = ?descriptor.command, code, "execution failed");
  }
  Ok(code)
}
