//! Implementation of the `dockbuild build` command.

use anyhow::Result;
use tracing::info;

use dockbuild_lib::config::Config;
use dockbuild_lib::engine::ProcessEngine;
use dockbuild_lib::pipeline::{PlatformOptions, run_platform};
use dockbuild_lib::platform::Catalog;

use super::{build_settings, run_settings, runtime};
use crate::{ContainerArgs, ImageArgs};

pub struct BuildRequest {
  pub platform: String,
  pub build_only: bool,
  pub run_only: bool,
  pub print_docker_run: bool,
  pub image: ImageArgs,
  pub container: ContainerArgs,
  pub command: Vec<String>,
}

/// Build and run a single platform, returning the container's exit code.
pub fn cmd_build(request: BuildRequest) -> Result<i32> {
  let config = Config::from_env()?;
  let catalog = Catalog::load(&config)?;
  let platform = catalog.resolve(&request.platform)?;
  info!(platform = %platform, compose = platform.is_compose(), "selected platform");

  let options = PlatformOptions {
    build: build_settings(&request.image),
    run: run_settings(&config, &request.container)?,
    build_only: request.build_only,
    run_only: request.run_only,
    print_docker_run: request.print_docker_run,
    command: request.command,
  };

  let engine = ProcessEngine::new();
  let code = runtime()?.block_on(run_platform(&config, &engine, &catalog, &platform, &options))?;
  Ok(code)
}
