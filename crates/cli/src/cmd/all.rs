//! Implementation of the `dockbuild all` command.
//!
//! Builds every buildable platform of an architecture in sequence and prints
//! where each platform's output ended up.

use anyhow::{Context, Result};

use dockbuild_lib::config::Config;
use dockbuild_lib::engine::ProcessEngine;
use dockbuild_lib::matrix::{MatrixOptions, PlatformOutcome, build_all};
use dockbuild_lib::platform::{Arch, Catalog};

use super::{build_settings, run_settings, runtime};
use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};
use crate::{ContainerArgs, ImageArgs};

pub fn cmd_all(
  architecture: Option<&str>,
  build_only: bool,
  image: ImageArgs,
  container: ContainerArgs,
  output: OutputFormat,
) -> Result<()> {
  let config = Config::from_env()?;
  let catalog = Catalog::load(&config)?;
  let options = MatrixOptions {
    arch: architecture.map(Arch::parse).unwrap_or_else(Arch::current),
    build: build_settings(&image),
    run: run_settings(&config, &container)?,
    build_only,
  };

  let engine = ProcessEngine::new();
  let report = runtime()?
    .block_on(build_all(&config, &engine, &catalog, &options))
    .context("Matrix build failed")?;

  if output.is_json() {
    return print_json(&report);
  }

  println!();
  for result in &report.platforms {
    match &result.outcome {
      PlatformOutcome::Skipped { .. } => print_warning(&format!("{}: {}", result.platform, result.outcome)),
      outcome => print_success(&format!("{}: {}", result.platform, outcome)),
    }
  }
  println!();
  print_stat("Platforms", &report.platforms.len().to_string());
  print_stat("Skipped", &report.skipped().to_string());
  Ok(())
}
