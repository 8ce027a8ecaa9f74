mod all;
mod build;
mod list;
mod tag;

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use tokio::runtime::Runtime;

use dockbuild_lib::config::Config;
use dockbuild_lib::pipeline::{BuildSettings, RunSettings};

use crate::{ContainerArgs, ImageArgs};

pub use all::cmd_all;
pub use build::{BuildRequest, cmd_build};
pub use list::cmd_list;
pub use tag::cmd_tag;

/// Process exit status for a failed command.
pub fn exit_status(err: &anyhow::Error) -> i32 {
  err
    .downcast_ref::<dockbuild_lib::Error>()
    .map(dockbuild_lib::Error::exit_status)
    .unwrap_or(1)
}

fn runtime() -> Result<Runtime> {
  Runtime::new().context("Failed to create async runtime")
}

fn build_settings(args: &ImageArgs) -> BuildSettings {
  BuildSettings {
    registry: args.registry.clone(),
    retries: args.retries,
    no_cache: args.no_cache,
    cache_intermediate: args.cache_intermediate,
  }
}

fn run_settings(config: &Config, args: &ContainerArgs) -> Result<RunSettings> {
  let ccache_dir = match &args.ccache_dir {
    Some(dir) => dir.clone(),
    None => config.resolve_ccache_dir()?,
  };
  let mut settings = RunSettings::new(ccache_dir);
  settings.gpu = args.gpu;
  settings.shared_memory_size = args.shm_size.clone();
  settings.environment = parse_environment(&args.environment, |name| std::env::var(name).ok())?;
  Ok(settings)
}

/// Parse `NAME=value` and bare `NAME` assignments; bare names are looked up with `host`.
pub fn parse_environment<F>(assignments: &[String], host: F) -> Result<BTreeMap<String, String>>
where
  F: Fn(&str) -> Option<String>,
{
  let mut env = BTreeMap::new();
  for assignment in assignments {
    let (name, value) = match assignment.split_once('=') {
      Some((name, value)) => (name, value.to_string()),
      None => match host(assignment) {
        Some(value) => (assignment.as_str(), value),
        None => bail!("environment variable '{}' is not set on the host", assignment),
      },
    };
    if name.is_empty() {
      bail!("invalid environment assignment '{}'", assignment);
    }
    env.insert(name.to_string(), value);
  }
  Ok(env)
}
