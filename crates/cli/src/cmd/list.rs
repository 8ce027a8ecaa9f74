//! Implementation of the `dockbuild list` command.

use anyhow::{Context, Result};

use dockbuild_lib::config::Config;
use dockbuild_lib::platform::{Arch, Catalog};

use crate::output::{OutputFormat, print_json};

/// Print the platforms available for `architecture`, one per line.
pub fn cmd_list(architecture: Option<&str>, output: OutputFormat) -> Result<()> {
  let config = Config::from_env()?;
  let arch = architecture.map(Arch::parse).unwrap_or_else(Arch::current);
  let catalog = Catalog::load(&config).context("Failed to load platform catalog")?;
  let platforms = catalog.enumerate(&arch)?;

  if output.is_json() {
    print_json(&serde_json::json!({ "architecture": arch.as_str(), "platforms": platforms }))?;
  } else {
    for platform in platforms {
      println!("{}", platform);
    }
  }
  Ok(())
}
