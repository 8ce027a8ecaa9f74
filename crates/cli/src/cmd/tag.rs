//! Implementation of the `dockbuild tag` command.

use anyhow::{Context, Result};

use dockbuild_lib::config::Config;
use dockbuild_lib::platform::Catalog;
use dockbuild_lib::tag::compute_tag;

use crate::output::{OutputFormat, print_json};

pub fn cmd_tag(platform: &str, registry: &str, output: OutputFormat) -> Result<()> {
  let config = Config::from_env()?;
  let catalog = Catalog::load(&config).context("Failed to load platform catalog")?;
  let platform = catalog.resolve(platform)?;
  let tag = compute_tag(&catalog, &platform, registry)?;

  if output.is_json() {
    print_json(&serde_json::json!({ "platform": platform.name(), "tag": tag }))?;
  } else {
    println!("{}", tag);
  }
  Ok(())
}
