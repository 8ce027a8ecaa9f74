//! Token login for managed registries.
//!
//! Registries whose host contains `dkr.ecr` require a short-lived password
//! obtained from the AWS CLI before anything can be pulled.

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::consts::MANAGED_REGISTRY_MARKER;
use crate::engine::{Engine, EngineCommand};

#[derive(Debug, Error)]
pub enum LoginError {
  #[error("cannot determine region of registry '{0}'")]
  UnknownRegion(String),

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("`{command}` failed with exit code {code:?}")]
  Failed { command: String, code: Option<i32> },
}

pub fn is_managed_registry(registry: &str) -> bool {
  registry.contains(MANAGED_REGISTRY_MARKER)
}

/// Host part of a registry reference.
pub fn registry_host(registry: &str) -> &str {
  registry.split('/').next().unwrap_or(registry)
}

/// Region of a `<account>.dkr.ecr.<region>.amazonaws.com` host.
pub fn ecr_region(registry: &str) -> Option<&str> {
  let mut parts = registry_host(registry).split('.');
  parts.by_ref().find(|part| *part == "ecr")?;
  parts.next().filter(|region| !region.is_empty())
}

/// Log the container engine into a managed registry.
pub async fn login<E: Engine>(config: &Config, engine: &E, registry: &str) -> Result<(), LoginError> {
  let region = ecr_region(registry).ok_or_else(|| LoginError::UnknownRegion(registry.to_string()))?;
  let host = registry_host(registry);
  info!(registry = %host, region, "logging into managed registry");

  let password_cmd = EngineCommand::new("aws").args(["ecr", "get-login-password", "--region", region]);
  let password = engine.output(&password_cmd).await.map_err(|source| LoginError::Spawn {
    program: password_cmd.program.clone(),
    source,
  })?;
  if !password.success() {
    return Err(LoginError::Failed {
      command: password_cmd.to_string(),
      code: password.code,
    });
  }

  let login_cmd = EngineCommand::new(&config.engine)
    .args(["login", "--username", "AWS", "--password-stdin", host])
    .stdin(password.stdout);
  let code = engine.status(&login_cmd).await.map_err(|source| LoginError::Spawn {
    program: login_cmd.program.clone(),
    source,
  })?;
  if code != Some(0) {
    return Err(LoginError::Failed {
      command: login_cmd.to_string(),
      code,
    });
  }
  Ok(())
}
