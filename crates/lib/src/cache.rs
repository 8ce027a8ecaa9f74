//! Best-effort retrieval of previously built images.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::consts::REGISTRY_VAR;
use crate::engine::{Engine, EngineCommand};
use crate::platform::Platform;
use crate::registry;
use crate::tag::Tag;

/// Result of a cache load that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
  /// No registry configured.
  Disabled,
  /// The image is now available locally.
  Pulled,
  /// Nothing usable was retrieved; the build starts from scratch.
  Miss { reason: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to pull compose service '{service}' (exit code {code:?})")]
  PullFailed { service: String, code: Option<i32> },

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },
}

impl CacheError {
  pub fn exit_status(&self) -> i32 {
    match self {
      CacheError::PullFailed { code: Some(code), .. } => *code,
      _ => 1,
    }
  }
}

/// Load the cached image for `platform` from `registry`.
///
/// Dockerfile-based platforms never fail here: any problem is logged and
/// reported as [`CacheOutcome::Miss`]. Compose-based platforms have no local
/// fallback, so a failed pull is returned as an error. Managed registries
/// are logged into before either pull; a failed login is only logged.
pub async fn load_cache<E: Engine>(
  config: &Config,
  engine: &E,
  platform: &Platform,
  tag: &Tag,
  registry: &str,
) -> Result<CacheOutcome, CacheError> {
  if registry.is_empty() {
    info!("distributed docker cache disabled");
    return Ok(CacheOutcome::Disabled);
  }

  if registry::is_managed_registry(registry)
    && let Err(e) = registry::login(config, engine, registry).await
  {
    warn!(registry, error = %e, "unable to log into registry");
  }

  match platform {
    Platform::Compose { service, .. } => {
      let compose_file = config.compose_file();
      let cmd = EngineCommand::new(&config.compose)
        .arg("-f")
        .arg(compose_file.to_string_lossy())
        .args(["pull", "--quiet", service.as_str()])
        .env(REGISTRY_VAR, registry);
      info!(command = %cmd, "running command");
      let code = engine.status(&cmd).await.map_err(|source| CacheError::Spawn {
        program: cmd.program.clone(),
        source,
      })?;
      if code != Some(0) {
        return Err(CacheError::PullFailed {
          service: service.clone(),
          code,
        });
      }
      Ok(CacheOutcome::Pulled)
    }

    Platform::Dockerfile { .. } => {
      info!(registry, tag = %tag, "docker cache download is enabled");
      let cmd = EngineCommand::new(&config.engine).args(["pull", tag.as_str()]);
      let reason = match engine.status(&cmd).await {
        Ok(Some(0)) => {
          info!(tag = %tag, "loaded image from cache");
          return Ok(CacheOutcome::Pulled);
        }
        Ok(code) => format!("`{}` exited with {:?}", cmd, code),
        Err(e) => format!("failed to run {}: {}", cmd.program, e),
      };
      warn!(tag = %tag, reason = %reason, "unable to retrieve docker cache, continuing without");
      Ok(CacheOutcome::Miss { reason })
    }
  }
}
