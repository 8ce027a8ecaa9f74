//! Image construction.
//!
//! Builds the image for a platform with the invoking user's uid/gid baked in,
//! retrying failed engine invocations immediately, then resolves the local
//! image id through the computed tag.

use std::fmt;

use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::consts::REGISTRY_VAR;
use crate::engine::{Engine, EngineCommand};
use crate::platform::{Catalog, Platform};
use crate::retry::retry;
use crate::tag::{Tag, TagError, compute_tag};

/// Everything needed to build one platform's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
  pub platform: Platform,
  pub registry: String,
  /// Total number of build attempts.
  pub retries: u32,
  /// Ignore every cached layer.
  pub no_cache: bool,
  /// Keep intermediate containers and skip the registry cache source.
  pub cache_intermediate: bool,
}

/// Local image id as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageId(pub String);

impl fmt::Display for ImageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Tag(#[from] TagError),

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("building {tag} failed on attempt {attempt} (exit code {code:?})")]
  EngineFailed {
    tag: Tag,
    attempt: u32,
    code: Option<i32>,
  },

  #[error("looking up image {tag} failed (exit code {code:?})")]
  LookupFailed { tag: Tag, code: Option<i32> },

  #[error("build of {tag} reported success but no image matches the tag")]
  ImageNotFound { tag: Tag },
}

impl BuildError {
  /// Process exit status for this failure.
  pub fn exit_status(&self) -> i32 {
    match self {
      BuildError::EngineFailed { code: Some(code), .. } | BuildError::LookupFailed { code: Some(code), .. } => *code,
      _ => 1,
    }
  }
}

/// Engine invocation that builds `descriptor.platform` as `tag`.
pub fn build_command(config: &Config, descriptor: &BuildDescriptor, tag: &Tag) -> EngineCommand {
  let user_args = [
    "--build-arg".to_string(),
    format!("USER_ID={}", config.user.uid),
    "--build-arg".to_string(),
    format!("GROUP_ID={}", config.user.gid),
  ];

  let cmd = match &descriptor.platform {
    Platform::Compose { service, .. } => {
      let mut cmd = EngineCommand::new(&config.compose)
        .arg("-f")
        .arg(config.compose_file().to_string_lossy())
        .arg("build")
        .args(user_args);
      if descriptor.no_cache {
        cmd = cmd.arg("--no-cache");
      }
      if descriptor.cache_intermediate {
        cmd = cmd.arg("--no-rm");
      }
      cmd.arg(service.as_str())
    }
    Platform::Dockerfile { dockerfile, .. } => {
      let mut cmd = EngineCommand::new(&config.engine)
        .arg("build")
        .arg("-f")
        .arg(dockerfile.to_string_lossy())
        .args(user_args);
      if descriptor.no_cache {
        cmd = cmd.arg("--no-cache");
      }
      // --cache-from hides local layers, so it cannot be combined with keeping them.
      if descriptor.cache_intermediate {
        cmd = cmd.arg("--rm=false");
      } else if !descriptor.registry.is_empty() {
        cmd = cmd.args(["--cache-from", tag.as_str()]);
      }
      cmd
        .args(["-t", tag.as_str()])
        .arg(config.docker_dir.to_string_lossy())
    }
  };

  cmd.env(REGISTRY_VAR, descriptor.registry.as_str())
}

/// Build the image described by `descriptor` and return its local id.
pub async fn build_image<E: Engine>(
  config: &Config,
  engine: &E,
  catalog: &Catalog,
  descriptor: &BuildDescriptor,
) -> Result<ImageId, BuildError> {
  let tag = compute_tag(catalog, &descriptor.platform, &descriptor.registry)?;
  let cmd = build_command(config, descriptor, &tag);
  info!(tag = %tag, platform = %descriptor.platform, "building docker container");

  retry(
    descriptor.retries,
    |e: &BuildError| matches!(e, BuildError::EngineFailed { .. }),
    |attempt| {
      let (cmd, tag) = (&cmd, &tag);
      async move {
        info!(command = %cmd, attempt, "running command");
        let code = engine.status(cmd).await.map_err(|source| BuildError::Spawn {
          program: cmd.program.clone(),
          source,
        })?;
        match code {
          Some(0) => Ok(()),
          code => Err(BuildError::EngineFailed {
            tag: tag.clone(),
            attempt,
            code,
          }),
        }
      }
    },
  )
  .await?;

  local_image_id(config, engine, &tag).await
}

/// Id of the local image carrying `tag`.
pub async fn local_image_id<E: Engine>(config: &Config, engine: &E, tag: &Tag) -> Result<ImageId, BuildError> {
  let cmd = EngineCommand::new(&config.engine).args(["images", "-q", tag.as_str()]);
  let output = engine.output(&cmd).await.map_err(|source| BuildError::Spawn {
    program: cmd.program.clone(),
    source,
  })?;
  if !output.success() {
    return Err(BuildError::LookupFailed {
      tag: tag.clone(),
      code: output.code,
    });
  }

  match output.stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
    Some(id) => Ok(ImageId(id.to_string())),
    None => Err(BuildError::ImageNotFound { tag: tag.clone() }),
  }
}
