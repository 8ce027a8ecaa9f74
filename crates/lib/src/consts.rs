//! Fixed names, paths and limits shared across the crate.

/// Name substituted for an empty registry when tagging dockerfile-based images.
pub const LOCAL_REGISTRY: &str = "mxnet_local";

/// Placeholder token in compose image names, also exported to compose and build invocations.
pub const REGISTRY_VAR: &str = "DOCKER_CACHE_REGISTRY";
pub const REGISTRY_PLACEHOLDER: &str = "${DOCKER_CACHE_REGISTRY}";

pub const DEFAULT_REGISTRY: &str = "mxnetci";
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_SHM_SIZE: &str = "500m";

pub const COMPOSE_FILE: &str = "docker-compose.yml";
pub const DOCKERFILE_PREFIX: &str = "Dockerfile.";
pub const BUILD_PREFIX: &str = "build.";
pub const PUBLISH_PREFIX: &str = "publish.";

/// Substrings that mark a platform as an ARM variant.
pub const ARM_KEYWORDS: &[&str] = &["aarch64", "armv"];

/// Read size used when streaming files into the tag digest.
pub const HASH_CHUNK_SIZE: usize = 16384;
/// Number of hex characters of the digest kept in a tag.
pub const TAG_DIGEST_LEN: usize = 12;

/// Exit status the engine reports for an unrecognized `run` option.
pub const ENGINE_UNSUPPORTED_OPTION: i32 = 125;

pub const CONTAINER_WORKSPACE: &str = "/work/mxnet";
pub const CONTAINER_BUILD_DIR: &str = "/work/build";
pub const CONTAINER_CCACHE_DIR: &str = "/work/ccache";

pub const RUNTIME_FUNCTIONS: &str = "/work/mxnet/ci/docker/runtime_functions.sh";

/// Host variables forwarded into the container when set.
pub const PASSTHROUGH_ENV: &[&str] = &["CCACHE_MAXSIZE"];

/// Baseline compile-cache environment injected into every container.
pub const CCACHE_BASELINE_ENV: &[(&str, &str)] = &[
  ("CCACHE_MAXSIZE", "500G"),
  ("CCACHE_TEMPDIR", "/tmp/ccache"),
  ("CCACHE_DIR", CONTAINER_CCACHE_DIR),
  ("CCACHE_LOGFILE", "/tmp/ccache.log"),
];

/// Host fragment identifying a registry that needs token login.
pub const MANAGED_REGISTRY_MARKER: &str = "dkr.ecr";
