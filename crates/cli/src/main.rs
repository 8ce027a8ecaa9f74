mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dockbuild_lib::consts::{DEFAULT_REGISTRY, DEFAULT_RETRIES, DEFAULT_SHM_SIZE};

use crate::output::{OutputFormat, print_error};

/// dockbuild - build and run containerized build environments
#[derive(Parser)]
#[command(name = "dockbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Image build options shared by `build` and `all`.
#[derive(Args, Debug, Clone)]
pub struct ImageArgs {
  /// Registry to pull cached images from; empty disables the cache
  #[arg(short = 'd', long = "docker-registry", default_value = DEFAULT_REGISTRY)]
  pub registry: String,

  /// Number of times to attempt building the image
  #[arg(short = 'r', long = "docker-build-retries", default_value_t = DEFAULT_RETRIES)]
  pub retries: u32,

  /// Pass --no-cache to the image build
  #[arg(long)]
  pub no_cache: bool,

  /// Keep intermediate containers of the image build
  #[arg(long)]
  pub cache_intermediate: bool,
}

/// Container options shared by `build` and `all`.
#[derive(Args, Debug, Clone)]
pub struct ContainerArgs {
  /// Request GPU access for the container
  #[arg(short = 'n', long = "nvidiadocker")]
  pub gpu: bool,

  /// Size of /dev/shm inside the container (e.g. 1g)
  #[arg(long, default_value = DEFAULT_SHM_SIZE)]
  pub shm_size: String,

  /// Compile cache directory on the host
  #[arg(long)]
  pub ccache_dir: Option<PathBuf>,

  /// Container environment variable, NAME=value or NAME to copy from the host
  #[arg(short = 'e', long = "environment", value_name = "NAME[=VALUE]")]
  pub environment: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
  /// List the platforms available for an architecture
  List {
    /// Architecture to list platforms for (default: this machine)
    #[arg(short = 'A', long)]
    architecture: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print the image tag of a platform
  Tag {
    /// Platform name, with or without the build. prefix
    platform: String,

    #[arg(short = 'd', long = "docker-registry", default_value = DEFAULT_REGISTRY)]
    registry: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Build one platform's image and run a command in it
  Build {
    /// Platform to build
    #[arg(short, long)]
    platform: String,

    /// Only build the image, don't run anything
    #[arg(short, long)]
    build_only: bool,

    /// Only run the container, don't rebuild the image
    #[arg(short = 'R', long)]
    run_only: bool,

    /// Print the container run command instead of executing the default build
    #[arg(long)]
    print_docker_run: bool,

    #[command(flatten)]
    image: ImageArgs,

    #[command(flatten)]
    container: ContainerArgs,

    /// Command to run in the container (default: the platform's build function)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
  },

  /// Build every platform of an architecture and collect the outputs
  All {
    /// Architecture to build (default: this machine)
    #[arg(short = 'A', long)]
    architecture: Option<String>,

    /// Only build the images, don't run the builds
    #[arg(short, long)]
    build_only: bool,

    #[command(flatten)]
    image: ImageArgs,

    #[command(flatten)]
    container: ContainerArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn init_logging(verbose: bool) {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::List { architecture, output } => cmd::cmd_list(architecture.as_deref(), output).map(|()| 0),
    Commands::Tag {
      platform,
      registry,
      output,
    } => cmd::cmd_tag(&platform, &registry, output).map(|()| 0),
    Commands::Build {
      platform,
      build_only,
      run_only,
      print_docker_run,
      image,
      container,
      command,
    } => cmd::cmd_build(cmd::BuildRequest {
      platform,
      build_only,
      run_only,
      print_docker_run,
      image,
      container,
      command,
    }),
    Commands::All {
      architecture,
      build_only,
      image,
      container,
      output,
    } => cmd::cmd_all(architecture.as_deref(), build_only, image, container, output).map(|()| 0),
  };

  match result {
    Ok(code) => exit_code(code),
    Err(e) => {
      print_error(&format!("{:#}", e));
      exit_code(cmd::exit_status(&e))
    }
  }
}

fn exit_code(code: i32) -> ExitCode {
  ExitCode::from(u8::try_from(code).unwrap_or(1))
}
