//! Single-platform and matrix flows.

use dockbuild_lib::matrix::{MatrixOptions, PlatformOutcome, build_all};
use dockbuild_lib::pipeline::{BuildSettings, PlatformOptions, RunSettings, run_platform};
use dockbuild_lib::platform::{Arch, Catalog};

use super::common::{RecordingEngine, workspace};

#[tokio::test]
async fn single_platform_pulls_builds_and_runs() {
  let (_temp, config) = workspace();
  let catalog = Catalog::load(&config).unwrap();
  let platform = catalog.resolve("ubuntu_cpu").unwrap();
  let engine = RecordingEngine::default();
  let options = PlatformOptions {
    build: BuildSettings::default(),
    run: RunSettings::new(config.resolve_ccache_dir().unwrap()),
    build_only: false,
    run_only: false,
    print_docker_run: false,
    command: vec!["true".to_string()],
  };

  let code = run_platform(&config, &engine, &catalog, &platform, &options).await.unwrap();

  assert_eq!(code, 0);
  assert_eq!(engine.subcommands(), ["pull", "build", "images", "run"]);
  let commands = engine.commands.lock().unwrap();
  assert!(commands[1].args.contains(&"USER_ID=1234".to_string()));
  assert!(commands[3].args.contains(&"1234:5678".to_string()));
}

#[tokio::test]
async fn build_failure_carries_engine_status() {
  let (_temp, config) = workspace();
  let catalog = Catalog::load(&config).unwrap();
  let platform = catalog.resolve("ubuntu_cpu").unwrap();
  let engine = RecordingEngine::with_exit("build", 9);
  let options = PlatformOptions {
    build: BuildSettings {
      registry: String::new(),
      retries: 2,
      ..BuildSettings::default()
    },
    run: RunSettings::new(config.resolve_ccache_dir().unwrap()),
    build_only: false,
    run_only: false,
    print_docker_run: false,
    command: Vec::new(),
  };

  let err = run_platform(&config, &engine, &catalog, &platform, &options)
    .await
    .unwrap_err();

  assert_eq!(err.exit_status(), 9);
  assert_eq!(engine.subcommands(), ["build", "build"]);
}

#[tokio::test]
async fn matrix_on_arm_builds_only_arm_platforms() {
  let (_temp, config) = workspace();
  let catalog = Catalog::load(&config).unwrap();
  let engine = RecordingEngine::default();
  let options = MatrixOptions {
    arch: Arch::Aarch64,
    build: BuildSettings {
      registry: String::new(),
      ..BuildSettings::default()
    },
    run: RunSettings::new(config.resolve_ccache_dir().unwrap()),
    build_only: false,
  };

  let report = build_all(&config, &engine, &catalog, &options).await.unwrap();

  assert_eq!(report.platforms.len(), 1);
  assert_eq!(report.platforms[0].platform, "build.armv7");
  assert_eq!(report.platforms[0].outcome, PlatformOutcome::Relocated {
    path: config.platform_output_dir("armv7"),
  });
  assert!(config.platform_output_dir("armv7").is_dir());
}
