//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in engine: appends its arguments to `$FAKE_DOCKER_LOG`, reports an
/// image id for `images` and exits with `$FAKE_RUN_EXIT` for `run`.
const FAKE_DOCKER: &str = r#"#!/bin/sh
echo "$@" >> "$FAKE_DOCKER_LOG"
case "$1" in
  images) echo feedfacecafe ;;
  run) exit "${FAKE_RUN_EXIT:-0}" ;;
esac
exit 0
"#;

const COMPOSE: &str = r#"
version: "3"
services:
  centos7_cpu:
    image: ${DOCKER_CACHE_REGISTRY}/build.centos7_cpu:latest
    build:
      context: .
      dockerfile: Dockerfile.build.centos7
"#;

/// Isolated workspace.
///
/// Layout: `<temp>/mxnet` is the workspace root, `<temp>/bin/docker` the fake
/// engine, `<temp>/ccache` the compile cache.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("mxnet/ci/docker/Dockerfile.build.ubuntu_cpu", "FROM ubuntu:18.04\nCOPY install/deps.sh /work/\n");
    env.write_file("mxnet/ci/docker/install/deps.sh", "apt-get install -y cmake\n");
    env.write_file("mxnet/ci/docker/Dockerfile.build.armv7", "FROM dockcross/linux-armv7\n");
    env.write_file("mxnet/ci/docker/Dockerfile.publish.armv7", "FROM arm32v7/ubuntu\n");
    env.write_file("mxnet/ci/docker/Dockerfile.build.centos7", "FROM centos:7\n");
    env.write_file("mxnet/ci/docker/docker-compose.yml", COMPOSE);
    env.install_fake_docker();
    env
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  #[cfg(unix)]
  fn install_fake_docker(&self) {
    use std::os::unix::fs::PermissionsExt;

    self.write_file("bin/docker", FAKE_DOCKER);
    let path = self.docker_path();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
  }

  #[cfg(not(unix))]
  fn install_fake_docker(&self) {}

  pub fn root(&self) -> PathBuf {
    self.temp.path().join("mxnet")
  }

  pub fn docker_path(&self) -> PathBuf {
    self.temp.path().join("bin/docker")
  }

  pub fn log_path(&self) -> PathBuf {
    self.temp.path().join("docker.log")
  }

  /// Engine invocations so far, one per line.
  pub fn engine_log(&self) -> Vec<String> {
    match std::fs::read_to_string(self.log_path()) {
      Ok(log) => log.lines().map(str::to_string).collect(),
      Err(_) => Vec::new(),
    }
  }

  pub fn output_dir(&self, short_name: &str) -> PathBuf {
    self.temp.path().join(format!("mxnet_build_{}", short_name))
  }

  /// A dockbuild command wired to this workspace and the fake engine.
  pub fn dockbuild_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("dockbuild");
    cmd
      .env("DOCKBUILD_ROOT", self.root())
      .env("DOCKBUILD_DOCKER", self.docker_path())
      .env("DOCKBUILD_COMPOSE", self.docker_path())
      .env("CCACHE_DIR", self.temp.path().join("ccache"))
      .env("FAKE_DOCKER_LOG", self.log_path())
      .env_remove("RUST_LOG");
    cmd
  }
}
