//! Matrix command integration tests.
#![cfg(unix)]

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn build_only_matrix_never_runs() {
  let env = TestEnv::new();

  env
    .dockbuild_cmd()
    .args(["all", "-A", "x86_64", "-d", "", "--build-only"])
    .assert()
    .success()
    .stdout(predicate::str::contains("build.ubuntu_cpu: built"));

  assert!(env.engine_log().iter().all(|l| !l.starts_with("run ")));
  assert!(!env.output_dir("ubuntu_cpu").exists());
}

#[test]
fn arm_matrix_relocates_output() {
  let env = TestEnv::new();

  env
    .dockbuild_cmd()
    .args(["all", "-A", "aarch64", "-d", ""])
    .assert()
    .success()
    .stdout(predicate::str::contains("build.armv7"));

  assert!(env.output_dir("armv7").is_dir());
  assert!(!env.root().join("build").exists());
  let runs: Vec<String> = env.engine_log().into_iter().filter(|l| l.starts_with("run ")).collect();
  assert_eq!(runs.len(), 1);
  assert!(runs[0].ends_with("build_armv7"));
}

#[test]
fn rerun_skips_existing_output() {
  let env = TestEnv::new();
  std::fs::create_dir_all(env.output_dir("armv7")).unwrap();

  env
    .dockbuild_cmd()
    .args(["all", "-A", "aarch64", "-d", "", "--output", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"status\": \"skipped\""));

  assert!(env.engine_log().iter().all(|l| !l.starts_with("run ")));
}
