//! List command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn x86_list_hides_arm_platforms() {
  let env = TestEnv::new();

  env
    .dockbuild_cmd()
    .args(["list", "-A", "x86_64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("build.ubuntu_cpu"))
    .stdout(predicate::str::contains("build.centos7_cpu"))
    .stdout(predicate::str::contains("armv7").not());
}

#[test]
fn compose_dockerfiles_are_not_listed() {
  let env = TestEnv::new();

  env
    .dockbuild_cmd()
    .args(["list", "-A", "x86_64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("build.centos7\n").not());
}

#[test]
fn json_output_names_architecture() {
  let env = TestEnv::new();

  let output = env
    .dockbuild_cmd()
    .args(["list", "-A", "aarch64", "--output", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["architecture"], "aarch64");
  assert_eq!(json["platforms"], serde_json::json!(["build.armv7", "publish.armv7"]));
}
