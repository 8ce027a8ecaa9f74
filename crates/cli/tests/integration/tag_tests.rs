//! Tag command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

fn tag_of(env: &TestEnv, args: &[&str]) -> String {
  let output = env.dockbuild_cmd().arg("tag").args(args).output().unwrap();
  assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
  String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn tag_is_stable_across_invocations() {
  let env = TestEnv::new();

  let first = tag_of(&env, &["ubuntu_cpu"]);
  let second = tag_of(&env, &["build.ubuntu_cpu"]);

  assert_eq!(first, second);
  assert!(first.starts_with("mxnetci:build.ubuntu_cpu-"));
  assert_eq!(first.len(), "mxnetci:build.ubuntu_cpu-".len() + 12);
}

#[test]
fn empty_registry_uses_local_placeholder() {
  let env = TestEnv::new();
  assert!(tag_of(&env, &["ubuntu_cpu", "-d", ""]).starts_with("mxnet_local:build.ubuntu_cpu-"));
}

#[test]
fn copied_file_edit_changes_tag() {
  let env = TestEnv::new();
  let before = tag_of(&env, &["ubuntu_cpu"]);

  env.write_file("mxnet/ci/docker/install/deps.sh", "apt-get install -y cmake ninja-build\n");

  assert_ne!(before, tag_of(&env, &["ubuntu_cpu"]));
}

#[test]
fn compose_platform_uses_declared_image() {
  let env = TestEnv::new();

  env
    .dockbuild_cmd()
    .args(["tag", "centos7_cpu", "-d", "registry.example.com"])
    .assert()
    .success()
    .stdout(predicate::str::diff("registry.example.com/build.centos7_cpu:latest\n"));
}
