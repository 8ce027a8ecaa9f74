//! Tag determinism across catalogs and registries.

use dockbuild_lib::platform::Catalog;
use dockbuild_lib::tag::compute_tag;

use super::common::workspace;

#[test]
fn independent_workspaces_agree() {
  let (_a, first) = workspace();
  let (_b, second) = workspace();

  let tag = |config| {
    let catalog = Catalog::load(config).unwrap();
    let platform = catalog.resolve("ubuntu_cpu").unwrap();
    compute_tag(&catalog, &platform, "mxnetci").unwrap()
  };

  assert_eq!(tag(&first), tag(&second));
}

#[test]
fn copied_file_changes_the_digest() {
  let (_temp, config) = workspace();
  let catalog = Catalog::load(&config).unwrap();
  let platform = catalog.resolve("ubuntu_cpu").unwrap();
  let before = compute_tag(&catalog, &platform, "").unwrap();

  std::fs::write(config.docker_dir.join("install/deps.sh"), "apt-get install -y cmake ninja\n").unwrap();
  let after = compute_tag(&catalog, &platform, "").unwrap();

  assert!(before.as_str().starts_with("mxnet_local:build.ubuntu_cpu-"));
  assert_ne!(before, after);
}
