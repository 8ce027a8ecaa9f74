//! Shared helpers for library integration tests.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use dockbuild_lib::config::{Config, UserIds};
use dockbuild_lib::engine::{CommandOutput, Engine, EngineCommand};
use tempfile::TempDir;

/// Engine that records commands and answers from a per-subcommand exit code table.
#[derive(Default)]
pub struct RecordingEngine {
  pub commands: Mutex<Vec<EngineCommand>>,
  pub exit_codes: HashMap<&'static str, i32>,
}

impl RecordingEngine {
  pub fn with_exit(subcommand: &'static str, code: i32) -> Self {
    let mut engine = Self::default();
    engine.exit_codes.insert(subcommand, code);
    engine
  }

  pub fn subcommands(&self) -> Vec<String> {
    self
      .commands
      .lock()
      .unwrap()
      .iter()
      .map(|c| subcommand(c).to_string())
      .collect()
  }

  fn code_for(&self, command: &EngineCommand) -> i32 {
    self.exit_codes.get(subcommand(command)).copied().unwrap_or(0)
  }
}

fn subcommand(command: &EngineCommand) -> &str {
  let mut args = command.args.iter();
  while let Some(arg) = args.next() {
    if arg == "-f" {
      args.next();
    } else if !arg.starts_with('-') {
      return arg;
    }
  }
  ""
}

impl Engine for RecordingEngine {
  async fn status(&self, command: &EngineCommand) -> io::Result<Option<i32>> {
    self.commands.lock().unwrap().push(command.clone());
    Ok(Some(self.code_for(command)))
  }

  async fn output(&self, command: &EngineCommand) -> io::Result<CommandOutput> {
    self.commands.lock().unwrap().push(command.clone());
    Ok(CommandOutput {
      code: Some(self.code_for(command)),
      stdout: "feedfacecafe\n".to_string(),
    })
  }
}

fn write(path: &Path, content: &str) {
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

/// Workspace at `<temp>/mxnet` with two dockerfile platforms.
pub fn workspace() -> (TempDir, Config) {
  let temp = TempDir::new().unwrap();
  let mut config = Config::new(temp.path().join("mxnet"));
  config.ccache_dir = Some(temp.path().join("ccache"));
  config.user = UserIds { uid: 1234, gid: 5678 };

  let docker = &config.docker_dir;
  write(
    &docker.join("Dockerfile.build.ubuntu_cpu"),
    "FROM ubuntu:18.04\nCOPY install/deps.sh /work/\nRUN /work/deps.sh\n",
  );
  write(&docker.join("install/deps.sh"), "apt-get install -y cmake\n");
  write(&docker.join("Dockerfile.build.armv7"), "FROM dockcross/linux-armv7\n");
  write(&docker.join("Dockerfile.publish.ubuntu_cpu"), "FROM ubuntu:18.04\n");
  (temp, config)
}
