//! Child-process engine.
//!
//! Commands inherit the orchestrator's environment, with the command's own
//! variables layered on top, and run in the foreground: a signal delivered to
//! the orchestrator's process group reaches the engine directly.

use std::io;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{CommandOutput, Engine, EngineCommand};

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEngine;

impl ProcessEngine {
  pub fn new() -> Self {
    Self
  }
}

fn build_command(command: &EngineCommand) -> Command {
  let mut cmd = Command::new(&command.program);
  cmd.args(&command.args).envs(&command.env);
  if command.stdin.is_some() {
    cmd.stdin(Stdio::piped());
  }
  cmd
}

async fn feed_stdin(child: &mut tokio::process::Child, input: Option<&str>) -> io::Result<()> {
  if let (Some(input), Some(mut stdin)) = (input, child.stdin.take()) {
    stdin.write_all(input.as_bytes()).await?;
    // Dropping the handle closes the pipe.
  }
  Ok(())
}

impl Engine for ProcessEngine {
  async fn status(&self, command: &EngineCommand) -> io::Result<Option<i32>> {
    debug!(program = %command.program, "spawning process");
    let mut child = build_command(command).spawn()?;
    feed_stdin(&mut child, command.stdin.as_deref()).await?;
    let status = child.wait().await?;
    Ok(status.code())
  }

  async fn output(&self, command: &EngineCommand) -> io::Result<CommandOutput> {
    debug!(program = %command.program, "spawning process");
    let mut child = build_command(command)
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .spawn()?;
    feed_stdin(&mut child, command.stdin.as_deref()).await?;
    let output = child.wait_with_output().await?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
    }

    Ok(CommandOutput {
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
    })
  }
}
