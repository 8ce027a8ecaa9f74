//! Container engine seam.
//!
//! Every interaction with the container engine, the compose tool and the
//! registry login helpers goes through [`Engine`] as a fully described
//! [`EngineCommand`]. [`ProcessEngine`] executes them as child processes.

pub mod process;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::io;

pub use process::ProcessEngine;

/// A single invocation of an external tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineCommand {
  pub program: String,
  pub args: Vec<String>,
  /// Variables added on top of the inherited environment.
  pub env: BTreeMap<String, String>,
  /// Data written to the child's stdin. Never logged.
  pub stdin: Option<String>,
}

impl EngineCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      ..Default::default()
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.env.insert(key.into(), value.into());
    self
  }

  pub fn stdin(mut self, input: impl Into<String>) -> Self {
    self.stdin = Some(input.into());
    self
  }

  /// Program followed by its arguments.
  pub fn argv(&self) -> Vec<&str> {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect()
  }

  /// One token per line, continued with backslashes, for copy-pasting.
  pub fn render_multiline(&self) -> String {
    self.argv().join(" \\\n\t")
  }
}

impl fmt::Display for EngineCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.argv().join(" "))
  }
}

/// Captured result of a command whose stdout is needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Exit code, `None` when terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
}

impl CommandOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

pub trait Engine {
  /// Run with inherited stdout/stderr and return the exit code verbatim.
  ///
  /// `Ok(None)` means the process was terminated by a signal. `Err` is only
  /// returned when the process could not be started.
  fn status(&self, command: &EngineCommand) -> impl Future<Output = io::Result<Option<i32>>> + Send;

  /// Run and capture stdout.
  fn output(&self, command: &EngineCommand) -> impl Future<Output = io::Result<CommandOutput>> + Send;
}
