use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// CPU architecture used to filter the platform catalog.
///
/// Values other than `x86_64` and `aarch64` are kept verbatim and disable
/// filtering entirely.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
  X86_64,
  Aarch64,
  Other(String),
}

impl Arch {
  /// Architecture of the machine running the tool
  pub fn current() -> Self {
    Self::parse(std::env::consts::ARCH)
  }

  pub fn parse(value: &str) -> Self {
    match value {
      "x86_64" => Self::X86_64,
      "aarch64" => Self::Aarch64,
      other => Self::Other(other.to_string()),
    }
  }

  /// Returns the lowercase string identifier for this architecture
  pub fn as_str(&self) -> &str {
    match self {
      Self::X86_64 => "x86_64",
      Self::Aarch64 => "aarch64",
      Self::Other(other) => other,
    }
  }
}

impl FromStr for Arch {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::parse(s))
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
