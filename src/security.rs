// src/security.rs

use crate::error::PipeError;
use std::fmt;

/// Authentication mechanisms a debug-pipe server may offer to its peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mechanism {
  External,
  CookieSha1,
  Anonymous,
}

impl Mechanism {
  pub const ALL: [Mechanism; 3] = [Mechanism::External, Mechanism::CookieSha1, Mechanism::Anonymous];

  /// Returns the ASCII name used on the wire (e.g., "EXTERNAL").
  pub fn name(self) -> &'static str {
    match self {
      Mechanism::External => "EXTERNAL",
      Mechanism::CookieSha1 => "DBUS_COOKIE_SHA1",
      Mechanism::Anonymous => "ANONYMOUS",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|mechanism| mechanism.name() == name)
  }
}

impl fmt::Display for Mechanism {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Checks every name against the supported set and returns owned copies in
/// the given order. Duplicates are dropped.
pub(crate) fn validate_mechanisms<S: AsRef<str>>(names: &[S]) -> Result<Vec<String>, PipeError> {
  let mut validated: Vec<String> = Vec::with_capacity(names.len());
  for name in names {
    let name = name.as_ref();
    if Mechanism::from_name(name).is_none() {
      return Err(PipeError::InvalidArgument(format!(
        "unsupported authentication mechanism '{}'",
        name
      )));
    }
    if !validated.iter().any(|existing| existing == name) {
      validated.push(name.to_string());
    }
  }
  Ok(validated)
}
