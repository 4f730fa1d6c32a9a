// src/transport/address.rs

use crate::error::PipeError;
use std::fmt;

/// Transport method name of debug-pipe addresses.
pub const DEBUG_PIPE_METHOD: &str = "debug-pipe";

/// A parsed `debug-pipe:name=<name>` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DebugPipeAddress {
  pub name: String,
}

impl DebugPipeAddress {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into() }
  }
}

impl fmt::Display for DebugPipeAddress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:name={}", DEBUG_PIPE_METHOD, self.name)
  }
}

/// Builds the address string for a server name. The name is used raw, without escaping.
pub fn format_address(name: &str) -> String {
  DebugPipeAddress::new(name).to_string()
}

/// Parses a debug-pipe address string.
pub fn parse_address(address: &str) -> Result<DebugPipeAddress, PipeError> {
  let bad_address = |why: &str| PipeError::BadAddress(format!("{} ({})", address, why));

  // Find the method separator ':'
  let Some((method, params)) = address.split_once(':') else {
    return Err(bad_address("missing transport method"));
  };
  if method != DEBUG_PIPE_METHOD {
    return Err(PipeError::UnsupportedTransport(address.to_string()));
  }

  let mut name: Option<&str> = None;
  for pair in params.split(',').filter(|pair| !pair.is_empty()) {
    let Some((key, value)) = pair.split_once('=') else {
      return Err(bad_address("expected key=value"));
    };
    match key {
      "name" => {
        if name.is_some() {
          return Err(bad_address("duplicate 'name'"));
        }
        name = Some(value);
      }
      _ => return Err(bad_address("unknown key")),
    }
  }

  match name {
    Some(name) if !name.is_empty() => Ok(DebugPipeAddress::new(name)),
    Some(_) => Err(bad_address("empty 'name'")),
    None => Err(bad_address("missing 'name'")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn formats_raw_name() {
    assert_eq!(format_address("svc1"), "debug-pipe:name=svc1");
    assert_eq!(format_address("a b,c"), "debug-pipe:name=a b,c");
  }

  #[test]
  fn parses_name() {
    assert_eq!(parse_address("debug-pipe:name=svc1").unwrap(), DebugPipeAddress::new("svc1"));
    // A value may itself contain '='.
    assert_eq!(parse_address("debug-pipe:name=k=v").unwrap().name, "k=v");
  }

  #[test]
  fn rejects_other_methods() {
    assert!(matches!(
      parse_address("unix:path=/tmp/bus"),
      Err(PipeError::UnsupportedTransport(_))
    ));
  }

  #[test]
  fn rejects_malformed_addresses() {
    for address in [
      "debug-pipe",
      "debug-pipe:",
      "debug-pipe:name=",
      "debug-pipe:name",
      "debug-pipe:name=a,name=b",
      "debug-pipe:name=a,guid=1234",
    ] {
      assert!(
        matches!(parse_address(address), Err(PipeError::BadAddress(_))),
        "accepted {}",
        address
      );
    }
  }
}
