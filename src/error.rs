// src/error.rs

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum PipeError {
  // --- I/O Errors ---
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  // --- Registration / Rendezvous Errors ---
  #[error("Address already in use: {0}")]
  AddressInUse(String), // Name already registered by a live server
  #[error("No server available at address: {0}")]
  NoServer(String), // Unknown, never registered, or disconnected

  // --- Resource Errors ---
  #[error("Not enough memory")]
  OutOfMemory,
  #[error("Operation failed: {0}")]
  Failed(String), // OS-level failure that is not an allocation failure

  // --- Address Errors ---
  #[error("Invalid address format: {0}")]
  BadAddress(String),
  #[error("Transport method not supported: {0}")]
  UnsupportedTransport(String),

  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String),
}

impl PipeError {
  /// The D-Bus error name this error is reported under.
  pub fn dbus_name(&self) -> &'static str {
    match self {
      PipeError::Io(_) => "org.freedesktop.DBus.Error.IOError",
      PipeError::AddressInUse(_) => "org.freedesktop.DBus.Error.AddressInUse",
      PipeError::NoServer(_) => "org.freedesktop.DBus.Error.NoServer",
      PipeError::OutOfMemory => "org.freedesktop.DBus.Error.NoMemory",
      PipeError::Failed(_) => "org.freedesktop.DBus.Error.Failed",
      PipeError::BadAddress(_) | PipeError::UnsupportedTransport(_) => "org.freedesktop.DBus.Error.BadAddress",
      PipeError::InvalidArgument(_) => "org.freedesktop.DBus.Error.InvalidArgs",
    }
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dbus_names_match_error_kinds() {
    assert_eq!(
      PipeError::AddressInUse("debug-pipe:name=a".into()).dbus_name(),
      "org.freedesktop.DBus.Error.AddressInUse"
    );
    assert_eq!(PipeError::NoServer("x".into()).dbus_name(), "org.freedesktop.DBus.Error.NoServer");
    assert_eq!(PipeError::OutOfMemory.dbus_name(), "org.freedesktop.DBus.Error.NoMemory");
    assert_eq!(PipeError::Failed("pipe".into()).dbus_name(), "org.freedesktop.DBus.Error.Failed");
  }

}
