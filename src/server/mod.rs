// src/server/mod.rs

pub mod base;
pub(crate) mod debug_pipe;

pub use base::{NewConnectionFn, ServerBase};
pub use debug_pipe::DebugServer;

/// Operations every server variant provides on top of its `ServerBase`.
pub(crate) trait Server: Send + Sync {
  fn base(&self) -> &ServerBase;

  /// Stops accepting new connections. Idempotent.
  fn disconnect(&self);

  fn is_disconnected(&self) -> bool;

  /// Tears the server down. Runs exactly once, when the last handle is dropped.
  fn finalize(&mut self);
}
