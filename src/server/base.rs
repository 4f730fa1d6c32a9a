// src/server/base.rs

use crate::connection::Connection;
use crate::error::PipeError;
use crate::fault::{FaultInjector, FaultSite};
use crate::server::DebugServer;

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Accept callback, invoked once for every new connection.
pub type NewConnectionFn = Arc<dyn Fn(&DebugServer, &Connection) + Send + Sync>;

/// State shared by every server variant: its address, the accept callback,
/// and the authentication mechanisms offered to clients.
pub struct ServerBase {
  address: String,
  new_connection: Mutex<Option<NewConnectionFn>>,
  // None means every supported mechanism.
  auth_mechanisms: Mutex<Option<Vec<String>>>,
}

impl ServerBase {
  pub(crate) fn init(
    address: String,
    auth_mechanisms: Option<Vec<String>>,
    faults: &FaultInjector,
  ) -> Result<Self, PipeError> {
    faults.check(FaultSite::ServerBase)?;
    tracing::trace!(%address, "Server base initialized");
    Ok(Self {
      address,
      new_connection: Mutex::new(None),
      auth_mechanisms: Mutex::new(auth_mechanisms),
    })
  }

  /// Drops the accept callback (and whatever it captured).
  pub(crate) fn finalize(&mut self) {
    self.new_connection.get_mut().take();
    tracing::trace!(address = %self.address, "Server base finalized");
  }

  pub fn address(&self) -> &str {
    &self.address
  }

  /// Clones the current callback out so it can be invoked without holding the lock.
  pub(crate) fn new_connection_function(&self) -> Option<NewConnectionFn> {
    self.new_connection.lock().clone()
  }

  pub(crate) fn set_new_connection_function(&self, function: Option<NewConnectionFn>) {
    // Old callback is dropped after the lock is released.
    let _previous = std::mem::replace(&mut *self.new_connection.lock(), function);
  }

  pub fn auth_mechanisms(&self) -> Option<Vec<String>> {
    self.auth_mechanisms.lock().clone()
  }

  pub(crate) fn set_auth_mechanisms(&self, mechanisms: Option<Vec<String>>) {
    *self.auth_mechanisms.lock() = mechanisms;
  }
}

impl fmt::Debug for ServerBase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ServerBase")
      .field("address", &self.address)
      .field("has_new_connection_function", &self.new_connection.lock().is_some())
      .field("auth_mechanisms", &*self.auth_mechanisms.lock())
      .finish()
  }
}
