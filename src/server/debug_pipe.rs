// src/server/debug_pipe.rs

use crate::connection::Connection;
use crate::context::ContextInner;
use crate::error::PipeError;
use crate::fault::FaultSite;
use crate::registry::RegistryClaim;
use crate::security::validate_mechanisms;
use crate::server::{Server, ServerBase};
use crate::transport::address::format_address;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Record behind a `DebugServer` handle.
///
/// Field order matters for teardown: `finalize` unregisters and releases the
/// claim explicitly, then the base is finalized and the name freed with the record.
pub(crate) struct DebugServerInner {
  claim: Option<RegistryClaim>,
  base: ServerBase,
  name: String,
  disconnected: AtomicBool,
  // Set once the registry insert succeeded; only then is there an entry to remove.
  registered: AtomicBool,
}

impl DebugServerInner {
  pub(crate) fn name(&self) -> &str {
    &self.name
  }
}

impl Server for DebugServerInner {
  fn base(&self) -> &ServerBase {
    &self.base
  }

  fn disconnect(&self) {
    if !self.disconnected.swap(true, Ordering::SeqCst) {
      tracing::info!(server_name = %self.name, "Debug-pipe server disconnected");
    }
  }

  fn is_disconnected(&self) -> bool {
    self.disconnected.load(Ordering::SeqCst)
  }

  fn finalize(&mut self) {
    if let Some(claim) = self.claim.take() {
      if *self.registered.get_mut() {
        let this: *const DebugServerInner = self;
        claim.context().registry.lock().unregister(&self.name, this);
      }
      drop(claim);
    }
    self.base.finalize();
    tracing::info!(server_name = %self.name, "Debug-pipe server finalized");
  }
}

impl Drop for DebugServerInner {
  fn drop(&mut self) {
    Server::finalize(self);
  }
}

/// A named in-process server that debug-pipe clients can connect to.
///
/// Handles are cheap to clone. The server stays registered until the last
/// handle is dropped; `disconnect` only stops new connections.
#[derive(Clone)]
pub struct DebugServer {
  inner: Arc<DebugServerInner>,
}

impl DebugServer {
  pub(crate) fn create(context: &Arc<ContextInner>, name: &str) -> Result<DebugServer, PipeError> {
    let faults = &context.faults;
    let claim = RegistryClaim::acquire(context)?;

    // Declared after `claim` so every early return unlocks before the claim is released.
    let mut registry = context.registry.lock();
    if registry.contains_live(name) {
      tracing::debug!(server_name = %name, "Debug-pipe name already in use");
      return Err(PipeError::AddressInUse(format_address(name)));
    }

    faults.check(FaultSite::ServerRecord)?;
    faults.check(FaultSite::ServerAddress)?;
    let address = format_address(name);
    faults.check(FaultSite::ServerName)?;
    let owned_name = name.to_string();
    let base = ServerBase::init(address, context.options.default_auth_mechanisms.clone(), faults)?;

    let server = Arc::new(DebugServerInner {
      claim: Some(claim),
      base,
      name: owned_name,
      disconnected: AtomicBool::new(false),
      registered: AtomicBool::new(false),
    });

    if let Err(e) = registry.register(name, Arc::downgrade(&server), faults) {
      drop(registry);
      // `server` is dropped on return and gives its claim back.
      return Err(e);
    }
    server.registered.store(true, Ordering::SeqCst);
    drop(registry);

    tracing::info!(server_name = %name, address = %server.base.address(), "Debug-pipe server registered");
    Ok(DebugServer { inner: server })
  }

  pub(crate) fn from_inner(inner: Arc<DebugServerInner>) -> Self {
    Self { inner }
  }

  pub fn name(&self) -> &str {
    self.inner.name()
  }

  /// The `debug-pipe:name=<name>` address clients use to reach this server.
  pub fn address(&self) -> &str {
    self.base().address()
  }

  pub fn base(&self) -> &ServerBase {
    Server::base(&*self.inner)
  }

  /// Refuses all further connection attempts. Already established
  /// connections are not affected. Idempotent.
  pub fn disconnect(&self) {
    Server::disconnect(&*self.inner);
  }

  pub fn is_connected(&self) -> bool {
    !self.inner.is_disconnected()
  }

  /// Installs the accept callback. The callback receives the server and the
  /// new connection; unless it keeps a clone of the connection, the
  /// connection is closed as soon as the callback returns.
  ///
  /// Capturing a clone of this server inside the callback keeps the server
  /// alive until the callback is cleared.
  pub fn set_new_connection_function<F>(&self, function: F)
  where
    F: Fn(&DebugServer, &Connection) + Send + Sync + 'static,
  {
    self.base().set_new_connection_function(Some(Arc::new(function)));
  }

  pub fn clear_new_connection_function(&self) {
    self.base().set_new_connection_function(None);
  }

  /// Restricts the mechanisms offered to new connections. An empty list
  /// restores the default of offering every supported mechanism.
  pub fn set_auth_mechanisms<S: AsRef<str>>(&self, mechanisms: &[S]) -> Result<(), PipeError> {
    let validated = validate_mechanisms(mechanisms)?;
    let mechanisms = if validated.is_empty() { None } else { Some(validated) };
    tracing::debug!(server_name = %self.inner.name, ?mechanisms, "Auth mechanisms updated");
    self.base().set_auth_mechanisms(mechanisms);
    Ok(())
  }

  pub fn auth_mechanisms(&self) -> Option<Vec<String>> {
    self.base().auth_mechanisms()
  }

  /// Number of live handles, including temporary ones held during connection setup.
  pub fn ref_count(&self) -> usize {
    Arc::strong_count(&self.inner)
  }

  pub fn ptr_eq(&self, other: &DebugServer) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for DebugServer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("DebugServer")
      .field("name", &self.inner.name)
      .field("disconnected", &self.inner.is_disconnected())
      .field("base", &self.inner.base)
      .finish()
  }
}
