// src/context.rs

use crate::error::PipeError;
use crate::fault::FaultInjector;
use crate::registry::{PipeRegistry, RegistryStats};
use crate::security::validate_mechanisms;
use crate::server::debug_pipe::DebugServerInner;
use crate::server::DebugServer;
use crate::transport::address::parse_address;
use crate::transport::debug_pipe::connect_debug_pipe;
use crate::transport::Transport;

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Settings applied to every server created through a `Context`.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
  /// Authentication mechanisms new servers offer. `None` offers every
  /// supported mechanism.
  pub default_auth_mechanisms: Option<Vec<String>>,
}

impl ContextOptions {
  pub fn with_auth_mechanisms<S: AsRef<str>>(mut self, mechanisms: &[S]) -> Result<Self, PipeError> {
    let validated = validate_mechanisms(mechanisms)?;
    self.default_auth_mechanisms = if validated.is_empty() { None } else { Some(validated) };
    Ok(self)
  }
}

/// Holds the state shared by all `Context` handles.
pub(crate) struct ContextInner {
  /// Debug-pipe name registry. Never held while user callbacks run or while
  /// a server record is being dropped.
  pub(crate) registry: Mutex<PipeRegistry<DebugServerInner>>,
  pub(crate) faults: FaultInjector,
  pub(crate) options: ContextOptions,
  /// Source for connection ids.
  next_handle: AtomicUsize,
}

impl ContextInner {
  fn new(options: ContextOptions) -> Self {
    Self {
      registry: Mutex::new(PipeRegistry::new()),
      faults: FaultInjector::new(),
      options,
      next_handle: AtomicUsize::new(1), // Start handle IDs from 1.
    }
  }

  /// Generates the next unique handle ID using an atomic counter.
  pub(crate) fn next_handle(&self) -> usize {
    self.next_handle.fetch_add(1, Ordering::Relaxed)
  }
}

impl fmt::Debug for ContextInner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContextInner")
      .field("registry", &*self.registry.lock())
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}

/// A handle to a debug-pipe context: the scope in which server names are
/// registered and resolved. Servers in different contexts never see each
/// other. Contexts are cheap to clone and thread-safe.
#[derive(Clone)]
pub struct Context {
  inner: Arc<ContextInner>,
}

impl Context {
  pub fn new() -> Self {
    Self::with_options(ContextOptions::default())
  }

  pub fn with_options(options: ContextOptions) -> Self {
    tracing::debug!(?options, "Debug-pipe context created");
    Self {
      inner: Arc::new(ContextInner::new(options)),
    }
  }

  /// Registers a new server under `name`.
  ///
  /// Fails with `AddressInUse` while another live server holds the name,
  /// even a disconnected one.
  pub fn create_server(&self, name: &str) -> Result<DebugServer, PipeError> {
    DebugServer::create(&self.inner, name)
  }

  /// Opens a connection to the server registered under `name` and returns
  /// the client transport.
  ///
  /// Unknown and disconnected servers both fail with `NoServer`.
  pub fn connect(&self, name: &str) -> Result<Transport, PipeError> {
    connect_debug_pipe(&self.inner, name)
  }

  /// Like `create_server`, but takes a `debug-pipe:name=<name>` address.
  pub fn listen(&self, address: &str) -> Result<DebugServer, PipeError> {
    let parsed = parse_address(address)?;
    self.create_server(&parsed.name)
  }

  /// Like `connect`, but takes a `debug-pipe:name=<name>` address.
  pub fn open(&self, address: &str) -> Result<Transport, PipeError> {
    let parsed = parse_address(address)?;
    self.connect(&parsed.name)
  }

  pub fn options(&self) -> &ContextOptions {
    &self.inner.options
  }

  pub fn registry_stats(&self) -> RegistryStats {
    self.inner.registry.lock().stats()
  }

  /// Names currently registered, sorted.
  pub fn server_names(&self) -> Vec<String> {
    self.inner.registry.lock().names()
  }

  /// Makes the `nth` (zero based) fault checkpoint from now on fail, once.
  /// Intended for exercising rollback paths in tests.
  pub fn inject_failure_at(&self, nth: usize) {
    self.inner.faults.arm(nth);
  }

  /// Cancels a pending injected failure.
  pub fn clear_injected_failure(&self) {
    self.inner.faults.disarm();
  }

  pub fn has_pending_failure(&self) -> bool {
    self.inner.faults.is_armed()
  }
}

impl Default for Context {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("registry", &self.registry_stats())
      .finish_non_exhaustive()
  }
}

/// Creates a new debug-pipe context.
pub fn context() -> Context {
  Context::new()
}
