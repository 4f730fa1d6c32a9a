// src/fault.rs

use crate::error::PipeError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Points in server creation and connection setup where a resource
/// acquisition can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultSite {
  /// Lazy allocation of the registry table on the first claim.
  RegistryTable,
  /// Insertion of a server into the registry table.
  RegistryEntry,
  /// Allocation of the server record.
  ServerRecord,
  /// Formatting of the server's `debug-pipe:name=` address.
  ServerAddress,
  /// Copy of the server name kept in the record.
  ServerName,
  /// `ServerBase::init`.
  ServerBase,
  /// Formatting of the address recorded on the client transport.
  ClientAddress,
  /// OS creation of the socket pair. Fails with `PipeError::Failed`.
  FullDuplexPipe,
  /// Wrapping the client end of the pipe in a `Transport`.
  ClientTransport,
  /// Wrapping the server end of the pipe in a `Transport`.
  ServerTransport,
  /// Copying the server's auth mechanisms onto the server transport.
  AuthMechanisms,
  /// Creation of the `Connection` around the server transport.
  Connection,
}

impl FaultSite {
  /// The error a real failure at this site would surface as.
  pub fn error(self) -> PipeError {
    match self {
      FaultSite::FullDuplexPipe => PipeError::Failed("Could not create full-duplex pipe".into()),
      _ => PipeError::OutOfMemory,
    }
  }
}

/// One-shot countdown over fault sites.
///
/// Arming with `n` makes the `n`-th checkpoint (zero based) after arming fail;
/// the injector disarms itself once it fires.
#[derive(Debug, Default)]
pub(crate) struct FaultInjector {
  // 0 means disarmed, otherwise the number of checkpoints left including the failing one.
  countdown: AtomicUsize,
}

impl FaultInjector {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn arm(&self, nth: usize) {
    self.countdown.store(nth.saturating_add(1), Ordering::SeqCst);
  }

  pub(crate) fn disarm(&self) {
    self.countdown.store(0, Ordering::SeqCst);
  }

  pub(crate) fn is_armed(&self) -> bool {
    self.countdown.load(Ordering::SeqCst) != 0
  }

  /// Passes the checkpoint for `site`, or returns the site's error if the
  /// armed countdown expires here.
  pub(crate) fn check(&self, site: FaultSite) -> Result<(), PipeError> {
    let previous = self
      .countdown
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1));
    match previous {
      Ok(1) => {
        tracing::debug!(?site, "Injected failure");
        Err(site.error())
      }
      _ => Ok(()),
    }
  }
}
