// src/registry.rs

use crate::context::ContextInner;
use crate::error::PipeError;
use crate::fault::{FaultInjector, FaultSite};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

/// Snapshot of the debug-pipe name registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryStats {
  /// Number of outstanding claims (one per live server).
  pub refcount: usize,
  /// Number of names currently registered.
  pub entries: usize,
  /// Whether the backing table currently exists.
  pub allocated: bool,
}

/// Name table for debug-pipe servers.
///
/// Entries are non-owning: a server removes its own entry while it is being
/// torn down, and a `Weak` that no longer upgrades is treated as absent. The
/// table only exists while at least one claim is outstanding.
pub(crate) struct PipeRegistry<T> {
  entries: Option<HashMap<String, Weak<T>>>,
  refcount: usize,
}

impl<T> PipeRegistry<T> {
  pub(crate) fn new() -> Self {
    Self {
      entries: None,
      refcount: 0,
    }
  }

  /// Takes one claim, allocating the table on the first one.
  /// On failure the refcount is left untouched.
  pub(crate) fn acquire(&mut self, faults: &FaultInjector) -> Result<(), PipeError> {
    if self.entries.is_none() {
      assert_eq!(self.refcount, 0, "debug-pipe registry has claims but no table");
      faults.check(FaultSite::RegistryTable)?;
      self.entries = Some(HashMap::new());
      tracing::trace!("Debug-pipe registry table allocated");
    }
    self.refcount += 1;
    tracing::trace!(refcount = self.refcount, "Debug-pipe registry claim acquired");
    Ok(())
  }

  /// Drops one claim, destroying the table with the last one.
  pub(crate) fn release(&mut self) {
    assert!(
      self.entries.is_some() && self.refcount > 0,
      "debug-pipe registry released without a matching acquire"
    );
    self.refcount -= 1;
    tracing::trace!(refcount = self.refcount, "Debug-pipe registry claim released");
    if self.refcount == 0 {
      self.entries = None;
      tracing::trace!("Debug-pipe registry table destroyed");
    }
  }

  /// Inserts `name`. The caller holds a claim and has already checked that
  /// no live server uses the name.
  pub(crate) fn register(&mut self, name: &str, server: Weak<T>, faults: &FaultInjector) -> Result<(), PipeError> {
    let entries = match self.entries.as_mut() {
      Some(entries) => entries,
      None => panic!("debug-pipe registry insert without a claim"),
    };
    debug_assert!(
      entries.get(name).map_or(true, |existing| existing.strong_count() == 0),
      "debug-pipe name registered twice"
    );
    faults.check(FaultSite::RegistryEntry)?;
    entries.insert(name.to_string(), server);
    Ok(())
  }

  /// True if `name` resolves to a server that is still alive. Does not
  /// create a strong reference, so it is safe to call with the lock held.
  pub(crate) fn contains_live(&self, name: &str) -> bool {
    self
      .entries
      .as_ref()
      .and_then(|entries| entries.get(name))
      .map_or(false, |server| server.strong_count() > 0)
  }

  /// Resolves `name` to a strong handle. Does not look at the server's
  /// disconnected state.
  ///
  /// The returned `Arc` may be the last strong reference; drop it only after
  /// the registry lock has been released.
  pub(crate) fn lookup_live(&self, name: &str) -> Option<Arc<T>> {
    self.entries.as_ref()?.get(name)?.upgrade()
  }

  /// Removes `name` if it still belongs to `server`. A newer server that
  /// took over the name after `server` started dying is left alone.
  pub(crate) fn unregister(&mut self, name: &str, server: *const T) {
    let Some(entries) = self.entries.as_mut() else {
      tracing::warn!(server_name = %name, "Unregister on a destroyed debug-pipe registry");
      return;
    };
    match entries.get(name) {
      Some(existing) if std::ptr::eq(existing.as_ptr(), server) => {
        entries.remove(name);
        tracing::trace!(server_name = %name, "Debug-pipe name unregistered");
      }
      Some(_) => {
        tracing::debug!(server_name = %name, "Debug-pipe name already taken over by another server");
      }
      None => {
        tracing::warn!(server_name = %name, "Unregister of unknown debug-pipe name");
      }
    }
  }

  pub(crate) fn is_allocated(&self) -> bool {
    self.entries.is_some()
  }

  pub(crate) fn len(&self) -> usize {
    self.entries.as_ref().map_or(0, HashMap::len)
  }

  pub(crate) fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .entries
      .as_ref()
      .map(|entries| entries.keys().cloned().collect())
      .unwrap_or_default();
    names.sort();
    names
  }

  pub(crate) fn stats(&self) -> RegistryStats {
    RegistryStats {
      refcount: self.refcount,
      entries: self.len(),
      allocated: self.is_allocated(),
    }
  }
}

impl<T> fmt::Debug for PipeRegistry<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipeRegistry")
      .field("refcount", &self.refcount)
      .field("names", &self.names())
      .finish()
  }
}

/// One registry claim. Acquired on construction, released on drop.
///
/// Must not be dropped while the registry lock is held by the same thread.
pub(crate) struct RegistryClaim {
  context: Arc<ContextInner>,
}

impl RegistryClaim {
  pub(crate) fn acquire(context: &Arc<ContextInner>) -> Result<Self, PipeError> {
    context.registry.lock().acquire(&context.faults)?;
    Ok(Self {
      context: context.clone(),
    })
  }

  pub(crate) fn context(&self) -> &Arc<ContextInner> {
    &self.context
  }
}

impl Drop for RegistryClaim {
  fn drop(&mut self) {
    self.context.registry.lock().release();
  }
}

impl fmt::Debug for RegistryClaim {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegistryClaim").finish_non_exhaustive()
  }
}
