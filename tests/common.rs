// tests/common.rs
#![allow(dead_code)] // Not every test file uses every helper

use debug_pipe::{Connection, Context, DebugServer, Transport};
use parking_lot::Mutex;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static NAME_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Use std::sync::Once for one-time initialization
static TRACING_INIT: Once = Once::new();

pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

// Setup function to initialize tracing
fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "debug_pipe=debug,warn";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_env_filter(env_filter)
      .with_target(true) // Show module path
      .with_line_number(true) // Show line numbers
      .with_test_writer() // Write to test output capture
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

// Helper to create a context
pub fn test_context() -> Context {
  setup_tracing(); // Ensure tracing is initialized before creating context
  Context::new()
}

// Helper to generate unique server names
pub fn unique_name(prefix: &str) -> String {
  let pid = std::process::id();
  let count = NAME_COUNTER.fetch_add(1, Ordering::Relaxed);
  format!("{}_{}_{}", prefix, pid, count)
}

/// Connections accepted by a server, in order.
#[derive(Clone, Default)]
pub struct Accepted {
  connections: Arc<Mutex<Vec<Connection>>>,
}

impl Accepted {
  /// Installs an accept callback on `server` that keeps every connection.
  pub fn install(server: &DebugServer) -> Self {
    let accepted = Self::default();
    let sink = accepted.connections.clone();
    server.set_new_connection_function(move |_server, connection| {
      sink.lock().push(connection.clone());
    });
    accepted
  }

  pub fn len(&self) -> usize {
    self.connections.lock().len()
  }

  pub fn get(&self, index: usize) -> Connection {
    self.connections.lock()[index].clone()
  }

  pub fn clear(&self) {
    self.connections.lock().clear();
  }
}

// Reads exactly `len` bytes with a timeout so a broken pipe cannot hang the test.
pub fn read_bytes(transport: &Transport, len: usize) -> std::io::Result<Vec<u8>> {
  transport.set_read_timeout(Some(READ_TIMEOUT)).expect("set read timeout");
  let mut reader = transport;
  let mut buf = vec![0u8; len];
  reader.read_exact(&mut buf)?;
  Ok(buf)
}

// Number of descriptors open in this process.
#[cfg(target_os = "linux")]
pub fn open_fd_count() -> usize {
  std::fs::read_dir("/proc/self/fd").expect("read /proc/self/fd").count()
}
