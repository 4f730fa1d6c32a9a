// src/lib.rs

//! debug_pipe - in-process rendezvous for IPC tests.
//!
//! A test registers a named server with a [`Context`]; a client then connects
//! to that name and receives one end of a freshly created socket pair, while
//! the other end is wrapped in a [`Connection`] and handed to the server's
//! accept callback. No file system sockets or ports are involved.
//!
//! ```
//! use std::io::Write;
//! use std::sync::{Arc, Mutex};
//!
//! let ctx = debug_pipe::Context::new();
//! let server = ctx.create_server("svc1")?;
//!
//! let accepted = Arc::new(Mutex::new(Vec::new()));
//! let sink = accepted.clone();
//! server.set_new_connection_function(move |_server, connection| {
//!   sink.lock().unwrap().push(connection.clone());
//! });
//!
//! let mut client = ctx.connect("svc1")?;
//! client.write_all(b"hello")?;
//!
//! let connection = accepted.lock().unwrap().pop().unwrap();
//! let mut buf = [0u8; 5];
//! connection.recv_exact(&mut buf)?;
//! assert_eq!(&buf, b"hello");
//! # Ok::<(), debug_pipe::PipeError>(())
//! ```

/// Defines the `Context`, which owns the server name registry.
pub mod context;
/// Server-side sessions created for each accepted connection.
pub mod connection;
/// Defines custom error types used throughout the library.
pub mod error;
/// Deterministic failure injection for rollback testing.
pub mod fault;
/// Name registry shared by the servers of one context.
pub mod registry;
/// Authentication mechanism names.
pub mod security;
/// Server base state and the debug-pipe server.
pub mod server;
/// Transports, addresses and the socket pair factory.
pub mod transport;

pub use connection::Connection;
pub use context::{context, Context, ContextOptions};
pub use error::PipeError;
pub use fault::FaultSite;
pub use registry::RegistryStats;
pub use security::Mechanism;
pub use server::{DebugServer, NewConnectionFn, ServerBase};
pub use transport::address::{format_address, parse_address, DebugPipeAddress, DEBUG_PIPE_METHOD};
pub use transport::{Role, Transport};
