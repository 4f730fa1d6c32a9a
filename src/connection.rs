// src/connection.rs

use crate::error::PipeError;
use crate::transport::Transport;

use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// An accepted session on the server side of a debug pipe.
///
/// Cloning a `Connection` takes another reference; the server-side transport
/// is closed when the last clone is dropped. An accept callback that wants to
/// keep the session must therefore hold on to a clone.
#[derive(Clone)]
pub struct Connection {
  inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
  id: usize,
  transport: Transport,
}

impl Connection {
  /// Takes ownership of a server-role transport.
  pub(crate) fn for_transport(id: usize, transport: Transport) -> Self {
    debug_assert!(transport.is_server(), "connection over a client transport");
    tracing::debug!(connection_id = id, "Connection created for server-side transport");
    Self {
      inner: Arc::new(ConnectionInner { id, transport }),
    }
  }

  pub fn id(&self) -> usize {
    self.inner.id
  }

  pub fn transport(&self) -> &Transport {
    &self.inner.transport
  }

  /// Mechanisms the client may authenticate with on this connection.
  pub fn auth_mechanisms(&self) -> Option<&[String]> {
    self.inner.transport.auth_mechanisms()
  }

  /// Number of live handles to this connection, including this one.
  pub fn ref_count(&self) -> usize {
    Arc::strong_count(&self.inner)
  }

  /// Writes all of `data` to the client.
  pub fn send(&self, data: &[u8]) -> Result<(), PipeError> {
    let mut transport = &self.inner.transport;
    transport.write_all(data)?;
    Ok(())
  }

  /// Reads whatever the client has sent, up to `buf.len()` bytes. `Ok(0)`
  /// means the client closed its end.
  pub fn recv(&self, buf: &mut [u8]) -> Result<usize, PipeError> {
    let mut transport = &self.inner.transport;
    Ok(transport.read(buf)?)
  }

  /// Reads exactly `buf.len()` bytes from the client.
  pub fn recv_exact(&self, buf: &mut [u8]) -> Result<(), PipeError> {
    let mut transport = &self.inner.transport;
    transport.read_exact(buf)?;
    Ok(())
  }

  /// Closes the session for every holder. The client reads end-of-stream.
  pub fn close(&self) -> Result<(), PipeError> {
    tracing::debug!(connection_id = self.inner.id, "Closing connection");
    self.inner.transport.shutdown()
  }
}

impl Drop for ConnectionInner {
  fn drop(&mut self) {
    tracing::debug!(connection_id = self.id, "Connection finalized, server-side transport closed");
  }
}

impl fmt::Debug for Connection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Connection")
      .field("id", &self.inner.id)
      .field("transport", &self.inner.transport)
      .finish()
  }
}
