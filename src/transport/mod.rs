// src/transport/mod.rs

pub mod address;
pub(crate) mod debug_pipe;
pub(crate) mod pipe;

use crate::error::PipeError;

use socket2::Socket;
use std::fmt;
use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::time::Duration;

/// Which side of a debug-pipe connection a transport belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
  /// Returned to the caller of `Context::connect`.
  Client,
  /// Owned by the `Connection` handed to the server's accept callback.
  Server,
}

/// A byte-stream endpoint over one end of a debug pipe.
///
/// The transport exclusively owns its descriptor; dropping it closes the
/// descriptor, which the peer observes as end-of-stream.
pub struct Transport {
  socket: Socket,
  role: Role,
  address: Option<String>,
  auth_mechanisms: Option<Vec<String>>,
}

impl Transport {
  /// Wraps an owned descriptor. Client transports carry the address they
  /// were opened with; server transports carry none.
  pub(crate) fn from_fd(fd: OwnedFd, role: Role, address: Option<String>) -> Self {
    let transport = Self {
      socket: Socket::from(fd),
      role,
      address,
      auth_mechanisms: None,
    };
    tracing::trace!(fd = transport.as_raw_fd(), ?role, "Transport created");
    transport
  }

  pub fn role(&self) -> Role {
    self.role
  }

  pub fn is_server(&self) -> bool {
    self.role == Role::Server
  }

  pub fn address(&self) -> Option<&str> {
    self.address.as_deref()
  }

  /// Mechanisms the peer may authenticate with. `None` means every supported mechanism.
  pub fn auth_mechanisms(&self) -> Option<&[String]> {
    self.auth_mechanisms.as_deref()
  }

  pub(crate) fn set_auth_mechanisms(&mut self, mechanisms: Option<&[String]>) {
    self.auth_mechanisms = mechanisms.map(<[String]>::to_vec);
  }

  pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), PipeError> {
    self.socket.set_read_timeout(timeout)?;
    Ok(())
  }

  pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<(), PipeError> {
    self.socket.set_write_timeout(timeout)?;
    Ok(())
  }

  pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), PipeError> {
    self.socket.set_nonblocking(nonblocking)?;
    Ok(())
  }

  /// Shuts down both directions. The peer reads end-of-stream; the
  /// descriptor itself stays open until the transport is dropped.
  pub fn shutdown(&self) -> Result<(), PipeError> {
    match self.socket.shutdown(Shutdown::Both) {
      Ok(()) => Ok(()),
      // Peer already gone; nothing left to shut down.
      Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
      Err(e) => Err(e.into()),
    }
  }

  /// Converts into a blocking standard-library stream.
  pub fn into_std(self) -> std::os::unix::net::UnixStream {
    let fd: OwnedFd = self.socket.into();
    std::os::unix::net::UnixStream::from(fd)
  }

  /// Converts into a tokio stream for async harnesses. Must be called from
  /// within a tokio runtime.
  pub fn into_async(self) -> Result<tokio::net::UnixStream, PipeError> {
    self.socket.set_nonblocking(true)?;
    let stream = tokio::net::UnixStream::from_std(self.into_std())?;
    Ok(stream)
  }
}

impl Read for Transport {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    (&self.socket).read(buf)
  }
}

impl Read for &Transport {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    (&self.socket).read(buf)
  }
}

impl Write for Transport {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    (&self.socket).write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl Write for &Transport {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    (&self.socket).write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

impl AsFd for Transport {
  fn as_fd(&self) -> BorrowedFd<'_> {
    self.socket.as_fd()
  }
}

impl AsRawFd for Transport {
  fn as_raw_fd(&self) -> RawFd {
    self.socket.as_raw_fd()
  }
}

impl fmt::Debug for Transport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Transport")
      .field("fd", &self.socket.as_raw_fd())
      .field("role", &self.role)
      .field("address", &self.address)
      .field("auth_mechanisms", &self.auth_mechanisms)
      .finish()
  }
}
