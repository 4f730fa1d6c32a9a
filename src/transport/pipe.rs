// src/transport/pipe.rs

use crate::error::PipeError;
use socket2::{Domain, Socket, Type};
use std::os::fd::OwnedFd;

/// Creates a connected pair of stream sockets. Whatever is written on one end
/// is readable on the other, in both directions. Both descriptors are
/// close-on-exec.
pub(crate) fn full_duplex_pipe() -> Result<(OwnedFd, OwnedFd), PipeError> {
  let (first, second) = Socket::pair(Domain::UNIX, Type::STREAM, None).map_err(|e| {
    tracing::debug!(error = %e, "Failed to create full duplex pipe");
    PipeError::Failed("Could not create full-duplex pipe".into())
  })?;

  for socket in [&first, &second] {
    // Not fatal: the pair is usable, it just leaks into exec'd children.
    if let Err(e) = socket.set_cloexec(true) {
      tracing::warn!(error = %e, "Failed to set close-on-exec on debug pipe descriptor");
    }
  }

  Ok((first.into(), second.into()))
}
