// src/transport/debug_pipe.rs

use crate::connection::Connection;
use crate::context::ContextInner;
use crate::error::PipeError;
use crate::fault::FaultSite;
use crate::server::DebugServer;
use crate::transport::address::format_address;
use crate::transport::pipe::full_duplex_pipe;
use crate::transport::{Role, Transport};

use std::sync::Arc;

/// Connects to the debug-pipe server registered under `name` and returns the
/// client end of a fresh pipe. The server end is wrapped in a `Connection`
/// and handed to the server's accept callback.
///
/// Every resource acquired here is an owned value, so an early return closes
/// whatever was created so far.
pub(crate) fn connect_debug_pipe(context: &Arc<ContextInner>, name: &str) -> Result<Transport, PipeError> {
  let faults = &context.faults;

  // The strong handle obtained here is also the reference that keeps the
  // server alive while its callback runs.
  let lookup = {
    let registry = context.registry.lock();
    let found = if registry.is_allocated() {
      registry.lookup_live(name)
    } else {
      tracing::debug!(server_name = %name, "Debug-pipe connect with no registered servers");
      None
    };
    found
  };
  let server = match lookup {
    Some(inner) => DebugServer::from_inner(inner),
    None => {
      tracing::warn!(server_name = %name, "Debug-pipe connect refused: no such server");
      return Err(PipeError::NoServer(format_address(name)));
    }
  };
  if !server.is_connected() {
    tracing::warn!(server_name = %name, "Debug-pipe connect refused: server disconnected");
    return Err(PipeError::NoServer(format_address(name)));
  }

  faults.check(FaultSite::ClientAddress)?;
  let address = format_address(name);

  faults.check(FaultSite::FullDuplexPipe)?;
  let (client_fd, server_fd) = full_duplex_pipe()?;

  faults.check(FaultSite::ClientTransport)?;
  let client_side = Transport::from_fd(client_fd, Role::Client, Some(address));

  faults.check(FaultSite::ServerTransport)?;
  let mut server_side = Transport::from_fd(server_fd, Role::Server, None);

  faults.check(FaultSite::AuthMechanisms)?;
  let mechanisms = server.base().auth_mechanisms();
  server_side.set_auth_mechanisms(mechanisms.as_deref());

  faults.check(FaultSite::Connection)?;
  let connection = Connection::for_transport(context.next_handle(), server_side);

  if let Some(callback) = server.base().new_connection_function() {
    tracing::debug!(server_name = %name, connection_id = connection.id(), "Dispatching new debug-pipe connection");
    callback(&server, &connection);
  } else {
    tracing::debug!(server_name = %name, connection_id = connection.id(), "No accept callback installed");
  }

  // Unless the callback kept a clone, this closes the server side and the
  // client sees a disconnect on first use.
  if connection.ref_count() == 1 {
    tracing::debug!(server_name = %name, connection_id = connection.id(), "Connection not retained by server, closing");
  }
  drop(connection);

  tracing::debug!(server_name = %name, "Debug-pipe client transport established");
  Ok(client_side)
}
