//! Port/session directory
//!
//! Ports are found by name through a list of port handles kept in creation
//! order. Names are not required to be unique: the first port created with
//! a given name wins every lookup.

use log::debug;

use super::{ObjectData, ObjectStore, PortData, SessionData};
use crate::error::{KernelError, Result};
use crate::handles::Handle;
use crate::result::{GuestResult, ResultCode};

impl ObjectStore {
    /// Create a port named `name` (truncated to `PortData::MAX_NAME_LEN`)
    ///
    /// An empty name makes the port private.
    pub fn make_port(&mut self, name: &str) -> Result<Handle> {
        let data = PortData::new(name);
        let public = data.is_public();
        let handle = self.allocate(ObjectData::Port(data))?;
        self.port_handles.push(handle);

        debug!(
            "Created {} port \"{}\" with handle {}",
            if public { "public" } else { "private" },
            name,
            handle
        );
        Ok(handle)
    }

    /// Open a session on `port`
    ///
    /// # Errors
    /// `NotAPort` (host-fatal) if `port` is not a live port object.
    pub fn make_session(&mut self, port: Handle) -> Result<Handle> {
        if self.port(port).is_none() {
            return Err(KernelError::NotAPort { handle: port });
        }

        self.allocate(ObjectData::Session(SessionData { port }))
    }

    /// Find the first port whose name matches `name`
    pub fn port_handle(&self, name: impl AsRef<[u8]>) -> Option<Handle> {
        let name = name.as_ref();
        self.port_handles
            .iter()
            .copied()
            .find(|&handle| self.port(handle).is_some_and(|port| port.matches(name)))
    }

    /// Connect to the port named `name` and return the new session
    ///
    /// Guest-visible failures (checked in this order):
    /// - `PortNameTooLong` if `name` is longer than `PortData::MAX_NAME_LEN`
    /// - `ObjectNotFound` if no port has that name
    ///
    /// # Errors
    /// `PrivatePort` (host-fatal) if the name resolves to a private port.
    pub fn connect(&mut self, name: impl AsRef<[u8]>) -> Result<GuestResult<Handle>> {
        let name = name.as_ref();
        if name.len() > PortData::MAX_NAME_LEN {
            return Ok(Err(ResultCode::PortNameTooLong));
        }

        let Some(port) = self.port_handle(name) else {
            return Ok(Err(ResultCode::ObjectNotFound));
        };

        if self.port(port).is_some_and(|data| !data.is_public()) {
            return Err(KernelError::PrivatePort {
                name: String::from_utf8_lossy(name).into_owned(),
            });
        }

        let session = self.make_session(port)?;
        Ok(Ok(session))
    }
}
