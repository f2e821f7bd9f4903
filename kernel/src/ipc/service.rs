//! Service collaborators and the routing table
//!
//! Each OS service (APT, FS, HID, ...) is reached through one hardcoded
//! handle and exposes a single entry point that decodes its own command
//! table. The kernel does not know any service's commands; it only forwards
//! the message pointer.

use std::collections::BTreeMap;

use log::{debug, warn};

use super::srv;
use crate::error::{KernelError, Result};
use crate::handles::{self, Handle};
use crate::memory::GuestMemory;

/// An OS service reachable through a hardcoded handle
pub trait Service {
    /// Handle one IPC request whose message starts at `message_pointer`
    ///
    /// The service reads its parameters from and writes its response into
    /// the message buffer.
    fn handle_sync_request(
        &mut self,
        mem: &mut dyn GuestMemory,
        message_pointer: u32,
    ) -> Result<()>;

    /// Drop all service state, called on kernel reset
    fn reset(&mut self) {}
}

/// Routes IPC requests to `srv:` or to a registered service
#[derive(Default)]
pub struct ServiceManager {
    services: BTreeMap<Handle, Box<dyn Service>>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the collaborator for a service handle, returning the old one
    ///
    /// Only handles in the service range are ever routed to.
    pub fn register(
        &mut self,
        handle: Handle,
        service: Box<dyn Service>,
    ) -> Option<Box<dyn Service>> {
        if !handles::is_service_handle(handle) {
            warn!(
                "registering service for non-service handle {:#010X}, it will never be reached",
                handle
            );
        }
        self.services.insert(handle, service)
    }

    pub fn is_registered(&self, handle: Handle) -> bool {
        self.services.contains_key(&handle)
    }

    /// Handles with a registered collaborator, ascending
    pub fn registered(&self) -> impl Iterator<Item = Handle> + '_ {
        self.services.keys().copied()
    }

    pub fn reset(&mut self) {
        for service in self.services.values_mut() {
            service.reset();
        }
    }

    /// Handle a request sent on a session to the `srv:` port
    pub fn handle_sync_request(
        &mut self,
        mem: &mut dyn GuestMemory,
        message_pointer: u32,
    ) -> Result<()> {
        srv::handle_sync_request(mem, message_pointer)
    }

    /// Forward a request sent directly to a service handle
    ///
    /// # Errors
    /// `UnknownServiceHandle` (host-fatal) if nothing is registered for it.
    pub fn send_command_to_service(
        &mut self,
        mem: &mut dyn GuestMemory,
        message_pointer: u32,
        handle: Handle,
    ) -> Result<()> {
        let service = self
            .services
            .get_mut(&handle)
            .ok_or(KernelError::UnknownServiceHandle { handle })?;

        debug!(
            "IPC message to {} service (header = {:#010X})",
            handles::service_name(handle),
            mem.read32(message_pointer)
        );
        service.handle_sync_request(mem, message_pointer)
    }
}
