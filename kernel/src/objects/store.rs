//! Object store
//!
//! Owns every dynamically created kernel object. Handles are handed out by
//! a counter that starts at zero and only ever grows, so a handle is simply
//! the object's index and is never reused until the next [`reset`].
//!
//! [`reset`]: ObjectStore::reset

use log::debug;

use super::{
    KernelObject, KernelObjectType, ObjectData, PortData, ProcessData, ResourceLimitRef,
    SessionData,
};
use crate::config::KernelConfig;
use crate::error::{KernelError, Result};
use crate::handles::{self, Handle};

/// Name of the service manager port created at reset
pub const SRV_PORT_NAME: &str = "srv:";

#[derive(Debug)]
pub struct ObjectStore {
    /// Objects indexed by handle
    pub(super) objects: Vec<KernelObject>,

    /// Handles of every port, in creation order, for lookup by name
    pub(super) port_handles: Vec<Handle>,

    /// Handle the next object will get
    handle_counter: u32,

    /// Highest handle that may be allocated
    max_handle: Handle,

    current_process: Handle,

    srv_port: Handle,
}

impl ObjectStore {
    /// Create an empty store
    ///
    /// The store holds nothing until [`ObjectStore::reset`] is called.
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            objects: Vec::with_capacity(config.object_capacity),
            port_handles: Vec::with_capacity(config.port_capacity),
            handle_counter: 0,
            max_handle: config.max_handle.min(handles::MAX),
            current_process: 0,
            srv_port: 0,
        }
    }

    /// Tear down every object and rebuild the boot state
    ///
    /// After a reset the store holds exactly: a dummy object at handle 0,
    /// the current process and its resource limit, and the `srv:` port.
    pub fn reset(&mut self) -> Result<()> {
        // Payloads are owned by their objects; resource limits only hold a
        // handle, so clearing the list releases everything exactly once.
        self.objects.clear();
        self.port_handles.clear();
        self.handle_counter = 0;

        self.allocate(ObjectData::Dummy)?;
        self.current_process = self.make_process()?;
        self.srv_port = self.make_port(SRV_PORT_NAME)?;
        Ok(())
    }

    /// Allocate the next handle for an object carrying `data`
    ///
    /// # Errors
    /// `HandleSpaceExhausted` once the counter passes the configured limit.
    /// This is host-fatal: the guest never sees a result code for it.
    pub fn allocate(&mut self, data: ObjectData) -> Result<Handle> {
        if self.handle_counter > self.max_handle {
            return Err(KernelError::HandleSpaceExhausted {
                max: self.max_handle,
            });
        }

        let handle = self.handle_counter;
        let kind = data.kind();
        self.objects.push(KernelObject::new(handle, data));
        self.handle_counter += 1;

        debug!("Created {} object with handle {}", kind, handle);
        Ok(handle)
    }

    /// Create a process together with its resource limit object
    ///
    /// The two handles are consecutive. The process owns the limits; the
    /// resource limit object only points back at the process.
    pub fn make_process(&mut self) -> Result<Handle> {
        let process = self.allocate(ObjectData::Process(ProcessData::default()))?;
        let limit = self.allocate(ObjectData::ResourceLimit(ResourceLimitRef { process }))?;

        if let Some(data) = self.process_mut(process) {
            data.limits.handle = limit;
        }
        Ok(process)
    }

    /// Look up any object by handle
    ///
    /// Hardcoded handles (current process, services, ...) are never in the
    /// store; callers must resolve those first.
    #[inline]
    pub fn lookup(&self, handle: Handle) -> Option<&KernelObject> {
        self.objects.get(handle as usize)
    }

    /// Look up an object and check its type
    pub fn lookup_typed(&self, handle: Handle, kind: KernelObjectType) -> Option<&KernelObject> {
        self.lookup(handle).filter(|object| object.kind() == kind)
    }

    pub fn process(&self, handle: Handle) -> Option<&ProcessData> {
        match self.lookup(handle)?.data() {
            ObjectData::Process(data) => Some(data),
            _ => None,
        }
    }

    pub fn process_mut(&mut self, handle: Handle) -> Option<&mut ProcessData> {
        match self.objects.get_mut(handle as usize)?.data_mut() {
            ObjectData::Process(data) => Some(data),
            _ => None,
        }
    }

    pub fn resource_limit(&self, handle: Handle) -> Option<ResourceLimitRef> {
        match self.lookup(handle)?.data() {
            ObjectData::ResourceLimit(limit) => Some(*limit),
            _ => None,
        }
    }

    pub fn port(&self, handle: Handle) -> Option<&PortData> {
        match self.lookup(handle)?.data() {
            ObjectData::Port(data) => Some(data),
            _ => None,
        }
    }

    pub fn session(&self, handle: Handle) -> Option<&SessionData> {
        match self.lookup(handle)?.data() {
            ObjectData::Session(data) => Some(data),
            _ => None,
        }
    }

    /// Resolve a process handle, treating `CURRENT_PROCESS` as the current process
    pub fn process_from_pid(&self, handle: Handle) -> Option<(Handle, &ProcessData)> {
        let handle = if handle == handles::CURRENT_PROCESS {
            self.current_process
        } else {
            handle
        };
        self.process(handle).map(|data| (handle, data))
    }

    #[inline]
    pub fn current_process(&self) -> Handle {
        self.current_process
    }

    /// Handle of the `srv:` port
    #[inline]
    pub fn srv_port(&self) -> Handle {
        self.srv_port
    }

    #[inline]
    pub fn max_handle(&self) -> Handle {
        self.max_handle
    }

    /// Number of live objects (equals the next handle to be allocated)
    #[inline]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[KernelObject] {
        &self.objects
    }

    /// Port handles in creation order
    pub fn port_handles(&self) -> &[Handle] {
        &self.port_handles
    }
}
