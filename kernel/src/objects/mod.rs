//! Kernel Object Model
//!
//! Every resource the guest can name through a dynamic handle is a
//! [`KernelObject`] owned by the [`ObjectStore`].
//!
//! ## Object Types
//!
//! - **Dummy**: reserves handle 0 (the null handle)
//! - **Process**: owns its resource limits
//! - **ResourceLimit**: view onto the limits embedded in a process
//! - **Port**: named rendezvous point, public iff the name is non-empty
//! - **Session**: channel opened by connecting to a port
//!
//! ## Payload Ownership
//!
//! The payload is part of the object's type ([`ObjectData`]), so the tag and
//! the data cannot disagree. A `ResourceLimit` does not own anything: it
//! stores the handle of the process whose limits it exposes. Dropping it
//! releases nothing, the limits go away with the process.

pub mod directory;
pub mod port;
pub mod process;
pub mod store;

use core::fmt;

use crate::handles::Handle;

pub use port::{PortData, SessionData};
pub use process::{ProcessData, ResourceLimitRef, ResourceLimits};
pub use store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelObjectType {
    Dummy,
    Process,
    ResourceLimit,
    Port,
    Session,
}

impl KernelObjectType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dummy => "dummy",
            Self::Process => "process",
            Self::ResourceLimit => "resource limit",
            Self::Port => "port",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for KernelObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of a kernel object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    Dummy,
    Process(ProcessData),
    /// Non-owning: refers to the parent process by handle
    ResourceLimit(ResourceLimitRef),
    Port(PortData),
    Session(SessionData),
}

impl ObjectData {
    pub const fn kind(&self) -> KernelObjectType {
        match self {
            Self::Dummy => KernelObjectType::Dummy,
            Self::Process(_) => KernelObjectType::Process,
            Self::ResourceLimit(_) => KernelObjectType::ResourceLimit,
            Self::Port(_) => KernelObjectType::Port,
            Self::Session(_) => KernelObjectType::Session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelObject {
    handle: Handle,
    data: ObjectData,
}

impl KernelObject {
    pub(crate) fn new(handle: Handle, data: ObjectData) -> Self {
        Self { handle, data }
    }

    #[inline]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[inline]
    pub fn kind(&self) -> KernelObjectType {
        self.data.kind()
    }

    #[inline]
    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut ObjectData {
        &mut self.data
    }
}
