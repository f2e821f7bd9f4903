//! CTR HLE Kernel - object/handle layer and IPC substrate
//!
//! # Purpose
//! Emulates the part of the console kernel that guest code reaches through
//! SVCs: handle allocation, kernel object lifetime, named ports, sessions,
//! and synchronous IPC routed to the `srv:` meta-service or straight to a
//! hardcoded service handle.
//!
//! # Integration Points
//! - Depends on: the CPU core (register file), guest memory
//! - Provides to: the emulator frontend (one `service_svc` call per SVC)
//! - IPC endpoints: `srv:` port, fixed service handles
//! - Collaborators: [`GuestMemory`], [`Service`]
//!
//! # Architecture
//! - [`handles`]: partition of the 32-bit handle namespace
//! - [`objects`]: object store, processes, ports and sessions
//! - [`syscall`]: SVC numbers and handlers
//! - [`ipc`]: message buffer layout, `srv:` commands, service routing table
//!
//! Two failure channels are kept apart. Guest-visible failures are a
//! [`ResultCode`] written back into r0 (or into the IPC buffer). Host-fatal
//! conditions are a [`KernelError`] returned from [`Kernel::service_svc`];
//! the caller must stop emulation when it sees one.
//!
//! # Testing Strategy
//! - Unit tests: handle ranges, allocation, port lookup, srv: decoding
//! - Integration tests: SVC-level scenarios over [`FlatMemory`]

pub mod config;
pub mod context;
pub mod error;
pub mod handles;
pub mod ipc;
pub mod kernel;
pub mod memory;
pub mod objects;
pub mod result;
pub mod syscall;

pub use config::KernelConfig;
pub use context::RegisterFile;
pub use error::{KernelError, Result};
pub use handles::Handle;
pub use ipc::{Service, ServiceManager};
pub use kernel::Kernel;
pub use memory::{FlatMemory, GuestMemory, MemoryPerms};
pub use objects::{KernelObject, KernelObjectType, ObjectStore};
pub use result::{GuestResult, ResultCode};
