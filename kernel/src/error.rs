//! Host-fatal conditions
//!
//! Anything in here means the emulator hit a path it does not implement or
//! one of its own invariants broke. None of these are ever reported to the
//! guest as a result code; they bubble out of [`crate::Kernel::service_svc`]
//! and emulation stops.

use thiserror::Error;

use crate::handles::Handle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("handle space exhausted (limit {max:#010X})")]
    HandleSpaceExhausted { max: Handle },

    #[error("unimplemented svc {svc:#04X} @ {pc:#010X}")]
    UnimplementedSvc { svc: u32, pc: u32 },

    #[error("handle {handle:#X} is not a port")]
    NotAPort { handle: Handle },

    #[error("attempted to connect to private port \"{name}\"")]
    PrivatePort { name: String },

    #[error("session {session:#X} refers to port {port:#X} which no longer exists")]
    DanglingSession { session: Handle, port: Handle },

    #[error("SendSyncRequest targeting port \"{name}\"")]
    UnroutedPort { name: String },

    #[error("unknown \"srv:\" command {header:#010X}")]
    UnknownSrvCommand { header: u32 },

    #[error("unimplemented \"srv:\" command {command}")]
    UnimplementedSrvCommand { command: &'static str },

    #[error("srv: GetServiceHandle with unknown service \"{name}\"")]
    UnknownService { name: String },

    #[error("sent IPC message to unknown service {handle:#010X}")]
    UnknownServiceHandle { handle: Handle },

    #[error("attempted to name non-current process {pid:#X}")]
    NotCurrentProcess { pid: Handle },

    #[error("unknown kernel resource {resource}")]
    UnknownResource { resource: u32 },

    #[error("ControlMemory: {reason}")]
    ControlMemory { reason: String },

    #[error("invalid kernel config: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = core::result::Result<T, KernelError>;
