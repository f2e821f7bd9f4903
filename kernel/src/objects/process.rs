//! Processes and resource limits
//!
//! Only one process exists for now (the application), created at reset and
//! recorded as the current process. Its resource limits are embedded in the
//! process payload; the separate `ResourceLimit` object exists so the guest
//! has a handle to pass to the GetResourceLimit* SVCs.

use crate::error::{KernelError, Result};
use crate::handles::{self, Handle};

/// PID of the application process
pub const APPLICATION_PID: u32 = 0;

/// Limitable resources, as numbered by the GetResourceLimit* SVCs
pub mod resource {
    pub const PRIORITY: u32 = 0;
    pub const COMMIT: u32 = 1;
    pub const THREAD: u32 = 2;
    pub const EVENTS: u32 = 3;
    pub const MUTEX: u32 = 4;
    pub const SEMAPHORE: u32 = 5;
    pub const TIMER: u32 = 6;
    pub const SHARED_MEMORY: u32 = 7;
    pub const ADDRESS_ARBITER: u32 = 8;
    pub const CPU_TIME: u32 = 9;

    /// Number of limitable resources
    pub const COUNT: u32 = CPU_TIME + 1;
}

/// Maximum value of `resource` under the APPLICATION resource limit category
pub fn application_limit(resource: u32) -> Result<u32> {
    let max = match resource {
        resource::PRIORITY => 0x18,
        resource::COMMIT => 0x0400_0000,
        resource::THREAD => 32,
        resource::EVENTS => 32,
        resource::MUTEX => 32,
        resource::SEMAPHORE => 8,
        resource::TIMER => 8,
        resource::SHARED_MEMORY => 16,
        resource::ADDRESS_ARBITER => 2,
        resource::CPU_TIME => 0,
        _ => return Err(KernelError::UnknownResource { resource }),
    };
    Ok(max)
}

/// Limits embedded in a process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Handle of the `ResourceLimit` object exposing these limits
    pub handle: Handle,

    /// Bytes committed through ControlMemory
    pub current_commit: i32,
}

impl ResourceLimits {
    /// Current usage of `resource`; only committed memory is tracked
    pub fn current_value(&self, resource: u32) -> Result<i32> {
        match resource {
            resource::COMMIT => Ok(self.current_commit),
            _ => Err(KernelError::UnknownResource { resource }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessData {
    pub pid: u32,
    pub limits: ResourceLimits,
}

/// Payload of a `ResourceLimit` object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimitRef {
    /// Process whose embedded limits this object exposes
    pub process: Handle,
}

/// Name of a process for diagnostics
///
/// Naming is only defined for the current process.
pub fn process_name(pid: Handle) -> Result<&'static str> {
    if pid == handles::CURRENT_PROCESS {
        Ok("current")
    } else {
        Err(KernelError::NotCurrentProcess { pid })
    }
}
