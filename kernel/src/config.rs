//! Kernel configuration
//!
//! Runtime knobs for the HLE kernel. Everything has a default matching the
//! console, so `KernelConfig::default()` is what a normal frontend uses; the
//! overrides exist for hosts and tests that want a smaller handle space or a
//! different TLS placement.

use crate::error::{KernelError, Result};
use crate::handles::{self, Handle};

/// Thread-local storage base of the (single) guest thread
pub const DEFAULT_TLS_BASE: u32 = 0xFF80_0000;

/// Initial object list reservation, avoids reallocations during boot
pub const DEFAULT_OBJECT_CAPACITY: usize = 512;

/// Initial port directory reservation
pub const DEFAULT_PORT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct KernelConfig {
    /// Highest handle the object store may allocate
    pub max_handle: Handle,

    /// TLS base address; the IPC buffer lives at `tls_base + 0x80`
    pub tls_base: u32,

    pub object_capacity: usize,

    pub port_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_handle: handles::MAX,
            tls_base: DEFAULT_TLS_BASE,
            object_capacity: DEFAULT_OBJECT_CAPACITY,
            port_capacity: DEFAULT_PORT_CAPACITY,
        }
    }
}

impl KernelConfig {
    /// Check the config against the handle-space invariants
    ///
    /// The dynamic range must stay below the hardcoded handles, and must be
    /// large enough to hold the boot objects (dummy, process, resource
    /// limit and the `srv:` port).
    pub fn validate(&self) -> Result<()> {
        if self.max_handle > handles::MAX {
            return Err(KernelError::InvalidConfig {
                reason: format!(
                    "max_handle {:#010X} overlaps the hardcoded handles (limit {:#010X})",
                    self.max_handle,
                    handles::MAX
                ),
            });
        }

        if self.max_handle < 3 {
            return Err(KernelError::InvalidConfig {
                reason: format!("max_handle {} cannot hold the boot objects", self.max_handle),
            });
        }

        if self.tls_base % 4 != 0 {
            return Err(KernelError::InvalidConfig {
                reason: format!("tls_base {:#010X} is not word aligned", self.tls_base),
            });
        }

        Ok(())
    }
}
