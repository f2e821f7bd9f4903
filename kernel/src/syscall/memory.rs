//! ControlMemory
//!
//! Only committing fresh heap memory is supported. Allocation itself is the
//! guest memory collaborator's job; the kernel validates the request and
//! charges the size to the current process's commit counter.

use log::info;

use crate::context::RegisterFile;
use crate::error::{KernelError, Result};
use crate::kernel::Kernel;
use crate::memory::{is_page_aligned, GuestMemory, MemoryPerms};
use crate::result::ResultCode;

/// ControlMemory operation codes (low byte) and flags
pub mod operation {
    pub const FREE: u32 = 1;
    pub const RESERVE: u32 = 2;
    pub const COMMIT: u32 = 3;
    pub const MAP: u32 = 4;
    pub const UNMAP: u32 = 5;
    pub const PROTECT: u32 = 6;

    /// Allocate from the linear heap
    pub const LINEAR: u32 = 0x0001_0000;
}

/// Permission value meaning "whatever is appropriate", treated as read/write
pub const MEMORY_PERMS_DONT_CARE: u32 = 0x1000_0000;

fn control_memory_error(reason: impl Into<String>) -> KernelError {
    KernelError::ControlMemory {
        reason: reason.into(),
    }
}

// Result ControlMemory(u32* outaddr, u32 addr0, u32 addr1, u32 size, MemoryOperation operation, MemoryPermission permissions)
pub(super) fn svc_control_memory(
    kernel: &mut Kernel,
    regs: &mut RegisterFile,
    mem: &mut dyn GuestMemory,
) -> Result<()> {
    let op = regs[0];
    let addr0 = regs[1];
    let addr1 = regs[2];
    let size = regs[3];
    let raw_perms = regs[4];

    let perms = if raw_perms == MEMORY_PERMS_DONT_CARE {
        MemoryPerms::READ_WRITE
    } else {
        MemoryPerms::from_bits_truncate(raw_perms)
    };
    let linear = op & operation::LINEAR != 0;

    if perms.contains(MemoryPerms::EXECUTE) {
        return Err(control_memory_error("attempted to allocate executable memory"));
    }
    if !is_page_aligned(addr0) || !is_page_aligned(addr1) || !is_page_aligned(size) {
        return Err(control_memory_error(format!(
            "unaligned parameters (addr0 = {:#010X}, addr1 = {:#010X}, size = {:#X})",
            addr0, addr1, size
        )));
    }

    info!(
        "ControlMemory(addr0 = {:#010X}, addr1 = {:#010X}, size = {:#X}, operation = {:#X}, perms = {:?}, linear = {})",
        addr0, addr1, size, op, perms, linear
    );

    match op & 0xFF {
        operation::COMMIT => {
            let address = mem
                .allocate(addr0, size, linear, perms)
                .ok_or_else(|| {
                    control_memory_error(format!("failed to commit {:#X} bytes", size))
                })?;

            let current = kernel.store.current_process();
            if let Some(process) = kernel.store.process_mut(current) {
                process.limits.current_commit =
                    process.limits.current_commit.wrapping_add(size as i32);
            }
            regs[1] = address;
        }
        other => {
            return Err(control_memory_error(format!("unimplemented operation {:#X}", other)));
        }
    }

    regs.set_result(ResultCode::Success);
    Ok(())
}
