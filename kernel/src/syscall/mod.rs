//! System call interface
//!
//! Dispatches SVCs issued by the guest. Arguments come in r0-r4 and results
//! go back in r0 (status) and r1 (value). Every handler returns a host
//! [`Result`]: `Ok` means the guest-visible outcome has been written into
//! the register file, `Err` means emulation cannot continue.

pub mod numbers;

mod memory;
mod ports;
mod resource;

use log::{debug, info, warn};

use crate::context::RegisterFile;
use crate::error::{KernelError, Result};
use crate::kernel::Kernel;
use crate::memory::GuestMemory;
use crate::result::ResultCode;

pub use memory::{operation, MEMORY_PERMS_DONT_CARE};

/// Longest debug string the kernel will read in one call
pub const MAX_DEBUG_STRING_LEN: u32 = 0x1000;

/// Syscall dispatcher, called once per SVC instruction
pub fn handle_syscall(
    kernel: &mut Kernel,
    svc: u32,
    regs: &mut RegisterFile,
    mem: &mut dyn GuestMemory,
) -> Result<()> {
    match svc {
        numbers::SVC_CONTROL_MEMORY => memory::svc_control_memory(kernel, regs, mem),
        numbers::SVC_CREATE_ADDRESS_ARBITER => svc_create_address_arbiter(regs),
        numbers::SVC_CLOSE_HANDLE => svc_close_handle(regs),
        numbers::SVC_CONNECT_TO_PORT => ports::svc_connect_to_port(kernel, regs, mem),
        numbers::SVC_SEND_SYNC_REQUEST => ports::svc_send_sync_request(kernel, regs, mem),
        numbers::SVC_GET_RESOURCE_LIMIT => resource::svc_get_resource_limit(kernel, regs),
        numbers::SVC_GET_RESOURCE_LIMIT_LIMIT_VALUES => {
            resource::svc_get_resource_limit_limit_values(kernel, regs, mem)
        }
        numbers::SVC_GET_RESOURCE_LIMIT_CURRENT_VALUES => {
            resource::svc_get_resource_limit_current_values(kernel, regs, mem)
        }
        numbers::SVC_OUTPUT_DEBUG_STRING => svc_output_debug_string(regs, mem),
        _ => Err(KernelError::UnimplementedSvc { svc, pc: regs.pc() }),
    }
}

// Result CreateAddressArbiter(Handle* arbiter)
fn svc_create_address_arbiter(regs: &mut RegisterFile) -> Result<()> {
    warn!(
        "CreateAddressArbiter(handle pointer = {:#010X}) (stubbed)",
        regs[0]
    );
    regs.set_result(ResultCode::Success);
    Ok(())
}

// Result CloseHandle(Handle handle)
fn svc_close_handle(regs: &mut RegisterFile) -> Result<()> {
    warn!("CloseHandle(handle = {:#X}) (stubbed)", regs[0]);
    regs.set_result(ResultCode::Success);
    Ok(())
}

// void OutputDebugString(const char* str, s32 size)
fn svc_output_debug_string(regs: &mut RegisterFile, mem: &mut dyn GuestMemory) -> Result<()> {
    let pointer = regs[0];
    let size = regs[1].min(MAX_DEBUG_STRING_LEN);
    debug!("OutputDebugString(pointer = {:#010X}, size = {})", pointer, regs[1]);

    let message = mem.read_string(pointer, size as usize);
    info!(target: "ctr_kernel::debug_string", "{}", message);
    regs.set_result(ResultCode::Success);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::memory::FlatMemory;

    fn setup() -> (Kernel, FlatMemory) {
        let kernel = Kernel::new(KernelConfig::default()).unwrap();
        let mut mem = FlatMemory::new();
        mem.map(0x1000, 0x1000);
        (kernel, mem)
    }

    #[test]
    fn test_unmapped_svc_is_fatal() {
        let (mut kernel, mut mem) = setup();
        let mut regs = RegisterFile::new();
        regs[15] = 0x0010_0040;

        assert_eq!(
            handle_syscall(&mut kernel, 0x7F, &mut regs, &mut mem),
            Err(KernelError::UnimplementedSvc {
                svc: 0x7F,
                pc: 0x0010_0040
            })
        );
    }

    #[test]
    fn test_stubs_report_success() {
        let (mut kernel, mut mem) = setup();
        for svc in [numbers::SVC_CREATE_ADDRESS_ARBITER, numbers::SVC_CLOSE_HANDLE] {
            let mut regs = RegisterFile::from_slice(&[3]);
            handle_syscall(&mut kernel, svc, &mut regs, &mut mem).unwrap();
            assert_eq!(regs[0], ResultCode::Success.raw());
        }

        // CloseHandle does not free anything
        assert!(kernel.store().lookup(3).is_some());
    }

    #[test]
    fn test_output_debug_string() {
        let (mut kernel, mut mem) = setup();
        mem.write_cstr(0x1100, "hello from the guest");
        let mut regs = RegisterFile::from_slice(&[0x1100, 5]);

        handle_syscall(&mut kernel, numbers::SVC_OUTPUT_DEBUG_STRING, &mut regs, &mut mem).unwrap();
        assert_eq!(regs[0], 0);
    }

    #[test]
    fn test_every_numbered_svc_has_a_name() {
        for svc in [
            numbers::SVC_CONTROL_MEMORY,
            numbers::SVC_CREATE_ADDRESS_ARBITER,
            numbers::SVC_CLOSE_HANDLE,
            numbers::SVC_CONNECT_TO_PORT,
            numbers::SVC_SEND_SYNC_REQUEST,
            numbers::SVC_GET_RESOURCE_LIMIT,
            numbers::SVC_GET_RESOURCE_LIMIT_LIMIT_VALUES,
            numbers::SVC_GET_RESOURCE_LIMIT_CURRENT_VALUES,
            numbers::SVC_OUTPUT_DEBUG_STRING,
        ] {
            assert!(numbers::name(svc).is_some(), "svc {:#X}", svc);
        }
        assert_eq!(numbers::name(0x7F), None);
    }
}
