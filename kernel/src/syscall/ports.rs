//! Port and IPC syscalls
//!
//! ConnectToPort opens a session on a named port; SendSyncRequest delivers
//! the message in the IPC buffer either to the `srv:` handler (for sessions
//! on the `srv:` port) or straight to a service collaborator (for hardcoded
//! service handles).

use log::{debug, info};

use crate::context::RegisterFile;
use crate::error::{KernelError, Result};
use crate::handles;
use crate::kernel::Kernel;
use crate::memory::GuestMemory;
use crate::objects::PortData;
use crate::result::ResultCode;

// Result ConnectToPort(Handle* out, const char* portName)
pub(super) fn svc_connect_to_port(
    kernel: &mut Kernel,
    regs: &mut RegisterFile,
    mem: &mut dyn GuestMemory,
) -> Result<()> {
    let handle_pointer = regs[0];
    // One extra byte so an overlong name is seen as overlong, not truncated
    let name = mem.read_bytes(regs[1], PortData::MAX_NAME_LEN + 1);
    let port = String::from_utf8_lossy(&name);
    info!(
        "ConnectToPort(handle pointer = {:#010X}, port = \"{}\")",
        handle_pointer, port
    );

    match kernel.store.connect(&name)? {
        Ok(session) => {
            regs.set_result(ResultCode::Success);
            regs[1] = session;
        }
        Err(code) => {
            debug!("ConnectToPort(\"{}\") failed: {}", port, code);
            regs.set_result(code);
        }
    }
    Ok(())
}

// Result SendSyncRequest(Handle session)
pub(super) fn svc_send_sync_request(
    kernel: &mut Kernel,
    regs: &mut RegisterFile,
    mem: &mut dyn GuestMemory,
) -> Result<()> {
    let handle = regs[0];
    let message_pointer = kernel.message_pointer();
    debug!("SendSyncRequest(session handle = {:#X})", handle);

    // Direct requests to a service skip the session path entirely
    if handles::is_service_handle(handle) {
        kernel
            .services
            .send_command_to_service(mem, message_pointer, handle)?;
        regs.set_result(ResultCode::Success);
        return Ok(());
    }

    let Some(session) = kernel.store.session(handle) else {
        debug!("SendSyncRequest: {:#X} is not a session", handle);
        regs.set_result(ResultCode::BadHandle);
        return Ok(());
    };
    let port = session.port;

    if port == kernel.store.srv_port() {
        kernel.services.handle_sync_request(mem, message_pointer)?;
    } else {
        return Err(match kernel.store.port(port) {
            Some(data) => KernelError::UnroutedPort { name: data.name() },
            None => KernelError::DanglingSession {
                session: handle,
                port,
            },
        });
    }

    regs.set_result(ResultCode::Success);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelConfig;
    use crate::ipc::SrvCommand;
    use crate::memory::FlatMemory;
    use crate::syscall::numbers;

    const NAME: u32 = 0x1000;

    fn setup() -> (Kernel, FlatMemory) {
        let kernel = Kernel::new(KernelConfig::default()).unwrap();
        let mut mem = FlatMemory::new();
        mem.map(NAME, 0x1000);
        mem.map(KernelConfig::default().tls_base, 0x1000);
        (kernel, mem)
    }

    fn connect(kernel: &mut Kernel, mem: &mut FlatMemory, name: &str) -> RegisterFile {
        mem.write_cstr(NAME, name);
        let mut regs = RegisterFile::from_slice(&[0, NAME]);
        kernel
            .service_svc(numbers::SVC_CONNECT_TO_PORT, &mut regs, mem)
            .unwrap();
        regs
    }

    #[test]
    fn test_connect_to_srv() {
        let (mut kernel, mut mem) = setup();
        let regs = connect(&mut kernel, &mut mem, "srv:");

        assert_eq!(regs[0], ResultCode::Success.raw());
        assert_eq!(kernel.store().session(regs[1]).unwrap().port, kernel.store().srv_port());
    }

    #[test]
    fn test_connect_name_too_long() {
        let (mut kernel, mut mem) = setup();
        let before = kernel.store().len();
        let regs = connect(&mut kernel, &mut mem, "a_very_long_port");

        assert_eq!(regs[0], ResultCode::PortNameTooLong.raw());
        assert_eq!(regs[1], NAME);
        assert_eq!(kernel.store().len(), before);
    }

    #[test]
    fn test_connect_missing_port() {
        let (mut kernel, mut mem) = setup();
        let regs = connect(&mut kernel, &mut mem, "err:f");
        assert_eq!(regs[0], ResultCode::ObjectNotFound.raw());
    }

    #[test]
    fn test_connect_non_utf8_name_is_not_found() {
        let (mut kernel, mut mem) = setup();
        mem.write_bytes(NAME, &[0xFF, 0xFF, 0xFF, 0xFF, 0x00]);

        let mut regs = RegisterFile::from_slice(&[0, NAME]);
        kernel
            .service_svc(numbers::SVC_CONNECT_TO_PORT, &mut regs, &mut mem)
            .unwrap();
        assert_eq!(regs[0], ResultCode::ObjectNotFound.raw());

        // Raw length decides, even for bytes that are not text
        mem.write_bytes(NAME, &[0xFF; 12]);
        let mut regs = RegisterFile::from_slice(&[0, NAME]);
        kernel
            .service_svc(numbers::SVC_CONNECT_TO_PORT, &mut regs, &mut mem)
            .unwrap();
        assert_eq!(regs[0], ResultCode::PortNameTooLong.raw());
    }

    #[test]
    fn test_send_sync_request_bad_handle() {
        let (mut kernel, mut mem) = setup();

        // Not allocated
        let mut regs = RegisterFile::from_slice(&[0x1234]);
        kernel
            .service_svc(numbers::SVC_SEND_SYNC_REQUEST, &mut regs, &mut mem)
            .unwrap();
        assert_eq!(regs[0], ResultCode::BadHandle.raw());

        // Allocated, but a port rather than a session
        let mut regs = RegisterFile::from_slice(&[kernel.store().srv_port()]);
        kernel
            .service_svc(numbers::SVC_SEND_SYNC_REQUEST, &mut regs, &mut mem)
            .unwrap();
        assert_eq!(regs[0], ResultCode::BadHandle.raw());
    }

    #[test]
    fn test_send_sync_request_srv() {
        let (mut kernel, mut mem) = setup();
        let session = connect(&mut kernel, &mut mem, "srv:")[1];
        let message = kernel.message_pointer();
        mem.write32(message, SrvCommand::RegisterClient.header());
        mem.write32(message + 4, 0xFFFF_FFFF);

        let mut regs = RegisterFile::from_slice(&[session]);
        kernel
            .service_svc(numbers::SVC_SEND_SYNC_REQUEST, &mut regs, &mut mem)
            .unwrap();

        assert_eq!(regs[0], ResultCode::Success.raw());
        assert_eq!(mem.read32(message + 4), 0);
    }

    #[test]
    fn test_send_sync_request_other_port_is_fatal() {
        let (mut kernel, mut mem) = setup();
        let port = kernel.store_mut().make_port("err:f").unwrap();
        let session = kernel.store_mut().make_session(port).unwrap();

        let mut regs = RegisterFile::from_slice(&[session]);
        assert_eq!(
            kernel.service_svc(numbers::SVC_SEND_SYNC_REQUEST, &mut regs, &mut mem),
            Err(KernelError::UnroutedPort {
                name: "err:f".to_string()
            })
        );
    }

    #[test]
    fn test_send_sync_request_unregistered_service_is_fatal() {
        let (mut kernel, mut mem) = setup();
        let mut regs = RegisterFile::from_slice(&[handles::HID]);

        assert_eq!(
            kernel.service_svc(numbers::SVC_SEND_SYNC_REQUEST, &mut regs, &mut mem),
            Err(KernelError::UnknownServiceHandle {
                handle: handles::HID
            })
        );
    }
}
