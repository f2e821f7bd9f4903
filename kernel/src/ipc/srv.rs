//! `srv:` service manager port
//!
//! Every application starts by connecting to `srv:`, registering itself as a
//! client, and then asking for handles to the services it needs by name.
//! Requests arrive on a session to the `srv:` port; the command is the
//! header word at the start of the IPC buffer.
//!
//! # Layout
//!
//! | Command          | Request                                   | Response              |
//! |------------------|-------------------------------------------|-----------------------|
//! | RegisterClient   | -                                         | +4 result             |
//! | GetServiceHandle | +4 name (8 bytes), +12 length, +16 flags  | +4 result, +12 handle |
//! | ReceiveNotification | -                                      | +4 result, +8 id      |
//!
//! Commands that are known but not emulated stop emulation, as do unknown
//! headers.

use log::{debug, info, warn};

use super::{Header, RESULT_OFFSET};
use crate::error::{KernelError, Result};
use crate::handles::{self, Handle};
use crate::memory::GuestMemory;
use crate::result::ResultCode;

/// Longest service name GetServiceHandle accepts
pub const MAX_SERVICE_NAME_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SrvCommand {
    RegisterClient = 0x0001_0002,
    EnableNotification = 0x0002_0000,
    RegisterService = 0x0003_0100,
    UnregisterService = 0x0004_00C0,
    GetServiceHandle = 0x0005_0100,
    RegisterPort = 0x0006_00C2,
    UnregisterPort = 0x0007_00C0,
    GetPort = 0x0008_0100,
    Subscribe = 0x0009_0040,
    Unsubscribe = 0x000A_0040,
    ReceiveNotification = 0x000B_0000,
    PublishToSubscriber = 0x000C_0080,
    PublishAndGetSubscriber = 0x000D_0040,
    IsServiceRegistered = 0x000E_00C0,
}

impl SrvCommand {
    pub const ALL: [SrvCommand; 14] = [
        Self::RegisterClient,
        Self::EnableNotification,
        Self::RegisterService,
        Self::UnregisterService,
        Self::GetServiceHandle,
        Self::RegisterPort,
        Self::UnregisterPort,
        Self::GetPort,
        Self::Subscribe,
        Self::Unsubscribe,
        Self::ReceiveNotification,
        Self::PublishToSubscriber,
        Self::PublishAndGetSubscriber,
        Self::IsServiceRegistered,
    ];

    #[inline]
    pub const fn header(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::RegisterClient => "RegisterClient",
            Self::EnableNotification => "EnableNotification",
            Self::RegisterService => "RegisterService",
            Self::UnregisterService => "UnregisterService",
            Self::GetServiceHandle => "GetServiceHandle",
            Self::RegisterPort => "RegisterPort",
            Self::UnregisterPort => "UnregisterPort",
            Self::GetPort => "GetPort",
            Self::Subscribe => "Subscribe",
            Self::Unsubscribe => "Unsubscribe",
            Self::ReceiveNotification => "ReceiveNotification",
            Self::PublishToSubscriber => "PublishToSubscriber",
            Self::PublishAndGetSubscriber => "PublishAndGetSubscriber",
            Self::IsServiceRegistered => "IsServiceRegistered",
        }
    }
}

impl TryFrom<u32> for SrvCommand {
    type Error = KernelError;

    fn try_from(header: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|command| command.header() == header)
            .ok_or(KernelError::UnknownSrvCommand { header })
    }
}

/// Map a service name to its hardcoded handle
///
/// Several names share a handle: `APT:S`, `APT:A` and `APT:U` are all the
/// same APT service, as are the `cfg:` and `frd:` variants.
pub fn service_handle(name: &str) -> Option<Handle> {
    let handle = match name {
        "ac:u" => handles::AC,
        "APT:S" | "APT:A" | "APT:U" => handles::APT,
        "cecd:u" => handles::CECD,
        "cfg:u" | "cfg:s" | "cfg:i" => handles::CFG,
        "hid:USER" | "hid:SPVR" => handles::HID,
        "frd:u" | "frd:a" => handles::FRD,
        "fs:USER" => handles::FS,
        "gsp::Gpu" => handles::GPU,
        "dsp::DSP" => handles::DSP,
        "gsp::Lcd" => handles::LCD,
        "mic:u" => handles::MIC,
        "ndm:u" => handles::NDM,
        "ptm:u" | "ptm:sysm" => handles::PTM,
        _ => return None,
    };
    Some(handle)
}

/// Decode and run one `srv:` request
pub fn handle_sync_request(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    let header = mem.read32(message_pointer);
    let command = SrvCommand::try_from(header)?;
    debug!(
        "srv: {} (id {:#X}, header {:#010X})",
        command.name(),
        Header(header).command_id(),
        header
    );

    match command {
        SrvCommand::RegisterClient => register_client(mem, message_pointer),
        SrvCommand::EnableNotification => enable_notification(mem, message_pointer),
        SrvCommand::GetServiceHandle => get_service_handle(mem, message_pointer),
        SrvCommand::Subscribe => subscribe(mem, message_pointer),
        SrvCommand::Unsubscribe => unsubscribe(mem, message_pointer),
        SrvCommand::ReceiveNotification => receive_notification(mem, message_pointer),
        other => Err(KernelError::UnimplementedSrvCommand {
            command: other.name(),
        }),
    }
}

fn write_result(mem: &mut dyn GuestMemory, message_pointer: u32, result: ResultCode) {
    mem.write32(message_pointer + RESULT_OFFSET, result.raw());
}

fn register_client(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    write_result(mem, message_pointer, ResultCode::Success);
    Ok(())
}

// Notification semaphores are not modelled yet; the guest only checks the result.
fn enable_notification(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    warn!("srv: EnableNotification (stubbed)");
    write_result(mem, message_pointer, ResultCode::Success);
    Ok(())
}

fn get_service_handle(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    let name = mem.read_string(message_pointer + 4, MAX_SERVICE_NAME_LEN);
    let name_length = mem.read32(message_pointer + 12);
    let flags = mem.read32(message_pointer + 16);
    info!(
        "srv: GetServiceHandle (name = {}, length = {}, flags = {:#X})",
        name, name_length, flags
    );

    let handle = service_handle(&name).ok_or_else(|| KernelError::UnknownService { name })?;

    write_result(mem, message_pointer, ResultCode::Success);
    mem.write32(message_pointer + 12, handle);
    Ok(())
}

fn subscribe(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    let id = mem.read32(message_pointer + 4);
    warn!("srv: Subscribe (id = {:#X}) (stubbed)", id);
    write_result(mem, message_pointer, ResultCode::Success);
    Ok(())
}

fn unsubscribe(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    let id = mem.read32(message_pointer + 4);
    warn!("srv: Unsubscribe (id = {:#X}) (stubbed)", id);
    write_result(mem, message_pointer, ResultCode::Success);
    Ok(())
}

fn receive_notification(mem: &mut dyn GuestMemory, message_pointer: u32) -> Result<()> {
    warn!("srv: ReceiveNotification (stubbed)");
    write_result(mem, message_pointer, ResultCode::Success);
    mem.write32(message_pointer + 8, 0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    const MSG: u32 = 0x2000;

    fn message(header: u32) -> FlatMemory {
        let mut mem = FlatMemory::new();
        mem.map(MSG, 0x100);
        mem.write32(MSG, header);
        mem.write32(MSG + 4, 0xDEAD_BEEF);
        mem
    }

    fn get_service_handle_request(name: &str) -> FlatMemory {
        let mut mem = message(SrvCommand::GetServiceHandle.header());
        mem.write32(MSG + 4, 0);
        mem.write32(MSG + 8, 0);
        let bytes = name.as_bytes();
        mem.write_bytes(MSG + 4, &bytes[..bytes.len().min(MAX_SERVICE_NAME_LEN)]);
        mem.write32(MSG + 12, name.len() as u32);
        mem.write32(MSG + 16, 0);
        mem
    }

    #[test]
    fn test_command_decoding() {
        for command in SrvCommand::ALL {
            assert_eq!(SrvCommand::try_from(command.header()), Ok(command));
        }
        assert_eq!(
            SrvCommand::try_from(0x1234_5678),
            Err(KernelError::UnknownSrvCommand { header: 0x1234_5678 })
        );
    }

    #[test]
    fn test_register_client() {
        let mut mem = message(SrvCommand::RegisterClient.header());
        handle_sync_request(&mut mem, MSG).unwrap();
        assert_eq!(mem.read32(MSG + 4), 0);
    }

    #[test]
    fn test_get_service_handle() {
        let mut mem = get_service_handle_request("APT:S");
        handle_sync_request(&mut mem, MSG).unwrap();

        assert_eq!(mem.read32(MSG + 4), ResultCode::Success.raw());
        assert_eq!(mem.read32(MSG + 12), handles::APT);
    }

    #[test]
    fn test_get_service_handle_full_width_name() {
        let mut mem = get_service_handle_request("hid:SPVR");
        handle_sync_request(&mut mem, MSG).unwrap();
        assert_eq!(mem.read32(MSG + 12), handles::HID);
    }

    #[test]
    fn test_get_service_handle_unknown_name() {
        let mut mem = get_service_handle_request("nope:u");
        assert_eq!(
            handle_sync_request(&mut mem, MSG),
            Err(KernelError::UnknownService {
                name: "nope:u".to_string()
            })
        );
    }

    #[test]
    fn test_service_name_aliases() {
        assert_eq!(service_handle("APT:A"), service_handle("APT:U"));
        assert_eq!(service_handle("cfg:s"), Some(handles::CFG));
        assert_eq!(service_handle("ptm:sysm"), Some(handles::PTM));
        assert_eq!(service_handle("gsp::Gpu"), Some(handles::GPU));
        assert_eq!(service_handle("fs:USER"), Some(handles::FS));
        assert_eq!(service_handle("fs:LDR"), None);
    }

    #[test]
    fn test_receive_notification() {
        let mut mem = message(SrvCommand::ReceiveNotification.header());
        mem.write32(MSG + 8, 0xFFFF_FFFF);
        handle_sync_request(&mut mem, MSG).unwrap();

        assert_eq!(mem.read32(MSG + 4), 0);
        assert_eq!(mem.read32(MSG + 8), 0);
    }

    #[test]
    fn test_stubbed_commands_succeed() {
        for command in [
            SrvCommand::EnableNotification,
            SrvCommand::Subscribe,
            SrvCommand::Unsubscribe,
        ] {
            let mut mem = message(command.header());
            handle_sync_request(&mut mem, MSG).unwrap();
            assert_eq!(mem.read32(MSG + 4), 0, "{}", command.name());
        }
    }

    #[test]
    fn test_unimplemented_command_is_fatal() {
        let mut mem = message(SrvCommand::RegisterService.header());
        assert_eq!(
            handle_sync_request(&mut mem, MSG),
            Err(KernelError::UnimplementedSrvCommand {
                command: "RegisterService"
            })
        );
        // Response untouched
        assert_eq!(mem.read32(MSG + 4), 0xDEAD_BEEF);
    }
}
