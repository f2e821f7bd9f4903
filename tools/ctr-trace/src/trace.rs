//! Script runner
//!
//! Builds a kernel and a memory image from a [`Script`] and issues its SVCs
//! one at a time.

use anyhow::{Context, Result};
use log::info;

use ctr_kernel::result::ResultCode;
use ctr_kernel::{
    FlatMemory, GuestMemory, Handle, Kernel, KernelConfig, KernelError, RegisterFile, Service,
};

use crate::script::{self, Script, SvcCall};

/// Stand-in for a real service: logs the request and reports success
pub struct StubService {
    name: String,
    requests: u32,
}

impl StubService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requests: 0,
        }
    }
}

impl Service for StubService {
    fn handle_sync_request(
        &mut self,
        mem: &mut dyn GuestMemory,
        message_pointer: u32,
    ) -> ctr_kernel::Result<()> {
        self.requests += 1;
        info!(
            "{}: request #{} (header = {:#010X})",
            self.name,
            self.requests,
            mem.read32(message_pointer)
        );
        mem.write32(message_pointer + 4, ResultCode::Success.raw());
        Ok(())
    }

    fn reset(&mut self) {
        self.requests = 0;
    }
}

pub struct Runner {
    pub kernel: Kernel,
    pub mem: FlatMemory,
}

impl Runner {
    pub fn new(script: &Script, config: KernelConfig) -> Result<Self> {
        let mem = script.build_memory(config.tls_base)?;
        let mut kernel = Kernel::new(config).context("Failed to create kernel")?;
        for (name, handle) in script.service_handles()? {
            register_stub(&mut kernel, &name, handle);
        }

        Ok(Self { kernel, mem })
    }

    /// Apply the memory writes attached to `call`
    pub fn prepare(&mut self, call: &SvcCall) -> Result<()> {
        script::apply_pokes(&mut self.mem, &call.pokes)
    }

    /// Issue one SVC, returning the register file after the call
    pub fn step(&mut self, call: &SvcCall) -> core::result::Result<RegisterFile, KernelError> {
        let mut regs = RegisterFile::from_slice(&call.regs);
        self.kernel.service_svc(call.id, &mut regs, &mut self.mem)?;
        Ok(regs)
    }
}

fn register_stub(kernel: &mut Kernel, name: &str, handle: Handle) {
    if kernel.services().is_registered(handle) {
        return;
    }
    kernel.register_service(handle, Box::new(StubService::new(name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctr_kernel::handles;
    use ctr_kernel::ipc::SrvCommand;

    fn runner(text: &str) -> Runner {
        let script = Script::parse(text).unwrap();
        let config = script.kernel.clone();
        Runner::new(&script, config).unwrap()
    }

    #[test]
    fn test_connect_and_get_service_handle() {
        let text = format!(
            r#"
[[region]]
base = 0x00100000
size = 0x1000

[[poke]]
addr = 0x00100000
string = "srv:"

[[poke]]
addr = 0xFF800080
word = {header}

[[poke]]
addr = 0xFF800084
string = "fs:USER"

[[svc]]
id = 0x2D
regs = [0, 0x00100000]
"#,
            header = SrvCommand::GetServiceHandle.header()
        );
        let script = Script::parse(&text).unwrap();
        let mut runner = runner(&text);

        let regs = runner.step(&script.calls[0]).unwrap();
        assert_eq!(regs[0], 0);
        let session = regs[1];

        let call = SvcCall {
            id: 0x32,
            regs: vec![session],
            expect_r0: Some(0),
            pokes: Vec::new(),
        };
        let regs = runner.step(&call).unwrap();
        assert_eq!(regs[0], 0);
        assert_eq!(runner.mem.read32(0xFF80_008C), handles::FS);
    }

    #[test]
    fn test_stubbed_service_answers() {
        let mut runner = runner(r#"services = ["hid:USER", "hid:SPVR"]"#);
        let call = SvcCall {
            id: 0x32,
            regs: vec![handles::HID],
            expect_r0: None,
            pokes: Vec::new(),
        };

        let regs = runner.step(&call).unwrap();
        assert_eq!(regs[0], 0);
        assert_eq!(runner.kernel.services().registered().count(), 1);
    }

    #[test]
    fn test_boot_script_runs_clean() {
        let script = Script::parse(include_str!("../scripts/boot.toml")).unwrap();
        let mut runner = Runner::new(&script, script.kernel.clone()).unwrap();

        let mut last = RegisterFile::new();
        for call in &script.calls {
            runner.prepare(call).unwrap();
            last = runner.step(call).unwrap();
            assert_eq!(Some(last[0]), call.expect_r0);
        }

        assert_eq!(runner.mem.read32(0xFF80_008C), handles::APT);
        assert_eq!(last[1], 2);
    }

    #[test]
    fn test_fatal_is_reported() {
        let mut runner = runner("");
        let call = SvcCall {
            id: 0x7F,
            regs: vec![],
            expect_r0: None,
            pokes: Vec::new(),
        };
        assert!(matches!(
            runner.step(&call),
            Err(KernelError::UnimplementedSvc { svc: 0x7F, .. })
        ));
    }
}
