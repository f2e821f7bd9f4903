//! Trace scripts
//!
//! A script is a TOML file describing the guest memory image and the SVCs
//! to issue:
//!
//! ```toml
//! services = ["APT:U", "fs:USER"]
//!
//! [kernel]
//! max_handle = 0x100
//!
//! [[region]]
//! base = 0x00100000
//! size = 0x1000
//!
//! [[poke]]
//! addr = 0x00100000
//! string = "srv:"
//!
//! [[svc]]
//! id = 0x2D
//! regs = [0, 0x00100000]
//! expect_r0 = 0
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use ctr_kernel::context::NUM_REGS;
use ctr_kernel::ipc::srv;
use ctr_kernel::memory::PAGE_SIZE;
use ctr_kernel::{FlatMemory, GuestMemory, Handle, KernelConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Kernel configuration, defaults apply for missing fields
    #[serde(default)]
    pub kernel: KernelConfig,

    /// Service names (as passed to srv: GetServiceHandle) to stub out
    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default, rename = "region")]
    pub regions: Vec<Region>,

    #[serde(default, rename = "poke")]
    pub pokes: Vec<Poke>,

    #[serde(default, rename = "svc")]
    pub calls: Vec<SvcCall>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    pub base: u32,
    pub size: u32,
}

/// One write into guest memory, either a word or a NUL-terminated string
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Poke {
    pub addr: u32,
    pub word: Option<u32>,
    pub string: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SvcCall {
    pub id: u32,

    /// Initial r0.. values, the rest are zero
    #[serde(default)]
    pub regs: Vec<u32>,

    /// Fail the run if r0 differs after the call
    pub expect_r0: Option<u32>,

    /// Memory writes applied right before the call, e.g. an IPC request
    #[serde(default, rename = "poke")]
    pub pokes: Vec<Poke>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let script: Script = toml::from_str(text).context("Failed to parse TOML")?;
        script.validate()?;
        Ok(script)
    }

    fn validate(&self) -> Result<()> {
        let call_pokes = self.calls.iter().flat_map(|call| &call.pokes);
        for poke in self.pokes.iter().chain(call_pokes) {
            if poke.word.is_some() == poke.string.is_some() {
                bail!(
                    "poke at {:#010X} must set exactly one of `word` or `string`",
                    poke.addr
                );
            }
        }

        for call in &self.calls {
            if call.regs.len() > NUM_REGS {
                bail!(
                    "svc {:#X} sets {} registers, at most {} exist",
                    call.id,
                    call.regs.len(),
                    NUM_REGS
                );
            }
        }

        self.service_handles()?;
        Ok(())
    }

    /// Resolve `services` to their hardcoded handles
    pub fn service_handles(&self) -> Result<Vec<(String, Handle)>> {
        self.services
            .iter()
            .map(|name| match srv::service_handle(name) {
                Some(handle) => Ok((name.clone(), handle)),
                None => bail!("unknown service \"{}\"", name),
            })
            .collect()
    }

    /// Build the guest memory image: mapped regions, then pokes in order
    ///
    /// The TLS page at `tls_base` is mapped too unless a region covers it,
    /// since the IPC buffer lives there.
    pub fn build_memory(&self, tls_base: u32) -> Result<FlatMemory> {
        let mut mem = FlatMemory::new();
        for region in &self.regions {
            if !mem.map(region.base, region.size) {
                bail!(
                    "region {:#010X}+{:#X} overlaps another region or is empty",
                    region.base,
                    region.size
                );
            }
        }
        if !mem.is_mapped(tls_base) && !mem.map(tls_base & !(PAGE_SIZE - 1), PAGE_SIZE) {
            bail!("TLS page at {:#010X} overlaps a region", tls_base);
        }

        apply_pokes(&mut mem, &self.pokes)?;
        Ok(mem)
    }
}

/// Write `pokes` into `mem` in order
pub fn apply_pokes(mem: &mut FlatMemory, pokes: &[Poke]) -> Result<()> {
    for poke in pokes {
        if !mem.is_mapped(poke.addr) {
            bail!("poke at unmapped address {:#010X}", poke.addr);
        }
        match (poke.word, poke.string.as_deref()) {
            (Some(word), None) => mem.write32(poke.addr, word),
            (None, Some(string)) => mem.write_cstr(poke.addr, string),
            _ => bail!(
                "poke at {:#010X} must set exactly one of `word` or `string`",
                poke.addr
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctr_kernel::handles;

    const SCRIPT: &str = r#"
services = ["APT:U"]

[kernel]
max_handle = 0x100

[[region]]
base = 0x00100000
size = 0x1000

[[poke]]
addr = 0x00100000
string = "srv:"

[[poke]]
addr = 0x00100010
word = 0xCAFEBABE

[[svc]]
id = 0x2D
regs = [0, 0x00100000]
expect_r0 = 0

[[svc]]
id = 0x32
regs = [4]

[[svc.poke]]
addr = 0xFF800080
word = 0x00010002
"#;

    #[test]
    fn test_parse_script() {
        let script = Script::parse(SCRIPT).unwrap();

        assert_eq!(script.kernel.max_handle, 0x100);
        assert_eq!(script.kernel.tls_base, KernelConfig::default().tls_base);
        assert_eq!(script.regions.len(), 1);
        assert_eq!(script.calls[0].id, 0x2D);
        assert_eq!(script.calls[0].regs, vec![0, 0x0010_0000]);
        assert_eq!(script.calls[0].expect_r0, Some(0));
        assert!(script.calls[0].pokes.is_empty());
        assert_eq!(script.calls[1].pokes[0].word, Some(0x0001_0002));
        assert_eq!(
            script.service_handles().unwrap(),
            vec![("APT:U".to_string(), handles::APT)]
        );
    }

    #[test]
    fn test_build_memory() {
        let mem = Script::parse(SCRIPT).unwrap().build_memory(0xFF80_0000).unwrap();
        assert!(mem.is_mapped(0xFF80_0080));
        assert_eq!(mem.read_string(0x0010_0000, 12), "srv:");
        assert_eq!(mem.read32(0x0010_0010), 0xCAFE_BABE);
    }

    #[test]
    fn test_rejects_ambiguous_poke() {
        let text = r#"
[[poke]]
addr = 0
word = 1
string = "x"
"#;
        assert!(Script::parse(text).is_err());
    }

    #[test]
    fn test_rejects_empty_call_poke() {
        let text = r#"
[[svc]]
id = 0x32

[[svc.poke]]
addr = 0xFF800080
"#;
        assert!(Script::parse(text).is_err());
    }

    #[test]
    fn test_rejects_unknown_service() {
        assert!(Script::parse(r#"services = ["nope:u"]"#).is_err());
    }

    #[test]
    fn test_rejects_unknown_kernel_key() {
        assert!(Script::parse("[kernel]\nmax_handles = 3\n").is_err());
    }

    #[test]
    fn test_poke_outside_regions() {
        let text = r#"
[[poke]]
addr = 0x2000
word = 1
"#;
        let script = Script::parse(text).unwrap();
        assert!(script.build_memory(0xFF80_0000).is_err());
    }
}
