//! Guest memory collaborator
//!
//! The kernel never touches host pointers for guest data. Everything goes
//! through [`GuestMemory`]: 32-bit reads and writes at guest virtual
//! addresses, bounded string reads for port/service names and debug output,
//! and heap allocation for ControlMemory.
//!
//! [`FlatMemory`] is a small region-mapped implementation used by the tests
//! and the trace tool. A real frontend plugs in its own memory subsystem.

use bitflags::bitflags;
use log::warn;

/// Page size (4KB)
pub const PAGE_SIZE: u32 = 0x1000;

/// Base of the application heap (ControlMemory commit without the linear flag)
pub const NORMAL_HEAP_START: u32 = 0x0800_0000;

/// Base of the linear heap (ControlMemory commit with the linear flag)
pub const LINEAR_HEAP_START: u32 = 0x1400_0000;

bitflags! {
    /// Guest page permissions
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryPerms: u32 {
        const READ    = 1 << 0;
        const WRITE   = 1 << 1;
        const EXECUTE = 1 << 2;

        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
    }
}

#[inline]
pub const fn is_page_aligned(value: u32) -> bool {
    value % PAGE_SIZE == 0
}

/// Guest address space as seen by the kernel
pub trait GuestMemory {
    fn read8(&self, addr: u32) -> u8;

    fn read32(&self, addr: u32) -> u32;

    fn write8(&mut self, addr: u32, value: u8);

    fn write32(&mut self, addr: u32, value: u32);

    fn write64(&mut self, addr: u32, value: u64) {
        self.write32(addr, value as u32);
        self.write32(addr.wrapping_add(4), (value >> 32) as u32);
    }

    /// Read at most `max_len` raw bytes, stopping at the first NUL
    fn read_bytes(&self, addr: u32, max_len: usize) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(max_len);
        for offset in 0..max_len as u32 {
            let byte = self.read8(addr.wrapping_add(offset));
            if byte == 0 {
                break;
            }
            bytes.push(byte);
        }
        bytes
    }

    /// Like [`GuestMemory::read_bytes`], decoded lossily for display
    fn read_string(&self, addr: u32, max_len: usize) -> String {
        String::from_utf8_lossy(&self.read_bytes(addr, max_len)).into_owned()
    }

    /// Commit `size` bytes of guest memory
    ///
    /// `vaddr == 0` lets the memory subsystem pick the address. Returns the
    /// base of the new block, or `None` if the request cannot be satisfied.
    fn allocate(&mut self, vaddr: u32, size: u32, linear: bool, perms: MemoryPerms) -> Option<u32>;
}

/// A mapped block of guest memory
#[derive(Debug, Clone)]
struct Region {
    base: u32,
    perms: MemoryPerms,
    data: Vec<u8>,
}

impl Region {
    fn end(&self) -> u64 {
        self.base as u64 + self.data.len() as u64
    }

    fn contains(&self, addr: u32) -> bool {
        addr >= self.base && (addr as u64) < self.end()
    }

    fn overlaps(&self, base: u32, size: u32) -> bool {
        (base as u64) < self.end() && (base as u64 + size as u64) > self.base as u64
    }
}

/// Little-endian, region-mapped guest memory
///
/// Accesses outside every mapped region are logged and read as zero;
/// writes to them are dropped.
#[derive(Debug, Clone)]
pub struct FlatMemory {
    regions: Vec<Region>,
    next_normal: u32,
    next_linear: u32,
}

impl FlatMemory {
    pub fn new() -> Self {
        Self {
            regions: Vec::new(),
            next_normal: NORMAL_HEAP_START,
            next_linear: LINEAR_HEAP_START,
        }
    }

    /// Map a zero-filled read/write region
    ///
    /// Returns false if the region would overlap an existing one.
    pub fn map(&mut self, base: u32, size: u32) -> bool {
        self.map_with_perms(base, size, MemoryPerms::READ_WRITE)
    }

    fn map_with_perms(&mut self, base: u32, size: u32, perms: MemoryPerms) -> bool {
        if size == 0 || base as u64 + size as u64 > u32::MAX as u64 + 1 {
            return false;
        }
        if self.regions.iter().any(|r| r.overlaps(base, size)) {
            return false;
        }

        self.regions.push(Region {
            base,
            perms,
            data: vec![0; size as usize],
        });
        true
    }

    pub fn is_mapped(&self, addr: u32) -> bool {
        self.region(addr).is_some()
    }

    /// Permissions of the region containing `addr`
    pub fn perms(&self, addr: u32) -> Option<MemoryPerms> {
        self.region(addr).map(|r| r.perms)
    }

    /// Copy `bytes` into guest memory starting at `addr`
    pub fn write_bytes(&mut self, addr: u32, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.write8(addr.wrapping_add(i as u32), *byte);
        }
    }

    /// Write `s` followed by a NUL terminator
    pub fn write_cstr(&mut self, addr: u32, s: &str) {
        self.write_bytes(addr, s.as_bytes());
        self.write8(addr.wrapping_add(s.len() as u32), 0);
    }

    fn region(&self, addr: u32) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(addr))
    }

    fn region_mut(&mut self, addr: u32) -> Option<&mut Region> {
        self.regions.iter_mut().find(|r| r.contains(addr))
    }
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestMemory for FlatMemory {
    fn read8(&self, addr: u32) -> u8 {
        match self.region(addr) {
            Some(region) => region.data[(addr - region.base) as usize],
            None => {
                warn!("unmapped 8-bit read @ {:#010X}", addr);
                0
            }
        }
    }

    fn read32(&self, addr: u32) -> u32 {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read8(addr.wrapping_add(i as u32));
        }
        u32::from_le_bytes(bytes)
    }

    fn write8(&mut self, addr: u32, value: u8) {
        match self.region_mut(addr) {
            Some(region) => {
                let offset = (addr - region.base) as usize;
                region.data[offset] = value;
            }
            None => warn!("unmapped 8-bit write @ {:#010X} (value = {:#04X})", addr, value),
        }
    }

    fn write32(&mut self, addr: u32, value: u32) {
        for (i, byte) in value.to_le_bytes().iter().enumerate() {
            self.write8(addr.wrapping_add(i as u32), *byte);
        }
    }

    fn allocate(&mut self, vaddr: u32, size: u32, linear: bool, perms: MemoryPerms) -> Option<u32> {
        if size == 0 || !is_page_aligned(size) {
            return None;
        }

        let base = if vaddr != 0 {
            vaddr
        } else if linear {
            self.next_linear
        } else {
            self.next_normal
        };

        let end = base.checked_add(size)?;
        if !self.map_with_perms(base, size, perms) {
            return None;
        }

        if vaddr == 0 {
            if linear {
                self.next_linear = end;
            } else {
                self.next_normal = end;
            }
        }
        Some(base)
    }
}
