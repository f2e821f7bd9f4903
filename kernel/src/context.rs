//! Guest register file
//!
//! The SVC ABI works entirely through the ARM11 general-purpose registers:
//! arguments arrive in r0-r4, the result code goes back in r0 and outputs in
//! r1 onwards. r15 (PC) is only read for diagnostics.
//!
//! The CPU core owns the real register state; the kernel borrows it for the
//! duration of one SVC.

use core::fmt;
use core::ops::{Index, IndexMut};

use static_assertions::assert_eq_size;

use crate::result::ResultCode;

/// Number of general-purpose registers (r0-r15)
pub const NUM_REGS: usize = 16;

/// Program counter slot
pub const PC: usize = 15;

#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterFile([u32; NUM_REGS]);

impl RegisterFile {
    /// Create a register file with all registers zeroed
    pub const fn new() -> Self {
        Self([0; NUM_REGS])
    }

    /// Create a register file from raw values, missing registers are zero
    pub fn from_slice(values: &[u32]) -> Self {
        let mut regs = Self::new();
        let len = values.len().min(NUM_REGS);
        regs.0[..len].copy_from_slice(&values[..len]);
        regs
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.0[PC]
    }

    /// Write a result code into r0
    #[inline]
    pub fn set_result(&mut self, code: ResultCode) {
        self.0[0] = code.raw();
    }

    #[inline]
    pub fn as_array(&self) -> &[u32; NUM_REGS] {
        &self.0
    }

    #[inline]
    pub fn as_mut_array(&mut self) -> &mut [u32; NUM_REGS] {
        &mut self.0
    }
}

impl Index<usize> for RegisterFile {
    type Output = u32;

    #[inline]
    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

impl IndexMut<usize> for RegisterFile {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut u32 {
        &mut self.0[index]
    }
}

impl fmt::Debug for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterFile")
            .field("r0", &format_args!("0x{:08x}", self.0[0]))
            .field("r1", &format_args!("0x{:08x}", self.0[1]))
            .field("r2", &format_args!("0x{:08x}", self.0[2]))
            .field("r3", &format_args!("0x{:08x}", self.0[3]))
            .field("r4", &format_args!("0x{:08x}", self.0[4]))
            .field("pc", &format_args!("0x{:08x}", self.0[PC]))
            .finish()
    }
}

assert_eq_size!(RegisterFile, [u32; NUM_REGS]);
