//! Guest-visible result codes
//!
//! These are the values the guest finds in r0 after an SVC, or at offset 4
//! of the IPC buffer after a service command. Only recoverable, guest-caused
//! failures are expressed here.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Success = 0,
    ObjectNotFound = 0xD880_07FA,
    BadHandle = 0xD8E0_07F7,
    PortNameTooLong = 0xE0E0_181E,
}

/// Outcome of an operation that may fail in a way the guest observes
pub type GuestResult<T> = core::result::Result<T, ResultCode>;

impl ResultCode {
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Success),
            0xD880_07FA => Some(Self::ObjectNotFound),
            0xD8E0_07F7 => Some(Self::BadHandle),
            0xE0E0_181E => Some(Self::PortNameTooLong),
            _ => None,
        }
    }
}

impl From<ResultCode> for u32 {
    fn from(code: ResultCode) -> Self {
        code.raw()
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:#010X})", self, self.raw())
    }
}
