//! IPC message layout and service routing
//!
//! A SendSyncRequest carries its message in the calling thread's IPC
//! buffer, which sits at a fixed offset from the thread's TLS block. The
//! first word is the header:
//!
//! ```text
//!  31            16 15     12 11      6 5       0
//! +----------------+---------+---------+---------+
//! |   command id   | unused  | normal  | transl. |
//! +----------------+---------+---------+---------+
//! ```
//!
//! `normal` is the number of plain parameter words that follow, `transl.`
//! the number of translate-parameter words after those. Responses reuse the
//! same buffer: the result code goes in word 1.
//!
//! Requests on a session to the `srv:` port are decoded by [`srv`]; requests
//! sent straight to a hardcoded service handle go to the matching
//! [`Service`] collaborator.

pub mod service;
pub mod srv;

pub use service::{Service, ServiceManager};
pub use srv::SrvCommand;

/// Offset of the IPC message buffer from the TLS base
pub const MESSAGE_OFFSET: u32 = 0x80;

/// Offset of the result word in a response
pub const RESULT_OFFSET: u32 = 4;

/// Address of the IPC message buffer for a thread whose TLS starts at `tls_base`
#[inline]
pub const fn message_pointer(tls_base: u32) -> u32 {
    tls_base.wrapping_add(MESSAGE_OFFSET)
}

/// Decoded view of an IPC header word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header(pub u32);

impl Header {
    #[inline]
    pub const fn command_id(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub const fn normal_params(self) -> u32 {
        (self.0 >> 6) & 0x3F
    }

    #[inline]
    pub const fn translate_params(self) -> u32 {
        self.0 & 0x3F
    }

    /// Build a header from its fields
    pub const fn new(command_id: u16, normal_params: u32, translate_params: u32) -> Self {
        Self(
            ((command_id as u32) << 16)
                | ((normal_params & 0x3F) << 6)
                | (translate_params & 0x3F),
        )
    }
}
