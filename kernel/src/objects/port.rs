//! Ports and sessions
//!
//! A port is a named rendezvous point. Its name is stored in a fixed
//! 11-byte buffer (the console's limit); a port with an empty name is
//! private and cannot be reached through ConnectToPort. A session is what
//! the guest gets back from connecting: it only remembers its port.

use core::fmt;

use crate::handles::Handle;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PortData {
    name: [u8; PortData::MAX_NAME_LEN],
    public: bool,
}

impl PortData {
    /// Longest port name the kernel accepts
    pub const MAX_NAME_LEN: usize = 11;

    /// Build a port payload, truncating `name` to [`Self::MAX_NAME_LEN`] bytes
    pub fn new(name: &str) -> Self {
        let mut buf = [0u8; Self::MAX_NAME_LEN];
        let bytes = Self::bounded(name.as_bytes());
        buf[..bytes.len()].copy_from_slice(bytes);

        Self {
            name: buf,
            public: !bytes.is_empty(),
        }
    }

    /// Stored name bytes, up to the first NUL
    pub fn name_bytes(&self) -> &[u8] {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(Self::MAX_NAME_LEN);
        &self.name[..len]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Bounded comparison: only the first `MAX_NAME_LEN` bytes of `name` count
    pub fn matches(&self, name: impl AsRef<[u8]>) -> bool {
        Self::bounded(name.as_ref()) == self.name_bytes()
    }

    fn bounded(bytes: &[u8]) -> &[u8] {
        let bytes = &bytes[..bytes.len().min(Self::MAX_NAME_LEN)];
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        &bytes[..len]
    }
}

impl fmt::Debug for PortData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortData")
            .field("name", &self.name())
            .field("public", &self.public)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionData {
    /// Port this session was opened on
    pub port: Handle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_iff_named() {
        assert!(PortData::new("srv:").is_public());
        assert!(!PortData::new("").is_public());
    }

    #[test]
    fn test_name_truncated_to_bound() {
        let port = PortData::new("0123456789ABCDEF");
        assert_eq!(port.name(), "0123456789A");
        assert_eq!(port.name_bytes().len(), PortData::MAX_NAME_LEN);
    }

    #[test]
    fn test_bounded_match() {
        let port = PortData::new("err:f");
        assert!(port.matches("err:f"));
        assert!(!port.matches("err:"));
        assert!(!port.matches("err:ff"));

        // Bytes past the bound are not compared
        let long = PortData::new("0123456789A");
        assert!(long.matches("0123456789AXYZ"));
    }

    #[test]
    fn test_private_port_matches_empty_name() {
        let port = PortData::new("");
        assert!(port.matches(""));
        assert!(!port.matches("srv:"));
    }
}
