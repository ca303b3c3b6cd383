//! ULID-based peer identity.
//!
//! Every darc peer carries one `PeerId` for its lifetime. The full rendering
//! is the 26-character lowercase ULID; the short rendering is the last 8
//! characters (the random tail, so peers created in the same millisecond
//! still differ) and is what ends up in advertised service names.

use std::fmt;

use ulid::Ulid;

/// Number of characters in the short rendering.
const SHORT_LEN: usize = 8;

/// A unique identifier for a darc peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(Ulid);

impl PeerId {
    /// Generate a fresh random peer identity.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Short human-readable rendering, used in advertised service names.
    pub fn short(&self) -> String {
        let full = self.0.to_string().to_lowercase();
        full[full.len() - SHORT_LEN..].to_string()
    }

    /// Parse a peer identity from its full rendering.
    pub fn parse(s: &str) -> Option<Self> {
        Ulid::from_string(s).ok().map(Self)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let a = PeerId::generate();
        let b = PeerId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_lowercase_ulid() {
        let id = PeerId::generate();
        let s = id.to_string();
        assert_eq!(s.len(), 26);
        assert_eq!(s, s.to_lowercase());
    }

    #[test]
    fn test_short_is_tail_of_full() {
        let id = PeerId::generate();
        let full = id.to_string();
        let short = id.short();
        assert_eq!(short.len(), SHORT_LEN);
        assert!(full.ends_with(&short));
    }

    #[test]
    fn test_parse_round_trip() {
        let id = PeerId::generate();
        let parsed = PeerId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PeerId::parse("not a ulid").is_none());
        assert!(PeerId::parse("").is_none());
    }
}
