//! Published service naming.

use std::fmt;

use darc_util::PeerId;

/// Service name component of the DNS-SD service type.
pub const SERVICE_NAME: &str = "darc";

/// Protocol component of the DNS-SD service type.
pub const SERVICE_PROTOCOL: &str = "tcp";

/// The full service type darc peers are advertised under.
pub const SERVICE_TYPE: &str = "_darc._tcp";

/// Prefix of every advertised instance name.
pub const NAME_PREFIX: &str = "darc_peer_";

/// TXT record key carrying the short peer id.
pub const TXT_ID_KEY: &str = "id";

/// A service advertisement, queued until the entry group can take it and
/// kept for the lifetime of the discovery client so it can be re-published
/// after a daemon collision. There is no unpublish operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingService {
    /// Identity of the advertising peer.
    pub peer: PeerId,
    /// TCP port the peer listens on.
    pub port: u16,
}

impl PendingService {
    pub fn new(peer: PeerId, port: u16) -> Self {
        Self { peer, port }
    }

    /// Advertised instance name, `darc_peer_<short-id>`.
    pub fn instance_name(&self) -> String {
        format!("{NAME_PREFIX}{}", self.peer.short())
    }

    /// TXT attributes published alongside the service.
    pub fn txt(&self) -> Vec<(String, String)> {
        vec![(TXT_ID_KEY.to_string(), self.peer.short())]
    }
}

impl fmt::Display for PendingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.instance_name(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_constant() {
        assert_eq!(SERVICE_TYPE, "_darc._tcp");
        assert_eq!(SERVICE_TYPE, format!("_{SERVICE_NAME}._{SERVICE_PROTOCOL}"));
    }

    #[test]
    fn test_instance_name_derivation() {
        let peer = PeerId::generate();
        let service = PendingService::new(peer, 987);
        assert_eq!(service.instance_name(), format!("darc_peer_{}", peer.short()));
    }

    #[test]
    fn test_txt_carries_short_id() {
        let peer = PeerId::generate();
        let service = PendingService::new(peer, 987);
        assert_eq!(service.txt(), vec![("id".to_string(), peer.short())]);
    }

    #[test]
    fn test_display() {
        let peer = PeerId::generate();
        let service = PendingService::new(peer, 1234);
        assert_eq!(
            format!("{}", service),
            format!("darc_peer_{}:1234", peer.short())
        );
    }
}
