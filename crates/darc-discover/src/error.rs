//! Error types for the discover crate.

use thiserror::Error;

/// Errors that can occur during peer advertisement and discovery.
///
/// Connection, client, browser, and registration errors are fatal to the
/// discovery loop; resolve errors are logged by the loop and never surface
/// through this type unless starting the resolve itself failed.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// Could not establish the connection to the mDNS daemon.
    #[error("failed to connect to mDNS daemon: {0}")]
    Connect(String),

    /// The daemon client failed at runtime.
    #[error("mDNS client failure: {0}")]
    Client(String),

    /// The service browser could not be created, or reported a failure.
    #[error("service browser failure: {0}")]
    Browse(String),

    /// A service could not be registered with the daemon.
    #[error("service registration failed: {0}")]
    Register(String),

    /// A resolve operation could not be started.
    #[error("service resolve failed: {0}")]
    Resolve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_error_display() {
        let error = DiscoverError::Register("name taken".to_string());
        assert_eq!(format!("{}", error), "service registration failed: name taken");
    }

    #[test]
    fn test_connect_error_display() {
        let error = DiscoverError::Connect("daemon not running".to_string());
        assert_eq!(
            format!("{}", error),
            "failed to connect to mDNS daemon: daemon not running"
        );
    }

    #[test]
    fn test_browse_error_debug() {
        let error = DiscoverError::Browse("socket closed".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Browse"));
        assert!(debug_str.contains("socket closed"));
    }
}
