//! Capability interface to the mDNS daemon.
//!
//! The discovery client programs against this trait rather than a concrete
//! daemon binding, so the entry-group state machine can be driven by a
//! scripted fake in tests. The production implementation is
//! [`SystemDaemon`](crate::SystemDaemon).

use std::net::IpAddr;

use crate::error::DiscoverError;

/// Handle for a one-shot resolve operation issued on the daemon.
///
/// The daemon keeps resolution state per handle; the discovery loop releases
/// every handle exactly once via [`Daemon::free_resolver`] after the resolve
/// outcome has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolverId(pub u64);

/// Connection state of the daemon client, mirroring the daemon's own states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    /// Still establishing the daemon connection.
    Connecting,
    /// Daemon ready; published records are (or can be) live.
    Running,
    /// The daemon is (re-)establishing its own records, e.g. after a host
    /// name change. Published services must be withdrawn until `Running`.
    Registering,
    /// The daemon lost a name conflict. Same recovery as `Registering`.
    Collision,
    /// Unrecoverable client failure.
    Failure(String),
}

/// A service of the watched type appearing or disappearing on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseEvent {
    New {
        name: String,
        service_type: String,
        domain: String,
    },
    Remove {
        name: String,
    },
    /// No more results are expected for the moment.
    AllForNow,
    /// All results were served from the daemon's cache.
    CacheExhausted,
    Failure(String),
}

/// Outcome of a resolve operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveEvent {
    Found(ResolvedService),
    Failure(String),
}

/// Address and origin details for a resolved service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedService {
    pub host_name: String,
    pub port: u16,
    pub address: Option<IpAddr>,
    /// The service was published by this same process.
    pub our_own: bool,
    /// The service is reachable on the local network.
    pub local: bool,
}

/// One event pulled from the daemon's loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEvent {
    ClientState(ClientState),
    Browse(BrowseEvent),
    Resolve(ResolverId, ResolveEvent),
}

/// Operations the discovery client needs from an mDNS daemon: entry-group
/// lifecycle, a service browser, one-shot resolvers, and a blocking event
/// loop delivering the callbacks above as values.
pub trait Daemon {
    /// Subscribe to browse events for the darc service type.
    fn open_browser(&mut self) -> Result<(), DiscoverError>;

    /// Create the entry group used to publish this process's services.
    fn create_group(&mut self) -> Result<(), DiscoverError>;

    /// Stage one service into the entry group.
    fn add_service(
        &mut self,
        name: &str,
        port: u16,
        txt: &[(String, String)],
    ) -> Result<(), DiscoverError>;

    /// Publish everything staged in the entry group.
    fn commit_group(&mut self) -> Result<(), DiscoverError>;

    /// Withdraw all services published through the entry group.
    fn reset_group(&mut self) -> Result<(), DiscoverError>;

    /// Start a one-shot resolve for a browsed service. The outcome arrives
    /// later as a [`DaemonEvent::Resolve`] carrying the returned handle.
    fn resolve(
        &mut self,
        name: &str,
        service_type: &str,
        domain: &str,
    ) -> Result<ResolverId, DiscoverError>;

    /// Release a resolver handle.
    fn free_resolver(&mut self, resolver: ResolverId);

    /// Block until the next daemon event. `Ok(None)` means the event stream
    /// has terminated and the loop should exit.
    fn poll(&mut self) -> Result<Option<DaemonEvent>, DiscoverError>;
}
