//! Zero-configuration peer discovery for darc.
//!
//! This crate lets a darc peer advertise its TCP endpoint on the local
//! network and discover endpoints advertised by other peers, using mDNS and
//! DNS-SD (Multicast DNS / DNS-based Service Discovery) through the system
//! daemon (Avahi on Linux, Bonjour elsewhere).
//!
//! # Service shape
//!
//! Peers are advertised under the service type `_darc._tcp` with the
//! instance name `darc_peer_<short-id>` and a TXT attribute
//! `id=<short-id>`, where `<short-id>` is the short rendering of the peer's
//! [`PeerId`](darc_util::PeerId).
//!
//! # Example
//!
//! ```no_run
//! use darc_discover::{Discovery, SystemDaemon};
//! use darc_util::PeerId;
//!
//! let daemon = SystemDaemon::connect().expect("mDNS daemon unavailable");
//! let mut discovery = Discovery::new(daemon, |host, port| {
//!     println!("peer at {host}:{port}");
//! })
//! .expect("failed to open service browser");
//!
//! discovery
//!     .advertise(PeerId::generate(), 987)
//!     .expect("failed to advertise");
//!
//! // Blocks, delivering discovered peers to the callback above.
//! discovery.run().expect("discovery loop failed");
//! ```
//!
//! Discovery is single-threaded and callback-driven: `run` blocks the
//! calling thread and every callback is invoked synchronously from it.
//! There is no deduplication of sightings; the callback may fire more than
//! once for the same remote peer.

mod daemon;
mod discovery;
mod error;
mod service;
mod system;

pub use daemon::{
    BrowseEvent, ClientState, Daemon, DaemonEvent, ResolveEvent, ResolvedService, ResolverId,
};
pub use discovery::{Discovery, PeerCallback};
pub use error::DiscoverError;
pub use service::{PendingService, NAME_PREFIX, SERVICE_TYPE, TXT_ID_KEY};
pub use system::SystemDaemon;
