//! The discovery client: advertises this peer's endpoint and relays
//! resolved remote peers to a caller-supplied callback.

use tracing::{debug, error, trace, warn};

use darc_util::PeerId;

use crate::daemon::{
    BrowseEvent, ClientState, Daemon, DaemonEvent, ResolveEvent, ResolverId,
};
use crate::error::DiscoverError;
use crate::service::PendingService;

/// Invoked once per qualifying discovery with the remote peer's host name
/// and port. May be called repeatedly for the same peer; there is no
/// deduplication and no ordering guarantee between peers.
pub type PeerCallback = Box<dyn FnMut(&str, u16)>;

/// Zero-configuration discovery of darc peers.
///
/// One instance owns the daemon connection, the entry group publishing this
/// process's services, and the list of services waiting for (or surviving
/// across) publication. `advertise` may be called before `run`; queued
/// services are published once the daemon reports ready. `run` blocks the
/// calling thread and dispatches all daemon events on it.
pub struct Discovery<D: Daemon> {
    daemon: D,
    on_peer: PeerCallback,
    pending: Vec<PendingService>,
    group_created: bool,
    group_empty: bool,
    client_ready: bool,
}

impl<D: Daemon> Discovery<D> {
    /// Open the service browser on the daemon and return the client.
    pub fn new(
        mut daemon: D,
        on_peer: impl FnMut(&str, u16) + 'static,
    ) -> Result<Self, DiscoverError> {
        daemon.open_browser()?;
        Ok(Self {
            daemon,
            on_peer: Box::new(on_peer),
            pending: Vec::new(),
            group_created: false,
            group_empty: true,
            client_ready: false,
        })
    }

    /// Advertise this peer's TCP endpoint. Fire-and-forget: the service is
    /// queued, and registered with the daemon immediately if the client is
    /// already ready, otherwise on the next transition to ready.
    pub fn advertise(&mut self, peer: PeerId, port: u16) -> Result<(), DiscoverError> {
        let service = PendingService::new(peer, port);
        debug!(service = %service, ready = self.client_ready, "advertising service");
        self.pending.push(service);

        if self.group_created && self.client_ready {
            self.daemon
                .add_service(&service.instance_name(), service.port, &service.txt())?;
            self.daemon.commit_group()?;
            self.group_empty = false;
        }
        Ok(())
    }

    /// Drive the daemon event loop, blocking until its event stream ends or
    /// a fatal condition is reported. Browse, resolve, and client-state
    /// handling all run synchronously on the calling thread.
    pub fn run(&mut self) -> Result<(), DiscoverError> {
        while let Some(event) = self.daemon.poll()? {
            self.handle_event(event)?;
        }
        debug!("daemon event stream ended");
        Ok(())
    }

    fn handle_event(&mut self, event: DaemonEvent) -> Result<(), DiscoverError> {
        match event {
            DaemonEvent::ClientState(state) => self.on_client_state(state),
            DaemonEvent::Browse(event) => self.on_browse(event),
            DaemonEvent::Resolve(resolver, event) => self.on_resolve(resolver, event),
        }
    }

    fn on_client_state(&mut self, state: ClientState) -> Result<(), DiscoverError> {
        match state {
            ClientState::Connecting => Ok(()),
            ClientState::Running => {
                if !self.group_created {
                    self.daemon.create_group()?;
                    self.group_created = true;
                    self.group_empty = true;
                }
                // The daemon has (re-)established its host records; if the
                // group is empty (just created, or reset after a collision),
                // publish every pending service in list order.
                if self.group_empty && !self.pending.is_empty() {
                    for service in &self.pending {
                        debug!(service = %service, "registering service");
                        self.daemon.add_service(
                            &service.instance_name(),
                            service.port,
                            &service.txt(),
                        )?;
                    }
                    self.daemon.commit_group()?;
                    self.group_empty = false;
                }
                self.client_ready = true;
                Ok(())
            }
            ClientState::Registering | ClientState::Collision => {
                // Withdraw our records until the daemon is back in Running;
                // the re-publish above then covers the full pending list.
                self.client_ready = false;
                if self.group_created {
                    debug!(?state, "resetting entry group");
                    self.daemon.reset_group()?;
                    self.group_empty = true;
                }
                Ok(())
            }
            ClientState::Failure(msg) => {
                error!(error = %msg, "mDNS client failure");
                Err(DiscoverError::Client(msg))
            }
        }
    }

    fn on_browse(&mut self, event: BrowseEvent) -> Result<(), DiscoverError> {
        match event {
            BrowseEvent::New {
                name,
                service_type,
                domain,
            } => {
                debug!(name = %name, service_type = %service_type, domain = %domain, "new service");
                match self.daemon.resolve(&name, &service_type, &domain) {
                    Ok(resolver) => trace!(?resolver, name = %name, "resolve started"),
                    // Dropping one resolve loses one sighting, nothing more.
                    Err(e) => warn!(error = %e, name = %name, "failed to start resolve"),
                }
                Ok(())
            }
            BrowseEvent::Remove { name } => {
                // No per-service state is kept, so nothing to clean up. An
                // in-flight resolver for this name completes or fails on
                // its own.
                debug!(name = %name, "service removed");
                Ok(())
            }
            BrowseEvent::AllForNow => {
                trace!("browse: all for now");
                Ok(())
            }
            BrowseEvent::CacheExhausted => {
                trace!("browse: cache exhausted");
                Ok(())
            }
            BrowseEvent::Failure(msg) => {
                error!(error = %msg, "service browser failure");
                Err(DiscoverError::Browse(msg))
            }
        }
    }

    fn on_resolve(
        &mut self,
        resolver: ResolverId,
        event: ResolveEvent,
    ) -> Result<(), DiscoverError> {
        match event {
            ResolveEvent::Found(service) => {
                if !service.our_own && service.local {
                    debug!(host = %service.host_name, port = service.port, "peer discovered");
                    (self.on_peer)(&service.host_name, service.port);
                } else {
                    trace!(
                        host = %service.host_name,
                        our_own = service.our_own,
                        local = service.local,
                        "discarding resolve result"
                    );
                }
            }
            ResolveEvent::Failure(msg) => {
                warn!(error = %msg, "failed to resolve service");
            }
        }
        self.daemon.free_resolver(resolver);
        Ok(())
    }
}
