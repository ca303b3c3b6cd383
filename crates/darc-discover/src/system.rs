//! Daemon backend over the platform mDNS responder (Avahi or Bonjour),
//! reached through the `zeroconf` crate.
//!
//! `zeroconf` exposes a higher-level surface than the raw daemon protocol:
//! there is no client-state callback, and browse results arrive already
//! resolved. This backend bridges the gap:
//! - `Connecting` and `Running` are emitted when the connection is set up;
//!   daemon-side renaming is handled inside the crate, so `Registering` and
//!   `Collision` never originate here.
//! - `resolve` is answered from the addresses the browser has already
//!   delivered, keyed by instance name.
//! - `our_own` is derived from the set of instance names this process has
//!   registered; every multicast browse result is reported as `local`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, trace};
use zeroconf::prelude::*;
use zeroconf::{
    BrowserEvent, EventLoop, MdnsBrowser, MdnsService, ServiceDiscovery, ServiceRegistration,
    ServiceType, TxtRecord,
};

use crate::daemon::{
    BrowseEvent as Browse, ClientState, Daemon, DaemonEvent, ResolveEvent, ResolvedService,
    ResolverId,
};
use crate::error::DiscoverError;
use crate::service::{SERVICE_NAME, SERVICE_PROTOCOL, SERVICE_TYPE};

const POLL_SLICE: Duration = Duration::from_millis(100);

type EventQueue = Arc<Mutex<VecDeque<DaemonEvent>>>;
type SeenServices = Arc<Mutex<HashMap<String, ResolvedService>>>;
type PublishedNames = Arc<Mutex<HashSet<String>>>;

struct StagedService {
    name: String,
    port: u16,
    txt: Vec<(String, String)>,
}

/// mDNS daemon client backed by the system responder.
pub struct SystemDaemon {
    service_type: ServiceType,
    events: EventQueue,
    browser: Option<MdnsBrowser>,
    browser_loop: Option<EventLoop>,
    /// Services staged into the entry group, waiting for commit.
    staged: Vec<StagedService>,
    /// Committed services; dropping one withdraws it from the daemon.
    registered: Vec<(MdnsService, EventLoop)>,
    group_created: bool,
    published: PublishedNames,
    seen: SeenServices,
    next_resolver: u64,
}

impl SystemDaemon {
    /// Connect to the system mDNS daemon.
    pub fn connect() -> Result<Self, DiscoverError> {
        let service_type = ServiceType::new(SERVICE_NAME, SERVICE_PROTOCOL)
            .map_err(|e| DiscoverError::Connect(e.to_string()))?;

        let events = Arc::new(Mutex::new(VecDeque::from([
            DaemonEvent::ClientState(ClientState::Connecting),
            DaemonEvent::ClientState(ClientState::Running),
        ])));

        Ok(Self {
            service_type,
            events,
            browser: None,
            browser_loop: None,
            staged: Vec::new(),
            registered: Vec::new(),
            group_created: false,
            published: Arc::new(Mutex::new(HashSet::new())),
            seen: Arc::new(Mutex::new(HashMap::new())),
            next_resolver: 0,
        })
    }
}

impl Daemon for SystemDaemon {
    fn open_browser(&mut self) -> Result<(), DiscoverError> {
        if self.browser.is_some() {
            return Ok(());
        }
        let mut browser = MdnsBrowser::new(self.service_type.clone());

        let events = self.events.clone();
        let published = self.published.clone();
        let seen = self.seen.clone();
        browser.set_service_callback(Box::new(move |result, _context| {
            on_browser_event(result, &events, &published, &seen);
        }));

        let event_loop = browser
            .browse_services()
            .map_err(|e| DiscoverError::Browse(e.to_string()))?;

        debug!(service_type = SERVICE_TYPE, "browsing for services");
        self.browser = Some(browser);
        self.browser_loop = Some(event_loop);
        Ok(())
    }

    fn create_group(&mut self) -> Result<(), DiscoverError> {
        // Entry groups are emulated: services are staged locally and only
        // reach the daemon on commit.
        self.group_created = true;
        Ok(())
    }

    fn add_service(
        &mut self,
        name: &str,
        port: u16,
        txt: &[(String, String)],
    ) -> Result<(), DiscoverError> {
        if !self.group_created {
            return Err(DiscoverError::Register(
                "no entry group has been created".to_string(),
            ));
        }
        self.staged.push(StagedService {
            name: name.to_string(),
            port,
            txt: txt.to_vec(),
        });
        self.published.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    fn commit_group(&mut self) -> Result<(), DiscoverError> {
        for staged in self.staged.drain(..) {
            let mut service = MdnsService::new(self.service_type.clone(), staged.port);
            service.set_name(&staged.name);

            let mut txt_record = TxtRecord::new();
            for (key, value) in &staged.txt {
                txt_record
                    .insert(key, value)
                    .map_err(|e| DiscoverError::Register(e.to_string()))?;
            }
            service.set_txt_record(txt_record);

            let events = self.events.clone();
            service.set_registered_callback(Box::new(move |result, _context| {
                on_service_registered(result, &events);
            }));

            debug!(name = %staged.name, port = staged.port, "registering mDNS service");
            let event_loop = service
                .register()
                .map_err(|e| DiscoverError::Register(e.to_string()))?;

            // Poll once to start the registration.
            event_loop
                .poll(POLL_SLICE)
                .map_err(|e| DiscoverError::Register(e.to_string()))?;

            self.registered.push((service, event_loop));
        }
        Ok(())
    }

    fn reset_group(&mut self) -> Result<(), DiscoverError> {
        debug!(count = self.registered.len(), "withdrawing published services");
        self.staged.clear();
        self.registered.clear();
        Ok(())
    }

    fn resolve(
        &mut self,
        name: &str,
        _service_type: &str,
        _domain: &str,
    ) -> Result<ResolverId, DiscoverError> {
        let resolver = ResolverId(self.next_resolver);
        self.next_resolver += 1;

        // Browse results arrive pre-resolved, so the outcome is already
        // known; it is still delivered through the event queue to keep the
        // daemon contract (resolve outcomes arrive asynchronously).
        let event = match self.seen.lock().unwrap().get(name) {
            Some(resolved) => ResolveEvent::Found(resolved.clone()),
            None => ResolveEvent::Failure(format!("no address known for '{name}'")),
        };
        self.events
            .lock()
            .unwrap()
            .push_back(DaemonEvent::Resolve(resolver, event));
        Ok(resolver)
    }

    fn free_resolver(&mut self, resolver: ResolverId) {
        trace!(?resolver, "resolver released");
    }

    fn poll(&mut self) -> Result<Option<DaemonEvent>, DiscoverError> {
        loop {
            if let Some(event) = self.events.lock().unwrap().pop_front() {
                return Ok(Some(event));
            }

            let Some(browser_loop) = &self.browser_loop else {
                // Nothing to drive; the event stream is over.
                return Ok(None);
            };
            browser_loop
                .poll(POLL_SLICE)
                .map_err(|e| DiscoverError::Client(e.to_string()))?;

            for (_, event_loop) in &self.registered {
                event_loop
                    .poll(Duration::ZERO)
                    .map_err(|e| DiscoverError::Client(e.to_string()))?;
            }
        }
    }
}

fn on_browser_event(
    result: zeroconf::Result<BrowserEvent>,
    events: &EventQueue,
    published: &PublishedNames,
    seen: &SeenServices,
) {
    match result {
        Ok(BrowserEvent::Add(discovery)) => {
            trace!(
                name = %discovery.name(),
                domain = %discovery.domain(),
                "browser: service added"
            );
            let our_own = published.lock().unwrap().contains(discovery.name());
            if let Some(resolved) = parse_discovery(&discovery, our_own) {
                seen.lock()
                    .unwrap()
                    .insert(discovery.name().to_string(), resolved);
            }
            events
                .lock()
                .unwrap()
                .push_back(DaemonEvent::Browse(Browse::New {
                    name: discovery.name().to_string(),
                    service_type: SERVICE_TYPE.to_string(),
                    domain: discovery.domain().to_string(),
                }));
        }
        Ok(BrowserEvent::Remove(removal)) => {
            trace!(name = %removal.name(), "browser: service removed");
            seen.lock().unwrap().remove(removal.name());
            events
                .lock()
                .unwrap()
                .push_back(DaemonEvent::Browse(Browse::Remove {
                    name: removal.name().to_string(),
                }));
        }
        Err(e) => {
            events
                .lock()
                .unwrap()
                .push_back(DaemonEvent::Browse(Browse::Failure(e.to_string())));
        }
    }
}

fn on_service_registered(result: zeroconf::Result<ServiceRegistration>, events: &EventQueue) {
    match result {
        Ok(registration) => {
            debug!(
                name = %registration.name(),
                domain = %registration.domain(),
                "service registered"
            );
        }
        Err(e) => {
            error!(error = %e, "service registration failed");
            events
                .lock()
                .unwrap()
                .push_back(DaemonEvent::ClientState(ClientState::Failure(
                    e.to_string(),
                )));
        }
    }
}

fn parse_discovery(discovery: &ServiceDiscovery, our_own: bool) -> Option<ResolvedService> {
    let ip: IpAddr = discovery.address().parse().ok()?;
    let port = *discovery.port();

    let host_name = {
        let h = discovery.host_name().trim_end_matches('.');
        if h.is_empty() {
            discovery.address().clone()
        } else {
            h.to_string()
        }
    };

    Some(ResolvedService {
        host_name,
        port,
        address: Some(ip),
        our_own,
        // Browse results arrive over multicast on the local link.
        local: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_events(daemon: &SystemDaemon) -> Vec<DaemonEvent> {
        daemon.events.lock().unwrap().drain(..).collect()
    }

    #[test]
    fn test_connect_queues_connecting_then_running() {
        let daemon = SystemDaemon::connect().unwrap();
        assert_eq!(
            drain_events(&daemon),
            vec![
                DaemonEvent::ClientState(ClientState::Connecting),
                DaemonEvent::ClientState(ClientState::Running),
            ]
        );
    }

    #[test]
    fn test_add_service_requires_group() {
        let mut daemon = SystemDaemon::connect().unwrap();
        let err = daemon.add_service("darc_peer_x", 987, &[]).unwrap_err();
        assert!(matches!(err, DiscoverError::Register(_)));
    }

    #[test]
    fn test_add_service_stages_and_tracks_published_name() {
        let mut daemon = SystemDaemon::connect().unwrap();
        daemon.create_group().unwrap();
        daemon
            .add_service("darc_peer_x", 987, &[("id".to_string(), "x".to_string())])
            .unwrap();
        assert_eq!(daemon.staged.len(), 1);
        assert!(daemon.published.lock().unwrap().contains("darc_peer_x"));
    }

    #[test]
    fn test_reset_group_clears_staged_services() {
        let mut daemon = SystemDaemon::connect().unwrap();
        daemon.create_group().unwrap();
        daemon.add_service("darc_peer_x", 987, &[]).unwrap();
        daemon.reset_group().unwrap();
        assert!(daemon.staged.is_empty());
        assert!(daemon.registered.is_empty());
    }

    #[test]
    fn test_resolve_unknown_name_reports_failure() {
        let mut daemon = SystemDaemon::connect().unwrap();
        drain_events(&daemon);

        let resolver = daemon.resolve("ghost", SERVICE_TYPE, "local").unwrap();
        let events = drain_events(&daemon);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DaemonEvent::Resolve(id, ResolveEvent::Failure(_)) if *id == resolver
        ));
    }

    #[test]
    fn test_resolve_known_name_reports_found_with_origin_flags() {
        let mut daemon = SystemDaemon::connect().unwrap();
        drain_events(&daemon);

        daemon.seen.lock().unwrap().insert(
            "peer1".to_string(),
            ResolvedService {
                host_name: "peer1.local".to_string(),
                port: 1234,
                address: Some("192.168.1.20".parse().unwrap()),
                our_own: false,
                local: true,
            },
        );

        let resolver = daemon.resolve("peer1", SERVICE_TYPE, "local").unwrap();
        let events = drain_events(&daemon);
        match &events[0] {
            DaemonEvent::Resolve(id, ResolveEvent::Found(service)) => {
                assert_eq!(*id, resolver);
                assert_eq!(service.host_name, "peer1.local");
                assert_eq!(service.port, 1234);
                assert!(service.local);
                assert!(!service.our_own);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_resolver_ids_are_sequential() {
        let mut daemon = SystemDaemon::connect().unwrap();
        let a = daemon.resolve("a", SERVICE_TYPE, "local").unwrap();
        let b = daemon.resolve("b", SERVICE_TYPE, "local").unwrap();
        assert_ne!(a, b);
    }
}
