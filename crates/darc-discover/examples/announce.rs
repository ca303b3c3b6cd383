//! Advertise this peer on port 987 and print every remote peer discovered
//! on the local network. Run `listen` in another terminal to see it appear.

use darc_discover::{Discovery, SystemDaemon};
use darc_util::log::{self, LogConfig, LogLevel};
use darc_util::PeerId;

fn main() {
    log::init(LogConfig {
        print: true,
        level: LogLevel::Debug,
        ..Default::default()
    });

    let peer = PeerId::generate();
    println!("peer {} (short {})", peer, peer.short());

    let daemon = match SystemDaemon::connect() {
        Ok(daemon) => daemon,
        Err(e) => {
            eprintln!("failed to connect to mDNS daemon: {e}");
            return;
        }
    };

    let mut discovery = match Discovery::new(daemon, |host, port| {
        println!("discovered peer at {host}:{port}");
    }) {
        Ok(discovery) => discovery,
        Err(e) => {
            eprintln!("failed to start discovery: {e}");
            return;
        }
    };

    if let Err(e) = discovery.advertise(peer, 987) {
        eprintln!("failed to advertise: {e}");
        return;
    }

    println!("advertising darc_peer_{} on port 987, Ctrl-C to stop", peer.short());
    if let Err(e) = discovery.run() {
        eprintln!("discovery loop failed: {e}");
    }
}
