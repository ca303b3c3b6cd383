//! Discover darc peers on the local network without advertising anything.

use darc_discover::{Discovery, SystemDaemon};
use darc_util::log::{self, LogConfig, LogLevel};

fn main() {
    log::init(LogConfig {
        print: true,
        level: LogLevel::Debug,
        ..Default::default()
    });

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

    println!("listening for darc peers, Ctrl-C to stop");
    if let Err(e) = discovery.run() {
        eprintln!("discovery loop failed: {e}");
    }
}
