use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

/// Lazily yields the usable host addresses of `network` in ascending order,
/// skipping the network address (host bits all zero) and the broadcast
/// address (host bits all one). Every call starts a fresh iteration.
pub fn host_addresses(network: Ipv4Network) -> impl Iterator<Item = Ipv4Addr> {
    let base = u32::from(network.network());
    let broadcast = u32::from(network.broadcast());
    (base.saturating_add(1)..broadcast).map(Ipv4Addr::from)
}
