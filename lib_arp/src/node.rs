use std::fmt;
use std::net::Ipv4Addr;

use chrono::Local;
use pnet::datalink::MacAddr;

/// One observed IP-to-MAC mapping, built from an ARP reply. Logged, never
/// persisted.
#[derive(Debug, Serialize, Clone)]
pub struct ObservedReply {
    pub ipv4_address: String,
    pub mac_address: String,
    pub seen_at: String,
}

impl ObservedReply {
    pub fn new(ipv4_address: Ipv4Addr, mac_address: MacAddr) -> Self {
        ObservedReply {
            ipv4_address: ipv4_address.to_string(),
            mac_address: mac_address.to_string(),
            seen_at: Local::now().to_rfc3339(),
        }
    }
}

impl fmt::Display for ObservedReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IPv4 {} is at {}", self.ipv4_address, self.mac_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_the_mapping() {
        let node = ObservedReply::new(
            Ipv4Addr::new(10, 0, 0, 9),
            MacAddr::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff),
        );
        let line = node.to_string();
        assert!(line.contains("10.0.0.9"));
        assert!(line.contains("aa:bb:cc:dd:ee:ff"));
    }
}
