use std::time::Duration;

use ipnetwork::{IpNetwork, Ipv4Network};
use pnet::datalink::{self, MacAddr, NetworkInterface};

use crate::{ArpError, ArpResult};

/// Subnet-size policy for a scan. The default refuses anything other than a
/// /24 block: a wider mask means a single sweep floods thousands of broadcast
/// frames onto the segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetPolicy {
    prefix: u8,
}

impl Default for SubnetPolicy {
    fn default() -> Self {
        SubnetPolicy { prefix: 24 }
    }
}

impl SubnetPolicy {
    pub fn new(prefix: u8) -> Self {
        SubnetPolicy { prefix }
    }

    pub fn check(&self, network: Ipv4Network) -> ArpResult<()> {
        if network.prefix() != self.prefix {
            return Err(ArpError::Configuration(format!(
                "mask {} does not describe a /{} network",
                network.mask(),
                self.prefix
            )));
        }
        Ok(())
    }
}

/// Everything a scan session needs, validated once at startup and then
/// immutable. `network` carries the interface's own address, so
/// `network.ip()` is the sender address and `network.network()` the block
/// being swept.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub interface: NetworkInterface,
    pub network: Ipv4Network,
    pub source_mac: MacAddr,
    pub interval: Duration,
}

impl ScanConfig {
    pub fn new(iface_name: &str, interval: &str, policy: SubnetPolicy) -> ArpResult<ScanConfig> {
        let interval = parse_interval(interval)?;
        let interface = resolve_interface(iface_name)?;
        let network = select_network(&interface, &policy)?;
        let source_mac = interface.mac.ok_or_else(|| {
            ArpError::Configuration(format!("interface {} has no MAC address", interface.name))
        })?;
        info!("Using network range {} for interface {}", network, interface.name);
        Ok(ScanConfig { interface, network, source_mac, interval })
    }
}

pub fn resolve_interface(target_iface: &str) -> ArpResult<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == target_iface)
        .ok_or_else(|| {
            ArpError::Configuration(format!(
                "invalid network interface, no such device {}",
                target_iface
            ))
        })
}

/// Picks the interface's IPv4 network, refusing anything unusable: no
/// address, more than one address (ambiguous sender), a loopback address, or
/// a block the policy rejects.
pub fn select_network(iface: &NetworkInterface, policy: &SubnetPolicy) -> ArpResult<Ipv4Network> {
    let mut v4 = iface.ips.iter().filter_map(|ip| match ip {
        IpNetwork::V4(network) => Some(*network),
        _ => None,
    });

    let network = v4.next().ok_or_else(|| {
        ArpError::Configuration(format!("interface {} has no IPv4 address", iface.name))
    })?;
    if v4.next().is_some() {
        return Err(ArpError::Configuration(format!(
            "interface {} has more than one IPv4 address",
            iface.name
        )));
    }
    if network.ip().octets()[0] == 127 {
        return Err(ArpError::Configuration(format!(
            "refusing to scan loopback address {}",
            network.ip()
        )));
    }
    policy.check(network)?;
    Ok(network)
}

/// Parses a signed decimal duration with unit suffixes from
/// {ns, us, ms, s, m, h}, e.g. "20s", "300ms", "1.5h" or "2h45m".
/// Non-positive durations are rejected.
pub fn parse_interval(text: &str) -> ArpResult<Duration> {
    let bad = |reason: &str| ArpError::Configuration(format!("cannot parse interval {:?}: {}", text, reason));

    let trimmed = text.trim();
    let (negative, mut rest) = match trimmed.strip_prefix('-') {
        Some(tail) => (true, tail),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if rest.is_empty() {
        return Err(bad("empty duration"));
    }

    let mut total = 0.0_f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| bad("missing unit suffix"))?;
        if number_end == 0 {
            return Err(bad("expected a decimal number"));
        }
        let value: f64 = rest[..number_end]
            .parse()
            .map_err(|_| bad("invalid decimal number"))?;
        rest = &rest[number_end..];

        // Two-letter units first so "ms" is not read as minutes.
        let (unit_len, scale) = if rest.starts_with("ns") {
            (2, 1e-9)
        } else if rest.starts_with("us") {
            (2, 1e-6)
        } else if rest.starts_with("ms") {
            (2, 1e-3)
        } else if rest.starts_with('s') {
            (1, 1.0)
        } else if rest.starts_with('m') {
            (1, 60.0)
        } else if rest.starts_with('h') {
            (1, 3600.0)
        } else {
            return Err(bad("unknown unit suffix"));
        };
        total += value * scale;
        rest = &rest[unit_len..];
    }

    if negative || total <= 0.0 {
        return Err(bad("interval must be positive"));
    }
    Duration::try_from_secs_f64(total).map_err(|_| bad("interval out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn fake_interface(ips: Vec<IpNetwork>) -> NetworkInterface {
        NetworkInterface {
            name: "test0".to_string(),
            description: String::new(),
            index: 7,
            mac: Some(MacAddr::new(0x01, 0x02, 0x03, 0x04, 0x05, 0x06)),
            ips,
            flags: 0,
        }
    }

    fn v4(addr: [u8; 4], prefix: u8) -> IpNetwork {
        IpNetwork::V4(
            Ipv4Network::new(Ipv4Addr::new(addr[0], addr[1], addr[2], addr[3]), prefix).unwrap(),
        )
    }

    #[test]
    fn parse_interval_accepts_suffixed_durations() {
        assert_eq!(parse_interval("20s").unwrap(), Duration::from_secs(20));
        assert_eq!(parse_interval("300ms").unwrap(), Duration::from_millis(300));
        assert_eq!(parse_interval("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("2h45m").unwrap(), Duration::from_secs(9900));
        assert_eq!(parse_interval("250us").unwrap(), Duration::from_micros(250));
        assert_eq!(parse_interval("100ns").unwrap(), Duration::from_nanos(100));
    }

    #[test]
    fn parse_interval_rejects_garbage() {
        assert!(parse_interval("").is_err());
        assert!(parse_interval("10").is_err());
        assert!(parse_interval("abc").is_err());
        assert!(parse_interval("10x").is_err());
        assert!(parse_interval("s").is_err());
    }

    #[test]
    fn parse_interval_rejects_non_positive() {
        assert!(parse_interval("-1.5h").is_err());
        assert!(parse_interval("-20s").is_err());
        assert!(parse_interval("0s").is_err());
    }

    #[test]
    fn parse_interval_rejects_oversized_durations() {
        let err = parse_interval("99999999999999999999h").unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn policy_defaults_to_slash_24() {
        let policy = SubnetPolicy::default();
        let ok = Ipv4Network::new(Ipv4Addr::new(192, 168, 1, 5), 24).unwrap();
        let too_wide = Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 5), 16).unwrap();
        let too_narrow = Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 5), 25).unwrap();
        assert!(policy.check(ok).is_ok());
        assert!(policy.check(too_wide).is_err());
        assert!(policy.check(too_narrow).is_err());
    }

    #[test]
    fn policy_prefix_is_a_product_decision() {
        let wide = SubnetPolicy::new(16);
        let slash_16 = Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 5), 16).unwrap();
        let slash_24 = Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 5), 24).unwrap();
        assert!(wide.check(slash_16).is_ok());
        assert!(wide.check(slash_24).is_err());
    }

    #[test]
    fn select_network_requires_an_ipv4_address() {
        let iface = fake_interface(vec![]);
        let err = select_network(&iface, &SubnetPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("no IPv4 address"));
    }

    #[test]
    fn select_network_rejects_loopback() {
        let iface = fake_interface(vec![v4([127, 0, 0, 1], 24)]);
        let err = select_network(&iface, &SubnetPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("loopback"));
    }

    #[test]
    fn select_network_rejects_wide_masks() {
        let iface = fake_interface(vec![v4([10, 0, 0, 5], 16)]);
        assert!(select_network(&iface, &SubnetPolicy::default()).is_err());
    }

    #[test]
    fn select_network_rejects_ambiguous_interfaces() {
        let iface = fake_interface(vec![v4([10, 0, 0, 5], 24), v4([10, 0, 1, 5], 24)]);
        let err = select_network(&iface, &SubnetPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn select_network_accepts_a_single_slash_24() {
        let iface = fake_interface(vec![v4([10, 0, 0, 5], 24)]);
        let network = select_network(&iface, &SubnetPolicy::default()).unwrap();
        assert_eq!(network.ip(), Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(network.prefix(), 24);
    }
}
