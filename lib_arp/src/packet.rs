use std::net::Ipv4Addr;

use pnet::datalink::MacAddr;
use pnet::packet::arp::{
    ArpHardwareTypes, ArpOperation, ArpOperations, ArpPacket, MutableArpPacket,
};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::{MutablePacket, Packet};

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const ARP_PACKET_LEN: usize = 28;
pub const FRAME_LEN: usize = ETHERNET_HEADER_LEN + ARP_PACKET_LEN;

/// One decoded ARP message, either direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArpMessage {
    pub operation: ArpOperation,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

impl ArpMessage {
    pub fn is_reply(&self) -> bool {
        self.operation == ArpOperations::Reply
    }
}

/// Builds one 42-byte Ethernet II frame carrying an ARP request
/// (EtherType 0x0806; hardware type 1, protocol type 0x0800, hlen 6,
/// plen 4, operation 1). Deterministic, no side effects.
pub fn build_request(
    src_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_mac: MacAddr,
    dst_ip: Ipv4Addr,
) -> [u8; FRAME_LEN] {
    build(ArpOperations::Request, src_mac, src_ip, dst_mac, dst_ip)
}

pub(crate) fn build(
    operation: ArpOperation,
    src_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_mac: MacAddr,
    dst_ip: Ipv4Addr,
) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];

    // The fixed buffer always satisfies both minimum packet sizes.
    let mut ethernet_packet = MutableEthernetPacket::new(&mut frame).unwrap();
    ethernet_packet.set_destination(dst_mac);
    ethernet_packet.set_source(src_mac);
    ethernet_packet.set_ethertype(EtherTypes::Arp);

    let mut arp_buffer = [0u8; ARP_PACKET_LEN];
    let mut arp_packet = MutableArpPacket::new(&mut arp_buffer).unwrap();
    arp_packet.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp_packet.set_protocol_type(EtherTypes::Ipv4);
    arp_packet.set_hw_addr_len(6);
    arp_packet.set_proto_addr_len(4);
    arp_packet.set_operation(operation);
    arp_packet.set_sender_hw_addr(src_mac);
    arp_packet.set_sender_proto_addr(src_ip);
    arp_packet.set_target_hw_addr(dst_mac);
    arp_packet.set_target_proto_addr(dst_ip);
    ethernet_packet.set_payload(arp_packet.packet_mut());

    frame
}

/// Decodes a raw frame into an [`ArpMessage`]. `None` means "not ARP" or a
/// truncated payload; both are normal skip conditions, not errors.
pub fn decode_frame(frame: &[u8]) -> Option<ArpMessage> {
    let ethernet_packet = EthernetPacket::new(frame)?;
    if ethernet_packet.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp_packet = ArpPacket::new(ethernet_packet.payload())?;
    Some(ArpMessage {
        operation: arp_packet.get_operation(),
        sender_mac: arp_packet.get_sender_hw_addr(),
        sender_ip: arp_packet.get_sender_proto_addr(),
        target_mac: arp_packet.get_target_hw_addr(),
        target_ip: arp_packet.get_target_proto_addr(),
    })
}
