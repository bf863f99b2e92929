//! Describing a packet to the classifier.

use crate::cfr::{icmp_port, in_port_bitmap, ClassifierRecord};
use crate::datapath_key::OvsKeyAttr;
use crate::key_to_match::packet_eth_type;
use crate::ofp_match::VLAN_CFI_BIT;
use crate::parsed_key::ParsedKey;

/// Build the classifier record of the packet behind `pkey`.
///
/// When a key carries more than one network or transport header (which the datapath never
/// produces), the first in the order IPv4, IPv6, ARP and TCP, UDP, ICMP, ICMPv6 wins. Class ids,
/// VRF and LAG are left zero for the policy stage.
pub fn key_to_cfr(pkey: &ParsedKey) -> ClassifierRecord {
    let mut cfr = ClassifierRecord::default();

    cfr.in_port = pkey.in_port;
    cfr.in_ports = in_port_bitmap(pkey.in_port);

    cfr.dl_dst = pkey.ethernet.eth_dst;
    cfr.dl_src = pkey.ethernet.eth_src;
    cfr.dl_type = packet_eth_type(pkey);

    // A tagged packet always carries the CFI bit, so zero is unambiguous.
    if pkey.is_present(OvsKeyAttr::Vlan) {
        cfr.dl_vlan = pkey.vlan | VLAN_CFI_BIT;
    }

    if pkey.is_present(OvsKeyAttr::Ipv4) {
        cfr.nw_tos = pkey.ipv4.tos;
        cfr.nw_proto = pkey.ipv4.proto;
        cfr.nw_src = pkey.ipv4.src;
        cfr.nw_dst = pkey.ipv4.dst;
    } else if pkey.is_present(OvsKeyAttr::Ipv6) {
        cfr.nw_tos = pkey.ipv6.tclass;
        cfr.nw_proto = pkey.ipv6.proto;
        cfr.ipv6_src = pkey.ipv6.src;
        cfr.ipv6_dst = pkey.ipv6.dst;
    } else if pkey.is_present(OvsKeyAttr::Arp) {
        cfr.nw_proto = (pkey.arp.op & 0xff) as u8;
        cfr.nw_src = pkey.arp.sip;
        cfr.nw_dst = pkey.arp.tip;
    }

    if pkey.is_present(OvsKeyAttr::Tcp) {
        cfr.tp_src = pkey.tcp.src;
        cfr.tp_dst = pkey.tcp.dst;
    } else if pkey.is_present(OvsKeyAttr::Udp) {
        cfr.tp_src = pkey.udp.src;
        cfr.tp_dst = pkey.udp.dst;
    } else if pkey.is_present(OvsKeyAttr::Icmp) {
        cfr.tp_src = icmp_port(pkey.icmp.typ);
        cfr.tp_dst = icmp_port(pkey.icmp.code);
    } else if pkey.is_present(OvsKeyAttr::Icmpv6) {
        cfr.tp_src = icmp_port(pkey.icmpv6.typ);
        cfr.tp_dst = icmp_port(pkey.icmpv6.code);
    }

    cfr
}
