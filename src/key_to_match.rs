//! Describing a packet to a controller.
//!
//! `key_to_match` builds the exact match carried in a packet-in. OpenFlow 1.0 has no ARP, UDP
//! or ICMP fields, so for that version those headers are also written into the IPv4 and TCP
//! fields, the way a 1.0 switch reports them.

use crate::datapath_key::OvsKeyAttr;
use crate::ofp_match::{vlan_pcp, vlan_vid, OfpMatch, DL_TYPE_NOT_ETH_TYPE, OFP_VLAN_NONE,
                       VLAN_CFI_BIT};
use crate::ofp_version::OfpVersion;
use crate::parsed_key::ParsedKey;

/// Normalize an Ethertype seen on a packet: values that are not real Ethertypes, and a missing
/// Ethertype, all become `DL_TYPE_NOT_ETH_TYPE`.
pub fn packet_eth_type(pkey: &ParsedKey) -> u16 {
    if pkey.is_present(OvsKeyAttr::Ethertype) && pkey.ethertype > DL_TYPE_NOT_ETH_TYPE {
        pkey.ethertype
    } else {
        DL_TYPE_NOT_ETH_TYPE
    }
}

/// Build the exact OpenFlow `version` match describing the packet behind `pkey`.
///
/// Unsupported fields (SCTP, neighbor discovery, MPLS, ECN, physical port, metadata) stay
/// wildcarded.
///
/// # Panics
///
/// Panics if the key carries no in_port or ethernet attribute.
pub fn key_to_match(pkey: &ParsedKey, version: OfpVersion) -> OfpMatch {
    let mut m = OfpMatch::new(version);
    let legacy = match version {
        OfpVersion::V1_0 => true,
        OfpVersion::V1_1 | OfpVersion::V1_2 | OfpVersion::V1_3 | OfpVersion::V1_4 => false,
    };

    assert!(pkey.is_present(OvsKeyAttr::InPort), "flow key has no in_port");
    m.fields.in_port = pkey.in_port;
    m.masks.in_port = !0;

    assert!(pkey.is_present(OvsKeyAttr::Ethernet), "flow key has no ethernet addresses");
    m.fields.eth_dst = pkey.ethernet.eth_dst;
    m.fields.eth_src = pkey.ethernet.eth_src;
    m.masks.eth_dst = [0xff; 6];
    m.masks.eth_src = [0xff; 6];

    m.fields.eth_type = packet_eth_type(pkey);
    m.masks.eth_type = !0;

    if pkey.is_present(OvsKeyAttr::Vlan) {
        m.fields.vlan_vid = vlan_vid(pkey.vlan);
        m.fields.vlan_pcp = vlan_pcp(pkey.vlan);
        match version {
            OfpVersion::V1_3 | OfpVersion::V1_4 => m.fields.vlan_vid |= VLAN_CFI_BIT,
            OfpVersion::V1_0 | OfpVersion::V1_1 | OfpVersion::V1_2 => (),
        }
    } else {
        m.fields.vlan_vid = match version {
            OfpVersion::V1_0 => OFP_VLAN_NONE,
            OfpVersion::V1_1 | OfpVersion::V1_2 | OfpVersion::V1_3 | OfpVersion::V1_4 => 0,
        };
        m.fields.vlan_pcp = 0;
    }
    m.masks.vlan_vid = !0;
    m.masks.vlan_pcp = !0;

    if pkey.is_present(OvsKeyAttr::Ipv4) {
        m.fields.ipv4_src = pkey.ipv4.src;
        m.fields.ipv4_dst = pkey.ipv4.dst;
        m.fields.ip_dscp = pkey.ipv4.tos;
        m.fields.ip_proto = pkey.ipv4.proto;
        m.masks.ipv4_src = !0;
        m.masks.ipv4_dst = !0;
        m.masks.ip_dscp = !0;
        m.masks.ip_proto = !0;
    }

    if pkey.is_present(OvsKeyAttr::Ipv6) {
        m.fields.ipv6_src = pkey.ipv6.src;
        m.fields.ipv6_dst = pkey.ipv6.dst;
        m.fields.ipv6_flabel = pkey.ipv6.label;
        m.masks.ipv6_src = [0xff; 16];
        m.masks.ipv6_dst = [0xff; 16];
        m.masks.ipv6_flabel = !0;
    }

    if pkey.is_present(OvsKeyAttr::Arp) {
        m.fields.arp_op = pkey.arp.op;
        m.fields.arp_spa = pkey.arp.sip;
        m.fields.arp_tpa = pkey.arp.tip;
        m.fields.arp_sha = pkey.arp.sha;
        m.fields.arp_tha = pkey.arp.tha;
        m.masks.arp_op = !0;
        m.masks.arp_spa = !0;
        m.masks.arp_tpa = !0;
        m.masks.arp_sha = [0xff; 6];
        m.masks.arp_tha = [0xff; 6];

        if legacy {
            m.fields.ipv4_src = pkey.arp.sip;
            m.fields.ipv4_dst = pkey.arp.tip;
            m.fields.ip_proto = (pkey.arp.op & 0xff) as u8;
            m.masks.ipv4_src = !0;
            m.masks.ipv4_dst = !0;
            m.masks.ip_proto = !0;
        }
    }

    if pkey.is_present(OvsKeyAttr::Tcp) {
        m.fields.tcp_src = pkey.tcp.src;
        m.fields.tcp_dst = pkey.tcp.dst;
        m.masks.tcp_src = !0;
        m.masks.tcp_dst = !0;
    }

    if pkey.is_present(OvsKeyAttr::Udp) {
        m.fields.udp_src = pkey.udp.src;
        m.fields.udp_dst = pkey.udp.dst;
        m.masks.udp_src = !0;
        m.masks.udp_dst = !0;

        if legacy {
            m.fields.tcp_src = pkey.udp.src;
            m.fields.tcp_dst = pkey.udp.dst;
            m.masks.tcp_src = !0;
            m.masks.tcp_dst = !0;
        }
    }

    if pkey.is_present(OvsKeyAttr::Icmp) {
        m.fields.icmpv4_type = pkey.icmp.typ;
        m.fields.icmpv4_code = pkey.icmp.code;
        m.masks.icmpv4_type = !0;
        m.masks.icmpv4_code = !0;

        if legacy {
            m.fields.tcp_src = pkey.icmp.typ as u16;
            m.fields.tcp_dst = pkey.icmp.code as u16;
            m.masks.tcp_src = !0;
            m.masks.tcp_dst = !0;
        }
    }

    if pkey.is_present(OvsKeyAttr::Icmpv6) {
        m.fields.icmpv6_type = pkey.icmpv6.typ;
        m.fields.icmpv6_code = pkey.icmpv6.code;
        m.masks.icmpv6_type = !0;
        m.masks.icmpv6_code = !0;
    }

    debug!("packet-in match for in_port {} ({}): eth_type {:#06x}",
           pkey.in_port,
           version,
           m.fields.eth_type);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ofp_match::MatchFields;
    use crate::parsed_key::{OvsKeyArp, OvsKeyIcmp, OvsKeyIpv4, OvsKeyIpv6, OvsKeyPorts};

    fn base_key() -> ParsedKey {
        let mut pkey = ParsedKey::default();
        pkey.in_port = 5;
        pkey.set_present(OvsKeyAttr::InPort);
        pkey.ethernet.eth_dst = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        pkey.ethernet.eth_src = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
        pkey.set_present(OvsKeyAttr::Ethernet);
        pkey
    }

    fn arp_key() -> ParsedKey {
        let mut pkey = base_key();
        pkey.ethertype = 0x0806;
        pkey.set_present(OvsKeyAttr::Ethertype);
        pkey.arp = OvsKeyArp {
            sip: 0xc0a80001,
            tip: 0xc0a80002,
            op: 0x0102,
            sha: [1, 2, 3, 4, 5, 6],
            tha: [6, 5, 4, 3, 2, 1],
        };
        pkey.set_present(OvsKeyAttr::Arp);
        pkey
    }

    #[test]
    fn minimal_key_is_exact() {
        let m = key_to_match(&base_key(), OfpVersion::V1_3);
        assert_eq!(m.version, OfpVersion::V1_3);
        assert_eq!(m.fields.in_port, 5);
        assert_eq!(m.masks.in_port, 0xffff_ffff);
        assert_eq!(m.fields.eth_dst, [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(m.masks.eth_src, [0xff; 6]);
        assert_eq!(m.fields.eth_type, DL_TYPE_NOT_ETH_TYPE);
        assert_eq!(m.masks.eth_type, 0xffff);
        assert_eq!(m.masks.ipv4_src, 0);
        assert_eq!(m.masks.tcp_src, 0);
    }

    #[test]
    fn ethertype_floor() {
        for &raw in &[0u16, 0x0100, 0x05dc, 0x05ff] {
            let mut pkey = base_key();
            pkey.ethertype = raw;
            pkey.set_present(OvsKeyAttr::Ethertype);
            assert_eq!(key_to_match(&pkey, OfpVersion::V1_0).fields.eth_type,
                       DL_TYPE_NOT_ETH_TYPE);
        }
        let mut pkey = base_key();
        pkey.ethertype = 0x0600;
        pkey.set_present(OvsKeyAttr::Ethertype);
        assert_eq!(key_to_match(&pkey, OfpVersion::V1_0).fields.eth_type, 0x0600);
    }

    #[test]
    fn vlan_by_version() {
        let mut pkey = base_key();
        pkey.vlan = 0x1000 | (5 << 13) | 100;
        pkey.set_present(OvsKeyAttr::Vlan);

        let m = key_to_match(&pkey, OfpVersion::V1_0);
        assert_eq!(m.fields.vlan_vid, 100);
        assert_eq!(m.fields.vlan_pcp, 5);

        let m = key_to_match(&pkey, OfpVersion::V1_2);
        assert_eq!(m.fields.vlan_vid, 100);

        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.vlan_vid, VLAN_CFI_BIT | 100);
        assert_eq!(m.fields.vlan_pcp, 5);
        assert_eq!(m.masks.vlan_vid, 0xffff);
    }

    #[test]
    fn untagged_by_version() {
        let pkey = base_key();
        let m = key_to_match(&pkey, OfpVersion::V1_0);
        assert_eq!(m.fields.vlan_vid, OFP_VLAN_NONE);
        assert_eq!(m.fields.vlan_pcp, 0);
        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.vlan_vid, 0);
        assert_eq!(m.fields.vlan_pcp, 0);
        assert_eq!(m.masks.vlan_vid, 0xffff);
    }

    #[test]
    fn ipv4_tcp() {
        let mut pkey = base_key();
        pkey.ipv4 = OvsKeyIpv4 {
            src: 0x0a000001,
            dst: 0x0a000002,
            proto: 6,
            tos: 0x28,
            ttl: 64,
            frag: 0,
        };
        pkey.set_present(OvsKeyAttr::Ipv4);
        pkey.tcp = OvsKeyPorts { src: 443, dst: 51000 };
        pkey.set_present(OvsKeyAttr::Tcp);

        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.ipv4_src, 0x0a000001);
        assert_eq!(m.fields.ipv4_dst, 0x0a000002);
        assert_eq!(m.fields.ip_dscp, 0x28);
        assert_eq!(m.fields.ip_proto, 6);
        assert_eq!(m.fields.tcp_src, 443);
        assert_eq!(m.fields.tcp_dst, 51000);
        assert_eq!(m.masks.tcp_dst, 0xffff);
    }

    #[test]
    fn ipv6_copies_addresses_and_label() {
        let mut pkey = base_key();
        pkey.ipv6 = OvsKeyIpv6 {
            src: [0x20; 16],
            dst: [0xfe; 16],
            label: 0x12345,
            proto: 58,
            tclass: 0,
            hlimit: 255,
            frag: 0,
        };
        pkey.set_present(OvsKeyAttr::Ipv6);
        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.ipv6_src, [0x20; 16]);
        assert_eq!(m.fields.ipv6_dst, [0xfe; 16]);
        assert_eq!(m.fields.ipv6_flabel, 0x12345);
        assert_eq!(m.masks.ipv6_dst, [0xff; 16]);
        assert_eq!(m.fields.ip_proto, 0);
    }

    #[test]
    fn arp_aliases_onto_ipv4_for_1_0() {
        let m = key_to_match(&arp_key(), OfpVersion::V1_0);
        assert_eq!(m.fields.ipv4_src, 0xc0a80001);
        assert_eq!(m.fields.ipv4_dst, 0xc0a80002);
        assert_eq!(m.fields.ip_proto, 0x02);
        assert_eq!(m.masks.ip_proto, 0xff);
        assert_eq!(m.fields.arp_op, 0x0102);
        assert_eq!(m.fields.arp_sha, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn arp_stays_in_arp_fields_for_1_3() {
        let m = key_to_match(&arp_key(), OfpVersion::V1_3);
        assert_eq!(m.fields.arp_spa, 0xc0a80001);
        assert_eq!(m.fields.arp_tpa, 0xc0a80002);
        assert_eq!(m.fields.arp_tha, [6, 5, 4, 3, 2, 1]);
        assert_eq!(m.fields.ipv4_src, 0);
        assert_eq!(m.masks.ipv4_src, 0);
        assert_eq!(m.masks.ip_proto, 0);
    }

    #[test]
    fn udp_aliases_onto_tcp_for_1_0() {
        let mut pkey = base_key();
        pkey.udp = OvsKeyPorts { src: 53, dst: 33000 };
        pkey.set_present(OvsKeyAttr::Udp);

        let m = key_to_match(&pkey, OfpVersion::V1_0);
        assert_eq!(m.fields.udp_src, 53);
        assert_eq!(m.fields.tcp_src, 53);
        assert_eq!(m.fields.tcp_dst, 33000);

        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.udp_dst, 33000);
        assert_eq!(m.fields.tcp_src, 0);
        assert_eq!(m.masks.tcp_src, 0);
    }

    #[test]
    fn icmp_aliases_onto_tcp_for_1_0() {
        let mut pkey = base_key();
        pkey.icmp = OvsKeyIcmp { typ: 8, code: 1 };
        pkey.set_present(OvsKeyAttr::Icmp);

        let m = key_to_match(&pkey, OfpVersion::V1_0);
        assert_eq!(m.fields.icmpv4_type, 8);
        assert_eq!(m.fields.tcp_src, 8);
        assert_eq!(m.fields.tcp_dst, 1);

        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.icmpv4_code, 1);
        assert_eq!(m.fields.tcp_src, 0);
    }

    #[test]
    fn icmpv6() {
        let mut pkey = base_key();
        pkey.icmpv6 = OvsKeyIcmp { typ: 135, code: 0 };
        pkey.set_present(OvsKeyAttr::Icmpv6);
        let m = key_to_match(&pkey, OfpVersion::V1_0);
        assert_eq!(m.fields.icmpv6_type, 135);
        assert_eq!(m.fields.tcp_src, 0);
    }

    #[test]
    fn unsupported_fields_stay_wildcarded() {
        let mut pkey = base_key();
        pkey.sctp = OvsKeyPorts { src: 1, dst: 2 };
        pkey.set_present(OvsKeyAttr::Sctp);
        pkey.set_present(OvsKeyAttr::Nd);
        let m = key_to_match(&pkey, OfpVersion::V1_3);
        assert_eq!(m.fields.sctp_src, 0);
        assert_eq!(m.masks.sctp_src, 0);
        assert_eq!(m.masks.ipv6_nd_target, MatchFields::default().ipv6_nd_target);
        assert_eq!(m.masks.mpls_label, 0);
        assert_eq!(m.masks.metadata, 0);
        assert_eq!(m.masks.in_phy_port, 0);
    }

    #[test]
    #[should_panic(expected = "no in_port")]
    fn missing_in_port_is_fatal() {
        let mut pkey = ParsedKey::default();
        pkey.set_present(OvsKeyAttr::Ethernet);
        key_to_match(&pkey, OfpVersion::V1_3);
    }
}
