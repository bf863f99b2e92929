//! OpenFlow matches, version-independent.
//!
//! One field set covers every version; the `version` tag says how to read the VLAN and
//! lower-layer fields.

use crate::ofp_version::OfpVersion;

/// Ethertype of IPv4.
pub const ETH_P_IP: u16 = 0x0800;
/// Ethertype of ARP.
pub const ETH_P_ARP: u16 = 0x0806;
/// Ethertype of IPv6.
pub const ETH_P_IPV6: u16 = 0x86dd;

/// Ethertype reported for frames that carry no real Ethertype (802.3 length field, LLC).
/// Anything at or below it is not an Ethertype.
pub const DL_TYPE_NOT_ETH_TYPE: u16 = 0x05ff;

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_ICMPV6: u8 = 58;

/// OpenFlow 1.0 `dl_vlan` value meaning "no VLAN tag".
pub const OFP_VLAN_NONE: u16 = 0xffff;

/// Tag-present bit of a VLAN TCI; OpenFlow 1.2+ calls it `OFPVID_PRESENT`.
pub const VLAN_CFI_BIT: u16 = 0x1000;

/// VLAN id of a TCI.
pub fn vlan_vid(tci: u16) -> u16 {
    tci & 0x0fff
}

/// Priority code point of a TCI.
pub fn vlan_pcp(tci: u16) -> u8 {
    (tci >> 13) as u8
}

/// Build a TCI from a 12-bit VLAN id and priority.
pub fn vlan_tci(vid: u16, pcp: u8) -> u16 {
    ((pcp as u16 & 0x7) << 13) | (vid & 0x0fff)
}

/// Build a TCI from a VLAN id that carries its own tag-present bit.
pub fn vlan_tci_with_cfi(vid: u16, pcp: u8) -> u16 {
    ((pcp as u16 & 0x7) << 13) | (vid & 0x1fff)
}

/// Every field an OpenFlow match can carry, in host byte order.
///
/// Used for both halves of a match: the values, and the masks where a set bit means "compare
/// this bit". Fields the datapath cannot express are carried but never consulted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MatchFields {
    pub in_port: u32,
    pub in_phy_port: u32,
    pub metadata: u64,
    pub eth_dst: [u8; 6],
    pub eth_src: [u8; 6],
    pub eth_type: u16,
    pub vlan_vid: u16,
    pub vlan_pcp: u8,
    pub ip_dscp: u8,
    pub ip_ecn: u8,
    pub ip_proto: u8,
    pub ipv4_src: u32,
    pub ipv4_dst: u32,
    pub tcp_src: u16,
    pub tcp_dst: u16,
    pub udp_src: u16,
    pub udp_dst: u16,
    pub sctp_src: u16,
    pub sctp_dst: u16,
    pub icmpv4_type: u8,
    pub icmpv4_code: u8,
    pub arp_op: u16,
    pub arp_spa: u32,
    pub arp_tpa: u32,
    pub arp_sha: [u8; 6],
    pub arp_tha: [u8; 6],
    pub ipv6_src: [u8; 16],
    pub ipv6_dst: [u8; 16],
    pub ipv6_flabel: u32,
    pub icmpv6_type: u8,
    pub icmpv6_code: u8,
    pub ipv6_nd_target: [u8; 16],
    pub ipv6_nd_sll: [u8; 6],
    pub ipv6_nd_tll: [u8; 6],
    pub mpls_label: u32,
    pub mpls_tc: u8,
    /// Big Switch extension: set of ingress ports, one bit per port.
    pub bsn_in_ports_128: u128,
    pub bsn_lag_id: u32,
    pub bsn_vrf: u32,
    pub bsn_global_vrf_allowed: u8,
    pub bsn_l3_interface_class_id: u32,
    pub bsn_l3_src_class_id: u32,
    pub bsn_l3_dst_class_id: u32,
}

/// A version-tagged OpenFlow match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OfpMatch {
    pub version: OfpVersion,
    pub fields: MatchFields,
    pub masks: MatchFields,
}

impl OfpMatch {
    /// A match for `version` with every field wildcarded.
    pub fn new(version: OfpVersion) -> OfpMatch {
        OfpMatch {
            version: version,
            fields: MatchFields::default(),
            masks: MatchFields::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tci_helpers() {
        let tci = vlan_tci(10, 3);
        assert_eq!(tci, 0x600a);
        assert_eq!(vlan_vid(tci), 10);
        assert_eq!(vlan_pcp(tci), 3);
        assert_eq!(vlan_tci(0xffff, 0xff), 0xefff);
        assert_eq!(vlan_tci_with_cfi(VLAN_CFI_BIT | 10, 3), 0x700a);
    }

    #[test]
    fn new_match_is_all_wildcards() {
        let m = OfpMatch::new(OfpVersion::V1_3);
        assert_eq!(m.masks, MatchFields::default());
        assert_eq!(m.fields.eth_type, 0);
    }
}
