//! Compiling OpenFlow matches into classifier rules.
//!
//! Every field is carried as a value and a mask. Which network and transport fields mean
//! anything depends on the version: OpenFlow 1.0 has one flat layout where the IPv4 and TCP
//! fields are always present, while from 1.2 on they only exist under the right Ethertype and
//! IP protocol, so the matched values decide which of them reach the record.

use crate::cfr::{icmp_port, in_ports_of_u128, ClassifierRecord};
use crate::ofp_match::{vlan_tci, vlan_tci_with_cfi, MatchFields, OfpMatch, ETH_P_ARP, ETH_P_IP,
                       ETH_P_IPV6, IPPROTO_ICMP, IPPROTO_ICMPV6, IPPROTO_TCP, IPPROTO_UDP,
                       OFP_VLAN_NONE, VLAN_CFI_BIT};
use crate::ofp_version::OfpVersion;

/// Combine DSCP and ECN into a ToS byte.
fn tos_of(f: &MatchFields) -> u8 {
    ((f.ip_dscp & 0x3f) << 2) | (f.ip_ecn & 0x3)
}

/// Lay out the value or mask half of an OpenFlow 1.0 VLAN match. Untagged and wildcarded
/// matches are handled by the caller.
fn vlan_1_0(f: &MatchFields) -> u16 {
    VLAN_CFI_BIT | vlan_tci(f.vlan_vid, f.vlan_pcp)
}

fn compile_vlan(m: &OfpMatch, fields: &mut ClassifierRecord, masks: &mut ClassifierRecord) {
    match m.version {
        OfpVersion::V1_0 => {
            if m.masks.vlan_vid == 0 {
                // wildcarded
            } else if m.fields.vlan_vid == OFP_VLAN_NONE {
                // untagged
                masks.dl_vlan = 0xffff;
            } else {
                fields.dl_vlan = vlan_1_0(&m.fields);
                masks.dl_vlan = vlan_1_0(&m.masks);
            }
        }
        OfpVersion::V1_1 => {
            error!("cannot compile an {} VLAN match", m.version);
            unimplemented!("OpenFlow 1.1 VLAN matching")
        }
        OfpVersion::V1_2 | OfpVersion::V1_3 | OfpVersion::V1_4 => {
            // The VID carries OFPVID_PRESENT in both halves.
            fields.dl_vlan = vlan_tci_with_cfi(m.fields.vlan_vid, m.fields.vlan_pcp);
            masks.dl_vlan = vlan_tci_with_cfi(m.masks.vlan_vid, m.masks.vlan_pcp);
        }
    }
}

/// OpenFlow 1.0 and 1.1: the IPv4 and TCP fields are always there.
fn compile_fixed_l3(m: &OfpMatch, fields: &mut ClassifierRecord, masks: &mut ClassifierRecord) {
    fields.nw_proto = m.fields.ip_proto;
    masks.nw_proto = m.masks.ip_proto;

    // ip_dscp holds the whole ToS byte here; the ECN bits are not matchable.
    fields.nw_tos = m.fields.ip_dscp & 0xfc;
    masks.nw_tos = m.masks.ip_dscp & 0xfc;

    fields.nw_src = m.fields.ipv4_src;
    fields.nw_dst = m.fields.ipv4_dst;
    masks.nw_src = m.masks.ipv4_src;
    masks.nw_dst = m.masks.ipv4_dst;

    fields.tp_src = m.fields.tcp_src;
    fields.tp_dst = m.fields.tcp_dst;
    masks.tp_src = m.masks.tcp_src;
    masks.tp_dst = m.masks.tcp_dst;
}

/// OpenFlow 1.2+: fields exist only under their Ethertype and IP protocol.
fn compile_typed_l3(m: &OfpMatch, fields: &mut ClassifierRecord, masks: &mut ClassifierRecord) {
    let (f, k) = (&m.fields, &m.masks);
    match f.eth_type {
        ETH_P_IP | ETH_P_IPV6 => {
            fields.nw_proto = f.ip_proto;
            masks.nw_proto = k.ip_proto;
            fields.nw_tos = tos_of(f);
            masks.nw_tos = tos_of(k);

            if f.eth_type == ETH_P_IP {
                fields.nw_src = f.ipv4_src;
                fields.nw_dst = f.ipv4_dst;
                masks.nw_src = k.ipv4_src;
                masks.nw_dst = k.ipv4_dst;
            } else {
                fields.ipv6_src = f.ipv6_src;
                fields.ipv6_dst = f.ipv6_dst;
                masks.ipv6_src = k.ipv6_src;
                masks.ipv6_dst = k.ipv6_dst;
            }

            match f.ip_proto {
                IPPROTO_TCP => {
                    fields.tp_src = f.tcp_src;
                    fields.tp_dst = f.tcp_dst;
                    masks.tp_src = k.tcp_src;
                    masks.tp_dst = k.tcp_dst;
                }
                IPPROTO_UDP => {
                    fields.tp_src = f.udp_src;
                    fields.tp_dst = f.udp_dst;
                    masks.tp_src = k.udp_src;
                    masks.tp_dst = k.udp_dst;
                }
                IPPROTO_ICMP => {
                    fields.tp_src = icmp_port(f.icmpv4_type);
                    fields.tp_dst = icmp_port(f.icmpv4_code);
                    masks.tp_src = icmp_port(k.icmpv4_type);
                    masks.tp_dst = icmp_port(k.icmpv4_code);
                }
                IPPROTO_ICMPV6 => {
                    fields.tp_src = icmp_port(f.icmpv6_type);
                    fields.tp_dst = icmp_port(f.icmpv6_code);
                    masks.tp_src = icmp_port(k.icmpv6_type);
                    masks.tp_dst = icmp_port(k.icmpv6_code);
                }
                _ => (),
            }
        }
        ETH_P_ARP => {
            fields.nw_proto = (f.arp_op & 0xff) as u8;
            masks.nw_proto = (k.arp_op & 0xff) as u8;
            fields.nw_src = f.arp_spa;
            fields.nw_dst = f.arp_tpa;
            masks.nw_src = k.arp_spa;
            masks.nw_dst = k.arp_tpa;
        }
        _ => (),
    }
}

/// Compile an OpenFlow match into a classifier rule, returning `(fields, masks)`.
///
/// The result always satisfies `fields & masks == fields`.
///
/// # Panics
///
/// Panics on an OpenFlow 1.1 match, whose VLAN encoding is not supported.
pub fn match_to_cfr(m: &OfpMatch) -> (ClassifierRecord, ClassifierRecord) {
    let mut fields = ClassifierRecord::default();
    let mut masks = ClassifierRecord::default();

    fields.in_port = m.fields.in_port;
    masks.in_port = m.masks.in_port;
    masks.in_ports = in_ports_of_u128(m.masks.bsn_in_ports_128);

    fields.dl_dst = m.fields.eth_dst;
    fields.dl_src = m.fields.eth_src;
    masks.dl_dst = m.masks.eth_dst;
    masks.dl_src = m.masks.eth_src;

    fields.dl_type = m.fields.eth_type;
    masks.dl_type = m.masks.eth_type;

    compile_vlan(m, &mut fields, &mut masks);

    match m.version {
        OfpVersion::V1_0 | OfpVersion::V1_1 => compile_fixed_l3(m, &mut fields, &mut masks),
        OfpVersion::V1_2 | OfpVersion::V1_3 | OfpVersion::V1_4 => {
            compile_typed_l3(m, &mut fields, &mut masks)
        }
    }

    fields.lag_id = m.fields.bsn_lag_id;
    masks.lag_id = m.masks.bsn_lag_id;
    fields.vrf = m.fields.bsn_vrf;
    masks.vrf = m.masks.bsn_vrf;
    fields.l3_interface_class_id = m.fields.bsn_l3_interface_class_id;
    masks.l3_interface_class_id = m.masks.bsn_l3_interface_class_id;
    fields.l3_src_class_id = m.fields.bsn_l3_src_class_id;
    masks.l3_src_class_id = m.masks.bsn_l3_src_class_id;
    fields.l3_dst_class_id = m.fields.bsn_l3_dst_class_id;
    masks.l3_dst_class_id = m.masks.bsn_l3_dst_class_id;
    fields.global_vrf_allowed = m.fields.bsn_global_vrf_allowed & 1;
    masks.global_vrf_allowed = m.masks.bsn_global_vrf_allowed & 1;

    // Must come last: no value bit may survive outside its mask.
    fields.mask(&masks);

    debug!("compiled {} match: eth_type {:#06x}/{:#06x}, nw_proto {}/{:#04x}",
           m.version,
           fields.dl_type,
           masks.dl_type,
           fields.nw_proto,
           masks.nw_proto);
    (fields, masks)
}
