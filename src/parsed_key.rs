//! Decoded datapath flow keys.
//!
//! `ParsedKey::parse` flattens the attribute tree of a `DatapathKey` into one value with a slot
//! per attribute and a bitmap recording which slots were present. Packet header fields are
//! converted from network to host byte order here, once; nothing downstream swaps again.

use byteorder::{BigEndian, ByteOrder, NativeEndian};

use crate::bits::{bit, test_bit};
use crate::datapath_key::{DatapathKey, KeyError, OvsKeyAttr, OvsTunnelKeyAttr};

/// `in_port` of a key that carried no `InPort` attribute. Distinct from port 0.
pub const ODPP_NONE: u32 = 0xffff_ffff;

/// TTL assumed for tunnel metadata until the key says otherwise.
pub const DEFAULT_TUNNEL_TTL: u8 = 64;

/// Ethernet addresses of a packet.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyEthernet {
    pub eth_src: [u8; 6],
    pub eth_dst: [u8; 6],
}

impl OvsKeyEthernet {
    pub const SIZE: usize = 12;

    pub fn parse(b: &[u8]) -> OvsKeyEthernet {
        let mut eth = OvsKeyEthernet::default();
        eth.eth_src.copy_from_slice(&b[0..6]);
        eth.eth_dst.copy_from_slice(&b[6..12]);
        eth
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        let mut b = [0; 12];
        b[0..6].copy_from_slice(&self.eth_src);
        b[6..12].copy_from_slice(&self.eth_dst);
        b
    }
}

/// IPv4 header fields. Addresses are host-order integers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyIpv4 {
    pub src: u32,
    pub dst: u32,
    pub proto: u8,
    pub tos: u8,
    pub ttl: u8,
    pub frag: u8,
}

impl OvsKeyIpv4 {
    pub const SIZE: usize = 12;

    pub fn parse(b: &[u8]) -> OvsKeyIpv4 {
        OvsKeyIpv4 {
            src: BigEndian::read_u32(&b[0..4]),
            dst: BigEndian::read_u32(&b[4..8]),
            proto: b[8],
            tos: b[9],
            ttl: b[10],
            frag: b[11],
        }
    }

    pub fn to_bytes(&self) -> [u8; 12] {
        let mut b = [0; 12];
        BigEndian::write_u32(&mut b[0..4], self.src);
        BigEndian::write_u32(&mut b[4..8], self.dst);
        b[8] = self.proto;
        b[9] = self.tos;
        b[10] = self.ttl;
        b[11] = self.frag;
        b
    }
}

/// IPv6 header fields. Addresses stay as network-order bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyIpv6 {
    pub src: [u8; 16],
    pub dst: [u8; 16],
    pub label: u32,
    pub proto: u8,
    pub tclass: u8,
    pub hlimit: u8,
    pub frag: u8,
}

impl OvsKeyIpv6 {
    pub const SIZE: usize = 40;

    pub fn parse(b: &[u8]) -> OvsKeyIpv6 {
        let mut ip = OvsKeyIpv6::default();
        ip.src.copy_from_slice(&b[0..16]);
        ip.dst.copy_from_slice(&b[16..32]);
        ip.label = BigEndian::read_u32(&b[32..36]);
        ip.proto = b[36];
        ip.tclass = b[37];
        ip.hlimit = b[38];
        ip.frag = b[39];
        ip
    }

    pub fn to_bytes(&self) -> [u8; 40] {
        let mut b = [0; 40];
        b[0..16].copy_from_slice(&self.src);
        b[16..32].copy_from_slice(&self.dst);
        BigEndian::write_u32(&mut b[32..36], self.label);
        b[36] = self.proto;
        b[37] = self.tclass;
        b[38] = self.hlimit;
        b[39] = self.frag;
        b
    }
}

/// Source and destination ports of TCP, UDP or SCTP.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyPorts {
    pub src: u16,
    pub dst: u16,
}

impl OvsKeyPorts {
    pub const SIZE: usize = 4;

    pub fn parse(b: &[u8]) -> OvsKeyPorts {
        OvsKeyPorts {
            src: BigEndian::read_u16(&b[0..2]),
            dst: BigEndian::read_u16(&b[2..4]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 4] {
        let mut b = [0; 4];
        BigEndian::write_u16(&mut b[0..2], self.src);
        BigEndian::write_u16(&mut b[2..4], self.dst);
        b
    }
}

/// ICMP or ICMPv6 type and code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyIcmp {
    pub typ: u8,
    pub code: u8,
}

impl OvsKeyIcmp {
    pub const SIZE: usize = 2;

    pub fn parse(b: &[u8]) -> OvsKeyIcmp {
        OvsKeyIcmp {
            typ: b[0],
            code: b[1],
        }
    }

    pub fn to_bytes(&self) -> [u8; 2] {
        [self.typ, self.code]
    }
}

/// ARP fields. Protocol addresses and opcode are host-order integers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyArp {
    pub sip: u32,
    pub tip: u32,
    pub op: u16,
    pub sha: [u8; 6],
    pub tha: [u8; 6],
}

impl OvsKeyArp {
    pub const SIZE: usize = 24;

    pub fn parse(b: &[u8]) -> OvsKeyArp {
        let mut arp = OvsKeyArp {
            sip: BigEndian::read_u32(&b[0..4]),
            tip: BigEndian::read_u32(&b[4..8]),
            op: BigEndian::read_u16(&b[8..10]),
            sha: [0; 6],
            tha: [0; 6],
        };
        arp.sha.copy_from_slice(&b[10..16]);
        arp.tha.copy_from_slice(&b[16..22]);
        arp
    }

    pub fn to_bytes(&self) -> [u8; 24] {
        let mut b = [0; 24];
        BigEndian::write_u32(&mut b[0..4], self.sip);
        BigEndian::write_u32(&mut b[4..8], self.tip);
        BigEndian::write_u16(&mut b[8..10], self.op);
        b[10..16].copy_from_slice(&self.sha);
        b[16..22].copy_from_slice(&self.tha);
        b
    }
}

/// IPv6 neighbor discovery fields.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OvsKeyNd {
    pub target: [u8; 16],
    pub sll: [u8; 6],
    pub tll: [u8; 6],
}

impl OvsKeyNd {
    pub const SIZE: usize = 28;

    pub fn parse(b: &[u8]) -> OvsKeyNd {
        let mut nd = OvsKeyNd::default();
        nd.target.copy_from_slice(&b[0..16]);
        nd.sll.copy_from_slice(&b[16..22]);
        nd.tll.copy_from_slice(&b[22..28]);
        nd
    }

    pub fn to_bytes(&self) -> [u8; 28] {
        let mut b = [0; 28];
        b[0..16].copy_from_slice(&self.target);
        b[16..22].copy_from_slice(&self.sll);
        b[22..28].copy_from_slice(&self.tll);
        b
    }
}

/// Tunnel metadata the packet arrived with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParsedTunnel {
    pub id: u64,
    pub ipv4_src: u32,
    pub ipv4_dst: u32,
    pub tos: u8,
    pub ttl: u8,
    pub dont_fragment: bool,
    pub csum: bool,
}

impl Default for ParsedTunnel {
    fn default() -> ParsedTunnel {
        ParsedTunnel {
            id: 0,
            ipv4_src: 0,
            ipv4_dst: 0,
            tos: 0,
            ttl: DEFAULT_TUNNEL_TTL,
            dont_fragment: false,
            csum: false,
        }
    }
}

/// A datapath flow key, flattened.
///
/// Slots whose attribute was absent hold their default; check `is_present` before trusting one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParsedKey {
    populated: u64,
    pub priority: u32,
    pub in_port: u32,
    pub ethernet: OvsKeyEthernet,
    /// VLAN TCI, including the tag-present bit the datapath sets.
    pub vlan: u16,
    pub ethertype: u16,
    pub ipv4: OvsKeyIpv4,
    pub ipv6: OvsKeyIpv6,
    pub tcp: OvsKeyPorts,
    pub udp: OvsKeyPorts,
    pub sctp: OvsKeyPorts,
    pub tcp_flags: u16,
    pub icmp: OvsKeyIcmp,
    pub icmpv6: OvsKeyIcmp,
    pub arp: OvsKeyArp,
    pub nd: OvsKeyNd,
    pub skb_mark: u32,
    pub tunnel: ParsedTunnel,
}

impl Default for ParsedKey {
    fn default() -> ParsedKey {
        ParsedKey {
            populated: 0,
            priority: 0,
            in_port: ODPP_NONE,
            ethernet: OvsKeyEthernet::default(),
            vlan: 0,
            ethertype: 0,
            ipv4: OvsKeyIpv4::default(),
            ipv6: OvsKeyIpv6::default(),
            tcp: OvsKeyPorts::default(),
            udp: OvsKeyPorts::default(),
            sctp: OvsKeyPorts::default(),
            tcp_flags: 0,
            icmp: OvsKeyIcmp::default(),
            icmpv6: OvsKeyIcmp::default(),
            arp: OvsKeyArp::default(),
            nd: OvsKeyNd::default(),
            skb_mark: 0,
            tunnel: ParsedTunnel::default(),
        }
    }
}

/// How one fixed-width key attribute lands in a `ParsedKey`.
struct KeyField {
    attr: OvsKeyAttr,
    name: &'static str,
    size: usize,
    decode: fn(&mut ParsedKey, &[u8]),
}

const KEY_FIELDS: &[KeyField] = &[
    KeyField {
        attr: OvsKeyAttr::Priority,
        name: "priority",
        size: 4,
        decode: |k, b| k.priority = NativeEndian::read_u32(b),
    },
    KeyField {
        attr: OvsKeyAttr::InPort,
        name: "in_port",
        size: 4,
        decode: |k, b| k.in_port = NativeEndian::read_u32(b),
    },
    KeyField {
        attr: OvsKeyAttr::Ethernet,
        name: "ethernet",
        size: OvsKeyEthernet::SIZE,
        decode: |k, b| k.ethernet = OvsKeyEthernet::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Vlan,
        name: "vlan",
        size: 2,
        decode: |k, b| k.vlan = BigEndian::read_u16(b),
    },
    KeyField {
        attr: OvsKeyAttr::Ethertype,
        name: "ethertype",
        size: 2,
        decode: |k, b| k.ethertype = BigEndian::read_u16(b),
    },
    KeyField {
        attr: OvsKeyAttr::Ipv4,
        name: "ipv4",
        size: OvsKeyIpv4::SIZE,
        decode: |k, b| k.ipv4 = OvsKeyIpv4::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Ipv6,
        name: "ipv6",
        size: OvsKeyIpv6::SIZE,
        decode: |k, b| k.ipv6 = OvsKeyIpv6::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Tcp,
        name: "tcp",
        size: OvsKeyPorts::SIZE,
        decode: |k, b| k.tcp = OvsKeyPorts::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Udp,
        name: "udp",
        size: OvsKeyPorts::SIZE,
        decode: |k, b| k.udp = OvsKeyPorts::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Icmp,
        name: "icmp",
        size: OvsKeyIcmp::SIZE,
        decode: |k, b| k.icmp = OvsKeyIcmp::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Icmpv6,
        name: "icmpv6",
        size: OvsKeyIcmp::SIZE,
        decode: |k, b| k.icmpv6 = OvsKeyIcmp::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Arp,
        name: "arp",
        size: OvsKeyArp::SIZE,
        decode: |k, b| k.arp = OvsKeyArp::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::Nd,
        name: "nd",
        size: OvsKeyNd::SIZE,
        decode: |k, b| k.nd = OvsKeyNd::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::SkbMark,
        name: "skb_mark",
        size: 4,
        decode: |k, b| k.skb_mark = NativeEndian::read_u32(b),
    },
    KeyField {
        attr: OvsKeyAttr::Sctp,
        name: "sctp",
        size: OvsKeyPorts::SIZE,
        decode: |k, b| k.sctp = OvsKeyPorts::parse(b),
    },
    KeyField {
        attr: OvsKeyAttr::TcpFlags,
        name: "tcp_flags",
        size: 2,
        decode: |k, b| k.tcp_flags = BigEndian::read_u16(b),
    },
];

/// How one tunnel attribute lands in a `ParsedTunnel`.
struct TunnelField {
    attr: OvsTunnelKeyAttr,
    name: &'static str,
    size: usize,
    decode: fn(&mut ParsedTunnel, &[u8]),
}

const TUNNEL_FIELDS: &[TunnelField] = &[
    TunnelField {
        attr: OvsTunnelKeyAttr::Id,
        name: "tunnel id",
        size: 8,
        decode: |t, b| t.id = BigEndian::read_u64(b),
    },
    TunnelField {
        attr: OvsTunnelKeyAttr::Ipv4Src,
        name: "tunnel ipv4_src",
        size: 4,
        decode: |t, b| t.ipv4_src = BigEndian::read_u32(b),
    },
    TunnelField {
        attr: OvsTunnelKeyAttr::Ipv4Dst,
        name: "tunnel ipv4_dst",
        size: 4,
        decode: |t, b| t.ipv4_dst = BigEndian::read_u32(b),
    },
    TunnelField {
        attr: OvsTunnelKeyAttr::Tos,
        name: "tunnel tos",
        size: 1,
        decode: |t, b| t.tos = b[0],
    },
    TunnelField {
        attr: OvsTunnelKeyAttr::Ttl,
        name: "tunnel ttl",
        size: 1,
        decode: |t, b| t.ttl = b[0],
    },
    TunnelField {
        attr: OvsTunnelKeyAttr::DontFragment,
        name: "tunnel dont_fragment",
        size: 0,
        decode: |t, _| t.dont_fragment = true,
    },
    TunnelField {
        attr: OvsTunnelKeyAttr::Csum,
        name: "tunnel csum",
        size: 0,
        decode: |t, _| t.csum = true,
    },
];

fn check_size(name: &'static str, expected: usize, actual: usize) -> Result<(), KeyError> {
    if expected == actual {
        Ok(())
    } else {
        Err(KeyError::PayloadSize {
            attr: name,
            expected: expected,
            actual: actual,
        })
    }
}

impl ParsedKey {
    /// Decode a datapath flow key.
    ///
    /// # Panics
    ///
    /// Panics if the key is malformed or lacks an ethernet attribute. Keys come from the kernel
    /// datapath, so either means this crate and the datapath disagree on the key format.
    pub fn parse(key: DatapathKey) -> ParsedKey {
        match ParsedKey::decode(key) {
            Ok(pkey) => pkey,
            Err(e) => {
                error!("malformed datapath flow key: {}", e);
                panic!("malformed datapath flow key: {}", e)
            }
        }
    }

    fn decode(key: DatapathKey) -> Result<ParsedKey, KeyError> {
        let mut pkey = ParsedKey::default();
        pkey.decode_level(key)?;
        if !pkey.is_present(OvsKeyAttr::Ethernet) {
            return Err(KeyError::MissingEthernet);
        }
        Ok(pkey)
    }

    /// Decode one attribute list, then whatever it encapsulates.
    ///
    /// Encapsulated attributes are decoded after the whole outer list, so inner values win.
    fn decode_level(&mut self, key: DatapathKey) -> Result<(), KeyError> {
        let mut encap = None;
        let mut tunnel = None;
        for attr in key.attrs() {
            let attr = attr?;
            match OvsKeyAttr::of_int(attr.tag) {
                Some(OvsKeyAttr::Encap) => encap = Some(attr),
                Some(OvsKeyAttr::Tunnel) => tunnel = Some(attr),
                _ => {
                    match KEY_FIELDS.iter().find(|f| f.attr as u16 == attr.tag) {
                        Some(field) => {
                            check_size(field.name, field.size, attr.payload.len())?;
                            (field.decode)(self, attr.payload);
                            self.set_present(field.attr);
                        }
                        None => trace!("ignoring flow key attribute type {}", attr.tag),
                    }
                }
            }
        }

        if let Some(attr) = encap {
            self.set_present(OvsKeyAttr::Encap);
            self.decode_level(DatapathKey::nested(&attr))?;
        }

        if let Some(attr) = tunnel {
            self.set_present(OvsKeyAttr::Tunnel);
            for attr in DatapathKey::nested(&attr).attrs() {
                let attr = attr?;
                match TUNNEL_FIELDS.iter().find(|f| f.attr as u16 == attr.tag) {
                    Some(field) => {
                        check_size(field.name, field.size, attr.payload.len())?;
                        (field.decode)(&mut self.tunnel, attr.payload);
                    }
                    None => trace!("ignoring tunnel key attribute type {}", attr.tag),
                }
            }
        }
        Ok(())
    }

    /// Whether the key carried attribute `attr`.
    pub fn is_present(&self, attr: OvsKeyAttr) -> bool {
        test_bit(attr as u32, self.populated)
    }

    /// Mark attribute `attr` as carried by the key.
    pub fn set_present(&mut self, attr: OvsKeyAttr) {
        self.populated = bit(attr as u32, self.populated, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datapath_key::KeyBuilder;

    fn ethernet() -> OvsKeyEthernet {
        OvsKeyEthernet {
            eth_src: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
            eth_dst: [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff],
        }
    }

    fn base_key() -> KeyBuilder {
        let mut b = KeyBuilder::new();
        b.put_key(OvsKeyAttr::InPort, &7u32.to_ne_bytes());
        b.put_key(OvsKeyAttr::Ethernet, &ethernet().to_bytes());
        b
    }

    #[test]
    fn defaults_before_parse() {
        let pkey = ParsedKey::default();
        assert_eq!(pkey.in_port, ODPP_NONE);
        assert_eq!(pkey.tunnel.id, 0);
        assert_eq!(pkey.tunnel.ipv4_src, 0);
        assert_eq!(pkey.tunnel.ipv4_dst, 0);
        assert_eq!(pkey.tunnel.tos, 0);
        assert_eq!(pkey.tunnel.ttl, 64);
        assert!(!pkey.is_present(OvsKeyAttr::Ethernet));
    }

    #[test]
    fn parse_ipv4_tcp() {
        let mut b = base_key();
        b.put_key(OvsKeyAttr::Ethertype, &[0x08, 0x00]);
        let ip = OvsKeyIpv4 {
            src: 0x0a000001,
            dst: 0x0a000002,
            proto: 6,
            tos: 0,
            ttl: 64,
            frag: 0,
        };
        b.put_key(OvsKeyAttr::Ipv4, &ip.to_bytes());
        b.put_key(OvsKeyAttr::Tcp, &[0x01, 0xbb, 0xc7, 0x38]);
        let bytes = b.into_bytes();

        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert_eq!(pkey.in_port, 7);
        assert_eq!(pkey.ethernet, ethernet());
        assert_eq!(pkey.ethertype, 0x0800);
        assert_eq!(pkey.ipv4, ip);
        assert_eq!(pkey.tcp, OvsKeyPorts { src: 443, dst: 51000 });
        assert!(pkey.is_present(OvsKeyAttr::Tcp));
        assert!(!pkey.is_present(OvsKeyAttr::Udp));
        assert!(!pkey.is_present(OvsKeyAttr::Vlan));
        assert_eq!(pkey.tunnel.ttl, 64);
    }

    #[test]
    fn encap_accumulates_into_same_key() {
        let mut b = base_key();
        b.put_key(OvsKeyAttr::Ethertype, &[0x81, 0x00]);
        b.put_key(OvsKeyAttr::Vlan, &[0x30, 0x0a]);
        b.nest(OvsKeyAttr::Encap, |inner| {
            inner.put_key(OvsKeyAttr::Ethertype, &[0x08, 0x06]);
            inner.put_key(OvsKeyAttr::Arp, &OvsKeyArp {
                sip: 0xc0a80001,
                tip: 0xc0a80002,
                op: 1,
                sha: [1, 2, 3, 4, 5, 6],
                tha: [0; 6],
            }.to_bytes());
        });
        let bytes = b.into_bytes();

        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert_eq!(pkey.vlan, 0x300a);
        assert_eq!(pkey.ethertype, 0x0806);
        assert!(pkey.is_present(OvsKeyAttr::Arp));
        assert_eq!(pkey.arp.sip, 0xc0a80001);
        assert_eq!(pkey.arp.sha, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn encap_wins_even_when_listed_first() {
        let mut b = KeyBuilder::new();
        b.nest(OvsKeyAttr::Encap, |inner| {
            inner.put_key(OvsKeyAttr::Ethertype, &[0x86, 0xdd]);
        });
        b.put_key(OvsKeyAttr::Ethernet, &ethernet().to_bytes());
        b.put_key(OvsKeyAttr::Ethertype, &[0x81, 0x00]);
        let bytes = b.into_bytes();

        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert_eq!(pkey.ethertype, 0x86dd);
    }

    #[test]
    fn stacked_vlan_tags() {
        let mut b = base_key();
        b.put_key(OvsKeyAttr::Vlan, &[0x10, 0x01]);
        b.nest(OvsKeyAttr::Encap, |inner| {
            inner.put_key(OvsKeyAttr::Vlan, &[0x10, 0x02]);
            inner.nest(OvsKeyAttr::Encap, |inner| {
                inner.put_key(OvsKeyAttr::Ethertype, &[0x08, 0x00]);
            });
        });
        let bytes = b.into_bytes();

        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert_eq!(pkey.vlan, 0x1002);
        assert_eq!(pkey.ethertype, 0x0800);
    }

    #[test]
    fn tunnel_metadata() {
        let mut b = base_key();
        b.nest(OvsKeyAttr::Tunnel, |t| {
            t.put_tunnel(OvsTunnelKeyAttr::Id, &0x1234u64.to_be_bytes());
            t.put_tunnel(OvsTunnelKeyAttr::Ipv4Src, &[192, 168, 0, 1]);
            t.put_tunnel(OvsTunnelKeyAttr::Ipv4Dst, &[192, 168, 0, 2]);
            t.put_tunnel(OvsTunnelKeyAttr::Tos, &[0x10]);
            t.put_tunnel(OvsTunnelKeyAttr::DontFragment, &[]);
        });
        let bytes = b.into_bytes();

        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert!(pkey.is_present(OvsKeyAttr::Tunnel));
        assert_eq!(pkey.tunnel.id, 0x1234);
        assert_eq!(pkey.tunnel.ipv4_src, 0xc0a80001);
        assert_eq!(pkey.tunnel.ipv4_dst, 0xc0a80002);
        assert_eq!(pkey.tunnel.tos, 0x10);
        assert_eq!(pkey.tunnel.ttl, 64);
        assert!(pkey.tunnel.dont_fragment);
        assert!(!pkey.tunnel.csum);
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let mut b = base_key();
        b.put(40, &[1, 2, 3]);
        let bytes = b.into_bytes();
        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert_eq!(pkey.in_port, 7);
    }

    #[test]
    fn missing_in_port_keeps_sentinel() {
        let mut b = KeyBuilder::new();
        b.put_key(OvsKeyAttr::Ethernet, &ethernet().to_bytes());
        let bytes = b.into_bytes();
        let pkey = ParsedKey::parse(DatapathKey::new(&bytes));
        assert_eq!(pkey.in_port, ODPP_NONE);
        assert!(!pkey.is_present(OvsKeyAttr::InPort));
    }

    #[test]
    fn wrong_payload_size_is_an_error() {
        let mut b = base_key();
        b.put_key(OvsKeyAttr::Ipv4, &[0; 8]);
        let bytes = b.into_bytes();
        assert_eq!(ParsedKey::decode(DatapathKey::new(&bytes)),
                   Err(KeyError::PayloadSize {
                       attr: "ipv4",
                       expected: 12,
                       actual: 8,
                   }));
    }

    #[test]
    fn missing_ethernet_is_an_error() {
        let mut b = KeyBuilder::new();
        b.put_key(OvsKeyAttr::InPort, &1u32.to_ne_bytes());
        let bytes = b.into_bytes();
        assert_eq!(ParsedKey::decode(DatapathKey::new(&bytes)),
                   Err(KeyError::MissingEthernet));
    }

    #[test]
    #[should_panic(expected = "malformed datapath flow key")]
    fn missing_ethernet_is_fatal() {
        let bytes = KeyBuilder::new().into_bytes();
        ParsedKey::parse(DatapathKey::new(&bytes));
    }

    #[test]
    #[should_panic(expected = "malformed datapath flow key")]
    fn malformed_tunnel_is_fatal() {
        let mut b = base_key();
        b.nest(OvsKeyAttr::Tunnel, |t| {
            t.put_tunnel(OvsTunnelKeyAttr::Ttl, &[1, 2]);
        });
        let bytes = b.into_bytes();
        ParsedKey::parse(DatapathKey::new(&bytes));
    }
}
