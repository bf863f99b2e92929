//! Datapath flow keys.
//!
//! The kernel datapath describes the headers of a packet it could not forward as a list of
//! netlink attributes: a 16-bit length (header included), a 16-bit type, and a payload padded to
//! four bytes. The header is in host byte order; packet header fields inside the payloads stay
//! in network byte order. Two attribute types nest another attribute list: `Encap` (the headers
//! behind a VLAN tag) and `Tunnel` (tunnel metadata, which never nests further).

use std::cmp;

use byteorder::{ByteOrder, NativeEndian};
use thiserror::Error;

/// Size of an attribute header.
pub const NLA_HDRLEN: usize = 4;
const NLA_ALIGNTO: usize = 4;
const NLA_F_NESTED: u16 = 1 << 15;
const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

fn nla_align(len: usize) -> usize {
    (len + NLA_ALIGNTO - 1) & !(NLA_ALIGNTO - 1)
}

/// Flow key attribute types.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OvsKeyAttr {
    Encap = 1,
    Priority = 2,
    InPort = 3,
    Ethernet = 4,
    Vlan = 5,
    Ethertype = 6,
    Ipv4 = 7,
    Ipv6 = 8,
    Tcp = 9,
    Udp = 10,
    Icmp = 11,
    Icmpv6 = 12,
    Arp = 13,
    Nd = 14,
    SkbMark = 15,
    Tunnel = 16,
    Sctp = 17,
    TcpFlags = 18,
}

/// Largest flow key attribute type this crate knows about.
pub const OVS_KEY_ATTR_MAX: u16 = OvsKeyAttr::TcpFlags as u16;

impl OvsKeyAttr {
    pub fn of_int(t: u16) -> Option<OvsKeyAttr> {
        let attr = match t {
            1 => OvsKeyAttr::Encap,
            2 => OvsKeyAttr::Priority,
            3 => OvsKeyAttr::InPort,
            4 => OvsKeyAttr::Ethernet,
            5 => OvsKeyAttr::Vlan,
            6 => OvsKeyAttr::Ethertype,
            7 => OvsKeyAttr::Ipv4,
            8 => OvsKeyAttr::Ipv6,
            9 => OvsKeyAttr::Tcp,
            10 => OvsKeyAttr::Udp,
            11 => OvsKeyAttr::Icmp,
            12 => OvsKeyAttr::Icmpv6,
            13 => OvsKeyAttr::Arp,
            14 => OvsKeyAttr::Nd,
            15 => OvsKeyAttr::SkbMark,
            16 => OvsKeyAttr::Tunnel,
            17 => OvsKeyAttr::Sctp,
            18 => OvsKeyAttr::TcpFlags,
            _ => return None,
        };
        Some(attr)
    }
}

/// Tunnel key attribute types, nested inside `OvsKeyAttr::Tunnel`.
#[repr(u16)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OvsTunnelKeyAttr {
    Id = 0,
    Ipv4Src = 1,
    Ipv4Dst = 2,
    Tos = 3,
    Ttl = 4,
    DontFragment = 5,
    Csum = 6,
}

impl OvsTunnelKeyAttr {
    pub fn of_int(t: u16) -> Option<OvsTunnelKeyAttr> {
        let attr = match t {
            0 => OvsTunnelKeyAttr::Id,
            1 => OvsTunnelKeyAttr::Ipv4Src,
            2 => OvsTunnelKeyAttr::Ipv4Dst,
            3 => OvsTunnelKeyAttr::Tos,
            4 => OvsTunnelKeyAttr::Ttl,
            5 => OvsTunnelKeyAttr::DontFragment,
            6 => OvsTunnelKeyAttr::Csum,
            _ => return None,
        };
        Some(attr)
    }
}

/// Ways a datapath key can be structurally broken.
///
/// Keys come from the kernel, so any of these means the datapath and this crate disagree about
/// the format. Callers treat them as fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{remaining} trailing bytes cannot hold an attribute header")]
    TruncatedHeader { remaining: usize },
    #[error("attribute type {tag} has length {len} but {remaining} bytes remain")]
    BadLength { tag: u16, len: usize, remaining: usize },
    #[error("{attr} attribute has a {actual}-byte payload, expected {expected}")]
    PayloadSize {
        attr: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("flow key has no ethernet attribute")]
    MissingEthernet,
}

/// One attribute of a datapath key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Attr<'a> {
    /// Attribute type with the nested and byte-order flags stripped.
    pub tag: u16,
    pub payload: &'a [u8],
}

/// A borrowed, undecoded datapath flow key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DatapathKey<'a> {
    buf: &'a [u8],
}

impl<'a> DatapathKey<'a> {
    pub fn new(buf: &'a [u8]) -> DatapathKey<'a> {
        DatapathKey { buf: buf }
    }

    /// View the payload of a nested attribute as a key of its own.
    pub fn nested(attr: &Attr<'a>) -> DatapathKey<'a> {
        DatapathKey { buf: attr.payload }
    }

    /// Iterate the attributes of this level, without descending into nested ones.
    pub fn attrs(&self) -> Attrs<'a> {
        Attrs { buf: self.buf }
    }
}

/// Iterator over the attributes of one level of a key.
///
/// Yields at most one error, after which it is exhausted.
pub struct Attrs<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for Attrs<'a> {
    type Item = Result<Attr<'a>, KeyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let remaining = self.buf.len();
        if remaining < NLA_HDRLEN {
            self.buf = &[];
            return Some(Err(KeyError::TruncatedHeader { remaining: remaining }));
        }
        let len = NativeEndian::read_u16(&self.buf[0..2]) as usize;
        let typ = NativeEndian::read_u16(&self.buf[2..4]);
        if len < NLA_HDRLEN || len > remaining {
            self.buf = &[];
            return Some(Err(KeyError::BadLength {
                tag: typ & NLA_TYPE_MASK,
                len: len,
                remaining: remaining,
            }));
        }
        let attr = Attr {
            tag: typ & NLA_TYPE_MASK,
            payload: &self.buf[NLA_HDRLEN..len],
        };
        // The padding after the final attribute may be missing.
        self.buf = &self.buf[cmp::min(nla_align(len), remaining)..];
        Some(Ok(attr))
    }
}

/// Encoder for datapath keys, producing the same bytes the kernel would.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyBuilder {
    bytes: Vec<u8>,
}

impl KeyBuilder {
    pub fn new() -> KeyBuilder {
        KeyBuilder { bytes: vec![] }
    }

    /// Append an attribute with raw type `tag`.
    ///
    /// Panics if the payload is too long for a 16-bit attribute length.
    pub fn put(&mut self, tag: u16, payload: &[u8]) -> &mut KeyBuilder {
        let len = NLA_HDRLEN + payload.len();
        assert!(len <= u16::MAX as usize, "attribute payload too long: {} bytes", payload.len());
        let mut hdr = [0; NLA_HDRLEN];
        NativeEndian::write_u16(&mut hdr[0..2], len as u16);
        NativeEndian::write_u16(&mut hdr[2..4], tag);
        self.bytes.extend_from_slice(&hdr);
        self.bytes.extend_from_slice(payload);
        self.bytes.resize(nla_align(self.bytes.len()), 0);
        self
    }

    pub fn put_key(&mut self, attr: OvsKeyAttr, payload: &[u8]) -> &mut KeyBuilder {
        self.put(attr as u16, payload)
    }

    pub fn put_tunnel(&mut self, attr: OvsTunnelKeyAttr, payload: &[u8]) -> &mut KeyBuilder {
        self.put(attr as u16, payload)
    }

    /// Append a nested attribute whose contents are built by `build`.
    pub fn nest<F>(&mut self, attr: OvsKeyAttr, build: F) -> &mut KeyBuilder
        where F: FnOnce(&mut KeyBuilder)
    {
        let mut inner = KeyBuilder::new();
        build(&mut inner);
        self.put(attr as u16 | NLA_F_NESTED, &inner.bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
