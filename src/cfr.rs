//! Classifier records.
//!
//! A `ClassifierRecord` is the fixed-layout key the flow classifier hashes and masks. A packet
//! is described by one record; a rule by two of the same shape, values and masks. The engine
//! works on `to_bytes()`, so the layout below is part of the contract:
//!
//! ```text
//!  0  dl_dst[6]     6  dl_src[6]    12  dl_type     14  dl_vlan
//! 16  nw_tos       17  nw_proto     18  pad[2]      20  nw_src
//! 24  nw_dst       28  tp_src       30  tp_dst      32  in_port
//! 36  in_ports[4]  52  lag_id       56  vrf         60  l3_interface_class_id
//! 64  l3_src_class_id              68  l3_dst_class_id
//! 72  global_vrf_allowed           73  pad[7]
//! 80  ipv6_src[16]                 96  ipv6_dst[16]
//! ```
//!
//! Integers are big-endian and padding is always zero.

use byteorder::{BigEndian, ByteOrder};

use crate::bits::set_word_bit;

/// Size of the encoded record.
pub const CFR_SIZE: usize = 112;

/// Highest port the in-port bitmap can address. Higher ports share its bit.
pub const MAX_BITMAP_IN_PORT: u32 = 127;

/// Fields of a packet or rule as seen by the classifier.
///
/// Integers are host-order values of their network-order fields: `dl_type` of an IPv4 packet
/// is `0x0800`. Transport ports double as ICMP type and code, see `icmp_port`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClassifierRecord {
    pub dl_dst: [u8; 6],
    pub dl_src: [u8; 6],
    pub dl_type: u16,
    /// VLAN TCI with the tag-present bit set when tagged; zero when untagged.
    pub dl_vlan: u16,
    pub nw_tos: u8,
    pub nw_proto: u8,
    pub nw_src: u32,
    pub nw_dst: u32,
    pub tp_src: u16,
    pub tp_dst: u16,
    pub in_port: u32,
    /// Ingress port bitmap, most significant word first.
    pub in_ports: [u32; 4],
    pub lag_id: u32,
    pub vrf: u32,
    pub l3_interface_class_id: u32,
    pub l3_src_class_id: u32,
    pub l3_dst_class_id: u32,
    pub global_vrf_allowed: u8,
    pub ipv6_src: [u8; 16],
    pub ipv6_dst: [u8; 16],
}

/// Place an ICMP type or code in a transport port field. It takes the low byte, where an
/// OpenFlow 1.0 match carries it in `tcp_src`/`tcp_dst`, so rules of every version agree with
/// packet records.
pub fn icmp_port(v: u8) -> u16 {
    v as u16
}

/// The in-port bitmap of a packet arriving on `in_port`.
pub fn in_port_bitmap(in_port: u32) -> [u32; 4] {
    let mut words = [0; 4];
    set_word_bit(&mut words, in_port.min(MAX_BITMAP_IN_PORT));
    words
}

/// Split a 128-bit port set into bitmap words, most significant first.
pub fn in_ports_of_u128(v: u128) -> [u32; 4] {
    [(v >> 96) as u32, (v >> 64) as u32, (v >> 32) as u32, v as u32]
}

fn and_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(value: &mut T, mask: &T) {
    for (v, m) in value.as_mut().iter_mut().zip(mask.as_ref().iter()) {
        *v &= *m;
    }
}

impl ClassifierRecord {
    /// Encode the record in its fixed layout.
    pub fn to_bytes(&self) -> [u8; CFR_SIZE] {
        let mut b = [0; CFR_SIZE];
        b[0..6].copy_from_slice(&self.dl_dst);
        b[6..12].copy_from_slice(&self.dl_src);
        BigEndian::write_u16(&mut b[12..14], self.dl_type);
        BigEndian::write_u16(&mut b[14..16], self.dl_vlan);
        b[16] = self.nw_tos;
        b[17] = self.nw_proto;
        BigEndian::write_u32(&mut b[20..24], self.nw_src);
        BigEndian::write_u32(&mut b[24..28], self.nw_dst);
        BigEndian::write_u16(&mut b[28..30], self.tp_src);
        BigEndian::write_u16(&mut b[30..32], self.tp_dst);
        BigEndian::write_u32(&mut b[32..36], self.in_port);
        BigEndian::write_u32_into(&self.in_ports, &mut b[36..52]);
        BigEndian::write_u32(&mut b[52..56], self.lag_id);
        BigEndian::write_u32(&mut b[56..60], self.vrf);
        BigEndian::write_u32(&mut b[60..64], self.l3_interface_class_id);
        BigEndian::write_u32(&mut b[64..68], self.l3_src_class_id);
        BigEndian::write_u32(&mut b[68..72], self.l3_dst_class_id);
        b[72] = self.global_vrf_allowed;
        b[80..96].copy_from_slice(&self.ipv6_src);
        b[96..112].copy_from_slice(&self.ipv6_dst);
        b
    }

    /// Decode a record from its fixed layout. Padding is ignored.
    pub fn from_bytes(b: &[u8; CFR_SIZE]) -> ClassifierRecord {
        let mut cfr = ClassifierRecord::default();
        cfr.dl_dst.copy_from_slice(&b[0..6]);
        cfr.dl_src.copy_from_slice(&b[6..12]);
        cfr.dl_type = BigEndian::read_u16(&b[12..14]);
        cfr.dl_vlan = BigEndian::read_u16(&b[14..16]);
        cfr.nw_tos = b[16];
        cfr.nw_proto = b[17];
        cfr.nw_src = BigEndian::read_u32(&b[20..24]);
        cfr.nw_dst = BigEndian::read_u32(&b[24..28]);
        cfr.tp_src = BigEndian::read_u16(&b[28..30]);
        cfr.tp_dst = BigEndian::read_u16(&b[30..32]);
        cfr.in_port = BigEndian::read_u32(&b[32..36]);
        BigEndian::read_u32_into(&b[36..52], &mut cfr.in_ports);
        cfr.lag_id = BigEndian::read_u32(&b[52..56]);
        cfr.vrf = BigEndian::read_u32(&b[56..60]);
        cfr.l3_interface_class_id = BigEndian::read_u32(&b[60..64]);
        cfr.l3_src_class_id = BigEndian::read_u32(&b[64..68]);
        cfr.l3_dst_class_id = BigEndian::read_u32(&b[68..72]);
        cfr.global_vrf_allowed = b[72];
        cfr.ipv6_src.copy_from_slice(&b[80..96]);
        cfr.ipv6_dst.copy_from_slice(&b[96..112]);
        cfr
    }

    /// Clear every bit of `self` that `masks` does not select.
    pub fn mask(&mut self, masks: &ClassifierRecord) {
        and_bytes(&mut self.dl_dst, &masks.dl_dst);
        and_bytes(&mut self.dl_src, &masks.dl_src);
        self.dl_type &= masks.dl_type;
        self.dl_vlan &= masks.dl_vlan;
        self.nw_tos &= masks.nw_tos;
        self.nw_proto &= masks.nw_proto;
        self.nw_src &= masks.nw_src;
        self.nw_dst &= masks.nw_dst;
        self.tp_src &= masks.tp_src;
        self.tp_dst &= masks.tp_dst;
        self.in_port &= masks.in_port;
        for (v, m) in self.in_ports.iter_mut().zip(masks.in_ports.iter()) {
            *v &= *m;
        }
        self.lag_id &= masks.lag_id;
        self.vrf &= masks.vrf;
        self.l3_interface_class_id &= masks.l3_interface_class_id;
        self.l3_src_class_id &= masks.l3_src_class_id;
        self.l3_dst_class_id &= masks.l3_dst_class_id;
        self.global_vrf_allowed &= masks.global_vrf_allowed;
        and_bytes(&mut self.ipv6_src, &masks.ipv6_src);
        and_bytes(&mut self.ipv6_dst, &masks.ipv6_dst);
    }

    /// Copy of `self` with `masks` applied.
    pub fn masked(&self, masks: &ClassifierRecord) -> ClassifierRecord {
        let mut cfr = *self;
        cfr.mask(masks);
        cfr
    }

    /// Whether `self & masks == self` holds for every encoded byte.
    pub fn is_normalized(&self, masks: &ClassifierRecord) -> bool {
        let f = self.to_bytes();
        let m = masks.to_bytes();
        f.iter().zip(m.iter()).all(|(f, m)| f & m == *f)
    }

    /// Whether this packet record falls under the rule `fields`/`masks`.
    pub fn matches(&self, fields: &ClassifierRecord, masks: &ClassifierRecord) -> bool {
        let p = self.to_bytes();
        let f = fields.to_bytes();
        let m = masks.to_bytes();
        p.iter().zip(f.iter()).zip(m.iter()).all(|((p, f), m)| p & m == *f)
    }
}
