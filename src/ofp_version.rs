//! OpenFlow protocol versions.

use std::fmt;

/// OpenFlow protocol version.
///
/// Every version-dependent translation matches on this exhaustively, so adding a version is a
/// compile error until each of them has decided what to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OfpVersion {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
}

impl OfpVersion {
    /// Return the version matching the wire byte `v` of an OpenFlow header, if supported.
    pub fn of_int(v: u8) -> Option<OfpVersion> {
        match v {
            0x01 => Some(OfpVersion::V1_0),
            0x02 => Some(OfpVersion::V1_1),
            0x03 => Some(OfpVersion::V1_2),
            0x04 => Some(OfpVersion::V1_3),
            0x05 => Some(OfpVersion::V1_4),
            _ => None,
        }
    }

    /// Return the wire byte carried in the `version` field of an OpenFlow header.
    pub fn to_int(v: OfpVersion) -> u8 {
        match v {
            OfpVersion::V1_0 => 0x01,
            OfpVersion::V1_1 => 0x02,
            OfpVersion::V1_2 => 0x03,
            OfpVersion::V1_3 => 0x04,
            OfpVersion::V1_4 => 0x05,
        }
    }

    /// Parse a dotted version name such as `1.3`.
    pub fn of_name(name: &str) -> Option<OfpVersion> {
        match name {
            "1.0" => Some(OfpVersion::V1_0),
            "1.1" => Some(OfpVersion::V1_1),
            "1.2" => Some(OfpVersion::V1_2),
            "1.3" => Some(OfpVersion::V1_3),
            "1.4" => Some(OfpVersion::V1_4),
            _ => None,
        }
    }
}

impl fmt::Display for OfpVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            OfpVersion::V1_0 => "1.0",
            OfpVersion::V1_1 => "1.1",
            OfpVersion::V1_2 => "1.2",
            OfpVersion::V1_3 => "1.3",
            OfpVersion::V1_4 => "1.4",
        };
        write!(f, "OpenFlow {}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes() {
        for v in 1..=5 {
            let version = OfpVersion::of_int(v).unwrap();
            assert_eq!(OfpVersion::to_int(version), v);
        }
        assert_eq!(OfpVersion::of_int(0), None);
        assert_eq!(OfpVersion::of_int(6), None);
    }

    #[test]
    fn names() {
        assert_eq!(OfpVersion::of_name("1.3"), Some(OfpVersion::V1_3));
        assert_eq!(OfpVersion::of_name("2.0"), None);
        assert_eq!(OfpVersion::V1_0.to_string(), "OpenFlow 1.0");
    }
}
