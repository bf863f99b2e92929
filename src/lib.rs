//! Translation between the three ways an OVS-backed OpenFlow switch describes packet headers:
//! datapath flow keys (`datapath_key`, decoded by `parsed_key`), OpenFlow matches (`ofp_match`)
//! and classifier records (`cfr`).
//!
//! Two pipelines use them. A packet missing in the datapath is decoded once and projected both
//! into a packet-in match (`key_to_match`) and into a record to look up installed rules with
//! (`key_to_cfr`). A flow-mod's match is compiled into a value/mask record pair for the
//! classifier (`match_to_cfr`). All translations are pure functions.

#![crate_name = "ovs_match"]
#![crate_type = "lib"]

#[macro_use]
extern crate log;

mod bits;
pub mod cfr;
pub mod datapath_key;
pub mod key_to_cfr;
pub mod key_to_match;
pub mod match_to_cfr;
pub mod ofp_match;
pub mod ofp_version;
pub mod parsed_key;

pub use cfr::ClassifierRecord;
pub use datapath_key::{DatapathKey, KeyBuilder};
pub use key_to_cfr::key_to_cfr;
pub use key_to_match::key_to_match;
pub use match_to_cfr::match_to_cfr;
pub use ofp_match::{MatchFields, OfpMatch};
pub use ofp_version::OfpVersion;
pub use parsed_key::ParsedKey;
