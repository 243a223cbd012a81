//! Neighbor Discovery protocol implementation
//!
//! Messages and options are decoded from and encoded to raw ICMPv6 payloads
//! (starting at the type octet). No sockets are involved.

pub mod checksum;
pub mod dns;
pub mod icmpv6;
pub mod ndp_option;
pub mod types;

pub use checksum::{apply_checksum, calculate_checksum, verify_checksum};
pub use icmpv6::{
    Message, MessageType, NeighborAdvertisement, NeighborSolicitation, OptionContainer,
    RouterAdvertisement, RouterPreference, RouterSolicitation,
};
pub use ndp_option::{
    DnsSearchList, LinkLayerAddress, Mtu, NdpOption, Nonce, OptionType, PrefixInformation,
    RecursiveDnsServer, UnknownOption, marshal_options, parse_options,
};
pub use types::*;
