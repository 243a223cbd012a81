//! ICMPv6 Neighbor Discovery messages - RFC 4861 §4, RFC 4191 §2.2

use super::MacAddr;
use super::ndp_option::{NdpOption, OptionType, marshal_options, parse_options};
use crate::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use tracing::trace;

/// Minimum ICMPv6 header size (type, code, checksum)
pub const MIN_HEADER_SIZE: usize = 4;

/// Router Solicitation message size (without options)
pub const RS_MSG_SIZE: usize = 8;

/// Router Advertisement message size (without options)
pub const RA_MSG_SIZE: usize = 16;

/// Neighbor Solicitation/Advertisement message size (without options)
pub const NDP_MSG_SIZE: usize = 24; // 4 (header) + 4 (reserved/flags) + 16 (target)

/// Neighbor Discovery message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    RouterSolicitation = 133,
    RouterAdvertisement = 134,
    NeighborSolicitation = 135,
    NeighborAdvertisement = 136,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            133 => Some(MessageType::RouterSolicitation),
            134 => Some(MessageType::RouterAdvertisement),
            135 => Some(MessageType::NeighborSolicitation),
            136 => Some(MessageType::NeighborAdvertisement),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessageType::RouterSolicitation => "router solicitation",
            MessageType::RouterAdvertisement => "router advertisement",
            MessageType::NeighborSolicitation => "neighbor solicitation",
            MessageType::NeighborAdvertisement => "neighbor advertisement",
        }
    }

    /// Size of the fixed part preceding the options
    pub fn header_len(&self) -> usize {
        match self {
            MessageType::RouterSolicitation => RS_MSG_SIZE,
            MessageType::RouterAdvertisement => RA_MSG_SIZE,
            MessageType::NeighborSolicitation | MessageType::NeighborAdvertisement => {
                NDP_MSG_SIZE
            }
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Option list accessors shared by every message
pub trait OptionContainer {
    fn options(&self) -> &[NdpOption];

    fn options_mut(&mut self) -> &mut Vec<NdpOption>;

    fn add_option(&mut self, option: NdpOption) {
        self.options_mut().push(option);
    }

    fn has_option(&self, kind: OptionType) -> bool {
        self.options().iter().any(|o| o.option_type() == kind)
    }

    /// First option of the given type
    fn get_option(&self, kind: OptionType) -> Option<&NdpOption> {
        self.options().iter().find(|o| o.option_type() == kind)
    }
}

macro_rules! impl_option_container {
    ($($msg:ty),+) => {
        $(
            impl OptionContainer for $msg {
                fn options(&self) -> &[NdpOption] {
                    &self.options
                }

                fn options_mut(&mut self) -> &mut Vec<NdpOption> {
                    &mut self.options
                }
            }
        )+
    };
}

impl_option_container!(
    RouterSolicitation,
    RouterAdvertisement,
    NeighborSolicitation,
    NeighborAdvertisement
);

/// Router Solicitation message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouterSolicitation {
    pub options: Vec<NdpOption>,
}

impl RouterSolicitation {
    /// Create an RS, optionally carrying our link-layer address
    pub fn new(source_link_addr: Option<MacAddr>) -> Self {
        Self {
            options: source_link_addr
                .map(NdpOption::source_link_layer)
                .into_iter()
                .collect(),
        }
    }

    fn parse(_header: &[u8], options: Vec<NdpOption>) -> Self {
        Self { options }
    }

    fn write_header(&self, _buf: &mut [u8]) {
        // 4 reserved bytes
    }
}

/// Default router preference - RFC 4191 §2.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouterPreference {
    #[default]
    Medium,
    High,
    /// Reserved encoding, receivers treat it as medium
    Reserved,
    Low,
}

impl RouterPreference {
    /// Decode from the two Prf bits
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0b00 => RouterPreference::Medium,
            0b01 => RouterPreference::High,
            0b10 => RouterPreference::Reserved,
            _ => RouterPreference::Low,
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            RouterPreference::Medium => 0b00,
            RouterPreference::High => 0b01,
            RouterPreference::Reserved => 0b10,
            RouterPreference::Low => 0b11,
        }
    }
}

impl fmt::Display for RouterPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouterPreference::Medium => "medium",
            RouterPreference::High => "high",
            RouterPreference::Reserved => "reserved",
            RouterPreference::Low => "low",
        };
        f.write_str(name)
    }
}

/// Router Advertisement message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RouterAdvertisement {
    /// Current hop limit to advertise (0 = unspecified)
    pub hop_limit: u8,
    /// M flag: addresses via DHCPv6
    pub managed_address: bool,
    /// O flag: other configuration via DHCPv6
    pub other_stateful: bool,
    /// H flag (RFC 6275)
    pub home_agent: bool,
    pub router_preference: RouterPreference,
    /// Router lifetime in seconds (0 = not a default router)
    pub router_lifetime: u16,
    /// Reachable time in milliseconds (0 = unspecified)
    pub reachable_time: u32,
    /// Retrans timer in milliseconds (0 = unspecified)
    pub retrans_timer: u32,
    pub options: Vec<NdpOption>,
}

impl RouterAdvertisement {
    fn parse(header: &[u8], options: Vec<NdpOption>) -> Self {
        let flags = header[5];
        Self {
            hop_limit: header[4],
            managed_address: flags & 0x80 != 0,
            other_stateful: flags & 0x40 != 0,
            home_agent: flags & 0x20 != 0,
            router_preference: RouterPreference::from_bits(flags >> 3),
            router_lifetime: u16::from_be_bytes([header[6], header[7]]),
            reachable_time: u32::from_be_bytes([header[8], header[9], header[10], header[11]]),
            retrans_timer: u32::from_be_bytes([header[12], header[13], header[14], header[15]]),
            options,
        }
    }

    fn write_header(&self, buf: &mut [u8]) {
        buf[4] = self.hop_limit;
        let mut flags: u8 = 0;
        if self.managed_address {
            flags |= 0x80;
        }
        if self.other_stateful {
            flags |= 0x40;
        }
        if self.home_agent {
            flags |= 0x20;
        }
        flags |= self.router_preference.bits() << 3;
        buf[5] = flags;
        buf[6..8].copy_from_slice(&self.router_lifetime.to_be_bytes());
        buf[8..12].copy_from_slice(&self.reachable_time.to_be_bytes());
        buf[12..16].copy_from_slice(&self.retrans_timer.to_be_bytes());
    }
}

/// Neighbor Solicitation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSolicitation {
    pub target_addr: Ipv6Addr,
    pub options: Vec<NdpOption>,
}

impl NeighborSolicitation {
    /// Create a new NS for the given target
    pub fn new(target_addr: Ipv6Addr, source_link_addr: Option<MacAddr>) -> Self {
        Self {
            target_addr,
            options: source_link_addr
                .map(NdpOption::source_link_layer)
                .into_iter()
                .collect(),
        }
    }

    fn parse(header: &[u8], options: Vec<NdpOption>) -> Self {
        Self {
            target_addr: target_from(header),
            options,
        }
    }

    fn write_header(&self, buf: &mut [u8]) {
        // 4 reserved bytes, then the target
        buf[8..24].copy_from_slice(&self.target_addr.octets());
    }
}

impl Default for NeighborSolicitation {
    fn default() -> Self {
        Self::new(Ipv6Addr::UNSPECIFIED, None)
    }
}

/// Neighbor Advertisement message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborAdvertisement {
    pub router_flag: bool,
    pub solicited_flag: bool,
    pub override_flag: bool,
    pub target_addr: Ipv6Addr,
    pub options: Vec<NdpOption>,
}

impl NeighborAdvertisement {
    /// Create a new NA without options
    pub fn new(
        target_addr: Ipv6Addr,
        router_flag: bool,
        solicited_flag: bool,
        override_flag: bool,
    ) -> Self {
        Self {
            router_flag,
            solicited_flag,
            override_flag,
            target_addr,
            options: Vec::new(),
        }
    }

    /// Create a solicited NA (reply to NS for our address)
    pub fn solicited_reply(target_addr: Ipv6Addr, target_link_addr: MacAddr) -> Self {
        let mut na = Self::new(target_addr, false, true, true);
        na.add_option(NdpOption::target_link_layer(target_link_addr));
        na
    }

    fn parse(header: &[u8], options: Vec<NdpOption>) -> Self {
        let flags = header[4];
        Self {
            router_flag: flags & 0x80 != 0,
            solicited_flag: flags & 0x40 != 0,
            override_flag: flags & 0x20 != 0,
            target_addr: target_from(header),
            options,
        }
    }

    fn write_header(&self, buf: &mut [u8]) {
        let mut flags: u8 = 0;
        if self.router_flag {
            flags |= 0x80;
        }
        if self.solicited_flag {
            flags |= 0x40;
        }
        if self.override_flag {
            flags |= 0x20;
        }
        buf[4] = flags;
        // 3 reserved bytes
        buf[8..24].copy_from_slice(&self.target_addr.octets());
    }
}

impl Default for NeighborAdvertisement {
    fn default() -> Self {
        Self::new(Ipv6Addr::UNSPECIFIED, false, false, false)
    }
}

fn target_from(header: &[u8]) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&header[8..24]);
    Ipv6Addr::from(octets)
}

/// A Neighbor Discovery message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    RouterSolicitation(RouterSolicitation),
    RouterAdvertisement(RouterAdvertisement),
    NeighborSolicitation(NeighborSolicitation),
    NeighborAdvertisement(NeighborAdvertisement),
}

impl Message {
    /// Create a zero-valued message of the given type
    pub fn new(msg_type: MessageType) -> Self {
        match msg_type {
            MessageType::RouterSolicitation => {
                Message::RouterSolicitation(RouterSolicitation::default())
            }
            MessageType::RouterAdvertisement => {
                Message::RouterAdvertisement(RouterAdvertisement::default())
            }
            MessageType::NeighborSolicitation => {
                Message::NeighborSolicitation(NeighborSolicitation::default())
            }
            MessageType::NeighborAdvertisement => {
                Message::NeighborAdvertisement(NeighborAdvertisement::default())
            }
        }
    }

    /// Parse a message starting at the ICMPv6 type octet.
    ///
    /// Code, checksum and reserved bits are not kept. Marshal writes them as
    /// zero (RFC 4861 §4: ignored by receivers).
    pub fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < MIN_HEADER_SIZE {
            return Err(Error::MessageTooShort {
                expected: MIN_HEADER_SIZE,
                actual: buffer.len(),
            });
        }

        let msg_type =
            MessageType::from_u8(buffer[0]).ok_or(Error::UnsupportedMessageType(buffer[0]))?;

        let header_len = msg_type.header_len();
        if buffer.len() < header_len {
            return Err(Error::MessageTooShort {
                expected: header_len,
                actual: buffer.len(),
            });
        }

        let (header, rest) = buffer.split_at(header_len);
        let options = parse_options(rest)?;
        trace!(%msg_type, len = buffer.len(), options = options.len(), "parsed message");

        let message = match msg_type {
            MessageType::RouterSolicitation => {
                Message::RouterSolicitation(RouterSolicitation::parse(header, options))
            }
            MessageType::RouterAdvertisement => {
                Message::RouterAdvertisement(RouterAdvertisement::parse(header, options))
            }
            MessageType::NeighborSolicitation => {
                Message::NeighborSolicitation(NeighborSolicitation::parse(header, options))
            }
            MessageType::NeighborAdvertisement => {
                Message::NeighborAdvertisement(NeighborAdvertisement::parse(header, options))
            }
        };

        Ok(message)
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Message::RouterSolicitation(_) => MessageType::RouterSolicitation,
            Message::RouterAdvertisement(_) => MessageType::RouterAdvertisement,
            Message::NeighborSolicitation(_) => MessageType::NeighborSolicitation,
            Message::NeighborAdvertisement(_) => MessageType::NeighborAdvertisement,
        }
    }

    /// Length of the marshaled message
    pub fn wire_len(&self) -> usize {
        self.message_type().header_len()
            + self.options().iter().map(NdpOption::wire_len).sum::<usize>()
    }

    /// Build message bytes (ICMPv6 payload, without IPv6 header).
    ///
    /// Code and checksum are left zero; see [`super::checksum::apply_checksum`].
    pub fn marshal(&self) -> Result<Vec<u8>> {
        let msg_type = self.message_type();
        let mut buf = vec![0u8; msg_type.header_len()];
        buf[0] = msg_type as u8;

        match self {
            Message::RouterSolicitation(m) => m.write_header(&mut buf),
            Message::RouterAdvertisement(m) => m.write_header(&mut buf),
            Message::NeighborSolicitation(m) => m.write_header(&mut buf),
            Message::NeighborAdvertisement(m) => m.write_header(&mut buf),
        }

        buf.extend_from_slice(&marshal_options(self.options())?);
        Ok(buf)
    }
}

impl OptionContainer for Message {
    fn options(&self) -> &[NdpOption] {
        match self {
            Message::RouterSolicitation(m) => m.options(),
            Message::RouterAdvertisement(m) => m.options(),
            Message::NeighborSolicitation(m) => m.options(),
            Message::NeighborAdvertisement(m) => m.options(),
        }
    }

    fn options_mut(&mut self) -> &mut Vec<NdpOption> {
        match self {
            Message::RouterSolicitation(m) => m.options_mut(),
            Message::RouterAdvertisement(m) => m.options_mut(),
            Message::NeighborSolicitation(m) => m.options_mut(),
            Message::NeighborAdvertisement(m) => m.options_mut(),
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for Message {
                fn from(msg: $variant) -> Self {
                    Message::$variant(msg)
                }
            }
        )+
    };
}

impl_from_variant!(
    RouterSolicitation,
    RouterAdvertisement,
    NeighborSolicitation,
    NeighborAdvertisement
);

/// tcpdump-like summary, one extra indented line per option
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, length {}", self.message_type(), self.wire_len())?;

        match self {
            Message::RouterSolicitation(_) => {}
            Message::RouterAdvertisement(m) => {
                let mut flags = Vec::new();
                if m.managed_address {
                    flags.push("managed");
                }
                if m.other_stateful {
                    flags.push("other stateful");
                }
                if m.home_agent {
                    flags.push("home agent");
                }
                write!(
                    f,
                    "\n hop limit {}, Flags [{}], pref {}, router lifetime {}s, \
                     reachable time {}s, retrans time {}s",
                    m.hop_limit,
                    flags.join(" "),
                    m.router_preference,
                    m.router_lifetime,
                    m.reachable_time,
                    m.retrans_timer
                )?;
            }
            Message::NeighborSolicitation(m) => {
                write!(f, ", who has {}", m.target_addr)?;
            }
            Message::NeighborAdvertisement(m) => {
                let mut flags = Vec::new();
                if m.router_flag {
                    flags.push("router");
                }
                if m.solicited_flag {
                    flags.push("solicited");
                }
                if m.override_flag {
                    flags.push("override");
                }
                write!(f, ", tgt is {}, Flags [{}]", m.target_addr, flags.join(" "))?;
            }
        }

        for option in self.options() {
            write!(f, "\n    {}", option)?;
        }

        Ok(())
    }
}
