//! NDP options - RFC 4861 §4.6, RFC 3971 §5.3.2, RFC 6106 §5
//!
//! Every option is a TLV record whose length octet counts 8-octet units,
//! header included. Lengths are always recomputed from the field values;
//! on parse the recomputed length must equal the declared one.

use super::MacAddr;
use super::dns::{decode_domain_names, encode_domain_names};
use crate::{Error, Result};
use std::fmt;
use std::net::Ipv6Addr;
use tracing::{debug, trace};

/// Minimum option size (one 8-octet unit)
pub const MIN_OPTION_SIZE: usize = 8;

/// Largest nonce that fits the 6-octet nonce field
pub const MAX_NONCE: u64 = (1 << 48) - 1;

/// Smallest RDNSS option: header plus one address
pub const RDNSS_MIN_WORDS: usize = 3;

/// Smallest DNSSL option accepted on parse and emitted on marshal
pub const DNSSL_MIN_WORDS: usize = 4;

const MAX_OPTION_WORDS: usize = u8::MAX as usize;

/// NDP option types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    SourceLinkLayerAddress,
    TargetLinkLayerAddress,
    PrefixInformation,
    Mtu,
    Nonce,
    RecursiveDnsServer,
    DnsSearchList,
    /// Any unregistered type code
    Unknown(u8),
}

impl OptionType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => OptionType::SourceLinkLayerAddress,
            2 => OptionType::TargetLinkLayerAddress,
            3 => OptionType::PrefixInformation,
            5 => OptionType::Mtu,
            14 => OptionType::Nonce,
            25 => OptionType::RecursiveDnsServer,
            31 => OptionType::DnsSearchList,
            other => OptionType::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            OptionType::SourceLinkLayerAddress => 1,
            OptionType::TargetLinkLayerAddress => 2,
            OptionType::PrefixInformation => 3,
            OptionType::Mtu => 5,
            OptionType::Nonce => 14,
            OptionType::RecursiveDnsServer => 25,
            OptionType::DnsSearchList => 31,
            OptionType::Unknown(code) => *code,
        }
    }

    /// Short name as printed by tcpdump
    pub fn name(&self) -> &'static str {
        match self {
            OptionType::SourceLinkLayerAddress => "source link-layer address",
            OptionType::TargetLinkLayerAddress => "target link-layer address",
            OptionType::PrefixInformation => "prefix info",
            OptionType::Mtu => "mtu",
            OptionType::Nonce => "nonce",
            OptionType::RecursiveDnsServer => "rdnss",
            OptionType::DnsSearchList => "dnssl",
            OptionType::Unknown(_) => "unknown",
        }
    }
}

impl From<u8> for OptionType {
    fn from(value: u8) -> Self {
        OptionType::from_u8(value)
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source/Target Link-Layer Address payload (Ethernet only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkLayerAddress {
    pub addr: MacAddr,
}

impl LinkLayerAddress {
    pub fn new(addr: MacAddr) -> Self {
        Self { addr }
    }
}

/// Prefix Information option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixInformation {
    pub prefix_len: u8,
    /// On-link flag (L)
    pub on_link: bool,
    /// Autonomous address-configuration flag (A)
    pub autonomous: bool,
    /// Valid lifetime in seconds (0xFFFFFFFF = infinite)
    pub valid_lifetime: u32,
    /// Preferred lifetime in seconds
    pub preferred_lifetime: u32,
    pub prefix: Ipv6Addr,
}

impl PrefixInformation {
    pub fn new(
        prefix: Ipv6Addr,
        prefix_len: u8,
        on_link: bool,
        autonomous: bool,
        valid_lifetime: u32,
        preferred_lifetime: u32,
    ) -> Self {
        Self {
            prefix_len,
            on_link,
            autonomous,
            valid_lifetime,
            preferred_lifetime,
            prefix,
        }
    }
}

impl Default for PrefixInformation {
    fn default() -> Self {
        Self::new(Ipv6Addr::UNSPECIFIED, 0, false, false, 0, 0)
    }
}

/// MTU option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mtu {
    pub mtu: u32,
}

impl Mtu {
    pub fn new(mtu: u32) -> Self {
        Self { mtu }
    }
}

/// Nonce option (SEND), limited to a single 6-octet nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Nonce {
    pub nonce: u64,
}

impl Nonce {
    pub fn new(nonce: u64) -> Self {
        Self { nonce }
    }
}

/// Recursive DNS Server option
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecursiveDnsServer {
    /// Lifetime in seconds
    pub lifetime: u32,
    pub servers: Vec<Ipv6Addr>,
}

impl RecursiveDnsServer {
    pub fn new(lifetime: u32, servers: Vec<Ipv6Addr>) -> Self {
        Self { lifetime, servers }
    }
}

/// DNS Search List option
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DnsSearchList {
    /// Lifetime in seconds
    pub lifetime: u32,
    /// Absolute domain names ("example.org.")
    pub domain_names: Vec<String>,
}

impl DnsSearchList {
    pub fn new(lifetime: u32, domain_names: Vec<String>) -> Self {
        Self {
            lifetime,
            domain_names,
        }
    }
}

/// Option with an unregistered type, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption {
    pub kind: u8,
    /// Everything after the type and length octets. Marshal rejects a body
    /// that leaves the option short of a whole unit.
    pub body: Vec<u8>,
}

impl UnknownOption {
    pub fn new(kind: u8, body: Vec<u8>) -> Result<Self> {
        if !Self::is_aligned(body.len()) {
            return Err(Error::UnalignedOptionBody {
                kind: OptionType::Unknown(kind),
                len: body.len(),
            });
        }
        Ok(Self { kind, body })
    }

    /// Body lengths of 6, 14, 22, ... octets
    fn is_aligned(body_len: usize) -> bool {
        (2 + body_len) % MIN_OPTION_SIZE == 0
    }
}

/// A single NDP option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NdpOption {
    SourceLinkLayerAddress(LinkLayerAddress),
    TargetLinkLayerAddress(LinkLayerAddress),
    PrefixInformation(PrefixInformation),
    Mtu(Mtu),
    Nonce(Nonce),
    RecursiveDnsServer(RecursiveDnsServer),
    DnsSearchList(DnsSearchList),
    Unknown(UnknownOption),
}

impl NdpOption {
    /// Create a zero-valued option of the given type.
    ///
    /// An RDNSS option needs at least one server before it can be marshaled.
    pub fn new(kind: OptionType) -> Self {
        match kind {
            OptionType::SourceLinkLayerAddress => {
                NdpOption::SourceLinkLayerAddress(LinkLayerAddress::default())
            }
            OptionType::TargetLinkLayerAddress => {
                NdpOption::TargetLinkLayerAddress(LinkLayerAddress::default())
            }
            OptionType::PrefixInformation => {
                NdpOption::PrefixInformation(PrefixInformation::default())
            }
            OptionType::Mtu => NdpOption::Mtu(Mtu::default()),
            OptionType::Nonce => NdpOption::Nonce(Nonce::default()),
            OptionType::RecursiveDnsServer => {
                NdpOption::RecursiveDnsServer(RecursiveDnsServer::default())
            }
            OptionType::DnsSearchList => NdpOption::DnsSearchList(DnsSearchList::default()),
            OptionType::Unknown(kind) => NdpOption::Unknown(UnknownOption {
                kind,
                body: vec![0; MIN_OPTION_SIZE - 2],
            }),
        }
    }

    pub fn source_link_layer(addr: MacAddr) -> Self {
        NdpOption::SourceLinkLayerAddress(LinkLayerAddress::new(addr))
    }

    pub fn target_link_layer(addr: MacAddr) -> Self {
        NdpOption::TargetLinkLayerAddress(LinkLayerAddress::new(addr))
    }

    pub fn option_type(&self) -> OptionType {
        match self {
            NdpOption::SourceLinkLayerAddress(_) => OptionType::SourceLinkLayerAddress,
            NdpOption::TargetLinkLayerAddress(_) => OptionType::TargetLinkLayerAddress,
            NdpOption::PrefixInformation(_) => OptionType::PrefixInformation,
            NdpOption::Mtu(_) => OptionType::Mtu,
            NdpOption::Nonce(_) => OptionType::Nonce,
            NdpOption::RecursiveDnsServer(_) => OptionType::RecursiveDnsServer,
            NdpOption::DnsSearchList(_) => OptionType::DnsSearchList,
            NdpOption::Unknown(o) => OptionType::Unknown(o.kind),
        }
    }

    /// Total option length in units of 8 octets, header included
    pub fn len_words(&self) -> usize {
        match self {
            NdpOption::SourceLinkLayerAddress(_)
            | NdpOption::TargetLinkLayerAddress(_)
            | NdpOption::Mtu(_)
            | NdpOption::Nonce(_) => 1,
            NdpOption::PrefixInformation(_) => 4,
            NdpOption::RecursiveDnsServer(o) => 1 + 2 * o.servers.len(),
            NdpOption::DnsSearchList(o) => {
                let names = encode_domain_names(&o.domain_names);
                (1 + names.len() / 8).max(DNSSL_MIN_WORDS)
            }
            NdpOption::Unknown(o) => (2 + o.body.len()).div_ceil(8),
        }
    }

    /// Total option length in octets
    pub fn wire_len(&self) -> usize {
        self.len_words() * 8
    }

    /// Build option bytes, header included
    pub fn marshal(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.wire_len());
        self.marshal_into(&mut buf)?;
        Ok(buf)
    }

    /// Append option bytes to `buf`
    pub fn marshal_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        let kind = self.option_type();
        let words = self.len_words();
        if words > MAX_OPTION_WORDS {
            return Err(Error::OptionTooLong { kind, words });
        }
        match self {
            NdpOption::Nonce(o) if o.nonce > MAX_NONCE => {
                return Err(Error::NonceOutOfRange(o.nonce));
            }
            NdpOption::RecursiveDnsServer(o) if o.servers.is_empty() => {
                return Err(Error::EmptyOption { kind });
            }
            NdpOption::Unknown(o) if !UnknownOption::is_aligned(o.body.len()) => {
                return Err(Error::UnalignedOptionBody {
                    kind,
                    len: o.body.len(),
                });
            }
            _ => {}
        }

        let start = buf.len();
        buf.resize(start + words * 8, 0);
        let out = &mut buf[start..];
        out[0] = kind.as_u8();
        out[1] = words as u8;

        match self {
            NdpOption::SourceLinkLayerAddress(o) | NdpOption::TargetLinkLayerAddress(o) => {
                out[2..8].copy_from_slice(&o.addr.octets());
            }
            NdpOption::PrefixInformation(o) => {
                out[2] = o.prefix_len;
                let mut flags = 0u8;
                if o.on_link {
                    flags |= 0x80;
                }
                if o.autonomous {
                    flags |= 0x40;
                }
                out[3] = flags;
                out[4..8].copy_from_slice(&o.valid_lifetime.to_be_bytes());
                out[8..12].copy_from_slice(&o.preferred_lifetime.to_be_bytes());
                // 12..16 reserved
                out[16..32].copy_from_slice(&o.prefix.octets());
            }
            NdpOption::Mtu(o) => {
                out[4..8].copy_from_slice(&o.mtu.to_be_bytes());
            }
            NdpOption::Nonce(o) => {
                out[2..8].copy_from_slice(&o.nonce.to_be_bytes()[2..8]);
            }
            NdpOption::RecursiveDnsServer(o) => {
                out[4..8].copy_from_slice(&o.lifetime.to_be_bytes());
                for (chunk, server) in out[8..].chunks_exact_mut(16).zip(&o.servers) {
                    chunk.copy_from_slice(&server.octets());
                }
            }
            NdpOption::DnsSearchList(o) => {
                out[4..8].copy_from_slice(&o.lifetime.to_be_bytes());
                let names = encode_domain_names(&o.domain_names);
                out[8..8 + names.len()].copy_from_slice(&names);
            }
            NdpOption::Unknown(o) => {
                out[2..2 + o.body.len()].copy_from_slice(&o.body);
            }
        }

        Ok(())
    }

    /// Decode one option from exactly `declared * 8` bytes
    fn parse_one(kind: OptionType, declared: usize, data: &[u8]) -> Result<Self> {
        let option = match kind {
            OptionType::SourceLinkLayerAddress | OptionType::TargetLinkLayerAddress => {
                expect_words(kind, declared, 1)?;
                let addr = MacAddr::from_slice(&data[2..8]).ok_or(Error::OptionLengthMismatch {
                    kind,
                    computed: 1,
                    declared,
                })?;
                if kind == OptionType::SourceLinkLayerAddress {
                    NdpOption::source_link_layer(addr)
                } else {
                    NdpOption::target_link_layer(addr)
                }
            }
            OptionType::PrefixInformation => {
                expect_words(kind, declared, 4)?;
                NdpOption::PrefixInformation(PrefixInformation {
                    prefix_len: data[2],
                    on_link: data[3] & 0x80 != 0,
                    autonomous: data[3] & 0x40 != 0,
                    valid_lifetime: read_u32(&data[4..8]),
                    preferred_lifetime: read_u32(&data[8..12]),
                    prefix: read_ipv6(&data[16..32]),
                })
            }
            OptionType::Mtu => {
                expect_words(kind, declared, 1)?;
                NdpOption::Mtu(Mtu::new(read_u32(&data[4..8])))
            }
            OptionType::Nonce => {
                expect_words(kind, declared, 1)?;
                let mut bytes = [0u8; 8];
                bytes[2..8].copy_from_slice(&data[2..8]);
                NdpOption::Nonce(Nonce::new(u64::from_be_bytes(bytes)))
            }
            OptionType::RecursiveDnsServer => {
                expect_min_words(kind, declared, RDNSS_MIN_WORDS)?;
                let servers = data[8..].chunks_exact(16).map(read_ipv6).collect();
                NdpOption::RecursiveDnsServer(RecursiveDnsServer::new(
                    read_u32(&data[4..8]),
                    servers,
                ))
            }
            OptionType::DnsSearchList => {
                expect_min_words(kind, declared, DNSSL_MIN_WORDS)?;
                NdpOption::DnsSearchList(DnsSearchList::new(
                    read_u32(&data[4..8]),
                    decode_domain_names(&data[8..])?,
                ))
            }
            OptionType::Unknown(code) => NdpOption::Unknown(UnknownOption {
                kind: code,
                body: data[2..].to_vec(),
            }),
        };

        Ok(option)
    }
}

impl fmt::Display for NdpOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.option_type();
        let words = self.len_words();
        write!(
            f,
            "{} option ({}), length {} ({})",
            kind,
            kind.as_u8(),
            words * 8,
            words
        )?;

        match self {
            NdpOption::SourceLinkLayerAddress(o) | NdpOption::TargetLinkLayerAddress(o) => {
                write!(f, ": {}", o.addr)
            }
            NdpOption::PrefixInformation(o) => {
                let mut flags = Vec::new();
                if o.on_link {
                    flags.push("onlink");
                }
                if o.autonomous {
                    flags.push("auto");
                }
                write!(
                    f,
                    ": {}/{}, Flags [{}], valid time {}s, pref. time {}s",
                    o.prefix,
                    o.prefix_len,
                    flags.join(" "),
                    o.valid_lifetime,
                    o.preferred_lifetime
                )
            }
            NdpOption::Mtu(o) => write!(f, ": {}", o.mtu),
            NdpOption::Nonce(o) => write!(f, ": {}", o.nonce),
            NdpOption::RecursiveDnsServer(o) => {
                write!(f, ": lifetime {}s", o.lifetime)?;
                for (i, server) in o.servers.iter().enumerate() {
                    let sep = if i == 0 { ", " } else { " " };
                    write!(f, "{}addr: {}", sep, server)?;
                }
                Ok(())
            }
            NdpOption::DnsSearchList(o) => write!(
                f,
                ": lifetime {}s, domain(s) {}",
                o.lifetime,
                o.domain_names.join(", ")
            ),
            NdpOption::Unknown(_) => Ok(()),
        }
    }
}

/// Parse a run of options.
///
/// Fewer than 8 trailing bytes are ignored. Any malformed option fails the
/// whole run.
pub fn parse_options(buffer: &[u8]) -> Result<Vec<NdpOption>> {
    let mut options = Vec::new();
    let mut offset = 0;

    while buffer.len() - offset >= MIN_OPTION_SIZE {
        let rest = &buffer[offset..];
        let kind = OptionType::from_u8(rest[0]);
        let declared = rest[1] as usize;
        let opt_len = declared * 8;

        if opt_len > rest.len() {
            debug!(%kind, declared = opt_len, available = rest.len(), "option buffer underrun");
            return Err(Error::OptionBufferUnderrun {
                kind,
                declared: opt_len,
                available: rest.len(),
            });
        }
        if declared == 0 {
            debug!(%kind, "zero length option");
            return Err(Error::OptionZeroLength { kind });
        }

        let option = NdpOption::parse_one(kind, declared, &rest[..opt_len])?;
        let computed = option.len_words();
        if computed != declared {
            debug!(%kind, computed, declared, "option length mismatch");
            return Err(Error::OptionLengthMismatch {
                kind,
                computed,
                declared,
            });
        }

        trace!(%kind, len = opt_len, "parsed option");
        options.push(option);
        offset += opt_len;
    }

    if offset < buffer.len() {
        trace!(remaining = buffer.len() - offset, "ignoring trailing bytes");
    }

    Ok(options)
}

/// Concatenate the wire form of every option
pub fn marshal_options(options: &[NdpOption]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(options.iter().map(NdpOption::wire_len).sum());
    for option in options {
        option.marshal_into(&mut buf)?;
    }
    Ok(buf)
}

fn expect_words(kind: OptionType, declared: usize, expected: usize) -> Result<()> {
    if declared != expected {
        debug!(%kind, declared, expected, "unexpected option length");
        return Err(Error::OptionLengthMismatch {
            kind,
            computed: expected,
            declared,
        });
    }
    Ok(())
}

fn expect_min_words(kind: OptionType, declared: usize, min: usize) -> Result<()> {
    if declared < min {
        debug!(%kind, declared, min, "option too short");
        return Err(Error::OptionLengthMismatch {
            kind,
            computed: min,
            declared,
        });
    }
    Ok(())
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_ipv6(bytes: &[u8]) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    octets.copy_from_slice(&bytes[..16]);
    Ipv6Addr::from(octets)
}
