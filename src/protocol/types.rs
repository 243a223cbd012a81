//! Common protocol types

use std::fmt;
use std::str::FromStr;

/// Link-layer (Ethernet) address carried by the link-layer address options
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Build from a 6-byte slice, `None` on any other length
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let octets: [u8; 6] = bytes.try_into().ok()?;
        Some(MacAddr(octets))
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error type for MAC address parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMacAddrError {
    kind: ParseMacAddrErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseMacAddrErrorKind {
    Length,
    Hex,
}

impl fmt::Display for ParseMacAddrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseMacAddrErrorKind::Length => write!(f, "invalid MAC address length"),
            ParseMacAddrErrorKind::Hex => write!(f, "invalid hex digit in MAC address"),
        }
    }
}

impl std::error::Error for ParseMacAddrError {}

impl FromStr for MacAddr {
    type Err = ParseMacAddrError;

    /// Parse "a1:b2:c3:d4:e5:f6" or "a1-b2-c3-d4-e5-f6"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let groups: Vec<&str> = s.split([':', '-']).collect();
        if groups.len() != 6 {
            return Err(ParseMacAddrError {
                kind: ParseMacAddrErrorKind::Length,
            });
        }

        let mut result = [0u8; 6];
        for (i, group) in groups.iter().enumerate() {
            if group.len() != 2 {
                return Err(ParseMacAddrError {
                    kind: ParseMacAddrErrorKind::Length,
                });
            }
            result[i] = u8::from_str_radix(group, 16).map_err(|_| ParseMacAddrError {
                kind: ParseMacAddrErrorKind::Hex,
            })?;
        }

        Ok(MacAddr(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_addr_display() {
        let mac = MacAddr([0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0xf6]);
        assert_eq!(format!("{}", mac), "a1:b2:c3:d4:e5:f6");
    }

    #[test]
    fn test_mac_addr_parse() {
        let mac: MacAddr = "A1:B2:C3:D4:E5:F6".parse().unwrap();
        assert_eq!(mac, MacAddr([0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0xf6]));

        let mac: MacAddr = "00-11-22-33-44-55".parse().unwrap();
        assert_eq!(mac.octets(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    }

    #[test]
    fn test_mac_addr_parse_invalid() {
        assert!("00:11:22:33:44".parse::<MacAddr>().is_err());
        assert!("00:11:22:33:44:gg".parse::<MacAddr>().is_err());
        assert!("001:1:22:33:44:55".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_addr_from_slice() {
        assert_eq!(
            MacAddr::from_slice(&[1, 2, 3, 4, 5, 6]),
            Some(MacAddr([1, 2, 3, 4, 5, 6]))
        );
        assert_eq!(MacAddr::from_slice(&[1, 2, 3]), None);
    }
}
