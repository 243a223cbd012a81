//! ICMPv6 checksum - RFC 4443 §2.3, RFC 8200 §8.1

use crate::{Error, Result};
use std::net::Ipv6Addr;
use tracing::trace;

/// Next header value for ICMPv6
pub const NEXT_HEADER_ICMPV6: u8 = 58;

/// IPv6 pseudo-header size
pub const PSEUDO_HEADER_SIZE: usize = 40;

/// Offset of the checksum field in every ICMPv6 message
pub const CHECKSUM_OFFSET: usize = 2;

/// Smallest buffer that has a checksum field (type, code, checksum)
const MIN_MESSAGE_SIZE: usize = 4;

/// Build the IPv6 pseudo-header for an upper-layer packet of `length` bytes
pub fn pseudo_header(
    src_addr: &Ipv6Addr,
    dst_addr: &Ipv6Addr,
    length: u32,
) -> [u8; PSEUDO_HEADER_SIZE] {
    let mut header = [0u8; PSEUDO_HEADER_SIZE];
    header[0..16].copy_from_slice(&src_addr.octets());
    header[16..32].copy_from_slice(&dst_addr.octets());
    header[32..36].copy_from_slice(&length.to_be_bytes());
    // 36..39 zero
    header[39] = NEXT_HEADER_ICMPV6;
    header
}

/// One's complement sum of 16-bit words, odd trailing byte padded with zero
fn sum_words(mut sum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum = sum.wrapping_add(u16::from_be_bytes([chunk[0], chunk[1]]) as u32);
    }
    if let [last] = chunks.remainder() {
        sum = sum.wrapping_add(u16::from_be_bytes([*last, 0]) as u32);
    }
    sum
}

fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

fn check_len(icmpv6_data: &[u8]) -> Result<()> {
    if icmpv6_data.len() < MIN_MESSAGE_SIZE {
        return Err(Error::MessageTooShort {
            expected: MIN_MESSAGE_SIZE,
            actual: icmpv6_data.len(),
        });
    }
    Ok(())
}

/// Calculate the ICMPv6 checksum, treating the checksum field as zero
pub fn calculate_checksum(
    src_addr: &Ipv6Addr,
    dst_addr: &Ipv6Addr,
    icmpv6_data: &[u8],
) -> Result<u16> {
    check_len(icmpv6_data)?;

    let header = pseudo_header(src_addr, dst_addr, icmpv6_data.len() as u32);
    let mut sum = sum_words(0, &header);
    sum = sum_words(sum, &icmpv6_data[..CHECKSUM_OFFSET]);
    sum = sum_words(sum, &icmpv6_data[CHECKSUM_OFFSET + 2..]);

    Ok(!fold(sum))
}

/// Write the checksum into bytes 2-3 of a marshaled message.
///
/// Any previous checksum value is ignored, so applying twice with the same
/// addresses is a no-op the second time.
pub fn apply_checksum(
    buffer: &mut [u8],
    src_addr: &Ipv6Addr,
    dst_addr: &Ipv6Addr,
) -> Result<u16> {
    let checksum = calculate_checksum(src_addr, dst_addr, buffer)?;
    buffer[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&checksum.to_be_bytes());
    trace!(checksum, len = buffer.len(), "applied ICMPv6 checksum");
    Ok(checksum)
}

/// Validate the checksum of a received message
pub fn verify_checksum(src_addr: &Ipv6Addr, dst_addr: &Ipv6Addr, icmpv6_data: &[u8]) -> bool {
    if icmpv6_data.len() < MIN_MESSAGE_SIZE {
        return false;
    }

    let header = pseudo_header(src_addr, dst_addr, icmpv6_data.len() as u32);
    let sum = sum_words(sum_words(0, &header), icmpv6_data);
    fold(sum) == 0xFFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_routers() -> Ipv6Addr {
        "ff02::2".parse().unwrap()
    }

    fn all_nodes() -> Ipv6Addr {
        "ff02::1".parse().unwrap()
    }

    #[test]
    fn test_pseudo_header_layout() {
        let header = pseudo_header(&all_routers(), &all_nodes(), 16);
        assert_eq!(&header[0..2], &[0xff, 0x02]);
        assert_eq!(header[15], 2);
        assert_eq!(&header[16..18], &[0xff, 0x02]);
        assert_eq!(header[31], 1);
        assert_eq!(&header[32..36], &[0, 0, 0, 16]);
        assert_eq!(&header[36..40], &[0, 0, 0, 58]);
    }

    #[test]
    fn test_apply_checksum_router_advertisement() {
        let mut buffer = vec![134, 0, 0, 0, 64, 72, 14, 16, 0, 0, 0, 0, 0, 0, 0, 0];
        apply_checksum(&mut buffer, &all_routers(), &all_nodes()).unwrap();
        assert_eq!(
            buffer,
            vec![134, 0, 45, 84, 64, 72, 14, 16, 0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert!(verify_checksum(&all_routers(), &all_nodes(), &buffer));
    }

    #[test]
    fn test_apply_checksum_is_stable() {
        let mut once = vec![
            134, 0, 0, 0, 64, 72, 14, 16, 0, 0, 0, 0, 0, 0, 0, 0, 5, 1, 0, 0, 0, 0, 5, 220,
        ];
        apply_checksum(&mut once, &all_routers(), &all_nodes()).unwrap();
        let mut twice = once.clone();
        apply_checksum(&mut twice, &all_routers(), &all_nodes()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(&once[2..4], &[34, 111]);
    }

    #[test]
    fn test_odd_length_body() {
        let mut buffer = vec![135, 0, 0, 0, 0];
        apply_checksum(&mut buffer, &all_routers(), &all_nodes()).unwrap();
        assert!(verify_checksum(&all_routers(), &all_nodes(), &buffer));
    }

    #[test]
    fn test_verify_rejects_wrong_address() {
        let mut buffer = vec![133, 0, 0, 0, 0, 0, 0, 0];
        apply_checksum(&mut buffer, &all_routers(), &all_nodes()).unwrap();
        let other: Ipv6Addr = "fe80::1".parse().unwrap();
        assert!(!verify_checksum(&other, &all_nodes(), &buffer));

        buffer[2] ^= 0xFF;
        assert!(!verify_checksum(&all_routers(), &all_nodes(), &buffer));
    }

    #[test]
    fn test_short_buffer() {
        let mut buffer = vec![134, 0, 0];
        assert!(matches!(
            apply_checksum(&mut buffer, &all_routers(), &all_nodes()),
            Err(Error::MessageTooShort {
                expected: 4,
                actual: 3
            })
        ));
        assert!(!verify_checksum(&all_routers(), &all_nodes(), &buffer));
    }
}
