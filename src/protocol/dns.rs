//! Domain name encoding for the DNS Search List option - RFC 1035 §3.1, RFC 6106 §5.2
//!
//! Names are written as length-prefixed labels, each name closed by the
//! zero-length root label. The whole list is zero-padded to a multiple of
//! 8 octets. Compression pointers are not allowed in NDP options.

use crate::{Error, Result};
use tracing::trace;

/// Maximum encoded size of a name list (RFC 1035 name limit)
pub const MAX_ENCODED_LEN: usize = 255;

/// Maximum length of a single label
pub const MAX_LABEL_LEN: usize = 63;

/// Encode absolute domain names into label format.
///
/// Labels longer than 63 octets are cut to 63. Names that would push the
/// list past 255 octets are dropped, as are names with no labels. All of
/// these are lossy.
pub fn encode_domain_names<S: AsRef<str>>(names: &[S]) -> Vec<u8> {
    let mut result = Vec::new();

    for name in names {
        let encoded = encode_name(name.as_ref());
        if encoded.is_empty() {
            continue;
        }
        if result.len() + encoded.len() > MAX_ENCODED_LEN {
            trace!(
                name = name.as_ref(),
                len = result.len(),
                "dropping domain name past 255 octets"
            );
            break;
        }
        result.extend_from_slice(&encoded);
    }

    result.resize(padded_len(result.len()), 0);
    result
}

/// One name with its root label, empty for the root name itself
fn encode_name(name: &str) -> Vec<u8> {
    let mut result = Vec::new();
    for label in name.split('.') {
        // Leading/trailing dots produce empty segments
        if label.is_empty() {
            continue;
        }
        let bytes = label.as_bytes();
        let bytes = &bytes[..bytes.len().min(MAX_LABEL_LEN)];
        result.push(bytes.len() as u8);
        result.extend_from_slice(bytes);
    }
    if !result.is_empty() {
        result.push(0);
    }
    result
}

/// Decode label-format domain names.
///
/// The first zero octet outside a name starts the padding, which must be
/// all zeros. Only input that [`encode_domain_names`] reproduces octet for
/// octet is accepted.
pub fn decode_domain_names(buffer: &[u8]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut labels: Vec<&str> = Vec::new();
    let mut offset = 0;
    let mut names_end = 0;

    while offset < buffer.len() {
        let len = buffer[offset] as usize;
        offset += 1;

        if len == 0 {
            if labels.is_empty() {
                if buffer[offset..].iter().any(|&b| b != 0) {
                    return Err(Error::InvalidDomainName(format!(
                        "data after padding at offset {}",
                        offset - 1
                    )));
                }
                break;
            }
            names.push(absolute_name(&labels));
            labels.clear();
            names_end = offset;
            continue;
        }

        if len > MAX_LABEL_LEN {
            return Err(Error::InvalidDomainName(format!(
                "label length {} at offset {}",
                len,
                offset - 1
            )));
        }
        let end = offset + len;
        if end > buffer.len() {
            return Err(Error::InvalidDomainName(format!(
                "label at offset {} runs past the end",
                offset - 1
            )));
        }

        let label = std::str::from_utf8(&buffer[offset..end])
            .map_err(|e| Error::InvalidDomainName(format!("label is not UTF-8: {}", e)))?;
        if label.contains('.') {
            return Err(Error::InvalidDomainName(format!(
                "label {:?} contains a dot",
                label
            )));
        }
        labels.push(label);
        offset = end;
    }

    if !labels.is_empty() {
        return Err(Error::InvalidDomainName(format!(
            "unterminated name {}",
            absolute_name(&labels)
        )));
    }
    if names_end > MAX_ENCODED_LEN {
        return Err(Error::InvalidDomainName(format!(
            "names exceed {} octets",
            MAX_ENCODED_LEN
        )));
    }

    Ok(names)
}

/// Round up to the next multiple of 8 octets
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(8) * 8
}

fn absolute_name(labels: &[&str]) -> String {
    let mut name = labels.join(".");
    name.push('.');
    name
}
