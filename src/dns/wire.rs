//! Binary primitives shared by the question parser and the record encoders.
//!
//! Reading works on a byte slice plus an explicit offset so callers can keep
//! their own cursor. Writing appends to a `Vec<u8>`.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use std::net::Ipv6Addr;

use crate::error::DecodeError;

/// Maximum length of a single label (RFC 1035 §2.3.4)
pub const MAX_LABEL_LEN: usize = 63;

/// Maximum wire length of a domain name, root byte included
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a character-string payload
pub const MAX_CHARACTER_STRING_LEN: usize = 255;

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8, DecodeError> {
    buf.get(offset)
        .copied()
        .ok_or(DecodeError::Truncated { offset, need: 1 })
}

pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let bytes = take(buf, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let bytes = take(buf, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn take(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    buf.get(offset..offset + len).ok_or(DecodeError::Truncated {
        offset,
        need: offset + len - buf.len().min(offset + len),
    })
}

/// Decode a domain name starting at `start`, following compression pointers.
///
/// Returns the name in presentation form (no trailing dot, `""` for the
/// root) and the offset just past the name as it appears at `start`. Label
/// bytes that would be ambiguous in a dotted name are escaped: `.` and `\`
/// get a backslash, bytes outside printable ASCII become `\DDD`. Every
/// pointer must target an offset strictly before the previous jump, which
/// bounds the walk on cyclic input.
pub fn read_name(buf: &[u8], start: usize) -> Result<(String, usize), DecodeError> {
    let mut name = String::new();
    let mut pos = start;
    let mut limit = start;
    let mut end = None;
    let mut wire_len = 0usize;

    loop {
        let len = read_u8(buf, pos)?;
        match len & 0xC0 {
            0xC0 => {
                let low = read_u8(buf, pos + 1)?;
                let pointer = (((len & 0x3F) as usize) << 8) | low as usize;
                if pointer >= buf.len() {
                    return Err(DecodeError::PointerOutOfRange {
                        pointer,
                        len: buf.len(),
                    });
                }
                if pointer >= limit {
                    return Err(DecodeError::PointerLoop { offset: pos });
                }
                end.get_or_insert(pos + 2);
                pos = pointer;
                limit = pointer;
            }
            0x00 => {
                if len == 0 {
                    let end = *end.get_or_insert(pos + 1);
                    return Ok((name, end));
                }
                let len = len as usize;
                wire_len += len + 1;
                if wire_len + 1 > MAX_NAME_LEN {
                    return Err(DecodeError::NameTooLong);
                }
                let raw = take(buf, pos + 1, len)?;
                if !name.is_empty() {
                    name.push('.');
                }
                push_escaped_label(&mut name, raw);
                pos += len + 1;
            }
            reserved => return Err(DecodeError::ReservedLabelType(reserved)),
        }
    }
}

fn push_escaped_label(out: &mut String, raw: &[u8]) {
    for &byte in raw {
        match byte {
            b'.' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x21..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03}", byte)),
        }
    }
}

/// Whether the byte at `index` of a presentation name is a label separator,
/// that is a `.` not escaped by an odd run of backslashes
pub fn is_label_separator(name: &str, index: usize) -> bool {
    let bytes = name.as_bytes();
    if bytes.get(index) != Some(&b'.') {
        return false;
    }
    let backslashes = bytes[..index].iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 0
}

/// Split a presentation-format name into raw label bytes, resolving `\X`
/// and `\DDD` escapes. `""` and `"."` are the root.
pub fn name_labels(name: &str) -> Result<Vec<Vec<u8>>, DecodeError> {
    let invalid = || DecodeError::InvalidLabel(name.to_string());
    let bytes = name.as_bytes();
    if bytes.is_empty() || name == "." {
        return Ok(Vec::new());
    }

    let mut labels = Vec::new();
    let mut current = Vec::new();
    let mut wire_len = 1;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let rest = &bytes[i + 1..];
                if rest.len() >= 3 && rest[..3].iter().all(u8::is_ascii_digit) {
                    let value = rest[..3]
                        .iter()
                        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
                    current.push(u8::try_from(value).map_err(|_| invalid())?);
                    i += 4;
                } else {
                    current.push(*rest.first().ok_or_else(invalid)?);
                    i += 2;
                }
            }
            b'.' => {
                if current.is_empty() {
                    return Err(invalid());
                }
                wire_len += close_label(&mut labels, &mut current)?;
                i += 1;
            }
            byte => {
                current.push(byte);
                i += 1;
            }
        }
    }
    if !current.is_empty() {
        wire_len += close_label(&mut labels, &mut current)?;
    }

    if wire_len > MAX_NAME_LEN {
        return Err(DecodeError::NameTooLong);
    }
    Ok(labels)
}

fn close_label(labels: &mut Vec<Vec<u8>>, current: &mut Vec<u8>) -> Result<usize, DecodeError> {
    if current.len() > MAX_LABEL_LEN {
        return Err(DecodeError::LabelTooLong(current.len()));
    }
    let wire = current.len() + 1;
    labels.push(std::mem::take(current));
    Ok(wire)
}

/// Append the uncompressed label encoding of `name`, root byte included
pub fn push_name(out: &mut Vec<u8>, name: &str) -> Result<(), DecodeError> {
    for label in name_labels(name)? {
        out.push(label.len() as u8);
        out.extend_from_slice(&label);
    }
    out.push(0);
    Ok(())
}

pub fn encode_name(name: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(name.len() + 2);
    push_name(&mut out, name)?;
    Ok(out)
}

/// Append a length-prefixed character-string
pub fn push_character_string(out: &mut Vec<u8>, text: &str) -> Result<(), DecodeError> {
    let bytes = text.as_bytes();
    if bytes.len() > MAX_CHARACTER_STRING_LEN {
        return Err(DecodeError::CharacterStringTooLong(bytes.len()));
    }
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(())
}

/// Dotted quad of decimal octets; leading zeros are read as decimal
pub fn parse_ipv4(text: &str) -> Result<[u8; 4], DecodeError> {
    let invalid = || DecodeError::InvalidIpv4(text.to_string());
    let parts: Vec<&str> = text.trim().split('.').collect();
    if parts.len() != 4 {
        return Err(invalid());
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        *octet = part.parse::<u8>().map_err(|_| invalid())?;
    }
    Ok(octets)
}

pub fn parse_ipv6(text: &str) -> Result<[u8; 16], DecodeError> {
    text.trim()
        .parse::<Ipv6Addr>()
        .map(|addr| addr.octets())
        .map_err(|_| DecodeError::InvalidIpv6(text.to_string()))
}

/// Decode standard base64; embedded whitespace is ignored as in zone files
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = text.split_whitespace().collect();
    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))
}

/// Decode an NSEC3 salt. `-` is the empty salt.
pub fn decode_salt(text: &str) -> Result<Vec<u8>, DecodeError> {
    if text == "-" {
        return Ok(Vec::new());
    }
    hex::decode(text).map_err(|e| DecodeError::InvalidHex(format!("{}: {}", text, e)))
}

/// Decode unpadded base32hex (RFC 4648 §7), case-insensitive
pub fn decode_base32hex(text: &str) -> Result<Vec<u8>, DecodeError> {
    let upper = text.trim_end_matches('=').to_ascii_uppercase();
    base32::decode(base32::Alphabet::Rfc4648Hex { padding: false }, &upper)
        .ok_or_else(|| DecodeError::InvalidBase32(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers() {
        let buf = [0x00, 0x0A, 0x01, 0x02, 0x03, 0x04];
        assert_eq!(read_u16(&buf, 0).unwrap(), 10);
        assert_eq!(read_u32(&buf, 2).unwrap(), 0x01020304);
        assert_eq!(
            read_u32(&buf, 4),
            Err(DecodeError::Truncated { offset: 4, need: 2 })
        );
    }

    #[test]
    fn test_read_name_plain() {
        let buf = [3, b'w', b'w', b'w', 4, b't', b'e', b's', b't', 3, b'c', b'o', b'm', 0, 0xFF];
        let (name, end) = read_name(&buf, 0).unwrap();
        assert_eq!(name, "www.test.com");
        assert_eq!(end, 14);
    }

    #[test]
    fn test_read_name_with_pointer() {
        // "example.com" at 0, then "www" + pointer to 0 at 13
        let mut buf = vec![7];
        buf.extend_from_slice(b"example");
        buf.push(3);
        buf.extend_from_slice(b"com");
        buf.push(0);
        buf.push(3);
        buf.extend_from_slice(b"www");
        buf.extend_from_slice(&[0xC0, 0x00]);

        let (name, end) = read_name(&buf, 13).unwrap();
        assert_eq!(name, "www.example.com");
        assert_eq!(end, buf.len());
    }

    #[test]
    fn test_read_name_rejects_forward_and_self_pointers() {
        let self_loop = [0xC0, 0x00];
        assert_eq!(
            read_name(&self_loop, 0),
            Err(DecodeError::PointerLoop { offset: 0 })
        );

        // label "a" then pointer back to the label: 0 -> 2 -> 0 would cycle
        let cycle = [1, b'a', 0xC0, 0x00];
        assert_eq!(read_name(&cycle, 0), Err(DecodeError::PointerLoop { offset: 2 }));
    }

    #[test]
    fn test_read_name_pointer_out_of_range() {
        let buf = [0, 0xC0, 0x40];
        assert_eq!(
            read_name(&buf, 1),
            Err(DecodeError::PointerOutOfRange { pointer: 64, len: 3 })
        );
    }

    #[test]
    fn test_read_name_truncated_label() {
        let buf = [5, b'a', b'b'];
        assert!(matches!(read_name(&buf, 0), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_encode_name() {
        assert_eq!(encode_name("").unwrap(), vec![0]);
        assert_eq!(encode_name(".").unwrap(), vec![0]);
        assert_eq!(
            encode_name("ns1.example.com.").unwrap(),
            encode_name("ns1.example.com").unwrap()
        );
        assert_eq!(
            encode_name("a.bc").unwrap(),
            vec![1, b'a', 2, b'b', b'c', 0]
        );
        assert!(matches!(encode_name("a..b"), Err(DecodeError::InvalidLabel(_))));
        assert_eq!(
            encode_name(&"x".repeat(64)),
            Err(DecodeError::LabelTooLong(64))
        );
        let long = vec!["abcdefghij"; 25].join(".");
        assert_eq!(encode_name(&long), Err(DecodeError::NameTooLong));
    }

    #[test]
    fn test_ipv4_leading_zeros_are_decimal() {
        assert_eq!(parse_ipv4("192.0.2.010").unwrap(), [192, 0, 2, 10]);
        assert_eq!(parse_ipv4("010.000.002.001").unwrap(), [10, 0, 2, 1]);
        assert!(parse_ipv4("192.0.2.0256").is_err());
    }

    #[test]
    fn test_read_name_escapes_ambiguous_bytes() {
        // label "a.b", then label [0x00, 'x', 0xFF, '\\']
        let buf = [3, b'a', b'.', b'b', 4, 0x00, b'x', 0xFF, b'\\', 0];
        let (name, end) = read_name(&buf, 0).unwrap();
        assert_eq!(name, r"a\.b.\000x\255\\");
        assert_eq!(end, buf.len());

        // the presentation form encodes back to the same wire bytes
        assert_eq!(encode_name(&name).unwrap(), buf.to_vec());
    }

    #[test]
    fn test_label_separators() {
        let name = r"a\.b.c\\.d";
        let separators: Vec<usize> = (0..name.len())
            .filter(|i| is_label_separator(name, *i))
            .collect();
        assert_eq!(separators, vec![4, 8]);
        assert!(matches!(encode_name(r"a\"), Err(DecodeError::InvalidLabel(_))));
        assert!(matches!(encode_name(r"\300"), Err(DecodeError::InvalidLabel(_))));
    }

    #[test]
    fn test_character_string() {
        let mut out = Vec::new();
        push_character_string(&mut out, "hi").unwrap();
        assert_eq!(out, vec![2, b'h', b'i']);
        assert_eq!(
            push_character_string(&mut out, &"x".repeat(256)),
            Err(DecodeError::CharacterStringTooLong(256))
        );
    }

    #[test]
    fn test_addresses() {
        assert_eq!(parse_ipv4("192.0.2.1").unwrap(), [192, 0, 2, 1]);
        assert!(parse_ipv4("192.0.2.256").is_err());
        assert!(parse_ipv4("192.0.2").is_err());
        assert!(parse_ipv4("192.0.2.1.5").is_err());
        assert!(parse_ipv4("192.0..1").is_err());
        assert!(parse_ipv4("192.0.2.+1").is_err());

        let v6 = parse_ipv6("2001:db8::1").unwrap();
        assert_eq!(&v6[..4], &[0x20, 0x01, 0x0d, 0xb8]);
        assert_eq!(v6[15], 1);
        assert!(v6[4..15].iter().all(|b| *b == 0));
        assert!(parse_ipv6("2001:db8:::1").is_err());
    }

    #[test]
    fn test_text_codecs() {
        assert_eq!(decode_base64("AQID BA==").unwrap(), vec![1, 2, 3, 4]);
        assert!(decode_base64("not base64!").is_err());
        assert_eq!(decode_salt("-").unwrap(), Vec::<u8>::new());
        assert_eq!(decode_salt("aabb").unwrap(), vec![0xAA, 0xBB]);
        assert!(decode_salt("xyz").is_err());
        // RFC 4648 §10 test vector
        assert_eq!(decode_base32hex("CPNMU").unwrap(), b"foo".to_vec());
        assert_eq!(decode_base32hex("cpnmu").unwrap(), b"foo".to_vec());
    }
}
