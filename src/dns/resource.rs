use std::collections::BTreeSet;
use std::fmt;

use super::{
    bitmap::build_bitmap,
    enums::DNSResourceType,
    wire::{
        decode_base32hex, decode_base64, decode_salt, parse_ipv4, parse_ipv6,
        push_character_string, push_name,
    },
};
use crate::error::{DecodeError, DnsError, Result};

/// A resource record as served from a zone. `encode` produces RDATA only;
/// owner name, type, class and TTL are written by the response assembler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub ttl: u32,
    pub data: RData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RData {
    /// Placeholder for "no data / unsupported type"; never encodable
    Empty,
    SOA(SoaData),
    NS(String),
    CNAME(String),
    PTR(String),
    TXT(String),
    A(String),
    AAAA(String),
    MX {
        preference: u16,
        host: String,
    },
    HINFO {
        cpu: String,
        os: String,
    },
    DNSKEY(DnskeyData),
    RRSIG(RrsigData),
    NSEC {
        next_domain: String,
        types: BTreeSet<DNSResourceType>,
    },
    NSEC3(Nsec3Data),
    NSEC3PARAM(Nsec3ParamData),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoaData {
    pub server: String,
    pub contact: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnskeyData {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    /// Base64 text as stored in the zone
    pub public_key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RrsigData {
    pub type_covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    /// Base64 text as stored in the zone
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3Data {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    /// Hex salt, `-` for none
    pub salt: String,
    /// Base32hex (RFC 4648 §7) hash of the next owner
    pub next_hashed_owner: String,
    pub types: BTreeSet<DNSResourceType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3ParamData {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: String,
}

impl ResourceRecord {
    pub fn new(name: impl Into<String>, ttl: u32, data: RData) -> Self {
        Self {
            name: name.into(),
            ttl,
            data,
        }
    }

    /// The "no data / unsupported type" sentinel
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            ttl: 0,
            data: RData::Empty,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.data, RData::Empty)
    }

    /// Record type, `None` for the sentinel
    pub fn rtype(&self) -> Option<DNSResourceType> {
        self.data.rtype()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.data.encode()
    }
}

impl RData {
    pub fn rtype(&self) -> Option<DNSResourceType> {
        let rtype = match self {
            RData::Empty => return None,
            RData::SOA(_) => DNSResourceType::SOA,
            RData::NS(_) => DNSResourceType::NS,
            RData::CNAME(_) => DNSResourceType::CNAME,
            RData::PTR(_) => DNSResourceType::PTR,
            RData::TXT(_) => DNSResourceType::TXT,
            RData::A(_) => DNSResourceType::A,
            RData::AAAA(_) => DNSResourceType::AAAA,
            RData::MX { .. } => DNSResourceType::MX,
            RData::HINFO { .. } => DNSResourceType::HINFO,
            RData::DNSKEY(_) => DNSResourceType::DNSKEY,
            RData::RRSIG(_) => DNSResourceType::RRSIG,
            RData::NSEC { .. } => DNSResourceType::NSEC,
            RData::NSEC3(_) => DNSResourceType::NSEC3,
            RData::NSEC3PARAM(_) => DNSResourceType::NSEC3PARAM,
        };
        Some(rtype)
    }

    /// Encode to RDATA wire format. Pure: depends only on the payload.
    ///
    /// Payload text that does not fit its type is reported as
    /// [`DnsError::Content`].
    pub fn encode(&self) -> Result<Vec<u8>> {
        if let RData::Empty = self {
            return Err(DnsError::Precondition(
                "encode called on the empty record".to_string(),
            ));
        }
        self.encode_payload().map_err(DnsError::Content)
    }

    fn encode_payload(&self) -> std::result::Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        match self {
            RData::Empty => {}
            RData::SOA(soa) => {
                push_name(&mut out, &soa.server)?;
                push_name(&mut out, &soa.contact)?;
                for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                    out.extend_from_slice(&value.to_be_bytes());
                }
            }
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => {
                push_name(&mut out, name)?;
            }
            RData::TXT(text) => push_character_string(&mut out, text)?,
            RData::A(address) => out.extend_from_slice(&parse_ipv4(address)?),
            RData::AAAA(address) => out.extend_from_slice(&parse_ipv6(address)?),
            RData::MX { preference, host } => {
                out.extend_from_slice(&preference.to_be_bytes());
                push_name(&mut out, host)?;
            }
            RData::HINFO { cpu, os } => {
                push_character_string(&mut out, cpu)?;
                push_character_string(&mut out, os)?;
            }
            RData::DNSKEY(key) => {
                out.extend_from_slice(&key.flags.to_be_bytes());
                out.push(key.protocol);
                out.push(key.algorithm);
                out.extend_from_slice(&decode_base64(&key.public_key)?);
            }
            RData::RRSIG(sig) => {
                out.extend_from_slice(&sig.type_covered.code().to_be_bytes());
                out.push(sig.algorithm);
                out.push(sig.labels);
                out.extend_from_slice(&sig.original_ttl.to_be_bytes());
                out.extend_from_slice(&sig.expiration.to_be_bytes());
                out.extend_from_slice(&sig.inception.to_be_bytes());
                out.extend_from_slice(&sig.key_tag.to_be_bytes());
                push_name(&mut out, &sig.signer_name)?;
                out.extend_from_slice(&decode_base64(&sig.signature)?);
            }
            RData::NSEC { next_domain, types } => {
                push_name(&mut out, next_domain)?;
                out.extend_from_slice(&build_bitmap(types));
            }
            RData::NSEC3(nsec3) => {
                push_nsec3_params(
                    &mut out,
                    nsec3.hash_algorithm,
                    nsec3.flags,
                    nsec3.iterations,
                    &nsec3.salt,
                )?;
                let next = decode_base32hex(&nsec3.next_hashed_owner)?;
                push_length_prefixed(&mut out, "next hashed owner", &next)?;
                out.extend_from_slice(&build_bitmap(&nsec3.types));
            }
            RData::NSEC3PARAM(param) => {
                push_nsec3_params(
                    &mut out,
                    param.hash_algorithm,
                    param.flags,
                    param.iterations,
                    &param.salt,
                )?;
            }
        }
        Ok(out)
    }
}

fn push_nsec3_params(
    out: &mut Vec<u8>,
    hash_algorithm: u8,
    flags: u8,
    iterations: u16,
    salt: &str,
) -> std::result::Result<(), DecodeError> {
    out.push(hash_algorithm);
    out.push(flags);
    out.extend_from_slice(&iterations.to_be_bytes());
    push_length_prefixed(out, "salt", &decode_salt(salt)?)
}

fn push_length_prefixed(
    out: &mut Vec<u8>,
    field: &'static str,
    bytes: &[u8],
) -> std::result::Result<(), DecodeError> {
    let len = u8::try_from(bytes.len()).map_err(|_| DecodeError::InvalidField {
        field,
        value: format!("{} bytes", bytes.len()),
    })?;
    out.push(len);
    out.extend_from_slice(bytes);
    Ok(())
}

fn fmt_types(f: &mut fmt::Formatter<'_>, types: &BTreeSet<DNSResourceType>) -> fmt::Result {
    for rtype in types {
        write!(f, " {}", rtype)?;
    }
    Ok(())
}

/// Presentation format of the payload, as it would appear in a zone file
impl fmt::Display for RData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RData::Empty => f.write_str("<empty>"),
            RData::SOA(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.server, soa.contact, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => f.write_str(name),
            RData::TXT(text) => write!(f, "\"{}\"", text),
            RData::A(address) | RData::AAAA(address) => f.write_str(address),
            RData::MX { preference, host } => write!(f, "{} {}", preference, host),
            RData::HINFO { cpu, os } => write!(f, "\"{}\" \"{}\"", cpu, os),
            RData::DNSKEY(key) => write!(
                f,
                "{} {} {} {}",
                key.flags, key.protocol, key.algorithm, key.public_key
            ),
            RData::RRSIG(sig) => write!(
                f,
                "{} {} {} {} {} {} {} {} {}",
                sig.type_covered,
                sig.algorithm,
                sig.labels,
                sig.original_ttl,
                sig.expiration,
                sig.inception,
                sig.key_tag,
                sig.signer_name,
                sig.signature
            ),
            RData::NSEC { next_domain, types } => {
                f.write_str(next_domain)?;
                fmt_types(f, types)
            }
            RData::NSEC3(nsec3) => {
                write!(
                    f,
                    "{} {} {} {} {}",
                    nsec3.hash_algorithm,
                    nsec3.flags,
                    nsec3.iterations,
                    nsec3.salt,
                    nsec3.next_hashed_owner
                )?;
                fmt_types(f, &nsec3.types)
            }
            RData::NSEC3PARAM(param) => write!(
                f,
                "{} {} {} {}",
                param.hash_algorithm, param.flags, param.iterations, param.salt
            ),
        }
    }
}
