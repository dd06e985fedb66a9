use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// Record types known to the server. Codes seen on the wire that are not in
/// the registry are carried as `Unknown` so a question for them can still be
/// answered.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DNSResourceType {
    #[default]
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    HINFO,
    MX,
    TXT,
    AAAA,
    A6,
    DNAME,
    OPT,
    DS,
    RRSIG,
    NSEC,
    DNSKEY,
    NSEC3,
    NSEC3PARAM,
    AXFR,
    ANY,
    Unknown(u16),
}

const REGISTRY: [(DNSResourceType, u16, &str); 20] = [
    (DNSResourceType::A, 1, "A"),
    (DNSResourceType::NS, 2, "NS"),
    (DNSResourceType::CNAME, 5, "CNAME"),
    (DNSResourceType::SOA, 6, "SOA"),
    (DNSResourceType::PTR, 12, "PTR"),
    (DNSResourceType::HINFO, 13, "HINFO"),
    (DNSResourceType::MX, 15, "MX"),
    (DNSResourceType::TXT, 16, "TXT"),
    (DNSResourceType::AAAA, 28, "AAAA"),
    (DNSResourceType::A6, 38, "A6"),
    (DNSResourceType::DNAME, 39, "DNAME"),
    (DNSResourceType::OPT, 41, "OPT"),
    (DNSResourceType::DS, 43, "DS"),
    (DNSResourceType::RRSIG, 46, "RRSIG"),
    (DNSResourceType::NSEC, 47, "NSEC"),
    (DNSResourceType::DNSKEY, 48, "DNSKEY"),
    (DNSResourceType::NSEC3, 50, "NSEC3"),
    (DNSResourceType::NSEC3PARAM, 51, "NSEC3PARAM"),
    (DNSResourceType::AXFR, 252, "AXFR"),
    (DNSResourceType::ANY, 255, "ANY"),
];

impl DNSResourceType {
    pub fn code(self) -> u16 {
        match self {
            DNSResourceType::Unknown(code) => code,
            known => REGISTRY
                .iter()
                .find(|(rtype, _, _)| *rtype == known)
                .map(|(_, code, _)| *code)
                .unwrap_or_default(),
        }
    }

    pub fn mnemonic(self) -> Option<&'static str> {
        REGISTRY
            .iter()
            .find(|(rtype, _, _)| *rtype == self)
            .map(|(_, _, name)| *name)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, DNSResourceType::Unknown(_))
    }
}

impl From<u16> for DNSResourceType {
    fn from(value: u16) -> Self {
        REGISTRY
            .iter()
            .find(|(_, code, _)| *code == value)
            .map(|(rtype, _, _)| *rtype)
            .unwrap_or(DNSResourceType::Unknown(value))
    }
}

impl From<DNSResourceType> for u16 {
    fn from(value: DNSResourceType) -> Self {
        value.code()
    }
}

impl fmt::Display for DNSResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => f.write_str(name),
            None => write!(f, "TYPE{}", self.code()),
        }
    }
}

/// Parses mnemonics case-insensitively, plus the RFC 3597 `TYPEnnn` form
impl FromStr for DNSResourceType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        if let Some((rtype, _, _)) = REGISTRY.iter().find(|(_, _, name)| *name == upper) {
            return Ok(*rtype);
        }
        upper
            .strip_prefix("TYPE")
            .and_then(|code| code.parse::<u16>().ok())
            .map(DNSResourceType::from)
            .ok_or_else(|| DecodeError::UnknownType(s.to_string()))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DNSResourceClass {
    #[default]
    IN,
    CS,
    CH,
    HS,
    ANY,
    Unknown(u16),
}

impl From<u16> for DNSResourceClass {
    fn from(value: u16) -> Self {
        match value {
            1 => DNSResourceClass::IN,
            2 => DNSResourceClass::CS,
            3 => DNSResourceClass::CH,
            4 => DNSResourceClass::HS,
            255 => DNSResourceClass::ANY,
            other => DNSResourceClass::Unknown(other),
        }
    }
}

impl From<DNSResourceClass> for u16 {
    fn from(value: DNSResourceClass) -> Self {
        match value {
            DNSResourceClass::IN => 1,
            DNSResourceClass::CS => 2,
            DNSResourceClass::CH => 3,
            DNSResourceClass::HS => 4,
            DNSResourceClass::ANY => 255,
            DNSResourceClass::Unknown(code) => code,
        }
    }
}

/// Response codes the request boundary answers with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResponseCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
}

impl ResponseCode {
    pub fn to_u8(self) -> u8 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormatError => 1,
            ResponseCode::ServerFailure => 2,
            ResponseCode::NameError => 3,
            ResponseCode::NotImplemented => 4,
            ResponseCode::Refused => 5,
        }
    }
}
