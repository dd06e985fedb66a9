use super::wire::read_u16;
use crate::error::DecodeError;

/// DNSSEC OK bit of the OPT flags
const DO_FLAG: u16 = 0x8000;

/// EDNS0 OPT pseudo-record carried in a query's additional section
/// (RFC 6891)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdnsOpt {
    /// UDP payload size the requestor can receive, from the CLASS field
    pub udp_payload_size: u16,
    /// Upper 8 bits of the extended RCODE
    pub extended_rcode: u8,
    pub version: u8,
    pub flags: u16,
    pub options: Vec<EdnsOption>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

impl EdnsOpt {
    /// Whether the requestor asked for DNSSEC records
    pub fn do_flag(&self) -> bool {
        self.flags & DO_FLAG != 0
    }

    /// Build from the CLASS, TTL and RDATA of an OPT record
    pub fn parse_from_resource(class: u16, ttl: u32, rdata: &[u8]) -> Result<Self, DecodeError> {
        let mut options = Vec::new();
        let mut pos = 0;
        while pos < rdata.len() {
            let code = read_u16(rdata, pos)?;
            let len = read_u16(rdata, pos + 2)? as usize;
            pos += 4;
            let data = rdata.get(pos..pos + len).ok_or_else(|| {
                DecodeError::InvalidOpt(format!("option {} overruns RDATA", code))
            })?;
            options.push(EdnsOption {
                code,
                data: data.to_vec(),
            });
            pos += len;
        }

        Ok(Self {
            udp_payload_size: class,
            extended_rcode: (ttl >> 24) as u8,
            version: (ttl >> 16) as u8,
            flags: ttl as u16,
            options,
        })
    }
}
