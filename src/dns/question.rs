use bitstream_io::{BigEndian, BitWrite, BitWriter};
use tracing::trace;

use super::{
    edns::EdnsOpt,
    enums::{DNSResourceClass, DNSResourceType},
    header::{DNSHeader, HEADER_LEN},
    wire::{name_labels, read_name, read_u16, read_u32},
};
use crate::error::DecodeError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    /// Dotted owner name without trailing dot; `""` is the root
    pub name: String,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(name: impl Into<String>, qtype: DNSResourceType, qclass: DNSResourceClass) -> Self {
        Self {
            name: name.into(),
            qtype,
            qclass,
        }
    }

    /// Wire form: uncompressed name, QTYPE, QCLASS
    pub fn to_bytes(&self) -> Result<Vec<u8>, DecodeError> {
        let mut buf = Vec::with_capacity(self.name.len() + 6);
        {
            let mut writer = BitWriter::<_, BigEndian>::new(&mut buf);
            for label in name_labels(&self.name)? {
                writer.write_var::<u8>(8, label.len() as u8)?;
                writer.write_bytes(&label)?;
            }
            writer.write_var::<u8>(8, 0)?;
            writer.write_var::<u16>(16, self.qtype.into())?;
            writer.write_var::<u16>(16, self.qclass.into())?;
        }
        Ok(buf)
    }
}

/// Parse `count` consecutive questions starting at `offset`.
///
/// Returns the questions in order and the offset just past the last one.
/// Names may use compression pointers into any earlier part of `buf`.
pub fn parse_questions(
    buf: &[u8],
    offset: usize,
    count: usize,
) -> Result<(Vec<DNSQuestion>, usize), DecodeError> {
    let mut questions = Vec::with_capacity(count.min(16));
    let mut pos = offset;

    for _ in 0..count {
        let (name, after_name) = read_name(buf, pos)?;
        let qtype = DNSResourceType::from(read_u16(buf, after_name)?);
        let qclass = DNSResourceClass::from(read_u16(buf, after_name + 2)?);
        pos = after_name + 4;

        trace!("Parsed question {} {} ending at {}", name, qtype, pos);
        questions.push(DNSQuestion {
            name,
            qtype,
            qclass,
        });
    }

    Ok((questions, pos))
}

/// Parse the question section of a whole message using the header's QDCOUNT
pub fn parse_query(buf: &[u8]) -> Result<Vec<DNSQuestion>, DecodeError> {
    let header = DNSHeader::parse(buf)?;
    let (questions, _) = parse_questions(buf, HEADER_LEN, header.qdcount as usize)?;
    Ok(questions)
}

/// A parsed query message: header, questions and the EDNS OPT record of the
/// additional section, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DNSQuery {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub edns: Option<EdnsOpt>,
}

impl DNSQuery {
    /// Whether the requestor set the DNSSEC OK bit
    pub fn dnssec_ok(&self) -> bool {
        self.edns.as_ref().is_some_and(EdnsOpt::do_flag)
    }
}

/// Parse a whole query message. Answer and authority records are skipped;
/// the additional section is scanned for a single OPT record.
pub fn parse_message(buf: &[u8]) -> Result<DNSQuery, DecodeError> {
    let header = DNSHeader::parse(buf)?;
    let (questions, mut pos) = parse_questions(buf, HEADER_LEN, header.qdcount as usize)?;

    for _ in 0..(header.ancount as usize + header.nscount as usize) {
        pos = read_record(buf, pos)?.end;
    }

    let mut edns = None;
    for _ in 0..header.arcount {
        let record = read_record(buf, pos)?;
        pos = record.end;
        if record.rtype != DNSResourceType::OPT {
            continue;
        }
        if !record.owner.is_empty() {
            return Err(DecodeError::InvalidOpt(format!(
                "owner must be the root, got {:?}",
                record.owner
            )));
        }
        if edns.is_some() {
            return Err(DecodeError::InvalidOpt("more than one OPT record".to_string()));
        }
        let rdata = &buf[record.rdata_start..record.end];
        edns = Some(EdnsOpt::parse_from_resource(record.class, record.ttl, rdata)?);
    }

    trace!(
        "Parsed message {:04x}: {} questions, EDNS {:?}",
        header.id,
        questions.len(),
        edns
    );
    Ok(DNSQuery {
        header,
        questions,
        edns,
    })
}

struct RawRecord {
    owner: String,
    rtype: DNSResourceType,
    class: u16,
    ttl: u32,
    rdata_start: usize,
    end: usize,
}

fn read_record(buf: &[u8], offset: usize) -> Result<RawRecord, DecodeError> {
    let (owner, pos) = read_name(buf, offset)?;
    let rtype = DNSResourceType::from(read_u16(buf, pos)?);
    let class = read_u16(buf, pos + 2)?;
    let ttl = read_u32(buf, pos + 4)?;
    let rdlength = read_u16(buf, pos + 8)? as usize;
    let rdata_start = pos + 10;
    let end = rdata_start + rdlength;
    if end > buf.len() {
        return Err(DecodeError::Truncated {
            offset: rdata_start,
            need: end - buf.len(),
        });
    }
    Ok(RawRecord {
        owner,
        rtype,
        class,
        ttl,
        rdata_start,
        end,
    })
}
