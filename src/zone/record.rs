use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use std::str::{FromStr, SplitWhitespace};
use tracing::warn;

use super::store::StoreRow;
use crate::dns::enums::DNSResourceType;
use crate::dns::resource::{
    DnskeyData, Nsec3Data, Nsec3ParamData, RData, ResourceRecord, RrsigData, SoaData,
};
use crate::error::DecodeError;

/// Whitespace-separated content fields of one row
struct Fields<'a> {
    rtype: &'static str,
    parts: SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(rtype: DNSResourceType, content: &'a str) -> Self {
        Self {
            rtype: rtype.mnemonic().unwrap_or("unknown"),
            parts: content.split_whitespace(),
        }
    }

    fn text(&mut self, field: &'static str) -> Result<&'a str, DecodeError> {
        self.parts.next().ok_or(DecodeError::MissingField {
            rtype: self.rtype,
            field,
        })
    }

    fn number<T: FromStr>(&mut self, field: &'static str) -> Result<T, DecodeError> {
        let value = self.text(field)?;
        value.parse().map_err(|_| DecodeError::InvalidField {
            field,
            value: value.to_string(),
        })
    }

    /// Remaining parts concatenated, as for base64 blobs split across tokens
    fn joined(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let rest: String = self.parts.by_ref().collect();
        if rest.is_empty() {
            return Err(DecodeError::MissingField {
                rtype: self.rtype,
                field,
            });
        }
        Ok(rest)
    }

    fn types(&mut self) -> Result<BTreeSet<DNSResourceType>, DecodeError> {
        self.parts.by_ref().map(DNSResourceType::from_str).collect()
    }
}

/// Turn a raw store row into a typed record.
///
/// Types without a record shape decode to the empty sentinel.
pub fn decode_row(rtype: DNSResourceType, row: &StoreRow) -> Result<ResourceRecord, DecodeError> {
    let content = row.content.trim();
    let mut fields = Fields::new(rtype, content);

    let data = match rtype {
        DNSResourceType::SOA => RData::SOA(SoaData {
            server: fields.text("server")?.to_string(),
            contact: fields.text("contact")?.to_string(),
            serial: fields.number("serial")?,
            refresh: fields.number("refresh")?,
            retry: fields.number("retry")?,
            expire: fields.number("expire")?,
            minimum: fields.number("minimum")?,
        }),
        DNSResourceType::NS => RData::NS(fields.text("target")?.to_string()),
        DNSResourceType::CNAME => RData::CNAME(fields.text("target")?.to_string()),
        DNSResourceType::PTR => RData::PTR(fields.text("target")?.to_string()),
        DNSResourceType::TXT => RData::TXT(unquote(content).to_string()),
        DNSResourceType::A => RData::A(fields.text("address")?.to_string()),
        DNSResourceType::AAAA => RData::AAAA(fields.text("address")?.to_string()),
        DNSResourceType::MX => {
            let first = fields.text("host")?;
            match fields.parts.next() {
                Some(host) => RData::MX {
                    preference: first.parse().map_err(|_| DecodeError::InvalidField {
                        field: "preference",
                        value: first.to_string(),
                    })?,
                    host: host.to_string(),
                },
                None => RData::MX {
                    preference: row.priority,
                    host: first.to_string(),
                },
            }
        }
        DNSResourceType::HINFO => {
            let mut parts = quoted_fields(content).into_iter();
            let missing = |field| DecodeError::MissingField {
                rtype: "HINFO",
                field,
            };
            let cpu = parts.next().ok_or_else(|| missing("cpu"))?;
            let os = parts.next().ok_or_else(|| missing("os"))?;
            RData::HINFO { cpu, os }
        }
        DNSResourceType::DNSKEY => RData::DNSKEY(DnskeyData {
            flags: fields.number("flags")?,
            protocol: fields.number("protocol")?,
            algorithm: fields.number("algorithm")?,
            public_key: fields.joined("public key")?,
        }),
        DNSResourceType::RRSIG => RData::RRSIG(RrsigData {
            type_covered: fields.text("type covered")?.parse()?,
            algorithm: fields.number("algorithm")?,
            labels: fields.number("labels")?,
            original_ttl: fields.number("original ttl")?,
            expiration: parse_timestamp("expiration", fields.text("expiration")?)?,
            inception: parse_timestamp("inception", fields.text("inception")?)?,
            key_tag: fields.number("key tag")?,
            signer_name: fields.text("signer name")?.to_string(),
            signature: fields.joined("signature")?,
        }),
        DNSResourceType::NSEC => RData::NSEC {
            next_domain: fields.text("next domain")?.to_string(),
            types: fields.types()?,
        },
        DNSResourceType::NSEC3 => RData::NSEC3(Nsec3Data {
            hash_algorithm: fields.number("hash algorithm")?,
            flags: fields.number("flags")?,
            iterations: fields.number("iterations")?,
            salt: fields.text("salt")?.to_string(),
            next_hashed_owner: fields.text("next hashed owner")?.to_string(),
            types: fields.types()?,
        }),
        DNSResourceType::NSEC3PARAM => RData::NSEC3PARAM(Nsec3ParamData {
            hash_algorithm: fields.number("hash algorithm")?,
            flags: fields.number("flags")?,
            iterations: fields.number("iterations")?,
            salt: fields.text("salt")?.to_string(),
        }),
        DNSResourceType::A6
        | DNSResourceType::DNAME
        | DNSResourceType::OPT
        | DNSResourceType::DS
        | DNSResourceType::AXFR
        | DNSResourceType::ANY
        | DNSResourceType::Unknown(_) => {
            warn!("No record shape for {} at {}, returning empty record", rtype, row.name);
            return Ok(ResourceRecord::empty());
        }
    };

    Ok(ResourceRecord::new(row.name.clone(), row.ttl, data))
}

/// Strip one pair of enclosing double quotes
fn unquote(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

/// Split on whitespace outside double quotes, dropping the quotes
fn quoted_fields(text: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    fields.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || quoted {
        fields.push(current);
    }
    fields
}

/// RRSIG time: decimal seconds since the epoch or `YYYYMMDDHHmmSS` in UTC
fn parse_timestamp(field: &'static str, text: &str) -> Result<u32, DecodeError> {
    let invalid = || DecodeError::InvalidField {
        field,
        value: text.to_string(),
    };

    if text.len() == 14 && text.bytes().all(|b| b.is_ascii_digit()) {
        let time = NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S").map_err(|_| invalid())?;
        return u32::try_from(time.and_utc().timestamp()).map_err(|_| invalid());
    }
    text.parse().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(content: &str) -> StoreRow {
        StoreRow::new("example.com", content, 3600)
    }

    #[test]
    fn test_decode_soa() {
        let record = decode_row(
            DNSResourceType::SOA,
            &row("ns1.example.com hostmaster.example.com 2024010101 7200 3600 1209600 3600"),
        )
        .unwrap();
        match record.data {
            RData::SOA(soa) => {
                assert_eq!(soa.server, "ns1.example.com");
                assert_eq!(soa.serial, 2024010101);
                assert_eq!(soa.minimum, 3600);
            }
            other => panic!("Expected SOA, got {:?}", other),
        }
        assert_eq!(record.ttl, 3600);
    }

    #[test]
    fn test_decode_soa_missing_field() {
        let err = decode_row(DNSResourceType::SOA, &row("ns1 admin 1 2 3")).unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingField {
                rtype: "SOA",
                field: "expire"
            }
        );
    }

    #[test]
    fn test_decode_mx_priority_column() {
        let record = decode_row(DNSResourceType::MX, &row("mail.example.com").with_priority(20)).unwrap();
        assert_eq!(
            record.data,
            RData::MX {
                preference: 20,
                host: "mail.example.com".to_string()
            }
        );

        let inline = decode_row(DNSResourceType::MX, &row("5 backup.example.com")).unwrap();
        assert_eq!(
            inline.data,
            RData::MX {
                preference: 5,
                host: "backup.example.com".to_string()
            }
        );
    }

    #[test]
    fn test_decode_txt_strips_quotes() {
        let record = decode_row(DNSResourceType::TXT, &row("\"v=spf1 -all\"")).unwrap();
        assert_eq!(record.data, RData::TXT("v=spf1 -all".to_string()));
    }

    #[test]
    fn test_decode_hinfo_quoted() {
        let record = decode_row(DNSResourceType::HINFO, &row("\"Intel Xeon\" Linux")).unwrap();
        assert_eq!(
            record.data,
            RData::HINFO {
                cpu: "Intel Xeon".to_string(),
                os: "Linux".to_string()
            }
        );
    }

    #[test]
    fn test_decode_dnskey_joins_key_parts() {
        let record = decode_row(DNSResourceType::DNSKEY, &row("257 3 8 AwEAAb Xyz=")).unwrap();
        match record.data {
            RData::DNSKEY(key) => {
                assert_eq!(key.flags, 257);
                assert_eq!(key.public_key, "AwEAAbXyz=");
            }
            other => panic!("Expected DNSKEY, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rrsig_timestamps() {
        let record = decode_row(
            DNSResourceType::RRSIG,
            &row("A 8 2 3600 20240101000000 1700000000 12345 example.com AQID"),
        )
        .unwrap();
        match record.data {
            RData::RRSIG(sig) => {
                assert_eq!(sig.type_covered, DNSResourceType::A);
                assert_eq!(sig.expiration, 1_704_067_200);
                assert_eq!(sig.inception, 1_700_000_000);
                assert_eq!(sig.key_tag, 12345);
                assert_eq!(sig.signature, "AQID");
            }
            other => panic!("Expected RRSIG, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rrsig_bad_covered_type() {
        let err = decode_row(
            DNSResourceType::RRSIG,
            &row("BOGUS 8 2 3600 1 1 1 example.com AQID"),
        )
        .unwrap_err();
        assert_eq!(err, DecodeError::UnknownType("BOGUS".to_string()));
    }

    #[test]
    fn test_decode_nsec_and_nsec3() {
        let nsec = decode_row(DNSResourceType::NSEC, &row("b.example.com A MX RRSIG")).unwrap();
        assert_eq!(
            nsec.data,
            RData::NSEC {
                next_domain: "b.example.com".to_string(),
                types: BTreeSet::from([
                    DNSResourceType::A,
                    DNSResourceType::MX,
                    DNSResourceType::RRSIG
                ]),
            }
        );

        let nsec3 = decode_row(DNSResourceType::NSEC3, &row("1 0 10 - CPNMU A")).unwrap();
        match nsec3.data {
            RData::NSEC3(data) => {
                assert_eq!(data.iterations, 10);
                assert_eq!(data.salt, "-");
                assert_eq!(data.types, BTreeSet::from([DNSResourceType::A]));
            }
            other => panic!("Expected NSEC3, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_invalid_number() {
        let err = decode_row(DNSResourceType::NSEC3PARAM, &row("1 0 many -")).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidField {
                field: "iterations",
                value: "many".to_string()
            }
        );
    }

    #[test]
    fn test_shapeless_types_are_empty() {
        for rtype in [
            DNSResourceType::DS,
            DNSResourceType::OPT,
            DNSResourceType::ANY,
            DNSResourceType::Unknown(99),
        ] {
            assert!(decode_row(rtype, &row("anything")).unwrap().is_empty());
        }
    }

    #[test]
    fn test_quoted_fields() {
        assert_eq!(quoted_fields("a \"b c\" d"), vec!["a", "b c", "d"]);
        assert_eq!(quoted_fields("\"\" x"), vec!["", "x"]);
    }
}
