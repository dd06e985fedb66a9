use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, trace};

use super::constants;
use super::errors::{Result, ZoneFileError};
use super::store::StoreRow;
use crate::dns::enums::DNSResourceType;

/// Records of one master file, ready to be loaded into a store
#[derive(Debug, Default)]
pub struct ParsedZone {
    /// Zone apex: owner of the first SOA, else the first `$ORIGIN`
    pub origin: String,
    pub default_ttl: u32,
    pub records: Vec<(DNSResourceType, StoreRow)>,
}

/// RFC 1035 master file parser
pub struct ZoneParser {
    /// Current origin for relative names
    origin: String,
    /// Current default TTL
    default_ttl: u32,
    /// Owner inherited by lines starting with whitespace
    last_owner: Option<String>,
    /// Directory `$INCLUDE` paths are relative to
    base_dir: Option<PathBuf>,
    /// Number of `$INCLUDE` levels above this parser
    include_depth: usize,
    line_number: usize,
}

/// One logical entry after joining parenthesised continuation lines
struct Entry {
    line: usize,
    inherits_owner: bool,
    tokens: Vec<String>,
}

impl ZoneParser {
    pub fn new() -> Self {
        Self {
            origin: String::new(),
            default_ttl: constants::DEFAULT_TTL,
            last_owner: None,
            base_dir: None,
            include_depth: 0,
            line_number: 0,
        }
    }

    /// Start with `origin` as the current origin, as if set by `$ORIGIN`
    pub fn with_origin(origin: &str) -> Self {
        let mut parser = Self::new();
        parser.origin = origin.trim_end_matches('.').to_string();
        parser
    }

    pub fn parse_file<P: AsRef<Path>>(mut self, path: P) -> Result<ParsedZone> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ZoneFileError::Io(format!("{}: {}", path.display(), e)))?;
        if contents.len() > constants::MAX_ZONE_FILE_SIZE {
            return Err(ZoneFileError::FileTooLarge);
        }

        self.base_dir = path.parent().map(Path::to_path_buf);
        self.parse(&contents)
    }

    pub fn parse(mut self, contents: &str) -> Result<ParsedZone> {
        let mut zone = ParsedZone::default();
        let mut first_origin = (!self.origin.is_empty()).then(|| self.origin.clone());
        let mut soa_owner = None;

        for entry in self.entries(contents)? {
            self.line_number = entry.line;
            trace!("Parsing entry at line {}: {:?}", entry.line, entry.tokens);

            if !entry.inherits_owner && entry.tokens[0].starts_with('$') {
                self.parse_directive(&entry.tokens, &mut zone)?;
                if first_origin.is_none() && !self.origin.is_empty() {
                    first_origin = Some(self.origin.clone());
                }
                continue;
            }

            let (rtype, row) = self.parse_record(&entry)?;
            if rtype == DNSResourceType::SOA && soa_owner.is_none() {
                soa_owner = Some(row.name.clone());
            }
            zone.records.push((rtype, row));
        }

        zone.origin = soa_owner
            .or(first_origin)
            .ok_or(ZoneFileError::MissingOrigin)?;
        zone.default_ttl = self.default_ttl;

        debug!("Parsed zone {} with {} records", zone.origin, zone.records.len());
        Ok(zone)
    }

    /// Split contents into logical entries, honouring quotes, `;` comments
    /// and parentheses spanning several lines
    fn entries(&self, contents: &str) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut current: Option<Entry> = None;
        let mut token = String::new();
        let mut depth = 0usize;

        for (index, line) in contents.lines().enumerate() {
            let line_number = index + 1;
            let mut in_quotes = false;

            if current.is_none() {
                if line.trim().is_empty() || line.trim_start().starts_with(';') {
                    continue;
                }
                current = Some(Entry {
                    line: line_number,
                    inherits_owner: line.starts_with(' ') || line.starts_with('\t'),
                    tokens: Vec::new(),
                });
            }
            let Some(entry) = current.as_mut() else {
                continue;
            };

            for ch in line.chars() {
                match ch {
                    '"' => {
                        in_quotes = !in_quotes;
                        token.push(ch);
                    }
                    _ if in_quotes => token.push(ch),
                    ';' => break,
                    '(' => depth += 1,
                    ')' => {
                        depth = depth.checked_sub(1).ok_or_else(|| ZoneFileError::Parse {
                            line: line_number,
                            message: "Unbalanced closing parenthesis".to_string(),
                        })?;
                    }
                    c if c.is_whitespace() => {
                        if !token.is_empty() {
                            entry.tokens.push(std::mem::take(&mut token));
                        }
                    }
                    c => token.push(c),
                }
            }
            if in_quotes {
                return Err(ZoneFileError::Parse {
                    line: line_number,
                    message: "Unterminated quoted string".to_string(),
                });
            }
            if !token.is_empty() {
                entry.tokens.push(std::mem::take(&mut token));
            }

            if depth == 0 {
                if let Some(entry) = current.take() {
                    if !entry.tokens.is_empty() {
                        entries.push(entry);
                    }
                }
            }
        }

        if let Some(entry) = current {
            return Err(ZoneFileError::UnclosedParentheses(entry.line));
        }
        Ok(entries)
    }

    fn parse_directive(&mut self, tokens: &[String], zone: &mut ParsedZone) -> Result<()> {
        let argument = |what: &str| {
            tokens.get(1).ok_or_else(|| self.error(format!("{} requires {}", tokens[0], what)))
        };

        match tokens[0].to_uppercase().as_str() {
            "$ORIGIN" => {
                let origin = qualify(argument("a domain name")?, &self.origin);
                debug!("Set origin to: {}", origin);
                self.origin = origin;
            }
            "$TTL" => {
                let ttl = parse_ttl(argument("a value")?)?;
                debug!("Set default TTL to: {}", ttl);
                self.default_ttl = ttl;
            }
            "$INCLUDE" => {
                let file = argument("a file path")?;
                if self.include_depth >= constants::MAX_INCLUDE_DEPTH {
                    return Err(self.error(format!(
                        "$INCLUDE of {} exceeds maximum nesting depth of {}",
                        file,
                        constants::MAX_INCLUDE_DEPTH
                    )));
                }
                let mut path = PathBuf::from(file);
                if path.is_relative() {
                    if let Some(dir) = &self.base_dir {
                        path = dir.join(path);
                    }
                }
                let origin = match tokens.get(2) {
                    Some(domain) => qualify(domain, &self.origin),
                    None => self.origin.clone(),
                };
                debug!("Processing $INCLUDE {} with origin {}", path.display(), origin);

                let mut child = ZoneParser::with_origin(&origin);
                child.default_ttl = self.default_ttl;
                child.include_depth = self.include_depth + 1;
                let included = child.parse_file(&path).map_err(|e| {
                    self.error(format!("Failed to include {}: {}", path.display(), e))
                })?;
                zone.records.extend(included.records);
            }
            other => return Err(self.error(format!("Unknown directive: {}", other))),
        }
        Ok(())
    }

    fn parse_record(&mut self, entry: &Entry) -> Result<(DNSResourceType, StoreRow)> {
        let mut tokens = entry.tokens.iter().map(String::as_str);

        let owner = if entry.inherits_owner {
            self.last_owner
                .clone()
                .ok_or_else(|| self.error("No previous owner name to inherit".to_string()))?
        } else {
            let name = tokens
                .next()
                .ok_or_else(|| self.error("Empty record line".to_string()))?;
            qualify(name, &self.origin)
        };

        let mut ttl = None;
        let mut rtype = None;
        for field in tokens.by_ref() {
            if let Ok(value) = parse_ttl(field) {
                ttl = Some(value);
            } else if is_class(field) {
                continue;
            } else if let Ok(parsed) = DNSResourceType::from_str(field) {
                rtype = Some(parsed);
                break;
            } else {
                return Err(self.error(format!("Invalid field: {}", field)));
            }
        }
        let rtype = rtype.ok_or_else(|| self.error("Missing record type".to_string()))?;

        let rdata: Vec<&str> = tokens.collect();
        if rdata.is_empty() {
            return Err(self.error("Missing RDATA".to_string()));
        }

        let (content, priority) = self.record_content(rtype, &rdata)?;
        self.last_owner = Some(owner.clone());

        let row = StoreRow {
            name: owner,
            content,
            ttl: ttl.unwrap_or(self.default_ttl),
            priority,
        };
        Ok((rtype, row))
    }

    /// Store content for `rdata`, with relative domain names qualified
    fn record_content(&self, rtype: DNSResourceType, rdata: &[&str]) -> Result<(String, u16)> {
        let origin = &self.origin;
        let content = match rtype {
            DNSResourceType::NS | DNSResourceType::CNAME | DNSResourceType::PTR => {
                qualify_fields(rdata, &[0], origin)
            }
            DNSResourceType::SOA => {
                if rdata.len() != 7 {
                    return Err(self.error(format!("SOA needs 7 fields, got {}", rdata.len())));
                }
                let mut fields = vec![qualify(rdata[0], origin), qualify(rdata[1], origin)];
                fields.push(rdata[2].to_string());
                for timer in &rdata[3..] {
                    fields.push(parse_ttl(timer)?.to_string());
                }
                fields.join(" ")
            }
            DNSResourceType::NSEC => qualify_fields(rdata, &[0], origin),
            DNSResourceType::RRSIG => qualify_fields(rdata, &[7], origin),
            DNSResourceType::MX => {
                let preference = rdata[0]
                    .parse::<u16>()
                    .map_err(|_| self.error(format!("Invalid MX preference: {}", rdata[0])))?;
                let host = rdata
                    .get(1)
                    .ok_or_else(|| self.error("MX record missing host".to_string()))?;
                return Ok((qualify(host, origin), preference));
            }
            DNSResourceType::TXT => {
                let text: String = rdata.iter().map(|part| part.trim_matches('"')).collect();
                format!("\"{}\"", text)
            }
            _ => rdata.join(" "),
        };
        Ok((content, 0))
    }

    fn error(&self, message: String) -> ZoneFileError {
        ZoneFileError::Parse {
            line: self.line_number,
            message,
        }
    }
}

impl Default for ZoneParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Make `name` absolute against `origin`, without a trailing dot
fn qualify(name: &str, origin: &str) -> String {
    if name == "@" {
        return origin.to_string();
    }
    if let Some(absolute) = name.strip_suffix('.') {
        return absolute.to_string();
    }
    if origin.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", name, origin)
    }
}

/// Join `rdata`, qualifying the domain names at `positions`
fn qualify_fields(rdata: &[&str], positions: &[usize], origin: &str) -> String {
    rdata
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if positions.contains(&i) {
                qualify(part, origin)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_class(field: &str) -> bool {
    matches!(field.to_uppercase().as_str(), "IN" | "CS" | "CH" | "HS")
}

/// Parse a TTL, accepting one `s`/`m`/`h`/`d`/`w` unit suffix
pub fn parse_ttl(s: &str) -> Result<u32> {
    let lower = s.to_lowercase();
    let invalid = || ZoneFileError::InvalidTtl(s.to_string());

    let (digits, multiplier) = match lower.char_indices().last() {
        Some((i, 's')) => (&lower[..i], 1),
        Some((i, 'm')) => (&lower[..i], 60),
        Some((i, 'h')) => (&lower[..i], 3600),
        Some((i, 'd')) => (&lower[..i], 86400),
        Some((i, 'w')) => (&lower[..i], 604800),
        _ => (lower.as_str(), 1),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits
        .parse::<u32>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(invalid)
}
