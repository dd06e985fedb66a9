use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::record::decode_row;
use super::store::{ZoneBackend, bounded};
use crate::dns::enums::DNSResourceType;
use crate::dns::resource::ResourceRecord;
use crate::dns::wire::is_label_separator;
use crate::error::{DnsError, Result};

/// Lowercase a name and drop its trailing dot
pub fn normalize_name(name: &str) -> String {
    let name = match name.len().checked_sub(1) {
        Some(last) if is_label_separator(name, last) => &name[..last],
        _ => name,
    };
    name.to_ascii_lowercase()
}

/// Number of labels in a normalized name; the root has none
pub fn label_count(name: &str) -> usize {
    if name.is_empty() {
        0
    } else {
        1 + (0..name.len()).filter(|i| is_label_separator(name, *i)).count()
    }
}

/// Whether normalized `apex` equals `name` or is a whole-label suffix of it
pub fn is_authoritative_for(apex: &str, name: &str) -> bool {
    if apex.is_empty() || apex == name {
        return true;
    }
    name.len() > apex.len()
        && name.ends_with(apex)
        && is_label_separator(name, name.len() - apex.len() - 1)
}

#[derive(Clone)]
struct Authority {
    apex: String,
    zone_id: i64,
    backend: Arc<dyn ZoneBackend>,
    timeout: Duration,
}

/// A zone of authority selected for a query, or the empty zone when the
/// server is not authoritative. Built per resolution and never cached.
#[derive(Clone)]
pub struct Zone {
    authority: Option<Authority>,
}

impl Zone {
    pub fn new(
        apex: impl Into<String>,
        zone_id: i64,
        backend: Arc<dyn ZoneBackend>,
        timeout: Duration,
    ) -> Self {
        Self {
            authority: Some(Authority {
                apex: apex.into(),
                zone_id,
                backend,
                timeout,
            }),
        }
    }

    /// The "not authoritative" sentinel
    pub fn empty() -> Self {
        Self { authority: None }
    }

    pub fn is_empty(&self) -> bool {
        self.authority.is_none()
    }

    pub fn apex(&self) -> Option<&str> {
        self.authority.as_ref().map(|a| a.apex.as_str())
    }

    pub fn zone_id(&self) -> Option<i64> {
        self.authority.as_ref().map(|a| a.zone_id)
    }

    /// Records of `rtype` owned by `name`, in store order. Shapeless types
    /// come back as empty records.
    pub async fn get(&self, rtype: DNSResourceType, name: &str) -> Result<Vec<ResourceRecord>> {
        let Some(authority) = &self.authority else {
            return Ok(Vec::new());
        };

        let name = normalize_name(name);
        trace!("Fetching {} {} from zone {}", name, rtype, authority.apex);

        let rows = bounded(
            authority.timeout,
            authority.backend.records_for(rtype, &name, authority.zone_id),
        )
        .await?;

        let records = rows
            .iter()
            .map(|row| decode_row(rtype, row))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(DnsError::Content)?;

        debug!(
            "Zone {} returned {} {} records for {}",
            authority.apex,
            records.len(),
            rtype,
            name
        );
        Ok(records)
    }
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.authority {
            Some(authority) => f
                .debug_struct("Zone")
                .field("apex", &authority.apex)
                .field("zone_id", &authority.zone_id)
                .finish(),
            None => f.write_str("Zone(empty)"),
        }
    }
}
