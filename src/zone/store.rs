use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::errors::ZoneFileError;
use super::parser::ZoneParser;
use super::zone::normalize_name;
use crate::dns::enums::DNSResourceType;
use crate::error::StoreError;

/// A raw record row as kept by a backend. `content` is free text; composite
/// types separate their fields with whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreRow {
    pub name: String,
    pub content: String,
    pub ttl: u32,
    pub priority: u16,
}

impl StoreRow {
    pub fn new(name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ttl,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = priority;
        self
    }
}

/// Record store consulted by the resolver. Implementations must be safe for
/// concurrent use and report failures as errors, never as empty results.
#[async_trait]
pub trait ZoneBackend: Send + Sync {
    /// Every configured zone apex
    async fn list_zone_apex_names(&self) -> Result<HashSet<String>, StoreError>;

    /// Numeric id of the zone rooted at `apex`
    async fn zone_id_for(&self, apex: &str) -> Result<i64, StoreError>;

    /// Rows for (type, owner name, zone id), in store order
    async fn records_for(
        &self,
        rtype: DNSResourceType,
        name: &str,
        zone_id: i64,
    ) -> Result<Vec<StoreRow>, StoreError>;
}

/// Run a store call, turning expiry of `limit` into a store error
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| StoreError::Timeout(limit))?
}

#[derive(Default)]
struct MemoryZones {
    /// Zone ids indexed by normalized apex
    apexes: HashMap<String, i64>,
    records: Vec<MemoryRecord>,
    next_id: i64,
}

struct MemoryRecord {
    zone_id: i64,
    rtype: DNSResourceType,
    key: String,
    row: StoreRow,
}

/// In-memory backend, also used for zones loaded from master files
#[derive(Default)]
pub struct MemoryStore {
    zones: RwLock<MemoryZones>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone apex and return its id. Re-adding an apex returns the
    /// existing id.
    pub fn add_zone(&self, apex: &str) -> i64 {
        let key = normalize_name(apex);
        let mut zones = self.zones.write();
        if let Some(id) = zones.apexes.get(&key) {
            return *id;
        }
        zones.next_id += 1;
        let id = zones.next_id;
        debug!("Adding zone {} with id {}", key, id);
        zones.apexes.insert(key, id);
        id
    }

    pub fn add_record(&self, zone_id: i64, rtype: DNSResourceType, row: StoreRow) {
        let key = normalize_name(&row.name);
        self.zones.write().records.push(MemoryRecord {
            zone_id,
            rtype,
            key,
            row,
        });
    }

    /// Build a store from RFC 1035 master files. Zone ids follow load order
    /// starting at 1.
    pub fn from_zone_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ZoneFileError> {
        let store = Self::new();
        for path in paths {
            let path = path.as_ref();
            info!("Loading zone file: {}", path.display());

            let zone = ZoneParser::new().parse_file(path)?;
            let zone_id = store.add_zone(&zone.origin);
            let count = zone.records.len();
            for (rtype, row) in zone.records {
                store.add_record(zone_id, rtype, row);
            }
            debug!("Zone {} loaded with {} records", zone.origin, count);
        }
        Ok(store)
    }

    pub fn zone_count(&self) -> usize {
        self.zones.read().apexes.len()
    }
}

#[async_trait]
impl ZoneBackend for MemoryStore {
    async fn list_zone_apex_names(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.zones.read().apexes.keys().cloned().collect())
    }

    async fn zone_id_for(&self, apex: &str) -> Result<i64, StoreError> {
        self.zones
            .read()
            .apexes
            .get(&normalize_name(apex))
            .copied()
            .ok_or_else(|| StoreError::MissingZoneId(apex.to_string()))
    }

    async fn records_for(
        &self,
        rtype: DNSResourceType,
        name: &str,
        zone_id: i64,
    ) -> Result<Vec<StoreRow>, StoreError> {
        let key = normalize_name(name);
        let zones = self.zones.read();
        Ok(zones
            .records
            .iter()
            .filter(|r| r.zone_id == zone_id && r.rtype == rtype && r.key == key)
            .map(|r| r.row.clone())
            .collect())
    }
}
