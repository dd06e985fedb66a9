//! Shared fixtures for the integration tests

#![allow(dead_code)]

use apexdns::dns::DNSResourceType;
use apexdns::error::StoreError;
use apexdns::zone::{MemoryStore, StoreRow, ZoneBackend};
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

/// Store with example.com, sub.example.com and example.org populated
pub fn example_store() -> MemoryStore {
    let store = MemoryStore::new();

    let com = store.add_zone("example.com");
    store.add_record(
        com,
        DNSResourceType::SOA,
        StoreRow::new(
            "example.com",
            "ns1.example.com hostmaster.example.com 2024010101 7200 3600 1209600 3600",
            3600,
        ),
    );
    store.add_record(com, DNSResourceType::NS, StoreRow::new("example.com", "ns1.example.com", 3600));
    store.add_record(com, DNSResourceType::A, StoreRow::new("www.example.com", "192.0.2.1", 300));
    store.add_record(com, DNSResourceType::A, StoreRow::new("www.example.com", "192.0.2.2", 300));
    store.add_record(
        com,
        DNSResourceType::MX,
        StoreRow::new("example.com", "mail.example.com", 300).with_priority(10),
    );
    store.add_record(com, DNSResourceType::DS, StoreRow::new("example.com", "12345 8 2 abcd", 300));

    let sub = store.add_zone("sub.example.com");
    store.add_record(sub, DNSResourceType::A, StoreRow::new("host.sub.example.com", "198.51.100.7", 60));

    store.add_zone("example.org");
    store
}

/// Backend whose every call fails
pub struct FailingStore;

#[async_trait]
impl ZoneBackend for FailingStore {
    async fn list_zone_apex_names(&self) -> Result<HashSet<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn zone_id_for(&self, apex: &str) -> Result<i64, StoreError> {
        Err(StoreError::MissingZoneId(apex.to_string()))
    }

    async fn records_for(
        &self,
        _rtype: DNSResourceType,
        _name: &str,
        _zone_id: i64,
    ) -> Result<Vec<StoreRow>, StoreError> {
        Err(StoreError::Query("no such table: records".to_string()))
    }
}

/// Backend that lists one apex but never answers the id query
pub struct StalledStore {
    pub delay: Duration,
}

#[async_trait]
impl ZoneBackend for StalledStore {
    async fn list_zone_apex_names(&self) -> Result<HashSet<String>, StoreError> {
        Ok(HashSet::from(["example.com".to_string()]))
    }

    async fn zone_id_for(&self, _apex: &str) -> Result<i64, StoreError> {
        tokio::time::sleep(self.delay).await;
        Ok(1)
    }

    async fn records_for(
        &self,
        _rtype: DNSResourceType,
        _name: &str,
        _zone_id: i64,
    ) -> Result<Vec<StoreRow>, StoreError> {
        Ok(Vec::new())
    }
}

pub const EXAMPLE_ZONE: &str = r#"
$ORIGIN example.com.
$TTL 1h

@       IN  SOA ns1 hostmaster (
                2024010101 ; serial
                2h         ; refresh
                1h         ; retry
                2w         ; expire
                1h )       ; minimum
        IN  NS  ns1
        IN  MX  10 mail
ns1     IN  A   192.0.2.53
www 300 IN  A   192.0.2.1
        IN  AAAA 2001:db8::1
mail    IN  A   192.0.2.25
txt     IN  TXT "hello world"
alias   IN  CNAME www
"#;
