use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashSet;
use tracing::{error, info, instrument};

use super::store::{StoreRow, ZoneBackend};
use super::zone::normalize_name;
use crate::dns::enums::DNSResourceType;
use crate::error::StoreError;

type RecordRow = (String, String, i64, Option<i64>);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain_id INTEGER NOT NULL REFERENCES domains(id),
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    content TEXT NOT NULL,
    ttl INTEGER NOT NULL DEFAULT 3600,
    prio INTEGER
);
CREATE INDEX IF NOT EXISTS idx_records_lookup ON records(domain_id, type, name);
";

/// Relational backend over the `domains` / `records` tables
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("SQLite record store opened with {} connections", max_connections);
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the tables when missing
    pub async fn create_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_domain(&self, name: &str) -> Result<i64, StoreError> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            "INSERT INTO domains (name) VALUES (?) RETURNING id",
        )
        .bind(normalize_name(name))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    #[instrument(skip(self, row))]
    pub async fn add_record(
        &self,
        domain_id: i64,
        rtype: DNSResourceType,
        row: &StoreRow,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO records (domain_id, name, type, content, ttl, prio)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(domain_id)
        .bind(&row.name)
        .bind(rtype.to_string())
        .bind(&row.content)
        .bind(i64::from(row.ttl))
        .bind(i64::from(row.priority))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn to_store_row((name, content, ttl, prio): RecordRow) -> Result<StoreRow, StoreError> {
        let ttl = u32::try_from(ttl)
            .map_err(|_| StoreError::Query(format!("TTL {} out of range for {}", ttl, name)))?;
        let priority = u16::try_from(prio.unwrap_or(0))
            .map_err(|_| StoreError::Query(format!("Priority out of range for {}", name)))?;
        Ok(StoreRow {
            name,
            content,
            ttl,
            priority,
        })
    }
}

#[async_trait]
impl ZoneBackend for SqliteStore {
    #[instrument(skip(self))]
    async fn list_zone_apex_names(&self) -> Result<HashSet<String>, StoreError> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM domains")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list zone apexes");
                StoreError::from(e)
            })?;
        Ok(names.into_iter().collect())
    }

    #[instrument(skip(self))]
    async fn zone_id_for(&self, apex: &str) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM domains WHERE lower(rtrim(name, '.')) = ?",
        )
        .bind(normalize_name(apex))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to query zone id");
            StoreError::from(e)
        })?;

        id.ok_or_else(|| StoreError::MissingZoneId(apex.to_string()))
    }

    #[instrument(skip(self))]
    async fn records_for(
        &self,
        rtype: DNSResourceType,
        name: &str,
        zone_id: i64,
    ) -> Result<Vec<StoreRow>, StoreError> {
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT name, content, ttl, prio FROM records
             WHERE type = ? AND lower(rtrim(name, '.')) = ? AND domain_id = ?
             ORDER BY rowid",
        )
        .bind(rtype.to_string())
        .bind(normalize_name(name))
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to query records");
            StoreError::from(e)
        })?;

        rows.into_iter().map(Self::to_store_row).collect()
    }
}
