use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use super::store::{ZoneBackend, bounded};
use super::zone::{Zone, is_authoritative_for, label_count, normalize_name};
use crate::dns::enums::DNSResourceType;
use crate::dns::resource::ResourceRecord;
use crate::error::Result;

/// Default bound on a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Selects the authoritative zone for a name by longest whole-label suffix
#[derive(Clone)]
pub struct ZoneResolver {
    backend: Arc<dyn ZoneBackend>,
    timeout: Duration,
}

impl ZoneResolver {
    pub fn new(backend: Arc<dyn ZoneBackend>) -> Self {
        Self::with_timeout(backend, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_timeout(backend: Arc<dyn ZoneBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend(&self) -> &Arc<dyn ZoneBackend> {
        &self.backend
    }

    /// Find the zone for `query_name`.
    ///
    /// Returns the empty zone when no configured apex covers the name. Store
    /// failures are errors, never an empty zone.
    #[instrument(skip(self))]
    pub async fn resolve_zone(&self, query_name: &str) -> Result<Zone> {
        let apexes = bounded(self.timeout, self.backend.list_zone_apex_names()).await?;
        if apexes.is_empty() {
            debug!("No zones configured");
            return Ok(Zone::empty());
        }

        let name = normalize_name(query_name);
        let best = apexes
            .iter()
            .map(|apex| (normalize_name(apex), apex))
            .filter(|(normalized, _)| is_authoritative_for(normalized, &name))
            .max_by(|(a, _), (b, _)| label_count(a).cmp(&label_count(b)).then_with(|| b.cmp(a)));

        let Some((normalized, apex)) = best else {
            debug!("Not authoritative for {}", name);
            return Ok(Zone::empty());
        };

        let zone_id = bounded(self.timeout, self.backend.zone_id_for(apex)).await?;
        debug!("Resolved {} to zone {} (id {})", name, normalized, zone_id);
        Ok(Zone::new(normalized, zone_id, self.backend.clone(), self.timeout))
    }

    /// Resolve the zone and fetch records in one step. `None` means the
    /// server is not authoritative for `name`.
    pub async fn lookup(
        &self,
        name: &str,
        rtype: DNSResourceType,
    ) -> Result<Option<Vec<ResourceRecord>>> {
        let zone = self.resolve_zone(name).await?;
        if zone.is_empty() {
            return Ok(None);
        }
        let records = zone.get(rtype, name).await?;
        Ok(Some(records.into_iter().filter(|r| !r.is_empty()).collect()))
    }
}
