pub mod config;
pub mod dns;
pub mod error;
pub mod zone;

pub use dns::{DNSQuestion, RData, ResourceRecord};
pub use error::{DecodeError, DnsError, StoreError};
pub use zone::{Zone, ZoneResolver};
