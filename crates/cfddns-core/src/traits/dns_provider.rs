// # DNS Provider Trait
//
// Defines the interface for looking up and updating DNS records via
// provider APIs.
//
// ## Implementations
//
// - Cloudflare: `cfddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::{DnsProvider, RecordType};
// use cfddns_core::traits::RecordUpdate;
//
// let provider = /* DnsProvider implementation */;
//
// if let Some(record) = provider.find_record(zone_id, "home.example.com", RecordType::A).await? {
//     let update = RecordUpdate::new(RecordType::A, "home.example.com", ip, false);
//     provider.update_record(zone_id, &record.id, &update).await?;
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::config::RecordType;

/// TTL value meaning "automatic" in Cloudflare's convention
pub const AUTOMATIC_TTL: u32 = 1;

/// A record that already exists in the zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record name
    pub name: String,
    /// The value the record currently publishes
    pub content: String,
}

impl ExistingRecord {
    /// Whether the record already publishes `ip`
    ///
    /// Values that parse as addresses are compared as addresses, so
    /// differently written forms of the same IPv6 address are equal.
    /// Anything else is compared as text.
    pub fn publishes(&self, ip: IpAddr) -> bool {
        match self.content.trim().parse::<IpAddr>() {
            Ok(current) => current == ip,
            Err(_) => self.content == ip.to_string(),
        }
    }
}

/// Update payload sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record name
    pub name: String,
    /// New record value
    pub content: String,
    /// Time-to-live, always [`AUTOMATIC_TTL`]
    pub ttl: u32,
    /// Route traffic through the provider's edge
    pub proxied: bool,
}

impl RecordUpdate {
    /// Build the payload pointing `name` at `ip`
    pub fn new(record_type: RecordType, name: impl Into<String>, ip: IpAddr, proxied: bool) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: ip.to_string(),
            ttl: AUTOMATIC_TTL,
            proxied,
        }
    }
}

/// Provider's answer to an update request that reached it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateResult {
    /// The provider accepted the new value
    Applied,
    /// The provider answered but refused the update
    Rejected {
        /// Reason reported by the provider
        reason: String,
    },
}

/// Trait for DNS provider implementations
///
/// Providers are single-shot: each method performs the API calls it needs
/// and returns. They never retry, never create records, and never decide
/// whether an update is needed (owned by `Reconciler`).
///
/// # Errors vs. rejections
///
/// `Err` means the provider could not be reached or its answer could not
/// be understood; the reconciler aborts the run. A well-formed answer that
/// refuses an update is `Ok(UpdateResult::Rejected)`; the reconciler records
/// it and moves on.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up a record by name and type
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: The first matching record
    /// - `Ok(None)`: No record with that name and type exists
    /// - `Err(Error)`: The lookup failed
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<ExistingRecord>, crate::Error>;

    /// Replace the value of an existing record
    ///
    /// # Parameters
    ///
    /// - `zone_id`: The zone containing the record
    /// - `record_id`: The provider's record ID from [`DnsProvider::find_record`]
    /// - `update`: The payload to send
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateResult, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Whether updates are only logged, never sent
    ///
    /// A dry-run provider answers `Applied` without changing anything.
    fn is_dry_run(&self) -> bool {
        false
    }
}
