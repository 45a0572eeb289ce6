//! Record reconciler
//!
//! The Reconciler is responsible for:
//! - Looking up each requested record via DnsProvider
//! - Skipping records that already publish the desired address
//! - Updating the stale ones
//! - Summarising per-record outcomes into a run status
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ AddressSource │─── resolve_address() ───┐
//! └───────────────┘                         │
//!                                           ▼
//!                                  ┌──────────────┐
//!                                  │  Reconciler  │
//!                                  └──────────────┘
//!                                           │
//!                         ┌─────────────────┴───────────────┐
//!                         ▼                                 ▼
//!                 ┌──────────────┐                 ┌──────────────┐
//!                 │ DnsProvider  │                 │   tracing    │
//!                 │ (find/update)│                 │   (log)      │
//!                 └──────────────┘                 └──────────────┘
//! ```
//!
//! ## Record Flow
//!
//! 1. Look the record up by name and type
//! 2. Not found: warn and move on (records are never created)
//! 3. Already publishing the desired address: move on
//! 4. Otherwise send the update; a rejection is recorded, a transport
//!    failure aborts the run

use std::net::IpAddr;
use tracing::{debug, error, info, warn};

use crate::config::{IpVersion, UpdateRequest};
use crate::error::{Error, Result};
use crate::traits::{AddressSource, DnsProvider, RecordUpdate, UpdateResult};

/// What happened to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The record already published the desired address
    UpToDate,
    /// The record was updated
    Updated,
    /// No record with that name and type exists
    NotFound,
    /// The provider refused the update
    Failed(String),
}

/// Outcome for a named record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Record name
    pub name: String,
    /// What happened to it
    pub outcome: UpdateOutcome,
}

/// Overall result of a run that was not aborted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every found record is up to date
    Success,
    /// At least one update was refused
    PartialFailure,
}

/// Per-record outcomes of one run, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    outcomes: Vec<RecordOutcome>,
    dry_run: bool,
}

impl ReconcileReport {
    fn push(&mut self, name: &str, outcome: UpdateOutcome) {
        self.outcomes.push(RecordOutcome {
            name: name.to_string(),
            outcome,
        });
    }

    /// Outcomes in processing order
    pub fn outcomes(&self) -> &[RecordOutcome] {
        &self.outcomes
    }

    /// Whether updates were only logged; `Updated` then means "would update"
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Number of records that do not exist
    pub fn not_found_count(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::NotFound))
    }

    /// Number of refused updates
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Failed(_)))
    }

    /// Number of records updated
    pub fn updated_count(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Updated))
    }

    /// Number of records already up to date
    pub fn up_to_date_count(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::UpToDate))
    }

    /// Overall status; missing records do not affect it
    pub fn status(&self) -> RunStatus {
        if self.failed_count() > 0 {
            RunStatus::PartialFailure
        } else {
            RunStatus::Success
        }
    }

    fn count(&self, pred: impl Fn(&UpdateOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Reconciles the records of one zone against a desired address
pub struct Reconciler {
    /// DNS provider for lookups and updates
    provider: Box<dyn DnsProvider>,

    /// Zone containing the records
    zone_id: String,
}

impl Reconciler {
    /// Create a reconciler for `zone_id`
    pub fn new(provider: Box<dyn DnsProvider>, zone_id: impl Into<String>) -> Self {
        Self {
            provider,
            zone_id: zone_id.into(),
        }
    }

    /// Bring every record in `request` up to date
    ///
    /// Records are processed one at a time, in input order.
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: Every record was processed
    /// - `Err(Error)`: A lookup or update could not reach the provider; the
    ///   remaining records were not processed
    pub async fn reconcile(&self, request: &UpdateRequest) -> Result<ReconcileReport> {
        let mut report = ReconcileReport {
            dry_run: self.provider.is_dry_run(),
            ..ReconcileReport::default()
        };
        let desired = request.desired_address();

        info!(
            "Reconciling {} {} record(s) against {} via {}",
            request.record_names().len(),
            request.record_type(),
            desired,
            self.provider.provider_name()
        );

        for name in request.record_names() {
            let outcome = self.reconcile_record(request, name).await?;
            report.push(name, outcome);
        }

        let not_found = report.not_found_count();
        if not_found > 0 {
            warn!(
                "{} record(s) not found in zone; they were not created",
                not_found
            );
        }

        let failed = report.failed_count();
        if failed > 0 {
            error!("{} record update(s) failed", failed);
        } else if report.is_dry_run() {
            info!(
                "Dry run complete: {} would be updated, {} up-to-date; nothing was changed",
                report.updated_count(),
                report.up_to_date_count()
            );
        } else {
            info!(
                "Reconciliation complete: {} updated, {} up-to-date",
                report.updated_count(),
                report.up_to_date_count()
            );
        }

        Ok(report)
    }

    /// Reconcile a single record
    async fn reconcile_record(&self, request: &UpdateRequest, name: &str) -> Result<UpdateOutcome> {
        let record_type = request.record_type();
        let desired = request.desired_address();

        debug!("Looking up {} record {}", record_type, name);

        let Some(record) = self
            .provider
            .find_record(&self.zone_id, name, record_type)
            .await?
        else {
            warn!("{} record {} not found, skipping", record_type, name);
            return Ok(UpdateOutcome::NotFound);
        };

        if record.publishes(desired) {
            info!("{} is already up-to-date ({})", name, desired);
            return Ok(UpdateOutcome::UpToDate);
        }

        info!("Updating {}: {} -> {}", name, record.content, desired);

        let update = RecordUpdate::new(record_type, name, desired, request.proxied());
        match self
            .provider
            .update_record(&self.zone_id, &record.id, &update)
            .await?
        {
            UpdateResult::Applied if self.provider.is_dry_run() => {
                info!("[DRY-RUN] Would update {} -> {}", name, desired);
                Ok(UpdateOutcome::Updated)
            }
            UpdateResult::Applied => {
                info!("Updated {} -> {}", name, desired);
                Ok(UpdateOutcome::Updated)
            }
            UpdateResult::Rejected { reason } => {
                error!("Failed to update {}: {}", name, reason);
                Ok(UpdateOutcome::Failed(reason))
            }
        }
    }
}

/// Parse an address given as text
///
/// Surrounding whitespace and a prefix-length suffix (`/64`) are ignored.
pub fn parse_address(text: &str) -> Result<IpAddr> {
    let text = text.trim();
    let bare = text.split_once('/').map_or(text, |(addr, _)| addr);

    bare.parse()
        .map_err(|_| Error::invalid_input(format!("Invalid IP address: '{}'", text)))
}

/// Determine the address to publish
///
/// An explicit address wins and the source is never asked. Otherwise the
/// source is queried; any failure there is an address detection error.
///
/// # Parameters
///
/// - `source`: Address source to query when no address is given
/// - `version`: Active address family
/// - `explicit`: Address supplied by the user, if any
pub async fn resolve_address(
    source: &dyn AddressSource,
    version: IpVersion,
    explicit: Option<IpAddr>,
) -> Result<IpAddr> {
    if let Some(ip) = explicit {
        if !version.matches(&ip) {
            return Err(Error::invalid_input(format!(
                "Address {} is not an {} address",
                ip, version
            )));
        }
        debug!("Using explicit address {}", ip);
        return Ok(ip);
    }

    debug!("Detecting {} address via {}", version, source.source_name());

    let ip = source.current(version).await.map_err(|e| match e {
        Error::AddressDetection(_) => e,
        other => Error::address_detection(other.to_string()),
    })?;

    if !version.matches(&ip) {
        return Err(Error::address_detection(format!(
            "{} returned {}, expected an {} address",
            source.source_name(),
            ip,
            version
        )));
    }

    info!("Detected {} address {} via {}", version, ip, source.source_name());
    Ok(ip)
}
