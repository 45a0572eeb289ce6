// # Cloudflare DNS Provider
//
// This crate provides a Cloudflare DNS provider implementation for cfddns.
//
// ## Behaviour
//
// - One GET per lookup, one PUT per update
// - Lookups that fail in any way (transport, HTTP status, `success: false`,
//   malformed JSON) are errors; the reconciler aborts the run
// - Updates that reach Cloudflare and come back refused are
//   `UpdateResult::Rejected`, not errors
// - HTTP timeout on every request (30 seconds by default)
// - Dry-run mode for safe testing
// - No record creation, no retries, no caching
//
// ## Security Requirements
//
// - API key NEVER appears in logs or `Debug` output
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfddns_core::config::ProviderSettings;
use cfddns_core::traits::{DnsProvider, ExistingRecord, RecordUpdate, UpdateResult};
use cfddns_core::{Credentials, Error, RecordType, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "cloudflare";

/// Envelope shared by every Cloudflare v4 response
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    content: String,
}

/// Join Cloudflare's error list into one line
fn describe_errors(errors: &[ApiMessage]) -> Option<String> {
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| format!("{}: {}", e.code, e.message))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Map a non-success HTTP status on a lookup to an error
fn lookup_status_error(status: StatusCode, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API key or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::provider(PROVIDER, format!("Zone not found. Status: {}", status)),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("Record lookup failed: {} - {}", status, error_text),
        ),
    }
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all lookups
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records, reporting the update as applied
pub struct CloudflareProvider {
    /// Cloudflare API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Account e-mail sent alongside the key
    email: String,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform lookups but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API key
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_key", &"<REDACTED>")
            .field("email", &self.email)
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `credentials`: Account e-mail and API key (zone id is passed per call)
    /// - `settings`: API base URL, timeout and dry-run flag
    ///
    /// # Errors
    ///
    /// - `Error::MissingCredential` if the e-mail or key is empty
    /// - `Error::Config` if the settings are invalid
    /// - `Error::HttpClient` if the HTTP client cannot be built
    pub fn new(credentials: &Credentials, settings: &ProviderSettings) -> Result<Self> {
        credentials.validate()?;
        settings.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::http_client(format!("Failed to build HTTP client: {}", e)))?;

        if settings.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_key: credentials.api_key.clone(),
            email: credentials.email.clone(),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            client,
            dry_run: settings.dry_run,
        })
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("X-Auth-Email", &self.email)
            .header("Content-Type", "application/json")
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Look up a record by name and type
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <key>
    /// ```
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<ExistingRecord>> {
        tracing::debug!(
            "Looking up record: {} (type: {})",
            record_name,
            record_type
        );

        let response = self
            .authorized(self.client.get(self.records_url(zone_id)))
            .query(&[("name", record_name), ("type", record_type.as_str())])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(lookup_status_error(status, &error_text));
        }

        let envelope: ApiEnvelope<Vec<ApiRecord>> = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if !envelope.success {
            let reason = describe_errors(&envelope.errors)
                .unwrap_or_else(|| "no error details".to_string());
            return Err(Error::provider(
                PROVIDER,
                format!("Record lookup refused: {}", reason),
            ));
        }

        let records = envelope.result.unwrap_or_default();
        let count = envelope
            .result_info
            .map(|info| info.count)
            .unwrap_or(records.len() as u64);

        if count == 0 {
            tracing::debug!("No {} record named {}", record_type, record_name);
            return Ok(None);
        }

        let record = records.into_iter().next().ok_or_else(|| {
            Error::provider(
                PROVIDER,
                "Invalid response format: result_info.count > 0 but result is empty",
            )
        })?;

        if count > 1 {
            tracing::warn!(
                "{} {} records named {}; using the first ({})",
                count,
                record_type,
                record_name,
                record.id
            );
        }

        tracing::debug!("Found record ID: {} (content: {})", record.id, record.content);

        Ok(Some(ExistingRecord {
            id: record.id,
            name: if record.name.is_empty() {
                record_name.to_string()
            } else {
                record.name
            },
            content: record.content,
        }))
    }

    /// Replace the value of an existing record
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "1.2.3.4",
    ///   "ttl": 1,
    ///   "proxied": false
    /// }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateResult> {
        let url = format!("{}/{}", self.records_url(zone_id), record_id);

        if self.dry_run {
            let payload = serde_json::to_string(update)?;
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                payload
            );
            return Ok(UpdateResult::Applied);
        }

        let response = self
            .authorized(self.client.put(&url))
            .json(update)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to read response: {}", e)))?;

        let envelope: ApiEnvelope<serde_json::Value> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Ok(UpdateResult::Rejected {
                    reason: format!("HTTP {}: unreadable response ({})", status, e),
                });
            }
        };

        if envelope.success {
            tracing::debug!("Cloudflare accepted update of {}", update.name);
            return Ok(UpdateResult::Applied);
        }

        let reason = match (describe_errors(&envelope.errors), status.as_u16()) {
            (Some(errors), _) => errors,
            (None, 409) => format!(
                "Conflict: Record is being updated by another process. Status: {}",
                status
            ),
            (None, 429) => format!("Rate limit exceeded. Status: {}", status),
            (None, _) => format!("Update refused. Status: {}", status),
        };

        Ok(UpdateResult::Rejected { reason })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
