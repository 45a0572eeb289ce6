//! Configuration types for cfddns
//!
//! This module defines the per-run request and the settings used to build
//! providers and address sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::error::{CredentialField, Error, Result};

/// Default Cloudflare API base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default public IPv4 echo endpoint
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";

/// Default public IPv6 echo endpoint
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";

/// Default EC2 instance metadata service base URL
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254";

/// Default HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// IP version of the active address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4, published as A records
    #[default]
    V4,
    /// IPv6, published as AAAA records
    V6,
}

impl IpVersion {
    /// Record type carrying addresses of this family
    pub fn record_type(&self) -> RecordType {
        match self {
            IpVersion::V4 => RecordType::A,
            IpVersion::V6 => RecordType::Aaaa,
        }
    }

    /// Whether `ip` belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => ip.is_ipv4(),
            IpVersion::V6 => ip.is_ipv6(),
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one reconciliation run needs to know
///
/// Built once per invocation from resolved inputs and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    record_names: Vec<String>,
    record_type: RecordType,
    desired_address: IpAddr,
    proxied: bool,
}

impl UpdateRequest {
    /// Create a request for `record_names`, pointing them at `desired_address`
    ///
    /// The record type follows the address family. Fails if the address
    /// does not belong to `version`.
    pub fn new(
        record_names: Vec<String>,
        version: IpVersion,
        desired_address: IpAddr,
        proxied: bool,
    ) -> Result<Self> {
        if !version.matches(&desired_address) {
            return Err(Error::invalid_input(format!(
                "Address {} is not an {} address",
                desired_address, version
            )));
        }

        Ok(Self {
            record_names,
            record_type: version.record_type(),
            desired_address,
            proxied,
        })
    }

    /// Record names, in processing order
    pub fn record_names(&self) -> &[String] {
        &self.record_names
    }

    /// Record type to look up and update
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Address every record should publish
    pub fn desired_address(&self) -> IpAddr {
        self.desired_address
    }

    /// Whether updated records are proxied through the provider's edge
    pub fn proxied(&self) -> bool {
        self.proxied
    }
}

/// Split a comma-separated record list
///
/// Entries are trimmed; empty entries are dropped. Duplicates are kept.
pub fn parse_record_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Provider credentials
///
/// The Debug implementation does NOT expose the API key.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Account e-mail the key is authorized for
    pub email: String,
    /// API key or token
    pub api_key: String,
    /// Zone identifier
    pub zone_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .finish()
    }
}

impl Credentials {
    /// Check that every field is present
    ///
    /// Fields are checked in order email, API key, zone id; the first
    /// missing one is reported.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (CredentialField::Email, &self.email),
            (CredentialField::ApiKey, &self.api_key),
            (CredentialField::ZoneId, &self.zone_id),
        ];

        for (field, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::MissingCredential(field));
            }
        }

        Ok(())
    }
}

/// Settings for the DNS provider client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Look records up but never send updates
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            dry_run: false,
        }
    }
}

impl ProviderSettings {
    /// Validate the provider settings
    pub fn validate(&self) -> Result<()> {
        validate_url("API base URL", &self.api_base)?;
        if self.timeout_secs == 0 {
            return Err(Error::config("HTTP timeout must be > 0"));
        }
        Ok(())
    }
}

/// Address source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddressSourceConfig {
    /// Public plain-text echo service
    Public {
        /// Endpoint answering with the caller's IPv4 address
        ipv4_url: String,
        /// Endpoint answering with the caller's IPv6 address
        ipv6_url: String,
    },

    /// EC2 instance metadata service (IMDSv2)
    Ec2Metadata {
        /// Metadata service base URL
        base_url: String,
    },

    /// Global-scope IPv6 address of a local interface
    Interface {
        /// Interface name (e.g., "eth0")
        name: String,
    },
}

impl Default for AddressSourceConfig {
    fn default() -> Self {
        AddressSourceConfig::Public {
            ipv4_url: DEFAULT_IPV4_URL.to_string(),
            ipv6_url: DEFAULT_IPV6_URL.to_string(),
        }
    }
}

impl AddressSourceConfig {
    /// Validate the address source configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            AddressSourceConfig::Public { ipv4_url, ipv6_url } => {
                validate_url("IPv4 echo URL", ipv4_url)?;
                validate_url("IPv6 echo URL", ipv6_url)
            }
            AddressSourceConfig::Ec2Metadata { base_url } => {
                validate_url("metadata URL", base_url)
            }
            AddressSourceConfig::Interface { name } => {
                if name.trim().is_empty() {
                    return Err(Error::config("Interface name cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &'static str {
        match self {
            AddressSourceConfig::Public { .. } => "public",
            AddressSourceConfig::Ec2Metadata { .. } => "ec2",
            AddressSourceConfig::Interface { .. } => "interface",
        }
    }
}

fn validate_url(what: &str, url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_follows_family() {
        let v4 = UpdateRequest::new(vec![], IpVersion::V4, "1.2.3.4".parse().unwrap(), false)
            .unwrap();
        assert_eq!(v4.record_type(), RecordType::A);

        let v6 = UpdateRequest::new(vec![], IpVersion::V6, "2001:db8::1".parse().unwrap(), true)
            .unwrap();
        assert_eq!(v6.record_type(), RecordType::Aaaa);
        assert!(v6.proxied());
    }

    #[test]
    fn test_family_mismatch_rejected() {
        let err = UpdateRequest::new(vec![], IpVersion::V6, "1.2.3.4".parse().unwrap(), false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_parse_record_list() {
        assert_eq!(
            parse_record_list(" a.example.com, b.example.com ,,a.example.com"),
            vec!["a.example.com", "b.example.com", "a.example.com"]
        );
        assert!(parse_record_list("").is_empty());
        assert!(parse_record_list(" , ").is_empty());
    }

    #[test]
    fn test_credentials_missing_in_order() {
        let mut creds = Credentials::default();
        assert!(matches!(
            creds.validate(),
            Err(Error::MissingCredential(CredentialField::Email))
        ));

        creds.email = "ops@example.com".to_string();
        assert!(matches!(
            creds.validate(),
            Err(Error::MissingCredential(CredentialField::ApiKey))
        ));

        creds.api_key = "key".to_string();
        assert!(matches!(
            creds.validate(),
            Err(Error::MissingCredential(CredentialField::ZoneId))
        ));

        creds.zone_id = "zone".to_string();
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials {
            email: "ops@example.com".to_string(),
            api_key: "secret_key_12345".to_string(),
            zone_id: "zone".to_string(),
        };
        let debug_str = format!("{:?}", creds);
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("ops@example.com"));
    }

    #[test]
    fn test_record_type_serializes_to_wire_name() {
        assert_eq!(serde_json::to_string(&RecordType::Aaaa).unwrap(), "\"AAAA\"");
        assert_eq!(serde_json::to_string(&RecordType::A).unwrap(), "\"A\"");
    }

    #[test]
    fn test_source_config_validation() {
        assert!(AddressSourceConfig::default().validate().is_ok());
        assert!(
            AddressSourceConfig::Interface { name: " ".to_string() }
                .validate()
                .is_err()
        );
        assert!(
            AddressSourceConfig::Ec2Metadata { base_url: "169.254.169.254".to_string() }
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_provider_settings_defaults() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert_eq!(settings.timeout_secs, 30);
        assert!(!settings.dry_run);
        assert!(settings.validate().is_ok());

        let zero = ProviderSettings { timeout_secs: 0, ..ProviderSettings::default() };
        assert!(zero.validate().is_err());
    }
}
