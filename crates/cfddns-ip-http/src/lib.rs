// # HTTP Address Sources
//
// This crate provides the HTTP-based address sources for cfddns.
//
// ## Sources
//
// - [`HttpAddressSource`]: asks a public plain-text echo service (one URL
//   for IPv4, another for IPv6) and uses the trimmed body as the address
// - [`Ec2MetadataSource`]: asks the EC2 instance metadata service using
//   an IMDSv2 session token
//
// Both are asked exactly once per run. Every request carries a timeout.

use cfddns_core::config::{AddressSourceConfig, DEFAULT_TIMEOUT_SECS};
use cfddns_core::traits::AddressSource;
use cfddns_core::{Error, IpVersion, Result, parse_address};

use std::net::IpAddr;
use std::time::Duration;

/// Lifetime requested for IMDSv2 session tokens (6 hours)
const METADATA_TOKEN_TTL_SECS: u32 = 21600;

/// Header carrying the requested token lifetime
const METADATA_TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

/// Header carrying the session token
const METADATA_TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::http_client(format!("Failed to build HTTP client: {}", e)))
}

/// Read a successful response body as text
async fn body_text(source: &str, response: reqwest::Response) -> Result<String> {
    if !response.status().is_success() {
        return Err(Error::address_detection(format!(
            "{}: HTTP error: {}",
            source,
            response.status()
        )));
    }

    response
        .text()
        .await
        .map_err(|e| Error::address_detection(format!("{}: Failed to read response: {}", source, e)))
}

/// Public echo service address source
pub struct HttpAddressSource {
    /// URL answering with the caller's IPv4 address
    ipv4_url: String,

    /// URL answering with the caller's IPv6 address
    ipv6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a new echo source
    ///
    /// # Parameters
    ///
    /// - `ipv4_url`: URL to fetch the IPv4 address from (e.g., "https://api.ipify.org")
    /// - `ipv6_url`: URL to fetch the IPv6 address from (e.g., "https://api6.ipify.org")
    /// - `timeout`: Per-request timeout
    pub fn new(ipv4_url: impl Into<String>, ipv6_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client: build_client(timeout)?,
        })
    }

    fn url_for(&self, version: IpVersion) -> &str {
        match version {
            IpVersion::V4 => &self.ipv4_url,
            IpVersion::V6 => &self.ipv6_url,
        }
    }
}

#[async_trait::async_trait]
impl AddressSource for HttpAddressSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        let url = self.url_for(version);
        tracing::debug!("Fetching {} address from {}", version, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::address_detection(format!("Request to {} failed: {}", url, e)))?;

        let ip_text = body_text(url, response).await?;

        parse_address(&ip_text).map_err(|_| {
            Error::address_detection(format!(
                "{} answered with an invalid IP address: '{}'",
                url,
                ip_text.trim()
            ))
        })
    }

    fn source_name(&self) -> &'static str {
        "public"
    }
}

/// EC2 instance metadata service address source (IMDSv2)
///
/// # Flow
///
/// ```http
/// PUT /latest/api/token
/// X-aws-ec2-metadata-token-ttl-seconds: 21600
///
/// GET /latest/meta-data/public-ipv4
/// X-aws-ec2-metadata-token: <token>
/// ```
///
/// IPv6 reads `/latest/meta-data/ipv6` instead.
pub struct Ec2MetadataSource {
    /// Metadata service base URL, without trailing slash
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl Ec2MetadataSource {
    /// Create a new metadata source
    ///
    /// # Parameters
    ///
    /// - `base_url`: Metadata service base URL (normally "http://169.254.169.254")
    /// - `timeout`: Per-request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    /// Obtain a session token
    async fn session_token(&self) -> Result<String> {
        let url = format!("{}/latest/api/token", self.base_url);

        let response = self
            .client
            .put(&url)
            .header(METADATA_TOKEN_TTL_HEADER, METADATA_TOKEN_TTL_SECS.to_string())
            .send()
            .await
            .map_err(|e| Error::address_detection(format!("Metadata token request failed: {}", e)))?;

        let token = body_text("metadata token", response).await?;
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::address_detection("Metadata service returned an empty token"));
        }

        Ok(token.to_string())
    }
}

#[async_trait::async_trait]
impl AddressSource for Ec2MetadataSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        let token = self.session_token().await?;

        let item = match version {
            IpVersion::V4 => "public-ipv4",
            IpVersion::V6 => "ipv6",
        };
        let url = format!("{}/latest/meta-data/{}", self.base_url, item);
        tracing::debug!("Fetching {} address from instance metadata ({})", version, item);

        let response = self
            .client
            .get(&url)
            .header(METADATA_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(|e| Error::address_detection(format!("Metadata request failed: {}", e)))?;

        let ip_text = body_text(item, response).await?;

        parse_address(&ip_text).map_err(|_| {
            Error::address_detection(format!(
                "Instance metadata {} is not an IP address: '{}'",
                item,
                ip_text.trim()
            ))
        })
    }

    fn source_name(&self) -> &'static str {
        "ec2"
    }
}

/// Build the HTTP address source described by `config`
///
/// # Errors
///
/// `Error::Config` for a configuration that is not an HTTP source.
pub fn create(config: &AddressSourceConfig, timeout: Duration) -> Result<Box<dyn AddressSource>> {
    config.validate()?;

    match config {
        AddressSourceConfig::Public { ipv4_url, ipv6_url } => Ok(Box::new(
            HttpAddressSource::new(ipv4_url.clone(), ipv6_url.clone(), timeout)?,
        )),
        AddressSourceConfig::Ec2Metadata { base_url } => {
            Ok(Box::new(Ec2MetadataSource::new(base_url.clone(), timeout)?))
        }
        _ => Err(Error::config("Invalid config for HTTP address source")),
    }
}

/// Default per-request timeout
pub fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}
