//! Command-line interface

use cfddns_core::config::{
    DEFAULT_API_BASE, DEFAULT_IPV4_URL, DEFAULT_IPV6_URL, DEFAULT_METADATA_URL,
    DEFAULT_TIMEOUT_SECS,
};
use cfddns_core::{AddressSourceConfig, IpVersion, ProviderSettings, parse_address};
use clap::{Parser, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log file written when none is named
pub const DEFAULT_LOG_PATH: &str = "cfddns.log";

/// How the current address is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Public plain-text echo service
    Public,
    /// EC2 instance metadata service
    Ec2,
    /// Global IPv6 address of a local interface
    Interface,
}

/// Keep Cloudflare A/AAAA records pointed at this host's current address
#[derive(Debug, Parser)]
#[command(name = "cfddns", version, about)]
pub struct Cli {
    /// Log file (appended to)
    #[arg(short = 'l', long = "log", value_name = "PATH", default_value = DEFAULT_LOG_PATH)]
    pub log: PathBuf,

    /// Credentials file (CLOUDFLARE_EMAIL, CLOUDFLARE_API_KEY, CLOUDFLARE_ZONE_ID)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Comma-separated record names, e.g. home.example.com,vpn.example.com
    #[arg(short = 'd', long, value_name = "LIST")]
    pub domains: Option<String>,

    /// Publish this address instead of detecting one
    #[arg(short = 'i', long = "ip", value_name = "ADDR", value_parser = parse_ip_arg)]
    pub ip: Option<IpAddr>,

    /// Proxy updated records through Cloudflare
    #[arg(short = 'p', long)]
    pub proxy: bool,

    /// Update A records with the IPv4 address (default)
    #[arg(short = '4', long = "ipv4", conflicts_with = "ipv6")]
    pub ipv4: bool,

    /// Update AAAA records with the IPv6 address
    #[arg(short = '6', long = "ipv6")]
    pub ipv6: bool,

    /// Where to detect the current address
    #[arg(short = 's', long, value_enum, default_value_t = SourceKind::Public)]
    pub source: SourceKind,

    /// Interface to read with --source interface
    #[arg(long, value_name = "NAME", default_value = "eth0")]
    pub interface: String,

    /// Echo endpoint for IPv4
    #[arg(long, value_name = "URL", default_value = DEFAULT_IPV4_URL)]
    pub ipv4_url: String,

    /// Echo endpoint for IPv6
    #[arg(long, value_name = "URL", default_value = DEFAULT_IPV6_URL)]
    pub ipv6_url: String,

    /// Instance metadata service base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_METADATA_URL)]
    pub metadata_url: String,

    /// Cloudflare API base URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_BASE)]
    pub api_url: String,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Look records up and log the updates without sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn parse_ip_arg(s: &str) -> Result<IpAddr, String> {
    parse_address(s).map_err(|e| e.to_string())
}

impl Cli {
    /// Active address family
    pub fn ip_version(&self) -> IpVersion {
        if self.ipv6 { IpVersion::V6 } else { IpVersion::V4 }
    }

    /// Address source selected on the command line
    pub fn source_config(&self) -> AddressSourceConfig {
        match self.source {
            SourceKind::Public => AddressSourceConfig::Public {
                ipv4_url: self.ipv4_url.clone(),
                ipv6_url: self.ipv6_url.clone(),
            },
            SourceKind::Ec2 => AddressSourceConfig::Ec2Metadata {
                base_url: self.metadata_url.clone(),
            },
            SourceKind::Interface => AddressSourceConfig::Interface {
                name: self.interface.clone(),
            },
        }
    }

    /// Provider client settings
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            api_base: self.api_url.clone(),
            timeout_secs: self.timeout,
            dry_run: self.dry_run,
        }
    }
}
