// # Address Source Trait
//
// Defines the interface for detecting the host's current address.
//
// ## Implementations
//
// - Public echo service and EC2 instance metadata: `cfddns-ip-http` crate
// - Local interface (IPv6): `cfddns-ip-iface` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::{AddressSource, IpVersion};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* AddressSource implementation */;
//
//     let current_ip = source.current(IpVersion::V4).await?;
//     println!("Current address: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::config::IpVersion;

/// Trait for address source implementations
///
/// A source answers one question: what is this host's address in the
/// given family right now. It is asked once per run, before any DNS
/// lookup, and never decides whether records need updating.
///
/// Failures are returned as errors; the caller treats them as fatal.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Get the current address of the requested family
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current address
    /// - `Err(Error)`: If the address cannot be determined
    async fn current(&self, version: IpVersion) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
