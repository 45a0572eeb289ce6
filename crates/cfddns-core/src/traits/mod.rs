//! Core traits for cfddns
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressSource`]: Detect the host's current address
//! - [`DnsProvider`]: Look up and update records via provider APIs

pub mod address_source;
pub mod dns_provider;

pub use address_source::AddressSource;
pub use dns_provider::{DnsProvider, ExistingRecord, RecordUpdate, UpdateResult, AUTOMATIC_TTL};
