// # cfddns-core
//
// Core library for the cfddns record reconciler.
//
// ## Architecture Overview
//
// One invocation keeps a set of A or AAAA records in a DNS zone pointed at
// the host's current address:
// - **AddressSource**: Trait for detecting the current public address
// - **DnsProvider**: Trait for looking up and updating records via a provider API
// - **Reconciler**: Compares each record with the desired address and updates the stale ones
//
// Logging goes through `tracing`; the binary decides where the events land.
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Reconciliation logic is separate from provider and source implementations
// 2. **Sequential**: Records are processed one provider round-trip at a time, in input order
// 3. **Never create**: A record that does not exist is reported, not created
// 4. **Idempotency**: Re-running with an unchanged address performs zero updates

pub mod traits;
pub mod reconciler;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{AddressSource, DnsProvider};
pub use reconciler::{Reconciler, ReconcileReport, RunStatus, UpdateOutcome, resolve_address, parse_address};
pub use config::{AddressSourceConfig, Credentials, IpVersion, ProviderSettings, RecordType, UpdateRequest};
pub use error::{CredentialField, Error, Result};
