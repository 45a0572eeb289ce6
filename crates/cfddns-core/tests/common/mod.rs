//! Test doubles and common utilities for reconciliation contract tests
//!
//! These doubles script provider answers and record every call so tests
//! can assert on call order and count.

#![allow(dead_code)]

use cfddns_core::error::{Error, Result};
use cfddns_core::traits::{
    AddressSource, DnsProvider, ExistingRecord, RecordUpdate, UpdateResult,
};
use cfddns_core::{IpVersion, RecordType, UpdateRequest};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the mock answers an update for a given record ID
#[derive(Debug, Clone)]
pub enum UpdateBehavior {
    Apply,
    Reject(String),
    TransportFailure,
}

/// A lookup the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub zone_id: String,
    pub name: String,
    pub record_type: RecordType,
}

/// An update the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub zone_id: String,
    pub record_id: String,
    pub payload: RecordUpdate,
}

/// A scripted DnsProvider that records every call
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    /// Existing records by name
    records: Arc<Mutex<HashMap<String, ExistingRecord>>>,
    /// Update behaviour by record ID (default: apply)
    update_behavior: Arc<Mutex<HashMap<String, UpdateBehavior>>>,
    /// Names whose lookup fails at the transport level
    failing_lookups: Arc<Mutex<Vec<String>>>,
    lookups: Arc<Mutex<Vec<Lookup>>>,
    updates: Arc<Mutex<Vec<Update>>>,
    dry_run: bool,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing record; its ID is derived from the name
    pub fn with_record(self, name: &str, content: &str) -> Self {
        self.records.lock().unwrap().insert(
            name.to_string(),
            ExistingRecord {
                id: record_id(name),
                name: name.to_string(),
                content: content.to_string(),
            },
        );
        self
    }

    pub fn with_update_behavior(self, name: &str, behavior: UpdateBehavior) -> Self {
        self.update_behavior
            .lock()
            .unwrap()
            .insert(record_id(name), behavior);
        self
    }

    /// Report dry-run mode; updates are still recorded and applied
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    pub fn with_failing_lookup(self, name: &str) -> Self {
        self.failing_lookups.lock().unwrap().push(name.to_string());
        self
    }

    /// Names looked up, in call order
    pub fn looked_up(&self) -> Vec<String> {
        self.lookups
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.name.clone())
            .collect()
    }

    pub fn lookups(&self) -> Vec<Lookup> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Update> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// A boxed handle sharing this mock's script and call log
    pub fn boxed(&self) -> Box<dyn DnsProvider> {
        Box::new(self.clone())
    }
}

pub fn record_id(name: &str) -> String {
    format!("id-{}", name)
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn find_record(
        &self,
        zone_id: &str,
        record_name: &str,
        record_type: RecordType,
    ) -> Result<Option<ExistingRecord>> {
        self.lookups.lock().unwrap().push(Lookup {
            zone_id: zone_id.to_string(),
            name: record_name.to_string(),
            record_type,
        });

        if self
            .failing_lookups
            .lock()
            .unwrap()
            .iter()
            .any(|n| n == record_name)
        {
            return Err(Error::provider("mock", "connection refused"));
        }

        Ok(self.records.lock().unwrap().get(record_name).cloned())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<UpdateResult> {
        self.updates.lock().unwrap().push(Update {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            payload: update.clone(),
        });

        let behavior = self
            .update_behavior
            .lock()
            .unwrap()
            .get(record_id)
            .cloned()
            .unwrap_or(UpdateBehavior::Apply);

        match behavior {
            UpdateBehavior::Apply => Ok(UpdateResult::Applied),
            UpdateBehavior::Reject(reason) => Ok(UpdateResult::Rejected { reason }),
            UpdateBehavior::TransportFailure => {
                Err(Error::provider("mock", "connection reset by peer"))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// An AddressSource that always answers with the same address
pub struct StaticAddressSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl StaticAddressSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for StaticAddressSource {
    async fn current(&self, _version: IpVersion) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An AddressSource that always fails
pub struct FailingAddressSource;

#[async_trait::async_trait]
impl AddressSource for FailingAddressSource {
    async fn current(&self, _version: IpVersion) -> Result<IpAddr> {
        Err(Error::provider("echo", "HTTP request failed: timed out"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

pub const ZONE: &str = "zone-123";

/// Helper to create an IPv4 request for `names`
pub fn v4_request(names: &[&str], ip: &str) -> UpdateRequest {
    UpdateRequest::new(
        names.iter().map(|n| n.to_string()).collect(),
        IpVersion::V4,
        ip.parse().unwrap(),
        false,
    )
    .expect("request construction succeeds")
}
