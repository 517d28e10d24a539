//! Test doubles and common utilities for contract tests
//!
//! The doubles record what the pipeline asks of them and answer from a
//! script, so tests can observe ordering, call counts and call timing
//! without any network.

#![allow(dead_code)]

use cfsync_core::config::{RateLimitConfig, SyncConfig};
use cfsync_core::error::{Error, Result};
use cfsync_core::records::{DesiredRecord, RecordUpdate, UpstreamRecord};
use cfsync_core::traits::{AddressFamily, AddressSource, DnsProvider};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Start instants of outbound calls, shared across doubles
#[derive(Clone, Default)]
pub struct CallClock {
    starts: Arc<Mutex<Vec<Instant>>>,
}

impl CallClock {
    pub fn record(&self) {
        self.starts.lock().unwrap().push(Instant::now());
    }

    pub fn starts(&self) -> Vec<Instant> {
        let mut starts = self.starts.lock().unwrap().clone();
        starts.sort();
        starts
    }

    /// Largest number of starts inside any window of length `window`
    pub fn max_in_window(&self, window: Duration) -> usize {
        let starts = self.starts();
        (0..starts.len())
            .map(|i| {
                starts[i..]
                    .iter()
                    .take_while(|s| s.duration_since(starts[i]) < window)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

/// One scripted answer of the address source
#[derive(Clone, Debug)]
pub enum Reply {
    Address(&'static str),
    Fail(&'static str),
    Panic,
}

/// Address source answering from per-family scripts
///
/// Once a script runs out, the fallback reply for that family is used.
pub struct ScriptedAddressSource {
    v4: Mutex<VecDeque<Reply>>,
    v6: Mutex<VecDeque<Reply>>,
    v4_fallback: Reply,
    v6_fallback: Reply,
    lookup_count: Arc<AtomicUsize>,
    clock: CallClock,
}

impl ScriptedAddressSource {
    /// Always answer with the same addresses
    pub fn fixed(v4: &'static str, v6: &'static str) -> Self {
        Self::scripted(Vec::new(), Reply::Address(v4), Vec::new(), Reply::Address(v6))
    }

    pub fn scripted(
        v4: Vec<Reply>,
        v4_fallback: Reply,
        v6: Vec<Reply>,
        v6_fallback: Reply,
    ) -> Self {
        Self {
            v4: Mutex::new(v4.into()),
            v6: Mutex::new(v6.into()),
            v4_fallback,
            v6_fallback,
            lookup_count: Arc::new(AtomicUsize::new(0)),
            clock: CallClock::default(),
        }
    }

    /// Record call starts on a shared clock
    pub fn with_clock(mut self, clock: CallClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AddressSource for ScriptedAddressSource {
    async fn lookup(&self, family: AddressFamily) -> Result<String> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.clock.record();

        let reply = match family {
            AddressFamily::V4 => self.v4.lock().unwrap().pop_front(),
            AddressFamily::V6 => self.v6.lock().unwrap().pop_front(),
        };
        let reply = reply.unwrap_or_else(|| match family {
            AddressFamily::V4 => self.v4_fallback.clone(),
            AddressFamily::V6 => self.v6_fallback.clone(),
        });

        match reply {
            Reply::Address(address) => Ok(format!("{}\n", address)),
            Reply::Fail(message) => Err(Error::address_source(message)),
            Reply::Panic => panic!("scripted panic in address source"),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// A mock DnsProvider that records every update call
pub struct MockDnsProvider {
    upstream: Vec<UpstreamRecord>,
    failing: HashSet<String>,
    fail_listing: bool,
    panic_first_update: bool,
    update_delay: Option<Duration>,
    updates: Arc<Mutex<Vec<RecordUpdate>>>,
    completed: Arc<AtomicUsize>,
    list_call_count: Arc<AtomicUsize>,
    clock: CallClock,
}

impl MockDnsProvider {
    pub fn new(upstream: Vec<UpstreamRecord>) -> Self {
        Self {
            upstream,
            failing: HashSet::new(),
            fail_listing: false,
            panic_first_update: false,
            update_delay: None,
            updates: Arc::new(Mutex::new(Vec::new())),
            completed: Arc::new(AtomicUsize::new(0)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            clock: CallClock::default(),
        }
    }

    /// Reject updates for the given record name
    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Fail the startup listing
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Panic inside the first update call
    pub fn panicking_on_first_update(mut self) -> Self {
        self.panic_first_update = true;
        self
    }

    /// Make each update take `delay` before answering
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    pub fn with_clock(mut self, clock: CallClock) -> Self {
        self.clock = clock;
        self
    }

    /// Every update call seen so far, in call order
    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Number of update calls that ran to completion
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self) -> Result<Vec<UpstreamRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(Error::auth("invalid API token"));
        }
        Ok(self.upstream.clone())
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<UpstreamRecord> {
        self.clock.record();
        let call = {
            let mut updates = self.updates.lock().unwrap();
            updates.push(update.clone());
            updates.len()
        };
        if self.panic_first_update && call == 1 {
            panic!("scripted panic in provider update");
        }

        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        if !update.has_identity() {
            return Err(Error::not_found("record identity is empty"));
        }
        if self.failing.contains(&update.name) {
            return Err(Error::provider("mock", format!("rejected {}", update.name)));
        }

        Ok(UpstreamRecord::new(
            update.identity.clone(),
            update.name.clone(),
            update.content.clone(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Upstream listing with one record per name
pub fn upstream(entries: &[(&str, &str)]) -> Vec<UpstreamRecord> {
    entries
        .iter()
        .map(|(id, name)| UpstreamRecord::new(*id, *name, "192.0.2.1"))
        .collect()
}

/// Helper to create a minimal SyncConfig for testing
///
/// The rate budget is generous so it never shapes timing unless a test
/// sets its own.
pub fn minimal_config(records: Vec<DesiredRecord>) -> SyncConfig {
    let mut config = SyncConfig::new("test-zone", "test-token", records);
    config.frequency_secs = 10;
    config.rate_limit = RateLimitConfig {
        calls: 1000,
        per_secs: 1,
    };
    config
}
