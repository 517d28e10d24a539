//! Minimal embedding example for cfsync-core
//!
//! This example drives the pipeline with in-process collaborators: an
//! address source that walks through a few addresses and a provider that
//! prints what it is asked to do. The manager lifecycle is fully managed by
//! the application.

use async_trait::async_trait;
use cfsync_core::records::{DesiredRecord, RecordUpdate, UpstreamRecord};
use cfsync_core::traits::{AddressFamily, AddressSource, DnsProvider};
use cfsync_core::{Error, Manager, Result, SyncConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Address source cycling through a fixed list
struct RotatingSource {
    addresses: Vec<&'static str>,
    next: AtomicUsize,
}

#[async_trait]
impl AddressSource for RotatingSource {
    async fn lookup(&self, family: AddressFamily) -> Result<String> {
        match family {
            AddressFamily::V4 => {
                let index = self.next.fetch_add(1, Ordering::SeqCst) % self.addresses.len();
                Ok(self.addresses[index].to_string())
            }
            AddressFamily::V6 => Err(Error::address_source("this host has no ipv6")),
        }
    }

    fn source_name(&self) -> &'static str {
        "rotating"
    }
}

/// Provider that prints updates instead of calling an API
struct PrintingProvider {
    update_calls: AtomicUsize,
}

#[async_trait]
impl DnsProvider for PrintingProvider {
    async fn list_records(&self) -> Result<Vec<UpstreamRecord>> {
        Ok(vec![
            UpstreamRecord::new("rec-1", "home.example.com", "192.0.2.1"),
            UpstreamRecord::new("rec-2", "v6.example.com", "2001:db8::1"),
        ])
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<UpstreamRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        println!(
            "[Embedded] {} {} ({}) -> {}",
            update.kind, update.name, update.identity, update.content
        );
        Ok(UpstreamRecord::new(
            update.identity.clone(),
            update.name.clone(),
            update.content.clone(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "printing"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    println!("=== Embedded cfsync-core Example ===\n");

    let source = Arc::new(RotatingSource {
        addresses: vec!["203.0.113.9", "203.0.113.10"],
        next: AtomicUsize::new(0),
    });
    let provider = Arc::new(PrintingProvider {
        update_calls: AtomicUsize::new(0),
    });

    let mut config = SyncConfig::new(
        "embedded-zone",
        "embedded-token",
        vec![
            DesiredRecord::a("home.example.com"),
            DesiredRecord::aaaa("v6.example.com"),
        ],
    );
    config.frequency_secs = 1;
    config.check_ipv6 = true;

    println!("1. Building manager (lists upstream records)...");
    let manager = Manager::new(config, provider.clone(), source).await?;

    println!("2. Running for a few cycles...");
    manager.run().await?;
    tokio::time::sleep(Duration::from_millis(3500)).await;

    println!("3. Stopping manager...");
    manager.stop().await;

    println!(
        "\n=== {} update call(s), AAAA skipped every cycle ===",
        provider.update_calls.load(Ordering::SeqCst)
    );
    println!("Key Points:");
    println!("- Manager lifecycle is fully controlled by application");
    println!("- No global state");
    println!("- Any AddressSource / DnsProvider can be plugged in");

    Ok(())
}
