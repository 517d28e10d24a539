//! Core traits for cfsync
//!
//! This module defines the narrow interfaces to the two remote services.
//!
//! - [`AddressSource`]: Discover the host's public addresses
//! - [`DnsProvider`]: List and update records via the provider API

pub mod address_source;
pub mod dns_provider;

pub use address_source::{AddressFamily, AddressSource};
pub use dns_provider::DnsProvider;
