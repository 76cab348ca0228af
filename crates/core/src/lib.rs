//! Verger Core - Shared types library.
//!
//! This crate provides the domain types used across all Verger components:
//! - `storefront` - Cart synchronization service and catalog API
//! - `cli` - Command-line cart front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Cart snapshots defined here are what the storefront returns, what the
//! cart manager persists, and what the CLI displays.
//!
//! # Modules
//!
//! - [`types`] - Opaque handles, money, cart snapshots and catalog entries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
