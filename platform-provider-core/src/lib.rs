#![doc = "platform-provider-core: reconciliation core for the platform provider."]

//! This crate holds every piece of business logic the provider runs: the
//! Transport Core, directory resolution, resource codecs, vendor dispatch and
//! the lifecycle orchestrators. It never opens a socket itself; network I/O
//! goes through the [`contract::HttpBackend`] trait, implemented for real in
//! the adapter crate and mocked in tests.
//!
//! # Usage
//! Build an [`ApiClient`] over any backend, then hand it to an orchestrator
//! from [`resources`].

pub mod client;
pub mod codec;
pub mod config;
pub mod contract;
pub mod directory;
pub mod dynamic;
pub mod error;
pub mod model;
pub mod resources;
pub mod vendor;

pub use client::{ApiClient, ApiRequest};
pub use config::{Environment, ProviderConfig};
pub use error::{ProviderError, Result};
pub use resources::Orchestrator;
