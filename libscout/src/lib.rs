//! Scout - Container Registry Search Library
//!
//! Scout walks a Docker/OCI registry and reports every image tag with its
//! manifest digest and total layer size. The catalog, the per-repository tag
//! lists and the per-tag manifests are fetched concurrently; manifest
//! requests go through a worker pool sharing one token-bucket rate limiter.
//!
//! # Quick Start
//!
//! ```no_run
//! use libscout::{OutputFormat, SearchConfig, collect_records, render, sort_records};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchConfig::new("http://localhost:5000", true, OutputFormat::Text);
//!     let handle = libscout::search_all(config, "", "")?;
//!
//!     let mut report = collect_records(handle.collect().await);
//!     sort_records(&mut report.images);
//!     print!("{}", render(&report.images, OutputFormat::Text)?);
//!
//!     for failure in &report.failures {
//!         eprintln!("{:?}: {}", failure.image, failure.error);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Main Types
//!
//! - [`Searcher`] / [`search_all`] / [`search_by_name`] - start a search
//! - [`SearchHandle`] - result stream, cancellation and pool state
//! - [`JobResult`] - one tag, failure or cancellation marker
//! - [`ImageRecord`] / [`TagRecord`] - grouped results for rendering
//! - [`Config`] - layered file and environment configuration

#![warn(clippy::all)]

/// Returns the libscout crate version.
///
/// # Examples
///
/// ```
/// let version = libscout::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use aggregate::JobResult;
pub use auth::Credentials;
pub use cancel::CancelSignal;
pub use config::{Config, SearchConfig};
pub use error::{Result, ScoutError};
pub use image::{ImageRecord, SearchReport, TagRecord, collect_records, sort_records};
pub use pool::{PoolConfig, PoolState};
pub use render::{OutputFormat, render};
pub use search::{SearchHandle, Searcher, search_all, search_by_name};

pub mod aggregate;
pub mod auth;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod oci;
pub mod pool;
pub mod render;
pub mod search;
