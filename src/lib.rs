//! site-host - Multi-tenant static site hosting
//!
//! This crate serves many independent projects, each bound to one or more
//! hostnames, from a swappable storage backend:
//! - Interchangeable storage backends (local filesystem, S3-compatible)
//!   behind one contract, with strict per-project path containment
//! - Hostname -> project resolution via an embedded redb registry
//! - Layout composition for HTML pages (`_layout.html` + placeholders)
//! - Streaming delivery for non-HTML content

pub mod api;
pub mod config;
pub mod registry;
pub mod render;
pub mod serve;
pub mod site_store;

use std::sync::Arc;

use config::Config;
use registry::Registry;
use serve::SitePipeline;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub registry: Registry,
    pub store: Arc<dyn site_store::SiteStore>,
    pub pipeline: SitePipeline,
}
