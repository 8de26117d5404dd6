// HTTP endpoints
pub mod api;

// Scrape-time gauge collection
pub mod collector;

// Environment configuration
pub mod config;

// Connector model and listing
pub mod connector;

// Destination model and lookup
pub mod destination;

// Startup wiring and scrape orchestration
pub mod exporter;

// Fivetran REST client and wire types
pub mod fivetran;

// Group listing and name/ID resolution
pub mod group;

// Gauge descriptors, samples and the long-lived registry
pub mod metrics;

// Upstream state enums
pub mod status;
