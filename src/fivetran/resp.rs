//! Wire shapes of the Fivetran API responses we consume.
//!
//! Only the fields the exporter reads are modelled; everything else is
//! ignored. State fields stay raw strings so that an unknown value surfaces
//! as a conversion error in the lister rather than a decode failure here.

use serde::Deserialize;

/// Outer envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A single page of a list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present when more pages exist. Never followed.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Item of `GET /v1/groups`.
#[derive(Debug, Deserialize)]
pub struct GroupItem {
    pub id: String,
    pub name: String,
}

/// Item of `GET /v1/groups/{group_id}/connectors`.
#[derive(Debug, Deserialize)]
pub struct ConnectorItem {
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    pub service: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub paused: bool,
    /// Minutes between syncs.
    #[serde(rename = "sync_frequency", default)]
    pub sync_frequency_mins: i64,
    pub status: ConnectorStatusItem,
}

#[derive(Debug, Deserialize)]
pub struct ConnectorStatusItem {
    pub setup_state: String,
    pub sync_state: String,
    pub update_state: String,
    #[serde(default)]
    pub is_historical_sync: bool,
    #[serde(default)]
    pub tasks: Vec<Alert>,
    #[serde(default)]
    pub warnings: Vec<Alert>,
}

/// A task or warning attached to a connector. Only the count is exported.
#[derive(Debug, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Data of `GET /v1/destinations/{group_id}`.
#[derive(Debug, Deserialize)]
pub struct DestinationItem {
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    pub service: String,
    pub setup_status: String,
}
