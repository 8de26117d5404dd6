//! Fivetran connectors: the normalized record and its lister.

pub mod lister;

pub use lister::{ApiConnectorLister, ConnectorLister};

use crate::status::{SetupState, SyncState, UpdateState};

/// A connector as reported by one scrape.
///
/// Built fresh from every list call and never mutated afterwards. The group
/// fields come from the lister that produced the record, not from the API item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub id: String,
    /// The connector's destination schema name, the closest thing Fivetran
    /// has to a display name.
    pub name: String,
    pub group_id: String,
    pub group_name: String,
    pub service: String,
    pub paused: bool,
    pub is_historical_sync: bool,
    pub sync_frequency_mins: i64,
    pub task_count: usize,
    pub warning_count: usize,
    pub setup_state: SetupState,
    pub sync_state: SyncState,
    pub update_state: UpdateState,
}
