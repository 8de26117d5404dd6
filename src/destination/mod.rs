//! Fivetran destinations: the normalized record and its describer.

pub mod describer;

pub use describer::{ApiDestinationDescriber, DestinationDescriber};

use crate::status::SetupStatus;

/// The single destination of a group, as reported by one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: String,
    /// Always the group name. Fivetran has no separate destination name.
    pub name: String,
    pub group_id: String,
    pub group_name: String,
    pub service: String,
    pub setup_status: SetupStatus,
}
