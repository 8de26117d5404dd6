//! Fivetran groups: listing and name/ID resolution.
//!
//! A group is the unit the exporter is configured with. Operators name
//! groups by their human-chosen name; the API addresses them by an opaque
//! ID, so names are resolved to IDs once at startup.

pub mod resolver;

pub use resolver::{DynamicResolver, GroupResolver, ResolveError, StaticResolver};

use crate::fivetran::resp::{GroupItem, Page};
use crate::fivetran::{FivetranClient, PAGE_LIMIT};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// A Fivetran group. Identity is the ID; the name is what operators configure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

/// Source of the full set of groups visible to the API key.
#[async_trait]
pub trait GroupLister: Send + Sync {
    async fn list(&self) -> Result<Vec<Group>>;
}

/// Lists groups with `GET /v1/groups`.
///
/// Only the first page (up to [`PAGE_LIMIT`] groups) is read. Accounts with
/// more groups than that will have the trailing ones silently missing.
pub struct ApiGroupLister {
    client: FivetranClient,
    path: String,
}

impl ApiGroupLister {
    pub fn new(client: FivetranClient) -> Self {
        Self {
            client,
            path: format!("/v1/groups?limit={}", PAGE_LIMIT),
        }
    }
}

#[async_trait]
impl GroupLister for ApiGroupLister {
    async fn list(&self) -> Result<Vec<Group>> {
        let page: Page<GroupItem> = self
            .client
            .get(&self.path)
            .await
            .context("Failed to list groups")?;

        let groups: Vec<Group> = page
            .items
            .into_iter()
            .map(|item| Group {
                id: item.id,
                name: item.name,
            })
            .collect();

        for group in &groups {
            debug!(group_id = %group.id, group_name = %group.name, "Discovered group");
        }
        info!(count = groups.len(), "Listed groups");

        Ok(groups)
    }
}
