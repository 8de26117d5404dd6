//! Group name ⇄ ID resolution.
//!
//! Two strategies are provided:
//!
//! - [`DynamicResolver`] lists groups on every call and scans the result.
//!   Always current, but each resolution costs a full API call.
//! - [`StaticResolver`] lists groups once at construction and answers from
//!   two in-memory maps afterwards. Groups renamed after startup are not
//!   seen until the process restarts.

use super::{Group, GroupLister};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub enum ResolveError {
    /// No group carries the requested name.
    NameNotFound(String),
    /// No group carries the requested ID.
    IdNotFound(String),
    /// Listing groups failed, so nothing could be resolved.
    List(anyhow::Error),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NameNotFound(_) | ResolveError::IdNotFound(_))
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NameNotFound(name) => write!(f, "no group named '{}'", name),
            ResolveError::IdNotFound(id) => write!(f, "no group with ID '{}'", id),
            ResolveError::List(e) => write!(f, "listing groups failed: {:#}", e),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::List(e) => Some(&**e),
            _ => None,
        }
    }
}

#[async_trait]
pub trait GroupResolver: Send + Sync {
    async fn resolve_name_to_id(&self, name: &str) -> Result<String, ResolveError>;

    async fn resolve_id_to_name(&self, id: &str) -> Result<String, ResolveError>;
}

/// Resolves against a fresh group listing on every call.
pub struct DynamicResolver {
    lister: Arc<dyn GroupLister>,
}

impl DynamicResolver {
    pub fn new(lister: Arc<dyn GroupLister>) -> Self {
        Self { lister }
    }

    async fn groups(&self) -> Result<Vec<Group>, ResolveError> {
        self.lister.list().await.map_err(|e| {
            warn!(error = %e, "Listing groups for resolution failed");
            ResolveError::List(e)
        })
    }
}

#[async_trait]
impl GroupResolver for DynamicResolver {
    async fn resolve_name_to_id(&self, name: &str) -> Result<String, ResolveError> {
        let group = self
            .groups()
            .await?
            .into_iter()
            .find(|group| group.name == name)
            .ok_or_else(|| ResolveError::NameNotFound(name.to_string()))?;

        info!(group_name = %name, group_id = %group.id, "Resolved group name to ID");
        Ok(group.id)
    }

    async fn resolve_id_to_name(&self, id: &str) -> Result<String, ResolveError> {
        let group = self
            .groups()
            .await?
            .into_iter()
            .find(|group| group.id == id)
            .ok_or_else(|| ResolveError::IdNotFound(id.to_string()))?;

        Ok(group.name)
    }
}

/// Resolves against a snapshot taken once at construction.
///
/// The maps are never written after `new` returns, so lookups need no locking.
#[derive(Debug)]
pub struct StaticResolver {
    id_to_name: HashMap<String, String>,
    name_to_id: HashMap<String, String>,
}

impl StaticResolver {
    pub async fn new(lister: &dyn GroupLister) -> Result<Self, ResolveError> {
        let groups = lister.list().await.map_err(ResolveError::List)?;
        Ok(Self::from_groups(groups))
    }

    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut id_to_name = HashMap::with_capacity(groups.len());
        let mut name_to_id = HashMap::with_capacity(groups.len());
        for group in groups {
            if let Some(previous) = name_to_id.insert(group.name.clone(), group.id.clone()) {
                warn!(
                    group_name = %group.name,
                    group_id = %group.id,
                    shadowed_group_id = %previous,
                    "Duplicate group name, last listed group wins"
                );
            }
            id_to_name.insert(group.id, group.name);
        }

        info!(count = id_to_name.len(), "Built static group lookup tables");
        Self {
            id_to_name,
            name_to_id,
        }
    }
}

#[async_trait]
impl GroupResolver for StaticResolver {
    async fn resolve_name_to_id(&self, name: &str) -> Result<String, ResolveError> {
        self.name_to_id
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NameNotFound(name.to_string()))
    }

    async fn resolve_id_to_name(&self, id: &str) -> Result<String, ResolveError> {
        self.id_to_name
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::IdNotFound(id.to_string()))
    }
}
