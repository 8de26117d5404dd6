use super::Connector;
use crate::fivetran::resp::{ConnectorItem, Page};
use crate::fivetran::{FivetranClient, PAGE_LIMIT};
use crate::status::{SetupState, SyncState, UpdateState};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Lists the connectors of one group.
///
/// The group is fixed when the lister is built; every record it returns is
/// stamped with that group's ID and name.
#[async_trait]
pub trait ConnectorLister: Send + Sync {
    async fn list(&self) -> Result<Vec<Connector>>;

    fn group_id(&self) -> &str;

    fn group_name(&self) -> &str;
}

/// Lists connectors with `GET /v1/groups/{group_id}/connectors`.
///
/// A single page of up to [`PAGE_LIMIT`] connectors is read per call.
pub struct ApiConnectorLister {
    client: FivetranClient,
    group_id: String,
    group_name: String,
    path: String,
}

impl ApiConnectorLister {
    pub fn new(client: FivetranClient, group_id: String, group_name: String) -> Self {
        let path = format!("/v1/groups/{}/connectors?limit={}", group_id, PAGE_LIMIT);
        Self {
            client,
            group_id,
            group_name,
            path,
        }
    }

    /// Normalize one API item. Any unknown state rejects the item.
    fn convert(&self, item: ConnectorItem) -> Result<Connector> {
        let setup_state = item
            .status
            .setup_state
            .parse::<SetupState>()
            .with_context(|| format!("Failed to convert setup state of connector '{}'", item.id))?;
        let sync_state = item
            .status
            .sync_state
            .parse::<SyncState>()
            .with_context(|| format!("Failed to convert sync state of connector '{}'", item.id))?;
        let update_state = item
            .status
            .update_state
            .parse::<UpdateState>()
            .with_context(|| format!("Failed to convert update state of connector '{}'", item.id))?;

        Ok(Connector {
            name: item.schema,
            group_id: self.group_id.clone(),
            group_name: self.group_name.clone(),
            service: item.service,
            paused: item.paused,
            is_historical_sync: item.status.is_historical_sync,
            sync_frequency_mins: item.sync_frequency_mins,
            task_count: item.status.tasks.len(),
            warning_count: item.status.warnings.len(),
            setup_state,
            sync_state,
            update_state,
            id: item.id,
        })
    }
}

#[async_trait]
impl ConnectorLister for ApiConnectorLister {
    async fn list(&self) -> Result<Vec<Connector>> {
        let page: Page<ConnectorItem> = self.client.get(&self.path).await.with_context(|| {
            format!("Failed to list connectors of group '{}'", self.group_name)
        })?;

        // One bad item fails the whole call: a partial list would make the
        // missing connectors look deleted.
        let mut connectors = Vec::with_capacity(page.items.len());
        for item in page.items {
            let connector = self.convert(item).map_err(|e| {
                warn!(
                    group_id = %self.group_id,
                    group_name = %self.group_name,
                    error = %format!("{:#}", e),
                    "Rejecting connector list"
                );
                e
            })?;
            debug!(
                group_name = %self.group_name,
                connector_id = %connector.id,
                connector_name = %connector.name,
                "Discovered connector"
            );
            connectors.push(connector);
        }

        debug!(
            group_name = %self.group_name,
            count = connectors.len(),
            "Listed connectors"
        );
        Ok(connectors)
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn group_name(&self) -> &str {
        &self.group_name
    }
}
