use super::Destination;
use crate::fivetran::resp::DestinationItem;
use crate::fivetran::FivetranClient;
use crate::status::SetupStatus;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Describes the destination of one group.
///
/// Fivetran pairs every group with exactly one destination, so the group is
/// all that is needed to address it.
#[async_trait]
pub trait DestinationDescriber: Send + Sync {
    async fn describe(&self) -> Result<Destination>;

    fn group_id(&self) -> &str;

    fn group_name(&self) -> &str;
}

/// Describes a destination with `GET /v1/destinations/{group_id}`.
pub struct ApiDestinationDescriber {
    client: FivetranClient,
    group_id: String,
    group_name: String,
    path: String,
}

impl ApiDestinationDescriber {
    pub fn new(client: FivetranClient, group_id: String, group_name: String) -> Self {
        let path = format!("/v1/destinations/{}", group_id);
        Self {
            client,
            group_id,
            group_name,
            path,
        }
    }
}

#[async_trait]
impl DestinationDescriber for ApiDestinationDescriber {
    async fn describe(&self) -> Result<Destination> {
        let item: DestinationItem = self.client.get(&self.path).await.with_context(|| {
            format!("Failed to describe destination of group '{}'", self.group_name)
        })?;

        let setup_status = item
            .setup_status
            .parse::<SetupStatus>()
            .map_err(|e| {
                warn!(
                    group_id = %self.group_id,
                    group_name = %self.group_name,
                    destination_id = %item.id,
                    error = %e,
                    "Rejecting destination"
                );
                e
            })
            .with_context(|| {
                format!("Failed to convert setup status of destination '{}'", item.id)
            })?;

        let destination = Destination {
            id: item.id,
            name: self.group_name.clone(),
            group_id: self.group_id.clone(),
            group_name: self.group_name.clone(),
            service: item.service,
            setup_status,
        };

        debug!(
            group_name = %destination.group_name,
            destination_id = %destination.id,
            service = %destination.service,
            "Discovered destination"
        );
        Ok(destination)
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn group_name(&self) -> &str {
        &self.group_name
    }
}
