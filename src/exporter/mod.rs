//! Exporter - ties the API client, resolvers and collectors together.
//!
//! [`build`] performs the startup sequence: it resolves every configured
//! group name once, then creates one connector lister and one destination
//! describer per group. The resulting [`Exporter`] runs a full scrape each
//! time [`Exporter::render`] is called.

use crate::collector::{ConnectorCollector, DestinationCollector, ScrapeCollector};
use crate::config::{ExporterConfig, ResolverKind};
use crate::connector::{ApiConnectorLister, ConnectorLister};
use crate::destination::{ApiDestinationDescriber, DestinationDescriber};
use crate::fivetran::FivetranClient;
use crate::group::{
    ApiGroupLister, DynamicResolver, Group, GroupLister, GroupResolver, StaticResolver,
};
use crate::metrics::{gauge_families, MetricsRegistry, Sample};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Runs scrapes over a fixed set of collectors.
pub struct Exporter {
    registry: MetricsRegistry,
    collectors: Vec<Arc<dyn ScrapeCollector>>,
}

impl Exporter {
    pub fn new(registry: MetricsRegistry, collectors: Vec<Arc<dyn ScrapeCollector>>) -> Self {
        Self {
            registry,
            collectors,
        }
    }

    /// Build the connector and destination collectors against `registry`.
    pub fn with_sources(
        registry: MetricsRegistry,
        listers: Vec<Arc<dyn ConnectorLister>>,
        describers: Vec<Arc<dyn DestinationDescriber>>,
    ) -> Result<Self> {
        let connectors = ConnectorCollector::new(&registry, listers)
            .context("Failed to create connector collector")?;
        let destinations = DestinationCollector::new(&registry, describers)
            .context("Failed to create destination collector")?;

        Ok(Self::new(
            registry,
            vec![Arc::new(connectors), Arc::new(destinations)],
        ))
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Run every collector concurrently and return all samples once the
    /// last of them has finished.
    pub async fn scrape(&self) -> Vec<Sample> {
        let (tx, mut rx) = mpsc::unbounded_channel();

        join_all(self.collectors.iter().map(|collector| collector.collect(&tx))).await;
        drop(tx);

        let mut samples = Vec::new();
        while let Some(sample) = rx.recv().await {
            samples.push(sample);
        }
        debug!(samples = samples.len(), "Scrape complete");
        samples
    }

    /// Scrape and encode the result in the Prometheus text format.
    pub async fn render(&self) -> Result<String> {
        let families = gauge_families(self.scrape().await)?;
        self.registry.encode(families)
    }

    /// Content type of [`Exporter::render`] output.
    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }

    /// Unregister every collector's long-lived metrics.
    ///
    /// Failures are logged and do not stop the remaining collectors from
    /// being unregistered.
    pub fn shutdown(&self) {
        for collector in &self.collectors {
            match collector.unregister(&self.registry) {
                Ok(()) => info!(collector = collector.name(), "Collector unregistered"),
                Err(e) => warn!(
                    collector = collector.name(),
                    error = %format!("{:#}", e),
                    "Failed to unregister collector"
                ),
            }
        }
    }
}

/// Resolve each configured group name to its ID, in configured order.
///
/// Any failure is fatal: a misspelt group name must stop startup rather than
/// silently produce no metrics.
pub async fn resolve_groups(
    resolver: &dyn GroupResolver,
    group_names: &[String],
) -> Result<Vec<Group>> {
    let mut groups = Vec::with_capacity(group_names.len());
    for name in group_names {
        let id = resolver
            .resolve_name_to_id(name)
            .await
            .with_context(|| format!("Failed to resolve group '{}'", name))?;
        groups.push(Group {
            id,
            name: name.clone(),
        });
    }
    Ok(groups)
}

async fn build_resolver(
    kind: ResolverKind,
    lister: Arc<dyn GroupLister>,
) -> Result<Box<dyn GroupResolver>> {
    let resolver: Box<dyn GroupResolver> = match kind {
        ResolverKind::Static => Box::new(
            StaticResolver::new(lister.as_ref())
                .await
                .context("Failed to load groups")?,
        ),
        ResolverKind::Dynamic => Box::new(DynamicResolver::new(lister)),
    };
    Ok(resolver)
}

/// Startup sequence: client, resolver, group resolution, listers, collectors.
pub async fn build(config: &ExporterConfig) -> Result<Exporter> {
    let client = FivetranClient::with_base_url(
        &config.api_key,
        &config.api_secret,
        config.api_url.clone(),
        config.api_call_timeout,
    )
    .context("Failed to create Fivetran client")?;

    let group_lister: Arc<dyn GroupLister> = Arc::new(ApiGroupLister::new(client.clone()));
    let resolver = build_resolver(config.resolver, group_lister).await?;
    info!(resolver = ?config.resolver, "Group resolver ready");

    let groups = resolve_groups(resolver.as_ref(), &config.group_names).await?;

    let mut listers: Vec<Arc<dyn ConnectorLister>> = Vec::with_capacity(groups.len());
    let mut describers: Vec<Arc<dyn DestinationDescriber>> = Vec::with_capacity(groups.len());
    for group in groups {
        listers.push(Arc::new(ApiConnectorLister::new(
            client.clone(),
            group.id.clone(),
            group.name.clone(),
        )));
        describers.push(Arc::new(ApiDestinationDescriber::new(
            client.clone(),
            group.id,
            group.name,
        )));
    }
    info!(groups = listers.len(), "Listers created");

    Exporter::with_sources(MetricsRegistry::new(), listers, describers)
}
