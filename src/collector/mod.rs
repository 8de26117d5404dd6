//! Scrape-time collection.
//!
//! Every scrape fans out twice:
//!
//! ```text
//! collect()
//!   ├─ group task (one per configured group) ── list()/describe()
//!   │    ├─ gauge task (one per gauge family) ── one sample per entity
//!   │    └─ ...
//!   └─ ...
//! ```
//!
//! A group task that fails bumps that group's `errors_total` counter and
//! emits nothing; the other groups are unaffected. `collect()` returns once
//! every group task, and every gauge task under it, has finished.

pub mod connector;
pub mod destination;

#[cfg(test)]
mod tests;

pub use connector::ConnectorCollector;
pub use destination::DestinationCollector;

use crate::metrics::{GaugeDesc, MetricsRegistry, Sample};
use anyhow::Result;
use async_trait::async_trait;
use prometheus::IntCounterVec;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Shared output channel for samples. Safe for any number of concurrent senders.
pub type SampleSink = mpsc::UnboundedSender<Sample>;

/// A set of gauge families refreshed on every scrape.
#[async_trait]
pub trait ScrapeCollector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one scrape, sending every sample to `sink`. Never fails as a
    /// whole; per-group failures are counted instead.
    async fn collect(&self, sink: &SampleSink);

    /// Remove this collector's long-lived metrics from `registry`.
    fn unregister(&self, registry: &MetricsRegistry) -> Result<()>;
}

/// One gauge family over entities of type `E`.
pub struct GaugeFamily<E> {
    desc: Arc<GaugeDesc>,
    labels: fn(&E) -> Vec<String>,
    value: fn(&E) -> f64,
}

impl<E> GaugeFamily<E> {
    pub fn new(desc: GaugeDesc, labels: fn(&E) -> Vec<String>, value: fn(&E) -> f64) -> Self {
        Self {
            desc: Arc::new(desc),
            labels,
            value,
        }
    }

    pub fn desc(&self) -> &GaugeDesc {
        &self.desc
    }

    pub fn sample(&self, entity: &E) -> Sample {
        Sample {
            desc: Arc::clone(&self.desc),
            label_values: (self.labels)(entity),
            value: (self.value)(entity),
        }
    }
}

// Manual impl: a derive would needlessly require `E: Clone`.
impl<E> Clone for GaugeFamily<E> {
    fn clone(&self) -> Self {
        Self {
            desc: Arc::clone(&self.desc),
            labels: self.labels,
            value: self.value,
        }
    }
}

/// The two-level fan-out shared by the connector and destination collectors.
pub(crate) struct ScrapeFanOut<E> {
    subsystem: &'static str,
    families: Arc<[GaugeFamily<E>]>,
    errors_total: IntCounterVec,
    group_names: HashSet<String>,
}

impl<E: Send + Sync + 'static> ScrapeFanOut<E> {
    /// Registers the subsystem's error counter and initializes it to zero for
    /// every group, so its label set is stable from the first scrape.
    pub(crate) fn new(
        registry: &MetricsRegistry,
        subsystem: &'static str,
        error_help: &str,
        families: Vec<GaugeFamily<E>>,
        group_names: &[&str],
    ) -> Result<Self> {
        let errors_total = registry.register_error_counter(subsystem, error_help)?;
        for group_name in group_names {
            errors_total.with_label_values(&[*group_name]).reset();
        }

        Ok(Self {
            subsystem,
            families: Arc::from(families),
            errors_total,
            group_names: group_names.iter().map(|name| name.to_string()).collect(),
        })
    }

    pub(crate) fn families(&self) -> &[GaugeFamily<E>] {
        &self.families
    }

    /// Counter value for a configured group; 0 for any other name.
    ///
    /// Unknown names are never looked up, since that would add a series.
    pub(crate) fn errors_total(&self, group_name: &str) -> u64 {
        if !self.group_names.contains(group_name) {
            return 0;
        }
        self.errors_total
            .get_metric_with_label_values(&[group_name])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    pub(crate) fn unregister(&self, registry: &MetricsRegistry) -> Result<()> {
        registry.unregister(&self.errors_total)
    }

    /// Run one fetch per group concurrently and emit samples for every
    /// group whose fetch succeeds.
    pub(crate) async fn run<F>(
        &self,
        fetches: impl IntoIterator<Item = (String, F)>,
        sink: &SampleSink,
    ) where
        F: Future<Output = Result<Vec<E>>> + Send + 'static,
    {
        let mut groups = JoinSet::new();
        for (group_name, fetch) in fetches {
            let subsystem = self.subsystem;
            let families = Arc::clone(&self.families);
            let errors_total = self.errors_total.clone();
            let sink = sink.clone();

            groups.spawn(async move {
                match fetch.await {
                    Ok(entities) => {
                        debug!(
                            subsystem,
                            group_name = %group_name,
                            count = entities.len(),
                            "Fetched group"
                        );
                        emit_samples(subsystem, &group_name, Arc::new(entities), families, sink)
                            .await;
                    }
                    Err(e) => {
                        errors_total.with_label_values(&[group_name.as_str()]).inc();
                        warn!(
                            subsystem,
                            group_name = %group_name,
                            error = %format!("{:#}", e),
                            "Collecting group failed"
                        );
                    }
                }
            });
        }

        while let Some(result) = groups.join_next().await {
            if let Err(e) = result {
                error!(subsystem = self.subsystem, error = %e, "Group collection task failed");
            }
        }
    }
}

/// Spawn one task per gauge family and wait for all of them.
async fn emit_samples<E: Send + Sync + 'static>(
    subsystem: &'static str,
    group_name: &str,
    entities: Arc<Vec<E>>,
    families: Arc<[GaugeFamily<E>]>,
    sink: SampleSink,
) {
    let mut tasks = JoinSet::new();
    for family in families.iter().cloned() {
        let entities = Arc::clone(&entities);
        let sink = sink.clone();
        tasks.spawn(async move {
            for entity in entities.iter() {
                // The receiver only goes away if the scrape was abandoned.
                if sink.send(family.sample(entity)).is_err() {
                    return;
                }
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            error!(
                subsystem,
                group_name = %group_name,
                error = %e,
                "Gauge emission task failed"
            );
        }
    }
}
