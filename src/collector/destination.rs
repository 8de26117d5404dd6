//! `fivetran_destination_*` metrics.

use super::{GaugeFamily, SampleSink, ScrapeCollector, ScrapeFanOut};
use crate::destination::{Destination, DestinationDescriber};
use crate::metrics::{
    EnumGauge, EnumGaugeValue, GaugeDesc, MetricsRegistry, GAUGE_VALUE_PRESENT,
    PRESENT_GAUGE_VALUES,
};
use crate::status::SetupStatus;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub const SUBSYSTEM: &str = "destination";

const LABELS: &[&str] = &["group_name", "name"];
const INFO_LABELS: &[&str] = &["group_name", "group_id", "name", "id", "service"];

pub const SETUP_STATUS_CONNECTED: EnumGaugeValue = EnumGaugeValue::new("connected", 0);
pub const SETUP_STATUS_INCOMPLETE: EnumGaugeValue = EnumGaugeValue::new("incomplete", 1);
pub const SETUP_STATUS_BROKEN: EnumGaugeValue = EnumGaugeValue::new("broken", 2);
const SETUP_STATUS_VALUES: &[EnumGaugeValue] = &[
    SETUP_STATUS_CONNECTED,
    SETUP_STATUS_INCOMPLETE,
    SETUP_STATUS_BROKEN,
];

pub const SETUP_STATUS_GAUGE: EnumGauge =
    EnumGauge::new(SETUP_STATUS_VALUES, "Current setup status of a destination");
pub const INFO_GAUGE: EnumGauge =
    EnumGauge::new(PRESENT_GAUGE_VALUES, "Information about a destination");

pub fn setup_status_gauge_value(status: SetupStatus) -> EnumGaugeValue {
    match status {
        SetupStatus::Connected => SETUP_STATUS_CONNECTED,
        SetupStatus::Incomplete => SETUP_STATUS_INCOMPLETE,
        SetupStatus::Broken => SETUP_STATUS_BROKEN,
    }
}

fn labels(dest: &Destination) -> Vec<String> {
    vec![dest.group_name.clone(), dest.name.clone()]
}

fn info_labels(dest: &Destination) -> Vec<String> {
    vec![
        dest.group_name.clone(),
        dest.group_id.clone(),
        dest.name.clone(),
        dest.id.clone(),
        dest.service.clone(),
    ]
}

fn setup_status(dest: &Destination) -> f64 {
    setup_status_gauge_value(dest.setup_status).gauge_value()
}

fn info(_dest: &Destination) -> f64 {
    GAUGE_VALUE_PRESENT.gauge_value()
}

fn gauge_families() -> Vec<GaugeFamily<Destination>> {
    vec![
        GaugeFamily::new(
            GaugeDesc::new(SUBSYSTEM, "setup_status", SETUP_STATUS_GAUGE.describe(), LABELS),
            labels,
            setup_status,
        ),
        GaugeFamily::new(
            GaugeDesc::new(SUBSYSTEM, "info", INFO_GAUGE.describe(), INFO_LABELS),
            info_labels,
            info,
        ),
    ]
}

/// Collects the destination of every configured group on each scrape.
pub struct DestinationCollector {
    describers: Vec<Arc<dyn DestinationDescriber>>,
    fan_out: ScrapeFanOut<Destination>,
}

impl DestinationCollector {
    /// Registers `fivetran_destination_errors_total` in `registry`, zeroed for
    /// the group of every describer.
    pub fn new(
        registry: &MetricsRegistry,
        describers: Vec<Arc<dyn DestinationDescriber>>,
    ) -> Result<Self> {
        let group_names: Vec<&str> = describers.iter().map(|d| d.group_name()).collect();
        let fan_out = ScrapeFanOut::new(
            registry,
            SUBSYSTEM,
            "Total errors encountered querying destinations",
            gauge_families(),
            &group_names,
        )?;

        info!(groups = describers.len(), "Destination collector registered");
        Ok(Self {
            describers,
            fan_out,
        })
    }

    /// Current value of `fivetran_destination_errors_total` for `group_name`.
    pub fn errors_total(&self, group_name: &str) -> u64 {
        self.fan_out.errors_total(group_name)
    }

    pub fn gauge_descs(&self) -> impl Iterator<Item = &GaugeDesc> {
        self.fan_out.families().iter().map(GaugeFamily::desc)
    }
}

#[async_trait]
impl ScrapeCollector for DestinationCollector {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    async fn collect(&self, sink: &SampleSink) {
        let fetches = self.describers.iter().map(|describer| {
            let describer = Arc::clone(describer);
            let group_name = describer.group_name().to_string();
            (group_name, async move {
                describer.describe().await.map(|destination| vec![destination])
            })
        });
        self.fan_out.run(fetches, sink).await;
    }

    fn unregister(&self, registry: &MetricsRegistry) -> Result<()> {
        self.fan_out.unregister(registry)
    }
}
