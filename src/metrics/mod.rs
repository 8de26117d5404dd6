//! Metric building blocks shared by the collectors.
//!
//! - [`EnumGauge`]: the legal value space of a gauge, used to render help text
//! - [`GaugeDesc`] / [`Sample`]: per-scrape gauge samples sent by collectors
//! - [`MetricsRegistry`]: the long-lived registry holding the error counters

use anyhow::{Context, Result};
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const NAMESPACE: &str = "fivetran";

/// Label carried by the per-group error counters.
pub const GROUP_NAME_LABEL: &str = "group_name";

/// One named point in a gauge's value space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumGaugeValue {
    name: &'static str,
    value: i64,
}

impl EnumGaugeValue {
    pub const fn new(name: &'static str, value: i64) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn display_value(&self) -> i64 {
        self.value
    }

    pub fn gauge_value(&self) -> f64 {
        self.value as f64
    }
}

/// The ordered, closed value space of a gauge plus its description.
#[derive(Debug, Clone, Copy)]
pub struct EnumGauge {
    values: &'static [EnumGaugeValue],
    description: &'static str,
}

impl EnumGauge {
    pub const fn new(values: &'static [EnumGaugeValue], description: &'static str) -> Self {
        Self {
            values,
            description,
        }
    }

    pub fn values(&self) -> &'static [EnumGaugeValue] {
        self.values
    }

    /// Help text listing every legal value, e.g.
    /// `"Current setup state of a connector. Values: 0=connected, 1=incomplete, 2=broken"`.
    pub fn describe(&self) -> String {
        let values: Vec<String> = self
            .values
            .iter()
            .map(|v| format!("{}={}", v.display_value(), v.name()))
            .collect();
        format!("{}. Values: {}", self.description, values.join(", "))
    }
}

pub const GAUGE_VALUE_FALSE: EnumGaugeValue = EnumGaugeValue::new("false", 0);
pub const GAUGE_VALUE_TRUE: EnumGaugeValue = EnumGaugeValue::new("true", 1);
pub const BOOLEAN_GAUGE_VALUES: &[EnumGaugeValue] = &[GAUGE_VALUE_FALSE, GAUGE_VALUE_TRUE];

pub const GAUGE_VALUE_PRESENT: EnumGaugeValue = EnumGaugeValue::new("present", 1);
pub const PRESENT_GAUGE_VALUES: &[EnumGaugeValue] = &[GAUGE_VALUE_PRESENT];

pub fn boolean_gauge_value(flag: bool) -> EnumGaugeValue {
    if flag {
        GAUGE_VALUE_TRUE
    } else {
        GAUGE_VALUE_FALSE
    }
}

/// Name, help and label names of one gauge family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaugeDesc {
    fq_name: String,
    help: String,
    label_names: &'static [&'static str],
}

impl GaugeDesc {
    /// `fivetran_<subsystem>_<name>`.
    pub fn new(
        subsystem: &str,
        name: &str,
        help: impl Into<String>,
        label_names: &'static [&'static str],
    ) -> Self {
        Self {
            fq_name: format!("{}_{}_{}", NAMESPACE, subsystem, name),
            help: help.into(),
            label_names,
        }
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        self.label_names
    }
}

/// A single gauge observation produced during a scrape.
#[derive(Debug, Clone)]
pub struct Sample {
    pub desc: Arc<GaugeDesc>,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Sample {
    /// Value of the label called `name`, if the family has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .label_names
            .iter()
            .position(|label| *label == name)
            .and_then(|i| self.label_values.get(i))
            .map(String::as_str)
    }
}

/// Turn one scrape's samples into metric families.
///
/// Samples arrive in no particular order; they are grouped by family name
/// here. A later sample with an identical label set overwrites an earlier one.
pub fn gauge_families(samples: Vec<Sample>) -> Result<Vec<MetricFamily>> {
    let mut vecs: BTreeMap<String, GaugeVec> = BTreeMap::new();

    for sample in samples {
        let desc = &sample.desc;
        if !vecs.contains_key(desc.fq_name()) {
            let gauge_vec =
                GaugeVec::new(Opts::new(desc.fq_name(), desc.help()), desc.label_names())
                    .with_context(|| format!("Failed to create gauge '{}'", desc.fq_name()))?;
            vecs.insert(desc.fq_name().to_string(), gauge_vec);
        }
        let gauge_vec = &vecs[desc.fq_name()];

        let label_values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();
        gauge_vec
            .get_metric_with_label_values(&label_values)
            .with_context(|| format!("Failed to label gauge '{}'", desc.fq_name()))?
            .set(sample.value);
    }

    Ok(vecs.values().flat_map(|gauge_vec| gauge_vec.collect()).collect())
}

/// Long-lived metrics registry.
///
/// Collectors register their error counters here at construction and remove
/// them again with [`MetricsRegistry::unregister`] on shutdown. Cloning
/// shares the underlying registry.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Registry,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `fivetran_<subsystem>_errors_total{group_name}`.
    pub fn register_error_counter(&self, subsystem: &str, help: &str) -> Result<IntCounterVec> {
        let counter = IntCounterVec::new(
            Opts::new("errors_total", help)
                .namespace(NAMESPACE)
                .subsystem(subsystem),
            &[GROUP_NAME_LABEL],
        )
        .context("Failed to create error counter")?;

        self.registry
            .register(Box::new(counter.clone()))
            .with_context(|| format!("Failed to register {} error counter", subsystem))?;

        Ok(counter)
    }

    pub fn unregister(&self, counter: &IntCounterVec) -> Result<()> {
        self.registry
            .unregister(Box::new(counter.clone()))
            .context("Failed to unregister collector")
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Encode the registered metrics together with one scrape's families
    /// in the Prometheus text format.
    pub fn encode(&self, scraped: Vec<MetricFamily>) -> Result<String> {
        let mut families = self.gather();
        families.extend(scraped);
        families.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&families, &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Encoded metrics are not valid UTF-8")
    }
}
