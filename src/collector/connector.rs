//! `fivetran_connector_*` metrics.

use super::{GaugeFamily, SampleSink, ScrapeCollector, ScrapeFanOut};
use crate::connector::{Connector, ConnectorLister};
use crate::metrics::{
    boolean_gauge_value, EnumGauge, EnumGaugeValue, GaugeDesc, MetricsRegistry,
    BOOLEAN_GAUGE_VALUES, GAUGE_VALUE_PRESENT, PRESENT_GAUGE_VALUES,
};
use crate::status::{SetupState, SyncState, UpdateState};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub const SUBSYSTEM: &str = "connector";

const LABELS: &[&str] = &["group_name", "name"];
const INFO_LABELS: &[&str] = &["group_name", "group_id", "name", "id", "service"];

pub const SETUP_STATE_CONNECTED: EnumGaugeValue = EnumGaugeValue::new("connected", 0);
pub const SETUP_STATE_INCOMPLETE: EnumGaugeValue = EnumGaugeValue::new("incomplete", 1);
pub const SETUP_STATE_BROKEN: EnumGaugeValue = EnumGaugeValue::new("broken", 2);
const SETUP_STATE_VALUES: &[EnumGaugeValue] =
    &[SETUP_STATE_CONNECTED, SETUP_STATE_INCOMPLETE, SETUP_STATE_BROKEN];

pub const SYNC_STATE_SYNCING: EnumGaugeValue = EnumGaugeValue::new("syncing", 0);
pub const SYNC_STATE_SCHEDULED: EnumGaugeValue = EnumGaugeValue::new("scheduled", 1);
pub const SYNC_STATE_RESCHEDULED: EnumGaugeValue = EnumGaugeValue::new("rescheduled", 2);
pub const SYNC_STATE_PAUSED: EnumGaugeValue = EnumGaugeValue::new("paused", 3);
const SYNC_STATE_VALUES: &[EnumGaugeValue] = &[
    SYNC_STATE_SYNCING,
    SYNC_STATE_SCHEDULED,
    SYNC_STATE_RESCHEDULED,
    SYNC_STATE_PAUSED,
];

pub const UPDATE_STATE_ON_SCHEDULE: EnumGaugeValue = EnumGaugeValue::new("on_schedule", 0);
pub const UPDATE_STATE_DELAYED: EnumGaugeValue = EnumGaugeValue::new("delayed", 1);
const UPDATE_STATE_VALUES: &[EnumGaugeValue] = &[UPDATE_STATE_ON_SCHEDULE, UPDATE_STATE_DELAYED];

pub const PAUSED_GAUGE: EnumGauge =
    EnumGauge::new(BOOLEAN_GAUGE_VALUES, "Current paused state of a connector");
pub const SETUP_STATE_GAUGE: EnumGauge =
    EnumGauge::new(SETUP_STATE_VALUES, "Current setup state of a connector");
pub const SYNC_STATE_GAUGE: EnumGauge =
    EnumGauge::new(SYNC_STATE_VALUES, "Current sync state of a connector");
pub const UPDATE_STATE_GAUGE: EnumGauge =
    EnumGauge::new(UPDATE_STATE_VALUES, "Current update state of a connector");
pub const IN_HISTORICAL_SYNC_GAUGE: EnumGauge = EnumGauge::new(
    BOOLEAN_GAUGE_VALUES,
    "Whether or not a connector is currently performing a historical sync",
);
pub const INFO_GAUGE: EnumGauge =
    EnumGauge::new(PRESENT_GAUGE_VALUES, "Information about a connector");

pub fn setup_state_gauge_value(state: SetupState) -> EnumGaugeValue {
    match state {
        SetupState::Connected => SETUP_STATE_CONNECTED,
        SetupState::Incomplete => SETUP_STATE_INCOMPLETE,
        SetupState::Broken => SETUP_STATE_BROKEN,
    }
}

pub fn sync_state_gauge_value(state: SyncState) -> EnumGaugeValue {
    match state {
        SyncState::Syncing => SYNC_STATE_SYNCING,
        SyncState::Scheduled => SYNC_STATE_SCHEDULED,
        SyncState::Rescheduled => SYNC_STATE_RESCHEDULED,
        SyncState::Paused => SYNC_STATE_PAUSED,
    }
}

pub fn update_state_gauge_value(state: UpdateState) -> EnumGaugeValue {
    match state {
        UpdateState::OnSchedule => UPDATE_STATE_ON_SCHEDULE,
        UpdateState::Delayed => UPDATE_STATE_DELAYED,
    }
}

fn labels(conn: &Connector) -> Vec<String> {
    vec![conn.group_name.clone(), conn.name.clone()]
}

fn info_labels(conn: &Connector) -> Vec<String> {
    vec![
        conn.group_name.clone(),
        conn.group_id.clone(),
        conn.name.clone(),
        conn.id.clone(),
        conn.service.clone(),
    ]
}

fn paused(conn: &Connector) -> f64 {
    boolean_gauge_value(conn.paused).gauge_value()
}

fn setup_state(conn: &Connector) -> f64 {
    setup_state_gauge_value(conn.setup_state).gauge_value()
}

fn sync_state(conn: &Connector) -> f64 {
    sync_state_gauge_value(conn.sync_state).gauge_value()
}

fn update_state(conn: &Connector) -> f64 {
    update_state_gauge_value(conn.update_state).gauge_value()
}

fn info(_conn: &Connector) -> f64 {
    GAUGE_VALUE_PRESENT.gauge_value()
}

/// The API reports minutes; Prometheus convention is seconds.
fn sync_frequency_seconds(conn: &Connector) -> f64 {
    conn.sync_frequency_mins as f64 * 60.0
}

fn task_count(conn: &Connector) -> f64 {
    conn.task_count as f64
}

fn warning_count(conn: &Connector) -> f64 {
    conn.warning_count as f64
}

fn in_historical_sync(conn: &Connector) -> f64 {
    boolean_gauge_value(conn.is_historical_sync).gauge_value()
}

fn gauge_families() -> Vec<GaugeFamily<Connector>> {
    let family = |name: &str,
                  help: String,
                  labels_fn: fn(&Connector) -> Vec<String>,
                  value_fn: fn(&Connector) -> f64| {
        GaugeFamily::new(GaugeDesc::new(SUBSYSTEM, name, help, LABELS), labels_fn, value_fn)
    };

    vec![
        family("paused", PAUSED_GAUGE.describe(), labels, paused),
        family("setup_state", SETUP_STATE_GAUGE.describe(), labels, setup_state),
        family("sync_state", SYNC_STATE_GAUGE.describe(), labels, sync_state),
        family("update_state", UPDATE_STATE_GAUGE.describe(), labels, update_state),
        GaugeFamily::new(
            GaugeDesc::new(SUBSYSTEM, "info", INFO_GAUGE.describe(), INFO_LABELS),
            info_labels,
            info,
        ),
        family(
            "sync_frequency_seconds",
            "Current sync frequency of a connector".to_string(),
            labels,
            sync_frequency_seconds,
        ),
        // TODO: task and warning counts could be exported as counters by
        // remembering the previous scrape's count per connector.
        family(
            "task_count",
            "Number of outstanding tasks for a connector".to_string(),
            labels,
            task_count,
        ),
        family(
            "warning_count",
            "Number of current warnings for a connector".to_string(),
            labels,
            warning_count,
        ),
        family(
            "in_historical_sync",
            IN_HISTORICAL_SYNC_GAUGE.describe(),
            labels,
            in_historical_sync,
        ),
    ]
}

/// Collects every connector of every configured group on each scrape.
pub struct ConnectorCollector {
    listers: Vec<Arc<dyn ConnectorLister>>,
    fan_out: ScrapeFanOut<Connector>,
}

impl ConnectorCollector {
    /// Registers `fivetran_connector_errors_total` in `registry`, zeroed for
    /// the group of every lister.
    pub fn new(registry: &MetricsRegistry, listers: Vec<Arc<dyn ConnectorLister>>) -> Result<Self> {
        let group_names: Vec<&str> = listers.iter().map(|lister| lister.group_name()).collect();
        let fan_out = ScrapeFanOut::new(
            registry,
            SUBSYSTEM,
            "Total errors encountered querying connectors",
            gauge_families(),
            &group_names,
        )?;

        info!(groups = listers.len(), "Connector collector registered");
        Ok(Self { listers, fan_out })
    }

    /// Current value of `fivetran_connector_errors_total` for `group_name`.
    pub fn errors_total(&self, group_name: &str) -> u64 {
        self.fan_out.errors_total(group_name)
    }

    pub fn gauge_descs(&self) -> impl Iterator<Item = &GaugeDesc> {
        self.fan_out.families().iter().map(GaugeFamily::desc)
    }
}

#[async_trait]
impl ScrapeCollector for ConnectorCollector {
    fn name(&self) -> &'static str {
        SUBSYSTEM
    }

    async fn collect(&self, sink: &SampleSink) {
        let fetches = self.listers.iter().map(|lister| {
            let lister = Arc::clone(lister);
            let group_name = lister.group_name().to_string();
            (group_name, async move { lister.list().await })
        });
        self.fan_out.run(fetches, sink).await;
    }

    fn unregister(&self, registry: &MetricsRegistry) -> Result<()> {
        self.fan_out.unregister(registry)
    }
}
