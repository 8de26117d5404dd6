use super::*;
use crate::connector::{Connector, ConnectorLister};
use crate::destination::{Destination, DestinationDescriber};
use crate::status::{SetupState, SetupStatus, SyncState, UpdateState};
use anyhow::anyhow;
use std::collections::HashSet;

struct FakeConnectorLister {
    group_id: String,
    group_name: String,
    connectors: Option<Vec<Connector>>,
}

impl FakeConnectorLister {
    fn ok(group_id: &str, group_name: &str, connectors: Vec<Connector>) -> Arc<dyn ConnectorLister> {
        Arc::new(Self {
            group_id: group_id.to_string(),
            group_name: group_name.to_string(),
            connectors: Some(connectors),
        })
    }

    fn failing(group_id: &str, group_name: &str) -> Arc<dyn ConnectorLister> {
        Arc::new(Self {
            group_id: group_id.to_string(),
            group_name: group_name.to_string(),
            connectors: None,
        })
    }
}

#[async_trait]
impl ConnectorLister for FakeConnectorLister {
    async fn list(&self) -> Result<Vec<Connector>> {
        self.connectors
            .clone()
            .ok_or_else(|| anyhow!("connection refused"))
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn group_name(&self) -> &str {
        &self.group_name
    }
}

struct FakeDestinationDescriber {
    group_id: String,
    group_name: String,
    destination: Option<Destination>,
}

#[async_trait]
impl DestinationDescriber for FakeDestinationDescriber {
    async fn describe(&self) -> Result<Destination> {
        self.destination
            .clone()
            .ok_or_else(|| anyhow!("received response code 'NotFound_Destination'"))
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn group_name(&self) -> &str {
        &self.group_name
    }
}

fn connector(group_id: &str, group_name: &str, name: &str) -> Connector {
    Connector {
        id: format!("{}_id", name),
        name: name.to_string(),
        group_id: group_id.to_string(),
        group_name: group_name.to_string(),
        service: "salesforce".to_string(),
        paused: false,
        is_historical_sync: false,
        sync_frequency_mins: 360,
        task_count: 1,
        warning_count: 0,
        setup_state: SetupState::Broken,
        sync_state: SyncState::Rescheduled,
        update_state: UpdateState::Delayed,
    }
}

async fn scrape(collector: &dyn ScrapeCollector) -> Vec<Sample> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    collector.collect(&tx).await;
    drop(tx);

    let mut samples = Vec::new();
    while let Some(sample) = rx.recv().await {
        samples.push(sample);
    }
    samples
}

fn find<'a>(samples: &'a [Sample], family: &str, name: &str) -> &'a Sample {
    samples
        .iter()
        .find(|s| s.desc.fq_name() == family && s.label("name") == Some(name))
        .unwrap_or_else(|| panic!("no {} sample for {}", family, name))
}

#[tokio::test]
async fn test_connector_collector_emits_every_gauge() {
    let registry = MetricsRegistry::new();
    let collector = ConnectorCollector::new(
        &registry,
        vec![FakeConnectorLister::ok(
            "projected_sickle",
            "Staging",
            vec![connector("projected_sickle", "Staging", "salesforce")],
        )],
    )
    .unwrap();

    let samples = scrape(&collector).await;

    // One sample per gauge family for the single connector.
    assert_eq!(samples.len(), 9);
    let families: HashSet<&str> = samples.iter().map(|s| s.desc.fq_name()).collect();
    let expected: HashSet<&str> = collector.gauge_descs().map(GaugeDesc::fq_name).collect();
    assert_eq!(families, expected);
    assert!(families.contains("fivetran_connector_in_historical_sync"));

    assert_eq!(find(&samples, "fivetran_connector_paused", "salesforce").value, 0.0);
    assert_eq!(find(&samples, "fivetran_connector_setup_state", "salesforce").value, 2.0);
    assert_eq!(find(&samples, "fivetran_connector_sync_state", "salesforce").value, 2.0);
    assert_eq!(find(&samples, "fivetran_connector_update_state", "salesforce").value, 1.0);
    assert_eq!(
        find(&samples, "fivetran_connector_sync_frequency_seconds", "salesforce").value,
        21600.0
    );
    assert_eq!(find(&samples, "fivetran_connector_task_count", "salesforce").value, 1.0);
    assert_eq!(find(&samples, "fivetran_connector_warning_count", "salesforce").value, 0.0);
    assert_eq!(
        find(&samples, "fivetran_connector_in_historical_sync", "salesforce").value,
        0.0
    );

    let info = find(&samples, "fivetran_connector_info", "salesforce");
    assert_eq!(info.value, 1.0);
    assert_eq!(
        info.label_values,
        vec!["Staging", "projected_sickle", "salesforce", "salesforce_id", "salesforce"]
    );

    let paused = find(&samples, "fivetran_connector_paused", "salesforce");
    assert_eq!(paused.label_values, vec!["Staging", "salesforce"]);
}

#[tokio::test]
async fn test_historical_sync_reads_its_own_flag() {
    let registry = MetricsRegistry::new();
    let mut conn = connector("projected_sickle", "Staging", "salesforce");
    conn.paused = false;
    conn.is_historical_sync = true;
    let collector = ConnectorCollector::new(
        &registry,
        vec![FakeConnectorLister::ok("projected_sickle", "Staging", vec![conn])],
    )
    .unwrap();

    let samples = scrape(&collector).await;

    assert_eq!(find(&samples, "fivetran_connector_paused", "salesforce").value, 0.0);
    assert_eq!(
        find(&samples, "fivetran_connector_in_historical_sync", "salesforce").value,
        1.0
    );
}

#[tokio::test]
async fn test_failing_group_is_isolated() {
    let registry = MetricsRegistry::new();
    let collector = ConnectorCollector::new(
        &registry,
        vec![
            FakeConnectorLister::ok(
                "projected_sickle",
                "Staging",
                vec![
                    connector("projected_sickle", "Staging", "salesforce"),
                    connector("projected_sickle", "Staging", "adwords"),
                ],
            ),
            FakeConnectorLister::failing("schoolmaster_heedless", "Production"),
            FakeConnectorLister::ok(
                "decent_dropsy",
                "Warehouse",
                vec![connector("decent_dropsy", "Warehouse", "hubspot")],
            ),
        ],
    )
    .unwrap();

    // Counters exist at zero before the first scrape.
    for group in ["Staging", "Production", "Warehouse"] {
        assert_eq!(collector.errors_total(group), 0);
    }

    let samples = scrape(&collector).await;

    assert_eq!(collector.errors_total("Production"), 1);
    assert_eq!(collector.errors_total("Staging"), 0);
    assert_eq!(collector.errors_total("Warehouse"), 0);

    // 3 healthy connectors × 9 gauges, nothing from the failing group.
    assert_eq!(samples.len(), 27);
    assert!(samples.iter().all(|s| s.label("group_name") != Some("Production")));
    let groups: HashSet<&str> = samples.iter().filter_map(|s| s.label("group_name")).collect();
    assert_eq!(groups, HashSet::from(["Staging", "Warehouse"]));

    // The counter persists and keeps counting across scrapes.
    scrape(&collector).await;
    assert_eq!(collector.errors_total("Production"), 2);
}

#[tokio::test]
async fn test_huge_sync_frequency_does_not_overflow() {
    let registry = MetricsRegistry::new();
    let mut conn = connector("projected_sickle", "Staging", "salesforce");
    conn.sync_frequency_mins = i64::MAX;
    let collector = ConnectorCollector::new(
        &registry,
        vec![FakeConnectorLister::ok("projected_sickle", "Staging", vec![conn])],
    )
    .unwrap();

    let samples = scrape(&collector).await;

    let value = find(&samples, "fivetran_connector_sync_frequency_seconds", "salesforce").value;
    assert_eq!(value, i64::MAX as f64 * 60.0);
}

#[test]
fn test_errors_total_lookup_keeps_label_set() {
    let registry = MetricsRegistry::new();
    let collector = ConnectorCollector::new(
        &registry,
        vec![FakeConnectorLister::failing("projected_sickle", "Staging")],
    )
    .unwrap();

    assert_eq!(collector.errors_total("Stagng"), 0);

    let families = registry.gather();
    assert_eq!(families.len(), 1);
    let labels: Vec<&str> = families[0]
        .get_metric()
        .iter()
        .map(|metric| metric.get_label()[0].get_value())
        .collect();
    assert_eq!(labels, vec!["Staging"]);
}

#[tokio::test]
async fn test_empty_group_emits_nothing_and_counts_no_error() {
    let registry = MetricsRegistry::new();
    let collector = ConnectorCollector::new(
        &registry,
        vec![FakeConnectorLister::ok("projected_sickle", "Staging", vec![])],
    )
    .unwrap();

    assert!(scrape(&collector).await.is_empty());
    assert_eq!(collector.errors_total("Staging"), 0);
}

#[tokio::test]
async fn test_destination_collector() {
    let registry = MetricsRegistry::new();
    let describers: Vec<Arc<dyn DestinationDescriber>> = vec![
        Arc::new(FakeDestinationDescriber {
            group_id: "decent_dropsy".to_string(),
            group_name: "Warehouse".to_string(),
            destination: Some(Destination {
                id: "decent_dropsy".to_string(),
                name: "Warehouse".to_string(),
                group_id: "decent_dropsy".to_string(),
                group_name: "Warehouse".to_string(),
                service: "snowflake".to_string(),
                setup_status: SetupStatus::Incomplete,
            }),
        }),
        Arc::new(FakeDestinationDescriber {
            group_id: "projected_sickle".to_string(),
            group_name: "Staging".to_string(),
            destination: None,
        }),
    ];
    let collector = DestinationCollector::new(&registry, describers).unwrap();

    let samples = scrape(&collector).await;

    assert_eq!(samples.len(), 2);
    assert_eq!(
        find(&samples, "fivetran_destination_setup_status", "Warehouse").value,
        1.0
    );
    let info = find(&samples, "fivetran_destination_info", "Warehouse");
    assert_eq!(info.label("service"), Some("snowflake"));
    assert_eq!(info.label("group_id"), Some("decent_dropsy"));

    assert_eq!(collector.errors_total("Staging"), 1);
    assert_eq!(collector.errors_total("Warehouse"), 0);
}

#[test]
fn test_gauge_value_tables() {
    use super::connector::{
        setup_state_gauge_value, sync_state_gauge_value, update_state_gauge_value,
        SETUP_STATE_GAUGE, SYNC_STATE_GAUGE,
    };
    use super::destination::setup_status_gauge_value;

    assert_eq!(setup_state_gauge_value(SetupState::Connected).gauge_value(), 0.0);
    assert_eq!(setup_state_gauge_value(SetupState::Incomplete).gauge_value(), 1.0);
    assert_eq!(setup_state_gauge_value(SetupState::Broken).gauge_value(), 2.0);

    assert_eq!(sync_state_gauge_value(SyncState::Syncing).gauge_value(), 0.0);
    assert_eq!(sync_state_gauge_value(SyncState::Scheduled).gauge_value(), 1.0);
    assert_eq!(sync_state_gauge_value(SyncState::Rescheduled).gauge_value(), 2.0);
    assert_eq!(sync_state_gauge_value(SyncState::Paused).gauge_value(), 3.0);

    assert_eq!(update_state_gauge_value(UpdateState::OnSchedule).gauge_value(), 0.0);
    assert_eq!(update_state_gauge_value(UpdateState::Delayed).gauge_value(), 1.0);

    assert_eq!(setup_status_gauge_value(SetupStatus::Broken).gauge_value(), 2.0);

    assert_eq!(
        SETUP_STATE_GAUGE.describe(),
        "Current setup state of a connector. Values: 0=connected, 1=incomplete, 2=broken"
    );
    assert_eq!(
        SYNC_STATE_GAUGE.describe(),
        "Current sync state of a connector. Values: 0=syncing, 1=scheduled, 2=rescheduled, 3=paused"
    );
}

#[test]
fn test_collectors_register_and_unregister_error_counters() {
    let registry = MetricsRegistry::new();
    let connectors = ConnectorCollector::new(
        &registry,
        vec![FakeConnectorLister::ok("projected_sickle", "Staging", vec![])],
    )
    .unwrap();
    let destinations = DestinationCollector::new(&registry, vec![]).unwrap();

    let names: Vec<String> = registry
        .gather()
        .iter()
        .map(|family| family.get_name().to_string())
        .collect();
    // The destination counter has no groups, so it has no series to gather.
    assert_eq!(names, vec!["fivetran_connector_errors_total"]);

    // A second collector for the same subsystem cannot share the registry.
    assert!(ConnectorCollector::new(&registry, vec![]).is_err());

    connectors.unregister(&registry).unwrap();
    destinations.unregister(&registry).unwrap();
    assert!(registry.gather().is_empty());
    assert_eq!(connectors.name(), "connector");
    assert_eq!(destinations.name(), "destination");
}
