//! Sync pass orchestration
//!
//! One pass reads every record source in order (items, then devices),
//! normalizes and classifies each record, and publishes the devices whose
//! last-update marker changed. State for a device name is shared across
//! sources, so a name present in both is published twice and the later
//! source's values are what remain recorded.

use crate::domain::record::RawDeviceRecord;
use crate::domain::types::{Reading, Zone};
use crate::infra::error::SourceReadError;
use crate::infra::metrics::Metrics;
use crate::io::cache::RecordSource;
use crate::io::discovery::DiscoveryMessage;
use crate::io::publisher::Publisher;
use crate::services::change_detector::ChangeDetector;
use crate::services::classifier::classify;
use crate::services::identity::device_id;
use crate::services::normalizer::normalize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Outcome counts of a single pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub published: usize,
    pub suppressed: usize,
    pub skipped: usize,
}

/// Drives sync passes over the configured sources
///
/// Owns the zone list and the change detector. Passes take `&mut self`, so
/// two passes can never interleave.
pub struct SyncOrchestrator<P: Publisher> {
    zones: Vec<Zone>,
    detector: ChangeDetector,
    sources: Vec<Box<dyn RecordSource>>,
    publisher: P,
    metrics: Arc<Metrics>,
}

impl<P: Publisher> SyncOrchestrator<P> {
    pub fn new(
        zones: Vec<Zone>,
        sources: Vec<Box<dyn RecordSource>>,
        publisher: P,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { zones, detector: ChangeDetector::new(), sources, publisher, metrics }
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Whether zones were configured locally (state carries the zone label)
    pub fn has_manual_zones(&self) -> bool {
        !self.zones.is_empty()
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Run one pass over all sources
    ///
    /// A source that cannot be read aborts the rest of the pass. Devices
    /// already published in this pass keep their recorded state.
    pub async fn run_pass(&mut self, force_sync: bool) -> Result<PassSummary, SourceReadError> {
        let started = Instant::now();
        let mut summary = PassSummary::default();

        let result = self.sync_sources(force_sync, &mut summary).await;

        let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.metrics.record_pass(duration_us, result.is_err());
        result.map(|()| summary)
    }

    async fn sync_sources(&mut self, force_sync: bool, summary: &mut PassSummary) -> Result<(), SourceReadError> {
        for index in 0..self.sources.len() {
            let records = self.sources[index].load()?;
            debug!(source = %self.sources[index].name(), records = records.len(), "source_loaded");

            for raw in &records {
                self.sync_record(raw, force_sync, summary).await;
            }
        }
        Ok(())
    }

    async fn sync_record(&mut self, raw: &RawDeviceRecord, force_sync: bool, summary: &mut PassSummary) {
        let Some(name) = raw.name.as_deref() else {
            warn!("record_without_name");
            self.metrics.record_skipped();
            summary.skipped += 1;
            return;
        };

        let snapshot = normalize(name, raw);
        let zone_label: Reading<String> = snapshot
            .position
            .as_ref()
            .map(|p| classify(p.latitude, p.longitude, &self.zones).to_string())
            .into();
        let last_update = snapshot.last_update();

        if !self.detector.should_publish(name, &last_update, force_sync) {
            self.metrics.record_suppressed();
            summary.suppressed += 1;
            return;
        }

        let device_id = device_id(name);
        let message = DiscoveryMessage::build(&snapshot, &device_id, &zone_label, self.has_manual_zones());
        self.publish(&message).await;

        debug!(device_id = %device_id, zone = %zone_label, last_update = %last_update, "device_published");
        self.detector.record(name, last_update, zone_label, device_id);
        self.metrics.record_published();
        summary.published += 1;
    }

    async fn publish(&self, message: &DiscoveryMessage) {
        let publications = match message.publications() {
            Ok(publications) => publications,
            Err(e) => {
                warn!(topic = %message.topic_base, error = %e, "payload_serialization_failed");
                self.metrics.record_publish_error();
                return;
            }
        };
        for publication in publications {
            let topic = publication.topic.clone();
            if let Err(e) = self.publisher.publish(publication).await {
                warn!(topic = %topic, error = %e, "publish_failed");
                self.metrics.record_publish_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::publisher::Publication;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    /// Source whose records can be swapped between passes
    struct MemorySource {
        name: &'static str,
        records: Arc<Mutex<Option<Vec<Value>>>>,
    }

    impl MemorySource {
        fn new(name: &'static str, records: Vec<Value>) -> (Self, Arc<Mutex<Option<Vec<Value>>>>) {
            let records = Arc::new(Mutex::new(Some(records)));
            (Self { name, records: records.clone() }, records)
        }
    }

    impl RecordSource for MemorySource {
        fn name(&self) -> &'static str {
            self.name
        }

        fn load(&self) -> Result<Vec<RawDeviceRecord>, SourceReadError> {
            match self.records.lock().as_ref() {
                Some(records) => Ok(records
                    .iter()
                    .map(|v| RawDeviceRecord::from_value(v.clone()).unwrap())
                    .collect()),
                None => Err(SourceReadError::NotAList {
                    source_name: self.name,
                    path: format!("/memory/{}", self.name).into(),
                }),
            }
        }
    }

    #[derive(Default, Clone)]
    struct RecordingPublisher {
        published: Arc<Mutex<Vec<Publication>>>,
    }

    impl RecordingPublisher {
        fn take(&self) -> Vec<Publication> {
            std::mem::take(&mut *self.published.lock())
        }
    }

    #[async_trait]
    impl Publisher for RecordingPublisher {
        async fn publish(&self, publication: Publication) -> anyhow::Result<()> {
            self.published.lock().push(publication);
            Ok(())
        }
    }

    struct BrokenPublisher;

    #[async_trait]
    impl Publisher for BrokenPublisher {
        async fn publish(&self, _publication: Publication) -> anyhow::Result<()> {
            anyhow::bail!("connection lost")
        }
    }

    fn device(name: &str, latitude: f64, longitude: f64, timestamp: i64) -> Value {
        json!({
            "name": name,
            "batteryStatus": 1,
            "location": {
                "latitude": latitude,
                "longitude": longitude,
                "horizontalAccuracy": 3.0,
                "verticalAccuracy": 4.0,
                "positionType": "crowdsourced",
                "timeStamp": timestamp
            },
            "address": null
        })
    }

    fn two_zones() -> Vec<Zone> {
        vec![Zone::new("A", 52.0, 13.0, Some(70)), Zone::new("B", 48.0, 11.0, Some(70))]
    }

    fn states(published: &[Publication]) -> Vec<&str> {
        published.iter().filter(|p| p.topic.ends_with("/state")).map(|p| p.payload.as_str()).collect()
    }

    fn orchestrator(
        zones: Vec<Zone>,
        items: Vec<Value>,
        devices: Vec<Value>,
    ) -> (
        SyncOrchestrator<RecordingPublisher>,
        RecordingPublisher,
        Arc<Mutex<Option<Vec<Value>>>>,
        Arc<Mutex<Option<Vec<Value>>>>,
    ) {
        let (items_source, items) = MemorySource::new("items", items);
        let (devices_source, devices) = MemorySource::new("devices", devices);
        let publisher = RecordingPublisher::default();
        let sync = SyncOrchestrator::new(
            zones,
            vec![Box::new(items_source), Box::new(devices_source)],
            publisher.clone(),
            Arc::new(Metrics::new()),
        );
        (sync, publisher, items, devices)
    }

    #[tokio::test]
    async fn test_device_moves_between_zones() {
        let (mut sync, publisher, items, _) =
            orchestrator(two_zones(), vec![device("Keys", 52.0001, 13.0001, 1000)], vec![]);

        let summary = sync.run_pass(false).await.unwrap();
        assert_eq!(summary.published, 1);
        assert_eq!(states(&publisher.take()), vec!["A"]);

        *items.lock() = Some(vec![device("Keys", 48.0002, 11.0002, 2000)]);
        sync.run_pass(false).await.unwrap();
        assert_eq!(states(&publisher.take()), vec!["B"]);

        let summary = sync.run_pass(false).await.unwrap();
        assert_eq!(summary, PassSummary { published: 0, suppressed: 1, skipped: 0 });
        assert!(publisher.take().is_empty());
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let records = vec![device("Keys", 52.0, 13.0, 1000), device("Bag", 40.0, 2.0, 1000)];
        let (mut sync, publisher, _, _) = orchestrator(two_zones(), records.clone(), records);

        sync.run_pass(false).await.unwrap();
        assert!(!publisher.take().is_empty());

        let summary = sync.run_pass(false).await.unwrap();
        assert_eq!(summary.published, 0);
        assert_eq!(summary.suppressed, 4);
        assert!(publisher.take().is_empty());
    }

    #[tokio::test]
    async fn test_force_sync_republishes() {
        let (mut sync, publisher, _, _) = orchestrator(vec![], vec![device("Keys", 52.0, 13.0, 1000)], vec![]);

        sync.run_pass(true).await.unwrap();
        sync.run_pass(true).await.unwrap();

        assert_eq!(publisher.take().len(), 6);
    }

    #[tokio::test]
    async fn test_publishes_config_attributes_state() {
        let (mut sync, publisher, _, _) = orchestrator(two_zones(), vec![device("My Keys", 52.0, 13.0, 1000)], vec![]);

        sync.run_pass(false).await.unwrap();
        let published = publisher.take();
        let topics: Vec<_> = published.iter().map(|p| p.topic.as_str()).collect();

        assert_eq!(
            topics,
            vec![
                "homeassistant/device_tracker/findmy_my_keys/config",
                "homeassistant/device_tracker/findmy_my_keys/attributes",
                "homeassistant/device_tracker/findmy_my_keys/state",
            ]
        );
        assert!(published.iter().all(|p| p.retain));
    }

    #[tokio::test]
    async fn test_without_zones_state_is_reset() {
        let (mut sync, publisher, _, _) = orchestrator(vec![], vec![device("Keys", 52.0, 13.0, 1000)], vec![]);

        sync.run_pass(false).await.unwrap();

        assert_eq!(states(&publisher.take()), vec!["reset"]);
        let state = sync.detector().get("Keys").unwrap();
        assert_eq!(state.zone_label, Reading::Known("not_home".to_string()));
    }

    #[tokio::test]
    async fn test_outside_all_zones_is_not_home() {
        let (mut sync, publisher, _, _) = orchestrator(two_zones(), vec![device("Keys", 10.0, 10.0, 1000)], vec![]);

        sync.run_pass(false).await.unwrap();

        assert_eq!(states(&publisher.take()), vec!["not_home"]);
    }

    #[tokio::test]
    async fn test_location_lost_publishes_unknown() {
        let (mut sync, publisher, items, _) =
            orchestrator(two_zones(), vec![device("Keys", 52.0, 13.0, 1000)], vec![]);
        sync.run_pass(false).await.unwrap();
        publisher.take();

        *items.lock() = Some(vec![json!({"name": "Keys", "batteryStatus": 1, "location": null})]);
        let summary = sync.run_pass(false).await.unwrap();

        assert_eq!(summary.published, 1);
        assert_eq!(states(&publisher.take()), vec!["unknown"]);
        assert_eq!(sync.detector().get("Keys").unwrap().last_update, Reading::Unknown);
    }

    #[tokio::test]
    async fn test_same_name_in_both_sources_last_writer_wins() {
        let (mut sync, publisher, _, _) = orchestrator(
            two_zones(),
            vec![device("Keys", 52.0, 13.0, 1000)],
            vec![device("Keys", 48.0, 11.0, 2000)],
        );

        let summary = sync.run_pass(false).await.unwrap();

        assert_eq!(summary.published, 2);
        assert_eq!(states(&publisher.take()), vec!["A", "B"]);
        let state = sync.detector().get("Keys").unwrap();
        assert_eq!(state.last_update, Reading::Known(2000));
        assert_eq!(state.zone_label, Reading::Known("B".to_string()));
    }

    #[tokio::test]
    async fn test_record_without_name_skipped() {
        let (mut sync, publisher, _, _) = orchestrator(
            two_zones(),
            vec![json!({"batteryStatus": 1}), device("Keys", 52.0, 13.0, 1000)],
            vec![],
        );

        let summary = sync.run_pass(false).await.unwrap();

        assert_eq!(summary, PassSummary { published: 1, suppressed: 0, skipped: 1 });
        assert_eq!(publisher.take().len(), 3);
    }

    #[tokio::test]
    async fn test_failing_source_keeps_earlier_state() {
        let (mut sync, publisher, _, devices) =
            orchestrator(two_zones(), vec![device("Keys", 52.0, 13.0, 1000)], vec![]);
        *devices.lock() = None;

        let err = sync.run_pass(false).await.unwrap_err();

        assert_eq!(err.source_name(), "devices");
        assert!(sync.detector().get("Keys").is_some());
        assert_eq!(publisher.take().len(), 3);

        // Next pass runs independently once the source recovers
        *devices.lock() = Some(vec![device("Phone", 48.0, 11.0, 5)]);
        let summary = sync.run_pass(false).await.unwrap();
        assert_eq!(summary, PassSummary { published: 1, suppressed: 1, skipped: 0 });
    }

    #[tokio::test]
    async fn test_failing_first_source_aborts_pass() {
        let (mut sync, publisher, items, _) =
            orchestrator(two_zones(), vec![], vec![device("Phone", 48.0, 11.0, 5)]);
        *items.lock() = None;

        assert!(sync.run_pass(false).await.is_err());
        assert!(publisher.take().is_empty());
        assert!(sync.detector().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_abort_pass() {
        let (items_source, _) = MemorySource::new("items", vec![device("Keys", 52.0, 13.0, 1000)]);
        let metrics = Arc::new(Metrics::new());
        let mut sync = SyncOrchestrator::new(two_zones(), vec![Box::new(items_source)], BrokenPublisher, metrics.clone());

        let summary = sync.run_pass(false).await.unwrap();

        assert_eq!(summary.published, 1);
        assert!(sync.detector().get("Keys").is_some());
        assert_eq!(metrics.report(1).publish_errors_total, 3);
    }

    #[tokio::test]
    async fn test_every_pass_is_recorded_in_metrics() {
        let (items_source, items) = MemorySource::new("items", vec![device("Keys", 52.0, 13.0, 1000)]);
        let metrics = Arc::new(Metrics::new());
        let mut sync =
            SyncOrchestrator::new(two_zones(), vec![Box::new(items_source)], RecordingPublisher::default(), metrics.clone());

        sync.run_pass(false).await.unwrap();
        *items.lock() = None;
        assert!(sync.run_pass(false).await.is_err());

        let summary = metrics.report(sync.detector().len());
        assert_eq!(summary.passes_total, 2);
        assert_eq!(summary.passes_failed_total, 1);
        assert!(summary.max_pass_us < u64::MAX);
    }
}
