//! End-to-end pipeline scenarios against in-memory and filesystem adapters

use std::sync::Arc;

use mlbf_cascade::FilterCascade;
use mlbf_generation::adapters::{
    FileArtifactStorage, FileGenerationLock, InMemoryConfigStore, JsonCatalogSource,
    JsonFileConfigStore,
};
use mlbf_generation::domain::GENERATION_TIME_CONFIG_KEY;
use mlbf_generation::ports::outbound::{ArtifactStorage, ConfigStore, GenerationLock};
use mlbf_generation::test_utils::{
    sample_catalog, FixedClock, MockCatalog, RecordingDistribution, TestHarness,
};
use mlbf_generation::{
    BlockRecord, BlocklistGenerationApi, CatalogVersion, GenerationError, GenerationPorts,
    GenerationService, GenerationSettings, Outcome, PublishGate, SignOffStatus, VersionRange,
};
use serde_json::json;

const T0: u64 = 1_700_000_000_000;

#[tokio::test]
async fn regenerates_only_after_a_newer_block() {
    let harness = TestHarness::new(sample_catalog(T0 - 1), T0 + 60_000);
    harness
        .config_store
        .set(GENERATION_TIME_CONFIG_KEY, json!(T0))
        .unwrap();

    let outcome = harness.service.run(PublishGate::Enabled).await.unwrap();
    assert!(matches!(outcome, Outcome::UpToDate { .. }));
    assert_eq!(harness.distribution.upload_count(), 0);

    let now = T0 + 60_000;
    harness.catalog.add_version("fresh@addon", "1.0").await;
    harness
        .catalog
        .add_block(BlockRecord::new("fresh@addon", vec![VersionRange::all()], now))
        .await;

    let outcome = harness.service.run(PublishGate::Enabled).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Published { generation_time, .. } if generation_time == now
    ));
    assert_eq!(
        harness.config_store.get(GENERATION_TIME_CONFIG_KEY).unwrap(),
        Some(json!(now))
    );
    let uploads = harness.distribution.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0.generation_time, now);

    let cascade = FilterCascade::from_bytes(&uploads[0].1.content).unwrap();
    assert!(cascade.contains("fresh@addon:1.0"));
}

#[tokio::test]
async fn stash_reports_replaced_block() {
    let catalog = MockCatalog::new(
        vec![BlockRecord::new("a@b", vec![VersionRange::all()], T0 + 5)],
        vec![
            CatalogVersion::new("a@b", "1.0"),
            CatalogVersion::new("x@y", "1"),
            CatalogVersion::new("c@d", "2.0"),
        ],
    );
    let harness = TestHarness::new(catalog, T0 + 10);
    harness
        .config_store
        .set(GENERATION_TIME_CONFIG_KEY, json!(T0))
        .unwrap();
    harness
        .storage
        .write(&format!("{}/blocked.json", T0), br#"["x@y:1"]"#)
        .unwrap();

    let outcome = harness.service.run(PublishGate::Enabled).await.unwrap();

    assert!(matches!(outcome, Outcome::Published { stash_written: true, .. }));
    let stash = harness
        .storage
        .read(&format!("{}/stash.json", T0 + 10))
        .unwrap()
        .unwrap();
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&stash).unwrap(),
        json!({"blocked": ["a@b:1.0"], "unblocked": ["x@y:1"]})
    );
}

#[tokio::test]
async fn disabled_gate_never_publishes_or_moves_pointer() {
    for build_when_disabled in [false, true] {
        let settings = GenerationSettings {
            build_when_disabled,
            ..GenerationSettings::default()
        };
        let harness = TestHarness::with_settings(sample_catalog(T0 + 100), T0 + 200, settings);
        harness
            .config_store
            .set(GENERATION_TIME_CONFIG_KEY, json!(T0))
            .unwrap();

        let outcome = harness.service.run(PublishGate::Disabled).await.unwrap();

        assert_eq!(harness.distribution.upload_count(), 0);
        assert_eq!(
            harness.config_store.get(GENERATION_TIME_CONFIG_KEY).unwrap(),
            Some(json!(T0))
        );
        assert_eq!(outcome.state().last_generation_time, Some(T0));
    }
}

#[tokio::test]
async fn retry_after_publish_failure_uses_fresh_time() {
    let harness = TestHarness::new(sample_catalog(T0 - 5), T0);
    harness.distribution.set_failing(true);

    assert!(harness.service.run(PublishGate::Enabled).await.is_err());
    assert_eq!(harness.config_store.get(GENERATION_TIME_CONFIG_KEY).unwrap(), None);

    harness.distribution.set_failing(false);
    harness.clock.advance(1_000);
    let outcome = harness.service.run(PublishGate::Enabled).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Published { generation_time, .. } if generation_time == T0 + 1_000
    ));
    assert_eq!(harness.distribution.upload_count(), 1);
}

#[tokio::test]
async fn stalled_clock_never_rewrites_published_generation() {
    let harness = TestHarness::new(sample_catalog(T0 - 1), T0);
    harness.service.run(PublishGate::Enabled).await.unwrap();
    let blocked_before = harness.storage.read(&format!("{}/blocked.json", T0)).unwrap();
    let filter_before = harness.storage.read(&format!("{}/filter", T0)).unwrap();

    harness.catalog.add_version("new@", "3.0").await;
    harness
        .catalog
        .add_block(BlockRecord::new("new@", vec![VersionRange::all()], T0 + 5))
        .await;

    for _ in 0..2 {
        let result = harness.service.run(PublishGate::Enabled).await;
        assert!(matches!(result, Err(GenerationError::ClockBehind { .. })));
    }

    assert_eq!(
        harness.storage.read(&format!("{}/blocked.json", T0)).unwrap(),
        blocked_before
    );
    assert_eq!(harness.storage.read(&format!("{}/filter", T0)).unwrap(), filter_before);
    let times: Vec<u64> = harness
        .distribution
        .uploads()
        .iter()
        .map(|(metadata, _)| metadata.generation_time)
        .collect();
    assert_eq!(times, vec![T0]);
    assert_eq!(harness.distribution.sign_offs(), vec![SignOffStatus::ToSign]);
    assert_eq!(
        harness.config_store.get(GENERATION_TIME_CONFIG_KEY).unwrap(),
        Some(json!(T0))
    );
}

#[tokio::test]
async fn identical_catalogs_produce_identical_artifacts() {
    let first = TestHarness::new(sample_catalog(T0), T0 + 1);
    let second = TestHarness::new(sample_catalog(T0), T0 + 1);

    first.service.run(PublishGate::Enabled).await.unwrap();
    second.service.run(PublishGate::Enabled).await.unwrap();

    for path in first.storage.paths() {
        assert_eq!(
            first.storage.read(&path).unwrap(),
            second.storage.read(&path).unwrap(),
            "{} differs",
            path
        );
    }
}

fn file_backed_service(
    dir: &std::path::Path,
    now: u64,
) -> (GenerationService, Arc<RecordingDistribution>) {
    let distribution = Arc::new(RecordingDistribution::new());
    let service = GenerationService::new(
        GenerationPorts {
            catalog: Arc::new(JsonCatalogSource::new(dir.join("catalog.json"))),
            storage: Arc::new(FileArtifactStorage::new(dir.join("artifacts"))),
            config_store: Arc::new(JsonFileConfigStore::new(dir.join("config.json"))),
            distribution: distribution.clone(),
            clock: Arc::new(FixedClock::new(now)),
            lock: Arc::new(FileGenerationLock::new(dir)),
        },
        GenerationSettings::default(),
    );
    (service, distribution)
}

#[tokio::test]
async fn filesystem_adapters_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("catalog.json"),
        json!({
            "blocks": [
                {"guid": "bad@addon", "ranges": [{"min_version": "1.0", "max_version": "1.*"}], "modified": T0}
            ],
            "versions": [
                {"guid": "bad@addon", "version": "0.9"},
                {"guid": "bad@addon", "version": "1.0"},
                {"guid": "bad@addon", "version": "1.5"},
                {"guid": "bad@addon", "version": "2.0"},
                {"guid": "good@addon", "version": "1.0"},
                {"guid": "hidden@addon", "version": "1.0", "distributable": false}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let (service, distribution) = file_backed_service(dir.path(), T0 + 1);
    let outcome = service.run(PublishGate::Enabled).await.unwrap();

    assert!(matches!(outcome, Outcome::Published { .. }));
    assert_eq!(distribution.upload_count(), 1);

    let generation_dir = dir.path().join("artifacts").join((T0 + 1).to_string());
    let blocked: Vec<String> =
        serde_json::from_slice(&std::fs::read(generation_dir.join("blocked.json")).unwrap()).unwrap();
    let not_blocked: Vec<String> =
        serde_json::from_slice(&std::fs::read(generation_dir.join("notblocked.json")).unwrap())
            .unwrap();
    assert_eq!(blocked, vec!["bad@addon:1.0", "bad@addon:1.5"]);
    assert_eq!(
        not_blocked,
        vec!["bad@addon:0.9", "bad@addon:2.0", "good@addon:1.0"]
    );

    let config: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join("config.json")).unwrap()).unwrap();
    assert_eq!(config[GENERATION_TIME_CONFIG_KEY], json!(T0 + 1));

    // A second run with nothing new is a no-op
    let (service, distribution) = file_backed_service(dir.path(), T0 + 2);
    let outcome = service.run(PublishGate::Enabled).await.unwrap();
    assert!(matches!(outcome, Outcome::UpToDate { .. }));
    assert_eq!(distribution.upload_count(), 0);
}

#[tokio::test]
async fn concurrent_run_is_rejected_while_locked() {
    let dir = tempfile::tempdir().unwrap();
    let (service, distribution) = file_backed_service(dir.path(), T0);

    let _held = FileGenerationLock::new(dir.path()).try_acquire().unwrap();
    let result = service.run(PublishGate::Enabled).await;

    assert!(matches!(result, Err(GenerationError::Locked(_))));
    assert_eq!(distribution.upload_count(), 0);
}

#[tokio::test]
async fn export_does_not_touch_pointer() {
    let config_store = Arc::new(InMemoryConfigStore::new());
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileArtifactStorage::new(dir.path()));
    let distribution = Arc::new(RecordingDistribution::new());
    let service = GenerationService::new(
        GenerationPorts {
            catalog: Arc::new(sample_catalog(T0)),
            storage: storage.clone(),
            config_store: config_store.clone(),
            distribution: distribution.clone(),
            clock: Arc::new(FixedClock::new(T0)),
            lock: Arc::new(FileGenerationLock::new(dir.path())),
        },
        GenerationSettings::default(),
    );

    let report = service.export("snapshot", &Default::default()).await.unwrap();

    assert!(report.filter_size > 0);
    assert!(storage.read("snapshot/filter").unwrap().is_some());
    assert!(storage.read("snapshot/notblocked.json").unwrap().is_some());
    assert_eq!(config_store.get(GENERATION_TIME_CONFIG_KEY).unwrap(), None);
    assert_eq!(distribution.upload_count(), 0);
}
