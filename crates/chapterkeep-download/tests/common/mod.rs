//! Shared fixtures for orchestrator integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chapterkeep_core::settings::{EstimatorSettings, OfflineSettings};
use chapterkeep_core::testing::{
    FakeFetcher, InMemoryRegistryStore, InMemoryStorage, MB, RecordingSink, StaticCatalog,
    ToggleConnectivity,
};
use chapterkeep_core::{ItemStatus, OfflineEvent};
use chapterkeep_download::{DownloadOrchestrator, DownloadOrchestratorDeps, build_orchestrator};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Settings where every unit costs exactly 1 MiB, so catalog unit counts
/// read as megabytes.
pub fn megabyte_settings() -> OfflineSettings {
    OfflineSettings {
        estimator: EstimatorSettings {
            per_unit_cost: MB,
            fixed_overhead: 0,
        },
        ..OfflineSettings::with_defaults()
    }
}

/// An orchestrator wired to in-memory collaborators.
pub struct Harness {
    pub storage: Arc<InMemoryStorage>,
    pub fetcher: Arc<FakeFetcher>,
    pub store: Arc<InMemoryRegistryStore>,
    pub catalog: Arc<StaticCatalog>,
    pub connectivity: Arc<ToggleConnectivity>,
    pub sink: RecordingSink,
    pub orchestrator: DownloadOrchestrator,
}

impl Harness {
    pub fn new(storage: InMemoryStorage, catalog: StaticCatalog, fetcher: FakeFetcher) -> Self {
        Self::build(
            storage,
            catalog,
            fetcher,
            InMemoryRegistryStore::new(),
            megabyte_settings(),
        )
    }

    pub fn build(
        storage: InMemoryStorage,
        catalog: StaticCatalog,
        fetcher: FakeFetcher,
        store: InMemoryRegistryStore,
        settings: OfflineSettings,
    ) -> Self {
        init_tracing();
        let storage = Arc::new(storage);
        let fetcher = Arc::new(fetcher);
        let store = Arc::new(store);
        let catalog = Arc::new(catalog);
        let connectivity = Arc::new(ToggleConnectivity::new(true));
        let sink = RecordingSink::new();

        let orchestrator = build_orchestrator(
            DownloadOrchestratorDeps {
                catalog: catalog.clone(),
                storage: storage.clone(),
                fetcher: fetcher.clone(),
                store: store.clone(),
                connectivity: connectivity.clone(),
                events: Arc::new(sink.clone()),
            },
            settings,
        )
        .unwrap();

        Self {
            storage,
            fetcher,
            store,
            catalog,
            connectivity,
            sink,
            orchestrator,
        }
    }

    /// Plenty of durable space and `count` one-megabyte chapters.
    pub fn roomy(count: u32, fetcher: FakeFetcher) -> Self {
        Self::new(
            InMemoryStorage::new(100 * MB, 0).persisted(true),
            StaticCatalog::uniform(count, 1),
            fetcher,
        )
    }

    /// `OverallProgress` percentages in emission order.
    pub fn overall_percents(&self) -> Vec<u8> {
        self.sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                OfflineEvent::OverallProgress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    /// `(status, percent)` of every item event for `id`, in order.
    pub fn item_trace(&self, id: u32) -> Vec<(ItemStatus, u8)> {
        self.sink
            .events()
            .into_iter()
            .filter_map(|event| match event {
                OfflineEvent::ItemProgress { progress } if progress.item_id == id => {
                    Some((progress.status, progress.percent))
                }
                _ => None,
            })
            .collect()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.sink.events().iter().map(OfflineEvent::event_name).collect()
    }
}
