use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ubsmap_shared::{DashboardLayers, DataLoadError, DataLoadReason};

use crate::config::Settings;
use crate::services::layer_cache::{CacheTally, LayerCache};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub layer_cache: Arc<LayerCache>,
    pub observability: Arc<ObservabilityCounters>,
}

#[derive(Debug, Default)]
pub struct ObservabilityCounters {
    map_requests_total: AtomicU64,
    render_failures_total: AtomicU64,
    layer_cache_hits_total: AtomicU64,
    layer_cache_misses_total: AtomicU64,
    layer_cache_clears_total: AtomicU64,
    exports_total: AtomicU64,
    skipped_markers_total: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct ObservabilitySnapshot {
    pub map_requests_total: u64,
    pub render_failures_total: u64,
    pub layer_cache_hits_total: u64,
    pub layer_cache_misses_total: u64,
    pub layer_cache_clears_total: u64,
    pub exports_total: u64,
    pub skipped_markers_total: u64,
}

impl ObservabilityCounters {
    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            map_requests_total: self.map_requests_total.load(Ordering::Relaxed),
            render_failures_total: self.render_failures_total.load(Ordering::Relaxed),
            layer_cache_hits_total: self.layer_cache_hits_total.load(Ordering::Relaxed),
            layer_cache_misses_total: self.layer_cache_misses_total.load(Ordering::Relaxed),
            layer_cache_clears_total: self.layer_cache_clears_total.load(Ordering::Relaxed),
            exports_total: self.exports_total.load(Ordering::Relaxed),
            skipped_markers_total: self.skipped_markers_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_map_request(&self) {
        self.map_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_failure(&self) {
        self.render_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_layer_cache_lookups(&self, tally: CacheTally) {
        self.layer_cache_hits_total
            .fetch_add(tally.hits, Ordering::Relaxed);
        self.layer_cache_misses_total
            .fetch_add(tally.misses, Ordering::Relaxed);
    }

    pub fn record_layer_cache_clear(&self) {
        self.layer_cache_clears_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_export(&self) {
        self.exports_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_markers(&self, count: u64) {
        self.skipped_markers_total
            .fetch_add(count, Ordering::Relaxed);
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            layer_cache: Arc::new(LayerCache::default()),
            observability: Arc::new(ObservabilityCounters::default()),
        }
    }

    /// Fetch both layers through the cache on the blocking pool. Cache
    /// lookups are counted whether or not the load succeeds.
    pub async fn load_layers(&self) -> Result<DashboardLayers, DataLoadError> {
        let cache = Arc::clone(&self.layer_cache);
        let settings = Arc::clone(&self.settings);
        let (loaded, tally) = tokio::task::spawn_blocking(move || {
            let mut tally = CacheTally::default();
            let loaded = cache.load(&settings, &mut tally);
            (loaded, tally)
        })
        .await
        .map_err(|e| {
            DataLoadError::new(
                &self.settings.boundary_path,
                DataLoadReason::Unreadable(format!("layer loader task failed: {e}")),
            )
        })?;

        self.observability.record_layer_cache_lookups(tally);
        loaded
    }
}
