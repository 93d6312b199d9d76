use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};
use ubsmap_shared::layer::{parse_boundary_layer, parse_facility_layer};
use ubsmap_shared::{
    BoundaryLayer, DashboardLayers, DataLoadError, DataLoadReason, FacilityLayer, NameFieldPolicy,
};

use crate::config::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

#[derive(Debug)]
struct CachedLayer<T> {
    modified: SystemTime,
    loaded_at: DateTime<Utc>,
    layer: Arc<T>,
}

/// One cached file, as reported by the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CachedLayerInfo {
    pub path: String,
    pub loaded_at: DateTime<Utc>,
}

/// Parsed layers keyed by file path. An entry is reused only while the
/// file's modification time is unchanged.
#[derive(Debug, Default)]
pub struct LayerCache {
    boundaries: DashMap<PathBuf, CachedLayer<BoundaryLayer>>,
    facilities: DashMap<PathBuf, CachedLayer<FacilityLayer>>,
}

/// Lookup outcomes of one or more loads. A lookup that fails counts as
/// a miss, since it went to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheTally {
    pub hits: u64,
    pub misses: u64,
}

impl CacheTally {
    fn record<T>(&mut self, lookup: &Result<(T, CacheOutcome), DataLoadError>) {
        match lookup {
            Ok((_, CacheOutcome::Hit)) => self.hits += 1,
            Ok((_, CacheOutcome::Miss)) | Err(_) => self.misses += 1,
        }
    }
}

impl LayerCache {
    pub fn load_boundary(
        &self,
        path: &Path,
    ) -> Result<(Arc<BoundaryLayer>, CacheOutcome), DataLoadError> {
        load_cached(&self.boundaries, path, |text| {
            parse_boundary_layer(path, text)
        })
    }

    pub fn load_facilities(
        &self,
        path: &Path,
        policy: &NameFieldPolicy,
    ) -> Result<(Arc<FacilityLayer>, CacheOutcome), DataLoadError> {
        load_cached(&self.facilities, path, |text| {
            parse_facility_layer(path, text, policy)
        })
    }

    /// Both dashboard layers, reading from disk only what changed. Every
    /// lookup made is added to `tally`, including ones before a failure.
    pub fn load(
        &self,
        settings: &Settings,
        tally: &mut CacheTally,
    ) -> Result<DashboardLayers, DataLoadError> {
        let boundary = self.load_boundary(&settings.boundary_path);
        tally.record(&boundary);
        let (boundary, _) = boundary?;

        let facilities = self.load_facilities(&settings.facility_path, &settings.name_field);
        tally.record(&facilities);
        let (facilities, _) = facilities?;

        Ok(DashboardLayers {
            boundary,
            facilities,
        })
    }

    pub fn clear(&self) {
        self.boundaries.clear();
        self.facilities.clear();
    }

    pub fn len(&self) -> usize {
        self.boundaries.len() + self.facilities.len()
    }

    pub fn entries(&self) -> Vec<CachedLayerInfo> {
        let boundaries = self.boundaries.iter().map(|entry| CachedLayerInfo {
            path: entry.key().display().to_string(),
            loaded_at: entry.value().loaded_at,
        });
        let facilities = self.facilities.iter().map(|entry| CachedLayerInfo {
            path: entry.key().display().to_string(),
            loaded_at: entry.value().loaded_at,
        });
        let mut entries: Vec<CachedLayerInfo> = boundaries.chain(facilities).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}

fn load_cached<T>(
    cache: &DashMap<PathBuf, CachedLayer<T>>,
    path: &Path,
    parse: impl FnOnce(&str) -> Result<T, DataLoadError>,
) -> Result<(Arc<T>, CacheOutcome), DataLoadError> {
    let modified = modified_time(path)?;

    if let Some(entry) = cache.get(path)
        && entry.modified == modified
    {
        debug!(path = %path.display(), "layer cache hit");
        return Ok((Arc::clone(&entry.layer), CacheOutcome::Hit));
    }

    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let layer = Arc::new(parse(&text)?);
    cache.insert(
        path.to_path_buf(),
        CachedLayer {
            modified,
            loaded_at: Utc::now(),
            layer: Arc::clone(&layer),
        },
    );
    info!(path = %path.display(), "loaded layer from disk");

    Ok((layer, CacheOutcome::Miss))
}

fn modified_time(path: &Path) -> Result<SystemTime, DataLoadError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_error(path, e))?;
    if !metadata.is_file() {
        return Err(DataLoadError::new(path, DataLoadReason::Missing));
    }
    metadata.modified().map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, e: std::io::Error) -> DataLoadError {
    let reason = match e.kind() {
        ErrorKind::NotFound => DataLoadReason::Missing,
        _ => DataLoadReason::Unreadable(e.to_string()),
    };
    DataLoadError::new(path, reason)
}
