pub mod compose;
pub mod crs;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod layer;
pub mod tiles;
pub mod viewport;

pub use compose::{MapArtifact, MapOptions, MarkerTarget, SkippedRecord, compose_map};
pub use dashboard::{Dashboard, DashboardConfig, DashboardLayers, FacilitySummary, render};
pub use error::*;
pub use export::ExportArtifact;
pub use layer::{BoundaryLayer, FacilityLayer, NameFieldPolicy};
pub use tiles::{BaseLayer, TileConfig, select_tile};
pub use viewport::{DEFAULT_ZOOM, LatLon, map_center};

/// Strong ETag for a serialized artifact.
pub fn content_etag(body: &[u8]) -> String {
    format!("\"{:08x}\"", crc32fast::hash(body))
}
