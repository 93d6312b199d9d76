use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{LOGO_FILES, Settings};

pub const SQUARE_BOUNDARY: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "properties": {"NM_MUN": "Pinheiro", "CD_MUN": "2108603"},
        "geometry": {"type": "Polygon", "coordinates": [
            [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0]]
        ]}
    }]
}"#;

pub const TWO_FACILITIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature",
         "properties": {"name": "Clinic A", "bairro": "Centro"},
         "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}},
        {"type": "Feature",
         "properties": {"name": "Posto <Rural>", "bairro": null},
         "geometry": null}
    ]
}"#;

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Throwaway assets directory, removed on drop.
pub struct TempAssets {
    dir: PathBuf,
}

impl TempAssets {
    pub fn empty() -> Self {
        let dir = std::env::temp_dir().join(format!(
            "ubsmap-test-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).expect("create temp assets dir");
        Self { dir }
    }

    /// Boundary, facilities and logos, ready to serve.
    pub fn with_fixtures() -> Self {
        let assets = Self::empty();
        let settings = assets.settings();
        assets.write(&settings.boundary_path, SQUARE_BOUNDARY);
        assets.write(&settings.facility_path, TWO_FACILITIES);
        for logo in LOGO_FILES {
            assets.write(&assets.dir.join(logo), "logo");
        }
        assets
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings(&self) -> Settings {
        Settings::with_assets_dir(&self.dir)
    }

    pub fn write(&self, path: &Path, contents: &str) {
        std::fs::write(path, contents).expect("write fixture file");
    }
}

impl Drop for TempAssets {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
