use std::path::PathBuf;

use ubsmap_shared::NameFieldPolicy;
use ubsmap_shared::viewport::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM};

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_BOUNDARY_FILE: &str = "pinheiro.json";
pub const DEFAULT_FACILITY_FILE: &str = "ubs_pinheiro.json";

/// Images shown beside the map; all must exist at startup.
pub const LOGO_FILES: [&str; 2] = ["ufma.jpeg", "logo_pet.png"];

pub const ASSET_CACHE_CONTROL: &str = "public, max-age=86400";
pub const EXPORT_CACHE_CONTROL: &str = "no-cache";

/// File locations and render defaults, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub assets_dir: PathBuf,
    pub boundary_path: PathBuf,
    pub facility_path: PathBuf,
    pub name_field: NameFieldPolicy,
    pub zoom: u8,
}

impl Settings {
    pub fn from_env() -> Self {
        let assets_dir = assets_dir();
        Self {
            boundary_path: assets_dir.join(env_file("BOUNDARY_FILE", DEFAULT_BOUNDARY_FILE)),
            facility_path: assets_dir.join(env_file("FACILITY_FILE", DEFAULT_FACILITY_FILE)),
            name_field: facility_name_field(),
            zoom: map_zoom(),
            assets_dir,
        }
    }

    /// Settings rooted at an explicit directory, with default file names.
    pub fn with_assets_dir(assets_dir: impl Into<PathBuf>) -> Self {
        let assets_dir = assets_dir.into();
        Self {
            boundary_path: assets_dir.join(DEFAULT_BOUNDARY_FILE),
            facility_path: assets_dir.join(DEFAULT_FACILITY_FILE),
            name_field: NameFieldPolicy::Detect,
            zoom: DEFAULT_ZOOM,
            assets_dir,
        }
    }

    pub fn logo_paths(&self) -> Vec<PathBuf> {
        LOGO_FILES
            .iter()
            .map(|file| self.assets_dir.join(file))
            .collect()
    }
}

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn assets_dir() -> PathBuf {
    std::env::var("ASSETS_DIR")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR))
}

pub fn map_zoom() -> u8 {
    std::env::var("MAP_ZOOM")
        .ok()
        .and_then(|value| value.parse::<u8>().ok())
        .filter(|value| (MIN_ZOOM..=MAX_ZOOM).contains(value))
        .unwrap_or(DEFAULT_ZOOM)
}

pub fn facility_name_field() -> NameFieldPolicy {
    std::env::var("FACILITY_NAME_FIELD")
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .map(NameFieldPolicy::Explicit)
        .unwrap_or_default()
}

fn env_file(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_owned())
}
