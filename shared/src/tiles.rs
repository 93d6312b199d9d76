use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UnknownTileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BaseLayer {
    #[default]
    OpenStreetMap,
    Satellite,
    Topographic,
}

/// Tile source for one base layer. `attribution` is absent for the default
/// OpenStreetMap layer, whose credit the map client supplies itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileConfig {
    pub base_layer: BaseLayer,
    pub label: &'static str,
    pub template: &'static str,
    pub attribution: Option<&'static str>,
}

const TILE_TABLE: [TileConfig; 3] = [
    TileConfig {
        base_layer: BaseLayer::OpenStreetMap,
        label: "OpenStreetMap",
        template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
        attribution: None,
    },
    TileConfig {
        base_layer: BaseLayer::Satellite,
        label: "Satellite",
        template: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        attribution: Some("Esri, Maxar, Earthstar Geographics"),
    },
    TileConfig {
        base_layer: BaseLayer::Topographic,
        label: "Topographic",
        template: "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
        attribution: Some("© OpenTopoMap contributors"),
    },
];

impl BaseLayer {
    pub const ALL: [BaseLayer; 3] = [
        BaseLayer::OpenStreetMap,
        BaseLayer::Satellite,
        BaseLayer::Topographic,
    ];

    pub const fn label(self) -> &'static str {
        self.tile().label
    }

    pub const fn tile(self) -> TileConfig {
        match self {
            BaseLayer::OpenStreetMap => TILE_TABLE[0],
            BaseLayer::Satellite => TILE_TABLE[1],
            BaseLayer::Topographic => TILE_TABLE[2],
        }
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BaseLayer {
    type Err = UnknownTileError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "OpenStreetMap" => Ok(BaseLayer::OpenStreetMap),
            "Satellite" | "Satélite" => Ok(BaseLayer::Satellite),
            "Topographic" | "Topográfico" => Ok(BaseLayer::Topographic),
            _ => Err(UnknownTileError {
                label: label.to_owned(),
            }),
        }
    }
}

/// Look up the tile source for a user-facing base layer label.
pub fn select_tile(label: &str) -> Result<TileConfig, UnknownTileError> {
    label.parse::<BaseLayer>().map(BaseLayer::tile)
}
