use geojson::FeatureCollection;
use serde::Serialize;

use crate::export::boundary_feature_collection;
use crate::layer::{BoundaryLayer, FacilityLayer};
use crate::tiles::TileConfig;
use crate::viewport::LatLon;

pub const BOUNDARY_OVERLAY_NAME: &str = "Limite Municipal";
pub const CLUSTER_LAYER_NAME: &str = "UBS";

pub const BOUNDARY_STYLE: BoundaryStyle = BoundaryStyle {
    color: "#2E7D32",
    weight: 2,
    fill_opacity: 0.15,
};

pub const FACILITY_ICON: MarkerIcon = MarkerIcon {
    color: "red",
    icon: "plus-sign",
};

/// Leaflet path options for the boundary overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryStyle {
    pub color: &'static str,
    pub weight: u8,
    pub fill_opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkerIcon {
    pub color: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryOverlay {
    pub name: &'static str,
    pub style: BoundaryStyle,
    pub data: FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub position: LatLon,
    pub tooltip: String,
    /// HTML fragment; the facility name is escaped.
    pub popup: String,
}

/// Where facility markers are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerTarget {
    Map,
    Cluster { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub target: MarkerTarget,
    pub icon: MarkerIcon,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerControl {
    pub base_layers: Vec<&'static str>,
    pub overlays: Vec<&'static str>,
}

/// Everything a map client needs to draw one dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapArtifact {
    pub center: LatLon,
    pub zoom: u8,
    pub tile: TileConfig,
    pub control_scale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryOverlay>,
    pub markers: MarkerLayer,
    pub layer_control: LayerControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingGeometry,
    NonFiniteCoordinate,
}

/// A facility record that produced no marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub index: usize,
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    pub show_boundary: bool,
    pub cluster: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            show_boundary: true,
            cluster: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub map: MapArtifact,
    pub skipped: Vec<SkippedRecord>,
}

/// Build the map view. Records without a usable coordinate are skipped and
/// reported rather than failing the whole render.
pub fn compose_map(
    center: LatLon,
    zoom: u8,
    tile: TileConfig,
    boundary: &BoundaryLayer,
    facilities: &FacilityLayer,
    options: MapOptions,
) -> Composition {
    let mut overlays = Vec::with_capacity(2);

    let overlay = options.show_boundary.then(|| {
        overlays.push(BOUNDARY_OVERLAY_NAME);
        BoundaryOverlay {
            name: BOUNDARY_OVERLAY_NAME,
            style: BOUNDARY_STYLE,
            data: boundary_feature_collection(boundary),
        }
    });

    let target = if options.cluster {
        overlays.push(CLUSTER_LAYER_NAME);
        MarkerTarget::Cluster {
            name: CLUSTER_LAYER_NAME,
        }
    } else {
        MarkerTarget::Map
    };

    let mut markers = Vec::with_capacity(facilities.len());
    let mut skipped = Vec::new();
    for (index, record) in facilities.records.iter().enumerate() {
        let name = record.text(&facilities.name_field);
        let Some(point) = record.location else {
            skipped.push(SkippedRecord {
                index,
                name,
                reason: SkipReason::MissingGeometry,
            });
            continue;
        };
        let position = LatLon::new(point.y(), point.x());
        if !position.is_finite() {
            skipped.push(SkippedRecord {
                index,
                name,
                reason: SkipReason::NonFiniteCoordinate,
            });
            continue;
        }

        markers.push(Marker {
            position,
            popup: format!("<b>{}</b>", escape_html(&name)),
            tooltip: name,
        });
    }

    let map = MapArtifact {
        center,
        zoom,
        tile,
        control_scale: true,
        boundary: overlay,
        markers: MarkerLayer {
            target,
            icon: FACILITY_ICON,
            markers,
        },
        layer_control: LayerControl {
            base_layers: vec![tile.label],
            overlays,
        },
    };

    Composition { map, skipped }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
