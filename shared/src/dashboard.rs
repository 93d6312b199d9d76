use std::sync::Arc;

use geojson::JsonObject;
use serde::{Deserialize, Serialize};

use crate::compose::{MapArtifact, MapOptions, SkippedRecord, compose_map};
use crate::error::{ExportError, RenderError};
use crate::export::{ExportArtifact, boundary_geojson, facility_csv, facility_geojson};
use crate::layer::{BoundaryLayer, FacilityLayer};
use crate::tiles::{BaseLayer, select_tile};
use crate::viewport::map_center;

/// User-selectable dashboard settings. Defaults match a first page load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default = "enabled")]
    pub boundary: bool,
    #[serde(default = "enabled")]
    pub cluster: bool,
}

fn default_base() -> String {
    BaseLayer::default().label().to_string()
}

fn enabled() -> bool {
    true
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            boundary: true,
            cluster: true,
        }
    }
}

/// The two loaded tables every render works from.
#[derive(Debug, Clone)]
pub struct DashboardLayers {
    pub boundary: Arc<BoundaryLayer>,
    pub facilities: Arc<FacilityLayer>,
}

/// Counts, names and attribute rows for the facility panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacilitySummary {
    pub total: usize,
    pub name_field: String,
    pub names: Vec<String>,
    pub columns: Vec<String>,
    pub rows: Vec<JsonObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub map: MapArtifact,
    pub summary: FacilitySummary,
    pub skipped: Vec<SkippedRecord>,
}

pub fn facility_summary(layer: &FacilityLayer) -> FacilitySummary {
    FacilitySummary {
        total: layer.len(),
        name_field: layer.name_field.clone(),
        names: layer.names(),
        columns: layer.columns.clone(),
        rows: layer
            .records
            .iter()
            .map(|record| record.properties.clone())
            .collect(),
    }
}

/// Rebuild the whole dashboard from the loaded layers.
pub fn render(
    config: &DashboardConfig,
    layers: &DashboardLayers,
    zoom: u8,
) -> Result<Dashboard, RenderError> {
    let tile = select_tile(&config.base)?;
    let center = map_center(&layers.boundary)?;
    let composition = compose_map(
        center,
        zoom,
        tile,
        &layers.boundary,
        &layers.facilities,
        MapOptions {
            show_boundary: config.boundary,
            cluster: config.cluster,
        },
    );

    Ok(Dashboard {
        map: composition.map,
        summary: facility_summary(&layers.facilities),
        skipped: composition.skipped,
    })
}

pub fn export(artifact: ExportArtifact, layers: &DashboardLayers) -> Result<String, ExportError> {
    match artifact {
        ExportArtifact::FacilityGeoJson => facility_geojson(&layers.facilities),
        ExportArtifact::FacilityCsv => facility_csv(&layers.facilities),
        ExportArtifact::BoundaryGeoJson => boundary_geojson(&layers.boundary),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::compose::MarkerTarget;
    use crate::error::{EmptyGeometryError, UnknownTileError};
    use crate::layer::tests::{CLINIC_A, SQUARE_BOUNDARY};
    use crate::layer::{NameFieldPolicy, parse_boundary_layer, parse_facility_layer};

    fn layers(boundary: &str, facilities: &str) -> DashboardLayers {
        let path = Path::new("fixture.json");
        DashboardLayers {
            boundary: Arc::new(parse_boundary_layer(path, boundary).expect("boundary fixture")),
            facilities: Arc::new(
                parse_facility_layer(path, facilities, &NameFieldPolicy::Detect)
                    .expect("facility fixture"),
            ),
        }
    }

    #[test]
    fn clinic_a_scenario() {
        let layers = layers(SQUARE_BOUNDARY, CLINIC_A);
        let dashboard = render(&DashboardConfig::default(), &layers, 11).expect("render");

        assert!(dashboard.map.center.lat.abs() < 1e-12);
        assert!(dashboard.map.center.lon.abs() < 1e-12);
        assert_eq!(dashboard.map.zoom, 11);
        assert_eq!(dashboard.map.markers.markers.len(), 1);
        assert_eq!(dashboard.map.markers.markers[0].tooltip, "Clinic A");
        assert_eq!(dashboard.summary.total, 1);
        assert_eq!(dashboard.summary.names, vec!["Clinic A".to_string()]);
    }

    #[test]
    fn config_flags_drive_composition() {
        let layers = layers(SQUARE_BOUNDARY, CLINIC_A);
        let config = DashboardConfig {
            base: "Satélite".to_string(),
            boundary: false,
            cluster: false,
        };
        let dashboard = render(&config, &layers, 13).expect("render");
        assert_eq!(dashboard.map.markers.target, MarkerTarget::Map);
        assert!(dashboard.map.boundary.is_none());
        assert_eq!(dashboard.map.tile.base_layer, BaseLayer::Satellite);
        assert_eq!(dashboard.map.zoom, 13);
    }

    #[test]
    fn unknown_base_layer_aborts_render() {
        let layers = layers(SQUARE_BOUNDARY, CLINIC_A);
        let config = DashboardConfig {
            base: "Mapbox".to_string(),
            ..DashboardConfig::default()
        };
        assert_eq!(
            render(&config, &layers, 11),
            Err(RenderError::UnknownTile(UnknownTileError {
                label: "Mapbox".to_string()
            }))
        );
    }

    #[test]
    fn empty_boundary_aborts_render() {
        let layers = layers(r#"{"type": "FeatureCollection", "features": []}"#, CLINIC_A);
        let err = render(&DashboardConfig::default(), &layers, 11).expect_err("no boundary");
        assert_eq!(err, RenderError::EmptyGeometry(EmptyGeometryError));
        assert_eq!(err.kind(), "empty_geometry");
    }

    #[test]
    fn empty_facilities_render_empty_panels() {
        let layers = layers(
            SQUARE_BOUNDARY,
            r#"{"type": "FeatureCollection", "features": []}"#,
        );
        let dashboard = render(&DashboardConfig::default(), &layers, 11).expect("render");
        assert!(dashboard.map.markers.markers.is_empty());
        assert_eq!(dashboard.summary.total, 0);
        assert!(dashboard.summary.names.is_empty());
        assert_eq!(
            export(ExportArtifact::FacilityCsv, &layers).expect("csv"),
            "name\n"
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{"cluster": false}"#).expect("partial config");
        assert_eq!(
            config,
            DashboardConfig {
                base: "OpenStreetMap".to_string(),
                boundary: true,
                cluster: false,
            }
        );
    }
}
