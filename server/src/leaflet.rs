use ubsmap_shared::MapArtifact;

const LEAFLET_VERSION: &str = "1.9.4";
const MARKERCLUSTER_VERSION: &str = "1.5.3";
const AWESOME_MARKERS_VERSION: &str = "2.0.2";
const OSM_ATTRIBUTION: &str =
    "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>UBS em Pinheiro - MA</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/MarkerCluster.css">
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/MarkerCluster.Default.css">
<link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/__AWESOME__/leaflet.awesome-markers.css">
<link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@3.4.1/dist/css/bootstrap.min.css">
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script type="application/json" id="map-artifact">__ARTIFACT__</script>
<script src="https://unpkg.com/leaflet@__LEAFLET__/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@__CLUSTER__/dist/leaflet.markercluster.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/__AWESOME__/leaflet.awesome-markers.min.js"></script>
<script>
const artifact = JSON.parse(document.getElementById("map-artifact").textContent);
const map = L.map("map").setView([artifact.center.lat, artifact.center.lon], artifact.zoom);
const base = L.tileLayer(artifact.tile.template, {
  attribution: artifact.tile.attribution ?? "__OSM_ATTRIBUTION__",
}).addTo(map);
if (artifact.control_scale) {
  L.control.scale().addTo(map);
}
const overlays = {};
if (artifact.boundary) {
  overlays[artifact.boundary.name] = L.geoJSON(artifact.boundary.data, {
    style: artifact.boundary.style,
  }).addTo(map);
}
const icon = L.AwesomeMarkers.icon({
  icon: artifact.markers.icon.icon,
  markerColor: artifact.markers.icon.color,
  prefix: "glyphicon",
});
let target = map;
if (artifact.markers.target.kind === "cluster") {
  target = L.markerClusterGroup().addTo(map);
  overlays[artifact.markers.target.name] = target;
}
for (const marker of artifact.markers.markers) {
  const tooltip = document.createElement("span");
  tooltip.textContent = marker.tooltip;
  L.marker([marker.position.lat, marker.position.lon], { icon })
    .bindTooltip(tooltip)
    .bindPopup(marker.popup)
    .addTo(target);
}
const baseLayers = {};
baseLayers[artifact.tile.label] = base;
L.control.layers(baseLayers, overlays).addTo(map);
</script>
</body>
</html>
"#;

/// Standalone Leaflet page that rebuilds the map from its serialized artifact.
pub fn render_map_html(map: &MapArtifact) -> Result<String, serde_json::Error> {
    let artifact = serde_json::to_string(map)?;
    Ok(PAGE_TEMPLATE
        .replace("__LEAFLET__", LEAFLET_VERSION)
        .replace("__CLUSTER__", MARKERCLUSTER_VERSION)
        .replace("__AWESOME__", AWESOME_MARKERS_VERSION)
        .replace("__OSM_ATTRIBUTION__", &OSM_ATTRIBUTION.replace('"', "\\\""))
        .replace("__ARTIFACT__", &escape_script_json(&artifact)))
}

/// Keep embedded JSON from closing its `<script>` element early.
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use ubsmap_shared::layer::{parse_boundary_layer, parse_facility_layer};
    use ubsmap_shared::{DashboardConfig, DashboardLayers, NameFieldPolicy, render};

    use super::*;
    use crate::test_support::{SQUARE_BOUNDARY, TWO_FACILITIES};

    fn artifact(config: &DashboardConfig) -> MapArtifact {
        let path = Path::new("fixture.json");
        let layers = DashboardLayers {
            boundary: Arc::new(parse_boundary_layer(path, SQUARE_BOUNDARY).expect("boundary")),
            facilities: Arc::new(
                parse_facility_layer(path, TWO_FACILITIES, &NameFieldPolicy::Detect)
                    .expect("facilities"),
            ),
        };
        render(config, &layers, 11).expect("render").map
    }

    fn embedded_json(html: &str) -> serde_json::Value {
        let start = html
            .find(r#"id="map-artifact">"#)
            .expect("artifact script present")
            + r#"id="map-artifact">"#.len();
        let end = start + html[start..].find("</script>").expect("script closes");
        serde_json::from_str(&html[start..end]).expect("embedded artifact is JSON")
    }

    #[test]
    fn page_embeds_the_artifact_and_loads_plugins() {
        let html = render_map_html(&artifact(&DashboardConfig::default())).expect("html");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("leaflet@1.9.4/dist/leaflet.js"));
        assert!(html.contains("leaflet.markercluster.js"));
        assert!(html.contains("leaflet.awesome-markers.min.js"));
        assert!(!html.contains("__ARTIFACT__"));

        let embedded = embedded_json(&html);
        assert_eq!(embedded["zoom"], 11);
        assert_eq!(embedded["markers"]["target"]["kind"], "cluster");
        assert_eq!(embedded["markers"]["target"]["name"], "UBS");
        assert_eq!(embedded["boundary"]["name"], "Limite Municipal");
    }

    #[test]
    fn closing_tags_in_data_cannot_break_out_of_the_script() {
        let mut map = artifact(&DashboardConfig::default());
        map.markers.markers[0].tooltip = "</script><script>alert(1)</script>".to_string();
        let html = render_map_html(&map).expect("html");

        assert!(!html.contains("</script><script>alert(1)"));
        let embedded = embedded_json(&html);
        assert_eq!(
            embedded["markers"]["markers"][0]["tooltip"],
            "</script><script>alert(1)</script>"
        );
    }

    #[test]
    fn hidden_boundary_is_absent_from_the_page() {
        let config = DashboardConfig {
            boundary: false,
            cluster: false,
            ..DashboardConfig::default()
        };
        let embedded = embedded_json(&render_map_html(&artifact(&config)).expect("html"));
        assert!(embedded.get("boundary").is_none());
        assert_eq!(embedded["markers"]["target"]["kind"], "map");
    }
}
