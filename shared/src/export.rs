use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry};

use crate::error::ExportError;
use crate::layer::{BoundaryLayer, FacilityLayer, property_text};

pub const FACILITY_GEOJSON_FILE: &str = "ubs_pinheiro_ma.geojson";
pub const FACILITY_CSV_FILE: &str = "ubs_pinheiro_ma.csv";
pub const BOUNDARY_GEOJSON_FILE: &str = "pinheiro_ma.geojson";

/// The downloadable artifacts, each with a fixed file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportArtifact {
    FacilityGeoJson,
    FacilityCsv,
    BoundaryGeoJson,
}

impl ExportArtifact {
    pub const ALL: [ExportArtifact; 3] = [
        ExportArtifact::FacilityGeoJson,
        ExportArtifact::FacilityCsv,
        ExportArtifact::BoundaryGeoJson,
    ];

    pub const fn file_name(self) -> &'static str {
        match self {
            ExportArtifact::FacilityGeoJson => FACILITY_GEOJSON_FILE,
            ExportArtifact::FacilityCsv => FACILITY_CSV_FILE,
            ExportArtifact::BoundaryGeoJson => BOUNDARY_GEOJSON_FILE,
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            ExportArtifact::FacilityCsv => "text/csv; charset=utf-8",
            ExportArtifact::FacilityGeoJson | ExportArtifact::BoundaryGeoJson => "application/json",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|artifact| artifact.file_name() == name)
    }
}

pub fn boundary_feature_collection(layer: &BoundaryLayer) -> FeatureCollection {
    let features = layer
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| Feature {
            bbox: None,
            geometry: Some(Geometry::new((&feature.geometry).into())),
            id: Some(Id::String(index.to_string())),
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn facility_feature_collection(layer: &FacilityLayer) -> FeatureCollection {
    let features = layer
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| Feature {
            bbox: None,
            geometry: record
                .location
                .as_ref()
                .map(|point| Geometry::new(point.into())),
            id: Some(Id::String(index.to_string())),
            properties: Some(record.properties.clone()),
            foreign_members: None,
        })
        .collect();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn boundary_geojson(layer: &BoundaryLayer) -> Result<String, ExportError> {
    serde_json::to_string(&boundary_feature_collection(layer)).map_err(|e| ExportError {
        artifact: BOUNDARY_GEOJSON_FILE,
        message: e.to_string(),
    })
}

pub fn facility_geojson(layer: &FacilityLayer) -> Result<String, ExportError> {
    serde_json::to_string(&facility_feature_collection(layer)).map_err(|e| ExportError {
        artifact: FACILITY_GEOJSON_FILE,
        message: e.to_string(),
    })
}

/// Attribute table as CSV, geometry dropped. Empty layers yield the header only.
pub fn facility_csv(layer: &FacilityLayer) -> Result<String, ExportError> {
    let fail = |message: String| ExportError {
        artifact: FACILITY_CSV_FILE,
        message,
    };

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&layer.columns)
        .map_err(|e| fail(e.to_string()))?;
    for record in &layer.records {
        writer
            .write_record(
                layer
                    .columns
                    .iter()
                    .map(|column| property_text(record.properties.get(column))),
            )
            .map_err(|e| fail(e.to_string()))?;
    }

    let bytes = writer.into_inner().map_err(|e| fail(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| fail(e.to_string()))
}
