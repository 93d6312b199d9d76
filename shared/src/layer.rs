use std::path::Path;

use geo::Centroid;
use geo_types::{Geometry, MultiPolygon, Point, Polygon};
use geojson::{Feature, GeoJson, JsonObject, PolygonType};
use serde_json::Value;

use crate::crs::{SourceCrs, detect_crs};
use crate::error::{DataLoadError, DataLoadReason};

/// Field name preferred when detecting the facility name column.
pub const DEFAULT_NAME_FIELD: &str = "name";

/// Boundary shape as it appeared in the source file.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl BoundaryGeometry {
    pub fn centroid(&self) -> Option<Point<f64>> {
        match self {
            Self::Polygon(polygon) => polygon.centroid(),
            Self::MultiPolygon(multi) => multi.centroid(),
        }
    }

    pub fn polygons(&self) -> std::slice::Iter<'_, Polygon<f64>> {
        match self {
            Self::Polygon(polygon) => std::slice::from_ref(polygon).iter(),
            Self::MultiPolygon(multi) => multi.0.iter(),
        }
    }

    fn reproject(&mut self, crs: &SourceCrs) -> Result<(), String> {
        match self {
            Self::Polygon(polygon) => crs.reproject(polygon),
            Self::MultiPolygon(multi) => crs.reproject(multi),
        }
    }
}

impl From<&BoundaryGeometry> for geojson::Value {
    fn from(geometry: &BoundaryGeometry) -> Self {
        match geometry {
            BoundaryGeometry::Polygon(polygon) => geojson::Value::from(polygon),
            BoundaryGeometry::MultiPolygon(multi) => geojson::Value::from(multi),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub geometry: BoundaryGeometry,
    pub properties: JsonObject,
}

/// Municipality boundary polygons, in WGS84.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryLayer {
    pub features: Vec<BoundaryFeature>,
}

impl BoundaryLayer {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacilityRecord {
    /// `None` when the source feature had a null geometry.
    pub location: Option<Point<f64>>,
    pub properties: JsonObject,
}

impl FacilityRecord {
    /// Display text of one attribute; null and missing render as empty.
    pub fn text(&self, field: &str) -> String {
        property_text(self.properties.get(field))
    }
}

/// Health facility points, in WGS84, with the name column already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityLayer {
    pub records: Vec<FacilityRecord>,
    /// Attribute columns in first-seen order; always contains `name_field`.
    pub columns: Vec<String>,
    pub name_field: String,
}

impl FacilityLayer {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|record| record.text(&self.name_field))
            .collect()
    }
}

/// How the facility name column is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NameFieldPolicy {
    /// `"name"` when present, otherwise the first all-text column.
    #[default]
    Detect,
    Explicit(String),
}

pub fn property_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn parse_boundary_layer(path: &Path, text: &str) -> Result<BoundaryLayer, DataLoadError> {
    let (crs, features) = read_features(path, text)?;
    let mut out = Vec::with_capacity(features.len());

    for (index, feature) in features.into_iter().enumerate() {
        let invalid = |reason: String| {
            DataLoadError::new(
                path,
                DataLoadReason::InvalidGeometry {
                    feature: index,
                    reason,
                },
            )
        };

        let Some(raw) = feature.geometry.as_ref() else {
            return Err(invalid("missing geometry".to_string()));
        };
        validate_rings(&raw.value).map_err(invalid)?;

        let mut geometry = match convert_geometry(path, index, &feature)? {
            None => return Err(invalid("missing geometry".to_string())),
            Some(Geometry::Polygon(polygon)) => BoundaryGeometry::Polygon(polygon),
            Some(Geometry::MultiPolygon(multi)) => BoundaryGeometry::MultiPolygon(multi),
            Some(other) => {
                return Err(DataLoadError::new(
                    path,
                    DataLoadReason::WrongGeometry {
                        feature: index,
                        found: geometry_kind(&other).to_string(),
                    },
                ));
            }
        };
        geometry.reproject(&crs).map_err(invalid)?;

        out.push(BoundaryFeature {
            geometry,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    Ok(BoundaryLayer { features: out })
}

pub fn parse_facility_layer(
    path: &Path,
    text: &str,
    policy: &NameFieldPolicy,
) -> Result<FacilityLayer, DataLoadError> {
    let (crs, features) = read_features(path, text)?;
    let mut records = Vec::with_capacity(features.len());

    for (index, feature) in features.into_iter().enumerate() {
        let mut location = match convert_geometry(path, index, &feature)? {
            None => None,
            Some(Geometry::Point(point)) => Some(point),
            Some(Geometry::MultiPoint(multi)) if multi.0.len() == 1 => Some(multi.0[0]),
            Some(other) => {
                return Err(DataLoadError::new(
                    path,
                    DataLoadReason::WrongGeometry {
                        feature: index,
                        found: geometry_kind(&other).to_string(),
                    },
                ));
            }
        };

        if let Some(point) = location.as_mut() {
            crs.reproject(point).map_err(|reason| {
                DataLoadError::new(
                    path,
                    DataLoadReason::InvalidGeometry {
                        feature: index,
                        reason,
                    },
                )
            })?;
        }

        records.push(FacilityRecord {
            location,
            properties: feature.properties.unwrap_or_default(),
        });
    }

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.properties.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }

    let name_field = resolve_name_field(&columns, &records, policy)
        .map_err(|reason| DataLoadError::new(path, reason))?;
    if !columns.contains(&name_field) {
        columns.push(name_field.clone());
    }

    Ok(FacilityLayer {
        records,
        columns,
        name_field,
    })
}

fn resolve_name_field(
    columns: &[String],
    records: &[FacilityRecord],
    policy: &NameFieldPolicy,
) -> Result<String, DataLoadReason> {
    match policy {
        NameFieldPolicy::Explicit(field) => {
            if records.is_empty() || columns.contains(field) {
                Ok(field.clone())
            } else {
                Err(DataLoadReason::NoTextAttribute)
            }
        }
        NameFieldPolicy::Detect => {
            if records.is_empty() || columns.iter().any(|c| c == DEFAULT_NAME_FIELD) {
                return Ok(DEFAULT_NAME_FIELD.to_string());
            }
            columns
                .iter()
                .find(|column| is_text_column(column, records))
                .cloned()
                .ok_or(DataLoadReason::NoTextAttribute)
        }
    }
}

fn is_text_column(column: &str, records: &[FacilityRecord]) -> bool {
    let mut seen_text = false;
    for record in records {
        match record.properties.get(column) {
            None | Some(Value::Null) => {}
            Some(Value::String(_)) => seen_text = true,
            Some(_) => return false,
        }
    }
    seen_text
}

fn read_features(path: &Path, text: &str) -> Result<(SourceCrs, Vec<Feature>), DataLoadError> {
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|e| DataLoadError::new(path, DataLoadReason::Malformed(e.to_string())))?;

    let (members, features) = match geojson {
        GeoJson::FeatureCollection(collection) => (collection.foreign_members, collection.features),
        GeoJson::Feature(mut feature) => (feature.foreign_members.take(), vec![feature]),
        GeoJson::Geometry(mut geometry) => {
            let members = geometry.foreign_members.take();
            let feature = Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            };
            (members, vec![feature])
        }
    };

    let crs = detect_crs(members.as_ref())
        .map_err(|crs| DataLoadError::new(path, DataLoadReason::UnsupportedCrs(crs)))?;
    Ok((crs, features))
}

fn convert_geometry(
    path: &Path,
    index: usize,
    feature: &Feature,
) -> Result<Option<Geometry<f64>>, DataLoadError> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Ok(None);
    };
    Geometry::<f64>::try_from(geometry.value.clone())
        .map(Some)
        .map_err(|e| {
            DataLoadError::new(
                path,
                DataLoadReason::InvalidGeometry {
                    feature: index,
                    reason: e.to_string(),
                },
            )
        })
}

/// Checks polygon rings on the raw positions, since the geo-types
/// conversion closes open rings silently. Other geometry types pass.
fn validate_rings(value: &geojson::Value) -> Result<(), String> {
    match value {
        geojson::Value::Polygon(rings) => validate_polygon(rings),
        geojson::Value::MultiPolygon(polygons) => {
            if polygons.is_empty() {
                return Err("empty geometry".to_string());
            }
            polygons.iter().try_for_each(validate_polygon)
        }
        _ => Ok(()),
    }
}

fn validate_polygon(rings: &PolygonType) -> Result<(), String> {
    if rings.is_empty() {
        return Err("polygon has no rings".to_string());
    }
    for ring in rings {
        if ring.len() < 4 {
            return Err(format!("ring has {} positions, need at least 4", ring.len()));
        }
        if ring.first() != ring.last() {
            return Err("ring is not closed".to_string());
        }
        if ring.iter().flatten().any(|ordinate| !ordinate.is_finite()) {
            return Err("non-finite coordinate".to_string());
        }
    }
    Ok(())
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
