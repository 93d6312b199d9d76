use geo::MapCoordsInPlace;
use geo_types::Coord;
use geojson::JsonObject;
use proj4rs::Proj;
use proj4rs::transform::{Transform, transform};

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";
const WEB_MERCATOR_EPSG: u16 = 3857;
/// Pre-registration codes for EPSG:3857 still written by older GIS exports.
const WEB_MERCATOR_ALIASES: [u32; 3] = [3785, 900913, 102100];

struct Reprojection {
    source: Proj,
    target: Proj,
}

/// Coordinate reference system declared by an input layer.
pub struct SourceCrs {
    name: String,
    reprojection: Option<Reprojection>,
}

impl SourceCrs {
    pub fn wgs84() -> Self {
        Self {
            name: "EPSG:4326".to_string(),
            reprojection: None,
        }
    }

    /// Resolve a CRS name such as `urn:ogc:def:crs:EPSG::31983` or
    /// `EPSG:4674`. Unknown names come back as the error.
    pub fn from_name(name: &str) -> Result<Self, String> {
        let trimmed = name.trim();
        if trimmed.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }
        let code = trimmed
            .rsplit(':')
            .next()
            .and_then(|code| code.trim().parse::<u32>().ok())
            .ok_or_else(|| name.to_owned())?;
        if code == 4326 {
            return Ok(Self::wgs84());
        }

        let epsg = if WEB_MERCATOR_ALIASES.contains(&code) {
            WEB_MERCATOR_EPSG
        } else {
            u16::try_from(code).map_err(|_| name.to_owned())?
        };
        let source = Proj::from_epsg_code(epsg).map_err(|_| name.to_owned())?;
        let target = Proj::from_proj_string(WGS84_PROJ).map_err(|e| e.to_string())?;

        Ok(Self {
            name: format!("EPSG:{epsg}"),
            reprojection: Some(Reprojection { source, target }),
        })
    }

    /// Transform a geometry in place to WGS84 degrees.
    pub fn reproject<G>(&self, geometry: &mut G) -> Result<(), String>
    where
        G: Transform + MapCoordsInPlace<f64>,
    {
        let Some(reprojection) = &self.reprojection else {
            return Ok(());
        };

        if reprojection.source.is_latlong() {
            geometry.map_coords_in_place(|c| Coord {
                x: c.x.to_radians(),
                y: c.y.to_radians(),
            });
        }
        transform(&reprojection.source, &reprojection.target, geometry)
            .map_err(|e| format!("cannot reproject from {}: {e}", self.name))?;
        geometry.map_coords_in_place(|c| Coord {
            x: c.x.to_degrees(),
            y: c.y.to_degrees(),
        });
        Ok(())
    }
}

/// Read the legacy `crs` member of a GeoJSON object.
///
/// RFC 7946 dropped `crs` and fixed the CRS to WGS84, but files exported by
/// desktop GIS tools still carry it. Missing means WGS84; anything
/// unrecognised is returned as the offending description.
pub fn detect_crs(foreign_members: Option<&JsonObject>) -> Result<SourceCrs, String> {
    let Some(crs) = foreign_members.and_then(|members| members.get("crs")) else {
        return Ok(SourceCrs::wgs84());
    };
    if crs.is_null() {
        return Ok(SourceCrs::wgs84());
    }

    let name = crs
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str())
        .ok_or_else(|| crs.to_string())?;

    SourceCrs::from_name(name)
}

#[cfg(test)]
mod tests {
    use geo_types::{Point, point, polygon};
    use serde_json::json;

    use super::*;

    fn members(value: serde_json::Value) -> JsonObject {
        value.as_object().cloned().expect("test members must be an object")
    }

    fn is_identity(crs: Result<SourceCrs, String>) -> bool {
        crs.is_ok_and(|crs| crs.reprojection.is_none())
    }

    #[test]
    fn from_name_accepts_urn_and_short_forms() {
        assert!(is_identity(SourceCrs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84")));
        assert!(is_identity(SourceCrs::from_name("urn:ogc:def:crs:EPSG::4326")));

        let sirgas = SourceCrs::from_name("EPSG:4674").expect("SIRGAS 2000 is defined");
        assert!(sirgas.reprojection.is_some());
        assert_eq!(sirgas.name, "EPSG:4674");

        let legacy = SourceCrs::from_name("EPSG:900913").expect("legacy web mercator");
        assert_eq!(legacy.name, "EPSG:3857");

        assert_eq!(
            SourceCrs::from_name("EPSG:99999").err(),
            Some("EPSG:99999".to_string())
        );
        assert_eq!(SourceCrs::from_name("garbage").err(), Some("garbage".to_string()));
    }

    #[test]
    fn detect_crs_defaults_to_wgs84() {
        assert!(is_identity(detect_crs(None)));
        assert!(is_identity(detect_crs(Some(&members(json!({"name": "x"}))))));
        assert!(is_identity(detect_crs(Some(&members(json!({"crs": null}))))));
    }

    #[test]
    fn detect_crs_reads_named_crs_and_reports_unknown() {
        let utm = members(json!({
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::31983"}}
        }));
        let crs = detect_crs(Some(&utm)).expect("SIRGAS 2000 / UTM 23S is defined");
        assert_eq!(crs.name, "EPSG:31983");

        let unknown = members(json!({
            "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::99999"}}
        }));
        assert_eq!(
            detect_crs(Some(&unknown)).err(),
            Some("urn:ogc:def:crs:EPSG::99999".to_string())
        );

        let linked = members(json!({"crs": {"type": "link", "properties": {"href": "x"}}}));
        assert!(detect_crs(Some(&linked)).is_err());
    }

    #[test]
    fn reprojecting_wgs84_twice_is_idempotent() {
        let crs = SourceCrs::wgs84();
        let original: Point<f64> = point!(x: -45.0835, y: -2.5211);
        let mut twice = original;
        crs.reproject(&mut twice).expect("identity");
        crs.reproject(&mut twice).expect("identity");
        assert_eq!(twice, original);
    }

    #[test]
    fn utm_23s_origin_maps_to_central_meridian_on_equator() {
        let crs = SourceCrs::from_name("EPSG:31983").expect("UTM 23S");
        let mut origin = point!(x: 500_000.0, y: 10_000_000.0);
        crs.reproject(&mut origin).expect("reproject");
        assert!((origin.x() + 45.0).abs() < 1e-6, "lon {}", origin.x());
        assert!(origin.y().abs() < 1e-6, "lat {}", origin.y());
    }

    #[test]
    fn utm_23s_polygon_lands_on_pinheiro() {
        let crs = SourceCrs::from_name("urn:ogc:def:crs:EPSG::31983").expect("UTM 23S");
        let mut square = polygon![
            (x: 470_000.0, y: 9_720_000.0),
            (x: 480_000.0, y: 9_720_000.0),
            (x: 480_000.0, y: 9_730_000.0),
            (x: 470_000.0, y: 9_730_000.0),
            (x: 470_000.0, y: 9_720_000.0),
        ];
        crs.reproject(&mut square).expect("reproject");

        let corner = square.exterior().0[0];
        assert!((corner.x + 45.2699).abs() < 1e-3, "lon {}", corner.x);
        assert!((corner.y + 2.5332).abs() < 1e-3, "lat {}", corner.y);
        for coord in &square.exterior().0 {
            assert!((-45.3..-45.1).contains(&coord.x));
            assert!((-2.6..-2.4).contains(&coord.y));
        }
    }

    #[test]
    fn web_mercator_point_is_inverted() {
        let crs = SourceCrs::from_name("EPSG:3857").expect("web mercator");
        let mut point = point!(x: 111_319.490_793_273_57, y: 0.0);
        crs.reproject(&mut point).expect("reproject");
        assert!((point.x() - 1.0).abs() < 1e-7);
        assert!(point.y().abs() < 1e-7);
    }

    #[test]
    fn sirgas_geographic_stays_within_a_metre_of_wgs84() {
        let crs = SourceCrs::from_name("EPSG:4674").expect("SIRGAS 2000");
        let mut point = point!(x: -45.0835, y: -2.5211);
        crs.reproject(&mut point).expect("reproject");
        assert!((point.x() + 45.0835).abs() < 1e-5);
        assert!((point.y() + 2.5211).abs() < 1e-5);
    }
}
