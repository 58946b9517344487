use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use crate::console_log;
use crate::models::{Boundary, BoundaryFeature, Region};
use crate::{Error, Result};

/// Read boundary features from a GeoJSON document.
///
/// Only Polygon and MultiPolygon features are kept. The region id comes from
/// `properties.id`, falling back to the feature id.
pub fn parse_boundaries(geojson: &str) -> Result<Vec<BoundaryFeature>> {
    let parsed: GeoJson = geojson
        .parse()
        .map_err(|e| Error::InvalidInput(format!("Invalid GeoJSON: {}", e)))?;

    let features = match parsed {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let total = features.len();
    let mut boundaries = Vec::with_capacity(total);
    for feature in &features {
        if let Some(boundary) = feature_boundary(feature)? {
            boundaries.push(BoundaryFeature {
                id: feature_id(feature),
                boundary,
            });
        }
    }

    console_log!(
        "Parsed {} boundary features ({} skipped)",
        boundaries.len(),
        total - boundaries.len()
    );
    Ok(boundaries)
}

fn feature_id(feature: &Feature) -> Option<String> {
    let from_properties = feature
        .properties
        .as_ref()
        .and_then(|props| props.get("id"))
        .and_then(|id| match id {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    from_properties.or_else(|| match &feature.id {
        Some(Id::String(s)) => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

fn feature_boundary(feature: &Feature) -> Result<Option<Boundary>> {
    let Some(geometry) = &feature.geometry else {
        return Ok(None);
    };

    match &geometry.value {
        Value::Polygon(rings) => Ok(Some(Boundary::Single(to_polygon(rings)?))),
        Value::MultiPolygon(polygons) => {
            let parts = polygons
                .iter()
                .map(|rings| to_polygon(rings))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Boundary::Multi(MultiPolygon(parts))))
        }
        _ => Ok(None),
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|ring| to_ring(ring));
    let exterior = rings
        .next()
        .ok_or_else(|| Error::InvalidInput("polygon without rings".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    // Polygon::new closes open rings
    Ok(Polygon::new(exterior, interiors))
}

fn to_ring(positions: &[Vec<f64>]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|position| match position.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(Error::InvalidInput(format!(
                "position needs two values, got {}",
                position.len()
            ))),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

/// GeoJSON view of regions, with `id` and `area` properties.
pub fn regions_to_geojson(regions: &[Region]) -> String {
    let features = regions
        .iter()
        .map(|region| {
            let mut properties = JsonObject::new();
            if let Some(id) = &region.id {
                properties.insert("id".to_string(), serde_json::Value::from(id.clone()));
            }
            properties.insert("area".to_string(), serde_json::Value::from(region.area));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::from(&region.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
    .to_string()
}
