use geo::{LineString, MultiPolygon, Polygon};
use rayon::prelude::*;

use crate::console_log;
use crate::geometry_engine::GeometryEngine;
use crate::models::{BoundaryFeature, Region};
use crate::{Error, Result};

/// Regions are grown by this factor after smoothing so neighbouring
/// outlines close the gaps that simplification opened between them.
pub const GAP_SCALE_FACTOR: f64 = 1.07;

#[derive(Debug, Clone, Copy)]
pub struct SimplifyOptions {
    pub tolerance: f64,
    pub iterations: usize,
    pub color_index: f64,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            iterations: 2,
            color_index: 4.0,
        }
    }
}

/// Simplify, smooth, grow and de-hole every feature, then sort the resulting
/// regions by ascending area.
pub fn simplify_regions<E: GeometryEngine>(
    engine: &E,
    features: &[BoundaryFeature],
    options: &SimplifyOptions,
) -> Result<Vec<Region>> {
    let mut regions = features
        .par_iter()
        .map(|feature| simplify_feature(engine, feature, options))
        .collect::<Result<Vec<_>>>()?;

    // stable, so equal areas keep input order
    regions.sort_by(|a, b| a.area.total_cmp(&b.area));

    console_log!("Simplified {} regions", regions.len());
    Ok(regions)
}

/// Runs every part of the boundary through simplification and smoothing,
/// then grows the parts together. Parts that collapse are dropped; the
/// feature is only invalid when nothing is left.
pub fn simplify_feature<E: GeometryEngine>(
    engine: &E,
    feature: &BoundaryFeature,
    options: &SimplifyOptions,
) -> Result<Region> {
    let name = feature.id.as_deref().unwrap_or("<unnamed>");
    let parts = feature.boundary.parts();
    if parts.is_empty() {
        return Err(Error::InvalidGeometry(format!("region '{}' has no polygon", name)));
    }

    let mut kept = Vec::with_capacity(parts.len());
    let mut fewest = usize::MAX;
    for part in parts {
        let simplified = engine.simplify(part, options.tolerance);
        let distinct = distinct_points(simplified.exterior());
        if distinct < 3 {
            fewest = fewest.min(distinct);
            continue;
        }
        kept.push(engine.smooth(&simplified, options.iterations));
    }

    if kept.is_empty() {
        return Err(Error::InvalidGeometry(format!(
            "region '{}' collapsed to {} distinct points after simplification",
            name, fewest
        )));
    }
    if kept.len() < parts.len() {
        console_log!(
            "Region '{}': dropped {} collapsed parts",
            name,
            parts.len() - kept.len()
        );
    }

    let scaled = engine.scale(&MultiPolygon(kept), GAP_SCALE_FACTOR);
    let area = engine.area(&scaled);
    let outers = scaled
        .0
        .into_iter()
        .map(|polygon| Polygon::new(polygon.exterior().clone(), vec![]))
        .collect();

    Ok(Region {
        id: feature.id.clone(),
        geometry: MultiPolygon(outers),
        area,
        color_index: options.color_index,
    })
}

fn distinct_points(ring: &LineString<f64>) -> usize {
    let mut points: Vec<_> = ring.0.clone();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points.dedup();
    points.len()
}
