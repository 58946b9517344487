//! Planar geometry operations the pipeline relies on.
//!
//! Stages only talk to [`GeometryEngine`], so the backing library can be
//! swapped without touching simplification or overlap removal.

use geo::{
    Area, BooleanOps, Centroid, ChaikinSmoothing, Coord, LineString, MultiPolygon, Polygon, Scale,
    SimplifyVwPreserve,
};

pub trait GeometryEngine: Sync {
    /// Topology-preserving simplification.
    fn simplify(&self, polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64>;

    /// Corner smoothing, repeated `iterations` times.
    fn smooth(&self, polygon: &Polygon<f64>, iterations: usize) -> Polygon<f64>;

    /// Uniform scale around the mean of all ring vertices, closing
    /// coordinates excluded.
    fn scale(&self, geometry: &MultiPolygon<f64>, factor: f64) -> MultiPolygon<f64>;

    /// Unsigned planar area, holes subtracted.
    fn area(&self, geometry: &MultiPolygon<f64>) -> f64;

    /// Boolean difference `a - b`.
    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64>;

    fn centroid(&self, geometry: &MultiPolygon<f64>) -> Option<Coord<f64>>;
}

/// [`GeometryEngine`] backed by the `geo` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoEngine;

impl GeometryEngine for GeoEngine {
    fn simplify(&self, polygon: &Polygon<f64>, tolerance: f64) -> Polygon<f64> {
        polygon.simplify_vw_preserve(&tolerance)
    }

    fn smooth(&self, polygon: &Polygon<f64>, iterations: usize) -> Polygon<f64> {
        polygon.chaikin_smoothing(iterations)
    }

    fn scale(&self, geometry: &MultiPolygon<f64>, factor: f64) -> MultiPolygon<f64> {
        match vertex_mean(geometry) {
            Some(origin) => geometry.scale_around_point(factor, factor, origin),
            None => geometry.clone(),
        }
    }

    fn area(&self, geometry: &MultiPolygon<f64>) -> f64 {
        geometry.unsigned_area()
    }

    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        if a.0.is_empty() || b.0.is_empty() {
            return a.clone();
        }
        a.difference(b)
    }

    fn centroid(&self, geometry: &MultiPolygon<f64>) -> Option<Coord<f64>> {
        geometry.centroid().map(|point| point.0)
    }
}

/// Mean of the ring vertices, each ring counted without its closing point.
pub fn vertex_mean(geometry: &MultiPolygon<f64>) -> Option<Coord<f64>> {
    let rings = geometry
        .0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()));

    let mut sum = Coord { x: 0.0, y: 0.0 };
    let mut count = 0usize;
    for ring in rings {
        for coord in open_ring(ring) {
            sum = sum + *coord;
            count += 1;
        }
    }

    (count > 0).then(|| Coord {
        x: sum.x / count as f64,
        y: sum.y / count as f64,
    })
}

fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    let coords = ring.0.as_slice();
    match coords.split_last() {
        Some((_, rest)) if ring.is_closed() && !rest.is_empty() => rest,
        _ => coords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size)
        ]
    }

    #[test]
    fn scale_keeps_centroid_and_grows_area() {
        let engine = GeoEngine;
        let before = MultiPolygon(vec![square(10.0, 10.0, 2.0)]);
        let after = engine.scale(&before, 1.5);
        assert!((engine.area(&after) - engine.area(&before) * 2.25).abs() < 1e-9);

        let c0 = engine.centroid(&before).unwrap();
        let c1 = engine.centroid(&after).unwrap();
        assert!((c0.x - c1.x).abs() < 1e-9 && (c0.y - c1.y).abs() < 1e-9);
    }

    #[test]
    fn scale_origin_is_the_vertex_mean() {
        let engine = GeoEngine;
        // extra vertex on the bottom edge drags the mean below the area centroid
        let lopsided = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)
        ]]);
        let origin = vertex_mean(&lopsided).unwrap();
        assert!((origin.x - 1.0).abs() < 1e-12);
        assert!((origin.y - 0.8).abs() < 1e-12);

        let scaled = engine.scale(&lopsided, 2.0);
        // the origin itself does not move
        let first = scaled.0[0].exterior().0[0];
        assert!((first.x + 1.0).abs() < 1e-12 && (first.y + 0.8).abs() < 1e-12);

        let parts = MultiPolygon(vec![square(0.0, 0.0, 1.0), square(9.0, 0.0, 1.0)]);
        let grown = engine.scale(&parts, 2.0);
        assert_eq!(grown.0.len(), 2);
        assert!((engine.area(&grown) - 8.0).abs() < 1e-9);
        assert_eq!(vertex_mean(&MultiPolygon::<f64>(vec![])), None);
    }

    #[test]
    fn difference_removes_shared_area() {
        let engine = GeoEngine;
        let a = MultiPolygon(vec![square(0.0, 0.0, 2.0)]);
        let b = MultiPolygon(vec![square(1.0, 0.0, 2.0)]);

        let diff = engine.difference(&a, &b);
        assert!((engine.area(&diff) - 2.0).abs() < 1e-9);

        let empty = MultiPolygon::<f64>(vec![]);
        assert_eq!(engine.difference(&a, &empty), a);
        assert!(engine.difference(&empty, &a).0.is_empty());
    }

    #[test]
    fn smoothing_cuts_corners() {
        let engine = GeoEngine;
        let smoothed = engine.smooth(&square(0.0, 0.0, 1.0), 2);
        // each pass doubles the corner count of a closed ring
        assert_eq!(smoothed.exterior().0.len(), 17);
        let area = engine.area(&MultiPolygon(vec![smoothed]));
        assert!(area < 1.0 && area > 0.5);
    }
}
