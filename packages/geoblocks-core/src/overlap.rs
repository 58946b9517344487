use crate::console_log;
use crate::geometry_engine::GeometryEngine;
use crate::models::Region;

/// Remove overlaps by subtracting every other region from each region.
///
/// Regions are visited in the given (ascending area) order. Each region is
/// replaced by the result before the next one is visited, so later regions
/// subtract the already trimmed shapes of earlier ones while earlier regions
/// were trimmed against the untouched later ones. This is a full pairwise
/// pass rather than a partition: contested area is lost by both sides of a
/// pair in turn, and shares end up depending on the visiting order.
///
/// Regions may come back empty or split into several parts.
pub fn resolve_overlaps<E: GeometryEngine>(engine: &E, regions: Vec<Region>) -> Vec<Region> {
    let mut resolved = regions;

    for i in 0..resolved.len() {
        let trimmed = resolved
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .fold(resolved[i].geometry.clone(), |geometry, (_, other)| {
                engine.difference(&geometry, &other.geometry)
            });
        resolved[i] = resolved[i].with_geometry(trimmed);
    }

    let empty = resolved.iter().filter(|r| r.is_empty()).count();
    if empty > 0 {
        console_log!("{} regions were fully covered by their neighbours", empty);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry_engine::GeoEngine;
    use geo::{polygon, MultiPolygon, Polygon};

    fn region(id: &str, polygon: Polygon<f64>) -> Region {
        let engine = GeoEngine;
        let geometry = MultiPolygon(vec![polygon]);
        Region {
            id: Some(id.to_string()),
            area: engine.area(&geometry),
            geometry,
            color_index: 4.0,
        }
    }

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x0 + w, y: y0), (x: x0 + w, y: y0 + h), (x: x0, y: y0 + h)]
    }

    fn areas(regions: &[Region]) -> Vec<f64> {
        regions.iter().map(|r| GeoEngine.area(&r.geometry)).collect()
    }

    #[test]
    fn disjoint_regions_are_untouched() {
        let input = vec![region("a", rect(0.0, 0.0, 1.0, 1.0)), region("b", rect(5.0, 0.0, 2.0, 2.0))];
        let resolved = resolve_overlaps(&GeoEngine, input);
        let a = areas(&resolved);
        assert!((a[0] - 1.0).abs() < 1e-9);
        assert!((a[1] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn later_regions_lose_to_earlier_resolved_geometry() {
        // a and b share the strip x in [1, 2]
        let input = vec![region("a", rect(0.0, 0.0, 2.0, 1.0)), region("b", rect(1.0, 0.0, 3.0, 1.0))];
        let resolved = resolve_overlaps(&GeoEngine, input);
        let a = areas(&resolved);

        // a is trimmed against the untouched b and loses the strip,
        // then b is trimmed against the trimmed a and keeps it
        assert!((a[0] - 1.0).abs() < 1e-9);
        assert!((a[1] - 3.0).abs() < 1e-9);
        assert_eq!(resolved[0].id.as_deref(), Some("a"));
        assert_eq!(resolved[1].id.as_deref(), Some("b"));
    }

    #[test]
    fn covered_region_becomes_empty() {
        let input = vec![region("inner", rect(1.0, 1.0, 1.0, 1.0)), region("outer", rect(0.0, 0.0, 4.0, 4.0))];
        let resolved = resolve_overlaps(&GeoEngine, input);

        assert!(resolved[0].is_empty());
        assert!(!resolved[1].is_empty());
        // the stored area is the pre-subtraction one
        assert!((resolved[0].area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn resolution_is_deterministic_and_never_grows() {
        let input = vec![
            region("a", rect(0.0, 0.0, 2.0, 2.0)),
            region("b", rect(1.0, 1.0, 2.0, 2.0)),
            region("c", rect(0.5, 1.5, 3.0, 3.0)),
        ];
        let first = resolve_overlaps(&GeoEngine, input.clone());
        let second = resolve_overlaps(&GeoEngine, input.clone());

        assert_eq!(first, second);
        for (before, after) in input.iter().zip(areas(&first)) {
            assert!(after <= before.area + 1e-9);
        }
    }
}
