use geo::{Coord, MapCoords, MultiPolygon, Polygon};
use std::f64::consts::FRAC_PI_4;

use crate::{Error, Result};

/// Spherical Mercator with the y axis pointing south, like a screen.
///
/// Scale and translation are irrelevant since the normalizer rescales the
/// projected extent anyway.
pub fn mercator(coord: Coord<f64>) -> Coord<f64> {
    let lambda = coord.x.to_radians();
    let phi = coord.y.to_radians();
    Coord {
        x: lambda,
        y: -(FRAC_PI_4 + phi / 2.0).tan().ln(),
    }
}

/// Maps projected coordinates onto an aspect-preserving `side`-sized canvas.
///
/// The axis with the larger extent spans `[0, side]`, the other one
/// `[0, side * minor / major]`.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionNormalizer<P> {
    projection: P,
    min: Coord<f64>,
    extent: Coord<f64>,
    range: Coord<f64>,
}

impl<P> ProjectionNormalizer<P>
where
    P: Fn(Coord<f64>) -> Coord<f64> + Copy,
{
    pub fn fit<I>(coords: I, projection: P, side: f64) -> Result<Self>
    where
        I: IntoIterator<Item = Coord<f64>>,
    {
        let mut min = Coord { x: f64::INFINITY, y: f64::INFINITY };
        let mut max = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };
        let mut first: Option<Coord<f64>> = None;
        let mut distinct = false;

        for coord in coords {
            let p = projection(coord);
            if !p.x.is_finite() || !p.y.is_finite() {
                return Err(Error::InvalidGeometry(format!(
                    "coordinate ({}, {}) cannot be projected",
                    coord.x, coord.y
                )));
            }
            match first {
                None => first = Some(p),
                Some(f) if f != p => distinct = true,
                _ => {}
            }
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        if !distinct {
            return Err(Error::InvalidGeometry(
                "at least two distinct coordinates are needed to fit the canvas".to_string(),
            ));
        }

        let extent = Coord { x: max.x - min.x, y: max.y - min.y };
        let (kx, ky) = aspect_factors(extent.x, extent.y);

        Ok(Self {
            projection,
            min,
            extent,
            range: Coord { x: side * kx, y: side * ky },
        })
    }

    pub fn apply(&self, coord: Coord<f64>) -> Coord<f64> {
        let p = (self.projection)(coord);
        Coord {
            x: rescale(p.x, self.min.x, self.extent.x, self.range.x),
            y: rescale(p.y, self.min.y, self.extent.y, self.range.y),
        }
    }

    pub fn apply_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        polygon.map_coords(|c| self.apply(c))
    }

    pub fn apply_multi_polygon(&self, multi: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        multi.map_coords(|c| self.apply(c))
    }

    /// Canvas size actually used on each axis.
    pub fn canvas(&self) -> Coord<f64> {
        self.range
    }
}

// Larger extent gets factor 1, the other one its ratio to the larger
fn aspect_factors(dx: f64, dy: f64) -> (f64, f64) {
    if dx > dy {
        (1.0, dy / dx)
    } else if dy > dx {
        (dx / dy, 1.0)
    } else {
        (1.0, 1.0)
    }
}

fn rescale(value: f64, min: f64, extent: f64, range: f64) -> f64 {
    if extent > 0.0 {
        (value - min) / extent * range
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(c: Coord<f64>) -> Coord<f64> {
        c
    }

    #[test]
    fn major_axis_fills_canvas() {
        let coords = vec![
            Coord { x: 10.0, y: 5.0 },
            Coord { x: 14.0, y: 6.0 },
            Coord { x: 12.0, y: 5.5 },
        ];
        let normalizer = ProjectionNormalizer::fit(coords.clone(), identity, 200.0).unwrap();

        assert_eq!(normalizer.canvas(), Coord { x: 200.0, y: 50.0 });
        for c in coords {
            let m = normalizer.apply(c);
            assert!(m.x >= 0.0 && m.x <= 200.0);
            assert!(m.y >= 0.0 && m.y <= 50.0 + 1e-9);
        }
        assert_eq!(normalizer.apply(Coord { x: 14.0, y: 6.0 }), Coord { x: 200.0, y: 50.0 });
    }

    #[test]
    fn tall_input_scales_y_to_side() {
        let coords = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 4.0 }];
        let normalizer = ProjectionNormalizer::fit(coords, identity, 100.0).unwrap();
        assert_eq!(normalizer.canvas(), Coord { x: 25.0, y: 100.0 });
    }

    #[test]
    fn equal_extents_use_unit_factors() {
        let coords = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 3.0, y: 3.0 }];
        let normalizer = ProjectionNormalizer::fit(coords, identity, 10.0).unwrap();
        assert_eq!(normalizer.canvas(), Coord { x: 10.0, y: 10.0 });
    }

    #[test]
    fn degenerate_extent_is_rejected() {
        let same = vec![Coord { x: 2.0, y: 2.0 }; 5];
        assert!(matches!(
            ProjectionNormalizer::fit(same, identity, 200.0),
            Err(Error::InvalidGeometry(_))
        ));
        assert!(ProjectionNormalizer::fit(Vec::new(), identity, 200.0).is_err());
    }

    #[test]
    fn flat_axis_maps_to_zero() {
        let coords = vec![Coord { x: 0.0, y: 7.0 }, Coord { x: 5.0, y: 7.0 }];
        let normalizer = ProjectionNormalizer::fit(coords, identity, 200.0).unwrap();
        assert_eq!(normalizer.apply(Coord { x: 5.0, y: 7.0 }), Coord { x: 200.0, y: 0.0 });
    }

    #[test]
    fn mercator_flips_latitude() {
        let north = mercator(Coord { x: 30.0, y: 50.0 });
        let south = mercator(Coord { x: 30.0, y: 45.0 });
        assert!(north.y < south.y);
        assert!(mercator(Coord { x: 0.0, y: 0.0 }).y.abs() < 1e-12);
        assert!(ProjectionNormalizer::fit(
            vec![Coord { x: f64::NAN, y: 10.0 }, Coord { x: 1.0, y: 0.0 }],
            mercator,
            200.0
        )
        .is_err());
    }
}
