// Shared data structures for the boundaries-to-scene pipeline
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use nalgebra::Point3;
use serde::Serialize;

/// Input geometry of one boundary feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Boundary {
    Single(Polygon<f64>),
    Multi(MultiPolygon<f64>),
}

impl Boundary {
    /// Every part of the boundary, in input order.
    pub fn parts(&self) -> &[Polygon<f64>] {
        match self {
            Boundary::Single(polygon) => std::slice::from_ref(polygon),
            Boundary::Multi(multi) => &multi.0,
        }
    }

    pub fn coords(&self) -> Box<dyn Iterator<Item = Coord<f64>> + '_> {
        match self {
            Boundary::Single(polygon) => Box::new(polygon_coords(polygon)),
            Boundary::Multi(multi) => Box::new(multi.0.iter().flat_map(polygon_coords)),
        }
    }
}

fn polygon_coords(polygon: &Polygon<f64>) -> impl Iterator<Item = Coord<f64>> + '_ {
    polygon
        .exterior()
        .0
        .iter()
        .chain(polygon.interiors().iter().flat_map(|ring| ring.0.iter()))
        .copied()
}

fn most_vertices(polygons: &[Polygon<f64>]) -> Option<&Polygon<f64>> {
    let mut best: Option<&Polygon<f64>> = None;
    for polygon in polygons {
        match best {
            Some(current) if current.exterior().0.len() >= polygon.exterior().0.len() => {}
            _ => best = Some(polygon),
        }
    }
    best
}

/// A boundary tagged with its stable region identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    pub boundary: Boundary,
}

/// A simplified region ready for overlap removal and extrusion.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: Option<String>,
    pub geometry: MultiPolygon<f64>,
    /// Area measured right after the scale-up, before overlaps were removed
    pub area: f64,
    /// Position on the depth-keyed color scale
    pub color_index: f64,
}

impl Region {
    pub fn with_geometry(&self, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: self.id.clone(),
            geometry,
            area: self.area,
            color_index: self.color_index,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.geometry
            .0
            .iter()
            .all(|polygon| polygon.exterior().0.len() < 4)
    }

    /// Exterior ring that stands in for the whole region.
    ///
    /// For multi-part regions this is the part whose exterior ring has the
    /// most vertices (first one wins ties), which is not necessarily the part
    /// with the largest area. Holes are dropped.
    pub fn outline(&self) -> Option<&LineString<f64>> {
        most_vertices(&self.geometry.0).map(|polygon| polygon.exterior())
    }
}

/// Axis-aligned box, accumulated by union.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn from_positions(positions: &[[f32; 3]]) -> Self {
        positions.iter().fold(Self::empty(), |mut bounds, p| {
            bounds.expand_by_point(p[0] as f64, p[1] as f64, p[2] as f64);
            bounds
        })
    }

    pub fn expand_by_point(&mut self, x: f64, y: f64, z: f64) {
        self.min = Point3::new(self.min.x.min(x), self.min.y.min(y), self.min.z.min(z));
        self.max = Point3::new(self.max.x.max(x), self.max.y.max(y), self.max.z.max(z));
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn size(&self) -> [f64; 3] {
        let d = self.max - self.min;
        [d.x, d.y, d.z]
    }

    pub fn center(&self) -> [f64; 3] {
        let c = nalgebra::center(&self.min, &self.max);
        [c.x, c.y, c.z]
    }

    pub fn translated(&self, offset: [f64; 3]) -> Self {
        let v = nalgebra::Vector3::new(offset[0], offset[1], offset[2]);
        Self {
            min: self.min + v,
            max: self.max + v,
        }
    }
}

/// Flat PBR material of one district block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Material {
    /// Linear RGBA
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metallic: f32,
}

impl Material {
    pub fn flat(base_color: [f32; 4]) -> Self {
        Self {
            base_color,
            roughness: 1.0,
            metallic: 0.0,
        }
    }
}

/// Indexed triangle mesh of one extruded region.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub indices: Vec<u32>,
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub material: Material,
    pub bounds: BoundingBox,
}
