use earcutr::earcut;
use geo::LineString;
use js_sys::{Float32Array, Object, Uint32Array};
use serde::Deserialize;
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use wasm_bindgen::prelude::*;

use crate::color_scale::ColorScale;
use crate::models::{BoundingBox, Material, Mesh};
use crate::{Error, Result};

const EPSILON: f64 = 1e-10;

/// Vertices whose position and uv agree on this grid are welded.
const WELD_TOLERANCE: f64 = 1e-4;

/// Simple 2D vector struct
#[derive(Clone, Copy, Debug)]
struct Vector2 {
    x: f64,
    y: f64,
}

impl Vector2 {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn add_scaled_vector(&self, v: &Vector2, s: f64) -> Self {
        Self {
            x: self.x + v.x * s,
            y: self.y + v.y * s,
        }
    }
}

/// Extrusion options.
#[derive(Clone, Debug)]
pub struct ExtrudeOptions {
    pub steps: u32,
    pub depth: f64,
    /// How far the bevel reaches below the base and above the top
    pub bevel_thickness: f64,
    /// How far the bevel reaches into the outline
    pub bevel_size: f64,
    /// Added to the bevel size on every ring, including the side walls
    pub bevel_offset: f64,
    /// Zero disables the bevel
    pub bevel_segments: u32,
}

impl Default for ExtrudeOptions {
    fn default() -> Self {
        Self {
            steps: 1,
            depth: 4.0,
            bevel_thickness: 0.02,
            bevel_size: 0.2,
            bevel_offset: -0.2,
            bevel_segments: 1,
        }
    }
}

// For JSON deserialization compatibility
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtrudeOptionsJson {
    #[serde(default = "default_steps")]
    steps: u32,
    #[serde(default = "default_depth")]
    depth: f64,
    #[serde(default = "default_bevel_thickness")]
    bevel_thickness: f64,
    #[serde(default = "default_bevel_size")]
    bevel_size: f64,
    #[serde(default = "default_bevel_offset")]
    bevel_offset: f64,
    #[serde(default = "default_bevel_segments")]
    bevel_segments: u32,
    #[serde(default = "default_color_index")]
    color_index: f64,
}

// Default values for JSON options
fn default_steps() -> u32 {
    1
}
fn default_depth() -> f64 {
    4.0
}
fn default_bevel_thickness() -> f64 {
    0.02
}
fn default_bevel_size() -> f64 {
    0.2
}
fn default_bevel_offset() -> f64 {
    -0.2
}
fn default_bevel_segments() -> u32 {
    1
}
fn default_color_index() -> f64 {
    4.0
}

// World-space UVs: lids use x/y, walls use x or y along the dominant edge
// direction and 1 - z across
struct UVGenerator;

impl UVGenerator {
    fn generate_top_uv(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [Vector2; 3] {
        [
            Vector2::new(a[0], a[1]),
            Vector2::new(b[0], b[1]),
            Vector2::new(c[0], c[1]),
        ]
    }

    fn generate_side_wall_uv(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> [Vector2; 4] {
        if (a[1] - b[1]).abs() < (a[0] - b[0]).abs() {
            [
                Vector2::new(a[0], 1.0 - a[2]),
                Vector2::new(b[0], 1.0 - b[2]),
                Vector2::new(c[0], 1.0 - c[2]),
                Vector2::new(d[0], 1.0 - d[2]),
            ]
        } else {
            [
                Vector2::new(a[1], 1.0 - a[2]),
                Vector2::new(b[1], 1.0 - b[2]),
                Vector2::new(c[1], 1.0 - c[2]),
                Vector2::new(d[1], 1.0 - d[2]),
            ]
        }
    }
}

/// Non-indexed triangles collected from the vertex layers.
struct TriangleSoup<'a> {
    placeholder: &'a [[f64; 3]],
    positions: Vec<[f64; 3]>,
    uvs: Vec<[f64; 2]>,
}

impl<'a> TriangleSoup<'a> {
    fn new(placeholder: &'a [[f64; 3]]) -> Self {
        Self {
            placeholder,
            positions: Vec::new(),
            uvs: Vec::new(),
        }
    }

    fn add_triangle(&mut self, a: usize, b: usize, c: usize) {
        let (pa, pb, pc) = (self.placeholder[a], self.placeholder[b], self.placeholder[c]);
        self.positions.extend_from_slice(&[pa, pb, pc]);
        for uv in UVGenerator::generate_top_uv(pa, pb, pc) {
            self.uvs.push([uv.x, uv.y]);
        }
    }

    // Two triangles a-b-d and b-c-d
    fn add_quad(&mut self, a: usize, b: usize, c: usize, d: usize) {
        let (pa, pb, pc, pd) = (
            self.placeholder[a],
            self.placeholder[b],
            self.placeholder[c],
            self.placeholder[d],
        );
        self.positions.extend_from_slice(&[pa, pb, pd, pb, pc, pd]);
        let uvs = UVGenerator::generate_side_wall_uv(pa, pb, pc, pd);
        for i in [0, 1, 3, 1, 2, 3] {
            self.uvs.push([uvs[i].x, uvs[i].y]);
        }
    }
}

/// Helper function to check if points are in clockwise order
fn is_clockwise(points: &[Vector2]) -> bool {
    signed_area(points) <= 0.0
}

fn signed_area(points: &[Vector2]) -> f64 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area * 0.5
}

fn is_overlapping(a: &Vector2, b: &Vector2) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let scale = f64::max(f64::max(a.x.abs(), a.y.abs()), f64::max(b.x.abs(), b.y.abs())).max(1.0);
    dx * dx + dy * dy <= EPSILON * EPSILON * scale * scale
}

/// Merge overlapping points in a contour, including a repeated closing point
fn merge_overlapping_points(points: &mut Vec<Vector2>) {
    if points.is_empty() {
        return;
    }

    let mut i = 1;
    while i < points.len() {
        if is_overlapping(&points[i], &points[i - 1]) {
            points.remove(i);
            continue;
        }
        i += 1;
    }

    while points.len() > 1 && is_overlapping(&points[0], &points[points.len() - 1]) {
        points.pop();
    }
}

/// Miter vector that moves a contour point when the bevel is applied.
///
/// It is deliberately not normalized so sharp corners keep their shape, but
/// it is shortened when it would produce a spike.
fn get_bevel_vec(in_pt: Vector2, in_prev: Vector2, in_next: Vector2) -> Vector2 {
    let v_prev_x = in_pt.x - in_prev.x;
    let v_prev_y = in_pt.y - in_prev.y;
    let v_next_x = in_next.x - in_pt.x;
    let v_next_y = in_next.y - in_pt.y;
    let v_prev_lensq = v_prev_x * v_prev_x + v_prev_y * v_prev_y;

    let collinear0 = v_prev_x * v_next_y - v_prev_y * v_next_x;

    let (v_trans_x, v_trans_y, shrink_by) = if collinear0.abs() > f64::EPSILON {
        let v_prev_len = v_prev_lensq.sqrt();
        let v_next_len = (v_next_x * v_next_x + v_next_y * v_next_y).sqrt();

        // shift adjacent points by unit vectors to the left
        let prev_shift_x = in_prev.x - v_prev_y / v_prev_len;
        let prev_shift_y = in_prev.y + v_prev_x / v_prev_len;
        let next_shift_x = in_next.x - v_next_y / v_next_len;
        let next_shift_y = in_next.y + v_next_x / v_next_len;

        // scaling factor for v_prev to the intersection point
        let sf = ((next_shift_x - prev_shift_x) * v_next_y - (next_shift_y - prev_shift_y) * v_next_x)
            / collinear0;

        let v_trans_x = prev_shift_x + v_prev_x * sf - in_pt.x;
        let v_trans_y = prev_shift_y + v_prev_y * sf - in_pt.y;

        let v_trans_lensq = v_trans_x * v_trans_x + v_trans_y * v_trans_y;
        if v_trans_lensq <= 2.0 {
            return Vector2::new(v_trans_x, v_trans_y);
        }
        (v_trans_x, v_trans_y, (v_trans_lensq / 2.0).sqrt())
    } else {
        // collinear edges, either continuing or folding back
        let direction_eq = if v_prev_x > f64::EPSILON {
            v_next_x > f64::EPSILON
        } else if v_prev_x < -f64::EPSILON {
            v_next_x < -f64::EPSILON
        } else {
            v_prev_y.signum() == v_next_y.signum()
        };

        if direction_eq {
            (-v_prev_y, v_prev_x, v_prev_lensq.sqrt())
        } else {
            (v_prev_x, v_prev_y, (v_prev_lensq / 2.0).sqrt())
        }
    };

    Vector2::new(v_trans_x / shrink_by, v_trans_y / shrink_by)
}

/// Extrude a JS ring (`[[x, y], ...]`) and return `position`, `uv` and
/// `index` typed arrays. Options use camelCase keys and fall back to the
/// district defaults.
#[wasm_bindgen]
pub fn extrude_geometry(ring: &JsValue, options: &JsValue) -> std::result::Result<JsValue, JsValue> {
    let raw_ring: Vec<[f64; 2]> = serde_wasm_bindgen::from_value(ring.clone())
        .map_err(|e| JsValue::from_str(&format!("Invalid ring: {}", e)))?;

    let options_json: ExtrudeOptionsJson = if options.is_undefined() || options.is_null() {
        serde_json::from_str("{}").map_err(|e| JsValue::from_str(&e.to_string()))?
    } else {
        serde_wasm_bindgen::from_value(options.clone())
            .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?
    };

    let opts = ExtrudeOptions {
        steps: options_json.steps,
        depth: options_json.depth,
        bevel_thickness: options_json.bevel_thickness,
        bevel_size: options_json.bevel_size,
        bevel_offset: options_json.bevel_offset,
        bevel_segments: options_json.bevel_segments,
    };
    let color = ColorScale::default().linear_rgba(options_json.color_index);

    let ring: LineString<f64> = raw_ring.into_iter().map(|[x, y]| (x, y)).collect();
    let mesh = extrude_ring(&ring, &opts, color).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let positions: Vec<f32> = mesh.positions.iter().flatten().copied().collect();
    let uvs: Vec<f32> = mesh.uvs.iter().flatten().copied().collect();

    let result = Object::new();
    js_sys::Reflect::set(&result, &JsValue::from_str("position"), &Float32Array::from(positions.as_slice()))?;
    js_sys::Reflect::set(&result, &JsValue::from_str("uv"), &Float32Array::from(uvs.as_slice()))?;
    js_sys::Reflect::set(&result, &JsValue::from_str("index"), &Uint32Array::from(mesh.indices.as_slice()))?;

    Ok(result.into())
}

/// Extrude one closed ring into a beveled, indexed solid.
///
/// The ring lies in the x/y plane and is swept along +z from 0 to
/// `opts.depth`; bevel rings add `bevel_thickness` below and above.
pub fn extrude_ring(ring: &LineString<f64>, opts: &ExtrudeOptions, base_color: [f32; 4]) -> Result<Mesh> {
    let mut contour: Vec<Vector2> = ring.0.iter().map(|c| Vector2::new(c.x, c.y)).collect();
    merge_overlapping_points(&mut contour);

    if contour.len() < 3 {
        return Err(Error::InvalidGeometry(format!(
            "ring has {} distinct points, at least 3 are needed",
            contour.len()
        )));
    }
    let area = signed_area(&contour);
    if !area.is_finite() || area.abs() <= EPSILON {
        return Err(Error::InvalidGeometry("ring is collinear or has zero area".to_string()));
    }

    // Lids and walls are wound for a clockwise contour
    if !is_clockwise(&contour) {
        contour.reverse();
    }

    let data: Vec<f64> = contour.iter().flat_map(|p| [p.x, p.y]).collect();
    let triangles = earcut(&data, &[], 2)
        .map_err(|e| Error::InvalidGeometry(format!("triangulation failed: {:?}", e)))?;
    if triangles.is_empty() {
        return Err(Error::InvalidGeometry("ring could not be triangulated".to_string()));
    }
    let faces: Vec<[usize; 3]> = triangles.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();

    let steps = opts.steps.max(1) as usize;
    // A bevel with neither thickness nor size would stack layers on the lids
    let bevel_enabled =
        opts.bevel_segments > 0 && (opts.bevel_thickness != 0.0 || opts.bevel_size != 0.0);
    let (thickness, size, offset, segments) = if bevel_enabled {
        (opts.bevel_thickness, opts.bevel_size, opts.bevel_offset, opts.bevel_segments as usize)
    } else {
        (0.0, 0.0, 0.0, 0)
    };

    let vlen = contour.len();
    let movements: Vec<Vector2> = (0..vlen)
        .map(|i| {
            let prev = contour[(i + vlen - 1) % vlen];
            let next = contour[(i + 1) % vlen];
            get_bevel_vec(contour[i], prev, next)
        })
        .collect();

    // Vertex layers, bottom to top, vlen vertices each
    let mut placeholder: Vec<[f64; 3]> = Vec::with_capacity(vlen * (steps + 2 * segments + 1));
    let mut push_layer = |bs: f64, z: f64| {
        for (pt, movement) in contour.iter().zip(&movements) {
            let vert = pt.add_scaled_vector(movement, bs);
            placeholder.push([vert.x, vert.y, z]);
        }
    };

    for b in 0..segments {
        let t = b as f64 / segments as f64;
        let z = thickness * (t * FRAC_PI_2).cos();
        let bs = size * (t * FRAC_PI_2).sin() + offset;
        push_layer(bs, -z);
    }

    let bs = size + offset;
    push_layer(bs, 0.0);
    for s in 1..=steps {
        push_layer(bs, opts.depth / steps as f64 * s as f64);
    }

    for b in (0..segments).rev() {
        let t = b as f64 / segments as f64;
        let z = thickness * (t * FRAC_PI_2).cos();
        let bs = size * (t * FRAC_PI_2).sin() + offset;
        push_layer(bs, opts.depth + z);
    }

    let top_layer = steps + segments * 2;
    let mut soup = TriangleSoup::new(&placeholder);

    // Bottom faces
    for face in &faces {
        soup.add_triangle(face[2], face[1], face[0]);
    }

    // Top faces
    let offset_top = vlen * top_layer;
    for face in &faces {
        soup.add_triangle(face[0] + offset_top, face[1] + offset_top, face[2] + offset_top);
    }

    // Side walls
    for i in (0..vlen).rev() {
        let j = i;
        let k = if i == 0 { vlen - 1 } else { i - 1 };

        for s in 0..top_layer {
            let slen1 = vlen * s;
            let slen2 = vlen * (s + 1);

            soup.add_quad(j + slen1, k + slen1, k + slen2, j + slen2);
        }
    }

    let (indices, positions, uvs) = weld(&soup.positions, &soup.uvs);
    let bounds = BoundingBox::from_positions(&positions);

    Ok(Mesh {
        indices,
        positions,
        uvs,
        material: Material::flat(base_color),
        bounds,
    })
}

// Keyed on the f32 that gets written, so equal output vertices always match
fn quantize(value: f32) -> i64 {
    (f64::from(value) / WELD_TOLERANCE).round() as i64
}

/// Share one index between vertices with the same position and uv.
fn weld(positions: &[[f64; 3]], uvs: &[[f64; 2]]) -> (Vec<u32>, Vec<[f32; 3]>, Vec<[f32; 2]>) {
    let mut lookup: HashMap<[i64; 5], u32> = HashMap::with_capacity(positions.len());
    let mut indices = Vec::with_capacity(positions.len());
    let mut out_positions: Vec<[f32; 3]> = Vec::new();
    let mut out_uvs: Vec<[f32; 2]> = Vec::new();

    for (p, uv) in positions.iter().zip(uvs) {
        let position = [p[0] as f32, p[1] as f32, p[2] as f32];
        let uv = [uv[0] as f32, uv[1] as f32];
        let key = [
            quantize(position[0]),
            quantize(position[1]),
            quantize(position[2]),
            quantize(uv[0]),
            quantize(uv[1]),
        ];
        let index = *lookup.entry(key).or_insert_with(|| {
            out_positions.push(position);
            out_uvs.push(uv);
            (out_positions.len() - 1) as u32
        });
        indices.push(index);
    }

    (indices, out_positions, out_uvs)
}
