use wasm_bindgen::prelude::*;

// Create a console module for logging
pub mod console;
// Error taxonomy shared by every stage
pub mod error;
// Run options and their defaults
pub mod config;
// Shared data structures
pub mod models;
// Planar geometry capabilities behind a trait
pub mod geometry_engine;
// Projection onto the square canvas
pub mod projection;
// Simplification, smoothing and scale-up of regions
pub mod simplify;
// Pairwise overlap removal
pub mod overlap;
// Depth-keyed colors
pub mod color_scale;
// Import our geometry functions
#[path = "../geometry_functions/extrude.rs"]
pub mod extrude;
// Label anchors per region
pub mod labels;
// Scene graph assembly and centering
pub mod scene;
// Binary glTF output
pub mod gltf_writer;
// GeoJSON input and output
pub mod geojson_features;
// The whole conversion
pub mod pipeline;

pub use config::PipelineOptions;
pub use error::{Error, Result};
pub use labels::LabelMaps;
pub use models::{Boundary, BoundaryFeature, BoundingBox, Mesh, Region};
pub use pipeline::{build_glb, build_scene, geojson_to_gltf, write_glb};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Logs to the JS console in the browser and to `tracing` everywhere else
#[cfg(target_arch = "wasm32")]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::console::log(&format!($($t)*)))
}

#[cfg(not(target_arch = "wasm32"))]
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (::tracing::debug!($($t)*))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("WASM module initialized successfully");
    });
}

fn to_js_error(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Convert a GeoJSON FeatureCollection into GLB bytes.
///
/// `labels_json` holds `desktopLabels` / `mobileLabels` maps and
/// `options_json` the camelCase run options; both may be empty strings.
#[wasm_bindgen]
pub fn geojson_to_glb(geojson: &str, labels_json: &str, options_json: &str) -> std::result::Result<Vec<u8>, JsValue> {
    let features = geojson_features::parse_boundaries(geojson).map_err(to_js_error)?;
    let labels = LabelMaps::from_json(labels_json).map_err(to_js_error)?;
    let options = PipelineOptions::from_json(options_json).map_err(to_js_error)?;

    console_log!("Converting {} features to GLB", features.len());
    build_glb(&features, &labels, &options).map_err(to_js_error)
}

/// Simplified, de-overlapped regions as a GeoJSON FeatureCollection in
/// canvas coordinates.
#[wasm_bindgen]
pub fn simplify_geojson(geojson: &str, options_json: &str) -> std::result::Result<String, JsValue> {
    let features = geojson_features::parse_boundaries(geojson).map_err(to_js_error)?;
    let options = PipelineOptions::from_json(options_json).map_err(to_js_error)?;

    let regions = pipeline::prepare_regions(&geometry_engine::GeoEngine, &features, &options)
        .map_err(to_js_error)?;
    Ok(geojson_features::regions_to_geojson(&regions))
}
