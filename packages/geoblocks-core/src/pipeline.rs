use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::color_scale::ColorScale;
use crate::config::PipelineOptions;
use crate::console_log;
use crate::extrude::extrude_ring;
use crate::geometry_engine::{GeoEngine, GeometryEngine};
use crate::gltf_writer::scene_to_glb;
use crate::labels::LabelMaps;
use crate::models::{Boundary, BoundaryFeature, Mesh, Region};
use crate::overlap::resolve_overlaps;
use crate::projection::{mercator, ProjectionNormalizer};
use crate::scene::{assemble_scene, SceneGraph};
use crate::simplify::simplify_regions;
use crate::{Error, Result};

/// Project, simplify and de-overlap the features.
pub fn prepare_regions<E: GeometryEngine>(
    engine: &E,
    features: &[BoundaryFeature],
    options: &PipelineOptions,
) -> Result<Vec<Region>> {
    let normalizer = ProjectionNormalizer::fit(
        features.iter().flat_map(|f| f.boundary.coords()),
        mercator,
        options.side,
    )?;

    let projected: Vec<BoundaryFeature> = features
        .iter()
        .map(|feature| BoundaryFeature {
            id: feature.id.clone(),
            boundary: match &feature.boundary {
                Boundary::Single(polygon) => Boundary::Single(normalizer.apply_polygon(polygon)),
                Boundary::Multi(multi) => Boundary::Multi(normalizer.apply_multi_polygon(multi)),
            },
        })
        .collect();

    let regions = simplify_regions(engine, &projected, &options.simplify_options())?;
    Ok(resolve_overlaps(engine, regions))
}

/// Extrude every non-empty region, keeping the region order.
pub fn extrude_regions(regions: &[Region], options: &PipelineOptions) -> Result<Vec<(Option<String>, Mesh)>> {
    let extrude_options = options.extrude_options();
    let colors = ColorScale::default();

    let meshes = regions
        .par_iter()
        .filter_map(|region| region.outline().filter(|_| !region.is_empty()).map(|ring| (region, ring)))
        .map(|(region, ring)| {
            let color = colors.linear_rgba(region.color_index);
            extrude_ring(ring, &extrude_options, color).map(|mesh| (region.id.clone(), mesh))
        })
        .collect::<Result<Vec<_>>>()?;

    let dropped = regions.len() - meshes.len();
    if dropped > 0 {
        console_log!("Dropped {} empty regions before extrusion", dropped);
    }
    console_log!("Extruded {} region meshes", meshes.len());
    Ok(meshes)
}

/// Run every stage up to the assembled scene.
pub fn build_scene(
    features: &[BoundaryFeature],
    labels: &LabelMaps,
    options: &PipelineOptions,
) -> Result<SceneGraph> {
    let engine = GeoEngine;
    let regions = prepare_regions(&engine, features, options)?;
    let meshes = extrude_regions(&regions, options)?;

    let scene = if options.label_centroid_fallback {
        let filled = labels.with_centroid_fallback(&engine, &regions);
        assemble_scene(meshes, &filled, &options.scene_options())
    } else {
        assemble_scene(meshes, labels, &options.scene_options())
    };
    Ok(scene)
}

/// The whole conversion, returning the GLB bytes.
pub fn build_glb(
    features: &[BoundaryFeature],
    labels: &LabelMaps,
    options: &PipelineOptions,
) -> Result<Vec<u8>> {
    let scene = build_scene(features, labels, options)?;
    scene_to_glb(&scene)
}

/// Convert and write to `writer`. Nothing is written unless the whole
/// asset could be built.
pub fn write_glb<W: Write>(
    features: &[BoundaryFeature],
    mut writer: W,
    labels: &LabelMaps,
    options: &PipelineOptions,
) -> Result<()> {
    let bytes = build_glb(features, labels, options)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Convert and write the asset to `path`.
///
/// The file is only created once the asset is complete, and removed again
/// if writing it fails part way.
pub fn geojson_to_gltf<P: AsRef<Path>>(
    features: &[BoundaryFeature],
    path: P,
    labels: &LabelMaps,
    options: &PipelineOptions,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = build_glb(features, labels, options)?;

    if let Err(err) = fs::write(path, &bytes) {
        // best effort, the write error is what gets reported
        let _ = fs::remove_file(path);
        return Err(Error::SerializationFailure(format!(
            "writing {} failed: {}",
            path.display(),
            err
        )));
    }
    console_log!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
