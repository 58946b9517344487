//! Binary glTF output for an assembled [`SceneGraph`].
//!
//! Every mesh appends its indices, positions and uvs to one shared buffer;
//! each slice gets its own buffer view and accessor.

use gltf::binary::{Glb, Header};
use gltf::json;
use gltf::json::validation::Checked::Valid;
use gltf::json::validation::USize64;
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::console_log;
use crate::models::Mesh;
use crate::scene::{SceneGraph, SceneNode};
use crate::{Error, Result};

const MESH_NAME: &str = "District";

/// Serialize the scene into GLB bytes.
pub fn scene_to_glb(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut root = json::Root::default();
    let mut bin: Vec<u8> = Vec::new();

    // The buffer length is patched in once every mesh has been appended
    let buffer = root.push(json::Buffer {
        byte_length: USize64(0),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    });

    let mut children = Vec::with_capacity(scene.root.children.len());
    for node in &scene.root.children {
        children.push(push_node(&mut root, &mut bin, buffer, node)?);
    }

    let group = root.push(json::Node {
        name: Some(scene.root.name.clone()),
        children: Some(children),
        translation: Some(to_f32(scene.root.translation)),
        ..Default::default()
    });

    let scene_index = root.push(json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(scene.name.clone()),
        nodes: vec![group],
    });
    root.scene = Some(scene_index);

    root.buffers[buffer.value()].byte_length = USize64::from(bin.len());

    let json_bytes =
        serde_json::to_vec(&root).map_err(|e| Error::SerializationFailure(e.to_string()))?;
    let length = 12 + 8 + align_to_four(json_bytes.len()) + 8 + align_to_four(bin.len());
    let length = u32::try_from(length)
        .map_err(|_| Error::SerializationFailure(format!("asset of {} bytes is too large", length)))?;

    let glb = Glb {
        header: Header {
            magic: *b"glTF",
            version: 2,
            length,
        },
        json: Cow::Owned(json_bytes),
        bin: Some(Cow::Owned(bin)),
    };
    let bytes = glb.to_vec()?;

    console_log!(
        "Wrote GLB with {} region nodes, {} bytes",
        scene.root.children.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn push_node(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer: json::Index<json::Buffer>,
    node: &SceneNode,
) -> Result<json::Index<json::Node>> {
    let mesh = match &node.mesh {
        Some(mesh) => Some(push_mesh(root, bin, buffer, mesh)),
        None => None,
    };

    let extras = match &node.extras {
        Some(extras) => Some(
            serde_json::value::to_raw_value(extras)
                .map_err(|e| Error::SerializationFailure(e.to_string()))?,
        ),
        None => None,
    };

    Ok(root.push(json::Node {
        name: Some(node.name.clone()),
        mesh,
        translation: Some(to_f32(node.translation)),
        extras,
        ..Default::default()
    }))
}

fn push_mesh(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer: json::Index<json::Buffer>,
    mesh: &Mesh,
) -> json::Index<json::Mesh> {
    let indices = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(mesh.indices.as_slice()),
        mesh.indices.len(),
        json::accessor::ComponentType::U32,
        json::accessor::Type::Scalar,
        json::buffer::Target::ElementArrayBuffer,
        None,
    );

    // POSITION accessors must carry min/max
    let bounds = Some((
        json::Value::from(vec![mesh.bounds.min.x, mesh.bounds.min.y, mesh.bounds.min.z]),
        json::Value::from(vec![mesh.bounds.max.x, mesh.bounds.max.y, mesh.bounds.max.z]),
    ));
    let positions = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(mesh.positions.as_slice()),
        mesh.positions.len(),
        json::accessor::ComponentType::F32,
        json::accessor::Type::Vec3,
        json::buffer::Target::ArrayBuffer,
        bounds,
    );

    let uvs = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(mesh.uvs.as_slice()),
        mesh.uvs.len(),
        json::accessor::ComponentType::F32,
        json::accessor::Type::Vec2,
        json::buffer::Target::ArrayBuffer,
        None,
    );

    let material = root.push(json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_factor: json::material::PbrBaseColorFactor(mesh.material.base_color),
            metallic_factor: json::material::StrengthFactor(mesh.material.metallic),
            roughness_factor: json::material::StrengthFactor(mesh.material.roughness),
            ..Default::default()
        },
        ..Default::default()
    });

    let mut attributes = BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);
    attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), uvs);

    let primitive = json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(indices),
        material: Some(material),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    };

    root.push(json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(MESH_NAME.to_string()),
        primitives: vec![primitive],
        weights: None,
    })
}

#[allow(clippy::too_many_arguments)]
fn push_accessor(
    root: &mut json::Root,
    bin: &mut Vec<u8>,
    buffer: json::Index<json::Buffer>,
    bytes: &[u8],
    count: usize,
    component_type: json::accessor::ComponentType,
    type_: json::accessor::Type,
    target: json::buffer::Target,
    min_max: Option<(json::Value, json::Value)>,
) -> json::Index<json::Accessor> {
    let offset = bin.len();
    bin.extend_from_slice(bytes);
    // all components are 4 bytes wide, padding keeps the next view aligned anyway
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let view = root.push(json::buffer::View {
        buffer,
        byte_length: USize64::from(bytes.len()),
        byte_offset: Some(USize64::from(offset)),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        target: Some(Valid(target)),
    });

    let (min, max) = match min_max {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };

    root.push(json::Accessor {
        buffer_view: Some(view),
        byte_offset: Some(USize64(0)),
        count: USize64::from(count),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min,
        max,
        name: None,
        normalized: false,
        sparse: None,
    })
}

fn to_f32(v: [f64; 3]) -> [f32; 3] {
    [v[0] as f32, v[1] as f32, v[2] as f32]
}

fn align_to_four(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelMaps;
    use crate::models::{BoundingBox, Material};
    use crate::scene::{assemble_scene, SceneOptions};

    fn triangle_mesh(x: f32) -> Mesh {
        let positions = vec![[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x, 1.0, 4.0]];
        Mesh {
            indices: vec![0, 1, 2],
            bounds: BoundingBox::from_positions(&positions),
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            positions,
            material: Material::flat([0.5, 0.25, 0.125, 1.0]),
        }
    }

    #[test]
    fn glb_round_trips_through_gltf_reader() {
        let mut labels = LabelMaps::default();
        labels.desktop_labels.insert("a".to_string(), [1.0, 1.0]);
        labels.mobile_labels.insert("a".to_string(), [2.0, 2.0]);

        let scene = assemble_scene(
            vec![(Some("a".to_string()), triangle_mesh(0.0)), (None, triangle_mesh(5.0))],
            &labels,
            &SceneOptions::default(),
        );
        let bytes = scene_to_glb(&scene).unwrap();
        assert_eq!(&bytes[0..4], b"glTF");

        let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
        let doc = &gltf.document;
        assert_eq!(doc.buffers().count(), 1);
        assert_eq!(doc.meshes().count(), 2);
        assert_eq!(doc.materials().count(), 2);
        assert_eq!(doc.nodes().count(), 3);

        let blob = gltf.blob.as_ref().unwrap();
        // two meshes of 12 + 36 + 24 bytes
        assert_eq!(blob.len(), 144);

        let group = doc.scenes().next().unwrap().nodes().next().unwrap();
        assert_eq!(group.name(), Some("CityDistricts"));
        assert_eq!(group.children().count(), 2);

        let labelled = group.children().next().unwrap();
        let extras: serde_json::Value =
            serde_json::from_str(labelled.extras().as_ref().unwrap().get()).unwrap();
        assert_eq!(extras["name"], "a");
        assert_eq!(extras["labelPos"], serde_json::json!([1.0, 1.0]));
        assert_eq!(extras["mobileLabelPos"], serde_json::json!([2.0, 2.0]));
        assert!(group.children().nth(1).unwrap().extras().is_none());

        let mesh = labelled.mesh().unwrap();
        assert_eq!(mesh.name(), Some("District"));
        let primitive = mesh.primitives().next().unwrap();
        assert_eq!(primitive.indices().unwrap().count(), 3);
        let pbr = primitive.material().pbr_metallic_roughness();
        assert_eq!(pbr.base_color_factor(), [0.5, 0.25, 0.125, 1.0]);
        assert_eq!(pbr.roughness_factor(), 1.0);
        assert_eq!(pbr.metallic_factor(), 0.0);
    }
}
