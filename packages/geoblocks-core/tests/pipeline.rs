use geoblocks_core::geojson_features::parse_boundaries;
use geoblocks_core::{build_glb, build_scene, geojson_to_gltf, LabelMaps, PipelineOptions};

const TWO_SQUARES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"id": "west"},
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]]}
        },
        {
            "type": "Feature",
            "properties": {"id": "east"},
            "geometry": {"type": "Polygon", "coordinates": [[[3, 0], [4, 0], [4, 1], [3, 1], [3, 0]]]}
        }
    ]
}"#;

const LABELS: &str = r#"{
    "desktopLabels": {"west": [10.0, 20.0], "east": [30.0, 40.0]},
    "mobileLabels": {"west": [11.0, 21.0]}
}"#;

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[test]
fn two_squares_become_two_beveled_blocks() {
    let features = parse_boundaries(TWO_SQUARES).unwrap();
    let labels = LabelMaps::from_json(LABELS).unwrap();
    let bytes = build_glb(&features, &labels, &PipelineOptions::default()).unwrap();

    let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
    let doc = &gltf.document;
    assert_eq!(doc.buffers().count(), 1);

    let scene = doc.default_scene().unwrap();
    assert_eq!(scene.name(), Some("Scene"));
    let group = scene.nodes().next().unwrap();
    assert_eq!(group.name(), Some("CityDistricts"));
    assert_eq!(group.children().count(), 2);

    for node in group.children() {
        let mesh = node.mesh().unwrap();
        let primitive = mesh.primitives().next().unwrap();
        let position = primitive.get(&gltf::Semantic::Positions).unwrap();
        let min = position.min().unwrap();
        let max = position.max().unwrap();

        // bevel thickness is a tenth of the bevel
        assert!((min[2].as_f64().unwrap() + 0.02).abs() < 1e-4);
        assert!((max[2].as_f64().unwrap() - 4.02).abs() < 1e-4);
        assert_eq!(primitive.indices().unwrap().count() % 3, 0);
    }

    // only "west" has both anchors
    let labelled: Vec<_> = group
        .children()
        .filter(|node| node.extras().is_some())
        .map(|node| node.name().unwrap().to_string())
        .collect();
    assert_eq!(labelled, vec!["west".to_string()]);
}

#[test]
fn group_translation_is_half_the_extent() {
    let features = parse_boundaries(TWO_SQUARES).unwrap();
    let scene = build_scene(&features, &LabelMaps::default(), &PipelineOptions::default()).unwrap();

    let size = scene.root.bounds.size();
    assert_eq!(scene.root.translation, [-size[0] / 2.0, -size[1] / 2.0, 0.0]);

    // the world center lands on the canvas minimum, which the scale-up
    // pushes off zero
    let world = scene.root.world_bounds();
    let center = world.center();
    assert!((center[0] - scene.root.bounds.min.x).abs() < 1e-9);
    assert!((center[1] - scene.root.bounds.min.y).abs() < 1e-9);
}

#[test]
fn output_is_deterministic() {
    let features = parse_boundaries(TWO_SQUARES).unwrap();
    let labels = LabelMaps::from_json(LABELS).unwrap();
    let options = PipelineOptions::default();

    let first = build_glb(&features, &labels, &options).unwrap();
    let second = build_glb(&features, &labels, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn options_change_the_extrusion() {
    let features = parse_boundaries(TWO_SQUARES).unwrap();
    let options = PipelineOptions::from_json(r#"{"depth": 10, "bevel": 0}"#).unwrap();
    let scene = build_scene(&features, &LabelMaps::default(), &options).unwrap();

    for node in &scene.root.children {
        let bounds = &node.mesh.as_ref().unwrap().bounds;
        assert!(bounds.min.z.abs() < 1e-6);
        assert!((bounds.max.z - 10.0).abs() < 1e-4);
    }
}

#[test]
fn asset_is_written_to_disk() {
    let features = parse_boundaries(TWO_SQUARES).unwrap();
    let labels = LabelMaps::from_json(LABELS).unwrap();
    let path = std::env::temp_dir().join(format!("geoblocks-{}.glb", std::process::id()));

    geojson_to_gltf(&features, &path, &labels, &PipelineOptions::default()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(&bytes[0..4], b"glTF");
    assert_eq!(read_u32(&bytes, 4), 2);
    assert_eq!(read_u32(&bytes, 8) as usize, bytes.len());
}
