use serde::Serialize;

use crate::console_log;
use crate::labels::LabelMaps;
use crate::models::{BoundingBox, Mesh};

#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub group_name: String,
    /// Node name for regions without an id
    pub fallback_name: String,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            group_name: "CityDistricts".to_string(),
            fallback_name: "water".to_string(),
        }
    }
}

/// Label metadata stored in a node's extras.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExtras {
    pub name: String,
    pub desktop_label_pos: [f64; 2],
    pub mobile_label_pos: [f64; 2],
    pub label_pos: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub mesh: Option<Mesh>,
    pub translation: [f64; 3],
    pub extras: Option<NodeExtras>,
}

/// Group node owning every region node.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub name: String,
    pub children: Vec<SceneNode>,
    pub translation: [f64; 3],
    /// Union of the children's boxes, before the group translation
    pub bounds: BoundingBox,
}

impl GroupNode {
    /// Union box after the group translation is applied.
    pub fn world_bounds(&self) -> BoundingBox {
        self.bounds.translated(self.translation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneGraph {
    pub name: String,
    pub root: GroupNode,
}

/// Build one node per region under a single group and center the group on
/// the x/y plane.
///
/// Nodes get label extras only when the lookup has both anchors for the id.
pub fn assemble_scene(
    entries: Vec<(Option<String>, Mesh)>,
    labels: &LabelMaps,
    options: &SceneOptions,
) -> SceneGraph {
    let mut group = GroupNode {
        name: options.group_name.clone(),
        children: Vec::with_capacity(entries.len()),
        translation: [0.0; 3],
        bounds: BoundingBox::empty(),
    };

    for (id, mesh) in entries {
        let name = id.clone().unwrap_or_else(|| options.fallback_name.clone());

        let extras = match id.as_deref().map(|id| labels.anchors(id)) {
            Some(Ok(anchors)) => Some(NodeExtras {
                name: name.clone(),
                desktop_label_pos: anchors.desktop,
                mobile_label_pos: anchors.mobile,
                label_pos: anchors.desktop,
            }),
            Some(Err(err)) => {
                console_log!("{}, skipping label metadata", err);
                None
            }
            None => None,
        };

        group.bounds = group.bounds.union(&mesh.bounds);
        group.children.push(SceneNode {
            name,
            mesh: Some(mesh),
            translation: [0.0; 3],
            extras,
        });
    }

    group.translation = centering_offset(&group.bounds);

    SceneGraph {
        name: "Scene".to_string(),
        root: group,
    }
}

// Half the extent, negated, on x and y; z is left alone. This only puts the
// center on the origin when the box starts at 0.
fn centering_offset(bounds: &BoundingBox) -> [f64; 3] {
    if bounds.is_empty() {
        return [0.0; 3];
    }
    let size = bounds.size();
    [-size[0] / 2.0, -size[1] / 2.0, 0.0]
}
