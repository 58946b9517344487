use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geometry_engine::GeometryEngine;
use crate::models::Region;
use crate::{Error, Result};

/// Label anchor maps keyed by region id, one per display context.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMaps {
    #[serde(default)]
    pub desktop_labels: HashMap<String, [f64; 2]>,
    #[serde(default)]
    pub mobile_labels: HashMap<String, [f64; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelAnchors {
    pub desktop: [f64; 2],
    pub mobile: [f64; 2],
}

impl LabelMaps {
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| Error::InvalidInput(format!("Invalid labels: {}", e)))
    }

    /// Both anchors for `id`; `MissingLabel` when either one is absent.
    pub fn anchors(&self, id: &str) -> Result<LabelAnchors> {
        match (self.desktop_labels.get(id), self.mobile_labels.get(id)) {
            (Some(desktop), Some(mobile)) => Ok(LabelAnchors {
                desktop: *desktop,
                mobile: *mobile,
            }),
            _ => Err(Error::MissingLabel(id.to_string())),
        }
    }

    /// Copy of the maps where every region without both anchors gets them at
    /// its centroid. Regions without an id or geometry are left alone.
    pub fn with_centroid_fallback<E: GeometryEngine>(&self, engine: &E, regions: &[Region]) -> Self {
        let mut filled = self.clone();
        for region in regions {
            let Some(id) = region.id.as_deref() else {
                continue;
            };
            if self.anchors(id).is_ok() {
                continue;
            }
            if let Some(center) = engine.centroid(&region.geometry) {
                filled.desktop_labels.insert(id.to_string(), [center.x, center.y]);
                filled.mobile_labels.insert(id.to_string(), [center.x, center.y]);
            }
        }
        filled
    }
}
