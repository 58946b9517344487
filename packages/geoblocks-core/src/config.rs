use serde::Deserialize;

use crate::extrude::ExtrudeOptions;
use crate::scene::SceneOptions;
use crate::simplify::SimplifyOptions;

/// Options for a whole boundaries-to-glTF run.
///
/// Deserializes from camelCase JSON; every missing field falls back to the
/// defaults used for the district maps.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOptions {
    /// Side length of the square canvas the major axis is scaled to
    #[serde(default = "default_side")]
    pub side: f64,
    /// Extrusion depth of every district block
    #[serde(default = "default_depth")]
    pub depth: f64,
    /// Bevel size; thickness and offset are derived from it
    #[serde(default = "default_bevel")]
    pub bevel: f64,
    #[serde(default = "default_bevel_segments")]
    pub bevel_segments: u32,
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Simplification tolerance, higher means coarser outlines
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Chaikin smoothing passes, higher means rounder corners
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_group_name")]
    pub group_name: String,
    /// Node name used for features without an id
    #[serde(default = "default_fallback_name")]
    pub fallback_name: String,
    /// Put labels at the region centroid when the lookup has none
    #[serde(default)]
    pub label_centroid_fallback: bool,
}

fn default_side() -> f64 {
    200.0
}
fn default_depth() -> f64 {
    4.0
}
fn default_bevel() -> f64 {
    0.2
}
fn default_bevel_segments() -> u32 {
    1
}
fn default_steps() -> u32 {
    1
}
fn default_tolerance() -> f64 {
    0.001
}
fn default_iterations() -> usize {
    2
}
fn default_group_name() -> String {
    "CityDistricts".to_string()
}
fn default_fallback_name() -> String {
    "water".to_string()
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            side: default_side(),
            depth: default_depth(),
            bevel: default_bevel(),
            bevel_segments: default_bevel_segments(),
            steps: default_steps(),
            tolerance: default_tolerance(),
            iterations: default_iterations(),
            group_name: default_group_name(),
            fallback_name: default_fallback_name(),
            label_centroid_fallback: false,
        }
    }
}

impl PipelineOptions {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid options: {}", e)))
    }

    pub fn simplify_options(&self) -> SimplifyOptions {
        SimplifyOptions {
            tolerance: self.tolerance,
            iterations: self.iterations,
            color_index: self.depth,
        }
    }

    /// The bevel is shrunk into the lids: thickness is a tenth of the size
    /// and the offset cancels the size on the side walls.
    pub fn extrude_options(&self) -> ExtrudeOptions {
        ExtrudeOptions {
            steps: self.steps,
            depth: self.depth,
            bevel_thickness: self.bevel / 10.0,
            bevel_size: self.bevel,
            bevel_offset: -self.bevel,
            bevel_segments: self.bevel_segments,
        }
    }

    pub fn scene_options(&self) -> SceneOptions {
        SceneOptions {
            group_name: self.group_name.clone(),
            fallback_name: self.fallback_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_uses_defaults() {
        let opts = PipelineOptions::from_json("{}").unwrap();
        assert_eq!(opts.side, 200.0);
        assert_eq!(opts.depth, 4.0);
        assert_eq!(opts.iterations, 2);
        assert_eq!(opts.group_name, "CityDistricts");
        assert!(!opts.label_centroid_fallback);

        let blank = PipelineOptions::from_json("  ").unwrap();
        assert_eq!(blank.tolerance, 0.001);
    }

    #[test]
    fn bevel_derives_thickness_and_offset() {
        let opts = PipelineOptions::from_json(r#"{"bevel": 0.5, "depth": 12}"#).unwrap();
        let extrude = opts.extrude_options();
        assert!((extrude.bevel_thickness - 0.05).abs() < 1e-12);
        assert_eq!(extrude.bevel_size, 0.5);
        assert_eq!(extrude.bevel_offset, -0.5);
        assert_eq!(extrude.depth, 12.0);
        assert_eq!(opts.simplify_options().color_index, 12.0);
    }

    #[test]
    fn malformed_options_are_rejected() {
        let err = PipelineOptions::from_json(r#"{"depth": "deep"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
