//! Draw-combinations manifest
//!
//! The feature universe is described in YAML: the features with their bit indices, the groups the
//! enumerator works with, dependency pairs for the validity check and the files each draw type
//! includes. [`DrawCombinationsSpec::canonical`] is the built-in Metal universe, used when no
//! manifest is given.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::features::{Feature, FeatureSet, MAX_FEATURES};
use crate::error::ConfigurationError;

static MACRO_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// `feature` may only be enabled together with `requires`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Dependency {
    pub feature: String,
    pub requires: String,
}

/// Minified artifacts included by each variant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct IncludeSpec {
    pub path_vertex: String,
    /// Fragment stage of path draws
    pub path_fragment: String,
    /// Fragment stage of path draws that blit from the coverage atlas
    pub atlas_fragment: String,
    pub image_mesh_vertex: String,
    pub image_mesh_fragment: String,
}

impl Default for IncludeSpec {
    fn default() -> Self {
        Self {
            path_vertex: "draw_path.minified.vert".to_string(),
            path_fragment: "draw_raster_order_path.minified.frag".to_string(),
            atlas_fragment: "draw_mesh.minified.frag".to_string(),
            image_mesh_vertex: "draw_image_mesh.minified.vert".to_string(),
            image_mesh_fragment: "draw_mesh.minified.frag".to_string(),
        }
    }
}

/// Feature universe as written in a manifest, with features referenced by name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DrawCombinationsSpec {
    pub features: Vec<Feature>,
    /// Features that change both the vertex and the fragment stage
    #[serde(default)]
    pub whole_program: Vec<String>,
    /// Features with no effect on the vertex stage
    #[serde(default)]
    pub fragment_only: Vec<String>,
    #[serde(default)]
    pub requires: Vec<Dependency>,
    /// Coverage features the atlas blit variants cannot use
    #[serde(default)]
    pub non_atlas_coverage: Vec<String>,
    /// Features image-mesh draws cannot use
    #[serde(default)]
    pub non_image_mesh: Vec<String>,
    /// Feature selecting the interior triangulation draw
    #[serde(default)]
    pub interior_triangles: Option<String>,
    /// Feature selecting the atlas blit draw
    #[serde(default)]
    pub atlas_blit: Option<String>,
    #[serde(default)]
    pub includes: IncludeSpec,
}

impl DrawCombinationsSpec {
    /// The built-in universe. Indices must match the ones the Metal renderer uses to look up
    /// precompiled namespaces.
    pub fn canonical() -> Self {
        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|name| name.to_string()).collect()
        }

        let features = [
            "ENABLE_CLIPPING",
            "ENABLE_CLIP_RECT",
            "ENABLE_ADVANCED_BLEND",
            "ENABLE_FEATHER",
            "ENABLE_EVEN_ODD",
            "ENABLE_NESTED_CLIPPING",
            "ENABLE_HSL_BLEND_MODES",
            "DRAW_INTERIOR_TRIANGLES",
            "ATLAS_BLIT",
        ];

        Self {
            features: features.iter().zip(0..).map(|(name, index)| Feature::new(*name, index)).collect(),
            whole_program: names(&["ENABLE_CLIPPING", "ENABLE_CLIP_RECT", "ENABLE_ADVANCED_BLEND", "ENABLE_FEATHER"]),
            fragment_only: names(&["ENABLE_EVEN_ODD", "ENABLE_NESTED_CLIPPING", "ENABLE_HSL_BLEND_MODES"]),
            requires: vec![
                Dependency {
                    feature: "ENABLE_NESTED_CLIPPING".to_string(),
                    requires: "ENABLE_CLIPPING".to_string(),
                },
                Dependency {
                    feature: "ENABLE_HSL_BLEND_MODES".to_string(),
                    requires: "ENABLE_ADVANCED_BLEND".to_string(),
                },
            ],
            non_atlas_coverage: names(&["ENABLE_FEATHER", "ENABLE_EVEN_ODD", "ENABLE_NESTED_CLIPPING"]),
            non_image_mesh: names(&["ENABLE_FEATHER", "ENABLE_EVEN_ODD", "ENABLE_NESTED_CLIPPING", "DRAW_INTERIOR_TRIANGLES", "ATLAS_BLIT"]),
            interior_triangles: Some("DRAW_INTERIOR_TRIANGLES".to_string()),
            atlas_blit: Some("ATLAS_BLIT".to_string()),
            includes: IncludeSpec::default(),
        }
    }

    /// Parses a manifest from YAML content
    ///
    /// # Arguments
    /// * `yaml_content` - YAML string containing the manifest
    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }

    /// Parses a manifest from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML manifest file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::ReadInput { path: path.to_path_buf(), source })?;
        Ok(Self::from_yaml(&content)?)
    }

    /// Checks the manifest and resolves every feature reference to its index
    pub fn resolve(&self) -> Result<FeatureUniverse, ConfigurationError> {
        let mut by_name: HashMap<&str, u32> = HashMap::new();
        let mut by_index: HashMap<u32, &str> = HashMap::new();

        for feature in &self.features {
            if !MACRO_NAME.is_match(&feature.name) {
                return Err(ConfigurationError::InvalidFeatureName(feature.name.clone()));
            }
            if feature.index >= MAX_FEATURES {
                return Err(ConfigurationError::FeatureIndexOutOfRange {
                    name: feature.name.clone(),
                    index: feature.index,
                    max: MAX_FEATURES - 1,
                });
            }
            if by_name.insert(&feature.name, feature.index).is_some() {
                return Err(ConfigurationError::DuplicateFeatureName(feature.name.clone()));
            }
            if let Some(first) = by_index.insert(feature.index, &feature.name) {
                return Err(ConfigurationError::DuplicateFeatureIndex {
                    first: first.to_string(),
                    second: feature.name.clone(),
                    index: feature.index,
                });
            }
        }

        let lookup = |name: &str| by_name.get(name).copied().ok_or_else(|| ConfigurationError::UnknownFeature(name.to_string()));
        let group = |names: &[String]| names.iter().map(|name| lookup(name.as_str())).collect::<Result<Vec<_>, _>>().map(FeatureSet::from_indices);

        let mut features = self.features.clone();
        features.sort_by_key(|feature| feature.index);

        Ok(FeatureUniverse {
            mask: FeatureSet::from_indices(features.iter().map(|feature| feature.index)),
            features,
            whole_program: group(&self.whole_program)?,
            fragment_only: group(&self.fragment_only)?,
            requires: self
                .requires
                .iter()
                .map(|dependency| -> Result<(u32, u32), ConfigurationError> { Ok((lookup(dependency.feature.as_str())?, lookup(dependency.requires.as_str())?)) })
                .collect::<Result<_, _>>()?,
            non_atlas_coverage: group(&self.non_atlas_coverage)?,
            non_image_mesh: group(&self.non_image_mesh)?,
            interior_triangles: self.interior_triangles.as_deref().map(lookup).transpose()?,
            atlas_blit: self.atlas_blit.as_deref().map(lookup).transpose()?,
            includes: self.includes.clone(),
        })
    }
}

/// Resolved feature universe with the predicates the enumerator filters on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureUniverse {
    /// Sorted by index
    features: Vec<Feature>,
    mask: FeatureSet,
    whole_program: FeatureSet,
    fragment_only: FeatureSet,
    /// `(feature, required feature)` pairs
    requires: Vec<(u32, u32)>,
    non_atlas_coverage: FeatureSet,
    non_image_mesh: FeatureSet,
    interior_triangles: Option<u32>,
    atlas_blit: Option<u32>,
    includes: IncludeSpec,
}

impl FeatureUniverse {
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Every declared feature
    pub fn feature_set(&self) -> FeatureSet {
        self.mask
    }

    /// Namespace bitmask width: one past the highest index
    pub fn width(&self) -> u32 {
        self.features.last().map_or(0, |feature| feature.index + 1)
    }

    pub fn whole_program(&self) -> FeatureSet {
        self.whole_program
    }

    pub fn fragment_only(&self) -> FeatureSet {
        self.fragment_only
    }

    /// Whole-program and fragment-only features together
    pub fn all_features(&self) -> FeatureSet {
        self.whole_program.union(self.fragment_only)
    }

    pub fn non_atlas_coverage(&self) -> FeatureSet {
        self.non_atlas_coverage
    }

    pub fn non_image_mesh(&self) -> FeatureSet {
        self.non_image_mesh
    }

    pub fn interior_triangles(&self) -> Option<u32> {
        self.interior_triangles
    }

    pub fn atlas_blit(&self) -> Option<u32> {
        self.atlas_blit
    }

    pub fn includes(&self) -> &IncludeSpec {
        &self.includes
    }

    /// Features of `set` in index order
    pub fn members(&self, set: FeatureSet) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(move |feature| set.contains(feature.index))
    }

    /// A program exists for `set`: every feature is declared and every dependency is met
    pub fn is_valid(&self, set: FeatureSet) -> bool {
        set.is_subset(self.mask) && self.requires.iter().all(|&(feature, required)| !set.contains(feature) || set.contains(required))
    }

    /// `set` is the simplest set producing its vertex program
    ///
    /// Fragment-only features do not change the vertex stage, so any set containing one duplicates
    /// the vertex program of the same set without it.
    pub fn is_unique_vertex(&self, set: FeatureSet) -> bool {
        !set.intersects(self.fragment_only)
    }

    pub fn is_image_mesh_compatible(&self, set: FeatureSet) -> bool {
        !set.intersects(self.non_image_mesh)
    }

    /// Atlas blits resolve coverage from the atlas and cannot combine with the other coverage modes
    pub fn is_atlas_compatible(&self, set: FeatureSet) -> bool {
        match self.atlas_blit {
            Some(atlas) if set.contains(atlas) => !set.intersects(self.non_atlas_coverage),
            _ => true,
        }
    }

    pub fn uses_atlas_blit(&self, set: FeatureSet) -> bool {
        self.atlas_blit.is_some_and(|atlas| set.contains(atlas))
    }
}
