//! Which variants get precompiled
//!
//! [`canonical_variants`] is the bare minimum needed to draw everything at startup. The renderer
//! falls back to these fully featured programs while more specialized ones compile in the
//! background. [`all_valid_variants`] is the brute-force alternative that precompiles every valid
//! combination.

use super::features::{DrawType, FeatureSet, FillRule, ShaderStage, Variant};
use super::manifest::FeatureUniverse;

/// Hand-picked minimal covering set
///
/// Sections whose role feature the universe does not declare are skipped.
pub fn canonical_variants(universe: &FeatureUniverse) -> Vec<Variant> {
    use DrawType::{ImageMesh, Path};
    use FillRule::{Clockwise, Legacy};
    use ShaderStage::{Fragment, Vertex};

    let whole_program = universe.whole_program();
    let all = universe.all_features();
    let mut variants = Vec::new();

    let mut path_tessellation = |extra: FeatureSet| {
        variants.push(Variant::new(Vertex, Path, Legacy, whole_program.union(extra)));
        variants.push(Variant::new(Fragment, Path, Legacy, all.union(extra)));
        variants.push(Variant::new(Fragment, Path, Clockwise, all.union(extra)));
    };

    path_tessellation(FeatureSet::EMPTY);

    let interior = FeatureSet::from_indices(universe.interior_triangles());
    if !interior.is_empty() {
        path_tessellation(interior);
    }

    if let Some(atlas) = universe.atlas_blit() {
        let extra = interior.with(atlas);
        let excluded = universe.non_atlas_coverage();
        variants.push(Variant::new(Vertex, Path, Legacy, whole_program.union(extra).difference(excluded)));
        variants.push(Variant::new(Fragment, Path, Legacy, all.union(extra).difference(excluded)));
    }

    let excluded = universe.non_image_mesh();
    variants.push(Variant::new(Vertex, ImageMesh, Legacy, whole_program.difference(excluded)));
    variants.push(Variant::new(Fragment, ImageMesh, Legacy, all.difference(excluded)));

    variants
}

/// Every subset of the universe that is a valid program for one stage, draw type and fill rule
///
/// Subsets are filtered by validity, vertex uniqueness for the vertex stage, image-mesh
/// compatibility for image-mesh draws and atlas compatibility for path draws.
pub fn sweep(universe: &FeatureUniverse, stage: ShaderStage, draw: DrawType, fill: FillRule) -> Vec<Variant> {
    universe
        .feature_set()
        .subsets()
        .filter(|&set| universe.is_valid(set))
        .filter(|&set| stage != ShaderStage::Vertex || universe.is_unique_vertex(set))
        .filter(|&set| match draw {
            DrawType::Path => universe.is_atlas_compatible(set),
            DrawType::ImageMesh => universe.is_image_mesh_compatible(set),
        })
        .map(|set| Variant::new(stage, draw, fill, set))
        .collect()
}

/// Brute-force plan: every valid combination
///
/// Vertex programs and image-mesh draws are only built for the legacy fill rule, matching the
/// canonical plan.
pub fn all_valid_variants(universe: &FeatureUniverse) -> Vec<Variant> {
    [
        (ShaderStage::Vertex, DrawType::Path, FillRule::Legacy),
        (ShaderStage::Fragment, DrawType::Path, FillRule::Legacy),
        (ShaderStage::Fragment, DrawType::Path, FillRule::Clockwise),
        (ShaderStage::Vertex, DrawType::ImageMesh, FillRule::Legacy),
        (ShaderStage::Fragment, DrawType::ImageMesh, FillRule::Legacy),
    ]
    .into_iter()
    .flat_map(|(stage, draw, fill)| sweep(universe, stage, draw, fill))
    .collect()
}
