//! Variant source generation
//!
//! Each variant becomes a block that defines its feature macros, opens a namespace named after its
//! feature bitmask, includes the minified draw shaders and undefines everything again.

use tracing::trace;

use super::features::{DrawType, FillRule, ShaderStage, Variant};
use super::manifest::FeatureUniverse;
use crate::error::InvariantViolation;

/// First line of every generated combinations file
pub const GENERATED_HEADER: &str = "// Generated by generate_draw_combinations. Do not edit.\n\n";

/// Appends the block for one variant to `out`
///
/// # Errors
/// Returns [`InvariantViolation::VariantPredicate`] if the variant is not a valid program, if a
/// vertex variant has a fragment-only feature or if an image-mesh variant has a feature image
/// meshes cannot use.
pub fn emit_variant(out: &mut String, universe: &FeatureUniverse, variant: &Variant) -> Result<(), InvariantViolation> {
    check_variant(universe, variant)?;

    let namespace = variant.namespace_name(universe.width());
    trace!(%variant, namespace = namespace.as_str(), "emitting variant");

    out.push_str(&format!("#define {}\n", variant.stage.macro_name()));
    for feature in universe.members(variant.features) {
        out.push_str(&format!("#define {} 1\n", feature.name));
    }
    if variant.fill == FillRule::Clockwise {
        out.push_str("#define CLOCKWISE_FILL 1\n");
    }

    let includes = universe.includes();
    match variant.draw {
        DrawType::Path => {
            let fragment = if universe.uses_atlas_blit(variant.features) { &includes.atlas_fragment } else { &includes.path_fragment };
            out.push_str("#define DRAW_PATH 1\n");
            out.push_str(&format!("namespace {namespace}\n{{\n"));
            out.push_str(&format!("#include \"{}\"\n", includes.path_vertex));
            out.push_str(&format!("#include \"{fragment}\"\n"));
            out.push_str("}\n");
            out.push_str("#undef DRAW_PATH\n");
        }
        DrawType::ImageMesh => {
            out.push_str("#define DRAW_IMAGE 1\n");
            out.push_str("#define DRAW_IMAGE_MESH 1\n");
            out.push_str(&format!("namespace {namespace}\n{{\n"));
            out.push_str(&format!("#include \"{}\"\n", includes.image_mesh_vertex));
            out.push_str(&format!("#include \"{}\"\n", includes.image_mesh_fragment));
            out.push_str("}\n");
            out.push_str("#undef DRAW_IMAGE_MESH\n");
            out.push_str("#undef DRAW_IMAGE\n");
        }
    }

    for feature in universe.members(variant.features) {
        out.push_str(&format!("#undef {}\n", feature.name));
    }
    out.push_str(&format!("#undef {}\n", variant.stage.macro_name()));
    if variant.fill == FillRule::Clockwise {
        out.push_str("#undef CLOCKWISE_FILL\n");
    }
    out.push('\n');

    Ok(())
}

/// Generates a whole combinations file
pub fn emit_variants(universe: &FeatureUniverse, variants: &[Variant]) -> Result<String, InvariantViolation> {
    let mut out = String::from(GENERATED_HEADER);
    for variant in variants {
        emit_variant(&mut out, universe, variant)?;
    }
    Ok(out)
}

fn check_variant(universe: &FeatureUniverse, variant: &Variant) -> Result<(), InvariantViolation> {
    let features = variant.features;
    let checks = [
        ("valid", universe.is_valid(features)),
        ("vertex_is_unique", variant.stage != ShaderStage::Vertex || universe.is_unique_vertex(features)),
        ("image_mesh_compatible", variant.draw != DrawType::ImageMesh || universe.is_image_mesh_compatible(features)),
        ("atlas_compatible", variant.draw != DrawType::Path || universe.is_atlas_compatible(features)),
    ];

    match checks.into_iter().find(|&(_, passed)| !passed) {
        Some((predicate, _)) => Err(InvariantViolation::VariantPredicate {
            predicate,
            namespace: variant.namespace_name(universe.width()),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::features::FeatureSet;
    use crate::variants::manifest::DrawCombinationsSpec;
    use crate::variants::plan::canonical_variants;

    fn canonical() -> FeatureUniverse {
        DrawCombinationsSpec::canonical().resolve().unwrap()
    }

    #[test]
    fn test_clockwise_path_block() {
        let universe = canonical();
        let variant = Variant::new(ShaderStage::Fragment, DrawType::Path, FillRule::Clockwise, FeatureSet::from_indices([0, 4]));
        let mut out = String::new();
        emit_variant(&mut out, &universe, &variant).unwrap();

        assert_eq!(
            out,
            "#define FRAGMENT\n\
             #define ENABLE_CLIPPING 1\n\
             #define ENABLE_EVEN_ODD 1\n\
             #define CLOCKWISE_FILL 1\n\
             #define DRAW_PATH 1\n\
             namespace c100010000\n\
             {\n\
             #include \"draw_path.minified.vert\"\n\
             #include \"draw_raster_order_path.minified.frag\"\n\
             }\n\
             #undef DRAW_PATH\n\
             #undef ENABLE_CLIPPING\n\
             #undef ENABLE_EVEN_ODD\n\
             #undef FRAGMENT\n\
             #undef CLOCKWISE_FILL\n\
             \n"
        );
    }

    #[test]
    fn test_atlas_blit_uses_mesh_fragment() {
        let universe = canonical();
        let variant = Variant::new(ShaderStage::Vertex, DrawType::Path, FillRule::Legacy, FeatureSet::from_indices([7, 8]));
        let mut out = String::new();
        emit_variant(&mut out, &universe, &variant).unwrap();

        assert!(out.contains("namespace p000000011\n"));
        assert!(out.contains("#include \"draw_mesh.minified.frag\"\n"));
        assert!(!out.contains("draw_raster_order_path"));
        assert!(!out.contains("CLOCKWISE_FILL"));
    }

    #[test]
    fn test_image_mesh_block() {
        let universe = canonical();
        let variant = Variant::new(ShaderStage::Vertex, DrawType::ImageMesh, FillRule::Legacy, FeatureSet::from_indices([1]));
        let mut out = String::new();
        emit_variant(&mut out, &universe, &variant).unwrap();

        assert_eq!(
            out,
            "#define VERTEX\n\
             #define ENABLE_CLIP_RECT 1\n\
             #define DRAW_IMAGE 1\n\
             #define DRAW_IMAGE_MESH 1\n\
             namespace m010000000\n\
             {\n\
             #include \"draw_image_mesh.minified.vert\"\n\
             #include \"draw_mesh.minified.frag\"\n\
             }\n\
             #undef DRAW_IMAGE_MESH\n\
             #undef DRAW_IMAGE\n\
             #undef ENABLE_CLIP_RECT\n\
             #undef VERTEX\n\
             \n"
        );
    }

    #[test]
    fn test_predicate_violations_are_fatal() {
        let universe = canonical();
        let mut out = String::new();

        let nested_without_clipping = Variant::new(ShaderStage::Fragment, DrawType::Path, FillRule::Legacy, FeatureSet::from_indices([5]));
        assert_eq!(
            emit_variant(&mut out, &universe, &nested_without_clipping),
            Err(InvariantViolation::VariantPredicate {
                predicate: "valid",
                namespace: "p000001000".to_string(),
            })
        );

        let vertex_even_odd = Variant::new(ShaderStage::Vertex, DrawType::Path, FillRule::Legacy, FeatureSet::from_indices([4]));
        assert!(matches!(
            emit_variant(&mut out, &universe, &vertex_even_odd),
            Err(InvariantViolation::VariantPredicate { predicate: "vertex_is_unique", .. })
        ));

        let feathered_mesh = Variant::new(ShaderStage::Fragment, DrawType::ImageMesh, FillRule::Legacy, FeatureSet::from_indices([3]));
        assert!(matches!(
            emit_variant(&mut out, &universe, &feathered_mesh),
            Err(InvariantViolation::VariantPredicate { predicate: "image_mesh_compatible", .. })
        ));

        // Nothing is written for a rejected variant.
        assert!(out.is_empty());
    }

    #[test]
    fn test_canonical_file() {
        let universe = canonical();
        let source = emit_variants(&universe, &canonical_variants(&universe)).unwrap();

        assert!(source.starts_with(GENERATED_HEADER));
        assert_eq!(source.matches("namespace ").count(), 10);
        assert_eq!(source.matches("#define CLOCKWISE_FILL 1\n").count(), 2);
        assert_eq!(source.matches("#define ").count(), source.matches("#undef ").count());
        assert!(source.ends_with("#undef FRAGMENT\n\n"));
    }
}
