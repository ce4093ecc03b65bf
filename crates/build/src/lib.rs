//! Shader build utilities for the pixel local storage renderer
//!
//! This crate provides the two offline steps that run before the renderer's shaders are compiled:
//! - A GLSL minifier that renames identifiers batch-wide, strips comments and dead macros, and
//!   writes each file as an export manifest, an embeddable C++ string constant and an offline
//!   source for out-of-process compilation.
//! - A draw-combinations generator that enumerates the feature variants the Metal backend
//!   precompiles and wraps the minified shaders in one namespace per variant.

pub mod batch;
pub mod catalog;
pub mod error;
pub mod lexer;
pub mod minifier;
pub mod names;
pub mod variants;

use std::path::Path;

pub use batch::{MinifiedBatch, ShaderArtifacts, ShaderBatch};
pub use error::{ConfigurationError, Error, InvariantViolation, LexError, Result};
pub use lexer::UnknownCharPolicy;
pub use minifier::MinifyOptions;

/// Minifies a set of shader files as one batch and writes their artifacts to `outdir`
///
/// # Arguments
/// * `files` - Input shader files. Renaming is consistent across all of them
/// * `outdir` - Output directory, created if missing
/// * `options` - Minification options
///
/// # Returns
/// The finished batch, for callers that also want the rename map
pub fn minify_files<P: AsRef<Path>>(files: &[P], outdir: &Path, options: MinifyOptions) -> Result<MinifiedBatch> {
    let mut batch = ShaderBatch::new(options);
    for file in files {
        batch.add_file(file.as_ref())?;
    }

    let minified = batch.finish()?;
    minified.write_to(outdir)?;
    Ok(minified)
}

/// Generates the draw combinations source for `universe` and writes it to `output`
///
/// # Arguments
/// * `universe` - Resolved feature universe
/// * `all` - Emit every valid combination instead of the canonical minimal set
/// * `output` - Destination file
pub fn generate_draw_combinations(universe: &variants::FeatureUniverse, all: bool, output: &Path) -> Result<Vec<variants::Variant>> {
    let selected = if all { variants::all_valid_variants(universe) } else { variants::canonical_variants(universe) };
    let source = variants::emit_variants(universe, &selected)?;

    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigurationError::CreateOutputDir { path: parent.to_path_buf(), source })?;
    }
    std::fs::write(output, source).map_err(|source| ConfigurationError::WriteOutput { path: output.to_path_buf(), source })?;
    Ok(selected)
}

/// Resolves the manifest at `path`, or the built-in Metal universe when `path` is `None`
pub fn load_feature_universe(path: Option<&Path>) -> Result<variants::FeatureUniverse> {
    let spec = match path {
        Some(path) => variants::DrawCombinationsSpec::from_file(path)?,
        None => variants::DrawCombinationsSpec::canonical(),
    };
    Ok(spec.resolve()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_minify_files_end_to_end() {
        let dir = std::env::temp_dir().join(format!("pls-shader-build-lib-{}", std::process::id()));
        let input = dir.join("in");
        let output = dir.join("out");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("common.glsl"), "#define @PATH_ID_SHIFT 16u\n#define UNUSED 1.0\n").unwrap();
        fs::write(input.join("draw_path.vert"), "#ifdef @ENABLE_FEATHER\nuint id = value >> @PATH_ID_SHIFT;\n#endif\n").unwrap();

        let minified = minify_files(&[input.join("common.glsl"), input.join("draw_path.vert")], &output, MinifyOptions::default()).unwrap();
        let shift = minified.names().get("@PATH_ID_SHIFT").unwrap();
        let feather = minified.names().get("@ENABLE_FEATHER").unwrap();

        let offline = fs::read_to_string(output.join("draw_path.minified.vert")).unwrap();
        assert!(offline.starts_with("#ifdef ENABLE_FEATHER\n"), "{offline}");
        assert!(offline.contains(&format!(">>{shift};")), "{offline}");
        let common = fs::read_to_string(output.join("common.minified.glsl")).unwrap();
        assert!(!common.contains("1.0"), "{common}");
        assert_eq!(
            fs::read_to_string(output.join("common.exports.h")).unwrap(),
            format!("#pragma once\n\n#define GLSL_ENABLE_FEATHER \"{feather}\"\n#define GLSL_PATH_ID_SHIFT \"{shift}\"\n")
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_generate_draw_combinations_writes_file() {
        let dir = std::env::temp_dir().join(format!("pls-shader-build-combinations-{}", std::process::id()));
        let output = dir.join("generated").join("draw_combinations.metal");

        let universe = load_feature_universe(None).unwrap();
        let variants = generate_draw_combinations(&universe, false, &output).unwrap();
        assert_eq!(variants.len(), 10);

        let source = fs::read_to_string(&output).unwrap();
        assert!(source.contains("namespace p111100000\n"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
