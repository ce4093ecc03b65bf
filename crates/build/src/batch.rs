//! Batch driver for the minifier
//!
//! All files of one invocation share a single symbol catalog and rename table, since a macro defined
//! in one file may be referenced from another. The batch therefore runs in two phases: every file is
//! lexed first, then every file is stripped, and names are allocated from what survives before each
//! file is emitted.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::SymbolCatalog;
use crate::error::{ConfigurationError, Error, Result};
use crate::minifier::{EmitContext, Minifier, MinifyOptions, strip_batch};
use crate::names::RenameTable;

/// Files collected for one minification run
#[derive(Debug, Default)]
pub struct ShaderBatch {
    options: MinifyOptions,
    catalog: SymbolCatalog,
    minifiers: Vec<Minifier>,
}

impl ShaderBatch {
    pub fn new(options: MinifyOptions) -> Self {
        Self {
            options,
            catalog: SymbolCatalog::new(),
            minifiers: Vec::new(),
        }
    }

    /// Lexes one source file into the batch
    ///
    /// # Arguments
    /// * `file_name` - Base name used to derive the artifact names
    /// * `source` - Shader source text
    pub fn add_source(&mut self, file_name: &str, source: &str) -> Result<()> {
        let minifier = Minifier::new(file_name, source, &mut self.catalog, self.options.unknown_chars).map_err(|source| Error::Lex {
            file: file_name.to_string(),
            source,
        })?;
        debug!(file = file_name, tokens = minifier.tokens().len(), identifiers = self.catalog.len(), "lexed shader");
        self.minifiers.push(minifier);
        Ok(())
    }

    /// Reads and lexes a shader file from disk
    pub fn add_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read_to_string(path).map_err(|source| ConfigurationError::ReadInput { path: path.to_path_buf(), source })?;
        let file_name = path.file_name().map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());
        self.add_source(&file_name, &source)
    }

    pub fn len(&self) -> usize {
        self.minifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minifiers.is_empty()
    }

    /// Strips every file, allocates names for the whole batch and renders every file's artifacts
    pub fn finish(mut self) -> Result<MinifiedBatch> {
        let catalog = if self.options.human_readable {
            self.catalog
        } else {
            let (catalog, removed) = strip_batch(&mut self.minifiers, &self.catalog);
            debug!(removed, identifiers = catalog.len(), "stripped unreferenced macros");
            catalog
        };
        let names = RenameTable::allocate(&catalog, self.options.human_readable)?;

        let context = EmitContext {
            names: &names,
            catalog: &catalog,
            options: &self.options,
        };
        let artifacts = self.minifiers.iter().map(|minifier| ShaderArtifacts::render(minifier, &context)).collect::<Result<Vec<_>>>()?;

        let exported_switches = catalog.exported_switches().map(str::to_string).collect();
        let exports = catalog.exports().map(str::to_string).collect();
        Ok(MinifiedBatch {
            artifacts,
            names,
            exports,
            exported_switches,
        })
    }
}

/// The three files produced for one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderArtifacts {
    pub file_name: String,
    /// `(file name, contents)` of the export manifest
    pub exports_header: (String, String),
    /// `(file name, contents)` of the embedded C++ source
    pub embedded_source: (String, String),
    /// `(file name, contents)` of the offline minified source
    pub offline_source: (String, String),
}

impl ShaderArtifacts {
    fn render(minifier: &Minifier, context: &EmitContext<'_>) -> Result<Self> {
        Ok(Self {
            file_name: minifier.file_name().to_string(),
            exports_header: (minifier.exports_file_name(), minifier.exports_header(context)?),
            embedded_source: (minifier.embedded_file_name(), minifier.embedded_source(context)?),
            offline_source: (minifier.offline_file_name(), minifier.offline_source(context)?),
        })
    }

    pub fn files(&self) -> [&(String, String); 3] {
        [&self.exports_header, &self.embedded_source, &self.offline_source]
    }
}

/// Serialized form of the batch's rename decisions
#[derive(Debug, Clone, Serialize)]
pub struct RenameMap<'a> {
    /// Source identifier (sigil included) to output name
    pub renames: BTreeMap<&'a str, &'a str>,
    pub exports: &'a BTreeSet<String>,
    pub exported_switches: &'a BTreeSet<String>,
}

/// Output of a finished batch
#[derive(Debug, Clone)]
pub struct MinifiedBatch {
    artifacts: Vec<ShaderArtifacts>,
    names: RenameTable,
    exports: BTreeSet<String>,
    exported_switches: BTreeSet<String>,
}

impl MinifiedBatch {
    pub fn artifacts(&self) -> &[ShaderArtifacts] {
        &self.artifacts
    }

    pub fn names(&self) -> &RenameTable {
        &self.names
    }

    pub fn rename_map(&self) -> RenameMap<'_> {
        RenameMap {
            renames: self.names.sorted(),
            exports: &self.exports,
            exported_switches: &self.exported_switches,
        }
    }

    /// Writes every artifact into `outdir`, creating it if needed
    ///
    /// # Returns
    /// Paths of the written files, in input order
    pub fn write_to(&self, outdir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(outdir).map_err(|source| ConfigurationError::CreateOutputDir { path: outdir.to_path_buf(), source })?;

        let mut written = Vec::new();
        for artifacts in &self.artifacts {
            for (name, contents) in artifacts.files() {
                let path = outdir.join(name);
                info!("Exporting {} <- {}", path.display(), artifacts.file_name);
                fs::write(&path, contents).map_err(|source| ConfigurationError::WriteOutput { path: path.clone(), source })?;
                written.push(path);
            }
        }
        Ok(written)
    }

    /// Writes the rename map as pretty-printed JSON
    pub fn write_rename_map(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.rename_map()).map_err(ConfigurationError::from)?;
        fs::write(path, json).map_err(|source| ConfigurationError::WriteOutput { path: path.to_path_buf(), source })?;
        Ok(())
    }
}
