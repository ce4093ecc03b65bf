//! Identifier renaming
//!
//! Every identifier seen in a batch gets one replacement name. Identifiers are processed from the
//! most to the least frequent so the names that appear most often get the shortest replacements.
//!
//! Two sigils change how an identifier is treated:
//! - `@name` is a stable export. Its generated name is published in the export manifest, and it is
//!   drawn from an upper-case-only alphabet.
//! - `$name` is pinned. It is never renamed; only the sigil is dropped.

mod generator;
pub mod reserved;

pub use generator::NameGenerator;
pub use reserved::is_reserved;

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::catalog::SymbolCatalog;
use crate::error::InvariantViolation;

pub const EXPORT_SIGIL: char = '@';
pub const PIN_SIGIL: char = '$';

/// Replaces the export sigil when a stable export keeps its literal name, so that `@name` and
/// `name` never end up spelled the same
pub const EXPORTED_LITERAL_PREFIX: &str = "_EXPORTED_";

/// Longest name the allocator will generate before giving up
pub const MAX_GENERATED_NAME_LEN: usize = 6;

pub fn is_stable_export(name: &str) -> bool {
    name.starts_with(EXPORT_SIGIL)
}

pub fn is_pinned(name: &str) -> bool {
    name.starts_with(PIN_SIGIL)
}

pub fn strip_sigil(name: &str) -> &str {
    name.strip_prefix([EXPORT_SIGIL, PIN_SIGIL]).unwrap_or(name)
}

/// Spelling of an identifier that is not renamed
pub fn literal_name(name: &str) -> String {
    match name.strip_prefix(EXPORT_SIGIL) {
        Some(exported) => format!("{EXPORTED_LITERAL_PREFIX}{exported}"),
        None => strip_sigil(name).to_string(),
    }
}

/// Returns false for pinned identifiers and for identifiers the platform reserves
pub fn is_renameable(name: &str) -> bool {
    !is_pinned(name) && !is_reserved(strip_sigil(name))
}

/// Mapping from every identifier of a batch (sigil included) to its output spelling
#[derive(Debug, Clone, Default)]
pub struct RenameTable {
    names: HashMap<String, String>,
}

impl RenameTable {
    /// Assigns a name to every identifier in `catalog`
    ///
    /// # Arguments
    /// * `catalog` - Occurrence counts for the whole batch
    /// * `human_readable` - Keep every identifier's literal spelling instead of renaming
    ///
    /// # Errors
    /// Returns an [`InvariantViolation`] if a generated name is already taken or if no name of at
    /// most [`MAX_GENERATED_NAME_LEN`] characters is left.
    pub fn allocate(catalog: &SymbolCatalog, human_readable: bool) -> Result<Self, InvariantViolation> {
        let identifiers = catalog.identifiers_by_priority();
        let mut names = HashMap::with_capacity(identifiers.len());
        let mut used = HashSet::new();

        // Literal spellings are claimed first so no generated name can shadow them.
        for &(identifier, _) in &identifiers {
            if human_readable || !is_renameable(identifier) {
                let literal = literal_name(identifier);
                used.insert(literal.clone());
                names.insert(identifier.to_string(), literal);
            }
        }

        if human_readable {
            return Ok(Self { names });
        }

        // The offline artifact spells exported switches by their literal name.
        for switch in catalog.exported_switches() {
            used.insert(strip_sigil(switch).to_string());
        }

        let mut general = NameGenerator::general();
        let mut upper_case = NameGenerator::upper_case();
        for &(identifier, count) in &identifiers {
            if names.contains_key(identifier) {
                continue;
            }

            let generator = if is_stable_export(identifier) { &mut upper_case } else { &mut general };
            let name = next_free_name(generator, &used, identifier)?;
            if !used.insert(name.clone()) {
                return Err(InvariantViolation::NameCollision { identifier: identifier.to_string(), name });
            }

            trace!(identifier, name = name.as_str(), count, "renamed identifier");
            names.insert(identifier.to_string(), name);
        }

        debug!(identifiers = names.len(), "allocated identifier names");
        Ok(Self { names })
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.names.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All entries, ordered by source identifier
    pub fn sorted(&self) -> BTreeMap<&str, &str> {
        self.names.iter().map(|(identifier, name)| (identifier.as_str(), name.as_str())).collect()
    }
}

fn next_free_name(generator: &mut NameGenerator, used: &HashSet<String>, identifier: &str) -> Result<String, InvariantViolation> {
    generator
        .by_ref()
        .take_while(|name| name.len() <= MAX_GENERATED_NAME_LEN)
        .find(|name| !is_reserved(name) && !used.contains(name))
        .ok_or_else(|| InvariantViolation::NameSpaceExhausted {
            identifier: identifier.to_string(),
            max_len: MAX_GENERATED_NAME_LEN,
        })
}
