//! Batch-wide identifier bookkeeping.
//!
//! The catalog is filled while every file of a batch is tokenized and is read afterwards by the
//! dead-macro stripper. Once stripping is done it is rebuilt from the surviving tokens, and that
//! rebuilt catalog drives the name allocator. It never makes renaming decisions itself.

use std::collections::{BTreeSet, HashMap};

use crate::lexer::{Token, TokenKind};
use crate::minifier::canonical_swizzle;
use crate::names::{EXPORT_SIGIL, is_stable_export};

/// Occurrence counts for every identifier seen across one batch
#[derive(Debug, Default, Clone)]
pub struct SymbolCatalog {
    /// Defining plus referencing occurrences
    counts: HashMap<String, usize>,
    /// Position of each identifier's first occurrence in the batch
    first_seen: HashMap<String, usize>,
    /// Referencing occurrences only
    reference_counts: HashMap<String, usize>,
    /// Stable-export identifiers tested by `#ifdef`, `#ifndef` or `defined(...)`
    exported_switches: BTreeSet<String>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `name`
    ///
    /// # Arguments
    /// * `name` - Identifier as written in source, sigil included
    /// * `is_reference` - `false` only for the name being defined by a `#define`
    pub fn record(&mut self, name: &str, is_reference: bool) {
        let next = self.first_seen.len();
        self.first_seen.entry(name.to_string()).or_insert(next);
        *self.counts.entry(name.to_string()).or_insert(0) += 1;
        if is_reference {
            *self.reference_counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }

    /// Records `name` as tested inside a conditional directive
    ///
    /// Only stable-export identifiers are tracked; anything else is ignored.
    pub fn record_switch(&mut self, name: &str) {
        if name.starts_with(EXPORT_SIGIL) {
            self.exported_switches.insert(name.to_string());
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn reference_count(&self, name: &str) -> usize {
        self.reference_counts.get(name).copied().unwrap_or(0)
    }

    pub fn is_exported_switch(&self, name: &str) -> bool {
        self.exported_switches.contains(name)
    }

    pub fn exported_switches(&self) -> impl Iterator<Item = &str> {
        self.exported_switches.iter().map(String::as_str)
    }

    /// Stable-export identifiers of the whole batch, sorted
    pub fn exports(&self) -> impl Iterator<Item = &str> {
        let exports: BTreeSet<&str> = self.counts.keys().map(String::as_str).filter(|name| is_stable_export(name)).collect();
        exports.into_iter()
    }

    /// Builds a fresh catalog from token streams, counting occurrences the way they are emitted
    ///
    /// Stable exports known to `self` but absent from `streams` are kept with a zero count, after
    /// every live identifier, so the export manifests still publish them.
    pub fn recount<'a>(&self, streams: impl IntoIterator<Item = &'a [Token]>) -> Self {
        let mut catalog = Self::new();
        for tokens in streams {
            catalog.record_tokens(tokens);
        }

        let mut vanished: Vec<(&str, usize)> = self
            .counts
            .keys()
            .filter(|name| is_stable_export(name) && !catalog.counts.contains_key(*name))
            .map(|name| (name.as_str(), self.first_seen[name]))
            .collect();
        vanished.sort_by_key(|&(_, first_seen)| first_seen);
        for (name, _) in vanished {
            let next = catalog.first_seen.len();
            catalog.first_seen.insert(name.to_string(), next);
            catalog.counts.insert(name.to_string(), 0);
        }

        catalog
    }

    fn record_tokens(&mut self, tokens: &[Token]) {
        let mut follows_dot = false;
        for token in tokens {
            if token.is_whitespace() || token.is_comment() {
                continue;
            }

            match &token.kind {
                TokenKind::Define { name, arglist, body } => {
                    for stream in [arglist, body].into_iter().flatten() {
                        self.record_tokens(stream);
                    }
                    self.record(name, false);
                }
                TokenKind::IfDef { name, .. } | TokenKind::DefinedId { name } => {
                    self.record_switch(name);
                    self.record(name, true);
                }
                TokenKind::Directive { body: Some(body) } => self.record_tokens(body),
                // Accessors are emitted in their `xyzw` spelling.
                TokenKind::Identifier => match canonical_swizzle(&token.text).filter(|_| follows_dot) {
                    Some(swizzle) => self.record(&swizzle, true),
                    None => self.record(&token.text, true),
                },
                _ => {}
            }

            follows_dot = token.kind == TokenKind::Operator && token.text == ".";
        }
    }

    /// Number of distinct identifiers
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Returns every identifier with its total count, most frequent first
    ///
    /// Ties keep the order in which identifiers were first seen. Renaming preserves that order,
    /// which is what lets re-minified output come back unchanged.
    pub fn identifiers_by_priority(&self) -> Vec<(&str, usize)> {
        let mut identifiers: Vec<(&str, usize, usize)> = self.counts.iter().map(|(name, count)| (name.as_str(), *count, self.first_seen[name])).collect();
        identifiers.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        identifiers.into_iter().map(|(name, count, _)| (name, count)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defining_occurrences_are_not_references() {
        let mut catalog = SymbolCatalog::new();
        catalog.record("FOO", false);
        catalog.record("FOO", true);
        catalog.record("BAR", false);

        assert_eq!(catalog.count("FOO"), 2);
        assert_eq!(catalog.reference_count("FOO"), 1);
        assert_eq!(catalog.count("BAR"), 1);
        assert_eq!(catalog.reference_count("BAR"), 0);
        assert_eq!(catalog.count("missing"), 0);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_only_exported_names_become_switches() {
        let mut catalog = SymbolCatalog::new();
        catalog.record_switch("@ENABLE_CLIPPING");
        catalog.record_switch("ENABLE_FEATHER");
        catalog.record_switch("$PINNED");

        assert!(catalog.is_exported_switch("@ENABLE_CLIPPING"));
        assert!(!catalog.is_exported_switch("ENABLE_FEATHER"));
        assert_eq!(catalog.exported_switches().collect::<Vec<_>>(), vec!["@ENABLE_CLIPPING"]);
    }

    #[test]
    fn test_priority_order_is_count_then_first_occurrence() {
        let mut catalog = SymbolCatalog::new();
        for name in ["zz", "b", "a", "c", "c", "b", "c"] {
            catalog.record(name, true);
        }
        catalog.record("aa", true);

        let order: Vec<_> = catalog.identifiers_by_priority().into_iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["c", "b", "zz", "a", "aa"]);
    }

    #[test]
    fn test_exports_are_sorted_and_batch_wide() {
        let mut catalog = SymbolCatalog::new();
        for name in ["@ZETA", "local", "@ALPHA", "$pinned", "@ZETA"] {
            catalog.record(name, true);
        }
        assert_eq!(catalog.exports().collect::<Vec<_>>(), vec!["@ALPHA", "@ZETA"]);
    }

    #[test]
    fn test_recount_follows_surviving_tokens() {
        let lexed = |source: &str, catalog: &mut SymbolCatalog| {
            let mut context = crate::lexer::LexContext { catalog, policy: Default::default() };
            crate::lexer::tokenize(source, &mut context).unwrap()
        };
        let mut catalog = SymbolCatalog::new();
        let _dead = lexed("#define DEAD q q @GONE\n", &mut catalog);
        let live = lexed("#ifdef @ON\nfloat p; p = v.rg.x + q;\n#endif\n", &mut catalog);
        assert_eq!(catalog.count("q"), 3);

        let recounted = catalog.recount([live.as_slice()]);
        assert_eq!(recounted.count("q"), 1);
        assert_eq!(recounted.count("DEAD"), 0);
        assert_eq!(recounted.count("rg"), 0);
        assert_eq!(recounted.count("xy"), 1);
        assert!(recounted.is_exported_switch("@ON"));
        // A vanished export keeps a zero count and sorts last.
        assert_eq!(recounted.exports().collect::<Vec<_>>(), vec!["@GONE", "@ON"]);
        assert_eq!(recounted.identifiers_by_priority().last(), Some(&("@GONE", 0)));
    }
}
