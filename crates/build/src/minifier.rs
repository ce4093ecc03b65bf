//! Per-file stripping and re-emission of lexed shader source
//!
//! A [`Minifier`] holds the tokens of one input file. Once the whole batch has been lexed,
//! [`strip_batch`] removes comments and dead macros from every file, names are allocated from the
//! surviving tokens, and each file writes three artifacts:
//! - an export manifest (`<stem>.exports.h`) publishing the generated names of every `@` identifier
//!   in the batch,
//! - an embedded source (`<file>.hpp`) holding the minified code in a C++ string constant,
//! - an offline source (`<stem>.minified.<ext>`) for out-of-process compilation, where exported
//!   switches keep their literal names so a build step can still `#define` them.

use std::path::Path;

use crate::catalog::SymbolCatalog;
use crate::error::{InvariantViolation, LexError};
use crate::lexer::{LexContext, Token, TokenKind, UnknownCharPolicy, tokenize};
use crate::names::{RenameTable, strip_sigil};

/// Options shared by every file of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifyOptions {
    /// Skip renaming and stripping; whitespace is written back verbatim
    pub human_readable: bool,
    pub unknown_chars: UnknownCharPolicy,
    /// Namespaces wrapping the embedded string constant, outermost first
    pub embed_namespaces: Vec<String>,
    /// Prefix of the macros in the export manifest
    pub export_prefix: String,
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self {
            human_readable: false,
            unknown_chars: UnknownCharPolicy::PassThrough,
            embed_namespaces: vec!["rive".to_string(), "gpu".to_string(), "glsl".to_string()],
            export_prefix: "GLSL_".to_string(),
        }
    }
}

/// Batch-wide tables consulted while emitting
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub names: &'a RenameTable,
    pub catalog: &'a SymbolCatalog,
    pub options: &'a MinifyOptions,
}

/// Tokens of a single input file
#[derive(Debug, Clone)]
pub struct Minifier {
    file_name: String,
    tokens: Vec<Token>,
}

impl Minifier {
    /// Lexes `source`, recording its identifiers in the batch catalog
    ///
    /// # Arguments
    /// * `file_name` - Base name of the input file, e.g. `draw_path.vert`
    /// * `source` - Shader source text
    /// * `catalog` - Batch-wide catalog shared by every file
    /// * `policy` - Handling of characters no lexical rule accepts
    pub fn new(file_name: &str, source: &str, catalog: &mut SymbolCatalog, policy: UnknownCharPolicy) -> Result<Self, LexError> {
        let tokens = tokenize(source, &mut LexContext { catalog, policy })?;
        Ok(Self {
            file_name: file_name.to_string(),
            tokens,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// File name without its last extension
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name).file_stem().and_then(|stem| stem.to_str()).unwrap_or(&self.file_name)
    }

    /// Drops unreferenced macros, turns comments into whitespace and merges adjacent whitespace
    ///
    /// Must only run after every file of the batch has been lexed, since a macro defined here may
    /// be referenced from another file. Returns the number of macro definitions removed.
    pub fn strip(&mut self, catalog: &SymbolCatalog) -> usize {
        let mut removed = 0;
        self.tokens = strip_tokens(std::mem::take(&mut self.tokens), catalog, &mut removed);
        removed
    }

    /// Writes the tokens back out as source text
    ///
    /// # Arguments
    /// * `context` - Rename table, catalog and options of the batch
    /// * `preserve_exported_switches` - Spell exported switches by their literal name
    ///
    /// # Returns
    /// The source text and whether it ends at the start of a fresh line
    pub fn emit(&self, context: &EmitContext<'_>, preserve_exported_switches: bool) -> Result<(String, bool), InvariantViolation> {
        let mut out = String::new();
        let is_newline = emit_tokens(&self.tokens, &mut out, context, preserve_exported_switches)?;
        Ok((out, is_newline))
    }

    pub fn exports_file_name(&self) -> String {
        format!("{}.exports.h", self.stem())
    }

    pub fn embedded_file_name(&self) -> String {
        format!("{}.hpp", self.file_name)
    }

    pub fn offline_file_name(&self) -> String {
        match Path::new(&self.file_name).extension().and_then(|ext| ext.to_str()) {
            Some(ext) => format!("{}.minified.{ext}", self.stem()),
            None => format!("{}.minified", self.stem()),
        }
    }

    /// Export manifest: one macro per stable export of the batch, mapping its name to the
    /// generated name
    pub fn exports_header(&self, context: &EmitContext<'_>) -> Result<String, InvariantViolation> {
        let mut out = String::from("#pragma once\n\n");
        for export in context.catalog.exports() {
            let name = lookup(context.names, export)?;
            out.push_str(&format!("#define {}{} \"{name}\"\n", context.options.export_prefix, strip_sigil(export)));
        }
        Ok(out)
    }

    /// Embedded source: the fully renamed code in a global raw string constant
    ///
    /// The constant is deliberately a global so that including it twice fails at link time.
    pub fn embedded_source(&self, context: &EmitContext<'_>) -> Result<String, InvariantViolation> {
        let mut out = String::from("#pragma once\n\n");
        out.push_str(&format!("#include \"{}\"\n\n", self.exports_file_name()));

        for namespace in &context.options.embed_namespaces {
            out.push_str(&format!("namespace {namespace} {{\n"));
        }
        out.push_str(&format!("const char {}[] = R\"===(", self.stem()));

        let (code, is_newline) = self.emit(context, false)?;
        out.push_str(&code);
        if !is_newline {
            out.push('\n');
        }
        out.push_str(")===\";\n");

        let closing: Vec<String> = context.options.embed_namespaces.iter().rev().map(|namespace| format!("}} // namespace {namespace}")).collect();
        out.push_str(&closing.join("\n"));
        Ok(out)
    }

    /// Offline source: renamed code with exported switches left under their literal names
    pub fn offline_source(&self, context: &EmitContext<'_>) -> Result<String, InvariantViolation> {
        self.emit(context, true).map(|(code, _)| code)
    }
}

/// Strips every file of a batch until no unreferenced macro is left
///
/// Removing a macro can leave another one unreferenced, so stripping repeats with a catalog
/// recounted from the surviving tokens until a pass removes nothing.
///
/// # Arguments
/// * `minifiers` - Every file of the batch
/// * `lexed` - Catalog filled while lexing the batch
///
/// # Returns
/// The catalog of the stripped batch and the number of macro definitions removed
pub fn strip_batch(minifiers: &mut [Minifier], lexed: &SymbolCatalog) -> (SymbolCatalog, usize) {
    let mut removed: usize = minifiers.iter_mut().map(|minifier| minifier.strip(lexed)).sum();
    let mut total = removed;
    loop {
        let catalog = lexed.recount(minifiers.iter().map(Minifier::tokens));
        if removed == 0 {
            return (catalog, total);
        }
        removed = minifiers.iter_mut().map(|minifier| minifier.strip(&catalog)).sum();
        total += removed;
    }
}

fn strip_tokens(tokens: Vec<Token>, catalog: &SymbolCatalog, removed: &mut usize) -> Vec<Token> {
    let mut stripped: Vec<Token> = Vec::with_capacity(tokens.len());

    for mut token in tokens {
        // A comment still separates its neighbors.
        if token.is_comment() {
            token = Token {
                kind: TokenKind::Whitespace,
                text: " ".to_string(),
                line: token.line,
            };
        }

        match &mut token.kind {
            TokenKind::Define { name, .. } if catalog.reference_count(name) == 0 => {
                *removed += 1;
                continue;
            }
            TokenKind::Define { arglist, body, .. } => {
                strip_nested(arglist, catalog, removed);
                strip_nested(body, catalog, removed);
            }
            TokenKind::Directive { body } => strip_nested(body, catalog, removed),
            _ => {}
        }

        if token.is_whitespace() {
            if let Some(last) = stripped.last_mut().filter(|last| last.is_whitespace()) {
                last.text.push_str(&token.text);
                continue;
            }
        }
        stripped.push(token);
    }

    stripped
}

fn strip_nested(stream: &mut Option<Vec<Token>>, catalog: &SymbolCatalog, removed: &mut usize) {
    if let Some(tokens) = stream.take() {
        *stream = Some(strip_tokens(tokens, catalog, removed));
    }
}

/// Emits `tokens` to `out`, returning whether the output now ends at the start of a line
fn emit_tokens(tokens: &[Token], out: &mut String, context: &EmitContext<'_>, preserve_exported_switches: bool) -> Result<bool, InvariantViolation> {
    let human_readable = context.options.human_readable;
    let mut last_token: Option<&Token> = None;
    let mut last_needs_spacing = false;
    let mut is_newline = true;
    let mut separated = false;

    for token in tokens {
        if token.is_whitespace() {
            if human_readable {
                out.push_str(&token.text);
                is_newline = token.text.ends_with('\n');
                last_needs_spacing = false;
            } else {
                separated = true;
            }
            continue;
        }

        let is_directive = token.is_directive();
        let needs_spacing = token.needs_spacing();
        if is_directive && !is_newline {
            out.push('\n');
        } else if needs_spacing && last_needs_spacing {
            out.push(' ');
        } else if separated && last_token.is_some_and(|last| operators_merge(last, token)) {
            out.push(' ');
        }
        is_newline = false;
        separated = false;

        match &token.kind {
            TokenKind::Identifier => {
                let follows_dot = last_token.is_some_and(|last| last.kind == TokenKind::Operator && last.text == ".");
                match canonical_swizzle(&token.text).filter(|_| follows_dot) {
                    Some(swizzle) => out.push_str(&swizzle),
                    None => write_identifier(out, &token.text, context, preserve_exported_switches)?,
                }
            }
            TokenKind::Define { name, arglist, body } => {
                out.push_str("#define ");
                write_identifier(out, name, context, preserve_exported_switches)?;
                if let Some(arglist) = arglist {
                    is_newline = emit_tokens(arglist, out, context, preserve_exported_switches)?;
                    debug_assert!(!is_newline, "macro argument list ended a line");
                }
                if let Some(body) = body {
                    // Human-readable output already carries the body's leading whitespace.
                    if !(human_readable && body.first().is_some_and(Token::is_whitespace)) {
                        out.push(' ');
                    }
                    is_newline = emit_tokens(body, out, context, preserve_exported_switches)?;
                }
            }
            TokenKind::IfDef { tag, name } => {
                out.push('#');
                out.push_str(tag.as_str());
                out.push(' ');
                write_identifier(out, name, context, preserve_exported_switches)?;
            }
            TokenKind::DefinedId { name } => {
                out.push_str("defined(");
                write_identifier(out, name, context, preserve_exported_switches)?;
                out.push(')');
            }
            TokenKind::Directive { body } => {
                out.push('#');
                if let Some(body) = body {
                    is_newline = emit_tokens(body, out, context, preserve_exported_switches)?;
                }
            }
            _ => out.push_str(&token.text),
        }

        // Human-readable output keeps the source's own newline after a directive.
        if !human_readable && is_directive && !is_newline {
            out.push('\n');
            is_newline = true;
        }

        last_token = Some(token);
        last_needs_spacing = needs_spacing;
    }

    Ok(is_newline)
}

/// Whether two operators that were apart in source would lex as a different token side by side
fn operators_merge(previous: &Token, next: &Token) -> bool {
    previous.kind == TokenKind::Operator
        && next.kind == TokenKind::Operator
        && matches!(
            (previous.text.as_str(), next.text.as_str()),
            ("+", "+") | ("-", "-") | ("/", "/" | "*") | ("&", "&") | ("|", "|") | ("^", "^") | ("<", "<") | (">", ">") | ("<" | ">" | "=" | "!", "=")
        )
}

fn write_identifier(out: &mut String, identifier: &str, context: &EmitContext<'_>, preserve_exported_switches: bool) -> Result<(), InvariantViolation> {
    if preserve_exported_switches && context.catalog.is_exported_switch(identifier) {
        out.push_str(strip_sigil(identifier));
    } else {
        out.push_str(lookup(context.names, identifier)?);
    }
    Ok(())
}

fn lookup<'a>(names: &'a RenameTable, identifier: &str) -> Result<&'a str, InvariantViolation> {
    names.get(identifier).ok_or_else(|| InvariantViolation::UnnamedIdentifier(identifier.to_string()))
}

/// Rewrites a 1 to 4 character `rgba` or `stpq` accessor into `xyzw`, position by position
pub fn canonical_swizzle(accessor: &str) -> Option<String> {
    const ALTERNATE_ALPHABETS: [&str; 2] = ["rgba", "stpq"];
    const CANONICAL: [char; 4] = ['x', 'y', 'z', 'w'];

    if !(1..=4).contains(&accessor.len()) {
        return None;
    }
    ALTERNATE_ALPHABETS.iter().find_map(|alphabet| accessor.chars().map(|c| alphabet.find(c).map(|position| CANONICAL[position])).collect())
}
