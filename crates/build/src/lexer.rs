//! Shader source tokenizer
//!
//! Lexing tries an ordered table of rules at each position and keeps the first one that matches.
//! Each rule is greedy within its own pattern, but an earlier rule always beats a later one: the
//! `#define` rule wins over the generic `#` directive, `defined(X)` wins over a bare identifier and
//! comments win over the `/` operator. Macro argument lists, macro bodies and directive bodies are
//! lexed again as nested token streams with the same rules.
//!
//! The token sequence is lossless: concatenating the text of every token reproduces the input.

use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::SymbolCatalog;
use crate::error::LexError;

static DEFINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[ \t]*define[ \t]+([@$]?[A-Za-z_][A-Za-z0-9_]*)(\([^)]*\))?").expect("valid regex"));
static DEFINE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[ \t]*define\b").expect("valid regex"));
static IFDEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[ \t]*(ifn?def)[ \t]+([@$]?[A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));
static IFDEF_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[ \t]*(ifn?def)\b").expect("valid regex"));
static DEFINED_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^defined\(([@$]?[A-Za-z_][A-Za-z0-9_]*)\)").expect("valid regex"));
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^//(?:\\\n|[^\n])*").expect("valid regex"));
static BLOCK_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^/\*.*?\*/").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\s|\\\r?\n)+").expect("valid regex"));
static OPERATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[~!%^&*()\-=+/\[\]{}?:<>.,|;]").expect("valid regex"));
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:(?:[0-9]*\.[0-9]+|[0-9]+\.)(?:[eE][+-]?[0-9]+)?|[0-9]+[eE][+-]?[0-9]+)").expect("valid regex"));
static HEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]+u?").expect("valid regex"));
static INT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+u?").expect("valid regex"));
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[@$]?[A-Za-z_][A-Za-z0-9_]*").expect("valid regex"));

/// What to do with a character that no lexical rule accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCharPolicy {
    /// Emit it as a single [`TokenKind::Unknown`] token that is written back verbatim
    #[default]
    PassThrough,
    /// Fail with [`LexError::IllegalCharacter`]
    Reject,
}

/// Which conditional an [`TokenKind::IfDef`] token opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfDefTag {
    IfDef,
    IfNDef,
}

impl IfDefTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IfDef => "ifdef",
            Self::IfNDef => "ifndef",
        }
    }
}

/// Token classification, with the decomposed payload of preprocessor forms
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `#define NAME(args) body`
    Define {
        /// Macro name, sigil included
        name: String,
        /// Parenthesized argument list, lexed as its own stream
        arglist: Option<Vec<Token>>,
        /// Rest of the logical line, lexed as its own stream
        body: Option<Vec<Token>>,
    },
    /// `#ifdef NAME` or `#ifndef NAME`
    IfDef { tag: IfDefTag, name: String },
    /// `defined(NAME)` inside an expression
    DefinedId { name: String },
    /// `##`
    TokenPaste,
    /// Any other `#...` line
    Directive { body: Option<Vec<Token>> },
    LineComment,
    BlockComment,
    Whitespace,
    Operator,
    FloatLiteral,
    HexLiteral,
    IntLiteral,
    Identifier,
    Unknown,
}

/// A lexed token
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text covered by this token
    pub text: String,
    /// 1-based line on which the token starts
    pub line: usize,
}

impl Token {
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace)
    }

    /// Preprocessor lines that must start on a line of their own
    pub fn is_directive(&self) -> bool {
        matches!(self.kind, TokenKind::Define { .. } | TokenKind::IfDef { .. } | TokenKind::Directive { .. })
    }

    /// Tokens that would merge with a neighbor of the same class if written back to back
    pub fn needs_spacing(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::FloatLiteral | TokenKind::IntLiteral | TokenKind::HexLiteral | TokenKind::Identifier | TokenKind::DefinedId { .. }
        )
    }
}

/// Per-file state threaded through the lexer, nested streams included
pub struct LexContext<'a> {
    /// Batch-wide occurrence counts
    pub catalog: &'a mut SymbolCatalog,
    pub policy: UnknownCharPolicy,
}

/// Tokenizes a whole source file
///
/// Every identifier occurrence is recorded in the context's catalog as it is produced.
///
/// # Errors
/// Returns an error for a malformed `#define`/`#ifdef`/`#ifndef`, or for an unmatched character
/// when the context's policy is [`UnknownCharPolicy::Reject`].
pub fn tokenize(source: &str, context: &mut LexContext<'_>) -> Result<Vec<Token>, LexError> {
    tokenize_at(source, 1, context)
}

fn tokenize_at(source: &str, first_line: usize, context: &mut LexContext<'_>) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = first_line;

    while pos < source.len() {
        let rest = &source[pos..];
        let (len, kind) = next_token(rest, line, context)?;
        let text = &rest[..len];
        tokens.push(Token { kind, text: text.to_string(), line });
        line += count_newlines(text);
        pos += len;
    }

    Ok(tokens)
}

type Match = Option<(usize, TokenKind)>;

/// A lexical rule: returns the length and kind of the token at the start of `rest`, if it matches
type Rule = fn(&str, usize, &mut LexContext<'_>) -> Result<Match, LexError>;

/// Rules in priority order
const RULES: &[Rule] = &[
    lex_define,
    lex_ifdef,
    lex_defined_id,
    lex_token_paste,
    lex_directive,
    lex_line_comment,
    lex_block_comment,
    lex_whitespace,
    lex_operator,
    lex_float,
    lex_hex,
    lex_int,
    lex_identifier,
];

fn next_token(rest: &str, line: usize, context: &mut LexContext<'_>) -> Result<(usize, TokenKind), LexError> {
    for rule in RULES {
        if let Some(matched) = rule(rest, line, context)? {
            return Ok(matched);
        }
    }

    match (context.policy, rest.chars().next()) {
        (UnknownCharPolicy::Reject, Some(character)) => Err(LexError::IllegalCharacter { character, line }),
        (_, character) => Ok((character.map_or(rest.len(), char::len_utf8), TokenKind::Unknown)),
    }
}

fn lex_define(rest: &str, line: usize, context: &mut LexContext<'_>) -> Result<Match, LexError> {
    let Some(captures) = DEFINE.captures(rest) else {
        if DEFINE_KEYWORD.is_match(rest) {
            return Err(malformed_directive("define", rest, line));
        }
        return Ok(None);
    };

    let name = captures[1].to_string();
    let head_len = captures[0].len();

    let arglist_match = captures.get(2);
    let arglist = match arglist_match {
        Some(arglist) => Some(tokenize_at(arglist.as_str(), line, context)?),
        None => None,
    };

    // The body starts on the line where the argument list ended.
    let body_line = line + arglist_match.map_or(0, |arglist| count_newlines(arglist.as_str()));
    let body_len = scan_line_body(&rest[head_len..]);
    let body_text = &rest[head_len..head_len + body_len];
    let body = if body_text.is_empty() { None } else { Some(tokenize_at(body_text, body_line, context)?) };

    context.catalog.record(&name, false);

    Ok(Some((head_len + body_len, TokenKind::Define { name, arglist, body })))
}

fn lex_ifdef(rest: &str, line: usize, context: &mut LexContext<'_>) -> Result<Match, LexError> {
    if let Some(captures) = IFDEF.captures(rest) {
        let tag = if &captures[1] == "ifndef" { IfDefTag::IfNDef } else { IfDefTag::IfDef };
        let name = captures[2].to_string();
        context.catalog.record_switch(&name);
        context.catalog.record(&name, true);
        return Ok(Some((captures[0].len(), TokenKind::IfDef { tag, name })));
    }

    match IFDEF_KEYWORD.captures(rest) {
        Some(keyword) => {
            let directive = if &keyword[1] == "ifndef" { "ifndef" } else { "ifdef" };
            Err(malformed_directive(directive, rest, line))
        }
        None => Ok(None),
    }
}

fn lex_defined_id(rest: &str, _line: usize, context: &mut LexContext<'_>) -> Result<Match, LexError> {
    let Some(captures) = DEFINED_ID.captures(rest) else {
        return Ok(None);
    };

    let name = captures[1].to_string();
    context.catalog.record_switch(&name);
    context.catalog.record(&name, true);

    Ok(Some((captures[0].len(), TokenKind::DefinedId { name })))
}

fn lex_token_paste(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(rest.starts_with("##").then_some((2, TokenKind::TokenPaste)))
}

fn lex_directive(rest: &str, line: usize, context: &mut LexContext<'_>) -> Result<Match, LexError> {
    let Some(after_hash) = rest.strip_prefix('#') else {
        return Ok(None);
    };

    let body_start = rest.len() - after_hash.trim_start_matches([' ', '\t']).len();
    let body_len = scan_line_body(&rest[body_start..]);
    let body_text = &rest[body_start..body_start + body_len];
    let body = if body_text.is_empty() { None } else { Some(tokenize_at(body_text, line, context)?) };

    Ok(Some((body_start + body_len, TokenKind::Directive { body })))
}

fn lex_line_comment(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&LINE_COMMENT, rest, TokenKind::LineComment))
}

fn lex_block_comment(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&BLOCK_COMMENT, rest, TokenKind::BlockComment))
}

fn lex_whitespace(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&WHITESPACE, rest, TokenKind::Whitespace))
}

fn lex_operator(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&OPERATOR, rest, TokenKind::Operator))
}

fn lex_float(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&FLOAT, rest, TokenKind::FloatLiteral))
}

fn lex_hex(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&HEX, rest, TokenKind::HexLiteral))
}

fn lex_int(rest: &str, _line: usize, _context: &mut LexContext<'_>) -> Result<Match, LexError> {
    Ok(match_pattern(&INT, rest, TokenKind::IntLiteral))
}

fn lex_identifier(rest: &str, _line: usize, context: &mut LexContext<'_>) -> Result<Match, LexError> {
    let Some(found) = IDENTIFIER.find(rest) else {
        return Ok(None);
    };

    context.catalog.record(found.as_str(), true);

    Ok(Some((found.end(), TokenKind::Identifier)))
}

fn match_pattern(pattern: &Regex, rest: &str, kind: TokenKind) -> Match {
    pattern.find(rest).map(|found| (found.end(), kind))
}

/// Length of a directive body: the rest of the logical line, following backslash-newline
/// continuations and stopping in front of a `//` or `/*` comment
fn scan_line_body(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'\n') => i += 2,
            b'\n' => break,
            b'/' if matches!(bytes.get(i + 1), Some(b'/' | b'*')) => break,
            _ => i += 1,
        }
    }
    i
}

fn malformed_directive(directive: &'static str, rest: &str, line: usize) -> LexError {
    LexError::MalformedDirective {
        directive,
        text: rest.lines().next().unwrap_or(rest).to_string(),
        line,
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lexed {
        tokens: Vec<Token>,
        catalog: SymbolCatalog,
    }

    fn lex_with(source: &str, policy: UnknownCharPolicy) -> Result<Lexed, LexError> {
        let mut catalog = SymbolCatalog::new();
        let tokens = tokenize(source, &mut LexContext { catalog: &mut catalog, policy })?;
        Ok(Lexed { tokens, catalog })
    }

    fn lex(source: &str) -> Lexed {
        lex_with(source, UnknownCharPolicy::PassThrough).unwrap()
    }

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|token| token.text.as_str()).collect()
    }

    #[test]
    fn test_tokens_cover_input_losslessly() {
        let source = "#version 300 es\n// line comment\n#define @FOO(a, b) (a+b) /* trailing */\nvec4 c = vec4(.5, 1e3, 0x1Fu, 7u);\n\"odd\" \\\n";
        let lexed = lex(source);
        assert_eq!(texts(&lexed.tokens).concat(), source);
    }

    #[test]
    fn test_define_decomposes_into_nested_streams() {
        let lexed = lex("#define MIX(a,b) a*b+1\n");
        let TokenKind::Define { name, arglist, body } = &lexed.tokens[0].kind else {
            panic!("expected a define, got {:?}", lexed.tokens[0]);
        };
        assert_eq!(name, "MIX");
        assert_eq!(texts(arglist.as_ref().unwrap()), vec!["(", "a", ",", "b", ")"]);
        assert_eq!(texts(body.as_ref().unwrap()), vec![" ", "a", "*", "b", "+", "1"]);

        // The defining occurrence is not a reference; argument uses are.
        assert_eq!(lexed.catalog.count("MIX"), 1);
        assert_eq!(lexed.catalog.reference_count("MIX"), 0);
        assert_eq!(lexed.catalog.reference_count("a"), 2);
    }

    #[test]
    fn test_define_body_stops_before_comments() {
        let lexed = lex("#define X 1 // one\n#define Y 2/* two */\n");
        let kinds: Vec<_> = lexed.tokens.iter().map(|token| token.text.as_str()).collect();
        assert_eq!(kinds, vec!["#define X 1 ", "// one", "\n", "#define Y 2", "/* two */", "\n"]);
    }

    #[test]
    fn test_define_body_follows_line_continuations() {
        let lexed = lex("#define LONG a + \\\n    b\nc");
        assert_eq!(lexed.tokens[0].text, "#define LONG a + \\\n    b");
        let last = lexed.tokens.last().unwrap();
        assert_eq!(last.text, "c");
        assert_eq!(last.line, 3);
    }

    #[test]
    fn test_define_without_body() {
        let lexed = lex("#define @ENABLE_FEATHER\n");
        assert_eq!(lexed.tokens[0].kind, TokenKind::Define { name: "@ENABLE_FEATHER".to_string(), arglist: None, body: None });
        assert_eq!(lexed.catalog.exports().collect::<Vec<_>>(), vec!["@ENABLE_FEATHER"]);
    }

    #[test]
    fn test_ifdef_and_defined_record_exported_switches() {
        let lexed = lex("#ifndef @ENABLE_CLIPPING\n#endif\n#if defined(@ENABLE_FEATHER) && defined(LOCAL)\n#endif\n");

        assert_eq!(lexed.tokens[0].kind, TokenKind::IfDef { tag: IfDefTag::IfNDef, name: "@ENABLE_CLIPPING".to_string() });
        assert!(lexed.catalog.is_exported_switch("@ENABLE_CLIPPING"));
        assert!(lexed.catalog.is_exported_switch("@ENABLE_FEATHER"));
        assert!(!lexed.catalog.is_exported_switch("LOCAL"));
        assert_eq!(lexed.catalog.reference_count("LOCAL"), 1);

        let directive = lexed.tokens.iter().find(|token| token.text.starts_with("#if ")).unwrap();
        let TokenKind::Directive { body: Some(body) } = &directive.kind else {
            panic!("expected a directive body");
        };
        assert!(body.iter().any(|token| token.kind == TokenKind::DefinedId { name: "LOCAL".to_string() }));
    }

    #[test]
    fn test_token_paste_is_a_single_token() {
        let lexed = lex("#define REG(IDX) t##IDX\n");
        let TokenKind::Define { body: Some(body), .. } = &lexed.tokens[0].kind else {
            panic!("expected a define with a body");
        };
        assert_eq!(texts(body), vec![" ", "t", "##", "IDX"]);
        assert_eq!(body[2].kind, TokenKind::TokenPaste);
    }

    #[test]
    fn test_numeric_literal_priority() {
        let lexed = lex(".5 1.5e3 2. 3e2 0xffu 7u 12");
        let classified: Vec<_> = lexed.tokens.iter().filter(|token| !token.is_whitespace()).map(|token| (token.text.as_str(), token.kind.clone())).collect();
        assert_eq!(
            classified,
            vec![
                // The operator rule comes first, so a leading '.' is never part of a float.
                (".", TokenKind::Operator),
                ("5", TokenKind::IntLiteral),
                ("1.5e3", TokenKind::FloatLiteral),
                ("2.", TokenKind::FloatLiteral),
                ("3e2", TokenKind::FloatLiteral),
                ("0xffu", TokenKind::HexLiteral),
                ("7u", TokenKind::IntLiteral),
                ("12", TokenKind::IntLiteral),
            ]
        );
    }

    #[test]
    fn test_unknown_characters_pass_through() {
        let lexed = lex("#include \"x.h\"\n@ é");
        let TokenKind::Directive { body: Some(body) } = &lexed.tokens[0].kind else {
            panic!("expected a directive body");
        };
        assert_eq!(body[2].kind, TokenKind::Unknown);
        assert_eq!(body[2].text, "\"");

        let unknown: Vec<_> = lexed.tokens.iter().filter(|token| token.kind == TokenKind::Unknown).map(|token| token.text.as_str()).collect();
        assert_eq!(unknown, vec!["@", "é"]);
    }

    #[test]
    fn test_strict_mode_rejects_unknown_characters() {
        let error = lex_with("float a;\nfloat b = `;", UnknownCharPolicy::Reject).err().unwrap();
        assert_eq!(error, LexError::IllegalCharacter { character: '`', line: 2 });
    }

    #[test]
    fn test_malformed_directives_are_errors() {
        let error = lex_with("\n#define 3 x\n", UnknownCharPolicy::PassThrough).err().unwrap();
        assert_eq!(error, LexError::MalformedDirective { directive: "define", text: "#define 3 x".to_string(), line: 2 });

        let error = lex_with("#ifndef\n", UnknownCharPolicy::PassThrough).err().unwrap();
        assert!(matches!(error, LexError::MalformedDirective { directive: "ifndef", line: 1, .. }));

        // A longer directive word is not a malformed define.
        assert!(lex_with("#defineX\n", UnknownCharPolicy::PassThrough).is_ok());
    }

    #[test]
    fn test_line_numbers_track_comments_and_whitespace() {
        let lexed = lex("a\n/* two\nlines */ b\n\n  c");
        let lines: Vec<_> = lexed.tokens.iter().filter(|token| token.kind == TokenKind::Identifier).map(|token| (token.text.as_str(), token.line)).collect();
        assert_eq!(lines, vec![("a", 1), ("b", 3), ("c", 5)]);
    }
}
