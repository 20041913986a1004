//! Script obfuscation
//!
//! A token-level rewriter with two transforms:
//!
//! - **Numbers to expressions**: plain integer literals become parenthesized
//!   arithmetic such as `(0x1f*0x3-0x4b)`.
//! - **String array**: string literals move into an array returned by a
//!   hoisted function at the top of the script and are read back through an
//!   accessor, optionally routed through wrapper functions (the calls
//!   transform).
//!
//! Literals in positions that require a literal (object keys, class member
//! names, module specifiers, directives and bare literal statements) are left
//! alone. Template literals, regexes and comments pass through verbatim.
//!
//! The obfuscator keeps its random state between scripts, so identifiers it
//! introduces stay unique across every script of one bundle while the output
//! remains deterministic for a given seed and script order.

pub mod lexer;
pub mod numbers;
pub mod strings;

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lexer::{tokenize, Token, TokenKind};
use strings::{StringArray, StringPool};

/// Configuration for obfuscation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObfuscateOptions {
    /// Rewrite integer literals as arithmetic expressions
    pub numbers_to_expressions: bool,
    /// Move string literals into an indirected array
    pub string_array: bool,
    /// Route string lookups through wrapper functions
    pub string_array_calls_transform: bool,
    /// Number of wrapper functions when the calls transform is on
    pub string_array_wrappers: usize,
    /// Seed for every random choice
    pub seed: u64,
}

impl Default for ObfuscateOptions {
    fn default() -> Self {
        Self {
            numbers_to_expressions: true,
            string_array: true,
            string_array_calls_transform: true,
            string_array_wrappers: 3,
            seed: 0,
        }
    }
}

/// Directives that must stay string literals
const DIRECTIVES: &[&str] = &["use strict", "use asm"];

/// Keywords whose parenthesized head is followed by a statement
const CONTROL_KEYWORDS: &[&str] = &["if", "while", "for", "with"];

/// Contextual keywords that may precede a method name
const METHOD_MODIFIERS: &[&str] = &["get", "set", "static", "async"];

/// Output fragment before string references are resolved
enum Piece<'a> {
    Text(&'a str),
    Owned(String),
    StringRef(usize),
}

/// Stateful script obfuscator
pub struct Obfuscator {
    options: ObfuscateOptions,
    rng: StdRng,
    reserved: HashSet<String>,
}

impl Obfuscator {
    /// Create an obfuscator
    pub fn new(options: ObfuscateOptions) -> Self {
        let rng = StdRng::seed_from_u64(options.seed);
        Self {
            options,
            rng,
            reserved: HashSet::new(),
        }
    }

    /// Obfuscate one script
    pub fn obfuscate(&mut self, source: &str) -> String {
        let tokens = tokenize(source);
        let context = Context::new(&tokens);

        let mut pieces: Vec<Piece<'_>> = Vec::with_capacity(tokens.len());
        let mut pool = StringPool::new();

        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::Number if self.options.numbers_to_expressions => {
                    match numbers::plain_integer(token.text) {
                        Some(value) if !context.is_literal_position(i) => {
                            let expr = numbers::to_expression(value, &mut self.rng);
                            if context.needs_semicolon(i) {
                                pieces.push(Piece::Owned(format!(";{}", expr)));
                            } else {
                                pieces.push(Piece::Owned(expr));
                            }
                        }
                        _ => pieces.push(Piece::Text(token.text)),
                    }
                }
                TokenKind::Str
                    if self.options.string_array
                        && is_complete_string(token.text)
                        && !context.is_literal_position(i)
                        && !context.is_module_specifier(i)
                        && !is_directive(token.text) =>
                {
                    pieces.push(Piece::StringRef(pool.intern(token.text)));
                }
                _ => pieces.push(Piece::Text(token.text)),
            }
        }

        if pool.is_empty() {
            return render(pieces, None, &mut self.rng);
        }

        let wrapper_count = if self.options.string_array_calls_transform {
            self.options.string_array_wrappers
        } else {
            0
        };
        let reserved = &mut self.reserved;
        let array = StringArray::build(pool, wrapper_count, &mut self.rng, |rng| {
            fresh_name(rng, reserved, source)
        });

        let (at, semicolon) = context.prologue_end(&tokens);
        let prelude = Prelude {
            array: &array,
            at,
            semicolon,
        };
        render(pieces, Some(prelude), &mut self.rng)
    }
}

/// Identifier not used by the source nor handed out before
fn fresh_name(rng: &mut StdRng, reserved: &mut HashSet<String>, source: &str) -> String {
    loop {
        let name = format!("_0x{:06x}", rng.gen_range(0..0x100_0000u32));
        if !source.contains(&name) && reserved.insert(name.clone()) {
            return name;
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_directive(raw: &str) -> bool {
    let inner = &raw[1..raw.len() - 1];
    DIRECTIVES.contains(&inner)
}

/// A quoted string with both quotes present
fn is_complete_string(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() < 2 || bytes[0] != bytes[bytes.len() - 1] {
        return false;
    }
    // The closing quote must not itself be escaped.
    let backslashes = bytes[1..bytes.len() - 1]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    backslashes % 2 == 0
}

/// Where the string array declarations go
struct Prelude<'s> {
    array: &'s StringArray,
    /// Piece index the declarations precede
    at: usize,
    /// Emit `;` first, closing a directive written without one
    semicolon: bool,
}

/// Join pieces, resolving string references
///
/// There is exactly one piece per token, so piece and token indices agree.
fn render(pieces: Vec<Piece<'_>>, prelude: Option<Prelude<'_>>, rng: &mut StdRng) -> String {
    let mut out = String::new();

    for (i, piece) in pieces.into_iter().enumerate() {
        if let Some(prelude) = prelude.as_ref().filter(|p| p.at == i) {
            if prelude.semicolon {
                out.push(';');
            }
            out.push_str(&prelude.array.prelude());
        }
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Owned(text) => out.push_str(&text),
            Piece::StringRef(index) => {
                if let Some(prelude) = &prelude {
                    if out.bytes().last().is_some_and(is_ident_byte) {
                        out.push(' ');
                    }
                    out.push_str(&prelude.array.reference(index, rng));
                }
            }
        }
    }

    out
}

/// Neighbourhood queries over a token stream
struct Context<'t, 'a> {
    tokens: &'t [Token<'a>],
    /// Token index -> previous non-trivia token index
    prev: Vec<Option<usize>>,
    /// Token index -> next non-trivia token index
    next: Vec<Option<usize>>,
    /// `)` tokens closing an `if`/`while`/`for`/`with` head
    control_close: HashSet<usize>,
}

impl<'t, 'a> Context<'t, 'a> {
    fn new(tokens: &'t [Token<'a>]) -> Self {
        let mut prev = vec![None; tokens.len()];
        let mut next = vec![None; tokens.len()];

        let mut last = None;
        for (i, token) in tokens.iter().enumerate() {
            prev[i] = last;
            if !token.is_trivia() {
                last = Some(i);
            }
        }
        let mut following = None;
        for (i, token) in tokens.iter().enumerate().rev() {
            next[i] = following;
            if !token.is_trivia() {
                following = Some(i);
            }
        }

        let mut control_close = HashSet::new();
        let mut open: Vec<bool> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if token.is_punct("(") {
                let is_control = match prev[i] {
                    Some(p) if tokens[p].kind == TokenKind::Ident
                        && CONTROL_KEYWORDS.contains(&tokens[p].text) => true,
                    // for await (...)
                    Some(p) if tokens[p].is_ident("await") => {
                        prev[p].is_some_and(|pp| tokens[pp].is_ident("for"))
                    }
                    _ => false,
                };
                open.push(is_control);
            } else if token.is_punct(")") {
                if let Some(is_control) = open.pop() {
                    if is_control {
                        control_close.insert(i);
                    }
                }
            }
        }

        Self {
            tokens,
            prev,
            next,
            control_close,
        }
    }

    fn prev_token(&self, i: usize) -> Option<&Token<'a>> {
        self.prev[i].map(|p| &self.tokens[p])
    }

    fn next_token(&self, i: usize) -> Option<&Token<'a>> {
        self.next[i].map(|n| &self.tokens[n])
    }

    /// Whether the literal at `i` must stay a literal
    ///
    /// Covers object literal keys, class and object member names, class
    /// fields and bare literal statements (directives included).
    fn is_literal_position(&self, i: usize) -> bool {
        let prev = self.prev_token(i);
        let next = self.next_token(i);

        let prev_is = |ps: &[&str]| prev.is_some_and(|p| ps.iter().any(|s| p.is_punct(s)));
        let next_is = |ps: &[&str]| next.is_some_and(|n| ps.iter().any(|s| n.is_punct(s)));
        let prev_is_modifier = prev.is_some_and(|p| {
            p.kind == TokenKind::Ident && METHOD_MODIFIERS.contains(&p.text)
        });
        let statement_start = prev.is_none() || prev_is(&["{", ";", "}"]);

        // { key: value }
        if next_is(&[":"]) && prev_is(&["{", ","]) {
            return true;
        }
        // { key() {} } / class { key() {} }
        if next_is(&["("]) && (prev_is(&["{", "}", ";", ",", "*"]) || prev_is_modifier) {
            return true;
        }
        // class { key = value }
        if next_is(&["="]) && (statement_start || prev_is_modifier) {
            return true;
        }
        // 'use strict'; / class { key; }
        if statement_start && (next.is_none() || next_is(&[";", "}"])) {
            return true;
        }
        false
    }

    /// `import ... from 'x'`, `import 'x'`, `export ... from 'x'`
    fn is_module_specifier(&self, i: usize) -> bool {
        self.prev_token(i)
            .is_some_and(|p| p.is_ident("from") || p.is_ident("import"))
    }

    /// A parenthesized replacement at `i` would otherwise continue the
    /// previous line as a call
    fn needs_semicolon(&self, i: usize) -> bool {
        let p = match self.prev[i] {
            Some(p) => p,
            None => return false,
        };
        let crosses_line = self.tokens[p + 1..i].iter().any(|t| t.has_newline());
        if !crosses_line {
            return false;
        }
        let prev = &self.tokens[p];
        if prev.is_punct("}") {
            return true;
        }
        prev.ends_expression() && !self.control_close.contains(&p)
    }

    /// Token index after the directive prologue, and whether a `;` must be
    /// emitted before code inserted there
    fn prologue_end(&self, tokens: &[Token<'a>]) -> (usize, bool) {
        let mut end = 0;
        let mut needs_semicolon = false;
        let mut cursor = tokens.iter().position(|t| !t.is_trivia());

        while let Some(i) = cursor {
            let token = &tokens[i];
            if token.kind != TokenKind::Str
                || !is_complete_string(token.text)
                || !is_directive(token.text)
            {
                break;
            }
            match self.next[i] {
                Some(n) if tokens[n].is_punct(";") => {
                    end = n + 1;
                    needs_semicolon = false;
                    cursor = self.next[n];
                }
                _ => {
                    end = i + 1;
                    needs_semicolon = true;
                    cursor = self.next[i];
                }
            }
        }

        (end, needs_semicolon)
    }
}
