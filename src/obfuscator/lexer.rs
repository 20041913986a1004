//! Conservative JavaScript tokenizer
//!
//! Splits source into tokens precise enough to find string and numeric
//! literals and the punctuation around them. Every byte of the input belongs
//! to exactly one token, so concatenating the token texts gives the source
//! back unchanged.
//!
//! Template literals (including their `${}` expressions), regular expression
//! literals and comments are kept as single opaque tokens.

/// Kind of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Comment,
    Str,
    Template,
    Regex,
    Number,
    Ident,
    Punct,
}

/// A slice of the source with its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }

    /// Trivia spanning a line break
    pub fn has_newline(&self) -> bool {
        self.is_trivia() && self.text.contains(['\n', '\r', '\u{2028}', '\u{2029}'])
    }

    /// Punctuation token with exactly this text
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    /// Identifier or keyword with exactly this text
    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    /// Whether a `/` after this token is a division operator
    ///
    /// `}` is treated as closing a block, so a following `/` starts a regex.
    pub fn ends_expression(&self) -> bool {
        match self.kind {
            TokenKind::Number | TokenKind::Str | TokenKind::Template | TokenKind::Regex => true,
            TokenKind::Ident => !KEYWORDS_BEFORE_EXPRESSION.contains(&self.text),
            TokenKind::Punct => matches!(self.text, ")" | "]" | "++" | "--"),
            TokenKind::Whitespace | TokenKind::Comment => false,
        }
    }
}

/// Keywords after which an expression (and so a regex) may start
pub const KEYWORDS_BEFORE_EXPRESSION: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw",
    "case", "do", "else", "yield", "await", "extends",
];

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b == b'\\' || b >= 0x80
}

fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Split `src` into tokens
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let bytes = src.as_bytes();
    let mut tokens: Vec<Token<'_>> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        let (kind, end) = if is_whitespace(b) {
            let mut j = i + 1;
            while j < bytes.len() && is_whitespace(bytes[j]) {
                j += 1;
            }
            (TokenKind::Whitespace, j)
        } else if b == b'/' && next == Some(b'/') {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j] != b'\n' && bytes[j] != b'\r' {
                j += 1;
            }
            (TokenKind::Comment, j)
        } else if b == b'/' && next == Some(b'*') {
            let end = src[i + 2..].find("*/").map(|p| i + 2 + p + 2).unwrap_or(bytes.len());
            (TokenKind::Comment, end)
        } else if b == b'\'' || b == b'"' {
            (TokenKind::Str, skip_string(bytes, i))
        } else if b == b'`' {
            (TokenKind::Template, skip_template(bytes, i))
        } else if b.is_ascii_digit() || (b == b'.' && next.is_some_and(|n| n.is_ascii_digit())) {
            (TokenKind::Number, skip_number(bytes, i))
        } else if is_ident_start(b) || (b == b'#' && next.is_some_and(is_ident_start)) {
            let mut j = i + 1;
            while j < bytes.len() && is_ident_part(bytes[j]) {
                j += 1;
            }
            (TokenKind::Ident, j)
        } else if b == b'/' && regex_allowed(&tokens) {
            match skip_regex(bytes, i) {
                Some(end) => (TokenKind::Regex, end),
                None => (TokenKind::Punct, i + 1),
            }
        } else if (b == b'+' || b == b'-') && next == Some(b) {
            (TokenKind::Punct, i + 2)
        } else {
            // Single ASCII punctuator; anything else would have been an identifier.
            (TokenKind::Punct, i + 1)
        };

        tokens.push(Token {
            kind,
            text: &src[i..end],
        });
        i = end;
    }

    tokens
}

/// A `/` starts a regex unless the previous significant token ends an expression
fn regex_allowed(tokens: &[Token<'_>]) -> bool {
    match tokens.iter().rev().find(|t| !t.is_trivia()) {
        Some(prev) => !prev.ends_expression(),
        None => true,
    }
}

/// End of a quoted string starting at `start`
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            c if c == quote => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a template literal starting at the backtick at `start`
fn skip_template(bytes: &[u8], start: usize) -> usize {
    let mut j = start + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'`' => return j + 1,
            b'$' if bytes.get(j + 1) == Some(&b'{') => j = skip_braced(bytes, j + 2),
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a `${ ... }` substitution whose body starts at `start`
fn skip_braced(bytes: &[u8], start: usize) -> usize {
    let mut depth = 1usize;
    let mut j = start;
    while j < bytes.len() {
        match bytes[j] {
            b'\'' | b'"' => j = skip_string(bytes, j),
            b'`' => j = skip_template(bytes, j),
            b'/' if bytes.get(j + 1) == Some(&b'/') => {
                while j < bytes.len() && bytes[j] != b'\n' {
                    j += 1;
                }
            }
            b'/' if bytes.get(j + 1) == Some(&b'*') => {
                j += 2;
                while j + 1 < bytes.len() && !(bytes[j] == b'*' && bytes[j + 1] == b'/') {
                    j += 1;
                }
                j += 2;
            }
            b'{' => {
                depth += 1;
                j += 1;
            }
            b'}' => {
                depth -= 1;
                j += 1;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

/// End of a numeric literal starting at `start`
fn skip_number(bytes: &[u8], start: usize) -> usize {
    let is_radix = bytes[start] == b'0'
        && matches!(bytes.get(start + 1), Some(b'x' | b'X' | b'o' | b'O' | b'b' | b'B'));
    let mut j = start;
    while j < bytes.len() {
        let c = bytes[j];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'.' {
            j += 1;
        } else if (c == b'+' || c == b'-') && !is_radix && matches!(bytes[j - 1], b'e' | b'E') {
            j += 1;
        } else {
            break;
        }
    }
    j
}

/// End of a regex literal at `start`, or `None` if the line ends first
fn skip_regex(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    let mut in_class = false;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'\n' | b'\r' => return None,
            b'[' => {
                in_class = true;
                j += 1;
            }
            b']' => {
                in_class = false;
                j += 1;
            }
            b'/' if !in_class => {
                j += 1;
                while j < bytes.len() && bytes[j].is_ascii_alphabetic() {
                    j += 1;
                }
                return Some(j);
            }
            _ => j += 1,
        }
    }
    None
}
