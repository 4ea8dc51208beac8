//! Condition tokenizer
//!
//! Brackets are single-character tokens and `&&` / `||` are found with a
//! two-character lookahead. Everything else accumulates into a symbol until
//! the next bracket, operator or the end of input; symbols are trimmed and
//! whitespace-only symbols are dropped.

/// Kind of a condition token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Open,
    Close,
    And,
    Or,
    Symbol,
}

/// A token together with its byte span in the condition text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, src: &'a str, start: usize, end: usize) -> Self {
        Self {
            kind,
            text: &src[start..end],
            start,
            end,
        }
    }
}

/// Split condition text into tokens.
pub fn tokenize(src: &str) -> Vec<Token<'_>> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut symbol_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let (kind, width) = match bytes[i] {
            b'(' => (Some(TokenKind::Open), 1),
            b')' => (Some(TokenKind::Close), 1),
            b'&' if bytes.get(i + 1) == Some(&b'&') => (Some(TokenKind::And), 2),
            b'|' if bytes.get(i + 1) == Some(&b'|') => (Some(TokenKind::Or), 2),
            _ => (None, 1),
        };

        if let Some(kind) = kind {
            push_symbol(&mut tokens, src, symbol_start, i);
            tokens.push(Token::new(kind, src, i, i + width));
            symbol_start = i + width;
        }
        i += width;
    }
    push_symbol(&mut tokens, src, symbol_start, bytes.len());

    tokens
}

fn push_symbol<'a>(tokens: &mut Vec<Token<'a>>, src: &'a str, start: usize, end: usize) {
    let raw = &src[start..end];
    let trimmed = raw.trim_start();
    let start = start + (raw.len() - trimmed.len());
    let trimmed = trimmed.trim_end();
    if !trimmed.is_empty() {
        tokens.push(Token::new(TokenKind::Symbol, src, start, start + trimmed.len()));
    }
}
