//! Longest-match lexer.
//!
//! A straightforward hand-written scanner: at each position, whitespace and
//! `//` line comments are skipped, then the longest-matching rule wins
//! (keyword vs. identifier, multi-character operators vs. single-character
//! ones). Characters that match nothing are silently skipped, the same
//! permissive behavior as the reference tokenizer — malformed input simply
//! produces a token stream the parser will reject.

use pebble_core::SourceLocation;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Integer,
    Identifier,
    Keyword,
    BoolLiteral,
    NullLiteral,
    Operator,
    Punctuation,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    fn new(text: impl Into<String>, kind: TokenKind, location: SourceLocation) -> Self {
        Token {
            text: text.into(),
            kind,
            location,
        }
    }
}

const KEYWORDS: &[&str] = &[
    "if", "then", "elif", "else", "while", "do", "var", "return",
];
const BOOL_WORDS: &[&str] = &["true", "True", "false", "False"];
const WORD_OPERATORS: &[&str] = &["and", "or", "not"];

/// Multi-character operators, checked before their single-character prefixes.
const OPERATORS_LONG: &[&str] = &["<=", ">=", "==", "!="];
const OPERATORS_SHORT: &[char] = &[
    '+', '-', '*', '/', '%', '<', '>', '=',
];
const PUNCTUATION: &[char] = &['(', ')', '{', '}', ',', ';', ':'];

pub fn tokenize(file: &str, source: &str) -> Vec<Token> {
    let path = PathBuf::from(file);
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    let mut line = 1usize;
    let mut column = 1usize;

    let loc = |path: &PathBuf, line: usize, column: usize| -> SourceLocation {
        SourceLocation::new(path.clone(), line, column)
    };

    let advance = |pos: &mut usize, line: &mut usize, column: &mut usize, n: usize| {
        for _ in 0..n {
            if chars[*pos] == '\n' {
                *line += 1;
                *column = 1;
            } else {
                *column += 1;
            }
            *pos += 1;
        }
    };

    while pos < chars.len() {
        let c = chars[pos];

        if c.is_whitespace() {
            advance(&mut pos, &mut line, &mut column, 1);
            continue;
        }

        if c == '/' && chars.get(pos + 1) == Some(&'/') {
            while pos < chars.len() && chars[pos] != '\n' {
                advance(&mut pos, &mut line, &mut column, 1);
            }
            continue;
        }

        let start_line = line;
        let start_col = column;

        if c.is_ascii_digit() {
            let start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                advance(&mut pos, &mut line, &mut column, 1);
            }
            let text: String = chars[start..pos].iter().collect();
            tokens.push(Token::new(
                text,
                TokenKind::Integer,
                loc(&path, start_line, start_col),
            ));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_alphanumeric() || chars[pos] == '_') {
                advance(&mut pos, &mut line, &mut column, 1);
            }
            let text: String = chars[start..pos].iter().collect();
            let kind = if BOOL_WORDS.contains(&text.as_str()) {
                TokenKind::BoolLiteral
            } else if text == "unit" {
                TokenKind::NullLiteral
            } else if KEYWORDS.contains(&text.as_str()) || WORD_OPERATORS.contains(&text.as_str())
            {
                if WORD_OPERATORS.contains(&text.as_str()) {
                    TokenKind::Operator
                } else {
                    TokenKind::Keyword
                }
            } else {
                TokenKind::Identifier
            };
            tokens.push(Token::new(text, kind, loc(&path, start_line, start_col)));
            continue;
        }

        let rest: String = chars[pos..(pos + 2).min(chars.len())].iter().collect();
        if let Some(op) = OPERATORS_LONG.iter().find(|op| **op == rest) {
            advance(&mut pos, &mut line, &mut column, 2);
            tokens.push(Token::new(
                *op,
                TokenKind::Operator,
                loc(&path, start_line, start_col),
            ));
            continue;
        }

        if OPERATORS_SHORT.contains(&c) {
            advance(&mut pos, &mut line, &mut column, 1);
            tokens.push(Token::new(
                c.to_string(),
                TokenKind::Operator,
                loc(&path, start_line, start_col),
            ));
            continue;
        }

        if PUNCTUATION.contains(&c) {
            advance(&mut pos, &mut line, &mut column, 1);
            tokens.push(Token::new(
                c.to_string(),
                TokenKind::Punctuation,
                loc(&path, start_line, start_col),
            ));
            continue;
        }

        // Unrecognized character: skip it. The parser will reject whatever
        // malformed construct this produces.
        advance(&mut pos, &mut line, &mut column, 1);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn tokenizes_arithmetic() {
        let tokens = tokenize("t.pebble", "1 + 2 * 3");
        assert_eq!(texts(&tokens), vec!["1", "+", "2", "*", "3"]);
    }

    #[test]
    fn recognizes_keywords_and_bool_literals() {
        let tokens = tokenize("t.pebble", "if true then 1 else 2");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        assert_eq!(tokens[1].kind, TokenKind::BoolLiteral);
        assert_eq!(tokens[2].kind, TokenKind::Keyword);
    }

    #[test]
    fn distinguishes_comparison_from_equality() {
        let tokens = tokenize("t.pebble", "a <= b == c");
        assert_eq!(texts(&tokens), vec!["a", "<=", "b", "==", "c"]);
    }

    #[test]
    fn and_or_not_are_operators_not_identifiers() {
        let tokens = tokenize("t.pebble", "a and b or not c");
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[3].kind, TokenKind::Operator);
        assert_eq!(tokens[4].kind, TokenKind::Operator);
    }

    #[test]
    fn skips_line_comments() {
        let tokens = tokenize("t.pebble", "1 + // trailing comment\n2");
        assert_eq!(texts(&tokens), vec!["1", "+", "2"]);
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("t.pebble", "a\n  b");
        assert_eq!(tokens[0].location.line(), 1);
        assert_eq!(tokens[1].location.line(), 2);
        assert_eq!(tokens[1].location.column(), 3);
    }
}
