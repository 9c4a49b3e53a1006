//! Single-pass query lexer.
//!
//! Recognizes quoted phrases, parentheses, the proximity operators `/s`, `/p`
//! and `/<digits>`, and bare word runs. A run that is exactly `AND`, `OR` or
//! `NOT` (any case) is an operator, so hyphenated words such as
//! `not-to-exceed` stay terms. Anything else is a separator.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static QUERY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"[^"]*"|\(|\)|/s\b|/p\b|/[0-9]+|[a-z0-9'\-]+"#)
        .expect("valid query token pattern")
});

/// Positional constraint between two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Proximity {
    /// `/n`: some occurrences at most `n` tokens apart.
    Within(u32),
    /// `/s`: some occurrences in the same sentence.
    Sentence,
    /// `/p`: approximated as a fixed token window.
    Paragraph,
}

impl fmt::Display for Proximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proximity::Within(n) => write!(f, "/{n}"),
            Proximity::Sentence => f.write_str("/s"),
            Proximity::Paragraph => f.write_str("/p"),
        }
    }
}

/// Lexical unit of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Proximity(Proximity),
    /// Raw text between double quotes.
    Phrase(String),
    /// Raw bare word, lowercased.
    Term(String),
}

/// Split a query string into tokens.
pub fn lex(query: &str) -> Vec<Token> {
    QUERY_TOKEN
        .find_iter(query)
        .map(|m| classify(m.as_str()))
        .collect()
}

fn classify(raw: &str) -> Token {
    match raw {
        "(" => return Token::LParen,
        ")" => return Token::RParen,
        _ => {}
    }
    if let Some(inner) = raw.strip_prefix('"') {
        let inner = inner.strip_suffix('"').unwrap_or(inner);
        return Token::Phrase(inner.to_lowercase());
    }
    if let Some(op) = raw.strip_prefix('/') {
        return Token::Proximity(match op {
            "s" | "S" => Proximity::Sentence,
            "p" | "P" => Proximity::Paragraph,
            digits => Proximity::Within(digits.parse().unwrap_or(u32::MAX)),
        });
    }
    if raw.eq_ignore_ascii_case("and") {
        Token::And
    } else if raw.eq_ignore_ascii_case("or") {
        Token::Or
    } else if raw.eq_ignore_ascii_case("not") {
        Token::Not
    } else {
        Token::Term(raw.to_lowercase())
    }
}
