//! Query parser: token stream → postfix program.
//!
//! Parsing runs in three passes over the lexer output:
//!
//! 1. `AND NOT` collapses to `NOT`, so `x AND NOT y` means `x NOT y`.
//! 2. Adjacent `operand proximity operand` triples are packed into one atomic
//!    unit. Proximity binds tighter than any boolean operator and would
//!    otherwise be indistinguishable from three ordinary tokens.
//! 3. Shunting-yard conversion to postfix with precedence
//!    `proximity > NOT > AND > OR`. A proximity operator that could not be
//!    packed (one side is a parenthesized group) stays a binary operator.
//!
//! Parsing is lenient: unmatched `)` is ignored, unmatched `(` is dropped when
//! the operator stack drains, and operators missing an operand act on the
//! empty set. Each recovery is recorded as a [`QueryWarning`].

use super::lexer::{lex, Proximity, Token};
use crate::error::QueryError;
use crate::text::Tokenizer;
use std::fmt;

/// Leaf of a query after term normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// A single indexed word.
    Term(String),
    /// Two or more words at consecutive positions.
    Phrase(Vec<String>),
    /// Query text that normalizes to no indexable word (a stop word, say);
    /// matches nothing.
    Void(String),
}

impl Atom {
    /// Normalize raw query text with the index tokenizer.
    fn normalize(raw: &str, tokenizer: &Tokenizer) -> Self {
        let mut words = tokenizer.tokenize(raw);
        match words.len() {
            0 => Atom::Void(raw.to_string()),
            1 => Atom::Term(words.remove(0)),
            _ => Atom::Phrase(words),
        }
    }

    fn words(&self) -> Vec<&str> {
        match self {
            Atom::Term(t) => vec![t.as_str()],
            Atom::Phrase(words) => words.iter().map(String::as_str).collect(),
            Atom::Void(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Term(t) => f.write_str(t),
            Atom::Phrase(words) => write!(f, "\"{}\"", words.join(" ")),
            Atom::Void(raw) => write!(f, "<{raw}>"),
        }
    }
}

/// Binary operator of the postfix program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    /// Difference: `x NOT y` keeps documents of `x` that do not match `y`.
    Not,
    /// Positional constraint between two sub-expressions.
    Near(Proximity),
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Near(_) => 4,
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => f.write_str("AND"),
            Operator::Or => f.write_str("OR"),
            Operator::Not => f.write_str("NOT"),
            Operator::Near(p) => p.fmt(f),
        }
    }
}

/// One instruction of the postfix program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Atom(Atom),
    /// Packed `operand proximity operand` unit.
    Proximity {
        left: Atom,
        op: Proximity,
        right: Atom,
    },
    Operator(Operator),
}

/// Recovery applied while parsing a malformed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryWarning {
    /// A `)` without a matching `(` was ignored.
    UnmatchedClose,
    /// A `(` was never closed.
    UnmatchedOpen,
    /// An operator had fewer than two operands; the missing side is the empty set.
    MissingOperand(Operator),
    /// Operands were left without a joining operator; only the last one is returned.
    UnusedOperands(usize),
    /// A term or phrase normalized to no indexable word and matches nothing.
    VoidTerm(String),
}

impl QueryWarning {
    /// Structural warnings make a query malformed; [`QueryWarning::VoidTerm`] does not.
    pub fn is_structural(&self) -> bool {
        !matches!(self, QueryWarning::VoidTerm(_))
    }
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryWarning::UnmatchedClose => f.write_str("unmatched ')' ignored"),
            QueryWarning::UnmatchedOpen => f.write_str("unmatched '(' ignored"),
            QueryWarning::MissingOperand(op) => {
                write!(f, "operator {op} is missing an operand; the empty set was used")
            }
            QueryWarning::UnusedOperands(n) => {
                write!(f, "{n} operand(s) not joined by an operator were discarded")
            }
            QueryWarning::VoidTerm(raw) => {
                write!(f, "'{raw}' has no indexable words and matches nothing")
            }
        }
    }
}

/// A parsed query ready for evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Instructions in postfix order.
    pub postfix: Vec<Step>,
    pub warnings: Vec<QueryWarning>,
}

impl ParsedQuery {
    /// `true` when nothing can be evaluated (empty query, operators only, …).
    pub fn is_empty(&self) -> bool {
        !self
            .postfix
            .iter()
            .any(|s| matches!(s, Step::Atom(_) | Step::Proximity { .. }))
    }

    /// Distinct indexable words that can contribute to a match, in query order.
    ///
    /// Walks the postfix program the way evaluation does, so words under the
    /// right operand of `NOT` (and operands left unused) are not returned.
    pub fn terms(&self) -> Vec<&str> {
        let mut stack: Vec<Vec<&str>> = Vec::new();
        for step in &self.postfix {
            let words = match step {
                Step::Atom(atom) => atom.words(),
                Step::Proximity { left, right, .. } => {
                    let mut words = left.words();
                    words.extend(right.words());
                    words
                }
                Step::Operator(op) => {
                    let right = stack.pop().unwrap_or_default();
                    let mut left = stack.pop().unwrap_or_default();
                    if *op != Operator::Not {
                        left.extend(right);
                    }
                    left
                }
            };
            stack.push(words);
        }
        let mut seen = Vec::new();
        for word in stack.pop().unwrap_or_default() {
            if !seen.contains(&word) {
                seen.push(word);
            }
        }
        seen
    }

    /// Reject the query if it has no atoms or any structural warning.
    pub fn into_strict(self) -> Result<Self, QueryError> {
        if self.is_empty() {
            return Err(QueryError::Empty);
        }
        if let Some(w) = self.warnings.iter().find(|w| w.is_structural()) {
            return Err(QueryError::Malformed(w.clone()));
        }
        Ok(self)
    }
}

// intermediate unit after proximity packing
enum Unit {
    Open,
    Close,
    Atom(Atom),
    Packed(Atom, Proximity, Atom),
    Operator(Operator),
}

/// Parse `query` into a postfix program, normalizing terms with `tokenizer`.
pub fn parse(query: &str, tokenizer: &Tokenizer) -> ParsedQuery {
    let mut warnings = Vec::new();
    let tokens = absorb_and_not(lex(query));
    let units = pack_proximity(tokens, tokenizer, &mut warnings);
    let postfix = to_postfix(units, &mut warnings);
    check_arity(&postfix, &mut warnings);
    ParsedQuery { postfix, warnings }
}

fn absorb_and_not(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token == Token::Not && out.last() == Some(&Token::And) {
            out.pop();
        }
        out.push(token);
    }
    out
}

fn operand_text(token: &Token) -> Option<&str> {
    match token {
        Token::Term(raw) | Token::Phrase(raw) => Some(raw.as_str()),
        _ => None,
    }
}

fn operand_atom(raw: &str, tokenizer: &Tokenizer, warnings: &mut Vec<QueryWarning>) -> Atom {
    let atom = Atom::normalize(raw, tokenizer);
    if let Atom::Void(raw) = &atom {
        warnings.push(QueryWarning::VoidTerm(raw.clone()));
    }
    atom
}

fn pack_proximity(
    tokens: Vec<Token>,
    tokenizer: &Tokenizer,
    warnings: &mut Vec<QueryWarning>,
) -> Vec<Unit> {
    let mut units = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let left = operand_text(&tokens[i]);
        let right = tokens.get(i + 2).and_then(operand_text);
        if let (Some(left), Some(Token::Proximity(op)), Some(right)) =
            (left, tokens.get(i + 1), right)
        {
            let left = operand_atom(left, tokenizer, warnings);
            let right = operand_atom(right, tokenizer, warnings);
            units.push(Unit::Packed(left, *op, right));
            i += 3;
            continue;
        }
        let unit = match &tokens[i] {
            Token::LParen => Unit::Open,
            Token::RParen => Unit::Close,
            Token::And => Unit::Operator(Operator::And),
            Token::Or => Unit::Operator(Operator::Or),
            Token::Not => Unit::Operator(Operator::Not),
            Token::Proximity(op) => Unit::Operator(Operator::Near(*op)),
            Token::Term(raw) | Token::Phrase(raw) => {
                Unit::Atom(operand_atom(raw, tokenizer, warnings))
            }
        };
        units.push(unit);
        i += 1;
    }
    units
}

// `None` on the stack marks an open parenthesis
fn to_postfix(units: Vec<Unit>, warnings: &mut Vec<QueryWarning>) -> Vec<Step> {
    let mut output = Vec::with_capacity(units.len());
    let mut stack: Vec<Option<Operator>> = Vec::new();
    for unit in units {
        match unit {
            Unit::Atom(atom) => output.push(Step::Atom(atom)),
            Unit::Packed(left, op, right) => output.push(Step::Proximity { left, op, right }),
            Unit::Open => stack.push(None),
            Unit::Close => {
                let mut matched = false;
                while let Some(top) = stack.pop() {
                    match top {
                        Some(op) => output.push(Step::Operator(op)),
                        None => {
                            matched = true;
                            break;
                        }
                    }
                }
                if !matched {
                    warnings.push(QueryWarning::UnmatchedClose);
                }
            }
            Unit::Operator(op) => {
                while let Some(&Some(top)) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Step::Operator(top));
                    stack.pop();
                }
                stack.push(Some(op));
            }
        }
    }
    while let Some(top) = stack.pop() {
        match top {
            Some(op) => output.push(Step::Operator(op)),
            None => warnings.push(QueryWarning::UnmatchedOpen),
        }
    }
    output
}

// Simulate the evaluation stack depth to report missing or unused operands.
fn check_arity(postfix: &[Step], warnings: &mut Vec<QueryWarning>) {
    let mut depth = 0usize;
    for step in postfix {
        match step {
            Step::Atom(_) | Step::Proximity { .. } => depth += 1,
            Step::Operator(op) => {
                if depth < 2 {
                    warnings.push(QueryWarning::MissingOperand(*op));
                    depth = 1;
                } else {
                    depth -= 1;
                }
            }
        }
    }
    if depth > 1 {
        warnings.push(QueryWarning::UnusedOperands(depth - 1));
    }
}
