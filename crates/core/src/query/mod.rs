//! Boolean, phrase and proximity query language.
//!
//! ```text
//! query         := orExpr
//! orExpr        := andExpr (OR andExpr)*
//! andExpr       := notExpr (AND notExpr)*
//! notExpr       := nearExpr (NOT nearExpr)*
//! nearExpr      := atom (proximity atom)*
//! atom          := '(' orExpr ')' | proximityAtom | phrase | term
//! proximityAtom := operand proximity operand
//! proximity     := '/' DIGIT+ | '/s' | '/p'
//! operand       := phrase | term
//! phrase        := '"' word+ '"'
//! ```
//!
//! Operators are case-insensitive; terms and phrase contents are normalized
//! with the index tokenizer. Precedence from highest: proximity, `NOT`, `AND`,
//! `OR`. `NOT` is a difference against its left-hand side (`x NOT y` is
//! `x - y`); with nothing on the left it yields the empty set. Proximity next
//! to a parenthesized group compares match positions of the whole group.

/// Query lexer.
pub mod lexer;
/// Per-document positional match sets.
pub mod matches;
/// Proximity packing and shunting-yard conversion to postfix.
pub mod parser;
/// Postfix evaluation.
pub mod evaluator;

pub use evaluator::{evaluate, QueryEvaluator, QueryOptions, QueryOutcome};
pub use lexer::Proximity;
pub use matches::Matches;
pub use parser::{parse, Atom, Operator, ParsedQuery, QueryWarning, Step};
