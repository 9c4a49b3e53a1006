//! Postfix evaluation of parsed queries against an [`InvertedIndex`].

use super::lexer::Proximity;
use super::matches::Matches;
use super::parser::{parse, Atom, Operator, ParsedQuery, QueryWarning, Step};
use crate::config;
use crate::document::DocId;
use crate::error::QueryError;
use crate::index::InvertedIndex;

/// Evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Token window used for `/p`.
    pub paragraph_window: u32,
    /// Reject malformed queries instead of evaluating them best-effort.
    pub strict: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            paragraph_window: config::PARAGRAPH_WINDOW,
            strict: false,
        }
    }
}

/// Result of a lenient evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOutcome {
    /// Matching document ids, ascending, each once.
    pub doc_ids: Vec<DocId>,
    /// Recoveries applied while parsing.
    pub warnings: Vec<QueryWarning>,
}

/// Evaluates boolean, phrase and proximity queries over one index.
#[derive(Debug, Clone, Copy)]
pub struct QueryEvaluator<'a> {
    index: &'a InvertedIndex,
    options: QueryOptions,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self::with_options(index, QueryOptions::default())
    }

    pub fn with_options(index: &'a InvertedIndex, options: QueryOptions) -> Self {
        Self { index, options }
    }

    /// Parse `query` with the index tokenizer.
    pub fn parse(&self, query: &str) -> ParsedQuery {
        parse(query, self.index.tokenizer())
    }

    /// Evaluate `query`, honouring [`QueryOptions::strict`].
    ///
    /// In lenient mode this never fails; an empty or unevaluable query yields
    /// no documents.
    pub fn evaluate(&self, query: &str) -> Result<Vec<DocId>, QueryError> {
        if self.options.strict {
            let parsed = self.parse(query).into_strict()?;
            Ok(self.run(&parsed).doc_ids())
        } else {
            Ok(self.evaluate_lenient(query).doc_ids)
        }
    }

    /// Best-effort evaluation that reports recoveries instead of failing.
    pub fn evaluate_lenient(&self, query: &str) -> QueryOutcome {
        let parsed = self.parse(query);
        for warning in &parsed.warnings {
            tracing::warn!(query, %warning, "lenient query recovery");
        }
        let doc_ids = self.run(&parsed).doc_ids();
        tracing::debug!(query, matches = doc_ids.len(), "boolean query evaluated");
        QueryOutcome {
            doc_ids,
            warnings: parsed.warnings,
        }
    }

    /// Run a postfix program. Missing operands evaluate to the empty set; when
    /// several results remain, the last one wins.
    pub fn run(&self, parsed: &ParsedQuery) -> Matches {
        let mut stack: Vec<Matches> = Vec::new();
        for step in &parsed.postfix {
            let value = match step {
                Step::Atom(atom) => self.atom(atom),
                Step::Proximity { left, op, right } => {
                    self.near(self.atom(left), *op, self.atom(right))
                }
                Step::Operator(op) => {
                    let right = stack.pop().unwrap_or_default();
                    let left = stack.pop().unwrap_or_default();
                    match op {
                        Operator::And => left.and(right),
                        Operator::Or => left.or(right),
                        Operator::Not => left.not(&right),
                        Operator::Near(p) => self.near(left, *p, right),
                    }
                }
            };
            stack.push(value);
        }
        stack.pop().unwrap_or_default()
    }

    fn atom(&self, atom: &Atom) -> Matches {
        match atom {
            Atom::Term(term) => Matches::term(self.index, term),
            Atom::Phrase(words) => Matches::phrase(self.index, words),
            Atom::Void(_) => Matches::empty(),
        }
    }

    fn near(&self, left: Matches, op: Proximity, right: Matches) -> Matches {
        match op {
            Proximity::Within(n) => left.within(right, n),
            Proximity::Paragraph => left.within(right, self.options.paragraph_window),
            Proximity::Sentence => left.same_sentence(right, self.index),
        }
    }
}

/// Evaluate a query leniently with default options.
/// Returns matching document ids in ascending order.
pub fn evaluate(index: &InvertedIndex, query: &str) -> Vec<DocId> {
    QueryEvaluator::new(index).evaluate_lenient(query).doc_ids
}
