//! Command-line collaborator for `aerosearch-core`: corpus loading, search
//! commands, an interactive loop and offline evaluation.

/// JSONL, JSON-dump and CSV ingestion, JSONL export and the demo corpus.
pub mod corpus;
/// Labels-file evaluation: nDCG@10, MAP and R@10 per query and on average.
pub mod evaluate;
/// Aviation synonyms and pseudo-relevance feedback.
pub mod expansion;
/// Event type, injury, make, model and date filters over document metadata.
pub mod filter;
/// Snippets, titles and hit listings.
pub mod render;
/// BM25 and boolean-then-BM25 search over a built index.
pub mod search;
/// The interactive `query>` loop.
pub mod session;

pub use corpus::{Corpus, CorpusError, Record};
pub use expansion::{Expansion, Feedback};
pub use filter::MetaFilter;
pub use search::{Mode, Searcher};
