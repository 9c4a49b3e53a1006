//! Core document types for aerosearch.
//!
//! Documents are identified by caller-assigned integer ids. The index keeps
//! only derived data (postings, lengths, sentence spans), never the text.

use serde::{Deserialize, Serialize};

/// Caller-assigned document identifier. Must be unique within one build.
pub type DocId = u32;

/// A document to be indexed: an id and its raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within the collection.
    pub id: DocId,
    /// Raw narrative text.
    pub text: String,
}

impl Document {
    /// Creates a document with the given id.
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}
