//! The canonical five-document demo corpus of aviation incident narratives.

use crate::document::{DocId, Document};

/// `(id, narrative)` pairs.
pub const DOCUMENTS: [(DocId, &str); 5] = [
    (
        1,
        "Night visual approach with unexpected tailwind led to long landing and runway excursion.",
    ),
    (
        2,
        "Climb-out icing after takeoff; pitot heat oversight led to airspeed discrepancies; returned to land.",
    ),
    (
        3,
        "Taxiway incursion due to similar call signs; readback-hearback breakdown with ATC.",
    ),
    (
        4,
        "RNAV GPS approach in mountainous terrain; false glidepath capture; CFIT risk mitigated by go-around.",
    ),
    (
        5,
        "Landing with crosswind gusts; unstable short final; veer-off avoided by go-around.",
    ),
];

/// Example boolean queries with the single document each one should return.
pub const BOOLEAN_QUERIES: [(&str, DocId); 4] = [
    (r#"("runway excursion" OR overrun) AND landing"#, 1),
    ("(icing /5 pitot) AND (airspeed OR indications)", 2),
    (r#"(incursion AND taxiway) AND (atc OR "readback hearback")"#, 3),
    ("(approach AND mountainous) /s (cfit OR terrain)", 4),
];

/// Free-text query whose best BM25 match is document 1.
pub const RANKED_QUERY: &str = "unstable approach with tailwind, long landing and excursion off runway";

/// The demo corpus as owned documents.
pub fn documents() -> Vec<Document> {
    DOCUMENTS
        .iter()
        .map(|&(id, text)| Document::new(id, text))
        .collect()
}
