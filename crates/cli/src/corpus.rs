//! Corpus ingestion: JSONL rows, JSON record dumps, CSV exports and the
//! built-in demo set.

use aerosearch_core::{demo, DocId, InvertedIndex, StopWords, Tokenizer};
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Narrative fields concatenated into the document text of a JSON dump record.
pub const TEXT_FIELDS: [&str; 4] = [
    "ProbableCause",
    "AnalysisNarrative",
    "FactualNarrative",
    "PrelimNarrative",
];

/// Record fields copied into document metadata.
pub const META_FIELDS: [&str; 11] = [
    "NtsbNumber",
    "ReportNo",
    "EventDate",
    "City",
    "State",
    "Country",
    "AirportId",
    "AirportName",
    "EventType",
    "HighestInjury",
    "AccidentSiteCondition",
];

/// Candidate source identifiers, first present wins.
const STABLE_ID_FIELDS: [&str; 5] = ["NtsbNumber", "ReportNo", "EventID", "MKey", "Oid"];

/// Fields lifted from the first entry of a record's vehicle list.
const VEHICLE_FIELDS: [&str; 5] = [
    "Make",
    "Model",
    "AircraftCategory",
    "DamageLevel",
    "RegulationFlightConductedUnder",
];

/// Column holding the document text of a CSV export unless told otherwise.
pub const DEFAULT_CSV_TEXT_COLUMN: &str = "ProbableCause";

/// CSV columns copied into document metadata.
pub const CSV_META_COLUMNS: [&str; 15] = [
    "ReportNo",
    "EventDate",
    "City",
    "State",
    "Country",
    "Make",
    "Model",
    "AirCraftCategory",
    "EventType",
    "AirportID",
    "AirportName",
    "WeatherCondition",
    "HighestInjuryLevel",
    "AirCraftDamage",
    "DocketUrl",
];

/// CSV columns that may carry the source identifier, first non-empty wins.
const CSV_ID_COLUMNS: [&str; 3] = ["ReportNo", "EventID", "NtsbNo"];

/// Keys under which a top-level object may hold its record array.
const RECORD_KEYS: [&str; 4] = ["items", "data", "results", "Records"];

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Errors raised while reading corpus, label or stopword files.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: invalid JSON: {source}")]
    JsonLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: invalid CSV: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: no column named {column:?}")]
    MissingColumn { path: PathBuf, column: String },
    #[error("{path}: unsupported corpus format, expected .jsonl, .json or .csv")]
    UnsupportedFormat { path: PathBuf },
    #[error("{path}: no record has any text")]
    NoText { path: PathBuf },
}

impl CorpusError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CorpusError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One document with its display metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub text: String,
    pub meta: Map<String, Value>,
}

impl Record {
    /// Metadata value rendered as plain text; empty strings and nulls are absent.
    pub fn meta_str(&self, key: &str) -> Option<String> {
        match self.meta.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Documents keyed by id, iterated in ascending id order.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: BTreeMap<DocId, Record>,
}

#[derive(Deserialize)]
struct JsonlRow {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
}

#[derive(Serialize)]
struct JsonlOut<'a> {
    id: DocId,
    text: &'a str,
    meta: &'a Map<String, Value>,
}

impl Corpus {
    /// The five-document demo corpus, without metadata.
    pub fn demo() -> Self {
        let records = demo::DOCUMENTS
            .iter()
            .map(|&(id, text)| {
                let record = Record {
                    text: text.to_string(),
                    meta: Map::new(),
                };
                (id, record)
            })
            .collect();
        Self { records }
    }

    /// Load a corpus file, choosing the format by extension.
    pub fn load(path: &Path, limit: Option<usize>) -> Result<Self, CorpusError> {
        Self::load_with(path, DEFAULT_CSV_TEXT_COLUMN, limit)
    }

    /// Like [`Corpus::load`], taking CSV document text from `text_column`.
    pub fn load_with(
        path: &Path,
        text_column: &str,
        limit: Option<usize>,
    ) -> Result<Self, CorpusError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let corpus = match extension.as_deref() {
            Some("jsonl") => Self::load_jsonl(path, limit)?,
            Some("json") => Self::load_json_dump(path, limit)?,
            Some("csv") => Self::load_csv(path, text_column, limit)?,
            _ => {
                return Err(CorpusError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };
        if corpus.is_empty() {
            return Err(CorpusError::NoText {
                path: path.to_path_buf(),
            });
        }
        tracing::info!(path = %path.display(), documents = corpus.len(), "corpus loaded");
        Ok(corpus)
    }

    /// Read `{"id", "text", "meta"}` rows, one per line.
    ///
    /// Integer ids are kept. Other ids (strings, missing) get sequential ids
    /// after the largest integer id, and a non-null original id is preserved
    /// as `meta.orig_id`. Rows with blank text are skipped.
    pub fn load_jsonl(path: &Path, limit: Option<usize>) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
        let mut pending: Vec<(Option<DocId>, Record)> = Vec::new();
        for (i, line) in BufReader::new(file).lines().enumerate() {
            if limit.is_some_and(|n| pending.len() >= n) {
                break;
            }
            let line = line.map_err(|e| CorpusError::io(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let row: JsonlRow =
                serde_json::from_str(&line).map_err(|source| CorpusError::JsonLine {
                    path: path.to_path_buf(),
                    line: i + 1,
                    source,
                })?;
            let text = row.text.as_deref().unwrap_or("").trim();
            if text.is_empty() {
                continue;
            }
            let mut meta = row.meta.unwrap_or_default();
            let explicit = match row.id {
                Some(Value::Number(n)) if n.as_u64().is_some_and(|v| v <= DocId::MAX as u64) => {
                    n.as_u64().map(|v| v as DocId)
                }
                Some(Value::Null) | None => None,
                Some(other) => {
                    meta.insert("orig_id".to_string(), other);
                    None
                }
            };
            pending.push((
                explicit,
                Record {
                    text: text.to_string(),
                    meta,
                },
            ));
        }

        let mut next_id = pending
            .iter()
            .filter_map(|(id, _)| *id)
            .max()
            .map_or(1, |max| max.saturating_add(1));
        let mut corpus = Self::default();
        for (id, record) in pending {
            let id = id.unwrap_or_else(|| {
                let id = next_id;
                next_id = next_id.saturating_add(1);
                id
            });
            corpus.insert(id, record);
        }
        Ok(corpus)
    }

    /// Read a JSON dump of incident records.
    ///
    /// Accepts a top-level array, or an object holding the array under one of
    /// `items`, `data`, `results` or `Records` (otherwise the object's values
    /// are the records). Narrative fields are cleaned and concatenated; records
    /// without narrative are skipped. Ids are assigned sequentially from 1.
    pub fn load_json_dump(path: &Path, limit: Option<usize>) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
        let raw: Value = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            CorpusError::Json {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let mut corpus = Self::default();
        let mut next_id: DocId = 1;
        for record in records_of(raw) {
            if limit.is_some_and(|n| corpus.len() >= n) {
                break;
            }
            let Value::Object(fields) = record else {
                continue;
            };
            let Some(record) = dump_record(&fields) else {
                continue;
            };
            corpus.insert(next_id, record);
            next_id += 1;
        }
        Ok(corpus)
    }

    /// Read a CSV export with a header row.
    ///
    /// Document text comes from `text_column`; rows where it is blank are
    /// skipped. Ids are assigned sequentially from 1. [`CSV_META_COLUMNS`]
    /// present in the header are kept as metadata, and the first non-empty
    /// of `ReportNo`, `EventID` or `NtsbNo` becomes `meta.orig_id`.
    pub fn load_csv(
        path: &Path,
        text_column: &str,
        limit: Option<usize>,
    ) -> Result<Self, CorpusError> {
        let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
        let csv_error = |source: csv::Error| CorpusError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));
        let headers = reader.headers().map_err(csv_error)?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);
        let text_at = column(text_column).ok_or_else(|| CorpusError::MissingColumn {
            path: path.to_path_buf(),
            column: text_column.to_string(),
        })?;
        let meta_at: Vec<(&str, usize)> = CSV_META_COLUMNS
            .iter()
            .filter_map(|&name| Some((name, column(name)?)))
            .collect();
        let id_at: Vec<usize> = CSV_ID_COLUMNS.iter().filter_map(|&name| column(name)).collect();

        let mut corpus = Self::default();
        let mut next_id: DocId = 1;
        let mut row = StringRecord::new();
        while reader.read_record(&mut row).map_err(csv_error)? {
            if limit.is_some_and(|n| corpus.len() >= n) {
                break;
            }
            let text = normalize_text(row.get(text_at).unwrap_or(""));
            if text.is_empty() {
                continue;
            }
            let cell = |at: usize| row.get(at).map(str::trim).filter(|v| !v.is_empty());
            let mut meta = Map::new();
            for &(name, at) in &meta_at {
                if let Some(value) = cell(at) {
                    meta.insert(name.to_string(), Value::String(value.to_string()));
                }
            }
            if let Some(orig) = id_at.iter().find_map(|&at| cell(at)) {
                meta.insert("orig_id".to_string(), Value::String(orig.to_string()));
            }
            corpus.insert(next_id, Record { text, meta });
            next_id += 1;
        }
        Ok(corpus)
    }

    /// Insert a document; an existing document with the same id is replaced.
    pub fn insert(&mut self, id: DocId, record: Record) {
        if self.records.insert(id, record).is_some() {
            tracing::warn!(doc_id = id, "duplicate document id in corpus, keeping the later one");
        }
    }

    /// Write the corpus as JSONL rows with integer ids.
    pub fn write_jsonl(&self, path: &Path) -> Result<(), CorpusError> {
        let file = File::create(path).map_err(|e| CorpusError::io(path, e))?;
        let mut out = BufWriter::new(file);
        for (&id, record) in &self.records {
            let row = JsonlOut {
                id,
                text: &record.text,
                meta: &record.meta,
            };
            serde_json::to_writer(&mut out, &row).map_err(|source| CorpusError::Json {
                path: path.to_path_buf(),
                source,
            })?;
            out.write_all(b"\n").map_err(|e| CorpusError::io(path, e))?;
        }
        out.flush().map_err(|e| CorpusError::io(path, e))?;
        tracing::info!(path = %path.display(), rows = self.len(), "jsonl written");
        Ok(())
    }

    /// Index every document with `tokenizer`.
    pub fn build_index(&self, tokenizer: Tokenizer) -> InvertedIndex {
        InvertedIndex::build_with(
            tokenizer,
            self.records.iter().map(|(&id, r)| (id, r.text.as_str())),
        )
    }

    pub fn get(&self, id: DocId) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Record)> + '_ {
        self.records.iter().map(|(&id, r)| (id, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read a stop word list: whitespace-separated words, `#` starts a comment.
pub fn load_stop_words(path: &Path) -> Result<StopWords, CorpusError> {
    let content = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
    let words = content
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .flat_map(str::split_whitespace);
    Ok(StopWords::from_words(words))
}

fn records_of(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(records) => records,
        Value::Object(mut object) => {
            let key = RECORD_KEYS
                .iter()
                .find(|k| matches!(object.get(**k), Some(Value::Array(_))));
            match key.and_then(|k| object.remove(*k)) {
                Some(Value::Array(records)) => records,
                _ => object.into_iter().map(|(_, v)| v).collect(),
            }
        }
        _ => Vec::new(),
    }
}

fn dump_record(fields: &Map<String, Value>) -> Option<Record> {
    let chunks: Vec<String> = TEXT_FIELDS
        .iter()
        .filter_map(|f| fields.get(*f)?.as_str())
        .map(normalize_text)
        .filter(|s| !s.is_empty())
        .collect();
    if chunks.is_empty() {
        return None;
    }

    let mut meta = Map::new();
    for key in META_FIELDS {
        if let Some(value) = fields.get(key).filter(|v| !v.is_null()) {
            meta.insert(key.to_string(), value.clone());
        }
    }
    if let Some(orig) = STABLE_ID_FIELDS
        .iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| is_present(v))
    {
        meta.insert("orig_id".to_string(), orig.clone());
    }
    let vehicles = fields.get("Vehicles").or_else(|| fields.get("vehicles"));
    if let Some(Value::Object(first)) = vehicles.and_then(|v| v.as_array()?.first()) {
        for key in VEHICLE_FIELDS {
            if let Some(value) = first.get(key).filter(|v| is_present(v)) {
                meta.insert(key.to_string(), value.clone());
            }
        }
    }

    Some(Record {
        text: chunks.join(" "),
        meta,
    })
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Decode HTML entities and collapse whitespace runs (line breaks included)
/// to single spaces. Unknown entities are left as written.
pub fn normalize_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}
