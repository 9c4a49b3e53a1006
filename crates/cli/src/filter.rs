//! Metadata filters restricting which documents a search may return.

use crate::corpus::{Corpus, Record};
use aerosearch_core::DocId;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Accepted metadata values. Empty lists and unset bounds accept everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaFilter {
    pub event_types: Vec<String>,
    pub injuries: Vec<String>,
    pub makes: Vec<String>,
    pub models: Vec<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl MetaFilter {
    pub fn is_empty(&self) -> bool {
        self.event_types.is_empty()
            && self.injuries.is_empty()
            && self.makes.is_empty()
            && self.models.is_empty()
            && self.from.is_none()
            && self.to.is_none()
    }

    /// Whether `record` passes every criterion.
    ///
    /// Values compare case-insensitively. A record without a readable
    /// `EventDate` passes the date range.
    pub fn matches(&self, record: &Record) -> bool {
        let injury = record
            .meta_str("HighestInjury")
            .or_else(|| record.meta_str("HighestInjuryLevel"));
        one_of(&self.event_types, record.meta_str("EventType"))
            && one_of(&self.injuries, injury)
            && one_of(&self.makes, record.meta_str("Make"))
            && one_of(&self.models, record.meta_str("Model"))
            && self.in_range(record)
    }

    /// Ids of the documents of `corpus` that pass, or `None` when nothing is
    /// filtered.
    pub fn allowed(&self, corpus: &Corpus) -> Option<HashSet<DocId>> {
        if self.is_empty() {
            return None;
        }
        let allowed: HashSet<DocId> = corpus
            .iter()
            .filter(|(_, record)| self.matches(record))
            .map(|(id, _)| id)
            .collect();
        tracing::info!(
            documents = allowed.len(),
            total = corpus.len(),
            "metadata filter applied"
        );
        Some(allowed)
    }

    fn in_range(&self, record: &Record) -> bool {
        let Some(day) = record.meta_str("EventDate").as_deref().and_then(event_day) else {
            return true;
        };
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

fn one_of(accepted: &[String], value: Option<String>) -> bool {
    accepted.is_empty()
        || value.is_some_and(|v| accepted.iter().any(|a| a.trim().eq_ignore_ascii_case(v.trim())))
}

/// Calendar day of an event date such as `2023-01-14` or `2023-01-14T10:05:00Z`.
pub fn event_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().split('T').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn record(meta: Value) -> Record {
        let Value::Object(meta) = meta else {
            unreachable!()
        };
        Record {
            text: "text".to_string(),
            meta,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_event_day() {
        assert_eq!(event_day("2023-01-14T10:05:00Z"), Some(date("2023-01-14")));
        assert_eq!(event_day(" 2023-01-14 "), Some(date("2023-01-14")));
        assert_eq!(event_day("January 2023"), None);
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = MetaFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&record(json!({}))));
        assert!(filter.allowed(&Corpus::demo()).is_none());
    }

    #[test]
    fn test_value_lists() {
        let filter = MetaFilter {
            event_types: vec!["ACC".to_string()],
            makes: vec!["cessna".to_string(), "piper".to_string()],
            ..MetaFilter::default()
        };
        assert!(filter.matches(&record(json!({"EventType": "ACC", "Make": "CESSNA"}))));
        assert!(!filter.matches(&record(json!({"EventType": "INC", "Make": "CESSNA"}))));
        assert!(!filter.matches(&record(json!({"EventType": "ACC"}))));
    }

    #[test]
    fn test_injury_from_either_field() {
        let filter = MetaFilter {
            injuries: vec!["Fatal".to_string()],
            ..MetaFilter::default()
        };
        assert!(filter.matches(&record(json!({"HighestInjury": "Fatal"}))));
        assert!(filter.matches(&record(json!({"HighestInjuryLevel": "FATAL"}))));
        assert!(!filter.matches(&record(json!({"HighestInjuryLevel": "Minor"}))));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = MetaFilter {
            from: Some(date("2022-01-01")),
            to: Some(date("2022-12-31")),
            ..MetaFilter::default()
        };
        assert!(filter.matches(&record(json!({"EventDate": "2022-01-01"}))));
        assert!(filter.matches(&record(json!({"EventDate": "2022-12-31T23:59:00Z"}))));
        assert!(!filter.matches(&record(json!({"EventDate": "2023-01-01"}))));
        // undated records are kept
        assert!(filter.matches(&record(json!({"EventDate": null}))));
        assert!(filter.matches(&Record {
            text: "text".to_string(),
            meta: Map::new(),
        }));
    }
}
