//! Filter engine: narrows a record collection by facet selectors and a
//! free-text search term.
//!
//! Matching rules:
//! - every non-`all` selector on a dimension the record type declares must
//!   equal the record's field exactly (logical AND across dimensions);
//! - selectors on undeclared dimensions are ignored;
//! - `type` and `hazardType` are accepted as names for `hazard_type`, so the
//!   JSON field name and the dashboard key both select the hazard type;
//! - a declared dimension whose field is absent on the record never matches;
//! - a non-empty search term must appear (case-insensitive substring) in one
//!   of the record's searchable text fields or keywords.
//!
//! Output preserves input order and borrows from the input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::model::{HazardReport, SocialPost};

/// Sentinel value meaning "do not filter on this dimension".
pub const ALL: &str = "all";

/// Query-string key carrying the free-text search term.
pub const SEARCH_KEY: &str = "q";

// =============================================================================
// Record addressing
// =============================================================================

fn canonical(dimension: &str) -> &str {
    match dimension {
        "type" | "hazardType" => "hazard_type",
        other => other,
    }
}

/// A record whose filterable fields can be addressed by dimension name.
pub trait Filterable {
    /// Dimension names this record type understands.
    const DIMENSIONS: &'static [&'static str];

    /// Value of a dimension, or `None` when the field is absent on this record.
    fn dimension(&self, name: &str) -> Option<&str>;

    /// Free-text fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Keywords/tags the search term is matched against.
    fn tags(&self) -> &[String] {
        &[]
    }
}

impl Filterable for HazardReport {
    const DIMENSIONS: &'static [&'static str] = &["hazard_type", "severity", "source", "status", "location"];

    fn dimension(&self, name: &str) -> Option<&str> {
        match name {
            "hazard_type" => Some(self.hazard_type.as_str()),
            "severity" => Some(self.severity.as_str()),
            "source" => Some(self.source.as_str()),
            "status" => Some(self.status.as_str()),
            "location" => Some(self.location.address.as_str()),
            _ => None,
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.description.as_str(),
            self.location.address.as_str(),
            self.reported_by.as_str(),
        ]
    }
}

impl Filterable for SocialPost {
    const DIMENSIONS: &'static [&'static str] = &["platform", "sentiment", "location"];

    fn dimension(&self, name: &str) -> Option<&str> {
        match name {
            "platform" => Some(self.platform.as_str()),
            "sentiment" => Some(self.sentiment.as_str()),
            "location" => self.location.as_ref().map(|l| l.address.as_str()),
            _ => None,
        }
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.content.as_str()]
    }

    fn tags(&self) -> &[String] {
        &self.keywords
    }
}

// =============================================================================
// Filter state
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == ALL {
            Selector::All
        } else {
            Selector::Only(raw.to_string())
        }
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(want) => value == Some(want.as_str()),
        }
    }
}

impl From<String> for Selector {
    fn from(raw: String) -> Self {
        Selector::parse(&raw)
    }
}

impl From<Selector> for String {
    fn from(sel: Selector) -> Self {
        match sel {
            Selector::All => ALL.to_string(),
            Selector::Only(v) => v,
        }
    }
}

/// One selector per dimension. Dimensions never set behave as `all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    selectors: BTreeMap<String, Selector>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FilterState::set`].
    pub fn with(mut self, dimension: &str, value: impl Display) -> Self {
        self.set(dimension, value);
        self
    }

    pub fn set(&mut self, dimension: &str, value: impl Display) {
        self.selectors.insert(canonical(dimension).to_string(), Selector::parse(&value.to_string()));
    }

    pub fn selector(&self, dimension: &str) -> &Selector {
        static ALL_SELECTOR: Selector = Selector::All;
        self.selectors.get(canonical(dimension)).unwrap_or(&ALL_SELECTOR)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.selectors.values().all(|s| *s == Selector::All)
    }

    /// Splits raw key/value pairs (e.g. an HTTP query string) into a filter
    /// state and the search term carried under [`SEARCH_KEY`].
    pub fn from_pairs<'a, I>(pairs: I) -> (Self, String)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut state = Self::new();
        let mut search = String::new();
        for (key, value) in pairs {
            if key == SEARCH_KEY {
                search = value.to_string();
            } else {
                state.set(key, value);
            }
        }
        (state, search)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Returns the records matching every active selector and the search term,
/// in input order.
pub fn filter<'a, R: Filterable>(records: &'a [R], state: &FilterState, search: &str) -> Vec<&'a R> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|record| matches_state(*record, state) && matches_search(*record, &needle))
        .collect()
}

pub fn matches_state<R: Filterable>(record: &R, state: &FilterState) -> bool {
    state.selectors.iter().all(|(dim, sel)| {
        let dim = canonical(dim);
        !R::DIMENSIONS.contains(&dim) || sel.matches(record.dimension(dim))
    })
}

/// `needle` must already be lowercased; an empty needle matches everything.
fn matches_search<R: Filterable>(record: &R, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
        || record.tags().iter().any(|tag| tag.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Engagement, GeoPoint, Platform, Sentiment, Severity};
    use crate::sample;
    use chrono::Utc;

    fn post(id: &str, platform: Platform, location: Option<&str>, keywords: &[&str]) -> SocialPost {
        SocialPost {
            id: id.to_string(),
            platform,
            content: format!("post {}", id),
            author: "@someone".to_string(),
            timestamp: Utc::now(),
            location: location.map(|address| GeoPoint { lat: 0.0, lng: 0.0, address: address.to_string() }),
            sentiment: Sentiment::Neutral,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            engagement: Engagement::default(),
        }
    }

    #[test]
    fn test_all_selectors_is_identity() {
        let reports = sample::hazard_reports();
        let state = FilterState::new()
            .with("hazard_type", ALL)
            .with("severity", ALL)
            .with("source", ALL)
            .with("status", ALL);
        assert!(state.is_unfiltered());
        let out = filter(&reports, &state, "");
        assert_eq!(out.len(), reports.len());
        assert!(out.iter().zip(reports.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn test_single_dimension_exact_match() {
        let reports = sample::hazard_reports();
        let state = FilterState::new().with("severity", Severity::High);
        let out = filter(&reports, &state, "");
        assert!(!out.is_empty());
        assert!(out.iter().all(|r| r.severity == Severity::High));
    }

    #[test]
    fn test_combined_dimensions_intersect() {
        let reports = sample::hazard_reports();
        let by_source = FilterState::new().with("source", "official");
        let by_severity = FilterState::new().with("severity", "critical");
        let both = by_source.clone().with("severity", "critical");

        let a: Vec<&str> = filter(&reports, &by_source, "").iter().map(|r| r.id.as_str()).collect();
        let b: Vec<&str> = filter(&reports, &by_severity, "").iter().map(|r| r.id.as_str()).collect();
        let ab: Vec<&str> = filter(&reports, &both, "").iter().map(|r| r.id.as_str()).collect();

        let expected: Vec<&str> = a.iter().copied().filter(|id| b.contains(id)).collect();
        assert_eq!(ab, expected);
        assert_eq!(ab, vec!["5", "10", "18"]);
    }

    #[test]
    fn test_unknown_dimension_ignored() {
        let reports = sample::hazard_reports();
        let state = FilterState::new().with("platform", "twitter").with("colour", "red");
        assert_eq!(filter(&reports, &state, "").len(), reports.len());
    }

    #[test]
    fn test_missing_optional_field_fails_filter() {
        let posts = vec![
            post("a", Platform::Twitter, Some("Chennai"), &[]),
            post("b", Platform::Twitter, None, &[]),
        ];
        let state = FilterState::new().with("location", "Chennai");
        let out = filter(&posts, &state, "");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_prefix_is_not_a_match() {
        let posts = vec![post("a", Platform::Youtube, Some("Chennai, Tamil Nadu"), &[])];
        let state = FilterState::new().with("location", "Chennai");
        assert!(filter(&posts, &state, "").is_empty());
    }

    #[test]
    fn test_search_matches_keywords_case_insensitive() {
        let posts = vec![
            post("a", Platform::Twitter, None, &["Storm Surge"]),
            post("b", Platform::Twitter, None, &["waves"]),
        ];
        let out = filter(&posts, &FilterState::new(), "SURGE");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn test_search_preserves_order() {
        let reports = sample::hazard_reports();
        let out = filter(&reports, &FilterState::new(), "beach");
        let positions: Vec<usize> = out
            .iter()
            .map(|r| reports.iter().position(|x| x.id == r.id).unwrap())
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_from_pairs_splits_search() {
        let (state, search) = FilterState::from_pairs([("severity", "critical"), ("q", "Tsunami"), ("source", "all")]);
        assert_eq!(search, "Tsunami");
        assert_eq!(state.selector("severity"), &Selector::Only("critical".to_string()));
        assert_eq!(state.selector("source"), &Selector::All);
        assert_eq!(state.selector("status"), &Selector::All);
    }

    #[test]
    fn test_hazard_type_aliases() {
        let reports = sample::hazard_reports();
        let expected = filter(&reports, &FilterState::new().with("hazard_type", "tsunami"), "");
        assert!(!expected.is_empty());
        assert!(expected.len() < reports.len());
        assert!(expected.iter().all(|r| r.hazard_type.as_str() == "tsunami"));

        for key in ["type", "hazardType"] {
            let (state, _) = FilterState::from_pairs([(key, "tsunami")]);
            assert_eq!(state.selector("hazard_type"), &Selector::Only("tsunami".to_string()));
            assert_eq!(filter(&reports, &state, ""), expected);
        }

        let from_json: FilterState = serde_json::from_str(r#"{"hazardType":"tsunami"}"#).unwrap();
        assert_eq!(filter(&reports, &from_json, ""), expected);
    }

    #[test]
    fn test_filter_state_json() {
        let state: FilterState = serde_json::from_str(r#"{"platform":"all","sentiment":"negative"}"#).unwrap();
        assert_eq!(state.selector("platform"), &Selector::All);
        assert_eq!(state.selector("sentiment"), &Selector::Only("negative".to_string()));
        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["platform"], "all");
    }
}
