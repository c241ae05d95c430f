//! Query service: resolves multi-term queries, applies label/tag filters,
//! scores, ranks, and truncates.

pub mod scoring;

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use rusqlite::Connection;

use crate::analysis::Analyzer;
use crate::error::{Error, Result};
use crate::repository::{document_terms, documents, labels, tags, terms};

pub use scoring::{Bm25Scorer, Scorer, ScoringContext};

const DEFAULT_MAX_RESULTS: usize = 100;
const MAX_ALLOWED_RESULTS: usize = 10_000;

/// A search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query_text: String,
    pub max_results: usize,
    pub use_and_logic: bool,
    pub labels: Vec<String>,
    pub tags: HashMap<String, String>,
}

impl SearchRequest {
    /// A plain OR query over `query_text` with every other field defaulted.
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            max_results: DEFAULT_MAX_RESULTS,
            use_and_logic: false,
            labels: Vec::new(),
            tags: HashMap::new(),
        }
    }
}

/// One ranked match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub document_id: String,
    pub score: f64,
    pub matched_term_count: usize,
    pub term_frequencies: HashMap<String, i64>,
}

/// The full response to a [`SearchRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub total_count: usize,
    pub max_results: usize,
    pub search_time_ms: f64,
}

struct DocumentAggregate {
    matched_terms: HashSet<String>,
    term_frequencies: HashMap<String, i64>,
}

/// Run `request` against the index under a read connection.
pub fn search(conn: &Connection, analyzer: &Analyzer, scorer: &dyn Scorer, request: &SearchRequest) -> Result<SearchResponse> {
    let started = Instant::now();

    if request.max_results == 0 {
        return Err(Error::invalid_argument("max_results", "must be at least 1"));
    }
    let max_results = request.max_results.min(MAX_ALLOWED_RESULTS);

    let query_terms = analyzer.analyze_query(&request.query_text);
    if query_terms.is_empty() {
        return Ok(SearchResponse {
            query: request.query_text.clone(),
            results: Vec::new(),
            total_count: 0,
            max_results,
            search_time_ms: elapsed_ms(started),
        });
    }

    let mut document_frequency_by_term: HashMap<String, i64> = HashMap::new();
    let mut resolved_term_ids: Vec<(String, String)> = Vec::new();
    for term in &query_terms {
        if let Some(row) = terms::get_by_text(conn, term)? {
            document_frequency_by_term.insert(term.clone(), row.document_frequency);
            resolved_term_ids.push((row.id, term.clone()));
        }
    }

    let matches = document_terms::matches_for_terms(conn, &resolved_term_ids)?;

    let mut aggregates: HashMap<String, DocumentAggregate> = HashMap::new();
    for term_match in matches {
        let entry = aggregates.entry(term_match.document_id.clone()).or_insert_with(|| DocumentAggregate {
            matched_terms: HashSet::new(),
            term_frequencies: HashMap::new(),
        });
        entry.matched_terms.insert(term_match.term.clone());
        *entry.term_frequencies.entry(term_match.term).or_insert(0) += term_match.term_frequency;
    }

    let required_term_count = query_terms.len();
    let total_documents = documents::count(conn)?;
    let (avg_document_length, _min_len, _max_len) = documents::length_stats(conn)?;
    let context = ScoringContext {
        total_documents,
        avg_document_length,
    };

    let mut candidates: Vec<(String, DocumentAggregate)> = aggregates.into_iter().collect();

    if request.use_and_logic {
        candidates.retain(|(_, aggregate)| aggregate.matched_terms.len() == required_term_count);
    }

    if !request.labels.is_empty() {
        let mut filtered = Vec::with_capacity(candidates.len());
        for (document_id, aggregate) in candidates {
            if labels::document_has_all_labels(conn, &document_id, &request.labels)? {
                filtered.push((document_id, aggregate));
            }
        }
        candidates = filtered;
    }

    if !request.tags.is_empty() {
        let mut filtered = Vec::with_capacity(candidates.len());
        for (document_id, aggregate) in candidates {
            if tags::document_has_all_tags(conn, &document_id, &request.tags)? {
                filtered.push((document_id, aggregate));
            }
        }
        candidates = filtered;
    }

    let mut scored: Vec<SearchResult> = Vec::with_capacity(candidates.len());
    for (document_id, aggregate) in candidates {
        let document = documents::require_by_id(conn, &document_id)?;
        let mut raw_score = 0.0;
        for term in &aggregate.matched_terms {
            let term_frequency = *aggregate.term_frequencies.get(term).unwrap_or(&0);
            let document_frequency = *document_frequency_by_term.get(term).unwrap_or(&0);
            raw_score += scorer.term_weight(term_frequency, document_frequency, document.document_length, &context);
        }
        scored.push(SearchResult {
            document_id,
            score: raw_score,
            matched_term_count: aggregate.matched_terms.len(),
            term_frequencies: aggregate.term_frequencies,
        });
    }

    let max_raw_score = scored.iter().map(|r| r.score).fold(0.0_f64, f64::max);
    if max_raw_score > 0.0 {
        for result in &mut scored {
            result.score /= max_raw_score;
        }
    } else {
        for result in &mut scored {
            result.score = 0.0;
        }
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.document_id.cmp(&b.document_id))
    });

    let total_count = scored.len();
    scored.truncate(max_results);

    Ok(SearchResponse {
        query: request.query_text.clone(),
        results: scored,
        total_count,
        max_results,
        search_time_ms: elapsed_ms(started),
    })
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
