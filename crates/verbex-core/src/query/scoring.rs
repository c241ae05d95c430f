//! BM25-style scoring.
//!
//! Exposed through a trait so the default can be swapped in tests without
//! touching the query service. The default weights are fixed for test
//! determinism.

/// Corpus-wide statistics needed to weight a single term match.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext {
    /// Total documents currently in the index (`N`).
    pub total_documents: i64,
    /// Mean document length (code points) across the index (`avgdl`).
    pub avg_document_length: f64,
}

/// Computes the weight of one `(term, document)` match.
pub trait Scorer: Send + Sync {
    /// `(tf, df, dl, context) -> weight`.
    fn term_weight(&self, term_frequency: i64, document_frequency: i64, document_length: i64, context: &ScoringContext) -> f64;
}

/// The required default: BM25 with `k_1 = 1.2`, `b = 0.75`, smoothed IDF.
pub struct Bm25Scorer {
    k1: f64,
    b: f64,
}

impl Bm25Scorer {
    pub const K1: f64 = 1.2;
    pub const B: f64 = 0.75;
}

impl Default for Bm25Scorer {
    fn default() -> Self {
        Self { k1: Self::K1, b: Self::B }
    }
}

impl Scorer for Bm25Scorer {
    fn term_weight(&self, term_frequency: i64, document_frequency: i64, document_length: i64, context: &ScoringContext) -> f64 {
        let idf = ((context.total_documents as f64 + 1.0) / (document_frequency as f64 + 1.0)).ln() + 1.0;
        let avgdl = context.avg_document_length.max(1.0);
        let tf = term_frequency as f64;
        let numerator = tf * (self.k1 + 1.0);
        let denominator = tf + self.k1 * (1.0 - self.b + self.b * document_length as f64 / avgdl);
        idf * (numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_is_always_positive() {
        let scorer = Bm25Scorer::default();
        let context = ScoringContext {
            total_documents: 1000,
            avg_document_length: 50.0,
        };
        let weight = scorer.term_weight(1, 999, 50, &context);
        assert!(weight > 0.0);
    }

    #[test]
    fn higher_term_frequency_scores_higher() {
        let scorer = Bm25Scorer::default();
        let context = ScoringContext {
            total_documents: 100,
            avg_document_length: 50.0,
        };
        let low = scorer.term_weight(1, 10, 50, &context);
        let high = scorer.term_weight(5, 10, 50, &context);
        assert!(high > low);
    }

    #[test]
    fn rarer_terms_score_higher_than_common_ones() {
        let scorer = Bm25Scorer::default();
        let context = ScoringContext {
            total_documents: 100,
            avg_document_length: 50.0,
        };
        let common = scorer.term_weight(1, 90, 50, &context);
        let rare = scorer.term_weight(1, 2, 50, &context);
        assert!(rare > common);
    }

    #[test]
    fn longer_than_average_documents_are_penalized() {
        let scorer = Bm25Scorer::default();
        let context = ScoringContext {
            total_documents: 100,
            avg_document_length: 50.0,
        };
        let short_doc = scorer.term_weight(2, 10, 25, &context);
        let long_doc = scorer.term_weight(2, 10, 200, &context);
        assert!(short_doc > long_doc);
    }
}
