//! # Classification Engine
//! Pure, testable pipeline that maps an answer sequence → `ClassificationResult`.
//! No I/O, suitable for unit tests and offline evaluation.
//!
//! Order: accumulate raw totals → (normalize, classify confidence) → resolve
//! trio on raw + normalized → stamp the time. The timestamp is the only
//! field that is not a pure function of the input.

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ScoringError;
use crate::questions::{QuestionBank, Selection};
use crate::realm::{Realm, RealmScores};
use crate::scoring::{accumulate, classify_confidence, normalize, Confidence};
use crate::trio::{resolve_trio, InsightLookup, InsightTable, TrioInfo};
use crate::weights::{Answer, WeightMap};

/// Final classification for one completed answer sequence. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub primary_realm: Realm,
    pub primary_score: u32,
    pub secondary_realm: Realm,
    pub secondary_score: u32,
    pub tertiary_realm: Realm,
    pub tertiary_score: u32,
    /// Normalized percentages for every realm.
    pub full_scores: RealmScores,
    pub confidence: Confidence,
    pub trio: TrioInfo,
    pub timestamp: DateTime<Utc>,
}

impl ClassificationResult {
    /// Same result apart from the timestamp.
    pub fn same_outcome(&self, other: &Self) -> bool {
        Self {
            timestamp: other.timestamp,
            ..self.clone()
        } == *other
    }
}

/// Classify a sequence of weight maps, stamped with the current time.
pub fn assemble(
    weights: &[WeightMap],
    lookup: &(impl InsightLookup + ?Sized),
) -> Result<ClassificationResult, ScoringError> {
    assemble_at(weights, lookup, Utc::now())
}

/// Like `assemble`, with an explicit timestamp.
pub fn assemble_at(
    weights: &[WeightMap],
    lookup: &(impl InsightLookup + ?Sized),
    now: DateTime<Utc>,
) -> Result<ClassificationResult, ScoringError> {
    let raw = accumulate(weights)?;
    let full_scores = normalize(&raw);
    let confidence = classify_confidence(&raw);
    let resolved = resolve_trio(&raw, &full_scores, lookup);

    counter!(
        "realm_results_total",
        "primary" => resolved.primary.realm.as_str(),
        "confidence" => confidence.as_str()
    )
    .increment(1);

    Ok(ClassificationResult {
        primary_realm: resolved.primary.realm,
        primary_score: resolved.primary.score,
        secondary_realm: resolved.secondary.realm,
        secondary_score: resolved.secondary.score,
        tertiary_realm: resolved.tertiary.realm,
        tertiary_score: resolved.tertiary.score,
        full_scores,
        confidence,
        trio: resolved.trio,
        timestamp: now,
    })
}

/// Classify answer triples (only their weight maps are used).
pub fn assemble_answers(
    answers: &[Answer],
    lookup: &(impl InsightLookup + ?Sized),
) -> Result<ClassificationResult, ScoringError> {
    let weights: Vec<WeightMap> = answers.iter().map(|a| a.weights).collect();
    assemble(&weights, lookup)
}

/// Short, non-reversible fingerprint of an answer sequence for logs.
/// Never log raw answers; only this id.
pub fn fingerprint(answers: &[Answer]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    for a in answers {
        hasher.update(a.question_id.as_bytes());
        hasher.update([0u8]);
        for (realm, w) in a.weights.entries() {
            hasher.update(realm.as_str().as_bytes());
            hasher.update(w.to_le_bytes());
        }
        hasher.update([0xffu8]);
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Engine bundling the read-only collaborators.
#[derive(Debug, Clone)]
pub struct RealmEngine {
    insights: Arc<InsightTable>,
    questions: Arc<QuestionBank>,
}

impl Default for RealmEngine {
    fn default() -> Self {
        Self::new(InsightTable::embedded(), QuestionBank::embedded())
    }
}

impl RealmEngine {
    pub fn new(insights: Arc<InsightTable>, questions: Arc<QuestionBank>) -> Self {
        Self {
            insights,
            questions,
        }
    }

    pub fn insights(&self) -> &InsightTable {
        &self.insights
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }

    /// Classify answers whose weight maps are already resolved.
    pub fn classify(&self, answers: &[Answer]) -> Result<ClassificationResult, ScoringError> {
        assemble_answers(answers, self.insights.as_ref())
    }

    /// Resolve selections through the question bank, then classify.
    pub fn submit(&self, selections: &[Selection]) -> Result<ClassificationResult, ScoringError> {
        let answers = self.questions.resolve_all(selections)?;
        self.classify(&answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trio::{InsightRecord, TrioKey, FALLBACK_TITLE};
    use crate::weights::AnswerValue;
    use std::collections::HashMap;

    fn end_to_end_weights() -> Vec<WeightMap> {
        vec![
            WeightMap::new()
                .with(Realm::Trace, 10)
                .with(Realm::Oasis, 5)
                .with(Realm::Mist, 3),
            WeightMap::new().with(Realm::Trace, 8).with(Realm::Oasis, 4),
        ]
    }

    #[test]
    fn end_to_end_two_answers() {
        let r = assemble(&end_to_end_weights(), InsightTable::embedded().as_ref()).unwrap();
        assert_eq!(r.primary_realm, Realm::Trace);
        assert_eq!(r.secondary_realm, Realm::Oasis);
        assert_eq!(r.tertiary_realm, Realm::Mist);
        assert_eq!((r.primary_score, r.secondary_score, r.tertiary_score), (60, 30, 10));
        // raw gap 18 - 9 = 9 → moderate (normalized gap would say strong)
        assert_eq!(r.confidence, Confidence::Moderate);
        assert_eq!(r.trio.key.to_string(), "mist-oasis-trace");
        assert_eq!(r.full_scores[Realm::Zenith], 0);
    }

    #[test]
    fn deterministic_apart_from_timestamp() {
        let table = InsightTable::embedded();
        let a = assemble(&end_to_end_weights(), table.as_ref()).unwrap();
        let b = assemble(&end_to_end_weights(), table.as_ref()).unwrap();
        assert!(a.same_outcome(&b));
    }

    #[test]
    fn zero_answers_is_well_formed() {
        let now = Utc::now();
        let r = assemble_at(&[], InsightTable::embedded().as_ref(), now).unwrap();
        assert_eq!(r.full_scores, RealmScores::zeroed());
        assert_eq!(r.primary_realm, Realm::Abyss);
        assert_eq!(r.secondary_realm, Realm::Cavern);
        assert_eq!(r.tertiary_realm, Realm::Dross);
        assert_eq!(r.confidence, Confidence::Mixed);
        assert_eq!(r.trio.key.to_string(), "abyss-cavern-dross");
        assert_eq!(r.timestamp, now);
    }

    #[test]
    fn missing_insight_uses_fallback() {
        let partial: HashMap<TrioKey, InsightRecord> = HashMap::new();
        let r = assemble(&end_to_end_weights(), &partial).unwrap();
        assert_eq!(r.trio.title, FALLBACK_TITLE);
        assert!(r.trio.fallback);
        assert_eq!(r.trio.key.to_string(), "mist-oasis-trace");
    }

    #[test]
    fn engine_submit_resolves_through_bank() {
        let engine = RealmEngine::default();
        let sel = vec![
            Selection {
                question_id: "q1".into(),
                value: AnswerValue::Option("q1d".into()),
            },
            Selection {
                question_id: "q15".into(),
                value: AnswerValue::Scale(10),
            },
        ];
        let r = engine.submit(&sel).unwrap();
        // q1d: oasis 3; q15 0-25: oasis 2, zenith 1
        assert_eq!(r.primary_realm, Realm::Oasis);
        assert_eq!(r.secondary_realm, Realm::Zenith);
        assert_eq!(r.primary_score, 83);
    }

    #[test]
    fn engine_classify_rejects_overflowing_totals() {
        let engine = RealmEngine::default();
        let huge = Answer::new(
            "q1",
            AnswerValue::Option("q1a".into()),
            WeightMap::new().with(Realm::Trace, u32::MAX),
        );
        assert_eq!(
            engine.classify(&[huge.clone(), huge]),
            Err(ScoringError::ScoreOverflow { realm: Realm::Trace })
        );
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = vec![Answer::new(
            "q1",
            AnswerValue::Option("q1a".into()),
            WeightMap::new().with(Realm::Trace, 3),
        )];
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_eq!(fingerprint(&a).len(), 12);
        assert_ne!(fingerprint(&a), fingerprint(&[]));
    }
}
