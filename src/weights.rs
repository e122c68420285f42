//! Per-answer weight maps and the answer triple handed to the scoring core.
//!
//! A `WeightMap` is a fixed array over the closed realm set; omitted realms
//! weigh 0. Untyped input (JSON objects, `(name, i64)` pairs) is validated
//! here, at the boundary: unknown realm names and negative weights are
//! rejected so the accumulator only ever sees well-formed data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ScoringError;
use crate::realm::{Realm, REALM_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, i64>",
    into = "BTreeMap<String, u32>"
)]
pub struct WeightMap([u32; REALM_COUNT]);

impl WeightMap {
    /// No weight for any realm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set `realm` to `weight`.
    pub fn with(mut self, realm: Realm, weight: u32) -> Self {
        self.0[realm.index()] = weight;
        self
    }

    /// Validate untyped pairs. Repeated realms are summed.
    pub fn try_from_pairs<I, S>(pairs: I) -> Result<Self, ScoringError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut out = Self::new();
        for (name, weight) in pairs {
            let realm: Realm = name.as_ref().parse()?;
            if weight < 0 {
                return Err(ScoringError::NegativeWeight { realm, weight });
            }
            let w = u32::try_from(weight)
                .map_err(|_| ScoringError::WeightTooLarge { realm, weight })?;
            let slot = &mut out.0[realm.index()];
            *slot = slot
                .checked_add(w)
                .ok_or(ScoringError::WeightTooLarge { realm, weight })?;
        }
        Ok(out)
    }

    pub fn get(&self, realm: Realm) -> u32 {
        self.0[realm.index()]
    }

    /// Non-zero entries in registry order.
    pub fn entries(&self) -> impl Iterator<Item = (Realm, u32)> + '_ {
        Realm::ALL
            .iter()
            .map(move |&r| (r, self.0[r.index()]))
            .filter(|&(_, w)| w > 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Largest single weight in the map (0 when empty).
    pub fn max_weight(&self) -> u32 {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

impl TryFrom<BTreeMap<String, i64>> for WeightMap {
    type Error = ScoringError;

    fn try_from(raw: BTreeMap<String, i64>) -> Result<Self, Self::Error> {
        Self::try_from_pairs(raw)
    }
}

impl From<WeightMap> for BTreeMap<String, u32> {
    fn from(w: WeightMap) -> Self {
        w.entries().map(|(r, v)| (r.as_str().to_string(), v)).collect()
    }
}

/// What the user picked: an option id for choice questions, a scale
/// position for sliders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Option(String),
    Scale(i64),
}

/// One answered question, weights already resolved against the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub value: AnswerValue,
    pub weights: WeightMap,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, value: AnswerValue, weights: WeightMap) -> Self {
        Self {
            question_id: question_id.into(),
            value,
            weights,
        }
    }
}
