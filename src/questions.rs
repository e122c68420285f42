//! # Question Bank
//!
//! Static, ordered question definitions and the lookup that turns a user's
//! selection into the weight map the scoring core consumes.
//!
//! Two shapes:
//! - choice questions (`scenario`, `reflection`, `word_cloud`): pick an option id
//! - slider questions: pick a position; ranges are inclusive on both ends

use anyhow::{anyhow, bail, Context};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::ScoringError;
use crate::weights::{Answer, AnswerValue, WeightMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Scenario,
    Reflection,
    WordCloud,
    Slider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub text: String,
    pub weights: WeightMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: i64,
    pub max: i64,
    pub weights: WeightMap,
}

impl SliderRange {
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Shape-specific part of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionBody {
    Slider {
        left_label: String,
        right_label: String,
        ranges: Vec<SliderRange>,
    },
    Choice {
        options: Vec<ChoiceOption>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub kind: QuestionKind,
    pub text: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    pub fn is_slider(&self) -> bool {
        matches!(self.body, QuestionBody::Slider { .. })
    }

    /// Every weight map a user could end up with for this question.
    pub fn weight_maps(&self) -> Vec<&WeightMap> {
        match &self.body {
            QuestionBody::Slider { ranges, .. } => ranges.iter().map(|r| &r.weights).collect(),
            QuestionBody::Choice { options } => options.iter().map(|o| &o.weights).collect(),
        }
    }

    /// Resolve a selection against this question.
    pub fn resolve(&self, value: &AnswerValue) -> Result<WeightMap, ScoringError> {
        match (&self.body, value) {
            (QuestionBody::Choice { options }, AnswerValue::Option(option_id)) => options
                .iter()
                .find(|o| &o.id == option_id)
                .map(|o| o.weights)
                .ok_or_else(|| ScoringError::UnknownOption {
                    question_id: self.id.clone(),
                    option_id: option_id.clone(),
                }),
            (QuestionBody::Slider { ranges, .. }, AnswerValue::Scale(v)) => ranges
                .iter()
                .find(|r| r.contains(*v))
                .map(|r| r.weights)
                .ok_or_else(|| ScoringError::ValueOutOfRange {
                    question_id: self.id.clone(),
                    value: *v,
                }),
            (QuestionBody::Choice { .. }, AnswerValue::Scale(_)) => {
                Err(ScoringError::ValueKindMismatch {
                    question_id: self.id.clone(),
                    expected: "an option id",
                })
            }
            (QuestionBody::Slider { .. }, AnswerValue::Option(_)) => {
                Err(ScoringError::ValueKindMismatch {
                    question_id: self.id.clone(),
                    expected: "a numeric position",
                })
            }
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        let id = &self.id;
        if (self.kind == QuestionKind::Slider) != self.is_slider() {
            bail!("question `{id}` body does not match kind {:?}", self.kind);
        }
        match &self.body {
            QuestionBody::Choice { options } => {
                if options.is_empty() {
                    bail!("question `{id}` has no options");
                }
                let mut seen = HashSet::new();
                for o in options {
                    if !seen.insert(o.id.as_str()) {
                        bail!("question `{id}` repeats option `{}`", o.id);
                    }
                }
            }
            QuestionBody::Slider { ranges, .. } => {
                if ranges.is_empty() {
                    bail!("question `{id}` has no ranges");
                }
                if let Some(r) = ranges.iter().find(|r| r.min > r.max) {
                    bail!("question `{id}` has inverted range {}..={}", r.min, r.max);
                }
            }
        }
        Ok(())
    }
}

/// A selection that still has to be resolved against the bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub question_id: String,
    pub value: AnswerValue,
}

/// Ordered, read-only collection of questions.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

#[derive(Deserialize)]
struct QuestionFile {
    questions: Vec<Question>,
}

static EMBEDDED: Lazy<Arc<QuestionBank>> = Lazy::new(|| {
    let raw = include_str!("../data/questions.json");
    Arc::new(QuestionBank::from_json_str(raw).expect("valid embedded question bank"))
});

impl QuestionBank {
    /// The 30 questions shipped with the crate.
    pub fn embedded() -> Arc<QuestionBank> {
        EMBEDDED.clone()
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let file: QuestionFile = serde_json::from_str(s).context("parsing question bank")?;
        Self::new(file.questions)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading question bank from {}", path.display()))?;
        Self::from_json_str(&data)
    }

    pub fn new(questions: Vec<Question>) -> anyhow::Result<Self> {
        let mut ids = HashSet::new();
        for q in &questions {
            q.check()?;
            if !ids.insert(q.id.clone()) {
                return Err(anyhow!("duplicate question id `{}`", q.id));
            }
        }
        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, question_id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Look up the weight map for one selection and build the answer triple.
    pub fn resolve(&self, question_id: &str, value: &AnswerValue) -> Result<Answer, ScoringError> {
        let q = self
            .get(question_id)
            .ok_or_else(|| ScoringError::UnknownQuestion(question_id.to_string()))?;
        let weights = q.resolve(value)?;
        Ok(Answer::new(question_id, value.clone(), weights))
    }

    /// Resolve a whole sequence, failing on the first bad selection.
    pub fn resolve_all(&self, selections: &[Selection]) -> Result<Vec<Answer>, ScoringError> {
        selections
            .iter()
            .map(|s| self.resolve(&s.question_id, &s.value))
            .collect()
    }
}
