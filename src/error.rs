//! Error types shared by the scoring core and the HTTP layer.
//!
//! `ScoringError` covers contract violations coming from collaborators
//! (question bank, answer producers). The core fails fast on them instead of
//! producing a corrupted score. `ApiError` maps them onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::realm::Realm;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("unknown realm `{0}`")]
    UnknownRealm(String),

    #[error("negative weight {weight} for realm `{realm}`")]
    NegativeWeight { realm: Realm, weight: i64 },

    #[error("weight {weight} for realm `{realm}` does not fit in u32")]
    WeightTooLarge { realm: Realm, weight: i64 },

    #[error("total score for realm `{realm}` overflows u32")]
    ScoreOverflow { realm: Realm },

    #[error("trio needs three distinct realms, `{0}` appears more than once")]
    DuplicateRealm(Realm),

    #[error("malformed trio key `{0}`")]
    MalformedTrioKey(String),

    #[error("unknown question `{0}`")]
    UnknownQuestion(String),

    #[error("question `{question_id}` has no option `{option_id}`")]
    UnknownOption {
        question_id: String,
        option_id: String,
    },

    #[error("value {value} is outside every range of question `{question_id}`")]
    ValueOutOfRange { question_id: String, value: i64 },

    #[error("question `{question_id}` expects {expected}")]
    ValueKindMismatch {
        question_id: String,
        expected: &'static str,
    },
}

/// Error returned by Axum handlers; renders as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<ScoringError> for ApiError {
    fn from(e: ScoringError) -> Self {
        let status = match e {
            ScoringError::UnknownQuestion(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
