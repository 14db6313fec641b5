//! Mapping from crate errors to JSON error responses.
//!
//! Every failure body has the shape
//! `{ "success": false, "message": "...", "code": "..." }`; validation
//! failures also name the offending `field`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use outreach_core::OutreachError;
use outreach_dispatch::{AnalyticsError, DispatchError};
use outreach_ledger::LedgerError;
use outreach_subscribers::SubscriberError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub OutreachError);

impl ApiError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self(OutreachError::Validation {
            field,
            reason: reason.into(),
        })
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            OutreachError::Validation { .. } => StatusCode::BAD_REQUEST,
            OutreachError::SubscriberNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = self.0.code(), error = %self.0, "request failed");
        }

        let mut body = json!({
            "success": false,
            "message": self.0.to_string(),
            "code": self.0.code(),
        });
        if let OutreachError::Validation { field, .. } = &self.0 {
            body["field"] = json!(field);
        }
        (status, Json(body)).into_response()
    }
}

impl From<OutreachError> for ApiError {
    fn from(e: OutreachError) -> Self {
        Self(e)
    }
}

/// A body that is not JSON, or not the JSON the endpoint expects.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation("body", rejection.body_text())
    }
}

impl From<SubscriberError> for ApiError {
    fn from(e: SubscriberError) -> Self {
        Self(match e {
            SubscriberError::NotFound { phone } => OutreachError::SubscriberNotFound { phone },
            SubscriberError::InvalidPhone(reason) => OutreachError::Validation {
                field: "phone",
                reason,
            },
            SubscriberError::Database(e) => OutreachError::Storage(e.to_string()),
        })
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self(OutreachError::Storage(e.to_string()))
    }
}

impl From<DispatchError> for ApiError {
    fn from(e: DispatchError) -> Self {
        Self(match e {
            DispatchError::Validation { field, reason } => {
                OutreachError::Validation { field, reason }
            }
            DispatchError::Directory(e) => OutreachError::Storage(e.to_string()),
            DispatchError::Persistence(e) => OutreachError::Persistence(e.to_string()),
        })
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(e: AnalyticsError) -> Self {
        Self(OutreachError::Storage(e.to_string()))
    }
}
