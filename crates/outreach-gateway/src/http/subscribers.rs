//! Subscriber directory endpoints.
//!
//! - `GET    /api/subscribers?q=&language=`: filtered listing
//! - `POST   /api/subscribers`: opt in or change language; `created` tells which
//! - `DELETE /api/subscribers/{phone}`: opt out; 404 if unknown

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use outreach_core::Language;
use outreach_subscribers::{Subscriber, SubscriberFilter};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use crate::app::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    /// A language code, or `all` for no language filter.
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertBody {
    #[serde(default)]
    pub phone: String,
    pub language: Option<String>,
}

fn parse_language(raw: &str) -> Result<Language, ApiError> {
    raw.parse().map_err(|reason| ApiError::validation("language", reason))
}

pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Subscriber>>, ApiError> {
    let language = match query.language.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(l) if l.eq_ignore_ascii_case("all") => None,
        Some(l) => Some(parse_language(l)?),
    };
    let filter = SubscriberFilter {
        query: query.q,
        language,
    };
    Ok(Json(state.directory.search(&filter)?))
}

pub async fn upsert_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpsertBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let language = match body.language.as_deref() {
        Some(l) => parse_language(l)?,
        None => Language::default(),
    };
    let created = state.directory.get(&body.phone)?.is_none();
    let subscriber = state.directory.upsert(&body.phone, language)?;
    Ok(Json(json!({ "ok": true, "created": created, "subscriber": subscriber })))
}

pub async fn remove_handler(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.directory.remove(&phone)?;
    Ok(Json(json!({ "ok": true, "phone": phone.trim() })))
}
