//! HTTP search API: a thin `axum` layer over [`blogcrawler_search::SearchEngine`].
//!
//! `GET /api/search?q=<phrase>` (alias `keyword=`) returns
//! `{ results: [...] }`; a missing query is a 400 with
//! `{ error: "No search query provided" }`. CORS is wide open on `/api/*`,
//! matching the source's public read-only search endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use blogcrawler_search::SearchEngine;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct ApiState {
    search: Arc<SearchEngine>,
}

pub fn router(search: SearchEngine) -> Router {
    let state = ApiState {
        search: Arc::new(search),
    };

    Router::new()
        .route("/api/search", get(search_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
    keyword: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<SearchResultJson>,
}

#[derive(Debug, Serialize)]
struct SearchResultJson {
    id: i64,
    title: String,
    summary: String,
    author: String,
    topics: Vec<String>,
    date: Option<chrono::NaiveDate>,
    url: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn search_handler(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let phrase = params.q.or(params.keyword).filter(|s| !s.trim().is_empty());

    let Some(phrase) = phrase else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No search query provided".to_string(),
            }),
        )
            .into_response();
    };

    match state.search.search(&phrase, params.limit).await {
        Ok(hits) => {
            let results = hits
                .into_iter()
                .map(|r| SearchResultJson {
                    id: r.id,
                    title: r.title,
                    summary: r.summary,
                    author: r.author,
                    topics: r.topics,
                    date: r.date,
                    url: r.url,
                })
                .collect();
            Json(SearchResponse { results }).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "search query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "search failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_params_accept_either_alias() {
        let from_q: SearchParams = serde_urlencoded::from_str("q=rust").unwrap();
        assert_eq!(from_q.q.as_deref(), Some("rust"));

        let from_keyword: SearchParams = serde_urlencoded::from_str("keyword=rust").unwrap();
        assert_eq!(from_keyword.keyword.as_deref(), Some("rust"));
    }
}
