use super::state::{AppState, Summary};
use crate::error::{Result, SentimentError};
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use review_sentiment_common::Sentiment;
use serde::{Deserialize, Serialize};

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub rows: usize,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub review: String,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: u8,
    pub label_name: &'static str,
    pub confidence: f32,
    pub probabilities: [f32; 3],
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub review: String,
    /// コード（0〜2）または表示名
    pub label: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub updated: usize,
    pub label: u8,
    pub label_name: &'static str,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let rows = state.data.read().await.rows().len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        rows,
    })
}

/// GET /api/summary
async fn summary(State(state): State<AppState>) -> Json<Summary> {
    Json(state.data.read().await.summary())
}

/// POST /api/predict
async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>> {
    if req.review.trim().is_empty() {
        return Err(SentimentError::BadRequest("review が空です".into()));
    }

    let prediction = state.predictor.predict(&req.review);
    Ok(Json(PredictResponse {
        label: prediction.label.code(),
        label_name: prediction.label.name(),
        confidence: prediction.confidence,
        probabilities: prediction.probabilities,
    }))
}

fn parse_feedback_label(value: &serde_json::Value) -> Option<Sentiment> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|c| Sentiment::from_code(c as u32)),
        serde_json::Value::String(s) => Sentiment::parse_cell(s),
        _ => None,
    }
}

/// POST /api/feedback
async fn feedback(
    State(state): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>> {
    let label = parse_feedback_label(&req.label)
        .ok_or_else(|| SentimentError::BadRequest(format!("不正なラベル: {}", req.label)))?;

    let updated = state.data.write().await.apply_feedback(&req.review, label)?;
    Ok(Json(FeedbackResponse {
        updated,
        label: label.code(),
        label_name: label.name(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/summary", get(summary))
        .route("/api/predict", post(predict))
        .route("/api/feedback", post(feedback))
}
