//! ダッシュボードモジュール
//!
//! 学習済みモデルでラベル付き表を再採点し、HTTPで公開する。
//! - GET  /             画面（HTML 1枚）
//! - GET  /health       稼働確認
//! - GET  /api/summary  正解率・予測分布・頻出単語
//! - POST /api/predict  1件の推論
//! - POST /api/feedback ラベル修正（元の表を書き換え）

mod routes;
mod state;

pub use routes::{FeedbackRequest, PredictRequest, PredictResponse};
pub use state::{
    accuracy, score_table, summarize, top_words, AppState, DashboardData, ScoredRow, Summary,
    TOP_WORDS,
};

use crate::error::{Result, SentimentError};
use crate::trainer::Predictor;
use axum::Router;
use std::path::Path;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// ミドルウェア込みのルーター
pub fn build_router(state: AppState) -> Router {
    routes::router()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// モデルと表を読み込んで状態を作る
pub fn load_state(table: &Path, model_dir: &Path) -> Result<AppState> {
    let predictor = Predictor::load(model_dir)?;
    let data = DashboardData::load(table, &predictor)?;
    Ok(AppState::new(data, predictor))
}

/// サーバー起動（Ctrl-Cで停止）
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| SentimentError::Server(format!("{} にバインドできません: {}", bind, e)))?;
    tracing::info!(addr = bind, "dashboard listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SentimentError::Server(e.to_string()))?;

    tracing::info!("dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
    }
}
