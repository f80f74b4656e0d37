use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("レビュー表が見つかりません: {0}")]
    NoTablesFound(String),

    #[error("必須列がありません: {column} ({table})")]
    MissingColumn { column: String, table: String },

    #[error("学習データが空です: {0}")]
    EmptyDataset(String),

    #[error("HTTPエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel読み込みエラー: {0}")]
    Excel(String),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("モデルエラー: {0}")]
    Model(String),

    #[error("該当するレビューが元データにありません")]
    ReviewNotFound,

    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    #[error("サーバーエラー: {0}")]
    Server(String),

    #[error(transparent)]
    Common(#[from] review_sentiment_common::Error),
}

pub type Result<T> = std::result::Result<T, SentimentError>;

impl SentimentError {
    /// HTTPステータスとエラーコード
    pub fn status_code(&self) -> (StatusCode, &'static str) {
        match self {
            SentimentError::ReviewNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            SentimentError::BadRequest(_) | SentimentError::MissingColumn { .. } => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            SentimentError::FileNotFound(_) => (StatusCode::NOT_FOUND, "FILE_NOT_FOUND"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for SentimentError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, axum::Json(body)).into_response()
    }
}
