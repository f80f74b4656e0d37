use serde::Deserialize;
use serde_json::Value;

/// レビューAPIの1ページ分
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedPage {
    /// 次ページのカーソル（空なら終端）
    #[serde(default)]
    pub cursor: Option<String>,

    #[serde(default)]
    pub reviews: Vec<FeedReview>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedReview {
    #[serde(default)]
    pub recommendationid: Option<Value>,

    #[serde(default)]
    pub reviewid: Option<Value>,

    #[serde(default)]
    pub review: Option<String>,

    #[serde(default)]
    pub voted_up: Option<bool>,
}

impl FeedReview {
    /// レビューID（recommendationid優先、文字列・数値どちらも可）
    pub fn id(&self) -> Option<String> {
        id_value(self.recommendationid.as_ref()).or_else(|| id_value(self.reviewid.as_ref()))
    }

    /// 前後の空白を除いた本文（空なら None）
    pub fn text(&self) -> Option<&str> {
        self.review
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

fn id_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_u64() != Some(0) => Some(n.to_string()),
        _ => None,
    }
}
