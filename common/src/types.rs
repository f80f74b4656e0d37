//! レビューデータの型定義
//!
//! CLIとダッシュボードで共有される型:
//! - Sentiment: 感情ラベル（0:부정 / 1:중립 / 2:긍정）
//! - ReviewRecord: 1件のレビューと付随メタデータ

use serde::{Deserialize, Serialize};
use std::fmt;

/// 感情ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Sentiment {
    Negative,
    Neutral,
    Positive,
}

impl Sentiment {
    /// 全ラベル（コード順）
    pub const ALL: [Sentiment; 3] = [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    pub fn code(self) -> u8 {
        match self {
            Sentiment::Negative => 0,
            Sentiment::Neutral => 1,
            Sentiment::Positive => 2,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Sentiment::Negative),
            1 => Some(Sentiment::Neutral),
            2 => Some(Sentiment::Positive),
            _ => None,
        }
    }

    /// 表示名（韓国語）
    pub fn name(self) -> &'static str {
        match self {
            Sentiment::Negative => "부정",
            Sentiment::Neutral => "중립",
            Sentiment::Positive => "긍정",
        }
    }

    /// おすすめフラグからラベルを決定（中立なし）
    pub fn from_voted_up(voted_up: bool) -> Self {
        if voted_up {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }

    /// セル値からラベルを解釈
    ///
    /// 受け付ける形式: `"2"`, `"2.0"`, `"긍정"`。空文字や範囲外は `None`。
    pub fn parse_cell(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        match value {
            "부정" => return Some(Sentiment::Negative),
            "중립" => return Some(Sentiment::Neutral),
            "긍정" => return Some(Sentiment::Positive),
            _ => {}
        }

        if let Ok(code) = value.parse::<u32>() {
            return Self::from_code(code);
        }

        // 欠損値を含む列は "2.0" のように浮動小数で保存されることがある
        match value.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 && f >= 0.0 => Self::from_code(f as u32),
            _ => None,
        }
    }
}

impl From<Sentiment> for u8 {
    fn from(s: Sentiment) -> u8 {
        s.code()
    }
}

impl TryFrom<u8> for Sentiment {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Sentiment::from_code(code as u32).ok_or_else(|| format!("不正なラベルコード: {}", code))
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// レビュー1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(default)]
    pub game: String,

    #[serde(default)]
    pub review_id: String,

    #[serde(default)]
    pub review: String,

    /// おすすめフラグ（ストア由来のみ）
    #[serde(default)]
    pub voted_up: Option<bool>,

    #[serde(default)]
    pub label: Option<Sentiment>,

    /// 分類器の信頼度
    #[serde(default)]
    pub confidence: Option<f32>,

    /// ラベルを付与したモデル名
    #[serde(default)]
    pub model_used: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_codes() {
        for s in Sentiment::ALL {
            assert_eq!(Sentiment::from_code(s.code() as u32), Some(s));
        }
        assert_eq!(Sentiment::from_code(3), None);
    }

    #[test]
    fn test_parse_cell_variants() {
        assert_eq!(Sentiment::parse_cell("0"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse_cell(" 1 "), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse_cell("2.0"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse_cell("긍정"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse_cell("부정"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse_cell("중립"), Some(Sentiment::Neutral));
    }

    #[test]
    fn test_parse_cell_rejects() {
        assert_eq!(Sentiment::parse_cell(""), None);
        assert_eq!(Sentiment::parse_cell("5"), None);
        assert_eq!(Sentiment::parse_cell("1.5"), None);
        assert_eq!(Sentiment::parse_cell("-1"), None);
        assert_eq!(Sentiment::parse_cell("good"), None);
    }

    #[test]
    fn test_from_voted_up() {
        assert_eq!(Sentiment::from_voted_up(true), Sentiment::Positive);
        assert_eq!(Sentiment::from_voted_up(false), Sentiment::Negative);
    }

    #[test]
    fn test_record_serialize_label_as_code() {
        let record = ReviewRecord {
            game: "Hades".to_string(),
            review_id: "123".to_string(),
            review: "재밌어요".to_string(),
            label: Some(Sentiment::Positive),
            ..Default::default()
        };

        let json = serde_json::to_string(&record).expect("シリアライズ失敗");
        assert!(json.contains("\"label\":2"));
        assert!(json.contains("\"review\":\"재밌어요\""));
    }
}
