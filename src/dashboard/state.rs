//! ダッシュボードの状態
//!
//! 元データの表と、その各行の予測結果を保持する。
//! フィードバックは表を書き換えて元ファイルへ保存する。

use crate::error::{Result, SentimentError};
use crate::table::{is_spreadsheet, label_cell, Table};
use crate::trainer::Predictor;
use rayon::prelude::*;
use review_sentiment_common::export::excel_core::ScoredReview;
use review_sentiment_common::{clean_text, Sentiment};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// 上位単語の表示件数
pub const TOP_WORDS: usize = 20;

/// 予測済みの1行
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRow {
    /// 元の表での行番号
    pub row: usize,
    pub game: String,
    pub review_id: String,
    pub review: String,
    pub cleaned: String,
    pub label: Sentiment,
    pub pred: Sentiment,
    pub confidence: f32,
    pub model_used: String,
}

impl ScoredReview for ScoredRow {
    fn game(&self) -> &str {
        &self.game
    }

    fn review_id(&self) -> &str {
        &self.review_id
    }

    fn review(&self) -> &str {
        &self.review
    }

    fn label(&self) -> Option<Sentiment> {
        Some(self.label)
    }

    fn pred(&self) -> Option<Sentiment> {
        Some(self.pred)
    }

    fn confidence(&self) -> Option<f32> {
        Some(self.confidence)
    }

    fn model_used(&self) -> &str {
        &self.model_used
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub total: usize,
    pub accuracy: f32,
    /// 予測ラベルの件数（表示名キー）
    pub distribution: BTreeMap<&'static str, usize>,
    /// 予測ラベルごとの頻出単語
    pub top_words: BTreeMap<&'static str, Vec<(String, usize)>>,
}

/// 本文とラベルがそろった行をすべて予測
pub fn score_table(table: &Table, predictor: &Predictor) -> Result<Vec<ScoredRow>> {
    let review_col = table.require_column("review", "dashboard source")?;
    let label_col = table.require_column("label", "dashboard source")?;
    let col = |name: &str| table.column(name);
    let (game_col, id_col, marker_col) = (col("game"), col("review_id"), col("model_used"));
    let cell = |r: usize, c: Option<usize>| c.map(|c| table.get(r, c).to_string()).unwrap_or_default();

    let candidates: Vec<(usize, Sentiment)> = (0..table.len())
        .filter(|&r| !table.get(r, review_col).trim().is_empty())
        .filter_map(|r| Sentiment::parse_cell(table.get(r, label_col)).map(|l| (r, l)))
        .collect();

    let rows = candidates
        .par_iter()
        .map(|&(r, label)| {
            let review = table.get(r, review_col).to_string();
            let prediction = predictor.predict(&review);
            ScoredRow {
                row: r,
                game: cell(r, game_col),
                review_id: cell(r, id_col),
                cleaned: clean_text(&review),
                review,
                label,
                pred: prediction.label,
                confidence: prediction.confidence,
                model_used: cell(r, marker_col),
            }
        })
        .collect();
    Ok(rows)
}

/// 予測が正解ラベルと一致する割合（空なら0）
pub fn accuracy(rows: &[ScoredRow]) -> f32 {
    if rows.is_empty() {
        return 0.0;
    }
    let correct = rows.iter().filter(|r| r.pred == r.label).count();
    correct as f32 / rows.len() as f32
}

/// 予測ラベルごとの単語頻度（上位 `limit` 件、同数は単語順）
pub fn top_words(rows: &[ScoredRow], label: Sentiment, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows.iter().filter(|r| r.pred == label) {
        for word in row.cleaned.split_whitespace() {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(w, c)| (w.to_string(), c))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

pub fn summarize(rows: &[ScoredRow]) -> Summary {
    let mut distribution = BTreeMap::new();
    let mut words = BTreeMap::new();
    for label in Sentiment::ALL {
        distribution.insert(label.name(), rows.iter().filter(|r| r.pred == label).count());
        words.insert(label.name(), top_words(rows, label, TOP_WORDS));
    }

    Summary {
        total: rows.len(),
        accuracy: accuracy(rows),
        distribution,
        top_words: words,
    }
}

/// 読み込み済みの表と予測結果
#[derive(Debug)]
pub struct DashboardData {
    source: PathBuf,
    table: Table,
    rows: Vec<ScoredRow>,
}

impl DashboardData {
    pub fn new(source: PathBuf, table: Table, rows: Vec<ScoredRow>) -> Self {
        Self { source, table, rows }
    }

    pub fn load(source: &Path, predictor: &Predictor) -> Result<Self> {
        let table = Table::read(source)?;
        let rows = score_table(&table, predictor)?;
        tracing::info!(path = %source.display(), rows = rows.len(), "dashboard data loaded");
        Ok(Self::new(source.to_path_buf(), table, rows))
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn rows(&self) -> &[ScoredRow] {
        &self.rows
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn summary(&self) -> Summary {
        summarize(&self.rows)
    }

    /// 本文が完全一致する採点済み行のラベルを修正し、元ファイルを書き換える
    ///
    /// 修正した行数を返す。ラベルがなく採点対象外の行には一致しない（`ReviewNotFound`）。
    /// 書き戻す際は採点済みの全行に `pred` と `confidence` を入れる。
    pub fn apply_feedback(&mut self, review: &str, label: Sentiment) -> Result<usize> {
        let label_col = self.table.require_column("label", "dashboard source")?;

        let mut updated = 0;
        for row in self.rows.iter_mut().filter(|row| row.review == review) {
            row.label = label;
            row.pred = label;
            self.table.set(row.row, label_col, label_cell(Some(label)));
            updated += 1;
        }
        if updated == 0 {
            return Err(SentimentError::ReviewNotFound);
        }

        let pred_col = self.table.ensure_column("pred");
        let confidence_col = self.table.ensure_column("confidence");
        for row in &self.rows {
            self.table.set(row.row, pred_col, label_cell(Some(row.pred)));
            self.table.set(row.row, confidence_col, format!("{:.4}", row.confidence));
        }

        if is_spreadsheet(&self.source) {
            // xlsx は読み込み専用なので隣にCSVで保存
            self.source.set_extension("csv");
        }
        self.table.write_csv(&self.source)?;
        tracing::info!(rows = updated, label = label.name(), "feedback saved");
        Ok(updated)
    }
}

/// ハンドラ間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub data: Arc<RwLock<DashboardData>>,
    pub predictor: Arc<Predictor>,
}

impl AppState {
    pub fn new(data: DashboardData, predictor: Predictor) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            predictor: Arc::new(predictor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(review: &str, label: Sentiment, pred: Sentiment) -> ScoredRow {
        ScoredRow {
            row: 0,
            game: String::new(),
            review_id: String::new(),
            review: review.to_string(),
            cleaned: clean_text(review),
            label,
            pred,
            confidence: 0.9,
            model_used: String::new(),
        }
    }

    #[test]
    fn test_accuracy() {
        use Sentiment::*;
        let rows = vec![
            row("a", Positive, Positive),
            row("b", Negative, Positive),
            row("c", Neutral, Neutral),
            row("d", Negative, Negative),
        ];
        assert!((accuracy(&rows) - 0.75).abs() < 1e-6);
        assert_eq!(accuracy(&[]), 0.0);
    }

    #[test]
    fn test_top_words_by_prediction() {
        use Sentiment::*;
        let rows = vec![
            row("최고 게임 최고!", Positive, Positive),
            row("게임 좋아", Negative, Positive),
            row("버그 많음", Negative, Negative),
        ];
        let words = top_words(&rows, Positive, 2);
        assert_eq!(words, vec![("게임".to_string(), 2), ("최고".to_string(), 2)]);
        assert_eq!(top_words(&rows, Neutral, 20), vec![]);
    }

    #[test]
    fn test_summary_distribution_uses_names() {
        use Sentiment::*;
        let rows = vec![row("a", Positive, Positive), row("b", Negative, Neutral)];
        let summary = summarize(&rows);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.distribution["긍정"], 1);
        assert_eq!(summary.distribution["중립"], 1);
        assert_eq!(summary.distribution["부정"], 0);
    }
}
