mod lm_studio;

pub use lm_studio::{CompletionChoice, CompletionResponse, LmStudioClient};

use crate::error::Result;
use crate::table::{label_cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use review_sentiment_common::{build_batch_prompt, parse_label_response, Sentiment};
use std::path::{Path, PathBuf};

/// テキスト補完バックエンド
#[allow(async_fn_in_trait)]
pub trait CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct LabelOptions {
    pub batch_size: usize,
    /// `model_used` 列に書く名前
    pub model_marker: String,
    /// 途中保存先（None なら保存しない）
    pub checkpoint: Option<PathBuf>,
    /// 何バッチごとに途中保存するか（0 なら最後のみ）
    pub save_every: usize,
    pub show_progress: bool,
    pub verbose: bool,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            model_marker: "gemma-lmstudio".into(),
            checkpoint: None,
            save_every: 10,
            show_progress: false,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSummary {
    pub batches: usize,
    /// LLMに問い合わせたバッチ数
    pub classified: usize,
    /// ラベル済みでスキップしたバッチ数
    pub skipped: usize,
    /// 有効なラベルが付いた行数
    pub labeled_rows: usize,
    /// 応答から読み取れず空のままの行数
    pub unparsed_rows: usize,
}

/// バッチ内の全行がラベル済みか
fn batch_fully_labeled(table: &Table, rows: std::ops::Range<usize>, label_col: usize) -> bool {
    rows.into_iter().all(|r| !table.get(r, label_col).trim().is_empty())
}

fn save_checkpoint(table: &Table, options: &LabelOptions) -> Result<()> {
    if let Some(path) = &options.checkpoint {
        table.write_csv(path)?;
        tracing::debug!(path = %path.display(), "labeling progress saved");
    }
    Ok(())
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  LLM分類中 [{bar:40.cyan/blue}] {pos}/{len} バッチ ({eta})")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar
}

/// 表に感情ラベルを付与（その場で書き換え）
///
/// - `label` / `model_used` 列がなければ追加
/// - 全行ラベル済みのバッチはスキップ
/// - 応答が足りない・範囲外の行はラベル空のまま `model_used` だけ付く
/// - API失敗時は途中経過を保存してからエラーを返す
pub async fn label_table<C: CompletionClient>(
    table: &mut Table,
    client: &C,
    options: &LabelOptions,
) -> Result<LabelSummary> {
    let review_col = table.require_column("review", "labeler input")?;
    let label_col = table.ensure_column("label");
    let marker_col = table.ensure_column("model_used");

    let batch_size = options.batch_size.max(1);
    let total = table.len();
    let mut summary = LabelSummary {
        batches: total.div_ceil(batch_size),
        ..Default::default()
    };

    let bar = progress_bar(summary.batches, options.show_progress);

    for start in (0..total).step_by(batch_size) {
        let end = (start + batch_size).min(total);
        bar.inc(1);

        if batch_fully_labeled(table, start..end, label_col) {
            summary.skipped += 1;
            continue;
        }

        let reviews: Vec<String> = (start..end)
            .map(|r| table.get(r, review_col).to_string())
            .collect();
        let prompt = build_batch_prompt(&reviews);

        let response = match client.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                bar.abandon();
                save_checkpoint(table, options)?;
                return Err(e);
            }
        };

        if options.verbose {
            tracing::debug!(start, end, response = %response.trim(), "completion");
        }

        let labels = parse_label_response(&response, end - start);
        for (row, code) in (start..end).zip(labels) {
            let label = code.and_then(Sentiment::from_code);
            match label {
                Some(_) => summary.labeled_rows += 1,
                None => summary.unparsed_rows += 1,
            }
            table.set(row, label_col, label_cell(label));
            table.set(row, marker_col, options.model_marker.clone());
        }
        summary.classified += 1;

        log_batch(table, start..end, review_col, label_col);

        if options.save_every > 0 && summary.classified % options.save_every == 0 {
            save_checkpoint(table, options)?;
        }
    }

    bar.finish_and_clear();
    save_checkpoint(table, options)?;
    Ok(summary)
}

/// バッチ先頭数件と、부정/중립 と判定された行をログに出す
fn log_batch(table: &Table, rows: std::ops::Range<usize>, review_col: usize, label_col: usize) {
    for r in rows.clone().take(3) {
        tracing::debug!(row = r, label = table.get(r, label_col), review = table.get(r, review_col), "labeled");
    }

    let non_positive: Vec<usize> = rows
        .filter(|&r| {
            matches!(
                Sentiment::parse_cell(table.get(r, label_col)),
                Some(Sentiment::Negative | Sentiment::Neutral)
            )
        })
        .take(5)
        .collect();
    for r in non_positive {
        tracing::debug!(row = r, label = table.get(r, label_col), review = table.get(r, review_col), "negative/neutral in batch");
    }
}

/// 入力表を読み込み、ラベル付けして出力表へ保存
///
/// `resume` が真で出力表が既にあれば、そちらから再開する。
pub async fn label_file<C: CompletionClient>(
    input: &Path,
    output: &Path,
    resume: bool,
    client: &C,
    options: &LabelOptions,
) -> Result<(Table, LabelSummary)> {
    let source = if resume && output.exists() {
        println!("  途中経過から再開: {}", output.display());
        output
    } else {
        input
    };

    let mut table = Table::read(source)?;
    let options = LabelOptions {
        checkpoint: Some(output.to_path_buf()),
        ..options.clone()
    };

    let summary = label_table(&mut table, client, &options).await?;
    Ok((table, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_fully_labeled() {
        let mut t = Table::new(["review", "label"]);
        t.push_row(vec!["a".into(), "2".into()]);
        t.push_row(vec!["b".into(), " ".into()]);
        assert!(batch_fully_labeled(&t, 0..1, 1));
        assert!(!batch_fully_labeled(&t, 0..2, 1));
    }
}
