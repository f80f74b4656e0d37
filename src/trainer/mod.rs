//! 学習モジュール
//!
//! ラベル付き表 → 前処理 → トークナイザ → 層化分割 → 学習（早期終了）→ 保存。
//! 保存物は出力フォルダの `tokenizer.json` と `best_model.json`。

mod model;
mod split;

pub use model::{argmax, softmax, Gradients, SentimentModel, NUM_CLASSES};
pub use split::{stratified_split, Split};

use crate::error::{Result, SentimentError};
use crate::table::Table;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use review_sentiment_common::{clean_text, pad_sequences, Sentiment, Tokenizer};
use serde::Serialize;
use std::path::Path;

pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const MODEL_FILE: &str = "best_model.json";
pub const OOV_TOKEN: &str = "<OOV>";

/// 学習設定
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// 語彙の上限（OOV・パディング込み）
    pub max_words: usize,
    pub max_len: usize,
    pub test_size: f64,
    pub seed: u64,
    pub epochs: usize,
    pub batch_size: usize,
    /// 検証損失が改善しないまま許容するエポック数
    pub patience: usize,
    pub embed_dim: usize,
    pub learning_rate: f32,
    pub show_progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_words: 20_000,
            max_len: 100,
            test_size: 0.2,
            seed: 42,
            epochs: 10,
            batch_size: 64,
            patience: 3,
            embed_dim: 32,
            learning_rate: 0.5,
            show_progress: false,
        }
    }
}

/// 前処理済みの学習データ
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub texts: Vec<String>,
    pub labels: Vec<Sentiment>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0; NUM_CLASSES];
        for label in &self.labels {
            counts[label.code() as usize] += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub train_loss: f32,
    pub val_loss: f32,
    pub val_accuracy: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub train_rows: usize,
    pub val_rows: usize,
    pub best_epoch: usize,
    pub best_val_loss: f32,
    pub best_val_accuracy: f32,
    pub stopped_early: bool,
    pub history: Vec<EpochStats>,
}

/// 表から学習データを取り出す
///
/// 本文は正規化し、ラベルは韓国語名・数値のどちらも受け付ける。
/// ラベルか本文が欠けている行は捨てる。
pub fn prepare_dataset(table: &Table) -> Result<Dataset> {
    let review_col = table.require_column("review", "training data")?;
    let label_col = table.require_column("label", "training data")?;

    let mut dataset = Dataset::default();
    for r in 0..table.len() {
        let review = table.get(r, review_col);
        if review.trim().is_empty() {
            continue;
        }
        let Some(label) = Sentiment::parse_cell(table.get(r, label_col)) else {
            continue;
        };
        dataset.texts.push(clean_text(review));
        dataset.labels.push(label);
    }

    if dataset.is_empty() {
        return Err(SentimentError::EmptyDataset(
            "ラベルと本文がそろった行がありません".into(),
        ));
    }
    Ok(dataset)
}

/// 本文をパディング済みの整数列に変換
pub fn encode_texts<S: AsRef<str>>(tokenizer: &Tokenizer, texts: &[S], max_len: usize) -> Vec<Vec<usize>> {
    pad_sequences(&tokenizer.texts_to_sequences(texts), max_len)
}

fn pick<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}

fn epoch_bar(batches: usize, epoch: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(batches as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("  epoch {prefix} [{bar:40.cyan/blue}] {pos}/{len} バッチ")
    {
        bar.set_style(style.progress_chars("=>-"));
    }
    bar.set_prefix(epoch.to_string());
    bar
}

/// モデルを学習
///
/// 検証損失が改善するたびに `on_improve` を呼ぶ（チェックポイント保存用）。
/// 改善が `patience` エポック続かなければ打ち切り、最良の重みを返す。
/// 検証データが空なら学習損失で判定する。
pub fn fit<F>(
    train_x: &[Vec<usize>],
    train_y: &[Sentiment],
    val_x: &[Vec<usize>],
    val_y: &[Sentiment],
    vocab_size: usize,
    config: &TrainConfig,
    mut on_improve: F,
) -> Result<(SentimentModel, TrainReport)>
where
    F: FnMut(&mut SentimentModel) -> Result<()>,
{
    if train_x.is_empty() {
        return Err(SentimentError::EmptyDataset("学習用の行がありません".into()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = SentimentModel::new(vocab_size, config.embed_dim, config.max_len, &mut rng);
    let mut best = model.clone();
    let batch_size = config.batch_size.max(1);

    let mut report = TrainReport {
        train_rows: train_x.len(),
        val_rows: val_x.len(),
        best_epoch: 0,
        best_val_loss: f32::INFINITY,
        best_val_accuracy: 0.0,
        stopped_early: false,
        history: Vec::new(),
    };

    tracing::debug!(params = model.param_count(), vocab_size, "model initialized");

    let mut order: Vec<usize> = (0..train_x.len()).collect();
    let mut grads = Gradients::default();
    let mut stale_epochs = 0;

    for epoch in 1..=config.epochs {
        order.shuffle(&mut rng);
        let bar = epoch_bar(order.len().div_ceil(batch_size), epoch, config.show_progress);

        let mut total_loss = 0.0;
        for batch in order.chunks(batch_size) {
            grads.clear();
            for &i in batch {
                total_loss += model.accumulate(&train_x[i], train_y[i], &mut grads);
            }
            model.apply(&grads, config.learning_rate);
            bar.inc(1);
        }
        bar.finish_and_clear();

        let train_loss = total_loss / order.len() as f32;
        let (val_loss, val_accuracy) = if val_x.is_empty() {
            model.evaluate(train_x, train_y)
        } else {
            model.evaluate(val_x, val_y)
        };

        println!(
            "  Epoch {}/{}: loss={:.4} val_loss={:.4} val_acc={:.3}",
            epoch, config.epochs, train_loss, val_loss, val_accuracy
        );
        report.history.push(EpochStats {
            epoch,
            train_loss,
            val_loss,
            val_accuracy,
        });

        if val_loss < report.best_val_loss {
            report.best_epoch = epoch;
            report.best_val_loss = val_loss;
            report.best_val_accuracy = val_accuracy;
            stale_epochs = 0;
            best = model.clone();
            on_improve(&mut best)?;
        } else {
            stale_epochs += 1;
            if stale_epochs >= config.patience {
                println!("  ⏹ 検証損失が{}エポック改善しないため終了", stale_epochs);
                report.stopped_early = true;
                break;
            }
        }
    }

    Ok((best, report))
}

/// 表ファイルから学習し、トークナイザとモデルを保存
pub fn train_file(input: &Path, output_dir: &Path, config: &TrainConfig) -> Result<TrainReport> {
    let table = Table::read(input)?;
    let dataset = prepare_dataset(&table)?;
    let [neg, neu, pos] = dataset.class_counts();
    println!("  学習データ: {}件 (부정 {} / 중립 {} / 긍정 {})", dataset.len(), neg, neu, pos);

    let split = stratified_split(&dataset.labels, config.test_size, config.seed);
    let train_texts = pick(&dataset.texts, &split.train);
    let train_y = pick(&dataset.labels, &split.train);
    let val_texts = pick(&dataset.texts, &split.validation);
    let val_y = pick(&dataset.labels, &split.validation);

    // 語彙は学習側だけから作る
    let mut tokenizer = Tokenizer::new(config.max_words, OOV_TOKEN);
    tokenizer.fit_on_texts(&train_texts);
    let vocab_size = (tokenizer.vocab_len() + 2).min(config.max_words);

    std::fs::create_dir_all(output_dir)?;
    tokenizer.save(&output_dir.join(TOKENIZER_FILE))?;

    let train_x = encode_texts(&tokenizer, &train_texts, config.max_len);
    let val_x = encode_texts(&tokenizer, &val_texts, config.max_len);

    let model_path = output_dir.join(MODEL_FILE);
    let (mut best, report) = fit(&train_x, &train_y, &val_x, &val_y, vocab_size, config, |m| {
        m.save(&model_path)?;
        tracing::debug!(path = %model_path.display(), "checkpoint saved");
        Ok(())
    })?;
    best.save(&model_path)?;

    Ok(report)
}

/// 1件分の推論結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Sentiment,
    pub confidence: f32,
    pub probabilities: [f32; NUM_CLASSES],
}

/// 保存済みモデルとトークナイザによる推論
#[derive(Debug, Clone)]
pub struct Predictor {
    tokenizer: Tokenizer,
    model: SentimentModel,
}

impl Predictor {
    pub fn new(tokenizer: Tokenizer, model: SentimentModel) -> Self {
        Self { tokenizer, model }
    }

    /// 出力フォルダから読み込み
    pub fn load(model_dir: &Path) -> Result<Self> {
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        if !tokenizer_path.exists() {
            return Err(SentimentError::FileNotFound(tokenizer_path.display().to_string()));
        }
        let tokenizer = Tokenizer::load(&tokenizer_path)?;
        let model = SentimentModel::load(&model_dir.join(MODEL_FILE))?;
        Ok(Self::new(tokenizer, model))
    }

    pub fn model(&self) -> &SentimentModel {
        &self.model
    }

    pub fn predict(&self, review: &str) -> Prediction {
        let cleaned = clean_text(review);
        let sequence = encode_texts(&self.tokenizer, &[cleaned], self.model.max_len)
            .pop()
            .unwrap_or_default();
        let probabilities = self.model.predict_proba(&sequence);
        let (label, confidence) = argmax(&probabilities);
        Prediction {
            label,
            confidence,
            probabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_dataset_drops_missing() {
        let mut t = Table::new(["review", "label"]);
        t.push_row(vec!["정말 최고!!".into(), "2".into()]);
        t.push_row(vec!["".into(), "0".into()]);
        t.push_row(vec!["라벨 없음".into(), "".into()]);
        t.push_row(vec!["별로".into(), "부정".into()]);
        t.push_row(vec!["그냥".into(), "1.0".into()]);

        let ds = prepare_dataset(&t).unwrap();
        assert_eq!(ds.texts, vec!["정말 최고", "별로", "그냥"]);
        assert_eq!(
            ds.labels,
            vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral]
        );
        assert_eq!(ds.class_counts(), [1, 1, 1]);
    }

    #[test]
    fn test_prepare_dataset_requires_label_column() {
        let t = Table::new(["review"]);
        assert!(matches!(
            prepare_dataset(&t),
            Err(SentimentError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_prepare_dataset_empty() {
        let mut t = Table::new(["review", "label"]);
        t.push_row(vec!["".into(), "".into()]);
        assert!(matches!(prepare_dataset(&t), Err(SentimentError::EmptyDataset(_))));
    }

    #[test]
    fn test_fit_rejects_empty_training_set() {
        let result = fit(&[], &[], &[], &[], 10, &TrainConfig::default(), |_| Ok(()));
        assert!(matches!(result, Err(SentimentError::EmptyDataset(_))));
    }
}
