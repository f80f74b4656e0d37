//! 感情分類モデル
//!
//! 埋め込みの平均（パディングは無視）→ 全結合 → softmax(3クラス)。
//! 損失は疎カテゴリカル交差エントロピー、更新はミニバッチSGD。

use crate::error::{Result, SentimentError};
use rand::Rng;
use review_sentiment_common::{Sentiment, PAD_INDEX};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 出力クラス数
pub const NUM_CLASSES: usize = 3;

/// 保存形式のバージョン
const FORMAT_VERSION: u32 = 1;

const LOG_EPSILON: f32 = 1e-7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentModel {
    version: u32,
    /// 保存日時（RFC 3339）
    #[serde(default)]
    pub trained_at: String,
    pub vocab_size: usize,
    pub embed_dim: usize,
    /// 学習時のシーケンス長
    pub max_len: usize,
    /// [vocab_size][embed_dim]
    embeddings: Vec<f32>,
    /// [NUM_CLASSES][embed_dim]
    weights: Vec<f32>,
    biases: Vec<f32>,
}

/// 1ミニバッチ分の勾配
#[derive(Debug, Default)]
pub struct Gradients {
    /// 触れた埋め込み行だけ持つ
    embeddings: HashMap<usize, Vec<f32>>,
    weights: Vec<f32>,
    biases: Vec<f32>,
    samples: usize,
}

impl SentimentModel {
    /// 乱数初期化（埋め込みは ±0.05、全結合はGlorot一様）
    pub fn new<R: Rng>(vocab_size: usize, embed_dim: usize, max_len: usize, rng: &mut R) -> Self {
        let embeddings = (0..vocab_size * embed_dim)
            .map(|_| rng.gen_range(-0.05..0.05))
            .collect();
        let limit = (6.0 / (embed_dim + NUM_CLASSES) as f32).sqrt();
        let weights = (0..NUM_CLASSES * embed_dim)
            .map(|_| rng.gen_range(-limit..limit))
            .collect();

        Self {
            version: FORMAT_VERSION,
            trained_at: String::new(),
            vocab_size,
            embed_dim,
            max_len,
            embeddings,
            weights,
            biases: vec![0.0; NUM_CLASSES],
        }
    }

    /// パラメータ数
    pub fn param_count(&self) -> usize {
        self.embeddings.len() + self.weights.len() + self.biases.len()
    }

    fn embedding_row(&self, token: usize) -> &[f32] {
        let start = token * self.embed_dim;
        &self.embeddings[start..start + self.embed_dim]
    }

    /// パディングと範囲外を除いたトークン
    fn active_tokens<'a>(&'a self, sequence: &'a [usize]) -> impl Iterator<Item = usize> + 'a {
        sequence
            .iter()
            .copied()
            .filter(move |&t| t != PAD_INDEX && t < self.vocab_size)
    }

    /// 埋め込み平均（トークンがなければゼロベクトル）
    fn pooled(&self, sequence: &[usize]) -> (Vec<f32>, usize) {
        let mut hidden = vec![0.0; self.embed_dim];
        let mut count = 0;
        for token in self.active_tokens(sequence) {
            for (h, &e) in hidden.iter_mut().zip(self.embedding_row(token)) {
                *h += e;
            }
            count += 1;
        }
        if count > 0 {
            let n = count as f32;
            hidden.iter_mut().for_each(|h| *h /= n);
        }
        (hidden, count)
    }

    fn logits(&self, hidden: &[f32]) -> [f32; NUM_CLASSES] {
        let mut out = [0.0; NUM_CLASSES];
        for (k, o) in out.iter_mut().enumerate() {
            let row = &self.weights[k * self.embed_dim..(k + 1) * self.embed_dim];
            *o = self.biases[k] + row.iter().zip(hidden).map(|(w, h)| w * h).sum::<f32>();
        }
        out
    }

    /// クラス確率（コード順: 부정, 중립, 긍정）
    pub fn predict_proba(&self, sequence: &[usize]) -> [f32; NUM_CLASSES] {
        let (hidden, _) = self.pooled(sequence);
        softmax(self.logits(&hidden))
    }

    /// 最も確率の高いラベルとその確率
    pub fn predict(&self, sequence: &[usize]) -> (Sentiment, f32) {
        argmax(&self.predict_proba(sequence))
    }

    /// 1サンプルの損失を計算し、勾配を累積
    pub fn accumulate(&self, sequence: &[usize], label: Sentiment, grads: &mut Gradients) -> f32 {
        grads.ensure_shape(self);

        let (hidden, count) = self.pooled(sequence);
        let probs = softmax(self.logits(&hidden));
        let target = label.code() as usize;

        // d(loss)/d(logits) = p - onehot
        let mut d_logits = probs;
        d_logits[target] -= 1.0;

        let mut d_hidden = vec![0.0; self.embed_dim];
        for (k, &g) in d_logits.iter().enumerate() {
            grads.biases[k] += g;
            let offset = k * self.embed_dim;
            for i in 0..self.embed_dim {
                grads.weights[offset + i] += g * hidden[i];
                d_hidden[i] += g * self.weights[offset + i];
            }
        }

        if count > 0 {
            let scale = 1.0 / count as f32;
            for token in self.active_tokens(sequence) {
                let row = grads
                    .embeddings
                    .entry(token)
                    .or_insert_with(|| vec![0.0; self.embed_dim]);
                for (r, &d) in row.iter_mut().zip(&d_hidden) {
                    *r += d * scale;
                }
            }
        }

        grads.samples += 1;
        -probs[target].max(LOG_EPSILON).ln()
    }

    /// 平均勾配でSGD更新
    pub fn apply(&mut self, grads: &Gradients, learning_rate: f32) {
        if grads.samples == 0 {
            return;
        }
        let step = learning_rate / grads.samples as f32;

        for (w, g) in self.weights.iter_mut().zip(&grads.weights) {
            *w -= step * g;
        }
        for (b, g) in self.biases.iter_mut().zip(&grads.biases) {
            *b -= step * g;
        }
        for (&token, row) in &grads.embeddings {
            let start = token * self.embed_dim;
            for (e, g) in self.embeddings[start..start + self.embed_dim].iter_mut().zip(row) {
                *e -= step * g;
            }
        }
    }

    /// 平均損失と正解率
    pub fn evaluate(&self, sequences: &[Vec<usize>], labels: &[Sentiment]) -> (f32, f32) {
        if sequences.is_empty() {
            return (0.0, 0.0);
        }
        let mut loss = 0.0;
        let mut correct = 0;
        for (seq, &label) in sequences.iter().zip(labels) {
            let probs = self.predict_proba(seq);
            loss -= probs[label.code() as usize].max(LOG_EPSILON).ln();
            if argmax(&probs).0 == label {
                correct += 1;
            }
        }
        let n = sequences.len() as f32;
        (loss / n, correct as f32 / n)
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.trained_at = chrono::Local::now().to_rfc3339();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SentimentError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let model: SentimentModel = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(SentimentError::Model(format!(
                "未対応のモデル形式です: version {}",
                self.version
            )));
        }
        let shapes_ok = self.embeddings.len() == self.vocab_size * self.embed_dim
            && self.weights.len() == NUM_CLASSES * self.embed_dim
            && self.biases.len() == NUM_CLASSES;
        if !shapes_ok {
            return Err(SentimentError::Model("重み配列の長さが一致しません".into()));
        }
        Ok(())
    }
}

impl Gradients {
    fn ensure_shape(&mut self, model: &SentimentModel) {
        if self.weights.len() != model.weights.len() {
            self.weights = vec![0.0; model.weights.len()];
            self.biases = vec![0.0; NUM_CLASSES];
        }
    }

    pub fn clear(&mut self) {
        self.embeddings.clear();
        self.weights.fill(0.0);
        self.biases.fill(0.0);
        self.samples = 0;
    }
}

pub fn softmax(logits: [f32; NUM_CLASSES]) -> [f32; NUM_CLASSES] {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut out = logits.map(|l| (l - max).exp());
    let sum: f32 = out.iter().sum();
    out.iter_mut().for_each(|p| *p /= sum);
    out
}

/// 最大確率のラベル（同率はコードの小さい方）
pub fn argmax(probs: &[f32; NUM_CLASSES]) -> (Sentiment, f32) {
    let mut best = 0;
    for k in 1..NUM_CLASSES {
        if probs[k] > probs[best] {
            best = k;
        }
    }
    let label = Sentiment::from_code(best as u32).unwrap_or(Sentiment::Neutral);
    (label, probs[best])
}
