//! 単語トークナイザ
//!
//! 空白区切りの単語を固定語彙の整数列に変換する。
//! - インデックス0はパディング、1は未知語（OOV）
//! - 2以降は出現頻度の降順（同数は初出順）
//! - `num_words` 以上のインデックスは未知語扱い

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// パディング用インデックス
pub const PAD_INDEX: usize = 0;

/// 未知語インデックス
pub const OOV_INDEX: usize = 1;

/// 単語分割時に区切りとして扱う記号
const FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// 保存形式
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenizerFile {
    num_words: usize,
    oov_token: String,
    /// 頻度順の語彙（先頭がインデックス2）
    words: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TokenizerFile", into = "TokenizerFile")]
pub struct Tokenizer {
    num_words: usize,
    oov_token: String,
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<TokenizerFile> for Tokenizer {
    fn from(file: TokenizerFile) -> Self {
        let mut tokenizer = Tokenizer {
            num_words: file.num_words,
            oov_token: file.oov_token,
            words: file.words,
            index: HashMap::new(),
        };
        tokenizer.rebuild_index();
        tokenizer
    }
}

impl From<Tokenizer> for TokenizerFile {
    fn from(t: Tokenizer) -> Self {
        TokenizerFile {
            num_words: t.num_words,
            oov_token: t.oov_token,
            words: t.words,
        }
    }
}

/// テキストを単語列に分割
pub fn split_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || FILTERS.contains(c))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl Tokenizer {
    pub fn new(num_words: usize, oov_token: &str) -> Self {
        Self {
            num_words,
            oov_token: oov_token.to_string(),
            words: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// コーパスから語彙を構築（既存の語彙は置き換え）
    pub fn fit_on_texts<S: AsRef<str>>(&mut self, texts: &[S]) {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();

        for text in texts {
            for word in split_words(text.as_ref()) {
                match counts.get_mut(&word) {
                    Some(c) => *c += 1,
                    None => {
                        counts.insert(word.clone(), 1);
                        order.push(word);
                    }
                }
            }
        }

        // 安定ソートなので同数は初出順のまま
        let mut ranked: Vec<(String, usize)> = order
            .into_iter()
            .map(|w| {
                let c = counts[&w];
                (w, c)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        self.words = ranked.into_iter().map(|(w, _)| w).collect();
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i + 2))
            .collect();
    }

    /// 単語のインデックス（語彙外は `None`）
    pub fn word_index(&self, word: &str) -> Option<usize> {
        if word == self.oov_token {
            return Some(OOV_INDEX);
        }
        self.index.get(word).copied()
    }

    pub fn text_to_sequence(&self, text: &str) -> Vec<usize> {
        split_words(text)
            .iter()
            .map(|w| match self.word_index(w) {
                Some(i) if i < self.num_words => i,
                _ => OOV_INDEX,
            })
            .collect()
    }

    pub fn texts_to_sequences<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Vec<usize>> {
        texts.iter().map(|t| self.text_to_sequence(t.as_ref())).collect()
    }

    pub fn num_words(&self) -> usize {
        self.num_words
    }

    /// 学習済み語彙数（OOVを除く）
    pub fn vocab_len(&self) -> usize {
        self.words.len()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let tokenizer: Tokenizer = serde_json::from_str(&content)?;
        if tokenizer.num_words <= OOV_INDEX {
            return Err(Error::Tokenizer(format!(
                "num_wordsが小さすぎます: {}",
                tokenizer.num_words
            )));
        }
        Ok(tokenizer)
    }
}

/// 固定長にそろえる
///
/// 不足分は末尾を0で埋め、超過分は先頭側を落として末尾 `max_len` 件を残す。
pub fn pad_sequences(sequences: &[Vec<usize>], max_len: usize) -> Vec<Vec<usize>> {
    sequences
        .iter()
        .map(|seq| {
            let start = seq.len().saturating_sub(max_len);
            let mut padded = seq[start..].to_vec();
            padded.resize(max_len, PAD_INDEX);
            padded
        })
        .collect()
}
