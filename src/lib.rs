//! ゲームレビュー感情分析パイプライン
//!
//! 収集 → マージ → LLMラベル付け → 学習 → ダッシュボード

pub mod cli;
pub mod collector;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod labeler;
pub mod merger;
pub mod table;
pub mod trainer;
