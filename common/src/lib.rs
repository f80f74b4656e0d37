//! Review Sentiment Common Library
//!
//! CLIとダッシュボードで共有される型とユーティリティ

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;
pub mod text;
pub mod tokenizer;
pub mod export;

pub use types::{ReviewRecord, Sentiment};
pub use error::{Error, Result};
pub use parser::parse_label_response;
pub use prompts::build_batch_prompt;
pub use text::clean_text;
pub use tokenizer::{pad_sequences, Tokenizer, OOV_INDEX, PAD_INDEX};
