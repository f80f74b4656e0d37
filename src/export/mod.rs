//! 採点結果のExcel出力

use crate::dashboard::score_table;
use crate::error::{Result, SentimentError};
use crate::table::Table;
use crate::trainer::Predictor;
use review_sentiment_common::export::excel_core::{generate_excel_buffer, ScoredReview};
use std::path::{Path, PathBuf};

pub const SHEET_NAME: &str = "reviews";

/// 出力先がフォルダか拡張子なしならファイル名を補う
pub fn output_path_for(output: &Path, stem: &str) -> PathBuf {
    if output.is_dir() || output.extension().is_none() {
        output.join(format!("{}.xlsx", stem))
    } else {
        output.to_path_buf()
    }
}

pub fn write_excel<T: ScoredReview>(rows: &[T], output_path: &Path) -> Result<()> {
    let buffer = generate_excel_buffer(rows, SHEET_NAME).map_err(SentimentError::ExcelGeneration)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    Ok(())
}

/// 表を採点してExcelに書き出す（出力した行数を返す）
pub fn export_table(input: &Path, model_dir: &Path, output: &Path) -> Result<(PathBuf, usize)> {
    let table = Table::read(input)?;
    let predictor = Predictor::load(model_dir)?;
    let rows = score_table(&table, &predictor)?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("reviews");
    let output_path = output_path_for(output, stem);

    println!("- Excelを生成中... ({}行)", rows.len());
    write_excel(&rows, &output_path)?;
    Ok((output_path, rows.len()))
}
