//! レビュー表マージモジュール
//!
//! フォルダ内の表を読み、列名を共通スキーマ（review / review_id / label / game）に
//! そろえて縦結合し、重複を除去する。

use crate::error::{Result, SentimentError};
use crate::table::{is_csv, is_spreadsheet, Table};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 本文列とみなすキーワード
const TEXT_KEYWORDS: &[&str] = &["review", "리뷰", "comment", "content", "text"];

/// フォルダ直下の表ファイル（.csv / .xlsx 等）をファイル名順で列挙
pub fn list_tables(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(SentimentError::FolderNotFound(folder.display().to_string()));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && (is_csv(p) || is_spreadsheet(p)))
        .collect();

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// 列名を共通スキーマ名に対応付け（該当なしは None）
///
/// 判定順: ID → 本文 → ラベル → ゲーム名。
/// `review_id` が本文列に吸われないようIDを先に判定する。
pub fn canonical_column(name: &str) -> Option<&'static str> {
    let lc = name.trim().to_lowercase();

    if lc == "id" || (lc.contains("id") && (lc.contains("review") || lc.contains("리뷰"))) {
        Some("review_id")
    } else if TEXT_KEYWORDS.iter().any(|k| lc.contains(k)) {
        Some("review")
    } else if lc.contains("label") || lc.contains("sentiment") {
        Some("label")
    } else if lc.contains("game") || lc.contains("site") {
        Some("game")
    } else {
        None
    }
}

/// 列名の正規化（前後で重複列を除去、先頭優先）
pub fn normalize_columns(table: &mut Table) {
    table.drop_duplicate_columns();
    table.rename_columns(|name| canonical_column(name).map(str::to_string));
    table.drop_duplicate_columns();
}

/// 重複除去（先頭優先、順序は維持）
///
/// review_id 列があればIDで、IDが空の行は本文で判定する。
/// review_id 列がなければ本文で判定する。
pub fn dedup(table: &mut Table) -> Result<usize> {
    let id_col = table.column("review_id");
    let text_col = table.column("review");

    if id_col.is_none() && text_col.is_none() {
        return Err(SentimentError::MissingColumn {
            column: "review".into(),
            table: "merged".into(),
        });
    }

    let before = table.len();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_texts: HashSet<String> = HashSet::new();

    table.retain_rows(|row| {
        let cell = |c: Option<usize>| c.and_then(|c| row.get(c)).map(|s| s.trim()).unwrap_or("");
        let id = cell(id_col);
        if !id.is_empty() {
            return seen_ids.insert(id.to_string());
        }
        seen_texts.insert(cell(text_col).to_string())
    });

    Ok(before - table.len())
}

/// 読み込み済みの表をマージ
pub fn merge_tables(mut tables: Vec<Table>) -> Result<Table> {
    for table in &mut tables {
        normalize_columns(table);
    }

    let mut merged = Table::concat(&tables);
    let removed = dedup(&mut merged)?;
    tracing::debug!(rows = merged.len(), removed, "merged tables");
    Ok(merged)
}

/// フォルダ内の表をマージして保存
pub fn merge_folder(folder: &Path, output: &Path) -> Result<Table> {
    let paths = list_tables(folder)?;
    if paths.is_empty() {
        return Err(SentimentError::NoTablesFound(folder.display().to_string()));
    }

    let mut tables = Vec::with_capacity(paths.len());
    for path in &paths {
        let table = Table::read(path)?;
        println!("  - {} ({}行)", path.display(), table.len());
        tables.push(table);
    }

    let merged = merge_tables(tables)?;
    merged.write_csv(output)?;
    Ok(merged)
}
