//! 表ファイルモジュール
//!
//! ステージ間の受け渡しはすべて表ファイル（BOM付きUTF-8のCSV）で行う。
//! 読み込み→変更→全体書き戻し、の単純なモデル。
//! 各ステージが知らない列もそのまま保持する。

mod xlsx;

use crate::error::{Result, SentimentError};
use review_sentiment_common::{ReviewRecord, Sentiment};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 収集直後の列構成
pub const RAW_COLUMNS: &[&str] = &["game", "review_id", "review", "voted_up", "label"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 拡張子で読み込み方法を切り替え（.xlsx/.xls/.ods はExcel、それ以外はCSV）
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SentimentError::FileNotFound(path.display().to_string()));
        }

        if is_spreadsheet(path) {
            xlsx::read_first_sheet(path)
        } else {
            Self::read_csv(path)
        }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Table::new(headers);

        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        Ok(table)
    }

    /// BOM付きCSVで保存（親ディレクトリも作成）
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(UTF8_BOM)?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str, table_name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| SentimentError::MissingColumn {
            column: name.to_string(),
            table: table_name.to_string(),
        })
    }

    /// 列がなければ空列として末尾に追加
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    pub fn get(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(r) = self.rows.get_mut(row) {
            if r.len() <= col {
                r.resize(col + 1, String::new());
            }
            r[col] = value.into();
        }
    }

    /// 列数に合わせて切り詰め／空セル補完して追加
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn rename_columns<F: Fn(&str) -> Option<String>>(&mut self, rename: F) {
        for header in &mut self.headers {
            if let Some(new_name) = rename(header) {
                *header = new_name;
            }
        }
    }

    /// 同名列は先頭だけ残す
    pub fn drop_duplicate_columns(&mut self) {
        let mut keep = Vec::with_capacity(self.headers.len());
        let mut seen = std::collections::HashSet::new();
        for h in &self.headers {
            keep.push(seen.insert(h.clone()));
        }
        if keep.iter().all(|&k| k) {
            return;
        }

        let filter = |cells: &Vec<String>| -> Vec<String> {
            cells
                .iter()
                .zip(&keep)
                .filter(|(_, k)| **k)
                .map(|(c, _)| c.clone())
                .collect()
        };
        self.headers = filter(&self.headers);
        self.rows = self.rows.iter().map(filter).collect();
    }

    pub fn retain_rows<F: FnMut(&[String]) -> bool>(&mut self, mut keep: F) {
        self.rows.retain(|row| keep(row));
    }

    /// 縦結合（列は初出順の和集合、欠けたセルは空）
    pub fn concat(tables: &[Table]) -> Table {
        let mut merged = Table::default();
        for table in tables {
            for h in &table.headers {
                merged.ensure_column(h);
            }
        }

        for table in tables {
            let mapping: Vec<usize> = table
                .headers
                .iter()
                .map(|h| merged.column(h).unwrap_or(0))
                .collect();
            for row in &table.rows {
                let mut out = vec![String::new(); merged.headers.len()];
                for (cell, &target) in row.iter().zip(&mapping) {
                    out[target] = cell.clone();
                }
                merged.rows.push(out);
            }
        }
        merged
    }

    pub fn from_records(records: &[ReviewRecord], columns: &[&str]) -> Table {
        let mut table = Table::new(columns.iter().copied());
        for record in records {
            table.push_row(columns.iter().map(|c| record_cell(record, c)).collect());
        }
        table
    }
}

fn record_cell(record: &ReviewRecord, column: &str) -> String {
    match column {
        "game" => record.game.clone(),
        "review_id" => record.review_id.clone(),
        "review" => record.review.clone(),
        "voted_up" => record.voted_up.map(|b| b.to_string()).unwrap_or_default(),
        "label" => label_cell(record.label),
        _ => String::new(),
    }
}

/// ラベルのセル表現（整数コード、未設定は空）
pub fn label_cell(label: Option<Sentiment>) -> String {
    label.map(|s| s.code().to_string()).unwrap_or_default()
}

pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "xlsx" | "xlsm" | "xls" | "ods"))
        .unwrap_or(false)
}

pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Table {
        let mut t = Table::new(["review", "label"]);
        t.push_row(vec!["좋아요".into(), "2".into()]);
        t.push_row(vec!["별로, 정말 \"별로\"".into(), "".into()]);
        t
    }

    #[test]
    fn test_csv_written_with_bom_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("t.csv");
        sample().write_csv(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let loaded = Table::read(&path).unwrap();
        assert_eq!(loaded.headers(), &["review".to_string(), "label".to_string()]);
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_read_csv_without_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.csv");
        std::fs::write(&path, "review,label\n재밌다,2\n").unwrap();

        let t = Table::read(&path).unwrap();
        assert_eq!(t.column("review"), Some(0));
        assert_eq!(t.get(0, 1), "2");
    }

    #[test]
    fn test_read_missing_file() {
        let result = Table::read(Path::new("/nonexistent/table.csv"));
        assert!(matches!(result, Err(SentimentError::FileNotFound(_))));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b,c\n1\n1,2,3,4\n").unwrap();

        let t = Table::read(&path).unwrap();
        assert_eq!(t.rows()[0], vec!["1", "", ""]);
        assert_eq!(t.rows()[1].len(), 3);
    }

    #[test]
    fn test_ensure_column() {
        let mut t = sample();
        let idx = t.ensure_column("model_used");
        assert_eq!(idx, 2);
        assert_eq!(t.get(1, idx), "");
        assert_eq!(t.ensure_column("label"), 1);
    }

    #[test]
    fn test_drop_duplicate_columns_keeps_first() {
        let mut t = Table::new(["review", "review", "game"]);
        t.push_row(vec!["first".into(), "second".into(), "g".into()]);
        t.drop_duplicate_columns();
        assert_eq!(t.headers().len(), 2);
        assert_eq!(t.get(0, 0), "first");
        assert_eq!(t.get(0, 1), "g");
    }

    #[test]
    fn test_concat_union_columns() {
        let mut a = Table::new(["review", "label"]);
        a.push_row(vec!["a".into(), "1".into()]);
        let mut b = Table::new(["game", "review"]);
        b.push_row(vec!["Hades".into(), "b".into()]);

        let merged = Table::concat(&[a, b]);
        assert_eq!(merged.headers(), &["review", "label", "game"]);
        assert_eq!(merged.rows()[1], vec!["b", "", "Hades"]);
    }

    #[test]
    fn test_from_records_raw_columns() {
        let records = vec![ReviewRecord {
            game: "Valheim".into(),
            review_id: "42".into(),
            review: "갓겜".into(),
            voted_up: Some(true),
            label: Some(Sentiment::Positive),
            confidence: None,
            model_used: None,
        }];

        let table = Table::from_records(&records, RAW_COLUMNS);
        assert_eq!(table.headers(), RAW_COLUMNS);
        assert_eq!(table.rows()[0], vec!["Valheim", "42", "갓겜", "true", "2"]);
    }

    #[test]
    fn test_extension_checks() {
        assert!(is_csv(Path::new("a/B.CSV")));
        assert!(is_spreadsheet(Path::new("reviews.xlsx")));
        assert!(!is_spreadsheet(Path::new("reviews.csv")));
    }
}
