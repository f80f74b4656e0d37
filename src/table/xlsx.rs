//! Excel読み込み（先頭シート、1行目を見出しとして扱う）

use super::Table;
use crate::error::{Result, SentimentError};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

pub fn read_first_sheet(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SentimentError::Excel(format!("{}: {}", path.display(), e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SentimentError::Excel(format!("シートがありません: {}", path.display())))?
        .map_err(|e| SentimentError::Excel(format!("{}: {}", path.display(), e)))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(cell_to_string).collect());
    }
    Ok(table)
}

/// セル値を文字列化（整数値の浮動小数は小数点なしで）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
