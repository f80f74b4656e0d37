//! Excel生成（共通ライブラリ）
//!
//! 採点済みレビュー表を1シートのワークブックに書き出す

use crate::types::Sentiment;
use rust_xlsxwriter::*;

/// 出力列（見出し, 列幅）
pub const EXPORT_COLUMNS: &[(&str, f64)] = &[
    ("game", 24.0),
    ("review_id", 14.0),
    ("review", 80.0),
    ("label", 8.0),
    ("pred", 8.0),
    ("confidence", 11.0),
    ("model_used", 16.0),
];

/// 採点済みレビューのトレイト（異なる行型に対応）
pub trait ScoredReview {
    fn game(&self) -> &str;
    fn review_id(&self) -> &str;
    fn review(&self) -> &str;
    fn label(&self) -> Option<Sentiment>;
    fn pred(&self) -> Option<Sentiment>;
    fn confidence(&self) -> Option<f32>;
    fn model_used(&self) -> &str;
}

/// Excelをバッファに生成
///
/// ラベル列は表示名（부정/중립/긍정）、信頼度は小数3桁で出力
pub fn generate_excel_buffer<T: ScoredReview>(rows: &[T], sheet_name: &str) -> Result<Vec<u8>, String> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin)
        .set_border_color(Color::RGB(0xAAAAAA));

    let text_format = Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::Top);

    let number_format = Format::new()
        .set_num_format("0.000")
        .set_align(FormatAlign::Top);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)
        .map_err(|e| format!("シート名設定エラー: {}", e))?;

    for (col, (title, width)) in EXPORT_COLUMNS.iter().enumerate() {
        let col = col as u16;
        worksheet.set_column_width(col, *width)
            .map_err(|e| format!("列幅設定エラー: {}", e))?;
        worksheet.write_string_with_format(0, col, *title, &header_format)
            .map_err(|e| format!("見出し書き込みエラー: {}", e))?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        let label = row.label().map(|s| s.name()).unwrap_or("");
        let pred = row.pred().map(|s| s.name()).unwrap_or("");

        let cells = [
            (0u16, row.game()),
            (1, row.review_id()),
            (2, row.review()),
            (3, label),
            (4, pred),
            (6, row.model_used()),
        ];
        for (col, value) in cells {
            worksheet.write_string_with_format(r, col, value, &text_format)
                .map_err(|e| format!("値書き込みエラー: {}", e))?;
        }

        if let Some(conf) = row.confidence() {
            worksheet.write_number_with_format(r, 5, conf as f64, &number_format)
                .map_err(|e| format!("数値書き込みエラー: {}", e))?;
        }
    }

    worksheet.set_freeze_panes(1, 0)
        .map_err(|e| format!("ウィンドウ枠固定エラー: {}", e))?;

    workbook.save_to_buffer()
        .map_err(|e| format!("Excel保存エラー: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        review: String,
        label: Option<Sentiment>,
        pred: Option<Sentiment>,
        confidence: Option<f32>,
    }

    impl ScoredReview for Row {
        fn game(&self) -> &str { "Hades" }
        fn review_id(&self) -> &str { "1" }
        fn review(&self) -> &str { &self.review }
        fn label(&self) -> Option<Sentiment> { self.label }
        fn pred(&self) -> Option<Sentiment> { self.pred }
        fn confidence(&self) -> Option<f32> { self.confidence }
        fn model_used(&self) -> &str { "" }
    }

    #[test]
    fn test_generate_excel_buffer() {
        let rows = vec![
            Row { review: "재밌다".into(), label: Some(Sentiment::Positive), pred: Some(Sentiment::Positive), confidence: Some(0.91) },
            Row { review: "별로".into(), label: None, pred: Some(Sentiment::Negative), confidence: None },
        ];
        let buffer = generate_excel_buffer(&rows, "reviews").expect("Excel生成失敗");
        // xlsxはZIPコンテナ
        assert!(buffer.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_excel_buffer_empty() {
        let rows: Vec<Row> = Vec::new();
        let buffer = generate_excel_buffer(&rows, "empty").expect("Excel生成失敗");
        assert!(!buffer.is_empty());
    }
}
