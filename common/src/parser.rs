//! LLMレスポンスパーサー
//!
//! 補完APIの自由文レスポンスから数値ラベルを取り出す。
//! 位置依存のため、レビュー本文の数字がエコーされるとずれる点に注意。

/// レスポンスから数値トークンを抽出し、要求件数ちょうどに揃える
///
/// - `,` は空白として扱う
/// - ASCII数字のみのトークンを採用（`1.` のような番号は無視）
/// - 不足分は `None` で埋め、超過分は切り捨て
///
/// # Examples
/// ```
/// use review_sentiment_common::parse_label_response;
///
/// let labels = parse_label_response("2, 0\n1", 4);
/// assert_eq!(labels, vec![Some(2), Some(0), Some(1), None]);
/// ```
pub fn parse_label_response(text: &str, expected: usize) -> Vec<Option<u32>> {
    let mut values: Vec<Option<u32>> = text
        .replace(',', " ")
        .split_whitespace()
        .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
        .map(|t| t.parse::<u32>().ok())
        .collect();

    values.resize(expected, None);
    values
}
