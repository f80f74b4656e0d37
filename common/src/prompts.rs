//! プロンプト生成モジュール
//!
//! LLMへ送る感情分類プロンプトを組み立てる。
//! 応答は番号付きの数字列を想定（parser.rs 参照）。

/// プロンプトのヘッダ（ラベル定義と出力形式）
pub const BATCH_PROMPT_HEADER: &str = "아래 리뷰 목록의 감정을 분류합니다. 가능한 값: 0(부정), 1(중립), 2(긍정)\n\
형식: 숫자만, 각 리뷰 앞에 번호와 함께 나열하세요.\n";

/// 応答の書き出し位置
pub const BATCH_PROMPT_ANSWER: &str = "답:";

/// バッチ分類プロンプト生成
///
/// # Arguments
/// * `reviews` - 分類対象のレビュー本文（1始まりの番号を付けて列挙）
pub fn build_batch_prompt<S: AsRef<str>>(reviews: &[S]) -> String {
    let mut prompt = String::from(BATCH_PROMPT_HEADER);
    for (i, review) in reviews.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, review.as_ref()));
    }
    prompt.push_str(BATCH_PROMPT_ANSWER);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_batch_prompt() {
        let prompt = build_batch_prompt(&["최고의 게임", "별로에요"]);
        assert!(prompt.starts_with("아래 리뷰 목록의 감정을 분류합니다."));
        assert!(prompt.contains("0(부정), 1(중립), 2(긍정)"));
        assert!(prompt.contains("1. 최고의 게임\n2. 별로에요\n"));
        assert!(prompt.ends_with("답:"));
    }

    #[test]
    fn test_build_batch_prompt_empty() {
        let empty: [&str; 0] = [];
        let prompt = build_batch_prompt(&empty);
        assert_eq!(prompt, format!("{}{}", BATCH_PROMPT_HEADER, BATCH_PROMPT_ANSWER));
    }
}
