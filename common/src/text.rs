//! テキスト前処理
//!
//! 学習とダッシュボードで同じ正規化を使う。

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// 許可文字（ハングル字母・音節、英数字、半角スペース）以外
    static ref DISALLOWED: Regex = Regex::new(r"[^ㄱ-ㅎㅏ-ㅣ가-힣A-Za-z0-9 ]").unwrap();
}

/// レビュー本文を正規化
///
/// 許可文字以外を除去してから小文字化し、前後の空白を落とす。
pub fn clean_text(s: &str) -> String {
    DISALLOWED.replace_all(s, "").to_lowercase().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_allowed_char(c: char) -> bool {
        matches!(c,
            'ㄱ'..='ㅎ' | 'ㅏ'..='ㅣ' | '가'..='힣' | 'A'..='Z' | 'a'..='z' | '0'..='9' | ' ')
    }

    #[test]
    fn test_clean_text_basic() {
        assert_eq!(clean_text("  최고의 게임!!! 10/10  "), "최고의 게임 1010");
    }

    #[test]
    fn test_clean_text_lowercases_ascii() {
        assert_eq!(clean_text("GOOD Game"), "good game");
    }

    #[test]
    fn test_clean_text_strips_emoji_and_symbols() {
        assert_eq!(clean_text("👍 갓겜 ㅋㅋㅋ ^^ ♥"), "갓겜 ㅋㅋㅋ");
    }

    #[test]
    fn test_clean_text_removes_newlines_and_tabs() {
        assert_eq!(clean_text("재밌다\n정말\t재밌다"), "재밌다정말재밌다");
    }

    #[test]
    fn test_clean_text_strips_other_scripts() {
        assert_eq!(clean_text("ゲーム 游戏 game"), "game");
    }

    #[test]
    fn test_clean_text_output_only_allowed_chars() {
        let inputs = [
            "¡Hola! ¿Qué tal? 게임 ㅠㅠ",
            "ＦＵＬＬ　ＷＩＤＴＨ ａｂｃ 123",
            "Ünïcödé — “quotes” ‘single’",
            "ㄱㄴㄷ ㅏㅑㅓ 가나다 힣",
        ];
        for input in inputs {
            let cleaned = clean_text(input);
            assert!(
                cleaned.chars().all(is_allowed_char),
                "許可外の文字が残っている: {:?}",
                cleaned
            );
        }
    }

    #[test]
    fn test_clean_text_keeps_jamo_ranges() {
        assert_eq!(clean_text("ㄱㅎㅏㅣ가힣"), "ㄱㅎㅏㅣ가힣");
    }
}
