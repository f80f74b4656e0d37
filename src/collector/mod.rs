//! レビュー収集モジュール
//!
//! タイトルごとにappIDを解決し、カーソルページングでレビューを集める。
//! ネットワーク失敗は「結果なし」として扱い、次のタイトル／ページへ進む。

mod steam;
mod types;

pub use steam::{app_id_from_href, app_id_from_search_html, search_url, SteamStore};
pub use types::{FeedPage, FeedReview};

use crate::error::Result;
use review_sentiment_common::{ReviewRecord, Sentiment};
use std::collections::HashSet;
use std::time::Duration;

/// 最初のページを示すカーソル
pub const INITIAL_CURSOR: &str = "*";

/// 連続でこの回数だけ空ページが返ったら打ち切る
const MAX_EMPTY_STREAK: usize = 2;

/// レビュー取得元
#[allow(async_fn_in_trait)]
pub trait ReviewFeed {
    async fn search_html(&self, game: &str) -> Result<String>;
    async fn review_page(&self, app_id: u64, cursor: &str) -> Result<FeedPage>;
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub total_target: usize,
    pub max_pages: usize,
    /// ページ取得間の待ち時間
    pub page_delay: Duration,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            total_target: 50_000,
            max_pages: 50,
            page_delay: Duration::from_millis(200),
        }
    }
}

/// 残り目標件数を残りタイトル数で割った件数（切り上げ）
pub fn per_game_quota(remaining_target: usize, games_left: usize) -> usize {
    if games_left == 0 {
        return remaining_target;
    }
    remaining_target.div_ceil(games_left)
}

/// タイトル名からappIDを解決（失敗時は None）
pub async fn resolve_app_id<F: ReviewFeed>(feed: &F, game: &str) -> Option<u64> {
    match feed.search_html(game).await {
        Ok(html) => app_id_from_search_html(&html),
        Err(e) => {
            tracing::warn!(game, error = %e, "store search failed");
            None
        }
    }
}

/// 1タイトル分のレビューを取得
///
/// - IDで重複除去、本文が空のものは捨てる
/// - 取得失敗・カーソル終端・空ページ連続で終了
pub async fn fetch_reviews<F: ReviewFeed>(
    feed: &F,
    app_id: u64,
    max_reviews: usize,
    options: &CollectOptions,
) -> Vec<ReviewRecord> {
    let mut reviews: Vec<ReviewRecord> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut cursor = INITIAL_CURSOR.to_string();
    let mut page_count = 0;
    let mut empty_streak = 0;

    while reviews.len() < max_reviews && page_count < options.max_pages {
        page_count += 1;

        let page = match feed.review_page(app_id, &cursor).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(app_id, page = page_count, error = %e, "review page failed");
                break;
            }
        };

        if page.reviews.is_empty() {
            empty_streak += 1;
            if empty_streak >= MAX_EMPTY_STREAK {
                break;
            }
            continue;
        }
        empty_streak = 0;

        for rev in &page.reviews {
            let Some(review_id) = rev.id() else { continue };
            if seen_ids.contains(&review_id) {
                continue;
            }
            let Some(text) = rev.text() else { continue };

            let voted_up = rev.voted_up.unwrap_or(false);
            seen_ids.insert(review_id.clone());
            reviews.push(ReviewRecord {
                review_id,
                review: text.to_string(),
                voted_up: Some(voted_up),
                label: Some(Sentiment::from_voted_up(voted_up)),
                ..Default::default()
            });

            if reviews.len() >= max_reviews {
                break;
            }
        }

        tracing::debug!(app_id, page = page_count, collected = reviews.len(), "review page");

        match page.cursor {
            Some(next) if !next.is_empty() => cursor = next,
            _ => break,
        }

        if !options.page_delay.is_zero() {
            tokio::time::sleep(options.page_delay).await;
        }
    }

    reviews
}

/// 全タイトルを順に収集
pub async fn collect_reviews<F: ReviewFeed>(
    feed: &F,
    games: &[String],
    options: &CollectOptions,
) -> Vec<ReviewRecord> {
    let mut all_rows = Vec::new();
    let mut total_loaded = 0;

    for (i, game) in games.iter().enumerate() {
        let remaining_target = options.total_target.saturating_sub(total_loaded);
        if remaining_target == 0 {
            break;
        }

        let quota = per_game_quota(remaining_target, games.len() - i);
        let Some(app_id) = resolve_app_id(feed, game).await else {
            println!("⚠ appIDが見つかりません: \"{}\"", game);
            continue;
        };

        let mut fetched = fetch_reviews(feed, app_id, quota, options).await;
        for row in &mut fetched {
            row.game = game.clone();
        }
        total_loaded += fetched.len();
        println!("  {}: {}件取得 (累計 {}件)", game, fetched.len(), total_loaded);
        all_rows.extend(fetched);
    }

    all_rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_game_quota() {
        assert_eq!(per_game_quota(50_000, 23), 2174);
        assert_eq!(per_game_quota(10, 3), 4);
        assert_eq!(per_game_quota(9, 3), 3);
        assert_eq!(per_game_quota(5, 0), 5);
    }
}
