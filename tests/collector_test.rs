//! レビュー収集テスト
//!
//! ネットワークの代わりに固定応答のフィードで、ページング・重複除去・打ち切り条件を検証

use review_sentiment::collector::{self, CollectOptions, FeedPage, ReviewFeed};
use review_sentiment::error::{Result, SentimentError};
use review_sentiment_common::Sentiment;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct FakeFeed {
    /// タイトル → 検索結果HTML
    search: HashMap<String, String>,
    /// (appID, カーソル) → ページ
    pages: HashMap<(u64, String), FeedPage>,
    /// 取得したカーソルの履歴
    requested: Mutex<Vec<(u64, String)>>,
}

impl FakeFeed {
    fn with_game(mut self, game: &str, app_id: u64) -> Self {
        let html = format!(
            r#"<div id="search_resultsRows"><a href="https://store.steampowered.com/app/{}/x/">{}</a></div>"#,
            app_id, game
        );
        self.search.insert(game.to_string(), html);
        self
    }

    fn with_page(mut self, app_id: u64, cursor: &str, page: serde_json::Value) -> Self {
        let page: FeedPage = serde_json::from_value(page).expect("ページJSONの変換失敗");
        self.pages.insert((app_id, cursor.to_string()), page);
        self
    }

    fn requested(&self) -> Vec<(u64, String)> {
        self.requested.lock().unwrap().clone()
    }
}

impl ReviewFeed for FakeFeed {
    async fn search_html(&self, game: &str) -> Result<String> {
        self.search
            .get(game)
            .cloned()
            .ok_or_else(|| SentimentError::ApiCall(format!("search failed: {}", game)))
    }

    async fn review_page(&self, app_id: u64, cursor: &str) -> Result<FeedPage> {
        self.requested.lock().unwrap().push((app_id, cursor.to_string()));
        self.pages
            .get(&(app_id, cursor.to_string()))
            .cloned()
            .ok_or_else(|| SentimentError::ApiCall("connection reset".into()))
    }
}

fn options(total_target: usize) -> CollectOptions {
    CollectOptions {
        total_target,
        max_pages: 50,
        page_delay: Duration::ZERO,
    }
}

fn review(id: serde_json::Value, text: &str, voted_up: bool) -> serde_json::Value {
    json!({ "recommendationid": id, "review": text, "voted_up": voted_up })
}

/// カーソルをたどり、重複IDと空本文を除外する
#[tokio::test]
async fn test_fetch_follows_cursor_and_dedups() {
    let feed = FakeFeed::default()
        .with_page(10, "*", json!({
            "success": 1,
            "cursor": "AAA",
            "reviews": [
                review(json!("1"), "재밌어요", true),
                review(json!("2"), "   ", true),
                review(json!(3), "별로에요", false),
            ]
        }))
        .with_page(10, "AAA", json!({
            "cursor": "",
            "reviews": [
                review(json!("1"), "중복", true),
                { "reviewid": 4, "review": " 그럭저럭 " },
            ]
        }));

    let rows = collector::fetch_reviews(&feed, 10, 100, &options(100)).await;

    let ids: Vec<&str> = rows.iter().map(|r| r.review_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3", "4"]);
    assert_eq!(rows[2].review, "그럭저럭");
    // voted_up 欠落は false → 부정
    assert_eq!(rows[2].voted_up, Some(false));
    assert_eq!(rows[2].label, Some(Sentiment::Negative));
    assert_eq!(rows[0].label, Some(Sentiment::Positive));
    assert_eq!(feed.requested().len(), 2);
}

/// 上限件数に達したら途中で止まる
#[tokio::test]
async fn test_fetch_stops_at_max_reviews() {
    let feed = FakeFeed::default().with_page(10, "*", json!({
        "cursor": "NEXT",
        "reviews": [
            review(json!("1"), "a", true),
            review(json!("2"), "b", true),
            review(json!("3"), "c", true),
        ]
    }));

    let rows = collector::fetch_reviews(&feed, 10, 2, &options(100)).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(feed.requested().len(), 1);
}

/// 空ページが2回続いたら終了（カーソルは進めない）
#[tokio::test]
async fn test_fetch_stops_after_two_empty_pages() {
    let feed = FakeFeed::default().with_page(10, "*", json!({ "cursor": "NEXT", "reviews": [] }));

    let rows = collector::fetch_reviews(&feed, 10, 100, &options(100)).await;
    assert!(rows.is_empty());
    assert_eq!(
        feed.requested(),
        vec![(10, "*".to_string()), (10, "*".to_string())]
    );
}

/// 取得失敗はそこまでの結果を返す
#[tokio::test]
async fn test_fetch_keeps_rows_on_failure() {
    let feed = FakeFeed::default().with_page(10, "*", json!({
        "cursor": "BROKEN",
        "reviews": [review(json!("1"), "좋음", true)]
    }));

    let rows = collector::fetch_reviews(&feed, 10, 100, &options(100)).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(feed.requested().len(), 2);
}

/// タイトルごとの割り当てとappID解決失敗のスキップ
#[tokio::test]
async fn test_collect_reviews_quota_and_skip() {
    let many: Vec<serde_json::Value> = (0..5)
        .map(|i| review(json!(i + 1), &format!("리뷰{}", i), i % 2 == 0))
        .collect();

    let feed = FakeFeed::default()
        .with_game("Hades", 1145360)
        .with_game("Valheim", 892970)
        .with_page(1145360, "*", json!({ "cursor": "", "reviews": many.clone() }))
        .with_page(892970, "*", json!({ "cursor": "", "reviews": many }));

    let games = vec![
        "Hades".to_string(),
        "Unknown Game".to_string(),
        "Valheim".to_string(),
    ];
    let rows = collector::collect_reviews(&feed, &games, &options(6)).await;

    // Hades: ceil(6/3)=2件、Unknownはスキップ、Valheim: ceil(4/1)=4件
    let hades = rows.iter().filter(|r| r.game == "Hades").count();
    let valheim = rows.iter().filter(|r| r.game == "Valheim").count();
    assert_eq!(hades, 2);
    assert_eq!(valheim, 4);
    assert_eq!(rows.len(), 6);
}

/// 目標に達したら残りのタイトルは取得しない
#[tokio::test]
async fn test_collect_reviews_stops_at_target() {
    let feed = FakeFeed::default()
        .with_game("Hades", 1)
        .with_game("Valheim", 2)
        .with_page(1, "*", json!({ "cursor": "", "reviews": [review(json!("1"), "a", true)] }));

    let games = vec!["Hades".to_string(), "Valheim".to_string()];
    let rows = collector::collect_reviews(&feed, &games, &options(1)).await;

    assert_eq!(rows.len(), 1);
    assert!(feed.requested().iter().all(|(app, _)| *app == 1));
}
