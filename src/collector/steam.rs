//! Steamストア連携モジュール
//!
//! - 検索ページ（HTML）からappIDを解決
//! - appreviews API（JSON、カーソルページング）から韓国語レビューを取得

use super::types::FeedPage;
use super::ReviewFeed;
use crate::error::{Result, SentimentError};
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use std::time::Duration;

const SEARCH_URL: &str = "https://store.steampowered.com/search/";
const REVIEWS_URL: &str = "https://store.steampowered.com/appreviews";
const USER_AGENT: &str = "Mozilla/5.0";

/// 1ページあたりの取得件数
pub const PAGE_SIZE: u32 = 100;

/// 取得対象期間（日）
pub const DAY_RANGE: u32 = 365;

pub struct SteamStore {
    client: Client,
}

impl SteamStore {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

/// 検索ページのURL
pub fn search_url(term: &str) -> Result<Url> {
    Url::parse_with_params(SEARCH_URL, &[("term", term), ("l", "korean"), ("cc", "KR")])
        .map_err(|e| SentimentError::ApiCall(format!("検索URL生成エラー: {}", e)))
}

/// 検索結果HTMLの先頭ヒットからappIDを取り出す
pub fn app_id_from_search_html(html: &str) -> Option<u64> {
    let doc = Html::parse_document(html);
    let rows = Selector::parse("div#search_resultsRows a").ok()?;
    let fallback = Selector::parse("a.search_result_row").ok()?;

    let anchor = doc
        .select(&rows)
        .next()
        .or_else(|| doc.select(&fallback).next())?;

    app_id_from_href(anchor.value().attr("href")?)
}

/// `.../app/<id>/...` 形式のリンクからIDを取り出す
pub fn app_id_from_href(href: &str) -> Option<u64> {
    let parts: Vec<&str> = href.split('/').collect();
    let pos = parts.iter().position(|&p| p == "app")?;
    parts.get(pos + 1)?.parse().ok()
}

impl ReviewFeed for SteamStore {
    async fn search_html(&self, game: &str) -> Result<String> {
        let url = search_url(game)?;
        let html = self.client.get(url).send().await?.text().await?;
        Ok(html)
    }

    async fn review_page(&self, app_id: u64, cursor: &str) -> Result<FeedPage> {
        let page_size = PAGE_SIZE.to_string();
        let day_range = DAY_RANGE.to_string();
        let page = self
            .client
            .get(format!("{}/{}", REVIEWS_URL, app_id))
            .query(&[
                ("json", "1"),
                ("filter", "all"),
                ("language", "korean"),
                ("day_range", day_range.as_str()),
                ("num_per_page", page_size.as_str()),
                ("cursor", cursor),
            ])
            .send()
            .await?
            .json::<FeedPage>()
            .await?;
        Ok(page)
    }
}
