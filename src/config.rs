use crate::error::{Result, SentimentError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 既定の収集対象タイトル
pub const DEFAULT_GAMES: &[&str] = &[
    "PlayerUnknown's Battlegrounds",
    "Counter-Strike: Global Offensive",
    "Monster Hunter: World",
    "Cyberpunk 2077",
    "Elden Ring",
    "Valheim",
    "Grand Theft Auto V",
    "Rust",
    "The Witcher 3: Wild Hunt",
    "Red Dead Redemption 2",
    "Hades",
    "Stardew Valley",
    "Dark Souls III",
    "Sekiro: Shadows Die Twice",
    "DOOM Eternal",
    "Phasmophobia",
    "Baldur's Gate 3",
    "Rainbow Six Siege",
    "ARK: Survival Evolved",
    "Fall Guys",
    "Team Fortress 2",
    "Resident Evil 2",
    "Fallout 4",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 補完APIのURL（LM Studio互換）
    pub api_url: String,
    pub model: String,
    /// `model_used` 列に書き込む名前
    pub model_marker: String,
    pub batch_size: usize,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub games: Vec<String>,
    pub total_reviews_target: usize,
    /// ダッシュボードの待ち受けアドレス
    pub bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:1234/v1/completions".into(),
            model: "google/gemma-3-12b".into(),
            model_marker: "gemma-lmstudio".into(),
            batch_size: 10,
            max_tokens: 40,
            timeout_seconds: 120,
            games: DEFAULT_GAMES.iter().map(|g| g.to_string()).collect(),
            total_reviews_target: 50_000,
            bind: "127.0.0.1:8501".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SentimentError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("review-sentiment").join("config.json"))
    }

    /// 環境変数を優先
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LMSTUDIO_API_URL") {
            if !url.trim().is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(model) = std::env::var("LMSTUDIO_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
    }

    pub fn set_api_url(&mut self, url: String) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SentimentError::Config(format!("URLが不正です: {}", url)));
        }
        self.api_url = url;
        self.save()
    }

    pub fn set_model(&mut self, model: String) -> Result<()> {
        self.model = model;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://127.0.0.1:1234/v1/completions");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.games.len(), 23);
        assert_eq!(config.total_reviews_target, 50_000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model": "qwen2.5-7b"}"#).unwrap();
        assert_eq!(config.model, "qwen2.5-7b");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.bind, "127.0.0.1:8501");
    }
}
