use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "review-senti")]
#[command(about = "게임 리뷰 감성 데이터셋 수집・LLM 라벨링・분류기 학습・대시보드", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ストアから韓国語レビューを収集
    Collect {
        /// 出力CSV
        #[arg(short, long, default_value = "steam_reviews_ko.csv")]
        output: PathBuf,

        /// 合計目標件数（省略時は設定値）
        #[arg(short, long)]
        target: Option<usize>,

        /// 対象タイトル（複数指定可、省略時は設定値）
        #[arg(short, long)]
        game: Vec<String>,

        /// 1タイトルあたりの最大ページ数
        #[arg(long, default_value = "50")]
        max_pages: usize,
    },

    /// フォルダ内のレビュー表をマージ
    Merge {
        /// 入力フォルダ
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力CSV
        #[arg(short, long, default_value = "merged_reviews.csv")]
        output: PathBuf,
    },

    /// LLMで感情ラベルを付与
    Label {
        /// 入力表（CSV/Excel）
        #[arg(required = true)]
        input: PathBuf,

        /// 出力CSV
        #[arg(short, long, default_value = "labeled_output.csv")]
        output: PathBuf,

        /// バッチサイズ（省略時は設定値）
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// 補完APIのURL（省略時は設定値）
        #[arg(long)]
        api_url: Option<String>,

        /// モデル名（省略時は設定値）
        #[arg(short, long)]
        model: Option<String>,

        /// 何バッチごとに途中保存するか（0で最後のみ）
        #[arg(long, default_value = "10")]
        save_every: usize,

        /// 出力表があればそこから再開
        #[arg(long)]
        resume: bool,
    },

    /// 分類器を学習
    Train {
        /// ラベル付き表
        #[arg(required = true)]
        input: PathBuf,

        /// モデル出力フォルダ
        #[arg(short, long, default_value = "model")]
        output: PathBuf,

        #[arg(long, default_value = "10")]
        epochs: usize,

        #[arg(short, long, default_value = "64")]
        batch_size: usize,

        /// 早期終了までの猶予エポック数
        #[arg(long, default_value = "3")]
        patience: usize,

        /// 語彙の上限
        #[arg(long, default_value = "20000")]
        max_words: usize,

        /// シーケンス長
        #[arg(long, default_value = "100")]
        max_len: usize,

        /// 検証用の割合
        #[arg(long, default_value = "0.2")]
        test_size: f64,

        #[arg(long, default_value = "42")]
        seed: u64,

        #[arg(long, default_value = "32")]
        embed_dim: usize,

        #[arg(long, default_value = "0.5")]
        learning_rate: f32,
    },

    /// ダッシュボードを起動
    Serve {
        /// ラベル付き表（フィードバックで書き換えられる）
        #[arg(required = true)]
        input: PathBuf,

        /// モデルフォルダ
        #[arg(short, long, default_value = "model")]
        model_dir: PathBuf,

        /// 待ち受けアドレス（省略時は設定値）
        #[arg(long)]
        bind: Option<String>,
    },

    /// 1件のレビューを判定
    Predict {
        /// レビュー本文
        #[arg(required = true)]
        text: String,

        /// モデルフォルダ
        #[arg(short, long, default_value = "model")]
        model_dir: PathBuf,
    },

    /// 採点結果をExcelに出力
    Export {
        /// ラベル付き表
        #[arg(required = true)]
        input: PathBuf,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// モデルフォルダ
        #[arg(short, long, default_value = "model")]
        model_dir: PathBuf,
    },

    /// 設定を表示/編集
    Config {
        /// 補完APIのURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// モデル名を設定
        #[arg(long)]
        set_model: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
