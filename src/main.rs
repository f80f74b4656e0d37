use anyhow::Context;
use clap::Parser;
use review_sentiment::{cli, collector, config, dashboard, export, labeler, merger, table, trainer};
use cli::{Cli, Commands};
use config::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// ストア検索・レビューAPIのタイムアウト
const STORE_TIMEOUT: Duration = Duration::from_secs(10);

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "review_sentiment=debug,tower_http=debug"
    } else {
        "review_sentiment=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load().context("設定の読み込みに失敗")?;

    match cli.command {
        Commands::Collect { output, target, game, max_pages } => {
            println!("🎮 review-senti - レビュー収集\n");

            let games = if game.is_empty() { config.games.clone() } else { game };
            let options = collector::CollectOptions {
                total_target: target.unwrap_or(config.total_reviews_target),
                max_pages,
                ..Default::default()
            };
            println!("[1/2] {}タイトルから最大{}件を収集中...", games.len(), options.total_target);

            let store = collector::SteamStore::new(STORE_TIMEOUT)?;
            let records = collector::collect_reviews(&store, &games, &options).await;

            if records.is_empty() {
                println!("⚠ レビューを1件も取得できませんでした（ファイルは作成しません）");
                return Ok(());
            }

            println!("\n[2/2] 保存中...");
            let table = table::Table::from_records(&records, table::RAW_COLUMNS);
            table.write_csv(&output)?;
            println!("✔ {}件を保存: {}", table.len(), output.display());
        }

        Commands::Merge { folder, output } => {
            println!("🗂 review-senti - マージ\n");
            let merged = merger::merge_folder(&folder, &output)
                .with_context(|| format!("マージに失敗: {}", folder.display()))?;
            println!("✔ {}件を保存: {}", merged.len(), output.display());
        }

        Commands::Label { input, output, batch_size, api_url, model, save_every, resume } => {
            println!("🏷 review-senti - LLMラベル付け\n");

            let api_url = api_url.unwrap_or(config.api_url);
            let model = model.unwrap_or(config.model);
            let client = labeler::LmStudioClient::new(
                &api_url,
                &model,
                config.max_tokens,
                Duration::from_secs(config.timeout_seconds),
            )?;
            println!("- API: {} (モデル: {})", api_url, client.model());

            let options = labeler::LabelOptions {
                batch_size: batch_size.unwrap_or(config.batch_size),
                model_marker: config.model_marker.clone(),
                save_every,
                show_progress: true,
                verbose: cli.verbose,
                ..Default::default()
            };

            let (table, summary) = labeler::label_file(&input, &output, resume, &client, &options)
                .await
                .with_context(|| format!("ラベル付けに失敗 (途中経過: {})", output.display()))?;

            println!(
                "✔ {}バッチ中 {}バッチを分類 ({}バッチはラベル済みでスキップ)",
                summary.batches, summary.classified, summary.skipped
            );
            if summary.unparsed_rows > 0 {
                println!("⚠ 応答から読み取れなかった行: {}件", summary.unparsed_rows);
            }
            println!("✔ {}件を保存: {}", table.len(), output.display());
        }

        Commands::Train {
            input,
            output,
            epochs,
            batch_size,
            patience,
            max_words,
            max_len,
            test_size,
            seed,
            embed_dim,
            learning_rate,
        } => {
            println!("🧠 review-senti - 学習\n");

            let train_config = trainer::TrainConfig {
                max_words,
                max_len,
                test_size,
                seed,
                epochs,
                batch_size,
                patience,
                embed_dim,
                learning_rate,
                show_progress: true,
            };
            let report = trainer::train_file(&input, &output, &train_config)?;

            println!(
                "\n✔ 最良エポック {}: val_loss={:.4} val_acc={:.3} (学習 {}件 / 検証 {}件)",
                report.best_epoch,
                report.best_val_loss,
                report.best_val_accuracy,
                report.train_rows,
                report.val_rows
            );
            println!("✔ モデルを保存: {}", output.display());
        }

        Commands::Serve { input, model_dir, bind } => {
            println!("📊 review-senti - ダッシュボード\n");

            let state = dashboard::load_state(&input, &model_dir)?;
            let bind = bind.unwrap_or(config.bind);
            println!("✔ http://{} で待ち受け中 (Ctrl-Cで終了)", bind);
            dashboard::serve(state, &bind).await?;
        }

        Commands::Predict { text, model_dir } => {
            let predictor = trainer::Predictor::load(&model_dir)?;
            let prediction = predictor.predict(&text);
            println!(
                "{} (신뢰도 {:.1}%)",
                prediction.label.name(),
                prediction.confidence * 100.0
            );
            if cli.verbose {
                for (label, p) in review_sentiment_common::Sentiment::ALL
                    .iter()
                    .zip(prediction.probabilities)
                {
                    println!("  {}: {:.3}", label.name(), p);
                }
            }
        }

        Commands::Export { input, output, model_dir } => {
            println!("📄 review-senti - エクスポート\n");
            let output = output.unwrap_or_else(|| PathBuf::from("."));
            let (path, rows) = export::export_table(&input, &model_dir, &output)?;
            println!("✔ Excel出力: {} ({}行)", path.display(), rows);
        }

        Commands::Config { set_api_url, set_model, show } => {
            let mut config = config;

            if let Some(url) = set_api_url {
                config.set_api_url(url)?;
                println!("✔ APIのURLを設定しました");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ モデル名を設定しました");
            }

            if show {
                println!("設定: {}", Config::config_path()?.display());
                println!("  API URL: {}", config.api_url);
                println!("  モデル: {}", config.model);
                println!("  model_used: {}", config.model_marker);
                println!("  バッチサイズ: {}", config.batch_size);
                println!("  max_tokens: {}", config.max_tokens);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  収集目標: {}件 / {}タイトル", config.total_reviews_target, config.games.len());
                println!("  ダッシュボード: {}", config.bind);
            }
        }
    }

    Ok(())
}
