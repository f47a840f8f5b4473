use std::sync::Arc;
use std::time::Duration;

use tubewatch::ai::{AiSettings, Extractor};
use tubewatch::collector::Collector;
use tubewatch::config::Config;
use tubewatch::db::ScheduleStore;
use tubewatch::error::Result;
use tubewatch::youtube::YoutubeClient;

// Cron-style entry point: one rotation tick plus the classification sweep,
// e.g. `0 */6 * * * tubewatch >> tubewatch.log 2>&1`.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let reset_due = args.iter().any(|a| a == "--reset-due");

    if let Err(e) = run(reset_due).await {
        tracing::error!("collection run failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(reset_due: bool) -> Result<()> {
    let config = Config::load()?;

    let store = Arc::new(ScheduleStore::open(&config.db_path).await?);
    store.migrate().await?;

    if reset_due {
        // Recovery/bootstrap switch: make the whole registry due again.
        let (keywords, channels) = store.reset_due().await?;
        tracing::info!(
            "--reset-due: rewound {} keywords and {} channels to yesterday",
            keywords,
            channels
        );
    }

    if config.youtube_api_key.is_none() {
        tracing::warn!("youtube_api_key is not configured; fetches will return nothing");
    }

    let youtube = YoutubeClient::new(
        config.youtube_api_key.clone().unwrap_or_default(),
        Duration::from_millis(config.page_delay_ms),
    );
    let extractor = Extractor::new(AiSettings {
        enabled: config.ai_enabled,
        base_url: config.ai_base_url.clone(),
        api_key: config.ai_api_key.clone(),
        model: config.ai_model.clone(),
    });

    let collector = Collector::new(
        Arc::clone(&store),
        youtube,
        extractor,
        config.seed_keyword.clone(),
        config.page_size,
        config.max_pages,
    );

    match collector.run_tick().await? {
        Some(summary) => {
            if let Some((keyword, count)) = &summary.keyword {
                tracing::info!("keyword '{}': {} videos", keyword, count);
            }
            if let Some((channel, count)) = &summary.channel {
                tracing::info!("channel '{}': {} videos", channel, count);
            }
        }
        None => tracing::info!("another collection tick is running; nothing to do"),
    }

    let promoted = collector.classify_new_videos().await?;
    tracing::info!("classification sweep promoted {} videos", promoted);

    Ok(())
}
