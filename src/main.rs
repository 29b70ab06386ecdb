use anyhow::Result;
use log::{info, warn};
use std::env;
use std::sync::Arc;
use teloxide::prelude::*;

use neko_album::album_config::AlbumConfig;
use neko_album::bot::{message_handler, TelegramOutbox};
use neko_album::collector::MediaCollector;
use neko_album::localization::init_localization;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; the tracing-log bridge keeps `log` records visible
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting Neko Album Maker Bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Get bot token from environment
    let bot_token = env::var("TELEGRAM_BOT_TOKEN").expect("TELEGRAM_BOT_TOKEN must be set");

    // Optional archive channel for forwarded copies
    let archive_channel = match env::var("DB_CHANNEL_ID") {
        Ok(raw) => match raw.parse::<i64>() {
            Ok(id) => {
                info!("Archive channel configured: {id}");
                Some(ChatId(id))
            }
            Err(_) => {
                warn!("DB_CHANNEL_ID is not a valid integer");
                None
            }
        },
        Err(_) => {
            warn!("DB_CHANNEL_ID not configured - archive forwarding disabled");
            None
        }
    };

    // Engine tunables (quiet period, album size) with env overrides
    let config = AlbumConfig::from_env();
    info!(
        "Album config: quiet period {:?}, max group size {}",
        config.quiet_period, config.max_group_size
    );

    // Load user-facing strings
    init_localization()?;

    // Initialize the bot
    let bot = Bot::new(bot_token);

    // Build the batching engine around the live outbox
    let outbox = Arc::new(TelegramOutbox::new(bot.clone(), archive_channel));
    let collector = MediaCollector::new(config, outbox);

    info!("Bot initialized, starting dispatcher");

    // Set up the dispatcher with the shared collector
    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let collector = Arc::clone(&collector);
        move |bot: Bot, msg: Message| {
            let collector = Arc::clone(&collector);
            async move { message_handler(bot, msg, collector).await }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
