mod config;
mod openai;
mod relay;

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::prelude::*;

use config::Config;
use relay::{RelayConfig, RelayEngine, TelegramClient};

struct BotState {
    engine: RelayEngine,
    telegram: TelegramClient,
}

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "chatrelay.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("chatrelay.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file in {}: {e}", log_dir.display());
            std::process::exit(1);
        }
    };
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting chatrelay...");
    info!("Loaded config from {config_path}");

    let bot = Bot::new(&config.telegram_bot_token);

    // A bad token or an unreachable API is fatal.
    match bot.get_me().await {
        Ok(me) => info!("Bot user ID: {}, username: @{}", me.id, me.username()),
        Err(e) => {
            error!("Failed to connect to Telegram: {e}");
            std::process::exit(1);
        }
    }

    let completer = openai::Client::new(config.openai_api_key.clone(), config.engine.clone());
    info!("Completion engine: {}", completer.engine());
    match config.channel_id {
        Some(id) => info!("Limited to chat {id}"),
        None => info!("Listening in all chats"),
    }

    let relay_config = RelayConfig {
        channel_id: config.channel_id,
        completion_timeout: config.completion_timeout,
    };
    let state = Arc::new(BotState {
        engine: RelayEngine::new(relay_config, Arc::new(completer)),
        telegram: TelegramClient::new(bot.clone()),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_new_message));

    info!("Bot is now running. Press CTRL-C to exit.");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_new_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(inbound) = relay::telegram::to_inbound(&msg) else {
        return Ok(());
    };

    if !state.engine.accepts(inbound.channel_id) {
        return Ok(());
    }

    let chat_id = inbound.channel_id;
    state.telegram.send_typing(chat_id).await.ok();

    if let Some(reply) = state.engine.handle(inbound).await {
        state.telegram.send_message(chat_id, &reply).await.ok();
    }

    Ok(())
}
