use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wikirelay_common::{BotConfig, LinkBuilder, Locale};
use wikirelay_notify::{DiscordApi, DispatchEngine, NoopNotifier, Notifier, SubscriptionStore};
use wikirelay_stream::{ChangeStream, StreamConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("wikirelay=info".parse()?))
        .init();

    info!("WikiRelay starting...");

    let config = BotConfig::from_default_location()?;
    info!(domain = %config.domain, lang = %config.lang, "Loaded configuration");

    if config.domain.is_empty() {
        // Nothing to subscribe to; stay up so the host keeps its process
        // supervisor happy, but the pipeline is off.
        warn!("No stream domain configured, notification pipeline disabled");
        tokio::signal::ctrl_c().await?;
        return Ok(());
    }

    let store = Arc::new(SubscriptionStore::load(&config.streams_path));

    // Deliver via Discord if a token is present, otherwise run dark.
    let notifier: Arc<dyn Notifier> = match config.read_token() {
        Some(token) => {
            info!("Discord deliveries enabled");
            Arc::new(DiscordApi::new(token))
        }
        None => {
            warn!(path = %config.token_path.display(), "No chat token, deliveries disabled");
            Arc::new(NoopNotifier)
        }
    };

    let locale = Locale::load(&config.lang);
    let links = LinkBuilder::new(&config.wiki);

    let events = ChangeStream::connect(StreamConfig::new(&config.domain));
    let engine = DispatchEngine::new(store, notifier, locale, links);

    tokio::select! {
        _ = engine.run(events) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        }
    }

    Ok(())
}
