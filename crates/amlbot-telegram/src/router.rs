use std::{sync::Arc, time::Duration};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use amlbot_core::{
    config::Config, dispatcher::MessageDispatcher, i18n::Translations,
    messaging::port::MessagingPort, metrics::Metrics, service::AmlService,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<MessageDispatcher>,
}

/// Collaborators the polling loop wires into the dispatcher.
pub struct BotDeps {
    pub service: Arc<AmlService>,
    pub translations: Arc<Translations>,
    pub metrics: Arc<Metrics>,
}

/// Run long polling until `shutdown` is cancelled.
///
/// Updates are processed strictly one after another: every update maps to the same
/// distribution key, so the next message is read only after the previous reply was sent.
pub async fn run_polling(
    cfg: Arc<Config>,
    deps: BotDeps,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot
        .get_me()
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to Telegram: {e}"))?;
    deps.metrics.set_bot_connected(true);
    tracing::info!(username = %me.username(), "Bot started");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        dispatcher: Arc::new(MessageDispatcher::new(
            deps.service,
            messenger,
            deps.translations,
            deps.metrics,
        )),
    });

    let handler = Update::filter_message().endpoint(handlers::handle_message);

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .distribution_function(|_| Some(()))
        .build();

    let token = dispatcher.shutdown_token();
    let watcher = tokio::spawn(async move {
        shutdown.cancelled().await;
        tracing::info!("Stopping Telegram polling");
        loop {
            match token.shutdown() {
                Ok(done) => {
                    done.await;
                    break;
                }
                // Dispatcher has not started polling yet.
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    });

    dispatcher.dispatch().await;
    watcher.abort();

    Ok(())
}
