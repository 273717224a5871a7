use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use amlbot_aml_api::AmlApiClient;
use amlbot_core::{
    config::Config, i18n::Translations, metrics::Metrics, service::AmlService,
};
use amlbot_telegram::router::BotDeps;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<(), amlbot_core::Error> {
    let cfg = Arc::new(Config::load()?);
    let _log_guard =
        amlbot_core::logging::init("amlbot", &cfg.log_level, cfg.log_file.as_deref())?;

    let translations = Arc::new(Translations::load(
        cfg.translations_dir.as_deref(),
        &cfg.default_language,
    )?);

    let provider = Arc::new(AmlApiClient::new(cfg.aml_api_key.clone(), &cfg.aml_base_url)?);
    let service = Arc::new(AmlService::new(provider));
    let metrics = Arc::new(Metrics::new());

    let shutdown = CancellationToken::new();

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server_port));
    let listener = TcpListener::bind(addr).await?;
    let status = tokio::spawn(amlbot_status::serve(
        listener,
        metrics.clone(),
        shutdown.clone(),
        SHUTDOWN_GRACE,
    ));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_shutdown().await;
            shutdown.cancel();
        }
    });

    metrics.set_aml_connected(true);

    let polled = amlbot_telegram::router::run_polling(
        cfg.clone(),
        BotDeps {
            service,
            translations,
            metrics: metrics.clone(),
        },
        shutdown.clone(),
    )
    .await;

    // Polling also ends when Telegram rejects the token; stop the status endpoint too.
    shutdown.cancel();
    metrics.set_bot_connected(false);
    metrics.set_aml_connected(false);

    match status.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Status endpoint failed"),
        Err(e) => tracing::error!(error = %e, "Status endpoint task panicked"),
    }

    polled.map_err(|e| amlbot_core::Error::External(format!("telegram bot failed: {e}")))?;
    tracing::info!("Bot stopped");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = wait_for_ctrl_c() => {}
            _ = term.recv() => tracing::info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
