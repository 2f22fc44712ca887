//! Telegram bot client: polling or webhook delivery plus the health server.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use teloxide::dispatching::ShutdownToken;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::commands::register_commands;
use super::handler::handle_message;
use crate::config::{DeliveryMode, Settings};
use crate::core::BotCore;
use crate::error::Error;
use crate::web::{bind, create_app_router, serve, WebServerConfig};

/// Path Telegram posts updates to in webhook mode.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Full webhook URL from the configured public base URL.
pub fn webhook_url(base: &str) -> Result<reqwest::Url, Error> {
    let raw = format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH);
    reqwest::Url::parse(&raw).map_err(|e| Error::config(format!("WEBHOOK_URL '{}' is invalid: {}", base, e)))
}

/// Run the Telegram bot until Ctrl+C.
pub async fn run_telegram_daemon(settings: Arc<Settings>) -> Result<(), Error> {
    tracing::info!("Starting Telegram bot ({:?} mode)...", settings.delivery);

    let web_config = WebServerConfig::with_port(settings.port);
    let listener = bind(&web_config).await?;

    let bot = Bot::new(settings.telegram_token.clone());
    register_commands(&bot).await;

    let core = Arc::new(BotCore::from_settings(settings.clone()));
    let handler = Update::filter_message().endpoint(handle_message);

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![core])
        .enable_ctrlc_handler()
        .build();

    match settings.delivery {
        DeliveryMode::Polling => {
            let (stop_tx, stop_rx) = oneshot::channel::<()>();
            let web = spawn_web(listener, create_app_router(), dispatcher.shutdown_token(), async move {
                let _ = stop_rx.await;
            });

            tracing::info!("🤖 Telegram bot polling for updates");
            dispatcher.dispatch().await;

            let _ = stop_tx.send(());
            join_web(web).await
        }
        DeliveryMode::Webhook => {
            let base = settings
                .webhook_url
                .as_deref()
                .ok_or_else(|| Error::config("webhook mode requires WEBHOOK_URL"))?;
            let url = webhook_url(base)?;
            let options = webhooks::Options::new(web_config.addr()?, url.clone());

            let (update_listener, stop_flag, bot_router) = webhooks::axum_to_router(bot, options)
                .await
                .map_err(|e| Error::Telegram(format!("Failed to set webhook: {}", e)))?;

            let app = bot_router.merge(create_app_router());
            let web = spawn_web(listener, app, dispatcher.shutdown_token(), stop_flag);

            tracing::info!("🤖 Telegram bot receiving updates at {}", url);
            dispatcher
                .dispatch_with_listener(
                    update_listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;

            join_web(web).await
        }
    }
}

/// Serve in the background. A server failure stops the dispatcher too.
fn spawn_web<F>(
    listener: TcpListener,
    app: Router,
    dispatcher: ShutdownToken,
    shutdown: F,
) -> JoinHandle<crate::error::Result<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let result = serve(listener, app, shutdown).await;
        if let Err(e) = &result {
            tracing::error!("Web server failed, stopping the bot: {}", e);
            if dispatcher.shutdown().is_err() {
                tracing::warn!("Dispatcher was not running when the web server failed");
            }
        }
        result
    })
}

async fn join_web(web: JoinHandle<crate::error::Result<()>>) -> Result<(), Error> {
    match web.await {
        Ok(result) => result,
        Err(e) => Err(Error::Web(format!("web server task failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url() {
        assert_eq!(
            webhook_url("https://serena.example.com/").unwrap().as_str(),
            "https://serena.example.com/webhook"
        );
        assert!(matches!(webhook_url("not a url"), Err(Error::Config(_))));
    }
}
