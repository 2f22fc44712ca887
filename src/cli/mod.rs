//! CLI commands for Serena using clap.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{DeliveryMode, MonitorSettings, ResponderMode, Settings};
use crate::core::Responder;
use crate::monitor::{run_monitor_daemon, Health, LivenessMonitor, RedeployOutcome};
use crate::providers::create_provider;
use crate::telegram::run_telegram_daemon;
use crate::tools::{ToolKind, Toolbox};

/// Chat id used for one-shot CLI conversations.
const CLI_CHAT_ID: i64 = 0;

/// Serena - Telegram wellbeing assistant.
#[derive(Parser)]
#[command(name = "serena")]
#[command(version)]
#[command(about = "Serena - Telegram wellbeing assistant", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the Telegram bot and its health endpoint
    Bot {
        /// Update delivery (overrides BOT_MODE)
        #[arg(long, value_enum)]
        mode: Option<DeliveryMode>,

        /// Port for the health endpoint and webhook (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Free-text responder (overrides RESPONDER_MODE)
        #[arg(long, value_enum)]
        responder: Option<ResponderMode>,
    },

    /// Watch the service URL and trigger a redeploy when it is down
    Monitor {
        /// Seconds between checks (overrides CHECK_INTERVAL)
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Run a single check and exit
        #[arg(long)]
        once: bool,
    },

    /// Answer one message with the free-text responder
    Ask {
        /// Message text
        #[arg(required = true)]
        message: Vec<String>,

        /// Free-text responder (overrides RESPONDER_MODE)
        #[arg(long, value_enum)]
        responder: Option<ResponderMode>,
    },

    /// Run one lookup tool: clima, centros, motivacion, animo
    Tool {
        /// Tool name
        kind: String,

        /// Tool input
        query: Vec<String>,
    },
}

impl Command {
    /// Log file prefix for this command.
    pub fn log_prefix(&self) -> &'static str {
        match self {
            Command::Bot { .. } => "bot",
            Command::Monitor { .. } => "monitor",
            Command::Ask { .. } | Command::Tool { .. } => "cli",
        }
    }
}

impl Commands {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Bot { mode, port, responder } => cmd_bot(*mode, *port, *responder).await,
            Command::Monitor { interval, once } => cmd_monitor(*interval, *once).await,
            Command::Ask { message, responder } => cmd_ask(&message.join(" "), *responder).await,
            Command::Tool { kind, query } => cmd_tool(kind, &query.join(" ")).await,
        }
    }
}

async fn cmd_bot(
    mode: Option<DeliveryMode>,
    port: Option<u16>,
    responder: Option<ResponderMode>,
) -> Result<()> {
    let mut settings = Settings::from_env().context("Failed to load bot settings")?;
    if let Some(mode) = mode {
        settings.delivery = mode;
    }
    if let Some(port) = port {
        settings.port = port;
    }
    if let Some(responder) = responder {
        settings.responder_mode = responder;
    }
    settings.validate()?;

    run_telegram_daemon(Arc::new(settings)).await?;
    tracing::info!("Telegram bot stopped");
    Ok(())
}

async fn cmd_monitor(interval: Option<u64>, once: bool) -> Result<()> {
    let mut settings = MonitorSettings::from_env().context("Failed to load monitor settings")?;
    if let Some(secs) = interval {
        settings.interval = std::time::Duration::from_secs(secs);
    }

    if !once {
        run_monitor_daemon(settings).await?;
        return Ok(());
    }

    let report = LivenessMonitor::new(settings).run_cycle().await;
    match &report.health {
        Health::Up => println!("✅ Service is up"),
        Health::Down(reason) => println!("❌ Service is down: {}", reason),
    }
    match &report.redeploy {
        None => {}
        Some(RedeployOutcome::Triggered) => println!("🔄 Redeploy triggered"),
        Some(RedeployOutcome::Rejected { status, body }) => {
            println!("⚠️ Redeploy rejected ({}): {}", status, body)
        }
        Some(RedeployOutcome::Failed(reason)) => println!("⚠️ Redeploy failed: {}", reason),
    }
    Ok(())
}

async fn cmd_ask(message: &str, responder: Option<ResponderMode>) -> Result<()> {
    let mut settings = offline_settings()?;
    if let Some(responder) = responder {
        settings.responder_mode = responder;
    }

    let provider = create_provider(&settings.model);
    let tools = Toolbox::from_settings(&settings, provider.clone());
    let responder = Responder::new(settings.responder_mode, provider, tools);

    for chunk in responder.respond_chunks(CLI_CHAT_ID, message).await {
        println!("{}", chunk);
    }
    Ok(())
}

async fn cmd_tool(kind: &str, query: &str) -> Result<()> {
    let kind: ToolKind = kind.parse().map_err(anyhow::Error::msg)?;
    let settings = offline_settings()?;

    let provider = create_provider(&settings.model);
    let tools = Toolbox::from_settings(&settings, provider);

    println!("{}", tools.invoke(kind, query.trim()).await.text);
    Ok(())
}

/// Bot settings for commands that never talk to Telegram.
fn offline_settings() -> Result<Settings> {
    Settings::from_lookup(|key| match key {
        "TELEGRAM_TOKEN" => std::env::var(key).ok().or_else(|| Some("offline".to_string())),
        "BOT_MODE" => None,
        _ => std::env::var(key).ok(),
    })
    .context("Failed to load settings")
}
