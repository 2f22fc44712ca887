//! Serena library root.

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod providers;
pub mod telegram;
pub mod tools;
pub mod web;

pub use cli::Commands;
pub use config::{MonitorSettings, Settings};
pub use core::{BotCore, InboundEvent, Outbound};
pub use error::{Error, Result};
pub use monitor::{run_monitor_daemon, LivenessMonitor};
pub use providers::Provider;
pub use telegram::run_telegram_daemon;
pub use tools::{ToolKind, Toolbox};
pub use web::run_server;
