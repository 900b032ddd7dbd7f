use anyhow::{Context, Result};
use clap::Parser;
use livewatch_core::EngineConfig;
use std::fs;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Watches social profiles and groups and alerts on LIVE/DIE changes",
    long_about = None
)]
pub struct Args {
    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://livewatch.db")]
    pub database_url: String,

    /// TOML file overriding provider settings and cue lists
    #[arg(long, env = "CONFIG_PATH")]
    pub config_path: Option<String>,

    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 300)]
    pub poll_interval_secs: u64,

    /// Delay between two targets inside one poll cycle
    #[arg(long, env = "PACING_MS", default_value_t = 600)]
    pub pacing_ms: u64,

    #[arg(long, env = "PROBE_TIMEOUT_SECS", default_value_t = 20)]
    pub probe_timeout_secs: u64,

    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<String>,

    /// Comma-separated chat ids allowed to use the bot
    #[arg(long, env = "ALLOWED_CHATS", default_value = "")]
    pub allowed_chats: String,
}

impl Args {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    /// Built-in engine settings, overridden by `CONFIG_PATH` and then by the probe timeout flag.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config_path {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                info!("Loading engine config from {}", path);
                EngineConfig::from_toml_str(&raw)
                    .with_context(|| format!("Failed to parse config file {}", path))?
            }
            None => EngineConfig::builtin(),
        };
        config.provider.probe_timeout_secs = self.probe_timeout_secs;
        Ok(config)
    }
}
