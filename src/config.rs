use anyhow::{Context, Result};
use std::fmt;

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_VOLUME: f32 = 0.5;
const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    /// Text-command prefix. Slash commands never read it.
    pub prefix: String,

    // Audio
    pub default_volume: f32,
    pub max_queue_size: usize,
}

impl Config {
    /// Loads `.env` (if present) and reads the configuration from the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Each setting is read from its primary variable first and then from its
    /// legacy alias (`TOKEN`, `CLIENT_ID`), so older deployments keep working.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let discord_token = read(&["DISCORD_TOKEN", "TOKEN"])
            .context("DISCORD_TOKEN (or TOKEN) must be set")?;

        let application_id = read(&["APPLICATION_ID", "CLIENT_ID"])
            .context("APPLICATION_ID (or CLIENT_ID) must be set")?
            .parse::<u64>()
            .context("APPLICATION_ID must be a numeric snowflake")?;

        let config = Self {
            discord_token,
            application_id,
            prefix: read(&["PREFIX"]).unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            default_volume: match read(&["DEFAULT_VOLUME"]) {
                Some(value) => value.parse::<f32>().context("DEFAULT_VOLUME must be a number")?,
                None => DEFAULT_VOLUME,
            },
            max_queue_size: match read(&["MAX_QUEUE_SIZE"]) {
                Some(value) => value.parse::<usize>().context("MAX_QUEUE_SIZE must be an integer")?,
                None => DEFAULT_MAX_QUEUE_SIZE,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Application id must be non-zero (the registration route needs it)
    /// - Volume must be between 0.0 and 2.0
    /// - Max queue size must be greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.application_id == 0 {
            anyhow::bail!("Application id must be non-zero");
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.default_volume
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the configuration for logging, without the token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (prefix {:?})\n  \
            Audio: {}% vol, {} max queue",
            self.application_id,
            self.prefix,
            (self.default_volume * 100.0) as u32,
            self.max_queue_size,
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("prefix", &self.prefix)
            .field("default_volume", &self.default_volume)
            .field("max_queue_size", &self.max_queue_size)
            .finish()
    }
}
