use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            webhook_url: String::new(),
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl TelegramConfig {
    /// Root URL every Bot API method hangs off: `api_base` followed by the token.
    pub fn api_root(&self) -> Result<Url> {
        let raw = format!("{}{}", self.api_base, self.bot_token);
        Url::parse(&raw).with_context(|| format!("Invalid API URL: {}<token>", self.api_base))
    }

    /// Webhook URL with the token appended as the last path segment.
    pub fn webhook_endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&self.webhook_url)
            .with_context(|| format!("Invalid webhook URL: {}", self.webhook_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Webhook URL cannot be a base: {}", self.webhook_url))?
            .pop_if_empty()
            .push(&self.bot_token);
        Ok(url)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScheduleConfig {
    #[serde(default = "default_hour")]
    pub hour: u32,
    #[serde(default = "default_minute")]
    pub minute: u32,
    #[serde(default = "default_reset_hour")]
    pub reset_hour: u32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Full English weekday names, matched case-sensitively.
    #[serde(default = "default_no_ping_days")]
    pub no_ping_days: Vec<String>,
    #[serde(default = "default_names_file")]
    pub names_file: PathBuf,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            hour: default_hour(),
            minute: default_minute(),
            reset_hour: default_reset_hour(),
            timezone: default_timezone(),
            no_ping_days: default_no_ping_days(),
            names_file: default_names_file(),
        }
    }
}

impl ScheduleConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", self.timezone, e))
    }

    pub fn is_no_ping_day(&self, weekday_name: &str) -> bool {
        self.no_ping_days.iter().any(|d| d == weekday_name)
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org/bot".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_hour() -> u32 {
    12
}

fn default_minute() -> u32 {
    45
}

fn default_reset_hour() -> u32 {
    1
}

fn default_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_no_ping_days() -> Vec<String> {
    vec!["Saturday".to_string(), "Sunday".to_string()]
}

fn default_names_file() -> PathBuf {
    PathBuf::from("names.yml")
}

fn split_days(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

fn override_number(target: &mut u32, key: &str, value: Option<String>) {
    let Some(raw) = value else { return };
    match raw.trim().parse::<u32>() {
        Ok(n) => *target = n,
        Err(e) => warn!("Ignoring {}={:?}: {}, keeping {}", key, raw, e, target),
    }
}

impl Config {
    /// Load the TOML file if present, apply environment overrides, then validate.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            info!(
                "Config file {} not found, using defaults and environment",
                path.display()
            );
            Config::default()
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.telegram.webhook_url = url;
        }
        override_number(&mut self.schedule.hour, "HOUR", get("HOUR"));
        override_number(&mut self.schedule.minute, "MINUTE", get("MINUTE"));
        override_number(&mut self.schedule.reset_hour, "RESET_HOUR", get("RESET_HOUR"));
        if let Some(tz) = get("TIMEZONE") {
            self.schedule.timezone = tz.trim().to_string();
        }
        if let Some(days) = get("NOPINGDAYS") {
            self.schedule.no_ping_days = split_days(&days);
        }
        if let Some(names) = get("NAMES") {
            self.schedule.names_file = PathBuf::from(names);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            bail!("Bot token is not set (telegram.bot_token or TOKEN)");
        }
        if self.telegram.webhook_url.trim().is_empty() {
            bail!("Webhook URL is not set (telegram.webhook_url or WEBHOOK_URL)");
        }
        self.telegram.api_root()?;
        self.telegram.webhook_endpoint()?;

        let schedule = &self.schedule;
        if schedule.hour > 23 {
            bail!("schedule.hour must be 0-23, got {}", schedule.hour);
        }
        if schedule.minute > 59 {
            bail!("schedule.minute must be 0-59, got {}", schedule.minute);
        }
        if schedule.reset_hour > 23 {
            bail!("schedule.reset_hour must be 0-23, got {}", schedule.reset_hour);
        }
        if schedule.reset_hour == schedule.hour {
            bail!(
                "schedule.reset_hour ({}) must differ from schedule.hour: \
                 the reset would re-arm the ping within the target minute and send twice",
                schedule.reset_hour
            );
        }
        schedule.tz()?;
        Ok(())
    }
}
