
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const BOT_TOKEN_ENV: &str = "BOT_TOKEN";
pub const CHANNEL_ENV: &str = "CHANNEL_ID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub rename: RenameConfig,

    #[serde(default)]
    pub membership: MembershipConfig,

    #[serde(default)]
    pub supervisor: SupervisorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. `BOT_TOKEN` in the environment takes precedence.
    pub bot_token: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Long polling timeout in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,

    /// Upper bound for every other Bot API call, e.g. "60s"
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Pending uploads older than this are evicted
    #[serde(default = "default_session_ttl")]
    pub ttl: String,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    #[serde(default = "default_max_name_chars")]
    pub max_name_chars: usize,

    /// Run the original extension through the same filter as the new name.
    /// Off by default: the extension is re-appended verbatim.
    #[serde(default)]
    pub sanitize_extension: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Channel username (`@name`) or numeric id users must belong to
    pub channel: Option<String>,

    /// Only checked when true. `channel` alone is informational (shown in /status).
    #[serde(default)]
    pub enforce: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    #[serde(default = "default_restart_delay")]
    pub restart_delay: String,

    #[serde(default = "default_max_restart_delay")]
    pub max_restart_delay: String,

    /// A run lasting at least this long resets the backoff
    #[serde(default = "default_reset_after")]
    pub reset_after: String,

    #[serde(default = "default_true")]
    pub jitter: bool,

    /// Give up after this many consecutive restarts (unbounded when unset)
    pub max_restarts: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_poll_timeout() -> u64 {
    30
}
fn default_request_timeout() -> String {
    "60s".to_string()
}
fn default_session_ttl() -> String {
    "5m".to_string()
}
fn default_sweep_interval() -> String {
    "1m".to_string()
}
fn default_max_name_chars() -> usize {
    100
}
fn default_restart_delay() -> String {
    "5s".to_string()
}
fn default_max_restart_delay() -> String {
    "60s".to_string()
}
fn default_reset_after() -> String {
    "60s".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_api_base(),
            poll_timeout: default_poll_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: default_session_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            max_name_chars: default_max_name_chars(),
            sanitize_extension: false,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay: default_restart_delay(),
            max_restart_delay: default_max_restart_delay(),
            reset_after: default_reset_after(),
            jitter: true,
            max_restarts: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `path` (or the default location), then apply environment
    /// overrides. A missing file is not an error: defaults plus environment
    /// are enough to run.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Config::default()
        };

        config.apply_env();

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.telegram.bot_token = Some(token.trim().to_string());
            }
        }
        if let Ok(channel) = std::env::var(CHANNEL_ENV) {
            if !channel.trim().is_empty() {
                self.membership.channel = Some(channel.trim().to_string());
            }
        }
        if let Some(ref mut token) = self.telegram.bot_token {
            *token = expand_env(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rename.max_name_chars == 0 {
            anyhow::bail!("rename.max_name_chars must be greater than 0");
        }

        let ttl = parse_duration(&self.session.ttl).context("Invalid session.ttl")?;
        let interval =
            parse_duration(&self.session.sweep_interval).context("Invalid session.sweep_interval")?;
        if ttl.is_zero() || interval.is_zero() {
            anyhow::bail!("session.ttl and session.sweep_interval must be non-zero");
        }

        parse_duration(&self.telegram.request_timeout)
            .context("Invalid telegram.request_timeout")?;

        let base = parse_duration(&self.supervisor.restart_delay)
            .context("Invalid supervisor.restart_delay")?;
        let max = parse_duration(&self.supervisor.max_restart_delay)
            .context("Invalid supervisor.max_restart_delay")?;
        parse_duration(&self.supervisor.reset_after).context("Invalid supervisor.reset_after")?;
        if base > max {
            anyhow::bail!(
                "supervisor.restart_delay ({}) exceeds supervisor.max_restart_delay ({})",
                self.supervisor.restart_delay,
                self.supervisor.max_restart_delay
            );
        }

        if let Some(ref channel) = self.membership.channel {
            let re = Regex::new(r"^(@[A-Za-z][A-Za-z0-9_]{3,}|-?\d+)$")?;
            if !re.is_match(channel) {
                anyhow::bail!(
                    "Invalid membership.channel: {}. Expected @username or a numeric chat id",
                    channel
                );
            }
        } else if self.membership.enforce {
            anyhow::bail!("membership.enforce is set but no membership.channel is configured");
        }

        Ok(())
    }

    /// The bot token, or an error telling the operator how to provide one.
    pub fn bot_token(&self) -> Result<&str> {
        match self.telegram.bot_token.as_deref() {
            Some(token) if !token.is_empty() && !token.starts_with('$') => Ok(token),
            _ => anyhow::bail!(
                "{} not found in environment variables or telegram.bot_token",
                BOT_TOKEN_ENV
            ),
        }
    }

    pub fn session_ttl(&self) -> Result<Duration> {
        parse_duration(&self.session.ttl)
    }

    pub fn sweep_interval(&self) -> Result<Duration> {
        parse_duration(&self.session.sweep_interval)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration(&self.telegram.request_timeout)
    }

    /// Copy with the token masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(ref mut token) = copy.telegram.bot_token {
            let keep: String = token.chars().take(4).collect();
            *token = format!("{}***", keep);
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the commented template to `path`
    pub fn write_template(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            );
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(())
    }

    /// `path` with `~` expanded, or the default location
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(shellexpand::tilde(p).to_string())),
            None => Self::config_path(),
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let base = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;

        Ok(base.home_dir().join(".renamebot").join("config.toml"))
    }
}

/// Parse "30s", "5m", "1h"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (split, unit) = s
        .char_indices()
        .last()
        .ok_or_else(|| anyhow::anyhow!("Invalid duration format: {:?}", s))?;
    let num_str = &s[..split];
    if num_str.is_empty() {
        anyhow::bail!("Invalid duration format: {:?}", s);
    }
    let num: u64 = num_str
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid number in duration: {:?}", s))?;

    let secs = match unit {
        's' => Some(num),
        'm' => num.checked_mul(60),
        'h' => num.checked_mul(3600),
        _ => anyhow::bail!("Unknown duration unit in {:?} (use s, m or h)", s),
    };
    secs.map(Duration::from_secs)
        .ok_or_else(|| anyhow::anyhow!("Duration out of range: {:?}", s))
}

fn expand_env(s: &str) -> String {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).unwrap_or_else(|_| s.to_string())
    } else if let Some(var_name) = s.strip_prefix('$') {
        std::env::var(var_name).unwrap_or_else(|_| s.to_string())
    } else {
        s.to_string()
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = r#"# renamebot configuration
# Every value below is optional; the environment wins where noted.

[telegram]
# Prefer the BOT_TOKEN environment variable (a .env file works too).
# bot_token = "${BOT_TOKEN}"
api_base = "https://api.telegram.org"
poll_timeout = 30
request_timeout = "60s"

[session]
# Uploads waiting for a name longer than this are dropped
ttl = "5m"
sweep_interval = "1m"

[rename]
max_name_chars = 100
# Filter the original extension like the new name instead of keeping it verbatim
sanitize_extension = false

[membership]
# CHANNEL_ID in the environment overrides this
# channel = "@your_channel"
enforce = false

[supervisor]
restart_delay = "5s"
max_restart_delay = "60s"
reset_after = "60s"
jitter = true
# max_restarts = 20

[logging]
level = "info"
"#;
