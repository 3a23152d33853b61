use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
];

const MAX_REMINDER_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    pub reminder_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any `HABITLINE_*` source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("HABITLINE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HABITLINE_JWT_SECRET is unset or still a placeholder. Set it in your .env file and restart.");
        }

        let port = var("HABITLINE_PORT", "5000");
        let port: u16 = port
            .parse()
            .with_context(|| format!("HABITLINE_PORT '{}' is not a port number", port))?;

        // Reminders match on the HH:MM minute, so a longer interval could step over one
        let interval = var("HABITLINE_REMINDER_INTERVAL_SECS", "60");
        let reminder_interval_secs: u64 = interval
            .parse()
            .ok()
            .filter(|secs| (1..=MAX_REMINDER_INTERVAL_SECS).contains(secs))
            .with_context(|| {
                format!(
                    "HABITLINE_REMINDER_INTERVAL_SECS '{}' must be between 1 and {} seconds",
                    interval, MAX_REMINDER_INTERVAL_SECS
                )
            })?;

        Ok(Self {
            host: var("HABITLINE_HOST", "0.0.0.0"),
            port,
            db_path: var("HABITLINE_DB_PATH", "habitline.db").into(),
            jwt_secret,
            frontend_url: var("HABITLINE_FRONTEND_URL", "http://localhost:5173"),
            mail_relay_url: get("HABITLINE_MAIL_RELAY_URL").filter(|url| !url.trim().is_empty()),
            mail_from: var("HABITLINE_MAIL_FROM", "Habitline <noreply@habitline.app>"),
            reminder_interval_secs,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}
