use anyhow::{Context, Result};
use std::env;

/// Runtime configuration, read from environment variables (a `.env` file is
/// loaded first if one exists).
#[derive(Debug, Clone)]
pub struct Config {
    pub general: GeneralConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub mail: MailConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
pub struct GeneralConfig {
    pub log_level: String,

    /// "production" or "development". Only affects log output today.
    pub environment: String,

    /// Public base URL of the frontend, used to build password-reset links.
    pub app_url: String,

    /// Tokio worker threads. 0 means let the runtime decide.
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            environment: "development".to_string(),
            app_url: "http://localhost:5173".to_string(),
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/theca.db".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,

    /// Set the `Secure` attribute on session cookies. Turn off for plain-HTTP
    /// local development.
    pub secure_cookies: bool,

    /// Origins allowed by CORS. A single "*" entry allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            secure_cookies: true,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// API key for the mail provider. When unset, mail sending is skipped
    /// and only logged, which keeps local development and tests offline.
    pub api_key: Option<String>,

    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: "Theca <noreply@theca.app>".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Time of day for the daily expired-session sweep, "HH:MM" (24h).
    pub sweep_time: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sweep_time: "03:00".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            database: DatabaseConfig::default(),
            server: ServerConfig::default(),
            mail: MailConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Missing .env is fine, real env vars still apply.
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(v) = env::var("LOG_LEVEL") {
            config.general.log_level = v;
        }
        if let Ok(v) = env::var("ENVIRONMENT") {
            config.general.environment = v;
        }
        if let Ok(v) = env::var("APP_URL") {
            config.general.app_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("WORKER_THREADS") {
            config.general.worker_threads =
                v.parse().context("WORKER_THREADS must be a number")?;
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }

        if let Ok(v) = env::var("PORT") {
            config.server.port = v.parse().context("PORT must be a valid port number")?;
        }
        if let Ok(v) = env::var("SECURE_COOKIES") {
            config.server.secure_cookies =
                v.parse().context("SECURE_COOKIES must be true or false")?;
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            config.server.cors_allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(v) = env::var("MAIL_API_KEY")
            && !v.is_empty()
        {
            config.mail.api_key = Some(v);
        }
        if let Ok(v) = env::var("MAIL_FROM") {
            config.mail.from = v;
        }

        if let Ok(v) = env::var("SESSION_SWEEP_ENABLED") {
            config.scheduler.enabled = v
                .parse()
                .context("SESSION_SWEEP_ENABLED must be true or false")?;
        }
        if let Ok(v) = env::var("SESSION_SWEEP_TIME") {
            config.scheduler.sweep_time = v;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            anyhow::bail!("DATABASE_URL cannot be empty");
        }

        if self.general.app_url.is_empty() {
            anyhow::bail!("APP_URL cannot be empty");
        }
        url::Url::parse(&self.general.app_url).context("APP_URL is not a valid URL")?;

        if self.server.cors_allowed_origins.is_empty() {
            anyhow::bail!("CORS_ALLOWED_ORIGINS cannot be empty");
        }

        parse_sweep_time(&self.scheduler.sweep_time)?;

        Ok(())
    }
}

/// Parses "HH:MM" into (hour, minute).
pub fn parse_sweep_time(value: &str) -> Result<(u8, u8)> {
    let Some((hour, minute)) = value.split_once(':') else {
        anyhow::bail!("SESSION_SWEEP_TIME must be HH:MM, got '{value}'");
    };

    let hour: u8 = hour
        .parse()
        .with_context(|| format!("Invalid hour in SESSION_SWEEP_TIME '{value}'"))?;
    let minute: u8 = minute
        .parse()
        .with_context(|| format!("Invalid minute in SESSION_SWEEP_TIME '{value}'"))?;

    if hour > 23 || minute > 59 {
        anyhow::bail!("SESSION_SWEEP_TIME out of range: '{value}'");
    }

    Ok((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_sweep_time() {
        assert_eq!(parse_sweep_time("03:00").unwrap(), (3, 0));
        assert_eq!(parse_sweep_time("23:59").unwrap(), (23, 59));
        assert!(parse_sweep_time("24:00").is_err());
        assert!(parse_sweep_time("12:60").is_err());
        assert!(parse_sweep_time("noon").is_err());
        assert!(parse_sweep_time("").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_app_url() {
        let mut config = Config::default();
        config.general.app_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_cors() {
        let mut config = Config::default();
        config.server.cors_allowed_origins.clear();
        assert!(config.validate().is_err());
    }
}
