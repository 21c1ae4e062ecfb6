use crate::router::PayrollPeriod;
use crate::session::{TokenConfig, DEFAULT_ACCESS_TTL_MINUTES, DEFAULT_REFRESH_TTL_HOURS};
use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the settings file looked up in the working directory and the secrets dir
pub const SETTINGS_FILE: &str = "Settings.toml";

/// Environment variable naming a directory whose `Settings.toml` wins over the local one
pub const SECRETS_DIR_ENV: &str = "PAYSLIP_SECRETS_DIR";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: basic_toml::Error,
    },

    #[error("logger initialization failed: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("invalid payroll period: {0}")]
    InvalidPayrollPeriod(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PayslipSettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub routing: RoutingSettings,
    pub logging: LoggingSettings,
    pub payroll: PayrollSettings,
    pub users: Vec<UserSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Access token lifetime in minutes
    pub access_ttl_minutes: i64,
    /// Refresh token (session) lifetime in hours
    pub refresh_ttl_hours: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Paths reachable without a bearer token; a trailing `*` makes an entry a prefix
    pub public_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

/// Currently open payroll period, RFC 3339 timestamps
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PayrollSettings {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub username: String,
    pub user_id: i64,
    /// argon2 PHC string, e.g. produced by `payslip hash-password`
    pub password_hash: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_ttl_hours: DEFAULT_REFRESH_TTL_HOURS,
        }
    }
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            public_paths: vec![
                "/ping".to_string(),
                "/api/login".to_string(),
                "/api/refresh".to_string(),
            ],
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PayslipSettings {
    /// Load settings from configuration files and environment variables, then
    /// initialize logging
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A settings file cannot be read or parsed
    /// - The logger is already initialized
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_env_file();

        let settings = Self::load_layered()?;
        Self::initialize_logger(&settings.logging.level)?;

        Ok(settings)
    }

    /// Settings files followed by environment overrides, without touching the logger
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load_layered() -> Result<Self, SettingsError> {
        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        Ok(settings)
    }

    /// `RUST_LOG` wins; otherwise the configured level is the default filter
    fn initialize_logger(level: &str) -> Result<(), SettingsError> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .try_init()?;
        Ok(())
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `PAYSLIP_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    fn load_base_settings() -> Result<Self, SettingsError> {
        let mut settings = Self::default();

        let default_config_path = PathBuf::from(SETTINGS_FILE);
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            println!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = Path::new(&secrets_dir).join(SETTINGS_FILE);
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                println!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                println!(
                    "ℹ {SECRETS_DIR_ENV} set but no {SETTINGS_FILE} found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        basic_toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_routing_env_overrides(&mut settings.routing);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        Self::apply_numeric_env_override(
            "ACCESS_TOKEN_TTL_MINUTES",
            &mut session_settings.access_ttl_minutes,
        );
        Self::apply_numeric_env_override(
            "REFRESH_TOKEN_TTL_HOURS",
            &mut session_settings.refresh_ttl_hours,
        );
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut i64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<i64>() {
                *target = value;
            }
        }
    }

    fn apply_routing_env_overrides(routing_settings: &mut RoutingSettings) {
        if let Ok(paths) = std::env::var("PUBLIC_PATHS") {
            routing_settings.public_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                let line = line.trim();
                if line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Token lifetimes for the session store
    ///
    /// Invalid lifetimes (non-positive, or access not shorter than refresh) fall
    /// back to the defaults with a warning.
    #[must_use]
    pub fn token_config(&self) -> TokenConfig {
        let configured = Duration::try_minutes(self.session.access_ttl_minutes)
            .zip(Duration::try_hours(self.session.refresh_ttl_hours))
            .and_then(|(access, refresh)| TokenConfig::new(access, refresh).ok());

        configured.unwrap_or_else(|| {
            warn!(
                "Invalid session lifetimes (access {}m, refresh {}h); using defaults",
                self.session.access_ttl_minutes, self.session.refresh_ttl_hours
            );
            TokenConfig::default()
        })
    }

    /// The configured payroll period, if both bounds are set
    ///
    /// # Errors
    ///
    /// Returns an error if only one bound is set, a bound is not RFC 3339, or the
    /// period does not end after it starts
    pub fn payroll_period(&self) -> Result<Option<PayrollPeriod>, SettingsError> {
        let (start, end) = match (&self.payroll.start, &self.payroll.end) {
            (None, None) => return Ok(None),
            (Some(start), Some(end)) => (parse_timestamp(start)?, parse_timestamp(end)?),
            _ => {
                return Err(SettingsError::InvalidPayrollPeriod(
                    "both start and end must be set".to_string(),
                ))
            }
        };

        if end <= start {
            return Err(SettingsError::InvalidPayrollPeriod(format!(
                "end {end} is not after start {start}"
            )));
        }

        Ok(Some(PayrollPeriod { start, end }))
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, SettingsError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| SettingsError::InvalidPayrollPeriod(format!("{value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clean_env_vars() {
        for var in [
            "HOST",
            "PORT",
            "CORS_ORIGINS",
            "ACCESS_TOKEN_TTL_MINUTES",
            "REFRESH_TOKEN_TTL_HOURS",
            "PUBLIC_PATHS",
            SECRETS_DIR_ENV,
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = PayslipSettings::default();
        assert_eq!(settings.session.access_ttl_minutes, 15);
        assert_eq!(settings.session.refresh_ttl_hours, 168);
        assert_eq!(
            settings.routing.public_paths,
            vec!["/ping", "/api/login", "/api/refresh"]
        );
        assert!(settings.users.is_empty());
        assert_eq!(settings.get_bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"
[session]
access_ttl_minutes = 5

[[users]]
username = "alice"
user_id = 7
password_hash = "$argon2id$v=19$m=1024,t=1,p=1$c29tZXNhbHQ$aGFzaA"
"#,
        )
        .unwrap();

        let settings = PayslipSettings::from_file(&path).unwrap();
        assert_eq!(settings.session.access_ttl_minutes, 5);
        assert_eq!(settings.session.refresh_ttl_hours, 168);
        assert_eq!(settings.application.port, 8080);
        assert_eq!(settings.users.len(), 1);
        assert_eq!(settings.users[0].user_id, 7);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "[session\naccess_ttl_minutes = ").unwrap();

        assert!(matches!(
            PayslipSettings::from_file(&path),
            Err(SettingsError::Parse { .. })
        ));
        assert!(matches!(
            PayslipSettings::from_file(&dir.path().join("missing.toml")),
            Err(SettingsError::Io { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_secrets_dir_overrides_and_env_wins() {
        clean_env_vars();

        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "[application]\nport = 9000\nhost = \"127.0.0.1\"\n",
        )
        .unwrap();
        std::env::set_var(SECRETS_DIR_ENV, dir.path());

        let settings = PayslipSettings::load_layered().unwrap();
        assert_eq!(settings.get_bind_address(), "127.0.0.1:9000");

        std::env::set_var("PORT", "9100");
        let settings = PayslipSettings::load_layered().unwrap();
        assert_eq!(settings.application.port, 9100);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_session_env_override() {
        clean_env_vars();

        let mut session_settings = SessionSettings::default();
        std::env::set_var("ACCESS_TOKEN_TTL_MINUTES", "30");
        std::env::set_var("REFRESH_TOKEN_TTL_HOURS", "not-a-number");

        PayslipSettings::apply_session_env_overrides(&mut session_settings);

        assert_eq!(session_settings.access_ttl_minutes, 30);
        assert_eq!(session_settings.refresh_ttl_hours, 168);

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_public_paths_env_override() {
        clean_env_vars();

        let mut routing = RoutingSettings::default();
        std::env::set_var("PUBLIC_PATHS", "/ping, /docs/*,,");
        PayslipSettings::apply_routing_env_overrides(&mut routing);
        assert_eq!(routing.public_paths, vec!["/ping", "/docs/*"]);

        clean_env_vars();
    }

    #[test]
    fn test_invalid_lifetimes_fall_back_to_defaults() {
        let mut settings = PayslipSettings::default();
        settings.session.access_ttl_minutes = 60 * 24 * 30;
        settings.session.refresh_ttl_hours = 1;

        assert_eq!(settings.token_config(), TokenConfig::default());

        settings.session.access_ttl_minutes = 10;
        settings.session.refresh_ttl_hours = 2;
        assert_eq!(settings.token_config().access_ttl(), Duration::minutes(10));
    }

    #[test]
    fn test_payroll_period_parsing() {
        let mut settings = PayslipSettings::default();
        assert!(settings.payroll_period().unwrap().is_none());

        settings.payroll.start = Some("2026-10-01T00:00:00Z".to_string());
        assert!(settings.payroll_period().is_err());

        settings.payroll.end = Some("2026-10-31T23:59:59+00:00".to_string());
        let period = settings.payroll_period().unwrap().unwrap();
        assert!(period.end > period.start);

        settings.payroll.end = Some("2026-09-01T00:00:00Z".to_string());
        assert!(settings.payroll_period().is_err());

        settings.payroll.end = Some("next tuesday".to_string());
        assert!(matches!(
            settings.payroll_period(),
            Err(SettingsError::InvalidPayrollPeriod(_))
        ));
    }

    #[test]
    fn test_cors_origins_split() {
        let mut settings = PayslipSettings::default();
        settings.application.cors_origins = "https://a.example, https://b.example,".to_string();
        assert_eq!(
            settings.get_cors_origins(),
            vec!["https://a.example", "https://b.example"]
        );
    }
}
