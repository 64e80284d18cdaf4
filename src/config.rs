use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{SheetsError, SheetsResult};

pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const DEFAULT_TIMEZONE: &str = "Europe/Vienna";
pub const DEFAULT_UNIVERSE_DOMAIN: &str = "googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub credentials: ServiceAccountConfig,
    /// OAuth scopes requested for the service account.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Spreadsheet opened when `connect_to_spreadsheet` is called without an id.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub logger: LoggerConfig,
    /// Per-request transport timeout. The writer itself never times out.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// The service-account key fields, one per `GOOGLE_*` variable.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServiceAccountConfig {
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    pub private_key: Option<String>,
    pub client_email: Option<String>,
    pub client_id: Option<String>,
    pub auth_uri: Option<String>,
    pub token_uri: Option<String>,
    pub auth_provider_x509_cert_url: Option<String>,
    pub client_x509_cert_url: Option<String>,
    pub universe_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// IANA zone every timestamp is rendered in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Attempts used by the writer operations that don't take an explicit count.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            credentials: ServiceAccountConfig::default(),
            scopes: default_scopes(),
            spreadsheet_id: None,
            logger: LoggerConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_scopes() -> Vec<String> {
    vec![DEFAULT_SCOPE.to_string()]
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Splits a comma-separated scope list, dropping blanks.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl SheetsConfig {
    /// Builds a config purely from the process environment.
    pub fn from_env() -> SheetsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, starting from defaults.
    pub fn from_lookup<F>(lookup: F) -> SheetsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Overwrites every field whose variable is set and non-empty.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> SheetsResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let creds = &mut self.credentials;
        let fields: [(&str, &mut Option<String>); 11] = [
            ("GOOGLE_TYPE", &mut creds.account_type),
            ("GOOGLE_PROJECT_ID", &mut creds.project_id),
            ("GOOGLE_PRIVATE_KEY_ID", &mut creds.private_key_id),
            ("GOOGLE_PRIVATE_KEY", &mut creds.private_key),
            ("GOOGLE_CLIENT_EMAIL", &mut creds.client_email),
            ("GOOGLE_CLIENT_ID", &mut creds.client_id),
            ("GOOGLE_AUTH_URI", &mut creds.auth_uri),
            ("GOOGLE_TOKEN_URI", &mut creds.token_uri),
            ("GOOGLE_AUTH_PROVIDER_X509_CERT_URL", &mut creds.auth_provider_x509_cert_url),
            ("GOOGLE_CLIENT_X509_CERT_URL", &mut creds.client_x509_cert_url),
            ("GOOGLE_UNIVERSE_DOMAIN", &mut creds.universe_domain),
        ];
        for (key, slot) in fields {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }

        if let Some(raw) = get("GOOGLE_SHEETS_SCOPE") {
            self.scopes = parse_scopes(&raw);
        }
        if let Some(id) = get("SPREADSHEET_ID") {
            self.spreadsheet_id = Some(id);
        }
        if let Some(tz) = get("SHEETLOG_TIMEZONE") {
            self.logger.timezone = tz;
        }
        if let Some(raw) = get("SHEETLOG_RETRY_ATTEMPTS") {
            self.logger.retry_attempts = raw.trim().parse().map_err(|_| {
                SheetsError::Config(format!("SHEETLOG_RETRY_ATTEMPTS is not a number: '{raw}'"))
            })?;
        }
        if let Some(raw) = get("SHEETLOG_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = raw.trim().parse().map_err(|_| {
                SheetsError::Config(format!(
                    "SHEETLOG_REQUEST_TIMEOUT_SECS is not a number: '{raw}'"
                ))
            })?;
        }
        self.validate()
    }

    /// Rejects values the writer cannot honor.
    pub fn validate(&self) -> SheetsResult<()> {
        if self.logger.retry_attempts == 0 {
            return Err(SheetsError::Config("retry_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn timezone(&self) -> SheetsResult<Tz> {
        self.logger.timezone.parse::<Tz>().map_err(|e| {
            SheetsError::Config(format!("unknown time zone '{}': {e}", self.logger.timezone))
        })
    }

    pub fn universe_domain(&self) -> &str {
        self.credentials
            .universe_domain
            .as_deref()
            .unwrap_or(DEFAULT_UNIVERSE_DOMAIN)
    }

    /// Scopes with the spreadsheets scope substituted when none were configured.
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            default_scopes()
        } else {
            self.scopes.clone()
        }
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join("config.toml");
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Some(candidate);
            }
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        let candidate = cwd.join("config.toml");
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in working directory");
            return Some(candidate);
        }
    }

    let candidate = dirs::config_dir()?.join("sheetlog").join("config.toml");
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in user config directory");
        return Some(candidate);
    }
    None
}

pub fn load_config_from(path: &Path) -> SheetsResult<SheetsConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: SheetsConfig = toml::from_str(&content)?;
    config.validate()?;
    tracing::info!(path = %path.display(), "config file loaded");
    Ok(config)
}

/// Reads `config.toml` if one exists, then lets environment variables win.
pub fn load_config() -> SheetsResult<SheetsConfig> {
    let mut config = match resolve_config_path() {
        Some(path) => load_config_from(&path)?,
        None => {
            tracing::debug!("no config.toml found, using environment only");
            SheetsConfig::default()
        }
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;
    tracing::info!(
        spreadsheet = config.spreadsheet_id.as_deref().unwrap_or("<unset>"),
        timezone = %config.logger.timezone,
        scopes = config.scopes.len(),
        "config loaded"
    );
    Ok(config)
}
