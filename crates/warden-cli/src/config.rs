use serde::Deserialize;
use std::path::{Path, PathBuf};
use warden_core::session::SESSION_DURATION_ENV;
use warden_core::{SessionDuration, WardenError, WardenResult};
use warden_gateway::{GatewayConfig, DEFAULT_EXCLUDED_PATHS};
use warden_security::PII_FIELDS;
use warden_session::{SessionBackend, SessionConfig};
use warden_users::UsersConfig;

/// Cookie name override.
pub const SESSION_NAME_ENV: &str = "SESSION_NAME";
/// Session backend override, using the legacy backend names.
pub const AUTH_TYPE_ENV: &str = "AUTH_TYPE";

/// Everything `warden.toml` can hold. Every section is optional.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Root for sessions (`sessions/`) and the user database (`users.db`).
    pub data_dir: PathBuf,
    pub server: ServerConfig,
    pub session: SessionSection,
    pub users: UsersConfig,
    pub auth: AuthSection,
    pub logging: LoggingConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            server: ServerConfig::default(),
            session: SessionSection::default(),
            users: UsersConfig::default(),
            auth: AuthSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// `[session]`: the policy settings plus the cookie carrying the token.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub backend: SessionBackend,
    pub duration_secs: i64,
    pub reload: warden_session::ReloadStrategy,
    pub eager_purge: bool,
    pub cookie_name: String,
}

impl Default for SessionSection {
    fn default() -> Self {
        let policy = SessionConfig::default();
        Self {
            backend: policy.backend,
            duration_secs: policy.duration_secs,
            reload: policy.reload,
            eager_purge: policy.eager_purge,
            cookie_name: warden_gateway::server::DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Paths reachable without a session; `*` ends a prefix.
    pub excluded_paths: Vec<String>,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of text.
    pub json: bool,
    /// `field=value` pairs masked in every log line.
    pub redact_fields: Vec<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            redact_fields: PII_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl WardenConfig {
    /// Read `path`. A missing file yields the defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => toml::from_str(&text).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file '{}': {e}", path.display())
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file '{}': {e}",
                path.display()
            )),
        }
    }

    /// Apply `SESSION_DURATION`, `SESSION_NAME` and `AUTH_TYPE` as read through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> WardenResult<()> {
        if let Some(raw) = var(SESSION_DURATION_ENV) {
            self.session.duration_secs = SessionDuration::parse(&raw)?.as_secs();
        }
        if let Some(name) = var(SESSION_NAME_ENV) {
            if name.trim().is_empty() {
                return Err(WardenError::Config(format!("{SESSION_NAME_ENV} is empty")));
            }
            self.session.cookie_name = name.trim().to_string();
        }
        if let Some(kind) = var(AUTH_TYPE_ENV) {
            self.session.backend = kind.parse()?;
        }
        Ok(())
    }

    /// Policy settings, with session files under `data_dir/sessions`.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            backend: self.session.backend,
            duration_secs: self.session.duration_secs,
            reload: self.session.reload,
            eager_purge: self.session.eager_purge,
            data_dir: self.data_dir.join("sessions"),
        }
    }

    /// Cookie name and exclusions for the HTTP layer.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            cookie_name: self.session.cookie_name.clone(),
            excluded_paths: self.auth.excluded_paths.clone(),
        }
    }
}
