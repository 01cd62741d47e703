//! Configuration module for DriveArchive.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DriveArchive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub auth: AuthConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Local tree and listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Local directory whose contents are mirrored to Drive.
    pub root: PathBuf,
    /// Listing page size. `None` leaves the server default in place.
    pub page_size: Option<u32>,
}

/// How the bearer token is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Signed JWT assertion from a service-account key file.
    ServiceAccount,
    /// Refresh token persisted by an earlier interactive login.
    StoredCredential,
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Service-account key JSON (`private_key`, `client_email`).
    pub service_account_key: PathBuf,
    /// Assertion issuer. Defaults to the key file's `client_email`.
    pub issuer: Option<String>,
    /// OAuth scope requested by the assertion.
    pub scope: String,
    /// Stored credential JSON (`access_token`, `refresh_token`, `expires_at`).
    pub stored_credential: PathBuf,
    /// Installed-app client secrets JSON (`installed.client_id`, `installed.client_secret`).
    pub client_secrets: PathBuf,
    /// Tokens expiring within this many seconds are treated as expired.
    pub refresh_margin_secs: u64,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Overall per-request timeout in seconds (uploads included).
    pub request_timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    ///
    /// Path settings written as `~/...` are expanded against the home
    /// directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.expand_paths();
        Ok(config)
    }

    /// Expand a leading `~` in every path setting.
    pub fn expand_paths(&mut self) {
        self.sync.root = expand_tilde(&self.sync.root);
        self.auth.service_account_key = expand_tilde(&self.auth.service_account_key);
        self.auth.stored_credential = expand_tilde(&self.auth.stored_credential);
        self.auth.client_secrets = expand_tilde(&self.auth.client_secrets);
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/drivearchive/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        config_dir().join("config.yaml")
    }
}

/// Expand a leading `~` component to the user's home directory.
///
/// `~user` forms and paths without a leading `~` are returned unchanged, as
/// is everything when no home directory is known.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("drivearchive")
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Scope that lets the archive see and create only the files it created.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("Archive"),
            page_size: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        let dir = config_dir();
        Self {
            method: AuthMethod::ServiceAccount,
            service_account_key: dir.join("service_account.json"),
            issuer: None,
            scope: DEFAULT_SCOPE.to_string(),
            stored_credential: dir.join("stored_credential.json"),
            client_secrets: dir.join("google.credentials.json"),
            refresh_margin_secs: 60,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            request_timeout_secs: 30 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"http.connect_timeout_secs"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Drive rejects page sizes outside this range.
const MAX_PAGE_SIZE: u32 = 1000;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Only the files the
    /// selected auth method actually reads are checked for existence.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- sync ---
        if !self.sync.root.is_dir() {
            errors.push(ValidationError {
                field: "sync.root".into(),
                message: format!("directory does not exist: {}", self.sync.root.display()),
            });
        }
        if let Some(size) = self.sync.page_size {
            if size == 0 || size > MAX_PAGE_SIZE {
                errors.push(ValidationError {
                    field: "sync.page_size".into(),
                    message: format!("must be between 1 and {MAX_PAGE_SIZE}"),
                });
            }
        }

        // --- auth ---
        match self.auth.method {
            AuthMethod::ServiceAccount => {
                check_file(
                    &mut errors,
                    "auth.service_account_key",
                    &self.auth.service_account_key,
                );
            }
            AuthMethod::StoredCredential => {
                check_file(&mut errors, "auth.stored_credential", &self.auth.stored_credential);
                check_file(&mut errors, "auth.client_secrets", &self.auth.client_secrets);
            }
        }
        if self.auth.scope.trim().is_empty() {
            errors.push(ValidationError {
                field: "auth.scope".into(),
                message: "must not be empty".into(),
            });
        }
        if matches!(self.auth.issuer.as_deref(), Some(s) if s.trim().is_empty()) {
            errors.push(ValidationError {
                field: "auth.issuer".into(),
                message: "must not be empty when set".into(),
            });
        }

        // --- http ---
        if self.http.connect_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "http.connect_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "http.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.http.request_timeout_secs < self.http.connect_timeout_secs {
            errors.push(ValidationError {
                field: "http.request_timeout_secs".into(),
                message: "must not be shorter than http.connect_timeout_secs".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid log level '{}'; expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

fn check_file(errors: &mut Vec<ValidationError>, field: &str, path: &Path) {
    if !path.is_file() {
        errors.push(ValidationError {
            field: field.into(),
            message: format!("file does not exist: {}", path.display()),
        });
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Config`], starting from defaults.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder pre-filled with [`Config::default`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn sync_page_size(mut self, size: u32) -> Self {
        self.config.sync.page_size = Some(size);
        self
    }

    // --- auth ---

    pub fn auth_method(mut self, method: AuthMethod) -> Self {
        self.config.auth.method = method;
        self
    }

    pub fn auth_service_account_key(mut self, path: PathBuf) -> Self {
        self.config.auth.service_account_key = path;
        self
    }

    pub fn auth_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.config.auth.issuer = Some(issuer.into());
        self
    }

    pub fn auth_scope(mut self, scope: impl Into<String>) -> Self {
        self.config.auth.scope = scope.into();
        self
    }

    pub fn auth_stored_credential(mut self, path: PathBuf) -> Self {
        self.config.auth.stored_credential = path;
        self
    }

    pub fn auth_client_secrets(mut self, path: PathBuf) -> Self {
        self.config.auth.client_secrets = path;
        self
    }

    pub fn auth_refresh_margin_secs(mut self, secs: u64) -> Self {
        self.config.auth.refresh_margin_secs = secs;
        self
    }

    // --- http ---

    pub fn http_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.connect_timeout_secs = secs;
        self
    }

    pub fn http_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.request_timeout_secs = secs;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
