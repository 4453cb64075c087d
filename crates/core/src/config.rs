use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub dialog: DialogConfig,
    pub search: SearchConfig,
    pub price: PriceConfig,
    pub audit: AuditConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Dialog engine connection settings. `workspace_id` is deliberately
/// optional: a missing workspace is answered per request with an
/// instructional payload instead of failing startup.
#[derive(Clone, Debug)]
pub struct DialogConfig {
    pub url: String,
    pub workspace_id: Option<String>,
    pub username: SecretString,
    pub password: SecretString,
    pub version_date: String,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub url: String,
    pub username: SecretString,
    pub password: SecretString,
    pub version_date: String,
    pub environment_id: String,
    pub collection_id: String,
}

#[derive(Clone, Debug)]
pub struct PriceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Audit logging is enabled by the presence of `database_url`. When enabled,
/// both admin credentials are required and validated at startup.
#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub database_url: Option<String>,
    pub user: Option<String>,
    pub pass: Option<SecretString>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            user: None,
            pass: None,
            max_connections: 5,
            acquire_timeout_secs: 30,
        }
    }
}

impl AuditConfig {
    pub fn enabled(&self) -> bool {
        self.database_url.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub static_dir: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub workspace_id: Option<String>,
    pub dialog_url: Option<String>,
    pub search_url: Option<String>,
    pub price_base_url: Option<String>,
    pub audit_database_url: Option<String>,
    pub audit_user: Option<String>,
    pub audit_pass: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dialog: DialogConfig {
                url: "https://gateway.watsonplatform.net/conversation/api".to_string(),
                workspace_id: None,
                username: String::new().into(),
                password: String::new().into(),
                version_date: "2016-07-11".to_string(),
            },
            search: SearchConfig {
                url: String::new(),
                username: String::new().into(),
                password: String::new().into(),
                version_date: String::new(),
                environment_id: String::new(),
                collection_id: String::new(),
            },
            price: PriceConfig {
                base_url: "https://api.coinmarketcap.com/v1".to_string(),
                timeout_secs: 10,
            },
            audit: AuditConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                static_dir: "public".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("coinbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(dialog) = patch.dialog {
            if let Some(url) = dialog.url {
                self.dialog.url = url;
            }
            if let Some(workspace_id) = dialog.workspace_id {
                self.dialog.workspace_id = Some(workspace_id);
            }
            if let Some(dialog_username_value) = dialog.username {
                self.dialog.username = secret_value(dialog_username_value);
            }
            if let Some(dialog_password_value) = dialog.password {
                self.dialog.password = secret_value(dialog_password_value);
            }
            if let Some(version_date) = dialog.version_date {
                self.dialog.version_date = version_date;
            }
        }

        if let Some(search) = patch.search {
            if let Some(url) = search.url {
                self.search.url = url;
            }
            if let Some(search_username_value) = search.username {
                self.search.username = secret_value(search_username_value);
            }
            if let Some(search_password_value) = search.password {
                self.search.password = secret_value(search_password_value);
            }
            if let Some(version_date) = search.version_date {
                self.search.version_date = version_date;
            }
            if let Some(environment_id) = search.environment_id {
                self.search.environment_id = environment_id;
            }
            if let Some(collection_id) = search.collection_id {
                self.search.collection_id = collection_id;
            }
        }

        if let Some(price) = patch.price {
            if let Some(base_url) = price.base_url {
                self.price.base_url = base_url;
            }
            if let Some(timeout_secs) = price.timeout_secs {
                self.price.timeout_secs = timeout_secs;
            }
        }

        if let Some(audit) = patch.audit {
            if let Some(database_url) = audit.database_url {
                self.audit.database_url = Some(database_url);
            }
            if let Some(user) = audit.user {
                self.audit.user = Some(user);
            }
            if let Some(audit_pass_value) = audit.pass {
                self.audit.pass = Some(secret_value(audit_pass_value));
            }
            if let Some(max_connections) = audit.max_connections {
                self.audit.max_connections = max_connections;
            }
            if let Some(acquire_timeout_secs) = audit.acquire_timeout_secs {
                self.audit.acquire_timeout_secs = acquire_timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(static_dir) = server.static_dir {
                self.server.static_dir = static_dir;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    // Environment keys mirror the deployment surface this service replaces,
    // so an existing env file keeps working unchanged.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WORKSPACE_ID") {
            self.dialog.workspace_id = Some(value);
        }
        if let Some(value) = read_env("CONVERSATION_URL") {
            self.dialog.url = value;
        }
        if let Some(value) = read_env("CONVERSATION_USERNAME") {
            self.dialog.username = secret_value(value);
        }
        if let Some(value) = read_env("CONVERSATION_PASSWORD") {
            self.dialog.password = secret_value(value);
        }

        if let Some(value) = read_env("DISCOVERY_URL") {
            self.search.url = value;
        }
        if let Some(value) = read_env("DISCOVERY_USERNAME") {
            self.search.username = secret_value(value);
        }
        if let Some(value) = read_env("DISCOVERY_PASSWORD") {
            self.search.password = secret_value(value);
        }
        if let Some(value) = read_env("VERSION_DATE") {
            self.search.version_date = value;
        }
        if let Some(value) = read_env("ENVIRONMENT_ID") {
            self.search.environment_id = value;
        }
        if let Some(value) = read_env("COLLECTION_ID") {
            self.search.collection_id = value;
        }

        // Audit logging switches on when the store URL is present.
        if let Some(value) = read_env("CLOUDANT_URL") {
            self.audit.database_url = Some(value);
        }
        if let Some(value) = read_env("LOG_USER") {
            self.audit.user = Some(value);
        }
        if let Some(value) = read_env("LOG_PASS") {
            self.audit.pass = Some(secret_value(value));
        }
        if let Some(value) = read_env("COINBOT_AUDIT_MAX_CONNECTIONS") {
            self.audit.max_connections = parse_u32("COINBOT_AUDIT_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("COINBOT_AUDIT_ACQUIRE_TIMEOUT_SECS") {
            self.audit.acquire_timeout_secs =
                parse_u64("COINBOT_AUDIT_ACQUIRE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("COINBOT_PRICE_BASE_URL") {
            self.price.base_url = value;
        }
        if let Some(value) = read_env("COINBOT_PRICE_TIMEOUT_SECS") {
            self.price.timeout_secs = parse_u64("COINBOT_PRICE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("COINBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("COINBOT_SERVER_PORT") {
            self.server.port = parse_u16("COINBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("COINBOT_SERVER_STATIC_DIR") {
            self.server.static_dir = value;
        }

        if let Some(value) = read_env("COINBOT_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("COINBOT_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(workspace_id) = overrides.workspace_id {
            self.dialog.workspace_id = Some(workspace_id);
        }
        if let Some(dialog_url) = overrides.dialog_url {
            self.dialog.url = dialog_url;
        }
        if let Some(search_url) = overrides.search_url {
            self.search.url = search_url;
        }
        if let Some(price_base_url) = overrides.price_base_url {
            self.price.base_url = price_base_url;
        }
        if let Some(audit_database_url) = overrides.audit_database_url {
            self.audit.database_url = Some(audit_database_url);
        }
        if let Some(audit_user) = overrides.audit_user {
            self.audit.user = Some(audit_user);
        }
        if let Some(audit_pass_value) = overrides.audit_pass {
            self.audit.pass = Some(secret_value(audit_pass_value));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_price(&self.price)?;
        validate_audit(&self.audit)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("coinbot.toml"), PathBuf::from("config/coinbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_price(price: &PriceConfig) -> Result<(), ConfigError> {
    if !price.base_url.starts_with("http://") && !price.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "price.base_url must start with http:// or https://".to_string(),
        ));
    }

    if price.timeout_secs == 0 || price.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "price.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_audit(audit: &AuditConfig) -> Result<(), ConfigError> {
    if !audit.enabled() {
        return Ok(());
    }

    let user_missing = audit.user.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
    let pass_missing = audit
        .pass
        .as_ref()
        .map(|value| value.expose_secret().trim().is_empty())
        .unwrap_or(true);
    if user_missing || pass_missing {
        return Err(ConfigError::Validation(
            "LOG_USER and LOG_PASS are both required when audit logging is enabled".to_string(),
        ));
    }

    let url = audit.database_url.as_deref().unwrap_or_default().trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "audit.database_url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if audit.max_connections == 0 || audit.max_connections > 64 {
        return Err(ConfigError::Validation(
            "audit.max_connections must be in range 1..=64".to_string(),
        ));
    }

    if audit.acquire_timeout_secs == 0 || audit.acquire_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "audit.acquire_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    dialog: Option<DialogPatch>,
    search: Option<SearchPatch>,
    price: Option<PricePatch>,
    audit: Option<AuditPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    url: Option<String>,
    workspace_id: Option<String>,
    username: Option<String>,
    password: Option<String>,
    version_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    version_date: Option<String>,
    environment_id: Option<String>,
    collection_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PricePatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuditPatch {
    database_url: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    static_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
