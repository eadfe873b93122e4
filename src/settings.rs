use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_true")]
    pub run_migrations: bool,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: usize,

    #[serde(default)]
    pub storage_endpoint: Option<String>,

    #[serde(default = "default_storage_region")]
    pub storage_region: String,

    #[serde(default)]
    pub storage_bucket: String,

    #[serde(default)]
    pub storage_access_key_id: Option<String>,

    #[serde(default)]
    pub storage_secret_access_key: Option<String>,

    #[serde(default)]
    pub storage_public_url: String,

    #[serde(default)]
    pub storage_force_path_style: bool,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Posts-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_max_connections() -> u32 {
    20
}
fn default_true() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_page_size() -> u32 {
    10
}
fn default_max_page_size() -> u32 {
    100
}
fn default_max_upload_size_mb() -> usize {
    25
}
fn default_storage_region() -> String {
    "auto".to_string()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .try_parsing(true)
                    .ignore_empty(true)
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Fall back to the conventional unprefixed variables
        config.database_url = fill_or_env(config.database_url, "DATABASE_URL")?;
        config.storage_bucket = fill_or_env(config.storage_bucket, "R2_BUCKET")?;
        config.storage_public_url = fill_or_env(config.storage_public_url, "R2_PUBLIC_URL")?;

        if config.storage_endpoint.is_none() {
            config.storage_endpoint = env::var("R2_ENDPOINT").ok();
        }
        if config.storage_access_key_id.is_none() {
            config.storage_access_key_id = env::var("R2_ACCESS_KEY_ID").ok();
        }
        if config.storage_secret_access_key.is_none() {
            config.storage_secret_access_key = env::var("R2_SECRET_ACCESS_KEY").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.storage_bucket.trim().is_empty() {
            errors.push("Storage bucket cannot be empty");
        }
        if !is_http_url(&self.storage_public_url) {
            errors.push("Storage public URL must be an http(s) URL");
        }
        if let Some(endpoint) = &self.storage_endpoint {
            if !is_http_url(endpoint) {
                errors.push("Storage endpoint must be an http(s) URL");
            }
        }
        if self.storage_access_key_id.is_some() != self.storage_secret_access_key.is_some() {
            errors.push("Storage access key id and secret must be set together");
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            errors.push("Page sizes must be greater than zero");
        }
        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed the maximum page size");
        }
        if self.max_upload_size_mb == 0 {
            errors.push("Maximum upload size must be greater than zero");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|parsed| parsed.scheme() == "http" || parsed.scheme() == "https")
        .unwrap_or(false)
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            Some(value) => value.as_str().redact(),
            None => "[MISSING]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("database_max_connections", &self.database_max_connections)
            .field("run_migrations", &self.run_migrations)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("default_page_size", &self.default_page_size)
            .field("max_page_size", &self.max_page_size)
            .field("max_upload_size_mb", &self.max_upload_size_mb)
            .field("storage_endpoint", &self.storage_endpoint)
            .field("storage_region", &self.storage_region)
            .field("storage_bucket", &self.storage_bucket)
            .field("storage_access_key_id", &self.storage_access_key_id.redact())
            .field("storage_secret_access_key", &self.storage_secret_access_key.redact())
            .field("storage_public_url", &self.storage_public_url)
            .field("storage_force_path_style", &self.storage_force_path_style)
            .finish()
    }
}
