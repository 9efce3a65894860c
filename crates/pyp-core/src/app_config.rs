use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server-side configuration, read from the environment at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl_hours: u64,
    /// The only email allowed to sign in with the admin role.
    pub admin_email: String,
    pub email_user: Option<String>,
    pub email_pass: Option<String>,
    pub email_api_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub http_timeout_secs: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("database_url", &"[redacted]")
            .field("jwt_secret", &"[redacted]")
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("admin_email", &self.admin_email)
            .field("email_user", &self.email_user)
            .field("email_pass", &self.email_pass.as_ref().map(|_| "[redacted]"))
            .field("email_api_url", &self.email_api_url)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}

/// Client-side configuration for the storefront and the CLI.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub api_base_url: String,
    /// Directory holding the locally persisted session and cart.
    pub state_dir: PathBuf,
    pub http_timeout_secs: u64,
}
