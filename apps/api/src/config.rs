//! Environment-driven configuration with sensible local defaults.

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Path to the SQLite database file.
    pub database_path: String,
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("VIAJES_DATABASE_PATH")
                .unwrap_or_else(|_| "viajes.db".to_string()),
            bind_addr: std::env::var("VIAJES_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
        }
    }
}
