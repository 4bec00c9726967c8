//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Output file name used when the request does not supply one
pub const DEFAULT_OUTPUT_FILE: &str = "combined_output.txt";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Combine pipeline configuration
    pub combine: CombineConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Maximum accepted request body size (in bytes)
    pub max_upload_bytes: usize,
}

/// Combine pipeline configuration
#[derive(Debug, Clone)]
pub struct CombineConfig {
    /// Root directory for per-request temporary storage
    pub temp_root: PathBuf,
    /// Timeout for reading a single uploaded file (in seconds)
    pub read_timeout_secs: u64,
    /// Output file name when `outputFile` is absent
    pub default_output_file: String,
}

impl CombineConfig {
    /// Get the per-file read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            temp_root: env::temp_dir(),
            read_timeout_secs: 30,
            default_output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = CombineConfig::default();
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(3000),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|b| b.parse().ok())
                    .unwrap_or(512 * 1024 * 1024),
            },
            combine: CombineConfig {
                temp_root: env::var_os("COMBINE_TEMP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.temp_root),
                read_timeout_secs: env::var("READ_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(defaults.read_timeout_secs),
                default_output_file: env::var("DEFAULT_OUTPUT_FILE")
                    .ok()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or(defaults.default_output_file),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
