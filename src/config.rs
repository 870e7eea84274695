use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Listed-issues workbook published by JPX (updated monthly)
pub const DEFAULT_JPX_DATA_URL: &str =
    "https://www.jpx.co.jp/markets/statistics-equities/misc/tvdivq0000001vg2-att/data_j.xls";

/// Below this many parsed listings a scrape is treated as broken
pub const DEFAULT_MIN_STOCK_COUNT: usize = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    // Shared secret for the admin routes
    pub admin_api_key: Option<String>,
    // JPX download
    pub jpx_data_url: String,
    pub jpx_download_timeout_secs: u64,
    // Persisted master
    pub tse_master_path: PathBuf,
    pub tse_min_stock_count: usize,
    // CORS configuration
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3001,
            admin_api_key: None,
            jpx_data_url: DEFAULT_JPX_DATA_URL.to_string(),
            jpx_download_timeout_secs: 30,
            tse_master_path: PathBuf::from("data/tse-stocks.json"),
            tse_min_stock_count: DEFAULT_MIN_STOCK_COUNT,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // Try to load .env from current directory first, then parent
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_path(std::path::Path::new("../.env"));
        }

        let defaults = Self::default();

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|v| !v.is_empty()),
            jpx_data_url: env::var("JPX_DATA_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.jpx_data_url),
            jpx_download_timeout_secs: parse_or(
                "JPX_DOWNLOAD_TIMEOUT_SECS",
                defaults.jpx_download_timeout_secs,
            ),
            tse_master_path: env::var("TSE_MASTER_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.tse_master_path),
            tse_min_stock_count: parse_or("TSE_MIN_STOCK_COUNT", defaults.tse_min_stock_count),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| split_origins(&v))
                .unwrap_or(defaults.cors_allowed_origins),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("⚠️ {}={:?} is not a valid number, using {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
