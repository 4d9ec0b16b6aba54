use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Runtime configuration, collected from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
    /// Default page size for paginated listings. Clients may override it
    /// with the `limit` query parameter, capped at [`MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Optional ingredient seed file imported at startup.
    pub ingredients_csv: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(addr) => addr.parse().context("BIND_ADDR is not a socket address")?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 3001)),
        };
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let page_size = match std::env::var("PAGE_SIZE") {
            Ok(raw) => raw
                .parse::<u32>()
                .context("PAGE_SIZE is not a number")?
                .clamp(1, MAX_PAGE_SIZE),
            Err(_) => 6,
        };
        let ingredients_csv = std::env::var("INGREDIENTS_CSV").map(PathBuf::from).ok();
        Ok(Config {
            database_url,
            bind_addr,
            media_root,
            page_size,
            ingredients_csv,
        })
    }
}
