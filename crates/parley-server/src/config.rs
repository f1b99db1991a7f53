use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-me";

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    /// Seconds between expired-session sweeps.
    pub cleanup_interval_secs: u64,
}

impl Config {
    /// Read `PARLEY_*` variables; call after `.env` is loaded.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("PARLEY_JWT_SECRET").unwrap_or_else(|_| {
            warn!("PARLEY_JWT_SECRET not set, using the development secret");
            DEV_SECRET.into()
        });
        let db_path = std::env::var("PARLEY_DB_PATH").unwrap_or_else(|_| "parley.db".into());
        let host = std::env::var("PARLEY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("PARLEY_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("PARLEY_PORT must be a port number")?;

        let cleanup_interval_secs: u64 = std::env::var("PARLEY_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .context("PARLEY_CLEANUP_INTERVAL_SECS must be a number of seconds")?;

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("PARLEY_HOST must be an IP address")?;

        Ok(Self {
            jwt_secret,
            db_path: PathBuf::from(db_path),
            addr,
            cleanup_interval_secs,
        })
    }
}
