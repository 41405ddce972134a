use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use chrono::FixedOffset;

use crate::{departure::parse_utc_offset, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    File,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "file" => Ok(StorageBackend::File),
            other => Err(AppError::Config(format!(
                "invalid APP_STORAGE {other:?}, expected sqlite or file"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub storage: StorageBackend,
    pub database_url: String,
    pub data_root: PathBuf,
    pub utc_offset: FixedOffset,
    pub refresh_interval: Duration,
    pub default_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let storage = env::var("APP_STORAGE")
            .map(|raw| raw.parse::<StorageBackend>())
            .unwrap_or(Ok(StorageBackend::Sqlite))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://viagens.db".to_string());

        let data_root = env::var("DATA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let utc_offset = parse_utc_offset(
            &env::var("APP_UTC_OFFSET").unwrap_or_else(|_| "-03:00".to_string()),
        )?;

        let refresh_ms: u64 = env::var("APP_REFRESH_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_REFRESH_MS: {err}")))?;
        if refresh_ms == 0 {
            return Err(AppError::Config("APP_REFRESH_MS must be positive".into()));
        }

        let default_origin =
            env::var("APP_DEFAULT_ORIGIN").unwrap_or_else(|_| "São Paulo".to_string());

        Ok(Self {
            listen_addr,
            storage,
            database_url,
            data_root,
            utc_offset,
            refresh_interval: Duration::from_millis(refresh_ms),
            default_origin,
        })
    }

    pub fn refresh_ms(&self) -> u128 {
        self.refresh_interval.as_millis()
    }
}
