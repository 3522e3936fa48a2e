use std::{env, net::SocketAddr, path::PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub upload_root: PathBuf,
    /// URL prefix under which `upload_root` is publicly served.
    pub public_upload_base: String,
    pub cookie_secret: String,
    pub mapbox_token: Option<String>,
    pub opencage_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://journal.db".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let upload_root = env::var("UPLOAD_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let public_upload_base = env::var("PUBLIC_UPLOAD_BASE")
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "/uploads".to_string());

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-travel-journal-cookie-secret".to_string());

        Ok(Self {
            database_url,
            listen_addr,
            upload_root,
            public_upload_base,
            cookie_secret,
            mapbox_token: non_empty_var("MAPBOX_ACCESS_TOKEN"),
            opencage_key: non_empty_var("OPENCAGE_API_KEY"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
