use axum::http::HeaderValue;
use std::error::Error;
use std::net::SocketAddr;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/cmdb.db";
const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind: SocketAddr,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    pub max_connections: u32,
}

impl Config {
    /// Reads `DATABASE_URL`, `CMDB_BIND`, `CMDB_CORS_ORIGINS` and
    /// `CMDB_MAX_CONNECTIONS`. Call `dotenvy::dotenv()` first to honour a `.env` file.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Box<dyn Error>> {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let bind_raw = lookup("CMDB_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .map_err(|e| format!("invalid CMDB_BIND {bind_raw:?}: {e}"))?;

        let max_connections = match lookup("CMDB_MAX_CONNECTIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(format!("invalid CMDB_MAX_CONNECTIONS {raw:?}").into()),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let cors_origins = parse_origins(lookup("CMDB_CORS_ORIGINS").as_deref())?;

        Ok(Self {
            database_url,
            bind,
            cors_origins,
            max_connections,
        })
    }
}

fn parse_origins(raw: Option<&str>) -> Result<Vec<String>, Box<dyn Error>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut origins = Vec::new();
    for origin in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if origin == "*" {
            return Ok(Vec::new());
        }
        HeaderValue::from_str(origin).map_err(|e| format!("invalid CORS origin {origin:?}: {e}"))?;
        origins.push(origin.to_string());
    }
    Ok(origins)
}
