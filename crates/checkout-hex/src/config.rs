use std::env;

/// Runtime settings for the checkout service, read once at startup.
///
/// `SERVER_PORT` picks the listen port, `DATABASE_URL` selects the sqlite
/// store when set (the memory store serves otherwise), and `RUST_LOG`
/// feeds the tracing filter.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        let database_url = env::var("DATABASE_URL").ok();
        let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "debug".into());
        Ok(Self {
            server_port,
            database_url,
            log_filter,
        })
    }
}
