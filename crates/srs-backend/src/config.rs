use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use srs_algo::ClassifierThresholds;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub database_url: String,
    pub thresholds: ClassifierThresholds,
    pub due_limit_default: i64,
    pub recompute_cron: String,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://srs.db?mode=rwc".to_string());

        let defaults = ClassifierThresholds::default();
        let thresholds = ClassifierThresholds {
            slow_response_ms: env_i64("SLOW_RESPONSE_MS", defaults.slow_response_ms),
            fast_response_ms: env_i64("FAST_RESPONSE_MS", defaults.fast_response_ms),
        };

        let due_limit_default = env_i64("DUE_LIMIT_DEFAULT", 20);

        // every 15 minutes
        let recompute_cron = std::env::var("PRIORITY_RECOMPUTE_CRON")
            .unwrap_or_else(|_| "0 */15 * * * *".to_string());

        Self {
            host,
            port,
            log_level,
            database_url,
            thresholds,
            due_limit_default,
            recompute_cron,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(default)
}
