use crate::constants::{
    DEFAULT_APP_LOG_CAPACITY, DEFAULT_CURRENCY, DEFAULT_SETTLEMENT_MAX_ITERATIONS, DEFAULT_SETTLEMENT_MAX_TRANSFERS,
};
use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    /// Applied to expenses created without a currency.
    pub default_currency: String,
    pub settlement_max_iterations: usize,
    pub settlement_max_transfers: usize,
    /// Entries kept by the in-memory action log before the oldest are dropped.
    pub app_log_capacity: usize,
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            default_currency: env::var("DEFAULT_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY.to_string()),
            settlement_max_iterations: env::var("SETTLEMENT_MAX_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SETTLEMENT_MAX_ITERATIONS),
            settlement_max_transfers: env::var("SETTLEMENT_MAX_TRANSFERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SETTLEMENT_MAX_TRANSFERS),
            app_log_capacity: env::var("APP_LOG_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_APP_LOG_CAPACITY),
        }
    }
}

// Global static accessible everywhere
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
