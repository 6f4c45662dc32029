use std::{env, str::FromStr};

use anyhow::{Context, bail};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND `{other}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub tax_rate: Decimal,
    pub notify_on_checkout: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Postgres,
        };
        let database_url = env::var("DATABASE_URL").ok();
        if backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL must be set when STORE_BACKEND is postgres");
        }
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(value) => parse_port(&value)?,
            Err(_) => 3000,
        };
        let tax_rate = match env::var("TAX_RATE") {
            Ok(value) => Decimal::from_str(value.trim())
                .with_context(|| format!("TAX_RATE `{value}` is not a decimal"))?,
            Err(_) => default_tax_rate(),
        };
        if tax_rate.is_sign_negative() {
            bail!("TAX_RATE must not be negative");
        }
        let notify_on_checkout = match env::var("NOTIFY_ON_CHECKOUT") {
            Ok(value) => parse_flag("NOTIFY_ON_CHECKOUT", &value)?,
            Err(_) => true,
        };

        Ok(Self {
            backend,
            database_url,
            host,
            port,
            tax_rate,
            notify_on_checkout,
        })
    }

    /// Database URL for binaries that only make sense against Postgres.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 3000,
            tax_rate: default_tax_rate(),
            notify_on_checkout: false,
        }
    }
}

pub fn default_tax_rate() -> Decimal {
    Decimal::new(10, 2)
}

fn parse_port(value: &str) -> anyhow::Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .with_context(|| format!("APP_PORT `{value}` is not a valid port"))
}

fn parse_flag(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => bail!("{name} `{value}` is not a boolean"),
    }
}
