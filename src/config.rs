//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PORT` - Listen port (default: 8083)
//! - `DATABASE_URL` - `PostgreSQL` connection string; sessions are kept in memory when unset
//! - `NATS_URL` - NATS server for order events; events are only logged when unset
//! - `STOREFRONT_DISCOUNT_CODE` - The valid discount code (default: AURA10)
//! - `STOREFRONT_FLAT_DISCOUNT` - Rupees taken off by the code (default: 500)
//! - `STOREFRONT_TAX_RATE` - GST rate as a fraction (default: 0.18)
//! - `STOREFRONT_FREE_SHIPPING_THRESHOLD` - Subtotals above this ship free (default: 999)
//! - `STOREFRONT_SHIPPING_FEE` - Flat shipping fee otherwise (default: 99)
//! - `STOREFRONT_PAYMENT_DELAY_MS` - Simulated payment processing time (default: 1500)

use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::value_objects::{DiscountCode, Money};
use crate::pricing::PricingConfig;

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_PAYMENT_DELAY_MS: u64 = 1500;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub nats_url: Option<String>,
    pub pricing: PricingConfig,
    pub payment_delay: Duration,
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = PricingConfig::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discount_code = match var("STOREFRONT_DISCOUNT_CODE") {
            Some(raw) => DiscountCode::new(raw).map_err(|e| invalid("STOREFRONT_DISCOUNT_CODE", e))?,
            None => defaults.discount_code,
        };
        let tax_rate = parse_or(&var, "STOREFRONT_TAX_RATE", defaults.tax_rate)?;
        if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE {
            return Err(invalid("STOREFRONT_TAX_RATE", "must be between 0 and 1"));
        }

        let pricing = PricingConfig {
            discount_code,
            flat_discount: money_or(&var, "STOREFRONT_FLAT_DISCOUNT", defaults.flat_discount)?,
            tax_rate,
            free_shipping_threshold: money_or(&var, "STOREFRONT_FREE_SHIPPING_THRESHOLD", defaults.free_shipping_threshold)?,
            shipping_fee: money_or(&var, "STOREFRONT_SHIPPING_FEE", defaults.shipping_fee)?,
        };

        Ok(Self {
            port: parse_or(&var, "PORT", DEFAULT_PORT)?,
            database_url: var("DATABASE_URL"),
            nats_url: var("NATS_URL"),
            pricing,
            payment_delay: Duration::from_millis(parse_or(&var, "STOREFRONT_PAYMENT_DELAY_MS", DEFAULT_PAYMENT_DELAY_MS)?),
        })
    }
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason.to_string())
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(key, e)),
        None => Ok(default),
    }
}

fn money_or(var: &impl Fn(&str) -> Option<String>, key: &str, default: Money) -> Result<Money, ConfigError> {
    let amount: i64 = parse_or(var, key, default.amount())?;
    if amount < 0 { return Err(invalid(key, "must not be negative")); }
    Ok(Money::new(amount))
}
