use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Receiving account and QR template for bank-transfer payments.
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub account_number: String,
    pub bank_name: String,
    pub code_prefix: String,
    pub qr_base_url: String,
    /// When set, webhook calls must present `Authorization: Apikey <key>`.
    pub webhook_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderPolicy {
    pub clear_cart_after_order: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub pool_size: u32,
    pub host: String,
    pub port: u16,
    pub payment: PaymentConfig,
    pub orders: OrderPolicy,
}

impl AppConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port_raw = or_default("PORT", "8080");
        let port = port_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "PORT",
            value: port_raw.clone(),
        })?;

        let pool_raw = or_default("DATABASE_POOL_SIZE", "10");
        let pool_size = pool_raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::Invalid {
                name: "DATABASE_POOL_SIZE",
                value: pool_raw.clone(),
            })?;

        let clear_raw = or_default("CLEAR_CART_AFTER_ORDER", "false");
        let clear_cart_after_order = match clear_raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => true,
            "0" | "false" | "no" => false,
            _ => {
                return Err(ConfigError::Invalid {
                    name: "CLEAR_CART_AFTER_ORDER",
                    value: clear_raw,
                })
            }
        };

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            pool_size,
            host: or_default("HOST", "0.0.0.0"),
            port,
            payment: PaymentConfig {
                account_number: required("PAYMENT_ACCOUNT_NUMBER")?,
                bank_name: required("PAYMENT_BANK_NAME")?,
                code_prefix: or_default("PAYMENT_CODE_PREFIX", "DH"),
                qr_base_url: or_default("PAYMENT_QR_BASE_URL", "https://qr.sepay.vn/img"),
                webhook_api_key: lookup("PAYMENT_WEBHOOK_API_KEY").filter(|k| !k.is_empty()),
            },
            orders: OrderPolicy {
                clear_cart_after_order,
            },
        })
    }
}
