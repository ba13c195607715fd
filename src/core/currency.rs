//! Currencies, rate tables and the rate provider abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A supported currency. Values come from [`SUPPORTED_CURRENCIES`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

pub static SUPPORTED_CURRENCIES: [Currency; 20] = [
    Currency { code: "USD", name: "United States Dollar", symbol: "$" },
    Currency { code: "EUR", name: "Euro", symbol: "€" },
    Currency { code: "GBP", name: "British Pound Sterling", symbol: "£" },
    Currency { code: "JPY", name: "Japanese Yen", symbol: "¥" },
    Currency { code: "AUD", name: "Australian Dollar", symbol: "A$" },
    Currency { code: "CAD", name: "Canadian Dollar", symbol: "C$" },
    Currency { code: "CHF", name: "Swiss Franc", symbol: "CHF" },
    Currency { code: "CNY", name: "Chinese Yuan", symbol: "¥" },
    Currency { code: "SEK", name: "Swedish Krona", symbol: "kr" },
    Currency { code: "NZD", name: "New Zealand Dollar", symbol: "NZ$" },
    Currency { code: "MXN", name: "Mexican Peso", symbol: "$" },
    Currency { code: "SGD", name: "Singapore Dollar", symbol: "S$" },
    Currency { code: "HKD", name: "Hong Kong Dollar", symbol: "HK$" },
    Currency { code: "NOK", name: "Norwegian Krone", symbol: "kr" },
    Currency { code: "TRY", name: "Turkish Lira", symbol: "₺" },
    Currency { code: "RUB", name: "Russian Ruble", symbol: "₽" },
    Currency { code: "INR", name: "Indian Rupee", symbol: "₹" },
    Currency { code: "BRL", name: "Brazilian Real", symbol: "R$" },
    Currency { code: "ZAR", name: "South African Rand", symbol: "R" },
    Currency { code: "KRW", name: "South Korean Won", symbol: "₩" },
];

/// Returns the supported currencies in display order.
pub fn currency_list() -> &'static [Currency] {
    &SUPPORTED_CURRENCIES
}

/// Looks up a supported currency by code, ignoring case.
pub fn find_currency(code: &str) -> Option<&'static Currency> {
    SUPPORTED_CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Filters supported currencies whose code or name contains `query`, ignoring case.
/// An empty query matches everything.
pub fn search_currencies(query: &str) -> Vec<&'static Currency> {
    let query = query.trim().to_lowercase();
    SUPPORTED_CURRENCIES
        .iter()
        .filter(|c| {
            c.code.to_lowercase().contains(&query) || c.name.to_lowercase().contains(&query)
        })
        .collect()
}

/// Rates keyed by currency code: 1 unit of the base currency equals `rate` units of the code.
pub type RateTable = HashMap<String, f64>;

/// A complete rate table as fetched at one point in time.
///
/// Snapshots are never merged; a newer fetch replaces the previous one wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub base: String,
    /// As-of date reported by the rate source, e.g. `2026-10-16`.
    #[serde(rename = "date")]
    pub as_of: String,
    #[serde(rename = "rates")]
    pub table: RateTable,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(base: impl Into<String>, as_of: impl Into<String>, table: RateTable) -> Self {
        Self {
            base: base.into(),
            as_of: as_of.into(),
            table,
            fetched_at: Utc::now(),
        }
    }
}

/// Source of fresh rate snapshots, usually over the network.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateSnapshot>;
}
