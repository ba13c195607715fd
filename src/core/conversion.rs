//! Rate resolution between any two currencies of a rate table, plus the
//! display helpers that go with it.
//!
//! A rate of exactly `0.0` means the pair could not be resolved from the table.
//! No real currency trades at zero, so callers treat it as "cannot convert".

use crate::core::currency::{Currency, RateTable};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    /// Units of `to_currency` per unit of `from_currency`.
    pub rate: f64,
    /// Units of `from_currency` per unit of `to_currency`.
    pub inverse_rate: f64,
    pub converted_amount: f64,
}

impl ConversionResult {
    /// False when the rate is the zero sentinel.
    pub fn is_resolved(&self) -> bool {
        self.rate > 0.0
    }
}

/// Converts `amount` of `from` into `to` using `rates` quoted against `base`.
///
/// Total over its inputs: missing or non-positive rates resolve to `0.0`.
pub fn convert(amount: f64, from: &str, to: &str, rates: &RateTable, base: &str) -> ConversionResult {
    let (rate, inverse_rate) = resolve_rates(from, to, rates, base);

    ConversionResult {
        amount,
        from_currency: from.to_string(),
        to_currency: to.to_string(),
        rate,
        inverse_rate,
        converted_amount: amount * rate,
    }
}

fn resolve_rates(from: &str, to: &str, rates: &RateTable, base: &str) -> (f64, f64) {
    if from == to {
        return (1.0, 1.0);
    }

    if from == base {
        let rate = rates.get(to).copied().filter(|r| *r > 0.0).unwrap_or(0.0);
        return (rate, invert(rate));
    }

    if to == base {
        let from_rate = rates.get(from).copied();
        let rate = from_rate.filter(|r| *r > 0.0).map_or(0.0, |r| 1.0 / r);
        return (rate, from_rate.unwrap_or(0.0));
    }

    // Cross rate: (base -> to) / (base -> from)
    let from_rate = rates.get(from).copied().unwrap_or(0.0);
    let to_rate = rates.get(to).copied().unwrap_or(0.0);
    if from_rate > 0.0 {
        let rate = to_rate / from_rate;
        (rate, invert(rate))
    } else {
        (0.0, 0.0)
    }
}

fn invert(rate: f64) -> f64 {
    if rate > 0.0 { 1.0 / rate } else { 0.0 }
}

/// Renders `value` with the currency symbol, en-US digit grouping and
/// between 2 and 6 fraction digits.
pub fn format_amount(value: f64, currency: &Currency) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let mut symbol_chars = currency.symbol.chars();
    let spaced = currency.symbol.chars().count() > 1
        && symbol_chars.next_back().is_some_and(char::is_alphabetic);
    let separator = if spaced { " " } else { "" };

    format!(
        "{sign}{}{separator}{}",
        currency.symbol,
        format_number(value.abs())
    )
}

fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{value:.6}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < 2 {
        frac.push('0');
    }

    format!("{}.{frac}", group_thousands(int_part))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Renders a rate with exactly 6 fraction digits.
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.6}")
}

/// Parses user-typed amount text. Accepts `,` as the decimal separator and
/// reads the leading numeric part of the input, so `"12.5 usd"` is `12.5`.
///
/// Returns `0.0` when nothing numeric can be read. Negative values are returned
/// as parsed; the session treats any amount <= 0 as nothing to convert.
pub fn parse_amount(input: &str) -> f64 {
    let normalized = input.replacen(',', ".", 1);
    let trimmed = normalized.trim_start();
    let numeric = &trimmed[..numeric_prefix_len(trimmed)];

    numeric
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = count_digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    end
}
