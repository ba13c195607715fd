use super::convert::ensure_rates;
use super::ui;
use crate::core::conversion;
use crate::core::currency::{Currency, RateProvider, RateSnapshot};
use crate::core::session::{ConverterSession, SessionState};
use anyhow::Result;
use comfy_table::{Cell, Table};

/// Prints the rate from the selected source currency to every supported currency.
pub async fn run(session: &mut ConverterSession, provider: &dyn RateProvider) -> Result<()> {
    ensure_rates(session, provider).await;
    let state = session.state();
    let currencies = session.currencies();

    if let Some(error) = &state.error {
        println!("{}", ui::style_text(error, ui::StyleType::Error));
    }
    match build_table(state, currencies) {
        Some(table) => {
            println!(
                "\nRates for {}",
                ui::style_text(&state.from.to_string(), ui::StyleType::Title)
            );
            println!("{table}");
            if let Some(last_updated) = &state.last_updated {
                println!(
                    "{}",
                    ui::style_text(
                        &format!("Last updated: {last_updated}"),
                        ui::StyleType::Subtle
                    )
                );
            }
        }
        None => println!("No exchange rates available yet. Run `xfx refresh` when online."),
    }
    Ok(())
}

/// One row per currency other than the source. `None` without a snapshot.
pub fn build_table(state: &SessionState, currencies: &[Currency]) -> Option<Table> {
    let snapshot: &RateSnapshot = state.snapshot.as_deref()?;
    let from = state.from;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("1 {} =", from.code)),
        ui::header_cell(&format!("= 1 {}", from.code)),
    ]);

    for currency in currencies.iter().filter(|c| c.code != from.code) {
        let result = conversion::convert(
            1.0,
            from.code,
            currency.code,
            &snapshot.table,
            &snapshot.base,
        );
        let resolved = result.is_resolved().then_some(result);
        table.add_row(vec![
            Cell::new(currency.code),
            Cell::new(currency.name),
            ui::format_optional_cell(resolved.as_ref(), |r| conversion::format_rate(r.rate)),
            ui::format_optional_cell(resolved.as_ref(), |r| {
                conversion::format_rate(r.inverse_rate)
            }),
        ]);
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::{RateTable, currency_list, find_currency};
    use chrono::DateTime;
    use std::sync::Arc;

    fn state_with(snapshot: Option<RateSnapshot>) -> SessionState {
        SessionState {
            amount: "1".to_string(),
            from: find_currency("EUR").unwrap(),
            to: find_currency("USD").unwrap(),
            online: true,
            loading: false,
            error: None,
            last_updated: None,
            snapshot: snapshot.map(Arc::new),
            result: None,
        }
    }

    #[test]
    fn test_rates_table_lists_other_currencies() {
        let mut table = RateTable::new();
        table.insert("EUR".to_string(), 0.5);
        table.insert("GBP".to_string(), 0.25);
        let snapshot = RateSnapshot {
            base: "USD".to_string(),
            as_of: "2026-10-17".to_string(),
            table,
            fetched_at: DateTime::from_timestamp_millis(1_790_000_000_000).unwrap(),
        };

        let rendered = console::strip_ansi_codes(
            &build_table(&state_with(Some(snapshot)), currency_list())
                .unwrap()
                .to_string(),
        )
        .to_string();

        assert!(rendered.contains("1 EUR ="));
        assert!(rendered.contains("United States Dollar"));
        // EUR -> USD is the inverse of the base quote, EUR -> GBP a cross rate
        assert!(rendered.contains("2.000000"));
        assert!(rendered.contains("0.500000"));
        // JPY is missing from the table
        assert!(rendered.contains("N/A"));
        assert!(!rendered.contains("Euro"));
    }

    #[test]
    fn test_rates_table_needs_snapshot() {
        assert!(build_table(&state_with(None), currency_list()).is_none());
    }
}
