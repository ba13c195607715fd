use super::ui;
use crate::core::conversion::{self, ConversionResult};
use crate::core::currency::{self, Currency, RateProvider};
use crate::core::session::{ConverterSession, SessionState};
use anyhow::{Result, bail};
use comfy_table::Cell;
use tracing::debug;

pub const DISCLAIMER: &str =
    "Rates are for informational purposes only and may not reflect real-time market rates";

/// Applies the requested selections, makes sure there are rates to show and
/// prints the conversion.
pub async fn run(
    session: &mut ConverterSession,
    provider: &dyn RateProvider,
    amount: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    // Resolve both codes first so a typo leaves the remembered selections alone.
    let from = from.map(resolve_currency).transpose()?;
    let to = to.map(resolve_currency).transpose()?;

    if let Some(currency) = from {
        session.select_from(currency);
    }
    if let Some(currency) = to {
        session.select_to(currency);
    }
    if let Some(amount) = amount {
        session.set_amount(amount);
    }

    ensure_rates(session, provider).await;
    println!("{}", render(session.state()));
    Ok(())
}

/// Swaps the remembered currencies and prints the new conversion.
pub async fn swap(session: &mut ConverterSession, provider: &dyn RateProvider) -> Result<()> {
    session.swap();
    ensure_rates(session, provider).await;
    println!("{}", render(session.state()));
    Ok(())
}

pub fn resolve_currency(code: &str) -> Result<&'static Currency> {
    match currency::find_currency(code) {
        Some(currency) => Ok(currency),
        None => bail!("Unsupported currency: {}", code.trim()),
    }
}

/// Fetches rates when a one-shot run has nothing to show yet, otherwise only
/// when the held snapshot has gone stale.
pub async fn ensure_rates(session: &mut ConverterSession, provider: &dyn RateProvider) {
    let state = session.state();
    let bootstrap = state.online && state.snapshot.is_none();
    if !bootstrap && !session.is_stale() {
        debug!("Rates are fresh, skipping fetch");
        return;
    }

    let spinner = ui::new_spinner("Fetching exchange rates...");
    session.refresh(provider).await;
    spinner.finish_and_clear();
}

/// Renders the session the way the converter screen shows it.
pub fn render(state: &SessionState) -> String {
    let mut lines = Vec::new();

    let status = if state.online { "Online" } else { "Offline" };
    let mut header = format!("Status: {status}");
    if let Some(last_updated) = &state.last_updated {
        header.push_str(&format!(" | Last updated: {last_updated}"));
    }
    lines.push(ui::style_text(&header, ui::StyleType::Subtle));

    if state.loading {
        lines.push("Loading exchange rates...".to_string());
    }
    if let Some(error) = &state.error {
        lines.push(ui::style_text(error, ui::StyleType::Error));
    }

    lines.push(String::new());
    match &state.result {
        Some(result) if result.is_resolved() => render_result(state, result, &mut lines),
        Some(_) => lines.push(ui::style_text(
            &format!(
                "Exchange rate unavailable for {} to {}",
                state.from.code, state.to.code
            ),
            ui::StyleType::Error,
        )),
        None if state.snapshot.is_none() => lines.push(
            "No exchange rates available yet. Run `xfx refresh` when online.".to_string(),
        ),
        None => lines.push("Enter an amount greater than zero to convert.".to_string()),
    }

    lines.join("\n")
}

fn render_result(state: &SessionState, result: &ConversionResult, lines: &mut Vec<String>) {
    lines.push(ui::style_text("Conversion result", ui::StyleType::Title));
    lines.push(format!("{} {} =", state.amount.trim(), state.from.code));
    lines.push(ui::style_text(
        &conversion::format_amount(result.converted_amount, state.to),
        ui::StyleType::Value,
    ));

    let mut table = ui::new_styled_table();
    table.add_row(vec![
        Cell::new(ui::style_text("Exchange Rate", ui::StyleType::Label)),
        Cell::new(format!(
            "1 {} = {} {}",
            state.from.code,
            conversion::format_rate(result.rate),
            state.to.code
        )),
    ]);
    table.add_row(vec![
        Cell::new(ui::style_text("Inverse Rate", ui::StyleType::Label)),
        Cell::new(format!(
            "1 {} = {} {}",
            state.to.code,
            conversion::format_rate(result.inverse_rate),
            state.from.code
        )),
    ]);
    lines.push(table.to_string());
    lines.push(ui::style_text(DISCLAIMER, ui::StyleType::Subtle));
}
