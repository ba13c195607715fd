use super::ui;
use crate::core::currency::{self, Currency};
use comfy_table::{Cell, Table};

/// Lists supported currencies, optionally filtered by code or name.
pub fn run(query: Option<&str>) {
    let matches = currency::search_currencies(query.unwrap_or_default());
    if matches.is_empty() {
        println!("No supported currency matches '{}'", query.unwrap_or_default());
        return;
    }
    println!("{}", build_table(&matches));
}

pub fn build_table(currencies: &[&Currency]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
    ]);
    for currency in currencies {
        table.add_row(vec![
            Cell::new(currency.code),
            Cell::new(currency.name),
            Cell::new(currency.symbol),
        ]);
    }
    table
}
