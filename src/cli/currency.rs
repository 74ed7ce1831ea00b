use super::ui;
use crate::core::money::{SUPPORTED_CURRENCIES, is_supported, normalize_code};
use crate::core::preference::{CurrencyPreference, PreferenceStore};
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Prints the saved display currency next to the ledger currency.
pub fn show(store: &dyn PreferenceStore, ledger_currency: &str) {
    let current = store.current().currency;
    println!(
        "{} {}",
        ui::style_text("Display currency:", ui::StyleType::TotalLabel),
        ui::style_text(&current, ui::StyleType::TotalValue)
    );
    println!(
        "{} {}",
        ui::style_text("Ledger currency: ", ui::StyleType::TotalLabel),
        ledger_currency
    );
}

/// Validates and persists a new display currency.
pub async fn set(store: &dyn PreferenceStore, code: &str) -> Result<String> {
    let code = normalize_code(code).context("Invalid currency code")?;
    store
        .save(CurrencyPreference::new(code.clone()))
        .await
        .context("Failed to save display currency")?;

    if is_supported(&code) {
        println!("Display currency set to {}", ui::style_text(&code, ui::StyleType::TotalValue));
    } else {
        println!(
            "Display currency set to {}. {}",
            code,
            ui::style_text(
                "It is not in the supported list; conversion may fall back to the ledger currency.",
                ui::StyleType::Warning
            )
        );
    }
    Ok(code)
}

pub fn render_list(current: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Name"),
        ui::header_cell("Symbol"),
    ]);
    for (code, name, symbol) in SUPPORTED_CURRENCIES {
        let code_cell = if *code == current {
            Cell::new(format!("{code} *"))
        } else {
            Cell::new(code)
        };
        table.add_row(vec![code_cell, Cell::new(name), Cell::new(symbol)]);
    }
    table.to_string()
}

pub fn list(store: &dyn PreferenceStore) {
    println!("{}", render_list(&store.current().currency));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryPreferenceStore;

    #[tokio::test]
    async fn test_set_normalizes_and_saves() {
        let store = MemoryPreferenceStore::new(CurrencyPreference::new("BRL"));
        assert_eq!(set(&store, "eur").await.unwrap(), "EUR");
        assert_eq!(store.current().currency, "EUR");
    }

    #[tokio::test]
    async fn test_set_rejects_bad_code() {
        let store = MemoryPreferenceStore::new(CurrencyPreference::new("BRL"));
        let err = set(&store, "euros").await.unwrap_err();
        assert!(err.to_string().contains("Invalid currency code"));
        assert_eq!(store.current().currency, "BRL");
    }

    #[test]
    fn test_list_marks_current() {
        let output = render_list("USD");
        assert!(output.contains("USD *"));
        assert!(output.contains("Brazilian Real"));
        assert!(!output.contains("BRL *"));
    }
}
