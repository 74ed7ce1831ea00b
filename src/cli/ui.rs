use crate::convert::{ConvertedView, Freshness};
use crate::core::money::MoneyAmount;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Warning,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Warning => style(text).yellow(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right-aligned amount, green when positive and red when negative.
pub fn money_cell(amount: &MoneyAmount) -> Cell {
    let cell = Cell::new(amount.to_string()).set_alignment(CellAlignment::Right);
    if amount.value > 0.0 {
        cell.fg(Color::Green)
    } else if amount.value < 0.0 {
        cell.fg(Color::Red)
    } else {
        cell.fg(Color::DarkGrey)
    }
}

/// Amount cell without sign coloring, for columns whose sign is implied.
pub fn plain_money_cell(amount: &MoneyAmount) -> Cell {
    Cell::new(amount.to_string()).set_alignment(CellAlignment::Right)
}

/// Spinner shown while a view is loading or converting.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// One line describing where the figures came from, or `None` when they are
/// exactly what was asked for.
pub fn view_status(view: &ConvertedView) -> Option<String> {
    if let Some(error) = &view.source_error {
        return Some(style_text(
            &format!("Ledger could not be refreshed: {error}"),
            StyleType::Error,
        ));
    }
    match view.freshness {
        Freshness::FallbackRaw => {
            let reason = view
                .conversion_error
                .as_ref()
                .map_or_else(String::new, |e| format!(": {e}"));
            Some(style_text(
                &format!(
                    "Could not convert to {}{reason}. Showing amounts in {}.",
                    view.requested_currency, view.current_currency
                ),
                StyleType::Warning,
            ))
        }
        Freshness::Passthrough if view.requested_currency != view.current_currency => {
            Some(style_text(
                &format!(
                    "Amounts shown in {} (not converted).",
                    view.current_currency
                ),
                StyleType::Subtle,
            ))
        }
        Freshness::Cached => Some(style_text("Using cached conversion.", StyleType::Subtle)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConversionError;
    use crate::core::ledger::RawFinancialData;

    #[test]
    fn test_fallback_status_names_both_currencies() {
        let raw = RawFinancialData::loaded(Vec::new(), "BRL").unwrap();
        let view = ConvertedView::fallback(
            &raw,
            "BRL",
            "USD",
            ConversionError::ProviderUnavailable("timeout".into()),
        );
        let status = console::strip_ansi_codes(&view_status(&view).unwrap()).to_string();
        assert!(status.contains("Could not convert to USD"));
        assert!(status.contains("timeout"));
        assert!(status.contains("Showing amounts in BRL"));
    }

    #[test]
    fn test_no_status_for_ledger_view() {
        let raw = RawFinancialData::loaded(Vec::new(), "BRL").unwrap();
        let view = ConvertedView::passthrough(&raw, "BRL", "BRL");
        assert!(view_status(&view).is_none());
    }
}
