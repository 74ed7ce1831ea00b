use super::ui;
use crate::convert::ConvertedView;
use crate::core::ledger::FinancialSummary;
use crate::core::money::MoneyAmount;
use crate::dashboard::Dashboard;
use anyhow::Result;
use comfy_table::{Cell, Table};
use std::collections::BTreeMap;

fn category_table(title: &str, categories: &BTreeMap<String, MoneyAmount>) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell(title), ui::header_cell("Amount")]);
    for (category, amount) in categories {
        table.add_row(vec![Cell::new(category), ui::plain_money_cell(amount)]);
    }
    table
}

fn monthly_table(summary: &FinancialSummary) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Month"),
        ui::header_cell("Income"),
        ui::header_cell("Expense"),
        ui::header_cell("Balance"),
    ]);
    for month in &summary.monthly {
        table.add_row(vec![
            Cell::new(&month.month),
            ui::plain_money_cell(&month.income),
            ui::plain_money_cell(&month.expense),
            ui::money_cell(&month.balance),
        ]);
    }
    table
}

pub fn render(view: &ConvertedView) -> String {
    let summary = &view.summary;
    let mut output = format!(
        "Summary: {}\n",
        ui::style_text(&view.current_currency, ui::StyleType::Title)
    );
    if let Some(status) = ui::view_status(view) {
        output.push_str(&format!("{status}\n"));
    }

    output.push_str(&format!(
        "\n{} {}\n{} {}\n",
        ui::style_text("Income: ", ui::StyleType::TotalLabel),
        summary.total_income,
        ui::style_text("Expense:", ui::StyleType::TotalLabel),
        summary.total_expense,
    ));
    let balance_style = if summary.balance.value < 0.0 {
        ui::StyleType::Error
    } else {
        ui::StyleType::TotalValue
    };
    output.push_str(&format!(
        "{} {}\n",
        ui::style_text("Balance:", ui::StyleType::TotalLabel),
        ui::style_text(&summary.balance.to_string(), balance_style)
    ));

    if !summary.monthly.is_empty() {
        output.push_str(&format!("\n{}\n", monthly_table(summary)));
    }
    if !summary.income_by_category.is_empty() {
        output.push_str(&format!(
            "\n{}\n",
            category_table("Income by category", &summary.income_by_category)
        ));
    }
    if !summary.expense_by_category.is_empty() {
        output.push_str(&format!(
            "\n{}\n",
            category_table("Expense by category", &summary.expense_by_category)
        ));
    }
    output
}

pub async fn run(dashboard: &Dashboard) -> Result<()> {
    let pb = ui::new_spinner(&format!(
        "Converting to {}...",
        dashboard.display_currency()
    ));
    let view = dashboard.settled_view().await;
    pb.finish_and_clear();

    println!("{}", render(&view));
    Ok(())
}
