use super::ui;
use crate::convert::ConvertedView;
use crate::core::ledger::TransactionKind;
use crate::dashboard::Dashboard;
use anyhow::Result;
use comfy_table::{Cell, Color};

pub fn render(view: &ConvertedView) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Kind"),
        ui::header_cell("Category"),
        ui::header_cell("Description"),
        ui::header_cell(&format!("Amount ({})", view.current_currency)),
    ]);

    let mut transactions: Vec<_> = view.transactions.iter().collect();
    transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    for tx in transactions {
        let kind = match tx.kind {
            TransactionKind::Income => Cell::new("income").fg(Color::Green),
            TransactionKind::Expense => Cell::new("expense").fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(tx.date.format("%Y-%m-%d")),
            kind,
            Cell::new(&tx.category),
            Cell::new(&tx.description),
            ui::plain_money_cell(&tx.amount),
        ]);
    }

    let mut output = format!(
        "Transactions: {}\n",
        ui::style_text(&view.current_currency, ui::StyleType::Title)
    );
    if let Some(status) = ui::view_status(view) {
        output.push_str(&format!("{status}\n"));
    }
    if view.transactions.is_empty() {
        output.push_str(&ui::style_text("\nNo transactions.", ui::StyleType::Subtle));
    } else {
        output.push_str(&format!("\n{table}"));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger::{RawFinancialData, Transaction};
    use crate::core::money::MoneyAmount;
    use chrono::NaiveDate;

    #[test]
    fn test_render_sorts_by_date() {
        let raw = RawFinancialData::loaded(
            vec![
                Transaction {
                    id: "b".to_string(),
                    date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                    kind: TransactionKind::Expense,
                    category: "Rent".to_string(),
                    description: "March rent".to_string(),
                    amount: MoneyAmount::new(800.0, "BRL"),
                },
                Transaction {
                    id: "a".to_string(),
                    date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                    kind: TransactionKind::Income,
                    category: "Salary".to_string(),
                    description: String::new(),
                    amount: MoneyAmount::new(1000.0, "BRL"),
                },
            ],
            "BRL",
        )
        .unwrap();
        let view = ConvertedView::passthrough(&raw, "BRL", "BRL");

        let output = console::strip_ansi_codes(&render(&view)).to_string();
        let salary = output.find("Salary").unwrap();
        let rent = output.find("Rent").unwrap();
        assert!(salary < rent);
        assert!(output.contains("Amount (BRL)"));
        assert!(output.contains("March rent"));
    }

    #[test]
    fn test_render_empty_ledger() {
        let raw = RawFinancialData::loaded(Vec::new(), "BRL").unwrap();
        let view = ConvertedView::passthrough(&raw, "BRL", "BRL");
        assert!(render(&view).contains("No transactions."));
    }
}
