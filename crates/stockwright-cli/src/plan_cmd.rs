//! `stockwright plan` command: show the production suggestion.

use anyhow::{Result, bail};

use stockwright_core::production::PlanView;
use stockwright_core::selection::Workbench;

use crate::product_cmds::truncate;

pub async fn run_plan(bench: &mut Workbench) -> Result<()> {
    bench.refresh_production().await;

    match bench.production().view() {
        PlanView::Table { items, total_value } => {
            println!(
                "{:<12} {:<30} {:>10} {:>14}",
                "CODE", "PRODUCT", "QUANTITY", "SUBTOTAL"
            );
            println!("{}", "-".repeat(69));
            for item in items {
                println!(
                    "{:<12} {:<30} {:>10} {:>14}",
                    item.product_code,
                    truncate(&item.product_name, 30),
                    item.quantity,
                    item.subtotal
                );
            }
            println!("{}", "-".repeat(69));
            println!("{:<54} {:>14}", "Total value", total_value);
        }
        PlanView::NoProductionPossible => {
            println!("No production possible with the current stock.");
        }
        PlanView::Failed(message) => {
            bail!("could not load the production suggestion: {message}");
        }
        // refresh_production always settles the state.
        PlanView::NotLoaded | PlanView::Loading => {
            bail!("production suggestion did not load");
        }
    }
    Ok(())
}
