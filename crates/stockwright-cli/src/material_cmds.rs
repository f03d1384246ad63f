//! `stockwright material` commands.

use anyhow::{Context, Result};

use stockwright_api::models::RawMaterialInput;
use stockwright_core::catalog::{self, CatalogError};
use stockwright_core::selection::Workbench;

use crate::MaterialCommands;
use crate::confirm::StdinConfirm;

pub async fn run_material_command(command: MaterialCommands, bench: &mut Workbench) -> Result<()> {
    match command {
        MaterialCommands::List => list(bench),
        MaterialCommands::Add { code, name, stock } => {
            let input = RawMaterialInput {
                code,
                name,
                stock_quantity: stock,
            };
            let material = catalog::create_material(bench.gateway(), bench.store(), &input)
                .await
                .context("failed to create raw material")?;
            println!(
                "Raw material {} created with ID {}.",
                material.code, material.id
            );
            Ok(())
        }
        MaterialCommands::Update {
            id,
            code,
            name,
            stock,
        } => {
            let existing = bench
                .store()
                .material(id)
                .with_context(|| format!("raw material {id} not found"))?;
            let input = RawMaterialInput {
                code: code.unwrap_or(existing.code),
                name: name.unwrap_or(existing.name),
                stock_quantity: stock.unwrap_or(existing.stock_quantity),
            };
            let material = catalog::update_material(bench.gateway(), bench.store(), id, &input)
                .await
                .with_context(|| format!("failed to update raw material {id}"))?;
            println!("Raw material {} updated.", material.code);
            Ok(())
        }
        MaterialCommands::Delete { id, yes } => {
            let confirm = StdinConfirm::new(yes);
            match catalog::delete_material(bench.gateway(), bench.store(), id, &confirm).await {
                Ok(()) => println!("Raw material {id} deleted."),
                Err(CatalogError::NotConfirmed) => println!("Cancelled."),
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to delete raw material {id}"));
                }
            }
            Ok(())
        }
    }
}

fn list(bench: &Workbench) -> Result<()> {
    let materials = bench.store().materials();
    if materials.is_empty() {
        println!("No raw materials found.");
        return Ok(());
    }

    println!("{:<6} {:<12} {:<30} {:>12}", "ID", "CODE", "NAME", "STOCK");
    println!("{}", "-".repeat(63));
    for m in materials.items() {
        println!(
            "{:<6} {:<12} {:<30} {:>12}",
            m.id,
            m.code,
            crate::product_cmds::truncate(&m.name, 30),
            m.stock_quantity
        );
    }
    Ok(())
}
