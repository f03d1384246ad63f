//! `stockwright product` commands.

use anyhow::{Context, Result, bail};
use rust_decimal::Decimal;

use stockwright_api::models::ProductInput;
use stockwright_core::catalog::CatalogError;
use stockwright_core::composition::{CompositionError, UpsertMode};
use stockwright_core::orchestrator::CreationError;
use stockwright_core::selection::{SelectionError, Workbench};

use crate::ProductCommands;
use crate::confirm::StdinConfirm;

/// One `--material ID:QTY` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialSpec {
    pub raw_material_id: i64,
    pub quantity: Decimal,
}

pub fn parse_material_spec(s: &str) -> Result<MaterialSpec, String> {
    let (id, qty) = s
        .split_once(':')
        .ok_or_else(|| format!("expected MATERIAL_ID:QUANTITY, got {s:?}"))?;
    let raw_material_id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid raw material ID {id:?}"))?;
    let quantity = qty
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity {qty:?}"))?;
    Ok(MaterialSpec {
        raw_material_id,
        quantity,
    })
}

/// Shorten `s` to at most `max` characters for table output.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub async fn run_product_command(command: ProductCommands, bench: &mut Workbench) -> Result<()> {
    match command {
        ProductCommands::List => list(bench),
        ProductCommands::Show { id } => show(bench, id).await,
        ProductCommands::Create {
            code,
            name,
            value,
            materials,
        } => create(bench, ProductInput { code, name, value }, &materials).await,
        ProductCommands::Update {
            id,
            code,
            name,
            value,
        } => {
            let existing = bench
                .store()
                .product(id)
                .with_context(|| format!("product {id} not found"))?;
            let input = ProductInput {
                code: code.unwrap_or(existing.code),
                name: name.unwrap_or(existing.name),
                value: value.unwrap_or(existing.value),
            };
            let product = bench
                .update_product(id, &input)
                .await
                .with_context(|| format!("failed to update product {id}"))?;
            println!("Product {} updated.", product.code);
            Ok(())
        }
        ProductCommands::Delete { id, yes } => {
            let confirm = StdinConfirm::new(yes);
            match bench.delete_product(id, &confirm).await {
                Ok(()) => println!("Product {id} deleted."),
                Err(SelectionError::Catalog(CatalogError::NotConfirmed)) => println!("Cancelled."),
                Err(e) => return Err(e).with_context(|| format!("failed to delete product {id}")),
            }
            Ok(())
        }
        ProductCommands::Attach {
            id,
            material,
            quantity,
        } => {
            bench.open_editor(id)?;
            let editor = bench
                .active_editor()
                .context("product editor did not open")?;
            editor
                .add(material, quantity)
                .await
                .with_context(|| format!("failed to attach raw material {material}"))?;
            println!("Raw material {material} attached to product {id} (quantity {quantity}).");
            Ok(())
        }
        ProductCommands::SetQuantity {
            id,
            material,
            quantity,
        } => {
            bench.open_editor(id)?;
            let session = bench
                .edit_session_mut()
                .context("product editor did not open")?;
            let listed = session
                .editor
                .product()
                .is_some_and(|p| p.uses_material(material));
            if !listed {
                bail!(
                    "raw material {material} is not part of product {id}; use `stockwright product attach`"
                );
            }
            session
                .editor
                .add_or_update(material, quantity, UpsertMode::Overwrite)
                .await
                .with_context(|| format!("failed to update raw material {material}"))?;
            println!("Raw material {material} in product {id} set to {quantity}.");
            Ok(())
        }
        ProductCommands::Detach { id, material, yes } => {
            bench.open_editor(id)?;
            let session = bench
                .edit_session_mut()
                .context("product editor did not open")?;
            let confirm = StdinConfirm::new(yes);
            match session.editor.detach(material, &confirm).await {
                Ok(()) => println!("Raw material {material} removed from product {id}."),
                Err(CompositionError::NotConfirmed) => println!("Cancelled."),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("failed to remove raw material {material}"));
                }
            }
            Ok(())
        }
    }
}

async fn create(bench: &mut Workbench, input: ProductInput, materials: &[MaterialSpec]) -> Result<()> {
    let session = bench.open_create()?;
    session.input = input;
    for spec in materials {
        session
            .draft
            .add(spec.raw_material_id, spec.quantity)
            .with_context(|| format!("invalid --material {}", spec.raw_material_id))?;
    }

    match bench.submit_creation().await {
        Ok(product) => {
            println!(
                "Product {} created with ID {} ({} raw materials).",
                product.code,
                product.id,
                product.composition.len()
            );
            Ok(())
        }
        Err(SelectionError::Creation(CreationError::AttachFailed {
            product,
            attached,
            failed,
            not_attempted,
            source,
        })) => {
            eprintln!("Product {} was created with ID {}.", product.code, product.id);
            eprintln!("  attached:      {}", join_ids(&attached));
            eprintln!("  failed:        {failed} ({source})");
            eprintln!("  not attempted: {}", join_ids(&not_attempted));
            bail!(
                "composition of product {} is incomplete; finish it with `stockwright product attach {}`",
                product.code,
                product.id
            )
        }
        Err(e) => Err(e).context("failed to create product"),
    }
}

fn join_ids(ids: &[i64]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn list(bench: &Workbench) -> Result<()> {
    let products = bench.store().products();
    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }

    println!(
        "{:<6} {:<12} {:<30} {:>12} {:>10}",
        "ID", "CODE", "NAME", "VALUE", "MATERIALS"
    );
    println!("{}", "-".repeat(74));
    for p in products.items() {
        println!(
            "{:<6} {:<12} {:<30} {:>12} {:>10}",
            p.id,
            p.code,
            truncate(&p.name, 30),
            p.value,
            p.composition.len()
        );
    }
    Ok(())
}

/// Reads the product straight from the service rather than the list cache.
async fn show(bench: &Workbench, id: i64) -> Result<()> {
    let product = bench
        .gateway()
        .get_product(id)
        .await
        .with_context(|| format!("could not load product {id}"))?;

    println!("Product: {} ({})", product.name, product.code);
    println!("ID: {}", product.id);
    println!("Value: {}", product.value);
    println!();

    if product.composition.is_empty() {
        println!("No raw materials attached.");
        return Ok(());
    }

    println!("Composition:");
    println!("  {:<6} {:<30} {:>12}", "ID", "MATERIAL", "QUANTITY");
    for edge in &product.composition {
        let name = edge
            .raw_material_name
            .clone()
            .or_else(|| bench.store().material_name(edge.raw_material_id))
            .unwrap_or_else(|| "?".to_string());
        println!(
            "  {:<6} {:<30} {:>12}",
            edge.raw_material_id,
            truncate(&name, 30),
            edge.quantity
        );
    }
    Ok(())
}
