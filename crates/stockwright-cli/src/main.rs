mod config;
mod confirm;
mod material_cmds;
mod plan_cmd;
mod product_cmds;
#[cfg(test)]
mod test_util;
mod tui;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use stockwright_api::HttpGateway;
use stockwright_core::Store;
use stockwright_core::selection::Workbench;

use config::StockwrightConfig;
use product_cmds::MaterialSpec;

#[derive(Parser)]
#[command(
    name = "stockwright",
    about = "Raw materials, product recipes and production plans"
)]
struct Cli {
    /// Inventory API base URL (overrides STOCKWRIGHT_API_URL env var)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a stockwright config file (uses --api-url or the default URL)
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Raw material management
    Material {
        #[command(subcommand)]
        command: MaterialCommands,
    },
    /// Product and composition management
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },
    /// Show the suggested production run for current stock
    Plan,
    /// Launch interactive TUI dashboard
    Dashboard,
}

#[derive(Subcommand)]
pub enum MaterialCommands {
    /// List all raw materials
    List,
    /// Register a new raw material
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        /// Quantity currently in stock
        #[arg(long)]
        stock: Decimal,
    },
    /// Change a raw material (omitted fields keep their value)
    Update {
        id: i64,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        stock: Option<Decimal>,
    },
    /// Delete a raw material
    Delete {
        id: i64,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List all products
    List,
    /// Show a product and its composition
    Show { id: i64 },
    /// Create a product and attach its raw materials in order
    Create {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        /// Unit sale value
        #[arg(long)]
        value: Decimal,
        /// Raw material to attach, as MATERIAL_ID:QUANTITY (repeatable)
        #[arg(long = "material", value_parser = product_cmds::parse_material_spec)]
        materials: Vec<MaterialSpec>,
    },
    /// Change a product's code, name or value (omitted fields keep their value)
    Update {
        id: i64,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        value: Option<Decimal>,
    },
    /// Delete a product
    Delete {
        id: i64,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Add a raw material to a product's composition
    Attach {
        id: i64,
        /// Raw material ID
        #[arg(long)]
        material: i64,
        /// Quantity needed per product unit
        #[arg(long)]
        quantity: Decimal,
    },
    /// Change the quantity of a raw material already in the composition
    SetQuantity {
        id: i64,
        #[arg(long)]
        material: i64,
        #[arg(long)]
        quantity: Decimal,
    },
    /// Remove a raw material from a product's composition
    Detach {
        id: i64,
        #[arg(long)]
        material: i64,
        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },
}

/// Execute the `stockwright init` command: write config file.
fn cmd_init(api_url: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    if let Some(url) = api_url {
        cfg.api.base_url = url.trim_end_matches('/').to_string();
    }
    config::save_config_to(&cfg, &path)?;

    println!("Config written to {}", path.display());
    println!("  api.base_url = {}", cfg.api.base_url);
    Ok(())
}

/// Build the gateway and an empty store for the resolved API.
fn connect(cli_api_url: Option<&str>) -> anyhow::Result<Workbench> {
    let resolved = StockwrightConfig::resolve(cli_api_url)?;
    tracing::debug!(base_url = %resolved.api.base_url, "using inventory API");
    let gateway = HttpGateway::new(resolved.api).context("failed to build HTTP client")?;
    Ok(Workbench::new(Arc::new(gateway), Store::new()))
}

/// Load both collections; every catalog command reads them first.
async fn load(bench: &Workbench) -> anyhow::Result<()> {
    bench
        .store()
        .refresh_all(bench.gateway())
        .await
        .context("could not load inventory from the API")
}

fn init_tracing(command: &Commands) {
    // The dashboard owns the terminal; only log when explicitly asked to.
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if matches!(command, Commands::Dashboard) => return,
        Err(_) => tracing_subscriber::EnvFilter::new("info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.command);

    match cli.command {
        Commands::Init { force } => {
            cmd_init(cli.api_url.as_deref(), force)?;
        }
        Commands::Material { command } => {
            let mut bench = connect(cli.api_url.as_deref())?;
            load(&bench).await?;
            material_cmds::run_material_command(command, &mut bench).await?;
        }
        Commands::Product { command } => {
            let mut bench = connect(cli.api_url.as_deref())?;
            load(&bench).await?;
            product_cmds::run_product_command(command, &mut bench).await?;
        }
        Commands::Plan => {
            let mut bench = connect(cli.api_url.as_deref())?;
            plan_cmd::run_plan(&mut bench).await?;
        }
        Commands::Dashboard => {
            let bench = connect(cli.api_url.as_deref())?;
            tui::run_dashboard(bench).await?;
        }
    }

    Ok(())
}
