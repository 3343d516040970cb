use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;

use rounds_kernel::adapters::nominatim::NominatimGeocoder;
use rounds_kernel::adapters::valhalla::ValhallaOptimizer;
use rounds_kernel::config::RoundsConfig;
use rounds_kernel::orchestrate::{self, FlowOutcome, Orchestrator, ReorderStatus};
use rounds_kernel::{JsonFileBackend, Response, TableStore};

mod serve;

/// Rounds address-route CLI
#[derive(Parser, Debug)]
#[command(name = "rounds")]
#[command(about = "Address tables with rollback and route re-sequencing", long_about = None)]
struct Cli {
    /// Path to config JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the store document (overrides the config)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty table
    CreateTable { table: String },

    /// Delete a table and its rollback
    DeleteTable { table: String },

    /// Insert an address and re-sequence the table
    Insert {
        table: String,
        street: String,
        postcode: String,
    },

    /// Delete an address and re-sequence the table
    Delete {
        table: String,
        street: String,
        postcode: String,
    },

    /// Restore a table to its state before the last insert or delete
    Rollback { table: String },

    /// Re-run route optimization for a table
    Resequence { table: String },

    /// Print a table's records as JSON
    List { table: String },

    /// List tables and their rollbacks
    Tables,

    /// Serve the HTTP request layer
    Serve {
        /// Listen address (overrides the config)
        #[arg(long)]
        addr: Option<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // ----------------------------
    // Load config
    // ----------------------------
    let mut config = if let Some(path) = &cli.config {
        let data = fs::read_to_string(path)?;
        serde_json::from_str::<RoundsConfig>(&data)?
    } else {
        RoundsConfig::default_config()
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }

    // ----------------------------
    // Open store
    // ----------------------------
    let mut store = TableStore::open(JsonFileBackend::new(&config.store_path))?;

    // ----------------------------
    // Run command
    // ----------------------------
    let ok = match cli.command {
        Command::CreateTable { table } => report(orchestrate::create_table(&mut store, &table)?),
        Command::DeleteTable { table } => report(orchestrate::delete_table(&mut store, &table)?),
        Command::Rollback { table } => report(orchestrate::rollback_table(&mut store, &table)?),
        Command::Insert {
            table,
            street,
            postcode,
        } => {
            let flow = collaborators(&config)?;
            report_flow(flow.insert_value(&mut store, &table, &street, &postcode)?)
        }
        Command::Delete {
            table,
            street,
            postcode,
        } => {
            let flow = collaborators(&config)?;
            report_flow(flow.delete_value(&mut store, &table, &street, &postcode)?)
        }
        Command::Resequence { table } => {
            let flow = collaborators(&config)?;
            let count = flow.resequence(&mut store, &table)?;
            println!("Table {table} re-sequenced over {count} record(s)");
            true
        }
        Command::List { table } => {
            let records = store.list_all(&table)?;
            println!("{}", serde_json::to_string_pretty(records)?);
            true
        }
        Command::Tables => {
            for name in store.catalog_names() {
                println!("{name}");
            }
            true
        }
        Command::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| config.listen_addr.clone());
            let flow = collaborators(&config)?;
            serve::run(&addr, &mut store, &flow)?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn collaborators(config: &RoundsConfig) -> Result<Orchestrator<NominatimGeocoder, ValhallaOptimizer>> {
    let geocoder = NominatimGeocoder::new(&config.geocoder, config.http_timeout_secs)?;
    let optimizer = ValhallaOptimizer::new(&config.router, config.http_timeout_secs)?;
    Ok(Orchestrator::new(geocoder, optimizer))
}

fn report(response: Response) -> bool {
    println!("{}", response.message);
    response.ok
}

fn report_flow(outcome: FlowOutcome) -> bool {
    let ok = report(outcome.mutation);
    if let ReorderStatus::Failed(e) = outcome.reorder {
        eprintln!("Reorder failed: {e}");
        return false;
    }
    ok
}
