//! Pedidos CLI
//!
//! Command-line entry point over the order service

use clap::{Parser, Subcommand};
use pedidos_core::logging_facility::{init, Profile};
use pedidos_store::db::StoreConfig;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "pedidos")]
#[command(about = "Pedidos - order aggregate store", long_about = None)]
struct Cli {
    /// SQLite database file [default: $PEDIDOS_DB, else Data/database.sqlite]
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit JSON logs instead of human-readable ones
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database and its tables if absent
    Init,
    /// Create an order
    Create(commands::order::CreateArgs),
    /// Print one order
    Get(commands::order::IdArgs),
    /// Print every order
    List,
    /// Replace an order's header fields and all of its line items
    Update(commands::order::UpdateArgs),
    /// Delete an order and its line items
    Delete(commands::order::IdArgs),
    /// Create and print a sample order
    Demo,
}

fn main() {
    let cli = Cli::parse();

    init(if cli.log_json {
        Profile::Production
    } else {
        Profile::Development
    });

    let config = cli.db.map_or_else(StoreConfig::from_env, StoreConfig::at);

    let result = match cli.command {
        Commands::Init => commands::order::init(&config),
        Commands::Create(args) => commands::order::create(&config, args),
        Commands::Get(args) => commands::order::get(&config, args),
        Commands::List => commands::order::list(&config),
        Commands::Update(args) => commands::order::update(&config, args),
        Commands::Delete(args) => commands::order::delete(&config, args),
        Commands::Demo => commands::demo::execute(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
