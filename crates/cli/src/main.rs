//! Shopping Assistant CLI - browsing, document export and evaluation tools.
//!
//! # Usage
//!
//! ```bash
//! # Drive the webshop by hand with search[...] / click[...] actions
//! sa-cli browse
//!
//! # Export search documents for every catalogue tier
//! sa-cli convert --out data/search_documents
//!
//! # Replay the recorded scenarios against Claude
//! sa-cli eval --dir eval/eval_data --results eval/test_results
//! ```
//!
//! # Commands
//!
//! - `browse` - Interactive action loop printing composed observations
//! - `convert` - Export catalogue products as search documents
//! - `eval` - Run `*.test.json` scenarios and write a report

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shopping_assistant::AssistantConfig;
use shopping_assistant::telemetry;

mod commands;

const LOG_FILTER: &str =
    "shopping_assistant=info,shopping_assistant_webshop=info,shopping_assistant_cli=info";

#[derive(Parser)]
#[command(name = "sa-cli")]
#[command(author, version, about = "Shopping assistant CLI tools")]
struct Cli {
    #[command(flatten)]
    catalogue: CatalogueArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the catalogue settings read from the environment.
#[derive(Args)]
struct CatalogueArgs {
    /// Directory holding the catalogue files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Number of products to load (0 for all)
    #[arg(long, global = true)]
    num_products: Option<usize>,

    /// Catalogue file to load instead of the size-based default
    #[arg(long, global = true)]
    catalogue_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the webshop with typed actions
    Browse,
    /// Export search documents
    Convert {
        /// Output directory for the resources_* tiers
        #[arg(short, long, default_value = "search_documents")]
        out: PathBuf,
    },
    /// Run evaluation scenarios against Claude
    Eval {
        /// Directory with *.test.json scenarios and optional test_config.json
        #[arg(short, long, default_value = "eval/eval_data")]
        dir: PathBuf,

        /// Directory to write the report into
        #[arg(short, long, default_value = "eval/test_results")]
        results: PathBuf,

        /// Report name, used as the file name prefix
        #[arg(short, long, default_value = "simple")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing(LOG_FILTER);

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AssistantConfig::from_env()?;
    if let Some(data_dir) = cli.catalogue.data_dir {
        config.catalogue.data_dir = data_dir;
    }
    if let Some(num_products) = cli.catalogue.num_products {
        config.catalogue.num_products = num_products;
    }
    if let Some(file) = cli.catalogue.catalogue_file {
        config.catalogue.file_override = Some(file);
    }

    match cli.command {
        Commands::Browse => commands::browse::run(&config).await?,
        Commands::Convert { out } => commands::convert::run(&config, &out)?,
        Commands::Eval { dir, results, name } => {
            commands::eval::run(&config, &dir, &results, &name).await?;
        }
    }
    Ok(())
}
