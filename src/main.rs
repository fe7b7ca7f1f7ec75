//! Entry point for the Ward Engine binary.
//!
//! `ward` (or `ward menu`) runs the interactive menu on the terminal;
//! `ward serve` starts the HTTP API.  The data directory comes from
//! `--data-dir`, else `WARD_DATA_DIR`, else `data`; the bind address
//! from `--bind`, else `WARD_BIND_ADDR`, else `127.0.0.1:3000`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ward_engine::billing::BillingService;
use ward_engine::config::AppConfig;
use ward_engine::hospital::Hospital;
use ward_engine::registry::{HospitalRegistry, DEFAULT_WARDS};
use ward_engine::store::Store;
use ward_engine::{api, menu};

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Hospital ward bed allocation and billing")]
struct Cli {
    /// Directory holding patients.csv and rates.cfg
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive menu
    Menu,
    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ward_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let bind = match &cli.command {
        Some(Commands::Serve { bind }) => bind.clone(),
        _ => None,
    };
    let config = AppConfig::from_env().with_overrides(cli.data_dir, bind);

    let hospital = Hospital::open(
        HospitalRegistry::new(DEFAULT_WARDS)?,
        BillingService::new(),
        Store::new(&config.data_dir),
    )?;

    match cli.command {
        Some(Commands::Serve { .. }) => api::serve(&config.bind_addr, hospital).await,
        Some(Commands::Menu) | None => {
            let mut hospital = hospital;
            let stdin = std::io::stdin();
            menu::run(&mut hospital, stdin.lock(), std::io::stdout())?;
            Ok(())
        }
    }
}
