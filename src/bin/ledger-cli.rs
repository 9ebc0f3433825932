use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ledger_bridge::bridge::{self, CallParams};
use ledger_bridge::config::{load_config, BridgeConfig, ConnectionProfile};
use ledger_bridge::kv::LedgerKvClient;
use ledger_bridge::observability::init_logging;

#[derive(Parser)]
#[command(name = "ledger-cli")]
#[command(
    about = "Submit and evaluate transactions through a Fabric gateway peer",
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "ledger-bridge.toml")]
    config: PathBuf,

    /// JSON connection string; replaces the [connection] table of the config
    #[arg(long)]
    connection: Option<String>,

    /// Print binary results as hex instead of text
    #[arg(long)]
    hex: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a transaction and wait for it to commit
    Submit { function: String, payload: String },
    /// Evaluate a query and print the result
    Evaluate { function: String, payload: String },
    /// Store a key-value pair
    Put { key: String, value: String },
    /// Print the value stored under a key
    Get { key: String },
    /// Print every key-value pair
    GetAll,
    /// Delete a key-value pair
    Remove { key: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        BridgeConfig::default()
    };
    if let Some(json) = &cli.connection {
        config.connection = ConnectionProfile::from_connection_string(json)?;
    }

    init_logging(&config.observability.log_level);

    tracing::debug!(
        channel = %config.connection.channel_name,
        contract = %config.connection.contract_name,
        peer_endpoint = %config.connection.peer_endpoint,
        "Configuration loaded"
    );

    let strict = config.keys.strict;
    match cli.command {
        Commands::Submit { function, payload } => {
            let params =
                CallParams::from_profile(&config.connection, &function, payload.as_bytes());
            let committed = bridge::write(&params, &config.timeouts, strict)?;
            println!(
                "{} committed in block {}",
                committed.transaction_id, committed.block_number
            );
        }
        Commands::Evaluate { function, payload } => {
            let params =
                CallParams::from_profile(&config.connection, &function, payload.as_bytes());
            let result = bridge::read(&params, &config.timeouts, strict)?;
            println!("{}", render(&result, cli.hex));
        }
        Commands::Put { key, value } => {
            let mut batch = BTreeMap::new();
            batch.insert(key.into_bytes(), value.into_bytes());
            LedgerKvClient::from_config(&config).put(&batch)?;
        }
        Commands::Get { key } => {
            let value = LedgerKvClient::from_config(&config).get(key.as_bytes())?;
            println!("{}", render(&value, cli.hex));
        }
        Commands::GetAll => {
            let pairs = LedgerKvClient::from_config(&config).get_all()?;
            let rendered: BTreeMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (render(k, cli.hex), render(v, cli.hex)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        Commands::Remove { key } => {
            LedgerKvClient::from_config(&config).remove(key.as_bytes())?;
        }
    }

    Ok(())
}

fn render(bytes: &[u8], as_hex: bool) -> String {
    if as_hex {
        hex::encode(bytes)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
