//! adena-connector: headless driver for the Adena wallet on gno.land

use clap::{Parser, Subcommand};

use adena_connector_adapters::{AdenaAdapter, ConnectorConfig};

mod bridge;

use bridge::WalletBridge;

#[derive(Debug, Parser)]
#[command(name = "adena-connector", version, about)]
struct Cli {
    /// HTTP bridge forwarding calls to the wallet extension
    #[arg(long, env = "ADENA_BRIDGE_URL")]
    bridge_url: Option<String>,

    /// Chain the session must be on
    #[arg(long, env = "ADENA_CHAIN_ID")]
    chain_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the session snapshot after the first refresh
    Status,
    /// Authorize this app and move the wallet to the target network
    Connect,
    /// Connect, then load the wallet address
    Address,
    /// Connect, then load the balance in ugnot
    Balance,
    /// Connect, load the address, then send GNOT
    Send {
        to: String,
        /// Display units, e.g. 1.5 for 1500000ugnot
        amount: String,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConnectorConfig::from_env();
    if let Some(url) = cli.bridge_url {
        config.provider_bridge_url = Some(url);
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain_name = chain_id.clone();
        config.chain_id = chain_id;
    }

    let adapter = AdenaAdapter::with_config(config.clone());
    tracing::info!(
        mode = adapter.mode_name(),
        chain = %config.chain_id,
        "Starting adena-connector"
    );

    let mut bridge = WalletBridge::new(&config, adapter);
    bridge.ready().await;

    let outcome = run(&mut bridge, cli.command).await;

    println!("{}", serde_json::to_string_pretty(&bridge.report())?);
    bridge.shutdown().await;
    outcome
}

async fn run(bridge: &mut WalletBridge, command: Command) -> eyre::Result<()> {
    match command {
        Command::Status => {}
        Command::Connect => bridge.connect().await?,
        Command::Address => {
            bridge.connect().await?;
            bridge.load_address().await?;
        }
        Command::Balance => {
            bridge.connect().await?;
            bridge.load_balance().await?;
        }
        Command::Send { to, amount } => {
            bridge.connect().await?;
            bridge.load_address().await?;
            bridge.send(&to, &amount).await?;
        }
    }
    Ok(())
}
