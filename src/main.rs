use std::error::Error;

use bitcoin::Network;
use brc20_module_indexer::{
    client::load_input_data,
    config::{Brc20IndexerConfig, INDEXER_VERSION},
    indexer::{Brc20Indexer, Brc20Reporter},
};
use tokio::sync::mpsc;
use tracing::Level;

#[derive(Default)]
struct Args {
    testnet: bool,
    input_file: Option<String>,
    output_file: Option<String>,
    output_module_file: Option<String>,
    output_history_file: Option<String>,
}

fn flag_value(idx: usize, flag: &str) -> Result<String, Box<dyn Error>> {
    std::env::args()
        .nth(idx + 1)
        .ok_or_else(|| format!("No value provided after {}", flag).into())
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args::default();
    let mut log_level = Level::INFO;

    for (idx, arg) in std::env::args().enumerate() {
        match arg.as_str() {
            "--testnet" => args.testnet = true,
            "--input" => args.input_file = Some(flag_value(idx, "--input")?),
            "--output" => args.output_file = Some(flag_value(idx, "--output")?),
            "--output-module" => {
                args.output_module_file = Some(flag_value(idx, "--output-module")?)
            }
            "--output-history" => {
                args.output_history_file = Some(flag_value(idx, "--output-history")?)
            }
            "--log-level" | "-l" => match flag_value(idx, "--log-level")?.as_str() {
                "trace" => log_level = Level::TRACE,
                "debug" => log_level = Level::DEBUG,
                "info" => log_level = Level::INFO,
                "warn" => log_level = Level::WARN,
                "error" => log_level = Level::ERROR,
                _ => return Err("Invalid log level".into()),
            },
            "--version" | "-v" => {
                println!("{}", INDEXER_VERSION);
                std::process::exit(0);
            }
            "--help" | "-h" => {
                println!(
                    "Usage: brc20_module_indexer [--testnet] [--input <file>] [--output <file>]"
                );
                println!(
                    "       [--output-module <file>] [--output-history <file>] [--log-level <level>]"
                );
                println!("Options:");
                println!("  --testnet   Use testnet parameters.");
                println!("  --input <file>  Inscription event dump to index.");
                println!("  --output <file>  Where to write the ticker and holder report.");
                println!("  --output-module <file>  Where to write the module report.");
                println!(
                    "  --output-history <file>  Where to write the history log as JSON lines."
                );
                println!(
                    "  --log-level, -l <level>  Set the log level (trace, debug, info, warn, error)."
                );
                println!("  --version, -v    Show the version information.");
                println!("  --help    Show this help message.");
                std::process::exit(0);
            }
            _ => {}
        }
    }

    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .finish(),
    )?;

    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let args = parse_args()?;

    let mut config = Brc20IndexerConfig::from_env()?;
    if args.testnet {
        config.set_network(Network::Testnet);
    }
    if let Some(input_file) = args.input_file {
        config.input_file = input_file;
    }
    if let Some(output_file) = args.output_file {
        config.output_file = output_file;
    }
    if let Some(output_module_file) = args.output_module_file {
        config.output_module_file = output_module_file;
    }
    if let Some(output_history_file) = args.output_history_file {
        config.output_history_file = Some(output_history_file);
    }
    tracing::info!(
        "{} on {}, reading {}",
        INDEXER_VERSION,
        config.network_type_string,
        config.input_file
    );

    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let input_file = config.input_file.clone();
    let loader = tokio::spawn(async move { load_input_data(&input_file, sender).await });

    let mut brc20_indexer = Brc20Indexer::new(config);
    let run_result = brc20_indexer.run(receiver).await;

    match loader.await? {
        Ok(count) => tracing::debug!("Input loader finished after {} events", count),
        Err(e) => tracing::error!("Invalid input, {}", e),
    }
    run_result?;

    let reporter = Brc20Reporter::new(brc20_indexer.config());
    reporter
        .dump_ticker_report(brc20_indexer.ledger(), &brc20_indexer.config().output_file)
        .await?;
    reporter
        .dump_module_report(
            brc20_indexer.ledger(),
            &brc20_indexer.config().output_module_file,
        )
        .await?;
    if let Some(output_history_file) = &brc20_indexer.config().output_history_file {
        reporter
            .dump_history(brc20_indexer.ledger(), output_history_file)
            .await?;
    }

    Ok(())
}
