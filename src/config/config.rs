use bitcoin::network::Network;
use std::{
    collections::{HashMap, HashSet},
    error::Error,
};

lazy_static::lazy_static! {
    /// Height at which 5 byte self-mint tickers may be deployed
    pub static ref SELF_MINT_ACTIVATION_HEIGHTS: HashMap<Network, u32> = {
        let mut map = HashMap::new();
        map.insert(Network::Bitcoin, 837_090);
        map.insert(Network::Testnet, 2_413_343);
        map.insert(Network::Testnet4, 0);
        map.insert(Network::Regtest, 0);
        map.insert(Network::Signet, 0);
        map
    };
}

pub const NETWORK_TYPE_KEY: &str = "NETWORK_TYPE";
pub const NETWORK_TYPE_DEFAULT: &str = "mainnet";

pub const TICKS_ENABLED_KEY: &str = "TICKS_ENABLED";

pub const MODULE_SWAP_SOURCE_INSCRIPTION_ID_KEY: &str = "MODULE_SWAP_SOURCE_INSCRIPTION_ID";
pub const MODULE_SWAP_SOURCE_INSCRIPTION_ID_DEFAULT: &str =
    "d2a30f6131324e06b1366876c8c089d7ad2a9c2b0ea971c5b0dc6198615bda2ei0";

pub const SELF_MINT_ACTIVATION_HEIGHT_KEY: &str = "SELF_MINT_ACTIVATION_HEIGHT";

pub const ENABLE_HISTORY_KEY: &str = "ENABLE_HISTORY";
pub const ENABLE_HISTORY_DEFAULT: &str = "true";

pub const QUEUE_CAPACITY_KEY: &str = "QUEUE_CAPACITY";
pub const QUEUE_CAPACITY_DEFAULT: usize = 10240;

pub const INPUT_FILE_KEY: &str = "INPUT_FILE";
pub const INPUT_FILE_DEFAULT: &str = "./data/brc20.input.txt";

pub const OUTPUT_FILE_KEY: &str = "OUTPUT_FILE";
pub const OUTPUT_FILE_DEFAULT: &str = "./data/brc20.output.txt";

pub const OUTPUT_MODULE_FILE_KEY: &str = "OUTPUT_MODULE_FILE";
pub const OUTPUT_MODULE_FILE_DEFAULT: &str = "./data/module.output.txt";

pub const OUTPUT_HISTORY_FILE_KEY: &str = "OUTPUT_HISTORY_FILE";

pub const STOP_ON_FATAL_KEY: &str = "STOP_ON_FATAL";
pub const STOP_ON_FATAL_DEFAULT: &str = "false";

pub const PROTOCOL_KEY: &str = "p";
pub const PROTOCOL_BRC20: &str = "brc-20";
pub const PROTOCOL_BRC20_MODULE: &str = "brc20-module";

// BRC20 specific keys
pub const LIMIT_PER_MINT_KEY: &str = "lim";
pub const MAX_SUPPLY_KEY: &str = "max";
pub const DECIMALS_KEY: &str = "dec";
pub const AMOUNT_KEY: &str = "amt";
pub const OPERATION_KEY: &str = "op";
pub const TICKER_KEY: &str = "tick";
pub const SELF_MINT_KEY: &str = "self_mint";

// Module specific keys
pub const MODULE_KEY: &str = "module";
pub const NAME_KEY: &str = "name";
pub const SOURCE_KEY: &str = "source";
pub const DATA_KEY: &str = "data";
pub const FROM_KEY: &str = "from";
pub const TO_KEY: &str = "to";

pub const OPERATION_DEPLOY: &str = "deploy";
pub const OPERATION_MINT: &str = "mint";
pub const OPERATION_TRANSFER: &str = "transfer";
pub const OPERATION_COMMIT: &str = "commit";
pub const OPERATION_WITHDRAW: &str = "withdraw";

pub const SELF_MINT_TICKER_LENGTH: usize = 5;
pub const MAX_TICKER_LENGTH: usize = 4;

pub const MAX_DECIMALS: u8 = 18;
pub const DEFAULT_DECIMALS: u8 = 18;

pub const PROGRESS_LOG_INTERVAL: u64 = 100_000;

pub const INDEXER_VERSION: &str = "brc20-module-indexer v0.1.0";

pub fn get_bitcoin_network_type(network_type: &str) -> Result<Network, Box<dyn Error>> {
    match network_type {
        "mainnet" => Ok(Network::Bitcoin),
        "testnet" => Ok(Network::Testnet),
        "testnet4" => Ok(Network::Testnet4),
        "regtest" => Ok(Network::Regtest),
        "signet" => Ok(Network::Signet),
        _ => Err(format!("Invalid network type: {}", network_type).into()),
    }
}

/// Splits a `TICKS_ENABLED` style list into lowercase tickers.
/// Returns `None` when the list is empty, meaning every ticker is allowed.
pub fn parse_ticks_enabled(ticks: &str) -> Option<HashSet<String>> {
    let ticks: HashSet<String> = ticks
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();
    if ticks.is_empty() { None } else { Some(ticks) }
}

#[derive(Debug, Clone)]
pub struct Brc20IndexerConfig {
    pub network_type: Network,
    pub network_type_string: String,

    /// 5 byte tickers are only deployable from this height on
    pub self_mint_activation_height: u32,
    pub ticks_enabled: Option<HashSet<String>>,
    pub module_swap_source_inscription_id: String,

    pub enable_history: bool,
    pub stop_on_fatal: bool,
    pub queue_capacity: usize,

    pub input_file: String,
    pub output_file: String,
    pub output_module_file: String,
    /// JSON lines dump of the history log, skipped when unset
    pub output_history_file: Option<String>,
}

impl Brc20IndexerConfig {
    /// Defaults for the given network, without reading the environment.
    pub fn new(network_type: Network) -> Self {
        Brc20IndexerConfig {
            network_type,
            network_type_string: network_type_to_string(network_type).to_string(),
            self_mint_activation_height: SELF_MINT_ACTIVATION_HEIGHTS
                .get(&network_type)
                .copied()
                .unwrap_or(0),
            ticks_enabled: None,
            module_swap_source_inscription_id: MODULE_SWAP_SOURCE_INSCRIPTION_ID_DEFAULT
                .to_string(),
            enable_history: true,
            stop_on_fatal: false,
            queue_capacity: QUEUE_CAPACITY_DEFAULT,
            input_file: INPUT_FILE_DEFAULT.to_string(),
            output_file: OUTPUT_FILE_DEFAULT.to_string(),
            output_module_file: OUTPUT_MODULE_FILE_DEFAULT.to_string(),
            output_history_file: None,
        }
    }

    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        let network_type_string =
            std::env::var(NETWORK_TYPE_KEY).unwrap_or_else(|_| NETWORK_TYPE_DEFAULT.to_string());
        let network_type = get_bitcoin_network_type(&network_type_string)?;

        let mut config = Brc20IndexerConfig::new(network_type);

        if let Ok(height) = std::env::var(SELF_MINT_ACTIVATION_HEIGHT_KEY) {
            config.self_mint_activation_height = height.parse::<u32>().map_err(|e| {
                format!("Invalid {}: {} ({})", SELF_MINT_ACTIVATION_HEIGHT_KEY, height, e)
            })?;
        }

        config.ticks_enabled = std::env::var(TICKS_ENABLED_KEY)
            .ok()
            .and_then(|ticks| parse_ticks_enabled(&ticks));

        if let Ok(id) = std::env::var(MODULE_SWAP_SOURCE_INSCRIPTION_ID_KEY) {
            if !id.is_empty() {
                config.module_swap_source_inscription_id = id;
            }
        }

        config.enable_history = std::env::var(ENABLE_HISTORY_KEY)
            .unwrap_or_else(|_| ENABLE_HISTORY_DEFAULT.to_string())
            == "true";
        config.stop_on_fatal = std::env::var(STOP_ON_FATAL_KEY)
            .unwrap_or_else(|_| STOP_ON_FATAL_DEFAULT.to_string())
            == "true";
        config.queue_capacity = std::env::var(QUEUE_CAPACITY_KEY)
            .ok()
            .and_then(|c| c.parse::<usize>().ok())
            .filter(|c| *c > 0)
            .unwrap_or(QUEUE_CAPACITY_DEFAULT);

        config.input_file =
            std::env::var(INPUT_FILE_KEY).unwrap_or_else(|_| INPUT_FILE_DEFAULT.to_string());
        config.output_file =
            std::env::var(OUTPUT_FILE_KEY).unwrap_or_else(|_| OUTPUT_FILE_DEFAULT.to_string());
        config.output_module_file = std::env::var(OUTPUT_MODULE_FILE_KEY)
            .unwrap_or_else(|_| OUTPUT_MODULE_FILE_DEFAULT.to_string());
        config.output_history_file = std::env::var(OUTPUT_HISTORY_FILE_KEY)
            .ok()
            .filter(|path| !path.is_empty());

        Ok(config)
    }

    /// Switches the network parameter set, keeping an explicit self-mint override.
    pub fn set_network(&mut self, network_type: Network) {
        let previous_default = SELF_MINT_ACTIVATION_HEIGHTS
            .get(&self.network_type)
            .copied()
            .unwrap_or(0);
        if self.self_mint_activation_height == previous_default {
            self.self_mint_activation_height = SELF_MINT_ACTIVATION_HEIGHTS
                .get(&network_type)
                .copied()
                .unwrap_or(0);
        }
        self.network_type = network_type;
        self.network_type_string = network_type_to_string(network_type).to_string();
    }
}

fn network_type_to_string(network_type: Network) -> &'static str {
    match network_type {
        Network::Bitcoin => "mainnet",
        Network::Testnet => "testnet",
        Network::Testnet4 => "testnet4",
        Network::Regtest => "regtest",
        Network::Signet => "signet",
    }
}
