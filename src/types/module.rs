use std::collections::{BTreeMap, HashMap};

use bitcoin::ScriptBuf;

use crate::types::{BalanceEntry, Decimal};

/// A swap module: an isolated balance space fed by deposits and settled by
/// sequencer commits.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    /// Inscription id of the module deploy
    pub id: String,
    pub name: String,
    pub source: String,
    /// Only commits inscribed by this script are honoured
    pub deployer_pk_script: ScriptBuf,
    pub deposit_pk_script: ScriptBuf,
    pub deploy_inscription_number: i64,
    pub deploy_block_height: u32,

    /// pk_script -> ticker -> balance
    pub balances: HashMap<ScriptBuf, HashMap<String, BalanceEntry>>,
    /// Running deposit total per ticker
    pub deposits: BTreeMap<String, Decimal>,
    pub commit_count: u64,
}

impl ModuleInfo {
    pub fn new(
        id: String,
        name: String,
        source: String,
        deployer_pk_script: ScriptBuf,
        deposit_pk_script: ScriptBuf,
        deploy_inscription_number: i64,
        deploy_block_height: u32,
    ) -> Self {
        ModuleInfo {
            id,
            name,
            source,
            deployer_pk_script,
            deposit_pk_script,
            deploy_inscription_number,
            deploy_block_height,
            balances: HashMap::new(),
            deposits: BTreeMap::new(),
            commit_count: 0,
        }
    }

    pub fn get_balance(&self, pk_script: &ScriptBuf, ticker: &str, decimals: u8) -> BalanceEntry {
        self.balances
            .get(pk_script)
            .and_then(|tickers| tickers.get(ticker))
            .copied()
            .unwrap_or_else(|| BalanceEntry::zero(decimals))
    }

    pub fn set_balance(&mut self, pk_script: &ScriptBuf, ticker: &str, balance: BalanceEntry) {
        self.balances
            .entry(pk_script.clone())
            .or_default()
            .insert(ticker.to_string(), balance);
    }
}
