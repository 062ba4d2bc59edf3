use std::collections::{BTreeMap, HashMap};

use bitcoin::{Script, ScriptBuf};

use crate::{
    indexer::Brc20Error,
    ledger::HistoryLog,
    types::{
        BalanceEntry, HistoryRecord, InscriptionContent, ModuleInfo, PendingTransfer, TickInfo,
        TransferState,
    },
};

/// Content of an accepted inscription, kept by its `create_idx_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidInscription {
    pub inscription_id: String,
    pub ticker: String,
    pub content: InscriptionContent,
}

/// All indexer state. Owned by one indexer and handed to processors as
/// `&mut`, nothing here is shared or locked.
#[derive(Debug)]
pub struct Brc20Ledger {
    tickers: BTreeMap<String, TickInfo>,
    /// pk_script -> ticker -> balance
    user_balances: HashMap<ScriptBuf, BTreeMap<String, BalanceEntry>>,
    /// ticker -> pk_script -> balance, mirror of `user_balances`
    ticker_holders: HashMap<String, HashMap<ScriptBuf, BalanceEntry>>,
    pending_transfers: HashMap<String, PendingTransfer>,
    /// sender pk_script -> ticker -> transfers still in `Inscribed`
    inscribed_transfers: HashMap<ScriptBuf, HashMap<String, usize>>,
    valid_data: HashMap<String, ValidInscription>,
    valid_counts: HashMap<String, usize>,
    modules: BTreeMap<String, ModuleInfo>,
    module_deposit_scripts: HashMap<ScriptBuf, String>,
    history: HistoryLog,
}

impl Brc20Ledger {
    pub fn new(enable_history: bool) -> Self {
        Brc20Ledger {
            tickers: BTreeMap::new(),
            user_balances: HashMap::new(),
            ticker_holders: HashMap::new(),
            pending_transfers: HashMap::new(),
            inscribed_transfers: HashMap::new(),
            valid_data: HashMap::new(),
            valid_counts: HashMap::new(),
            modules: BTreeMap::new(),
            module_deposit_scripts: HashMap::new(),
            history: HistoryLog::new(enable_history),
        }
    }

    pub fn add_ticker(&mut self, ticker: TickInfo) -> Result<(), Brc20Error> {
        if self.tickers.contains_key(&ticker.ticker) {
            return Err(Brc20Error::TickerExists(ticker.ticker));
        }
        self.tickers.insert(ticker.ticker.clone(), ticker);
        Ok(())
    }

    pub fn update_ticker(&mut self, updated_ticker: TickInfo) -> Result<(), Brc20Error> {
        let Some(ticker) = self.tickers.get_mut(&updated_ticker.ticker) else {
            return Err(Brc20Error::TickerNotFound(updated_ticker.ticker));
        };
        *ticker = updated_ticker;
        Ok(())
    }

    pub fn get_ticker(&self, ticker: &str) -> Option<&TickInfo> {
        self.tickers.get(ticker)
    }

    /// Tickers in lexical order of their lowercase key.
    pub fn tickers(&self) -> impl Iterator<Item = &TickInfo> {
        self.tickers.values()
    }

    /// Balance of `pk_script`, zero at the ticker's scale when never touched.
    pub fn get_balance(&self, pk_script: &Script, ticker: &TickInfo) -> BalanceEntry {
        self.user_balances
            .get(pk_script)
            .and_then(|balances| balances.get(&ticker.ticker))
            .copied()
            .unwrap_or_else(|| BalanceEntry::zero(ticker.decimals))
    }

    /// Writes one balance into both indices.
    pub fn set_balance(&mut self, pk_script: &Script, ticker: &str, balance: BalanceEntry) {
        self.user_balances
            .entry(pk_script.to_owned())
            .or_default()
            .insert(ticker.to_string(), balance);
        self.ticker_holders
            .entry(ticker.to_string())
            .or_default()
            .insert(pk_script.to_owned(), balance);
    }

    pub fn user_balances(&self, pk_script: &Script) -> Option<&BTreeMap<String, BalanceEntry>> {
        self.user_balances.get(pk_script)
    }

    pub fn ticker_holders(&self, ticker: &str) -> Option<&HashMap<ScriptBuf, BalanceEntry>> {
        self.ticker_holders.get(ticker)
    }

    pub fn add_pending_transfer(&mut self, create_idx_key: &str, transfer: PendingTransfer) {
        if transfer.counts_as_inscribed() {
            self.adjust_inscribed(&transfer.sender, &transfer.ticker, true);
        }
        let replaced = self
            .pending_transfers
            .insert(create_idx_key.to_string(), transfer);
        if let Some(replaced) = replaced.filter(PendingTransfer::counts_as_inscribed) {
            self.adjust_inscribed(&replaced.sender, &replaced.ticker, false);
        }
    }

    pub fn get_pending_transfer(&self, create_idx_key: &str) -> Option<&PendingTransfer> {
        self.pending_transfers.get(create_idx_key)
    }

    pub fn set_transfer_state(
        &mut self,
        create_idx_key: &str,
        state: TransferState,
    ) -> Result<(), Brc20Error> {
        let Some(transfer) = self.pending_transfers.get_mut(create_idx_key) else {
            return Err(Brc20Error::PendingTransferNotFound(
                create_idx_key.to_string(),
            ));
        };
        let was_inscribed = transfer.counts_as_inscribed();
        transfer.state = state;
        let is_inscribed = transfer.counts_as_inscribed();

        if was_inscribed != is_inscribed {
            let (sender, ticker) = (transfer.sender.clone(), transfer.ticker.clone());
            self.adjust_inscribed(&sender, &ticker, is_inscribed);
        }
        Ok(())
    }

    /// Transfers still waiting to be sent by `pk_script` for `ticker`.
    pub fn count_inscribed_transfers(&self, pk_script: &Script, ticker: &str) -> usize {
        self.inscribed_transfers
            .get(pk_script)
            .and_then(|tickers| tickers.get(ticker))
            .copied()
            .unwrap_or(0)
    }

    fn adjust_inscribed(&mut self, sender: &Script, ticker: &str, added: bool) {
        let count = self
            .inscribed_transfers
            .entry(sender.to_owned())
            .or_default()
            .entry(ticker.to_string())
            .or_default();
        if added {
            *count += 1;
        } else {
            *count = count.saturating_sub(1);
        }
    }

    pub fn add_valid_data(&mut self, create_idx_key: &str, data: ValidInscription) {
        *self.valid_counts.entry(data.ticker.clone()).or_default() += 1;
        self.valid_data.insert(create_idx_key.to_string(), data);
    }

    pub fn get_valid_data(&self, create_idx_key: &str) -> Option<&ValidInscription> {
        self.valid_data.get(create_idx_key)
    }

    pub fn valid_count(&self, ticker: &str) -> usize {
        self.valid_counts.get(ticker).copied().unwrap_or(0)
    }

    pub fn add_module(&mut self, module: ModuleInfo) -> Result<(), Brc20Error> {
        if self.modules.contains_key(&module.id) {
            return Err(Brc20Error::ModuleExists(module.id));
        }
        self.module_deposit_scripts
            .insert(module.deposit_pk_script.clone(), module.id.clone());
        self.modules.insert(module.id.clone(), module);
        Ok(())
    }

    pub fn get_module(&self, module_id: &str) -> Option<&ModuleInfo> {
        self.modules.get(module_id)
    }

    pub fn get_module_mut(&mut self, module_id: &str) -> Result<&mut ModuleInfo, Brc20Error> {
        self.modules
            .get_mut(module_id)
            .ok_or_else(|| Brc20Error::ModuleNotFound(module_id.to_string()))
    }

    /// Module whose deposit script is `pk_script`, if any.
    pub fn module_for_deposit_script(&self, pk_script: &Script) -> Option<&str> {
        self.module_deposit_scripts
            .get(pk_script)
            .map(|id| id.as_str())
    }

    /// Modules in lexical order of their id.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleInfo> {
        self.modules.values()
    }

    pub fn append_history(&mut self, record: HistoryRecord) -> Option<usize> {
        let index = self.history.append(record);
        if let Some(index) = index {
            if let Some(record) = self.history.get(index) {
                tracing::trace!("history {}: {}", index, record.get_event_str());
            }
        }
        index
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }
}
