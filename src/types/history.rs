use bitcoin::Script;
use serde::Serialize;

use crate::types::{BalanceEntry, Decimal, InscriptionEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryType {
    Deploy,
    Mint,
    InscribeTransfer,
    Send,
    Receive,
    TransferRefund,
    Burn,
    ModuleDeploy,
    ModuleDeposit,
    ModuleCommit,
    ModuleWithdrawInscribe,
    ModuleWithdraw,
}

impl HistoryType {
    pub fn name(&self) -> &'static str {
        match self {
            HistoryType::Deploy => "deploy",
            HistoryType::Mint => "mint",
            HistoryType::InscribeTransfer => "inscribe-transfer",
            HistoryType::Send => "send",
            HistoryType::Receive => "receive",
            HistoryType::TransferRefund => "transfer-refund",
            HistoryType::Burn => "burn",
            HistoryType::ModuleDeploy => "module-deploy",
            HistoryType::ModuleDeposit => "module-deposit",
            HistoryType::ModuleCommit => "module-commit",
            HistoryType::ModuleWithdrawInscribe => "module-withdraw-inscribe",
            HistoryType::ModuleWithdraw => "module-withdraw",
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            HistoryType::Deploy => 0,
            HistoryType::Mint => 1,
            HistoryType::InscribeTransfer => 2,
            HistoryType::Send => 3,
            HistoryType::Receive => 4,
            HistoryType::TransferRefund => 5,
            HistoryType::Burn => 6,
            HistoryType::ModuleDeploy => 7,
            HistoryType::ModuleDeposit => 8,
            HistoryType::ModuleCommit => 9,
            HistoryType::ModuleWithdrawInscribe => 10,
            HistoryType::ModuleWithdraw => 11,
        }
    }
}

/// One state change. `pk_script` is the party whose balance moved, `balance`
/// its main-ledger balance right after the change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    #[serde(rename = "type")]
    pub history_type: HistoryType,
    pub valid: bool,
    pub height: u32,
    pub tx_idx: u32,
    pub block_time: u32,
    pub inscription_id: String,
    pub inscription_number: i64,
    pub create_idx_key: String,
    /// Empty for records that span several tickers (commits)
    #[serde(rename = "tick")]
    pub ticker: String,
    #[serde(rename = "pkScript")]
    pub pk_script: String,
    #[serde(rename = "counterparty_pkScript")]
    pub counterparty_pk_script: Option<String>,
    pub module: Option<String>,
    pub amount: Option<Decimal>,
    pub balance: Option<BalanceEntry>,
}

impl HistoryRecord {
    pub fn new(
        history_type: HistoryType,
        event: &InscriptionEvent,
        ticker: &str,
        pk_script: &Script,
    ) -> Self {
        HistoryRecord {
            history_type,
            valid: true,
            height: event.height,
            tx_idx: event.tx_idx,
            block_time: event.block_time,
            inscription_id: event.inscription_id(),
            inscription_number: event.inscription_number,
            create_idx_key: event.create_idx_key.clone(),
            ticker: ticker.to_string(),
            pk_script: pk_script.to_hex_string(),
            counterparty_pk_script: None,
            module: None,
            amount: None,
            balance: None,
        }
    }

    /// Points the record at the inscription that started a two-phase move.
    pub fn with_origin(mut self, inscription_id: &str, inscription_number: i64) -> Self {
        self.inscription_id = inscription_id.to_string();
        self.inscription_number = inscription_number;
        self
    }

    pub fn with_counterparty(mut self, pk_script: &Script) -> Self {
        self.counterparty_pk_script = Some(pk_script.to_hex_string());
        self
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_balance(mut self, balance: BalanceEntry) -> Self {
        self.balance = Some(balance);
        self
    }

    pub fn get_event_str(&self) -> String {
        format!(
            "{};{};{};{};{};{};{}",
            self.history_type.name(),
            self.inscription_id,
            self.pk_script,
            self.counterparty_pk_script.as_deref().unwrap_or(""),
            self.ticker,
            self.amount.map(|a| a.to_string()).unwrap_or_default(),
            self.module.as_deref().unwrap_or("")
        )
    }
}
