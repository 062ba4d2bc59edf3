use bitcoin::ScriptBuf;

use crate::types::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Inscribed,
    Sent,
    Refunded,
    Burned,
    Deposited,
}

impl TransferState {
    pub fn is_settled(&self) -> bool {
        *self != TransferState::Inscribed
    }
}

/// A transfer (or module withdraw) inscription waiting for its first move.
///
/// Keyed in the ledger by the `create_idx_key` of the inscribing event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub inscription_id: String,
    pub inscription_number: i64,
    pub sender: ScriptBuf,
    pub ticker: String,
    pub amount: Decimal,
    /// Set for withdraws, the amount is locked in this module's balance space.
    pub module: Option<String>,
    pub inscribed_block_height: u32,
    pub state: TransferState,
}

impl PendingTransfer {
    pub fn is_withdraw(&self) -> bool {
        self.module.is_some()
    }

    /// An unsent brc-20 transfer, as shown in the holder report.
    pub fn counts_as_inscribed(&self) -> bool {
        self.state == TransferState::Inscribed && !self.is_withdraw()
    }
}
