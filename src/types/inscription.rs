use bitcoin::ScriptBuf;

/// One row of the ordered inscription stream.
///
/// A creation event carries the inscription body. A transfer event
/// (`is_transfer`) reports that an existing inscription moved to the output
/// locked by `pk_script`; `create_idx_key` ties it back to its creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InscriptionEvent {
    pub is_transfer: bool,
    pub txid: String,
    pub idx: u32,
    pub vout: u32,
    pub offset: u64,
    /// Value of the carrying output, 0 when the inscription went to fees.
    pub satoshi: u64,
    pub pk_script: ScriptBuf,
    pub inscription_number: i64,
    pub content: Vec<u8>,
    pub create_idx_key: String,
    pub height: u32,
    pub tx_idx: u32,
    pub block_time: u32,
    pub parent_id: Option<String>,
}

impl InscriptionEvent {
    pub fn inscription_id(&self) -> String {
        format!("{}i{}", self.txid, self.idx)
    }

    pub fn sent_as_fee(&self) -> bool {
        self.satoshi == 0
    }
}
