use crate::types::{Decimal, DecimalError};

#[derive(Debug, Clone, PartialEq)]
pub struct TickInfo {
    /// Lowercase registry key
    pub ticker: String,
    pub original_ticker: String,
    pub decimals: u8,
    pub max_supply: Decimal,
    pub limit_per_mint: Decimal,
    pub minted: Decimal,
    pub burned: Decimal,
    pub is_self_mint: bool,
    pub deploy_inscription_id: String,
    pub deploy_inscription_number: i64,
    pub deploy_block_height: u32,
    pub update_block_height: u32,
}

impl TickInfo {
    pub fn remaining_supply(&self) -> Result<Decimal, DecimalError> {
        self.max_supply.checked_sub(&self.minted)
    }
}
