use serde::Serialize;

use crate::types::{Decimal, DecimalError};

/// Balance of one address for one ticker.
///
/// `available` is spendable, `overall` also counts amounts locked in
/// inscribed but unsent transfers. Every constructor and transition keeps
/// `available <= overall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceEntry {
    pub available: Decimal,
    pub overall: Decimal,
}

impl BalanceEntry {
    pub fn zero(scale: u8) -> Self {
        BalanceEntry {
            available: Decimal::zero(scale),
            overall: Decimal::zero(scale),
        }
    }

    pub fn pending(&self) -> Result<Decimal, DecimalError> {
        self.overall.checked_sub(&self.available)
    }

    /// Adds spendable funds.
    pub fn credit(&self, amount: &Decimal) -> Result<Self, DecimalError> {
        Ok(BalanceEntry {
            available: self.available.checked_add(amount)?,
            overall: self.overall.checked_add(amount)?,
        })
    }

    /// Moves `amount` from available into pending.
    pub fn lock(&self, amount: &Decimal) -> Result<Self, DecimalError> {
        Ok(BalanceEntry {
            available: self.available.checked_sub(amount)?,
            overall: self.overall,
        })
    }

    /// Returns `amount` from pending to available.
    pub fn unlock(&self, amount: &Decimal) -> Result<Self, DecimalError> {
        self.pending()?.checked_sub(amount)?;
        Ok(BalanceEntry {
            available: self.available.checked_add(amount)?,
            overall: self.overall,
        })
    }

    /// Removes `amount` from pending for good.
    pub fn settle(&self, amount: &Decimal) -> Result<Self, DecimalError> {
        self.pending()?.checked_sub(amount)?;
        Ok(BalanceEntry {
            available: self.available,
            overall: self.overall.checked_sub(amount)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Decimal {
        Decimal::parse(s, 2).unwrap()
    }

    #[test]
    fn test_lock_unlock_settle() {
        let balance = BalanceEntry::zero(2).credit(&amount("100")).unwrap();
        assert_eq!(balance.available, amount("100"));
        assert_eq!(balance.overall, amount("100"));

        let locked = balance.lock(&amount("40")).unwrap();
        assert_eq!(locked.available, amount("60"));
        assert_eq!(locked.overall, amount("100"));
        assert_eq!(locked.pending().unwrap(), amount("40"));

        let refunded = locked.unlock(&amount("40")).unwrap();
        assert_eq!(refunded, balance);

        let settled = locked.settle(&amount("40")).unwrap();
        assert_eq!(settled.available, amount("60"));
        assert_eq!(settled.overall, amount("60"));
    }

    #[test]
    fn test_transitions_keep_available_below_overall() {
        let balance = BalanceEntry::zero(2)
            .credit(&amount("10"))
            .unwrap()
            .lock(&amount("5"))
            .unwrap();

        assert_eq!(balance.lock(&amount("6")), Err(DecimalError::Underflow));
        assert_eq!(balance.unlock(&amount("6")), Err(DecimalError::Underflow));
        assert_eq!(balance.settle(&amount("6")), Err(DecimalError::Underflow));
    }
}
