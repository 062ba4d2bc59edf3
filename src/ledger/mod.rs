mod brc20_ledger;
pub use brc20_ledger::{Brc20Ledger, ValidInscription};

mod history;
pub use history::HistoryLog;
