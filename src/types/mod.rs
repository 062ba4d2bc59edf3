mod decimal;
pub use decimal::{Decimal, DecimalError};

mod content;
pub use content::InscriptionContent;

mod inscription;
pub use inscription::InscriptionEvent;

mod ticker;
pub use ticker::TickInfo;

mod balance;
pub use balance::BalanceEntry;

mod transfer;
pub use transfer::{PendingTransfer, TransferState};

mod module;
pub use module::ModuleInfo;

mod history;
pub use history::{HistoryRecord, HistoryType};
