mod brc20_indexer;
pub use brc20_indexer::{Brc20Indexer, IndexerStats};

mod outcome;
pub use outcome::{Brc20Error, ProcessOutcome, RejectReason};
pub(crate) use outcome::ProcessError;

mod deploy;
pub use deploy::DeployProcessor;
mod mint;
pub use mint::MintProcessor;
mod transfer;
pub use transfer::TransferProcessor;
mod module;
pub use module::{ModuleProcessor, module_deposit_script};

mod brc20_reporter;
pub use brc20_reporter::Brc20Reporter;

mod timer;
pub use timer::{TimerStats, Timings};

mod utils;
pub use utils::get_valid_lower_ticker;

#[cfg(test)]
mod test_utils;
