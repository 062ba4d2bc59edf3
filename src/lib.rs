pub mod client;
pub mod config;
pub mod indexer;
pub mod ledger;
pub mod types;
