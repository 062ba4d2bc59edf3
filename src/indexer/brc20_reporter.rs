use std::{cmp::Reverse, error::Error, io::Write, path::Path};

use bitcoin::{Address, Network, Script};
use serde::Serialize;

use crate::{config::Brc20IndexerConfig, ledger::Brc20Ledger, types::HistoryRecord};

#[derive(Serialize)]
struct HistoryLine<'a> {
    event_id: usize,
    event_type_id: i32,
    #[serde(flatten)]
    record: &'a HistoryRecord,
}

/// Writes the end-of-run summaries of the ledger.
pub struct Brc20Reporter {
    pub network_type: Network,
}

impl Brc20Reporter {
    pub fn new(config: &Brc20IndexerConfig) -> Self {
        Brc20Reporter {
            network_type: config.network_type,
        }
    }

    /// Standard scripts as addresses, everything else as hex.
    pub fn get_wallet(&self, pk_script: &Script) -> String {
        Address::from_script(pk_script, self.network_type)
            .map(|address| address.to_string())
            .unwrap_or_else(|_| pk_script.to_hex_string())
    }

    pub fn write_ticker_report<W: Write>(
        &self,
        ledger: &Brc20Ledger,
        writer: &mut W,
    ) -> std::io::Result<()> {
        for ticker in ledger.tickers() {
            let mut holders: Vec<_> = ledger
                .ticker_holders(&ticker.ticker)
                .into_iter()
                .flatten()
                .filter(|(_, balance)| !balance.overall.is_zero())
                .map(|(pk_script, balance)| (self.get_wallet(pk_script), pk_script, balance))
                .collect();
            holders.sort_by_key(|(wallet, _, balance)| {
                (Reverse(balance.overall.mantissa()), wallet.clone())
            });

            writeln!(
                writer,
                "{} trxs: {}, valid: {}, minted: {}, holders: {}",
                ticker.ticker,
                ledger.history().count_for_ticker(&ticker.ticker),
                ledger.valid_count(&ticker.ticker),
                ticker.minted,
                holders.len()
            )?;

            for (wallet, pk_script, balance) in holders {
                let tokens = ledger.user_balances(pk_script).map_or(0, |balances| {
                    balances
                        .values()
                        .filter(|balance| !balance.overall.is_zero())
                        .count()
                });
                writeln!(
                    writer,
                    "{} {} history: {}, transfer: {}, balance: {}, tokens: {}",
                    ticker.ticker,
                    wallet,
                    ledger
                        .history()
                        .count_for_address_ticker(&pk_script.to_hex_string(), &ticker.ticker),
                    ledger.count_inscribed_transfers(pk_script, &ticker.ticker),
                    balance.overall,
                    tokens
                )?;
            }
        }
        Ok(())
    }

    pub fn write_module_report<W: Write>(
        &self,
        ledger: &Brc20Ledger,
        writer: &mut W,
    ) -> std::io::Result<()> {
        for module in ledger.modules() {
            let mut balances: Vec<_> = module
                .balances
                .iter()
                .flat_map(|(pk_script, tickers)| {
                    let wallet = self.get_wallet(pk_script);
                    tickers
                        .iter()
                        .filter(|(_, balance)| !balance.overall.is_zero())
                        .map(move |(ticker, balance)| (wallet.clone(), ticker, balance))
                })
                .collect();
            balances.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

            writeln!(
                writer,
                "{} name: {}, sequencer: {}, commits: {}, balances: {}",
                module.id,
                module.name,
                self.get_wallet(&module.deployer_pk_script),
                module.commit_count,
                balances.len()
            )?;
            for (ticker, deposited) in &module.deposits {
                writeln!(writer, "{} deposit {} total: {}", module.id, ticker, deposited)?;
            }
            for (wallet, ticker, balance) in balances {
                writeln!(
                    writer,
                    "{} {} {} balance: {}",
                    module.id, wallet, ticker, balance.overall
                )?;
            }
        }
        Ok(())
    }

    /// One JSON object per history record, in append order.
    pub fn write_history<W: Write>(
        &self,
        ledger: &Brc20Ledger,
        writer: &mut W,
    ) -> std::io::Result<()> {
        for (event_id, record) in ledger.history().records().iter().enumerate() {
            let line = HistoryLine {
                event_id,
                event_type_id: record.history_type.id(),
                record,
            };
            serde_json::to_writer(&mut *writer, &line)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    pub async fn dump_ticker_report(
        &self,
        ledger: &Brc20Ledger,
        path: &str,
    ) -> Result<(), Box<dyn Error>> {
        let mut buffer = Vec::new();
        self.write_ticker_report(ledger, &mut buffer)?;
        write_file(path, buffer).await?;
        tracing::info!("Wrote ticker report to {}", path);
        Ok(())
    }

    pub async fn dump_module_report(
        &self,
        ledger: &Brc20Ledger,
        path: &str,
    ) -> Result<(), Box<dyn Error>> {
        let mut buffer = Vec::new();
        self.write_module_report(ledger, &mut buffer)?;
        write_file(path, buffer).await?;
        tracing::info!("Wrote module report to {}", path);
        Ok(())
    }

    pub async fn dump_history(
        &self,
        ledger: &Brc20Ledger,
        path: &str,
    ) -> Result<(), Box<dyn Error>> {
        if !ledger.history().is_enabled() {
            tracing::warn!("History is disabled, not writing {}", path);
            return Ok(());
        }
        let mut buffer = Vec::new();
        self.write_history(ledger, &mut buffer)?;
        write_file(path, buffer).await?;
        tracing::info!("Wrote {} history records to {}", ledger.history().len(), path);
        Ok(())
    }
}

async fn write_file(path: &str, contents: Vec<u8>) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}
