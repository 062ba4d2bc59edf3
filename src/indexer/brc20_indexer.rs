use tokio::sync::mpsc;

use crate::{
    config::{
        Brc20IndexerConfig, OPERATION_COMMIT, OPERATION_DEPLOY, OPERATION_MINT,
        OPERATION_TRANSFER, OPERATION_WITHDRAW, PROGRESS_LOG_INTERVAL, PROTOCOL_BRC20,
        PROTOCOL_BRC20_MODULE,
    },
    indexer::{
        Brc20Error, DeployProcessor, MintProcessor, ModuleProcessor, ProcessError,
        ProcessOutcome, RejectReason, TransferProcessor,
        timer::{Timings, start_timer, stop_timer},
    },
    ledger::Brc20Ledger,
    types::{InscriptionContent, InscriptionEvent},
};

static SPAN: &str = "Brc20Indexer";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexerStats {
    pub events: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub fatal: u64,
    pub last_block_height: u32,
    pub timings: Timings,
}

pub struct Brc20Indexer {
    config: Brc20IndexerConfig,
    ledger: Brc20Ledger,
    stats: IndexerStats,
}

impl Brc20Indexer {
    pub fn new(config: Brc20IndexerConfig) -> Self {
        let ledger = Brc20Ledger::new(config.enable_history);
        Brc20Indexer {
            config,
            ledger,
            stats: IndexerStats::default(),
        }
    }

    pub fn config(&self) -> &Brc20IndexerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Brc20Ledger {
        &self.ledger
    }

    pub fn stats(&self) -> &IndexerStats {
        &self.stats
    }

    /// Consumes events until the producer hangs up. Fatal outcomes are
    /// counted and logged, and only end the run when `stop_on_fatal` is set.
    pub async fn run(
        &mut self,
        mut receiver: mpsc::Receiver<InscriptionEvent>,
    ) -> Result<IndexerStats, Brc20Error> {
        tracing::info!("Processing inscription events...");

        while let Some(event) = receiver.recv().await {
            if let ProcessOutcome::Fatal(error) = self.process_event(&event) {
                if self.config.stop_on_fatal {
                    tracing::error!(
                        "Stopping at height {} after fatal error: {}",
                        event.height,
                        error
                    );
                    return Err(error);
                }
            }

            if self.stats.events % PROGRESS_LOG_INTERVAL == 0 {
                tracing::info!(
                    "Processed {} events, block height {}",
                    self.stats.events,
                    self.stats.last_block_height
                );
            }
        }

        tracing::info!(
            "Processed {} events: {} accepted, {} rejected, {} fatal",
            self.stats.events,
            self.stats.accepted,
            self.stats.rejected,
            self.stats.fatal
        );
        for (label, timer) in &self.stats.timings {
            tracing::debug!(
                "{}: {} calls, {}us total",
                label,
                timer.calls,
                timer.total_nanos / 1000
            );
        }

        Ok(self.stats.clone())
    }

    pub fn process_event(&mut self, event: &InscriptionEvent) -> ProcessOutcome {
        self.stats.events += 1;
        self.stats.last_block_height = event.height;

        let timer = start_timer(SPAN, event.height);
        let (operation, result) = self.dispatch(event);
        stop_timer(&timer, operation, &mut self.stats.timings);

        let outcome = ProcessOutcome::from(result);
        match &outcome {
            ProcessOutcome::Accepted => {
                self.stats.accepted += 1;
                tracing::debug!(
                    "Accepted {} {} at height {}",
                    operation,
                    event.inscription_id(),
                    event.height
                );
            }
            ProcessOutcome::Rejected(reason) => {
                self.stats.rejected += 1;
                tracing::debug!(
                    "Skipping {} {} as {}",
                    operation,
                    event.inscription_id(),
                    reason
                );
            }
            ProcessOutcome::Fatal(error) => {
                self.stats.fatal += 1;
                tracing::error!(
                    "Failed {} {} at height {}: {}",
                    operation,
                    event.inscription_id(),
                    event.height,
                    error
                );
            }
        }
        outcome
    }

    fn dispatch(&mut self, event: &InscriptionEvent) -> (&'static str, Result<(), ProcessError>) {
        let ledger = &mut self.ledger;

        if event.is_transfer {
            let Some(pending) = ledger.get_pending_transfer(&event.create_idx_key).cloned()
            else {
                return ("transfer", Err(RejectReason::UnknownTransfer.into()));
            };
            if pending.state.is_settled() {
                return ("transfer", Err(RejectReason::TransferAlreadySettled.into()));
            }
            if pending.is_withdraw() {
                return (
                    "withdraw_transfer",
                    ModuleProcessor::withdraw_transfer(ledger, event, &pending),
                );
            }
            return (
                "transfer_transfer",
                TransferProcessor::transfer_transfer(ledger, event, &pending),
            );
        }

        let Some(content) = InscriptionContent::parse(&event.content) else {
            return ("inscribe", Err(RejectReason::InvalidContent.into()));
        };

        match (content.protocol(), content.operation()) {
            (Some(PROTOCOL_BRC20), Some(OPERATION_DEPLOY)) => (
                "deploy_inscribe",
                DeployProcessor::deploy_inscribe(&self.config, ledger, event, &content),
            ),
            (Some(PROTOCOL_BRC20), Some(OPERATION_MINT)) => (
                "mint_inscribe",
                MintProcessor::mint_inscribe(ledger, event, &content),
            ),
            (Some(PROTOCOL_BRC20), Some(OPERATION_TRANSFER)) => (
                "transfer_inscribe",
                TransferProcessor::transfer_inscribe(ledger, event, &content),
            ),
            (Some(PROTOCOL_BRC20_MODULE), Some(OPERATION_DEPLOY)) => (
                "module_deploy",
                ModuleProcessor::module_deploy(&self.config, ledger, event, &content),
            ),
            (Some(PROTOCOL_BRC20_MODULE), Some(OPERATION_COMMIT)) => (
                "module_commit",
                ModuleProcessor::module_commit(ledger, event, &content),
            ),
            (Some(PROTOCOL_BRC20_MODULE), Some(OPERATION_WITHDRAW)) => (
                "withdraw_inscribe",
                ModuleProcessor::withdraw_inscribe(ledger, event, &content),
            ),
            (Some(PROTOCOL_BRC20 | PROTOCOL_BRC20_MODULE), Some(operation)) => (
                "inscribe",
                Err(RejectReason::UnknownOperation(operation.to_string()).into()),
            ),
            _ => ("inscribe", Err(RejectReason::InvalidContent.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::test_utils::*;

    fn events() -> Vec<InscriptionEvent> {
        vec![
            inscribe(
                1,
                &wallet(1),
                r#"{"p":"brc-20","op":"deploy","tick":"ordi","max":"100","dec":"0"}"#,
                10,
            ),
            inscribe(2, &wallet(1), r#"{"p":"brc-20","op":"deploy","tick":"sats"}"#, 10),
            inscribe(
                3,
                &wallet(2),
                r#"{"p":"brc-20","op":"mint","tick":"ordi","amt":"10"}"#,
                11,
            ),
            inscribe(4, &wallet(2), "not json", 11),
            inscribe(
                5,
                &wallet(2),
                r#"{"p":"brc-20","op":"transfer","tick":"ordi","amt":"4"}"#,
                12,
            ),
            send(5, &wallet(3), 13),
        ]
    }

    async fn run_events(
        config: Brc20IndexerConfig,
        events: Vec<InscriptionEvent>,
    ) -> (Brc20Indexer, Result<IndexerStats, Brc20Error>) {
        let (sender, receiver) = mpsc::channel(2);
        let producer = tokio::spawn(async move {
            for event in events {
                if sender.send(event).await.is_err() {
                    break;
                }
            }
        });
        let mut indexer = Brc20Indexer::new(config);
        let result = indexer.run(receiver).await;
        producer.await.unwrap();
        (indexer, result)
    }

    #[tokio::test]
    async fn test_run_continues_after_fatal() {
        let (indexer, result) = run_events(config(), events()).await;
        let stats = result.unwrap();
        assert_eq!(stats.events, 6);
        assert_eq!(stats.accepted, 4);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.fatal, 1);
        assert_eq!(stats.last_block_height, 13);
        assert_eq!(stats.timings["Brc20Indexer#mint_inscribe"].calls, 1);

        let ticker = indexer.ledger().get_ticker("ordi").unwrap();
        assert_eq!(indexer.ledger().get_balance(&wallet(3), ticker).overall.to_string(), "4");
        assert_eq!(indexer.ledger().history().len(), 5);
    }

    #[tokio::test]
    async fn test_run_stops_on_fatal() {
        let mut config = config();
        config.stop_on_fatal = true;
        let (indexer, result) = run_events(config, events()).await;

        let error = result.unwrap_err();
        assert!(matches!(error, Brc20Error::DeployMaxMissing(_)));
        assert_eq!(indexer.stats().events, 2);
        assert!(indexer.ledger().get_ticker("ordi").is_some());
    }

    #[tokio::test]
    async fn test_disabled_history_records_nothing() {
        let mut config = config();
        config.enable_history = false;
        let (indexer, result) = run_events(config, events()).await;

        assert_eq!(result.unwrap().accepted, 4);
        assert!(indexer.ledger().history().is_empty());
    }

    #[test]
    fn test_dispatch_rejects_unknown_content() {
        let mut indexer = Brc20Indexer::new(config());
        let cases = [
            (
                r#"{"p":"brc-20","op":"burn","tick":"ordi"}"#,
                RejectReason::UnknownOperation("burn".to_string()),
            ),
            (
                r#"{"p":"brc20-module","op":"swap"}"#,
                RejectReason::UnknownOperation("swap".to_string()),
            ),
            (r#"{"p":"brc-21","op":"mint"}"#, RejectReason::InvalidContent),
            (r#"{"op":"mint"}"#, RejectReason::InvalidContent),
            ("[]", RejectReason::InvalidContent),
        ];
        for (n, (body, reason)) in cases.into_iter().enumerate() {
            let outcome = indexer.process_event(&inscribe(n as u32, &wallet(1), body, 1));
            assert_eq!(outcome, ProcessOutcome::Rejected(reason));
        }
        assert_eq!(indexer.stats().rejected, 5);
    }
}
