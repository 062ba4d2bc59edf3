use crate::{
    config::{AMOUNT_KEY, TICKER_KEY},
    indexer::{
        Brc20Error, ProcessError, RejectReason,
        utils::{DISALLOW_ZERO, get_amount_value, get_valid_lower_ticker},
    },
    ledger::{Brc20Ledger, ValidInscription},
    no_default,
    types::{
        HistoryRecord, HistoryType, InscriptionContent, InscriptionEvent, PendingTransfer,
        TransferState,
    },
};

pub struct TransferProcessor;

impl TransferProcessor {
    /// Locks the amount in the sender's balance until the inscription moves.
    pub(crate) fn transfer_inscribe(
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        content: &InscriptionContent,
    ) -> Result<(), ProcessError> {
        let ticker = content
            .get_str(TICKER_KEY)
            .and_then(get_valid_lower_ticker)
            .ok_or(RejectReason::InvalidTicker)?;
        let Some(deployed_ticker) = ledger.get_ticker(&ticker) else {
            return Err(RejectReason::TickerNotDeployed(ticker).into());
        };

        let amount = get_amount_value(
            AMOUNT_KEY,
            content.get_str(AMOUNT_KEY),
            deployed_ticker.decimals,
            no_default!(),
            DISALLOW_ZERO,
        )?;

        let balance = ledger.get_balance(&event.pk_script, deployed_ticker);
        if balance.available < amount {
            return Err(RejectReason::InsufficientBalance.into());
        }
        let balance = balance.lock(&amount)?;

        let inscription_id = event.inscription_id();
        ledger.set_balance(&event.pk_script, &ticker, balance);
        ledger.add_pending_transfer(
            &event.create_idx_key,
            PendingTransfer {
                inscription_id: inscription_id.clone(),
                inscription_number: event.inscription_number,
                sender: event.pk_script.clone(),
                ticker: ticker.clone(),
                amount,
                module: None,
                inscribed_block_height: event.height,
                state: TransferState::Inscribed,
            },
        );
        ledger.append_history(
            HistoryRecord::new(HistoryType::InscribeTransfer, event, &ticker, &event.pk_script)
                .with_amount(amount)
                .with_balance(balance),
        );
        ledger.add_valid_data(
            &event.create_idx_key,
            ValidInscription {
                inscription_id,
                ticker,
                content: content.clone(),
            },
        );

        Ok(())
    }

    /// First move of an inscribed transfer. The receiver decides between
    /// refund, module deposit, burn and a plain send.
    pub(crate) fn transfer_transfer(
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        pending: &PendingTransfer,
    ) -> Result<(), ProcessError> {
        let Some(mut deployed_ticker) = ledger.get_ticker(&pending.ticker).cloned() else {
            return Err(Brc20Error::TickerNotFound(pending.ticker.clone()).into());
        };
        let ticker = deployed_ticker.ticker.clone();
        let amount = pending.amount;
        let sender = &pending.sender;
        let receiver = &event.pk_script;
        let sender_balance = ledger.get_balance(sender, &deployed_ticker);

        if event.sent_as_fee() || receiver == sender {
            let balance = sender_balance.unlock(&amount)?;
            ledger.set_balance(sender, &ticker, balance);
            ledger.set_transfer_state(&event.create_idx_key, TransferState::Refunded)?;
            ledger.append_history(
                HistoryRecord::new(HistoryType::TransferRefund, event, &ticker, sender)
                    .with_origin(&pending.inscription_id, pending.inscription_number)
                    .with_amount(amount)
                    .with_balance(balance),
            );
            return Ok(());
        }

        let sender_balance = sender_balance.settle(&amount)?;
        let send_record = HistoryRecord::new(HistoryType::Send, event, &ticker, sender)
            .with_origin(&pending.inscription_id, pending.inscription_number)
            .with_counterparty(receiver)
            .with_amount(amount)
            .with_balance(sender_balance);

        if let Some(module_id) = ledger.module_for_deposit_script(receiver).map(str::to_string) {
            let module = ledger.get_module_mut(&module_id)?;
            let module_balance = module
                .get_balance(sender, &ticker, deployed_ticker.decimals)
                .credit(&amount)?;
            let deposited = match module.deposits.get(&ticker) {
                Some(total) => total.checked_add(&amount)?,
                None => amount,
            };
            module.set_balance(sender, &ticker, module_balance);
            module.deposits.insert(ticker.clone(), deposited);

            ledger.set_balance(sender, &ticker, sender_balance);
            ledger.set_transfer_state(&event.create_idx_key, TransferState::Deposited)?;
            ledger.append_history(send_record.with_module(&module_id));
            ledger.append_history(
                HistoryRecord::new(HistoryType::ModuleDeposit, event, &ticker, sender)
                    .with_origin(&pending.inscription_id, pending.inscription_number)
                    .with_counterparty(receiver)
                    .with_module(&module_id)
                    .with_amount(amount)
                    .with_balance(sender_balance),
            );
            return Ok(());
        }

        if receiver.is_op_return() {
            deployed_ticker.burned = deployed_ticker.burned.checked_add(&amount)?;
            deployed_ticker.update_block_height = event.height;
            ledger.update_ticker(deployed_ticker)?;
            ledger.set_balance(sender, &ticker, sender_balance);
            ledger.set_transfer_state(&event.create_idx_key, TransferState::Burned)?;
            ledger.append_history(send_record);
            ledger.append_history(
                HistoryRecord::new(HistoryType::Burn, event, &ticker, sender)
                    .with_origin(&pending.inscription_id, pending.inscription_number)
                    .with_counterparty(receiver)
                    .with_amount(amount)
                    .with_balance(sender_balance),
            );
            return Ok(());
        }

        let receiver_balance = ledger
            .get_balance(receiver, &deployed_ticker)
            .credit(&amount)?;
        ledger.set_balance(sender, &ticker, sender_balance);
        ledger.set_balance(receiver, &ticker, receiver_balance);
        ledger.set_transfer_state(&event.create_idx_key, TransferState::Sent)?;
        ledger.append_history(send_record);
        ledger.append_history(
            HistoryRecord::new(HistoryType::Receive, event, &ticker, receiver)
                .with_origin(&pending.inscription_id, pending.inscription_number)
                .with_counterparty(sender)
                .with_amount(amount)
                .with_balance(receiver_balance),
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        indexer::{Brc20Indexer, ProcessOutcome, module_deposit_script, test_utils::*},
        types::{BalanceEntry, Decimal},
    };

    fn amount(s: &str) -> Decimal {
        Decimal::parse(s, 2).unwrap()
    }

    fn balance(available: &str, overall: &str) -> BalanceEntry {
        BalanceEntry {
            available: amount(available),
            overall: amount(overall),
        }
    }

    /// `ABCD` deployed, 100 minted to `wallet(2)`.
    fn minted_indexer() -> Brc20Indexer {
        let mut indexer = Brc20Indexer::new(config());
        indexer.process_event(&inscribe(
            1,
            &wallet(1),
            r#"{"p":"brc-20","op":"deploy","tick":"ABCD","max":"1000","lim":"100","dec":"2"}"#,
            10,
        ));
        indexer.process_event(&inscribe(
            2,
            &wallet(2),
            r#"{"p":"brc-20","op":"mint","tick":"abcd","amt":"100"}"#,
            11,
        ));
        indexer
    }

    fn inscribe_transfer(indexer: &mut Brc20Indexer, n: u32, amt: &str) -> ProcessOutcome {
        let body = format!(r#"{{"p":"brc-20","op":"transfer","tick":"abcd","amt":"{}"}}"#, amt);
        indexer.process_event(&inscribe(n, &wallet(2), &body, 12))
    }

    fn balance_of(indexer: &Brc20Indexer, seed: u8) -> BalanceEntry {
        let ticker = indexer.ledger().get_ticker("abcd").unwrap();
        indexer.ledger().get_balance(&wallet(seed), ticker)
    }

    #[test]
    fn test_inscribe_then_send() {
        let mut indexer = minted_indexer();
        assert!(inscribe_transfer(&mut indexer, 3, "50").is_accepted());
        assert_eq!(balance_of(&indexer, 2), balance("50", "100"));
        assert_eq!(balance_of(&indexer, 2).pending().unwrap(), amount("50"));

        assert!(indexer.process_event(&send(3, &wallet(3), 13)).is_accepted());
        assert_eq!(balance_of(&indexer, 2), balance("50", "50"));
        assert_eq!(balance_of(&indexer, 3), balance("50", "50"));

        let pending = indexer
            .ledger()
            .get_pending_transfer(&inscribe(3, &wallet(2), "", 12).create_idx_key)
            .unwrap();
        assert_eq!(pending.state, TransferState::Sent);

        let history = indexer.ledger().history();
        assert_eq!(history.len(), 5);
        let types: Vec<_> = history.records()[3..]
            .iter()
            .map(|record| record.history_type)
            .collect();
        assert_eq!(types, [HistoryType::Send, HistoryType::Receive]);
        assert_eq!(history.records()[4].inscription_id, pending.inscription_id);
        assert_eq!(history.count_for_address_ticker(&wallet(3).to_hex_string(), "abcd"), 1);
    }

    #[test]
    fn test_second_move_is_rejected() {
        let mut indexer = minted_indexer();
        inscribe_transfer(&mut indexer, 3, "50");
        indexer.process_event(&send(3, &wallet(3), 13));

        assert_eq!(
            indexer.process_event(&send(3, &wallet(4), 14)),
            ProcessOutcome::Rejected(RejectReason::TransferAlreadySettled)
        );
        assert_eq!(balance_of(&indexer, 3), balance("50", "50"));
        assert_eq!(balance_of(&indexer, 4), BalanceEntry::zero(2));
    }

    #[test]
    fn test_inscribe_requires_available_balance() {
        let mut indexer = minted_indexer();
        assert!(inscribe_transfer(&mut indexer, 3, "60").is_accepted());
        assert_eq!(
            inscribe_transfer(&mut indexer, 4, "60"),
            ProcessOutcome::Rejected(RejectReason::InsufficientBalance)
        );
        assert_eq!(
            inscribe_transfer(&mut indexer, 5, "0"),
            ProcessOutcome::Rejected(RejectReason::ZeroAmount(AMOUNT_KEY))
        );
        assert_eq!(balance_of(&indexer, 2), balance("40", "100"));
    }

    #[test]
    fn test_refunds() {
        let mut indexer = minted_indexer();
        inscribe_transfer(&mut indexer, 3, "30");
        inscribe_transfer(&mut indexer, 4, "20");
        assert_eq!(balance_of(&indexer, 2), balance("50", "100"));

        assert!(indexer.process_event(&send_as_fee(3, 13)).is_accepted());
        assert_eq!(balance_of(&indexer, 2), balance("80", "100"));

        assert!(indexer.process_event(&send(4, &wallet(2), 13)).is_accepted());
        assert_eq!(balance_of(&indexer, 2), balance("100", "100"));

        let records = indexer.ledger().history().records();
        assert_eq!(records.len(), 6);
        assert_eq!(records[4].history_type, HistoryType::TransferRefund);
        assert_eq!(records[5].history_type, HistoryType::TransferRefund);
    }

    #[test]
    fn test_op_return_burns() {
        let mut indexer = minted_indexer();
        inscribe_transfer(&mut indexer, 3, "25");
        let burn_script = module_deposit_script("not a module").unwrap();

        assert!(indexer.process_event(&send(3, &burn_script, 13)).is_accepted());
        assert_eq!(balance_of(&indexer, 2), balance("75", "75"));

        let ticker = indexer.ledger().get_ticker("abcd").unwrap();
        assert_eq!(ticker.burned, amount("25"));
        assert_eq!(ticker.minted, amount("100"));
        assert!(indexer.ledger().ticker_holders("abcd").unwrap().get(&burn_script).is_none());

        let types: Vec<_> = indexer.ledger().history().records()[3..]
            .iter()
            .map(|record| record.history_type)
            .collect();
        assert_eq!(types, [HistoryType::Send, HistoryType::Burn]);
    }

    #[test]
    fn test_unknown_transfer_is_rejected() {
        let mut indexer = minted_indexer();
        assert_eq!(
            indexer.process_event(&send(99, &wallet(3), 13)),
            ProcessOutcome::Rejected(RejectReason::UnknownTransfer)
        );
        // the mint inscription is not a transfer either
        assert_eq!(
            indexer.process_event(&send(2, &wallet(3), 13)),
            ProcessOutcome::Rejected(RejectReason::UnknownTransfer)
        );
    }
}
