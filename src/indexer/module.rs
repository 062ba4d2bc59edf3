use std::collections::HashMap;

use bitcoin::{ScriptBuf, script::PushBytesBuf};
use serde_json::Value as JsonValue;

use crate::{
    config::{
        AMOUNT_KEY, Brc20IndexerConfig, DATA_KEY, FROM_KEY, MODULE_KEY, NAME_KEY, SOURCE_KEY,
        TICKER_KEY, TO_KEY,
    },
    indexer::{
        Brc20Error, ProcessError, RejectReason,
        utils::{DISALLOW_ZERO, get_amount_value, get_valid_lower_ticker},
    },
    ledger::{Brc20Ledger, ValidInscription},
    no_default,
    types::{
        BalanceEntry, Decimal, HistoryRecord, HistoryType, InscriptionContent, InscriptionEvent,
        ModuleInfo, PendingTransfer, TransferState,
    },
};

/// `OP_RETURN <module id>`, the output script that deposits into a module.
pub fn module_deposit_script(module_id: &str) -> Result<ScriptBuf, RejectReason> {
    let data = PushBytesBuf::try_from(module_id.as_bytes().to_vec())
        .map_err(|_| RejectReason::InvalidContent)?;
    Ok(ScriptBuf::new_op_return(data))
}

/// One validated line of a commit.
struct CommitItem {
    from: ScriptBuf,
    to: ScriptBuf,
    ticker: String,
    amount: Decimal,
}

pub struct ModuleProcessor;

impl ModuleProcessor {
    pub(crate) fn module_deploy(
        config: &Brc20IndexerConfig,
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        content: &InscriptionContent,
    ) -> Result<(), ProcessError> {
        let name = content.get_str(NAME_KEY).ok_or(RejectReason::InvalidContent)?;
        let source = content
            .get_str(SOURCE_KEY)
            .ok_or(RejectReason::InvalidContent)?;
        if source != config.module_swap_source_inscription_id {
            return Err(RejectReason::ModuleSourceMismatch.into());
        }

        let module_id = event.inscription_id();
        if ledger.get_module(&module_id).is_some() {
            return Err(RejectReason::ModuleAlreadyDeployed(module_id).into());
        }
        let deposit_pk_script = module_deposit_script(&module_id)?;

        ledger.add_module(ModuleInfo::new(
            module_id.clone(),
            name.to_string(),
            source.to_string(),
            event.pk_script.clone(),
            deposit_pk_script,
            event.inscription_number,
            event.height,
        ))?;
        ledger.append_history(
            HistoryRecord::new(HistoryType::ModuleDeploy, event, "", &event.pk_script)
                .with_module(&module_id),
        );
        ledger.add_valid_data(
            &event.create_idx_key,
            ValidInscription {
                inscription_id: module_id,
                ticker: String::new(),
                content: content.clone(),
            },
        );

        Ok(())
    }

    /// Applies a sequencer batch of module-internal transfers. Every item is
    /// checked against the balances left by the items before it, and the
    /// batch lands whole or not at all.
    pub(crate) fn module_commit(
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        content: &InscriptionContent,
    ) -> Result<(), ProcessError> {
        let module_id = content
            .get_str(MODULE_KEY)
            .ok_or(RejectReason::InvalidContent)?;
        let Some(module) = ledger.get_module(module_id) else {
            return Err(RejectReason::ModuleNotDeployed(module_id.to_string()).into());
        };
        if event.pk_script != module.deployer_pk_script {
            return Err(RejectReason::NotModuleSequencer.into());
        }
        let Some(items) = content.get(DATA_KEY).and_then(JsonValue::as_array) else {
            return Err(RejectReason::InvalidContent.into());
        };

        let mut staged: HashMap<(ScriptBuf, String), BalanceEntry> = HashMap::new();
        for (index, item) in items.iter().enumerate() {
            let invalid = |reason: String| RejectReason::InvalidCommitItem { index, reason };
            let item = Self::parse_commit_item(ledger, item).map_err(invalid)?;
            let decimals = item.amount.scale();

            let from_key = (item.from.clone(), item.ticker.clone());
            let from_balance = staged
                .get(&from_key)
                .copied()
                .unwrap_or_else(|| module.get_balance(&item.from, &item.ticker, decimals));
            if from_balance.available < item.amount {
                return Err(invalid("insufficient module balance".to_string()).into());
            }
            let from_balance = from_balance
                .lock(&item.amount)
                .and_then(|b| b.settle(&item.amount))
                .map_err(|e| invalid(e.to_string()))?;
            staged.insert(from_key, from_balance);

            let to_key = (item.to.clone(), item.ticker.clone());
            let to_balance = staged
                .get(&to_key)
                .copied()
                .unwrap_or_else(|| module.get_balance(&item.to, &item.ticker, decimals))
                .credit(&item.amount)
                .map_err(|e| invalid(e.to_string()))?;
            staged.insert(to_key, to_balance);
        }

        let module_id = module_id.to_string();
        let module = ledger.get_module_mut(&module_id)?;
        for ((pk_script, ticker), balance) in staged {
            module.set_balance(&pk_script, &ticker, balance);
        }
        module.commit_count += 1;

        ledger.append_history(
            HistoryRecord::new(HistoryType::ModuleCommit, event, "", &event.pk_script)
                .with_module(&module_id),
        );
        ledger.add_valid_data(
            &event.create_idx_key,
            ValidInscription {
                inscription_id: event.inscription_id(),
                ticker: String::new(),
                content: content.clone(),
            },
        );

        Ok(())
    }

    fn parse_commit_item(ledger: &Brc20Ledger, item: &JsonValue) -> Result<CommitItem, String> {
        let field = |key: &str| {
            item.get(key)
                .and_then(JsonValue::as_str)
                .ok_or_else(|| format!("missing {}", key))
        };
        let script = |key: &str| {
            field(key).and_then(|value| {
                hex::decode(value)
                    .map(ScriptBuf::from_bytes)
                    .map_err(|e| format!("invalid {}: {}", key, e))
            })
        };

        let from = script(FROM_KEY)?;
        let to = script(TO_KEY)?;
        let ticker = get_valid_lower_ticker(field(TICKER_KEY)?)
            .ok_or_else(|| "invalid ticker".to_string())?;
        let Some(deployed_ticker) = ledger.get_ticker(&ticker) else {
            return Err(format!("ticker '{}' is not deployed", ticker));
        };
        let amount = get_amount_value(
            AMOUNT_KEY,
            item.get(AMOUNT_KEY).and_then(JsonValue::as_str),
            deployed_ticker.decimals,
            no_default!(),
            DISALLOW_ZERO,
        )
        .map_err(|e| e.to_string())?;

        Ok(CommitItem {
            from,
            to,
            ticker,
            amount,
        })
    }

    /// Locks part of the inscriber's module balance for a withdraw.
    pub(crate) fn withdraw_inscribe(
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        content: &InscriptionContent,
    ) -> Result<(), ProcessError> {
        let module_id = content
            .get_str(MODULE_KEY)
            .ok_or(RejectReason::InvalidContent)?;
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
        let Some(module) = ledger.get_module(module_id) else {
            return Err(RejectReason::ModuleNotDeployed(module_id.to_string()).into());
        };

        let module_balance = module.get_balance(&event.pk_script, &ticker, amount.scale());
        if module_balance.available < amount {
            return Err(RejectReason::InsufficientBalance.into());
        }
        let module_balance = module_balance.lock(&amount)?;

        let module_id = module_id.to_string();
        let inscription_id = event.inscription_id();
        ledger
            .get_module_mut(&module_id)?
            .set_balance(&event.pk_script, &ticker, module_balance);
        ledger.add_pending_transfer(
            &event.create_idx_key,
            PendingTransfer {
                inscription_id: inscription_id.clone(),
                inscription_number: event.inscription_number,
                sender: event.pk_script.clone(),
                ticker: ticker.clone(),
                amount,
                module: Some(module_id.clone()),
                inscribed_block_height: event.height,
                state: TransferState::Inscribed,
            },
        );
        ledger.append_history(
            HistoryRecord::new(
                HistoryType::ModuleWithdrawInscribe,
                event,
                &ticker,
                &event.pk_script,
            )
            .with_module(&module_id)
            .with_amount(amount),
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

    /// First move of a withdraw inscription. A real receiver gets the amount
    /// in the main ledger, a fee spend or OP_RETURN hands it back to the
    /// module balance it was locked in.
    pub(crate) fn withdraw_transfer(
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        pending: &PendingTransfer,
    ) -> Result<(), ProcessError> {
        let Some(module_id) = pending.module.as_deref() else {
            return Err(RejectReason::UnknownTransfer.into());
        };
        let Some(deployed_ticker) = ledger.get_ticker(&pending.ticker).cloned() else {
            return Err(Brc20Error::TickerNotFound(pending.ticker.clone()).into());
        };
        let ticker = deployed_ticker.ticker.as_str();
        let amount = pending.amount;
        let sender = &pending.sender;
        let receiver = &event.pk_script;

        let module = ledger.get_module_mut(module_id)?;
        let module_balance = module.get_balance(sender, ticker, deployed_ticker.decimals);

        if event.sent_as_fee() || receiver.is_op_return() {
            let module_balance = module_balance.unlock(&amount)?;
            module.set_balance(sender, ticker, module_balance);
            ledger.set_transfer_state(&event.create_idx_key, TransferState::Refunded)?;
            ledger.append_history(
                HistoryRecord::new(HistoryType::TransferRefund, event, ticker, sender)
                    .with_origin(&pending.inscription_id, pending.inscription_number)
                    .with_module(module_id)
                    .with_amount(amount),
            );
            return Ok(());
        }

        let module_balance = module_balance.settle(&amount)?;
        let receiver_balance = ledger
            .get_balance(receiver, &deployed_ticker)
            .credit(&amount)?;

        ledger
            .get_module_mut(module_id)?
            .set_balance(sender, ticker, module_balance);
        ledger.set_balance(receiver, ticker, receiver_balance);
        ledger.set_transfer_state(&event.create_idx_key, TransferState::Sent)?;
        ledger.append_history(
            HistoryRecord::new(HistoryType::ModuleWithdraw, event, ticker, sender)
                .with_origin(&pending.inscription_id, pending.inscription_number)
                .with_counterparty(receiver)
                .with_module(module_id)
                .with_amount(amount),
        );
        ledger.append_history(
            HistoryRecord::new(HistoryType::Receive, event, ticker, receiver)
                .with_origin(&pending.inscription_id, pending.inscription_number)
                .with_counterparty(sender)
                .with_module(module_id)
                .with_amount(amount)
                .with_balance(receiver_balance),
        );

        Ok(())
    }
}
