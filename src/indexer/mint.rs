use crate::{
    config::{AMOUNT_KEY, TICKER_KEY},
    indexer::{
        ProcessError, RejectReason,
        utils::{DISALLOW_ZERO, get_amount_value, get_valid_lower_ticker},
    },
    ledger::{Brc20Ledger, ValidInscription},
    no_default,
    types::{HistoryRecord, HistoryType, InscriptionContent, InscriptionEvent},
};

pub struct MintProcessor;

impl MintProcessor {
    pub(crate) fn mint_inscribe(
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        content: &InscriptionContent,
    ) -> Result<(), ProcessError> {
        let ticker = content
            .get_str(TICKER_KEY)
            .and_then(get_valid_lower_ticker)
            .ok_or(RejectReason::InvalidTicker)?;
        let Some(mut deployed_ticker) = ledger.get_ticker(&ticker).cloned() else {
            return Err(RejectReason::TickerNotDeployed(ticker).into());
        };

        let amount = get_amount_value(
            AMOUNT_KEY,
            content.get_str(AMOUNT_KEY),
            deployed_ticker.decimals,
            no_default!(),
            DISALLOW_ZERO,
        )?;

        if deployed_ticker.is_self_mint
            && event.parent_id.as_deref() != Some(deployed_ticker.deploy_inscription_id.as_str())
        {
            return Err(RejectReason::SelfMintParentMismatch.into());
        }
        if amount > deployed_ticker.limit_per_mint {
            return Err(RejectReason::MintLimitExceeded.into());
        }
        if amount > deployed_ticker.remaining_supply()? {
            return Err(RejectReason::SupplyExceeded.into());
        }

        let balance = ledger
            .get_balance(&event.pk_script, &deployed_ticker)
            .credit(&amount)?;
        deployed_ticker.minted = deployed_ticker.minted.checked_add(&amount)?;
        deployed_ticker.update_block_height = event.height;

        ledger.update_ticker(deployed_ticker)?;
        ledger.set_balance(&event.pk_script, &ticker, balance);
        ledger.append_history(
            HistoryRecord::new(HistoryType::Mint, event, &ticker, &event.pk_script)
                .with_amount(amount)
                .with_balance(balance),
        );
        ledger.add_valid_data(
            &event.create_idx_key,
            ValidInscription {
                inscription_id: event.inscription_id(),
                ticker,
                content: content.clone(),
            },
        );

        Ok(())
    }
}
