use crate::{
    config::{
        Brc20IndexerConfig, DECIMALS_KEY, LIMIT_PER_MINT_KEY, MAX_SUPPLY_KEY,
        SELF_MINT_KEY, SELF_MINT_TICKER_LENGTH, TICKER_KEY,
    },
    default,
    indexer::{
        Brc20Error, ProcessError, RejectReason,
        utils::{ALLOW_ZERO, get_amount_value, get_decimals_value, get_valid_lower_ticker},
    },
    ledger::{Brc20Ledger, ValidInscription},
    no_default,
    types::{
        BalanceEntry, Decimal, HistoryRecord, HistoryType, InscriptionContent, InscriptionEvent,
        TickInfo,
    },
};

pub struct DeployProcessor;

impl DeployProcessor {
    pub(crate) fn deploy_inscribe(
        config: &Brc20IndexerConfig,
        ledger: &mut Brc20Ledger,
        event: &InscriptionEvent,
        content: &InscriptionContent,
    ) -> Result<(), ProcessError> {
        let original_ticker = content
            .get_str(TICKER_KEY)
            .ok_or(RejectReason::InvalidTicker)?;
        let ticker = get_valid_lower_ticker(original_ticker).ok_or(RejectReason::InvalidTicker)?;

        let is_self_mint = original_ticker.len() == SELF_MINT_TICKER_LENGTH;
        if is_self_mint
            && (content.get_str(SELF_MINT_KEY) != Some("true")
                || event.height < config.self_mint_activation_height)
        {
            return Err(RejectReason::SelfMintNotAllowed.into());
        }

        if let Some(ticks_enabled) = &config.ticks_enabled {
            if ticker.contains(' ') || !ticks_enabled.contains(&ticker) {
                return Err(RejectReason::TickerNotEnabled(ticker).into());
            }
        }

        if ledger.get_ticker(&ticker).is_some() {
            return Err(RejectReason::TickerAlreadyDeployed(ticker).into());
        }

        let Some(max_supply) = content.get_str(MAX_SUPPLY_KEY) else {
            return Err(Brc20Error::DeployMaxMissing(event.inscription_id()).into());
        };

        let (decimals, max_supply, limit_per_mint) =
            Self::parse_supply(content, max_supply, is_self_mint).map_err(|reason| {
                Brc20Error::DeployFieldInvalid {
                    inscription_id: event.inscription_id(),
                    reason,
                }
            })?;

        let inscription_id = event.inscription_id();
        ledger.add_ticker(TickInfo {
            ticker: ticker.clone(),
            original_ticker: original_ticker.to_string(),
            decimals,
            max_supply,
            limit_per_mint,
            minted: Decimal::zero(decimals),
            burned: Decimal::zero(decimals),
            is_self_mint,
            deploy_inscription_id: inscription_id.clone(),
            deploy_inscription_number: event.inscription_number,
            deploy_block_height: event.height,
            update_block_height: event.height,
        })?;

        let balance = BalanceEntry::zero(decimals);
        ledger.set_balance(&event.pk_script, &ticker, balance);
        ledger.append_history(
            HistoryRecord::new(HistoryType::Deploy, event, &ticker, &event.pk_script)
                .with_amount(max_supply)
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

    /// `dec`, `max` and `lim` of a deploy that passed every gate. Zero max or
    /// limit means the ceiling for self-mint tickers.
    fn parse_supply(
        content: &InscriptionContent,
        max_supply: &str,
        is_self_mint: bool,
    ) -> Result<(u8, Decimal, Decimal), RejectReason> {
        let decimals = get_decimals_value(content.get_str(DECIMALS_KEY))?;
        let mut max_supply = get_amount_value(
            MAX_SUPPLY_KEY,
            Some(max_supply),
            decimals,
            no_default!(),
            ALLOW_ZERO,
        )?;
        let mut limit_per_mint = get_amount_value(
            LIMIT_PER_MINT_KEY,
            content.get_str(LIMIT_PER_MINT_KEY),
            decimals,
            default!(max_supply),
            ALLOW_ZERO,
        )?;

        if max_supply.is_zero() {
            if !is_self_mint {
                return Err(RejectReason::ZeroAmount(MAX_SUPPLY_KEY));
            }
            max_supply = Decimal::max_value(decimals);
        }
        if limit_per_mint.is_zero() {
            if !is_self_mint {
                return Err(RejectReason::ZeroAmount(LIMIT_PER_MINT_KEY));
            }
            limit_per_mint = Decimal::max_value(decimals);
        }

        Ok((decimals, max_supply, limit_per_mint))
    }
}
