use std::io::Write;

use bitcoin::{Network, ScriptBuf, WPubkeyHash, hashes::Hash};
use brc20_module_indexer::{
    client::load_input_data,
    config::{Brc20IndexerConfig, MODULE_SWAP_SOURCE_INSCRIPTION_ID_DEFAULT},
    indexer::{Brc20Indexer, Brc20Reporter, ProcessOutcome, module_deposit_script},
    types::{BalanceEntry, Decimal, InscriptionEvent},
};
use proptest::prelude::*;
use tokio::sync::mpsc;

fn wallet(seed: u8) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([seed; 20]))
}

fn input_line(n: u32, is_transfer: bool, pk_script: &ScriptBuf, body: &str, height: u32) -> String {
    format!(
        "{} {:064x} 0 0 0 546 {} {} {} {:08x} {} {} 1700000000",
        if is_transfer { 1 } else { 0 },
        n,
        pk_script.to_hex_string(),
        n,
        hex::encode(body),
        n,
        height,
        n
    )
}

fn event(n: u32, is_transfer: bool, pk_script: &ScriptBuf, body: &str) -> InscriptionEvent {
    InscriptionEvent {
        is_transfer,
        txid: format!("{:064x}", n),
        idx: 0,
        vout: 0,
        offset: 0,
        satoshi: 546,
        pk_script: pk_script.clone(),
        inscription_number: i64::from(n),
        content: body.as_bytes().to_vec(),
        create_idx_key: format!("{:08x}", n),
        height: 800_000,
        tx_idx: n,
        block_time: 1_700_000_000,
        parent_id: None,
    }
}

fn config() -> Brc20IndexerConfig {
    Brc20IndexerConfig::new(Network::Regtest)
}

#[tokio::test]
async fn test_file_to_report() {
    let (a, b) = (wallet(1), wallet(2));
    let lines = [
        input_line(
            1,
            false,
            &a,
            r#"{"p":"brc-20","op":"deploy","tick":"ABCD","max":"1000","lim":"100","dec":"2"}"#,
            10,
        ),
        input_line(2, false, &a, r#"{"p":"brc-20","op":"mint","tick":"abcd","amt":"100"}"#, 11),
        input_line(3, false, &a, r#"{"p":"brc-20","op":"mint","tick":"abcd","amt":"950"}"#, 11),
        input_line(
            4,
            false,
            &a,
            r#"{"p":"brc-20","op":"transfer","tick":"abcd","amt":"50"}"#,
            12,
        ),
        input_line(4, true, &b, "", 13),
    ];
    let mut input = tempfile::NamedTempFile::new().unwrap();
    for line in &lines {
        writeln!(input, "{}", line).unwrap();
    }
    input.flush().unwrap();

    let output_dir = tempfile::tempdir().unwrap();
    let mut config = config();
    config.input_file = input.path().to_str().unwrap().to_string();
    config.output_file = output_dir.path().join("brc20.output.txt").to_str().unwrap().to_string();
    config.output_module_file =
        output_dir.path().join("module.output.txt").to_str().unwrap().to_string();

    let (sender, receiver) = mpsc::channel(config.queue_capacity);
    let input_file = config.input_file.clone();
    let loader = tokio::spawn(async move { load_input_data(&input_file, sender).await });

    let mut indexer = Brc20Indexer::new(config);
    let stats = indexer.run(receiver).await.unwrap();
    assert_eq!(loader.await.unwrap().unwrap(), 5);
    assert_eq!(stats.accepted, 4);
    assert_eq!(stats.rejected, 1);

    let amount = |s: &str| Decimal::parse(s, 2).unwrap();
    let ledger = indexer.ledger();
    let ticker = ledger.get_ticker("abcd").unwrap();
    assert_eq!(ticker.minted, amount("100"));
    let half = BalanceEntry {
        available: amount("50"),
        overall: amount("50"),
    };
    assert_eq!(ledger.get_balance(&a, ticker), half);
    assert_eq!(ledger.get_balance(&b, ticker), half);

    let reporter = Brc20Reporter::new(indexer.config());
    reporter
        .dump_ticker_report(ledger, &indexer.config().output_file)
        .await
        .unwrap();
    reporter
        .dump_module_report(ledger, &indexer.config().output_module_file)
        .await
        .unwrap();

    let report = tokio::fs::read_to_string(&indexer.config().output_file)
        .await
        .unwrap();
    let mut report_lines = report.lines();
    assert_eq!(
        report_lines.next(),
        Some("abcd trxs: 5, valid: 3, minted: 100.00, holders: 2")
    );
    assert_eq!(report_lines.count(), 2);
    assert!(report.contains(&format!(
        "abcd {} history: 4, transfer: 0, balance: 50.00, tokens: 1",
        reporter.get_wallet(&a)
    )));
    assert!(report.contains(&format!(
        "abcd {} history: 1, transfer: 0, balance: 50.00, tokens: 1",
        reporter.get_wallet(&b)
    )));
    assert_eq!(
        tokio::fs::read_to_string(&indexer.config().output_module_file)
            .await
            .unwrap(),
        ""
    );
}

#[derive(Debug, Clone)]
enum Op {
    Mint(u8, u32),
    InscribeTransfer(u8, u32),
    /// Sequencer batch moving module balance between two wallets
    Commit(u8, u8, u32),
    Withdraw(u8, u32),
    /// Move the n-th inscription to a wallet, into fees (4), to a plain
    /// OP_RETURN (5) or to the module deposit script (6)
    Move(usize, u8),
}

const SEQUENCER: u8 = 0;

fn module_id() -> String {
    format!("{:064x}i0", 1)
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..4, 0u32..150).prop_map(|(w, amt)| Op::Mint(w, amt)),
        (0u8..4, 0u32..150).prop_map(|(w, amt)| Op::InscribeTransfer(w, amt)),
        (0u8..4, 0u8..4, 0u32..80).prop_map(|(from, to, amt)| Op::Commit(from, to, amt)),
        (0u8..4, 0u32..80).prop_map(|(w, amt)| Op::Withdraw(w, amt)),
        (0usize..32, 0u8..7).prop_map(|(n, r)| Op::Move(n, r)),
    ]
}

fn to_events(ops: &[Op]) -> Vec<InscriptionEvent> {
    let mut events = vec![
        event(
            0,
            false,
            &wallet(SEQUENCER),
            r#"{"p":"brc-20","op":"deploy","tick":"abcd","max":"1000","lim":"100","dec":"0"}"#,
        ),
        event(
            1,
            false,
            &wallet(SEQUENCER),
            &format!(
                r#"{{"p":"brc20-module","op":"deploy","name":"swap","source":"{}"}}"#,
                MODULE_SWAP_SOURCE_INSCRIPTION_ID_DEFAULT
            ),
        ),
    ];
    let deposit_script = module_deposit_script(&module_id()).unwrap();
    for (n, op) in ops.iter().enumerate() {
        let n = n as u32 + 2;
        events.push(match op {
            Op::Mint(w, amt) => event(
                n,
                false,
                &wallet(*w),
                &format!(r#"{{"p":"brc-20","op":"mint","tick":"abcd","amt":"{}"}}"#, amt),
            ),
            Op::InscribeTransfer(w, amt) => event(
                n,
                false,
                &wallet(*w),
                &format!(r#"{{"p":"brc-20","op":"transfer","tick":"abcd","amt":"{}"}}"#, amt),
            ),
            Op::Commit(from, to, amt) => event(
                n,
                false,
                &wallet(SEQUENCER),
                &format!(
                    r#"{{"p":"brc20-module","op":"commit","module":"{}","data":[{{"from":"{}","to":"{}","tick":"abcd","amt":"{}"}}]}}"#,
                    module_id(),
                    wallet(*from).to_hex_string(),
                    wallet(*to).to_hex_string(),
                    amt
                ),
            ),
            Op::Withdraw(w, amt) => event(
                n,
                false,
                &wallet(*w),
                &format!(
                    r#"{{"p":"brc20-module","op":"withdraw","module":"{}","tick":"abcd","amt":"{}"}}"#,
                    module_id(),
                    amt
                ),
            ),
            Op::Move(target, receiver) => {
                let target = (*target as u32) % n;
                let mut moved = match receiver {
                    5 => event(target, true, &module_deposit_script("burn").unwrap(), ""),
                    6 => event(target, true, &deposit_script, ""),
                    r => event(target, true, &wallet(*r), ""),
                };
                if *receiver == 4 {
                    moved.satoshi = 0;
                }
                moved
            }
        });
    }
    events
}

proptest! {
    #[test]
    fn test_ledger_invariants_hold(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let events = to_events(&ops);
        let mut indexer = Brc20Indexer::new(config());
        let mut silent = Brc20Indexer::new(Brc20IndexerConfig {
            enable_history: false,
            ..config()
        });

        for event in &events {
            let outcome = indexer.process_event(event);
            prop_assert!(!matches!(outcome, ProcessOutcome::Fatal(_)), "{:?}", outcome);
            prop_assert_eq!(silent.process_event(event), outcome);

            let ledger = indexer.ledger();
            let ticker = ledger.get_ticker("abcd").unwrap();
            prop_assert!(ticker.minted <= ticker.max_supply);

            let main_balances = ledger.ticker_holders("abcd").into_iter().flat_map(|h| h.values());
            let module_balances = ledger
                .get_module(&module_id())
                .into_iter()
                .flat_map(|module| module.balances.values())
                .filter_map(|tickers| tickers.get("abcd"));

            let mut total = ticker.burned;
            for balance in main_balances.chain(module_balances) {
                prop_assert!(balance.available <= balance.overall);
                total = total.checked_add(&balance.overall).unwrap();
            }
            prop_assert_eq!(total, ticker.minted);
        }

        prop_assert!(indexer.ledger().get_module(&module_id()).is_some());
        prop_assert!(silent.ledger().history().is_empty());
        prop_assert_eq!(
            silent.ledger().ticker_holders("abcd"),
            indexer.ledger().ticker_holders("abcd")
        );
    }
}

#[test]
fn test_module_round_trip_conserves_supply() {
    let (sequencer, alice, bob) = (wallet(SEQUENCER), wallet(1), wallet(2));
    let ops = [
        Op::Mint(1, 100),
        Op::InscribeTransfer(1, 60),
        Op::Move(3, 6),
        Op::Commit(1, 2, 25),
        Op::Withdraw(2, 20),
        Op::Move(6, 3),
    ];
    let mut indexer = Brc20Indexer::new(config());
    for event in to_events(&ops) {
        assert!(indexer.process_event(&event).is_accepted(), "{:?}", event);
    }

    let amount = |n: u32| Decimal::parse(&n.to_string(), 0).unwrap();
    let ledger = indexer.ledger();
    let ticker = ledger.get_ticker("abcd").unwrap();
    let module = ledger.get_module(&module_id()).unwrap();
    assert_eq!(module.commit_count, 1);
    assert_eq!(module.deposits["abcd"], amount(60));
    assert_eq!(module.get_balance(&alice, "abcd", 0).overall, amount(35));
    assert_eq!(module.get_balance(&bob, "abcd", 0).overall, amount(5));
    assert_eq!(ledger.get_balance(&alice, ticker).overall, amount(40));
    assert_eq!(ledger.get_balance(&wallet(3), ticker).overall, amount(20));
    assert_eq!(ledger.get_balance(&sequencer, ticker).overall, amount(0));
    assert_eq!(ticker.minted, amount(100));
}
