use bitcoin::{PubkeyHash, ScriptBuf, WPubkeyHash, hashes::Hash};

use crate::{config::Brc20IndexerConfig, types::InscriptionEvent};

pub fn config() -> Brc20IndexerConfig {
    let mut config = Brc20IndexerConfig::new(bitcoin::Network::Regtest);
    config.self_mint_activation_height = 100;
    config
}

/// Deterministic P2WPKH script for a test actor.
pub fn wallet(seed: u8) -> ScriptBuf {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array([seed; 20]))
}

pub fn legacy_wallet(seed: u8) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array([seed; 20]))
}

pub fn txid(n: u32) -> String {
    format!("{:064x}", n)
}

/// Creation event for inscription `n` carrying `body`.
pub fn inscribe(n: u32, pk_script: &ScriptBuf, body: &str, height: u32) -> InscriptionEvent {
    InscriptionEvent {
        is_transfer: false,
        txid: txid(n),
        idx: 0,
        vout: 0,
        offset: 0,
        satoshi: 546,
        pk_script: pk_script.clone(),
        inscription_number: i64::from(n),
        content: body.as_bytes().to_vec(),
        create_idx_key: format!("{:08x}", n),
        height,
        tx_idx: n,
        block_time: 1_700_000_000,
        parent_id: None,
    }
}

/// Move of inscription `n` to `pk_script`.
pub fn send(n: u32, pk_script: &ScriptBuf, height: u32) -> InscriptionEvent {
    InscriptionEvent {
        is_transfer: true,
        content: Vec::new(),
        ..inscribe(n, pk_script, "", height)
    }
}

/// Move of inscription `n` into fees.
pub fn send_as_fee(n: u32, height: u32) -> InscriptionEvent {
    InscriptionEvent {
        satoshi: 0,
        ..send(n, &ScriptBuf::new(), height)
    }
}
