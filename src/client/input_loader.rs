use std::str::FromStr;

use bitcoin::ScriptBuf;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::types::InscriptionEvent;

const FIELD_COUNT: usize = 13;
const FIELD_COUNT_WITH_PARENT: usize = 14;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("line {line}: expected 13 or 14 fields, got {count}")]
    FieldCount { line: u64, count: usize },
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
    },
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

fn parse_field<T: FromStr>(line: u64, field: &'static str, value: &str) -> Result<T, InputError> {
    value.parse::<T>().map_err(|_| InputError::InvalidField {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_hex(line: u64, field: &'static str, value: &str) -> Result<Vec<u8>, InputError> {
    hex::decode(value).map_err(|_| InputError::InvalidField {
        line,
        field,
        value: value.to_string(),
    })
}

fn parse_bool(line: u64, field: &'static str, value: &str) -> Result<bool, InputError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(InputError::InvalidField {
            line,
            field,
            value: value.to_string(),
        }),
    }
}

/// Parses one line of the input dump:
/// `is_transfer txid idx vout offset satoshi pkscript inscription_number
/// content create_idx_key height tx_idx block_time [parent_id]`.
///
/// Fields are separated by single spaces, so an empty content field shows up
/// as two consecutive spaces.
pub fn parse_input_line(line_number: u64, line: &str) -> Result<InscriptionEvent, InputError> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(' ').collect();
    if fields.len() != FIELD_COUNT && fields.len() != FIELD_COUNT_WITH_PARENT {
        return Err(InputError::FieldCount {
            line: line_number,
            count: fields.len(),
        });
    }

    let txid = fields[1];
    if parse_hex(line_number, "txid", txid)?.len() != 32 {
        return Err(InputError::InvalidField {
            line: line_number,
            field: "txid",
            value: txid.to_string(),
        });
    }
    let create_idx_key = fields[9];
    parse_hex(line_number, "create_idx_key", create_idx_key)?;

    Ok(InscriptionEvent {
        is_transfer: parse_bool(line_number, "is_transfer", fields[0])?,
        txid: txid.to_lowercase(),
        idx: parse_field(line_number, "idx", fields[2])?,
        vout: parse_field(line_number, "vout", fields[3])?,
        offset: parse_field(line_number, "offset", fields[4])?,
        satoshi: parse_field(line_number, "satoshi", fields[5])?,
        pk_script: ScriptBuf::from_bytes(parse_hex(line_number, "pkscript", fields[6])?),
        inscription_number: parse_field(line_number, "inscription_number", fields[7])?,
        content: parse_hex(line_number, "content", fields[8])?,
        create_idx_key: create_idx_key.to_lowercase(),
        height: parse_field(line_number, "height", fields[10])?,
        tx_idx: parse_field(line_number, "tx_idx", fields[11])?,
        block_time: parse_field(line_number, "block_time", fields[12])?,
        parent_id: fields
            .get(13)
            .filter(|parent| !parent.is_empty())
            .map(|parent| parent.to_string()),
    })
}

/// Streams the input file into `sender` in file order. Returns the number of
/// events sent. Stops early, without error, once the receiver is gone.
pub async fn load_input_data(
    path: &str,
    sender: mpsc::Sender<InscriptionEvent>,
) -> Result<u64, InputError> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut line_number = 0;
    let mut sent = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let event = parse_input_line(line_number, &line)?;
        if sender.send(event).await.is_err() {
            tracing::warn!("Indexer stopped receiving at input line {}", line_number);
            break;
        }
        sent += 1;
    }

    tracing::info!("Loaded {} events from {}", sent, path);
    Ok(sent)
}
