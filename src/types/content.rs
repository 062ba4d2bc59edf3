use serde_json::{Map, Value as JsonValue};

use crate::config::{
    AMOUNT_KEY, DECIMALS_KEY, LIMIT_PER_MINT_KEY, MAX_SUPPLY_KEY, MODULE_KEY, NAME_KEY,
    OPERATION_KEY, PROTOCOL_KEY, SELF_MINT_KEY, SOURCE_KEY, TICKER_KEY,
};

/// Keys that must hold a JSON string whenever they are present.
const STRING_KEYS: [&str; 11] = [
    PROTOCOL_KEY,
    OPERATION_KEY,
    TICKER_KEY,
    MAX_SUPPLY_KEY,
    LIMIT_PER_MINT_KEY,
    DECIMALS_KEY,
    AMOUNT_KEY,
    SELF_MINT_KEY,
    MODULE_KEY,
    NAME_KEY,
    SOURCE_KEY,
];

/// Decoded inscription body.
#[derive(Debug, Clone, PartialEq)]
pub struct InscriptionContent {
    fields: Map<String, JsonValue>,
}

impl InscriptionContent {
    /// Returns `None` for anything that is not a JSON object whose protocol
    /// fields are all strings. Numbers in place of strings (`"amt": 5`) are
    /// malformed, not coerced.
    pub fn parse(body: &[u8]) -> Option<Self> {
        let JsonValue::Object(fields) = serde_json::from_slice::<JsonValue>(body).ok()? else {
            return None;
        };

        if STRING_KEYS
            .iter()
            .any(|key| fields.get(*key).is_some_and(|value| !value.is_string()))
        {
            return None;
        }

        Some(InscriptionContent { fields })
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|value| value.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.fields.get(key)
    }

    pub fn protocol(&self) -> Option<&str> {
        self.get_str(PROTOCOL_KEY)
    }

    pub fn operation(&self) -> Option<&str> {
        self.get_str(OPERATION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_deploy_body() {
        let content = InscriptionContent::parse(
            br#"{"p":"brc-20","op":"deploy","tick":"ordi","max":"21000000","lim":"1000"}"#,
        )
        .unwrap();
        assert_eq!(content.protocol(), Some("brc-20"));
        assert_eq!(content.operation(), Some("deploy"));
        assert_eq!(content.get_str(TICKER_KEY), Some("ordi"));
        assert_eq!(content.get_str(DECIMALS_KEY), None);
        assert_eq!(content.get_str(MAX_SUPPLY_KEY), Some("21000000"));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(InscriptionContent::parse(b"").is_none());
        assert!(InscriptionContent::parse(b"not json").is_none());
        assert!(InscriptionContent::parse(b"[1, 2]").is_none());
        assert!(InscriptionContent::parse(b"\"brc-20\"").is_none());
    }

    #[test]
    fn test_parse_rejects_non_string_fields() {
        assert!(
            InscriptionContent::parse(br#"{"p":"brc-20","op":"mint","tick":"ordi","amt":1000}"#)
                .is_none()
        );
        assert!(InscriptionContent::parse(br#"{"p":"brc-20","op":null}"#).is_none());
    }

    #[test]
    fn test_parse_keeps_structured_module_data() {
        let content = InscriptionContent::parse(
            br#"{"p":"brc20-module","op":"commit","module":"abci0","data":[{"tick":"ordi"}]}"#,
        )
        .unwrap();
        assert!(content.get("data").unwrap().is_array());
    }
}
