use crate::{
    config::{DEFAULT_DECIMALS, MAX_DECIMALS, MAX_TICKER_LENGTH, SELF_MINT_TICKER_LENGTH},
    indexer::RejectReason,
    types::Decimal,
};

pub const ALLOW_ZERO: bool = true;
pub const DISALLOW_ZERO: bool = false;

/// Lowercase registry key for `ticker`, or `None` if it can never be valid.
pub fn get_valid_lower_ticker(ticker: &str) -> Option<String> {
    let length = ticker.len();
    if length == 0 || ticker.contains('\0') {
        return None;
    }
    if length > MAX_TICKER_LENGTH && length != SELF_MINT_TICKER_LENGTH {
        return None;
    }
    Some(ticker.to_lowercase())
}

fn is_positive_integer(number: &str) -> bool {
    !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit())
}

pub fn get_decimals_value(number: Option<&str>) -> Result<u8, RejectReason> {
    let Some(number) = number else {
        return Ok(DEFAULT_DECIMALS);
    };
    if !is_positive_integer(number) {
        return Err(RejectReason::InvalidDecimals);
    }
    match number.parse::<u8>() {
        Ok(decimals) if decimals <= MAX_DECIMALS => Ok(decimals),
        _ => Err(RejectReason::InvalidDecimals),
    }
}

/// Parses a protocol amount at the ticker's scale. A missing field falls back
/// to `default_value` when one is given.
pub fn get_amount_value(
    field: &'static str,
    number: Option<&str>,
    decimals: u8,
    default_value: Option<Decimal>,
    allow_zero: bool,
) -> Result<Decimal, RejectReason> {
    let Some(number) = number else {
        return default_value.ok_or(RejectReason::MissingField(field));
    };
    let amount = Decimal::parse(number, decimals)
        .map_err(|error| RejectReason::InvalidAmount { field, error })?;
    if amount.is_zero() && !allow_zero {
        return Err(RejectReason::ZeroAmount(field));
    }
    Ok(amount)
}

#[macro_export]
macro_rules! default {
    ($value: expr) => {
        Some($value)
    };
}

#[macro_export]
macro_rules! no_default {
    () => {
        None
    };
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::types::DecimalError;

    #[rstest]
    #[case("ordi", Some("ordi"))]
    #[case("ORDI", Some("ordi"))]
    #[case("abcde", Some("abcde"))]
    #[case("a", Some("a"))]
    #[case("", None)]
    #[case("abcdef", None)]
    #[case("ab\0c", None)]
    fn test_get_valid_lower_ticker(#[case] ticker: &str, #[case] expected: Option<&str>) {
        assert_eq!(get_valid_lower_ticker(ticker).as_deref(), expected);
    }

    #[test]
    fn test_multibyte_ticker_length_is_bytes() {
        // 4 characters, 8 bytes
        assert_eq!(get_valid_lower_ticker("ΩΩΩΩ"), None);
        // 2 characters, 4 bytes
        assert_eq!(get_valid_lower_ticker("ΩΩ").as_deref(), Some("ωω"));
    }

    #[rstest]
    #[case(None, Ok(18))]
    #[case(Some("0"), Ok(0))]
    #[case(Some("8"), Ok(8))]
    #[case(Some("18"), Ok(18))]
    #[case(Some("19"), Err(RejectReason::InvalidDecimals))]
    #[case(Some("-1"), Err(RejectReason::InvalidDecimals))]
    #[case(Some("1.0"), Err(RejectReason::InvalidDecimals))]
    #[case(Some(""), Err(RejectReason::InvalidDecimals))]
    #[case(Some("300"), Err(RejectReason::InvalidDecimals))]
    fn test_get_decimals_value(
        #[case] input: Option<&str>,
        #[case] expected: Result<u8, RejectReason>,
    ) {
        assert_eq!(get_decimals_value(input), expected);
    }

    #[test]
    fn test_get_amount_value() {
        assert_eq!(
            get_amount_value("amt", Some("1.5"), 2, no_default!(), DISALLOW_ZERO).unwrap(),
            Decimal::parse("1.50", 2).unwrap()
        );
        assert_eq!(
            get_amount_value("amt", Some("0"), 2, no_default!(), DISALLOW_ZERO),
            Err(RejectReason::ZeroAmount("amt"))
        );
        assert!(get_amount_value("max", Some("0"), 2, no_default!(), ALLOW_ZERO).is_ok());

        let fallback = Decimal::parse("7", 2).unwrap();
        assert_eq!(
            get_amount_value("lim", None, 2, default!(fallback), DISALLOW_ZERO),
            Ok(fallback)
        );
        assert_eq!(
            get_amount_value("lim", None, 2, no_default!(), DISALLOW_ZERO),
            Err(RejectReason::MissingField("lim"))
        );
        assert_eq!(
            get_amount_value("amt", Some("-1"), 2, no_default!(), DISALLOW_ZERO),
            Err(RejectReason::InvalidAmount {
                field: "amt",
                error: DecimalError::Negative("-1".to_string()),
            })
        );
    }
}
