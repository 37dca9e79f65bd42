//! Query-string helpers shared by the API handlers.
//!
//! Handlers extract the raw pairs with `Query<Vec<(String, String)>>` so
//! repeated keys survive for the filter normalizer; paging and shaping
//! parameters are picked out of the same list here.

use crate::utils::AppError;

pub type RawParams = Vec<(String, String)>;

pub fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parse an integer parameter, failing loudly on malformed input
pub fn parse_i64_param(
    params: &[(String, String)],
    key: &str,
    default: i64,
) -> Result<i64, AppError> {
    match first_param(params, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<i64>()
            .map_err(|_| AppError::Validation(format!("Invalid value for '{key}': '{raw}'"))),
    }
}

pub fn parse_usize_param(
    params: &[(String, String)],
    key: &str,
    default: usize,
) -> Result<usize, AppError> {
    match first_param(params, key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| AppError::Validation(format!("Invalid value for '{key}': '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RawParams {
        vec![
            ("page".to_string(), "3".to_string()),
            ("limit".to_string(), "oops".to_string()),
        ]
    }

    #[test]
    fn parses_present_and_defaulted_values() {
        assert_eq!(parse_i64_param(&params(), "page", 1).unwrap(), 3);
        assert_eq!(parse_i64_param(&params(), "missing", 7).unwrap(), 7);
    }

    #[test]
    fn rejects_malformed_integers() {
        assert!(parse_i64_param(&params(), "limit", 20).is_err());
    }
}
