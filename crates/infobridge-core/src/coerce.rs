//! Conversion of raw INFO field values into sample values.

use std::num::ParseFloatError;

use thiserror::Error;

/// A field value that is neither a status token nor a number.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("couldn't parse {value:?}: {source}")]
pub struct CoerceError {
    pub value: String,
    #[source]
    pub source: ParseFloatError,
}

/// Convert a field value into a numeric sample value.
///
/// `ok`/`true` map to 1, `err`/`fail`/`false` map to 0, anything else must
/// parse as a base-10 float.
pub fn coerce(value: &str) -> Result<f64, CoerceError> {
    match value {
        "ok" | "true" => Ok(1.0),
        "err" | "fail" | "false" => Ok(0.0),
        other => other.parse::<f64>().map_err(|source| CoerceError {
            value: other.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tokens() {
        assert_eq!(coerce("ok"), Ok(1.0));
        assert_eq!(coerce("true"), Ok(1.0));
        assert_eq!(coerce("err"), Ok(0.0));
        assert_eq!(coerce("fail"), Ok(0.0));
        assert_eq!(coerce("false"), Ok(0.0));
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn numbers() {
        assert_eq!(coerce("3.14"), Ok(3.14));
        assert_eq!(coerce("5"), Ok(5.0));
        assert_eq!(coerce("-2"), Ok(-2.0));
        assert_eq!(coerce("1e3"), Ok(1000.0));
    }

    #[test]
    fn tokens_are_case_sensitive() {
        assert!(coerce("OK").is_err());
        assert!(coerce("True").is_err());
    }

    #[test]
    fn free_text_rejected() {
        let err = coerce("not-a-number").unwrap_err();
        assert_eq!(err.value, "not-a-number");
        assert!(coerce("7.2.4").is_err());
        assert!(coerce("").is_err());
    }
}
