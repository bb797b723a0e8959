//! Millisecond durations.
//!
//! Some exporters write durations as JSON floats (`3600000.0`). Integral,
//! non-negative floats are accepted; anything else is a decode error.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawMillis {
    Integer(u64),
    Float(f64),
}

pub(crate) fn deserialize_option<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    match Option::<RawMillis>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawMillis::Integer(millis)) => Ok(Some(millis)),
        Some(RawMillis::Float(millis)) => float_millis(millis).map(Some).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid duration {millis}: expected whole non-negative milliseconds"
            ))
        }),
    }
}

fn float_millis(millis: f64) -> Option<u64> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = millis as u64;
    (millis.is_finite() && millis >= 0.0 && millis.fract() == 0.0 && millis < 2f64.powi(64))
        .then_some(whole)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_are_accepted() {
        assert_eq!(float_millis(3_600_000.0), Some(3_600_000));
        assert_eq!(float_millis(0.0), Some(0));
    }

    #[test]
    fn fractional_negative_and_huge_floats_are_rejected() {
        assert_eq!(float_millis(1.5), None);
        assert_eq!(float_millis(-1.0), None);
        assert_eq!(float_millis(f64::MAX), None);
    }
}
