//! Wire codec for parameter updates
//!
//! An update travels as a textual single-key JSON object, e.g.
//! `{"Signal 2": 47}`. [`decode`] only checks the container shape and that
//! the value is an integer; [`decode_update`] additionally maps the pair
//! into the closed parameter domain.

use crate::error::{RelayError, Result};
use crate::types::{ParameterName, ParameterValue, Update};
use serde_json::Value;
use std::fmt;

/// Encoded form of an [`Update`] as it sits in the channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedMessage(String);

impl EncodedMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for EncodedMessage {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for EncodedMessage {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for EncodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a pair into its single-key wire form
pub fn encode(name: ParameterName, value: ParameterValue) -> EncodedMessage {
    // `Value`'s Display quotes and escapes the key; `": "` separates the pair
    let key = Value::from(name.as_str());
    EncodedMessage(format!("{{{}: {}}}", key, value.get()))
}

/// Encode an update
pub fn encode_update(update: &Update) -> EncodedMessage {
    encode(update.name, update.value)
}

/// Decode a message into its raw `(name, value)` pair
///
/// The name is not checked against [`ParameterName`]; callers validate it.
pub fn decode(msg: &EncodedMessage) -> Result<(String, i64)> {
    let parsed: Value = serde_json::from_str(msg.as_str())
        .map_err(|e| RelayError::MalformedMessage(format!("invalid JSON: {}", e)))?;

    let Value::Object(map) = parsed else {
        return Err(RelayError::MalformedMessage(
            "expected a single-key object".to_string(),
        ));
    };

    let key_count = map.len();
    let mut entries = map.into_iter();
    let (name, value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(RelayError::MalformedMessage(format!(
                "expected exactly one key, found {}",
                key_count
            )))
        }
    };

    let value = as_integer(&value).ok_or_else(|| {
        RelayError::MalformedMessage(format!("value for {:?} is not an integer: {}", name, value))
    })?;

    Ok((name, value))
}

/// Integer value of a JSON number, accepting whole floats such as `47.0`
fn as_integer(value: &Value) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }
    let f = value.as_f64()?;
    // i64::MAX as f64 rounds up to 2^63, which no i64 can hold
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Decode a message and validate it against the parameter domain
pub fn decode_update(msg: &EncodedMessage) -> Result<Update> {
    let (name, value) = decode(msg)?;
    let name: ParameterName = name.parse()?;
    let value = ParameterValue::new(value)?;
    Ok(Update::new(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(v: i64) -> ParameterValue {
        ParameterValue::new(v).unwrap()
    }

    #[test]
    fn test_encode_wire_shape() {
        let msg = encode(ParameterName::Signal2, value(47));
        assert_eq!(msg.as_str(), r#"{"Signal 2": 47}"#);

        let parsed: Value = serde_json::from_str(msg.as_str()).unwrap();
        let map = parsed.as_object().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["Signal 2"], 47);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let a = encode(ParameterName::Signal1, value(3));
        let b = encode(ParameterName::Signal1, value(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_accepts_whitespace() {
        let msg = EncodedMessage::from(r#"{ "Signal 2" : 47 }"#);
        assert_eq!(decode(&msg).unwrap(), ("Signal 2".to_string(), 47));
    }

    #[test]
    fn test_decode_accepts_whole_floats() {
        let msg = EncodedMessage::from(r#"{"Signal 1": 47.0}"#);
        assert_eq!(decode(&msg).unwrap(), ("Signal 1".to_string(), 47));

        let update = decode_update(&EncodedMessage::from(r#"{"Signal 3": 0.0}"#)).unwrap();
        assert_eq!(update, Update::new(ParameterName::Signal3, value(0)));

        // Whole, but outside the parameter domain
        assert!(matches!(
            decode_update(&EncodedMessage::from(r#"{"Signal 1": 100.0}"#)),
            Err(RelayError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_decode_is_not_domain_aware() {
        let msg = EncodedMessage::from(r#"{"Pressure": 512}"#);
        assert_eq!(decode(&msg).unwrap(), ("Pressure".to_string(), 512));
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        let cases = [
            "",
            "not json",
            "47",
            r#"["Signal 1", 2]"#,
            "{}",
            r#"{"Signal 1": 1, "Signal 2": 2}"#,
            r#"{"Signal 1": 4.5}"#,
            r#"{"Signal 1": 1e300}"#,
            r#"{"Signal 1": "47"}"#,
            r#"{"Signal 1": null}"#,
            r#"{"Signal 1": {"x": 1}}"#,
            r#"{"Signal 1": 18446744073709551615}"#,
        ];
        for case in cases {
            let result = decode(&EncodedMessage::from(case));
            assert!(
                matches!(result, Err(RelayError::MalformedMessage(_))),
                "expected malformed for {:?}, got {:?}",
                case,
                result
            );
        }
    }

    #[test]
    fn test_decode_update_unknown_name() {
        let msg = EncodedMessage::from(r#"{"Signal 4": 10}"#);
        assert!(matches!(
            decode_update(&msg),
            Err(RelayError::UnknownParameter(name)) if name == "Signal 4"
        ));
    }

    #[test]
    fn test_decode_update_value_out_of_range() {
        for case in [r#"{"Signal 1": 100}"#, r#"{"Signal 1": -3}"#] {
            assert!(matches!(
                decode_update(&EncodedMessage::from(case)),
                Err(RelayError::MalformedMessage(_))
            ));
        }
    }

    #[test]
    fn test_decode_update_round_trip() {
        let update = Update::new(ParameterName::Signal3, value(56));
        assert_eq!(decode_update(&encode_update(&update)).unwrap(), update);
    }
}
