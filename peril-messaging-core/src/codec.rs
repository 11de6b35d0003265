// peril-messaging-core/src/codec.rs
use serde::{de::DeserializeOwned, Serialize};

use crate::MessagingError;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_CBOR: &str = "application/cbor";

/// Turns typed values into message payloads and back.
///
/// The content type is stamped on every published message so a consumer can
/// reject payloads produced by a different codec.
pub trait Codec: Send + Sync + 'static {
    fn content_type(&self) -> &'static str;

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, MessagingError>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, MessagingError>;
}

/// Structured text encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_JSON
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, MessagingError> {
        serde_json::to_vec(value).map_err(|e| MessagingError::Serialize(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, MessagingError> {
        serde_json::from_slice(bytes).map_err(|e| MessagingError::Deserialize(e.to_string()))
    }
}

/// Compact binary encoding (CBOR).
#[derive(Clone, Copy, Debug, Default)]
pub struct CborCodec;

impl Codec for CborCodec {
    fn content_type(&self) -> &'static str {
        CONTENT_TYPE_CBOR
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, MessagingError> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| MessagingError::Serialize(e.to_string()))?;
        Ok(buf)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, MessagingError> {
        ciborium::from_reader(bytes).map_err(|e| MessagingError::Deserialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Move {
        #[serde(rename = "Units")]
        units: Vec<u32>,
        #[serde(rename = "ToLocation")]
        to_location: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Outcome {
        Safe,
        War { attacker: String, defender: String },
    }

    fn sample_move() -> Move {
        Move {
            units: vec![1, 2],
            to_location: "north".into(),
        }
    }

    fn assert_round_trip<C: Codec>(codec: C) {
        let mv = sample_move();
        let decoded: Move = codec.decode(&codec.encode(&mv).unwrap()).unwrap();
        assert_eq!(decoded, mv);

        let outcome = Outcome::War {
            attacker: "alice".into(),
            defender: "bob".into(),
        };
        let decoded: Outcome = codec.decode(&codec.encode(&outcome).unwrap()).unwrap();
        assert_eq!(decoded, outcome);

        let flag: bool = codec.decode(&codec.encode(&true).unwrap()).unwrap();
        assert!(flag);
    }

    #[test]
    fn json_round_trips() {
        assert_round_trip(JsonCodec);
    }

    #[test]
    fn cbor_round_trips() {
        assert_round_trip(CborCodec);
    }

    #[test]
    fn json_uses_wire_field_names() {
        let bytes = JsonCodec.encode(&sample_move()).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"Units":[1,2],"ToLocation":"north"}"#
        );
    }

    #[test]
    fn cbor_is_smaller_than_json() {
        let mv = sample_move();
        let json = JsonCodec.encode(&mv).unwrap();
        let cbor = CborCodec.encode(&mv).unwrap();
        assert!(cbor.len() < json.len());
    }

    #[test]
    fn decode_garbage_is_deserialize_error() {
        let err = JsonCodec.decode::<Move>(b"not json").unwrap_err();
        assert!(matches!(err, MessagingError::Deserialize(_)));

        let err = CborCodec.decode::<Move>(&[0xff, 0x00]).unwrap_err();
        assert!(matches!(err, MessagingError::Deserialize(_)));
    }

    #[test]
    fn content_types_differ() {
        assert_ne!(JsonCodec.content_type(), CborCodec.content_type());
    }
}
