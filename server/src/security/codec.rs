//! URL-safe segment codec for session tokens.
//!
//! A segment is a JSON document encoded as unpadded base64url (`-` and `_`
//! instead of `+` and `/`, no `=`), so it can sit in a cookie or a URL
//! without escaping.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("segment JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw bytes to an unpadded base64url string.
pub fn encode_bytes(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Unpadded base64url string back to raw bytes.
pub fn decode_bytes(segment: &str) -> Result<Vec<u8>, CodecError> {
    Ok(URL_SAFE_NO_PAD.decode(segment.as_bytes())?)
}

/// Serialize `value` to JSON and encode it as a segment.
///
/// Deterministic: equal values (with deterministic `Serialize` impls) give
/// equal segments.
pub fn encode_segment<T: Serialize>(value: &T) -> Result<String, CodecError> {
    let json = serde_json::to_vec(value)?;
    Ok(encode_bytes(&json))
}

/// Decode a segment and parse the JSON inside it.
///
/// Callers treat any error here as "invalid token", never as a fault.
pub fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, CodecError> {
    let bytes = decode_bytes(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use shared::types::session::{TokenHeader, TokenPayload};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: i64,
        tags: Vec<String>,
        flag: Option<bool>,
    }

    #[test]
    fn header_roundtrips() {
        let h = TokenHeader::for_key("k1");
        let seg = encode_segment(&h).unwrap();
        let back: TokenHeader = decode_segment(&seg).unwrap();
        assert_eq!(back, h);
    }

    #[test]
    fn payload_roundtrips_with_wire_field_names() {
        let p = TokenPayload {
            user_id: "admin".into(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        };
        let seg = encode_segment(&p).unwrap();
        let raw = String::from_utf8(decode_bytes(&seg).unwrap()).unwrap();
        assert!(raw.contains("\"userId\":\"admin\""));
        let back: TokenPayload = decode_segment(&seg).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn encoding_is_deterministic() {
        let p = TokenPayload {
            user_id: "admin".into(),
            iat: 1,
            exp: 2,
        };
        assert_eq!(encode_segment(&p).unwrap(), encode_segment(&p).unwrap());
    }

    #[test]
    fn bytes_that_need_plus_and_slash_use_url_alphabet() {
        // 0xfb 0xff encodes to "+/8" in the standard alphabet.
        let seg = encode_bytes(&[0xfb, 0xff]);
        assert_eq!(seg, "-_8");
        assert_eq!(decode_bytes(&seg).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(decode_segment::<TokenPayload>("not base64 at all!").is_err());
        assert!(decode_segment::<TokenPayload>("").is_err());
    }

    #[test]
    fn valid_base64_of_wrong_shape_is_a_decode_error() {
        let seg = encode_segment(&serde_json::json!({"unrelated": true})).unwrap();
        assert!(matches!(
            decode_segment::<TokenPayload>(&seg),
            Err(CodecError::Json(_))
        ));
    }

    fn sample_strategy() -> impl Strategy<Value = Sample> {
        (
            ".*",
            any::<i64>(),
            prop::collection::vec(".*", 0..4),
            any::<Option<bool>>(),
        )
            .prop_map(|(name, count, tags, flag)| Sample {
                name,
                count,
                tags,
                flag,
            })
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(sample in sample_strategy()) {
            let seg = encode_segment(&sample).unwrap();
            prop_assert!(!seg.contains('+'));
            prop_assert!(!seg.contains('/'));
            prop_assert!(!seg.contains('='));
            let back: Sample = decode_segment(&seg).unwrap();
            prop_assert_eq!(back, sample);
        }
    }
}
