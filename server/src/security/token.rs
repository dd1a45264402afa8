//! Session token service.
//!
//! Tokens are `header.payload.signature`, each segment unpadded base64url.
//! The signature is HMAC-SHA256 over `header.payload` as transmitted. A token
//! is valid only while its signature checks out under the key named by the
//! header and the current time is strictly before `exp`.

use std::fmt;

use chrono::Utc;
use shared::types::server_config::SigningKeyConfig;
use shared::types::session::{Principal, TokenHeader, TokenPayload, TOKEN_ALG};
use thiserror::Error;

use super::codec::{self, CodecError};
use super::signer::{KeyRing, SignerError};

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encoding(#[from] CodecError),

    #[error("signing key setup failed: {0}")]
    Keys(#[from] SignerError),

    #[error("session lifetime of {0} hours is out of range")]
    Lifetime(u64),
}

/// Why a token was refused. Only ever logged; every variant maps to the same
/// unauthorized response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Missing,
    Malformed,
    UnknownKey,
    Tampered,
    Expired,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::Missing => "missing",
            Rejection::Malformed => "malformed",
            Rejection::UnknownKey => "unknown key",
            Rejection::Tampered => "bad signature",
            Rejection::Expired => "expired",
        };
        f.write_str(s)
    }
}

pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

#[derive(Debug, Clone)]
pub struct SessionTokenService {
    keys: KeyRing,
}

impl SessionTokenService {
    pub fn new(keys: KeyRing) -> Self {
        Self { keys }
    }

    /// Build from resolved key configs, in signing order.
    pub fn from_config(keys: &[SigningKeyConfig]) -> Result<Self, TokenError> {
        let ring = KeyRing::from_secrets(
            keys.iter()
                .map(|k| (k.id.as_str(), k.secret.as_bytes())),
        )?;
        Ok(Self::new(ring))
    }

    /// Issue a token for `principal` valid for `lifetime_hours` from now.
    pub fn issue(&self, principal: &str, lifetime_hours: u64) -> Result<String, TokenError> {
        self.issue_at(principal, lifetime_hours, unix_now())
    }

    pub fn issue_at(
        &self,
        principal: &str,
        lifetime_hours: u64,
        now: i64,
    ) -> Result<String, TokenError> {
        self.mint_at(principal, lifetime_hours, now)
            .map(|(token, _)| token)
    }

    /// Issue a token and hand back the payload it carries, for callers that
    /// record the session.
    pub fn mint(
        &self,
        principal: &str,
        lifetime_hours: u64,
    ) -> Result<(String, TokenPayload), TokenError> {
        self.mint_at(principal, lifetime_hours, unix_now())
    }

    pub fn mint_at(
        &self,
        principal: &str,
        lifetime_hours: u64,
        now: i64,
    ) -> Result<(String, TokenPayload), TokenError> {
        let key = self.keys.signing_key();
        let exp = lifetime_hours
            .checked_mul(3600)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| now.checked_add(secs))
            .ok_or(TokenError::Lifetime(lifetime_hours))?;

        let header = TokenHeader::for_key(key.id());
        let payload = TokenPayload {
            user_id: principal.to_string(),
            iat: now,
            exp,
        };
        // An expiry with no calendar date could be verified but never shown.
        if payload.expires_at().is_none() {
            return Err(TokenError::Lifetime(lifetime_hours));
        }

        let signing_input = format!(
            "{}.{}",
            codec::encode_segment(&header)?,
            codec::encode_segment(&payload)?
        );
        let signature = codec::encode_bytes(&key.sign(signing_input.as_bytes()));

        Ok((format!("{}.{}", signing_input, signature), payload))
    }

    /// Full check of `token` at `now`, reporting why it failed.
    ///
    /// The signature is checked before the payload is trusted, so a forged
    /// payload never reaches the expiry comparison.
    pub fn inspect_at(&self, token: &str, now: i64) -> Result<TokenPayload, Rejection> {
        if token.is_empty() {
            return Err(Rejection::Missing);
        }

        let mut parts = token.split('.');
        let (header_seg, payload_seg, sig_seg) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(Rejection::Malformed),
            };

        let header: TokenHeader =
            codec::decode_segment(header_seg).map_err(|_| Rejection::Malformed)?;
        if header.alg != TOKEN_ALG {
            return Err(Rejection::Malformed);
        }

        let key = self
            .keys
            .find(header.kid.as_deref())
            .ok_or(Rejection::UnknownKey)?;

        let tag = codec::decode_bytes(sig_seg).map_err(|_| Rejection::Malformed)?;
        let signing_input = &token[..header_seg.len() + 1 + payload_seg.len()];
        if !key.verify(signing_input.as_bytes(), &tag) {
            return Err(Rejection::Tampered);
        }

        let payload: TokenPayload =
            codec::decode_segment(payload_seg).map_err(|_| Rejection::Malformed)?;
        if payload.expires_at().is_none() {
            return Err(Rejection::Malformed);
        }
        if now >= payload.exp {
            return Err(Rejection::Expired);
        }

        Ok(payload)
    }

    pub fn inspect(&self, token: &str) -> Result<TokenPayload, Rejection> {
        self.inspect_at(token, unix_now())
    }

    /// Payload of a currently valid token, or `None`.
    pub fn verify(&self, token: &str) -> Option<TokenPayload> {
        self.inspect(token).ok()
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Option<TokenPayload> {
        self.inspect_at(token, now).ok()
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.verify(token).is_some()
    }

    /// Identity and expiry for display. Only valid tokens yield a principal.
    pub fn principal_of(&self, token: &str) -> Option<Principal> {
        let payload = self.verify(token)?;
        Some(Principal {
            expires_at: payload.expires_at()?,
            user_id: payload.user_id,
        })
    }
}

/// Short, log-safe identifier for a token: the first 8 characters of its
/// signature segment.
pub fn fingerprint(token: &str) -> String {
    let sig = token.rsplit('.').next().unwrap_or("");
    let head: String = sig.chars().take(8).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::signer::SigningKey;
    use proptest::prelude::*;
    use shared::types::session::ADMIN_PRINCIPAL;

    const NOW: i64 = 1_700_000_000;
    const SECRET_A: &[u8] = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SECRET_B: &[u8] = b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    fn service(pairs: &[(&str, &[u8])]) -> SessionTokenService {
        SessionTokenService::new(KeyRing::from_secrets(pairs.iter().copied()).unwrap())
    }

    fn single() -> SessionTokenService {
        service(&[("default", SECRET_A)])
    }

    #[test]
    fn issued_token_has_three_url_safe_segments() {
        let token = single().issue_at(ADMIN_PRINCIPAL, 24, NOW).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
    }

    #[test]
    fn header_and_payload_carry_expected_fields() {
        let token = single().issue_at(ADMIN_PRINCIPAL, 24, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let header: TokenHeader = codec::decode_segment(parts[0]).unwrap();
        assert_eq!(header.alg, "HS256");
        assert_eq!(header.typ, "JWT");
        assert_eq!(header.kid.as_deref(), Some("default"));
        let payload: TokenPayload = codec::decode_segment(parts[1]).unwrap();
        assert_eq!(payload.user_id, "admin");
        assert_eq!(payload.iat, NOW);
        assert_eq!(payload.exp, NOW + 24 * 3600);
    }

    #[test]
    fn minted_payload_matches_token() {
        let svc = single();
        let (token, payload) = svc.mint_at(ADMIN_PRINCIPAL, 2, NOW).unwrap();
        assert_eq!(svc.verify_at(&token, NOW), Some(payload.clone()));
        assert_eq!(payload.exp - payload.iat, 7200);
    }

    #[test]
    fn valid_until_strictly_before_expiry() {
        let svc = single();
        let token = svc.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
        assert!(svc.verify_at(&token, NOW).is_some());
        assert!(svc.verify_at(&token, NOW + 3599).is_some());
        assert_eq!(svc.inspect_at(&token, NOW + 3600), Err(Rejection::Expired));
        assert_eq!(svc.inspect_at(&token, NOW + 7200), Err(Rejection::Expired));
    }

    #[test]
    fn zero_lifetime_is_never_valid() {
        let svc = single();
        let token = svc.issue_at(ADMIN_PRINCIPAL, 0, NOW).unwrap();
        assert!(svc.verify_at(&token, NOW).is_none());
    }

    #[test]
    fn fresh_token_is_valid_now() {
        let svc = single();
        let token = svc.issue(ADMIN_PRINCIPAL, 24).unwrap();
        assert!(svc.is_valid(&token));
        let principal = svc.principal_of(&token).unwrap();
        assert_eq!(principal.user_id, "admin");
        assert!(principal.expires_at > Utc::now());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let svc = single();
        assert_eq!(svc.inspect_at("", NOW), Err(Rejection::Missing));
        assert_eq!(svc.inspect_at("abc", NOW), Err(Rejection::Malformed));
        assert_eq!(svc.inspect_at("a.b", NOW), Err(Rejection::Malformed));
        assert_eq!(svc.inspect_at("a.b.c.d", NOW), Err(Rejection::Malformed));
        assert_eq!(svc.inspect_at("!!.??.**", NOW), Err(Rejection::Malformed));
    }

    #[test]
    fn swapped_payload_is_tampered() {
        let svc = single();
        let token = svc.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = TokenPayload {
            user_id: "admin".into(),
            iat: NOW,
            exp: NOW + 10 * 365 * 24 * 3600,
        };
        let forged_seg = codec::encode_segment(&forged).unwrap();
        let forged_token = format!("{}.{}.{}", parts[0], forged_seg, parts[2]);
        assert_eq!(svc.inspect_at(&forged_token, NOW), Err(Rejection::Tampered));
    }

    #[test]
    fn token_from_other_secret_is_tampered() {
        let token = service(&[("default", SECRET_B)])
            .issue_at(ADMIN_PRINCIPAL, 1, NOW)
            .unwrap();
        assert_eq!(single().inspect_at(&token, NOW), Err(Rejection::Tampered));
    }

    #[test]
    fn wrong_algorithm_is_malformed() {
        let svc = single();
        let header = TokenHeader {
            alg: "none".into(),
            typ: "JWT".into(),
            kid: Some("default".into()),
        };
        let payload = TokenPayload {
            user_id: "admin".into(),
            iat: NOW,
            exp: NOW + 60,
        };
        let token = format!(
            "{}.{}.",
            codec::encode_segment(&header).unwrap(),
            codec::encode_segment(&payload).unwrap()
        );
        assert_eq!(svc.inspect_at(&token, NOW), Err(Rejection::Malformed));
    }

    #[test]
    fn rotation_keeps_old_tokens_valid_and_signs_with_newest() {
        let old = service(&[("k1", SECRET_A)]);
        let old_token = old.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();

        let rotated = service(&[("k1", SECRET_A), ("k2", SECRET_B)]);
        assert!(rotated.verify_at(&old_token, NOW).is_some());

        let new_token = rotated.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
        let header: TokenHeader =
            codec::decode_segment(new_token.split('.').next().unwrap()).unwrap();
        assert_eq!(header.kid.as_deref(), Some("k2"));

        let retired = service(&[("k2", SECRET_B)]);
        assert_eq!(
            retired.inspect_at(&old_token, NOW),
            Err(Rejection::UnknownKey)
        );
        assert!(retired.verify_at(&new_token, NOW).is_some());
    }

    #[test]
    fn token_without_kid_checks_against_signing_key() {
        let key = SigningKey::new("default", SECRET_A).unwrap();
        let header = TokenHeader {
            alg: "HS256".into(),
            typ: "JWT".into(),
            kid: None,
        };
        let payload = TokenPayload {
            user_id: "admin".into(),
            iat: NOW,
            exp: NOW + 60,
        };
        let input = format!(
            "{}.{}",
            codec::encode_segment(&header).unwrap(),
            codec::encode_segment(&payload).unwrap()
        );
        let token = format!("{}.{}", input, codec::encode_bytes(&key.sign(input.as_bytes())));
        assert!(single().verify_at(&token, NOW).is_some());
    }

    #[test]
    fn from_config_uses_resolved_keys() {
        let keys = vec![SigningKeyConfig {
            id: "default".into(),
            secret: String::from_utf8(SECRET_A.to_vec()).unwrap(),
        }];
        let svc = SessionTokenService::from_config(&keys).unwrap();
        let token = svc.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
        assert!(single().verify_at(&token, NOW).is_some());
        assert!(SessionTokenService::from_config(&[]).is_err());
    }

    #[test]
    fn lifetime_beyond_the_calendar_is_refused() {
        let svc = single();
        assert!(matches!(
            svc.issue_at(ADMIN_PRINCIPAL, 5_000_000_000, NOW),
            Err(TokenError::Lifetime(5_000_000_000))
        ));
        assert!(matches!(
            svc.issue_at(ADMIN_PRINCIPAL, u64::MAX, NOW),
            Err(TokenError::Lifetime(_))
        ));
    }

    #[test]
    fn signed_expiry_beyond_the_calendar_is_malformed() {
        let key = SigningKey::new("default", SECRET_A).unwrap();
        let header = TokenHeader::for_key("default");
        let payload = TokenPayload {
            user_id: "admin".into(),
            iat: NOW,
            exp: i64::MAX,
        };
        let input = format!(
            "{}.{}",
            codec::encode_segment(&header).unwrap(),
            codec::encode_segment(&payload).unwrap()
        );
        let token = format!("{}.{}", input, codec::encode_bytes(&key.sign(input.as_bytes())));

        let svc = single();
        assert_eq!(svc.inspect_at(&token, NOW), Err(Rejection::Malformed));
        assert!(!svc.is_valid(&token));
        assert!(svc.principal_of(&token).is_none());
    }

    #[test]
    fn valid_tokens_always_have_a_principal() {
        let svc = single();
        let token = svc.issue(ADMIN_PRINCIPAL, 24 * 365).unwrap();
        assert!(svc.is_valid(&token));
        assert_eq!(svc.principal_of(&token).unwrap().user_id, ADMIN_PRINCIPAL);
    }

    #[test]
    fn fingerprint_is_short_prefix_of_signature() {
        let token = single().issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
        let sig = token.rsplit('.').next().unwrap();
        let fp = fingerprint(&token);
        assert_eq!(fp, format!("{}...", &sig[..8]));
    }

    proptest! {
        #[test]
        fn any_flipped_signature_byte_is_rejected(idx in 0usize..32, bit in 0u8..8) {
            let svc = single();
            let token = svc.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
            let (input, sig) = token.rsplit_once('.').unwrap();
            let mut tag = codec::decode_bytes(sig).unwrap();
            tag[idx] ^= 1 << bit;
            let forged = format!("{}.{}", input, codec::encode_bytes(&tag));
            prop_assert_eq!(svc.inspect_at(&forged, NOW), Err(Rejection::Tampered));
        }

        #[test]
        fn any_replaced_signature_character_is_rejected(idx in 0usize..43, pick in 0usize..64) {
            const ALPHABET: &[u8] =
                b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
            let svc = single();
            let token = svc.issue_at(ADMIN_PRINCIPAL, 1, NOW).unwrap();
            let (input, sig) = token.rsplit_once('.').unwrap();
            prop_assert_eq!(sig.len(), 43);

            let mut chars = sig.as_bytes().to_vec();
            prop_assume!(chars[idx] != ALPHABET[pick]);
            chars[idx] = ALPHABET[pick];
            let forged = format!("{}.{}", input, String::from_utf8(chars).unwrap());

            // The last character holds two unused bits, so some swaps fail
            // to decode instead of failing the MAC.
            let rejection = svc.inspect_at(&forged, NOW).unwrap_err();
            prop_assert!(
                rejection == Rejection::Tampered || rejection == Rejection::Malformed,
                "unexpected rejection {:?}",
                rejection
            );
        }

        #[test]
        fn lifetime_sets_expiry(hours in 1u64..10_000) {
            let svc = single();
            let token = svc.issue_at(ADMIN_PRINCIPAL, hours, NOW).unwrap();
            let payload = svc.verify_at(&token, NOW).unwrap();
            prop_assert_eq!(payload.exp - payload.iat, hours as i64 * 3600);
        }
    }
}
