use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("key ring is empty")]
    EmptyKeyRing,
}

/// HMAC-SHA256 tag of `message` under `secret`.
pub fn sign(message: &[u8], secret: &[u8]) -> Result<Vec<u8>, SignerError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// A named HMAC key, keyed once at startup.
///
/// The keyed MAC state is cloned per operation, so signing and verifying
/// cannot fail at request time.
#[derive(Clone)]
pub struct SigningKey {
    id: String,
    mac: HmacSha256,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SigningKey {
    pub fn new(id: &str, secret: &[u8]) -> Result<Self, SignerError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        Ok(Self {
            id: id.to_string(),
            mac,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.finalize().into_bytes().to_vec()
    }

    /// Constant-time check of `tag` against the tag for `message`.
    pub fn verify(&self, message: &[u8], tag: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        mac.update(message);
        mac.verify_slice(tag).is_ok()
    }
}

/// Ordered signing keys. The last key signs; every key verifies.
#[derive(Debug, Clone)]
pub struct KeyRing {
    keys: Vec<SigningKey>,
}

impl KeyRing {
    pub fn new(keys: Vec<SigningKey>) -> Result<Self, SignerError> {
        if keys.is_empty() {
            return Err(SignerError::EmptyKeyRing);
        }
        Ok(Self { keys })
    }

    /// Build from `(id, secret)` pairs in signing order.
    pub fn from_secrets<'a, I>(pairs: I) -> Result<Self, SignerError>
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let keys = pairs
            .into_iter()
            .map(|(id, secret)| SigningKey::new(id, secret))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(keys)
    }

    /// The key new tokens are signed with.
    pub fn signing_key(&self) -> &SigningKey {
        // `new` guarantees at least one key.
        &self.keys[self.keys.len() - 1]
    }

    /// Key for verification. A token without a key id predates rotation and
    /// is checked against the signing key.
    pub fn find(&self, kid: Option<&str>) -> Option<&SigningKey> {
        match kid {
            Some(id) => self.keys.iter().find(|k| k.id == id),
            None => Some(self.signing_key()),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn sign_is_deterministic() {
        assert_eq!(sign(b"msg", SECRET).unwrap(), sign(b"msg", SECRET).unwrap());
    }

    #[test]
    fn tag_is_32_bytes() {
        assert_eq!(sign(b"msg", SECRET).unwrap().len(), 32);
    }

    #[test]
    fn different_message_or_secret_changes_tag() {
        let base = sign(b"msg", SECRET).unwrap();
        assert_ne!(base, sign(b"msh", SECRET).unwrap());
        assert_ne!(base, sign(b"msg", b"another-secret-another-secret-xx").unwrap());
    }

    #[test]
    fn matches_rfc4231_test_case_2() {
        let tag = sign(b"what do ya want for nothing?", b"Jefe").unwrap();
        let hex: String = tag.iter().map(|b| format!("{:02x}", b)).collect();
        assert_eq!(
            hex,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn signing_key_agrees_with_free_function() {
        let key = SigningKey::new("k", SECRET).unwrap();
        assert_eq!(key.sign(b"abc"), sign(b"abc", SECRET).unwrap());
        assert!(key.verify(b"abc", &key.sign(b"abc")));
        assert!(!key.verify(b"abd", &key.sign(b"abc")));
        assert!(!key.verify(b"abc", &[0u8; 31]));
    }

    #[test]
    fn debug_redacts_secret() {
        let key = SigningKey::new("k", SECRET).unwrap();
        let out = format!("{:?}", key);
        assert!(out.contains("redacted"));
        assert!(!out.contains("0123456789abcdef"));
    }

    #[test]
    fn empty_ring_is_rejected() {
        assert!(matches!(KeyRing::new(vec![]), Err(SignerError::EmptyKeyRing)));
    }

    #[test]
    fn last_key_signs_and_all_keys_verify() {
        let ring = KeyRing::from_secrets([
            ("old", SECRET),
            ("new", b"fedcba9876543210fedcba9876543210".as_slice()),
        ])
        .unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.signing_key().id(), "new");
        assert_eq!(ring.find(Some("old")).map(SigningKey::id), Some("old"));
        assert_eq!(ring.find(None).map(SigningKey::id), Some("new"));
        assert!(ring.find(Some("retired")).is_none());
    }
}
