use std::fmt;

use sha2::{Digest, Sha256};

/// The shared admin password, held in memory for login checks.
#[derive(Clone)]
pub struct AdminCredential {
    digest: [u8; 32],
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminCredential(<redacted>)")
    }
}

impl AdminCredential {
    pub fn new(password: &str) -> Self {
        Self {
            digest: digest(password),
        }
    }

    /// Compare a submitted password in constant time.
    ///
    /// Both sides are hashed first so the comparison runs over equal-length
    /// inputs regardless of what was submitted.
    pub fn matches(&self, supplied: &str) -> bool {
        constant_time_eq(&self.digest, &digest(supplied))
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Byte-wise equality that does not short-circuit on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
