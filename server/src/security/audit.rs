use std::collections::VecDeque;
use std::sync::Arc;

use shared::types::session::{AuditEntry, TokenPayload};
use tokio::sync::Mutex;

use super::token::fingerprint;

/// Default number of logins kept.
pub const AUDIT_CAPACITY: usize = 64;

/// Bounded record of recently issued sessions.
///
/// Written on login and read by the sessions endpoint. Nothing on the
/// verification path looks at it: a token missing from here is still valid,
/// and a token listed here is still checked on every request.
#[derive(Clone, Debug)]
pub struct SessionAudit {
    inner: Arc<Mutex<VecDeque<AuditEntry>>>,
    capacity: usize,
}

impl Default for SessionAudit {
    fn default() -> Self {
        Self::new(AUDIT_CAPACITY)
    }
}

impl SessionAudit {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Record a freshly issued token. Entries already expired at issue time
    /// are dropped first, then the oldest entries fall off when full.
    pub async fn record(&self, token: &str, payload: &TokenPayload) {
        let entry = AuditEntry {
            fingerprint: fingerprint(token),
            user_id: payload.user_id.clone(),
            issued_at: payload.iat,
            expires_at: payload.exp,
        };

        let mut ring = self.inner.lock().await;
        ring.retain(|e| e.expires_at > payload.iat);
        while ring.len() >= self.capacity {
            ring.pop_front();
        }
        ring.push_back(entry);
    }

    /// Drop expired entries and return the rest, newest first.
    pub async fn snapshot_at(&self, now: i64) -> Vec<AuditEntry> {
        let mut ring = self.inner.lock().await;
        ring.retain(|e| e.expires_at > now);
        ring.iter().rev().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(iat: i64, exp: i64) -> TokenPayload {
        TokenPayload {
            user_id: "admin".into(),
            iat,
            exp,
        }
    }

    #[tokio::test]
    async fn records_fingerprint_not_token() {
        let audit = SessionAudit::default();
        audit.record("h.p.ABCDEFGHIJKLMNOP", &payload(0, 100)).await;
        let snap = audit.snapshot_at(10).await;
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].fingerprint, "ABCDEFGH...");
        assert_eq!(snap[0].user_id, "admin");
    }

    #[tokio::test]
    async fn capacity_is_bounded() {
        let audit = SessionAudit::new(3);
        for i in 0..10 {
            audit
                .record(&format!("h.p.sig{:05}", i), &payload(i, 1_000))
                .await;
        }
        assert_eq!(audit.len().await, 3);
        let snap = audit.snapshot_at(0).await;
        let issued: Vec<i64> = snap.iter().map(|e| e.issued_at).collect();
        assert_eq!(issued, vec![9, 8, 7]);
    }

    #[tokio::test]
    async fn recording_prunes_entries_expired_at_issue_time() {
        let audit = SessionAudit::default();
        audit.record("h.p.aaaaaaaaaa", &payload(0, 50)).await;
        audit.record("h.p.bbbbbbbbbb", &payload(60, 160)).await;
        assert_eq!(audit.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entries_are_pruned() {
        let audit = SessionAudit::default();
        audit.record("h.p.aaaaaaaaaa", &payload(0, 50)).await;
        audit.record("h.p.bbbbbbbbbb", &payload(0, 150)).await;
        let snap = audit.snapshot_at(50).await;
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].expires_at, 150);
        assert_eq!(audit.len().await, 1);
    }
}
