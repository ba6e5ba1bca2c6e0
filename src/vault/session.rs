//! Explicit session state for an open vault.
//!
//! Soft-delete, restore and permanent-delete requests take no secret; they
//! ride on the authorization recorded here by the last successful unlock.

use chrono::{DateTime, Duration, Utc};

use crate::storage::LOCAL_SCOPE;

#[derive(Debug, Clone)]
pub struct VaultSession {
    user_id: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    last_activity: Option<DateTime<Utc>>,
    auto_lock_minutes: u32,
}

impl VaultSession {
    pub fn new(user_id: Option<String>, auto_lock_minutes: u32) -> Self {
        Self {
            user_id,
            verified_at: None,
            last_activity: None,
            auto_lock_minutes,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Backend scope: the user id, or `LOCAL_SCOPE` when signed out.
    pub fn scope(&self) -> &str {
        self.user_id.as_deref().unwrap_or(LOCAL_SCOPE)
    }

    pub fn is_local_only(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verified_at
    }

    pub fn set_auto_lock_minutes(&mut self, minutes: u32) {
        self.auto_lock_minutes = minutes;
    }

    /// Record a successful secret verification.
    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.verified_at = Some(now);
        self.last_activity = Some(now);
    }

    /// Extend the auto-lock window.  Has no effect on a locked session.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if self.verified_at.is_some() {
            self.last_activity = Some(now);
        }
    }

    /// Whether the session is verified and has not been idle longer than
    /// the auto-lock window.  A window of 0 minutes never expires.
    pub fn is_unlocked(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_activity.or(self.verified_at) else {
            return false;
        };
        if self.auto_lock_minutes == 0 {
            return true;
        }
        now - last <= Duration::minutes(i64::from(self.auto_lock_minutes))
    }

    pub fn lock(&mut self) {
        self.verified_at = None;
        self.last_activity = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_locked() {
        let s = VaultSession::new(None, 5);
        assert!(!s.is_unlocked(Utc::now()));
        assert_eq!(s.scope(), "local");
        assert!(s.is_local_only());
    }

    #[test]
    fn scope_uses_user_id() {
        let s = VaultSession::new(Some("alice".into()), 5);
        assert_eq!(s.scope(), "alice");
        assert!(!s.is_local_only());
    }

    #[test]
    fn expires_after_idle_window() {
        let mut s = VaultSession::new(None, 5);
        let t0 = Utc::now();
        s.mark_verified(t0);
        assert!(s.is_unlocked(t0 + Duration::minutes(4)));
        assert!(!s.is_unlocked(t0 + Duration::minutes(6)));
    }

    #[test]
    fn touch_extends_window() {
        let mut s = VaultSession::new(None, 5);
        let t0 = Utc::now();
        s.mark_verified(t0);
        s.touch(t0 + Duration::minutes(4));
        assert!(s.is_unlocked(t0 + Duration::minutes(8)));
    }

    #[test]
    fn touch_does_not_unlock() {
        let mut s = VaultSession::new(None, 5);
        s.touch(Utc::now());
        assert!(!s.is_unlocked(Utc::now()));
    }

    #[test]
    fn zero_minutes_disables_auto_lock() {
        let mut s = VaultSession::new(None, 0);
        let t0 = Utc::now();
        s.mark_verified(t0);
        assert!(s.is_unlocked(t0 + Duration::days(30)));
    }

    #[test]
    fn lock_clears_authorization() {
        let mut s = VaultSession::new(None, 5);
        s.mark_verified(Utc::now());
        s.lock();
        assert!(!s.is_unlocked(Utc::now()));
        assert!(s.verified_at().is_none());
    }
}
