//! Single-session admission control
//!
//! The gateway serves exactly one remote client at a time. The guard is the
//! only core-owned mutable shared state: one flag, mutated by an atomic
//! check-and-set so two racing connection attempts can never both observe
//! "inactive".

use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether a client session is currently attached
#[derive(Debug, Default)]
pub struct SessionGuard {
    active: AtomicBool,
}

impl SessionGuard {
    /// Create a new guard with no session attached
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
        }
    }

    /// Attempt to attach a session.
    ///
    /// Returns `true` and marks the session active iff no session was
    /// active. The check and the set are a single atomic operation; the
    /// losing side of a race must refuse its connection without touching
    /// any other state.
    pub fn try_attach(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Mark the session inactive. Idempotent.
    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Whether a session is currently attached
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_attach_release_cycle() {
        let guard = SessionGuard::new();
        assert!(!guard.is_active());

        assert!(guard.try_attach());
        assert!(guard.is_active());

        guard.release();
        assert!(!guard.is_active());
        assert!(guard.try_attach());
    }

    #[test]
    fn test_second_attach_rejected() {
        let guard = SessionGuard::new();
        assert!(guard.try_attach());
        assert!(!guard.try_attach());
        assert!(guard.is_active());
    }

    #[test]
    fn test_release_is_idempotent() {
        let guard = SessionGuard::new();
        guard.release();
        guard.release();
        assert!(!guard.is_active());
        assert!(guard.try_attach());
    }

    #[test]
    fn test_concurrent_attach_admits_exactly_one() {
        let guard = Arc::new(SessionGuard::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let guard = guard.clone();
            handles.push(std::thread::spawn(move || guard.try_attach()));
        }

        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&admitted| admitted)
            .count();
        assert_eq!(admitted, 1);
        assert!(guard.is_active());
    }
}
