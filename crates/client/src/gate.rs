//! Mutual exclusion for lifecycle operations.
//!
//! At most one of create/process/delete may be in flight. A second caller is
//! turned away rather than queued, so a duplicate trigger never repeats a
//! network call. Release is tied to the guard's lifetime, which covers every
//! exit path including early validation returns.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct RequestGate {
    entered: AtomicBool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the gate. Returns `None` without side effects if it is already held.
    pub fn try_enter(&self) -> Option<GateGuard<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard { gate: self })
    }

    /// Whether an operation currently holds the gate.
    pub fn is_held(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Held for the duration of one lifecycle operation; leaves the gate on drop.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    gate: &'a RequestGate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.gate.entered.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_enter_is_refused_while_held() {
        let gate = RequestGate::new();
        let guard = gate.try_enter().expect("first enter succeeds");
        assert!(gate.is_held());
        assert!(gate.try_enter().is_none());
        drop(guard);

        assert!(!gate.is_held());
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn early_return_releases_gate() {
        fn validate(gate: &RequestGate, ok: bool) -> Result<(), &'static str> {
            let _guard = gate.try_enter().ok_or("busy")?;
            if !ok {
                return Err("rejected");
            }
            Ok(())
        }

        let gate = RequestGate::new();
        assert_eq!(validate(&gate, false), Err("rejected"));
        assert!(!gate.is_held());
        assert_eq!(validate(&gate, true), Ok(()));
        assert!(!gate.is_held());
    }

    #[test]
    fn panic_inside_operation_releases_gate() {
        let gate = RequestGate::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = gate.try_enter().unwrap();
            panic!("operation blew up");
        }));
        assert!(result.is_err());
        assert!(!gate.is_held());
    }

    #[tokio::test]
    async fn dropped_future_releases_gate() {
        let gate = RequestGate::new();
        let pending = async {
            let _guard = gate.try_enter().unwrap();
            std::future::pending::<()>().await;
        };
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(20), pending).await;
        assert!(timed_out.is_err());
        assert!(!gate.is_held());
    }
}
