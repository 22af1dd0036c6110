//! Invocation recorder
//!
//! [`Recorded`] wraps a [`Callable`] so that a top-level call is echoed,
//! judged by the user and, unless cancelled, appended to the session.
//! A call made while another wrapped call is running on the same thread is
//! nested: it goes straight to the target with no prompt and no I/O. This
//! keeps recursive functions from prompting once per step.
//!
//! Whatever happens during recording, the wrapper returns exactly what the
//! target returned.

use std::cell::Cell;
use std::fmt;

use crate::callable::{Arguments, CallResult, Callable, CallableRef};
use crate::session::Session;

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Marks a wrapped call in progress on this thread until dropped
struct DepthGuard {
    outer_depth: usize,
}

impl DepthGuard {
    fn enter() -> Self {
        let outer_depth = CALL_DEPTH.with(|depth| {
            let outer = depth.get();
            depth.set(outer + 1);
            outer
        });
        Self { outer_depth }
    }

    fn is_nested(&self) -> bool {
        self.outer_depth > 0
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(self.outer_depth));
    }
}

/// Whether a wrapped call is currently running on this thread
pub fn in_wrapped_call() -> bool {
    CALL_DEPTH.with(|depth| depth.get() > 0)
}

/// A callable wrapped for recording into a session
#[derive(Clone)]
pub struct Recorded {
    callable: Callable,
    session: Session,
}

impl Recorded {
    pub(crate) fn new(callable: Callable, session: Session) -> Self {
        Self { callable, session }
    }

    /// Call the target, recording the call when it is top-level
    pub fn call(&self, args: &Arguments) -> CallResult {
        let guard = DepthGuard::enter();
        if guard.is_nested() || !self.session.is_recording() {
            return self.callable.invoke(args);
        }

        let result = self.callable.invoke(args);
        drop(guard);

        self.session.capture(self.callable.reference(), args, &result);
        result
    }

    /// Reference of the wrapped definition
    pub fn reference(&self) -> &CallableRef {
        self.callable.reference()
    }

    /// The wrapped callable, for calling without recording
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Session the wrapper records into
    pub fn session(&self) -> &Session {
        &self.session
    }
}

impl fmt::Debug for Recorded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recorded")
            .field("callable", self.callable.reference())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_guard_restores_depth() {
        assert!(!in_wrapped_call());
        {
            let outer = DepthGuard::enter();
            assert!(!outer.is_nested());
            let inner = DepthGuard::enter();
            assert!(inner.is_nested());
            assert!(in_wrapped_call());
        }
        assert!(!in_wrapped_call());
    }

    #[test]
    fn test_guard_survives_panicking_target() {
        let session = Session::detached();
        let wrapped = session.wrap(Callable::new("__main__", "boom", |_| -> CallResult {
            panic!("boom")
        }));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            wrapped.call(&Arguments::new())
        }));
        assert!(outcome.is_err());
        assert!(!in_wrapped_call());
        assert!(session.is_empty());

        let ok = session.wrap(Callable::new("__main__", "ok", |_| Ok(Value::None)));
        assert_eq!(ok.callable().invoke(&Arguments::new()).unwrap(), Value::None);
    }
}
