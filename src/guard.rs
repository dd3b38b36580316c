//! Debug-only guard against strategy callbacks re-entering a table.
//!
//! Hash and equality strategies run while a table is probing or halfway
//! through a rehash. A callback that reaches back into the same table would
//! observe that transient state. In debug builds `ProbeGuard::enter` panics
//! on nested entry; in release builds the guard is a zero-sized no-op.

#[cfg(debug_assertions)]
use core::cell::Cell;
#[cfg(not(debug_assertions))]
use core::marker::PhantomData;

/// Per-table nesting tracker. Every public entry point of `ProbeTable`
/// that may call into a strategy holds `self.guard.enter()` for its
/// duration.
#[derive(Debug, Default)]
pub(crate) struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
}

impl ProbeGuard {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
        }
    }

    #[inline]
    pub(crate) fn enter(&self) -> Entered<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "probe table re-entered from a hash or equality callback"
            );
            Entered { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Entered { _owner: PhantomData }
        }
    }
}

// The guard carries no table state, so cloning a table starts a fresh one.
impl Clone for ProbeGuard {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Releases the guard on drop, including during unwinding.
pub(crate) struct Entered<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a ProbeGuard>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::ProbeGuard;

    #[test]
    fn sequential_entries_are_fine() {
        let g = ProbeGuard::new();
        drop(g.enter());
        drop(g.enter());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_entry_panics_in_debug() {
        let g = ProbeGuard::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = g.enter();
            let _inner = g.enter();
        }));
        assert!(res.is_err(), "expected nested entry to panic in debug builds");
        // Unwinding released the outer guard.
        let _again = g.enter();
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_entry_is_noop_in_release() {
        let g = ProbeGuard::new();
        let _outer = g.enter();
        let _inner = g.enter();
    }
}
