//! SharedOnce - lazy one-time construction of a shared value
//!
//! A `SharedOnce<T>` holds a value that is built on first access and then
//! shared by reference forever. Concurrent first callers are strictly
//! ordered: exactly one runs the constructor, the rest block until the
//! value is published and then take the fast, lock-free read path.
//!
//! The naive check-then-create sequence is a data race that can construct
//! two values or expose a half-built one; the cell closes that race with a
//! double-checked publish. The construction counter exists so callers can
//! observe that the race stayed closed.

use std::sync::atomic::{AtomicU32, Ordering};

use once_cell::sync::OnceCell;

/// A lazily constructed, process-lifetime shared value.
///
/// The holder is `const`-constructible so it can live in a `static`. The
/// default constructor is fixed at declaration time; [`get_or_init_with`]
/// lets the first caller substitute its own.
///
/// [`get_or_init_with`]: SharedOnce::get_or_init_with
pub struct SharedOnce<T> {
    cell: OnceCell<T>,
    init: fn() -> T,
    constructions: AtomicU32,
}

impl<T> SharedOnce<T> {
    /// Create an empty holder with a default constructor
    pub const fn new(init: fn() -> T) -> Self {
        Self {
            cell: OnceCell::new(),
            init,
            constructions: AtomicU32::new(0),
        }
    }

    /// Get the shared value, constructing it on first access.
    ///
    /// Every caller, racing or not, observes the identical fully
    /// constructed value.
    #[inline]
    pub fn get(&self) -> &T {
        self.get_or_init_with(self.init)
    }

    /// Get the shared value, running `f` instead of the default
    /// constructor if this access is the one that constructs.
    ///
    /// Exactly one of the racing constructors runs; losers' closures are
    /// dropped unused.
    pub fn get_or_init_with<F>(&self, f: F) -> &T
    where
        F: FnOnce() -> T,
    {
        self.cell.get_or_init(|| {
            self.constructions.fetch_add(1, Ordering::AcqRel);
            f()
        })
    }

    /// Peek at the value without constructing it
    #[inline]
    pub fn try_get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether the value has been constructed yet
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// How many times a constructor actually ran.
    ///
    /// After any successful [`get`](SharedOnce::get) this is exactly 1,
    /// forever. Anything else means the once-discipline was broken.
    #[inline]
    pub fn constructions(&self) -> u32 {
        self.constructions.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn test_concurrent_resolvers_observe_one_value() {
        static CELL: SharedOnce<String> = SharedOnce::new(|| String::from("shared"));

        const RESOLVERS: usize = 50;
        let barrier = Arc::new(Barrier::new(RESOLVERS));

        let handles: Vec<_> = (0..RESOLVERS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    // Line everyone up on the uninitialized cell
                    barrier.wait();
                    CELL.get() as *const String as usize
                })
            })
            .collect();

        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let first = addrs[0];
        assert!(addrs.iter().all(|&a| a == first));
        assert_eq!(CELL.constructions(), 1);
        assert_eq!(CELL.get(), "shared");
    }

    #[test]
    fn test_repeated_get_returns_same_reference() {
        static CELL: SharedOnce<Vec<u8>> = SharedOnce::new(|| vec![1, 2, 3]);

        let a = CELL.get() as *const Vec<u8>;
        let b = CELL.get() as *const Vec<u8>;
        assert_eq!(a, b);
        assert_eq!(CELL.constructions(), 1);
    }

    #[test]
    fn test_first_caller_constructor_wins() {
        static CELL: SharedOnce<u64> = SharedOnce::new(|| 0);

        let v = CELL.get_or_init_with(|| 7);
        assert_eq!(*v, 7);

        // Later constructors lose and are dropped unused
        let v = CELL.get_or_init_with(|| 9);
        assert_eq!(*v, 7);
        assert_eq!(*CELL.get(), 7);
        assert_eq!(CELL.constructions(), 1);
    }

    #[test]
    fn test_try_get_does_not_construct() {
        static CELL: SharedOnce<u64> = SharedOnce::new(|| 42);

        assert!(CELL.try_get().is_none());
        assert!(!CELL.is_initialized());
        assert_eq!(CELL.constructions(), 0);

        assert_eq!(*CELL.get(), 42);
        assert_eq!(CELL.try_get(), Some(&42));
        assert!(CELL.is_initialized());
    }
}
