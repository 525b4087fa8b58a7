//! Monotonic id allocation.
//!
//! Each owner (matrix, pool, group registry) keeps its own allocator and
//! passes it around explicitly instead of relying on process-wide counters.

/// Hands out increasing integer ids.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates an allocator whose first id is 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    /// Returns a fresh id.
    pub fn allocate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Makes sure `id` will never be handed out again.
    ///
    /// Used when adopting ids that were allocated elsewhere.
    pub fn reserve(&mut self, id: u64) {
        self.next = self.next.max(id + 1);
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Declares a `Copy` newtype id with `Display` as `#n`.
#[macro_export]
macro_rules! typed_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub u64);

        impl $name {
            /// Returns the raw id.
            #[inline]
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(), 0);
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.peek(), 2);
    }

    #[test]
    fn test_reserve_skips_adopted_ids() {
        let mut ids = IdAllocator::starting_at(1);
        ids.reserve(9);
        assert_eq!(ids.allocate(), 10);
        ids.reserve(3);
        assert_eq!(ids.allocate(), 11);
    }
}
