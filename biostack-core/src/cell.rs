//! Reactive notification cells.
//!
//! A [`Cell`] sits between a set of observed values and the action that
//! recomputes something from them. Whoever writes an observed value calls
//! [`Cell::notify`] and runs the action only when it returns `true`.
//!
//! Multi-value writes are bracketed with [`Cell::disable`] and
//! [`Cell::enable`]: notifications arriving while disabled are coalesced
//! into a single firing on re-enable, so the action never observes a
//! half-written state. [`Cell::ignore_next`] marks the next firing as a
//! programmatic echo that must be swallowed.

/// Gate deciding when a reactive action runs.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    disabled: u32,
    dirty: bool,
    ignore_next: bool,
    fired: u64,
}

impl Cell {
    /// Creates an enabled cell with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspends firing. Calls nest.
    pub fn disable(&mut self) {
        self.disabled += 1;
    }

    /// Undoes one [`disable`](Self::disable).
    ///
    /// Returns `true` when the cell became enabled with a pending change that
    /// the caller must now act on.
    #[must_use]
    pub fn enable(&mut self) -> bool {
        self.disabled = self.disabled.saturating_sub(1);
        if self.disabled > 0 || !self.dirty {
            return false;
        }
        self.dirty = false;
        self.consume()
    }

    /// Records a change to an observed value.
    ///
    /// Returns `true` when the caller must run the action now.
    #[must_use]
    pub fn notify(&mut self) -> bool {
        if self.disabled > 0 {
            self.dirty = true;
            return false;
        }
        self.consume()
    }

    /// Swallows the next firing.
    ///
    /// Set immediately before a programmatic write; cleared by the first
    /// firing it suppresses.
    pub fn ignore_next(&mut self) {
        self.ignore_next = true;
    }

    /// Returns true if no [`disable`](Self::disable) is outstanding.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.disabled == 0
    }

    /// Returns true if an echo suppression is still armed.
    #[inline]
    pub fn is_ignoring(&self) -> bool {
        self.ignore_next
    }

    /// Number of times the action has been allowed to run.
    #[inline]
    pub fn fire_count(&self) -> u64 {
        self.fired
    }

    fn consume(&mut self) -> bool {
        if self.ignore_next {
            self.ignore_next = false;
            return false;
        }
        self.fired += 1;
        true
    }
}
