//! Exponential smoothing of completed conversions
//!
//! One accumulator shared by both conversion slots. Each completion folds its
//! raw result in as `acc = (acc + sample) / 2`, so an impulse decays by half
//! (6 dB) on every subsequent update. The ratio is fixed; this is the whole
//! filter.

use core::sync::atomic::{AtomicU32, Ordering};

/// Single-pole exponential filter with a fixed 1/2 decay per update.
///
/// Interior-mutable so that interrupt-level completion handlers and the
/// foreground display loop can share one instance by reference.
pub struct ExpFilter {
    acc: AtomicU32,
}

impl ExpFilter {
    pub const fn new() -> Self {
        Self { acc: AtomicU32::new(0) }
    }

    /// Fold one raw sample into the accumulator, returning the new value.
    ///
    /// Both slot completion handlers write here; the read-modify-write must
    /// not interleave between them.
    pub fn update(&self, sample: u16) -> u32 {
        critical_section::with(|_| {
            let next = (self.acc.load(Ordering::Relaxed) + sample as u32) / 2;
            self.acc.store(next, Ordering::Relaxed);
            next
        })
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.acc.load(Ordering::Relaxed)
    }
}

impl Default for ExpFilter {
    fn default() -> Self {
        Self::new()
    }
}
