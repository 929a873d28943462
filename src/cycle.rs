//! Per-period cycle tracking and the two interrupt handlers
//!
//! What used to be free-standing globals in the usual register-poking rendition
//! of this demo lives in one [`AcqContext`] shared by reference between the
//! interrupt handlers and the foreground display loop. The done-flags are the
//! only coordination: the period-start handler clears them, each completion
//! handler sets its own bit, and the display loop reads results only after it
//! has observed both bits set. Setting a bit uses Release ordering and the
//! foreground read uses Acquire, so the results written before the second bit
//! are visible to the reader even off the single-threaded simulation.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use crate::adc::SlotId;
use crate::filter::ExpFilter;
use crate::peripherals::Peripherals;

pub const A_DONE: u8 = 1 << 0;
pub const B_DONE: u8 = 1 << 1;
pub const BOTH_DONE: u8 = A_DONE | B_DONE;

/// Acquisition state shared between interrupt level and the foreground loop.
pub struct AcqContext {
    flags: AtomicU8,
    results: [AtomicU16; 2],
    /// Shared by both slots: every completion feeds it, so it runs at twice
    /// the per-slot trigger rate.
    pub filter: ExpFilter,
}

impl AcqContext {
    pub const fn new() -> Self {
        Self {
            flags: AtomicU8::new(0),
            results: [AtomicU16::new(0), AtomicU16::new(0)],
            filter: ExpFilter::new(),
        }
    }

    /// Clear both done-bits. Called once per period, at period start.
    #[inline]
    pub fn clear_flags(&self) {
        self.flags.store(0, Ordering::Release);
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags.load(Ordering::Acquire)
    }

    #[inline]
    pub fn both_done(&self) -> bool {
        self.flags() == BOTH_DONE
    }

    /// Store a slot's raw result, fold it into the filter, then mark the slot
    /// done. The done-bit goes last; it publishes the other two writes.
    pub fn record(&self, slot: SlotId, raw: u16) {
        let (idx, bit) = match slot {
            SlotId::A => (0, A_DONE),
            SlotId::B => (1, B_DONE),
        };
        self.results[idx].store(raw, Ordering::Relaxed);
        self.filter.update(raw);
        self.flags.fetch_or(bit, Ordering::Release);
    }

    #[inline]
    pub fn result(&self, slot: SlotId) -> u16 {
        let idx = match slot {
            SlotId::A => 0,
            SlotId::B => 1,
        };
        self.results[idx].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered(&self) -> u32 {
        self.filter.value()
    }
}

impl Default for AcqContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Period-start handler.
///
/// Toggles the cycle marker pin first so the edge lands as close to the
/// counter reset as possible, then clears the interrupt, drops the slot
/// marker pin and opens a fresh set of done-flags.
pub fn pdb_isr<S: crate::adc::AnalogSource>(p: &mut Peripherals<S>, ctx: &AcqContext) {
    p.pin.toggle();
    p.pdb.clear_interrupt();
    p.pin1.set_low();
    ctx.clear_flags();
}

/// Conversion-complete handler, shared by both slots.
///
/// Slot A raises the slot marker pin, slot B drops it; with trigger A placed
/// before trigger B in the period the pin traces the ping-pong on a scope.
/// Reading the result register is what clears the interrupt condition.
pub fn adc_isr<S: crate::adc::AnalogSource>(p: &mut Peripherals<S>, ctx: &AcqContext) {
    if p.adc.is_complete(SlotId::A) {
        p.pin1.set_high();
        let raw = p.adc.read_result(SlotId::A);
        ctx.record(SlotId::A, raw);
    } else if p.adc.is_complete(SlotId::B) {
        p.pin1.set_low();
        let raw = p.adc.read_result(SlotId::B);
        ctx.record(SlotId::B, raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_the_period_protocol() {
        let ctx = AcqContext::new();
        assert_eq!(ctx.flags(), 0);

        ctx.record(SlotId::A, 1000);
        assert_eq!(ctx.flags(), A_DONE);
        assert!(!ctx.both_done());

        ctx.record(SlotId::B, 2000);
        assert!(ctx.both_done());
        assert_eq!(ctx.result(SlotId::A), 1000);
        assert_eq!(ctx.result(SlotId::B), 2000);

        ctx.clear_flags();
        assert_eq!(ctx.flags(), 0);
        // Results and filter state survive the per-period clear.
        assert_eq!(ctx.result(SlotId::A), 1000);
        assert_eq!(ctx.filtered(), (1000 / 2 + 2000) / 2);
    }

    #[test]
    fn record_feeds_the_shared_filter() {
        let ctx = AcqContext::new();
        ctx.record(SlotId::A, 4096);
        assert_eq!(ctx.filtered(), 2048);
        ctx.record(SlotId::B, 4096);
        assert_eq!(ctx.filtered(), 3072);
    }
}
