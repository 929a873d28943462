//! Board wiring: peripherals, interrupt routing, the tick loop
//!
//! [`Board::tick`] is the simulated passage of one trigger-source counter
//! tick. It routes trigger pulses into the converter slots, advances in-flight
//! conversions, latches interrupt lines and then dispatches handlers to
//! completion. Handlers therefore always finish before the foreground loop
//! regains control, the same run-to-completion discipline an interrupt
//! controller gives the original.

use fugit::HertzU32 as Hertz;

use crate::adc::{Adc, AnalogSource, SlotId};
use crate::cycle::AcqContext;
use crate::gpio::SimPin;
use crate::interrupt::{InterruptController, Irq};
use crate::pdb::Pdb;

/// Clock tree. One bus clock feeds both peripherals.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Clocks {
    pub bus: Hertz,
}

impl Default for Clocks {
    fn default() -> Self {
        Self { bus: Hertz::MHz(49) }
    }
}

/// The two peripherals plus the two observability pins.
pub struct Peripherals<S> {
    pub pdb: Pdb,
    pub adc: Adc<S>,
    /// Toggled at every period start. LED or scope only, no logical consumer.
    pub pin: SimPin,
    /// High after slot-A completion, low after slot-B and at period start.
    pub pin1: SimPin,
}

/// Simulated board: peripherals, interrupt controller, shared acquisition
/// state, clock bookkeeping.
pub struct Board<S> {
    pub periph: Peripherals<S>,
    pub nvic: InterruptController<S>,
    pub clocks: Clocks,
    ctx: AcqContext,
}

impl<S: AnalogSource> Board<S> {
    /// Power-on state: peripherals idle, all interrupt lines masked and
    /// unplugged, acquisition state zeroed.
    pub fn new(source: S) -> Self {
        Self {
            periph: Peripherals {
                pdb: Pdb::new(),
                adc: Adc::new(source),
                pin: SimPin::default(),
                pin1: SimPin::default(),
            },
            nvic: InterruptController::new(),
            clocks: Clocks::default(),
            ctx: AcqContext::new(),
        }
    }

    #[inline]
    pub fn ctx(&self) -> &AcqContext {
        &self.ctx
    }

    /// Advance simulated time by one counter tick.
    pub fn tick(&mut self) {
        let events = self.periph.pdb.tick();
        if events.trigger_a {
            self.periph.adc.hardware_trigger(SlotId::A);
        }
        if events.trigger_b {
            self.periph.adc.hardware_trigger(SlotId::B);
        }
        if events.period_start && self.periph.pdb.interrupt_pending() {
            self.nvic.pend(Irq::Pdb0);
        }

        let completions = self.periph.adc.tick();
        if completions.a && self.periph.adc.slot_config(SlotId::A).interrupt_enable {
            self.nvic.pend(Irq::Adc0);
        }
        if completions.b && self.periph.adc.slot_config(SlotId::B).interrupt_enable {
            self.nvic.pend(Irq::Adc0);
        }

        self.dispatch();
    }

    /// Deliver pending, unmasked interrupts in priority order, each handler
    /// running to completion.
    fn dispatch(&mut self) {
        while let Some(irq) = self.nvic.ack() {
            if let Some(handler) = self.nvic.vector(irq) {
                handler(&mut self.periph, &self.ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adc::{self, SlotConfig};
    use crate::cycle::{adc_isr, pdb_isr, BOTH_DONE};
    use crate::pdb;

    fn live_board(sample: u16) -> Board<impl AnalogSource> {
        let mut board = Board::new(move |_ch: u8| sample);
        board.nvic.set_vector(Irq::Pdb0, pdb_isr);
        board.nvic.set_vector(Irq::Adc0, adc_isr);
        board.nvic.enable(Irq::Pdb0);
        board.nvic.enable(Irq::Adc0);

        board
            .periph
            .pdb
            .arm(pdb::Config {
                modulus: 0x3fff,
                delay_a: 0x0400,
                delay_b: 0x2000,
                ..Default::default()
            })
            .unwrap();

        let slot = SlotConfig {
            channel: 21,
            interrupt_enable: true,
        };
        board
            .periph
            .adc
            .configure(adc::Config {
                slot_a: slot,
                slot_b: slot,
                ..Default::default()
            })
            .unwrap();

        board.periph.pdb.start();
        board
    }

    #[test]
    fn one_period_produces_both_results() {
        let mut board = live_board(30000);
        let period = board.periph.pdb.period_ticks();
        for _ in 0..period {
            board.tick();
        }
        assert_eq!(board.ctx().flags(), BOTH_DONE);
        assert_eq!(board.ctx().result(SlotId::A), 30000);
        assert_eq!(board.ctx().result(SlotId::B), 30000);
        // 0 -> 15000 -> 22500 through the shared filter.
        assert_eq!(board.ctx().filtered(), 22500);
        // Period marker saw exactly one edge, slot marker high then low.
        assert_eq!(board.periph.pin.transitions(), 1);
        assert_eq!(board.periph.pin1.transitions(), 2);
    }

    #[test]
    fn flags_cleared_once_per_period() {
        let mut board = live_board(1234);
        let period = board.periph.pdb.period_ticks();
        let mut clears = 0;
        let mut sets = 0;
        let mut last = board.ctx().flags();
        for _ in 0..3 * period {
            board.tick();
            let now = board.ctx().flags();
            if now == 0 && last != 0 {
                clears += 1;
            }
            if now.count_ones() > last.count_ones() {
                sets += now.count_ones() - last.count_ones();
            }
            last = now;
        }
        // Three periods: the first starts from already-clear flags, the two
        // wraps after it clear a full set each. Two done-bits per period.
        assert_eq!(clears, 2);
        assert_eq!(sets, 6);
    }

    #[test]
    fn masked_completion_is_not_delivered() {
        let mut board = live_board(500);
        board.nvic.disable(Irq::Adc0);
        let period = board.periph.pdb.period_ticks();
        for _ in 0..period {
            board.tick();
        }
        // The conversions completed but nobody read them.
        assert_eq!(board.ctx().flags(), 0);
        assert!(board.periph.adc.is_complete(SlotId::A));
        assert!(board.nvic.is_pending(Irq::Adc0));
    }
}
