//! Simulated interrupt controller
//!
//! Two lines, a vector table of plain function pointers, per-line enable and
//! pending bits. Vectors are installed dynamically, by convention while the
//! line is masked. A pending line whose enable bit is clear stays pending
//! until the line is enabled or the controller is rebuilt; it is never
//! delivered while masked.

use crate::cycle::AcqContext;
use crate::peripherals::Peripherals;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Irq {
    /// Trigger-source period start.
    Pdb0 = 0,
    /// Conversion complete, either slot.
    Adc0 = 1,
}

impl Irq {
    #[inline]
    const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Handler signature: peripherals plus the shared acquisition state.
pub type Handler<S> = fn(&mut Peripherals<S>, &AcqContext);

pub struct InterruptController<S> {
    vectors: [Option<Handler<S>>; 2],
    enabled: u8,
    pending: u8,
}

impl<S> InterruptController<S> {
    pub const fn new() -> Self {
        Self {
            vectors: [None, None],
            enabled: 0,
            pending: 0,
        }
    }

    /// Plug a handler into the vector table.
    #[inline]
    pub fn set_vector(&mut self, irq: Irq, handler: Handler<S>) {
        self.vectors[irq as usize] = Some(handler);
    }

    #[inline]
    pub fn vector(&self, irq: Irq) -> Option<Handler<S>> {
        self.vectors[irq as usize]
    }

    #[inline]
    pub fn enable(&mut self, irq: Irq) {
        self.enabled |= irq.mask();
    }

    #[inline]
    pub fn disable(&mut self, irq: Irq) {
        self.enabled &= !irq.mask();
    }

    #[inline]
    pub fn is_enabled(&self, irq: Irq) -> bool {
        self.enabled & irq.mask() != 0
    }

    #[inline]
    pub fn pend(&mut self, irq: Irq) {
        self.pending |= irq.mask();
    }

    #[inline]
    pub fn is_pending(&self, irq: Irq) -> bool {
        self.pending & irq.mask() != 0
    }

    /// Take the highest-priority deliverable line, clearing its pending bit.
    /// The period-start line outranks the completion line.
    pub fn ack(&mut self) -> Option<Irq> {
        let deliverable = self.pending & self.enabled;
        let irq = if deliverable & Irq::Pdb0.mask() != 0 {
            Irq::Pdb0
        } else if deliverable & Irq::Adc0.mask() != 0 {
            Irq::Adc0
        } else {
            return None;
        };
        self.pending &= !irq.mask();
        Some(irq)
    }
}

impl<S> Default for InterruptController<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Source = fn(u8) -> u16;

    #[test]
    fn masked_lines_stay_pending() {
        let mut nvic = InterruptController::<Source>::new();
        nvic.pend(Irq::Adc0);
        assert_eq!(nvic.ack(), None);
        assert!(nvic.is_pending(Irq::Adc0));

        nvic.enable(Irq::Adc0);
        assert_eq!(nvic.ack(), Some(Irq::Adc0));
        assert!(!nvic.is_pending(Irq::Adc0));
        assert_eq!(nvic.ack(), None);
    }

    #[test]
    fn period_start_outranks_completion() {
        let mut nvic = InterruptController::<Source>::new();
        nvic.enable(Irq::Pdb0);
        nvic.enable(Irq::Adc0);
        nvic.pend(Irq::Adc0);
        nvic.pend(Irq::Pdb0);
        assert_eq!(nvic.ack(), Some(Irq::Pdb0));
        assert_eq!(nvic.ack(), Some(Irq::Adc0));
    }

    #[test]
    fn disable_keeps_the_vector() {
        let mut nvic = InterruptController::<Source>::new();
        nvic.set_vector(Irq::Pdb0, crate::cycle::pdb_isr::<Source>);
        nvic.enable(Irq::Pdb0);
        nvic.disable(Irq::Pdb0);
        assert!(!nvic.is_enabled(Irq::Pdb0));
        assert!(nvic.vector(Irq::Pdb0).is_some());
    }
}
