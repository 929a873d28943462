//! The display loop
//!
//! Foreground state machine around the interrupt-driven acquisition: set the
//! whole stack up, then print one overwritten status line per completed
//! trigger period until the operator presses a key. The console is anything
//! speaking the non-blocking serial traits; the keypress check is simply
//! "did a read return a byte".

use core::fmt::Write as _;

use embedded_hal_nb::serial::{Read, Write};

use crate::adc::{self, AnalogSource, SlotConfig, SlotId};
use crate::cycle::{adc_isr, pdb_isr};
use crate::interrupt::Irq;
use crate::pdb;
use crate::peripherals::Board;

/// Input channel the demo converts on both slots. On the original board this
/// is the potentiometer.
pub const POT_CHANNEL: u8 = 21;

const BANNER_START: &str = "\n\n\n\
********************************************************\n\
* Running ADC0 HARDWARE TRIGGER by PDB                 *\n\
* ADC0 A,B is the POT.   Vary the POT setting.         *\n\
* Hit any key to exit                                  *\n\
********************************************************\n\n\n";

const BANNER_END: &str = "\n\n\n\
********************************************************\n\
* Demonstration ended at operator request              *\n\
* ADC0      TRIGGER DEMO COMPLETE                      *\n\
********************************************************\n\n\n";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DemoState {
    Setup,
    Running,
    Draining,
    Done,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Error<E> {
    Console(E),
    Pdb(pdb::ConfigError),
    Adc(adc::ConfigError),
    Calibration(adc::Error),
}

/// Hardware-trigger demo: a board plus an operator console.
pub struct HwTrigDemo<S, C> {
    board: Board<S>,
    console: C,
    state: DemoState,
}

impl<S, C> HwTrigDemo<S, C>
where
    S: AnalogSource,
    C: Read<u8> + Write<u8>,
{
    pub fn new(board: Board<S>, console: C) -> Self {
        Self {
            board,
            console,
            state: DemoState::Setup,
        }
    }

    #[inline]
    pub fn state(&self) -> DemoState {
        self.state
    }

    #[inline]
    pub fn board(&self) -> &Board<S> {
        &self.board
    }

    pub fn into_parts(self) -> (Board<S>, C) {
        (self.board, self.console)
    }

    /// Run the demo to completion: returns once the operator has pressed a
    /// key and the peripherals have been shut down.
    pub fn run(&mut self) -> Result<(), Error<C::Error>> {
        self.setup()?;
        self.state = DemoState::Running;

        // Print once per period: after a status line, wait for the
        // period-start clear before watching for the next full set.
        let mut printed = false;
        loop {
            // Operator input is checked every iteration, not just after a
            // completed cycle.
            match self.console.read() {
                Ok(_) => break,
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(Error::Console(e)),
            }

            self.board.tick();

            if self.board.ctx().both_done() {
                if !printed {
                    self.print_status()?;
                    printed = true;
                }
            } else {
                printed = false;
            }
        }

        self.state = DemoState::Draining;
        self.drain()?;
        self.state = DemoState::Done;
        Ok(())
    }

    /// The full bring-up sequence, in hardware order: pins, vectors plugged
    /// while the lines are masked, trigger source armed, converter configured
    /// and calibrated and configured again, console flushed, banner, lines
    /// unmasked, software trigger.
    fn setup(&mut self) -> Result<(), Error<C::Error>> {
        let p = &mut self.board.periph;
        p.pin.set_low();
        p.pin1.set_low();

        self.board.nvic.disable(Irq::Adc0);
        self.board.nvic.disable(Irq::Pdb0);
        self.board.nvic.set_vector(Irq::Pdb0, pdb_isr);
        self.board.nvic.set_vector(Irq::Adc0, adc_isr);

        self.board
            .periph
            .pdb
            .arm(pdb::Config::default())
            .map_err(Error::Pdb)?;

        // Configure with both slots parked on the disabled channel, run
        // calibration, then configure again: calibration tramples the
        // trigger-select and averaging settings, and skipping the reapply is
        // the classic way to end up with a converter that ignores the PDB.
        let parked = adc::Config::default();
        let adc = &mut self.board.periph.adc;
        adc.configure(parked).map_err(Error::Adc)?;
        adc.calibrate().map_err(Error::Calibration)?;
        adc.configure(parked).map_err(Error::Adc)?;

        // Now the live bindings: real channels, completion interrupts on.
        let slot = SlotConfig {
            channel: POT_CHANNEL,
            interrupt_enable: true,
        };
        adc.configure(adc::Config {
            slot_a: slot,
            slot_b: slot,
            ..parked
        })
        .map_err(Error::Adc)?;

        self.flush_input()?;
        self.write_str(BANNER_START)?;

        self.board.nvic.enable(Irq::Adc0);
        self.board.nvic.enable(Irq::Pdb0);

        self.board.ctx().clear_flags();
        // The one software trigger; the counter free-runs from here.
        self.board.periph.pdb.start();
        Ok(())
    }

    /// Shut down: trigger source off and both interrupt lines masked before
    /// the termination banner goes out. No further events are processed.
    fn drain(&mut self) -> Result<(), Error<C::Error>> {
        self.board.periph.pdb.disable();
        self.board.nvic.disable(Irq::Adc0);
        self.board.nvic.disable(Irq::Pdb0);
        self.write_str(BANNER_END)
    }

    fn print_status(&mut self) -> Result<(), Error<C::Error>> {
        let ctx = self.board.ctx();
        let a = ctx.result(SlotId::A);
        let b = ctx.result(SlotId::B);
        let pot = ctx.filtered();

        let mut line = heapless::String::<64>::new();
        // Capacity covers the worst-case field widths.
        let _ = write!(line, "R0A={:6}  R0B={:6}   POT={:6}\r", a, b, pot);
        self.write_str(&line)
    }

    /// Drain any bytes already queued on the console, so that stale input
    /// does not immediately end the demo.
    fn flush_input(&mut self) -> Result<(), Error<C::Error>> {
        loop {
            match self.console.read() {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(Error::Console(e)),
            }
        }
    }

    fn write_str(&mut self, s: &str) -> Result<(), Error<C::Error>> {
        for byte in s.bytes() {
            nb::block!(self.console.write(byte)).map_err(Error::Console)?;
        }
        nb::block!(self.console.flush()).map_err(Error::Console)
    }
}
