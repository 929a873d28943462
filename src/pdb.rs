//! Programmable Delay Block, the hardware trigger source
//!
//! Continuous software-started counter. Once armed and started it free-runs
//! over `0..=modulus`, emitting a period-start event at the interrupt delay
//! point (0 here, i.e. every counter reset) and one trigger pulse per
//! configured channel delay. Two delays, two triggers, one converter slot
//! each. Nothing stops it but [`Pdb::disable`].

use fugit::HertzU32 as Hertz;
use fugit::MicrosDurationU64;

/// Counter clock prescaler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    Div1 = 0b000,
    Div2 = 0b001,
    Div4 = 0b010,
    Div8 = 0b011,
    Div16 = 0b100,
    Div32 = 0b101,
    Div64 = 0b110,
    Div128 = 0b111,
}

impl Prescaler {
    pub const fn divisor(self) -> u32 {
        1 << self as u32
    }
}

/// Multiplication factor applied on top of the prescaler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mult {
    X1 = 0b00,
    X10 = 0b01,
    X20 = 0b10,
    X40 = 0b11,
}

impl Mult {
    pub const fn factor(self) -> u32 {
        match self {
            Mult::X1 => 1,
            Mult::X10 => 10,
            Mult::X20 => 20,
            Mult::X40 => 40,
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    pub prescaler: Prescaler,
    pub mult: Mult,
    /// Counter wraps after reaching this value.
    pub modulus: u16,
    /// Counter value at which the period-start interrupt fires. 0 means the
    /// interrupt marks every counter reset.
    pub interrupt_delay: u16,
    /// Counter value of the slot-A trigger pulse.
    pub delay_a: u16,
    /// Counter value of the slot-B trigger pulse.
    pub delay_b: u16,
    pub interrupt_enable: bool,
}

impl Default for Config {
    /// Continuous software-triggered mode, slowed down far enough that every
    /// conversion of a period is individually visible on a terminal.
    fn default() -> Self {
        Self {
            prescaler: Prescaler::Div32,
            mult: Mult::X20,
            modulus: 0xffff,
            interrupt_delay: 0,
            delay_a: 0x2000,
            delay_b: 0x6000,
            interrupt_enable: true,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Trigger A must precede trigger B inside the period.
    DelayOrder,
    /// A delay or the interrupt point lies beyond the modulus.
    DelayOutOfRange,
}

/// Events produced by one counter tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events {
    pub period_start: bool,
    pub trigger_a: bool,
    pub trigger_b: bool,
}

/// Simulated PDB peripheral.
pub struct Pdb {
    config: Config,
    counter: u16,
    armed: bool,
    running: bool,
    interrupt_flag: bool,
}

impl Pdb {
    /// Power-on state: disabled, nothing loaded.
    pub const fn new() -> Self {
        Self {
            config: Config {
                prescaler: Prescaler::Div1,
                mult: Mult::X1,
                modulus: 0xffff,
                interrupt_delay: 0,
                delay_a: 0,
                delay_b: 0,
                interrupt_enable: false,
            },
            counter: 0,
            armed: false,
            running: false,
            interrupt_flag: false,
        }
    }

    /// Load a configuration and enable the block. The counter does not move
    /// until [`start`](Self::start) pulls the software trigger.
    pub fn arm(&mut self, config: Config) -> Result<(), ConfigError> {
        if config.delay_a >= config.delay_b {
            return Err(ConfigError::DelayOrder);
        }
        if config.delay_b > config.modulus || config.interrupt_delay > config.modulus {
            return Err(ConfigError::DelayOutOfRange);
        }
        self.config = config;
        self.counter = 0;
        self.armed = true;
        self.running = false;
        Ok(())
    }

    /// Software trigger. One pulse; the counter free-runs from here on.
    pub fn start(&mut self) {
        if self.armed {
            self.counter = 0;
            self.running = true;
        }
    }

    /// Stop the counter and suppress all further events.
    pub fn disable(&mut self) {
        self.armed = false;
        self.running = false;
        self.interrupt_flag = false;
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn interrupt_pending(&self) -> bool {
        self.interrupt_flag
    }

    /// Clear the period-start interrupt flag. Handlers must do this.
    #[inline]
    pub fn clear_interrupt(&mut self) {
        self.interrupt_flag = false;
    }

    /// Advance the counter by one tick, reporting events due at the counter
    /// value being left behind.
    pub fn tick(&mut self) -> Events {
        let mut events = Events::default();
        if !self.running {
            return events;
        }
        if self.counter == self.config.interrupt_delay {
            events.period_start = true;
            if self.config.interrupt_enable {
                self.interrupt_flag = true;
            }
        }
        if self.counter == self.config.delay_a {
            events.trigger_a = true;
        }
        if self.counter == self.config.delay_b {
            events.trigger_b = true;
        }
        self.counter = if self.counter >= self.config.modulus {
            0
        } else {
            self.counter + 1
        };
        events
    }

    /// Counter ticks in one full period.
    pub fn period_ticks(&self) -> u32 {
        self.config.modulus as u32 + 1
    }

    /// Wall-clock duration of one period for a given bus clock.
    pub fn period(&self, bus_clock: Hertz) -> MicrosDurationU64 {
        let divisor = self.config.prescaler.divisor() as u64 * self.config.mult.factor() as u64;
        let micros = self.period_ticks() as u64 * divisor * 1_000_000 / bus_clock.to_Hz() as u64;
        MicrosDurationU64::micros(micros)
    }
}

impl Default for Pdb {
    fn default() -> Self {
        Self::new()
    }
}
