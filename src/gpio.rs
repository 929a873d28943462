//! Observability pins
//!
//! The demo drives two output pins purely for external observation (LED or
//! scope): one toggles at every trigger-source period start, the other marks
//! which conversion slot completed last. Nothing in software reads them back
//! except tests, so the simulated pin just records its level and how many
//! edges it has seen.

use core::convert::Infallible;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(val: bool) -> Self {
        match val {
            true => Self::High,
            false => Self::Low,
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> bool {
        matches!(level, Level::High)
    }
}

/// Simulated push-pull output pin.
pub struct SimPin {
    level: Level,
    transitions: u32,
}

impl SimPin {
    pub const fn new(level: Level) -> Self {
        Self { level, transitions: 0 }
    }

    #[inline]
    pub fn set_high(&mut self) {
        self.set_level(Level::High);
    }

    #[inline]
    pub fn set_low(&mut self) {
        self.set_level(Level::Low);
    }

    pub fn set_level(&mut self, level: Level) {
        if self.level != level {
            self.transitions += 1;
        }
        self.level = level;
    }

    pub fn toggle(&mut self) {
        self.level = match self.level {
            Level::Low => Level::High,
            Level::High => Level::Low,
        };
        self.transitions += 1;
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn is_set_high(&self) -> bool {
        self.level == Level::High
    }

    /// Number of edges driven since construction.
    #[inline]
    pub fn transitions(&self) -> u32 {
        self.transitions
    }
}

impl Default for SimPin {
    fn default() -> Self {
        Self::new(Level::Low)
    }
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimPin {
    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        SimPin::set_high(self);
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        SimPin::set_low(self);
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for SimPin {
    #[inline]
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level == Level::High)
    }

    #[inline]
    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level == Level::Low)
    }
}
