//! Dual-slot analog-to-digital converter
//!
//! One analog front end, two slot register sets (A and B). Each slot binds an
//! input channel and reacts to its own hardware trigger; while one slot's
//! result register is being read the other can already be converting. That
//! ping-pong is the reason the slots exist, and the whole demo hangs off it.
//!
//! Calibration note: [`Adc::calibrate`] runs the self-calibration engine in
//! its own operating mode and leaves that mode behind in the configuration
//! registers. [`Adc::configure`] must be called again afterwards with the
//! intended settings, or hardware triggers will be silently ignored.

/// Writing this channel number to a slot disables it. There is no channel 31.
pub const CHANNEL_DISABLED: u8 = 31;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    #[inline]
    const fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Bits8 = 0b00,
    Bits12 = 0b01,
    Bits10 = 0b10,
    Bits16 = 0b11,
}

impl Resolution {
    pub const fn bits(self) -> u8 {
        match self {
            Resolution::Bits8 => 8,
            Resolution::Bits10 => 10,
            Resolution::Bits12 => 12,
            Resolution::Bits16 => 16,
        }
    }
}

/// Hardware averaging over consecutive samples of one conversion.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Averaging {
    Off,
    Samples4,
    Samples8,
    Samples16,
    Samples32,
}

impl Averaging {
    pub const fn samples(self) -> u32 {
        match self {
            Averaging::Off => 1,
            Averaging::Samples4 => 4,
            Averaging::Samples8 => 8,
            Averaging::Samples16 => 16,
            Averaging::Samples32 => 32,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivide {
    Div1 = 0b00,
    Div2 = 0b01,
    Div4 = 0b10,
    Div8 = 0b11,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerSelect {
    Software,
    Hardware,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reference {
    External,
    Alternate,
}

/// Per-slot channel binding.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SlotConfig {
    pub channel: u8,
    pub interrupt_enable: bool,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            channel: CHANNEL_DISABLED,
            interrupt_enable: false,
        }
    }
}

#[non_exhaustive]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    pub clock_divide: ClockDivide,
    pub resolution: Resolution,
    pub average: Averaging,
    pub trigger: TriggerSelect,
    pub reference: Reference,
    pub slot_a: SlotConfig,
    pub slot_b: SlotConfig,
}

impl Default for Config {
    /// 16-bit, 32-sample averaging, bus clock / 4, hardware triggered,
    /// external reference, both slots disabled.
    fn default() -> Self {
        Self {
            clock_divide: ClockDivide::Div4,
            resolution: Resolution::Bits16,
            average: Averaging::Samples32,
            trigger: TriggerSelect::Hardware,
            reference: Reference::External,
            slot_a: SlotConfig::default(),
            slot_b: SlotConfig::default(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel numbers above 31 do not exist.
    InvalidChannel,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Calibration was requested while a conversion is in flight.
    Busy,
}

/// Offset and gain words produced by the self-calibration engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub offset: i16,
    pub plus_side_gain: u16,
}

/// Where the simulated front end gets its voltages from.
///
/// Samples are 16-bit full scale regardless of the configured resolution;
/// the converter truncates.
pub trait AnalogSource {
    fn sample(&mut self, channel: u8) -> u16;
}

impl<F: FnMut(u8) -> u16> AnalogSource for F {
    fn sample(&mut self, channel: u8) -> u16 {
        self(channel)
    }
}

/// Completion signals raised by one tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Completions {
    pub a: bool,
    pub b: bool,
}

struct Slot {
    result: u16,
    complete: bool,
    /// Remaining conversion ticks, if a conversion is in flight.
    busy: Option<u32>,
}

impl Slot {
    const fn new() -> Self {
        Self {
            result: 0,
            complete: false,
            busy: None,
        }
    }
}

/// Simulated ADC peripheral over an analog source.
pub struct Adc<S> {
    config: Config,
    slots: [Slot; 2],
    calibration: Option<Calibration>,
    source: S,
}

impl<S: AnalogSource> Adc<S> {
    /// Power-on state: default configuration, no calibration.
    pub fn new(source: S) -> Self {
        Self {
            config: Config::default(),
            slots: [Slot::new(), Slot::new()],
            calibration: None,
            source,
        }
    }

    /// Apply a configuration. Aborts any conversion in flight, as a write to
    /// the slot control registers does on hardware.
    pub fn configure(&mut self, config: Config) -> Result<(), ConfigError> {
        if config.slot_a.channel > CHANNEL_DISABLED || config.slot_b.channel > CHANNEL_DISABLED {
            return Err(ConfigError::InvalidChannel);
        }
        self.config = config;
        for slot in &mut self.slots {
            slot.busy = None;
            slot.complete = false;
        }
        Ok(())
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Run the self-calibration engine.
    ///
    /// The engine takes over the converter: software trigger, maximum
    /// averaging, both slots unbound. Those settings remain in the
    /// configuration when it finishes, so the intended configuration must be
    /// reapplied before the converter is used again.
    pub fn calibrate(&mut self) -> Result<Calibration, Error> {
        if self.slots.iter().any(|slot| slot.busy.is_some()) {
            return Err(Error::Busy);
        }
        self.config.trigger = TriggerSelect::Software;
        self.config.average = Averaging::Samples32;
        self.config.slot_a = SlotConfig::default();
        self.config.slot_b = SlotConfig::default();

        let calibration = Calibration {
            offset: 2,
            plus_side_gain: 0x82ee,
        };
        self.calibration = Some(calibration);
        Ok(calibration)
    }

    /// Hardware trigger pulse arriving at a slot.
    ///
    /// Ignored unless the converter is in hardware-trigger mode and the slot
    /// is bound to a real channel. A pulse at a busy slot restarts it.
    pub fn hardware_trigger(&mut self, slot: SlotId) {
        if self.config.trigger != TriggerSelect::Hardware {
            return;
        }
        if self.slot_config(slot).channel == CHANNEL_DISABLED {
            return;
        }
        self.slots[slot.index()].busy = Some(self.conversion_ticks());
    }

    /// Advance in-flight conversions by one tick.
    pub fn tick(&mut self) -> Completions {
        let mut done = Completions::default();
        for idx in 0..self.slots.len() {
            let Some(remaining) = self.slots[idx].busy else {
                continue;
            };
            if remaining > 1 {
                self.slots[idx].busy = Some(remaining - 1);
                continue;
            }
            let channel = match idx {
                0 => self.config.slot_a.channel,
                _ => self.config.slot_b.channel,
            };
            let value = Self::convert(&mut self.source, &self.config, channel);
            let slot = &mut self.slots[idx];
            slot.busy = None;
            slot.result = value;
            slot.complete = true;
            match idx {
                0 => done.a = true,
                _ => done.b = true,
            }
        }
        done
    }

    /// Completion signal for a slot, i.e. its result register holds a fresh
    /// conversion that has not been read yet.
    #[inline]
    pub fn is_complete(&self, slot: SlotId) -> bool {
        self.slots[slot.index()].complete
    }

    /// Read a slot's result register. Clears the completion signal, which is
    /// also the interrupt condition.
    pub fn read_result(&mut self, slot: SlotId) -> u16 {
        let slot = &mut self.slots[slot.index()];
        slot.complete = false;
        slot.result
    }

    #[inline]
    pub fn slot_config(&self, slot: SlotId) -> &SlotConfig {
        match slot {
            SlotId::A => &self.config.slot_a,
            SlotId::B => &self.config.slot_b,
        }
    }

    /// Ticks one conversion occupies, from trigger to completion.
    pub fn conversion_ticks(&self) -> u32 {
        let base = match self.config.resolution {
            Resolution::Bits8 => 17,
            Resolution::Bits10 | Resolution::Bits12 => 20,
            Resolution::Bits16 => 25,
        };
        self.config.average.samples() * (base + 20)
    }

    fn convert(source: &mut S, config: &Config, channel: u8) -> u16 {
        let samples = config.average.samples();
        let mut sum = 0u32;
        for _ in 0..samples {
            sum += source.sample(channel) as u32;
        }
        let averaged = (sum / samples) as u16;
        averaged >> (16 - config.resolution.bits())
    }
}
