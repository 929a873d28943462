//! Hardware-triggered ping-pong ADC acquisition, on simulated peripherals
//!
//! A delay-block trigger source fires two pulses per counter period, each
//! routed to one of two converter slots. Completion handlers record the raw
//! results, feed a shared exponential filter and set per-slot done-bits; a
//! foreground display loop waits for both bits and prints one status line per
//! period until the operator presses a key.
//!
//! The peripherals are deterministic software models driven by
//! [`peripherals::Board::tick`], so the whole trigger/convert/filter cycle
//! runs and tests on a host. See `demos/hw_trigger.rs` for a runnable
//! terminal version.

#![cfg_attr(not(test), no_std)]

pub mod adc;
pub mod cycle;
pub mod demo;
pub mod filter;
pub mod gpio;
pub mod interrupt;
pub mod pdb;
pub mod peripherals;
