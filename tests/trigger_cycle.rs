//! End-to-end runs of the display loop against a scripted console.

use core::convert::Infallible;

use embedded_hal_nb::serial::{ErrorType, Read, Write};
use hwtrig::adc::{self, SlotConfig, SlotId};
use hwtrig::cycle::{adc_isr, pdb_isr, BOTH_DONE};
use hwtrig::demo::{DemoState, HwTrigDemo};
use hwtrig::interrupt::Irq;
use hwtrig::pdb;
use hwtrig::peripherals::Board;

/// Console that never blocks on output, answers `WouldBlock` on input, and
/// delivers a single keypress after a configured number of read polls.
struct ScriptedConsole {
    key_after_reads: usize,
    reads: usize,
    key_sent: bool,
    output: Vec<u8>,
}

impl ScriptedConsole {
    fn new(key_after_reads: usize) -> Self {
        Self {
            key_after_reads,
            reads: 0,
            key_sent: false,
            output: Vec::new(),
        }
    }

    fn output(&self) -> String {
        String::from_utf8(self.output.clone()).unwrap()
    }
}

impl ErrorType for ScriptedConsole {
    type Error = Infallible;
}

impl Read<u8> for ScriptedConsole {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.reads += 1;
        if !self.key_sent && self.reads > self.key_after_reads {
            self.key_sent = true;
            Ok(b'q')
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl Write<u8> for ScriptedConsole {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.output.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// A board wired the way the demo wires it, but driven directly by tests.
fn wired_board<S: adc::AnalogSource>(source: S) -> Board<S> {
    let mut board = Board::new(source);
    board.nvic.set_vector(Irq::Pdb0, pdb_isr);
    board.nvic.set_vector(Irq::Adc0, adc_isr);
    board.nvic.enable(Irq::Pdb0);
    board.nvic.enable(Irq::Adc0);
    board.periph.pdb.arm(pdb::Config::default()).unwrap();
    let slot = SlotConfig {
        channel: 21,
        interrupt_enable: true,
    };
    let mut config = adc::Config::default();
    config.slot_a = slot;
    config.slot_b = slot;
    board.periph.adc.configure(config).unwrap();
    board.periph.pdb.start();
    board
}

#[test]
fn status_lines_carry_the_period_results() {
    // Keypress lands midway through the third period.
    let console = ScriptedConsole::new(165_000);
    let mut demo = HwTrigDemo::new(Board::new(|_ch: u8| 40000u16), console);
    demo.run().unwrap();
    assert_eq!(demo.state(), DemoState::Done);

    let (_, console) = demo.into_parts();
    let out = console.output();

    // Start banner precedes any status line, end banner follows them all.
    let first_status = out.find("R0A=").unwrap();
    assert!(out.find("Running ADC0 HARDWARE TRIGGER by PDB").unwrap() < first_status);
    assert!(out.rfind("TRIGGER DEMO COMPLETE").unwrap() > out.rfind("R0A=").unwrap());

    // Constant 40000 on both slots; the shared filter sees it twice per
    // period, so successive lines show 30000, 37500, 39375.
    // The first status line shares its chunk with the start banner.
    let lines: Vec<&str> = out
        .split('\r')
        .filter_map(|chunk| chunk.find("R0A=").map(|at| &chunk[at..]))
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "R0A= 40000  R0B= 40000   POT= 30000");
    assert_eq!(lines[1], "R0A= 40000  R0B= 40000   POT= 37500");
    assert_eq!(lines[2], "R0A= 40000  R0B= 40000   POT= 39375");
}

#[test]
fn no_status_line_before_both_slots_complete() {
    // Exit before the slot-B conversion of the first period can finish.
    let console = ScriptedConsole::new(0x3000);
    let mut demo = HwTrigDemo::new(Board::new(|_ch: u8| 123u16), console);
    demo.run().unwrap();

    assert_ne!(demo.board().ctx().flags(), BOTH_DONE);
    let (_, console) = demo.into_parts();
    assert!(!console.output().contains("R0A="));
}

#[test]
fn keypress_shuts_the_stack_down() {
    let console = ScriptedConsole::new(200_000);
    let mut demo = HwTrigDemo::new(Board::new(|_ch: u8| 5000u16), console);
    demo.run().unwrap();
    assert_eq!(demo.state(), DemoState::Done);

    let board = demo.board();
    assert!(!board.periph.pdb.is_running());
    assert!(!board.nvic.is_enabled(Irq::Pdb0));
    assert!(!board.nvic.is_enabled(Irq::Adc0));

    // Nothing moves after shutdown: no triggers, no handler effects.
    let (mut board, console) = demo.into_parts();
    let flags = board.ctx().flags();
    let filtered = board.ctx().filtered();
    let pin_edges = board.periph.pin.transitions();
    for _ in 0..100_000 {
        board.tick();
    }
    assert_eq!(board.ctx().flags(), flags);
    assert_eq!(board.ctx().filtered(), filtered);
    assert_eq!(board.periph.pin.transitions(), pin_edges);

    assert!(console.output().ends_with("********\n\n\n"));
}

#[test]
fn impulse_decays_through_the_whole_chain() {
    // First conversion reads full scale for all its averaging samples, every
    // later one reads zero: an impulse into the shared filter.
    let mut remaining = 32u32;
    let mut board = wired_board(move |_ch: u8| {
        if remaining > 0 {
            remaining -= 1;
            32768u16
        } else {
            0
        }
    });

    let period = board.periph.pdb.period_ticks();
    for _ in 0..period {
        board.tick();
    }
    // Period one: A folded in 32768, B folded in 0.
    assert_eq!(board.ctx().result(SlotId::A), 32768);
    assert_eq!(board.ctx().result(SlotId::B), 0);
    assert_eq!(board.ctx().filtered(), 8192);

    for _ in 0..3 * period {
        board.tick();
    }
    // Six more zero completions halve it each time.
    assert_eq!(board.ctx().filtered(), 128);
}
