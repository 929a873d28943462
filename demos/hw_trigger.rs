//! Terminal run of the hardware-trigger demo.
//!
//! Stdin plays the operator console (line buffered, so "any key" means a key
//! followed by Enter), stdout shows the overwritten status line, and a slowly
//! wandering simulated potentiometer feeds both converter slots.

use std::convert::Infallible;
use std::io::{self, Read as _, Write as _};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use embedded_hal_nb::serial::{ErrorType, Read, Write};
use hwtrig::adc::AnalogSource;
use hwtrig::demo::HwTrigDemo;
use hwtrig::peripherals::Board;

/// Console bridge: a reader thread feeds keypresses through a channel, writes
/// go straight to stdout. Each status line (carriage return) holds the output
/// back a little so the demo runs at a watchable pace.
struct TerminalConsole {
    keys: mpsc::Receiver<u8>,
    stdout: io::Stdout,
}

impl ErrorType for TerminalConsole {
    type Error = Infallible;
}

impl Read<u8> for TerminalConsole {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.keys.try_recv().map_err(|_| nb::Error::WouldBlock)
    }
}

impl Write<u8> for TerminalConsole {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        let _ = self.stdout.write_all(&[word]);
        if word == b'\r' {
            let _ = self.stdout.flush();
            thread::sleep(Duration::from_millis(80));
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        let _ = self.stdout.flush();
        Ok(())
    }
}

/// Simulated potentiometer: slow sweep plus a little sampling noise.
#[derive(Default)]
struct Potentiometer {
    t: u64,
}

impl AnalogSource for Potentiometer {
    fn sample(&mut self, _channel: u8) -> u16 {
        self.t += 1;
        let sweep = (self.t as f64 / 3000.0).sin();
        let noise = (self.t.wrapping_mul(2654435761) >> 16) & 0xff;
        let value = 32768.0 + 26000.0 * sweep + noise as f64;
        value.clamp(0.0, 65535.0) as u16
    }
}

fn main() {
    let (tx, keys) = mpsc::channel();
    thread::spawn(move || {
        for byte in io::stdin().lock().bytes().flatten() {
            if tx.send(byte).is_err() {
                break;
            }
        }
    });

    let console = TerminalConsole {
        keys,
        stdout: io::stdout(),
    };
    let mut demo = HwTrigDemo::new(Board::new(Potentiometer::default()), console);
    demo.run().unwrap();
}
