// Shared test doubles for the end-to-end pipeline tests: a scripted serial
// link, recording HID devices, and a manually advanced clock.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use hidlink::crc::crc8;
use hidlink::hid::{KeyboardDevice, MouseDevice};
use hidlink::interrupt::InterruptFlag;
use hidlink::protocol::SYNC;
use hidlink::serial::SerialLink;
use hidlink::time::Clock;
use hidlink::Firmware;

pub type TestFirmware<'a> = Firmware<'a, ScriptedLink, RecordingMouse, RecordingKeyboard>;

/// Wrap a payload in SYNC | LEN | PAYLOAD | CRC.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![SYNC, payload.len() as u8];
    out.extend_from_slice(payload);
    out.push(crc8(payload));
    out
}

pub struct FakeClock {
    ms: Cell<u32>,
}

impl FakeClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            ms: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: u32) {
        self.ms.set(self.ms.get().wrapping_add(delta_ms));
    }

    pub fn now(&self) -> u32 {
        self.ms.get()
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u32 {
        self.ms.get()
    }
}

/// Serial link with a scripted receive queue and a captured transmit log.
#[derive(Default)]
pub struct ScriptedLink {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

impl ScriptedLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }

    /// Drain everything the firmware has transmitted so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl SerialLink for ScriptedLink {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        self.tx.push(byte);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseCall {
    Move(i8, i8, i8),
    Press(u8),
    Release(u8),
    Click(u8),
}

#[derive(Default)]
pub struct RecordingMouse {
    pub calls: Vec<MouseCall>,
}

impl MouseDevice for RecordingMouse {
    fn move_rel(&mut self, dx: i8, dy: i8, wheel: i8) {
        self.calls.push(MouseCall::Move(dx, dy, wheel));
    }

    fn press(&mut self, buttons: u8) {
        self.calls.push(MouseCall::Press(buttons));
    }

    fn release(&mut self, buttons: u8) {
        self.calls.push(MouseCall::Release(buttons));
    }

    fn click(&mut self, buttons: u8) {
        self.calls.push(MouseCall::Click(buttons));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCall {
    Press(u8),
    Release(u8),
    Write(u8),
    ReleaseAll,
}

/// Recording keyboard that can assert the panic button after a set number
/// of writes, emulating an operator slamming the button mid-print.
#[derive(Default)]
pub struct RecordingKeyboard {
    pub calls: Vec<KeyCall>,
    pub trip: Option<Trip>,
}

pub struct Trip {
    pub after_writes: usize,
    pub flag: Rc<InterruptFlag>,
    pub edge_at_ms: u32,
}

impl RecordingKeyboard {
    pub fn writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, KeyCall::Write(_)))
            .count()
    }
}

impl KeyboardDevice for RecordingKeyboard {
    fn press(&mut self, key: u8) {
        self.calls.push(KeyCall::Press(key));
    }

    fn release(&mut self, key: u8) {
        self.calls.push(KeyCall::Release(key));
    }

    fn write(&mut self, key: u8) {
        self.calls.push(KeyCall::Write(key));
        if let Some(trip) = &self.trip {
            if self.writes() == trip.after_writes {
                trip.flag.on_button_edge(trip.edge_at_ms);
            }
        }
    }

    fn release_all(&mut self) {
        self.calls.push(KeyCall::ReleaseAll);
    }
}
