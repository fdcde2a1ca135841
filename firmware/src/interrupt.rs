// Panic Button Interrupt Flag
//
// The only state shared between the hardware-button ISR and the main loop.
// The ISR is strictly a producer: it debounces the edge and raises the
// pending flag. The main loop observes and clears the flag at the top of
// each iteration and performs all the actual servicing (queue drain, HID
// release, host notification) in its own context.
//
// Concurrency notes:
// - `pending` is a single atomic byte; raise uses Release, observe uses
//   Acquire, so the main loop sees the edge timestamp the ISR recorded
// - `last_edge_ms` is written and read only from the ISR path, serialized
//   by the hardware (edge interrupts on one pin do not nest)
// - No logging, no HID calls, no queue access on the ISR side

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Edges closer together than this are treated as switch bounce.
pub const DEBOUNCE_WINDOW_MS: u32 = 50;

pub struct InterruptFlag {
    pending: AtomicBool,
    last_edge_ms: AtomicU32,
}

impl InterruptFlag {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            last_edge_ms: AtomicU32::new(0),
        }
    }

    /// ISR entry point: called on the falling edge of the button pin.
    pub fn on_button_edge(&self, now_ms: u32) {
        let last = self.last_edge_ms.load(Ordering::Relaxed);
        if now_ms.wrapping_sub(last) > DEBOUNCE_WINDOW_MS {
            self.last_edge_ms.store(now_ms, Ordering::Relaxed);
            self.pending.store(true, Ordering::Release);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Main-loop side: acknowledge the event after servicing it.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

/// Button flag instance for the board layer: referenced from the pin-change
/// ISR and passed to `Firmware::new` at startup.
pub static PANIC_BUTTON: InterruptFlag = InterruptFlag::new();
