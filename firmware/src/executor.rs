// Command Executor and Timed-Action Slot
//
// Drains the command queue one command per main-loop invocation and turns
// each into HID driver calls. Owns the single in-flight timed hold: a
// "press for N milliseconds" command records a deadline here and the main
// loop polls it, so nothing ever sleeps inside the pipeline.
//
// Key responsibilities:
// - Decode and validate opcode and parameter arity at execution time
// - Drive the mouse and keyboard capabilities for every data-plane opcode
// - Hold at most one timed press and release it when its deadline passes
// - Observe the panic-button flag between the bytes of a text print
//
// Validation policy:
// - The host already received its acknowledgement at admission, so a bad
//   command is dropped with a log entry and an error count, nothing else
//
// Timing policy:
// - A timed press must only start when the slot is free; the main loop
//   guarantees this by not invoking `run` while a hold is active
// - Expiry releases exactly the held target through the matching device
// - The panic-button servicing cancels the hold between iterations

use crate::hid::{KeyboardDevice, MouseDevice};
use crate::interrupt::InterruptFlag;
use crate::keymap::{ButtonLabel, KeyLabel};
use crate::log::Logger;
use crate::protocol::{Command, Opcode};
use crate::stats::Stats;
use crate::time::elapsed_ms;
use crate::{log_debug, log_warn};

const LOG_EXEC: &str = "exec";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedKind {
    Mouse,
    Keyboard,
}

/// The one in-flight "hold for N ms" operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedAction {
    pub kind: TimedKind,
    /// Button mask or key code, depending on `kind`.
    pub target: u8,
    pub start_ms: u32,
    pub duration_ms: u32,
}

pub struct Executor {
    timed: Option<TimedAction>,
}

impl Executor {
    pub const fn new() -> Self {
        Self { timed: None }
    }

    pub fn timed_active(&self) -> bool {
        self.timed.is_some()
    }

    pub fn timed_action(&self) -> Option<TimedAction> {
        self.timed
    }

    /// Execute one dequeued command. Must not be called while a timed hold
    /// is active.
    pub fn run(
        &mut self,
        cmd: &Command,
        now_ms: u32,
        mouse: &mut dyn MouseDevice,
        keyboard: &mut dyn KeyboardDevice,
        button: &InterruptFlag,
        logger: &Logger,
        stats: &mut Stats,
    ) {
        debug_assert!(self.timed.is_none());

        let opcode = match Opcode::from_u8(cmd.opcode) {
            Some(opcode) => opcode,
            None => {
                stats.record_error();
                log_warn!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "dropping unknown opcode 0x{:02X} ({} param bytes)",
                    cmd.opcode,
                    cmd.params.len()
                );
                return;
            }
        };
        if !opcode.params_ok(cmd.params.len()) {
            stats.record_error();
            log_warn!(
                logger,
                now_ms,
                LOG_EXEC,
                "dropping opcode 0x{:02X}: bad parameter length {}",
                cmd.opcode,
                cmd.params.len()
            );
            return;
        }

        let params = cmd.params.as_slice();
        let dwell = elapsed_ms(now_ms, cmd.enqueued_at_ms);

        match opcode {
            Opcode::MouseMove => {
                let dx = params[0] as i8;
                let dy = params[1] as i8;
                let wheel = params[2] as i8;
                mouse.move_rel(dx, dy, wheel);
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "mouse move dx={} dy={} wheel={} (queued {}ms)",
                    dx,
                    dy,
                    wheel,
                    dwell
                );
            }
            Opcode::MousePress => {
                mouse.press(params[0]);
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "mouse press {}",
                    ButtonLabel(params[0])
                );
            }
            Opcode::MouseRelease => {
                mouse.release(params[0]);
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "mouse release {}",
                    ButtonLabel(params[0])
                );
            }
            Opcode::MouseClick => {
                mouse.click(params[0]);
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "mouse click {}",
                    ButtonLabel(params[0])
                );
            }
            Opcode::MousePressTimed => {
                let duration_ms = u16::from_be_bytes([params[1], params[2]]) as u32;
                mouse.press(params[0]);
                self.timed = Some(TimedAction {
                    kind: TimedKind::Mouse,
                    target: params[0],
                    start_ms: now_ms,
                    duration_ms,
                });
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "holding mouse {} for {}ms",
                    ButtonLabel(params[0]),
                    duration_ms
                );
            }
            Opcode::KbPress => {
                keyboard.press(params[0]);
                log_debug!(logger, now_ms, LOG_EXEC, "key press {}", KeyLabel(params[0]));
            }
            Opcode::KbRelease => {
                keyboard.release(params[0]);
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "key release {}",
                    KeyLabel(params[0])
                );
            }
            Opcode::KbWrite => {
                keyboard.write(params[0]);
                log_debug!(logger, now_ms, LOG_EXEC, "key write {}", KeyLabel(params[0]));
            }
            Opcode::KbReleaseAll => {
                keyboard.release_all();
                log_debug!(logger, now_ms, LOG_EXEC, "release all keys");
            }
            Opcode::KbPrint => {
                // The one opcode that watches the panic button mid-flight:
                // a print can be up to 30 keystrokes long.
                let mut written = 0;
                for &byte in params {
                    if button.is_pending() {
                        break;
                    }
                    keyboard.write(byte);
                    written += 1;
                }
                if written < params.len() {
                    log_warn!(
                        logger,
                        now_ms,
                        LOG_EXEC,
                        "print aborted after {} of {} bytes",
                        written,
                        params.len()
                    );
                } else {
                    log_debug!(logger, now_ms, LOG_EXEC, "printed {} bytes", written);
                }
            }
            Opcode::KbPressTimed => {
                let duration_ms = u16::from_be_bytes([params[1], params[2]]) as u32;
                keyboard.press(params[0]);
                self.timed = Some(TimedAction {
                    kind: TimedKind::Keyboard,
                    target: params[0],
                    start_ms: now_ms,
                    duration_ms,
                });
                log_debug!(
                    logger,
                    now_ms,
                    LOG_EXEC,
                    "holding key {} for {}ms",
                    KeyLabel(params[0]),
                    duration_ms
                );
            }
        }
    }

    /// Release the held target once its deadline has passed. Called every
    /// main-loop iteration while a hold is active.
    pub fn poll_timed(
        &mut self,
        now_ms: u32,
        mouse: &mut dyn MouseDevice,
        keyboard: &mut dyn KeyboardDevice,
        logger: &Logger,
    ) {
        if let Some(action) = self.timed {
            if elapsed_ms(now_ms, action.start_ms) < action.duration_ms {
                return;
            }
            release_target(&action, mouse, keyboard);
            self.timed = None;
            log_debug!(
                logger,
                now_ms,
                LOG_EXEC,
                "timed hold released after {}ms",
                action.duration_ms
            );
        }
    }

    /// Immediately release and clear the hold, if any. Used by the
    /// panic-button servicing path.
    pub fn cancel_timed(
        &mut self,
        mouse: &mut dyn MouseDevice,
        keyboard: &mut dyn KeyboardDevice,
    ) -> bool {
        match self.timed.take() {
            Some(action) => {
                release_target(&action, mouse, keyboard);
                true
            }
            None => false,
        }
    }
}

fn release_target(
    action: &TimedAction,
    mouse: &mut dyn MouseDevice,
    keyboard: &mut dyn KeyboardDevice,
) {
    match action.kind {
        TimedKind::Mouse => mouse.release(action.target),
        TimedKind::Keyboard => keyboard.release(action.target),
    }
}
