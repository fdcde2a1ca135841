// Firmware Core - Serial-to-USB HID Bridge
//
// This crate is the command-processing pipeline of a device that bridges a
// control host to a USB HID target: the host sends framed binary commands
// over the primary serial link, and the firmware decodes, validates,
// queues, and executes them as mouse and keyboard reports. A hardware
// panic button aborts everything at any time.
//
// Pipeline, in data-flow order:
// - `crc` / `parser`: byte stream to validated frame payloads
// - `protocol`: wire constants, opcode table, acknowledgement codes
// - `queue`: bounded FIFO of admitted data-plane commands
// - `executor`: command dispatch plus the single timed-hold slot
// - `interrupt`: the panic-button flag shared with the ISR
// - `stats` / `log`: counters, the 30 s report, and diagnostics
//
// This file owns the glue: the `Firmware` struct ties the pipeline to the
// board-provided collaborators (serial link, HID devices, clock, button
// flag) and drives everything from `tick`, one bounded iteration of the
// main loop.
//
// Design and implementation:
// - Single execution context plus one ISR; the ISR only raises a flag
// - `tick` never blocks: timed holds are deadlines revisited each
//   iteration, never sleeps
// - Control-plane opcodes execute inside the frame-reception path and
//   therefore cannot be starved by a deep queue
// - Acknowledgements describe frame reception, not execution outcome;
//   admitted commands that later fail validation are dropped with a log
//   entry only
//
// Safety stop:
// - The button flag is serviced at the top of each iteration: drain the
//   queue, release everything the firmware may be holding, notify the
//   host with the unsolicited `Interrupted` code, clear the flag

#![cfg_attr(not(test), no_std)]

pub mod build_info;
pub mod crc;
pub mod executor;
pub mod hid;
pub mod interrupt;
pub mod keymap;
pub mod log;
pub mod parser;
pub mod protocol;
pub mod queue;
pub mod serial;
pub mod stats;
pub mod time;

use crate::executor::Executor;
use crate::hid::{KeyboardDevice, MouseDevice};
use crate::interrupt::InterruptFlag;
use crate::log::{LogLevel, Logger};
use crate::parser::{FrameParser, ParseEvent};
use crate::protocol::{Ack, Command, OP_CLEAR_QUEUE, OP_PAUSE_LOG, OP_RESUME_LOG};
use crate::queue::CommandQueue;
use crate::serial::{SerialLink, BAUD_RATE, LINK_FORMAT};
use crate::stats::{Stats, StatsReporter};
use crate::time::Clock;

const LOG_INIT: &str = "init";
const LOG_LINK: &str = "link";
const LOG_QUEUE: &str = "queue";
const LOG_BUTTON: &str = "button";

/// The assembled pipeline plus its board-provided collaborators.
pub struct Firmware<'a, S, M, K>
where
    S: SerialLink,
    M: MouseDevice,
    K: KeyboardDevice,
{
    clock: &'a dyn Clock,
    button: &'a InterruptFlag,
    serial: S,
    mouse: M,
    keyboard: K,
    logger: Logger,
    parser: FrameParser,
    queue: CommandQueue,
    executor: Executor,
    stats: Stats,
    reporter: StatsReporter,
}

impl<'a, S, M, K> Firmware<'a, S, M, K>
where
    S: SerialLink,
    M: MouseDevice,
    K: KeyboardDevice,
{
    pub fn new(
        clock: &'a dyn Clock,
        button: &'a InterruptFlag,
        serial: S,
        mouse: M,
        keyboard: K,
    ) -> Self {
        let logger = Logger::new();
        let now_ms = clock.now_ms();
        log_info!(logger, now_ms, LOG_INIT, "{}", build_info::BOOT_BANNER);
        log_info!(
            logger,
            now_ms,
            LOG_INIT,
            "primary link up: {} baud, {}",
            BAUD_RATE,
            LINK_FORMAT
        );

        Self {
            clock,
            button,
            serial,
            mouse,
            keyboard,
            logger,
            parser: FrameParser::new(),
            queue: CommandQueue::new(),
            executor: Executor::new(),
            stats: Stats::new(),
            reporter: StatsReporter::new(),
        }
    }

    /// One bounded main-loop iteration. The board layer calls this from
    /// `loop { firmware.tick(); }`.
    pub fn tick(&mut self) {
        let now_ms = self.clock.now_ms();

        // Safety stop first: bounded latency no matter how deep the queue
        // or how long the current hold.
        if self.button.is_pending() {
            self.service_interrupt(now_ms);
        }

        while let Some(byte) = self.serial.read_byte() {
            if let Some(event) = self.parser.feed(byte) {
                self.on_frame_event(event, now_ms);
            }
        }

        if self.executor.timed_active() {
            self.executor
                .poll_timed(now_ms, &mut self.mouse, &mut self.keyboard, &self.logger);
        } else if !self.button.is_pending() {
            if let Some(cmd) = self.queue.pop() {
                self.executor.run(
                    &cmd,
                    now_ms,
                    &mut self.mouse,
                    &mut self.keyboard,
                    self.button,
                    &self.logger,
                    &mut self.stats,
                );
            }
        }

        self.reporter
            .poll(now_ms, &mut self.stats, self.queue.len(), &self.logger);
    }

    /// Panic-button servicing: discard all queued and in-flight work,
    /// release everything, notify the host.
    fn service_interrupt(&mut self, now_ms: u32) {
        self.logger.log_forced(
            now_ms,
            LogLevel::Warn,
            LOG_BUTTON,
            format_args!("panic button pressed, discarding all in-flight work"),
        );

        let dropped = self.queue.clear();
        if dropped > 0 {
            log_info!(
                self.logger,
                now_ms,
                LOG_BUTTON,
                "{} queued commands discarded",
                dropped
            );
        }

        self.keyboard.release_all();
        self.mouse.release(hid::BUTTON_ALL);
        if self.executor.cancel_timed(&mut self.mouse, &mut self.keyboard) {
            log_debug!(self.logger, now_ms, LOG_BUTTON, "timed hold cancelled");
        }

        self.serial.write_byte(Ack::Interrupted.code());
        self.button.clear();
    }

    fn on_frame_event(&mut self, event: ParseEvent, now_ms: u32) {
        match event {
            ParseEvent::Frame(payload) => {
                self.stats.record_frame();
                let ack = self.dispatch(&payload, now_ms);
                self.send_ack(ack);
            }
            ParseEvent::EmptyFrame => {
                self.stats.record_frame();
                self.stats.record_error();
                log_warn!(self.logger, now_ms, LOG_LINK, "frame with zero-length payload");
                self.send_ack(Ack::ParamError);
            }
            ParseEvent::InvalidLength { len } => {
                self.stats.record_frame();
                self.stats.record_error();
                log_warn!(
                    self.logger,
                    now_ms,
                    LOG_LINK,
                    "length byte {} exceeds the payload cap",
                    len
                );
                self.send_ack(Ack::ParamError);
            }
            ParseEvent::CrcMismatch { expected, received } => {
                self.stats.record_frame();
                self.stats.record_error();
                log_warn!(
                    self.logger,
                    now_ms,
                    LOG_LINK,
                    "CRC mismatch: expected 0x{:02X}, received 0x{:02X}",
                    expected,
                    received
                );
                self.send_ack(Ack::CrcError);
            }
        }
    }

    /// Dispatch policy for a CRC-valid payload. Control-plane opcodes run
    /// here, synchronously; everything else is admitted to the queue.
    fn dispatch(&mut self, payload: &[u8], now_ms: u32) -> Ack {
        let (opcode, params) = match payload.split_first() {
            Some((&opcode, params)) => (opcode, params),
            None => {
                self.stats.record_error();
                log_warn!(self.logger, now_ms, LOG_LINK, "frame with zero-length payload");
                return Ack::ParamError;
            }
        };

        match opcode {
            OP_PAUSE_LOG => {
                self.logger.pause();
                self.logger.log_forced(
                    now_ms,
                    LogLevel::Info,
                    LOG_LINK,
                    format_args!("log output paused by host"),
                );
                Ack::Success
            }
            OP_RESUME_LOG => {
                self.logger.resume();
                self.logger.log_forced(
                    now_ms,
                    LogLevel::Info,
                    LOG_LINK,
                    format_args!("log output resumed by host"),
                );
                Ack::Success
            }
            OP_CLEAR_QUEUE => {
                let dropped = self.queue.clear();
                log_info!(
                    self.logger,
                    now_ms,
                    LOG_QUEUE,
                    "queue cleared by host, {} commands dropped",
                    dropped
                );
                Ack::Success
            }
            _ => {
                if self.queue.is_full() {
                    self.stats.record_error();
                    log_warn!(
                        self.logger,
                        now_ms,
                        LOG_QUEUE,
                        "queue full, dropping frame with opcode 0x{:02X}",
                        opcode
                    );
                    return Ack::ParamError;
                }
                self.queue.push(Command::new(opcode, params, now_ms));
                Ack::Success
            }
        }
    }

    /// Exactly one solicited acknowledgement per completed frame.
    fn send_ack(&mut self, ack: Ack) {
        self.serial.write_byte(ack.code());
        if ack == Ack::Success {
            self.stats.record_ack_ok();
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn timed_action_active(&self) -> bool {
        self.executor.timed_active()
    }

    pub fn logging_enabled(&self) -> bool {
        self.logger.is_enabled()
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn mouse(&self) -> &M {
        &self.mouse
    }

    pub fn mouse_mut(&mut self) -> &mut M {
        &mut self.mouse
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut K {
        &mut self.keyboard
    }
}
