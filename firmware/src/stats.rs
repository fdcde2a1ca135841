// Link Statistics and Periodic Reporter
//
// Lightweight counters written by the frame path and the executor, plus a
// reporter that emits a statistics block on the log channel every 30
// seconds and resets the counters for the next window.
//
// Implementation details:
// - Counters are plain integers owned by the firmware instance; only the
//   main loop touches them
// - The success rate is integer percent of successful acknowledgements
//   over frames seen in the window, `N/A` when no frames arrived
// - Uptime is derived from the same monotonic millisecond counter as
//   everything else and shown split into h/m/s

use crate::log::Logger;
use crate::log_info;
use crate::queue::QUEUE_CAPACITY;
use crate::time::elapsed_ms;

pub const REPORT_INTERVAL_MS: u32 = 30_000;

const LOG_STATS: &str = "stats";

/// Per-window counters. Reset after each report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Frames that completed parsing, valid or not.
    pub frames: u32,
    /// `ACK_SUCCESS` responses sent.
    pub acks_ok: u32,
    /// Error events across the pipeline (framing, admission, execution).
    pub errors: u32,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            frames: 0,
            acks_ok: 0,
            errors: 0,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames = self.frames.wrapping_add(1);
    }

    pub fn record_ack_ok(&mut self) {
        self.acks_ok = self.acks_ok.wrapping_add(1);
    }

    pub fn record_error(&mut self) {
        self.errors = self.errors.wrapping_add(1);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

pub struct StatsReporter {
    last_report_ms: u32,
}

impl StatsReporter {
    pub const fn new() -> Self {
        Self { last_report_ms: 0 }
    }

    /// Emit the statistics block when the interval has elapsed, then reset
    /// the window counters.
    pub fn poll(&mut self, now_ms: u32, stats: &mut Stats, queue_len: usize, logger: &Logger) {
        if elapsed_ms(now_ms, self.last_report_ms) < REPORT_INTERVAL_MS {
            return;
        }
        self.last_report_ms = now_ms;

        let seconds_total = now_ms / 1000;
        let hours = seconds_total / 3600;
        let minutes = (seconds_total / 60) % 60;
        let seconds = seconds_total % 60;

        log_info!(logger, now_ms, LOG_STATS, "---- link statistics ----");
        log_info!(
            logger,
            now_ms,
            LOG_STATS,
            "uptime: {}h {:02}m {:02}s",
            hours,
            minutes,
            seconds
        );
        log_info!(logger, now_ms, LOG_STATS, "frames: {}", stats.frames);
        log_info!(logger, now_ms, LOG_STATS, "acks ok: {}", stats.acks_ok);
        log_info!(logger, now_ms, LOG_STATS, "errors: {}", stats.errors);
        if stats.frames > 0 {
            let rate = stats.acks_ok.saturating_mul(100) / stats.frames;
            log_info!(logger, now_ms, LOG_STATS, "success rate: {}%", rate);
        } else {
            log_info!(logger, now_ms, LOG_STATS, "success rate: N/A");
        }
        log_info!(
            logger,
            now_ms,
            LOG_STATS,
            "queue: {}/{}",
            queue_len,
            QUEUE_CAPACITY
        );
        log_info!(logger, now_ms, LOG_STATS, "-------------------------");

        stats.reset();
    }
}
