// Diagnostic Logging Subsystem
//
// Implements the firmware's structured logging, providing multi-level,
// timestamped entries on the auxiliary serial channel for diagnostics
// during bring-up and operation.
//
// Key responsibilities:
// - Provide standardized log levels (Debug, Info, Warn, Error)
// - Attach timestamps and subsystem origin to every entry
// - Include source location only for DEBUG entries (file:line)
// - Honor the host-controlled pause/resume switch for routine output
// - Carry the state-change and panic-button notices unconditionally
//
// Design principles:
// - Best-effort and side-effect-only: a missing or slow sink never
//   affects the command pipeline or the acknowledgement protocol
// - Early-boot friendly: entries before a sink is installed are dropped
// - Minimal formatting logic inside the hot path
//
// Implementation details:
// - The sink is a process-wide singleton behind a spinlock, installed
//   once by the board layer on top of the auxiliary UART
// - `Logger` holds the runtime state the host can toggle: the enabled
//   flag targeted by the pause/resume control commands, and the level
//   filter
// - Each entry includes severity, timestamp, subsystem origin, and message
//
// Developer ergonomics:
// - Convenience macros (`log_debug!`, `log_info!`, etc.) wrap `Logger::log`
// - Macros automatically capture `file!()` and `line!()` for debug context

use core::fmt;
use spin::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO ",
            LogLevel::Warn => "WARN ",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Outbound text channel for diagnostics. The board layer implements this
/// on the auxiliary UART; tests may install a capturing sink.
pub trait LogSink: Send {
    fn write_str(&mut self, s: &str);
}

static SINK: Mutex<Option<&'static mut dyn LogSink>> = Mutex::new(None);

/// Install the process-wide log sink. Later calls replace the sink.
pub fn set_sink(sink: &'static mut dyn LogSink) {
    *SINK.lock() = Some(sink);
}

struct SinkWriter<'a>(&'a mut dyn LogSink);

impl fmt::Write for SinkWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

/// Runtime logging state owned by the firmware instance.
pub struct Logger {
    enabled: bool,
    level: LogLevel,
}

impl Logger {
    pub const fn new() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Info,
        }
    }

    pub fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    /// Suppress routine output. Unconditional notices keep flowing.
    pub fn pause(&mut self) {
        self.enabled = false;
    }

    pub fn resume(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log(
        &self,
        now_ms: u32,
        level: LogLevel,
        origin: &str,
        args: fmt::Arguments,
        file: &'static str,
        line: u32,
    ) {
        if !self.enabled || level < self.level {
            return;
        }
        let location = if level == LogLevel::Debug {
            Some((file, line))
        } else {
            None
        };
        emit(now_ms, level, origin, args, location);
    }

    /// Emit regardless of the pause switch and level filter. Reserved for
    /// the pause/resume state changes and the panic-button notice.
    pub fn log_forced(&self, now_ms: u32, level: LogLevel, origin: &str, args: fmt::Arguments) {
        emit(now_ms, level, origin, args, None);
    }
}

fn emit(
    now_ms: u32,
    level: LogLevel,
    origin: &str,
    args: fmt::Arguments,
    location: Option<(&'static str, u32)>,
) {
    use core::fmt::Write;

    let mut guard = SINK.lock();
    let sink = match guard.as_mut() {
        Some(sink) => sink,
        None => return,
    };
    let mut writer = SinkWriter(&mut **sink);

    let seconds = now_ms / 1000;
    let milliseconds = now_ms % 1000;

    let _ = match location {
        Some((file, line)) => writer.write_fmt(format_args!(
            "[t={}.{:03}s] [{}] [{}] {} ({}:{})\n",
            seconds,
            milliseconds,
            level.as_str(),
            origin,
            args,
            file,
            line
        )),
        None => writer.write_fmt(format_args!(
            "[t={}.{:03}s] [{}] [{}] {}\n",
            seconds,
            milliseconds,
            level.as_str(),
            origin,
            args
        )),
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $now:expr, $origin:expr, $($arg:tt)*) => {
        $logger.log(
            $now,
            $crate::log::LogLevel::Debug,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $now:expr, $origin:expr, $($arg:tt)*) => {
        $logger.log(
            $now,
            $crate::log::LogLevel::Info,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $now:expr, $origin:expr, $($arg:tt)*) => {
        $logger.log(
            $now,
            $crate::log::LogLevel::Warn,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $now:expr, $origin:expr, $($arg:tt)*) => {
        $logger.log(
            $now,
            $crate::log::LogLevel::Error,
            $origin,
            format_args!($($arg)*),
            file!(),
            line!()
        )
    };
}
