//! Minimal stderr logger for the CLI binary.
//!
//! Level comes from `RUST_LOG`, colors are suppressed when `NO_COLOR` is
//! set. The library itself only depends on the `log` facade.

use std::io::Write;

use log::{Level, LevelFilter, Log, Metadata, Record};

pub struct Logger {
    level: Level,
    colors: bool,
}

impl Logger {
    fn color(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[36m",
            Level::Debug => "\x1b[35m",
            Level::Trace => "\x1b[37m",
        }
    }

    /// Install the logger, reading the level from the environment.
    pub fn init() -> Result<(), log::SetLoggerError> {
        let level = std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "warn".to_string())
            .parse::<Level>()
            .unwrap_or(Level::Warn);

        let logger = Logger {
            level,
            colors: std::env::var("NO_COLOR").is_err(),
        };

        log::set_max_level(LevelFilter::Trace);
        log::set_logger(Box::leak(Box::new(logger)))
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = if self.colors {
            format!(
                "{}{}\x1b[0m {}\n",
                Self::color(record.level()),
                record.level(),
                record.args()
            )
        } else {
            format!("{} {}\n", record.level(), record.args())
        };

        let _ = std::io::stderr().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
