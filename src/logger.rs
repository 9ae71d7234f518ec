//! Logger.
//!
//! The library only logs through the [`log`] facade. This module provides a small terminal
//! logger for binaries: timestamped, coloured lines written to stderr.

use chrono::{Datelike, Local, Timelike};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if !self.enabled(record.metadata()) {
      return;
    }

    eprintln!("\x1b[90m{} {}> {}\x1b[0m", now(), level_color(record.level()), record.args());
  }

  fn flush(&self) {}
}

fn level_color(level: Level) -> &'static str {
  match level {
    Level::Error => "\x1b[31m",
    Level::Warn => "\x1b[33m",
    Level::Info => "\x1b[34m",
    Level::Debug => "\x1b[36m",
    Level::Trace => "\x1b[90m"
  }
}

/// Install the stderr logger, letting records up to `level` through.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER)?;
  log::set_max_level(level);
  Ok(())
}

/// Map a count of `-v` flags to a level filter.
pub fn verbosity(count: u64) -> LevelFilter {
  match count {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace
  }
}

pub fn now() -> String {
  let t = Local::now();

  format!("{month:0>2}/{day:0>2}/{year} {hour:0>2}:{min:0>2}:{secs:0>2}:{nsecs:0>9}",
          month = t.month(),
          day = t.day(),
          year = t.year(),
          hour = t.hour(),
          min = t.minute(),
          secs = t.second(),
          nsecs = t.nanosecond())
}
