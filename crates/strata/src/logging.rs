//! # Logging — Sink Setup and Named Channels
//!
//! All logging goes through the [`log`] facade. [`init`] installs an
//! `env_logger` backend once per process and hands back a [`Logs`] value
//! holding the two named channels:
//!
//! ```text
//! Logs
//!   engine: Channel("strata::engine")   ← frame loop, scene, backends
//!   app:    Channel("strata::app")      ← user layers (name configurable)
//! ```
//!
//! A [`Channel`] is just a `Copy` log target, so passing [`Logs`] down
//! through the application and layer contexts costs nothing. Because channel
//! names are ordinary targets, `RUST_LOG=strata::engine=trace` works as
//! expected.
//!
//! Records are formatted as `[elapsed LEVEL channel] message` and written to
//! stderr, an append-mode file, or both.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Log target of the engine channel.
pub const ENGINE_TARGET: &str = "strata::engine";

/// Default log target of the application channel.
pub const APP_TARGET: &str = "strata::app";

/// Logging setup, usually the `log` section of
/// [`AppConfig`](crate::config::AppConfig).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Baseline level. `RUST_LOG` directives are applied on top.
    pub level: LevelFilter,
    /// Write to stderr.
    pub console: bool,
    /// Also append to this file.
    pub file: Option<PathBuf>,
    /// Target name of the application channel.
    pub app_channel: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            console: true,
            file: None,
            app_channel: APP_TARGET.to_string(),
        }
    }
}

/// A named log target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    target: &'static str,
}

impl Channel {
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub fn target(self) -> &'static str {
        self.target
    }

    pub fn enabled(self, level: Level) -> bool {
        log::log_enabled!(target: self.target, level)
    }

    pub fn log(self, level: Level, message: impl fmt::Display) {
        log::log!(target: self.target, level, "{message}");
    }

    pub fn trace(self, message: impl fmt::Display) {
        self.log(Level::Trace, message);
    }

    pub fn debug(self, message: impl fmt::Display) {
        self.log(Level::Debug, message);
    }

    pub fn info(self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    pub fn warn(self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    pub fn error(self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Highest severity. `log` tops out at `Error`, so critical records are
    /// logged there with a `CRITICAL:` prefix.
    pub fn critical(self, message: impl fmt::Display) {
        log::error!(target: self.target, "CRITICAL: {message}");
    }
}

/// The engine and application channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logs {
    pub engine: Channel,
    pub app: Channel,
}

impl Logs {
    /// Channels named by `config`, without installing a sink.
    pub fn from_config(config: &LogConfig) -> Self {
        let app = if config.app_channel == APP_TARGET {
            APP_TARGET
        } else {
            intern(&config.app_channel)
        };
        Self {
            engine: Channel::new(ENGINE_TARGET),
            app: Channel::new(app),
        }
    }
}

/// Channels are `Copy`, so custom targets need a `'static` name. Each
/// distinct name is leaked once and reused afterwards.
fn intern(name: &str) -> &'static str {
    static NAMES: OnceLock<Mutex<Vec<&'static str>>> = OnceLock::new();
    let mut names = NAMES
        .get_or_init(Mutex::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(&known) = names.iter().find(|&&known| known == name) {
        return known;
    }
    let leaked: &'static str = String::leak(name.to_owned());
    names.push(leaked);
    leaked
}

impl Default for Logs {
    fn default() -> Self {
        Self {
            engine: Channel::new(ENGINE_TARGET),
            app: Channel::new(APP_TARGET),
        }
    }
}

/// Writes every record to stderr and/or a file.
struct Tee {
    console: bool,
    file: Option<File>,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.console {
            io::stderr().write_all(buf)?;
        }
        if let Some(file) = &mut self.file {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.console {
            io::stderr().flush()?;
        }
        if let Some(file) = &mut self.file {
            file.flush()?;
        }
        Ok(())
    }
}

/// Install the global logger and return the configured channels.
///
/// A logger can only be installed once per process. If one is already set
/// (another `init`, or a test harness), a warning goes to stderr and the
/// channels are still returned, logging through whatever sink is active.
pub fn init(config: &LogConfig) -> Result<Logs, AppError> {
    let file = match &config.file {
        Some(path) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::Logging(format!("cannot open {}: {e}", path.display())))?,
        ),
        None => None,
    };
    let tee = Tee {
        console: config.console,
        file,
    };

    let start = Instant::now();
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(config.level)
        .parse_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{:>9.3}s {:<5} {}] {}",
                start.elapsed().as_secs_f32(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(tee)));

    if builder.try_init().is_err() {
        eprintln!("[strata] Warning: a logger is already set; keeping it.");
    }
    Ok(Logs::from_config(config))
}
