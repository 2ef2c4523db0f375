/*!

Logging for model runs. The crate logs through the `log` facade and installs a `log4rs` console
appender on request. Nothing is printed until `enable_logging()` (or `set_log_level()`) is called.

Levels used by the engine:
 - `info`: initialization summaries
 - `debug`: one line per step
 - `trace`: every compartment transition and agent removal

*/

pub use log::{debug, error, info, trace, warn, LevelFilter};

use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    Handle,
};
use std::sync::{Mutex, MutexGuard, OnceLock};

const DEFAULT_LOG_PATTERN: &str = "{h({l})} {M} - {m}{n}";
const CONSOLE_APPENDER: &str = "stdout";

// The handle lets later calls reconfigure the logger `log4rs` already installed.
static LOG_HANDLE: OnceLock<Mutex<Option<Handle>>> = OnceLock::new();

fn handle_guard() -> MutexGuard<'static, Option<Handle>> {
    LOG_HANDLE
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn build_config(level: LevelFilter) -> Config {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(stdout)))
        .build(Root::builder().appender(CONSOLE_APPENDER).build(level))
        // Only fails on duplicate or dangling appender names, which cannot happen here.
        .expect("static logging configuration is valid")
}

/// Sets the maximum level that is printed, installing the console logger if necessary.
pub fn set_log_level(level: LevelFilter) {
    let mut guard = handle_guard();
    let config = build_config(level);

    match guard.as_ref() {
        Some(handle) => handle.set_config(config),
        None => match log4rs::init_config(config) {
            Ok(handle) => *guard = Some(handle),
            // Another logger owns the facade; leave it alone.
            Err(_) => log::set_max_level(level),
        },
    }
}

/// Prints `info` and above to the console.
pub fn enable_logging() {
    set_log_level(LevelFilter::Info);
}

pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_can_be_reconfigured() {
        enable_logging();
        assert_eq!(log::max_level(), LevelFilter::Info);

        set_log_level(LevelFilter::Trace);
        assert_eq!(log::max_level(), LevelFilter::Trace);
        trace!("trace output is visible");

        disable_logging();
        assert_eq!(log::max_level(), LevelFilter::Off);
    }
}
