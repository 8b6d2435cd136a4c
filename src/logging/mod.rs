/**
 * Logger setup
 *
 * https://docs.rs/slog/latest/slog/
 *
 */
use std::sync::Mutex;

use crate::config::Settings;
use slog::{o, Drain, LevelFilter, Logger};
use slog_async::Async;
use slog_term::FullFormat;

/**
 * Initializes the root logger.
 *
 * Records are formatted for the terminal and written from a background thread;
 * anything below the configured level is dropped before it is queued.
 *
 * @param cfg The configuration settings containing the log level.
 * @return A `Logger` instance configured with the specified log level.
 */
pub fn init_logger(cfg: &Settings) -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = Async::new(drain).build().fuse();

    let drain = LevelFilter::new(drain, cfg.log_level).fuse();
    Logger::root(
        Mutex::new(drain).fuse(),
        o!("environment" => cfg.environment.as_str()),
    )
}

/// Child logger tagged with the component that owns it
pub fn component(logger: &Logger, name: &'static str) -> Logger {
    logger.new(o!("component" => name))
}
