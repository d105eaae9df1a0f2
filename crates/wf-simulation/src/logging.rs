use env_logger::{Builder, Env};
use log::LevelFilter;

/// Environment variable read for the log filter, falling back to `RUST_LOG`.
pub const LOG_ENV: &str = "WAYFINDER_LOG";

/// Install `env_logger` as the global logger.
///
/// `verbose` selects the default level (debug instead of info) when neither
/// [`LOG_ENV`] nor `RUST_LOG` is set. Returns `false` if a logger was
/// already installed, so repeated calls from tests are harmless.
pub fn init(verbose: bool) -> bool {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let fallback = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    let env = Env::default().filter_or(LOG_ENV, fallback);

    Builder::from_env(env)
        .format_timestamp(None)
        .format_target(true)
        .try_init()
        .is_ok()
}
