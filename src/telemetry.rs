//! Tracing initialisation for the reporter's internal diagnostics.
//!
//! Verbose tracing is switched on by the reserved `debug` key rather than by
//! any option. Output goes to stderr so it never mixes with report lines.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// `debug = true` selects `DEBUG`, otherwise only warnings and errors are
/// shown. `RUST_LOG`, when set, takes precedence.
///
/// Safe to call more than once; only the first call takes effect.
pub fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        init_tracing(true);
        init_tracing(false);
    }
}
