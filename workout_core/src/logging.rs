//! Tracing setup for `wtimer`.
//!
//! Playback draws its countdown on stdout and `export` may print CSV there,
//! so every log line goes to stderr. The binary stays quiet (`warn`) unless
//! `--verbose` asks for `debug`; `RUST_LOG` overrides both.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter for the CLI's `--verbose` flag
pub fn level_for(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install the stderr subscriber for the CLI
pub fn init_for_cli(verbose: bool) {
    init_with_level(level_for(verbose))
}

/// Install the stderr subscriber with `default_level` unless `RUST_LOG` is set
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Route logs through the test harness; safe to call from every test
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_selects_level() {
        assert_eq!(level_for(false), "warn");
        assert_eq!(level_for(true), "debug");
    }
}
