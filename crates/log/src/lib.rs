#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! # Majlis Log
//!
//! One place to install the `tracing` subscriber for Majlis binaries and
//! test suites.
//!
//! ```no_run
//! use majlis_log::{Config, LoggerBuilder};
//!
//! LoggerBuilder::from_config(Config::from_env()).build()?;
//! tracing::info!("ready");
//! # Ok::<(), majlis_log::LogError>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;

pub use builder::LoggerBuilder;
pub use config::{Config, DisplayConfig, Format};
pub use error::{LogError, LogResult};

/// Install a subscriber from the environment.
pub fn init() -> LogResult<()> {
    LoggerBuilder::from_config(Config::from_env()).build()
}

/// Install the test preset, honouring `MAJLIS_LOG`/`RUST_LOG` when set.
///
/// Safe to call from every test: only the first call installs. An
/// unparsable directive is reported on stderr and the preset's own filter
/// is used instead.
pub fn init_test() {
    let config = test_config(|key| std::env::var(key).ok());
    if let Err(err) = install_test(config) {
        eprintln!("majlis-log: {err}; using the default test filter");
        if let Err(err) = install_test(Config::test()) {
            eprintln!("majlis-log: {err}");
        }
    }
}

fn test_config(lookup: impl Fn(&str) -> Option<String>) -> Config {
    let mut preset = Config::test();
    if let Some(level) = lookup(config::LEVEL_ENV).or_else(|| lookup("RUST_LOG")) {
        preset.level = level;
    }
    preset
}

/// Install `config`, treating an existing global subscriber as success.
fn install_test(config: Config) -> LogResult<()> {
    match LoggerBuilder::from_config(config).build() {
        Err(LogError::AlreadyInstalled(_)) => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_config_takes_level_from_env() {
        let config = test_config(|key| (key == "RUST_LOG").then(|| "warn".to_owned()));
        assert_eq!(config.level, "warn");
        assert_eq!(test_config(|_| None), Config::test());
    }

    #[test]
    fn bad_test_filter_is_reported() {
        let noisy = test_config(|key| {
            (key == config::LEVEL_ENV).then(|| "majlis=loud".to_owned())
        });
        assert!(matches!(install_test(noisy), Err(LogError::Filter { .. })));
    }

    #[test]
    fn repeated_installs_are_tolerated() {
        install_test(Config::test()).unwrap();
        install_test(Config::test()).unwrap();
    }
}
