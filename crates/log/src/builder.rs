//! Subscriber installation.

use tracing_subscriber::EnvFilter;

use crate::config::{Config, Format};
use crate::error::{LogError, LogResult};

/// Logger builder.
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Apply display toggles and install, picking the timer branch at the end
/// because `without_time` changes the builder type.
macro_rules! install {
    ($builder:expr, $display:expr) => {{
        let builder = $builder
            .with_ansi($display.colors)
            .with_target($display.target);
        if $display.time {
            builder.try_init()
        } else {
            builder.without_time().try_init()
        }
    }};
}

impl LoggerBuilder {
    /// Create builder from config.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Validate the filter directive without installing anything.
    pub fn filter(&self) -> LogResult<EnvFilter> {
        EnvFilter::try_new(&self.config.level).map_err(|e| LogError::Filter {
            directive: self.config.level.clone(),
            reason: e.to_string(),
        })
    }

    /// Install the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Filter`] for an unparsable directive and
    /// [`LogError::AlreadyInstalled`] if a global subscriber already exists.
    pub fn build(self) -> LogResult<()> {
        let filter = self.filter()?;
        let display = self.config.display;
        let base = tracing_subscriber::fmt().with_env_filter(filter);

        let installed = match self.config.format {
            Format::Pretty => install!(base.pretty(), display),
            Format::Compact => install!(base.compact(), display),
            Format::Json => install!(base.json(), display),
        };
        installed.map_err(|e| LogError::AlreadyInstalled(e.to_string()))?;

        tracing::debug!(
            level = %self.config.level,
            format = ?self.config.format,
            "logger initialized"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_directive_is_rejected_before_install() {
        let builder = LoggerBuilder::from_config(Config {
            level: "majlis=loud".to_owned(),
            ..Config::default()
        });
        assert!(matches!(builder.filter(), Err(LogError::Filter { .. })));
    }

    #[test]
    fn preset_directives_parse() {
        for config in [Config::default(), Config::development(), Config::production(), Config::test()] {
            LoggerBuilder::from_config(config).filter().unwrap();
        }
    }
}
