//! Console settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::diagnostics::DEFAULT_LOG_FILE;
use crate::prime::MAX_TARGET_BITS;
use crate::{Error, OutputMode, ProbablePrimeGenerator, Result};

/// Settings for a console prime search session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How many primes to find.
    pub quantity: u32,
    /// Target size of each prime in bits.
    pub prime_bit_size: u64,
    /// Compact output file format and minimal console text.
    pub silent_mode: bool,
    /// How often the controller polls the worker, in milliseconds.
    pub poll_interval_ms: u64,
    /// File found primes are appended to.
    pub output_file: PathBuf,
    /// Diagnostic log destination.
    pub log_file: PathBuf,
    /// Whether the diagnostic log starts enabled.
    pub logging_enabled: bool,
    /// Miller-Rabin rounds per candidate.
    pub primality_rounds: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quantity: 1,
            prime_bit_size: 512,
            silent_mode: false,
            poll_interval_ms: 100,
            output_file: PathBuf::from("Primes.txt"),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            logging_enabled: false,
            primality_rounds: ProbablePrimeGenerator::DEFAULT_ROUNDS,
        }
    }
}

impl Settings {
    /// Loads settings from `.env`, a TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables with the `PRIME_` prefix (e.g. `PRIME_QUANTITY=5`)
    /// 2. TOML file at `PRIME_CONFIG_PATH`, default `config/prime.toml`
    /// 3. `.env` file, searched from the current directory upwards
    /// 4. Built-in defaults
    ///
    /// A missing `.env` or TOML file is not an error.
    ///
    /// # Environment Variable Examples
    /// ```bash
    /// PRIME_QUANTITY=10
    /// PRIME_PRIME_BIT_SIZE=1024
    /// PRIME_SILENT_MODE=true
    /// PRIME_POLL_INTERVAL_MS=50
    /// PRIME_OUTPUT_FILE=/tmp/primes.txt
    /// PRIME_LOGGING_ENABLED=true
    /// ```
    ///
    /// # Errors
    /// Returns an error if a source is malformed or holds a value of the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> figment::error::Result<Self> {
        let _ = dotenvy::dotenv();

        let config_path =
            std::env::var("PRIME_CONFIG_PATH").unwrap_or_else(|_| "config/prime.toml".to_string());

        Self::figment(&config_path).extract()
    }

    /// The layered figment behind [`Settings::from_env`].
    pub fn figment(config_path: &str) -> figment::Figment {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("PRIME_"))
    }

    /// Checks the values a search cannot run with.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.quantity == 0 {
            return Err(Error::InvalidArgument(
                "quantity cannot be zero".to_string(),
            ));
        }
        if !(2..=MAX_TARGET_BITS).contains(&self.prime_bit_size) {
            return Err(Error::InvalidArgument(format!(
                "prime_bit_size must be between 2 and {MAX_TARGET_BITS}, got {}",
                self.prime_bit_size
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidArgument(
                "poll_interval_ms cannot be zero".to_string(),
            ));
        }
        if self.primality_rounds == 0 {
            return Err(Error::InvalidArgument(
                "primality_rounds cannot be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Output file format implied by `silent_mode`.
    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        if self.silent_mode {
            OutputMode::Compact
        } else {
            OutputMode::Verbose
        }
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.output_mode(), OutputMode::Verbose);
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let cases = [
            Settings {
                quantity: 0,
                ..Settings::default()
            },
            Settings {
                prime_bit_size: 1,
                ..Settings::default()
            },
            Settings {
                prime_bit_size: MAX_TARGET_BITS + 1,
                ..Settings::default()
            },
            Settings {
                prime_bit_size: 100_000_000_000,
                ..Settings::default()
            },
            Settings {
                poll_interval_ms: 0,
                ..Settings::default()
            },
            Settings {
                primality_rounds: 0,
                ..Settings::default()
            },
        ];
        for settings in cases {
            assert!(matches!(
                settings.validate(),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn silent_mode_selects_compact_output() {
        let settings = Settings {
            silent_mode: true,
            ..Settings::default()
        };
        assert_eq!(settings.output_mode(), OutputMode::Compact);
    }

    #[test]
    fn env_overrides_toml_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "prime.toml",
                r#"
                    quantity = 3
                    prime_bit_size = 256
                    silent_mode = true
                "#,
            )?;
            jail.set_env("PRIME_QUANTITY", "7");

            let settings: Settings = Settings::figment("prime.toml").extract()?;
            assert_eq!(settings.quantity, 7);
            assert_eq!(settings.prime_bit_size, 256);
            assert!(settings.silent_mode);
            assert_eq!(settings.poll_interval_ms, 100);
            Ok(())
        });
    }

    #[test]
    fn missing_toml_file_falls_back_to_defaults() {
        Jail::expect_with(|_jail| {
            let settings: Settings = Settings::figment("does-not-exist.toml").extract()?;
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }
}
