use std::{
    env,
    net::{AddrParseError, SocketAddr},
    str::FromStr,
};

use runtime::SessionConfig;
use thiserror::Error;
use wagers::WagerConfig;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ASSET: &str = "BTC";
const DEFAULT_INITIAL_BALANCE: f64 = 1_000.0;
const DEFAULT_PAYOUT_MULTIPLIER: f64 = 1.75;
const DEFAULT_CANDLE_INTERVAL_MS: i64 = 1_000;
const MAX_CANDLE_INTERVAL_MS: i64 = 86_400_000;
const DEFAULT_JOURNAL_OUTPUT_PATH: &str = "artifacts/journal.csv";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub asset: String,
    /// Fixed RNG seed; `None` derives one from the wall clock.
    pub seed: Option<u64>,
    pub initial_balance: f64,
    pub payout_multiplier: f64,
    pub candle_interval_ms: i64,
    pub journal_output_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SIM_SERVER_ADDR is not a valid socket address: {0}")]
    InvalidListenAddr(#[source] AddrParseError),
    #[error("SIM_ASSET must not be empty or whitespace")]
    InvalidAsset,
    #[error("SIM_SEED must be an unsigned 64-bit integer")]
    InvalidSeed,
    #[error("SIM_INITIAL_BALANCE must be a finite, non-negative number")]
    InvalidInitialBalance,
    #[error("SIM_PAYOUT_MULTIPLIER must be a finite, non-negative number")]
    InvalidPayoutMultiplier,
    #[error("SIM_CANDLE_INTERVAL_MS must be a positive integer no greater than 86400000")]
    InvalidCandleInterval,
    #[error("SIM_JOURNAL_OUTPUT must not be empty or whitespace")]
    InvalidJournalOutputPath,
    #[error("SIM_SERVER_ADDR contains non-unicode data")]
    NonUnicodeListenAddr,
    #[error("SIM_ASSET contains non-unicode data")]
    NonUnicodeAsset,
    #[error("SIM_SEED contains non-unicode data")]
    NonUnicodeSeed,
    #[error("SIM_INITIAL_BALANCE contains non-unicode data")]
    NonUnicodeInitialBalance,
    #[error("SIM_PAYOUT_MULTIPLIER contains non-unicode data")]
    NonUnicodePayoutMultiplier,
    #[error("SIM_CANDLE_INTERVAL_MS contains non-unicode data")]
    NonUnicodeCandleInterval,
    #[error("SIM_JOURNAL_OUTPUT contains non-unicode data")]
    NonUnicodeJournalOutput,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match env::var("SIM_SERVER_ADDR") {
            Ok(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            Err(env::VarError::NotPresent) => DEFAULT_LISTEN_ADDR
                .parse()
                .expect("default listen address must be valid"),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::NonUnicodeListenAddr);
            }
        };

        let asset = parse_text_env(
            "SIM_ASSET",
            DEFAULT_ASSET,
            ConfigError::InvalidAsset,
            ConfigError::NonUnicodeAsset,
        )?
        .trim()
        .to_ascii_uppercase();

        let seed = match env::var("SIM_SEED") {
            Ok(value) => Some(value.trim().parse().map_err(|_| ConfigError::InvalidSeed)?),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::NonUnicodeSeed);
            }
        };

        let initial_balance = parse_non_negative_env(
            "SIM_INITIAL_BALANCE",
            DEFAULT_INITIAL_BALANCE,
            ConfigError::InvalidInitialBalance,
            ConfigError::NonUnicodeInitialBalance,
        )?;

        let payout_multiplier = parse_non_negative_env(
            "SIM_PAYOUT_MULTIPLIER",
            DEFAULT_PAYOUT_MULTIPLIER,
            ConfigError::InvalidPayoutMultiplier,
            ConfigError::NonUnicodePayoutMultiplier,
        )?;

        let candle_interval_ms = parse_env::<i64>(
            "SIM_CANDLE_INTERVAL_MS",
            DEFAULT_CANDLE_INTERVAL_MS,
            ConfigError::InvalidCandleInterval,
            ConfigError::NonUnicodeCandleInterval,
        )?;
        if !(1..=MAX_CANDLE_INTERVAL_MS).contains(&candle_interval_ms) {
            return Err(ConfigError::InvalidCandleInterval);
        }

        let journal_output_path = parse_text_env(
            "SIM_JOURNAL_OUTPUT",
            DEFAULT_JOURNAL_OUTPUT_PATH,
            ConfigError::InvalidJournalOutputPath,
            ConfigError::NonUnicodeJournalOutput,
        )?;

        Ok(Self {
            listen_addr,
            asset,
            seed,
            initial_balance,
            payout_multiplier,
            candle_interval_ms,
            journal_output_path,
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            candle_interval_ms: self.candle_interval_ms,
            initial_balance: self.initial_balance,
            wager: WagerConfig {
                payout_multiplier: self.payout_multiplier,
                ..WagerConfig::default()
            },
            ..SessionConfig::default()
        }
    }
}

fn parse_text_env(
    key: &str,
    default_value: &str,
    invalid_error: ConfigError,
    non_unicode_error: ConfigError,
) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            if value.trim().is_empty() {
                return Err(invalid_error);
            }
            Ok(value)
        }
        Err(env::VarError::NotPresent) => Ok(default_value.to_owned()),
        Err(env::VarError::NotUnicode(_)) => Err(non_unicode_error),
    }
}

fn parse_env<T: FromStr>(
    key: &str,
    default_value: T,
    invalid_error: ConfigError,
    non_unicode_error: ConfigError,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>().map_err(|_| invalid_error),
        Err(env::VarError::NotPresent) => Ok(default_value),
        Err(env::VarError::NotUnicode(_)) => Err(non_unicode_error),
    }
}

fn parse_non_negative_env(
    key: &str,
    default_value: f64,
    invalid_error: ConfigError,
    non_unicode_error: ConfigError,
) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() && parsed >= 0.0 => Ok(parsed),
            _ => Err(invalid_error),
        },
        Err(env::VarError::NotPresent) => Ok(default_value),
        Err(env::VarError::NotUnicode(_)) => Err(non_unicode_error),
    }
}

#[cfg(test)]
mod tests {
    use std::{env, sync::Mutex};

    use super::{Config, ConfigError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());
    const ENV_ADDR_KEY: &str = "SIM_SERVER_ADDR";
    const ENV_ASSET_KEY: &str = "SIM_ASSET";
    const ENV_SEED_KEY: &str = "SIM_SEED";
    const ENV_BALANCE_KEY: &str = "SIM_INITIAL_BALANCE";
    const ENV_PAYOUT_KEY: &str = "SIM_PAYOUT_MULTIPLIER";
    const ENV_CANDLE_KEY: &str = "SIM_CANDLE_INTERVAL_MS";
    const ENV_JOURNAL_KEY: &str = "SIM_JOURNAL_OUTPUT";

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<std::ffi::OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }

        #[cfg(unix)]
        fn set_os(key: &'static str, value: std::ffi::OsString) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.take() {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    fn reset_config_env_baseline() -> [EnvVarGuard; 7] {
        [
            EnvVarGuard::unset(ENV_ADDR_KEY),
            EnvVarGuard::unset(ENV_ASSET_KEY),
            EnvVarGuard::unset(ENV_SEED_KEY),
            EnvVarGuard::unset(ENV_BALANCE_KEY),
            EnvVarGuard::unset(ENV_PAYOUT_KEY),
            EnvVarGuard::unset(ENV_CANDLE_KEY),
            EnvVarGuard::unset(ENV_JOURNAL_KEY),
        ]
    }

    #[test]
    fn defaults_apply_when_env_is_unset() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.asset, "BTC");
        assert_eq!(config.seed, None);
        assert_eq!(config.initial_balance, 1_000.0);
        assert_eq!(config.payout_multiplier, 1.75);
        assert_eq!(config.candle_interval_ms, 1_000);
        assert_eq!(config.journal_output_path, "artifacts/journal.csv");
    }

    #[test]
    fn uses_overrides_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _addr = EnvVarGuard::set(ENV_ADDR_KEY, "127.0.0.1:9090");
        let _asset = EnvVarGuard::set(ENV_ASSET_KEY, " sol ");
        let _seed = EnvVarGuard::set(ENV_SEED_KEY, "42");
        let _balance = EnvVarGuard::set(ENV_BALANCE_KEY, "250");
        let _payout = EnvVarGuard::set(ENV_PAYOUT_KEY, "1.9");
        let _candle = EnvVarGuard::set(ENV_CANDLE_KEY, "2000");
        let _journal = EnvVarGuard::set(ENV_JOURNAL_KEY, "artifacts/custom.csv");

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.asset, "SOL");
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.initial_balance, 250.0);
        assert_eq!(config.payout_multiplier, 1.9);
        assert_eq!(config.candle_interval_ms, 2_000);
        assert_eq!(config.journal_output_path, "artifacts/custom.csv");
    }

    #[test]
    fn session_config_carries_overrides() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _payout = EnvVarGuard::set(ENV_PAYOUT_KEY, "2");
        let _candle = EnvVarGuard::set(ENV_CANDLE_KEY, "5000");

        let session = Config::from_env().unwrap().session_config();

        assert_eq!(session.wager.payout_multiplier, 2.0);
        assert_eq!(session.wager.trade_duration_ms, 60_000);
        assert_eq!(session.candle_interval_ms, 5_000);
        assert_eq!(session.tick_interval_ms, 1_000);
        assert_eq!(session.candle_capacity, 90);
    }

    #[test]
    fn returns_error_for_invalid_listen_address_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_ADDR_KEY, "not-an-addr");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidListenAddr(_)));
    }

    #[test]
    fn returns_error_for_whitespace_asset() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_ASSET_KEY, "   ");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidAsset));
    }

    #[test]
    fn returns_error_for_invalid_seed() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_SEED_KEY, "-1");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidSeed));
    }

    #[test]
    fn returns_error_for_negative_or_nan_balance() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        for value in ["-5", "NaN", "inf", "lots"] {
            let _guard = EnvVarGuard::set(ENV_BALANCE_KEY, value);

            let err = Config::from_env().unwrap_err();

            assert!(matches!(err, ConfigError::InvalidInitialBalance), "{value}");
        }
    }

    #[test]
    fn returns_error_for_negative_payout_multiplier() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_PAYOUT_KEY, "-1.75");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidPayoutMultiplier));
    }

    #[test]
    fn returns_error_for_non_positive_candle_interval() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        for value in ["0", "-1000", "1.5"] {
            let _guard = EnvVarGuard::set(ENV_CANDLE_KEY, value);

            let err = Config::from_env().unwrap_err();

            assert!(matches!(err, ConfigError::InvalidCandleInterval), "{value}");
        }
    }

    #[test]
    fn candle_interval_is_capped_at_one_day() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        {
            let _guard = EnvVarGuard::set(ENV_CANDLE_KEY, "86400000");
            assert_eq!(Config::from_env().unwrap().candle_interval_ms, 86_400_000);
        }
        for value in ["86400001", "200000000000000000"] {
            let _guard = EnvVarGuard::set(ENV_CANDLE_KEY, value);

            let err = Config::from_env().unwrap_err();

            assert!(matches!(err, ConfigError::InvalidCandleInterval), "{value}");
        }
    }

    #[test]
    fn returns_error_for_empty_journal_output_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_JOURNAL_KEY, "");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidJournalOutputPath));
    }

    #[cfg(unix)]
    #[test]
    fn returns_error_for_non_unicode_env_var() {
        use std::os::unix::ffi::OsStringExt;

        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set_os(
            ENV_ADDR_KEY,
            std::ffi::OsString::from_vec(vec![0x66, 0x6f, 0x80]),
        );

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::NonUnicodeListenAddr));
    }

    #[cfg(unix)]
    #[test]
    fn returns_error_for_non_unicode_journal_output_env_var() {
        use std::os::unix::ffi::OsStringExt;

        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set_os(
            ENV_JOURNAL_KEY,
            std::ffi::OsString::from_vec(vec![0x66, 0x6f, 0x80]),
        );

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::NonUnicodeJournalOutput));
    }
}
