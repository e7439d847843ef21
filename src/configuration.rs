//! Config for the league server behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Unset or unparsable values keep their default. Flags are enabled by
//! the value `"true"` (case-insensitive).
//!
//! - `LEAGUE_BIND_ADDRESS`: UDP address to listen on (default: `0.0.0.0:4446`)
//! - `LEAGUE_MAX_NAME_LENGTH`: Longest accepted contestant name, in characters (default: `30`)
//! - `LEAGUE_POLL_INTERVAL_MS`: How often the receive loop checks for shutdown (default: `100`)
//! - `LEAGUE_ISOLATE_FAILURES`: Turn rule engine and listener failures into forfeits / warnings
//!   instead of aborting the season (default: `false`)
//! - `LEAGUE_LOG`: Log to a timestamped file instead of stderr (default: `false`)
//! - `LEAGUE_LOG_LEVEL`: Maximum log level: `error`, `warn`, `info`, `debug`, `trace`
//!   (default: `info`)

use std::{
    env,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    str::FromStr,
    time::Duration,
};

use tracing::Level;

/// Default UDP port of the league.
pub const DEFAULT_PORT: u16 = 4446;

/// Default maximum contestant name length.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 30;

/// Configuration for the league server.
#[derive(Debug, Clone, Copy)]
pub struct Configuration {
    pub(crate) bind_address: SocketAddr,
    pub(crate) max_name_length: usize,
    pub(crate) poll_interval: Duration,
    pub(crate) isolate_failures: bool,
    pub(crate) log: bool,
    pub(crate) log_level: Level,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - The server listens on every interface, port [`DEFAULT_PORT`].
    /// - Names up to [`DEFAULT_MAX_NAME_LENGTH`] characters are accepted.
    /// - Shutdown is checked every 100 ms.
    /// - Failures abort the running season.
    /// - Logs go to stderr, up to `INFO`. [`Server::bind`](crate::server::Server::bind) keeps
    ///   any subscriber installed beforehand instead.
    pub fn new() -> Self {
        Self {
            bind_address: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_name_length: DEFAULT_MAX_NAME_LENGTH,
            poll_interval: Duration::from_millis(100),
            isolate_failures: false,
            log: false,
            log_level: Level::INFO,
        }
    }

    /// Create configuration from environment variables (see module documentation).
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_parsed<T: FromStr>(var: &str, default: T) -> T {
            env::var(var)
                .ok()
                .and_then(|val| val.trim().parse().ok())
                .unwrap_or(default)
        }

        let defaults = Self::new();
        Self {
            bind_address: get_env_parsed("LEAGUE_BIND_ADDRESS", defaults.bind_address),
            max_name_length: get_env_parsed("LEAGUE_MAX_NAME_LENGTH", defaults.max_name_length),
            poll_interval: defaults.poll_interval,
            isolate_failures: get_env_flag("LEAGUE_ISOLATE_FAILURES", defaults.isolate_failures),
            log: get_env_flag("LEAGUE_LOG", defaults.log),
            log_level: get_env_parsed("LEAGUE_LOG_LEVEL", defaults.log_level),
        }
        .with_poll_interval(Duration::from_millis(get_env_parsed(
            "LEAGUE_POLL_INTERVAL_MS",
            defaults.poll_interval.as_millis() as u64,
        )))
    }

    /// Set the UDP address to listen on. Port `0` picks a free port.
    pub fn with_bind_address(mut self, value: SocketAddr) -> Self {
        self.bind_address = value;
        self
    }

    /// Set the maximum name length, in characters.
    pub fn with_max_name_length(mut self, value: usize) -> Self {
        self.max_name_length = value;
        self
    }

    /// Set how often the receive loop wakes up to check for shutdown.
    ///
    /// A zero duration is replaced by one millisecond.
    pub fn with_poll_interval(mut self, value: Duration) -> Self {
        self.poll_interval = value.max(Duration::from_millis(1));
        self
    }

    /// Enable or disable failure isolation during seasons.
    pub fn with_isolate_failures(mut self, value: bool) -> Self {
        self.isolate_failures = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Set the maximum log level.
    pub fn with_log_level(mut self, value: Level) -> Self {
        self.log_level = value;
        self
    }

    /// UDP address to listen on.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    /// Longest accepted name, in characters.
    pub fn max_name_length(&self) -> usize {
        self.max_name_length
    }

    /// Whether seasons survive rule engine and listener failures.
    pub fn isolate_failures(&self) -> bool {
        self.isolate_failures
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
