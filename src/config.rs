//! Configuration Module
//!
//! Handles loading server configuration from command-line flags, falling
//! back to environment variables and then to defaults.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::builder::FalseyValueParser;
use clap::Parser;

use crate::cache::DEFAULT_SHARD_COUNT;

// == Command-Line Arguments ==
/// Command-line flags. A flag left out falls back to its environment
/// variable, then to the default.
#[derive(Parser, Debug, Clone)]
#[command(name = "kv_cache")]
#[command(about = "Key-value server with a sharded LRU cache", long_about = None)]
pub struct Args {
    /// HTTP server port
    #[arg(short = 'p', long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Runtime worker threads
    #[arg(short = 'w', long, env = "WORKER_THREADS", default_value_t = 10)]
    pub workers: usize,

    /// Total cache capacity (entries)
    #[arg(short = 'c', long, env = "CACHE_SIZE", default_value_t = 1000)]
    pub cache_size: usize,

    /// Cache partitions, rounded up to a power of two
    #[arg(long, env = "SHARD_COUNT", default_value_t = DEFAULT_SHARD_COUNT)]
    pub shards: usize,

    /// Seconds between cache stats log lines
    #[arg(long, env = "STATS_INTERVAL", default_value_t = 30)]
    pub stats_interval: u64,

    /// Seconds before a request is answered with 408
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 10)]
    pub request_timeout: u64,

    /// Durable store log file; in-memory store when unset
    #[arg(long, env = "STORE_PATH", value_name = "FILE")]
    pub store_path: Option<PathBuf>,

    /// Sync the store log to disk after every write
    #[arg(long, env = "STORE_FSYNC", value_parser = FalseyValueParser::new())]
    pub store_fsync: bool,
}

/// Server configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Tokio worker threads serving requests
    pub worker_threads: usize,
    /// Total number of entries the cache can hold
    pub cache_size: usize,
    /// Number of cache partitions (rounded up to a power of two)
    pub shard_count: usize,
    /// Interval in seconds between cache stats log lines
    pub stats_interval: u64,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    /// Log file for the durable store; in-memory store when unset
    pub store_path: Option<PathBuf>,
    /// Sync the store log to disk after every write
    pub store_fsync: bool,
}

impl Config {
    /// Loads configuration from the process arguments and environment.
    ///
    /// Exits with a usage message if a flag or variable does not parse.
    ///
    /// # Flags / Environment Variables
    /// - `--port`, `-p` / `SERVER_PORT` (default: 8080)
    /// - `--workers`, `-w` / `WORKER_THREADS` (default: 10)
    /// - `--cache-size`, `-c` / `CACHE_SIZE` (default: 1000)
    /// - `--shards` / `SHARD_COUNT` (default: 32)
    /// - `--stats-interval` / `STATS_INTERVAL` (default: 30)
    /// - `--request-timeout` / `REQUEST_TIMEOUT` (default: 10)
    /// - `--store-path` / `STORE_PATH` (default: unset, in-memory)
    /// - `--store-fsync` / `STORE_FSYNC` (default: false)
    pub fn from_args() -> Self {
        Args::parse().into()
    }

    /// Like [`from_args`](Self::from_args), over an explicit argument list
    /// (program name first).
    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Args::try_parse_from(args).map(Self::from)
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            server_port: args.port,
            worker_threads: args.workers.max(1),
            cache_size: args.cache_size,
            shard_count: args.shards,
            stats_interval: args.stats_interval,
            request_timeout: args.request_timeout.max(1),
            store_path: args.store_path.filter(|p| !p.as_os_str().is_empty()),
            store_fsync: args.store_fsync,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            worker_threads: 10,
            cache_size: 1000,
            shard_count: DEFAULT_SHARD_COUNT,
            stats_interval: 30,
            request_timeout: 10,
            store_path: None,
            store_fsync: false,
        }
    }
}

// == Dotenv ==
/// Loads `KEY=VALUE` lines from `path` into the process environment.
///
/// Variables already set in the environment win over the file.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<(), dotenv::Error> {
    dotenv::from_path(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::env;

    const VARS: [&str; 8] = [
        "SERVER_PORT",
        "WORKER_THREADS",
        "CACHE_SIZE",
        "SHARD_COUNT",
        "STATS_INTERVAL",
        "REQUEST_TIMEOUT",
        "STORE_PATH",
        "STORE_FSYNC",
    ];

    // Tests below mutate the process environment
    static ENV_LOCK: Mutex<()> = parking_lot::const_mutex(());

    fn clear_env() {
        for name in VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.worker_threads, 10);
        assert_eq!(config.cache_size, 1000);
        assert_eq!(config.shard_count, 32);
        assert_eq!(config.stats_interval, 30);
        assert_eq!(config.request_timeout, 10);
        assert!(config.store_path.is_none());
        assert!(!config.store_fsync);
    }

    #[test]
    fn test_no_flags_no_env_gives_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let config = Config::try_from_args(["kv_cache"]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_used_when_flag_absent() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        env::set_var("SERVER_PORT", "7000");
        env::set_var("CACHE_SIZE", "64");
        env::set_var("STORE_PATH", "/var/lib/kv.log");

        let config = Config::try_from_args(["kv_cache"]).unwrap();
        clear_env();

        assert_eq!(config.server_port, 7000);
        assert_eq!(config.cache_size, 64);
        assert_eq!(config.store_path, Some(PathBuf::from("/var/lib/kv.log")));
    }

    #[test]
    fn test_flag_overrides_env() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        env::set_var("SERVER_PORT", "7000");
        env::set_var("WORKER_THREADS", "2");

        let config =
            Config::try_from_args(["kv_cache", "--port", "9000", "-w", "4", "-c", "50"]).unwrap();
        clear_env();

        assert_eq!(config.server_port, 9000);
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.cache_size, 50);
    }

    #[test]
    fn test_store_flags() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let config = Config::try_from_args([
            "kv_cache",
            "--store-path",
            "data/kv.log",
            "--store-fsync",
            "--shards",
            "8",
        ])
        .unwrap();

        assert_eq!(config.store_path, Some(PathBuf::from("data/kv.log")));
        assert!(config.store_fsync);
        assert_eq!(config.shard_count, 8);
    }

    #[test]
    fn test_store_fsync_from_env() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        env::set_var("STORE_FSYNC", "true");
        assert!(Config::try_from_args(["kv_cache"]).unwrap().store_fsync);

        env::set_var("STORE_FSYNC", "0");
        assert!(!Config::try_from_args(["kv_cache"]).unwrap().store_fsync);

        clear_env();
    }

    #[test]
    fn test_zero_workers_raised_to_one() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let config = Config::try_from_args(["kv_cache", "--workers", "0"]).unwrap();
        assert_eq!(config.worker_threads, 1);
    }

    #[test]
    fn test_invalid_flag_value_is_error() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        assert!(Config::try_from_args(["kv_cache", "--port", "not-a-port"]).is_err());
        assert!(Config::try_from_args(["kv_cache", "--port", "70000"]).is_err());
    }

    #[test]
    fn test_load_env_file_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "KV_CACHE_TEST_NEW=from_file\nKV_CACHE_TEST_SET=from_file\n",
        )
        .unwrap();
        env::set_var("KV_CACHE_TEST_SET", "from_env");
        env::remove_var("KV_CACHE_TEST_NEW");

        load_env_file(&path).unwrap();

        assert_eq!(env::var("KV_CACHE_TEST_NEW").unwrap(), "from_file");
        assert_eq!(env::var("KV_CACHE_TEST_SET").unwrap(), "from_env");
    }

    #[test]
    fn test_load_env_file_missing() {
        assert!(load_env_file("/definitely/not/here/.env").is_err());
    }
}
