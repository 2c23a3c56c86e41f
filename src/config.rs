//! Process-wide settings: the shape of the default worker pool and what
//! happens when an internal invariant is found broken.
//!
//! Settings are installed at most once, before first use. The first read
//! freezes whatever is current (the environment if nothing was installed).
use crate::Fault;
use once_cell::sync::OnceCell;
use std::{num::NonZeroUsize, str::FromStr, thread};

static CONFIG: OnceCell<Config> = OnceCell::new();

pub const ENV_WORKER_THREADS: &str = "PROMISE_WORKER_THREADS";
pub const ENV_THREAD_NAME: &str = "PROMISE_THREAD_NAME";
pub const ENV_FAULT_POLICY: &str = "PROMISE_FAULT_POLICY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FaultPolicy {
    /// Unwind the current thread. The host may catch it.
    #[default]
    Panic,
    /// Abort the process.
    Abort,
}

impl FromStr for FaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" => Ok(FaultPolicy::Panic),
            "abort" => Ok(FaultPolicy::Abort),
            other => Err(format!("unknown fault policy {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workers in the lazily created default pool.
    pub worker_threads: usize,
    /// Name prefix for the default pool's threads.
    pub thread_name: String,
    pub fault_policy: FaultPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worker_threads: thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            thread_name: "promise-worker".into(),
            fault_policy: FaultPolicy::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by `PROMISE_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    /// Malformed values are logged and skipped.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(raw) = lookup(ENV_WORKER_THREADS) {
            match raw.trim().parse::<NonZeroUsize>() {
                Ok(n) => config.worker_threads = n.get(),
                Err(err) => log::warn!("ignoring {ENV_WORKER_THREADS}={raw:?}: {err}"),
            }
        }
        if let Some(raw) = lookup(ENV_THREAD_NAME) {
            if raw.trim().is_empty() {
                log::warn!("ignoring empty {ENV_THREAD_NAME}");
            } else {
                config.thread_name = raw;
            }
        }
        if let Some(raw) = lookup(ENV_FAULT_POLICY) {
            match raw.parse() {
                Ok(policy) => config.fault_policy = policy,
                Err(err) => log::warn!("ignoring {ENV_FAULT_POLICY}: {err}"),
            }
        }
        config
    }
}

/// Install the process configuration. Fails once any configuration has
/// been installed or read.
pub fn install(config: Config) -> Result<(), Fault> {
    CONFIG
        .set(config)
        .map_err(|_| Fault::AlreadyConfigured("config"))
}

/// The frozen process configuration.
pub fn current() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Report a broken internal invariant and stop according to the configured
/// [`FaultPolicy`].
pub(crate) fn raise(fault: Fault) -> ! {
    log::error!("promise invariant violated: {fault}");
    match current().fault_policy {
        FaultPolicy::Panic => panic!("{fault}"),
        FaultPolicy::Abort => std::process::abort(),
    }
}
