use std::env;
use std::time::Duration;

use engine::{EngineConfig, EngineOptions};

#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub engine: EngineConfig,
    pub options: EngineOptions,
}

impl AnalysisConfig {
    /// Reads `ANALYSIS_*` variables; anything missing or unparsable keeps its default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let path = env::var("ANALYSIS_ENGINE_PATH").unwrap_or_else(|_| defaults.engine.path.clone());
        let args = env::var("ANALYSIS_ENGINE_ARGS")
            .map(|v| v.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        let grace_ms = env_or("ANALYSIS_SHUTDOWN_GRACE_MS", defaults.engine.shutdown_grace.as_millis() as u64);

        Self {
            engine: EngineConfig {
                path,
                args,
                shutdown_grace: Duration::from_millis(grace_ms),
            },
            options: EngineOptions {
                use_nnue: env_or("ANALYSIS_ENGINE_NNUE", defaults.options.use_nnue),
                threads: env_or("ANALYSIS_ENGINE_THREADS", defaults.options.threads),
                hash_mb: env_or("ANALYSIS_ENGINE_HASH_MB", defaults.options.hash_mb),
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}", key, value);
            default
        }),
        Err(_) => default,
    }
}
