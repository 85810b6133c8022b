use std::env;
use std::fmt;

/// Distinguishes runtime behavior for different stages of the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, read once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub backend: BackendConfig,
    pub poll: PollConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let api_origin = env::var("VERIFY_API_URL")
            .ok()
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .ok_or(ConfigError::MissingApiOrigin)?;

        let workflow_id = env::var("VERIFY_WORKFLOW_ID")
            .ok()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigError::MissingWorkflowId)?;

        let max_attempts = env::var("VERIFY_POLL_ATTEMPTS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u32>()
            .ok()
            .filter(|attempts| *attempts > 0)
            .ok_or(ConfigError::InvalidPollAttempts)?;

        let interval_ms = env::var("VERIFY_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidPollInterval)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            backend: BackendConfig {
                api_origin,
                workflow_id,
            },
            poll: PollConfig {
                max_attempts,
                interval_ms,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where the verification backend lives and which workflow to start.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base origin, no trailing slash.
    pub api_origin: String,
    pub workflow_id: String,
}

/// Attempt budget and spacing for the completion poll, in raw env units.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingApiOrigin,
    MissingWorkflowId,
    InvalidPollAttempts,
    InvalidPollInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiOrigin => write!(f, "VERIFY_API_URL must be set"),
            ConfigError::MissingWorkflowId => write!(f, "VERIFY_WORKFLOW_ID must be set"),
            ConfigError::InvalidPollAttempts => {
                write!(f, "VERIFY_POLL_ATTEMPTS must be a positive integer")
            }
            ConfigError::InvalidPollInterval => {
                write!(f, "VERIFY_POLL_INTERVAL_MS must be a valid u64")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("VERIFY_API_URL");
        env::remove_var("VERIFY_WORKFLOW_ID");
        env::remove_var("VERIFY_POLL_ATTEMPTS");
        env::remove_var("VERIFY_POLL_INTERVAL_MS");
    }

    #[test]
    fn load_applies_poll_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VERIFY_API_URL", "https://verify.example.com");
        env::set_var("VERIFY_WORKFLOW_ID", "wf-123");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.poll.max_attempts, 100);
        assert_eq!(config.poll.interval_ms, 3000);
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn load_strips_trailing_slash_from_origin() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VERIFY_API_URL", "https://verify.example.com/");
        env::set_var("VERIFY_WORKFLOW_ID", "wf-123");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.backend.api_origin, "https://verify.example.com");
    }

    #[test]
    fn load_requires_api_origin() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VERIFY_WORKFLOW_ID", "wf-123");

        match AppConfig::load() {
            Err(ConfigError::MissingApiOrigin) => {}
            other => panic!("expected missing origin error, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_zero_poll_attempts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("VERIFY_API_URL", "https://verify.example.com");
        env::set_var("VERIFY_WORKFLOW_ID", "wf-123");
        env::set_var("VERIFY_POLL_ATTEMPTS", "0");

        match AppConfig::load() {
            Err(ConfigError::InvalidPollAttempts) => {}
            other => panic!("expected invalid attempts error, got {other:?}"),
        }
    }
}
