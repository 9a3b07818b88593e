use std::env;
use std::time::Duration;

use crate::errors::CallError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub vapi_api_key: String,
    pub vapi_assistant_id: String,
    pub vapi_base_url: String,
    pub backend_url: String,
    pub timing: CallTiming,
}

/// Retry and settle timings for one call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CallTiming {
    pub start_max_attempts: u32,
    pub start_retry_delay: Duration,
    /// Wait after the call ends before asking the provider for its record.
    pub summary_delay: Duration,
    pub summary_poll_interval: Duration,
    /// Detail fetches before the pipeline proceeds with whatever it has.
    pub summary_max_polls: u32,
}

impl Default for CallTiming {
    fn default() -> Self {
        Self {
            start_max_attempts: 5,
            start_retry_delay: Duration::from_millis(1000),
            summary_delay: Duration::from_secs(10),
            summary_poll_interval: Duration::from_secs(3),
            summary_max_polls: 1,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = CallTiming::default();
        Self {
            port: parse_var("PORT").unwrap_or(3000),
            vapi_api_key: env::var("VAPI_API_KEY").unwrap_or_default(),
            vapi_assistant_id: env::var("VAPI_ASSISTANT_ID").unwrap_or_default(),
            vapi_base_url: env::var("VAPI_BASE_URL")
                .unwrap_or_else(|_| "https://api.vapi.ai".to_string()),
            backend_url: env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            timing: CallTiming {
                start_max_attempts: parse_var("START_MAX_ATTEMPTS")
                    .unwrap_or(defaults.start_max_attempts),
                start_retry_delay: parse_var("START_RETRY_DELAY_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.start_retry_delay),
                summary_delay: parse_var("SUMMARY_DELAY_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.summary_delay),
                summary_poll_interval: parse_var("SUMMARY_POLL_INTERVAL_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.summary_poll_interval),
                summary_max_polls: parse_var("SUMMARY_MAX_POLLS")
                    .unwrap_or(defaults.summary_max_polls),
            },
        }
    }

    /// Fails when a credential the voice provider needs is missing.
    pub fn validate(&self) -> Result<(), CallError> {
        if self.vapi_api_key.is_empty() {
            return Err(CallError::Config("VAPI_API_KEY must be set".to_string()));
        }
        if self.vapi_assistant_id.is_empty() {
            return Err(CallError::Config("VAPI_ASSISTANT_ID must be set".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            port: 3000,
            vapi_api_key: "key".to_string(),
            vapi_assistant_id: "assistant-1".to_string(),
            vapi_base_url: "https://api.vapi.ai".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            timing: CallTiming::default(),
        }
    }

    #[test]
    fn test_validate_accepts_credentials() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_api_key() {
        let cfg = AppConfig {
            vapi_api_key: String::new(),
            ..config()
        };
        match cfg.validate() {
            Err(CallError::Config(msg)) => assert_eq!(msg, "VAPI_API_KEY must be set"),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_requires_assistant_id() {
        let cfg = AppConfig {
            vapi_assistant_id: String::new(),
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(CallError::Config(_))));
    }
}
