use serde::Deserialize;
use std::time::Duration;

use crate::services::poller::PollPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Console bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the remote attendance service, e.g. "https://host/api".
    pub attendance_api_url: String,

    /// Fingerprint device that receives enroll/delete commands.
    #[serde(default = "default_device_id")]
    pub device_id: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// How long a success message stays up before the roster reload.
    #[serde(default = "default_success_hold_ms")]
    pub success_hold_ms: u64,

    /// How long a failed/expired command message stays up.
    #[serde(default = "default_failure_hold_ms")]
    pub failure_hold_ms: u64,

    /// How long an initiation error stays up.
    #[serde(default = "default_error_hold_ms")]
    pub error_hold_ms: u64,

    #[serde(default = "default_device_refresh_secs")]
    pub device_refresh_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Classes shown in the class-wise counts (comma separated in the env).
    #[serde(default = "default_class_names")]
    pub class_names: Vec<String>,

    /// Prefixed to 10-digit parent numbers when building message links.
    #[serde(default)]
    pub notify_country_code: Option<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_device_id() -> String {
    "FP001".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_max_attempts() -> u32 {
    60
}

fn default_success_hold_ms() -> u64 {
    2000
}

fn default_failure_hold_ms() -> u64 {
    5000
}

fn default_error_hold_ms() -> u64 {
    5000
}

fn default_device_refresh_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_class_names() -> Vec<String> {
    ["9", "10", "11", "12"]
        .iter()
        .flat_map(|grade| ["A", "B", "C"].map(|section| format!("{grade}-{section}")))
        .collect()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Config with every default filled in, pointed at `attendance_api_url`.
    pub fn with_api_url(attendance_api_url: impl Into<String>) -> Self {
        Self {
            bind_addr: default_bind_addr(),
            attendance_api_url: attendance_api_url.into(),
            device_id: default_device_id(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
            success_hold_ms: default_success_hold_ms(),
            failure_hold_ms: default_failure_hold_ms(),
            error_hold_ms: default_error_hold_ms(),
            device_refresh_secs: default_device_refresh_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            class_names: default_class_names(),
            notify_country_code: None,
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.poll_max_attempts,
            success_hold: Duration::from_millis(self.success_hold_ms),
            failure_hold: Duration::from_millis(self.failure_hold_ms),
        }
    }

    pub fn error_hold(&self) -> Duration {
        Duration::from_millis(self.error_hold_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn device_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.device_refresh_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_class_names() {
        let classes = default_class_names();
        assert_eq!(classes.len(), 12);
        assert_eq!(classes.first().map(String::as_str), Some("9-A"));
        assert_eq!(classes.last().map(String::as_str), Some("12-C"));
    }

    #[test]
    fn test_poll_policy_from_defaults() {
        let policy = AppConfig::with_api_url("http://localhost:8000/api").poll_policy();
        assert_eq!(policy.interval, Duration::from_secs(2));
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.success_hold, Duration::from_secs(2));
        assert_eq!(policy.failure_hold, Duration::from_secs(5));
    }

    #[test]
    fn test_from_env_iter() {
        let config: AppConfig = envy::from_iter(vec![
            (
                "ATTENDANCE_API_URL".to_string(),
                "http://svc/api".to_string(),
            ),
            ("POLL_MAX_ATTEMPTS".to_string(), "5".to_string()),
            ("CLASS_NAMES".to_string(), "7-A,7-B".to_string()),
        ])
        .expect("config should parse");
        assert_eq!(config.attendance_api_url, "http://svc/api");
        assert_eq!(config.poll_max_attempts, 5);
        assert_eq!(config.class_names, vec!["7-A", "7-B"]);
        assert_eq!(config.device_id, "FP001");
        assert!(config.notify_country_code.is_none());
    }
}
