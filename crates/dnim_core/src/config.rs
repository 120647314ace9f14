//! Typed, validated startup configuration (§6, §10.3).

use serde::Deserialize;

use crate::error::CoreError;

fn default_udp_port() -> u16 {
    6666
}

fn default_listen_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_handshake_timeout_seconds() -> f64 {
    3.0
}

fn default_message_retry_seconds() -> f64 {
    2.0
}

fn default_idle_suspend_seconds() -> u64 {
    300
}

fn default_debug() -> bool {
    false
}

/// Every field recognized by the host program. An unrecognized key is a
/// startup-time configuration error (exit code 2), not a silently ignored
/// one, hence `deny_unknown_fields`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,

    #[serde(default = "default_listen_ip")]
    pub listen_ip: String,

    #[serde(default = "default_handshake_timeout_seconds")]
    pub handshake_timeout_seconds: f64,

    #[serde(default = "default_message_retry_seconds")]
    pub message_retry_seconds: f64,

    #[serde(default = "default_idle_suspend_seconds")]
    pub idle_suspend_seconds: u64,

    pub pkcs_module_path: Option<String>,
    pub discovery_service_name: Option<String>,
    pub db_path: Option<String>,
    pub log_path: Option<String>,

    #[serde(default = "default_debug")]
    pub debug: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            udp_port: default_udp_port(),
            listen_ip: default_listen_ip(),
            handshake_timeout_seconds: default_handshake_timeout_seconds(),
            message_retry_seconds: default_message_retry_seconds(),
            idle_suspend_seconds: default_idle_suspend_seconds(),
            pkcs_module_path: None,
            discovery_service_name: None,
            db_path: None,
            log_path: None,
            debug: default_debug(),
        }
    }
}

impl CoreConfig {
    /// Semantic validation beyond what serde can express.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.listen_ip.parse::<std::net::IpAddr>().is_err() {
            return Err(CoreError::Configuration(format!(
                "listen_ip {:?} is not a valid IP address",
                self.listen_ip
            )));
        }
        if self.handshake_timeout_seconds <= 0.0 {
            return Err(CoreError::Configuration(
                "handshake_timeout_seconds must be positive".into(),
            ));
        }
        if self.message_retry_seconds <= 0.0 {
            return Err(CoreError::Configuration(
                "message_retry_seconds must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn handshake_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.handshake_timeout_seconds)
    }

    pub fn message_retry_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.message_retry_seconds)
    }

    pub fn idle_suspend(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.idle_suspend_seconds)
    }
}
