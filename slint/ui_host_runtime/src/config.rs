use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_BACKEND_ADDR: &str = "127.0.0.1:7000";
pub const DEFAULT_SID: &str = "S1";
pub const DEFAULT_OUTBOUND_QUEUE_CAP: usize = 256;
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Tcp { addr: String },
    Stdio,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub transport: TransportKind,
    pub sid: String,
    pub outbound_queue_cap: usize,
    pub reconnect_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Tcp {
                addr: DEFAULT_BACKEND_ADDR.to_string(),
            },
            sid: DEFAULT_SID.to_string(),
            outbound_queue_cap: DEFAULT_OUTBOUND_QUEUE_CAP,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = match lookup("FACE_MONITOR_TRANSPORT").as_deref().map(str::trim) {
            None | Some("") | Some("tcp") => {
                let addr = lookup("FACE_MONITOR_ADDR")
                    .unwrap_or_else(|| DEFAULT_BACKEND_ADDR.to_string());
                let addr = addr.trim();
                if addr.is_empty() {
                    return Err(ConfigError::EmptyAddress);
                }
                TransportKind::Tcp {
                    addr: addr.to_string(),
                }
            }
            Some("stdio") => TransportKind::Stdio,
            Some(other) => return Err(ConfigError::UnknownTransport(other.to_string())),
        };

        let sid = lookup("FACE_MONITOR_SID")
            .filter(|sid| !sid.is_empty())
            .unwrap_or_else(|| DEFAULT_SID.to_string());

        let outbound_queue_cap = lookup("FACE_MONITOR_OUTBOUND_QUEUE_CAP")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_OUTBOUND_QUEUE_CAP);

        let reconnect_delay = lookup("FACE_MONITOR_RECONNECT_MS")
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_RECONNECT_DELAY);

        Ok(Self {
            transport,
            sid,
            outbound_queue_cap,
            reconnect_delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<MonitorConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        MonitorConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).expect("default config");
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = config_from(&[
            ("FACE_MONITOR_TRANSPORT", "tcp"),
            ("FACE_MONITOR_ADDR", "board.local:7000"),
            ("FACE_MONITOR_SID", "kiosk"),
            ("FACE_MONITOR_OUTBOUND_QUEUE_CAP", "16"),
            ("FACE_MONITOR_RECONNECT_MS", "250"),
        ])
        .expect("config");

        assert_eq!(
            config.transport,
            TransportKind::Tcp {
                addr: "board.local:7000".to_string()
            }
        );
        assert_eq!(config.sid, "kiosk");
        assert_eq!(config.outbound_queue_cap, 16);
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
    }

    #[test]
    fn stdio_transport_is_selectable() {
        let config = config_from(&[("FACE_MONITOR_TRANSPORT", "stdio")]).expect("config");
        assert_eq!(config.transport, TransportKind::Stdio);
    }

    #[test]
    fn unknown_transport_is_an_error() {
        let err = config_from(&[("FACE_MONITOR_TRANSPORT", "carrier-pigeon")])
            .expect_err("expected unknown transport");
        assert_eq!(err, ConfigError::UnknownTransport("carrier-pigeon".to_string()));
    }

    #[test]
    fn blank_address_is_an_error() {
        let err = config_from(&[("FACE_MONITOR_ADDR", "  ")]).expect_err("expected empty addr");
        assert_eq!(err, ConfigError::EmptyAddress);
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("FACE_MONITOR_OUTBOUND_QUEUE_CAP", "0"),
            ("FACE_MONITOR_RECONNECT_MS", "soon"),
        ])
        .expect("config");

        assert_eq!(config.outbound_queue_cap, DEFAULT_OUTBOUND_QUEUE_CAP);
        assert_eq!(config.reconnect_delay, DEFAULT_RECONNECT_DELAY);
    }
}
