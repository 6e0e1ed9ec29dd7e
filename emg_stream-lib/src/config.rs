use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use crate::adc::{AdcError, AdcResolution, SpeedMode};
use crate::link::{Credentials, DEFAULT_RETRY_DELAY};
use crate::transport::TransportKind;

pub const DEFAULT_SAMPLE_INTERVAL_US: u32 = 40;
pub const DEFAULT_SAMPLES_PER_PACKET: usize = 256;
pub const DEFAULT_UDP_PORT: u16 = 8888;
/// Source port of the node's socket; kept off `DEFAULT_UDP_PORT` so a node
/// and a receiver can share a host.
pub const DEFAULT_LOCAL_PORT: u16 = 8889;
pub const DEFAULT_HTTP_PORT: u16 = 80;
pub const DEFAULT_HTTP_PATH: &str = "/data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("{key}: cannot parse '{value}'")]
    Invalid { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("EMG_ADC_RESOLUTION: {0}")]
    Adc(#[from] AdcError),
}

/// Where packets go, per transport strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Udp { remote: SocketAddr, local_port: u16 },
    Http { host: String, port: u16, path: String },
}

impl Endpoint {
    pub fn kind(&self) -> TransportKind {
        match self {
            Endpoint::Udp { .. } => TransportKind::Udp,
            Endpoint::Http { .. } => TransportKind::Http,
        }
    }
}

/// Everything the acquisition node reads once at boot.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub credentials: Credentials,
    pub endpoint: Endpoint,
    pub sample_interval_us: u32,
    pub samples_per_packet: usize,
    pub resolution: AdcResolution,
    pub speed: SpeedMode,
    pub connect_timeout: Option<Duration>,
    pub retry_delay: Duration,
}

impl NodeConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset optional keys take reference defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Credentials {
            ssid: lookup("WIFI_SSID").ok_or(ConfigError::Missing("WIFI_SSID"))?,
            password: lookup("WIFI_PASSWORD").unwrap_or_default(),
        };

        let kind: TransportKind = parse_or(&lookup, "EMG_TRANSPORT", TransportKind::Udp)?;
        let endpoint = match kind {
            TransportKind::Udp => {
                let ip: IpAddr = parse_required(&lookup, "EMG_REMOTE_ADDR")?;
                let port = parse_or(&lookup, "EMG_REMOTE_PORT", DEFAULT_UDP_PORT)?;
                let local_port = parse_or(&lookup, "EMG_LOCAL_PORT", DEFAULT_LOCAL_PORT)?;
                Endpoint::Udp { remote: SocketAddr::new(ip, port), local_port }
            }
            TransportKind::Http => Endpoint::Http {
                host: lookup("EMG_HTTP_HOST").ok_or(ConfigError::Missing("EMG_HTTP_HOST"))?,
                port: parse_or(&lookup, "EMG_HTTP_PORT", DEFAULT_HTTP_PORT)?,
                path: lookup("EMG_HTTP_PATH").unwrap_or_else(|| DEFAULT_HTTP_PATH.to_string()),
            },
        };

        let sample_interval_us =
            parse_or(&lookup, "EMG_SAMPLE_INTERVAL_US", DEFAULT_SAMPLE_INTERVAL_US)?;
        if sample_interval_us == 0 {
            return Err(ConfigError::Zero("EMG_SAMPLE_INTERVAL_US"));
        }
        let samples_per_packet =
            parse_or(&lookup, "EMG_SAMPLES_PER_PACKET", DEFAULT_SAMPLES_PER_PACKET)?;
        if samples_per_packet == 0 {
            return Err(ConfigError::Zero("EMG_SAMPLES_PER_PACKET"));
        }

        let bits: u8 = parse_or(&lookup, "EMG_ADC_RESOLUTION", AdcResolution::TEN_BIT.bits())?;
        let resolution = AdcResolution::new(bits)?;
        let speed = match lookup("EMG_ADC_FAST").as_deref().map(str::trim) {
            None | Some("0") | Some("false") => SpeedMode::Normal,
            Some("1") | Some("true") => SpeedMode::Fast,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "EMG_ADC_FAST", value: other.to_string() });
            }
        };

        let connect_timeout = lookup("EMG_CONNECT_TIMEOUT_MS")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .map(Duration::from_millis)
                    .map_err(|_| ConfigError::Invalid { key: "EMG_CONNECT_TIMEOUT_MS", value: v })
            })
            .transpose()?;
        let retry_delay = Duration::from_millis(parse_or(
            &lookup,
            "WIFI_RETRY_MS",
            DEFAULT_RETRY_DELAY.as_millis() as u64,
        )?);

        Ok(Self {
            credentials,
            endpoint,
            sample_interval_us,
            samples_per_packet,
            resolution,
            speed,
            connect_timeout,
            retry_delay,
        })
    }

    /// Wire size of one packet.
    pub fn packet_bytes(&self) -> usize {
        self.samples_per_packet * crate::packet::SAMPLE_BYTES
    }
}

fn parse_required<T, F>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or(ConfigError::Missing(key))?;
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn udp_defaults_match_reference_configuration() {
        let cfg = NodeConfig::from_lookup(lookup(&[
            ("WIFI_SSID", "lab"),
            ("EMG_REMOTE_ADDR", "192.168.1.20"),
        ]))
        .unwrap();
        assert_eq!(cfg.sample_interval_us, 40);
        assert_eq!(cfg.samples_per_packet, 256);
        assert_eq!(cfg.packet_bytes(), 512);
        assert_eq!(cfg.resolution.max_value(), 1023);
        assert_eq!(
            cfg.endpoint,
            Endpoint::Udp { remote: "192.168.1.20:8888".parse().unwrap(), local_port: 8889 }
        );
        assert_ne!(DEFAULT_LOCAL_PORT, DEFAULT_UDP_PORT);
        assert_eq!(cfg.retry_delay, Duration::from_millis(500));
        assert!(cfg.connect_timeout.is_none());
    }

    #[test]
    fn http_endpoint() {
        let cfg = NodeConfig::from_lookup(lookup(&[
            ("WIFI_SSID", "lab"),
            ("EMG_TRANSPORT", "http"),
            ("EMG_HTTP_HOST", "scope.local"),
            ("EMG_HTTP_PORT", "5000"),
            ("EMG_CONNECT_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(cfg.endpoint.kind(), TransportKind::Http);
        assert_eq!(
            cfg.endpoint,
            Endpoint::Http { host: "scope.local".into(), port: 5000, path: "/data".into() }
        );
        assert_eq!(cfg.connect_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_bad_values() {
        let missing = NodeConfig::from_lookup(lookup(&[("EMG_REMOTE_ADDR", "10.0.0.1")]));
        assert!(matches!(missing, Err(ConfigError::Missing("WIFI_SSID"))));

        let zero = NodeConfig::from_lookup(lookup(&[
            ("WIFI_SSID", "lab"),
            ("EMG_REMOTE_ADDR", "10.0.0.1"),
            ("EMG_SAMPLES_PER_PACKET", "0"),
        ]));
        assert!(matches!(zero, Err(ConfigError::Zero(_))));

        let wide = NodeConfig::from_lookup(lookup(&[
            ("WIFI_SSID", "lab"),
            ("EMG_REMOTE_ADDR", "10.0.0.1"),
            ("EMG_ADC_RESOLUTION", "16"),
        ]));
        assert!(matches!(wide, Err(ConfigError::Adc(_))));

        let garbage = NodeConfig::from_lookup(lookup(&[
            ("WIFI_SSID", "lab"),
            ("EMG_REMOTE_ADDR", "not-an-ip"),
        ]));
        assert!(matches!(garbage, Err(ConfigError::Invalid { key: "EMG_REMOTE_ADDR", .. })));
    }
}
