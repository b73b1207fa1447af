//! # Configuration Management Module
//!
//! Every tunable the uplink uses lives here, with the defaults the firmware
//! shipped with. Nothing is selected at build time: the sensor backend and the
//! wire format are chosen when the module is constructed, so both hardware
//! variants can run (and be tested) from one binary.
//!
//! ## Configuration Structure
//!
//! - [`UplinkConfig`] - timing, jitter, hop limit, port, payload bound
//! - [`SensorConfig`] - backend selection, ADC conversion, SHT31 address
//! - [`EncodingConfig`] - wire format
//! - [`DisplayConfig`] - how many peers fit on the screen
//! - [`DeviceConfig`] - optional fixed hardware address
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meshuplink::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Sampling every {} ms", config.uplink.period_ms);
//!
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [uplink]
//! period_ms = 10000
//! # broadcast_interval_ms = 30000  # unset: broadcast every sample
//! retry_delay_ms = 2000
//! overrun_delay_ms = 1000
//! jitter_ms = 500
//! hop_limit = 3
//! port = "private_app"
//! max_payload = 256
//!
//! [sensor]
//! backend = "adc"
//! adc_pin = 2
//! adc_bits = 12
//! vref_volts = 3.3
//! sample_count = 16
//! sample_delay_us = 200
//! sht31_addr = 68
//!
//! [encoding]
//! format = "json"
//!
//! [display]
//! max_peers = 2
//! refresh_ms = 5000
//!
//! [logging]
//! level = "info"
//! ```

use crate::meshtastic::identity::MacAddress;
use crate::meshtastic::PortNum;
use crate::sensor::sht31::SHT31_DEFAULT_ADDR;
use crate::uplink::encoder::WireFormat;
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Mesh hop limit ceiling (3 bits in the Meshtastic header).
pub const MAX_HOP_LIMIT: u8 = 7;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub uplink: UplinkConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub encoding: EncodingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduling and radio parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UplinkConfig {
    /// Sampling period (ms). Each cycle aims to start this long after the previous one.
    pub period_ms: u64,
    /// Minimum gap between broadcasts (ms). Unset means every successful sample is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_interval_ms: Option<u64>,
    /// Delay after a failed sensor read (ms). Must be shorter than `period_ms`.
    pub retry_delay_ms: u64,
    /// Base delay when a cycle took longer than the period (ms).
    pub overrun_delay_ms: u64,
    /// Upper bound (exclusive) of the random delay added to every wake (ms).
    pub jitter_ms: u64,
    pub hop_limit: u8,
    pub port: PortNum,
    /// Largest payload handed to the radio, and the inbound parse capacity.
    pub max_payload: usize,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            period_ms: 10_000,
            broadcast_interval_ms: None,
            retry_delay_ms: 2_000,
            overrun_delay_ms: 1_000,
            jitter_ms: 500,
            hop_limit: 3,
            port: PortNum::PrivateApp,
            max_payload: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    /// Analog pin, averaged and converted to volts.
    Adc,
    /// SHT31 temperature / humidity on I2C.
    Sht31,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub backend: SensorBackend,
    pub adc_pin: u8,
    pub adc_bits: u8,
    pub vref_volts: f32,
    pub sample_count: u32,
    pub sample_delay_us: u64,
    pub sht31_addr: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            backend: SensorBackend::Adc,
            adc_pin: 2,
            adc_bits: 12,
            vref_volts: 3.3,
            sample_count: 16,
            sample_delay_us: 200,
            sht31_addr: SHT31_DEFAULT_ADDR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EncodingConfig {
    #[serde(default)]
    pub format: WireFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Peers shown per frame; the rest are summarised as "+N more".
    pub max_peers: usize,
    pub refresh_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_peers: 2,
            refresh_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeviceConfig {
    /// Hardware address, e.g. "24:6F:28:A1:AB:CD". Random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl DeviceConfig {
    pub fn mac_address(&self) -> Result<Option<MacAddress>> {
        self.mac
            .as_deref()
            .map(|s| s.parse::<MacAddress>())
            .transpose()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let content = toml::to_string_pretty(&Config::default())
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// SHT31 deployment: sample every second for the display, broadcast every
    /// 30 seconds, human-readable messages on the text port.
    pub fn climate_preset() -> Self {
        Config {
            uplink: UplinkConfig {
                period_ms: 1_000,
                broadcast_interval_ms: Some(30_000),
                retry_delay_ms: 500,
                port: PortNum::TextMessage,
                ..UplinkConfig::default()
            },
            sensor: SensorConfig {
                backend: SensorBackend::Sht31,
                ..SensorConfig::default()
            },
            encoding: EncodingConfig {
                format: WireFormat::Text,
            },
            ..Config::default()
        }
    }

    /// Reject values the scheduler or codecs cannot work with.
    pub fn validate(&self) -> Result<()> {
        let u = &self.uplink;
        if u.period_ms == 0 {
            bail!("uplink.period_ms must be greater than 0");
        }
        if u.retry_delay_ms == 0 || u.retry_delay_ms >= u.period_ms {
            bail!(
                "uplink.retry_delay_ms ({}) must be between 1 and period_ms ({})",
                u.retry_delay_ms,
                u.period_ms
            );
        }
        if u.jitter_ms == 0 {
            bail!("uplink.jitter_ms must be greater than 0");
        }
        if u.hop_limit > MAX_HOP_LIMIT {
            bail!("uplink.hop_limit ({}) exceeds {}", u.hop_limit, MAX_HOP_LIMIT);
        }
        if u.max_payload == 0 {
            bail!("uplink.max_payload must be greater than 0");
        }
        if u.broadcast_interval_ms == Some(0) {
            bail!("uplink.broadcast_interval_ms must be greater than 0 when set");
        }
        let s = &self.sensor;
        if !(1..=16).contains(&s.adc_bits) {
            bail!("sensor.adc_bits ({}) must be within 1..=16", s.adc_bits);
        }
        if s.sample_count == 0 {
            bail!("sensor.sample_count must be greater than 0");
        }
        // 16 samples of 200us is the firmware budget; cap total blocking at 100ms.
        if s.sample_count as u64 * s.sample_delay_us > 100_000 {
            bail!("sensor sampling would block for more than 100ms per cycle");
        }
        if !(s.vref_volts.is_finite() && s.vref_volts > 0.0) {
            bail!("sensor.vref_volts must be a positive number");
        }
        self.device.mac_address()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_adc_firmware() {
        let c = Config::default();
        assert_eq!(c.uplink.period_ms, 10_000);
        assert_eq!(c.uplink.hop_limit, 3);
        assert_eq!(c.uplink.broadcast_interval_ms, None);
        assert_eq!(c.sensor.backend, SensorBackend::Adc);
        assert_eq!(c.sensor.adc_pin, 2);
        assert_eq!(c.sensor.adc_bits, 12);
        assert_eq!(c.sensor.sample_count, 16);
        assert_eq!(c.encoding.format, WireFormat::Json);
        assert_eq!(c.display.max_peers, 2);
        c.validate().unwrap();
    }

    #[test]
    fn climate_preset_is_dual_rate() {
        let c = Config::climate_preset();
        assert_eq!(c.uplink.period_ms, 1_000);
        assert_eq!(c.uplink.broadcast_interval_ms, Some(30_000));
        assert_eq!(c.sensor.backend, SensorBackend::Sht31);
        assert_eq!(c.sensor.sht31_addr, 0x44);
        c.validate().unwrap();
    }

    #[test]
    fn retry_must_be_shorter_than_period() {
        let mut c = Config::default();
        c.uplink.retry_delay_ms = c.uplink.period_ms;
        assert!(c.validate().is_err());
    }

    #[test]
    fn bad_adc_bits_rejected() {
        let mut c = Config::default();
        c.sensor.adc_bits = 17;
        assert!(c.validate().is_err());
        c.sensor.adc_bits = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn bad_mac_rejected() {
        let mut c = Config::default();
        c.device.mac = Some("not-a-mac".into());
        assert!(c.validate().is_err());
        c.device.mac = Some("24:6F:28:A1:AB:CD".into());
        assert_eq!(
            c.device.mac_address().unwrap().unwrap().0,
            [0x24, 0x6F, 0x28, 0xA1, 0xAB, 0xCD]
        );
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str(
            r#"
            [sensor]
            backend = "sht31"
            adc_pin = 4
            adc_bits = 12
            vref_volts = 3.3
            sample_count = 8
            sample_delay_us = 100
            sht31_addr = 69

            [encoding]
            format = "json-nested"
            "#,
        )
        .unwrap();
        assert_eq!(c.sensor.backend, SensorBackend::Sht31);
        assert_eq!(c.sensor.sht31_addr, 0x45);
        assert_eq!(c.encoding.format, WireFormat::JsonNested);
        assert_eq!(c.uplink.period_ms, 10_000);
        assert_eq!(c.logging.level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn default_config_serializes_to_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(s.contains("period_ms = 10000"));
        assert!(s.contains("port = \"private_app\""));
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.uplink.max_payload, 256);
    }
}
