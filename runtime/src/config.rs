//! Configuration management for the runtime.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use watchface_core::device::parse_security_patch;
use watchface_core::{DeviceFamily, DeviceProfile};

pub const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_COMPANION_CAPABILITY: &str = "pixel_minimal_companion";
pub const DEFAULT_WATCH_CAPABILITY: &str = "pixel_minimal_watch";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Device family, drives the OEM workarounds
    pub device_family: DeviceFamily,
    /// OS build incremental, e.g. `R890XXU1EVA8`
    pub os_incremental: String,
    /// OS security patch level, `YYYY-MM-DD`
    pub os_security_patch: Option<String>,
    /// Upper bound for every peer round-trip
    pub peer_timeout: Duration,
    /// Capability advertised by the phone app
    pub companion_capability: String,
    /// Capability advertised by the watch app
    pub watch_capability: String,
    /// JSON settings file. In-memory settings when unset.
    pub settings_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_family: DeviceFamily::Generic,
            os_incremental: String::new(),
            os_security_patch: None,
            peer_timeout: Duration::from_millis(DEFAULT_PEER_TIMEOUT_MS),
            companion_capability: DEFAULT_COMPANION_CAPABILITY.to_string(),
            watch_capability: DEFAULT_WATCH_CAPABILITY.to_string(),
            settings_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let device_family = env::var("WATCHFACE_DEVICE_FAMILY")
            .unwrap_or_else(|_| "generic".to_string())
            .parse()
            .map_err(ConfigError::InvalidDeviceFamily)?;

        let peer_timeout_ms: u64 = env::var("WATCHFACE_PEER_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_PEER_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPeerTimeout)?;

        let companion_capability = env::var("WATCHFACE_COMPANION_CAPABILITY")
            .unwrap_or_else(|_| DEFAULT_COMPANION_CAPABILITY.to_string());
        let watch_capability = env::var("WATCHFACE_WATCH_CAPABILITY")
            .unwrap_or_else(|_| DEFAULT_WATCH_CAPABILITY.to_string());

        let settings_path = env::var("WATCHFACE_SETTINGS_PATH").ok().map(PathBuf::from);
        let os_incremental = env::var("WATCHFACE_OS_INCREMENTAL").unwrap_or_default();

        let os_security_patch = env::var("WATCHFACE_OS_SECURITY_PATCH").ok();
        if let Some(patch) = &os_security_patch {
            if parse_security_patch(patch).is_none() {
                return Err(ConfigError::InvalidSecurityPatch(patch.clone()));
            }
        }

        Ok(Self {
            device_family,
            os_incremental,
            os_security_patch,
            peer_timeout: Duration::from_millis(peer_timeout_ms),
            companion_capability,
            watch_capability,
            settings_path,
        })
    }

    /// The device identity used by the quirk gates.
    pub fn device_profile(&self) -> DeviceProfile {
        let patch = self
            .os_security_patch
            .as_deref()
            .and_then(parse_security_patch);
        DeviceProfile::new(self.device_family).with_os(self.os_incremental.clone(), patch)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid WATCHFACE_DEVICE_FAMILY: {0}")]
    InvalidDeviceFamily(String),

    #[error("Invalid WATCHFACE_PEER_TIMEOUT_MS value")]
    InvalidPeerTimeout,

    #[error("Invalid WATCHFACE_OS_SECURITY_PATCH value: {0}")]
    InvalidSecurityPatch(String),
}
