//! # Configuration
//!
//! Booking settings are kept in a YAML file. Every section has defaults
//! matching the booking page, so an absent file or an absent key behaves
//! the same as the defaults.
//!
//! Lookup order for `BookingConfig::load`:
//! 1. an explicit path
//! 2. the `BOOKING_CONFIG` environment variable
//! 3. built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::errors::{BookingError, BookingResult};
use crate::domain::time_slots::{slot_universe, SlotTime};

pub const CONFIG_ENV_VAR: &str = "BOOKING_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub slots: SlotConfig,
    pub simulation: SimulationConfig,
    pub fetch: FetchConfig,
    pub alerts: AlertsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    pub first_slot: String,
    pub last_slot: String,
    pub interval_minutes: u32,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            first_slot: "09:00".to_string(),
            last_slot: "16:30".to_string(),
            interval_minutes: 30,
        }
    }
}

/// Placeholder availability data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub delay_ms: u64,
    /// Booked counts are drawn from 0..max_booked_draw, then clamped to the slot total
    pub max_booked_draw: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            delay_ms: 300,
            max_booked_draw: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_attempts: 3,
            initial_backoff_ms: 200,
            backoff_multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub toast_timer_ms: u64,
    pub toast_position: String,
    /// Answer given by non-interactive notifiers to confirmation prompts
    pub confirm_default: bool,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            toast_timer_ms: 3000,
            toast_position: "top-end".to_string(),
            confirm_default: false,
        }
    }
}

/// Timeout and retry settings applied to every availability lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchConfig::default().policy()
    }
}

impl FetchConfig {
    pub fn policy(&self) -> FetchPolicy {
        FetchPolicy {
            timeout: Duration::from_millis(self.timeout_ms),
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            backoff_multiplier: self.backoff_multiplier.max(1),
        }
    }
}

impl SlotConfig {
    /// Parse the configured bounds into the ordered slot universe
    pub fn universe(&self) -> BookingResult<Vec<SlotTime>> {
        let first: SlotTime = self.first_slot.parse()?;
        let last: SlotTime = self.last_slot.parse()?;
        let slots = slot_universe(first, last, self.interval_minutes);
        if slots.is_empty() {
            return Err(BookingError::Config(format!(
                "slot range {}..{} every {} minutes is empty",
                self.first_slot, self.last_slot, self.interval_minutes
            )));
        }
        Ok(slots)
    }
}

impl BookingConfig {
    /// Load the configuration, falling back to defaults when no file exists
    pub fn load(path: Option<&Path>) -> BookingResult<Self> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        match path {
            Some(path) if path.exists() => Self::from_file(&path),
            Some(path) => {
                log::warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                log::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> BookingResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BookingError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&content)?;
        log::info!("📋 Loaded booking config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> BookingResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| BookingError::Config(format!("invalid YAML: {}", e)))?;
        config.slots.universe()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> BookingResult<String> {
        serde_yaml::to_string(self).map_err(|e| BookingError::Config(e.to_string()))
    }
}
