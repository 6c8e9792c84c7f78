//! Configuration for capture sessions.
//!
//! All tunables of the revelation loop, the settle-delay policy and the block
//! fingerprint live here so a host can load them from a single JSON file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Adaptive render-settle delay policy.
///
/// After a step that discovered new blocks the delay grows by `step_ms` (up to
/// `max_ms`); once more than `idle_steps_before_decay` consecutive steps found
/// nothing new it shrinks by `step_ms` (down to `min_ms`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlePolicy {
    /// Delay used for the first advancing step
    pub initial_ms: u64,
    /// Lower bound for the delay
    pub min_ms: u64,
    /// Upper bound for the delay
    pub max_ms: u64,
    /// Amount added or removed per adjustment
    pub step_ms: u64,
    /// Idle steps tolerated before the delay starts shrinking
    pub idle_steps_before_decay: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            initial_ms: 400,
            min_ms: 200,
            max_ms: 600,
            step_ms: 50,
            idle_steps_before_decay: 2,
        }
    }
}

impl SettlePolicy {
    /// Delay to use for the very first advancing step.
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms.clamp(self.min_ms, self.max_ms))
    }

    /// Compute the delay for the next step.
    ///
    /// # Arguments
    ///
    /// * `current` - Delay used for the step that just finished
    /// * `discovered_new` - Whether that step stored at least one new block
    /// * `idle_streak` - Consecutive steps (including this one) without new blocks
    pub fn next_delay(
        &self,
        current: Duration,
        discovered_new: bool,
        idle_streak: u32,
    ) -> Duration {
        let current_ms = current.as_millis() as u64;
        let next_ms = if discovered_new {
            current_ms.saturating_add(self.step_ms).min(self.max_ms)
        } else if idle_streak > self.idle_steps_before_decay {
            current_ms.saturating_sub(self.step_ms).max(self.min_ms)
        } else {
            current_ms
        };
        Duration::from_millis(next_ms)
    }
}

/// Block fingerprint parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Number of leading characters of the block text that enter the hash
    pub prefix_chars: usize,
    /// Height in pixels of one position bucket
    pub bucket_px: f64,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            prefix_chars: 50,
            bucket_px: 8.0,
        }
    }
}

/// Capture session configuration.
///
/// # Examples
///
/// ```
/// use vdom_capture::config::CaptureConfig;
///
/// let config = CaptureConfig::default().with_max_steps(50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Fraction of the visible extent advanced per step (overlapping windows)
    pub step_fraction: f64,
    /// Distance from the maximum scroll offset that counts as the end
    pub end_tolerance_px: f64,
    /// Hard ceiling on advancing steps
    pub max_steps: u32,
    /// Settle delay after resetting the viewport to the top
    pub reset_delay_ms: u64,
    /// Adaptive settle delay policy
    pub settle: SettlePolicy,
    /// Block fingerprint parameters
    pub fingerprint: FingerprintConfig,
    /// Text emitted in place of images
    pub placeholder_image_text: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            step_fraction: 0.8,
            end_tolerance_px: 4.0,
            max_steps: 400,
            reset_delay_ms: 150,
            settle: SettlePolicy::default(),
            fingerprint: FingerprintConfig::default(),
            placeholder_image_text: "[image]".to_string(),
        }
    }

    /// Short settles and larger steps, for documents that render quickly.
    pub fn fast() -> Self {
        Self {
            step_fraction: 0.9,
            reset_delay_ms: 50,
            settle: SettlePolicy {
                initial_ms: 150,
                min_ms: 50,
                max_ms: 300,
                step_ms: 25,
                idle_steps_before_decay: 1,
            },
            ..Self::new()
        }
    }

    /// Long settles and smaller steps, for slow or heavily virtualized documents.
    pub fn thorough() -> Self {
        Self {
            step_fraction: 0.6,
            reset_delay_ms: 300,
            max_steps: 1000,
            settle: SettlePolicy {
                initial_ms: 600,
                min_ms: 300,
                max_ms: 1200,
                step_ms: 100,
                idle_steps_before_decay: 3,
            },
            ..Self::new()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the step ceiling.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the fraction of the viewport advanced per step.
    pub fn with_step_fraction(mut self, fraction: f64) -> Self {
        self.step_fraction = fraction;
        self
    }

    /// Replace the settle policy.
    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Replace the fingerprint parameters.
    pub fn with_fingerprint(mut self, fingerprint: FingerprintConfig) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Settle delay after the initial reset to the top.
    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    /// Check every value is within its usable range.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_fraction > 0.0 && self.step_fraction <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "step_fraction must be in (0, 1], got {}",
                self.step_fraction
            )));
        }
        if self.end_tolerance_px < 0.0 || !self.end_tolerance_px.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "end_tolerance_px must be a non-negative number, got {}",
                self.end_tolerance_px
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("max_steps must be at least 1".to_string()));
        }
        if self.settle.min_ms > self.settle.max_ms {
            return Err(Error::InvalidConfig(format!(
                "settle.min_ms ({}) exceeds settle.max_ms ({})",
                self.settle.min_ms, self.settle.max_ms
            )));
        }
        if !(self.fingerprint.bucket_px > 0.0 && self.fingerprint.bucket_px.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "fingerprint.bucket_px must be positive, got {}",
                self.fingerprint.bucket_px
            )));
        }
        if self.fingerprint.prefix_chars == 0 {
            return Err(Error::InvalidConfig(
                "fingerprint.prefix_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(CaptureConfig::default().validate().is_ok());
        assert!(CaptureConfig::fast().validate().is_ok());
        assert!(CaptureConfig::thorough().validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(CaptureConfig::new().with_step_fraction(0.0).validate().is_err());
        assert!(CaptureConfig::new().with_step_fraction(1.5).validate().is_err());
        assert!(CaptureConfig::new().with_max_steps(0).validate().is_err());

        let inverted = SettlePolicy {
            min_ms: 700,
            max_ms: 100,
            ..Default::default()
        };
        assert!(CaptureConfig::new().with_settle(inverted).validate().is_err());

        let flat = FingerprintConfig {
            bucket_px: 0.0,
            ..Default::default()
        };
        assert!(CaptureConfig::new().with_fingerprint(flat).validate().is_err());
    }

    #[test]
    fn test_settle_grows_on_discovery() {
        let policy = SettlePolicy::default();
        let next = policy.next_delay(Duration::from_millis(400), true, 0);
        assert_eq!(next, Duration::from_millis(450));

        let capped = policy.next_delay(Duration::from_millis(590), true, 0);
        assert_eq!(capped, Duration::from_millis(600));
    }

    #[test]
    fn test_settle_decays_after_idle_streak() {
        let policy = SettlePolicy::default();
        // Streak not long enough yet
        assert_eq!(
            policy.next_delay(Duration::from_millis(400), false, 2),
            Duration::from_millis(400)
        );
        assert_eq!(
            policy.next_delay(Duration::from_millis(400), false, 3),
            Duration::from_millis(350)
        );
        assert_eq!(
            policy.next_delay(Duration::from_millis(220), false, 9),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CaptureConfig = serde_json::from_str(r#"{"max_steps": 12}"#).unwrap();
        assert_eq!(config.max_steps, 12);
        assert_eq!(config.step_fraction, 0.8);
        assert_eq!(config.settle, SettlePolicy::default());
    }
}
