//! Engine and session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Configuration for the status engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
  /// Multiplier applied to every authored delay. `1.0` plays scripts at
  /// their authored pace, `0.5` twice as fast, `0.0` without waiting.
  pub delay_scale: f64,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self { delay_scale: 1.0 }
  }
}

impl EngineConfig {
  /// Play scripts `speed` times faster than authored.
  pub fn with_speed(speed: f64) -> Result<Self, EngineError> {
    if !speed.is_finite() || speed <= 0.0 {
      return Err(EngineError::InvalidConfig {
        message: format!("speed must be a positive number, got {}", speed),
      });
    }
    Ok(Self {
      delay_scale: 1.0 / speed,
    })
  }

  /// Apply every tick as soon as the runner gets to it.
  pub fn instant() -> Self {
    Self { delay_scale: 0.0 }
  }

  pub fn validate(&self) -> Result<(), EngineError> {
    if !self.delay_scale.is_finite() || self.delay_scale < 0.0 {
      return Err(EngineError::InvalidConfig {
        message: format!(
          "delay_scale must be finite and non-negative, got {}",
          self.delay_scale
        ),
      });
    }
    Ok(())
  }

  /// Scale an authored delay. Saturates at `Duration::MAX`.
  pub fn scale(&self, delay: Duration) -> Duration {
    if self.delay_scale == 0.0 {
      return Duration::ZERO;
    }
    Duration::try_from_secs_f64(delay.as_secs_f64() * self.delay_scale).unwrap_or(Duration::MAX)
  }
}

/// Configuration for a gesture-driven [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
  /// Capacity of the gesture channel.
  pub gesture_buffer: usize,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      gesture_buffer: 100,
    }
  }
}

impl SessionConfig {
  pub fn validate(&self) -> Result<(), EngineError> {
    if self.gesture_buffer == 0 {
      return Err(EngineError::InvalidConfig {
        message: "gesture_buffer must be at least 1".to_string(),
      });
    }
    Ok(())
  }
}
