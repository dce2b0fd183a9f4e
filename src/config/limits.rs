//! Soft limit configuration and types.

use serde::Deserialize;

use super::units::Distance;

/// Policy for handling limit violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitPolicy {
    /// Reject moves that would exceed limits.
    #[default]
    Reject,
    /// Clamp target to nearest limit.
    Clamp,
}

/// Soft limits in distance units (from configuration).
///
/// Enforced in software before any transport call; distinct from the
/// controller's own limit switch inputs.
#[derive(Debug, Clone, Deserialize)]
pub struct SoftLimits {
    /// Minimum allowed position.
    #[serde(rename = "min_distance")]
    pub min: Distance,

    /// Maximum allowed position.
    #[serde(rename = "max_distance")]
    pub max: Distance,

    /// What to do when a limit is exceeded.
    #[serde(default)]
    pub policy: LimitPolicy,
}

impl SoftLimits {
    /// Create new soft limits.
    pub fn new(min: Distance, max: Distance, policy: LimitPolicy) -> Self {
        Self { min, max, policy }
    }

    /// Check if limits are valid (min < max).
    pub fn is_valid(&self) -> bool {
        self.min.0 < self.max.0
    }

    /// Check if a position is within limits.
    pub fn contains(&self, position: Distance) -> bool {
        position.0 >= self.min.0 && position.0 <= self.max.0
    }
}

/// Soft limits converted to steps.
///
/// Derived from [`SoftLimits`] at check time with the *current* microstep
/// factor, so a microstep change can never leave limits stale.
#[derive(Debug, Clone, Copy)]
pub struct StepLimits {
    /// Minimum position in steps.
    pub min_steps: i32,
    /// Maximum position in steps.
    pub max_steps: i32,
    /// Limit policy.
    pub policy: LimitPolicy,
}

impl StepLimits {
    /// Create step limits from soft limits and a steps-per-distance factor.
    pub fn from_soft_limits(soft: &SoftLimits, steps_per_unit: f32) -> Self {
        Self {
            min_steps: (soft.min.0 * steps_per_unit) as i32,
            max_steps: (soft.max.0 * steps_per_unit) as i32,
            policy: soft.policy,
        }
    }

    /// Check if a position is within limits.
    pub fn contains(&self, steps: i32) -> bool {
        steps >= self.min_steps && steps <= self.max_steps
    }

    /// Apply limit policy to a target position.
    ///
    /// Returns `Some(steps)` if valid or clamped, `None` if rejected.
    pub fn apply(&self, target: i32) -> Option<i32> {
        if self.contains(target) {
            Some(target)
        } else {
            match self.policy {
                LimitPolicy::Reject => None,
                LimitPolicy::Clamp => {
                    if target < self.min_steps {
                        Some(self.min_steps)
                    } else {
                        Some(self.max_steps)
                    }
                }
            }
        }
    }
}
