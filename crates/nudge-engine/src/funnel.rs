// SPDX-FileCopyrightText: 2026 Nudge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation thresholds.

use serde::{Deserialize, Serialize};

use nudge_config::model::FunnelSeedConfig;
use nudge_core::NudgeError;

/// Number of escalation levels above "fresh".
pub const LEVEL_COUNT: usize = 3;

/// Ordered escalation thresholds in minutes.
///
/// Invariant: every threshold is positive and `level1 < level2 < level3`.
/// Mutations that would break it are rejected and leave the prior value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelConfig {
    thresholds: [u32; LEVEL_COUNT],
}

impl Default for FunnelConfig {
    fn default() -> Self {
        Self {
            thresholds: [60, 180, 300],
        }
    }
}

impl FunnelConfig {
    /// Builds a funnel from explicit thresholds, validating the ordering.
    pub fn new(thresholds: [u32; LEVEL_COUNT]) -> Result<Self, NudgeError> {
        validate(&thresholds)?;
        Ok(Self { thresholds })
    }

    /// Builds the funnel from the configuration seed.
    pub fn from_seed(seed: &FunnelSeedConfig) -> Result<Self, NudgeError> {
        Self::new(seed.thresholds())
    }

    pub fn thresholds(&self) -> [u32; LEVEL_COUNT] {
        self.thresholds
    }

    /// Threshold for `level` (1-based).
    pub fn threshold(&self, level: u8) -> Option<u32> {
        level
            .checked_sub(1)
            .and_then(|i| self.thresholds.get(usize::from(i)).copied())
    }

    /// Returns `true` if the persisted value still satisfies the invariant.
    pub fn is_valid(&self) -> bool {
        validate(&self.thresholds).is_ok()
    }

    /// Changes one threshold.
    pub fn set_threshold(&mut self, level: u8, minutes: u32) -> Result<(), NudgeError> {
        let index = match level {
            1..=3 => usize::from(level - 1),
            _ => {
                return Err(NudgeError::Validation(format!(
                    "funnel level must be between 1 and {LEVEL_COUNT}, got {level}"
                )));
            }
        };
        let mut candidate = self.thresholds;
        candidate[index] = minutes;
        validate(&candidate)?;
        self.thresholds = candidate;
        Ok(())
    }

    /// Highest level whose threshold is at most `elapsed_minutes`, or 0.
    pub fn level_for(&self, elapsed_minutes: i64) -> u8 {
        self.thresholds
            .iter()
            .take_while(|&&t| i64::from(t) <= elapsed_minutes)
            .count() as u8
    }
}

fn validate(thresholds: &[u32; LEVEL_COUNT]) -> Result<(), NudgeError> {
    if thresholds.iter().any(|&t| t == 0) {
        return Err(NudgeError::Validation(
            "funnel thresholds must be positive".into(),
        ));
    }
    if thresholds.windows(2).any(|w| w[0] >= w[1]) {
        return Err(NudgeError::Validation(format!(
            "funnel thresholds must be strictly increasing, got {thresholds:?}"
        )));
    }
    Ok(())
}
