use hashmatch_cascade::CascadeConfig;
use hashmatch_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings of a cascade hashing matching run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Nearest to second nearest distance ratio, applied squared
    #[serde(default = "default_distance_ratio")]
    pub distance_ratio: f32,
    #[serde(default)]
    pub cascade: CascadeConfig,
}

fn default_distance_ratio() -> f32 {
    0.8
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            distance_ratio: default_distance_ratio(),
            cascade: CascadeConfig::default(),
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.distance_ratio.is_finite() || self.distance_ratio <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "distance_ratio must be a positive number, got {}",
                self.distance_ratio
            )));
        }
        self.cascade.validate()
    }
}
