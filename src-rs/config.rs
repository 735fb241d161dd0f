use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DARK_THRESHOLD: f64 = 60.0;
pub const DEFAULT_ARTIFACT_LOW: f64 = 30.0;
pub const DEFAULT_ARTIFACT_HIGH: f64 = 250.0;
pub const DEFAULT_ARTIFACT_RATIO: f64 = 0.05;
pub const DEFAULT_MIN_REGION_SIDE: u32 = 5;

/// Tunable thresholds. The dark and artifact thresholds answer different
/// questions and are kept separate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Pixels with luminance strictly below this are part of a block.
    pub dark_threshold: f64,
    /// Exclusive lower bound of the suspicious luminance band.
    pub artifact_low: f64,
    /// Exclusive upper bound of the suspicious luminance band.
    pub artifact_high: f64,
    /// Suspicious pixel share above which a block counts as lazy.
    pub artifact_ratio: f64,
    /// Detected regions narrower or shorter than this are dropped.
    pub min_region_side: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dark_threshold: DEFAULT_DARK_THRESHOLD,
            artifact_low: DEFAULT_ARTIFACT_LOW,
            artifact_high: DEFAULT_ARTIFACT_HIGH,
            artifact_ratio: DEFAULT_ARTIFACT_RATIO,
            min_region_side: DEFAULT_MIN_REGION_SIDE,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| AnalysisError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("dark_threshold", self.dark_threshold),
            ("artifact_low", self.artifact_low),
            ("artifact_high", self.artifact_high),
            ("artifact_ratio", self.artifact_ratio),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{name} must be finite"
                )));
            }
        }
        if self.artifact_low >= self.artifact_high {
            return Err(AnalysisError::InvalidConfig(format!(
                "artifact_low ({}) must be below artifact_high ({})",
                self.artifact_low, self.artifact_high
            )));
        }
        if !(0.0..=1.0).contains(&self.artifact_ratio) {
            return Err(AnalysisError::InvalidConfig(format!(
                "artifact_ratio ({}) must be within [0, 1]",
                self.artifact_ratio
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = AnalysisConfig::from_json(r#"{"dark_threshold": 80}"#).unwrap();
        assert_eq!(config.dark_threshold, 80.0);
        assert_eq!(config.artifact_low, DEFAULT_ARTIFACT_LOW);
        assert_eq!(config.min_region_side, DEFAULT_MIN_REGION_SIDE);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(
            AnalysisConfig::from_json("{}").unwrap(),
            AnalysisConfig::default()
        );
    }

    #[test]
    fn rejects_inverted_band() {
        let err = AnalysisConfig::from_json(r#"{"artifact_low": 200, "artifact_high": 100}"#)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_ratio_out_of_range() {
        assert!(AnalysisConfig::from_json(r#"{"artifact_ratio": 1.5}"#).is_err());
        assert!(AnalysisConfig::from_json(r#"{"artifact_ratio": -0.1}"#).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(AnalysisConfig::from_json("{").is_err());
    }
}
