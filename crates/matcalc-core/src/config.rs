//! Heuristic constants used by the coverage engines.

use serde::{Deserialize, Serialize};

use crate::types::{EstimatorError, FitMode, Result};

/// Roll goods are cut and priced in steps of this length.
pub const ROLL_LENGTH_STEP_CM: u32 = 50;

/// Largest room side, and largest piece offset from the origin, the engines accept.
/// Input is clamped to it; engines return no covering for anything larger.
pub const MAX_DIMENSION_CM: u32 = 10_000;

/// Resolution of the occupancy grid for complex tile spaces.
pub const GRID_CELL_CM: u32 = 50;

/// Highest count tried for a single roll width.
pub const MAX_SINGLE_WIDTH_COUNT: u32 = 10;

/// Highest count tried per width when mixing two widths.
pub const MAX_PAIR_WIDTH_COUNT: u32 = 5;

/// 50cm tiles are sold in packs of this many.
pub const TILES_PER_PACK: u32 = 4;

/// Grid spacing hints passed along with visualization geometry.
pub const GRID_MINOR_CM: u32 = 10;
pub const GRID_MAJOR_CM: u32 = 50;

/// A single-width combination that is preferred for a range of target widths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferredWidth {
    pub width: u32,
    pub count: u32,
    pub mode: FitMode,
}

/// Applies when the target width lies in `min..=max`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferredWidthRule {
    pub min: u32,
    pub max: u32,
    pub prefer: Vec<PreferredWidth>,
}

impl PreferredWidthRule {
    pub fn applies_to(&self, target_width: u32) -> bool {
        (self.min..=self.max).contains(&target_width)
    }
}

/// Tuning knobs for the search and rounding heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// How far an exact width combination may overshoot the target
    pub exact_overage_cap_cm: u32,
    /// Looser overshoot cap for the second exact candidate pool
    pub extended_overage_cap_cm: u32,
    /// A roll length is rounded down instead of up when it falls short by at most this much
    pub length_relaxation_cm: u32,
    /// Hybrid tile auto mode rounds an axis up once the loose shortfall reaches this
    pub hybrid_auto_threshold_cm: u32,
    /// Complex roll variants whose prices differ by no more than this count as tied
    pub variant_price_tolerance: u64,
    pub preferred_width_rules: Vec<PreferredWidthRule>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        let exact = |width, count| PreferredWidth {
            width,
            count,
            mode: FitMode::Exact,
        };

        Self {
            exact_overage_cap_cm: 30,
            extended_overage_cap_cm: 60,
            length_relaxation_cm: 20,
            hybrid_auto_threshold_cm: 25,
            variant_price_tolerance: 100,
            preferred_width_rules: vec![
                PreferredWidthRule {
                    min: 150,
                    max: 170,
                    prefer: vec![exact(110, 2)],
                },
                PreferredWidthRule {
                    min: 180,
                    max: 190,
                    prefer: vec![exact(110, 2), exact(120, 2)],
                },
            ],
        }
    }
}

impl EstimatorConfig {
    /// Rejects settings the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.extended_overage_cap_cm < self.exact_overage_cap_cm {
            return Err(EstimatorError::InvalidInput(format!(
                "extended overage cap ({}cm) is smaller than the exact overage cap ({}cm)",
                self.extended_overage_cap_cm, self.exact_overage_cap_cm
            )));
        }

        if self.length_relaxation_cm >= ROLL_LENGTH_STEP_CM {
            return Err(EstimatorError::InvalidInput(format!(
                "length relaxation must stay below {ROLL_LENGTH_STEP_CM}cm"
            )));
        }

        for rule in &self.preferred_width_rules {
            if rule.min > rule.max {
                return Err(EstimatorError::InvalidInput(format!(
                    "preferred width rule {}..{} is empty",
                    rule.min, rule.max
                )));
            }
        }

        Ok(())
    }

    /// First preferred-width rule covering `target_width`
    pub fn preferred_rule(&self, target_width: u32) -> Option<&PreferredWidthRule> {
        self.preferred_width_rules
            .iter()
            .find(|rule| rule.applies_to(target_width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EstimatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EstimatorConfig =
            serde_json::from_str(r#"{"exact_overage_cap_cm": 40}"#).unwrap();
        assert_eq!(config.exact_overage_cap_cm, 40);
        assert_eq!(config.extended_overage_cap_cm, 60);
        assert_eq!(config.preferred_width_rules.len(), 2);
    }

    #[test]
    fn test_rejects_inverted_caps() {
        let config = EstimatorConfig {
            exact_overage_cap_cm: 80,
            ..EstimatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preferred_rule_lookup() {
        let config = EstimatorConfig::default();
        assert_eq!(config.preferred_rule(160).map(|r| r.min), Some(150));
        assert_eq!(config.preferred_rule(185).map(|r| r.min), Some(180));
        assert!(config.preferred_rule(175).is_none());
    }
}
