//! Engine settings and level tables
//!
//! Everything the host may tune lives here. Loaded from JSON when the host
//! supplies one, otherwise the defaults reproduce the classic game.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Geometry used to decide when a dot is captured by the player dot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CaptureRule {
    /// Dot must sit fully inside the player circle: `distance + r <= R`
    #[default]
    Containment,
    /// Any intersection counts: `distance <= r + R`
    Overlap,
}

/// What ends a level in defeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LossRule {
    /// Lost once the player dot has shrunk away without reaching the threshold
    #[default]
    PlayerExpired,
    /// Lost once the level has run this many ticks since leaving Begin
    Timeout { ticks: u32 },
}

/// Population and win threshold of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub total_dots: u8,
    pub win_threshold: u8,
}

impl LevelSpec {
    pub const fn new(total_dots: u8, win_threshold: u8) -> Self {
        Self {
            total_dots,
            win_threshold,
        }
    }

    /// Size a custom level: threshold is `ceil(total * ratio)`, never above total
    pub fn scaled(total_dots: u8, ratio: f32) -> Self {
        let total_dots = total_dots.min(MAX_DOTS);
        // Tolerance keeps 60 * (2/3 as f32) at 40 instead of rounding up to 41
        let threshold = (f32::from(total_dots) * ratio - 1e-4).ceil().max(0.0) as u8;
        Self {
            total_dots,
            win_threshold: threshold.min(total_dots),
        }
    }
}

/// Classic level table: (total_dots, win_threshold)
pub const DEFAULT_LEVELS: [LevelSpec; 12] = [
    LevelSpec::new(5, 1),
    LevelSpec::new(10, 2),
    LevelSpec::new(15, 3),
    LevelSpec::new(20, 5),
    LevelSpec::new(25, 7),
    LevelSpec::new(30, 10),
    LevelSpec::new(35, 15),
    LevelSpec::new(40, 21),
    LevelSpec::new(45, 27),
    LevelSpec::new(50, 33),
    LevelSpec::new(55, 44),
    LevelSpec::new(60, 50),
];

/// Configuration problems detected before the engine starts
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Parse(String),
    #[error("canvas must be non-empty, got {width}x{height}")]
    EmptyCanvas { width: u16, height: u16 },
    #[error("updates_per_second must be positive, got {0}")]
    BadRate(f64),
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("level table is empty")]
    NoLevels,
    #[error("start_level {0} is outside the level table")]
    UnknownLevel(u8),
    #[error("level {level}: win threshold {win_threshold} exceeds {total_dots} dots")]
    ThresholdTooHigh {
        level: usize,
        total_dots: u8,
        win_threshold: u8,
    },
    #[error("level {level}: {total_dots} dots exceeds the maximum of {max}", max = MAX_DOTS)]
    TooManyDots { level: usize, total_dots: u8 },
    #[error("custom_win_ratio must be in (0, 1], got {0}")]
    BadRatio(f32),
    #[error("loss timeout must be at least one tick")]
    ZeroTimeout,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Canvas ===
    pub width: u16,
    pub height: u16,

    // === Timing ===
    /// Simulation steps per second of wall-clock time
    pub updates_per_second: f64,

    // === Determinism ===
    pub seed: u64,

    // === Levels ===
    /// 1-based index into `levels`
    pub start_level: u8,
    /// Overrides the first level's population (threshold via `custom_win_ratio`)
    pub start_dots: Option<u8>,
    pub levels: Vec<LevelSpec>,
    /// Win threshold fraction for custom-sized levels
    pub custom_win_ratio: f32,

    // === Dots ===
    pub dot_radius: f32,
    pub drift_speed: f32,

    // === Player ===
    pub player_start_radius: f32,
    pub player_final_radius: f32,
    pub growth_speed: f32,
    pub hang_ticks: u32,

    // === Rules ===
    pub capture: CaptureRule,
    pub loss: LossRule,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: SCREEN_SIZE.0,
            height: SCREEN_SIZE.1,
            updates_per_second: UPDATES_PER_SECOND,
            seed: 0,
            start_level: 1,
            start_dots: None,
            levels: DEFAULT_LEVELS.to_vec(),
            custom_win_ratio: 2.0 / 3.0,
            dot_radius: START_RADIUS,
            drift_speed: SPEED,
            player_start_radius: START_RADIUS,
            player_final_radius: FINAL_RADIUS,
            growth_speed: GROWTH_SPEED,
            hang_ticks: HANG_TICKS,
            capture: CaptureRule::default(),
            loss: LossRule::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyCanvas {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.updates_per_second > 0.0) {
            return Err(ConfigError::BadRate(self.updates_per_second));
        }
        for (name, value) in [
            ("dot_radius", self.dot_radius),
            ("player_start_radius", self.player_start_radius),
            ("player_final_radius", self.player_final_radius),
            ("growth_speed", self.growth_speed),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if !(self.drift_speed >= 0.0) {
            return Err(ConfigError::NonPositive {
                name: "drift_speed",
                value: self.drift_speed,
            });
        }
        if !(self.custom_win_ratio > 0.0 && self.custom_win_ratio <= 1.0) {
            return Err(ConfigError::BadRatio(self.custom_win_ratio));
        }
        if self.loss == (LossRule::Timeout { ticks: 0 }) {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        if self.start_level == 0 || usize::from(self.start_level) > self.levels.len() {
            return Err(ConfigError::UnknownLevel(self.start_level));
        }
        for (idx, spec) in self.levels.iter().enumerate() {
            let level = idx + 1;
            if spec.total_dots > MAX_DOTS {
                return Err(ConfigError::TooManyDots {
                    level,
                    total_dots: spec.total_dots,
                });
            }
            if spec.win_threshold > spec.total_dots {
                return Err(ConfigError::ThresholdTooHigh {
                    level,
                    total_dots: spec.total_dots,
                    win_threshold: spec.win_threshold,
                });
            }
        }
        Ok(())
    }

    /// Number of the last level in the table
    pub fn max_level(&self) -> u8 {
        self.levels.len().min(usize::from(u8::MAX)) as u8
    }

    /// Spec for a 1-based level number, clamped to the table
    pub fn level_spec(&self, number: u8) -> LevelSpec {
        let idx = usize::from(number.max(1)) - 1;
        let idx = idx.min(self.levels.len().saturating_sub(1));
        self.levels
            .get(idx)
            .copied()
            .unwrap_or(LevelSpec::new(0, 0))
    }

    /// Spec for the very first level (honors `start_dots`)
    pub fn start_spec(&self) -> LevelSpec {
        match self.start_dots {
            Some(total) => LevelSpec::scaled(total, self.custom_win_ratio),
            None => self.level_spec(self.start_level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_level(), 12);
        assert_eq!(config.level_spec(1), LevelSpec::new(5, 1));
        assert_eq!(config.level_spec(12), LevelSpec::new(60, 50));
        // Past the table clamps to the final level
        assert_eq!(config.level_spec(40), LevelSpec::new(60, 50));
    }

    #[test]
    fn test_scaled_level() {
        assert_eq!(LevelSpec::scaled(60, 2.0 / 3.0), LevelSpec::new(60, 40));
        assert_eq!(LevelSpec::scaled(7, 1.0), LevelSpec::new(7, 7));
        assert_eq!(LevelSpec::scaled(255, 0.5).total_dots, MAX_DOTS);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{ "seed": 42, "start_dots": 60 }"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.width, 800);
        assert_eq!(config.start_spec(), LevelSpec::new(60, 40));
    }

    #[test]
    fn test_rules_from_json() {
        let config = EngineConfig::from_json(
            r#"{ "capture": "Overlap", "loss": { "Timeout": { "ticks": 600 } } }"#,
        )
        .unwrap();
        assert_eq!(config.capture, CaptureRule::Overlap);
        assert_eq!(config.loss, LossRule::Timeout { ticks: 600 });
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));

        let config = EngineConfig {
            levels: vec![LevelSpec::new(5, 6)],
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdTooHigh {
                level: 1,
                total_dots: 5,
                win_threshold: 6
            })
        );

        let config = EngineConfig {
            updates_per_second: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BadRate(0.0)));

        let config = EngineConfig {
            start_level: 13,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::UnknownLevel(13)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = EngineConfig {
            loss: LossRule::Timeout { ticks: 0 },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "loss": { "Timeout": { "ticks": 0 } } }"#),
            Err(ConfigError::ZeroTimeout)
        ));
    }
}
