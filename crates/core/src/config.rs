//! Planner configuration, loaded from JSON.

use std::time::Duration;

use blockgrid_protocol::{BlockType, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::GridMapper;
use crate::gestures::GestureRecognizer;
use crate::gestures::recognizer::EDGE_THRESHOLD_PX;
use crate::merge::{MIN_PROPOSAL_SECS, MergePolicy};
use crate::throttle::Throttle;
use crate::timespan::SECONDS_PER_MINUTE;
use crate::windower::{AllWindower, TiledWindower, Windowing};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Gestured proposals shorter than this are dropped.
    pub min_proposal_secs: f64,
    pub edge_threshold_px: f64,
    pub default_block_type: BlockType,
    /// Gesture time indices snap to this unit; `None` leaves them raw.
    pub snap_unit_secs: Option<f64>,
    pub windowing: WindowingConfig,
    pub grid: GridConfig,
    pub scroll_throttle_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_proposal_secs: MIN_PROPOSAL_SECS,
            edge_threshold_px: EDGE_THRESHOLD_PX,
            default_block_type: BlockType::default(),
            snap_unit_secs: Some(15.0 * SECONDS_PER_MINUTE),
            windowing: WindowingConfig::default(),
            grid: GridConfig::default(),
            scroll_throttle_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WindowingConfig {
    All,
    Tiled {
        width: f64,
        height: f64,
        #[serde(default)]
        cache_capacity: Option<usize>,
    },
}

impl Default for WindowingConfig {
    fn default() -> Self {
        WindowingConfig::Tiled {
            width: 512.0,
            height: 512.0,
            cache_capacity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Width of one quarter hour.
    pub tick_width_px: f64,
    pub row_height_px: f64,
    /// Time at the grid's left edge.
    pub origin_secs: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tick_width_px: 18.0,
            row_height_px: 48.0,
            origin_secs: 0.0,
        }
    }
}

impl PlannerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("min_proposal_secs", self.min_proposal_secs)?;
        non_negative("edge_threshold_px", self.edge_threshold_px)?;
        if self.default_block_type.as_str().is_empty() {
            let reason = "must not be empty";
            return Err(ConfigError::invalid("default_block_type", reason));
        }
        if let Some(unit) = self.snap_unit_secs {
            positive("snap_unit_secs", unit)?;
        }
        if let WindowingConfig::Tiled { width, height, .. } = self.windowing {
            positive("windowing.width", width)?;
            positive("windowing.height", height)?;
        }
        positive("grid.tick_width_px", self.grid.tick_width_px)?;
        positive("grid.row_height_px", self.grid.row_height_px)?;
        if !self.grid.origin_secs.is_finite() {
            return Err(ConfigError::invalid("grid.origin_secs", "must be finite"));
        }
        Ok(())
    }

    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            min_proposal_secs: self.min_proposal_secs,
        }
    }

    pub fn mapper(&self) -> GridMapper {
        GridMapper::from_ticks(
            self.grid.tick_width_px,
            self.grid.row_height_px,
            self.grid.origin_secs,
        )
    }

    pub fn recognizer(&self) -> GestureRecognizer {
        GestureRecognizer::planner(self.edge_threshold_px, self.default_block_type.clone())
    }

    pub fn windowing(&self) -> Windowing {
        match self.windowing {
            WindowingConfig::All => Windowing::All(AllWindower),
            WindowingConfig::Tiled {
                width,
                height,
                cache_capacity,
            } => {
                let size = Size::new(width, height);
                Windowing::Tiled(match cache_capacity {
                    Some(capacity) => TiledWindower::with_capacity(size, capacity),
                    None => TiledWindower::new(size),
                })
            }
        }
    }

    pub fn throttle(&self) -> Throttle {
        Throttle::new(Duration::from_millis(self.scroll_throttle_ms))
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        let reason = format!("expected a positive number, got {value}");
        Err(ConfigError::invalid(field, reason))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        let reason = format!("expected a non-negative number, got {value}");
        Err(ConfigError::invalid(field, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config = PlannerConfig::from_json("{}").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.min_proposal_secs, 2700.0);
        assert_eq!(config.snap_unit_secs, Some(900.0));
        assert_eq!(config.default_block_type, "a");
    }

    #[test]
    fn partial_override() {
        let config = PlannerConfig::from_json(
            r#"{
                "min_proposal_secs": 600,
                "snap_unit_secs": null,
                "default_block_type": "focus",
                "windowing": { "mode": "tiled", "width": 256, "height": 128, "cache_capacity": 64 },
                "grid": { "row_height_px": 32 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.merge_policy().min_proposal_secs, 600.0);
        assert_eq!(config.snap_unit_secs, None);
        assert_eq!(config.default_block_type, "focus");
        assert_eq!(config.grid.row_height_px, 32.0);
        assert_eq!(config.grid.tick_width_px, 18.0);
        match config.windowing() {
            Windowing::Tiled(w) => {
                assert_eq!(w.size(), Size::new(256.0, 128.0));
                assert_eq!(w.cache_stats().entries, 0);
            }
            Windowing::All(_) => panic!("expected tiled windowing"),
        }
    }

    #[test]
    fn all_windowing_mode() {
        let config = PlannerConfig::from_json(r#"{ "windowing": { "mode": "all" } }"#).unwrap();
        assert!(matches!(config.windowing(), Windowing::All(_)));
    }

    #[test]
    fn mapper_uses_quarter_hour_ticks() {
        let mapper = PlannerConfig::default().mapper();
        assert!((mapper.seconds_to_pixels(900.0) - 18.0).abs() < 1e-9);
        assert_eq!(mapper.row_height, 48.0);
    }

    #[test]
    fn rejects_bad_values() {
        let err = PlannerConfig::from_json(
            r#"{ "windowing": { "mode": "tiled", "width": 0, "height": 10 } }"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "windowing.width",
                ..
            }
        ));

        let err = PlannerConfig::from_json(r#"{ "snap_unit_secs": -5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "snap_unit_secs", .. }));

        let err = PlannerConfig::from_json(r#"{ "default_block_type": "" }"#).unwrap_err();
        assert!(err.to_string().contains("default_block_type"));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = PlannerConfig::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
