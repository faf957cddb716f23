//! Scenario files: everything needed to put a walking agent in a scene,
//! passed explicitly instead of living in process-wide state.
//!
//! Files ending in `.yaml`/`.yml` are read as YAML, anything else as JSON.

use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use waywalk_common::{Aabb, Transform};

use crate::leg::{Track, TrackError, WaypointLeg};
use crate::walker::Walker;

/// Errors from loading or validating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid track: {0}")]
    Track(#[from] TrackError),
    #[error("step distance must be positive and finite, got {0}")]
    InvalidStep(f64),
    #[error("base heading is not finite")]
    InvalidHeading,
}

/// Unit the leg turn angles are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Degrees,
    Radians,
}

/// One leg as written in a scenario file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    pub turn: f32,
    pub distance: f64,
}

/// An axis-aligned zone given by centre and full size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub center: Vec3,
    pub size: Vec3,
}

fn default_half_extents() -> Vec3 {
    Vec3::splat(0.25)
}

/// On-disk form of a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub base_position: Vec3,
    /// Yaw about +Y applied to the identity orientation.
    #[serde(default)]
    pub base_heading_degrees: f32,
    pub step_distance: f64,
    #[serde(default)]
    pub angle_unit: AngleUnit,
    pub legs: Vec<LegConfig>,
    #[serde(default = "default_half_extents")]
    pub half_extents: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_zone: Option<ZoneConfig>,
}

impl ScenarioConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        if is_yaml(path) {
            Self::from_yaml(&text)
        } else {
            Self::from_json(&text)
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)?;
        if is_yaml(path) {
            serde_yaml::to_writer(file, self)?;
        } else {
            serde_json::to_writer_pretty(file, self)?;
        }
        Ok(())
    }

    /// Validate and convert into a runnable scenario.
    pub fn into_scenario(self) -> Result<Scenario, ConfigError> {
        if !(self.step_distance.is_finite() && self.step_distance > 0.0) {
            return Err(ConfigError::InvalidStep(self.step_distance));
        }
        if !self.base_heading_degrees.is_finite() {
            return Err(ConfigError::InvalidHeading);
        }
        let legs = self
            .legs
            .iter()
            .map(|leg| match self.angle_unit {
                AngleUnit::Degrees => WaypointLeg::from_degrees(leg.turn, leg.distance),
                AngleUnit::Radians => WaypointLeg::new(leg.turn, leg.distance),
            })
            .collect();
        let track = Track::new(legs)?;
        Ok(Scenario {
            name: self.name,
            track,
            base_position: self.base_position,
            base_orientation: Quat::from_rotation_y(self.base_heading_degrees.to_radians()),
            step_distance: self.step_distance,
            half_extents: self.half_extents.abs(),
            yield_zone: self
                .yield_zone
                .map(|z| Aabb::from_center_size(z.center, z.size)),
        })
    }
}

impl From<&Scenario> for ScenarioConfig {
    fn from(scenario: &Scenario) -> Self {
        let (axis, angle) = scenario.base_orientation.to_axis_angle();
        let heading = if axis.y < 0.0 { -angle } else { angle };
        Self {
            name: scenario.name.clone(),
            base_position: scenario.base_position,
            base_heading_degrees: heading.to_degrees(),
            step_distance: scenario.step_distance,
            angle_unit: AngleUnit::Radians,
            legs: scenario
                .track
                .legs()
                .iter()
                .map(|leg| LegConfig {
                    turn: leg.turn_angle_radians,
                    distance: leg.cumulative_distance_threshold,
                })
                .collect(),
            half_extents: scenario.half_extents,
            yield_zone: scenario.yield_zone.map(|zone| ZoneConfig {
                center: zone.center(),
                size: zone.max - zone.min,
            }),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// A validated scenario: the track, the agent's base pose and per-tick step.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub track: Track,
    pub base_position: Vec3,
    pub base_orientation: Quat,
    pub step_distance: f64,
    /// Half size of the agent's bounding box, in world units.
    pub half_extents: Vec3,
    /// Zone the agent must not enter while other traffic occupies it.
    pub yield_zone: Option<Aabb>,
}

impl Scenario {
    /// A fresh walker at leg 0 for this scenario.
    pub fn walker(&self) -> Walker {
        Walker::new(self.track.clone(), self.base_position, self.base_orientation)
    }

    /// The agent's starting transform.
    pub fn base_transform(&self) -> Transform {
        Transform::from_pose(self.base_position, self.base_orientation)
    }
}
