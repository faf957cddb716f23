use serde::{Deserialize, Serialize};

/// One scripted segment of the loop: once the distance accumulated since the
/// last reset exceeds `cumulative_distance_threshold`, turn by
/// `turn_angle_radians` about local up.
///
/// Distances are `f64`: the tick a turn fires on depends on the exact
/// accumulated sum of steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointLeg {
    pub turn_angle_radians: f32,
    pub cumulative_distance_threshold: f64,
}

impl WaypointLeg {
    pub fn new(turn_angle_radians: f32, cumulative_distance_threshold: f64) -> Self {
        Self {
            turn_angle_radians,
            cumulative_distance_threshold,
        }
    }

    pub fn from_degrees(turn_degrees: f32, cumulative_distance_threshold: f64) -> Self {
        Self::new(turn_degrees.to_radians(), cumulative_distance_threshold)
    }

    pub fn turn_degrees(&self) -> f32 {
        self.turn_angle_radians.to_degrees()
    }
}

/// Errors from building a track.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackError {
    #[error("track has no legs")]
    Empty,
    #[error("leg {index}: turn angle is not finite")]
    NonFiniteTurn { index: usize },
    #[error("leg {index}: distance threshold is not finite")]
    NonFiniteThreshold { index: usize },
}

/// A non-empty, cyclic sequence of legs.
///
/// Thresholds are cumulative from the last reset. They are expected to rise
/// within one cycle but this is not checked; legs are consumed strictly in
/// order regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WaypointLeg>", into = "Vec<WaypointLeg>")]
pub struct Track {
    legs: Vec<WaypointLeg>,
}

impl Track {
    pub fn new(legs: Vec<WaypointLeg>) -> Result<Self, TrackError> {
        if legs.is_empty() {
            return Err(TrackError::Empty);
        }
        for (index, leg) in legs.iter().enumerate() {
            if !leg.turn_angle_radians.is_finite() {
                return Err(TrackError::NonFiniteTurn { index });
            }
            if !leg.cumulative_distance_threshold.is_finite() {
                return Err(TrackError::NonFiniteThreshold { index });
            }
        }
        Ok(Self { legs })
    }

    /// Build from `(turn_radians, threshold)` pairs.
    pub fn from_radians(pairs: &[(f32, f64)]) -> Result<Self, TrackError> {
        Self::new(
            pairs
                .iter()
                .map(|&(turn, dist)| WaypointLeg::new(turn, dist))
                .collect(),
        )
    }

    /// Build from `(turn_degrees, threshold)` pairs.
    pub fn from_degrees(pairs: &[(f32, f64)]) -> Result<Self, TrackError> {
        Self::new(
            pairs
                .iter()
                .map(|&(turn, dist)| WaypointLeg::from_degrees(turn, dist))
                .collect(),
        )
    }

    pub fn legs(&self) -> &[WaypointLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    /// Always false; a track cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WaypointLeg> {
        self.legs.get(index)
    }

    /// Distance at which the loop wraps: the last leg's threshold.
    pub fn cycle_distance(&self) -> f64 {
        self.legs
            .last()
            .map_or(0.0, |leg| leg.cumulative_distance_threshold)
    }

    /// Sum of all turns over one cycle, in radians.
    pub fn net_turn(&self) -> f32 {
        self.legs.iter().map(|leg| leg.turn_angle_radians).sum()
    }
}

impl TryFrom<Vec<WaypointLeg>> for Track {
    type Error = TrackError;

    fn try_from(legs: Vec<WaypointLeg>) -> Result<Self, Self::Error> {
        Self::new(legs)
    }
}

impl From<Track> for Vec<WaypointLeg> {
    fn from(track: Track) -> Self {
        track.legs
    }
}
