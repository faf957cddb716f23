//! Built-in scenarios.
//!
//! - `triangle`: a sphere sliding round an isosceles right triangle
//!   A(2,0,2) → B(2,0,-2) → C(-2,0,-2) → A.
//! - `village`: a character's hand-tuned loop round the village. Turns are in
//!   degrees so a leg can be nudged by a degree or two.
//! - `crossing`: a character pacing back and forth across the road, with a
//!   yield zone over the car's stopping place.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use waywalk_common::Aabb;

use crate::config::Scenario;
use crate::leg::Track;

const VILLAGE_LEGS: [(f32, f64); 9] = [
    (86.0, 7.0),
    (-85.0, 14.8),
    (-93.0, 16.5),
    (48.0, 25.5),
    (-112.0, 30.5),
    (-72.0, 33.2),
    (42.0, 37.5),
    (-98.0, 45.2),
    (0.0, 47.0),
];

/// Out across the road, about-turn, back to the start.
const CROSSING_LEGS: [(f32, f64); 2] = [(180.0, 2.5), (0.0, 5.0)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Triangle,
    Village,
    Crossing,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown preset '{0}' (expected triangle, village or crossing)")]
pub struct UnknownPreset(pub String);

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Triangle, Preset::Village, Preset::Crossing];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Triangle => "triangle",
            Preset::Village => "village",
            Preset::Crossing => "crossing",
        }
    }

    pub fn scenario(self) -> Scenario {
        match self {
            Preset::Triangle => triangle(),
            Preset::Village => village(),
            Preset::Crossing => crossing(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

fn triangle() -> Scenario {
    let hypotenuse = 4.0 * 2f64.sqrt();
    let track = Track::from_radians(&[
        (FRAC_PI_2, 4.0),
        (FRAC_PI_2 + PI / 4.0, 8.0),
        (3.0 * PI / 4.0, 8.0 + hypotenuse),
    ])
    .unwrap_or_else(|_| unreachable!("triangle legs are finite and non-empty"));
    Scenario {
        name: Preset::Triangle.name().to_string(),
        track,
        base_position: Vec3::new(2.0, 0.0, 2.0),
        base_orientation: Quat::IDENTITY,
        step_distance: 0.05,
        half_extents: Vec3::splat(0.25),
        yield_zone: None,
    }
}

fn village() -> Scenario {
    let track = Track::from_degrees(&VILLAGE_LEGS)
        .unwrap_or_else(|_| unreachable!("village legs are finite and non-empty"));
    Scenario {
        name: Preset::Village.name().to_string(),
        track,
        base_position: Vec3::new(-6.0, 0.0, 0.0),
        base_orientation: Quat::from_rotation_y((-95f32).to_radians()),
        step_distance: 0.015,
        half_extents: Vec3::new(0.2, 0.9, 0.2),
        yield_zone: None,
    }
}

fn crossing() -> Scenario {
    let track = Track::from_degrees(&CROSSING_LEGS)
        .unwrap_or_else(|_| unreachable!("crossing legs are finite and non-empty"));
    Scenario {
        name: Preset::Crossing.name().to_string(),
        track,
        base_position: Vec3::new(1.5, 0.0, -6.9),
        base_orientation: Quat::from_rotation_y((-90f32).to_radians()),
        step_distance: 0.015,
        half_extents: Vec3::new(0.1, 0.4, 0.1),
        yield_zone: Some(Aabb::from_center_size(
            Vec3::new(3.1, 0.3, -5.0),
            Vec3::new(0.5, 0.6, 4.5),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waywalk_common::Transform;

    /// Ticks on which turns fire, for `cycles` full loops of `track`.
    fn turn_ticks(scenario: &Scenario, cycles: usize) -> Vec<u64> {
        let mut walker = scenario.walker();
        let mut ticks = Vec::new();
        let mut tick = 0;
        while ticks.len() < cycles * scenario.track.len() {
            tick += 1;
            if walker.advance(scenario.step_distance).turn.is_some() {
                ticks.push(tick);
            }
        }
        ticks
    }

    /// Straight double-precision accumulation of the step, compared against
    /// the thresholds in order.
    fn double_precision_turn_ticks(thresholds: &[f64], step: f64, cycles: usize) -> Vec<u64> {
        let (mut distance, mut p, mut tick) = (0.0_f64, 0, 0);
        let mut ticks = Vec::new();
        while ticks.len() < cycles * thresholds.len() {
            tick += 1;
            distance += step;
            if distance > thresholds[p] {
                ticks.push(tick);
                p = (p + 1) % thresholds.len();
                if p == 0 {
                    distance = 0.0;
                }
            }
        }
        ticks
    }

    #[test]
    fn presets_parse_by_name() {
        for preset in Preset::ALL {
            assert_eq!(preset.name().parse::<Preset>().unwrap(), preset);
        }
        assert_eq!("Village".parse::<Preset>().unwrap(), Preset::Village);
        assert!("maze".parse::<Preset>().is_err());
    }

    #[test]
    fn turn_ticks_match_double_precision_accumulation() {
        for preset in Preset::ALL {
            let scenario = preset.scenario();
            let thresholds: Vec<f64> = scenario
                .track
                .legs()
                .iter()
                .map(|leg| leg.cumulative_distance_threshold)
                .collect();
            assert_eq!(
                turn_ticks(&scenario, 2),
                double_precision_turn_ticks(&thresholds, scenario.step_distance, 2),
                "{preset}"
            );
        }
    }

    #[test]
    fn triangle_turns_on_known_ticks() {
        let ticks = turn_ticks(&Preset::Triangle.scenario(), 1);
        assert_eq!(ticks, [81, 161, 274]);
    }

    #[test]
    fn triangle_closes_its_loop() {
        let scenario = Preset::Triangle.scenario();
        let mut walker = scenario.walker();
        let mut t = scenario.base_transform();
        let mut last_before_reset = None;
        for _ in 0..2000 {
            let cmd = walker.advance(scenario.step_distance);
            if cmd.reset.is_some() {
                let mut pre = t;
                pre.move_forward(cmd.forward as f32);
                last_before_reset = Some(pre.position);
                cmd.apply_to(&mut t);
                break;
            }
            cmd.apply_to(&mut t);
        }
        // One step of overshoot at each of three corners.
        let end = last_before_reset.expect("loop must wrap");
        assert!((end - scenario.base_position).length() < 0.2, "ended at {end}");
        assert_eq!(t, Transform::from_pose(scenario.base_position, Quat::IDENTITY));
    }

    #[test]
    fn village_turns_are_in_degrees() {
        let scenario = Preset::Village.scenario();
        assert_eq!(scenario.track.len(), 9);
        assert!((scenario.track.legs()[1].turn_degrees() + 85.0).abs() < 1e-3);
        assert_eq!(scenario.track.cycle_distance(), 47.0);
    }

    #[test]
    fn crossing_starts_heading_for_the_road() {
        let scenario = Preset::Crossing.scenario();
        let forward = scenario.base_transform().forward();
        assert!((forward - Vec3::X).length() < 1e-5);
        let zone = scenario.yield_zone.unwrap();
        assert!(zone.contains_point(Vec3::new(3.1, 0.3, -6.9)));
    }

    #[test]
    fn crossing_passes_through_the_zone_twice_per_loop() {
        let scenario = Preset::Crossing.scenario();
        let zone = scenario.yield_zone.unwrap();
        let mut walker = scenario.walker();
        let mut t = scenario.base_transform();
        let inside =
            |t: &Transform| Aabb::from_transform(t, scenario.half_extents).intersects(&zone);

        assert!(!inside(&t));
        let mut was_inside = false;
        let mut entries = 0;
        loop {
            let cmd = walker.advance(scenario.step_distance);
            cmd.apply_to(&mut t);
            let now_inside = inside(&t);
            if now_inside && !was_inside {
                entries += 1;
            }
            was_inside = now_inside;
            if cmd.reset.is_some() {
                break;
            }
        }
        assert_eq!(entries, 2);
    }
}
