use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use waywalk_common::Transform;

use crate::leg::{Track, WaypointLeg};

/// Host-side transform primitives a walker command is applied through.
///
/// A renderer implements this for its scene-graph node; the headless kernel
/// uses the impl for [`Transform`].
pub trait PoseTarget {
    /// Translate along the local facing direction.
    fn move_forward(&mut self, distance: f32);
    /// Rotate about an axis given in local space, adding to the current rotation.
    fn rotate_local(&mut self, axis: Vec3, angle: f32);
    /// Overwrite absolute position and orientation.
    fn set_pose(&mut self, position: Vec3, orientation: Quat);
}

impl PoseTarget for Transform {
    fn move_forward(&mut self, distance: f32) {
        Transform::move_forward(self, distance);
    }

    fn rotate_local(&mut self, axis: Vec3, angle: f32) {
        Transform::rotate_local(self, axis, angle);
    }

    fn set_pose(&mut self, position: Vec3, orientation: Quat) {
        Transform::set_pose(self, position, orientation);
    }
}

/// Absolute pose the agent snaps back to when the loop wraps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseReset {
    pub position: Vec3,
    pub orientation: Quat,
}

/// What the host should do to the agent this tick, applied in field order:
/// move forward, then turn, then reset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WalkerCommand {
    /// Distance along the facing direction; narrowed to `f32` when applied.
    pub forward: f64,
    /// Turn about local up, in radians.
    pub turn: Option<f32>,
    pub reset: Option<PoseReset>,
}

impl WalkerCommand {
    /// No motion, no turn, no reset.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.turn.is_none() && self.reset.is_none()
    }

    pub fn apply_to<T: PoseTarget + ?Sized>(&self, target: &mut T) {
        if self.forward != 0.0 {
            target.move_forward(self.forward as f32);
        }
        if let Some(angle) = self.turn {
            target.rotate_local(Vec3::Y, angle);
        }
        if let Some(reset) = self.reset {
            target.set_pose(reset.position, reset.orientation);
        }
    }
}

/// Mutable walker state. Created when the agent starts walking and dropped
/// with it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkerState {
    pub current_leg_index: usize,
    pub distance_traveled_since_last_turn: f64,
    pub base_position: Vec3,
    pub base_orientation: Quat,
}

/// Finite-state path follower over a cyclic [`Track`].
///
/// States are leg indices; a transition happens on the `advance` call whose
/// accumulated distance first exceeds the current leg's threshold. There is no
/// terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walker {
    track: Track,
    state: WalkerState,
}

impl Walker {
    /// Start at leg 0 with no distance travelled.
    pub fn new(track: Track, base_position: Vec3, base_orientation: Quat) -> Self {
        Self {
            track,
            state: WalkerState {
                current_leg_index: 0,
                distance_traveled_since_last_turn: 0.0,
                base_position,
                base_orientation,
            },
        }
    }

    /// Use the position and rotation of `transform` as the base pose.
    pub fn from_pose(track: Track, transform: &Transform) -> Self {
        Self::new(track, transform.position, transform.rotation)
    }

    pub fn state(&self) -> &WalkerState {
        &self.state
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn leg_count(&self) -> usize {
        self.track.len()
    }

    pub fn current_leg(&self) -> &WaypointLeg {
        &self.track.legs()[self.state.current_leg_index]
    }

    pub fn base_pose(&self) -> PoseReset {
        PoseReset {
            position: self.state.base_position,
            orientation: self.state.base_orientation,
        }
    }

    /// Advance by one tick of `step_distance`.
    ///
    /// A step that is not a positive finite number yields the idle command and
    /// leaves the state untouched, so repeated `advance(0.0)` calls never turn
    /// or reset.
    pub fn advance(&mut self, step_distance: f64) -> WalkerCommand {
        if !(step_distance.is_finite() && step_distance > 0.0) {
            tracing::trace!(step_distance, "ignoring non-positive step");
            return WalkerCommand::idle();
        }

        self.state.distance_traveled_since_last_turn += step_distance;
        let mut command = WalkerCommand {
            forward: step_distance,
            ..WalkerCommand::idle()
        };

        let leg = *self.current_leg();
        if self.state.distance_traveled_since_last_turn > leg.cumulative_distance_threshold {
            command.turn = Some(leg.turn_angle_radians);
            tracing::debug!(
                leg = self.state.current_leg_index,
                distance = self.state.distance_traveled_since_last_turn,
                turn_degrees = leg.turn_degrees(),
                "turning"
            );

            self.state.current_leg_index = (self.state.current_leg_index + 1) % self.track.len();
            if self.state.current_leg_index == 0 {
                self.state.distance_traveled_since_last_turn = 0.0;
                command.reset = Some(self.base_pose());
                tracing::debug!("loop complete, resetting to base pose");
            }
        }

        command
    }

    /// Go back to leg 0 with zero distance. The returned command carries the
    /// base pose so the host can snap the agent back too.
    pub fn restart(&mut self) -> WalkerCommand {
        self.state.current_leg_index = 0;
        self.state.distance_traveled_since_last_turn = 0.0;
        WalkerCommand {
            reset: Some(self.base_pose()),
            ..WalkerCommand::idle()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn two_leg_walker() -> Walker {
        let track = Track::from_degrees(&[(90.0, 4.0), (90.0, 8.0)]).unwrap();
        Walker::new(track, Vec3::new(2.0, 0.0, 2.0), Quat::IDENTITY)
    }

    #[test]
    fn starts_on_first_leg() {
        let w = two_leg_walker();
        assert_eq!(w.state().current_leg_index, 0);
        assert_eq!(w.state().distance_traveled_since_last_turn, 0.0);
        assert_eq!(w.leg_count(), 2);
    }

    #[test]
    fn turn_fires_only_once_threshold_is_exceeded() {
        let mut w = two_leg_walker();
        for call in 1..=4 {
            let cmd = w.advance(1.0);
            assert_eq!(cmd.forward, 1.0);
            assert!(cmd.turn.is_none(), "no turn expected on call {call}");
        }
        let cmd = w.advance(1.0);
        assert!((cmd.turn.unwrap() - FRAC_PI_2).abs() < 1e-6);
        assert!(cmd.reset.is_none());
        assert_eq!(w.state().current_leg_index, 1);
        assert_eq!(w.state().distance_traveled_since_last_turn, 5.0);
    }

    #[test]
    fn wrap_resets_distance_and_pose_in_same_tick() {
        let mut w = two_leg_walker();
        let commands: Vec<_> = (0..9).map(|_| w.advance(1.0)).collect();

        // Second turn on the 9th call (9 > 8), which also wraps.
        let last = commands[8];
        assert!(last.turn.is_some());
        let reset = last.reset.expect("wrap must reset the pose");
        assert_eq!(reset.position, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(reset.orientation, Quat::IDENTITY);
        assert_eq!(w.state().current_leg_index, 0);
        assert_eq!(w.state().distance_traveled_since_last_turn, 0.0);

        assert_eq!(commands.iter().filter(|c| c.reset.is_some()).count(), 1);
    }

    #[test]
    fn turns_follow_leg_order_indefinitely() {
        let track = Track::from_degrees(&[(10.0, 1.0), (20.0, 2.0), (30.0, 3.0)]).unwrap();
        let mut w = Walker::new(track.clone(), Vec3::ZERO, Quat::IDENTITY);
        let turns: Vec<f32> = (0..1000).filter_map(|_| w.advance(0.25).turn).collect();

        assert!(turns.len() > 30);
        for (i, turn) in turns.iter().enumerate() {
            let expected = track.legs()[i % track.len()].turn_angle_radians;
            assert_eq!(*turn, expected);
        }
    }

    #[test]
    fn at_most_one_turn_per_tick() {
        let track = Track::from_degrees(&[(90.0, 1.0), (90.0, 2.0), (90.0, 3.0)]).unwrap();
        let mut w = Walker::new(track, Vec3::ZERO, Quat::IDENTITY);

        // One large step exceeds every threshold but only the first leg fires.
        let cmd = w.advance(10.0);
        assert!(cmd.turn.is_some());
        assert_eq!(w.state().current_leg_index, 1);

        // The next call fires the second leg immediately.
        w.advance(0.1);
        assert_eq!(w.state().current_leg_index, 2);
    }

    #[test]
    fn zero_step_is_idle() {
        let mut w = two_leg_walker();
        w.advance(3.0);
        let before = *w.state();
        for _ in 0..100 {
            assert!(w.advance(0.0).is_idle());
        }
        assert!(w.advance(-1.0).is_idle());
        assert!(w.advance(f64::NAN).is_idle());
        assert_eq!(*w.state(), before);
    }

    #[test]
    fn single_leg_track_wraps_every_turn() {
        let track = Track::from_degrees(&[(180.0, 2.0)]).unwrap();
        let mut w = Walker::new(track, Vec3::X, Quat::IDENTITY);
        let cmds: Vec<_> = (0..6).map(|_| w.advance(1.0)).collect();
        assert!(cmds[2].turn.is_some() && cmds[2].reset.is_some());
        assert!(cmds[5].turn.is_some() && cmds[5].reset.is_some());
        assert_eq!(w.state().current_leg_index, 0);
    }

    #[test]
    fn identical_inputs_give_identical_commands() {
        let run = || {
            let mut w = two_leg_walker();
            (0..500).map(|_| w.advance(0.05)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn restart_returns_to_first_leg() {
        let mut w = two_leg_walker();
        for _ in 0..6 {
            w.advance(1.0);
        }
        let cmd = w.restart();
        assert_eq!(cmd.forward, 0.0);
        assert!(cmd.turn.is_none());
        assert_eq!(cmd.reset, Some(w.base_pose()));
        assert_eq!(w.state().current_leg_index, 0);
        assert_eq!(w.state().distance_traveled_since_last_turn, 0.0);
    }

    #[test]
    fn apply_to_transform_moves_turns_and_resets() {
        let mut t = Transform::from_pose(Vec3::new(2.0, 0.0, 2.0), Quat::IDENTITY);
        WalkerCommand {
            forward: 4.0,
            turn: Some(FRAC_PI_2),
            reset: None,
        }
        .apply_to(&mut t);
        assert!((t.position - Vec3::new(2.0, 0.0, -2.0)).length() < 1e-5);
        assert!((t.forward() - Vec3::NEG_X).length() < 1e-5);

        WalkerCommand {
            forward: 1.0,
            turn: None,
            reset: Some(PoseReset {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            }),
        }
        .apply_to(&mut t);
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[derive(Default)]
    struct Recorder(Vec<&'static str>);

    impl PoseTarget for Recorder {
        fn move_forward(&mut self, _distance: f32) {
            self.0.push("move");
        }
        fn rotate_local(&mut self, _axis: Vec3, _angle: f32) {
            self.0.push("rotate");
        }
        fn set_pose(&mut self, _position: Vec3, _orientation: Quat) {
            self.0.push("set");
        }
    }

    #[test]
    fn commands_apply_in_move_turn_reset_order() {
        let mut rec = Recorder::default();
        WalkerCommand {
            forward: 0.5,
            turn: Some(1.0),
            reset: Some(PoseReset {
                position: Vec3::ZERO,
                orientation: Quat::IDENTITY,
            }),
        }
        .apply_to(&mut rec);
        assert_eq!(rec.0, ["move", "rotate", "set"]);

        let mut rec = Recorder::default();
        WalkerCommand::idle().apply_to(&mut rec);
        assert!(rec.0.is_empty());
    }
}
