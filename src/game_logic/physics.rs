use bevy::prelude::*;
use serde::Deserialize;

use crate::game_logic::{BodyState, DrivingTuning, VehicleProfile, MS_TO_KMH};

/// Input state for one physics tick
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrivingInput {
    pub forward: bool,
    pub reverse: bool,
    pub left: bool,
    pub right: bool,
    pub handbrake: bool,
    pub boost: bool,
}

impl DrivingInput {
    /// +1 forward, -1 reverse, 0 when both or neither are held.
    pub fn throttle(&self) -> f32 {
        (self.forward as i8 - self.reverse as i8) as f32
    }

    /// +1 steers left (positive yaw), -1 steers right.
    pub fn steer(&self) -> f32 {
        (self.left as i8 - self.right as i8) as f32
    }
}

/// How intent is turned into body motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingModel {
    /// Arcade: forces and torques handed to the physics world.
    ForceImpulse,
    /// Velocity is rebuilt every tick from forward/lateral components with grip.
    #[default]
    KinematicGrip,
}

impl DrivingModel {
    pub fn other(self) -> Self {
        match self {
            DrivingModel::ForceImpulse => DrivingModel::KinematicGrip,
            DrivingModel::KinematicGrip => DrivingModel::ForceImpulse,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrivingModel::ForceImpulse => "Arcade",
            DrivingModel::KinematicGrip => "Grip",
        }
    }
}

/// Body update produced by the resolver for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub linvel: Vec3,
    pub angvel: Vec3,
    /// Force for the world to integrate this step (force-impulse model only).
    pub force: Vec3,
    pub torque: Vec3,
    /// Boost was applied and an exhaust puff should be emitted.
    pub exhaust: bool,
    /// Signed speed along the heading after the update, m/s.
    pub forward_speed: f32,
    pub lateral_speed: f32,
    pub steer: f32,
}

/// Maps the intent for this tick onto the vehicle body.
///
/// Pure: the same state, input, profile, tuning and `dt` always give the same
/// output. `dt` is the step the world will integrate any force over.
pub fn resolve_controls(
    state: &BodyState,
    input: &DrivingInput,
    profile: &VehicleProfile,
    tuning: &DrivingTuning,
    dt: f32,
) -> ControlOutput {
    match tuning.model {
        DrivingModel::KinematicGrip => kinematic_grip(state, input, profile, tuning),
        DrivingModel::ForceImpulse => force_impulse(state, input, profile, tuning, dt),
    }
}

fn kinematic_grip(
    state: &BodyState,
    input: &DrivingInput,
    profile: &VehicleProfile,
    tuning: &DrivingTuning,
) -> ControlOutput {
    let max_speed = profile.max_speed_ms();
    let boost_limit = max_speed * tuning.boost_overshoot;
    let forward_axis = state.forward_axis();
    let right_axis = state.right_axis();

    let mut forward = state.linvel.dot(forward_axis);
    let mut lateral = state.linvel.dot(right_axis) * tuning.grip;
    if input.handbrake {
        lateral *= tuning.handbrake_lateral;
    }
    let boost_allowed = input.boost && forward.abs() < boost_limit;

    forward += input.throttle() * profile.tick_acceleration;
    forward *= tuning.forward_rolling;
    lateral *= tuning.lateral_rolling;
    forward = forward.clamp(-max_speed, max_speed);

    if boost_allowed {
        forward = (forward + tuning.boost_tick_acceleration).min(boost_limit);
    }

    let steer = input.steer();
    let speed_fraction = forward.abs() / max_speed;
    let yaw_rate =
        steer * profile.handling * tuning.steer_gain * speed_taper(speed_fraction, tuning.taper_floor);

    ControlOutput {
        linvel: forward_axis * forward + right_axis * lateral + Vec3::Y * state.linvel.y,
        angvel: Vec3::new(0.0, yaw_rate, 0.0),
        force: Vec3::ZERO,
        torque: Vec3::ZERO,
        exhaust: boost_allowed,
        forward_speed: forward,
        lateral_speed: lateral,
        steer,
    }
}

fn force_impulse(
    state: &BodyState,
    input: &DrivingInput,
    profile: &VehicleProfile,
    tuning: &DrivingTuning,
    dt: f32,
) -> ControlOutput {
    let max_speed = profile.max_speed_ms();
    let forward_axis = state.forward_axis();
    let right_axis = state.right_axis();
    let engine = profile.engine_force * tuning.force_gain;
    let steer = input.steer();

    let mut thrust = input.throttle() * engine;
    let torque = Vec3::Y * steer * profile.handling * tuning.steer_torque * tuning.force_gain;
    let mut angvel = state.angvel;

    let mut forward = state.linvel.dot(forward_axis);
    let mut lateral = state.linvel.dot(right_axis);
    if input.handbrake {
        lateral *= tuning.handbrake_lateral_impulse;
        angvel.y *= tuning.handbrake_yaw_impulse;
    }

    let mut limit = max_speed;
    if input.boost {
        thrust += engine * 2.0;
        limit *= tuning.boost_overshoot;
    }
    forward = forward.clamp(-limit, limit);

    // the next world step integrates the force: it may close the gap to the
    // limit, never cross it
    if dt > 0.0 {
        let force_per_speed = profile.mass / dt;
        thrust = thrust
            .max(-(limit + forward) * force_per_speed)
            .min((limit - forward) * force_per_speed);
    }

    ControlOutput {
        linvel: forward_axis * forward + right_axis * lateral + Vec3::Y * state.linvel.y,
        angvel,
        force: forward_axis * thrust,
        torque,
        exhaust: input.boost,
        forward_speed: forward,
        lateral_speed: lateral,
        steer,
    }
}

/// Steering authority left at a given fraction of top speed.
pub fn speed_taper(speed_fraction: f32, floor: f32) -> f32 {
    floor + (1.0 - floor) * (1.0 - speed_fraction.clamp(0.0, 1.0))
}

/// Horizontal speed in km/h.
pub fn speed_kmh(linvel: Vec3) -> f32 {
    (linvel.x * linvel.x + linvel.z * linvel.z).sqrt() * MS_TO_KMH
}

/// Synthetic engine note; there is no engine model behind it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EngineSound {
    pub volume: f32,
    pub pitch: f32,
}

impl EngineSound {
    pub fn from_speed(speed_kmh: f32) -> Self {
        let rpm = speed_kmh * 20.0;
        Self {
            volume: (speed_kmh / 100.0).min(1.0),
            pitch: 0.5 + (rpm / 8000.0) * 1.5,
        }
    }
}

/// Front wheel yaw for display.
pub fn wheel_steer_angle(steer: f32, max_angle: f32) -> f32 {
    steer.clamp(-1.0, 1.0) * max_angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_logic::{
        Archetype, Material, PhysicsWorld, Shape, SimpleWorld, FIXED_TIMESTEP,
    };

    fn grip_tuning() -> DrivingTuning {
        DrivingTuning::default()
    }

    fn force_tuning() -> DrivingTuning {
        DrivingTuning {
            model: DrivingModel::ForceImpulse,
            ..DrivingTuning::default()
        }
    }

    fn apply(state: &mut BodyState, out: &ControlOutput) {
        state.linvel = out.linvel;
        state.angvel = out.angvel;
    }

    fn throttle() -> DrivingInput {
        DrivingInput {
            forward: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_throttle_converges_to_top_speed() {
        let profile = Archetype::Sports.profile();
        let tuning = grip_tuning();
        let max = profile.max_speed_ms();
        let mut state = BodyState::at_rest(Vec3::ZERO);

        for _ in 0..200 {
            let out = resolve_controls(&state, &throttle(), &profile, &tuning, FIXED_TIMESTEP);
            assert!(out.forward_speed <= max);
            apply(&mut state, &out);
        }

        let forward = state.linvel.dot(state.forward_axis());
        assert!((forward - 72.222).abs() < 1e-2);
        assert!((forward - max).abs() < 1e-5);
    }

    #[test]
    fn test_boost_stays_within_overshoot() {
        let profile = Archetype::Muscle.profile();
        let tuning = grip_tuning();
        let limit = profile.max_speed_ms() * tuning.boost_overshoot;
        let input = DrivingInput {
            forward: true,
            boost: true,
            ..Default::default()
        };
        let mut state = BodyState::at_rest(Vec3::ZERO);
        let mut boosted_past_max = false;

        for _ in 0..400 {
            let out = resolve_controls(&state, &input, &profile, &tuning, FIXED_TIMESTEP);
            assert!(out.forward_speed.abs() <= limit + 1e-4);
            boosted_past_max |= out.forward_speed > profile.max_speed_ms();
            apply(&mut state, &out);
        }
        assert!(boosted_past_max);

        // releasing boost drops back under the normal limit at once
        let out = resolve_controls(&state, &throttle(), &profile, &tuning, FIXED_TIMESTEP);
        assert!(out.forward_speed <= profile.max_speed_ms());
        assert!(!out.exhaust);
    }

    #[test]
    fn test_boost_emits_exhaust() {
        let profile = Archetype::Sports.profile();
        let input = DrivingInput {
            boost: true,
            ..Default::default()
        };
        let state = BodyState::at_rest(Vec3::ZERO);
        assert!(resolve_controls(&state, &input, &profile, &grip_tuning(), FIXED_TIMESTEP).exhaust);
        assert!(resolve_controls(&state, &input, &profile, &force_tuning(), FIXED_TIMESTEP).exhaust);
    }

    #[test]
    fn test_reverse_is_clamped_with_sign() {
        let profile = Archetype::Suv.profile();
        let input = DrivingInput {
            reverse: true,
            ..Default::default()
        };
        let mut state = BodyState::at_rest(Vec3::ZERO);
        for _ in 0..1000 {
            let out = resolve_controls(&state, &input, &profile, &grip_tuning(), FIXED_TIMESTEP);
            apply(&mut state, &out);
        }
        let forward = state.linvel.dot(state.forward_axis());
        assert!((forward + profile.max_speed_ms()).abs() < 1e-4);
    }

    #[test]
    fn test_grip_damps_lateral_slide() {
        let profile = Archetype::Sports.profile();
        let tuning = grip_tuning();
        let mut state = BodyState::at_rest(Vec3::ZERO);
        state.linvel = Vec3::new(10.0, 0.0, 0.0);

        let out = resolve_controls(&state, &DrivingInput::default(), &profile, &tuning, FIXED_TIMESTEP);
        let expected = 10.0 * tuning.grip * tuning.lateral_rolling;
        assert!((out.lateral_speed - expected).abs() < 1e-5);
    }

    #[test]
    fn test_handbrake_shrinks_lateral_by_factor() {
        let profile = Archetype::Sports.profile();
        let tuning = grip_tuning();
        let per_tick = tuning.grip * tuning.handbrake_lateral * tuning.lateral_rolling;
        let input = DrivingInput {
            handbrake: true,
            ..Default::default()
        };
        let mut state = BodyState::at_rest(Vec3::ZERO);
        state.linvel = Vec3::new(12.0, 0.0, -20.0);

        let mut lateral = state.linvel.dot(state.right_axis());
        for _ in 0..10 {
            let out = resolve_controls(&state, &input, &profile, &tuning, FIXED_TIMESTEP);
            assert!((out.lateral_speed - lateral * per_tick).abs() < 1e-4);
            lateral = out.lateral_speed;
            apply(&mut state, &out);
        }
        assert!(lateral.abs() < 1e-3);
    }

    #[test]
    fn test_force_handbrake_scales_lateral_and_yaw() {
        let profile = Archetype::Sports.profile();
        let tuning = force_tuning();
        let mut state = BodyState::at_rest(Vec3::ZERO);
        state.linvel = Vec3::new(10.0, 0.0, 0.0);
        state.angvel = Vec3::new(0.0, 2.0, 0.0);
        let input = DrivingInput {
            handbrake: true,
            ..Default::default()
        };

        let out = resolve_controls(&state, &input, &profile, &tuning, FIXED_TIMESTEP);
        assert!((out.lateral_speed - 9.0).abs() < 1e-5);
        assert!((out.angvel.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_steering_tapers_with_speed() {
        let profile = Archetype::Sports.profile();
        let tuning = grip_tuning();
        let input = DrivingInput {
            left: true,
            ..Default::default()
        };

        let mut slow = BodyState::at_rest(Vec3::ZERO);
        slow.linvel = Vec3::new(0.0, 0.0, -5.0);
        let mut fast = BodyState::at_rest(Vec3::ZERO);
        fast.linvel = Vec3::new(0.0, 0.0, -profile.max_speed_ms() * 0.98);

        let slow_yaw = resolve_controls(&slow, &input, &profile, &tuning, FIXED_TIMESTEP).angvel.y;
        let fast_yaw = resolve_controls(&fast, &input, &profile, &tuning, FIXED_TIMESTEP).angvel.y;
        assert!(slow_yaw > 0.0);
        assert!(fast_yaw > 0.0);
        assert!(fast_yaw < slow_yaw);
    }

    #[test]
    fn test_right_steer_turns_negative_yaw() {
        let profile = Archetype::Muscle.profile();
        let input = DrivingInput {
            right: true,
            ..Default::default()
        };
        let out = resolve_controls(&BodyState::at_rest(Vec3::ZERO), &input, &profile, &grip_tuning(), FIXED_TIMESTEP);
        let expected = -profile.handling * grip_tuning().steer_gain;
        assert!((out.angvel.y - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_steer_stops_yaw_in_grip_model() {
        let profile = Archetype::Sports.profile();
        let mut state = BodyState::at_rest(Vec3::ZERO);
        state.angvel = Vec3::new(0.0, 3.0, 0.0);
        let out = resolve_controls(&state, &throttle(), &profile, &grip_tuning(), FIXED_TIMESTEP);
        assert_eq!(out.angvel, Vec3::ZERO);
    }

    #[test]
    fn test_zero_steer_yaw_decays_in_force_model() {
        let profile = Archetype::Sports.profile();
        let tuning = force_tuning();
        let mut world = SimpleWorld::new(-9.82);
        let car = world
            .create_body(
                profile.mass,
                Shape::Box {
                    half_extents: profile.half_extents(),
                },
                Material::default(),
            )
            .unwrap();
        world.add_body(car).unwrap();
        world
            .set_damping(car, tuning.linear_damping, tuning.angular_damping)
            .unwrap();
        world
            .set_velocity(car, Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0))
            .unwrap();

        for _ in 0..300 {
            world.step(FIXED_TIMESTEP);
            let state = world.state(car).unwrap();
            let out = resolve_controls(&state, &DrivingInput::default(), &profile, &tuning, FIXED_TIMESTEP);
            world.set_velocity(car, out.linvel, out.angvel).unwrap();
        }

        assert!(world.state(car).unwrap().angvel.y.abs() < 0.01);
    }

    #[test]
    fn test_force_model_pushes_along_heading() {
        let profile = Archetype::Sports.profile();
        let tuning = force_tuning();
        let mut state = BodyState::at_rest(Vec3::ZERO);
        state.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

        let out = resolve_controls(&state, &throttle(), &profile, &tuning, FIXED_TIMESTEP);
        let direction = out.force.normalize();
        assert!((direction - Vec3::NEG_X).length() < 1e-5);
        assert!((out.force.length() - profile.engine_force * tuning.force_gain).abs() < 1e-2);
    }

    #[test]
    fn test_force_model_thrust_stops_at_limit() {
        let profile = Archetype::Sports.profile();
        let tuning = force_tuning();
        let max = profile.max_speed_ms();
        let mut state = BodyState::at_rest(Vec3::ZERO);

        state.linvel = Vec3::new(0.0, 0.0, -max);
        let out = resolve_controls(&state, &throttle(), &profile, &tuning, FIXED_TIMESTEP);
        assert!(out.force.length() < 1e-3);

        // just under the limit only the remaining gap is pushed
        state.linvel = Vec3::new(0.0, 0.0, -(max - 0.1));
        let out = resolve_controls(&state, &throttle(), &profile, &tuning, FIXED_TIMESTEP);
        let gained = out.force.dot(state.forward_axis()) / profile.mass * FIXED_TIMESTEP;
        assert!((gained - 0.1).abs() < 1e-3);

        // boosting raises the ceiling to the overshoot
        let boost = DrivingInput {
            forward: true,
            boost: true,
            ..Default::default()
        };
        state.linvel = Vec3::new(0.0, 0.0, -max);
        let out = resolve_controls(&state, &boost, &profile, &tuning, FIXED_TIMESTEP);
        let gained = out.force.dot(state.forward_axis()) / profile.mass * FIXED_TIMESTEP;
        assert!(gained > 0.0);
        assert!(max + gained <= max * tuning.boost_overshoot + 1e-3);
    }

    #[test]
    fn test_vertical_velocity_is_preserved() {
        let profile = Archetype::Sports.profile();
        let mut state = BodyState::at_rest(Vec3::ZERO);
        state.linvel = Vec3::new(3.0, -4.0, -10.0);
        let out = resolve_controls(&state, &throttle(), &profile, &grip_tuning(), FIXED_TIMESTEP);
        assert_eq!(out.linvel.y, -4.0);
    }

    #[test]
    fn test_replay_is_deterministic() {
        let profile = Archetype::Sports.profile();
        let tuning = grip_tuning();
        let script: Vec<DrivingInput> = (0..240)
            .map(|i| DrivingInput {
                forward: i % 7 != 0,
                left: (i / 30) % 2 == 0,
                right: i % 11 == 0,
                handbrake: i % 13 == 0,
                boost: i > 180,
                ..Default::default()
            })
            .collect();

        let run = || {
            let mut state = BodyState::at_rest(Vec3::ZERO);
            for input in &script {
                let out = resolve_controls(&state, input, &profile, &tuning, FIXED_TIMESTEP);
                apply(&mut state, &out);
                state.rotation =
                    (Quat::from_scaled_axis(state.angvel * FIXED_TIMESTEP) * state.rotation).normalize();
                state.position += state.linvel * FIXED_TIMESTEP;
            }
            state
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_zero_top_speed_does_not_divide_by_zero() {
        let mut profile = Archetype::Sports.profile();
        profile.max_speed_kmh = 0.0;
        let input = DrivingInput {
            forward: true,
            left: true,
            ..Default::default()
        };
        let out = resolve_controls(&BodyState::at_rest(Vec3::ZERO), &input, &profile, &grip_tuning(), FIXED_TIMESTEP);
        assert!(out.linvel.is_finite());
        assert!(out.angvel.is_finite());
    }

    #[test]
    fn test_speed_and_engine_sound() {
        let speed = speed_kmh(Vec3::new(3.0, 50.0, 4.0));
        assert!((speed - 18.0).abs() < 1e-4);

        let idle = EngineSound::from_speed(0.0);
        assert_eq!(idle, EngineSound { volume: 0.0, pitch: 0.5 });

        let fast = EngineSound::from_speed(200.0);
        assert_eq!(fast.volume, 1.0);
        assert!((fast.pitch - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_wheel_angle_follows_steer() {
        assert_eq!(wheel_steer_angle(1.0, 0.5), 0.5);
        assert_eq!(wheel_steer_angle(-1.0, 0.5), -0.5);
        assert_eq!(wheel_steer_angle(0.0, 0.5), 0.0);
    }
}
