use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::Deserialize;

use crate::game_logic::{
    error::{ConfigError, SessionError},
    DrivingModel, FIXED_TIMESTEP, GRAVITY, TRAFFIC_CONTACT_DISTANCE, TRAFFIC_COUNT,
    TRAFFIC_RESPAWN_DELAY_MS, TRAFFIC_SPAWN_EXTENT, WORLD_BOUND,
};

pub const CONFIG_PATH: &str = "assets/tuning.json";

/// Handling constants shared by both driving models.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DrivingTuning {
    pub model: DrivingModel,

    // kinematic grip model
    /// Fraction of lateral velocity kept each tick.
    pub grip: f32,
    /// Extra lateral factor while the handbrake is held.
    pub handbrake_lateral: f32,
    pub forward_rolling: f32,
    pub lateral_rolling: f32,
    /// Yaw rate (rad/s) at full steering, full handling, standstill.
    pub steer_gain: f32,
    /// Share of steering authority left at top speed.
    pub taper_floor: f32,
    pub boost_overshoot: f32,
    pub boost_tick_acceleration: f32,

    // force impulse model
    pub force_gain: f32,
    pub steer_torque: f32,
    pub handbrake_lateral_impulse: f32,
    pub handbrake_yaw_impulse: f32,

    // body
    pub linear_damping: f32,
    pub angular_damping: f32,

    /// Cosmetic front wheel angle at full lock, radians.
    pub max_wheel_angle: f32,
}

impl Default for DrivingTuning {
    fn default() -> Self {
        Self {
            model: DrivingModel::KinematicGrip,
            grip: 0.8,
            handbrake_lateral: 0.4,
            forward_rolling: 0.995,
            lateral_rolling: 0.97,
            steer_gain: 2.5,
            taper_floor: 0.4,
            boost_overshoot: 1.05,
            boost_tick_acceleration: 0.5,
            force_gain: 40.0,
            steer_torque: 300.0,
            handbrake_lateral_impulse: 0.9,
            handbrake_yaw_impulse: 0.5,
            linear_damping: 0.1,
            angular_damping: 0.9,
            max_wheel_angle: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    pub damage_cap: f32,
    pub damage_divisor: f32,
    pub contact_bonus: f32,
    pub contact_combo: f32,
    pub combo_ceiling: f32,
    pub combo_decay: f32,
    pub speed_score_threshold_kmh: f32,
    pub speed_score_rate: f32,
    /// Sideways speed (m/s) that counts as a drift.
    pub drift_slip_threshold: f32,
    pub drift_bonus: f32,
    pub drift_combo: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            damage_cap: 20.0,
            damage_divisor: 10.0,
            contact_bonus: 50.0,
            contact_combo: 0.2,
            combo_ceiling: 15.0,
            combo_decay: 0.002,
            speed_score_threshold_kmh: 30.0,
            speed_score_rate: 0.05,
            drift_slip_threshold: 5.0,
            drift_bonus: 10.0,
            drift_combo: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub count: usize,
    pub spawn_extent: f32,
    pub world_bound: f32,
    pub contact_distance: f32,
    pub respawn_delay_ms: u64,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Spawns closer than this to the player are re-rolled.
    pub spawn_clearance: f32,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            count: TRAFFIC_COUNT,
            spawn_extent: TRAFFIC_SPAWN_EXTENT,
            world_bound: WORLD_BOUND,
            contact_distance: TRAFFIC_CONTACT_DISTANCE,
            respawn_delay_ms: TRAFFIC_RESPAWN_DELAY_MS,
            min_speed: 5.0,
            max_speed: 15.0,
            spawn_clearance: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: f32,
    pub timestep: f32,
    pub car_friction: f32,
    pub car_restitution: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            timestep: FIXED_TIMESTEP,
            car_friction: 0.4,
            car_restitution: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CityConfig {
    pub buildings: usize,
    pub building_extent: f32,
    pub min_footprint: f32,
    pub max_footprint: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub roads_per_axis: usize,
    pub road_spacing: f32,
    pub road_width: f32,
    pub street_lights: usize,
    pub street_light_extent: f32,
    /// Keep the spawn point free of buildings.
    pub spawn_clearance: f32,
}

impl Default for CityConfig {
    fn default() -> Self {
        Self {
            buildings: 60,
            building_extent: 400.0,
            min_footprint: 15.0,
            max_footprint: 40.0,
            min_height: 30.0,
            max_height: 110.0,
            roads_per_axis: 8,
            road_spacing: 100.0,
            road_width: 20.0,
            street_lights: 30,
            street_light_extent: 300.0,
            spawn_clearance: 30.0,
        }
    }
}

/// Every tunable the game reads. Missing fields in the JSON file keep their defaults.
#[derive(Resource, Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub driving: DrivingTuning,
    pub scoring: ScoringTuning,
    pub traffic: TrafficConfig,
    pub world: WorldConfig,
    pub city: CityConfig,
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the tuning file when present; any failure keeps the built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No tuning file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                info!("Loaded tuning from {}", path.display());
                config
            }
            Err(err) => {
                warn!("{err}; using default tuning");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), SessionError> {
        if !(self.world.timestep.is_finite() && self.world.timestep > 0.0) {
            return Err(SessionError::InvalidConfig("timestep must be positive and finite"));
        }
        if !self.world.gravity.is_finite() {
            return Err(SessionError::InvalidConfig("gravity must be finite"));
        }
        if self.traffic.world_bound <= 0.0 {
            return Err(SessionError::InvalidConfig("traffic world bound must be positive"));
        }
        if !(self.traffic.min_speed.is_finite() && self.traffic.max_speed.is_finite()) {
            return Err(SessionError::InvalidConfig("traffic speeds must be finite"));
        }
        if self.traffic.min_speed > self.traffic.max_speed {
            return Err(SessionError::InvalidConfig("traffic min speed exceeds max speed"));
        }
        if self.city.min_footprint > self.city.max_footprint
            || self.city.min_height > self.city.max_height
        {
            return Err(SessionError::InvalidConfig("city size ranges are inverted"));
        }
        Ok(())
    }
}
