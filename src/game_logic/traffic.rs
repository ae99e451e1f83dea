use bevy::prelude::*;
use rand::Rng;

use crate::game_logic::pool::{Pool, SlotId};
use crate::game_logic::TrafficConfig;

pub const TRAFFIC_COLORS: [u32; 5] = [0x0066cc, 0xcc0000, 0x00cc00, 0xcccc00, 0xcc00cc];
const TRAFFIC_RIDE_HEIGHT: f32 = 1.0;
const SPAWN_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrafficKind {
    Civilian,
}

/// An AI car: constant velocity, no physics body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficVehicle {
    pub kind: TrafficKind,
    pub position: Vec3,
    /// units per second
    pub velocity: Vec3,
    /// index into [`TRAFFIC_COLORS`]
    pub color: usize,
}

impl TrafficVehicle {
    /// Random placement inside the spawn square, kept away from `avoid`.
    pub fn random(config: &TrafficConfig, avoid: Vec3, rng: &mut impl Rng) -> Self {
        let extent = config.spawn_extent.max(1.0);
        let mut position = Vec3::ZERO;
        for _ in 0..SPAWN_ATTEMPTS {
            position = Vec3::new(
                rng.random_range(-extent..extent),
                TRAFFIC_RIDE_HEIGHT,
                rng.random_range(-extent..extent),
            );
            let gap = Vec2::new(position.x - avoid.x, position.z - avoid.z).length();
            if gap >= config.spawn_clearance {
                break;
            }
        }

        let speed = if config.max_speed > config.min_speed {
            rng.random_range(config.min_speed..config.max_speed)
        } else {
            config.min_speed
        };
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let velocity = if rng.random_bool(0.5) {
            Vec3::new(speed * direction, 0.0, 0.0)
        } else {
            Vec3::new(0.0, 0.0, speed * direction)
        };

        Self {
            kind: TrafficKind::Civilian,
            position,
            velocity,
            color: rng.random_range(0..TRAFFIC_COLORS.len()),
        }
    }
}

/// Past the bound, a coordinate reappears at the opposite bound.
pub fn wrap_coordinate(value: f32, bound: f32) -> f32 {
    if value.abs() > bound {
        -value.signum() * bound
    } else {
        value
    }
}

/// All AI cars of a session.
pub struct Traffic {
    pool: Pool<TrafficVehicle>,
}

impl Traffic {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: Pool::with_capacity(capacity),
        }
    }

    #[cfg(test)]
    pub fn insert(&mut self, vehicle: TrafficVehicle) -> Option<SlotId> {
        self.pool.insert(vehicle)
    }

    pub fn spawn(&mut self, config: &TrafficConfig, avoid: Vec3, rng: &mut impl Rng) -> Option<SlotId> {
        if self.pool.is_full() {
            return None;
        }
        self.pool.insert(TrafficVehicle::random(config, avoid, rng))
    }

    pub fn remove(&mut self, id: SlotId) -> Option<TrafficVehicle> {
        self.pool.remove(id)
    }

    pub fn get(&self, id: SlotId) -> Option<&TrafficVehicle> {
        self.pool.get(id)
    }

    /// Moves every car along its velocity and wraps it at the world bound.
    pub fn advance(&mut self, dt: f32, bound: f32) {
        for (_, vehicle) in self.pool.iter_mut() {
            vehicle.position += vehicle.velocity * dt;
            vehicle.position.x = wrap_coordinate(vehicle.position.x, bound);
            vehicle.position.z = wrap_coordinate(vehicle.position.z, bound);
        }
    }

    /// Cars closer than `threshold` to `player`, nearest first.
    pub fn contacts(&self, player: Vec3, threshold: f32) -> Vec<SlotId> {
        let mut hits: Vec<(SlotId, f32)> = self
            .pool
            .iter()
            .map(|(id, v)| (id, v.position.distance(player)))
            .filter(|(_, distance)| *distance < threshold)
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));
        hits.into_iter().map(|(id, _)| id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &TrafficVehicle)> {
        self.pool.iter()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.pool.clear();
    }
}
