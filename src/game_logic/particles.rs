use bevy::prelude::*;
use rand::Rng;

use crate::game_logic::pool::{Pool, SlotId};

// life lost per second (full life is 1.0)
const LIFE_DECAY: f32 = 1.2;
const PARTICLE_GRAVITY: f32 = 6.0;
const PUFF_SPEED: f32 = 3.0;
const DEBRIS_SPEED: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    Exhaust,
    Smoke,
    Sparks,
    Debris,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub kind: ParticleKind,
    pub position: Vec3,
    pub velocity: Vec3,
    /// 1.0 when spawned, removed at 0.
    pub life: f32,
}

/// Cosmetic particles in a fixed-size arena. Spawns past capacity are dropped.
pub struct ParticlePool {
    pool: Pool<Particle>,
}

impl ParticlePool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pool: Pool::with_capacity(capacity),
        }
    }

    pub fn spawn(&mut self, kind: ParticleKind, position: Vec3, velocity: Vec3) -> Option<SlotId> {
        self.pool.insert(Particle {
            kind,
            position,
            velocity,
            life: 1.0,
        })
    }

    /// A particle drifting upward in a random direction.
    pub fn puff(&mut self, kind: ParticleKind, position: Vec3, rng: &mut impl Rng) -> Option<SlotId> {
        let velocity = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(0.0..2.0),
            rng.random_range(-1.0..1.0),
        ) * PUFF_SPEED;
        self.spawn(kind, position, velocity)
    }

    /// Burst of debris thrown outward and up.
    pub fn explode(&mut self, position: Vec3, count: usize, rng: &mut impl Rng) -> usize {
        (0..count)
            .filter_map(|_| {
                let velocity = Vec3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(0.0..1.0),
                    rng.random_range(-1.0..1.0),
                ) * DEBRIS_SPEED;
                self.spawn(ParticleKind::Debris, position, velocity)
            })
            .count()
    }

    pub fn update(&mut self, dt: f32) {
        self.pool.retain(|p| {
            p.position += p.velocity * dt;
            p.life -= LIFE_DECAY * dt;
            p.velocity.y -= PARTICLE_GRAVITY * dt;
            p.life > 0.0
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter().map(|(_, p)| p)
    }

    #[cfg(test)]
    pub fn count(&self, kind: ParticleKind) -> usize {
        self.iter().filter(|p| p.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    #[cfg(test)]
    pub fn clear(&mut self) {
        self.pool.clear();
    }
}
