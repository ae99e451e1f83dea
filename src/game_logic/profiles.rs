// src/game_logic/profiles.rs
use bevy::prelude::*;

use crate::game_logic::MS_TO_KMH;

/// Named vehicle tuning preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Archetype {
    #[default]
    Sports,
    Muscle,
    Suv,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Sports, Archetype::Muscle, Archetype::Suv];

    pub fn as_str(&self) -> &'static str {
        match self {
            Archetype::Sports => "sports",
            Archetype::Muscle => "muscle",
            Archetype::Suv => "suv",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim() {
            "sports" => Some(Archetype::Sports),
            "muscle" => Some(Archetype::Muscle),
            "suv" => Some(Archetype::Suv),
            _ => None,
        }
    }

    /// Unknown or malformed ids degrade to the default archetype.
    pub fn from_id_or_default(id: &str) -> Self {
        Self::from_id(id).unwrap_or_default()
    }

    pub fn profile(self) -> VehicleProfile {
        match self {
            Archetype::Sports => VehicleProfile {
                archetype: Archetype::Sports,
                name: "Nitro GT-R",
                width: 2.2,
                height: 1.2,
                length: 4.5,
                mass: 1200.0,
                color: 0xff6b35,
                max_speed_kmh: 260.0,
                engine_force: 800.0,
                tick_acceleration: 0.7,
                handling: 0.9,
                durability: 0.4,
            },
            Archetype::Muscle => VehicleProfile {
                archetype: Archetype::Muscle,
                name: "Street Demon",
                width: 2.4,
                height: 1.4,
                length: 5.2,
                mass: 1800.0,
                color: 0x8b0000,
                max_speed_kmh: 220.0,
                engine_force: 600.0,
                tick_acceleration: 0.55,
                handling: 0.7,
                durability: 0.8,
            },
            Archetype::Suv => VehicleProfile {
                archetype: Archetype::Suv,
                name: "Urban Tank",
                width: 2.8,
                height: 1.8,
                length: 5.8,
                mass: 2500.0,
                color: 0x2f4f4f,
                max_speed_kmh: 180.0,
                engine_force: 400.0,
                tick_acceleration: 0.45,
                handling: 0.5,
                durability: 0.95,
            },
        }
    }
}

/// Immutable tuning constants for one archetype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleProfile {
    pub archetype: Archetype,
    pub name: &'static str,
    pub width: f32,
    pub height: f32,
    pub length: f32,
    pub mass: f32,
    /// 0xRRGGBB, cosmetic only
    pub color: u32,
    pub max_speed_kmh: f32,
    /// Force magnitude (N) used by the force-impulse model.
    pub engine_force: f32,
    /// Speed gained per tick (m/s) used by the kinematic grip model.
    pub tick_acceleration: f32,
    /// Steering authority, 0..1
    pub handling: f32,
    /// Damage resistance, 0..1. Reserved: not part of the damage formula.
    pub durability: f32,
}

impl VehicleProfile {
    /// Top speed in m/s. A zero top speed is treated as 1 km/h so callers can divide by it.
    pub fn max_speed_ms(&self) -> f32 {
        let kmh = if self.max_speed_kmh > 0.0 { self.max_speed_kmh } else { 1.0 };
        kmh / MS_TO_KMH
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.width, self.height, self.length) * 0.5
    }
}

/// Splits 0xRRGGBB into its channels.
pub fn hex_rgb(hex: u32) -> [u8; 3] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8]
}

/// Profile lookup by archetype id, falling back to `sports`.
pub fn lookup(archetype_id: &str) -> VehicleProfile {
    Archetype::from_id_or_default(archetype_id).profile()
}
