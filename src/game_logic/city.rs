use bevy::prelude::*;
use rand::Rng;

use crate::game_logic::{CityConfig, GROUND_SIZE};

pub const BUILDING_SHADES: [u32; 4] = [0x444444, 0x555555, 0x666666, 0x777777];
pub const LIGHT_POLE_HEIGHT: f32 = 15.0;
const PLACEMENT_ATTEMPTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Building {
    pub center: Vec3,
    pub size: Vec3,
    /// index into [`BUILDING_SHADES`]
    pub shade: usize,
}

impl Building {
    pub fn half_extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Horizontal distance from `point` to the footprint, 0 when inside.
    pub fn footprint_distance(&self, point: Vec3) -> f32 {
        let half = self.half_extents();
        let dx = ((point.x - self.center.x).abs() - half.x).max(0.0);
        let dz = ((point.z - self.center.z).abs() - half.z).max(0.0);
        Vec2::new(dx, dz).length()
    }
}

/// Flat road strip lying on the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Road {
    pub center: Vec3,
    /// extent along x and z
    pub size: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetLight {
    pub base: Vec3,
}

impl StreetLight {
    pub fn lamp_position(&self) -> Vec3 {
        self.base + Vec3::Y * (LIGHT_POLE_HEIGHT + 0.5)
    }
}

/// Static scenery of a session. Only buildings get collision bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityLayout {
    pub buildings: Vec<Building>,
    pub roads: Vec<Road>,
    pub street_lights: Vec<StreetLight>,
}

impl CityLayout {
    pub fn generate(config: &CityConfig, rng: &mut impl Rng) -> Self {
        let buildings = (0..config.buildings)
            .map(|_| place_building(config, rng))
            .collect();

        let half_roads = (config.roads_per_axis / 2) as f32;
        let mut roads = Vec::with_capacity(config.roads_per_axis * 2);
        for i in 0..config.roads_per_axis {
            let offset = (i as f32 - half_roads) * config.road_spacing;
            roads.push(Road {
                center: Vec3::new(0.0, 0.0, offset),
                size: Vec2::new(GROUND_SIZE, config.road_width),
            });
            roads.push(Road {
                center: Vec3::new(offset, 0.0, 0.0),
                size: Vec2::new(config.road_width, GROUND_SIZE),
            });
        }

        let extent = config.street_light_extent.max(1.0);
        let street_lights = (0..config.street_lights)
            .map(|_| StreetLight {
                base: Vec3::new(
                    rng.random_range(-extent..extent),
                    0.0,
                    rng.random_range(-extent..extent),
                ),
            })
            .collect();

        Self {
            buildings,
            roads,
            street_lights,
        }
    }
}

fn sample(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

fn place_building(config: &CityConfig, rng: &mut impl Rng) -> Building {
    let extent = config.building_extent.max(1.0);
    let mut building = Building {
        center: Vec3::ZERO,
        size: Vec3::ONE,
        shade: 0,
    };
    for _ in 0..PLACEMENT_ATTEMPTS {
        let size = Vec3::new(
            sample(rng, config.min_footprint, config.max_footprint),
            sample(rng, config.min_height, config.max_height),
            sample(rng, config.min_footprint, config.max_footprint),
        );
        building = Building {
            center: Vec3::new(
                rng.random_range(-extent..extent),
                size.y / 2.0,
                rng.random_range(-extent..extent),
            ),
            size,
            shade: rng.random_range(0..BUILDING_SHADES.len()),
        };
        if building.footprint_distance(Vec3::ZERO) >= config.spawn_clearance {
            break;
        }
    }
    building
}
