use bevy::prelude::*;

use crate::game_logic::{
    hex_rgb, CityLayout, SessionEntity, BUILDING_SHADES, GROUND_SIZE, LIGHT_POLE_HEIGHT,
};

const SKY_COLOR: u32 = 0x87ceeb;
const GROUND_COLOR: u32 = 0x333333;
const ROAD_COLOR: u32 = 0x222222;
const POLE_COLOR: u32 = 0x666666;
const LAMP_COLOR: u32 = 0xffffaa;

pub fn hex_color(hex: u32) -> Color {
    let [r, g, b] = hex_rgb(hex);
    Color::srgb_u8(r, g, b)
}

/// Sky, sun and ambient light. Lives for the whole app.
pub fn setup_lighting(mut commands: Commands) {
    commands.insert_resource(ClearColor(hex_color(SKY_COLOR)));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 400.0,
        ..default()
    });
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(100.0, 200.0, 50.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

/// Ground, roads, buildings and street lights of one session.
pub fn spawn_city(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    city: &CityLayout,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(GROUND_SIZE, GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: hex_color(GROUND_COLOR),
            perceptual_roughness: 0.8,
            ..default()
        })),
        SessionEntity,
    ));

    let road_material = materials.add(StandardMaterial {
        base_color: hex_color(ROAD_COLOR),
        perceptual_roughness: 0.9,
        ..default()
    });
    for road in &city.roads {
        commands.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(road.size.x, road.size.y))),
            MeshMaterial3d(road_material.clone()),
            // just above the ground to avoid z-fighting
            Transform::from_translation(road.center + Vec3::Y * 0.01),
            SessionEntity,
        ));
    }

    let shade_materials: Vec<_> = BUILDING_SHADES
        .iter()
        .map(|&shade| {
            materials.add(StandardMaterial {
                base_color: hex_color(shade),
                perceptual_roughness: 0.7,
                ..default()
            })
        })
        .collect();
    for building in &city.buildings {
        let Some(material) = shade_materials.get(building.shade) else {
            continue;
        };
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::from_size(building.size))),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(building.center),
            SessionEntity,
        ));
    }

    let pole = meshes.add(Cylinder::new(0.2, LIGHT_POLE_HEIGHT));
    let pole_material = materials.add(StandardMaterial {
        base_color: hex_color(POLE_COLOR),
        ..default()
    });
    let lamp = meshes.add(Sphere::new(0.5));
    let lamp_material = materials.add(StandardMaterial {
        base_color: hex_color(LAMP_COLOR),
        emissive: LinearRgba::rgb(1.0, 1.0, 0.6),
        ..default()
    });
    for light in &city.street_lights {
        commands.spawn((
            Mesh3d(pole.clone()),
            MeshMaterial3d(pole_material.clone()),
            Transform::from_translation(light.base + Vec3::Y * LIGHT_POLE_HEIGHT / 2.0),
            SessionEntity,
        ));
        commands.spawn((
            Mesh3d(lamp.clone()),
            MeshMaterial3d(lamp_material.clone()),
            PointLight {
                color: hex_color(LAMP_COLOR),
                intensity: 200_000.0,
                range: 50.0,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_translation(light.lamp_position()),
            SessionEntity,
        ));
    }
}

/// Removes whatever the previous session spawned.
pub fn despawn_session_entities(commands: &mut Commands, entities: &Query<Entity, With<SessionEntity>>) {
    for entity in entities.iter() {
        commands.entity(entity).despawn();
    }
}
