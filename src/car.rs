use std::collections::HashMap;

use bevy::prelude::*;

use crate::game_logic::{
    GameSession, ParticleKind, PlayerCar, SessionEntity, SlotId, TrafficCar, VehicleProfile,
    Wheel, TRAFFIC_COLORS, TRAFFIC_SIZE,
};
use crate::scene::hex_color;

const WHEEL_RADIUS: f32 = 0.4;
const WHEEL_WIDTH: f32 = 0.3;

/// Car body with four wheels as children, placed where the session put the car.
pub fn spawn_player_car(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    profile: &VehicleProfile,
    transform: Transform,
) {
    let body_material = materials.add(StandardMaterial {
        base_color: hex_color(profile.color),
        metallic: 0.6,
        perceptual_roughness: 0.4,
        ..default()
    });
    let wheel_mesh = meshes.add(Cylinder::new(WHEEL_RADIUS, WHEEL_WIDTH));
    let wheel_material = materials.add(StandardMaterial {
        base_color: hex_color(0x111111),
        ..default()
    });

    let half = profile.half_extents();
    commands
        .spawn((
            Mesh3d(meshes.add(Cuboid::new(profile.width, profile.height, profile.length))),
            MeshMaterial3d(body_material),
            transform,
            PlayerCar,
            SessionEntity,
        ))
        .with_children(|car| {
            // forward is -Z, so the front axle sits at negative z
            for (x, z, front) in [
                (-half.x, -half.z * 0.7, true),
                (half.x, -half.z * 0.7, true),
                (-half.x, half.z * 0.7, false),
                (half.x, half.z * 0.7, false),
            ] {
                car.spawn((
                    Mesh3d(wheel_mesh.clone()),
                    MeshMaterial3d(wheel_material.clone()),
                    Transform::from_xyz(x, -half.y, z)
                        .with_rotation(wheel_rotation(0.0, 0.0)),
                    Wheel { front },
                ));
            }
        });
}

/// Cylinder lying on its side, yawed by `steer` and rolled by `spin`.
pub fn wheel_rotation(steer: f32, spin: f32) -> Quat {
    Quat::from_rotation_y(steer)
        * Quat::from_rotation_x(spin)
        * Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)
}

pub fn sync_player_car(
    session: Res<GameSession>,
    mut car: Query<&mut Transform, (With<PlayerCar>, Without<Wheel>)>,
    mut wheels: Query<(&mut Transform, &Wheel), Without<PlayerCar>>,
) {
    let Some(state) = session.player_state() else {
        return;
    };
    if let Ok(mut transform) = car.single_mut() {
        transform.translation = state.position;
        transform.rotation = state.rotation;
    }
    for (mut transform, wheel) in &mut wheels {
        let steer = if wheel.front { session.wheel_steer() } else { 0.0 };
        transform.rotation = wheel_rotation(steer, -session.wheel_spin());
    }
}

/// Keeps one entity per occupied traffic slot.
pub fn sync_traffic(
    mut commands: Commands,
    session: Res<GameSession>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut cars: Query<(Entity, &TrafficCar, &mut Transform)>,
    mut body_mesh: Local<Option<Handle<Mesh>>>,
) {
    let mut live: HashMap<SlotId, usize> = session
        .traffic()
        .iter()
        .map(|(slot, vehicle)| (slot, vehicle.color))
        .collect();

    for (entity, car, mut transform) in &mut cars {
        match session.traffic().get(car.slot) {
            Some(vehicle) if vehicle.color == car.color => {
                transform.translation = vehicle.position;
                transform.rotation = heading(vehicle.velocity);
                live.remove(&car.slot);
            }
            _ => commands.entity(entity).despawn(),
        }
    }

    let mesh = body_mesh
        .get_or_insert_with(|| meshes.add(Cuboid::from_size(Vec3::from_array(TRAFFIC_SIZE))))
        .clone();
    for (slot, color) in live {
        let Some(vehicle) = session.traffic().get(slot) else {
            continue;
        };
        let material = materials.add(StandardMaterial {
            base_color: hex_color(TRAFFIC_COLORS[color % TRAFFIC_COLORS.len()]),
            ..default()
        });
        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(vehicle.position).with_rotation(heading(vehicle.velocity)),
            TrafficCar { slot, color },
            SessionEntity,
        ));
    }
}

/// Rotation that points a car's -Z along `velocity`.
pub fn heading(velocity: Vec3) -> Quat {
    let flat = Vec3::new(velocity.x, 0.0, velocity.z);
    if flat.length_squared() < 1e-6 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(f32::atan2(-flat.x, -flat.z))
}

pub fn draw_particles(session: Res<GameSession>, mut gizmos: Gizmos) {
    for particle in session.particles().iter() {
        let (color, size) = match particle.kind {
            ParticleKind::Exhaust => (Color::srgb(0.4, 0.4, 0.4), 0.3),
            ParticleKind::Smoke => (Color::srgb(0.6, 0.6, 0.6), 0.5),
            ParticleKind::Sparks => (Color::srgb(1.0, 0.8, 0.2), 0.15),
            ParticleKind::Debris => (Color::srgb(1.0, 0.4, 0.0), 0.4),
        };
        let transform = Transform::from_translation(particle.position)
            .with_scale(Vec3::splat(size * particle.life.max(0.1)));
        gizmos.cuboid(transform, color.with_alpha(particle.life.clamp(0.0, 1.0)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_points_forward_along_velocity() {
        for velocity in [
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 12.0),
            Vec3::new(-8.0, 0.0, 0.0),
        ] {
            let forward = heading(velocity) * Vec3::NEG_Z;
            assert!(forward.distance(velocity.normalize()) < 1e-5);
        }
        assert_eq!(heading(Vec3::ZERO), Quat::IDENTITY);
    }

    #[test]
    fn test_wheel_steer_turns_about_y() {
        let straight = wheel_rotation(0.0, 0.0) * Vec3::Y;
        let turned = wheel_rotation(0.5, 0.0) * Vec3::Y;
        // the axle (local Y of the cylinder) swings in the ground plane
        assert!(straight.y.abs() < 1e-5 && turned.y.abs() < 1e-5);
        assert!((straight.angle_between(turned) - 0.5).abs() < 1e-4);
    }
}
