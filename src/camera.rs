use bevy::prelude::*;
use rand::Rng;

use crate::game_logic::{BodyState, FollowCamera, GameSession};

// Window
pub const WIN_W: f32 = 1280.;
pub const WIN_H: f32 = 720.;

// Chase camera framing
pub const CAMERA_DISTANCE: f32 = 25.0;
pub const CAMERA_HEIGHT: f32 = 12.0;
pub const CAMERA_LOOK_AHEAD: f32 = 15.0;
pub const CAMERA_LERP: f32 = 0.1;

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE).looking_at(Vec3::ZERO, Vec3::Y),
        FollowCamera,
    ));
}

/// Where the camera wants to be and what it looks at, behind and above the car.
pub fn chase_target(car: &BodyState) -> (Vec3, Vec3) {
    let forward = car.forward_axis();
    let eye = car.position - forward * CAMERA_DISTANCE + Vec3::Y * CAMERA_HEIGHT;
    let look_at = car.position + forward * CAMERA_LOOK_AHEAD;
    (eye, look_at)
}

/// Eases the unshaken `anchor` toward `eye` and returns it with the shaken
/// translation. The shake never feeds back into the anchor.
pub fn follow(anchor: Vec3, eye: Vec3, shake: Vec3) -> (Vec3, Vec3) {
    let anchor = anchor.lerp(eye, CAMERA_LERP);
    (anchor, anchor + shake)
}

// Camera movement system that follows the player
pub fn move_camera(
    session: Res<GameSession>,
    mut camera: Single<&mut Transform, With<FollowCamera>>,
    mut anchor: Local<Option<Vec3>>,
) {
    let Some(car) = session.player_state() else {
        return;
    };
    let (eye, look_at) = chase_target(&car);

    let shake = match session.camera_shake() {
        Some(intensity) => {
            let mut rng = rand::rng();
            Vec3::new(
                rng.random_range(-intensity..=intensity),
                rng.random_range(-intensity..=intensity),
                rng.random_range(-intensity..=intensity),
            )
        }
        None => Vec3::ZERO,
    };

    let (next_anchor, translation) = follow(anchor.unwrap_or(camera.translation), eye, shake);
    *anchor = Some(next_anchor);
    camera.translation = translation;
    camera.look_at(look_at, Vec3::Y);
}
