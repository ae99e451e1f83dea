use bevy::prelude::*;

use crate::game_logic::DrivingInput;

/// Driving intent from whichever keys `pressed` reports as held.
pub fn driving_input_from(pressed: impl Fn(KeyCode) -> bool) -> DrivingInput {
    let any = |keys: &[KeyCode]| keys.iter().any(|&key| pressed(key));
    DrivingInput {
        forward: any(&[KeyCode::KeyW, KeyCode::ArrowUp]),
        reverse: any(&[KeyCode::KeyS, KeyCode::ArrowDown]),
        left: any(&[KeyCode::KeyA, KeyCode::ArrowLeft]),
        right: any(&[KeyCode::KeyD, KeyCode::ArrowRight]),
        handbrake: any(&[KeyCode::Space]),
        boost: any(&[KeyCode::ShiftLeft, KeyCode::ShiftRight]),
    }
}

// Held keys are sampled right before each fixed tick
pub fn read_driving_input(keys: Res<ButtonInput<KeyCode>>, mut input: ResMut<DrivingInput>) {
    *input = driving_input_from(|key| keys.pressed(key));
}
