use bevy::prelude::*;

use crate::game_logic::SlotId;

/// Everything spawned for one session; despawned when a new one is built.
#[derive(Component)]
pub struct SessionEntity;

#[derive(Component)]
pub struct PlayerCar;

/// Mirrors the traffic vehicle stored in `slot`.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrafficCar {
    pub slot: SlotId,
    /// a respawn into the same slot may pick another color
    pub color: usize,
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Wheel {
    pub front: bool,
}

#[derive(Component)]
pub struct FollowCamera;
