use std::path::PathBuf;

use thiserror::Error;

use crate::game_logic::world::BodyHandle;

/// Errors raised by a [`PhysicsWorld`](crate::game_logic::PhysicsWorld) implementation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    #[error("no body with handle {0:?}")]
    UnknownBody(BodyHandle),
    #[error("body {0:?} was already added to the world")]
    AlreadyAdded(BodyHandle),
    #[error("invalid body description: {0}")]
    InvalidBody(&'static str),
}

/// Fatal failures while building a game session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("physics world rejected the session setup: {0}")]
    World(#[from] WorldError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
