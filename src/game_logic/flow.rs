use bevy::prelude::*;

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    #[default]
    Loading,
    Running,
    Paused,
    GameOver,
}

/// Things that can move the game between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    SessionReady,
    TogglePause,
    HealthDepleted,
    Restart,
}

/// State reached from `state` on `event`, or `None` when the event does not apply.
///
/// Restart goes through Loading so a fresh session gets built.
pub fn next_state(state: GameState, event: FlowEvent) -> Option<GameState> {
    use FlowEvent::*;
    use GameState::*;

    match (state, event) {
        (Loading, SessionReady) => Some(Running),
        (Running, TogglePause) => Some(Paused),
        (Paused, TogglePause) => Some(Running),
        (Running, HealthDepleted) => Some(GameOver),
        (Paused | GameOver, Restart) => Some(Loading),
        _ => None,
    }
}
