use crate::game_logic::{Archetype, MAX_HEALTH};

pub const DEFAULT_GAME_MODE: &str = "free-roam";

/// Scoreboard of one session. `speed` is rewritten from the car body every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    /// km/h
    pub speed: f32,
    pub score: f64,
    pub combo: f32,
    pub health: f32,
    /// placeholder, nothing raises it yet
    pub wanted_level: u8,
    pub is_paused: bool,
    pub is_game_over: bool,
    pub selected_car: Archetype,
    pub game_mode: String,
}

impl SessionStats {
    pub fn new(selected_car: Archetype, game_mode: impl Into<String>) -> Self {
        Self {
            speed: 0.0,
            score: 0.0,
            combo: 1.0,
            health: MAX_HEALTH,
            wanted_level: 0,
            is_paused: false,
            is_game_over: false,
            selected_car,
            game_mode: game_mode.into(),
        }
    }

    /// Adds `points` scaled by the combo and returns what was awarded.
    pub fn add_score(&mut self, points: f32) -> f64 {
        if self.is_game_over || points <= 0.0 {
            return 0.0;
        }
        let awarded = points as f64 * self.combo as f64;
        self.score += awarded;
        awarded
    }

    pub fn increase_combo(&mut self, amount: f32, ceiling: f32) {
        if self.is_game_over {
            return;
        }
        self.combo = (self.combo + amount.max(0.0)).min(ceiling.max(1.0));
    }

    pub fn decay_combo(&mut self, amount: f32) {
        if self.combo > 1.0 {
            self.combo = (self.combo - amount.max(0.0)).max(1.0);
        }
    }

    /// Applies damage, floored at zero health. Returns true when this hit ended the game.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.is_game_over {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            self.is_game_over = true;
            return true;
        }
        false
    }
}
