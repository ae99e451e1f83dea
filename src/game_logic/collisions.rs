use crate::game_logic::{ScoringTuning, SessionStats};

/// What a single traffic hit did to the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactOutcome {
    pub damage: f32,
    pub points: f64,
    pub combo: f32,
    /// true when this hit took the last of the health
    pub ended_game: bool,
}

/// Damage taken from a hit at `speed_kmh`, capped.
pub fn contact_damage(speed_kmh: f32, tuning: &ScoringTuning) -> f32 {
    let divisor = tuning.damage_divisor.max(f32::EPSILON);
    (speed_kmh.abs() / divisor).clamp(0.0, tuning.damage_cap.max(0.0))
}

/// Scores a traffic hit and applies its damage.
///
/// Points and combo are awarded before the damage lands, so the hit that ends
/// the game still counts. Returns `None` once the game is over.
pub fn resolve_traffic_contact(
    stats: &mut SessionStats,
    tuning: &ScoringTuning,
) -> Option<ContactOutcome> {
    if stats.is_game_over {
        return None;
    }

    let points = stats.add_score(tuning.contact_bonus);
    stats.increase_combo(tuning.contact_combo, tuning.combo_ceiling);
    let combo = stats.combo;

    let damage = contact_damage(stats.speed, tuning);
    let ended_game = stats.take_damage(damage);

    Some(ContactOutcome {
        damage,
        points,
        combo,
        ended_game,
    })
}

/// Per-tick score from driving fast and sliding. `lateral_speed` is the car's
/// sideways speed in m/s; turning alone is not a drift.
///
/// Returns the drift bonus awarded this tick, if any, so the caller can announce it.
pub fn score_driving(
    stats: &mut SessionStats,
    lateral_speed: f32,
    tuning: &ScoringTuning,
) -> Option<f64> {
    if stats.is_game_over {
        return None;
    }

    let fast = stats.speed > tuning.speed_score_threshold_kmh;
    if fast {
        stats.add_score(stats.speed * tuning.speed_score_rate);
    }

    let mut drift = None;
    if fast && lateral_speed.abs() > tuning.drift_slip_threshold {
        drift = Some(stats.add_score(tuning.drift_bonus));
        stats.increase_combo(tuning.drift_combo, tuning.combo_ceiling);
    }

    stats.decay_combo(tuning.combo_decay);
    drift
}
