use bevy::prelude::*;

use crate::drift_settings::DriftSettings;
use crate::game_logic::{EngineSound, GameSession, GameState, SessionStats};
use crate::settings::Settings;

#[derive(Component)]
pub struct StatsText;

#[derive(Component)]
pub struct NotificationText;

/// Pause and game-over banner.
#[derive(Component)]
pub struct OverlayText;

pub fn setup_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        StatsText,
    ));
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 36.0,
            ..default()
        },
        TextColor(Color::srgb(1.0, 0.85, 0.2)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Percent(20.0),
            width: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        TextLayout::new_with_justify(JustifyText::Center),
        NotificationText,
    ));
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 48.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Percent(40.0),
            width: Val::Percent(100.0),
            justify_content: JustifyContent::Center,
            ..default()
        },
        TextLayout::new_with_justify(JustifyText::Center),
        BackgroundColor(Color::BLACK.with_alpha(0.5)),
        Visibility::Hidden,
        OverlayText,
    ));
}

pub fn stats_lines(stats: &SessionStats, engine: EngineSound, car: &str, model: &str) -> String {
    format!(
        "Speed: {:.0} km/h\nEngine: {:.0}% x{:.2}\nScore: {:.0}\nCombo: x{:.1}\nHealth: {:.0}\nCar: {car}  Handling: {model}",
        stats.speed,
        engine.volume * 100.0,
        engine.pitch,
        stats.score,
        stats.combo,
        stats.health
    )
}

pub fn overlay_message(state: &GameState, score: f64, high_score: f64) -> Option<String> {
    match state {
        GameState::Paused => Some("PAUSED\nEsc to resume, R to restart".to_string()),
        GameState::GameOver => Some(format!(
            "GAME OVER\nFinal score: {score:.0}\nHigh score: {:.0}\nR to restart",
            high_score.max(score)
        )),
        GameState::Loading | GameState::Running => None,
    }
}

pub fn update_hud(
    session: Option<Res<GameSession>>,
    drift_settings: Res<DriftSettings>,
    mut stats_text: Single<&mut Text, (With<StatsText>, Without<NotificationText>)>,
    mut notification_text: Single<&mut Text, (With<NotificationText>, Without<StatsText>)>,
) {
    let Some(session) = session else {
        return;
    };
    stats_text.0 = stats_lines(
        &session.stats,
        session.engine_sound(),
        session.profile().name,
        drift_settings.mode_label(),
    );
    notification_text.0 = session.notification().unwrap_or_default().to_string();
}

pub fn update_overlay(
    state: Res<State<GameState>>,
    session: Option<Res<GameSession>>,
    settings: Res<Settings>,
    overlay: Single<(&mut Text, &mut Visibility), With<OverlayText>>,
) {
    let (mut text, mut visibility) = overlay.into_inner();
    let score = session.map(|s| s.stats.score).unwrap_or_default();
    match overlay_message(state.get(), score, settings.high_score()) {
        Some(message) => {
            text.0 = message;
            *visibility = Visibility::Visible;
        }
        None => *visibility = Visibility::Hidden,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_logic::Archetype;

    #[test]
    fn test_stats_lines() {
        let mut stats = SessionStats::new(Archetype::Muscle, "free-roam");
        stats.speed = 123.4;
        stats.score = 2050.6;
        stats.combo = 1.25;
        let engine = EngineSound::from_speed(stats.speed);
        let text = stats_lines(&stats, engine, "Muscle Car", "Grip");
        assert!(text.contains("Speed: 123 km/h"));
        assert!(text.contains("Engine: 100% x0.96"));
        assert!(text.contains("Score: 2051"));
        assert!(text.contains("Health: 100"));
        assert!(text.contains("Car: Muscle Car  Handling: Grip"));
    }

    #[test]
    fn test_overlay_only_when_stopped() {
        assert!(overlay_message(&GameState::Running, 10.0, 0.0).is_none());
        assert!(overlay_message(&GameState::Loading, 10.0, 0.0).is_none());
        assert!(overlay_message(&GameState::Paused, 10.0, 0.0)
            .unwrap()
            .starts_with("PAUSED"));
        let over = overlay_message(&GameState::GameOver, 900.0, 500.0).unwrap();
        assert!(over.contains("Final score: 900"));
        assert!(over.contains("High score: 900"));
    }
}
