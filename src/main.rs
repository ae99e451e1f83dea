mod camera;
mod car;
mod drift_settings;
mod game_logic;
mod hud;
mod input;
mod scene;
mod settings;

use bevy::{prelude::*, window::PresentMode};
use camera::{move_camera, spawn_camera, WIN_H, WIN_W};
use car::{draw_particles, spawn_player_car, sync_player_car, sync_traffic};
use drift_settings::DriftSettings;
use game_logic::{
    next_state, Archetype, DrivingInput, FlowEvent, GameConfig, GameSession, GameState,
    SessionEntity, TickOutcome, CONFIG_PATH,
};
use hud::{setup_hud, update_hud, update_overlay};
use input::read_driving_input;
use scene::{despawn_session_entities, setup_lighting, spawn_city};
use settings::{JsonFileStore, Settings, SETTINGS_PATH};

fn main() {
    let config = GameConfig::load_or_default(CONFIG_PATH);
    let drift_settings = DriftSettings {
        model: config.driving.model,
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Street Racer: Urban Chaos".into(),
                resolution: (WIN_W, WIN_H).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(config)
        .insert_resource(drift_settings)
        .insert_resource(Settings::new(JsonFileStore::open(SETTINGS_PATH)))
        .init_resource::<DrivingInput>()
        .insert_resource(Time::<Fixed>::from_hz(60.0)) // 60 Hz fixed update, one session tick each
        .init_state::<GameState>()
        .add_systems(Startup, (spawn_camera, setup_lighting, setup_hud))
        .add_systems(OnEnter(GameState::Loading), start_session)
        .add_systems(
            FixedUpdate,
            (read_driving_input, tick_session)
                .chain()
                .run_if(in_state(GameState::Running)),
        )
        .add_systems(Update, (handle_flow_keys, handle_choice_keys))
        .add_systems(
            Update,
            (
                sync_player_car,
                sync_traffic,
                draw_particles,
                move_camera.after(sync_player_car),
            )
                .run_if(resource_exists::<GameSession>)
                .run_if(not(in_state(GameState::Loading))),
        )
        .add_systems(Update, (update_hud, update_overlay))
        .add_systems(OnEnter(GameState::GameOver), save_high_score)
        .run();
}

// Builds a fresh session and its scene, replacing whatever was there before
fn start_session(
    mut commands: Commands,
    config: Res<GameConfig>,
    drift_settings: Res<DriftSettings>,
    settings: Res<Settings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    old_entities: Query<Entity, With<SessionEntity>>,
    mut next: ResMut<NextState<GameState>>,
    mut exit: EventWriter<AppExit>,
) {
    despawn_session_entities(&mut commands, &old_entities);

    let mut config = config.clone();
    config.driving.model = drift_settings.model;
    let session = match GameSession::with_simple_world(
        config,
        settings.selected_car(),
        settings.game_mode(),
    ) {
        Ok(session) => session,
        Err(err) => {
            error!("Could not start the game: {err}");
            exit.write(AppExit::error());
            return;
        }
    };

    spawn_city(&mut commands, &mut meshes, &mut materials, session.city());
    if let Some(state) = session.player_state() {
        spawn_player_car(
            &mut commands,
            &mut meshes,
            &mut materials,
            session.profile(),
            Transform::from_translation(state.position).with_rotation(state.rotation),
        );
    }

    commands.insert_resource(session);
    if let Some(state) = next_state(GameState::Loading, FlowEvent::SessionReady) {
        next.set(state);
    }
}

fn tick_session(
    input: Res<DrivingInput>,
    mut session: ResMut<GameSession>,
    mut next: ResMut<NextState<GameState>>,
) {
    if session.tick(&input) == TickOutcome::GameOver {
        if let Some(state) = next_state(GameState::Running, FlowEvent::HealthDepleted) {
            next.set(state);
        }
    }
}

// Escape pauses/resumes, R restarts a paused or finished game
fn handle_flow_keys(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameState>>,
    mut next: ResMut<NextState<GameState>>,
    session: Option<ResMut<GameSession>>,
) {
    let event = if keys.just_pressed(KeyCode::Escape) {
        FlowEvent::TogglePause
    } else if keys.just_pressed(KeyCode::KeyR) {
        FlowEvent::Restart
    } else {
        return;
    };
    let Some(target) = next_state(*state.get(), event) else {
        return;
    };

    if let Some(mut session) = session {
        match target {
            GameState::Paused => {
                session.pause();
            }
            GameState::Running => {
                session.resume();
            }
            GameState::Loading => info!("Restarting"),
            GameState::GameOver => {}
        }
    }
    next.set(target);
}

// F switches handling, 1/2/3 pick the car for the next session
fn handle_choice_keys(
    keys: Res<ButtonInput<KeyCode>>,
    mut drift_settings: ResMut<DriftSettings>,
    mut settings: ResMut<Settings>,
    mut session: Option<ResMut<GameSession>>,
) {
    if keys.just_pressed(KeyCode::KeyF) {
        let model = drift_settings.toggle();
        if let Some(session) = session.as_mut() {
            session.set_driving_model(model);
            session.announce(format!("Handling: {}", model.label()));
        }
    }

    let choice = [KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3]
        .into_iter()
        .zip(Archetype::ALL)
        .find(|(key, _)| keys.just_pressed(*key));
    if let Some((_, archetype)) = choice {
        settings.set_selected_car(archetype);
        info!("Next car: {}", archetype.as_str());
        if let Some(session) = session.as_mut() {
            session.announce(format!("Next car: {} (R to restart)", archetype.profile().name));
        }
    }
}

fn save_high_score(session: Res<GameSession>, mut settings: ResMut<Settings>) {
    let score = session.stats.score;
    if settings.record_score(score) {
        info!("New high score: {score:.0}");
    }
}
