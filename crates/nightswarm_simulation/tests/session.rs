//! Интеграционные тесты жизненного цикла сессии
//!
//! Respawn-цикл Alive → Dead → Respawning → Alive, подавление game-over
//! в respawn-окне, carryover, идемпотентный спавн, countdown.

use bevy::prelude::*;
use nightswarm_simulation::*;

const DT: f32 = 0.1;

fn create_session_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    // без волны: тесты сессии не трогают врагов
    app.world_mut().resource_mut::<SpawnDirector>().disabled = true;
    app
}

fn step_n(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        step_simulation(app, DT);
    }
}

fn count_players(app: &mut App) -> usize {
    let mut query = app.world_mut().query_filtered::<Entity, With<Player>>();
    query.iter(app.world()).count()
}

#[test]
fn test_initial_spawn() {
    let mut app = create_session_app(42);
    step_n(&mut app, 1);

    let session = app.world().resource::<SessionState>();
    assert!(session.player_alive);
    let player = session.player_handle.expect("player spawned at startup");

    let health = app.world().get::<Health>(player).unwrap();
    assert_eq!(health.current, 3.0);
    assert_eq!(
        app.world().get::<Transform>(player).unwrap().translation,
        Vec3::ZERO
    );
}

#[test]
fn test_respawn_cycle_with_game_over_suppression() {
    let mut app = create_session_app(42);
    step_n(&mut app, 1);

    let player = app
        .world()
        .resource::<SessionState>()
        .player_handle
        .unwrap();

    // игрок успел уйти с точки спавна
    app.world_mut()
        .get_mut::<Transform>(player)
        .unwrap()
        .translation = Vec3::new(5.0, 0.0, 2.0);

    // destroy-зона забирает игрока на t ~= 0.2
    app.world_mut().send_event(PlayerDestroyRequested);
    step_n(&mut app, 1);

    let session = app.world().resource::<SessionState>();
    assert!(session.respawning);
    assert!(!session.player_alive);
    assert!(session.player_handle.is_none());
    assert!(session.carryover.is_some());
    // экземпляр удержан, а не удалён
    assert!(app.world().get::<Retired>(player).is_some());

    // всё respawn-окно game-over подавлен, хотя player_alive == false
    step_n(&mut app, 15); // t ~= 1.7
    let session = app.world().resource::<SessionState>();
    assert!(session.respawning);
    assert!(session.outcome.is_none());

    // после задержки (2с) — реактивация на точке спавна, не в точке смерти
    step_n(&mut app, 9); // t ~= 2.6
    let session = app.world().resource::<SessionState>();
    assert!(!session.respawning);
    assert!(session.carryover.is_none()); // снапшот применён и очищен
    assert_eq!(session.player_handle, Some(player)); // тот же Entity id
    assert!(app.world().get::<Retired>(player).is_none());
    assert_eq!(
        app.world().get::<Transform>(player).unwrap().translation,
        Vec3::ZERO
    );
    assert_eq!(count_players(&mut app), 1);

    // carryover-здоровье снято в момент смерти (0) и восстановлено с clamp:
    // нулевое здоровье после реактивации — немедленный game over
    let health = app.world().get::<Health>(player).unwrap();
    assert_eq!(health.current, 0.0);
    assert!(!health.is_dead());
    assert_eq!(
        app.world().resource::<SessionState>().outcome,
        Some(SessionOutcome::PlayerDefeated)
    );
}

#[test]
fn test_spawn_request_idempotent_with_live_player() {
    let mut app = create_session_app(42);
    step_n(&mut app, 1);

    let player = app
        .world()
        .resource::<SessionState>()
        .player_handle
        .unwrap();

    // respawn-запрос при живом игроке с положительным здоровьем — no-op
    {
        let mut session = app.world_mut().resource_mut::<SessionState>();
        session.respawning = true;
        session.respawn_at = 0.0;
    }
    step_n(&mut app, 1);

    let session = app.world().resource::<SessionState>();
    assert!(!session.respawning);
    assert_eq!(session.player_handle, Some(player));
    assert_eq!(count_players(&mut app), 1);
    assert_eq!(
        app.world().get::<Health>(player).unwrap().current,
        3.0
    );
}

#[test]
fn test_countdown_display_and_expiry() {
    let mut app = create_session_app(42);
    {
        let mut config = app.world_mut().resource_mut::<SessionConfig>();
        config.countdown_seconds = 1.0;
        config.countdown_end_scene = "time-up".to_owned();
    }

    step_n(&mut app, 1);
    assert_eq!(
        app.world().resource::<CountdownDisplay>().text,
        "Time Remaining: 1"
    );
    assert!(app.world().resource::<SessionState>().outcome.is_none());

    step_n(&mut app, 11); // countdown исчерпан, терминальный переход
    let session = app.world().resource::<SessionState>();
    assert_eq!(session.outcome, Some(SessionOutcome::TimeExpired));

    let scenes: Vec<String> = app
        .world_mut()
        .resource_mut::<Events<SceneChangeRequest>>()
        .drain()
        .map(|request| request.scene)
        .collect();
    assert_eq!(scenes, vec!["time-up".to_owned()]);
}

#[test]
fn test_countdown_expiry_with_unset_scene_is_noop() {
    let mut app = create_session_app(42);
    app.world_mut()
        .resource_mut::<SessionConfig>()
        .countdown_seconds = 0.5;

    step_n(&mut app, 8);
    // исход выставлен, но запрос сцены не отправлен (имя пустое — warning)
    assert_eq!(
        app.world().resource::<SessionState>().outcome,
        Some(SessionOutcome::TimeExpired)
    );
    assert!(app.world().resource::<Events<SceneChangeRequest>>().is_empty());
}

#[test]
fn test_missing_spawn_config_is_fatal_for_spawn_path() {
    let mut app = create_session_app(42);
    {
        let mut config = app.world_mut().resource_mut::<SessionConfig>();
        config.spawn_point = None;
        config.player = None;
    }

    step_n(&mut app, 1);

    // игрок не создан, сессия сразу репортует проигрыш
    assert_eq!(count_players(&mut app), 0);
    let session = app.world().resource::<SessionState>();
    assert!(!session.player_alive);
    assert_eq!(session.outcome, Some(SessionOutcome::PlayerDefeated));
}
