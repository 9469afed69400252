//! Жизненный цикл сессии: спавн/respawn игрока, countdown, game-over
//!
//! Цикл игрока: Alive → Dead → Respawning → Alive. Смерть от урона ведёт
//! к game-over; смерть от destroy-зоны (внешний слой) запускает respawn,
//! и game-over check подавлен на всё respawn-окно.
//!
//! player_alive / player_handle пишутся только системами этого модуля и
//! process_deaths — всегда парой, читатели не видят порванного состояния.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::components::{
    CollisionRadius, DeathSubscribers, Health, MovementSpeed, Player, PlayerSnapshot, Retired,
};

/// Исход сессии (терминальный, выставляется ровно один раз)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    TimeExpired,
    PlayerDefeated,
}

/// Глобальный контекст сессии
///
/// Общий сигнал "игрок жив" для AI и спавнера. Единственные писатели —
/// системы session-модуля и process_deaths.
#[derive(Resource, Debug, Clone)]
pub struct SessionState {
    pub player_alive: bool,
    pub player_handle: Option<Entity>,
    /// true строго между удалением игрока и активацией нового экземпляра
    pub respawning: bool,
    pub respawn_at: f32,
    pub carryover: Option<PlayerSnapshot>,
    pub countdown_remaining: f32,
    pub outcome: Option<SessionOutcome>,
    pub score: u32,
    /// Разрешённая поза спавна (однократно из конфига; None — спавн невозможен)
    pub spawn_pose: Option<Transform>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            player_alive: false,
            player_handle: None,
            respawning: false,
            respawn_at: 0.0,
            carryover: None,
            countdown_remaining: 60.0,
            outcome: None,
            score: 0,
            spawn_pose: None,
        }
    }
}

impl SessionState {
    pub fn add_score(&mut self) {
        self.score += 1;
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Шаблон игрока (прототип вместо prefab)
#[derive(Debug, Clone, Copy)]
pub struct PlayerArchetype {
    pub max_health: f32,
    pub move_speed: f32,
    pub collision_radius: f32,
}

impl Default for PlayerArchetype {
    fn default() -> Self {
        Self {
            max_health: 3.0,
            move_speed: 5.0,
            collision_radius: 0.5,
        }
    }
}

/// Конфигурация сессии
///
/// Отсутствие и точки спавна, и архетипа игрока — фатально для пути
/// спавна: репортуется при инициализации, не ретраится.
#[derive(Resource, Debug, Clone)]
pub struct SessionConfig {
    pub spawn_point: Option<Transform>,
    pub player: Option<PlayerArchetype>,
    pub respawn_delay: f32,
    pub countdown_seconds: f32,
    /// Пустое имя сцены — warning и no-op при переходе
    pub countdown_end_scene: String,
    pub defeat_scene: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spawn_point: Some(Transform::IDENTITY),
            player: Some(PlayerArchetype::default()),
            respawn_delay: 2.0,
            countdown_seconds: 60.0,
            countdown_end_scene: String::new(),
            defeat_scene: String::new(),
        }
    }
}

impl SessionConfig {
    fn resolve_spawn_pose(&self) -> Option<Transform> {
        if let Some(pose) = self.spawn_point {
            return Some(pose);
        }
        if self.player.is_some() {
            crate::logger::log_warning(
                "Spawn point is not set, using player archetype default pose",
            );
            return Some(Transform::IDENTITY);
        }
        None
    }
}

/// Текст countdown для внешнего display-слоя (не влияет на корректность)
#[derive(Resource, Debug, Clone, Default)]
pub struct CountdownDisplay {
    pub text: String,
}

/// Событие: запрос смены сцены внешнему слою
#[derive(Event, Debug, Clone)]
pub struct SceneChangeRequest {
    pub scene: String,
}

/// Событие от destroy-зоны: игрока нужно убрать (падение за карту)
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerDestroyRequested;

fn countdown_text(remaining: f32) -> String {
    format!("Time Remaining: {}", remaining.max(0.0).ceil() as i32)
}

/// switch_to контракта сцен: пустое имя — warning, не fatal
fn request_scene_change(events: &mut EventWriter<SceneChangeRequest>, scene: &str) {
    if scene.is_empty() {
        crate::logger::log_warning("Scene name is not set");
        return;
    }
    events.write(SceneChangeRequest {
        scene: scene.to_owned(),
    });
}

/// Startup: разрешение позы спавна и первый спавн игрока
pub fn setup_session(
    mut commands: Commands,
    config: Res<SessionConfig>,
    mut session: ResMut<SessionState>,
) {
    session.countdown_remaining = config.countdown_seconds;
    session.spawn_pose = config.resolve_spawn_pose();

    if session.spawn_pose.is_none() {
        crate::logger::log_error(
            "Spawn point and player archetype are both not set, cannot initialize spawn",
        );
        return;
    }

    spawn_or_reactivate(&mut commands, &config, &mut session, None, None);
}

/// Спавн игрока: идемпотентный запрос
///
/// Живой игрок с положительным здоровьем уже есть — ничего не делаем.
/// Retired экземпляр предпочитается новому: его Entity id уже держат
/// чужие подписки, реактивация не создаёт протухших handle.
fn spawn_or_reactivate(
    commands: &mut Commands,
    config: &SessionConfig,
    session: &mut SessionState,
    active_player: Option<(Entity, f32)>,
    retired_player: Option<Entity>,
) -> Option<Entity> {
    let spawn_pose = session.spawn_pose?;

    if let Some((entity, current_health)) = active_player {
        if current_health > 0.0 {
            crate::logger::log("Active player already exists, spawn request ignored");
            return Some(entity);
        }
    }

    let archetype = config.player.unwrap_or_default();
    // carryover применяется один раз и очищается; health с clamp в [0, max]
    let (health, move_speed) = match session.carryover.take() {
        Some(snapshot) => (snapshot.health, snapshot.move_speed),
        None => (archetype.max_health, archetype.move_speed),
    };

    let entity = if let Some(retired) = retired_player {
        commands
            .entity(retired)
            .remove::<Retired>()
            .insert((
                spawn_pose,
                Health::restored(archetype.max_health, health),
                MovementSpeed { speed: move_speed },
                DeathSubscribers::default(),
            ));
        crate::logger::log_info("Retired player reactivated at spawn point");
        retired
    } else {
        if config.player.is_none() {
            crate::logger::log_error("Player archetype is not set, cannot spawn player");
            return None;
        }
        let entity = commands
            .spawn((
                spawn_pose,
                Player,
                Health::restored(archetype.max_health, health),
                CollisionRadius(archetype.collision_radius),
                MovementSpeed { speed: move_speed },
                DeathSubscribers::default(),
            ))
            .id();
        crate::logger::log_info("Player spawned at spawn point");
        entity
    };

    // handle и флаг обновляются вместе
    session.player_handle = Some(entity);
    session.player_alive = true;
    Some(entity)
}

/// Система: countdown (каждый тик)
pub fn tick_countdown(
    clock: Res<SimClock>,
    config: Res<SessionConfig>,
    mut session: ResMut<SessionState>,
    mut display: ResMut<CountdownDisplay>,
    mut scene_events: EventWriter<SceneChangeRequest>,
) {
    if session.is_terminal() {
        return;
    }
    if session.countdown_remaining > 0.0 {
        session.countdown_remaining -= clock.delta;
        display.text = countdown_text(session.countdown_remaining);
    } else {
        session.outcome = Some(SessionOutcome::TimeExpired);
        request_scene_change(&mut scene_events, &config.countdown_end_scene);
        crate::logger::log_info("Countdown expired, session over");
    }
}

/// Система: обработка запросов destroy-зоны
///
/// Летальный самоурон вместо прямого удаления: дальше срабатывает обычный
/// путь смерти (подписчики, carryover, retire) в process_deaths этого же
/// тика. Respawn-окно открывается здесь, до обработки смерти.
pub fn handle_destroy_requests(
    clock: Res<SimClock>,
    config: Res<SessionConfig>,
    mut session: ResMut<SessionState>,
    mut requests: EventReader<PlayerDestroyRequested>,
    mut players: Query<&mut Health, (With<Player>, Without<Retired>)>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();

    let Some(handle) = session.player_handle else {
        return;
    };
    let Ok(mut health) = players.get_mut(handle) else {
        return;
    };
    if health.is_dead() {
        return;
    }

    session.respawning = true;
    session.respawn_at = clock.now() + config.respawn_delay;

    let lethal = health.current.max(0.0);
    health.take_damage(lethal);
    crate::logger::log("Player entered destroy zone, respawn scheduled");
}

/// Система: respawn после задержки
///
/// Таймер не отменяется промежуточными событиями — он охраняет
/// ровно-однократную реактивацию.
pub fn respawn_player(
    mut commands: Commands,
    clock: Res<SimClock>,
    config: Res<SessionConfig>,
    mut session: ResMut<SessionState>,
    active: Query<(Entity, &Health), (With<Player>, Without<Retired>)>,
    retired: Query<Entity, (With<Player>, With<Retired>)>,
) {
    if !session.respawning || clock.now() < session.respawn_at {
        return;
    }

    let active_player = active
        .iter()
        .next()
        .map(|(entity, health)| (entity, health.current));
    let retired_player = retired.iter().next();

    spawn_or_reactivate(
        &mut commands,
        &config,
        &mut session,
        active_player,
        retired_player,
    );
    session.respawning = false;
}

/// Система: game-over check (каждый тик)
///
/// Подавлен целиком на время respawn-окна: щель между удалением игрока и
/// активацией нового не должна давать ложный проигрыш.
pub fn check_game_over(
    config: Res<SessionConfig>,
    mut session: ResMut<SessionState>,
    mut scene_events: EventWriter<SceneChangeRequest>,
    players: Query<&Health, (With<Player>, Without<Retired>)>,
) {
    if session.is_terminal() || session.respawning {
        return;
    }

    let health_depleted = session
        .player_handle
        .and_then(|player| players.get(player).ok())
        .map(|health| health.current <= 0.0)
        .unwrap_or(false);

    if !session.player_alive || health_depleted {
        session.outcome = Some(SessionOutcome::PlayerDefeated);
        request_scene_change(&mut scene_events, &config.defeat_scene);
        crate::logger::log_info("Player defeated, session over");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_text_ceils() {
        assert_eq!(countdown_text(59.2), "Time Remaining: 60");
        assert_eq!(countdown_text(60.0), "Time Remaining: 60");
        assert_eq!(countdown_text(0.4), "Time Remaining: 1");
        assert_eq!(countdown_text(0.0), "Time Remaining: 0");
        assert_eq!(countdown_text(-0.3), "Time Remaining: 0");
    }

    #[test]
    fn test_resolve_spawn_pose_fallback() {
        let mut config = SessionConfig::default();
        assert!(config.resolve_spawn_pose().is_some());

        // точки нет, но архетип есть — дефолтная поза
        config.spawn_point = None;
        assert_eq!(config.resolve_spawn_pose(), Some(Transform::IDENTITY));

        // нет ни того, ни другого — спавн невозможен
        config.player = None;
        assert_eq!(config.resolve_spawn_pose(), None);
    }

    #[test]
    fn test_session_state_defaults() {
        let session = SessionState::default();
        assert!(!session.player_alive);
        assert!(!session.respawning);
        assert!(session.outcome.is_none());
        assert!(session.carryover.is_none());
    }

    #[test]
    fn test_add_score() {
        let mut session = SessionState::default();
        session.add_score();
        session.add_score();
        assert_eq!(session.score, 2);
    }
}
