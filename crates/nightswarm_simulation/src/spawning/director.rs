//! Волна врагов: троттлинг, телеграф спавна, camping-эвристика
//!
//! Игрок, стоящий на месте дольше порога, получает спавны прямо на себя —
//! отсиживание в безопасном углу не останавливает волну.

use bevy::prelude::*;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::clock::SimClock;
use crate::combat::DeathEffect;
use crate::components::{
    CollisionRadius, DeathAction, DeathSubscribers, Health, MovementSpeed, Navigator,
    NavigationState, Player, Retired,
};
use crate::ai::{AiState, EnemyAi};
use crate::session::SessionState;
use crate::DeterministicRng;

/// Событие: все враги волны мертвы
#[derive(Event, Debug, Clone, Copy)]
pub struct WaveCleared;

/// Планировщик волны
///
/// Инварианты:
/// - remaining_alive >= 0
/// - волна "зачищена" ровно когда remaining_alive дошёл до нуля после
///   хотя бы одного выданного спавна
#[derive(Resource, Debug, Clone)]
pub struct SpawnDirector {
    pub remaining_to_spawn: u32,
    pub remaining_alive: u32,
    pub next_spawn_time: f32,
    pub spawn_interval: f32,
    /// Телеграф: задержка между выдачей спавна и оживлением врага
    pub spawn_delay: f32,
    pub camping: bool,
    pub last_sample_position: Vec3,
    pub next_camp_check_time: f32,
    pub camp_check_interval: f32,
    pub camp_threshold: f32,
    /// Внешняя пауза: глушит и спавны, и camping-семплы, счётчики не трогает
    pub disabled: bool,
    spawned_any: bool,
}

impl Default for SpawnDirector {
    fn default() -> Self {
        Self::new(10)
    }
}

impl SpawnDirector {
    pub fn new(wave_size: u32) -> Self {
        Self {
            remaining_to_spawn: wave_size,
            remaining_alive: wave_size,
            next_spawn_time: 0.0,
            spawn_interval: 1.0,
            spawn_delay: 1.0,
            camping: false,
            last_sample_position: Vec3::ZERO,
            next_camp_check_time: 2.0,
            camp_check_interval: 2.0,
            camp_threshold: 1.5,
            disabled: false,
            spawned_any: false,
        }
    }

    /// Пора ли выдать следующий спавн (без побочных эффектов)
    pub fn spawn_due(&self, now: f32) -> bool {
        !self.disabled && self.remaining_to_spawn > 0 && now > self.next_spawn_time
    }

    /// Зафиксировать выдачу спавна
    pub fn commit_spawn(&mut self, now: f32) {
        self.remaining_to_spawn = self.remaining_to_spawn.saturating_sub(1);
        self.spawned_any = true;
        self.next_spawn_time = now + self.spawn_interval;
    }

    /// Пропустить цикл (нет тайла): повтор через интервал, счётчик не трогаем
    pub fn skip_cycle(&mut self, now: f32) {
        self.next_spawn_time = now + self.spawn_interval;
    }

    /// Семпл camping-эвристики; вне интервала — no-op
    pub fn sample_camping(&mut self, player_position: Option<Vec3>, now: f32) {
        if now <= self.next_camp_check_time {
            return;
        }
        self.next_camp_check_time = now + self.camp_check_interval;

        match player_position {
            Some(position) => {
                self.camping = position.distance(self.last_sample_position) < self.camp_threshold;
                self.last_sample_position = position;
            }
            // мёртвый игрок не "кемпит" — флаг не переживает respawn
            None => self.camping = false,
        }
    }

    /// Декремент живых; true ровно один раз — когда волна зачищена
    pub fn note_enemy_down(&mut self) -> bool {
        if self.remaining_alive == 0 {
            return false;
        }
        self.remaining_alive -= 1;
        self.spawned_any && self.remaining_alive == 0
    }
}

/// Контракт карты: открытые тайлы для спавна
///
/// Вставляется внешним слоем (генератором карты). Отсутствие ресурса или
/// пустой список — warning и пропуск цикла, не ошибка.
#[derive(Resource, Debug, Clone, Default)]
pub struct TileProvider {
    pub open_tiles: Vec<Vec3>,
}

impl TileProvider {
    pub fn random_open_tile(&self, rng: &mut ChaCha8Rng) -> Option<Vec3> {
        if self.open_tiles.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.open_tiles.len());
        Some(self.open_tiles[index])
    }

    pub fn tile_nearest(&self, point: Vec3) -> Option<Vec3> {
        self.open_tiles.iter().copied().min_by(|a, b| {
            a.distance_squared(point)
                .partial_cmp(&b.distance_squared(point))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Отложенный спавн: враг оживает после телеграфа
///
/// Не отменяется: таймер дойдёт до конца независимо от происходящего
/// (ровно-один-раз активация важнее реакции на паузу).
#[derive(Component, Debug, Clone, Copy)]
pub struct SpawnTelegraph {
    pub activate_at: f32,
    pub tile: Vec3,
}

/// Шаблон врага
#[derive(Resource, Debug, Clone)]
pub struct EnemyArchetype {
    pub max_health: f32,
    pub damage: f32,
    pub move_speed: f32,
    pub collision_radius: f32,
    pub death_effect_duration: f32,
}

impl Default for EnemyArchetype {
    fn default() -> Self {
        Self {
            max_health: 3.0,
            damage: 1.0,
            move_speed: 3.0,
            collision_radius: 0.5,
            death_effect_duration: 2.0,
        }
    }
}

/// Собирает компоненты врага; подписка волны регистрируется сразу
pub fn enemy_bundle(position: Vec3, archetype: &EnemyArchetype) -> impl Bundle {
    let mut subscribers = DeathSubscribers::default();
    subscribers.subscribe_replacing(None, DeathAction::WaveEnemyDown);

    (
        Transform::from_translation(position),
        Health::new(archetype.max_health),
        subscribers,
        CollisionRadius(archetype.collision_radius),
        MovementSpeed {
            speed: archetype.move_speed,
        },
        Navigator::default(),
        NavigationState::default(),
        AiState::default(),
        EnemyAi {
            damage: archetype.damage,
            ..Default::default()
        },
        DeathEffect {
            duration: archetype.death_effect_duration,
        },
    )
}

/// Startup: первый camp-семпл с позиции живого игрока
pub fn setup_wave(
    clock: Res<SimClock>,
    mut director: ResMut<SpawnDirector>,
    session: Res<SessionState>,
    players: Query<&Transform, (With<Player>, Without<Retired>)>,
) {
    director.next_camp_check_time = clock.now() + director.camp_check_interval;
    if let Some(position) = session
        .player_handle
        .and_then(|player| players.get(player).ok())
        .map(|transform| transform.translation)
    {
        director.last_sample_position = position;
    }
}

/// Система: camping-эвристика (каждые 2с)
pub fn check_camping(
    clock: Res<SimClock>,
    session: Res<SessionState>,
    mut director: ResMut<SpawnDirector>,
    players: Query<&Transform, (With<Player>, Without<Retired>)>,
) {
    if director.disabled {
        return;
    }
    let player_position = if session.player_alive {
        session
            .player_handle
            .and_then(|player| players.get(player).ok())
            .map(|transform| transform.translation)
    } else {
        None
    };
    director.sample_camping(player_position, clock.now());
}

/// Система: выдача спавнов по интервалу
///
/// Тайл по умолчанию случайный; пока игрок жив и кемпит — ближайший к
/// нему. Нет тайла — warning и пропуск цикла.
pub fn throttle_spawns(
    mut commands: Commands,
    clock: Res<SimClock>,
    session: Res<SessionState>,
    mut director: ResMut<SpawnDirector>,
    tiles: Option<Res<TileProvider>>,
    mut rng: ResMut<DeterministicRng>,
    players: Query<&Transform, (With<Player>, Without<Retired>)>,
) {
    let now = clock.now();
    if !director.spawn_due(now) {
        return;
    }

    let Some(tiles) = tiles else {
        crate::logger::log_warning("No TileProvider bound, spawn cycle skipped");
        director.skip_cycle(now);
        return;
    };

    let camp_position = if director.camping && session.player_alive {
        session
            .player_handle
            .and_then(|player| players.get(player).ok())
            .map(|transform| transform.translation)
    } else {
        None
    };

    let tile = match camp_position {
        Some(position) => tiles.tile_nearest(position),
        None => tiles.random_open_tile(&mut rng.rng),
    };
    let Some(tile) = tile else {
        crate::logger::log_warning("No open tile for spawn, cycle skipped");
        director.skip_cycle(now);
        return;
    };

    director.commit_spawn(now);
    commands.spawn(SpawnTelegraph {
        activate_at: now + director.spawn_delay,
        tile,
    });
}

/// Система: активация телеграфов
pub fn activate_pending_spawns(
    mut commands: Commands,
    clock: Res<SimClock>,
    archetype: Res<EnemyArchetype>,
    pending: Query<(Entity, &SpawnTelegraph)>,
) {
    let now = clock.now();
    for (entity, telegraph) in pending.iter() {
        if now < telegraph.activate_at {
            continue;
        }
        commands.entity(entity).despawn();
        commands.spawn(enemy_bundle(telegraph.tile + Vec3::Y, &archetype));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camping_flag_close_displacement() {
        let mut director = SpawnDirector::default();
        // семплы (0,0,0) → (0.5,0,0): смещение 0.5 < 1.5 → кемпит
        director.sample_camping(Some(Vec3::new(0.5, 0.0, 0.0)), 2.1);
        assert!(director.camping);
        assert_eq!(director.last_sample_position, Vec3::new(0.5, 0.0, 0.0));

        // следующий семпл (3.5,0,0): смещение 3.0 >= 1.5 → не кемпит
        director.sample_camping(Some(Vec3::new(3.5, 0.0, 0.0)), 4.2);
        assert!(!director.camping);
    }

    #[test]
    fn test_camping_interval_gate() {
        let mut director = SpawnDirector::default();
        // до next_camp_check_time семпл не берётся
        director.sample_camping(Some(Vec3::ZERO), 1.0);
        assert!(!director.camping);
        assert_eq!(director.last_sample_position, Vec3::ZERO);
    }

    #[test]
    fn test_camping_cleared_without_player() {
        let mut director = SpawnDirector::default();
        director.camping = true;
        // игрока нет — флаг сбрасывается, не переживает respawn
        director.sample_camping(None, 2.1);
        assert!(!director.camping);
    }

    #[test]
    fn test_spawn_throttle_ten_spawns_in_ten_and_half_seconds() {
        let mut director = SpawnDirector::default();
        let mut spawned = 0;
        let mut now: f32 = 0.0;

        while now < 10.5 {
            now += 0.1;
            if director.spawn_due(now) {
                director.commit_spawn(now);
                spawned += 1;
            }
        }

        assert_eq!(spawned, 10);
        assert_eq!(director.remaining_to_spawn, 0);
    }

    #[test]
    fn test_spawn_disabled_suppresses() {
        let mut director = SpawnDirector::default();
        director.disabled = true;
        assert!(!director.spawn_due(5.0));
        // счётчики не сброшены
        assert_eq!(director.remaining_to_spawn, 10);
    }

    #[test]
    fn test_wave_cleared_exactly_once() {
        let mut director = SpawnDirector::new(2);
        director.commit_spawn(0.1);
        director.commit_spawn(1.2);

        assert!(!director.note_enemy_down());
        assert!(director.note_enemy_down()); // волна зачищена
        assert!(!director.note_enemy_down()); // повтор не репортуется
        assert_eq!(director.remaining_alive, 0);
    }

    #[test]
    fn test_skip_cycle_keeps_counter() {
        let mut director = SpawnDirector::default();
        director.skip_cycle(0.5);
        assert_eq!(director.remaining_to_spawn, 10);
        assert!(!director.spawn_due(1.0));
        assert!(director.spawn_due(1.6));
    }

    #[test]
    fn test_tile_nearest() {
        let tiles = TileProvider {
            open_tiles: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(5.0, 0.0, 0.0),
            ],
        };
        assert_eq!(
            tiles.tile_nearest(Vec3::new(1.8, 0.0, 0.0)),
            Some(Vec3::new(2.0, 0.0, 0.0))
        );
        assert_eq!(TileProvider::default().tile_nearest(Vec3::ZERO), None);
    }
}
