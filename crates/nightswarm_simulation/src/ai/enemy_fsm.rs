//! FSM преследователя: Idle → Chasing → Attacking
//!
//! Три независимых таймера на врага:
//! - target refresh (0.25с) — переразрешение handle игрока
//! - path refresh (0.25с) — stand-off точка в Navigator, только в Chasing
//! - attack cooldown (1с) — проверяется каждый тик в Chasing
//!
//! Attack session — ограниченная анимированная последовательность: выпад
//! к цели и возврат по параболе, урон ровно один раз на progress >= 0.5.
//! Смерть цели приходит через death-подписку (process_deaths) и переводит
//! FSM в Idle из любого состояния.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::DamageDealt;
use crate::components::{
    CollisionRadius, DeathAction, DeathSubscribers, Health, MovementSpeed, Navigator,
    NavigationState, Player, Retired,
};
use crate::session::SessionState;

/// Интервал переразрешения цели (сек)
pub const TARGET_REFRESH_INTERVAL: f32 = 0.25;
/// Интервал обновления пути (сек)
pub const PATH_REFRESH_INTERVAL: f32 = 0.25;

/// FSM состояния врага
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub enum AiState {
    /// Цели нет, стоим
    Idle,
    /// Идём к цели через Navigator
    Chasing { target: Entity },
    /// Активная attack session (выпад)
    Attacking { target: Entity },
}

impl Default for AiState {
    fn default() -> Self {
        Self::Idle
    }
}

impl AiState {
    pub fn target(&self) -> Option<Entity> {
        match self {
            Self::Idle => None,
            Self::Chasing { target } | Self::Attacking { target } => Some(*target),
        }
    }
}

/// Параметры и таймеры врага
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct EnemyAi {
    /// Урон одного выпада
    pub damage: f32,
    /// Пауза между атаками (сек)
    pub attack_cooldown: f32,
    /// Скорость attack session (1/сек; 3.0 → сессия ~0.33с)
    pub attack_speed: f32,
    /// Дистанция срабатывания атаки (без учёта радиусов)
    pub attack_distance_threshold: f32,
    /// Абсолютные дедлайны (время SimClock); 0.0 — "уже пора"
    pub next_attack_time: f32,
    pub next_target_refresh: f32,
    pub next_path_refresh: f32,
    /// Радиус коллизии цели, кэшируется при захвате
    pub target_radius: f32,
}

impl Default for EnemyAi {
    fn default() -> Self {
        Self {
            damage: 1.0,
            attack_cooldown: 1.0,
            attack_speed: 3.0,
            attack_distance_threshold: 0.5,
            next_attack_time: 0.0,
            next_target_refresh: 0.0,
            next_path_refresh: 0.0,
            target_radius: 0.0,
        }
    }
}

/// Attack session: выпад к цели и возврат
///
/// Инвариант: компонент существует ⇔ AiState::Attacking.
#[derive(Component, Debug, Clone)]
pub struct AttackSession {
    pub progress: f32,
    pub damage_applied: bool,
    pub origin: Vec3,
    pub destination: Vec3,
}

impl AttackSession {
    pub fn new(origin: Vec3, destination: Vec3) -> Self {
        Self {
            progress: 0.0,
            damage_applied: false,
            origin,
            destination,
        }
    }

    /// Парабола 4(-p² + p): 0 на концах, пик 1.0 при p = 0.5.
    /// Даёт выпад-и-возврат, а не односторонний слайд.
    pub fn lunge_weight(progress: f32) -> f32 {
        4.0 * (-progress * progress + progress)
    }

    /// Продвинуть сессию; true — середина пересечена впервые (момент урона)
    pub fn advance(&mut self, dt: f32, speed: f32) -> bool {
        self.progress += dt * speed;
        if self.progress >= 0.5 && !self.damage_applied {
            self.damage_applied = true;
            return true;
        }
        false
    }

    pub fn finished(&self) -> bool {
        self.progress >= 1.0
    }

    /// Позиция выпада; progress за 1.0 прижимается к концу (возврат в origin)
    pub fn position(&self) -> Vec3 {
        let weight = Self::lunge_weight(self.progress.min(1.0));
        self.origin.lerp(self.destination, weight)
    }
}

/// Система: переразрешение цели (кэденс 0.25с)
///
/// Пока игрок жив — обновляем handle и death-подписку (замена, не
/// дублирование). Игрока нет или он мёртв — принудительно Idle, активный
/// выпад прерывается.
pub fn refresh_targets(
    mut commands: Commands,
    clock: Res<SimClock>,
    session: Res<SessionState>,
    mut enemies: Query<(Entity, &mut AiState, &mut EnemyAi, &mut Navigator)>,
    mut players: Query<
        (Entity, &Health, &CollisionRadius, &mut DeathSubscribers),
        (With<Player>, Without<Retired>),
    >,
) {
    let now = clock.now();
    let mut player = players.iter_mut().next();

    for (enemy, mut state, mut ai, mut navigator) in enemies.iter_mut() {
        if now <= ai.next_target_refresh {
            continue;
        }
        ai.next_target_refresh = now + TARGET_REFRESH_INTERVAL;

        let acquired = if session.player_alive {
            player.as_mut()
        } else {
            None
        };

        match acquired {
            Some((target, health, radius, subscribers)) if health.is_alive() => {
                subscribers.subscribe_replacing(Some(enemy), DeathAction::ClearTarget);
                ai.target_radius = radius.0;
                *state = match *state {
                    AiState::Idle => AiState::Chasing { target: *target },
                    // refresh обновляет только handle, фазу FSM не трогает
                    AiState::Chasing { .. } => AiState::Chasing { target: *target },
                    AiState::Attacking { .. } => AiState::Attacking { target: *target },
                };
            }
            _ => {
                if matches!(*state, AiState::Attacking { .. }) {
                    // выпад без цели не доигрывается
                    commands.entity(enemy).remove::<AttackSession>();
                    navigator.enable();
                }
                if !matches!(*state, AiState::Idle) {
                    crate::logger::log("Enemy set to Idle: no player alive");
                }
                *state = AiState::Idle;
            }
        }
    }
}

/// Система: обновление пути (кэденс 0.25с, только Chasing)
///
/// Stand-off точка на линии к цели: own_r + target_r + threshold/2.
/// Navigator не готов — цикл пропускается, повтор через интервал.
pub fn refresh_paths(
    clock: Res<SimClock>,
    mut enemies: Query<(&Transform, &AiState, &mut EnemyAi, &mut Navigator, &CollisionRadius)>,
    targets: Query<&Transform, (With<Player>, Without<Retired>, Without<EnemyAi>)>,
) {
    let now = clock.now();
    for (transform, state, mut ai, mut navigator, radius) in enemies.iter_mut() {
        if now <= ai.next_path_refresh {
            continue;
        }
        ai.next_path_refresh = now + PATH_REFRESH_INTERVAL;

        // путь никогда не обновляется во время attack session
        let AiState::Chasing { target } = *state else {
            continue;
        };
        let Ok(target_transform) = targets.get(target) else {
            continue;
        };

        let to_target = target_transform.translation - transform.translation;
        let direction = to_target.normalize_or_zero();
        let standoff = radius.0 + ai.target_radius + ai.attack_distance_threshold / 2.0;
        let destination = target_transform.translation - direction * standoff;

        if !navigator.set_destination(destination) {
            crate::logger::log_warning("Navigator is not ready, path refresh skipped");
        }
    }
}

/// Система: покадровый триггер атаки
///
/// В Chasing, квадрат дистанции <= (threshold + own_r + target_r)² и
/// cooldown истёк — стартуем attack session, Navigator выключается.
pub fn begin_attacks(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut enemies: Query<(
        Entity,
        &Transform,
        &mut AiState,
        &mut EnemyAi,
        &mut Navigator,
        &CollisionRadius,
    )>,
    targets: Query<(&Transform, &Health), (With<Player>, Without<Retired>, Without<EnemyAi>)>,
) {
    let now = clock.now();
    for (enemy, transform, mut state, mut ai, mut navigator, radius) in enemies.iter_mut() {
        let AiState::Chasing { target } = *state else {
            continue;
        };
        if now <= ai.next_attack_time {
            continue;
        }
        let Ok((target_transform, target_health)) = targets.get(target) else {
            continue;
        };
        if !target_health.is_alive() {
            continue;
        }

        let sqr_distance = (target_transform.translation - transform.translation).length_squared();
        let attack_radius = ai.attack_distance_threshold + radius.0 + ai.target_radius;
        if sqr_distance > attack_radius * attack_radius {
            continue;
        }

        ai.next_attack_time = now + ai.attack_cooldown;

        // конечная точка выпада — недолёт own_radius до цели
        let direction = (target_transform.translation - transform.translation).normalize_or_zero();
        let destination = target_transform.translation - direction * radius.0;

        commands
            .entity(enemy)
            .insert(AttackSession::new(transform.translation, destination));
        navigator.disable();
        *state = AiState::Attacking { target };
        // eprintln!("DEBUG: enemy {:?} lunges at {:?}", enemy, target);
    }
}

/// Система: продвижение attack session
///
/// Урон применяется до проверки завершения: progress может перескочить
/// 0.5 и 1.0 за один тик. Цель потеряна до середины — сессия прерывается,
/// урон не применяется никогда.
pub fn advance_attack_sessions(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut damage_events: EventWriter<DamageDealt>,
    mut enemies: Query<(
        Entity,
        &mut Transform,
        &mut AiState,
        &EnemyAi,
        &mut AttackSession,
        &mut Navigator,
    )>,
    mut targets: Query<&mut Health, (With<Player>, Without<Retired>, Without<EnemyAi>)>,
) {
    let dt = clock.delta;
    for (enemy, mut transform, mut state, ai, mut session, mut navigator) in enemies.iter_mut() {
        let AiState::Attacking { target } = *state else {
            // сессия без Attacking — нарушение инварианта, чиним на месте
            commands.entity(enemy).remove::<AttackSession>();
            navigator.enable();
            continue;
        };

        if targets.get_mut(target).is_err() {
            // цель невалидна: сессия прерывается без доигрывания
            commands.entity(enemy).remove::<AttackSession>();
            navigator.enable();
            *state = AiState::Chasing { target };
            continue;
        }

        let crossed_midpoint = session.advance(dt, ai.attack_speed);
        if crossed_midpoint {
            if let Ok(mut health) = targets.get_mut(target) {
                if !health.is_dead() {
                    let was_alive = health.is_alive();
                    health.take_damage(ai.damage);
                    damage_events.write(DamageDealt {
                        target,
                        source: Some(enemy),
                        amount: ai.damage,
                        target_died: was_alive && health.current <= 0.0,
                    });
                }
            }
        }

        transform.translation = session.position();

        if session.finished() {
            commands.entity(enemy).remove::<AttackSession>();
            navigator.enable();
            *state = AiState::Chasing { target };
        }
    }
}

/// Система: headless-замена внешнего навигационного слоя
///
/// Прямолинейное движение к destination со скоростью актора. В
/// bridge-сборке её место занимает настоящий NavigationAgent, который
/// читает destination и пишет NavigationState.
pub fn drive_navigation(
    clock: Res<SimClock>,
    mut query: Query<(&mut Transform, &Navigator, &MovementSpeed, &mut NavigationState)>,
) {
    const ARRIVE_EPSILON: f32 = 0.05;

    let dt = clock.delta;
    for (mut transform, navigator, speed, mut nav_state) in query.iter_mut() {
        if !navigator.enabled {
            continue;
        }
        let Some(destination) = navigator.destination else {
            continue;
        };

        let to_target = destination - transform.translation;
        let distance = to_target.length();
        if distance <= ARRIVE_EPSILON {
            nav_state.target_reached = true;
            continue;
        }
        nav_state.target_reached = false;

        let step = (speed.speed * dt).min(distance);
        transform.translation += to_target / distance * step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_state_default() {
        let state = AiState::default();
        assert!(matches!(state, AiState::Idle));
        assert_eq!(state.target(), None);
    }

    #[test]
    fn test_ai_state_target() {
        let target = Entity::from_raw(7);
        assert_eq!(AiState::Chasing { target }.target(), Some(target));
        assert_eq!(AiState::Attacking { target }.target(), Some(target));
    }

    #[test]
    fn test_lunge_weight_curve() {
        assert_eq!(AttackSession::lunge_weight(0.0), 0.0);
        assert_eq!(AttackSession::lunge_weight(0.5), 1.0);
        assert_eq!(AttackSession::lunge_weight(1.0), 0.0);
        // симметрия выпада и возврата
        assert_eq!(
            AttackSession::lunge_weight(0.25),
            AttackSession::lunge_weight(0.75)
        );
    }

    #[test]
    fn test_session_damage_exactly_once_at_midpoint() {
        let mut session = AttackSession::new(Vec3::ZERO, Vec3::X);

        // speed 1.0, dt 0.1 → progress 0.1, 0.2, ..., урон на пятом тике
        let mut damage_ticks = Vec::new();
        for tick in 1..=10 {
            if session.advance(0.1, 1.0) {
                damage_ticks.push(tick);
            }
        }
        assert_eq!(damage_ticks, vec![5]);
        assert!(session.finished());
    }

    #[test]
    fn test_session_damage_once_on_big_step() {
        let mut session = AttackSession::new(Vec3::ZERO, Vec3::X);

        // один тик перескакивает и 0.5, и 1.0 — урон всё равно ровно один раз
        assert!(session.advance(0.5, 3.0));
        assert!(session.finished());
        assert!(!session.advance(0.5, 3.0));
    }

    #[test]
    fn test_session_position_returns_to_origin() {
        let origin = Vec3::new(1.0, 0.0, 0.0);
        let destination = Vec3::new(3.0, 0.0, 0.0);
        let mut session = AttackSession::new(origin, destination);

        session.progress = 0.5;
        assert_eq!(session.position(), destination); // пик выпада

        session.progress = 1.0;
        assert_eq!(session.position(), origin);

        // overshoot прижимается, экстраполяции за origin нет
        session.progress = 1.4;
        assert_eq!(session.position(), origin);
    }

    #[test]
    fn test_enemy_ai_defaults() {
        let ai = EnemyAi::default();
        assert_eq!(ai.attack_cooldown, 1.0);
        assert_eq!(ai.attack_speed, 3.0);
        assert_eq!(ai.attack_distance_threshold, 0.5);
        assert_eq!(ai.next_attack_time, 0.0); // первый удар без ожидания
    }
}
