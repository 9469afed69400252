//! Обработка смертей и эффекты
//!
//! process_deaths — единственное место, где dead переключается в true.
//! Порядок жёсткий: mark_dead → подписчики (в порядке регистрации) →
//! EntityDied → удаление из мира. Пока подписчики не отработали,
//! умерший остаётся в мире целиком.

use bevy::prelude::*;

use crate::ai::{AiState, AttackSession};
use crate::clock::SimClock;
use crate::components::{
    DeathAction, DeathSubscribers, Health, MovementSpeed, Navigator, Player, PlayerSnapshot,
    Retired,
};
use crate::session::SessionState;
use crate::spawning::{SpawnDirector, WaveCleared};

/// Событие: урон нанесён
///
/// Для внешнего слоя (UI, звуки, эффекты попадания).
#[derive(Event, Debug, Clone)]
pub struct DamageDealt {
    pub target: Entity,
    pub source: Option<Entity>,
    pub amount: f32,
    pub target_died: bool,
}

/// Событие: актор умер (подписчики уже отработали)
#[derive(Event, Debug, Clone)]
pub struct EntityDied {
    pub entity: Entity,
    pub was_player: bool,
}

/// Конфиг косметического эффекта смерти врага
///
/// Эффект спавнится в точке попадания, ориентированный вдоль направления
/// удара, и живёт своим таймером — независимо от удаления владельца.
#[derive(Component, Debug, Clone, Copy)]
pub struct DeathEffect {
    pub duration: f32,
}

/// Заспавненный эффект смерти (внешний слой рендерит по Transform)
#[derive(Component, Debug, Clone, Copy)]
pub struct DeathEffectInstance;

/// Компонент: деспавн в заданный момент времени симуляции
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnAfter {
    /// Время деспавна (секунды SimClock)
    pub despawn_time: f32,
}

/// Система: обработка переходов dead false → true
///
/// Exclusive system — подписчики мутируют чужие FSM и ресурсы, и всё
/// должно завершиться до удаления умершего из мира.
pub fn process_deaths(world: &mut World) {
    // Собираем умерших (current <= 0, dead ещё false)
    let mut dying: Vec<(Entity, bool)> = Vec::new();
    let mut query = world.query::<(Entity, &Health, Option<&Player>)>();
    for (entity, health, player) in query.iter(world) {
        if health.current <= 0.0 && !health.is_dead() {
            dying.push((entity, player.is_some()));
        }
    }
    // Порядок обработки детерминирован
    dying.sort_by_key(|(entity, _)| entity.index());

    for (entity, was_player) in dying {
        let Some(mut health) = world.get_mut::<Health>(entity) else {
            continue;
        };
        if !health.mark_dead() {
            continue; // кто-то уже обработал — ровно один раз
        }
        let final_health = health.current;

        // Подписки не переживают актора: забираем список целиком
        let subscribers = world
            .get_mut::<DeathSubscribers>(entity)
            .map(|mut subs| subs.drain())
            .unwrap_or_default();

        for entry in subscribers {
            match entry.action {
                DeathAction::ClearTarget => {
                    let Some(watcher) = entry.subscriber else {
                        continue;
                    };
                    // Валидация в момент вызова: подписчик мог сам умереть
                    if let Some(mut state) = world.get_mut::<AiState>(watcher) {
                        *state = AiState::Idle;
                    } else {
                        continue;
                    }
                    if let Some(mut navigator) = world.get_mut::<Navigator>(watcher) {
                        navigator.enable();
                    }
                    world.entity_mut(watcher).remove::<AttackSession>();
                    crate::logger::log("Enemy set to Idle: target died");
                }
                DeathAction::WaveEnemyDown => {
                    let cleared = world
                        .resource_mut::<SpawnDirector>()
                        .note_enemy_down();
                    if cleared {
                        world.send_event(WaveCleared);
                        crate::logger::log_info("All enemies defeated!");
                    }
                }
            }
        }

        world.send_event(EntityDied {
            entity,
            was_player,
        });

        if was_player {
            // Carryover снимается в момент смерти, применится при следующем спавне
            let transform = world.get::<Transform>(entity).copied().unwrap_or_default();
            let move_speed = world
                .get::<MovementSpeed>(entity)
                .map(|speed| speed.speed)
                .unwrap_or_default();
            let snapshot = PlayerSnapshot::capture(final_health, move_speed, &transform);

            let mut session = world.resource_mut::<SessionState>();
            session.carryover = Some(snapshot);
            // handle и флаг очищаются вместе — читатели не видят "порванного" состояния
            session.player_alive = false;
            session.player_handle = None;

            world.entity_mut(entity).insert(Retired);
            crate::logger::log_info("Player died");
        } else {
            // Враг снимает свою подписку с цели до того, как исчезнет
            let target = world
                .get::<AiState>(entity)
                .and_then(|state| state.target());
            if let Some(target) = target {
                if let Some(mut subs) = world.get_mut::<DeathSubscribers>(target) {
                    subs.unsubscribe(entity);
                }
            }
            world.resource_mut::<SessionState>().add_score();
            world.despawn(entity);
        }
    }
}

/// Система: деспавн отживших эффектов
pub fn despawn_after_timeout(
    mut commands: Commands,
    clock: Res<SimClock>,
    query: Query<(Entity, &DespawnAfter)>,
) {
    let now = clock.now();
    for (entity, despawn) in query.iter() {
        if now >= despawn.despawn_time {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_dealt_event() {
        let event = DamageDealt {
            target: Entity::PLACEHOLDER,
            source: None,
            amount: 1.0,
            target_died: false,
        };

        assert_eq!(event.amount, 1.0);
        assert!(!event.target_died);
    }

    #[test]
    fn test_despawn_after_deadline() {
        let despawn = DespawnAfter { despawn_time: 2.0 };
        assert!(1.9 < despawn.despawn_time);
        assert!(2.0 >= despawn.despawn_time);
    }
}
