//! Вход от внешнего projectile-слоя
//!
//! Raycast sweep снаряда против геометрии живёт снаружи; симуляция получает
//! только факт попадания и применяет урон. Снаряд уничтожается внешним
//! слоем независимо от того, было ли у цели здоровье.

use bevy::prelude::*;

use crate::clock::SimClock;
use crate::combat::damage::{DamageDealt, DeathEffect, DeathEffectInstance, DespawnAfter};
use crate::components::Health;

/// Событие: снаряд попал в актора
#[derive(Event, Debug, Clone)]
pub struct ProjectileHit {
    pub target: Entity,
    pub damage: f32,
    pub hit_point: Vec3,
    pub hit_direction: Vec3,
}

/// Система: применение попаданий
///
/// Летальность проверяется ДО вычитания здоровья: эффект смерти нужно
/// позиционировать в точке попадания, пока цель ещё существует. Сам урон
/// после смерти отбрасывается (идемпотентность double-death).
pub fn apply_projectile_hits(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut hits: EventReader<ProjectileHit>,
    mut damage_events: EventWriter<DamageDealt>,
    mut targets: Query<(&mut Health, Option<&DeathEffect>)>,
) {
    for hit in hits.read() {
        let Ok((mut health, death_effect)) = targets.get_mut(hit.target) else {
            // Цель уже покинула симуляцию — попадание в пустоту
            continue;
        };
        if health.is_dead() {
            continue;
        }

        if let Some(effect) = death_effect {
            if health.lethal(hit.damage) {
                let direction = hit.hit_direction.normalize_or_zero();
                let rotation = if direction == Vec3::ZERO {
                    Quat::IDENTITY
                } else {
                    Quat::from_rotation_arc(Vec3::Z, direction)
                };
                commands.spawn((
                    Transform::from_translation(hit.hit_point).with_rotation(rotation),
                    DeathEffectInstance,
                    DespawnAfter {
                        despawn_time: clock.now() + effect.duration,
                    },
                ));
            }
        }

        let was_alive = health.is_alive();
        health.take_damage(hit.damage);
        damage_events.write(DamageDealt {
            target: hit.target,
            source: None,
            amount: hit.damage,
            target_died: was_alive && health.current <= 0.0,
        });
    }
}
