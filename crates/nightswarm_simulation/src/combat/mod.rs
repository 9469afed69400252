//! Combat module
//!
//! ECS ответственность:
//! - Game state: Health, death-подписчики, счёт
//! - Combat rules: применение урона, летальность, эффект смерти
//! - Events: DamageDealt, EntityDied, ProjectileHit (вход от внешнего слоя)
//!
//! Внешний слой ответственность:
//! - Raycast sweep снаряда (сюда приходит только факт попадания)
//! - Рендер эффекта смерти (симуляция держит Transform + таймер жизни)

use bevy::prelude::*;

pub mod damage;
pub mod projectile;

pub use damage::{
    process_deaths, DamageDealt, DeathEffect, DeathEffectInstance, DespawnAfter, EntityDied,
};
pub use projectile::ProjectileHit;

use crate::SimSet;

/// Combat Plugin
///
/// Порядок выполнения (SimSet::Combat, после AI):
/// 1. apply_projectile_hits — урон от снарядов внешнего слоя
/// 2. process_deaths — переход dead false → true, подписчики, удаление
///
/// Очистка эффектов (despawn_after_timeout) идёт в SimSet::Cleanup:
/// время жизни эффекта не привязано к удалению его владельца.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProjectileHit>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>();

        app.add_systems(
            Update,
            (projectile::apply_projectile_hits, process_deaths)
                .chain()
                .in_set(SimSet::Combat),
        )
        .add_systems(Update, damage::despawn_after_timeout.in_set(SimSet::Cleanup));
    }
}
