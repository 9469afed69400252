//! AI module: FSM преследователя
//!
//! Idle → Chasing → Attacking, урон в середине выпада.

use bevy::prelude::*;

pub mod enemy_fsm;

pub use enemy_fsm::{AiState, AttackSession, EnemyAi};

use crate::SimSet;

/// AI Plugin
///
/// Порядок выполнения (SimSet::Ai, цепочкой):
/// 1. refresh_targets — переразрешение цели (кэденс 0.25с)
/// 2. refresh_paths — stand-off точка в Navigator (кэденс 0.25с, только Chasing)
/// 3. begin_attacks — покадровый триггер атаки (радиус + cooldown)
/// 4. advance_attack_sessions — продвижение выпада, урон ровно один раз
///
/// drive_navigation (SimSet::Navigation) — headless-замена внешнего
/// навигационного слоя, прямолинейное движение к destination.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                enemy_fsm::refresh_targets,
                enemy_fsm::refresh_paths,
                enemy_fsm::begin_attacks,
                enemy_fsm::advance_attack_sessions,
            )
                .chain()
                .in_set(SimSet::Ai),
        )
        .add_systems(
            Update,
            enemy_fsm::drive_navigation.in_set(SimSet::Navigation),
        );
    }
}
