//! Spawning module: волна врагов с троттлингом и camping-эвристикой

use bevy::prelude::*;

pub mod director;

pub use director::{
    enemy_bundle, EnemyArchetype, SpawnDirector, SpawnTelegraph, TileProvider, WaveCleared,
};

use crate::SimSet;

/// Spawn Plugin
///
/// Порядок выполнения (SimSet::Spawning, цепочкой):
/// 1. check_camping — семпл позиции игрока каждые 2с
/// 2. throttle_spawns — выдача спавнов по интервалу, выбор тайла
/// 3. activate_pending_spawns — телеграф истёк → живой враг
pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<WaveCleared>()
            .init_resource::<SpawnDirector>()
            .init_resource::<EnemyArchetype>();

        app.add_systems(
            Startup,
            director::setup_wave.after(crate::session::setup_session),
        )
        .add_systems(
            Update,
            (
                director::check_camping,
                director::throttle_spawns,
                director::activate_pending_spawns,
            )
                .chain()
                .in_set(SimSet::Spawning),
        );
    }
}
