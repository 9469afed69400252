//! Session module: жизненный цикл игрока, countdown, game-over

use bevy::prelude::*;

pub mod lifecycle;

pub use lifecycle::{
    setup_session, CountdownDisplay, PlayerArchetype, PlayerDestroyRequested, SceneChangeRequest,
    SessionConfig, SessionOutcome, SessionState,
};

use crate::SimSet;

/// Session Plugin
///
/// Начало тика (SimSet::Session): countdown и внешние destroy-запросы.
/// Конец тика (SimSet::Cleanup): respawn после смертей текущего тика,
/// затем game-over check (подавлен на время respawn-окна).
pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerDestroyRequested>()
            .add_event::<SceneChangeRequest>()
            .init_resource::<SessionState>()
            .init_resource::<SessionConfig>()
            .init_resource::<CountdownDisplay>();

        app.add_systems(Startup, setup_session)
            .add_systems(
                Update,
                (lifecycle::tick_countdown, lifecycle::handle_destroy_requests)
                    .chain()
                    .in_set(SimSet::Session),
            )
            .add_systems(
                Update,
                (lifecycle::respawn_player, lifecycle::check_game_over)
                    .chain()
                    .in_set(SimSet::Cleanup),
            );
    }
}
