//! NIGHTSWARM Simulation Core
//!
//! ECS-симуляция волнового шутера (strategic layer):
//! - ECS = game state, health/death, AI FSM, spawn scheduling, session lifecycle
//! - Внешний bridge = рендер, физика, pathfinding, input, снаряды
//!
//! Кооперативная однопоточная модель: один логический тик на кадр
//! (`step_simulation`), все периодические задачи — дедлайны, опрашиваемые
//! раз в тик. Никакого wall-clock внутри симуляции.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod clock;
pub mod combat;
pub mod components;
pub mod logger;
pub mod session;
pub mod spawning;

// Re-export базовых типов для удобства
pub use ai::{AIPlugin, AiState, AttackSession, EnemyAi};
pub use clock::SimClock;
pub use combat::{
    CombatPlugin, DamageDealt, DeathEffect, DeathEffectInstance, DespawnAfter, EntityDied,
    ProjectileHit,
};
pub use components::*;
pub use session::{
    CountdownDisplay, PlayerArchetype, PlayerDestroyRequested, SceneChangeRequest, SessionConfig,
    SessionOutcome, SessionPlugin, SessionState,
};
pub use spawning::{
    enemy_bundle, EnemyArchetype, SpawnDirector, SpawnPlugin, SpawnTelegraph, TileProvider,
    WaveCleared,
};

/// Фазы тика симуляции (выполняются строго по порядку)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Countdown, внешние destroy-запросы
    Session,
    /// Camping-семплы, выдача и активация спавнов
    Spawning,
    /// FSM врагов, attack sessions
    Ai,
    /// Движение по Navigator destination
    Navigation,
    /// Попадания снарядов, обработка смертей
    Combat,
    /// Respawn, game-over check, очистка эффектов
    Cleanup,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimClock>()
            // Детерминистичный RNG (seed по умолчанию)
            .insert_resource(DeterministicRng::new(42))
            .configure_sets(
                Update,
                (
                    SimSet::Session,
                    SimSet::Spawning,
                    SimSet::Ai,
                    SimSet::Navigation,
                    SimSet::Combat,
                    SimSet::Cleanup,
                )
                    .chain(),
            )
            .add_plugins((SessionPlugin, SpawnPlugin, CombatPlugin, AIPlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(DeterministicRng::new(seed));

    app
}

/// Один логический тик симуляции с явным delta-time
///
/// Bridge-слой вызывает это из своего frame callback; тесты — с
/// фиксированным dt для точной арифметики таймеров.
pub fn step_simulation(app: &mut App, dt: f32) {
    app.world_mut().resource_mut::<SimClock>().advance(dt);
    app.update();
}

/// Snapshot мира для сравнения детерминизма
///
/// Собирает компоненты T в детерминированный байтовый формат
/// (сортировка по Entity ID, сериализация через Debug).
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
