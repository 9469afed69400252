//! ECS Components для игровых entity
//!
//! Организация по доменам:
//! - actor: здоровье, радиус коллизии, death-подписчики
//! - movement: контракт внешнего навигационного слоя (Navigator, NavigationState, MovementSpeed)
//! - player: player marker, retired marker, carryover snapshot

pub mod actor;
pub mod movement;
pub mod player;

// Re-exports для удобного импорта
pub use actor::*;
pub use movement::*;
pub use player::*;
