//! Player компоненты: control marker, retired marker, carryover snapshot

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component для player-controlled entity
///
/// Input живёт во внешнем слое; симуляция только читает позицию игрока
/// (цель для AI, camping-семплы) и владеет его Health.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Деактивированный экземпляр игрока, удержанный для реактивации
///
/// Вместо despawn: Entity id остаётся валидным, чужие handle не протухают.
/// Все боевые/таргет-запросы фильтруют `Without<Retired>`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Retired;

/// Снапшот игрока, переносимый через respawn
///
/// Снимается в момент смерти, применяется при следующем спавне
/// (health с clamp в [0, max]), затем очищается.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub health: f32,
    pub move_speed: f32,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl PlayerSnapshot {
    pub fn capture(health: f32, move_speed: f32, transform: &Transform) -> Self {
        Self {
            health,
            move_speed,
            position: transform.translation.to_array(),
            rotation: transform.rotation.to_array(),
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_array(self.rotation)
    }
}
