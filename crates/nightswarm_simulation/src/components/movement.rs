//! Movement компоненты: контракт внешнего навигационного слоя
//!
//! Архитектура:
//! - ECS системы пишут destination (high-level intent)
//! - Внешний навигационный слой (или headless-замена) двигает Transform
//! - NavigationState отдаёт обратно статус "дошёл"

use bevy::prelude::*;

/// Контракт навигационного агента актора
///
/// AI только просит "иди к точке" и читает готовность. Pathfinding сам по
/// себе — ответственность внешнего слоя; в headless-сборке его заменяет
/// прямолинейный интегратор (`drive_navigation`).
#[derive(Component, Debug, Clone)]
pub struct Navigator {
    /// Выключается на время attack session
    pub enabled: bool,
    /// false когда актор вне навигационной поверхности
    pub on_surface: bool,
    pub destination: Option<Vec3>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            enabled: true,
            on_surface: true,
            destination: None,
        }
    }
}

impl Navigator {
    pub fn is_ready(&self) -> bool {
        self.enabled && self.on_surface
    }

    /// false если агент не готов — вызывающий пропускает цикл без ошибки
    pub fn set_destination(&mut self, point: Vec3) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.destination = Some(point);
        true
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

/// Статус навигации, репортуемый внешним слоем обратно в симуляцию
#[derive(Component, Debug, Clone, Default)]
pub struct NavigationState {
    /// true когда агент достиг destination
    pub target_reached: bool,
}

/// Скорость движения актора (метры/сек)
#[derive(Component, Debug, Clone, Copy)]
pub struct MovementSpeed {
    pub speed: f32,
}

impl Default for MovementSpeed {
    fn default() -> Self {
        Self { speed: 2.0 }
    }
}
