//! Базовые компоненты акторов: Health, CollisionRadius, death-подписчики

use bevy::prelude::*;

/// Здоровье актора
///
/// Инварианты:
/// - max > 0
/// - dead монотонный: false → true, обратно никогда
/// - current может временно уйти <= 0 до обработки смерти (process_deaths)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    dead: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(3.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    /// Восстановленное здоровье (carryover при respawn, clamp в [0, max])
    pub fn restored(max: f32, current: f32) -> Self {
        Self {
            current: current.clamp(0.0, max),
            max,
            dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead && self.current > 0.0
    }

    /// Урон после смерти отбрасывается (double-death идемпотентен)
    pub fn take_damage(&mut self, amount: f32) {
        if self.dead {
            return;
        }
        self.current -= amount;
    }

    /// Летальность проверяется ДО вычитания — эффект смерти позиционируется
    /// в точке попадания, пока актор ещё существует
    pub fn lethal(&self, amount: f32) -> bool {
        !self.dead && amount >= self.current
    }

    /// false если уже мёртв — подписчики второй раз не вызываются
    pub fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        true
    }
}

/// Радиус коллизии актора (для геометрии дистанции атаки)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct CollisionRadius(pub f32);

impl Default for CollisionRadius {
    fn default() -> Self {
        Self(0.5)
    }
}

/// Действие при смерти наблюдаемого актора
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathAction {
    /// Подписчик-враг теряет цель (FSM → Idle)
    ClearTarget,
    /// Минус один живой враг волны
    WaveEnemyDown,
}

/// Запись подписки: кто подписан и что делает
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathSubscriber {
    /// None — глобальный подписчик (wave tracking)
    pub subscriber: Option<Entity>,
    pub action: DeathAction,
}

/// Упорядоченный список death-подписчиков
///
/// Вызываются ровно один раз, в порядке регистрации, на переходе
/// dead false → true — до того, как умерший покинет мир. Подписка,
/// чей владелец сам уничтожен, вычищается (и валидируется ещё раз
/// в момент вызова).
#[derive(Component, Debug, Clone, Default)]
pub struct DeathSubscribers {
    entries: Vec<DeathSubscriber>,
}

impl DeathSubscribers {
    /// Регистрация с заменой: старые записи того же подписчика с тем же
    /// действием удаляются (переполучение цели не дублирует подписку)
    pub fn subscribe_replacing(&mut self, subscriber: Option<Entity>, action: DeathAction) {
        self.entries
            .retain(|entry| entry.subscriber != subscriber || entry.action != action);
        self.entries.push(DeathSubscriber { subscriber, action });
    }

    /// Снять все подписки данного владельца (вызывается при его уничтожении)
    pub fn unsubscribe(&mut self, subscriber: Entity) {
        self.entries
            .retain(|entry| entry.subscriber != Some(subscriber));
    }

    pub fn entries(&self) -> &[DeathSubscriber] {
        &self.entries
    }

    /// Забрать список целиком — после смерти подписки не переживают актора
    pub fn drain(&mut self) -> Vec<DeathSubscriber> {
        std::mem::take(&mut self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
