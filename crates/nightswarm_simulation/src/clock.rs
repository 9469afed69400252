//! Явные часы симуляции
//!
//! Один логический тик на кадр: bridge-слой вызывает `step_simulation` с
//! delta-time, все таймеры и кэденсы читают `SimClock` (никогда wall-clock).
//! Периодические задачи — это поля `next_*_time`, опрашиваемые раз в тик.

use bevy::prelude::*;

/// Часы симуляции (продвигаются только через `step_simulation`)
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimClock {
    /// Накопленное время симуляции (секунды)
    pub elapsed: f32,
    /// Delta последнего тика (секунды)
    pub delta: f32,
    /// Номер тика (wraparound safe)
    pub tick: u64,
}

impl SimClock {
    pub fn advance(&mut self, dt: f32) {
        self.delta = dt;
        self.elapsed += dt;
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn now(&self) -> f32 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance() {
        let mut clock = SimClock::default();
        assert_eq!(clock.now(), 0.0);

        clock.advance(0.1);
        clock.advance(0.1);
        assert_eq!(clock.tick, 2);
        assert!((clock.now() - 0.2).abs() < 1e-6);
        assert_eq!(clock.delta, 0.1);
    }
}
