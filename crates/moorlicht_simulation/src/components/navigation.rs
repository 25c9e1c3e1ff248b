//! Командная поверхность движения.
//!
//! Состояния пишут high-level intent (destination, скорость, stop),
//! исполнитель — headless интегратор (см. navigation модуль) либо
//! NavMesh-агент движка в shipped-сборке. Состояния никогда не
//! предполагают успех команды — они опрашивают has_arrived().

use bevy::prelude::*;

use crate::logger;

/// Navigation агент врага.
///
/// Инвариант: set_destination перезаписывает текущую цель немедленно,
/// очереди waypoint'ов нет.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct NavigationAgent {
    destination: Option<Vec3>,
    /// Текущая скорость (метры/сек) — состояния меняют её на enter
    /// (roam/investigate/chase скорости различаются)
    pub speed: f32,
    /// Допуск прибытия (метры)
    pub stopping_distance: f32,
    /// false: агент вне walkable surface — команды тихо no-op'ятся
    /// с warning'ом, симуляция не падает
    pub on_navmesh: bool,
}

impl Default for NavigationAgent {
    fn default() -> Self {
        Self {
            destination: None,
            speed: 2.0, // базовая скорость ходьбы
            stopping_distance: 0.5,
            on_navmesh: true,
        }
    }
}

impl NavigationAgent {
    /// Запрос движения к точке. Всегда «успешен» как запрос; вне navmesh —
    /// no-op c warning'ом (деградация вместо ошибки).
    pub fn set_destination(&mut self, target: Vec3) {
        if !self.on_navmesh {
            logger::log_warning(&format!(
                "NavigationAgent: агент вне walkable surface, SetDestination({:.1}, {:.1}, {:.1}) проигнорирован",
                target.x, target.y, target.z
            ));
            return;
        }
        self.destination = Some(target);
    }

    /// Немедленная остановка; идемпотентна.
    pub fn stop(&mut self) {
        self.destination = None;
    }

    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// true: осталось ≤ stopping_distance (по XZ) или цели нет.
    pub fn has_arrived(&self, position: Vec3) -> bool {
        match self.destination {
            None => true,
            Some(dest) => {
                let dx = dest.x - position.x;
                let dz = dest.z - position.z;
                (dx * dx + dz * dz).sqrt() <= self.stopping_distance
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_destination_overwrites() {
        let mut agent = NavigationAgent::default();
        agent.set_destination(Vec3::new(1.0, 0.0, 0.0));
        agent.set_destination(Vec3::new(9.0, 0.0, 9.0));
        // Без очереди: жива только последняя цель
        assert_eq!(agent.destination(), Some(Vec3::new(9.0, 0.0, 9.0)));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut agent = NavigationAgent::default();
        agent.set_destination(Vec3::ONE);
        agent.stop();
        assert_eq!(agent.destination(), None);
        agent.stop();
        assert_eq!(agent.destination(), None);
    }

    #[test]
    fn test_off_navmesh_commands_noop() {
        let mut agent = NavigationAgent {
            on_navmesh: false,
            ..Default::default()
        };
        agent.set_destination(Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(agent.destination(), None);
        // Без цели считаемся «прибывшими» — каскады продолжают перепроверять
        assert!(agent.has_arrived(Vec3::ZERO));
    }

    #[test]
    fn test_has_arrived_tolerance() {
        let mut agent = NavigationAgent::default();
        agent.set_destination(Vec3::new(10.0, 0.0, 0.0));

        assert!(!agent.has_arrived(Vec3::ZERO));
        assert!(agent.has_arrived(Vec3::new(9.6, 0.0, 0.0)));
        // Y не учитывается: высоту держит грунт/движок
        assert!(agent.has_arrived(Vec3::new(10.0, 3.0, 0.0)));
    }
}
