//! Generic FSM контейнер для enemy AI.
//!
//! Transition логика намеренно живёт НЕ здесь, а в driver-системе каждого
//! врага: один match-каскад на тик, первый сработавший чек побеждает.
//! StateMachine только ведёт bookkeeping переходов:
//! - current state (owned), previous state (диагностика)
//! - elapsed время в текущем состоянии
//! - entered latch: enter-эффекты состояния выполняются в начале его
//!   первого Handle-тика (begin_tick возвращает true ровно один раз)
//!
//! Таймеры состояний — поля вариантов enum'а: при переходе вариант
//! уничтожается вместе со своими таймерами, отменять нечего.

use bevy::prelude::*;

use crate::logger;

/// Trait для state-enum'ов врагов (Hunter/Hemanneken/Nixie)
pub trait AiState: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Имя состояния для логов
    fn label(&self) -> &'static str;
}

/// Generic state machine — один компонент на врага, параметризованный его
/// конкретным state-enum'ом (без downcast'ов generic машины к подтипу).
#[derive(Component, Debug, Clone)]
pub struct StateMachine<S: AiState> {
    current: S,
    previous: Option<S>,
    elapsed: f32,
    entered: bool,
    transitions: u32,
}

impl<S: AiState + Default> Default for StateMachine<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: AiState> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: None,
            elapsed: 0.0,
            entered: true,
            transitions: 0,
        }
    }

    pub fn current(&self) -> &S {
        &self.current
    }

    /// Mutable доступ для in-place обновления таймеров варианта
    pub fn current_mut(&mut self) -> &mut S {
        &mut self.current
    }

    pub fn previous(&self) -> Option<&S> {
        self.previous.as_ref()
    }

    /// Секунды в текущем состоянии (сбрасывается переходом)
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Счётчик совершённых переходов (диагностика + тесты no-op инварианта)
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    /// Начало Handle-тика: сдвигает elapsed, снимает entered latch.
    /// Возвращает true на первом тике после активации состояния —
    /// driver выполняет enter-эффекты ровно один раз.
    pub fn begin_tick(&mut self, dt: f32) -> bool {
        let entered = self.entered;
        self.entered = false;
        self.elapsed += dt;
        entered
    }

    /// Переход в target. No-op (false) если target == None или равен
    /// текущему состоянию: ни exit-, ни enter-эффектов, счётчик не растёт.
    /// Протокол: previous ← current, current ← next, elapsed = 0,
    /// entered latch взводится. Однопоточно, прервать переход нельзя.
    pub fn transit_to(&mut self, target: Option<S>) -> bool {
        let Some(next) = target else {
            return false;
        };
        if next == self.current {
            return false;
        }
        logger::log(&format!("FSM: {} → {}", self.current.label(), next.label()));
        self.previous = Some(std::mem::replace(&mut self.current, next));
        self.elapsed = 0.0;
        self.entered = true;
        self.transitions += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    enum TestState {
        #[default]
        Idle,
        Busy {
            timer: f32,
        },
    }

    impl AiState for TestState {
        fn label(&self) -> &'static str {
            match self {
                TestState::Idle => "Idle",
                TestState::Busy { .. } => "Busy",
            }
        }
    }

    #[test]
    fn test_initial_state_entered_once() {
        let mut sm = StateMachine::new(TestState::Idle);
        assert!(matches!(sm.current(), TestState::Idle));
        assert!(sm.previous().is_none());

        assert!(sm.begin_tick(0.1)); // первый тик — entered
        assert!(!sm.begin_tick(0.1)); // дальше нет
        assert_eq!(sm.transitions(), 0);
    }

    #[test]
    fn test_transit_none_is_noop() {
        let mut sm = StateMachine::new(TestState::Idle);
        sm.begin_tick(0.1);

        assert!(!sm.transit_to(None));
        assert_eq!(sm.transitions(), 0);
        assert!(sm.previous().is_none());
        assert!(!sm.begin_tick(0.1)); // entered latch не взводился
    }

    #[test]
    fn test_transit_to_equal_state_is_noop() {
        let mut sm = StateMachine::new(TestState::Busy { timer: 2.0 });
        sm.begin_tick(0.1);

        assert!(!sm.transit_to(Some(TestState::Busy { timer: 2.0 })));
        assert_eq!(sm.transitions(), 0);
        assert!(sm.previous().is_none());
        assert!(!sm.begin_tick(0.1));
    }

    #[test]
    fn test_transition_protocol() {
        let mut sm = StateMachine::new(TestState::Idle);
        sm.begin_tick(0.5);
        assert_eq!(sm.elapsed(), 0.5);

        assert!(sm.transit_to(Some(TestState::Busy { timer: 1.0 })));
        assert!(matches!(sm.current(), TestState::Busy { .. }));
        assert_eq!(sm.previous(), Some(&TestState::Idle));
        assert_eq!(sm.transitions(), 1);
        assert_eq!(sm.elapsed(), 0.0);

        assert!(sm.begin_tick(0.1)); // enter-эффекты нового состояния
        assert!(!sm.begin_tick(0.1));
    }

    #[test]
    fn test_in_place_timer_update_without_transition() {
        let mut sm = StateMachine::new(TestState::Busy { timer: 1.0 });
        sm.begin_tick(0.5);

        // Сброс таймера внутри варианта — не переход
        if let TestState::Busy { timer } = sm.current_mut() {
            *timer = 1.0;
        }
        assert_eq!(sm.transitions(), 0);
        assert_eq!(sm.elapsed(), 0.5);
    }
}
