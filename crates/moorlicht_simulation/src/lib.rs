//! MOORLICHT Simulation Core
//!
//! ECS-симуляция enemy AI на Bevy 0.16 (strategic layer).
//!
//! HYBRID ARCHITECTURE:
//! - ECS = strategic layer (FSM врагов, перцепция, navigation-команды)
//! - Движок (Unity bridge) = tactical layer (physics, rendering, NavMesh,
//!   FMOD) — общается с симуляцией через events + command surface
//!
//! Вся AI-логика крутится в FixedUpdate 60Hz, однопоточно и кооперативно:
//! каждый враг эксклюзивно владеет своим StateMachine/Sensor/NavigationAgent,
//! общие только шины событий. Задержки — явные countdown-поля состояний,
//! никаких подвешенных корутин.

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod components;
pub mod enemies;
pub mod events;
pub mod fsm;
pub mod level;
pub mod logger;
pub mod navigation;
pub mod perception;

// Re-export базовых типов для удобства
pub use components::*;
pub use enemies::{
    DespawnAfter, EnemyAiPlugin, Hemanneken, HemannekenConfig, HemannekenForm, HemannekenState,
    Hunter, HunterConfig, HunterState, Nixie, NixieConfig, NixieState,
};
pub use events::*;
pub use fsm::{AiState, StateMachine};
pub use level::{OcclusionWorld, Occluder, PatrolGraph, WaterBodies, WaterVolume};
pub use logger::{init_logger, log, log_error, log_info, log_warning};
pub use navigation::NavigationPlugin;
pub use perception::PerceptionPlugin;

/// Порядок подсистем внутри fixed-тика.
/// Perception → Decision → Movement → Cleanup, строго последовательно:
/// каскады решают по свежим sensor-данным, интегратор двигает по свежим
/// командам, детерминизм не зависит от планировщика.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimSet {
    Perception,
    Decision,
    Movement,
    Cleanup,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Fixed timestep 60Hz для simulation tick
        app.insert_resource(Time::<Fixed>::from_hz(60.0));

        // Детерминистичный RNG — не перетираем seed, если он уже задан
        // (create_headless_app вставляет свой)
        if app.world().get_resource::<DeterministicRng>().is_none() {
            app.insert_resource(DeterministicRng::new(42));
        }

        // Уровневые сервисы: пустые по умолчанию, сцена/тесты наполняют
        app.init_resource::<level::PatrolGraph>()
            .init_resource::<level::OcclusionWorld>()
            .init_resource::<level::WaterBodies>();

        app.configure_sets(
            FixedUpdate,
            (
                SimSet::Perception,
                SimSet::Decision,
                SimSet::Movement,
                SimSet::Cleanup,
            )
                .chain(),
        );

        app.add_plugins((
            events::EventBusPlugin,
            perception::PerceptionPlugin,
            enemies::EnemyAiPlugin,
            navigation::NavigationPlugin,
        ));

        // Конфигурационные ошибки сцены — warnings, не panics
        app.add_systems(Startup, level::validate_scene);
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

/// Создаёт minimal Bevy App для headless симуляции.
///
/// TimeUpdateStrategy::ManualDuration(1/60с) — каждый app.update()
/// продвигает время ровно на один fixed-тик, независимо от wall-clock:
/// тесты и реплеи тикают детерминированно.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / 60.0,
        )));

    // Первый проход Time-системы фиксирует last_update (иначе дельта первого
    // app.update() равна нулю и FixedUpdate не тикает). Прогоняем только First,
    // не финализируя плагины: вызывающий ещё добавляет SimulationPlugin.
    app.world_mut().run_schedule(First);

    app
}

/// Snapshot компонентов мира для сравнения детерминизма
/// (упрощённый формат: Debug-байты, отсортированные по Entity)
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для стабильного порядка
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
