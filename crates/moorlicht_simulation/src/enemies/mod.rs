//! Enemy AI module — три врага на общем FSM-каркасе.
//!
//! Каждый враг = marker-компонент + config + StateMachine<его enum> +
//! Sensor + NavigationAgent. Одна driver-система на врага прогоняет
//! priority-каскад (первый сработавший чек побеждает) и весь side-effect
//! код: все условия выхода из состояния читаются в одном месте.
//!
//! Порядок внутри SimSet::Decision фиксирован (chain) для детерминизма.

use bevy::prelude::*;

use crate::logger;
use crate::SimSet;

pub mod hemanneken;
pub mod hunter;
pub mod nixie;

pub use hemanneken::{Hemanneken, HemannekenConfig, HemannekenForm, HemannekenState};
pub use hunter::{Hunter, HunterConfig, HunterState};
pub use nixie::{Nixie, NixieConfig, NixieState};

/// Отложенное удаление entity (смерть с таймированным эффектом)
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnAfter {
    pub timer: f32,
}

impl DespawnAfter {
    pub fn new(seconds: f32) -> Self {
        Self { timer: seconds }
    }
}

/// Система: удаление entity по истечении DespawnAfter
pub fn despawn_after_timeout(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut pending: Query<(Entity, &mut DespawnAfter)>,
) {
    let delta = time.delta_secs();
    for (entity, mut despawn) in pending.iter_mut() {
        despawn.timer -= delta;
        if despawn.timer <= 0.0 {
            logger::log(&format!("Despawn: {:?} удалён после таймаута", entity));
            commands.entity(entity).despawn();
        }
    }
}

pub struct EnemyAiPlugin;

impl Plugin for EnemyAiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                hunter::hunter_fsm,
                hemanneken::hemanneken_fsm,
                nixie::nixie_fsm,
            )
                .chain()
                .in_set(SimSet::Decision),
        )
        .add_systems(FixedUpdate, despawn_after_timeout.in_set(SimSet::Cleanup));
    }
}
