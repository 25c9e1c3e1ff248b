//! Hemanneken AI — болотный прилипала, маскирующийся под кролика.
//!
//! Конечный автомат: Roaming → Investigating → Chasing → Stunning → Roaming;
//! Roaming/Chasing → Attached → Death. Death терминально — entity удаляется
//! после таймированного эффекта.
//!
//! Формы: Rabbit (безобидный облик, игнорирует игрока) ↔ True.
//! Раскрывается при приближении игрока; откатывается в кролика после стана.
//! Прицепившись — повторяет позицию игрока; касание воды его убивает.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{NavigationAgent, Player, Sensor};
use crate::enemies::DespawnAfter;
use crate::events::{
    HemannekenAttached, HemannekenDetached, LanternRaised, PlayerTouchedWater, SoundCue,
    SoundRequest,
};
use crate::fsm::{AiState, StateMachine};
use crate::level::PatrolGraph;
use crate::logger;
use crate::DeterministicRng;

/// Маркер хеманнекена
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Hemanneken;

/// Текущий облик
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
#[reflect(Component)]
pub enum HemannekenForm {
    #[default]
    Rabbit,
    True,
}

/// Serde: конфиги тюнятся из data-файлов движкового слоя
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct HemannekenConfig {
    /// Игрок ближе — кролик раскрывает истинную форму
    pub reveal_distance: f32,
    /// Дистанция прицепления к игроку
    pub attach_distance: f32,
    /// Поднятый фонарь ближе этого — стан (только истинная форма, только погоня)
    pub stun_distance: f32,
    pub stun_duration: f32,
    /// Эффект смерти до удаления entity
    pub death_duration: f32,
    pub investigate_duration: f32,

    pub roam_speed: f32,
    pub investigate_speed: f32,
    pub chase_speed: f32,
}

impl Default for HemannekenConfig {
    fn default() -> Self {
        Self {
            reveal_distance: 10.0,
            attach_distance: 1.0,
            stun_distance: 6.0,
            stun_duration: 5.0,
            death_duration: 3.0,
            investigate_duration: 6.0,
            roam_speed: 1.5,
            investigate_speed: 2.5,
            chase_speed: 5.0,
        }
    }
}

/// Sensor с дефолтами хеманнекена (vision 20м / конус 120° / слух 25м)
pub fn hemanneken_sensor() -> Sensor {
    Sensor {
        vision_range: 20.0,
        vision_angle_deg: 120.0,
        hearing_range: 25.0,
        eye_height: 0.6,
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum HemannekenState {
    Roaming { target_node: Option<Vec3> },
    Investigating { position: Vec3, timer: f32 },
    Chasing,
    /// Оглушён поднятым фонарём
    Stunning { timer: f32 },
    /// Прицепился к игроку; слезает только в воду (→ Death)
    Attached,
    /// Терминальное: DespawnAfter удалит entity
    Death,
    /// Незаконченное «заманивание» из ранних набросков — в граф переходов
    /// не подключено. TODO: механика заманивания не специфицирована;
    /// до этого вариант остаётся недостижимым.
    Enchanting,
}

impl Default for HemannekenState {
    fn default() -> Self {
        Self::Roaming { target_node: None }
    }
}

impl AiState for HemannekenState {
    fn label(&self) -> &'static str {
        match self {
            HemannekenState::Roaming { .. } => "Hemanneken::Roaming",
            HemannekenState::Investigating { .. } => "Hemanneken::Investigating",
            HemannekenState::Chasing => "Hemanneken::Chasing",
            HemannekenState::Stunning { .. } => "Hemanneken::Stunning",
            HemannekenState::Attached => "Hemanneken::Attached",
            HemannekenState::Death => "Hemanneken::Death",
            HemannekenState::Enchanting => "Hemanneken::Enchanting",
        }
    }
}

/// Система: driver хеманнекена.
#[allow(clippy::too_many_arguments)]
pub fn hemanneken_fsm(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut rng: ResMut<DeterministicRng>,
    graph: Res<PatrolGraph>,
    players: Query<&Transform, With<Player>>,
    mut lantern_events: EventReader<LanternRaised>,
    mut water_events: EventReader<PlayerTouchedWater>,
    mut attached_events: EventWriter<HemannekenAttached>,
    mut detached_events: EventWriter<HemannekenDetached>,
    mut sounds: EventWriter<SoundRequest>,
    mut hemannekens: Query<
        (
            Entity,
            &mut Transform,
            &mut StateMachine<HemannekenState>,
            &mut HemannekenForm,
            &mut Sensor,
            &mut NavigationAgent,
            &HemannekenConfig,
        ),
        (With<Hemanneken>, Without<Player>),
    >,
) {
    let delta = time.delta_secs();
    let player_pos = players.iter().next().map(|tf| tf.translation);
    let lanterns: Vec<Vec3> = lantern_events.read().map(|e| e.position).collect();
    let water_touched = water_events.read().count() > 0;

    for (entity, mut transform, mut machine, mut form, mut sensor, mut agent, config) in
        hemannekens.iter_mut()
    {
        let entered = machine.begin_tick(delta);
        let heard = sensor.take_heard();
        let position = transform.translation;
        let lantern_near = lanterns
            .iter()
            .any(|l| l.distance(position) <= config.stun_distance);

        let next = match machine.current_mut() {
            HemannekenState::Roaming { target_node } => {
                if entered {
                    agent.speed = config.roam_speed;
                }
                match *form {
                    HemannekenForm::Rabbit => {
                        // Маскировка: крики и игрок игнорируются, heard уже снят
                        if sensor.distance_to_player <= config.reveal_distance {
                            *form = HemannekenForm::True;
                            sounds.write(SoundRequest {
                                cue: SoundCue::HemannekenGiggle,
                                position,
                            });
                            logger::log(&format!(
                                "Hemanneken {:?}: кролик раскрыл истинную форму",
                                entity
                            ));
                        }
                        roam_step(&graph, &mut rng, &mut agent, target_node, position);
                        None
                    }
                    HemannekenForm::True => {
                        if sensor.distance_to_player <= config.attach_distance {
                            Some(HemannekenState::Attached)
                        } else if sensor.sees_player {
                            Some(HemannekenState::Chasing)
                        } else if heard {
                            sensor.last_known_position.map(|p| {
                                HemannekenState::Investigating {
                                    position: p,
                                    timer: config.investigate_duration,
                                }
                            })
                        } else {
                            roam_step(&graph, &mut rng, &mut agent, target_node, position);
                            None
                        }
                    }
                }
            }

            HemannekenState::Investigating { position: target, timer } => {
                if entered {
                    agent.speed = config.investigate_speed;
                    agent.set_destination(*target);
                }
                if sensor.sees_player {
                    Some(HemannekenState::Chasing)
                } else if heard {
                    // Свежий крик: сброс цели и таймера без перехода
                    if let Some(p) = sensor.last_known_position {
                        *target = p;
                        *timer = config.investigate_duration;
                        agent.set_destination(p);
                    }
                    None
                } else {
                    *timer -= delta;
                    if *timer <= 0.0 {
                        Some(HemannekenState::Roaming { target_node: None })
                    } else {
                        None
                    }
                }
            }

            HemannekenState::Chasing => {
                if entered {
                    agent.speed = config.chase_speed;
                }
                if lantern_near {
                    Some(HemannekenState::Stunning {
                        timer: config.stun_duration,
                    })
                } else if sensor.distance_to_player <= config.attach_distance {
                    Some(HemannekenState::Attached)
                } else if !sensor.sees_player {
                    let lkp = sensor.last_known_position.unwrap_or(position);
                    Some(HemannekenState::Investigating {
                        position: lkp,
                        timer: config.investigate_duration,
                    })
                } else {
                    if let Some(p) = player_pos {
                        agent.set_destination(p);
                    }
                    None
                }
            }

            HemannekenState::Stunning { timer } => {
                if entered {
                    agent.stop();
                }
                *timer -= delta;
                if *timer <= 0.0 {
                    // Стан снимает истинную форму — снова прикидывается кроликом
                    *form = HemannekenForm::Rabbit;
                    Some(HemannekenState::Roaming { target_node: None })
                } else {
                    None
                }
            }

            HemannekenState::Attached => {
                if entered {
                    agent.stop();
                    attached_events.write(HemannekenAttached);
                    logger::log(&format!("Hemanneken {:?}: прицепился к игроку", entity));
                }
                // Едем на игроке — позиция копируется, navigation не участвует
                if let Some(p) = player_pos {
                    transform.translation = p;
                }
                if water_touched {
                    detached_events.write(HemannekenDetached);
                    sounds.write(SoundRequest {
                        cue: SoundCue::HemannekenSplash,
                        position,
                    });
                    Some(HemannekenState::Death)
                } else {
                    None
                }
            }

            HemannekenState::Death => {
                if entered {
                    agent.stop();
                    commands
                        .entity(entity)
                        .insert(DespawnAfter::new(config.death_duration));
                    logger::log(&format!("Hemanneken {:?}: вода — смерть", entity));
                }
                None
            }

            HemannekenState::Enchanting => {
                // В граф переходов не подключено — сюда попадать неоткуда
                debug_assert!(false, "Hemanneken Enchanting не достижимо из графа переходов");
                logger::log_error("Hemanneken: Enchanting без реализации — возврат в Roaming");
                Some(HemannekenState::Roaming { target_node: None })
            }
        };

        machine.transit_to(next);
    }
}

/// Обычный roam-шаг: достигли ноды — берём следующую из графа
fn roam_step(
    graph: &PatrolGraph,
    rng: &mut DeterministicRng,
    agent: &mut NavigationAgent,
    target_node: &mut Option<Vec3>,
    position: Vec3,
) {
    if agent.has_arrived(position) {
        if let Some(node) = graph.random_node(rng, *target_node) {
            *target_node = Some(node);
            agent.set_destination(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_form_is_rabbit() {
        assert_eq!(HemannekenForm::default(), HemannekenForm::Rabbit);
        assert!(matches!(
            HemannekenState::default(),
            HemannekenState::Roaming { target_node: None }
        ));
    }

    #[test]
    fn test_stun_countdown_tick_math() {
        let config = HemannekenConfig::default();
        let delta = 0.25; // бинарно-точный шаг
        let mut timer = config.stun_duration;
        let mut ticks = 0;
        while timer > 0.0 {
            timer -= delta;
            ticks += 1;
        }
        assert_eq!(ticks, (config.stun_duration / delta).ceil() as i32);
    }

    #[test]
    fn test_attach_distance_inside_reveal_distance() {
        let config = HemannekenConfig::default();
        // Прицепление всегда происходит уже раскрытым: attach < reveal
        assert!(config.attach_distance < config.reveal_distance);
        assert!(config.stun_distance < hemanneken_sensor().vision_range);
    }
}
