//! Hunter AI — стрелок, патрулирующий болото.
//!
//! Конечный автомат: Roaming → Investigating → Chasing → Aiming → Shooting
//! (после перезарядки каскад обратно в Aiming/Chasing/Investigating/Roaming).
//! Терминальных состояний нет — охотник живёт весь уровень.
//!
//! Приоритеты проверок (первый match побеждает):
//! видимость в радиусе выстрела > видимость > потеря цели > слух > roam.
//! Радиусы вложены строго: shoot < vision < hearing — «ничьих» не бывает.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{player_eye_position, NavigationAgent, Player, PlayerStatus, Sensor};
use crate::events::{HunterShotFired, SoundCue, SoundRequest};
use crate::fsm::{AiState, StateMachine};
use crate::level::{OcclusionWorld, PatrolGraph};
use crate::logger;
use crate::navigation::face_towards;
use crate::DeterministicRng;

/// Маркер охотника
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Hunter;

/// Параметры охотника. Радиусы вложены: shoot_range < vision < hearing
/// (vision/hearing живут в Sensor). Serde: тюнинг из data-файлов движка.
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct HunterConfig {
    /// Дистанция, с которой начинается прицеливание
    pub shoot_range: f32,
    /// Время прицеливания до выстрела (секунды)
    pub aim_duration: f32,
    /// Скорость доворота ствола (радианы/сек)
    pub aim_turn_speed: f32,
    /// Перезарядка после выстрела
    pub reload_duration: f32,
    /// Сколько искать игрока в last-known position
    pub investigate_duration: f32,

    pub roam_speed: f32,
    pub investigate_speed: f32,
    pub chase_speed: f32,

    /// Интервал проверки superposition
    pub superposition_interval: f32,
    /// Дальше этой дистанции охотник телепортируется ближе к игроку
    pub max_idle_distance: f32,
    /// Целевое кольцо дистанций до игрока для ноды телепорта
    pub superposition_band_min: f32,
    pub superposition_band_max: f32,
    /// Нода телепорта не ближе этого к текущей позиции охотника
    pub superposition_min_move: f32,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            shoot_range: 18.0,
            aim_duration: 1.5,
            aim_turn_speed: 3.0,
            reload_duration: 2.5,
            investigate_duration: 8.0,
            roam_speed: 2.0,
            investigate_speed: 3.0,
            chase_speed: 4.5,
            superposition_interval: 10.0,
            max_idle_distance: 45.0,
            superposition_band_min: 20.0,
            superposition_band_max: 35.0,
            superposition_min_move: 10.0,
        }
    }
}

/// Sensor с дефолтами охотника (vision 30м / конус 90° / слух 40м)
pub fn hunter_sensor() -> Sensor {
    Sensor {
        vision_range: 30.0,
        vision_angle_deg: 90.0,
        hearing_range: 40.0,
        eye_height: 1.6,
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum HunterState {
    /// Патруль по нодам графа + периодический superposition-чек
    Roaming {
        target_node: Option<Vec3>,
        superposition_timer: f32,
    },
    /// Идём к last-known position; свежий крик сбрасывает цель и таймер
    Investigating { position: Vec3, timer: f32 },
    /// Преследование с ретаргетом на живую позицию игрока
    Chasing,
    /// Стоим, доворачиваем ствол; по таймеру — проверка линии огня
    Aiming { timer: f32 },
    /// Один выстрел на входе, затем перезарядка
    Shooting { reload_timer: f32 },
}

impl Default for HunterState {
    fn default() -> Self {
        Self::Roaming {
            target_node: None,
            superposition_timer: HunterConfig::default().superposition_interval,
        }
    }
}

impl AiState for HunterState {
    fn label(&self) -> &'static str {
        match self {
            HunterState::Roaming { .. } => "Hunter::Roaming",
            HunterState::Investigating { .. } => "Hunter::Investigating",
            HunterState::Chasing => "Hunter::Chasing",
            HunterState::Aiming { .. } => "Hunter::Aiming",
            HunterState::Shooting { .. } => "Hunter::Shooting",
        }
    }
}

/// Система: driver охотника — один priority-каскад на тик.
#[allow(clippy::too_many_arguments)]
pub fn hunter_fsm(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    graph: Res<PatrolGraph>,
    occlusion: Res<OcclusionWorld>,
    players: Query<(&Transform, &PlayerStatus), With<Player>>,
    mut shots: EventWriter<HunterShotFired>,
    mut sounds: EventWriter<SoundRequest>,
    mut hunters: Query<
        (
            Entity,
            &mut Transform,
            &mut StateMachine<HunterState>,
            &mut Sensor,
            &mut NavigationAgent,
            &HunterConfig,
        ),
        (With<Hunter>, Without<Player>),
    >,
) {
    let delta = time.delta_secs();
    let player = players.iter().next();
    let player_pos = player.map(|(tf, _)| tf.translation);

    for (entity, mut transform, mut machine, mut sensor, mut agent, config) in hunters.iter_mut() {
        let entered = machine.begin_tick(delta);
        let heard = sensor.take_heard();
        let position = transform.translation;

        let next = match machine.current_mut() {
            HunterState::Roaming {
                target_node,
                superposition_timer,
            } => {
                if entered {
                    agent.speed = config.roam_speed;
                }
                if sensor.sees_player {
                    Some(HunterState::Chasing)
                } else if heard {
                    // record_shout уже записал LKP
                    sensor.last_known_position.map(|p| HunterState::Investigating {
                        position: p,
                        timer: config.investigate_duration,
                    })
                } else {
                    // Обычное блуждание: достигли ноды — берём следующую
                    if agent.has_arrived(position) {
                        if let Some(node) = graph.random_node(&mut rng, *target_node) {
                            *target_node = Some(node);
                            agent.set_destination(node);
                        }
                    }

                    *superposition_timer -= delta;
                    if *superposition_timer <= 0.0 {
                        *superposition_timer = config.superposition_interval;
                        if let Some((player_tf, status)) = player {
                            if sensor.distance_to_player > config.max_idle_distance {
                                if let Some(node) = pick_superposition_node(
                                    &graph,
                                    &occlusion,
                                    &mut rng,
                                    position,
                                    player_eye_position(player_tf, status),
                                    config,
                                ) {
                                    logger::log(&format!(
                                        "Hunter {:?}: superposition → ({:.1}, {:.1}, {:.1})",
                                        entity, node.x, node.y, node.z
                                    ));
                                    transform.translation = node;
                                    agent.stop();
                                    *target_node = None;
                                }
                            }
                        }
                    }
                    None
                }
            }

            HunterState::Investigating { position: target, timer } => {
                if entered {
                    agent.speed = config.investigate_speed;
                    agent.set_destination(*target);
                }
                if sensor.sees_player {
                    Some(HunterState::Chasing)
                } else if heard {
                    // Свежий крик: сброс цели и таймера БЕЗ перехода (не стакается)
                    if let Some(p) = sensor.last_known_position {
                        *target = p;
                        *timer = config.investigate_duration;
                        agent.set_destination(p);
                    }
                    None
                } else {
                    *timer -= delta;
                    if *timer <= 0.0 {
                        Some(HunterState::Roaming {
                            target_node: None,
                            superposition_timer: config.superposition_interval,
                        })
                    } else {
                        None
                    }
                }
            }

            HunterState::Chasing => {
                if entered {
                    agent.speed = config.chase_speed;
                }
                if sensor.sees_player && sensor.distance_to_player <= config.shoot_range {
                    Some(HunterState::Aiming {
                        timer: config.aim_duration,
                    })
                } else if !sensor.sees_player {
                    // Потеряли из виду — несём last-known вперёд
                    let lkp = sensor.last_known_position.unwrap_or(position);
                    Some(HunterState::Investigating {
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

            HunterState::Aiming { timer } => {
                if entered {
                    agent.stop();
                }
                if let Some(p) = player_pos {
                    face_towards(&mut transform, p, config.aim_turn_speed * delta);
                }
                if !sensor.sees_player || sensor.distance_to_player > config.shoot_range {
                    Some(HunterState::Chasing)
                } else {
                    *timer -= delta;
                    if *timer <= 0.0 {
                        // Перед выстрелом — свежая проверка линии огня:
                        // за время прицеливания игрок мог зайти за укрытие
                        let line_clear = match player {
                            Some((player_tf, status)) => {
                                let muzzle = position + Vec3::Y * sensor.eye_height;
                                !occlusion
                                    .segment_occluded(muzzle, player_eye_position(player_tf, status))
                            }
                            None => false,
                        };
                        if line_clear {
                            Some(HunterState::Shooting {
                                reload_timer: config.reload_duration,
                            })
                        } else {
                            Some(HunterState::Chasing)
                        }
                    } else {
                        None
                    }
                }
            }

            HunterState::Shooting { reload_timer } => {
                if entered {
                    // Единственный выстрел — сразу при входе
                    let target = player_pos
                        .or(sensor.last_known_position)
                        .unwrap_or(position);
                    shots.write(HunterShotFired {
                        shooter: entity,
                        target,
                    });
                    sounds.write(SoundRequest {
                        cue: SoundCue::HunterGunshot,
                        position,
                    });
                }
                *reload_timer -= delta;
                if *reload_timer <= 0.0 {
                    sounds.write(SoundRequest {
                        cue: SoundCue::HunterReload,
                        position,
                    });
                    // Каскад после перезарядки — те же приоритеты, что всегда
                    if sensor.sees_player && sensor.distance_to_player <= config.shoot_range {
                        Some(HunterState::Aiming {
                            timer: config.aim_duration,
                        })
                    } else if sensor.sees_player {
                        Some(HunterState::Chasing)
                    } else if let Some(lkp) = sensor.last_known_position {
                        Some(HunterState::Investigating {
                            position: lkp,
                            timer: config.investigate_duration,
                        })
                    } else {
                        Some(HunterState::Roaming {
                            target_node: None,
                            superposition_timer: config.superposition_interval,
                        })
                    }
                } else {
                    None
                }
            }
        };

        machine.transit_to(next);
    }
}

/// Выбор ноды для superposition: в кольце дистанций от игрока, перекрыта
/// от его глаз окклюдером (телепорт на виду — баг) и достаточно далеко от
/// текущей позиции охотника.
fn pick_superposition_node(
    graph: &PatrolGraph,
    occlusion: &OcclusionWorld,
    rng: &mut DeterministicRng,
    hunter_pos: Vec3,
    player_eye: Vec3,
    config: &HunterConfig,
) -> Option<Vec3> {
    let candidates: Vec<Vec3> = graph
        .nodes_in_band(
            player_eye,
            config.superposition_band_min,
            config.superposition_band_max,
        )
        .into_iter()
        .filter(|n| occlusion.segment_occluded(player_eye, *n + Vec3::Y * 1.6))
        .filter(|n| n.distance(hunter_pos) >= config.superposition_min_move)
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.rng.gen_range(0..candidates.len());
    Some(candidates[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_ranges_strictly_nested() {
        let config = HunterConfig::default();
        let sensor = hunter_sensor();
        // shoot < vision < hearing — приоритетный каскад без «ничьих»
        assert!(config.shoot_range < sensor.vision_range);
        assert!(sensor.vision_range < sensor.hearing_range);
    }

    #[test]
    fn test_default_state_is_roaming() {
        let state = HunterState::default();
        assert!(matches!(state, HunterState::Roaming { .. }));
    }

    #[test]
    fn test_investigation_countdown_tick_math() {
        let config = HunterConfig::default();
        let delta = 0.25; // бинарно-точный шаг — рекурсия без накопления ошибки
        let mut timer = config.investigate_duration;

        let mut ticks = 0;
        while timer > 0.0 {
            timer -= delta;
            ticks += 1;
        }
        // Ровно ceil(duration / tick) Handle-вызовов
        assert_eq!(ticks, (config.investigate_duration / delta).ceil() as i32);
    }

    #[test]
    fn test_superposition_node_filters() {
        let config = HunterConfig::default();
        let mut rng = DeterministicRng::new(7);
        let player_eye = Vec3::new(0.0, 1.6, 0.0);
        let hunter_pos = Vec3::new(100.0, 0.0, 0.0);

        let visible_node = Vec3::new(25.0, 0.0, 0.0);
        let hidden_node = Vec3::new(0.0, 0.0, 25.0);
        let graph = PatrolGraph {
            nodes: vec![visible_node, hidden_node],
        };
        // Окклюдер перекрывает только hidden_node
        let occlusion = OcclusionWorld {
            occluders: vec![crate::level::Occluder {
                center: Vec3::new(0.0, 1.0, 12.0),
                radius: 2.0,
            }],
        };

        let picked =
            pick_superposition_node(&graph, &occlusion, &mut rng, hunter_pos, player_eye, &config);
        assert_eq!(picked, Some(hidden_node));

        // Охотник рядом с единственной скрытой нодой: min_move отсекает её
        let near_hunter = Vec3::new(0.0, 0.0, 20.0);
        let picked =
            pick_superposition_node(&graph, &occlusion, &mut rng, near_hunter, player_eye, &config);
        assert_eq!(picked, None);
    }
}
