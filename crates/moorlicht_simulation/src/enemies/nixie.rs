//! Nixie AI — водяной дух, не покидающий свой водоём.
//!
//! Конечный автомат: Roaming → Staring → Chasing → Hurting → Stunted →
//! (Chasing/Staring/Roaming). Терминальных состояний нет.
//!
//! Погоня гейтится погружением: никси атакует только игрока В ВОДЕ.
//! На суше игрок получает лишь «гляделки» — никси замирает у кромки,
//! смотрит и периодически вокализирует (люринг).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{NavigationAgent, Player, PlayerStatus, Sensor};
use crate::events::{NixieAttack, SoundCue, SoundRequest};
use crate::fsm::{AiState, StateMachine};
use crate::level::WaterBodies;
use crate::logger;
use crate::navigation::face_towards;
use crate::DeterministicRng;

/// Маркер никси
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
pub struct Nixie;

/// Serde: конфиги тюнятся из data-файлов движкового слоя
#[derive(Component, Debug, Clone, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct NixieConfig {
    /// Индекс домашнего водоёма в WaterBodies
    pub home_volume: usize,
    /// Радиус «гляделок»: ближе — Staring, игрок в воде — Chasing
    pub staring_radius: f32,
    /// Дистанция атаки
    pub attack_radius: f32,
    pub hurt_duration: f32,
    pub stunted_duration: f32,
    /// Период вокализаций в Staring
    pub vocal_interval: f32,

    pub swim_speed: f32,
    pub chase_speed: f32,
}

impl Default for NixieConfig {
    fn default() -> Self {
        Self {
            home_volume: 0,
            staring_radius: 16.0,
            attack_radius: 1.5,
            hurt_duration: 1.0,
            stunted_duration: 4.0,
            vocal_interval: 4.0,
            swim_speed: 2.0,
            chase_speed: 4.0,
        }
    }
}

/// Sensor с дефолтами никси (слух ей не нужен — реагирует на воду и дистанцию,
/// но qualifying shout всё равно обновит LKP)
pub fn nixie_sensor() -> Sensor {
    Sensor {
        vision_range: 25.0,
        vision_angle_deg: 360.0,
        hearing_range: 20.0,
        eye_height: 0.3,
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum NixieState {
    /// Плавает между случайными точками домашнего водоёма
    Roaming { target: Option<Vec3> },
    /// Замерла у кромки, смотрит на игрока, периодически вокализирует
    Staring { vocal_timer: f32 },
    /// Преследует игрока в воде (цель клампится в водоём)
    Chasing,
    /// Достала игрока — удар и откат
    Hurting { timer: f32 },
    /// Восстановление после удара
    Stunted { timer: f32 },
}

impl Default for NixieState {
    fn default() -> Self {
        Self::Roaming { target: None }
    }
}

impl AiState for NixieState {
    fn label(&self) -> &'static str {
        match self {
            NixieState::Roaming { .. } => "Nixie::Roaming",
            NixieState::Staring { .. } => "Nixie::Staring",
            NixieState::Chasing => "Nixie::Chasing",
            NixieState::Hurting { .. } => "Nixie::Hurting",
            NixieState::Stunted { .. } => "Nixie::Stunted",
        }
    }
}

/// Оценка угрозы — общий каскад для Roaming/Chasing/Stunted:
/// игрок в воде и близко → Chasing; близко на суше → Staring; иначе Roaming.
fn assess(distance: f32, player_in_water: bool, config: &NixieConfig) -> NixieState {
    if distance <= config.staring_radius {
        if player_in_water {
            NixieState::Chasing
        } else {
            NixieState::Staring {
                vocal_timer: config.vocal_interval,
            }
        }
    } else {
        NixieState::Roaming { target: None }
    }
}

/// Система: driver никси.
#[allow(clippy::too_many_arguments)]
pub fn nixie_fsm(
    time: Res<Time<Fixed>>,
    mut rng: ResMut<DeterministicRng>,
    water: Res<WaterBodies>,
    players: Query<(&Transform, &PlayerStatus), With<Player>>,
    mut attacks: EventWriter<NixieAttack>,
    mut sounds: EventWriter<SoundRequest>,
    mut nixies: Query<
        (
            Entity,
            &mut Transform,
            &mut StateMachine<NixieState>,
            &mut Sensor,
            &mut NavigationAgent,
            &NixieConfig,
        ),
        (With<Nixie>, Without<Player>),
    >,
) {
    let delta = time.delta_secs();
    let player = players.iter().next();
    let player_pos = player.map(|(tf, _)| tf.translation);
    let player_in_water = player.map(|(_, status)| status.in_water).unwrap_or(false);

    for (entity, mut transform, mut machine, mut sensor, mut agent, config) in nixies.iter_mut() {
        let entered = machine.begin_tick(delta);
        // Никси не расследует крики — уведомление снимается, чтобы не протухло
        let _ = sensor.take_heard();
        let position = transform.translation;
        let distance = sensor.distance_to_player;
        let home = water.volume(config.home_volume);

        let next = match machine.current_mut() {
            NixieState::Roaming { target } => {
                if entered {
                    agent.speed = config.swim_speed;
                }
                let threat = assess(distance, player_in_water, config);
                if !matches!(threat, NixieState::Roaming { .. }) {
                    Some(threat)
                } else {
                    // Плаваем по домашнему водоёму
                    if agent.has_arrived(position) {
                        if let Some(volume) = home {
                            let point = volume.random_point(&mut rng, position.y);
                            *target = Some(point);
                            agent.set_destination(point);
                        }
                    }
                    None
                }
            }

            NixieState::Staring { vocal_timer } => {
                if entered {
                    agent.stop();
                }
                if let Some(p) = player_pos {
                    face_towards(&mut transform, p, f32::INFINITY);
                }
                if player_in_water && distance <= config.staring_radius {
                    Some(NixieState::Chasing)
                } else if distance > config.staring_radius {
                    Some(NixieState::Roaming { target: None })
                } else {
                    *vocal_timer -= delta;
                    if *vocal_timer <= 0.0 {
                        *vocal_timer = config.vocal_interval;
                        sounds.write(SoundRequest {
                            cue: SoundCue::NixieCall,
                            position,
                        });
                    }
                    None
                }
            }

            NixieState::Chasing => {
                if entered {
                    agent.speed = config.chase_speed;
                }
                if distance <= config.attack_radius {
                    Some(NixieState::Hurting {
                        timer: config.hurt_duration,
                    })
                } else {
                    let threat = assess(distance, player_in_water, config);
                    if matches!(threat, NixieState::Chasing) {
                        // Цель клампится в водоём — никси не выходит на берег
                        if let (Some(p), Some(volume)) = (player_pos, home) {
                            agent.set_destination(volume.clamp(p));
                        }
                        None
                    } else {
                        Some(threat)
                    }
                }
            }

            NixieState::Hurting { timer } => {
                if entered {
                    agent.stop();
                    attacks.write(NixieAttack {
                        nixie: entity,
                        position,
                    });
                    sounds.write(SoundRequest {
                        cue: SoundCue::NixieShriek,
                        position,
                    });
                    logger::log(&format!("Nixie {:?}: достала игрока", entity));
                }
                *timer -= delta;
                if *timer <= 0.0 {
                    Some(NixieState::Stunted {
                        timer: config.stunted_duration,
                    })
                } else {
                    None
                }
            }

            NixieState::Stunted { timer } => {
                if entered {
                    agent.stop();
                }
                *timer -= delta;
                if *timer <= 0.0 {
                    Some(assess(distance, player_in_water, config))
                } else {
                    None
                }
            }
        };

        machine.transit_to(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assess_priorities() {
        let config = NixieConfig::default();

        // Игрок в воде и близко — погоня важнее гляделок
        assert!(matches!(
            assess(5.0, true, &config),
            NixieState::Chasing
        ));
        // Близко, но на суше — только смотрим
        assert!(matches!(
            assess(5.0, false, &config),
            NixieState::Staring { .. }
        ));
        // Далеко — плаваем, даже если игрок в воде
        assert!(matches!(
            assess(config.staring_radius + 0.1, true, &config),
            NixieState::Roaming { .. }
        ));
    }

    #[test]
    fn test_assess_radius_boundary() {
        let config = NixieConfig::default();
        // Ровно на границе радиуса — ещё смотрим (≤)
        assert!(matches!(
            assess(config.staring_radius, false, &config),
            NixieState::Staring { .. }
        ));
    }

    #[test]
    fn test_attack_radius_nested_in_staring_radius() {
        let config = NixieConfig::default();
        assert!(config.attack_radius < config.staring_radius);
    }
}
