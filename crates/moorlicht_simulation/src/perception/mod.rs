//! Perception-системы: зрение, слух, water-статус игрока.
//!
//! Выполняются в SimSet::Perception, ПЕРЕД state-каскадами — каждый тик
//! враги решают по свежим sensor-данным. Сенсоры не вызывают переходов,
//! только обновляют свои поля (sensing отделён от deciding).

use bevy::prelude::*;

use crate::components::{player_eye_position, Player, PlayerStatus, Sensor};
use crate::components::sensor::within_cone;
use crate::events::{PlayerLeftWater, PlayerShouted, PlayerTouchedWater};
use crate::level::OcclusionWorld;
use crate::logger;
use crate::SimSet;

/// Система: зрение и дистанция каждого сенсора.
///
/// Видимость = в радиусе И в конусе И сегмент глаза-врага → глаза-игрока
/// не перекрыт. Присевший игрок опускает целевую точку — прячется за
/// низкими окклюдерами. При визуальном контакте LKP обновляется живой
/// позицией игрока.
pub fn update_vision(
    occlusion: Res<OcclusionWorld>,
    players: Query<(&Transform, &PlayerStatus), With<Player>>,
    mut sensors: Query<(&Transform, &mut Sensor), Without<Player>>,
) {
    let player = players.iter().next();

    for (transform, mut sensor) in sensors.iter_mut() {
        let Some((player_tf, status)) = player else {
            // Игрока нет — «бесконечно далеко», не ошибка
            sensor.distance_to_player = f32::INFINITY;
            sensor.sees_player = false;
            continue;
        };

        sensor.distance_to_player = transform.translation.distance(player_tf.translation);

        let half_angle = sensor.vision_angle_deg * 0.5;
        let in_range = sensor.distance_to_player <= sensor.vision_range;
        let in_cone = in_range
            && within_cone(
                transform.forward().as_vec3(),
                transform.translation,
                player_tf.translation,
                half_angle,
            );

        let visible = in_cone && {
            let eye = transform.translation + Vec3::Y * sensor.eye_height;
            let target = player_eye_position(player_tf, status);
            !occlusion.segment_occluded(eye, target)
        };

        sensor.sees_player = visible;
        if visible {
            sensor.last_known_position = Some(player_tf.translation);
        }
    }
}

/// Система: слух — глобальный shout против hearing_range каждого сенсора.
///
/// Qualifying shout обновляет LKP и взводит одноразовый heard-флаг;
/// реагировать или нет — решает состояние владельца.
pub fn hear_shouts(
    mut shouts: EventReader<PlayerShouted>,
    mut sensors: Query<(Entity, &Transform, &mut Sensor)>,
) {
    for shout in shouts.read() {
        for (entity, transform, mut sensor) in sensors.iter_mut() {
            let distance = transform.translation.distance(shout.position);
            if distance <= sensor.hearing_range {
                sensor.record_shout(shout.position);
                logger::log(&format!(
                    "Sensor: {:?} услышал крик на {:.1}m (радиус {:.1}m)",
                    entity, distance, sensor.hearing_range
                ));
            }
        }
    }
}

/// Система: синхронизация water-статуса игрока из событий
pub fn track_player_water(
    mut touched: EventReader<PlayerTouchedWater>,
    mut left: EventReader<PlayerLeftWater>,
    mut players: Query<&mut PlayerStatus, With<Player>>,
) {
    let entered = touched.read().count() > 0;
    let exited = left.read().count() > 0;
    if !entered && !exited {
        return;
    }
    for mut status in players.iter_mut() {
        // При обоих событиях в одном тике верим последнему факту — выходу
        status.in_water = entered && !exited;
    }
}

pub struct PerceptionPlugin;

impl Plugin for PerceptionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (track_player_water, update_vision, hear_shouts)
                .chain()
                .in_set(SimSet::Perception),
        );
    }
}
