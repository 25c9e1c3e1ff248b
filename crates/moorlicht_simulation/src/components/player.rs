//! Игрок — внешний коллаборатор: движок двигает его Transform,
//! симуляция только читает позицию и статус.

use bevy::prelude::*;

/// Маркер игрока. Transform обновляет движковый слой.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Transform, PlayerStatus)]
pub struct Player;

/// Статус игрока, влияющий на перцепцию и AI-гейты.
/// in_water синхронизируется из water-событий (см. perception модуль).
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct PlayerStatus {
    pub crouching: bool,
    pub in_water: bool,
}

/// Высота глаз игрока стоя/в присяде (метры).
/// Vision-лучи целятся в эту точку: присевший игрок прячется за низкими
/// окклюдерами.
pub const PLAYER_EYE_STANDING: f32 = 1.6;
pub const PLAYER_EYE_CROUCHING: f32 = 0.8;

/// Точка, в которую целятся vision-лучи врагов
pub fn player_eye_position(transform: &Transform, status: &PlayerStatus) -> Vec3 {
    let eye_height = if status.crouching {
        PLAYER_EYE_CROUCHING
    } else {
        PLAYER_EYE_STANDING
    };
    transform.translation + Vec3::Y * eye_height
}
