//! Перцепция врага: дистанция, vision cone, слух, last-known position.
//!
//! Сенсор только СЧИТАЕТ и запоминает — решения о переходах принимают
//! state-каскады врагов (разделение sensing/deciding). Runtime-поля
//! обновляются perception-системами раз в тик.

use bevy::prelude::*;

/// Per-entity перцепция. Конфиг-поля неизменны после спавна.
///
/// Инвариант: last_known_position перезаписывается только явной детекцией
/// (прямая видимость или qualifying shout в радиусе слуха) — сама по себе
/// она не «устаревает».
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Sensor {
    /// Дальность зрения (метры)
    pub vision_range: f32,
    /// Полный угол конуса зрения (градусы)
    pub vision_angle_deg: f32,
    /// Радиус слуха для глобального shout-события
    pub hearing_range: f32,
    /// Высота глаз врага над Transform
    pub eye_height: f32,

    // --- runtime, пишут perception-системы ---
    /// Дистанция до игрока; f32::INFINITY когда игрока нет
    /// («никогда не в радиусе», не ошибка)
    pub distance_to_player: f32,
    /// true: игрок в конусе, в радиусе и линия не перекрыта
    pub sees_player: bool,
    /// Последняя подтверждённая позиция игрока (зрение или слух)
    pub last_known_position: Option<Vec3>,
    /// Одноразовое уведомление «услышал игрока» (снимается take_heard)
    pub(crate) heard: bool,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            vision_range: 20.0,
            vision_angle_deg: 90.0,
            hearing_range: 25.0,
            eye_height: 1.5,
            distance_to_player: f32::INFINITY,
            sees_player: false,
            last_known_position: None,
            heard: false,
        }
    }
}

impl Sensor {
    pub fn new(vision_range: f32, vision_angle_deg: f32, hearing_range: f32) -> Self {
        Self {
            vision_range,
            vision_angle_deg,
            hearing_range,
            ..Default::default()
        }
    }

    /// Слуховая детекция: LKP + одноразовый heard-флаг.
    /// Вызывается perception-системой, не состояниями.
    pub fn record_shout(&mut self, position: Vec3) {
        self.last_known_position = Some(position);
        self.heard = true;
    }

    /// Снять уведомление «услышал». Каскады вызывают это каждый тик
    /// безусловно — неиспользованный флаг не доживает до чужого состояния.
    pub fn take_heard(&mut self) -> bool {
        std::mem::take(&mut self.heard)
    }
}

/// Проверка конуса зрения в горизонтальной плоскости.
/// `forward` — направление взгляда, `half_angle_deg` — половина полного угла.
pub fn within_cone(forward: Vec3, from: Vec3, to: Vec3, half_angle_deg: f32) -> bool {
    let to_target = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    let flat_forward = Vec3::new(forward.x, 0.0, forward.z);
    let (Some(dir), Some(fwd)) = (to_target.try_normalize(), flat_forward.try_normalize()) else {
        // Вырожденный случай (цель над головой / нулевой forward) — считаем видимым по углу
        return true;
    };
    let cos = fwd.dot(dir).clamp(-1.0, 1.0);
    cos.acos().to_degrees() <= half_angle_deg
}
