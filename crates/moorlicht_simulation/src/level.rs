//! Уровневые сервисы для headless симуляции.
//!
//! Сцена движка наполняет эти ресурсы при загрузке уровня; тесты — руками.
//! OcclusionWorld — аналитическая замена физического raycast'а: симуляции
//! нужен только ответ «перекрыт ли сегмент», не сам физический мир.

use bevy::prelude::*;
use rand::Rng;

use crate::components::Player;
use crate::enemies::{Hemanneken, Hunter, Nixie};
use crate::logger;
use crate::DeterministicRng;

/// Граф patrol-нод для Roaming (preconfigured точки уровня)
#[derive(Resource, Debug, Clone, Default)]
pub struct PatrolGraph {
    pub nodes: Vec<Vec3>,
}

impl PatrolGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Случайная нода (детерминированный RNG), исключая `except` если
    /// есть альтернативы — чтобы roam не «застревал» на месте.
    pub fn random_node(&self, rng: &mut DeterministicRng, except: Option<Vec3>) -> Option<Vec3> {
        if self.nodes.is_empty() {
            return None;
        }
        let candidates: Vec<Vec3> = match except {
            Some(prev) if self.nodes.len() > 1 => self
                .nodes
                .iter()
                .copied()
                .filter(|n| n.distance(prev) > 0.01)
                .collect(),
            _ => self.nodes.clone(),
        };
        if candidates.is_empty() {
            return None;
        }
        let idx = rng.rng.gen_range(0..candidates.len());
        Some(candidates[idx])
    }

    /// Ноды в кольце [min, max] от точки (по XZ)
    pub fn nodes_in_band(&self, center: Vec3, min: f32, max: f32) -> Vec<Vec3> {
        self.nodes
            .iter()
            .copied()
            .filter(|n| {
                let dx = n.x - center.x;
                let dz = n.z - center.z;
                let d = (dx * dx + dz * dz).sqrt();
                d >= min && d <= max
            })
            .collect()
    }
}

/// Сферический окклюдер (стог, валун, стена аппроксимируется цепочкой сфер)
#[derive(Debug, Clone, Copy)]
pub struct Occluder {
    pub center: Vec3,
    pub radius: f32,
}

/// Окклюдеры уровня для line-of-sight проверок.
/// Актёры окклюдерами не являются — self-collision исключён по построению.
#[derive(Resource, Debug, Clone, Default)]
pub struct OcclusionWorld {
    pub occluders: Vec<Occluder>,
}

impl OcclusionWorld {
    /// true если сегмент from→to пересекает хотя бы один окклюдер
    pub fn segment_occluded(&self, from: Vec3, to: Vec3) -> bool {
        self.occluders
            .iter()
            .any(|occ| segment_hits_sphere(from, to, occ.center, occ.radius))
    }
}

/// Классика: ближайшая точка сегмента к центру сферы
fn segment_hits_sphere(from: Vec3, to: Vec3, center: Vec3, radius: f32) -> bool {
    let seg = to - from;
    let len_sq = seg.length_squared();
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((center - from).dot(seg) / len_sq).clamp(0.0, 1.0)
    };
    let closest = from + seg * t;
    closest.distance_squared(center) <= radius * radius
}

/// Водный объём — прямоугольник в плоскости XZ
#[derive(Debug, Clone, Copy)]
pub struct WaterVolume {
    pub min: Vec2,
    pub max: Vec2,
}

impl WaterVolume {
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.z >= self.min.y && p.z <= self.max.y
    }

    /// Ближайшая точка объёма к p (никси не покидает воду)
    pub fn clamp(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y,
            p.z.clamp(self.min.y, self.max.y),
        )
    }

    pub fn random_point(&self, rng: &mut DeterministicRng, y: f32) -> Vec3 {
        let x = rng.rng.gen_range(self.min.x..=self.max.x);
        let z = rng.rng.gen_range(self.min.y..=self.max.y);
        Vec3::new(x, y, z)
    }
}

/// Водные объёмы уровня
#[derive(Resource, Debug, Clone, Default)]
pub struct WaterBodies {
    pub volumes: Vec<WaterVolume>,
}

impl WaterBodies {
    pub fn volume(&self, index: usize) -> Option<&WaterVolume> {
        self.volumes.get(index)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.volumes.iter().any(|v| v.contains(p))
    }
}

/// Startup-проверка сцены: конфигурационные ошибки логируются как warnings,
/// задетые сущности деградируют до «стоять на месте», симуляция не падает.
pub fn validate_scene(
    graph: Res<PatrolGraph>,
    water: Res<WaterBodies>,
    players: Query<(), With<Player>>,
    hunters: Query<(), With<Hunter>>,
    hemannekens: Query<(), With<Hemanneken>>,
    nixies: Query<(), With<Nixie>>,
) {
    if players.is_empty() {
        logger::log_warning(
            "Scene: игрок не найден — сенсоры вернут бесконечную дистанцию, враги останутся в Roaming",
        );
    }
    let roamers = hunters.iter().count() + hemannekens.iter().count();
    if roamers > 0 && graph.is_empty() {
        logger::log_warning("Scene: patrol граф пуст — Roaming будет стоять на месте");
    }
    if !nixies.is_empty() && water.volumes.is_empty() {
        logger::log_warning("Scene: водные объёмы не заданы — никси останется в Roaming на месте");
    }
}
