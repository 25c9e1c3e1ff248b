//! Headless исполнитель navigation-команд.
//!
//! Двигает Transform напрямую к destination (без pathfinding'а) — в
//! shipped-сборке эту систему замещает NavMesh-агент движка, командная
//! поверхность (NavigationAgent) остаётся той же. Состояния опрашивают
//! has_arrived(), а не предполагают успех команд.

use bevy::prelude::*;

use crate::components::NavigationAgent;
use crate::SimSet;

/// Шаг движения к цели в плоскости XZ. Возвращает новую позицию.
/// Y не трогаем — высоту держит грунт/движок.
pub fn advance_towards(position: Vec3, destination: Vec3, step: f32, stopping_distance: f32) -> Vec3 {
    let planar = Vec3::new(destination.x - position.x, 0.0, destination.z - position.z);
    let distance = planar.length();
    if distance <= stopping_distance || distance <= f32::EPSILON {
        return position;
    }
    if step >= distance {
        return position + planar;
    }
    position + planar * (step / distance)
}

/// Поворот к цели вокруг Y с ограничением max_angle радиан за вызов.
/// Используется и интегратором (мгновенно), и Aiming-состоянием (slew).
pub fn face_towards(transform: &mut Transform, target: Vec3, max_angle: f32) {
    let dx = target.x - transform.translation.x;
    let dz = target.z - transform.translation.z;
    if dx * dx + dz * dz < 1e-6 {
        return;
    }
    // Bevy forward = -Z: yaw подбираем так, чтобы -Z смотрел на цель
    let desired = Quat::from_rotation_y((-dx).atan2(-dz));
    let angle = transform.rotation.angle_between(desired);
    if angle <= max_angle || angle <= f32::EPSILON {
        transform.rotation = desired;
    } else {
        transform.rotation = transform.rotation.slerp(desired, max_angle / angle);
    }
}

/// Система: интеграция движения агентов.
pub fn drive_navigation(
    time: Res<Time<Fixed>>,
    mut agents: Query<(&mut Transform, &NavigationAgent)>,
) {
    let delta = time.delta_secs();

    for (mut transform, agent) in agents.iter_mut() {
        if !agent.on_navmesh {
            continue;
        }
        let Some(destination) = agent.destination() else {
            continue;
        };
        if agent.has_arrived(transform.translation) {
            continue;
        }
        let position = transform.translation;
        transform.translation = advance_towards(
            position,
            destination,
            agent.speed * delta,
            agent.stopping_distance,
        );
        // Лицом по ходу движения (мгновенно; slew нужен только прицеливанию)
        face_towards(&mut transform, destination, f32::INFINITY);
    }
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, drive_navigation.in_set(SimSet::Movement));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_towards_steps_and_clamps() {
        let start = Vec3::ZERO;
        let dest = Vec3::new(10.0, 0.0, 0.0);

        let step1 = advance_towards(start, dest, 3.0, 0.5);
        assert!((step1.x - 3.0).abs() < 1e-5);

        // Шаг больше остатка — не перелетаем
        let near = Vec3::new(9.0, 0.0, 0.0);
        let step2 = advance_towards(near, dest, 5.0, 0.5);
        assert!((step2.x - 10.0).abs() < 1e-5);

        // В пределах допуска — стоим
        let arrived = Vec3::new(9.8, 0.0, 0.0);
        assert_eq!(advance_towards(arrived, dest, 5.0, 0.5), arrived);
    }

    #[test]
    fn test_advance_towards_ignores_height() {
        let start = Vec3::new(0.0, 2.0, 0.0);
        let dest = Vec3::new(0.0, 0.0, -6.0);
        let next = advance_towards(start, dest, 1.0, 0.5);
        assert_eq!(next.y, 2.0);
        assert!((next.z + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_face_towards_slew_limit() {
        let mut transform = Transform::default(); // forward = -Z
        let target = Vec3::new(10.0, 0.0, 0.0); // цель справа, 90°

        face_towards(&mut transform, target, 0.1);
        let turned = transform.rotation.angle_between(Quat::IDENTITY);
        assert!((turned - 0.1).abs() < 1e-3);

        // Без лимита — сразу лицом к цели
        face_towards(&mut transform, target, f32::INFINITY);
        let fwd = transform.forward().as_vec3();
        assert!((fwd - Vec3::X).length() < 1e-3);
    }
}
