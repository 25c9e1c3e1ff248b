//! ECS Components симуляции
//!
//! Организация по доменам:
//! - player: маркер игрока + статус (crouch, вода)
//! - sensor: перцепция врага (зрение, слух, last-known position)
//! - navigation: командная поверхность движения (NavigationAgent)

pub mod navigation;
pub mod player;
pub mod sensor;

// Re-exports для удобного импорта
pub use navigation::*;
pub use player::*;
pub use sensor::*;
