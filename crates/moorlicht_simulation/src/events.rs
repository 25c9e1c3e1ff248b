//! Глобальные шины событий симуляции.
//!
//! Реализованы как Bevy Events, зарегистрированные в App — у каждого
//! World (и каждого теста) своя изолированная шина вместо static
//! singleton'ов. Publish без подписчиков — no-op, не ошибка.
//!
//! Два направления:
//! - inbound (движок → симуляция): крик игрока, вода, фонарь
//! - outbound (симуляция → движок): звуковые запросы, выстрел, атака

use bevy::prelude::*;

/// Игрок крикнул. Слышен каждому врагу в пределах его hearing_range
/// (проверка дистанции — на стороне сенсора, не шины).
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerShouted {
    pub position: Vec3,
}

/// Игрок коснулся воды (вошёл в водный объём)
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerTouchedWater;

/// Игрок вышел из воды
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerLeftWater;

/// Игрок поднял фонарь (позиция фонаря — для stun-дистанции хеманнекена)
#[derive(Event, Debug, Clone, Copy)]
pub struct LanternRaised {
    pub position: Vec3,
}

/// Хеманнекен прицепился к игроку
#[derive(Event, Debug, Clone, Copy)]
pub struct HemannekenAttached;

/// Хеманнекен отцепился (вода → смерть)
#[derive(Event, Debug, Clone, Copy)]
pub struct HemannekenDetached;

/// Охотник выстрелил. Попадание/урон считает движковый слой.
#[derive(Event, Debug, Clone, Copy)]
pub struct HunterShotFired {
    pub shooter: Entity,
    pub target: Vec3,
}

/// Никси достала игрока в воде. Урон/эффект — на движковом слое.
#[derive(Event, Debug, Clone, Copy)]
pub struct NixieAttack {
    pub nixie: Entity,
    pub position: Vec3,
}

/// Fire-and-forget запрос звука для аудио-слоя движка.
/// Симуляция решает только КОГДА звучать, не чем проигрывать.
#[derive(Event, Debug, Clone, Copy)]
pub struct SoundRequest {
    pub cue: SoundCue,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    HunterGunshot,
    HunterReload,
    HemannekenGiggle,
    HemannekenSplash,
    NixieCall,
    NixieShriek,
}

/// Регистрация всех шин в App
pub struct EventBusPlugin;

impl Plugin for EventBusPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayerShouted>()
            .add_event::<PlayerTouchedWater>()
            .add_event::<PlayerLeftWater>()
            .add_event::<LanternRaised>()
            .add_event::<HemannekenAttached>()
            .add_event::<HemannekenDetached>()
            .add_event::<HunterShotFired>()
            .add_event::<NixieAttack>()
            .add_event::<SoundRequest>();
    }
}
