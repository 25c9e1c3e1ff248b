//! Nixie integration tests
//!
//! Гляделки у кромки, вокализации, погоня только за игроком в воде,
//! удар → откат, привязка к водоёму.

use bevy::prelude::*;
use moorlicht_simulation::*;

const POND: WaterVolume = WaterVolume {
    min: Vec2::new(40.0, -10.0),
    max: Vec2::new(70.0, 25.0),
};

fn create_pond_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(WaterBodies {
        volumes: vec![POND],
    });
    app
}

fn spawn_player(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((Transform::from_translation(position), Player))
        .id()
}

fn spawn_nixie(app: &mut App, position: Vec3, config: NixieConfig) -> Entity {
    app.world_mut()
        .spawn((
            Transform::from_translation(position),
            Nixie,
            config,
            enemies::nixie::nixie_sensor(),
            NavigationAgent::default(),
            StateMachine::<NixieState>::default(),
        ))
        .id()
}

fn state_of(app: &App, entity: Entity) -> NixieState {
    app.world()
        .get::<StateMachine<NixieState>>(entity)
        .expect("nixie despawned")
        .current()
        .clone()
}

/// Игрок у кромки → Staring; отошёл за staring_radius → Roaming
#[test]
fn test_staring_radius_scenario() {
    let mut app = create_pond_app(42);
    let player = spawn_player(&mut app, Vec3::new(50.0, 0.0, 5.0));
    let nixie = spawn_nixie(&mut app, Vec3::new(55.0, 0.0, 5.0), NixieConfig::default());

    app.update();
    assert!(matches!(state_of(&app, nixie), NixieState::Staring { .. }));

    // Игрок уходит за радиус — никси теряет интерес на следующем Handle
    app.world_mut()
        .get_mut::<Transform>(player)
        .unwrap()
        .translation = Vec3::new(90.0, 0.0, 5.0);
    app.update();
    assert!(matches!(state_of(&app, nixie), NixieState::Roaming { .. }));
}

/// В Staring никси периодически вокализирует (люринг)
#[test]
fn test_staring_vocalizations() {
    let mut app = create_pond_app(42);
    spawn_player(&mut app, Vec3::new(50.0, 0.0, 5.0));
    let nixie = spawn_nixie(
        &mut app,
        Vec3::new(55.0, 0.0, 5.0),
        NixieConfig {
            vocal_interval: 0.2, // ~12 тиков
            ..Default::default()
        },
    );

    let mut calls = 0usize;
    for _ in 0..30 {
        app.update();
        calls += app
            .world_mut()
            .resource_mut::<Events<SoundRequest>>()
            .drain()
            .filter(|s| s.cue == SoundCue::NixieCall)
            .count();
    }
    assert!(matches!(state_of(&app, nixie), NixieState::Staring { .. }));
    assert!(calls >= 2, "ожидались периодические вокализации, было {}", calls);
}

/// Погоня гейтится водой: на суше игрок получает только гляделки,
/// в воде — погоню, удар и откат
#[test]
fn test_submersion_gated_chase_and_hurt() {
    let mut app = create_pond_app(42);
    spawn_player(&mut app, Vec3::new(50.0, 0.0, 5.0));
    let nixie = spawn_nixie(
        &mut app,
        Vec3::new(55.0, 0.0, 5.0),
        NixieConfig {
            stunted_duration: 0.5,
            ..Default::default()
        },
    );

    // На суше — никакой погони
    for _ in 0..10 {
        app.update();
        assert!(matches!(state_of(&app, nixie), NixieState::Staring { .. }));
    }

    // Игрок входит в воду — погоня в тот же тик (перцепция раньше решений)
    app.world_mut().send_event(PlayerTouchedWater);
    app.update();
    assert!(matches!(state_of(&app, nixie), NixieState::Chasing));

    // Доплывает и бьёт
    let mut attacks = 0usize;
    let mut shrieks = 0usize;
    let mut saw_hurting = false;
    let mut saw_stunted = false;
    for _ in 0..300 {
        app.update();
        match state_of(&app, nixie) {
            NixieState::Hurting { .. } => {
                if !saw_hurting {
                    saw_hurting = true;
                    // Игрок выбирается на берег, пока никси замахнулась
                    app.world_mut().send_event(PlayerLeftWater);
                }
            }
            NixieState::Stunted { .. } => saw_stunted = true,
            _ => {}
        }
        attacks += app
            .world_mut()
            .resource_mut::<Events<NixieAttack>>()
            .drain()
            .count();
        shrieks += app
            .world_mut()
            .resource_mut::<Events<SoundRequest>>()
            .drain()
            .filter(|s| s.cue == SoundCue::NixieShriek)
            .count();
        if saw_stunted && matches!(state_of(&app, nixie), NixieState::Staring { .. }) {
            break;
        }
    }

    assert!(saw_hurting, "никси так и не достала игрока");
    assert!(saw_stunted, "после удара нет отката");
    assert_eq!(attacks, 1);
    assert_eq!(shrieks, 1);
    // Игрок на суше рядом — после отката снова гляделки
    assert!(matches!(state_of(&app, nixie), NixieState::Staring { .. }));
}

/// Никси не покидает водоём: преследуя игрока «в воде» за границей объёма,
/// её позиция клампится в водоём
#[test]
fn test_nixie_stays_in_home_water() {
    let mut app = create_pond_app(42);
    spawn_player(&mut app, Vec3::new(35.0, 0.0, 5.0)); // за западной кромкой
    let nixie = spawn_nixie(
        &mut app,
        Vec3::new(55.0, 0.0, 5.0),
        NixieConfig {
            staring_radius: 30.0, // игрок за кромкой, но в радиусе интереса
            ..Default::default()
        },
    );

    app.world_mut().send_event(PlayerTouchedWater);
    app.update();
    assert!(matches!(state_of(&app, nixie), NixieState::Chasing));

    for _ in 0..300 {
        app.update();
        let at = app.world().get::<Transform>(nixie).unwrap().translation;
        assert!(
            POND.contains(at),
            "никси вышла из водоёма: {:?}",
            at
        );
    }
    // До игрока на берегу она так и не дотянулась
    assert!(matches!(state_of(&app, nixie), NixieState::Chasing));
}

/// Roaming без игрока: плавает между точками домашнего водоёма
#[test]
fn test_roams_inside_pond_without_player() {
    let mut app = create_pond_app(42);
    let nixie = spawn_nixie(&mut app, Vec3::new(55.0, 0.0, 5.0), NixieConfig::default());

    let start = Vec3::new(55.0, 0.0, 5.0);
    let mut moved = false;
    for _ in 0..300 {
        app.update();
        let at = app.world().get::<Transform>(nixie).unwrap().translation;
        assert!(POND.contains(at));
        if at.distance(start) > 1.0 {
            moved = true;
        }
    }
    assert!(moved, "никси не сдвинулась с места");
    assert!(matches!(state_of(&app, nixie), NixieState::Roaming { .. }));
}
