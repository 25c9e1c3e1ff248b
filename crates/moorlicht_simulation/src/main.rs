//! Headless симуляция MOORLICHT
//!
//! Прогоняет болотную сцену без движка: игрок, охотник, хеманнекен, никси.
//! Удобно для профилирования AI и проверки детерминизма.

use bevy::prelude::*;

use moorlicht_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting MOORLICHT headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);

    app.insert_resource(PatrolGraph {
        nodes: vec![
            Vec3::new(-20.0, 0.0, -20.0),
            Vec3::new(25.0, 0.0, -15.0),
            Vec3::new(30.0, 0.0, 20.0),
            Vec3::new(-15.0, 0.0, 30.0),
            Vec3::new(0.0, 0.0, -40.0),
        ],
    });
    app.insert_resource(OcclusionWorld {
        occluders: vec![
            Occluder {
                center: Vec3::new(10.0, 1.0, -10.0),
                radius: 3.0,
            },
            Occluder {
                center: Vec3::new(-12.0, 1.0, 18.0),
                radius: 4.0,
            },
        ],
    });
    app.insert_resource(WaterBodies {
        volumes: vec![WaterVolume {
            min: Vec2::new(40.0, -10.0),
            max: Vec2::new(70.0, 25.0),
        }],
    });

    let world = app.world_mut();
    world.spawn((Transform::from_translation(Vec3::ZERO), Player));
    let hunter = world
        .spawn((
            Transform::from_translation(Vec3::new(-20.0, 0.0, -20.0)),
            Hunter,
            HunterConfig::default(),
            enemies::hunter::hunter_sensor(),
            NavigationAgent::default(),
            StateMachine::<HunterState>::default(),
        ))
        .id();
    let hemanneken = world
        .spawn((
            Transform::from_translation(Vec3::new(25.0, 0.0, -15.0)),
            Hemanneken,
            HemannekenForm::default(),
            HemannekenConfig::default(),
            enemies::hemanneken::hemanneken_sensor(),
            NavigationAgent::default(),
            StateMachine::<HemannekenState>::default(),
        ))
        .id();
    let nixie = world
        .spawn((
            Transform::from_translation(Vec3::new(55.0, 0.0, 5.0)),
            Nixie,
            NixieConfig::default(),
            enemies::nixie::nixie_sensor(),
            NavigationAgent::default(),
            StateMachine::<NixieState>::default(),
        ))
        .id();

    // 1000 тиков (~16.7 сек игрового времени) с криком на 300-м
    for tick in 0..1000 {
        if tick == 300 {
            app.world_mut().send_event(PlayerShouted {
                position: Vec3::ZERO,
            });
            println!("Tick {}: player shouted", tick);
        }

        app.update();

        if tick % 100 == 0 {
            let world = app.world();
            let hunter_state = world
                .get::<StateMachine<HunterState>>(hunter)
                .map(|m| m.current().label())
                .unwrap_or("despawned");
            let hemanneken_state = world
                .get::<StateMachine<HemannekenState>>(hemanneken)
                .map(|m| m.current().label())
                .unwrap_or("despawned");
            let nixie_state = world
                .get::<StateMachine<NixieState>>(nixie)
                .map(|m| m.current().label())
                .unwrap_or("despawned");
            println!(
                "Tick {}: {} | {} | {}",
                tick, hunter_state, hemanneken_state, nixie_state
            );
        }
    }

    println!("Simulation complete!");
}
