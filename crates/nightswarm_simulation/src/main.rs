//! Headless прогон волны NIGHTSWARM
//!
//! Запускает симуляцию без рендера: игрок на точке спавна, волна из 10
//! врагов, прогресс печатается раз в 10 секунд симуляции.

use bevy::prelude::*;
use nightswarm_simulation::{
    create_headless_app, step_simulation, SessionState, SpawnDirector, TileProvider,
};

fn main() {
    let seed = 42;
    println!("Starting NIGHTSWARM headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    // Карта: сетка открытых тайлов 9x9 с шагом 2м
    let open_tiles: Vec<Vec3> = (-4..=4)
        .flat_map(|x| (-4..=4).map(move |z| Vec3::new(x as f32 * 2.0, 0.0, z as f32 * 2.0)))
        .collect();
    app.insert_resource(TileProvider { open_tiles });

    const DT: f32 = 1.0 / 60.0;
    for tick in 0..3600 {
        step_simulation(&mut app, DT);

        if tick % 600 == 0 {
            let director = app.world().resource::<SpawnDirector>();
            let session = app.world().resource::<SessionState>();
            println!(
                "t={:.1}s: to_spawn={} alive={} player_alive={} score={}",
                tick as f32 * DT,
                director.remaining_to_spawn,
                director.remaining_alive,
                session.player_alive,
                session.score,
            );
        }
    }

    println!("Simulation complete!");
}
