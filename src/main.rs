use anyhow::{Context, Result};
use glam::Vec2;
use log::info;
use std::path::PathBuf;

use outline_sandbox::{fit_rect, Color, Outline, RasterSurface, SandboxConfig, World};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;

/// Margin kept around imported outlines, like a text layout box
const MARGIN: f32 = 10.0;

/// Simulated frames and how often one is written out
const FRAMES: u32 = 600;
const SNAPSHOT_EVERY: u32 = 60;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting outline sandbox...");

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("frames"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let config = SandboxConfig::new().with_gravity(0.0, 0.2);
    let timestep = config.timestep;
    let mut world = World::with_config(WIDTH as f32, HEIGHT as f32, config);

    // Fit the batch into the upper half, as a text supplier would
    let outlines = fit_rect(
        &sample_outlines(),
        MARGIN,
        MARGIN,
        WIDTH as f32 - MARGIN * 2.0,
        HEIGHT as f32 / 2.0 - MARGIN * 2.0,
    );
    let imported = world.import_shapes(&outlines);
    info!("Imported {} of {} outlines", imported, outlines.len());

    let mut surface = RasterSurface::new(WIDTH, HEIGHT).with_background(Color::WHITE);
    let mut written = 0;

    for frame in 0..FRAMES {
        world.advance(timestep);
        if !world.take_frame_ready() {
            continue;
        }

        world.render(&mut surface);
        if frame % SNAPSHOT_EVERY == 0 {
            let path = out_dir.join(format!("frame_{:04}.png", frame));
            surface
                .save_png(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written += 1;
        }
    }

    info!(
        "Wrote {} snapshots to {} after {} ticks",
        written,
        out_dir.display(),
        world.tick_count()
    );
    world.dispose();

    Ok(())
}

/// A small batch of silhouettes: convex, concave and holed
fn sample_outlines() -> Vec<Outline> {
    let ring = Outline::regular_polygon(Vec2::new(20.0, 20.0), 20.0, 24).with_hole(
        Outline::regular_polygon(Vec2::new(20.0, 20.0), 11.0, 24)
            .points
            .into_iter()
            .rev()
            .collect(),
    );

    let l_shape = Outline::new(vec![
        Vec2::new(50.0, 0.0),
        Vec2::new(62.0, 0.0),
        Vec2::new(62.0, 28.0),
        Vec2::new(80.0, 28.0),
        Vec2::new(80.0, 40.0),
        Vec2::new(50.0, 40.0),
    ]);

    let star = Outline::new(
        (0..10)
            .map(|i| {
                let radius = if i % 2 == 0 { 20.0 } else { 9.0 };
                let angle = i as f32 * std::f32::consts::TAU / 10.0 - std::f32::consts::FRAC_PI_2;
                Vec2::new(110.0, 20.0) + Vec2::from_angle(angle) * radius
            })
            .collect(),
    );

    let block = Outline::rect(Vec2::new(140.0, 5.0), Vec2::new(30.0, 30.0))
        .with_hole(Outline::rect(Vec2::new(148.0, 13.0), Vec2::new(14.0, 14.0)).points);

    // Collapses to a line after dedup and is skipped
    let sliver = Outline::new(vec![Vec2::new(180.0, 0.0), Vec2::new(180.0, 0.0), Vec2::new(190.0, 0.0)]);

    vec![ring, l_shape, star, block, sliver]
}
