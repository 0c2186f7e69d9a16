// Engine modules: geometry, physics, simulation loop, rendering

pub mod config;
pub mod geometry;
pub mod physics;
pub mod renderer;
pub mod simulation_loop;
pub mod world;
