// Physics system using rapier2d

pub mod body;
mod world;

pub use body::{BodyFactory, BodyShape, BuildError, LocalOutline, RigidBodyHandle};
pub use world::PhysicsWorld;

pub use body::presets;
