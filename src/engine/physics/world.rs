use log::trace;
use rapier2d::prelude::*;

/// Engine-side state: every set and solver rapier needs to step bodies
pub struct PhysicsWorld {
    /// Gravity vector in px/s² (y grows downward)
    gravity: Vector<Real>,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Physics pipeline handles collision detection and solving
    physics_pipeline: PhysicsPipeline,

    /// Island manager for sleeping bodies
    island_manager: IslandManager,

    /// Broad phase collision detection
    broad_phase: DefaultBroadPhase,

    /// Narrow phase collision detection
    narrow_phase: NarrowPhase,

    /// Impulse joint set (unused by the sandbox, required by the pipeline)
    impulse_joint_set: ImpulseJointSet,

    /// Multibody joint set (unused by the sandbox, required by the pipeline)
    multibody_joint_set: MultibodyJointSet,

    /// CCD solver (no body enables CCD)
    ccd_solver: CCDSolver,

    /// Rigid body set
    rigid_body_set: RigidBodySet,

    /// Collider set
    collider_set: ColliderSet,

    /// Number of completed steps
    steps: u64,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity and fixed timestep
    pub fn new(gravity: Vector<Real>, dt: Real) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = dt;

        Self {
            gravity,
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            steps: 0,
        }
    }

    /// Step the physics simulation forward by one timestep
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.steps += 1;
        trace!("Physics step {} ({} bodies)", self.steps, self.rigid_body_set.len());
    }

    /// Add a rigid body together with its single collider
    pub fn insert(&mut self, body: RigidBody, collider: Collider) -> RigidBodyHandle {
        let handle = self.rigid_body_set.insert(body);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Remove a rigid body and all its attached colliders
    pub fn remove_rigid_body(&mut self, handle: RigidBodyHandle) -> Option<RigidBody> {
        self.rigid_body_set.remove(
            handle,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        )
    }

    /// Get a reference to a rigid body
    pub fn get_rigid_body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.rigid_body_set.get(handle)
    }

    /// Check whether a handle is still registered
    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set.contains(handle)
    }

    /// Number of registered bodies, fixed ones included
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.collider_set.len()
    }

    /// Handles of every registered dynamic body
    pub fn dynamic_bodies(&self) -> impl Iterator<Item = RigidBodyHandle> + '_ {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .map(|(handle, _)| handle)
    }

    /// Drop every body, collider and cached contact, keeping gravity and timestep
    pub fn reset(&mut self) {
        *self = Self::new(self.gravity, self.integration_parameters.dt);
    }

    /// Set gravity for the physics world
    pub fn set_gravity(&mut self, gravity: Vector<Real>) {
        self.gravity = gravity;
    }

    /// Get current gravity
    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    /// Get the current timestep
    pub fn timestep(&self) -> Real {
        self.integration_parameters.dt
    }

    /// Number of completed steps
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(vector![0.0, 100.0], 1.0 / 60.0)
    }
}
