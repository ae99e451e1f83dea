use bevy::math::Mat3;
use bevy::prelude::*;

use crate::game_logic::error::WorldError;

/// Opaque reference to a body owned by a [`PhysicsWorld`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Box { half_extents: Vec3 },
    /// Horizontal plane through the body's position, facing +Y.
    Plane,
}

/// Contact material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

/// Pose and velocities of a body, as read back after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Quat,
    pub linvel: Vec3,
    pub angvel: Vec3,
}

impl BodyState {
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            linvel: Vec3::ZERO,
            angvel: Vec3::ZERO,
        }
    }

    /// Heading projected on the ground plane. Vehicles face local -Z.
    pub fn forward_axis(&self) -> Vec3 {
        let forward = self.rotation * Vec3::NEG_Z;
        Vec3::new(forward.x, 0.0, forward.z)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    /// Right-hand side of the heading on the ground plane.
    pub fn right_axis(&self) -> Vec3 {
        let forward = self.forward_axis();
        Vec3::new(-forward.z, 0.0, forward.x)
    }
}

/// The rigid body engine as seen by the game: create bodies, step, read and write state.
pub trait PhysicsWorld: Send + Sync {
    fn create_body(
        &mut self,
        mass: f32,
        shape: Shape,
        material: Material,
    ) -> Result<BodyHandle, WorldError>;

    /// Makes a created body take part in simulation.
    fn add_body(&mut self, handle: BodyHandle) -> Result<(), WorldError>;

    fn step(&mut self, dt: f32);

    /// `None` until the body has been added.
    fn state(&self, handle: BodyHandle) -> Option<BodyState>;

    fn set_pose(
        &mut self,
        handle: BodyHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), WorldError>;

    fn set_velocity(
        &mut self,
        handle: BodyHandle,
        linvel: Vec3,
        angvel: Vec3,
    ) -> Result<(), WorldError>;

    fn set_damping(&mut self, handle: BodyHandle, linear: f32, angular: f32)
        -> Result<(), WorldError>;

    /// Force applied at the center of mass for the next step only.
    fn apply_force(&mut self, handle: BodyHandle, force: Vec3) -> Result<(), WorldError>;

    /// Torque applied for the next step only.
    fn apply_torque(&mut self, handle: BodyHandle, torque: Vec3) -> Result<(), WorldError>;
}

struct RigidBody {
    shape: Shape,
    material: Material,
    inv_mass: f32,
    // diagonal of the inverse inertia tensor, body axes
    inv_inertia: Vec3,
    state: BodyState,
    linear_damping: f32,
    angular_damping: f32,
    force: Vec3,
    torque: Vec3,
    active: bool,
}

impl RigidBody {
    fn is_dynamic(&self) -> bool {
        self.inv_mass > 0.0
    }
}

/// Small deterministic world: semi-implicit Euler, a ground plane and static boxes.
///
/// Dynamic boxes are resolved against static geometry only, which is all the
/// game needs with a single driven body.
pub struct SimpleWorld {
    gravity: Vec3,
    bodies: Vec<RigidBody>,
}

// below this rebound speed a landing body just settles
const REST_SPEED: f32 = 0.5;

impl SimpleWorld {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity: Vec3::new(0.0, gravity, 0.0),
            bodies: Vec::new(),
        }
    }

    fn body(&self, handle: BodyHandle) -> Result<&RigidBody, WorldError> {
        self.bodies
            .get(handle.0 as usize)
            .ok_or(WorldError::UnknownBody(handle))
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Result<&mut RigidBody, WorldError> {
        self.bodies
            .get_mut(handle.0 as usize)
            .ok_or(WorldError::UnknownBody(handle))
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.iter_mut().filter(|b| b.active && b.is_dynamic()) {
            let state = &mut body.state;
            state.linvel += (gravity + body.force * body.inv_mass) * dt;
            state.angvel += body.torque * body.inv_inertia * dt;

            state.linvel *= (1.0 - body.linear_damping).max(0.0).powf(dt);
            state.angvel *= (1.0 - body.angular_damping).max(0.0).powf(dt);

            state.position += state.linvel * dt;
            state.rotation = (Quat::from_scaled_axis(state.angvel * dt) * state.rotation).normalize();

            body.force = Vec3::ZERO;
            body.torque = Vec3::ZERO;
        }
    }

    fn resolve_contacts(&mut self) {
        let statics: Vec<(Shape, Vec3, Material)> = self
            .bodies
            .iter()
            .filter(|b| b.active && !b.is_dynamic())
            .map(|b| (b.shape, b.state.position, b.material))
            .collect();

        for body in self.bodies.iter_mut().filter(|b| b.active && b.is_dynamic()) {
            let Shape::Box { half_extents } = body.shape else {
                continue;
            };
            for (shape, position, material) in &statics {
                let restitution = body.material.restitution.max(material.restitution);
                let friction = (body.material.friction * material.friction).sqrt();
                match shape {
                    Shape::Plane => {
                        resolve_ground(&mut body.state, half_extents.y, position.y, restitution)
                    }
                    Shape::Box {
                        half_extents: wall_half,
                    } => resolve_box(
                        &mut body.state,
                        half_extents,
                        *position,
                        *wall_half,
                        restitution,
                        friction,
                    ),
                }
            }
        }
    }
}

fn resolve_ground(state: &mut BodyState, half_height: f32, ground_y: f32, restitution: f32) {
    let bottom = state.position.y - half_height;
    if bottom >= ground_y {
        return;
    }
    state.position.y = ground_y + half_height;
    if state.linvel.y < 0.0 {
        let rebound = -state.linvel.y * restitution;
        state.linvel.y = if rebound < REST_SPEED { 0.0 } else { rebound };
    }
}

fn resolve_box(
    state: &mut BodyState,
    half_extents: Vec3,
    wall_center: Vec3,
    wall_half: Vec3,
    restitution: f32,
    friction: f32,
) {
    // axis-aligned bounds of the rotated box
    let half = Mat3::from_quat(state.rotation).abs() * half_extents;
    let delta = state.position - wall_center;
    let overlap = half + wall_half - delta.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 || overlap.z <= 0.0 {
        return;
    }

    // sideways push-out, unless the body is landing on top
    let horizontal = if overlap.x <= overlap.z { 0 } else { 2 };
    let axis = if delta.y > 0.0 && overlap.y < overlap[horizontal] {
        1
    } else {
        horizontal
    };
    let sign = if delta[axis] >= 0.0 { 1.0 } else { -1.0 };
    state.position[axis] += overlap[axis] * sign;

    if state.linvel[axis] * sign < 0.0 {
        state.linvel[axis] *= -restitution;
    }
    let keep = (1.0 - friction).clamp(0.0, 1.0);
    for tangent in (0..3).filter(|&i| i != axis && i != 1) {
        state.linvel[tangent] *= keep;
    }
}

fn box_inverse_inertia(mass: f32, half_extents: Vec3) -> Vec3 {
    let size = half_extents * 2.0;
    let inertia = Vec3::new(
        size.y * size.y + size.z * size.z,
        size.x * size.x + size.z * size.z,
        size.x * size.x + size.y * size.y,
    ) * (mass / 12.0);
    Vec3::ONE / inertia.max(Vec3::splat(f32::EPSILON))
}

impl PhysicsWorld for SimpleWorld {
    fn create_body(
        &mut self,
        mass: f32,
        shape: Shape,
        material: Material,
    ) -> Result<BodyHandle, WorldError> {
        if !mass.is_finite() || mass < 0.0 {
            return Err(WorldError::InvalidBody("mass must be finite and non-negative"));
        }
        let inv_inertia = match shape {
            Shape::Box { half_extents } => {
                if !half_extents.is_finite() || half_extents.min_element() <= 0.0 {
                    return Err(WorldError::InvalidBody("box extents must be positive"));
                }
                if mass > 0.0 {
                    box_inverse_inertia(mass, half_extents)
                } else {
                    Vec3::ZERO
                }
            }
            Shape::Plane => {
                if mass > 0.0 {
                    return Err(WorldError::InvalidBody("planes must be static"));
                }
                Vec3::ZERO
            }
        };

        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(RigidBody {
            shape,
            material,
            inv_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            inv_inertia,
            state: BodyState::at_rest(Vec3::ZERO),
            linear_damping: 0.01,
            angular_damping: 0.01,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            active: false,
        });
        Ok(handle)
    }

    fn add_body(&mut self, handle: BodyHandle) -> Result<(), WorldError> {
        let body = self.body_mut(handle)?;
        if body.active {
            return Err(WorldError::AlreadyAdded(handle));
        }
        body.active = true;
        Ok(())
    }

    fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }
        self.integrate(dt);
        self.resolve_contacts();
    }

    fn state(&self, handle: BodyHandle) -> Option<BodyState> {
        self.body(handle)
            .ok()
            .filter(|b| b.active)
            .map(|b| b.state)
    }

    fn set_pose(
        &mut self,
        handle: BodyHandle,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), WorldError> {
        let body = self.body_mut(handle)?;
        body.state.position = position;
        body.state.rotation = rotation.normalize();
        Ok(())
    }

    fn set_velocity(
        &mut self,
        handle: BodyHandle,
        linvel: Vec3,
        angvel: Vec3,
    ) -> Result<(), WorldError> {
        let body = self.body_mut(handle)?;
        body.state.linvel = linvel;
        body.state.angvel = angvel;
        Ok(())
    }

    fn set_damping(
        &mut self,
        handle: BodyHandle,
        linear: f32,
        angular: f32,
    ) -> Result<(), WorldError> {
        let body = self.body_mut(handle)?;
        body.linear_damping = linear.clamp(0.0, 1.0);
        body.angular_damping = angular.clamp(0.0, 1.0);
        Ok(())
    }

    fn apply_force(&mut self, handle: BodyHandle, force: Vec3) -> Result<(), WorldError> {
        self.body_mut(handle)?.force += force;
        Ok(())
    }

    fn apply_torque(&mut self, handle: BodyHandle, torque: Vec3) -> Result<(), WorldError> {
        self.body_mut(handle)?.torque += torque;
        Ok(())
    }
}
