//! # Component System
//!
//! Components are pure data containers with no behavior.
//! They must be plain old data so pools can store them as raw bytes and
//! hand them back through a checked cast.

use bytemuck::{Pod, Zeroable};

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Pod`: Plain old data, every byte pattern is a valid value
/// - `Zeroable`: Vacated pool slots are zero-filled
/// - `Default`: Value used when a component is assigned without data
///
/// Tags are not part of the type: they are assigned by the registry the
/// first time a type is used.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Copy, Default, Pod, Zeroable)]
/// #[repr(C)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     const NAME: &'static str = "Health";
/// }
/// ```
pub trait Component: Copy + Pod + Zeroable + Default + Send + Sync + 'static {
    /// Stable name, used by the factory and by scene documents.
    const NAME: &'static str;
}

/// 2D vector used by the built-in components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vec2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// The one vector.
    pub const ONE: Self = Self { x: 1.0, y: 1.0 };

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the squared length.
    #[inline]
    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }
}

/// Position, scale and rotation of an entity in world space.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Transform {
    /// World position.
    pub position: Vec2,
    /// Width and height.
    pub scale: Vec2,
    /// Rotation in radians.
    pub angle: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            angle: 0.0,
        }
    }
}

impl Component for Transform {
    const NAME: &'static str = "Transform";
}

impl Transform {
    /// Creates a unit-scale transform at `position`.
    #[inline]
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::default()
        }
    }

    /// Moves the transform by `delta`.
    #[inline]
    pub fn translate(&mut self, delta: Vec2) {
        self.position.x += delta.x;
        self.position.y += delta.y;
    }
}

/// Body simulated by the physics step.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RigidBody {
    /// Linear velocity in world units per second.
    pub velocity: Vec2,
    /// Force accumulated this frame.
    pub force: Vec2,
    /// Mass in kilograms. Zero means immovable.
    pub mass: f32,
    /// Linear damping per second.
    pub drag: f32,
    /// One of [`RigidBody::STATIC`], [`RigidBody::DYNAMIC`], [`RigidBody::KINEMATIC`].
    pub body_type: u32,
    /// Non-zero while the body participates in the simulation.
    pub awake: u32,
}

impl RigidBody {
    /// Never moves.
    pub const STATIC: u32 = 0;
    /// Moved by forces.
    pub const DYNAMIC: u32 = 1;
    /// Moved by velocity only.
    pub const KINEMATIC: u32 = 2;

    /// Creates an awake dynamic body.
    #[inline]
    #[must_use]
    pub fn dynamic(mass: f32) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }

    /// Adds a force for this frame.
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.force.x += force.x;
        self.force.y += force.y;
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            mass: 1.0,
            drag: 0.0,
            body_type: Self::DYNAMIC,
            awake: 1,
        }
    }
}

impl Component for RigidBody {
    const NAME: &'static str = "RigidBody";
}

/// Collision shape attached to an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Collider {
    /// Offset from the transform position.
    pub offset: Vec2,
    /// Half width and height for boxes; `x` is the radius for circles.
    pub half_extents: Vec2,
    /// Zero for an axis-aligned box, one for a circle.
    pub shape: u32,
    /// Non-zero if the collider only reports overlaps.
    pub trigger: u32,
}

impl Component for Collider {
    const NAME: &'static str = "Collider";
}
