//! Stateless physics helpers
//!
//! Integration, toroidal wrapping, speed clamping and circle-circle collision
//! response. Everything operates on [`Body`] so every entity kind shares it.

use glam::Vec2;

use super::entity::Body;
use crate::consts::RESTITUTION;

/// Half extents of the wrapping world (origin at the center)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub half_width: f32,
    pub half_height: f32,
}

impl WorldBounds {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    /// Whether a body of `radius` at `pos` satisfies the post-wrap invariant
    pub fn contains(&self, pos: Vec2, radius: f32) -> bool {
        pos.x.abs() <= self.half_width + radius && pos.y.abs() <= self.half_height + radius
    }
}

/// Advance position by velocity
#[inline]
pub fn integrate(body: &mut Body, dt: f32) {
    body.position += body.velocity * dt;
}

/// Wrap a body around the world edges.
///
/// The body only reappears on the far side once its trailing edge has left the
/// world, so it exits fully before it is seen again.
pub fn wrap(body: &mut Body, half_width: f32, half_height: f32) {
    body.position.x = wrap_axis(body.position.x, half_width + body.radius);
    body.position.y = wrap_axis(body.position.y, half_height + body.radius);
}

fn wrap_axis(value: f32, limit: f32) -> f32 {
    let span = 2.0 * limit;
    if value > limit {
        let wrapped = value - span;
        // Anything still outside moved more than one world per step
        if wrapped > limit {
            (wrapped + limit).rem_euclid(span) - limit
        } else {
            wrapped
        }
    } else if value < -limit {
        let wrapped = value + span;
        if wrapped < -limit {
            (wrapped + limit).rem_euclid(span) - limit
        } else {
            wrapped
        }
    } else {
        value
    }
}

/// Keep speed within `[min_speed, max_speed]`.
///
/// Nonzero speeds below `min_speed` are raised so bodies never stall; a body at
/// rest stays at rest.
pub fn clamp_velocity(body: &mut Body, min_speed: f32, max_speed: f32) {
    let speed = body.velocity.length();
    if speed <= f32::EPSILON {
        return;
    }
    if speed > max_speed {
        body.velocity *= max_speed / speed;
    } else if speed < min_speed {
        body.velocity *= min_speed / speed;
    }
}

/// Instant velocity change
#[inline]
pub fn apply_impulse(body: &mut Body, impulse: Vec2) {
    body.velocity += impulse;
}

/// Acceleration applied over `dt`
#[inline]
pub fn apply_force(body: &mut Body, force: Vec2, dt: f32) {
    body.velocity += force * dt;
}

#[inline]
pub fn distance(a: &Body, b: &Body) -> f32 {
    a.position.distance(b.position)
}

/// Unit vector from `from` toward `to` (zero when coincident)
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Strict circle overlap test; tangent circles do not collide
#[inline]
pub fn are_colliding(a: &Body, b: &Body) -> bool {
    let reach = a.radius + b.radius;
    a.position.distance_squared(b.position) < reach * reach
}

/// Separate two overlapping bodies and apply an equal-mass elastic impulse.
///
/// Returns false (and changes nothing) when the bodies are already separating.
pub fn resolve_collision(a: &mut Body, b: &mut Body) -> bool {
    let offset = b.position - a.position;
    let dist = offset.length();
    let normal = if dist > f32::EPSILON { offset / dist } else { Vec2::X };

    let relative = b.velocity - a.velocity;
    let closing = relative.dot(normal);
    if closing > 0.0 {
        return false;
    }

    let overlap = a.radius + b.radius - dist;
    if overlap > 0.0 {
        let push = normal * (overlap * 0.5);
        a.position -= push;
        b.position += push;
    }

    // j = -(1 + e) * vn / (1/ma + 1/mb), unit masses
    let j = -(1.0 + RESTITUTION) * closing * 0.5;
    a.velocity -= normal * j;
    b.velocity += normal * j;
    true
}

/// Check the body invariants after an update.
///
/// Debug builds assert; release builds repair the body in place.
pub fn enforce_invariants(body: &mut Body, bounds: WorldBounds) {
    let valid = body.position.is_finite() && body.velocity.is_finite() && body.radius > 0.0;
    debug_assert!(valid, "corrupt body state: {:?}", body);
    if !body.position.is_finite() {
        body.position = Vec2::ZERO;
    }
    if !body.velocity.is_finite() {
        body.velocity = Vec2::ZERO;
    }
    if !(body.radius > 0.0) {
        body.radius = 1.0;
    }
    if !bounds.contains(body.position, body.radius) {
        wrap(body, bounds.half_width, bounds.half_height);
        body.position.x = body
            .position
            .x
            .clamp(-bounds.half_width - body.radius, bounds.half_width + body.radius);
        body.position.y = body
            .position
            .y
            .clamp(-bounds.half_height - body.radius, bounds.half_height + body.radius);
    }
}
