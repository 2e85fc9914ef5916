//! The numbers behind flick-to-dismiss.

/// Constant downward acceleration applied during free-fall dismissal,
/// units/s². Not meant to be physically honest — just fast enough that a
/// flicked panel feels like it is falling.
pub const FALL_ACCELERATION: f32 = 9000.0;

/// Release velocity (units/s, downward) above which a drag turns into a
/// free-fall dismissal instead of snapping back.
pub const FLICK_VELOCITY_THRESHOLD: f32 = 50.0;

/// Resistance factor for drags against the dismiss direction.
pub const ELASTICITY: f32 = 3.0;

/// Upper bound on a single integration step, seconds. A stalled frame
/// (debugger, window drag) otherwise produces one wild step.
pub(crate) const MAX_FRAME_DT: f32 = 0.1;

/// One semi-implicit Euler step: velocity first, then position from the new
/// velocity. Returns `(velocity, offset)` after `dt` seconds.
pub fn fall_step(velocity: f32, offset: f32, dt: f32) -> (f32, f32) {
    let velocity = velocity + dt * FALL_ACCELERATION;
    (velocity, offset + velocity * dt)
}

/// Map the accumulated drag offset to the visual offset.
///
/// Downward (non-negative) offsets track linearly: the panel follows the
/// finger toward dismissal. Upward offsets are rubber-banded: the fraction
/// of half the screen width dragged is damped by `p / (1 + p * ELASTICITY)`
/// and scaled back, so the panel resists motion away from dismissal.
pub fn elastic_visual_offset(offset: f32, screen_width: f32) -> f32 {
    if offset >= 0.0 {
        return offset;
    }
    let half = screen_width / 2.0;
    if half <= f32::EPSILON {
        return offset;
    }
    let pct = offset.abs() / half;
    let damped = pct / (1.0 + pct * ELASTICITY);
    -(damped * half)
}
