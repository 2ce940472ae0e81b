//! Vertical clamping against a horizontal platform.
//!
//! Positional correction only: the object is pushed straight up until its
//! world box rests on the plane. No horizontal response and no velocities.

use super::object::SceneObject;

/// Penetration smaller than this is left alone.
pub const COLLISION_TOLERANCE: f32 = 1e-5;

/// Lifts `object` so the bottom of its world box is not below `plane_height`.
///
/// Returns the upward shift applied (0 when the object was already clear).
/// Calling it twice in a row is a no-op the second time.
pub fn resolve(object: &mut SceneObject, plane_height: f32) -> f32 {
    let min_y = object.world_bounds().min.y;
    let penetration = plane_height - min_y;
    if penetration <= COLLISION_TOLERANCE || !penetration.is_finite() {
        return 0.0;
    }

    let mut position = object.transform.position;
    position.y += penetration;
    object.transform.set_position(position);
    log::trace!("Lifted '{}' by {:.5} onto platform", object.name, penetration);
    penetration
}
