/// Identifier for a branch in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::branches`, and is only meaningful within
/// the lifetime of a given `Tree` instance. Parent ids always point at an
/// earlier slot of the same arena.
pub type BranchId = usize;

/// Length of one nominal display refresh in seconds.
///
/// Per-frame velocities (petals, clouds, shooting stars) are expressed in
/// units per nominal frame and scaled by `dt / NOMINAL_FRAME_SECS`.
pub const NOMINAL_FRAME_SECS: f32 = 1.0 / 60.0;
