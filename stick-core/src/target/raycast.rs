//! Fixed-step ray marching through the block grid.
//!
//! The ray is sampled every `step_size` blocks, with the last sample landing
//! exactly on `max_distance`. Samples are truncated toward zero to a cell, so
//! cells straddling zero on negative axes are wider than the rest. Consecutive
//! samples in the same cell query it once.
//!
//! A ray that leaves the queryable world stops there and reports the last
//! cell it could see, instead of nothing.

use stick_utils::math::Vector3;
use stick_utils::{BlockPos, ResourceLocation};

use super::Rotation;
use crate::world::{Block, Dimension};

/// The outcome of a raycast that saw at least one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RaycastHit {
    /// The resolved block.
    pub block: Block,
    /// True if the ray stopped on a non-empty block, false if this is the
    /// last cell seen before the ray ran out of distance or world.
    pub solid: bool,
    /// Distance along the ray of the sample that resolved the block.
    pub distance: f64,
}

/// The cell address of a point, truncating every component toward zero.
#[must_use]
pub fn cell_of(point: Vector3<f64>) -> BlockPos {
    BlockPos::new(point.x as i32, point.y as i32, point.z as i32)
}

/// Marches from `origin` along `rotation` and returns the first block that is
/// not `empty`.
///
/// Returns `None` only if not a single cell along the ray could be queried.
#[must_use]
pub fn raycast(
    dimension: &dyn Dimension,
    origin: Vector3<f64>,
    rotation: Rotation,
    max_distance: f64,
    step_size: f64,
    empty: &ResourceLocation,
) -> Option<RaycastHit> {
    if !(step_size > 0.0 && max_distance >= 0.0) {
        return None;
    }

    let direction = rotation.direction();
    let max_steps = (max_distance / step_size).ceil() as u64;

    let mut last_valid: Option<RaycastHit> = None;
    let mut previous: Option<BlockPos> = None;

    for step in 0..=max_steps {
        let distance = if step == max_steps {
            max_distance
        } else {
            step as f64 * step_size
        };
        let cell = cell_of(origin + direction * distance);
        if previous == Some(cell) {
            continue;
        }

        let block = match dimension.get_block(cell) {
            Ok(block) => block,
            Err(err) => {
                log::trace!("Raycast stopped at {cell}: {err}");
                return last_valid;
            }
        };
        previous = Some(cell);

        if !block.is(empty) {
            log::trace!("Raycast hit {} at {cell} after {distance:.2}", block.type_id());
            return Some(RaycastHit {
                block,
                solid: true,
                distance,
            });
        }
        last_valid = Some(RaycastHit {
            block,
            solid: false,
            distance,
        });
    }

    last_valid
}
