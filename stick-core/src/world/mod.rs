//! The host world as seen by the engine.
//!
//! The engine never owns world data. It reads and writes cells through
//! [`Dimension`], stages moves through a [`StructureStore`] and reaches both
//! through a [`World`].

mod block;
pub mod memory;
mod registry;

pub use block::{Block, BlockCell, BlockPermutation, HeightRange, StateList, StateValue};
pub use registry::{BlockType, BlockTypeRegistry};

use stick_utils::math::Vector3;
use stick_utils::{BlockPos, DimensionId};
use uuid::Uuid;

use crate::error::{StructureError, WorldError};

/// Identifies a player.
pub type PlayerId = Uuid;

/// One voxel space with its own coordinates and height bounds.
pub trait Dimension {
    /// The dimension identifier.
    fn id(&self) -> &DimensionId;

    /// Vertical bounds of the dimension.
    fn height_range(&self) -> HeightRange;

    /// Queries the block at `pos`.
    ///
    /// Fails with [`WorldError::Unloaded`] or [`WorldError::OutOfHeight`] when
    /// the cell cannot be queried at all.
    fn get_block(&self, pos: BlockPos) -> Result<Block, WorldError>;

    /// Replaces the permutation at `pos`. States must belong to the type.
    fn set_permutation(&mut self, pos: BlockPos, permutation: BlockPermutation) -> Result<(), WorldError>;

    /// Sets the liquid flag at `pos`. Blocks that cannot hold liquid ignore this.
    fn set_waterlogged(&mut self, pos: BlockPos, waterlogged: bool) -> Result<(), WorldError>;

    /// Replaces the block at `pos` with the default permutation of `type_id`.
    ///
    /// The identifier is validated before anything is written.
    fn set_type(&mut self, pos: BlockPos, type_id: &str) -> Result<(), WorldError>;

    /// Breaks the block at `pos` as if it was mined, leaving the empty type.
    fn destroy_block(&mut self, pos: BlockPos) -> Result<(), WorldError>;

    /// Captures the cell at `pos`.
    fn capture(&self, pos: BlockPos) -> Result<BlockCell, WorldError> {
        self.get_block(pos).map(|block| block.cell())
    }

    /// Writes a captured cell to `pos`.
    fn restore(&mut self, pos: BlockPos, cell: &BlockCell) -> Result<(), WorldError>;
}

/// How long a structure lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Kept in memory, gone after a restart.
    Memory,
    /// Saved with the world.
    World,
}

/// Named snapshot structures that can be captured from and placed into a dimension.
pub trait StructureStore {
    /// Whether a structure named `name` exists.
    fn contains(&self, name: &str) -> bool;

    /// Creates a structure of `size` cells that places nothing until filled.
    fn create_empty(&mut self, name: &str, size: Vector3<i32>, mode: SaveMode) -> Result<(), StructureError>;

    /// Sets one cell of an existing structure.
    fn set_block(&mut self, name: &str, offset: BlockPos, cell: BlockCell) -> Result<(), StructureError>;

    /// Captures the box between `from` and `to` (inclusive) into a new structure.
    fn create_from_world(
        &mut self,
        name: &str,
        dimension: &dyn Dimension,
        from: BlockPos,
        to: BlockPos,
        mode: SaveMode,
    ) -> Result<(), StructureError>;

    /// Places the structure with its minimum corner at `at`.
    ///
    /// Either every cell is written or none is.
    fn place(&self, name: &str, dimension: &mut dyn Dimension, at: BlockPos) -> Result<(), StructureError>;

    /// Deletes the structure. Returns false if it did not exist.
    fn delete(&mut self, name: &str) -> bool;
}

/// Simultaneous access to one dimension and the structure store.
pub struct WorldAccess<'a> {
    /// The dimension.
    pub dimension: &'a mut dyn Dimension,
    /// The structure store.
    pub structures: &'a mut dyn StructureStore,
}

/// Everything the engine needs from the host.
pub trait World {
    /// Borrows a dimension together with the structure store.
    fn access(&mut self, dimension: &DimensionId) -> Option<WorldAccess<'_>>;

    /// Adds one item to the player's inventory. Returns false if it did not fit.
    fn give_item(&mut self, player: PlayerId, item_id: &str) -> bool;
}
