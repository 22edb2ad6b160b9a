//! Uniquely named scratch structures that clean up after themselves.

use stick_utils::BlockPos;
use uuid::Uuid;

use crate::error::StructureError;
use crate::world::{Dimension, SaveMode, StructureStore};

/// A captured copy of a box of cells, deleted from the store when dropped.
///
/// The store stays borrowed until the snapshot is dropped.
pub struct ScratchSnapshot<'a> {
    structures: &'a mut dyn StructureStore,
    name: String,
}

impl<'a> ScratchSnapshot<'a> {
    /// Captures the box between `from` and `to` into a fresh memory-only structure.
    pub fn capture(
        structures: &'a mut dyn StructureStore,
        dimension: &dyn Dimension,
        from: BlockPos,
        to: BlockPos,
        prefix: &str,
    ) -> Result<Self, StructureError> {
        let name = format!("{prefix}block_{}", Uuid::new_v4().simple());
        structures.create_from_world(&name, dimension, from, to, SaveMode::Memory)?;
        log::trace!("Captured {from}..{to} into {name}");
        Ok(Self { structures, name })
    }

    /// The structure name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Places the captured cells with their minimum corner at `at`.
    pub fn place(&self, dimension: &mut dyn Dimension, at: BlockPos) -> Result<(), StructureError> {
        self.structures.place(&self.name, dimension, at)
    }

    /// The store the snapshot lives in, for placing other structures meanwhile.
    #[must_use]
    pub fn structures(&self) -> &dyn StructureStore {
        &*self.structures
    }
}

impl Drop for ScratchSnapshot<'_> {
    fn drop(&mut self) {
        if self.structures.delete(&self.name) {
            log::trace!("Deleted scratch structure {}", self.name);
        } else {
            log::warn!("Scratch structure {} was already gone", self.name);
        }
    }
}
