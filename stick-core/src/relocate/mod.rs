//! Moving and copying blocks through snapshot structures.
//!
//! Relocation is two-phase. [`Relocator::propose`] checks the destination and
//! tells whether it has to be confirmed. The player answers, possibly many
//! ticks later, and [`Relocator::commit`] checks everything again before the
//! first write:
//!
//! 1. capture the source into a scratch structure
//! 2. place the shared air structure over the source (move only)
//! 3. place the scratch structure at the target
//! 4. delete the scratch structure
//!
//! From step 1 on the source content is always in the source cell, the
//! scratch structure or the target cell. If step 3 fails the scratch structure
//! is placed back onto the source before it is deleted.

mod scratch;

pub use scratch::ScratchSnapshot;

use stick_utils::math::Vector3;
use stick_utils::{BlockPos, DimensionId, ResourceLocation};

use crate::error::{RelocateError, StructureError};
use crate::world::{
    BlockCell, BlockPermutation, Dimension, SaveMode, StructureStore, WorldAccess,
};

/// How typed coordinates are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMode {
    /// The numbers are the destination.
    Absolute,
    /// The numbers are added to the source position.
    Relative,
}

/// Parses three coordinate fields into a destination cell.
///
/// Blank fields count as zero. Fractional results are floored.
pub fn parse_target(source: BlockPos, fields: [&str; 3], mode: OffsetMode) -> Result<BlockPos, RelocateError> {
    let mut numbers = [0.0_f64; 3];
    for (number, field) in numbers.iter_mut().zip(fields) {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            continue;
        }
        *number = trimmed
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| RelocateError::NotANumber(field.to_owned()))?;
    }

    let base = match mode {
        OffsetMode::Absolute => Vector3::splat(0.0),
        OffsetMode::Relative => source.0.map(f64::from),
    };
    Ok(BlockPos::containing(
        base + Vector3::new(numbers[0], numbers[1], numbers[2]),
    ))
}

/// Whether the source keeps its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelocateMode {
    /// The source is emptied.
    #[default]
    Move,
    /// The source is left as it is.
    Copy,
}

/// Options of one relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelocateOptions {
    /// Move or copy.
    pub mode: RelocateMode,
    /// Also carry the cell above the source, e.g. the upper half of a door.
    pub auxiliary_above: bool,
}

impl RelocateOptions {
    const fn height(self) -> i32 {
        if self.auxiliary_above { 2 } else { 1 }
    }
}

/// A validated relocation waiting to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    /// Dimension of both ends.
    pub dimension: DimensionId,
    /// Lowest source cell.
    pub source: BlockPos,
    /// Lowest target cell.
    pub target: BlockPos,
    /// Types of the source cells when the plan was made, bottom up.
    pub source_types: Vec<ResourceLocation>,
    /// Options the plan was made with.
    pub options: RelocateOptions,
}

/// The cells of a column of `height` blocks starting at `base`.
///
/// Fails when the top of the column does not fit in `i32`.
fn column(base: BlockPos, height: i32) -> Result<impl Iterator<Item = BlockPos>, RelocateError> {
    if base.checked_offset(0, height - 1, 0).is_none() {
        return Err(RelocateError::InvalidPosition(base));
    }
    Ok((0..height).map(move |dy| base.offset(0, dy, 0)))
}

/// The result of [`Relocator::propose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// Every target cell is empty.
    Ready(RelocationPlan),
    /// A target cell is occupied and would be overwritten.
    NeedsConfirmation(RelocationPlan),
}

impl Proposal {
    /// The plan, regardless of confirmation.
    #[must_use]
    pub const fn plan(&self) -> &RelocationPlan {
        match self {
            Self::Ready(plan) | Self::NeedsConfirmation(plan) => plan,
        }
    }
}

/// Runs relocations with a fixed structure prefix and empty block type.
#[derive(Debug, Clone)]
pub struct Relocator {
    prefix: String,
    empty: ResourceLocation,
}

impl Relocator {
    /// Creates a relocator whose structures are named `<prefix>...`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, empty: ResourceLocation) -> Self {
        Self {
            prefix: prefix.into(),
            empty,
        }
    }

    /// Name of the shared all-empty structure for a column of `height` cells.
    #[must_use]
    pub fn air_structure_name(&self, height: i32) -> String {
        format!("{}air_1x{height}x1", self.prefix)
    }

    /// Validates a relocation from `source` to `target` without writing anything.
    pub fn propose(
        &self,
        dimension: &dyn Dimension,
        source: BlockPos,
        target: BlockPos,
        options: RelocateOptions,
    ) -> Result<Proposal, RelocateError> {
        let mut plan = RelocationPlan {
            dimension: dimension.id().clone(),
            source,
            target,
            source_types: Vec::new(),
            options,
        };
        plan.source_types = column(source, options.height())?
            .map(|pos| {
                dimension
                    .get_block(pos)
                    .map(|block| block.type_id().clone())
                    .map_err(|_| RelocateError::StaleSource(pos))
            })
            .collect::<Result<_, _>>()?;

        if self.target_occupied(dimension, &plan)? {
            Ok(Proposal::NeedsConfirmation(plan))
        } else {
            Ok(Proposal::Ready(plan))
        }
    }

    /// Checks every target cell. Returns whether any of them is occupied.
    fn target_occupied(&self, dimension: &dyn Dimension, plan: &RelocationPlan) -> Result<bool, RelocateError> {
        let height = dimension.height_range();
        let mut occupied = false;
        for pos in column(plan.target, plan.options.height())? {
            if !height.contains(pos.y()) {
                log::info!("Rejected move to {pos}, outside the height range");
                return Err(RelocateError::InvalidPosition(plan.target));
            }
            match dimension.get_block(pos) {
                Ok(block) => occupied |= !block.is(&self.empty),
                Err(err) => {
                    log::info!("Rejected move to {pos}: {err}");
                    return Err(RelocateError::InvalidPosition(plan.target));
                }
            }
        }
        Ok(occupied)
    }

    /// Re-validates `plan` against the current world and carries it out.
    ///
    /// `confirmed` must be true to overwrite occupied target cells.
    pub fn commit(&self, access: WorldAccess<'_>, plan: &RelocationPlan, confirmed: bool) -> Result<(), RelocateError> {
        let WorldAccess {
            dimension,
            structures,
        } = access;

        if dimension.id() != &plan.dimension {
            return Err(RelocateError::WrongDimension {
                expected: plan.dimension.clone(),
                actual: dimension.id().clone(),
            });
        }
        for (pos, expected) in column(plan.source, plan.options.height())?.zip(&plan.source_types) {
            match dimension.get_block(pos) {
                Ok(block) if block.is(expected) => {}
                _ => return Err(RelocateError::StaleSource(pos)),
            }
        }
        if self.target_occupied(&*dimension, plan)? && !confirmed {
            return Err(RelocateError::Occupied(plan.target));
        }

        let air = match plan.options.mode {
            RelocateMode::Move => Some(self.ensure_air_structure(structures, plan.options.height())?),
            RelocateMode::Copy => None,
        };
        let top = plan
            .source
            .checked_offset(0, plan.options.height() - 1, 0)
            .ok_or(RelocateError::InvalidPosition(plan.source))?;

        let scratch = ScratchSnapshot::capture(structures, &*dimension, plan.source, top, &self.prefix)?;

        if let Some(air) = &air
            && let Err(err) = scratch.structures().place(air, dimension, plan.source)
        {
            log::warn!("Clearing {} failed, source left untouched: {err}", plan.source);
            return Err(err.into());
        }

        if let Err(err) = scratch.place(dimension, plan.target) {
            if air.is_some() {
                match scratch.place(dimension, plan.source) {
                    Ok(()) => log::warn!("Placing at {} failed, restored the source: {err}", plan.target),
                    Err(restore) => log::error!(
                        "Placing at {} failed and restoring {} failed too: {restore}",
                        plan.target,
                        plan.source
                    ),
                }
            }
            return Err(err.into());
        }

        log::debug!(
            "{:?} {} from {} to {}",
            plan.options.mode,
            plan.source_types.first().map_or_else(String::new, ToString::to_string),
            plan.source,
            plan.target
        );
        Ok(())
    }

    /// Creates the shared air structure for `height` cells unless it exists.
    fn ensure_air_structure(&self, structures: &mut dyn StructureStore, height: i32) -> Result<String, StructureError> {
        let name = self.air_structure_name(height);
        if structures.contains(&name) {
            return Ok(name);
        }

        structures.create_empty(&name, Vector3::new(1, height, 1), SaveMode::World)?;
        let air = BlockCell::new(BlockPermutation::simple(self.empty.clone()));
        for dy in 0..height {
            if let Err(err) = structures.set_block(&name, BlockPos::new(0, dy, 0), air.clone()) {
                structures.delete(&name);
                return Err(err);
            }
        }
        log::debug!("Created air structure {name}");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorldError;
    use crate::world::memory::tests::dimension;
    use crate::world::memory::{MemoryDimension, MemoryStructureStore};
    use crate::world::{Block, HeightRange, StateValue};

    fn relocator() -> Relocator {
        Relocator::new("ds:", ResourceLocation::vanilla_static("air"))
    }

    fn access<'a>(dim: &'a mut dyn Dimension, store: &'a mut MemoryStructureStore) -> WorldAccess<'a> {
        WorldAccess {
            dimension: dim,
            structures: store,
        }
    }

    fn grown_wheat(dim: &mut MemoryDimension, pos: BlockPos) -> Block {
        dim.set_type(pos, "wheat").unwrap();
        let grown = dim
            .get_block(pos)
            .unwrap()
            .permutation
            .with_state("growth", StateValue::Int(5))
            .unwrap();
        dim.set_permutation(pos, grown).unwrap();
        dim.get_block(pos).unwrap()
    }

    fn is_air(dim: &MemoryDimension, pos: BlockPos) -> bool {
        dim.get_block(pos).unwrap().is(&ResourceLocation::vanilla_static("air"))
    }

    fn scratch_left(store: &MemoryStructureStore) -> bool {
        store.names().iter().any(|name| name.starts_with("ds:block_"))
    }

    #[test]
    fn test_parse_target() {
        let source = BlockPos::new(10, 64, -3);
        assert_eq!(
            parse_target(source, ["1", " 70 ", "-2.5"], OffsetMode::Absolute),
            Ok(BlockPos::new(1, 70, -3))
        );
        assert_eq!(
            parse_target(source, ["", "-1", "  "], OffsetMode::Relative),
            Ok(BlockPos::new(10, 63, -3))
        );
        assert_eq!(
            parse_target(source, ["1", "up", "0"], OffsetMode::Relative),
            Err(RelocateError::NotANumber("up".to_owned()))
        );
        assert!(parse_target(source, ["inf", "0", "0"], OffsetMode::Absolute).is_err());
        assert!(parse_target(source, ["NaN", "0", "0"], OffsetMode::Absolute).is_err());
    }

    #[test]
    fn test_move_to_empty_target() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(3, 2, 1);
        let original = grown_wheat(&mut dim, source);

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, target, RelocateOptions::default())
            .unwrap();
        assert!(matches!(proposal, Proposal::Ready(_)));
        relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap();

        assert!(is_air(&dim, source));
        assert_eq!(dim.get_block(target).unwrap().permutation, original.permutation);
        assert!(!scratch_left(&store));
        assert_eq!(store.mode("ds:air_1x1x1"), Some(SaveMode::World));
    }

    #[test]
    fn test_out_of_height_target_is_rejected() {
        let mut dim = dimension();
        let source = BlockPos::new(0, 0, 0);
        let original = grown_wheat(&mut dim, source);

        let err = relocator()
            .propose(&dim, source, BlockPos::new(0, 400, 0), RelocateOptions::default())
            .unwrap_err();
        assert_eq!(err, RelocateError::InvalidPosition(BlockPos::new(0, 400, 0)));
        assert_eq!(dim.get_block(source).unwrap(), original);
    }

    #[test]
    fn test_unloaded_target_is_rejected() {
        let mut dim = dimension().with_loaded_area(BlockPos::new(-8, 0, -8), BlockPos::new(8, 0, 8));
        let source = BlockPos::new(0, 0, 0);
        grown_wheat(&mut dim, source);

        let err = relocator()
            .propose(&dim, source, BlockPos::new(20, 0, 0), RelocateOptions::default())
            .unwrap_err();
        assert!(matches!(err, RelocateError::InvalidPosition(_)));
    }

    #[test]
    fn test_occupied_target_denied() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(1, 0, 0);
        let original = grown_wheat(&mut dim, source);
        dim.set_type(target, "stone").unwrap();

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, target, RelocateOptions::default())
            .unwrap();
        assert!(matches!(proposal, Proposal::NeedsConfirmation(_)));

        let err = relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap_err();
        assert_eq!(err, RelocateError::Occupied(target));
        assert_eq!(dim.get_block(source).unwrap(), original);
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_occupied_target_confirmed() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(1, 0, 0);
        let original = grown_wheat(&mut dim, source);
        dim.set_type(target, "stone").unwrap();

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, target, RelocateOptions::default())
            .unwrap();
        relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), true)
            .unwrap();
        assert_eq!(dim.get_block(target).unwrap().permutation, original.permutation);
        assert!(is_air(&dim, source));
    }

    #[test]
    fn test_source_changed_before_commit() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        grown_wheat(&mut dim, source);

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, BlockPos::new(2, 0, 0), RelocateOptions::default())
            .unwrap();
        dim.set_type(source, "dirt").unwrap();

        let err = relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), true)
            .unwrap_err();
        assert_eq!(err, RelocateError::StaleSource(source));
        assert!(is_air(&dim, BlockPos::new(2, 0, 0)));
    }

    #[test]
    fn test_target_filled_before_commit_needs_confirmation() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(2, 0, 0);
        grown_wheat(&mut dim, source);

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, target, RelocateOptions::default())
            .unwrap();
        dim.set_type(target, "dirt").unwrap();

        let err = relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap_err();
        assert_eq!(err, RelocateError::Occupied(target));
    }

    #[test]
    fn test_copy_keeps_source() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(0, 0, 5);
        let original = grown_wheat(&mut dim, source);

        let relocator = relocator();
        let options = RelocateOptions {
            mode: RelocateMode::Copy,
            auxiliary_above: false,
        };
        let proposal = relocator.propose(&dim, source, target, options).unwrap();
        relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap();

        assert_eq!(dim.get_block(source).unwrap(), original);
        assert_eq!(dim.get_block(target).unwrap().permutation, original.permutation);
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_auxiliary_cell_moves_along() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(4, 0, 0);
        dim.set_type(source, "wooden_door").unwrap();
        dim.set_type(source.above(), "wooden_door").unwrap();
        let upper = dim
            .get_block(source.above())
            .unwrap()
            .permutation
            .with_state("upper_block_bit", true.into())
            .unwrap();
        dim.set_permutation(source.above(), upper.clone()).unwrap();

        let relocator = relocator();
        let options = RelocateOptions {
            mode: RelocateMode::Move,
            auxiliary_above: true,
        };
        let proposal = relocator.propose(&dim, source, target, options).unwrap();
        assert_eq!(proposal.plan().source_types.len(), 2);
        relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap();

        assert!(is_air(&dim, source));
        assert!(is_air(&dim, source.above()));
        assert_eq!(dim.get_block(target.above()).unwrap().permutation, upper);
        assert!(store.contains("ds:air_1x2x1"));
        assert!(!scratch_left(&store));
    }

    /// A dimension whose writes fail at one cell, to exercise recovery.
    struct FailingAt {
        inner: MemoryDimension,
        poisoned: BlockPos,
    }

    impl Dimension for FailingAt {
        fn id(&self) -> &DimensionId {
            self.inner.id()
        }

        fn height_range(&self) -> HeightRange {
            self.inner.height_range()
        }

        fn get_block(&self, pos: BlockPos) -> Result<Block, WorldError> {
            self.inner.get_block(pos)
        }

        fn set_permutation(&mut self, pos: BlockPos, permutation: BlockPermutation) -> Result<(), WorldError> {
            self.inner.set_permutation(pos, permutation)
        }

        fn set_waterlogged(&mut self, pos: BlockPos, waterlogged: bool) -> Result<(), WorldError> {
            self.inner.set_waterlogged(pos, waterlogged)
        }

        fn set_type(&mut self, pos: BlockPos, type_id: &str) -> Result<(), WorldError> {
            self.inner.set_type(pos, type_id)
        }

        fn destroy_block(&mut self, pos: BlockPos) -> Result<(), WorldError> {
            self.inner.destroy_block(pos)
        }

        fn restore(&mut self, pos: BlockPos, cell: &BlockCell) -> Result<(), WorldError> {
            if pos == self.poisoned {
                return Err(WorldError::Unloaded(pos));
            }
            self.inner.restore(pos, cell)
        }
    }

    #[test]
    fn test_failed_placement_restores_source() {
        let mut inner = dimension();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(6, 0, 0);
        let original = grown_wheat(&mut inner, source);
        let mut dim = FailingAt {
            inner,
            poisoned: target,
        };
        let mut store = MemoryStructureStore::new();

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, target, RelocateOptions::default())
            .unwrap();
        let err = relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap_err();

        assert!(matches!(err, RelocateError::Snapshot(_)));
        assert_eq!(dim.get_block(source).unwrap(), original);
        assert!(!scratch_left(&store));
    }

    #[test]
    fn test_failed_clear_keeps_source() {
        let mut inner = dimension();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(6, 0, 0);
        let original = grown_wheat(&mut inner, source);
        let mut dim = FailingAt {
            inner,
            poisoned: source,
        };
        let mut store = MemoryStructureStore::new();

        let relocator = relocator();
        let proposal = relocator
            .propose(&dim, source, target, RelocateOptions::default())
            .unwrap();
        let err = relocator
            .commit(access(&mut dim, &mut store), proposal.plan(), false)
            .unwrap_err();

        assert!(matches!(err, RelocateError::Snapshot(_)));
        assert_eq!(dim.get_block(source).unwrap(), original);
        assert!(is_air(&dim.inner, target));
        assert!(!scratch_left(&store));
    }

    #[test]
    fn test_column_past_i32_max_is_rejected() {
        let dim = dimension();
        let source = BlockPos::new(0, 0, 0);
        let target = BlockPos::new(0, i32::MAX, 0);
        let options = RelocateOptions {
            mode: RelocateMode::Move,
            auxiliary_above: true,
        };

        assert_eq!(
            relocator().propose(&dim, source, target, options),
            Err(RelocateError::InvalidPosition(target))
        );
        assert_eq!(
            relocator().propose(&dim, target, source, options),
            Err(RelocateError::InvalidPosition(target))
        );
    }
}
