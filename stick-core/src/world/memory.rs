//! In-memory host implementation.
//!
//! Backs the console host and the tests:
//! - Cells start as the empty type unless written
//! - An optional loaded box makes everything outside it fail queries
//! - Structures live in a plain map regardless of their save mode

use std::sync::Arc;

use rustc_hash::FxHashMap;
use stick_utils::math::Vector3;
use stick_utils::{BlockPos, DimensionId, ResourceLocation};

use super::{
    Block, BlockCell, BlockPermutation, BlockTypeRegistry, Dimension, HeightRange, PlayerId,
    SaveMode, StructureStore, World, WorldAccess,
};
use crate::error::{StructureError, WorldError};

/// A dimension held entirely in memory.
pub struct MemoryDimension {
    id: DimensionId,
    height: HeightRange,
    /// Horizontal box of loaded cells, `None` when everything is loaded.
    loaded: Option<(BlockPos, BlockPos)>,
    cells: FxHashMap<BlockPos, BlockCell>,
    power: FxHashMap<BlockPos, u8>,
    registry: Arc<BlockTypeRegistry>,
    empty: ResourceLocation,
    /// Types of blocks broken through [`Dimension::destroy_block`], in order.
    drops: Vec<(BlockPos, ResourceLocation)>,
}

impl MemoryDimension {
    /// Creates an all-empty dimension where every column is loaded.
    #[must_use]
    pub fn new(id: DimensionId, height: HeightRange, registry: Arc<BlockTypeRegistry>) -> Self {
        Self {
            id,
            height,
            loaded: None,
            cells: FxHashMap::default(),
            power: FxHashMap::default(),
            registry,
            empty: ResourceLocation::vanilla_static("air"),
            drops: Vec::new(),
        }
    }

    /// Restricts loaded cells to the horizontal box spanned by `a` and `b`.
    #[must_use]
    pub fn with_loaded_area(mut self, a: BlockPos, b: BlockPos) -> Self {
        self.loaded = Some(BlockPos::bounds(a, b));
        self
    }

    /// Sets the type that empty cells hold.
    #[must_use]
    pub fn with_empty_block(mut self, empty: ResourceLocation) -> Self {
        self.empty = empty;
        self
    }

    /// Fills the box between `a` and `b` with the default permutation of `type_id`.
    pub fn fill(&mut self, a: BlockPos, b: BlockPos, type_id: &str) -> Result<(), WorldError> {
        let permutation = self.default_permutation(type_id)?;
        let (min, max) = BlockPos::bounds(a, b);
        for x in min.x()..=max.x() {
            for y in min.y()..=max.y() {
                for z in min.z()..=max.z() {
                    let pos = BlockPos::new(x, y, z);
                    self.check(pos)?;
                    self.cells.insert(pos, BlockCell::new(permutation.clone()));
                }
            }
        }
        Ok(())
    }

    /// Sets the redstone power reported at `pos`.
    pub fn set_power(&mut self, pos: BlockPos, power: u8) {
        self.power.insert(pos, power.min(15));
    }

    /// Blocks broken so far.
    #[must_use]
    pub fn drops(&self) -> &[(BlockPos, ResourceLocation)] {
        &self.drops
    }

    fn check(&self, pos: BlockPos) -> Result<(), WorldError> {
        if !self.height.contains(pos.y()) {
            return Err(WorldError::OutOfHeight(pos));
        }
        if let Some((min, max)) = self.loaded
            && (pos.x() < min.x() || pos.x() > max.x() || pos.z() < min.z() || pos.z() > max.z())
        {
            return Err(WorldError::Unloaded(pos));
        }
        Ok(())
    }

    fn default_permutation(&self, type_id: &str) -> Result<BlockPermutation, WorldError> {
        let unknown = || WorldError::UnknownBlockType(type_id.to_owned());
        let id: ResourceLocation = type_id.parse().map_err(|_| unknown())?;
        self.registry
            .get(&id)
            .map(super::BlockType::default_permutation)
            .ok_or_else(unknown)
    }

    fn validate(&self, permutation: &BlockPermutation) -> Result<(), WorldError> {
        let Some(block_type) = self.registry.get(permutation.type_id()) else {
            return Err(WorldError::UnknownBlockType(permutation.type_id().to_string()));
        };
        for (state, _) in permutation.states() {
            if !block_type.has_state(state) {
                return Err(WorldError::UnknownState {
                    block: permutation.type_id().to_string(),
                    state: state.clone(),
                });
            }
        }
        Ok(())
    }

    fn write(&mut self, pos: BlockPos, cell: BlockCell) {
        if cell.permutation.type_id() == &self.empty && !cell.waterlogged {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, cell);
        }
    }
}

impl Dimension for MemoryDimension {
    fn id(&self) -> &DimensionId {
        &self.id
    }

    fn height_range(&self) -> HeightRange {
        self.height
    }

    fn get_block(&self, pos: BlockPos) -> Result<Block, WorldError> {
        self.check(pos)?;
        let cell = self
            .cells
            .get(&pos)
            .cloned()
            .unwrap_or_else(|| BlockCell::new(BlockPermutation::simple(self.empty.clone())));
        let block_type = self.registry.get(cell.permutation.type_id());

        Ok(Block {
            dimension: self.id.clone(),
            pos,
            tags: block_type.map(|t| t.tags.clone()).unwrap_or_default(),
            can_contain_liquid: block_type.is_some_and(|t| t.waterloggable),
            waterlogged: cell.waterlogged,
            redstone_power: block_type
                .filter(|t| t.powerable)
                .map(|_| self.power.get(&pos).copied().unwrap_or(0)),
            permutation: cell.permutation,
        })
    }

    fn set_permutation(&mut self, pos: BlockPos, permutation: BlockPermutation) -> Result<(), WorldError> {
        self.check(pos)?;
        self.validate(&permutation)?;
        let waterlogged = self.cells.get(&pos).is_some_and(|cell| cell.waterlogged)
            && self
                .registry
                .get(permutation.type_id())
                .is_some_and(|t| t.waterloggable);
        self.write(
            pos,
            BlockCell {
                permutation,
                waterlogged,
            },
        );
        Ok(())
    }

    fn set_waterlogged(&mut self, pos: BlockPos, waterlogged: bool) -> Result<(), WorldError> {
        let block = self.get_block(pos)?;
        if !block.can_contain_liquid {
            log::debug!("Ignoring waterlog change for {} at {pos}", block.type_id());
            return Ok(());
        }
        self.write(
            pos,
            BlockCell {
                permutation: block.permutation,
                waterlogged,
            },
        );
        Ok(())
    }

    fn set_type(&mut self, pos: BlockPos, type_id: &str) -> Result<(), WorldError> {
        let permutation = self.default_permutation(type_id)?;
        self.check(pos)?;
        self.write(pos, BlockCell::new(permutation));
        Ok(())
    }

    fn destroy_block(&mut self, pos: BlockPos) -> Result<(), WorldError> {
        let block = self.get_block(pos)?;
        if !block.is(&self.empty) {
            self.drops.push((pos, block.type_id().clone()));
        }
        self.write(pos, BlockCell::new(BlockPermutation::simple(self.empty.clone())));
        Ok(())
    }

    fn restore(&mut self, pos: BlockPos, cell: &BlockCell) -> Result<(), WorldError> {
        self.check(pos)?;
        self.validate(&cell.permutation)?;
        self.write(pos, cell.clone());
        Ok(())
    }
}

/// A captured box of cells. `None` cells place nothing.
#[derive(Debug, Clone)]
struct Structure {
    size: Vector3<i32>,
    cells: Vec<Option<BlockCell>>,
    mode: SaveMode,
}

impl Structure {
    fn index(&self, offset: BlockPos) -> Option<usize> {
        let in_bounds = |v: i32, size: i32| (0..size).contains(&v);
        if !(in_bounds(offset.x(), self.size.x)
            && in_bounds(offset.y(), self.size.y)
            && in_bounds(offset.z(), self.size.z))
        {
            return None;
        }
        let index = offset.x() + self.size.x * (offset.y() + self.size.y * offset.z());
        usize::try_from(index).ok()
    }

    fn offsets(&self) -> impl Iterator<Item = BlockPos> + '_ {
        (0..self.size.z).flat_map(move |z| {
            (0..self.size.y).flat_map(move |y| (0..self.size.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

/// Structures held in a map.
#[derive(Default)]
pub struct MemoryStructureStore {
    structures: FxHashMap<String, Structure>,
}

impl MemoryStructureStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all structures, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.structures.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The save mode of a structure.
    #[must_use]
    pub fn mode(&self, name: &str) -> Option<SaveMode> {
        self.structures.get(name).map(|s| s.mode)
    }

    fn insert(&mut self, name: &str, structure: Structure) -> Result<(), StructureError> {
        if self.structures.contains_key(name) {
            return Err(StructureError::AlreadyExists(name.to_owned()));
        }
        self.structures.insert(name.to_owned(), structure);
        Ok(())
    }
}

impl StructureStore for MemoryStructureStore {
    fn contains(&self, name: &str) -> bool {
        self.structures.contains_key(name)
    }

    fn create_empty(&mut self, name: &str, size: Vector3<i32>, mode: SaveMode) -> Result<(), StructureError> {
        let volume = [size.x, size.y, size.z]
            .into_iter()
            .map(|v| usize::try_from(v.max(0)).unwrap_or(0))
            .product();
        self.insert(
            name,
            Structure {
                size,
                cells: vec![None; volume],
                mode,
            },
        )
    }

    fn set_block(&mut self, name: &str, offset: BlockPos, cell: BlockCell) -> Result<(), StructureError> {
        let structure = self
            .structures
            .get_mut(name)
            .ok_or_else(|| StructureError::Missing(name.to_owned()))?;
        let index = structure.index(offset).ok_or_else(|| StructureError::OutOfBounds {
            name: name.to_owned(),
            offset,
        })?;
        structure.cells[index] = Some(cell);
        Ok(())
    }

    fn create_from_world(
        &mut self,
        name: &str,
        dimension: &dyn Dimension,
        from: BlockPos,
        to: BlockPos,
        mode: SaveMode,
    ) -> Result<(), StructureError> {
        if self.contains(name) {
            return Err(StructureError::AlreadyExists(name.to_owned()));
        }
        let (min, max) = BlockPos::bounds(from, to);
        let size = Vector3::new(
            max.x() - min.x() + 1,
            max.y() - min.y() + 1,
            max.z() - min.z() + 1,
        );
        let mut structure = Structure {
            size,
            cells: Vec::new(),
            mode,
        };
        let cells = structure
            .offsets()
            .map(|offset| {
                dimension
                    .capture(min.offset(offset.x(), offset.y(), offset.z()))
                    .map(Some)
            })
            .collect::<Result<Vec<_>, _>>()?;
        structure.cells = cells;
        self.insert(name, structure)
    }

    fn place(&self, name: &str, dimension: &mut dyn Dimension, at: BlockPos) -> Result<(), StructureError> {
        let structure = self
            .structures
            .get(name)
            .ok_or_else(|| StructureError::Missing(name.to_owned()))?;

        let writes: Vec<(BlockPos, &BlockCell)> = structure
            .offsets()
            .filter_map(|offset| {
                let cell = structure.index(offset).and_then(|i| structure.cells[i].as_ref())?;
                Some((at.offset(offset.x(), offset.y(), offset.z()), cell))
            })
            .collect();

        // Validate every target first so a failure leaves the world untouched.
        for (pos, _) in &writes {
            dimension.get_block(*pos)?;
        }
        for (pos, cell) in writes {
            dimension.restore(pos, cell)?;
        }
        Ok(())
    }

    fn delete(&mut self, name: &str) -> bool {
        self.structures.remove(name).is_some()
    }
}

/// A world of in-memory dimensions.
pub struct MemoryWorld {
    dimensions: FxHashMap<DimensionId, MemoryDimension>,
    structures: MemoryStructureStore,
    inventories: FxHashMap<PlayerId, Vec<String>>,
}

impl MemoryWorld {
    /// Creates a world without dimensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimensions: FxHashMap::default(),
            structures: MemoryStructureStore::new(),
            inventories: FxHashMap::default(),
        }
    }

    /// Adds a dimension, replacing one with the same id.
    pub fn add_dimension(&mut self, dimension: MemoryDimension) {
        self.dimensions.insert(dimension.id().clone(), dimension);
    }

    /// Borrows a dimension.
    #[must_use]
    pub fn dimension(&self, id: &DimensionId) -> Option<&MemoryDimension> {
        self.dimensions.get(id)
    }

    /// Mutably borrows a dimension.
    pub fn dimension_mut(&mut self, id: &DimensionId) -> Option<&mut MemoryDimension> {
        self.dimensions.get_mut(id)
    }

    /// The structure store.
    #[must_use]
    pub const fn structures(&self) -> &MemoryStructureStore {
        &self.structures
    }

    /// Items given to a player so far.
    #[must_use]
    pub fn inventory(&self, player: PlayerId) -> &[String] {
        self.inventories.get(&player).map_or(&[], Vec::as_slice)
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl World for MemoryWorld {
    fn access(&mut self, dimension: &DimensionId) -> Option<WorldAccess<'_>> {
        let dimension = self.dimensions.get_mut(dimension)?;
        Some(WorldAccess {
            dimension,
            structures: &mut self.structures,
        })
    }

    fn give_item(&mut self, player: PlayerId, item_id: &str) -> bool {
        let inventory = self.inventories.entry(player).or_default();
        if inventory.len() >= 36 {
            return false;
        }
        inventory.push(item_id.to_owned());
        true
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn overworld() -> DimensionId {
        ResourceLocation::vanilla_static("overworld")
    }

    pub(crate) fn dimension() -> MemoryDimension {
        let registry = Arc::new(BlockTypeRegistry::vanilla().unwrap());
        MemoryDimension::new(overworld(), HeightRange { min: -64, max: 319 }, registry)
    }

    #[test]
    fn test_unwritten_cells_are_air() {
        let dim = dimension();
        let block = dim.get_block(BlockPos::new(10, 5, -3)).unwrap();
        assert!(block.is(&ResourceLocation::vanilla_static("air")));
        assert_eq!(block.redstone_power, None);
    }

    #[test]
    fn test_out_of_height_and_unloaded() {
        let dim = dimension().with_loaded_area(BlockPos::new(-3, 0, -3), BlockPos::new(3, 0, 3));
        assert_eq!(
            dim.get_block(BlockPos::new(0, 320, 0)),
            Err(WorldError::OutOfHeight(BlockPos::new(0, 320, 0)))
        );
        assert_eq!(
            dim.get_block(BlockPos::new(4, 0, 0)),
            Err(WorldError::Unloaded(BlockPos::new(4, 0, 0)))
        );
        assert!(dim.get_block(BlockPos::new(3, 100, -3)).is_ok());
    }

    #[test]
    fn test_set_type_validates_first() {
        let mut dim = dimension();
        let pos = BlockPos::new(0, 0, 0);
        dim.set_type(pos, "stone").unwrap();

        let err = dim.set_type(pos, "minecraft:not_a_block").unwrap_err();
        assert!(matches!(err, WorldError::UnknownBlockType(_)));
        assert!(dim.get_block(pos).unwrap().is(&ResourceLocation::vanilla_static("stone")));
    }

    #[test]
    fn test_waterlogged_only_for_waterloggable() {
        let mut dim = dimension();
        let stairs = BlockPos::new(0, 0, 0);
        let stone = BlockPos::new(1, 0, 0);
        dim.set_type(stairs, "oak_stairs").unwrap();
        dim.set_type(stone, "stone").unwrap();

        dim.set_waterlogged(stairs, true).unwrap();
        dim.set_waterlogged(stone, true).unwrap();
        assert!(dim.get_block(stairs).unwrap().waterlogged);
        assert!(!dim.get_block(stone).unwrap().waterlogged);
    }

    #[test]
    fn test_destroy_records_drop() {
        let mut dim = dimension();
        let pos = BlockPos::new(0, 0, 0);
        dim.set_type(pos, "wheat").unwrap();
        dim.destroy_block(pos).unwrap();
        dim.destroy_block(pos).unwrap();
        assert_eq!(dim.drops().len(), 1);
        assert!(dim.get_block(pos).unwrap().is(&ResourceLocation::vanilla_static("air")));
    }

    #[test]
    fn test_structure_capture_and_place() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let source = BlockPos::new(0, 0, 0);
        dim.set_type(source, "wheat").unwrap();
        let grown = dim
            .get_block(source)
            .unwrap()
            .permutation
            .with_state("growth", 7.into())
            .unwrap();
        dim.set_permutation(source, grown.clone()).unwrap();

        store
            .create_from_world("copy", &dim, source, source.above(), SaveMode::Memory)
            .unwrap();
        store.place("copy", &mut dim, BlockPos::new(5, 0, 0)).unwrap();

        assert_eq!(dim.get_block(BlockPos::new(5, 0, 0)).unwrap().permutation, grown);
        assert_eq!(store.mode("copy"), Some(SaveMode::Memory));
        assert!(store.delete("copy"));
        assert!(!store.delete("copy"));
    }

    #[test]
    fn test_place_is_all_or_nothing() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        dim.fill(BlockPos::new(0, 318, 0), BlockPos::new(0, 319, 0), "stone")
            .unwrap();
        store
            .create_from_world(
                "pair",
                &dim,
                BlockPos::new(0, 318, 0),
                BlockPos::new(0, 319, 0),
                SaveMode::Memory,
            )
            .unwrap();

        // The upper cell would land above the height limit.
        let err = store.place("pair", &mut dim, BlockPos::new(2, 319, 0)).unwrap_err();
        assert!(matches!(err, StructureError::World(WorldError::OutOfHeight(_))));
        assert!(dim.get_block(BlockPos::new(2, 319, 0)).unwrap().is(&ResourceLocation::vanilla_static("air")));
    }

    #[test]
    fn test_empty_structure_places_nothing_until_filled() {
        let mut dim = dimension();
        let mut store = MemoryStructureStore::new();
        let pos = BlockPos::new(0, 0, 0);
        dim.set_type(pos, "stone").unwrap();

        store
            .create_empty("void", Vector3::new(1, 1, 1), SaveMode::World)
            .unwrap();
        store.place("void", &mut dim, pos).unwrap();
        assert!(dim.get_block(pos).unwrap().is(&ResourceLocation::vanilla_static("stone")));

        let air = BlockCell::new(BlockPermutation::simple(ResourceLocation::vanilla_static("air")));
        store.set_block("void", BlockPos::new(0, 0, 0), air).unwrap();
        store.place("void", &mut dim, pos).unwrap();
        assert!(dim.get_block(pos).unwrap().is(&ResourceLocation::vanilla_static("air")));

        let err = store
            .set_block("void", BlockPos::new(1, 0, 0), BlockCell::new(BlockPermutation::simple(ResourceLocation::vanilla_static("air"))))
            .unwrap_err();
        assert!(matches!(err, StructureError::OutOfBounds { .. }));
    }
}
