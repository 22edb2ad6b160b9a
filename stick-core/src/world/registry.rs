//! Known block types of the in-memory host.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use stick_utils::ResourceLocation;

use super::block::{BlockPermutation, StateValue};

const VANILLA_BLOCK_TYPES: &str = include_str!("../../../package-content/block_types.json");

/// A block type definition.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockType {
    /// The type identifier.
    pub id: ResourceLocation,
    /// Default states, in iteration order.
    #[serde(default)]
    pub states: Vec<(String, StateValue)>,
    /// Tags of the type.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether blocks of this type can be waterlogged.
    #[serde(default)]
    pub waterloggable: bool,
    /// Whether blocks of this type report redstone power.
    #[serde(default)]
    pub powerable: bool,
}

impl BlockType {
    /// The default permutation of this type.
    #[must_use]
    pub fn default_permutation(&self) -> BlockPermutation {
        BlockPermutation::new(self.id.clone(), self.states.iter().cloned())
    }

    /// Whether the type declares a state named `state`.
    #[must_use]
    pub fn has_state(&self, state: &str) -> bool {
        self.states.iter().any(|(name, _)| name == state)
    }
}

/// A lookup of block types by identifier.
#[derive(Debug, Clone, Default)]
pub struct BlockTypeRegistry {
    types: FxHashMap<ResourceLocation, BlockType>,
}

impl BlockTypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the bundled vanilla subset.
    pub fn vanilla() -> Result<Self, serde_json::Error> {
        Self::from_json(VANILLA_BLOCK_TYPES)
    }

    /// Loads a JSON array of block types.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let types: Vec<BlockType> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for block_type in types {
            registry.register(block_type);
        }
        Ok(registry)
    }

    /// Adds or replaces a block type.
    pub fn register(&mut self, block_type: BlockType) {
        if self.types.insert(block_type.id.clone(), block_type).is_some() {
            log::warn!("Block type registered twice, keeping the later definition");
        }
    }

    /// Looks up a block type.
    #[must_use]
    pub fn get(&self, id: &ResourceLocation) -> Option<&BlockType> {
        self.types.get(id)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_registry_loads() {
        let registry = BlockTypeRegistry::vanilla().unwrap();
        let air = registry.get(&ResourceLocation::vanilla_static("air")).unwrap();
        assert!(air.states.is_empty());

        let door = registry
            .get(&ResourceLocation::vanilla_static("wooden_door"))
            .unwrap();
        assert!(door.has_state("open_bit"));
        assert!(!door.has_state("growth"));
    }

    #[test]
    fn test_default_permutation_order() {
        let registry = BlockTypeRegistry::from_json(
            r#"[{"id": "test:thing", "states": [["b", 1], ["a", true]]}]"#,
        )
        .unwrap();
        let thing = registry.get(&"test:thing".parse().unwrap()).unwrap();
        let permutation = thing.default_permutation();
        assert_eq!(permutation.states()[0].0, "b");
        assert_eq!(permutation.states()[1].0, "a");
    }
}
