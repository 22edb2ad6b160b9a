//! Block values as seen by the engine.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use stick_utils::{BlockPos, DimensionId, ResourceLocation};

use crate::error::WorldError;

/// The value of a single block state attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// A boolean state such as `open_bit`.
    Bool(bool),
    /// A numeric state such as `growth`.
    Int(i32),
    /// A named state such as `cardinal_direction`.
    String(String),
}

impl StateValue {
    /// Returns the boolean if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer if this is a numeric value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Int(value) => value.fmt(f),
            Self::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// State attributes in their natural iteration order.
pub type StateList = SmallVec<[(String, StateValue); 4]>;

/// A block type plus the current value of every state attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPermutation {
    type_id: ResourceLocation,
    states: StateList,
}

impl BlockPermutation {
    /// Creates a permutation from a type and its states.
    #[must_use]
    pub fn new(type_id: ResourceLocation, states: impl IntoIterator<Item = (String, StateValue)>) -> Self {
        Self {
            type_id,
            states: states.into_iter().collect(),
        }
    }

    /// Creates a permutation for a type without states.
    #[must_use]
    pub fn simple(type_id: ResourceLocation) -> Self {
        Self {
            type_id,
            states: StateList::new(),
        }
    }

    /// The block type.
    #[must_use]
    pub const fn type_id(&self) -> &ResourceLocation {
        &self.type_id
    }

    /// All states in iteration order.
    #[must_use]
    pub fn states(&self) -> &[(String, StateValue)] {
        &self.states
    }

    /// The current value of `state`.
    #[must_use]
    pub fn get_state(&self, state: &str) -> Option<&StateValue> {
        self.states
            .iter()
            .find_map(|(name, value)| (name == state).then_some(value))
    }

    /// Returns a copy with `state` set to `value`.
    pub fn with_state(&self, state: &str, value: StateValue) -> Result<Self, WorldError> {
        let mut permutation = self.clone();
        let Some(slot) = permutation
            .states
            .iter_mut()
            .find_map(|(name, current)| (name == state).then_some(current))
        else {
            return Err(WorldError::UnknownState {
                block: self.type_id.to_string(),
                state: state.to_owned(),
            });
        };
        *slot = value;
        Ok(permutation)
    }
}

/// Everything a snapshot needs to recreate one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCell {
    /// The block permutation.
    pub permutation: BlockPermutation,
    /// Whether the cell also holds water.
    pub waterlogged: bool,
}

impl BlockCell {
    /// A dry cell holding `permutation`.
    #[must_use]
    pub const fn new(permutation: BlockPermutation) -> Self {
        Self {
            permutation,
            waterlogged: false,
        }
    }
}

/// A queried block.
///
/// This is a snapshot of the cell at query time. Writes go through the
/// [`Dimension`](super::Dimension) and are not reflected here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The dimension the block was queried in.
    pub dimension: DimensionId,
    /// The cell address.
    pub pos: BlockPos,
    /// Type and states.
    pub permutation: BlockPermutation,
    /// Tags of the block type.
    pub tags: Vec<String>,
    /// Whether the block can be waterlogged.
    pub can_contain_liquid: bool,
    /// Whether the block is currently waterlogged.
    pub waterlogged: bool,
    /// Redstone power, `None` if the block cannot be powered.
    pub redstone_power: Option<u8>,
}

impl Block {
    /// The block type.
    #[must_use]
    pub const fn type_id(&self) -> &ResourceLocation {
        self.permutation.type_id()
    }

    /// Whether the block is of the given type.
    #[must_use]
    pub fn is(&self, type_id: &ResourceLocation) -> bool {
        self.permutation.type_id() == type_id
    }

    /// The cell data needed to recreate this block elsewhere.
    #[must_use]
    pub fn cell(&self) -> BlockCell {
        BlockCell {
            permutation: self.permutation.clone(),
            waterlogged: self.waterlogged,
        }
    }
}

/// Inclusive vertical bounds of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    /// Lowest valid y.
    pub min: i32,
    /// Highest valid y.
    pub max: i32,
}

impl HeightRange {
    /// Whether `y` lies inside the range.
    #[must_use]
    pub const fn contains(&self, y: i32) -> bool {
        y >= self.min && y <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door() -> BlockPermutation {
        BlockPermutation::new(
            ResourceLocation::vanilla_static("wooden_door"),
            [
                ("direction".to_owned(), StateValue::Int(0)),
                ("open_bit".to_owned(), StateValue::Bool(false)),
            ],
        )
    }

    #[test]
    fn test_with_state_keeps_order() {
        let opened = door().with_state("open_bit", true.into()).unwrap();
        assert_eq!(opened.get_state("open_bit"), Some(&StateValue::Bool(true)));
        assert_eq!(opened.states()[0].0, "direction");
        assert_eq!(opened.states()[1].0, "open_bit");
    }

    #[test]
    fn test_with_unknown_state() {
        let err = door().with_state("age", 3.into()).unwrap_err();
        assert!(matches!(err, WorldError::UnknownState { .. }));
    }

    #[test]
    fn test_state_value_json() {
        let values: Vec<StateValue> = serde_json::from_str(r#"[true, 3, "north"]"#).unwrap();
        assert_eq!(
            values,
            vec![StateValue::Bool(true), StateValue::Int(3), StateValue::from("north")]
        );
    }
}
