//! Error types for every stage of the engine.
//!
//! The `Display` text of each variant is what ends up in front of the player,
//! so keep them short and free of internal detail.

use stick_utils::{BlockPos, DimensionId};
use thiserror::Error;

use crate::world::StateValue;

/// Failures reported by a [`Dimension`](crate::world::Dimension).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    /// The cell is not loaded or has not been generated.
    #[error("the block at {0} is not loaded")]
    Unloaded(BlockPos),
    /// The cell lies outside the dimension's vertical bounds.
    #[error("{0} is outside the height range of the dimension")]
    OutOfHeight(BlockPos),
    /// The block type identifier is not known to the host.
    #[error("unknown block type `{0}`")]
    UnknownBlockType(String),
    /// The block type has no state with this name.
    #[error("`{block}` has no state named `{state}`")]
    UnknownState {
        /// The block type.
        block: String,
        /// The requested state.
        state: String,
    },
    /// The value is not in the state's domain.
    #[error("`{value}` is not a legal value for `{state}`")]
    IllegalValue {
        /// The state that was written.
        state: String,
        /// The rejected value.
        value: StateValue,
    },
}

impl WorldError {
    /// Whether the error means the cell could not be queried at all.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unloaded(_) | Self::OutOfHeight(_))
    }
}

/// Failures of the snapshot structure store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    /// No structure with this name exists.
    #[error("structure `{0}` does not exist")]
    Missing(String),
    /// A structure with this name already exists.
    #[error("structure `{0}` already exists")]
    AlreadyExists(String),
    /// An offset lies outside the structure's size.
    #[error("offset {offset} is outside structure `{name}`")]
    OutOfBounds {
        /// The structure name.
        name: String,
        /// The rejected offset.
        offset: BlockPos,
    },
    /// Reading from or writing to the world failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

/// A submitted form did not match the form that was shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The value kind does not fit the widget bound to the slot.
    #[error("unexpected value for `{field}`")]
    Mismatch {
        /// The field name.
        field: String,
    },
    /// A slider value lies outside its bounds.
    #[error("{value} is out of range for `{field}`")]
    OutOfRange {
        /// The field name.
        field: String,
        /// The rejected number.
        value: String,
    },
    /// A dropdown selection does not name an option.
    #[error("selection {index} does not exist for `{field}`")]
    NoSuchOption {
        /// The field name.
        field: String,
        /// The rejected index.
        index: usize,
    },
}

/// Failures of the relocation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelocateError {
    /// A coordinate field did not contain a number.
    #[error("`{0}` is not a number")]
    NotANumber(String),
    /// The destination is out of height bounds or cannot be queried.
    #[error("{0} is not a valid position")]
    InvalidPosition(BlockPos),
    /// The destination is occupied and the move was not confirmed.
    #[error("the destination {0} is occupied")]
    Occupied(BlockPos),
    /// The source no longer holds the block the move was planned for.
    #[error("the block at {0} changed before it could be moved")]
    StaleSource(BlockPos),
    /// The plan was made for another dimension.
    #[error("the move was planned in {expected}, not {actual}")]
    WrongDimension {
        /// Dimension the plan was made in.
        expected: DimensionId,
        /// Dimension it was committed against.
        actual: DimensionId,
    },
    /// A snapshot step failed; the source content was restored.
    #[error("the block could not be moved: {0}")]
    Snapshot(#[from] StructureError),
}

/// The umbrella error of the interaction session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StickError {
    /// The world refused a query or write.
    #[error(transparent)]
    World(#[from] WorldError),
    /// The form response was malformed.
    #[error(transparent)]
    Form(#[from] FormError),
    /// The relocation was rejected or failed.
    #[error(transparent)]
    Relocate(#[from] RelocateError),
    /// The typed block identifier is not valid.
    #[error("`{0}` is not a valid block id")]
    InvalidBlockId(String),
    /// The targeted block changed while its form was open.
    #[error("the block at {0} changed while the form was open")]
    StaleTarget(BlockPos),
    /// The player has no room for the item.
    #[error("there is no room for {0} in the inventory")]
    InventoryFull(String),
    /// The dimension the prompt was opened in is gone.
    #[error("dimension {0} is not available")]
    MissingDimension(DimensionId),
}
