//! The data menu: moving a block, changing its type, taking it as an item,
//! breaking or removing it.

use phf::phf_set;
use stick_utils::{BlockPos, ResourceLocation};

use crate::error::{StickError, WorldError};
use crate::form::{ActionForm, ModalForm};
use crate::relocate::OffsetMode;
use crate::world::{Block, Dimension};

/// Blocks whose item is not named like the block itself but `item.<name>`.
static ITEM_DOT_FORM_BLOCK_IDS: phf::Set<&'static str> = phf_set! {
    "campfire",
    "brewing_stand",
    "cauldron",
    "flower_pot",
    "soul_campfire",
    "wheat",
    "jungle_door",
    "glow_frame",
    "nether_wart",
    "bed",
    "beetroot",
    "spruce_door",
    "cake",
    "camera",
    "frame",
    "crimson_door",
    "warped_door",
    "acacia_door",
    "dark_oak_door",
    "wooden_door",
    "nether_sprouts",
    "reeds",
    "iron_door",
    "kelp",
    "birch_door",
    "hopper",
    "mangrove_door",
};

/// Entries of the data menu, in button order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAction {
    /// Move to typed coordinates.
    ModifyPosition,
    /// Move by a typed offset.
    ModifyPositionOffset,
    /// Replace the block type.
    ModifyId,
    /// Give the block's item to the player.
    GetItem,
    /// Break the block with drops.
    Break,
    /// Remove the block without drops.
    Remove,
    /// Copy to typed coordinates, keeping the source.
    CopyPosition,
}

impl DataAction {
    /// All actions in button order.
    pub const ALL: [Self; 7] = [
        Self::ModifyPosition,
        Self::ModifyPositionOffset,
        Self::ModifyId,
        Self::GetItem,
        Self::Break,
        Self::Remove,
        Self::CopyPosition,
    ];

    /// The action behind a button index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ModifyPosition => "Set position",
            Self::ModifyPositionOffset => "Offset position",
            Self::ModifyId => "Set block id",
            Self::GetItem => "Get item",
            Self::Break => "Break",
            Self::Remove => "Remove",
            Self::CopyPosition => "Copy to position",
        }
    }
}

/// The data menu form.
#[must_use]
pub fn data_menu() -> ActionForm {
    ActionForm {
        title: "Block Data".to_owned(),
        buttons: DataAction::ALL.iter().map(|action| action.label().to_owned()).collect(),
    }
}

/// Three coordinate fields. Absolute forms start at the block's position, offset forms start blank.
#[must_use]
pub fn position_form(block: &Block, mode: OffsetMode) -> ModalForm {
    let (title, axes, defaults) = match mode {
        OffsetMode::Absolute => (
            "Set position",
            ["x", "y", "z"],
            [block.pos.x(), block.pos.y(), block.pos.z()].map(|v| v.to_string()),
        ),
        OffsetMode::Relative => (
            "Offset position",
            ["offset x", "offset y", "offset z"],
            [String::new(), String::new(), String::new()],
        ),
    };

    let mut form = ModalForm::new(title);
    for (axis, default) in axes.into_iter().zip(defaults) {
        form.text_field(axis, default);
    }
    form
}

/// A single text field holding the block type.
#[must_use]
pub fn id_form(block: &Block) -> ModalForm {
    let mut form = ModalForm::new("Set block id");
    form.text_field("Block id", block.type_id().to_string());
    form
}

/// The item identifier for a block type.
#[must_use]
pub fn item_id_for(type_id: &ResourceLocation) -> String {
    if !type_id.is_vanilla() {
        return type_id.to_string();
    }
    if ITEM_DOT_FORM_BLOCK_IDS.contains(type_id.path.as_ref()) {
        format!("item.{}", type_id.path)
    } else {
        type_id.path.to_string()
    }
}

/// Replaces the block at `pos` with the default permutation of `text`.
///
/// The identifier is validated before the block is touched.
pub fn change_type(dimension: &mut dyn Dimension, pos: BlockPos, text: &str) -> Result<(), StickError> {
    let text = text.trim();
    if text.parse::<ResourceLocation>().is_err() {
        log::info!("Rejected block id `{text}`");
        return Err(StickError::InvalidBlockId(text.to_owned()));
    }
    match dimension.set_type(pos, text) {
        Ok(()) => {
            log::debug!("Set {pos} to {text}");
            Ok(())
        }
        Err(WorldError::UnknownBlockType(_)) => {
            log::info!("Rejected unknown block id `{text}`");
            Err(StickError::InvalidBlockId(text.to_owned()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Breaks the block at `pos` as if it was mined.
pub fn break_block(dimension: &mut dyn Dimension, pos: BlockPos) -> Result<(), StickError> {
    dimension.destroy_block(pos)?;
    log::debug!("Broke the block at {pos}");
    Ok(())
}

/// Replaces the block at `pos` with `empty`, without drops.
pub fn remove_block(dimension: &mut dyn Dimension, pos: BlockPos, empty: &ResourceLocation) -> Result<(), StickError> {
    dimension.set_type(pos, &empty.to_string())?;
    log::debug!("Removed the block at {pos}");
    Ok(())
}
