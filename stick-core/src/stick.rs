//! The debug stick interaction session.
//!
//! Input events arrive synchronously from the host and only decide whether
//! the event is suppressed and which block it is about. Everything that
//! touches the world runs later as a task on the next [`DebugStick::tick`].
//!
//! Forms are shown through prompts. The host drains them with
//! [`DebugStick::drain_prompts`] and answers with [`DebugStick::respond`]; the
//! answer is handled on the following tick against the world as it is then.

use std::fmt::{self, Display};

use rustc_hash::FxHashMap;
use stick_utils::math::Vector3;
use stick_utils::{BlockPos, DimensionId, ResourceLocation};

use crate::config::StickConfig;
use crate::error::{FormError, RelocateError, StickError};
use crate::form::{Form, FormResponse, FormValue, MessageForm, StateForm, apply_edits};
use crate::ops::{self, DataAction};
use crate::relocate::{OffsetMode, Proposal, RelocateMode, RelocateOptions, RelocationPlan, Relocator, parse_target};
use crate::state::StateDomainRegistry;
use crate::target::{Rotation, raycast};
use crate::ticks::{TaskQueue, Throttle};
use crate::world::{Block, PlayerId, StateValue, World};

/// What the player did with the stick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// Used the stick on a block.
    Interact,
    /// Started breaking a block with the stick.
    Break,
    /// Used the stick without a block under the cursor.
    ItemUse,
}

impl InteractionKind {
    const fn index(self) -> usize {
        match self {
            Self::Interact => 0,
            Self::Break => 1,
            Self::ItemUse => 2,
        }
    }
}

/// A cancellable input event.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionEvent {
    /// Who caused the event.
    pub player: PlayerId,
    /// Where it happened.
    pub dimension: DimensionId,
    /// What happened.
    pub kind: InteractionKind,
    /// The block supplied by the event, if any.
    pub block: Option<BlockPos>,
    /// Identifier of the held item.
    pub item: String,
    /// Whether the player is sneaking.
    pub sneaking: bool,
    /// Eye position of the player.
    pub eye: Vector3<f64>,
    /// View direction of the player.
    pub rotation: Rotation,
    /// Set to suppress the host's default handling.
    pub cancel: bool,
}

/// Identifies a prompt shown to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromptId(pub u64);

impl Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A form the host should show to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Answer with this id.
    pub id: PromptId,
    /// Who to show it to.
    pub player: PlayerId,
    /// The form.
    pub form: Form,
}

#[derive(Debug, Clone)]
enum Targeting {
    Block(BlockPos),
    Ray { eye: Vector3<f64>, rotation: Rotation },
}

#[derive(Debug, Clone)]
struct OpenRequest {
    player: PlayerId,
    dimension: DimensionId,
    target: Targeting,
    sneaking: bool,
}

/// What an open prompt is waiting for.
#[derive(Debug, Clone)]
enum Awaiting {
    StateEditor(StateForm),
    DataMenu {
        pos: BlockPos,
        type_id: ResourceLocation,
    },
    Position {
        pos: BlockPos,
        type_id: ResourceLocation,
        offset: OffsetMode,
        options: RelocateOptions,
    },
    BlockId {
        pos: BlockPos,
        type_id: ResourceLocation,
    },
    ConfirmOverwrite(RelocationPlan),
    Notice,
}

#[derive(Debug, Clone)]
struct PendingPrompt {
    player: PlayerId,
    dimension: DimensionId,
    awaiting: Awaiting,
}

#[derive(Debug)]
enum Task {
    /// Opens a form right away.
    Open(OpenRequest),
    /// Opens a form after a throttle window.
    Deferred {
        kind: InteractionKind,
        request: OpenRequest,
    },
    /// Handles the answer to a prompt.
    Respond {
        prompt: PendingPrompt,
        response: FormResponse,
    },
}

impl Task {
    const fn player(&self) -> PlayerId {
        match self {
            Self::Open(request) | Self::Deferred { request, .. } => request.player,
            Self::Respond { prompt, .. } => prompt.player,
        }
    }

    fn into_immediate(self) -> Self {
        match self {
            Self::Deferred { request, .. } => Self::Open(request),
            task => task,
        }
    }
}

/// The debug stick engine of one host.
pub struct DebugStick {
    config: StickConfig,
    empty: ResourceLocation,
    domains: StateDomainRegistry,
    relocator: Relocator,
    throttles: [Throttle; 3],
    queue: TaskQueue<Task>,
    tick: u64,
    next_prompt: u64,
    pending: FxHashMap<PromptId, PendingPrompt>,
    outbox: Vec<Prompt>,
}

impl DebugStick {
    /// Creates the engine.
    #[must_use]
    pub fn new(config: StickConfig, domains: StateDomainRegistry) -> Self {
        let empty = config.empty_block();
        let throttle = Throttle::new(config.throttle_ticks);
        Self {
            relocator: Relocator::new(config.structure_prefix.clone(), empty.clone()),
            throttles: [throttle.clone(), throttle.clone(), throttle],
            config,
            empty,
            domains,
            queue: TaskQueue::new(),
            tick: 0,
            next_prompt: 0,
            pending: FxHashMap::default(),
            outbox: Vec::new(),
        }
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &StickConfig {
        &self.config
    }

    /// The current tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Number of prompts waiting for an answer.
    #[must_use]
    pub fn open_prompts(&self) -> usize {
        self.pending.len()
    }

    /// Drops everything still waiting on `player`, e.g. after they left.
    ///
    /// Their open prompts can no longer be answered, undrained prompts are
    /// discarded and queued work is cancelled. Returns the number of prompts
    /// dropped.
    pub fn forget_player(&mut self, player: PlayerId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, prompt| prompt.player != player);
        self.outbox.retain(|prompt| prompt.player != player);
        let dropped = before - self.pending.len();

        let cancelled = self.queue.retain(|task| task.player() != player);
        for throttle in &mut self.throttles {
            throttle.sync(&self.queue);
        }
        log::debug!("Forgot {player}: {dropped} prompts, {cancelled} tasks");
        dropped
    }

    /// Handles an input event during the host's event dispatch.
    ///
    /// Events with the stick are always cancelled, throttled or not.
    pub fn on_event(&mut self, event: &mut InteractionEvent) {
        if event.item != self.config.item_id {
            return;
        }
        event.cancel = true;

        let target = match event.kind {
            InteractionKind::Interact => event.block.map(Targeting::Block),
            InteractionKind::Break => match event.block {
                Some(pos) if self.config.break_targets_above => {
                    let Some(above) = pos.checked_above() else {
                        log::info!("Nothing above {pos} to target");
                        let err: StickError = RelocateError::InvalidPosition(pos).into();
                        self.show_error(event.player, event.dimension.clone(), &err);
                        return;
                    };
                    Some(Targeting::Block(above))
                }
                pos => pos.map(Targeting::Block),
            },
            InteractionKind::ItemUse if self.config.item_use_raycast => Some(Targeting::Ray {
                eye: event.eye,
                rotation: event.rotation,
            }),
            InteractionKind::ItemUse => event.block.map(Targeting::Block),
        };
        let Some(target) = target else {
            log::trace!("{:?} without a block, ignored", event.kind);
            return;
        };

        let request = OpenRequest {
            player: event.player,
            dimension: event.dimension.clone(),
            target,
            sneaking: event.sneaking,
        };
        let kind = event.kind;
        let task = Task::Deferred { kind, request };
        if let Some(task) = self.throttles[kind.index()].invoke(&mut self.queue, self.tick, task) {
            self.queue.run(task.into_immediate(), self.tick);
        }
    }

    /// Advances one tick and runs every task that is due.
    pub fn tick(&mut self, world: &mut dyn World) {
        self.tick += 1;
        for task in self.queue.drain_due(self.tick) {
            match task {
                Task::Open(request) => self.open(world, request),
                Task::Deferred { kind, request } => {
                    self.throttles[kind.index()].on_fire(self.tick);
                    self.open(world, request);
                }
                Task::Respond { prompt, response } => {
                    let player = prompt.player;
                    let dimension = prompt.dimension.clone();
                    if let Err(err) = self.handle_response(world, prompt, response) {
                        log::info!("Debug stick action failed: {err}");
                        self.show_error(player, dimension, &err);
                    }
                }
            }
        }
    }

    /// Takes the prompts produced since the last call.
    pub fn drain_prompts(&mut self) -> Vec<Prompt> {
        std::mem::take(&mut self.outbox)
    }

    /// Answers a prompt. The answer is handled on the next tick.
    ///
    /// Returns false if no prompt with this id is open.
    pub fn respond(&mut self, id: PromptId, response: FormResponse) -> bool {
        let Some(prompt) = self.pending.remove(&id) else {
            return false;
        };
        self.queue.run(Task::Respond { prompt, response }, self.tick);
        true
    }

    fn prompt(&mut self, player: PlayerId, dimension: DimensionId, form: Form, awaiting: Awaiting) -> PromptId {
        let id = PromptId(self.next_prompt);
        self.next_prompt += 1;
        self.pending.insert(
            id,
            PendingPrompt {
                player,
                dimension,
                awaiting,
            },
        );
        self.outbox.push(Prompt { id, player, form });
        id
    }

    fn show_error(&mut self, player: PlayerId, dimension: DimensionId, err: &StickError) {
        let form = Form::Message(MessageForm::error(err.to_string()));
        self.prompt(player, dimension, form, Awaiting::Notice);
    }

    fn open(&mut self, world: &mut dyn World, request: OpenRequest) {
        let Some(access) = world.access(&request.dimension) else {
            log::warn!("Dimension {} is not available", request.dimension);
            return;
        };

        let block = match request.target {
            Targeting::Block(pos) => access.dimension.get_block(pos),
            Targeting::Ray { eye, rotation } => match raycast(
                &*access.dimension,
                eye,
                rotation,
                self.config.max_distance,
                self.config.step_size,
                &self.empty,
            ) {
                Some(hit) => Ok(hit.block),
                None => {
                    log::trace!("Nothing in reach of {}", request.player);
                    return;
                }
            },
        };
        let block = match block {
            Ok(block) => block,
            Err(err) => {
                self.show_error(request.player, request.dimension, &err.into());
                return;
            }
        };

        if request.sneaking {
            let awaiting = Awaiting::DataMenu {
                pos: block.pos,
                type_id: block.type_id().clone(),
            };
            self.prompt(request.player, request.dimension, Form::Action(ops::data_menu()), awaiting);
        } else {
            let state_form = StateForm::build(&block, &self.domains);
            let form = Form::Modal(state_form.form.clone());
            self.prompt(request.player, request.dimension, form, Awaiting::StateEditor(state_form));
        }
    }

    fn handle_response(&mut self, world: &mut dyn World, prompt: PendingPrompt, response: FormResponse) -> Result<(), StickError> {
        let PendingPrompt {
            player,
            dimension,
            awaiting,
        } = prompt;
        let missing = || StickError::MissingDimension(dimension.clone());

        match (awaiting, response) {
            (_, FormResponse::Cancelled) | (Awaiting::Notice, _) => Ok(()),

            (Awaiting::StateEditor(state_form), FormResponse::Submitted(values)) => {
                let edits = state_form.reconcile(&values)?;
                let access = world.access(&dimension).ok_or_else(missing)?;
                apply_edits(access.dimension, state_form.pos, &state_form.type_id, &edits, &self.domains)?;
                Ok(())
            }

            (Awaiting::DataMenu { pos, type_id }, FormResponse::Selected(index)) => {
                let Some(action) = DataAction::from_index(index) else {
                    return Err(FormError::NoSuchOption {
                        field: "action".to_owned(),
                        index,
                    }
                    .into());
                };
                let block = {
                    let access = world.access(&dimension).ok_or_else(missing)?;
                    current_block(access.dimension.get_block(pos)?, &type_id)?
                };
                self.data_action(world, player, dimension, action, block)
            }

            (
                Awaiting::Position {
                    pos,
                    type_id,
                    offset,
                    options,
                },
                FormResponse::Submitted(values),
            ) => {
                let fields = [text(&values, 0)?, text(&values, 1)?, text(&values, 2)?];
                let target = parse_target(pos, fields, offset)?;

                let access = world.access(&dimension).ok_or_else(missing)?;
                current_block(access.dimension.get_block(pos)?, &type_id)?;
                match self.relocator.propose(&*access.dimension, pos, target, options)? {
                    Proposal::Ready(plan) => self.commit(world, player, plan, false),
                    Proposal::NeedsConfirmation(plan) => {
                        self.confirm_overwrite(player, plan);
                        Ok(())
                    }
                }
            }

            (Awaiting::ConfirmOverwrite(plan), FormResponse::Selected(0)) => self.commit(world, player, plan, true),
            (Awaiting::ConfirmOverwrite(plan), FormResponse::Selected(_)) => {
                log::debug!("Overwriting {} was declined", plan.target);
                Ok(())
            }

            (Awaiting::BlockId { pos, type_id }, FormResponse::Submitted(values)) => {
                let id = text(&values, 0)?;
                let access = world.access(&dimension).ok_or_else(missing)?;
                current_block(access.dimension.get_block(pos)?, &type_id)?;
                ops::change_type(access.dimension, pos, id)
            }

            (_, response) => {
                log::warn!("Unexpected response {response:?}");
                Err(FormError::Mismatch {
                    field: "response".to_owned(),
                }
                .into())
            }
        }
    }

    fn data_action(
        &mut self,
        world: &mut dyn World,
        player: PlayerId,
        dimension: DimensionId,
        action: DataAction,
        block: Block,
    ) -> Result<(), StickError> {
        let pos = block.pos;
        let type_id = block.type_id().clone();
        let options = RelocateOptions {
            mode: if action == DataAction::CopyPosition {
                RelocateMode::Copy
            } else {
                RelocateMode::Move
            },
            auxiliary_above: is_lower_half(&block),
        };

        match action {
            DataAction::ModifyPosition | DataAction::ModifyPositionOffset | DataAction::CopyPosition => {
                let offset = if action == DataAction::ModifyPositionOffset {
                    OffsetMode::Relative
                } else {
                    OffsetMode::Absolute
                };
                let form = Form::Modal(ops::position_form(&block, offset));
                let awaiting = Awaiting::Position {
                    pos,
                    type_id,
                    offset,
                    options,
                };
                self.prompt(player, dimension, form, awaiting);
                Ok(())
            }
            DataAction::ModifyId => {
                let form = Form::Modal(ops::id_form(&block));
                self.prompt(player, dimension, form, Awaiting::BlockId { pos, type_id });
                Ok(())
            }
            DataAction::GetItem => {
                let item = ops::item_id_for(&type_id);
                if !world.give_item(player, &item) {
                    return Err(StickError::InventoryFull(item));
                }
                log::debug!("Gave {item} to {player}");
                Ok(())
            }
            DataAction::Break => {
                let access = world.access(&dimension).ok_or_else(|| StickError::MissingDimension(dimension.clone()))?;
                ops::break_block(access.dimension, pos)
            }
            DataAction::Remove => {
                let access = world.access(&dimension).ok_or_else(|| StickError::MissingDimension(dimension.clone()))?;
                ops::remove_block(access.dimension, pos, &self.empty)
            }
        }
    }

    fn commit(&mut self, world: &mut dyn World, player: PlayerId, plan: RelocationPlan, confirmed: bool) -> Result<(), StickError> {
        let access = world
            .access(&plan.dimension)
            .ok_or_else(|| StickError::MissingDimension(plan.dimension.clone()))?;
        match self.relocator.commit(access, &plan, confirmed) {
            Err(RelocateError::Occupied(_)) if !confirmed => {
                self.confirm_overwrite(player, plan);
                Ok(())
            }
            result => Ok(result?),
        }
    }

    fn confirm_overwrite(&mut self, player: PlayerId, plan: RelocationPlan) {
        let form = Form::Message(MessageForm::confirm(format!(
            "The block at {} will be overwritten.",
            plan.target
        )));
        let dimension = plan.dimension.clone();
        self.prompt(player, dimension, form, Awaiting::ConfirmOverwrite(plan));
    }
}

/// Fails with [`StickError::StaleTarget`] unless `block` still has the type the prompt was opened for.
fn current_block(block: Block, type_id: &ResourceLocation) -> Result<Block, StickError> {
    if block.is(type_id) {
        Ok(block)
    } else {
        Err(StickError::StaleTarget(block.pos))
    }
}

/// The text answered in `slot`. Absent fields read as empty.
fn text(values: &[Option<FormValue>], slot: usize) -> Result<&str, FormError> {
    match values.get(slot) {
        Some(Some(FormValue::Text(text))) => Ok(text),
        None | Some(None) => Ok(""),
        Some(Some(_)) => Err(FormError::Mismatch {
            field: format!("field {slot}"),
        }),
    }
}

/// Whether the block is the lower half of a two block tall block.
fn is_lower_half(block: &Block) -> bool {
    block.permutation.get_state("upper_block_bit") == Some(&StateValue::Bool(false))
}
