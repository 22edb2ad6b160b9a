//! One simulated player holding the debug stick in a flat demo world.

use std::collections::BTreeMap;
use std::sync::Arc;

use stick_core::config::StickConfig;
use stick_core::error::WorldError;
use stick_core::form::{Form, FormResponse};
use stick_core::state::StateDomainRegistry;
use stick_core::target::Rotation;
use stick_core::world::memory::{MemoryDimension, MemoryWorld};
use stick_core::world::{BlockTypeRegistry, Dimension, HeightRange, PlayerId};
use stick_core::{DebugStick, InteractionEvent, InteractionKind, PromptId};
use stick_utils::math::Vector3;
use stick_utils::{BlockPos, DimensionId, ResourceLocation};
use thiserror::Error;
use uuid::Uuid;

use crate::console::{self, Command, CommandError};

const OVERWORLD: DimensionId = ResourceLocation::vanilla_static("overworld");
const EYE_HEIGHT: f64 = 1.62;
/// Half the width of the loaded demo area.
const DEMO_RADIUS: i32 = 32;

/// Why the session could not be set up.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The bundled block types do not parse.
    #[error("block types: {0}")]
    BlockTypes(serde_json::Error),
    /// The bundled state domains do not parse.
    #[error("state domains: {0}")]
    StateDomains(serde_json::Error),
    /// The demo terrain could not be written.
    #[error("demo terrain: {0}")]
    Terrain(#[from] WorldError),
}

/// The simulated player.
#[derive(Debug, Clone)]
pub struct Player {
    /// Player id.
    pub id: PlayerId,
    /// Current dimension.
    pub dimension: DimensionId,
    /// Eye position.
    pub eye: Vector3<f64>,
    /// View direction.
    pub rotation: Rotation,
    /// Whether the player sneaks.
    pub sneaking: bool,
    /// The held item.
    pub held: String,
}

/// The engine, its world and the player, advanced by ticks and console commands.
pub struct Session {
    stick: DebugStick,
    world: MemoryWorld,
    player: Player,
    shown: BTreeMap<PromptId, Form>,
}

impl Session {
    /// Creates the session with a fresh demo world.
    pub fn new(config: StickConfig) -> Result<Self, SessionError> {
        let registry = Arc::new(BlockTypeRegistry::vanilla().map_err(SessionError::BlockTypes)?);
        let domains = StateDomainRegistry::vanilla().map_err(SessionError::StateDomains)?;

        let mut dimension = MemoryDimension::new(OVERWORLD, HeightRange { min: -64, max: 319 }, registry)
            .with_loaded_area(
                BlockPos::new(-DEMO_RADIUS, 0, -DEMO_RADIUS),
                BlockPos::new(DEMO_RADIUS, 0, DEMO_RADIUS),
            )
            .with_empty_block(config.empty_block());
        demo_terrain(&mut dimension)?;

        let mut world = MemoryWorld::new();
        world.add_dimension(dimension);

        let player = Player {
            id: Uuid::new_v4(),
            dimension: OVERWORLD,
            eye: Vector3::new(0.5, 1.0 + EYE_HEIGHT, 0.5),
            rotation: Rotation::default(),
            sneaking: false,
            held: config.item_id.clone(),
        };
        log::info!("Player {} holds {}", player.id, player.held);

        Ok(Self {
            stick: DebugStick::new(config, domains),
            world,
            player,
            shown: BTreeMap::new(),
        })
    }

    /// The simulated player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// The world.
    #[must_use]
    pub const fn world(&self) -> &MemoryWorld {
        &self.world
    }

    /// Advances the engine one tick and renders the prompts it produced.
    pub fn tick(&mut self) -> Vec<String> {
        self.stick.tick(&mut self.world);

        let mut lines = Vec::new();
        for prompt in self.stick.drain_prompts() {
            if prompt.player != self.player.id {
                log::warn!("Dropping prompt {} for unknown player {}", prompt.id, prompt.player);
                continue;
            }
            lines.extend(console::render(&prompt));
            self.shown.insert(prompt.id, prompt.form);
        }
        lines
    }

    /// Runs a console command. [`Command::Stop`] is left to the caller.
    pub fn execute(&mut self, command: Command) -> Result<Vec<String>, CommandError> {
        let line = match command {
            Command::Help => return Ok(console::HELP.iter().map(|line| (*line).to_owned()).collect()),
            Command::Look { pitch, yaw } => {
                self.player.rotation = Rotation::new(pitch.clamp(-90.0, 90.0), yaw);
                format!("Looking at pitch {} yaw {}", self.player.rotation.pitch, yaw)
            }
            Command::Eye(eye) => {
                self.player.eye = eye;
                format!("Eye at {eye}")
            }
            Command::Sneak(sneaking) => {
                self.player.sneaking = sneaking.unwrap_or(!self.player.sneaking);
                format!("Sneaking {}", if self.player.sneaking { "on" } else { "off" })
            }
            Command::Hold(item) => {
                let line = format!("Holding {item}");
                self.player.held = item;
                line
            }
            Command::Interact(pos) => self.interact(InteractionKind::Interact, Some(pos)),
            Command::Break(pos) => self.interact(InteractionKind::Break, Some(pos)),
            Command::Use => self.interact(InteractionKind::ItemUse, None),
            Command::Submit { prompt, values } => {
                let Some(Form::Modal(form)) = self.shown.get(&prompt) else {
                    return Err(self.not_answerable(prompt));
                };
                let values = console::form_values(prompt, form, &values)?;
                self.answer(prompt, FormResponse::Submitted(values))?
            }
            Command::Select { prompt, button } => {
                let buttons = match self.shown.get(&prompt) {
                    Some(Form::Action(form)) => form.buttons.len(),
                    Some(Form::Message(_)) => 2,
                    _ => return Err(self.not_answerable(prompt)),
                };
                if button >= buttons {
                    return Err(CommandError::Invalid(button.to_string(), "button"));
                }
                self.answer(prompt, FormResponse::Selected(button))?
            }
            Command::Cancel(prompt) => self.answer(prompt, FormResponse::Cancelled)?,
            Command::Prompts => {
                if self.shown.is_empty() {
                    return Ok(vec!["No open prompts".to_owned()]);
                }
                return Ok(self
                    .shown
                    .iter()
                    .map(|(id, form)| format!("{id} {}", form.title()))
                    .collect());
            }
            Command::Block(pos) => return Ok(self.describe(pos)),
            Command::Stop => return Ok(Vec::new()),
        };
        Ok(vec![line])
    }

    fn interact(&mut self, kind: InteractionKind, block: Option<BlockPos>) -> String {
        let mut event = InteractionEvent {
            player: self.player.id,
            dimension: self.player.dimension.clone(),
            kind,
            block,
            item: self.player.held.clone(),
            sneaking: self.player.sneaking,
            eye: self.player.eye,
            rotation: self.player.rotation,
            cancel: false,
        };
        self.stick.on_event(&mut event);
        if event.cancel {
            format!("{kind:?} taken by the debug stick")
        } else {
            format!("{kind:?} left to the world")
        }
    }

    fn answer(&mut self, prompt: PromptId, response: FormResponse) -> Result<String, CommandError> {
        if self.shown.remove(&prompt).is_none() {
            return Err(CommandError::NoSuchPrompt(prompt));
        }
        if self.stick.respond(prompt, response) {
            Ok(format!("Answered {prompt}"))
        } else {
            Err(CommandError::NoSuchPrompt(prompt))
        }
    }

    fn not_answerable(&self, prompt: PromptId) -> CommandError {
        if self.shown.contains_key(&prompt) {
            CommandError::WrongAnswer(prompt)
        } else {
            CommandError::NoSuchPrompt(prompt)
        }
    }

    fn describe(&self, pos: BlockPos) -> Vec<String> {
        let Some(dimension) = self.world.dimension(&self.player.dimension) else {
            return vec![format!("Dimension {} is gone", self.player.dimension)];
        };
        let block = match dimension.get_block(pos) {
            Ok(block) => block,
            Err(err) => return vec![err.to_string()],
        };

        let mut lines = vec![format!("{} at {pos}", block.type_id())];
        lines.extend(
            block
                .permutation
                .states()
                .iter()
                .map(|(name, value)| format!("  {name} = {value}")),
        );
        if block.waterlogged {
            lines.push("  waterlogged".to_owned());
        }
        lines
    }
}

/// Bedrock and dirt under a grass floor at y = 0, with a few blocks worth editing on top.
fn demo_terrain(dimension: &mut MemoryDimension) -> Result<(), WorldError> {
    let (min, max) = (-DEMO_RADIUS, DEMO_RADIUS);
    dimension.fill(BlockPos::new(min, -4, min), BlockPos::new(max, -4, max), "bedrock")?;
    dimension.fill(BlockPos::new(min, -3, min), BlockPos::new(max, -1, max), "dirt")?;
    dimension.fill(BlockPos::new(min, 0, min), BlockPos::new(max, 0, max), "grass_block")?;

    for (pos, type_id) in [
        (BlockPos::new(3, 1, 0), "hopper"),
        (BlockPos::new(0, 1, 3), "chest"),
        (BlockPos::new(-3, 1, 0), "candle"),
        (BlockPos::new(0, 1, -3), "oak_stairs"),
        (BlockPos::new(3, 1, 3), "sea_pickle"),
        (BlockPos::new(-3, 1, -3), "wheat"),
    ] {
        dimension.set_type(pos, type_id)?;
    }
    dimension.set_power(BlockPos::new(3, 1, 0), 7);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(StickConfig::default()).unwrap()
    }

    fn run(session: &mut Session, line: &str) -> Result<Vec<String>, CommandError> {
        let command = console::parse(line)?.unwrap();
        session.execute(command)
    }

    fn type_at(session: &Session, pos: BlockPos) -> ResourceLocation {
        session
            .world()
            .dimension(&OVERWORLD)
            .unwrap()
            .get_block(pos)
            .unwrap()
            .type_id()
            .clone()
    }

    #[test]
    fn test_interact_shows_editor_next_tick() {
        let mut session = session();

        let lines = run(&mut session, "interact 3 1 0").unwrap();
        assert_eq!(lines, vec!["Interact taken by the debug stick".to_owned()]);

        let lines = session.tick();
        assert_eq!(lines[0], "== #0 Debug Stick ==");
        assert!(lines.iter().any(|line| line == "  Redstone power: 7"));
        assert_eq!(run(&mut session, "prompts").unwrap(), vec!["#0 Debug Stick".to_owned()]);
    }

    #[test]
    fn test_other_items_are_left_alone() {
        let mut session = session();
        run(&mut session, "hold minecraft:stick").unwrap();

        let lines = run(&mut session, "break 0 0 0").unwrap();
        assert_eq!(lines, vec!["Break left to the world".to_owned()]);
        assert!(session.tick().is_empty());
    }

    #[test]
    fn test_break_at_top_coordinate_reports_error() {
        let mut session = session();
        let lines = run(&mut session, "break 0 2147483647 0").unwrap();
        assert_eq!(lines, vec!["Break taken by the debug stick".to_owned()]);

        let lines = session.tick();
        assert_eq!(lines[0], "== #0 Error ==");
        assert!(lines.iter().any(|line| line.contains("is not a valid position")), "{lines:?}");
    }

    #[test]
    fn test_move_through_data_menu() {
        let mut session = session();
        run(&mut session, "sneak on").unwrap();
        run(&mut session, "interact 0 1 3").unwrap();
        session.tick();

        run(&mut session, "select #0 1").unwrap();
        let lines = session.tick();
        assert_eq!(lines[0], "== #1 Offset position ==");

        run(&mut session, "submit #1 - 1 -").unwrap();
        session.tick();

        let chest = ResourceLocation::vanilla_static("chest");
        let air = ResourceLocation::vanilla_static("air");
        assert_eq!(type_at(&session, BlockPos::new(0, 2, 3)), chest);
        assert_eq!(type_at(&session, BlockPos::new(0, 1, 3)), air);
    }

    #[test]
    fn test_answers_are_checked() {
        let mut session = session();
        assert_eq!(
            run(&mut session, "cancel #3"),
            Err(CommandError::NoSuchPrompt(PromptId(3)))
        );

        run(&mut session, "interact -3 1 0").unwrap();
        session.tick();
        assert_eq!(
            run(&mut session, "select #0 0"),
            Err(CommandError::WrongAnswer(PromptId(0)))
        );

        run(&mut session, "cancel #0").unwrap();
        assert_eq!(
            run(&mut session, "cancel #0"),
            Err(CommandError::NoSuchPrompt(PromptId(0)))
        );
        assert!(session.tick().is_empty());
    }

    #[test]
    fn test_describe_block() {
        let mut session = session();
        let lines = run(&mut session, "block 0 0 0").unwrap();
        assert_eq!(lines, vec!["minecraft:grass_block at 0 0 0".to_owned()]);

        let lines = run(&mut session, "block 100 0 0").unwrap();
        assert_eq!(lines.len(), 1);
        assert_ne!(lines[0], "minecraft:air at 100 0 0");
    }
}
