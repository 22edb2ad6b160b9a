//! Console commands and the text rendering of prompts.

use std::str::FromStr;

use stick_core::{Prompt, PromptId};
use stick_core::form::{Form, FormValue, ModalForm, Widget};
use stick_utils::BlockPos;
use stick_utils::math::Vector3;
use thiserror::Error;

/// Why a console line could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),
    /// The command got the wrong number of arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
    /// An argument could not be parsed.
    #[error("`{0}` is not a valid {1}")]
    Invalid(String, &'static str),
    /// The prompt is not shown to the player.
    #[error("prompt {0} is not open")]
    NoSuchPrompt(PromptId),
    /// The prompt does not take this kind of answer.
    #[error("prompt {0} cannot be answered this way")]
    WrongAnswer(PromptId),
}

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Lists the commands.
    Help,
    /// Sets the view direction in degrees.
    Look {
        /// Tilt, positive looks down.
        pitch: f64,
        /// Heading, zero faces +x.
        yaw: f64,
    },
    /// Moves the player's eye.
    Eye(Vector3<f64>),
    /// Sets or toggles sneaking.
    Sneak(Option<bool>),
    /// Changes the held item.
    Hold(String),
    /// Uses the held item on a block.
    Interact(BlockPos),
    /// Starts breaking a block.
    Break(BlockPos),
    /// Uses the held item without a block.
    Use,
    /// Submits a modal prompt. `None` leaves a field untouched.
    Submit {
        /// The prompt.
        prompt: PromptId,
        /// One entry per editable field.
        values: Vec<Option<String>>,
    },
    /// Presses a button of a menu or message prompt.
    Select {
        /// The prompt.
        prompt: PromptId,
        /// Zero-based button index.
        button: usize,
    },
    /// Closes a prompt.
    Cancel(PromptId),
    /// Lists the open prompts.
    Prompts,
    /// Describes a block.
    Block(BlockPos),
    /// Shuts the host down.
    Stop,
}

/// One line per command, for `help`.
pub const HELP: &[&str] = &[
    "look <pitch> <yaw>        set the view direction",
    "eye <x> <y> <z>           move the eye",
    "sneak [on|off]            set or toggle sneaking",
    "hold <item>               change the held item",
    "interact <x> <y> <z>      use the item on a block",
    "break <x> <y> <z>         start breaking a block",
    "use                       use the item in the air",
    "submit <#id> <value>...   answer a form, `-` leaves a field as is",
    "select <#id> <button>     press a button",
    "cancel <#id>              close a prompt",
    "prompts                   list open prompts",
    "block <x> <y> <z>         describe a block",
    "stop                      shut down",
];

/// Parses a console line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let mut words = line.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match name.to_ascii_lowercase().as_str() {
        "help" => Command::Help,
        "look" => {
            let [pitch, yaw] = exact(&args, "look <pitch> <yaw>")?;
            Command::Look {
                pitch: number(pitch, "angle")?,
                yaw: number(yaw, "angle")?,
            }
        }
        "eye" => {
            let [x, y, z] = exact(&args, "eye <x> <y> <z>")?;
            Command::Eye(Vector3::new(
                number(x, "coordinate")?,
                number(y, "coordinate")?,
                number(z, "coordinate")?,
            ))
        }
        "sneak" => match args.as_slice() {
            [] => Command::Sneak(None),
            [value] => Command::Sneak(Some(switch(value)?)),
            _ => return Err(CommandError::Usage("sneak [on|off]")),
        },
        "hold" => {
            let [item] = exact(&args, "hold <item>")?;
            Command::Hold((*item).to_owned())
        }
        "interact" => Command::Interact(block_pos(&args, "interact <x> <y> <z>")?),
        "break" => Command::Break(block_pos(&args, "break <x> <y> <z>")?),
        "use" => Command::Use,
        "submit" => {
            let Some((prompt, values)) = args.split_first() else {
                return Err(CommandError::Usage("submit <#id> <value>..."));
            };
            Command::Submit {
                prompt: prompt_id(prompt)?,
                values: values
                    .iter()
                    .map(|value| (*value != "-").then(|| (*value).to_owned()))
                    .collect(),
            }
        }
        "select" => {
            let [prompt, button] = exact(&args, "select <#id> <button>")?;
            Command::Select {
                prompt: prompt_id(prompt)?,
                button: button
                    .parse()
                    .map_err(|_| CommandError::Invalid((*button).to_owned(), "button"))?,
            }
        }
        "cancel" => {
            let [prompt] = exact(&args, "cancel <#id>")?;
            Command::Cancel(prompt_id(prompt)?)
        }
        "prompts" => Command::Prompts,
        "block" => Command::Block(block_pos(&args, "block <x> <y> <z>")?),
        "stop" | "exit" | "quit" => Command::Stop,
        _ => return Err(CommandError::Unknown(name.to_owned())),
    };
    Ok(Some(command))
}

fn exact<'a, const N: usize>(args: &[&'a str], usage: &'static str) -> Result<[&'a str; N], CommandError> {
    args.try_into().map_err(|_| CommandError::Usage(usage))
}

fn number<T: FromStr>(text: &str, what: &'static str) -> Result<T, CommandError> {
    text.parse().map_err(|_| CommandError::Invalid(text.to_owned(), what))
}

fn block_pos(args: &[&str], usage: &'static str) -> Result<BlockPos, CommandError> {
    let [x, y, z] = exact(args, usage)?;
    Ok(BlockPos::new(
        number(x, "block coordinate")?,
        number(y, "block coordinate")?,
        number(z, "block coordinate")?,
    ))
}

fn switch(text: &str) -> Result<bool, CommandError> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(CommandError::Invalid(text.to_owned(), "switch")),
    }
}

fn prompt_id(text: &str) -> Result<PromptId, CommandError> {
    text.strip_prefix('#')
        .unwrap_or(text)
        .parse()
        .map(PromptId)
        .map_err(|_| CommandError::Invalid(text.to_owned(), "prompt id"))
}

/// Maps typed values onto the editable widgets of `form`, in order.
///
/// Informational widgets get no value, and neither do fields past the typed ones.
pub fn form_values(
    id: PromptId,
    form: &ModalForm,
    values: &[Option<String>],
) -> Result<Vec<Option<FormValue>>, CommandError> {
    let editable = form.widgets.iter().filter(|widget| widget.is_editable()).count();
    if values.len() > editable {
        return Err(CommandError::WrongAnswer(id));
    }

    let mut typed = values.iter();
    form.widgets
        .iter()
        .map(|widget| {
            if !widget.is_editable() {
                return Ok(None);
            }
            let Some(Some(text)) = typed.next() else {
                return Ok(None);
            };
            let value = match widget {
                Widget::Toggle { .. } => FormValue::Bool(switch(text)?),
                Widget::Slider { .. } => FormValue::Number(number(text, "number")?),
                Widget::Dropdown { options, .. } => FormValue::Index(
                    options
                        .iter()
                        .position(|option| option == text)
                        .map_or_else(|| number(text, "option"), Ok)?,
                ),
                Widget::TextField { .. } => FormValue::Text(text.clone()),
                Widget::Header(_) | Widget::Label(_) | Widget::Divider => return Ok(None),
            };
            Ok(Some(value))
        })
        .collect()
}

/// Renders a prompt as console lines.
#[must_use]
pub fn render(prompt: &Prompt) -> Vec<String> {
    let mut lines = vec![format!("== {} {} ==", prompt.id, prompt.form.title())];
    match &prompt.form {
        Form::Modal(form) => {
            let mut field = 0;
            for widget in &form.widgets {
                let line = match widget {
                    Widget::Header(text) => format!("  [{text}]"),
                    Widget::Label(text) => format!("  {text}"),
                    Widget::Divider => "  ----".to_owned(),
                    Widget::Toggle { label, default } => {
                        field += 1;
                        format!("  {field}) {label}: {}", if *default { "on" } else { "off" })
                    }
                    Widget::Slider {
                        label,
                        min,
                        max,
                        default,
                    } => {
                        field += 1;
                        format!("  {field}) {label}: {default} ({min}..={max})")
                    }
                    Widget::Dropdown {
                        label,
                        options,
                        default,
                    } => {
                        field += 1;
                        let selected = options.get(*default).map_or("", String::as_str);
                        format!("  {field}) {label}: {selected} of [{}]", options.join(", "))
                    }
                    Widget::TextField { label, default, .. } => {
                        field += 1;
                        format!("  {field}) {label}: \"{default}\"")
                    }
                };
                lines.push(line);
            }
            lines.push(format!("  submit {} <value>... ({})", prompt.id, form.submit));
        }
        Form::Action(form) => {
            for (index, button) in form.buttons.iter().enumerate() {
                lines.push(format!("  {index}) {button}"));
            }
            lines.push(format!("  select {} <button>", prompt.id));
        }
        Form::Message(form) => {
            lines.push(format!("  {}", form.body));
            lines.push(format!("  0) {}  1) {}", form.button1, form.button2));
        }
    }
    lines
}
