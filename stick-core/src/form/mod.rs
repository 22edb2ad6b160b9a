//! Forms shown to players and the responses they send back.
//!
//! A form is a description only. The host renders it and answers with a
//! [`FormResponse`] whose values are positional over the form's widgets, with
//! `None` for informational widgets and untouched fields.

mod state_form;

pub use state_form::{EditSet, FieldKind, StateField, StateForm, apply_edits};

/// One element of a [`ModalForm`].
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// A heading line.
    Header(String),
    /// Plain text.
    Label(String),
    /// A horizontal rule.
    Divider,
    /// An on/off switch.
    Toggle {
        /// Field label.
        label: String,
        /// Initial position.
        default: bool,
    },
    /// An integer slider, both ends inclusive.
    Slider {
        /// Field label.
        label: String,
        /// Lowest value.
        min: i32,
        /// Highest value.
        max: i32,
        /// Initial value.
        default: i32,
    },
    /// A pick-one list. Answered with the selected index.
    Dropdown {
        /// Field label.
        label: String,
        /// The options in display order.
        options: Vec<String>,
        /// Initially selected index.
        default: usize,
    },
    /// Free text.
    TextField {
        /// Field label.
        label: String,
        /// Text shown while the field is empty.
        placeholder: String,
        /// Initial text.
        default: String,
    },
}

impl Widget {
    /// Whether the widget produces a value.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        !matches!(self, Self::Header(_) | Self::Label(_) | Self::Divider)
    }
}

/// A form of widgets with a single submit button.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalForm {
    /// The window title.
    pub title: String,
    /// Widgets in display order. A widget's index is its response slot.
    pub widgets: Vec<Widget>,
    /// Label of the submit button.
    pub submit: String,
}

impl ModalForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            widgets: Vec::new(),
            submit: "Done".to_owned(),
        }
    }

    /// Appends a widget and returns its response slot.
    pub fn push(&mut self, widget: Widget) -> usize {
        self.widgets.push(widget);
        self.widgets.len() - 1
    }

    /// Appends a text field and returns its response slot.
    pub fn text_field(&mut self, label: impl Into<String>, default: impl Into<String>) -> usize {
        self.push(Widget::TextField {
            label: label.into(),
            placeholder: String::new(),
            default: default.into(),
        })
    }
}

/// A list of buttons. Answered with [`FormResponse::Selected`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionForm {
    /// The window title.
    pub title: String,
    /// Button labels in display order.
    pub buttons: Vec<String>,
}

/// A message with two buttons. Button one answers `Selected(0)`, button two `Selected(1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageForm {
    /// The window title.
    pub title: String,
    /// The message.
    pub body: String,
    /// First button label.
    pub button1: String,
    /// Second button label.
    pub button2: String,
}

impl MessageForm {
    /// An error message. Both buttons just close it.
    #[must_use]
    pub fn error(body: impl Into<String>) -> Self {
        Self {
            title: "Error".to_owned(),
            body: body.into(),
            button1: "OK".to_owned(),
            button2: "OK".to_owned(),
        }
    }

    /// A warning asking to confirm (button one) or cancel (button two).
    #[must_use]
    pub fn confirm(body: impl Into<String>) -> Self {
        Self {
            title: "Warning".to_owned(),
            body: body.into(),
            button1: "Confirm".to_owned(),
            button2: "Cancel".to_owned(),
        }
    }
}

/// Any form the engine can ask the host to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// Widgets with a submit button.
    Modal(ModalForm),
    /// A button list.
    Action(ActionForm),
    /// A two-button message.
    Message(MessageForm),
}

impl Form {
    /// The window title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Modal(form) => &form.title,
            Self::Action(form) => &form.title,
            Self::Message(form) => &form.title,
        }
    }
}

/// A value returned for one editable widget.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// Toggle position.
    Bool(bool),
    /// Slider value.
    Number(f64),
    /// Dropdown selection.
    Index(usize),
    /// Text field content.
    Text(String),
}

/// The host's answer to a shown form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormResponse {
    /// The player closed the form.
    Cancelled,
    /// A modal form was submitted. One entry per widget.
    Submitted(Vec<Option<FormValue>>),
    /// A button was pressed.
    Selected(usize),
}
