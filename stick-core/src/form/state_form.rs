//! The block state editor form.
//!
//! Every editable widget is bound to a [`StateField`] naming its response
//! slot, so reconciling a response never depends on how many other slots were
//! left empty.

use stick_utils::{BlockPos, ResourceLocation};

use super::{FormValue, ModalForm, Widget};
use crate::error::{FormError, StickError, WorldError};
use crate::state::{StateDomains, StateShape, classify};
use crate::world::{Block, Dimension, StateValue};

/// What an editable widget of the state form edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// The liquid flag.
    Waterlogged,
    /// A state attribute and the shape its widget was built from.
    State {
        /// Attribute name.
        name: String,
        /// Classified domain.
        shape: StateShape,
    },
}

/// An editable widget bound to its response slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateField {
    /// Index of the widget in the form, and of its value in the response.
    pub slot: usize,
    /// What the widget edits.
    pub kind: FieldKind,
}

impl StateField {
    fn name(&self) -> &str {
        match &self.kind {
            FieldKind::Waterlogged => "waterlogged",
            FieldKind::State { name, .. } => name,
        }
    }
}

/// Edits reconciled from a state form response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSet {
    /// New liquid flag, if the field was answered.
    pub waterlogged: Option<bool>,
    /// New attribute values, in form order.
    pub states: Vec<(String, StateValue)>,
}

impl EditSet {
    /// Whether the set carries no edit at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waterlogged.is_none() && self.states.is_empty()
    }
}

/// A built state editor for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct StateForm {
    /// The form to show.
    pub form: ModalForm,
    /// Editable fields in construction order.
    pub fields: Vec<StateField>,
    /// The edited block.
    pub pos: BlockPos,
    /// The block type at build time.
    pub type_id: ResourceLocation,
}

impl StateForm {
    /// Builds the editor for `block`.
    ///
    /// Informational widgets come first, then the liquid toggle when the block
    /// can hold liquid, then one widget per state in the block's own order.
    /// States whose domain is empty get no widget.
    #[must_use]
    pub fn build(block: &Block, domains: &dyn StateDomains) -> Self {
        let mut form = ModalForm::new("Debug Stick");
        let mut fields = Vec::new();

        form.push(Widget::Header(block.type_id().to_string()));
        form.push(Widget::Divider);
        form.push(Widget::Label(format!("Name: {}", block.type_id().path)));
        form.push(Widget::Label(format!("Position: {}", block.pos)));
        form.push(Widget::Label(match block.redstone_power {
            Some(power) => format!("Redstone power: {power}"),
            None => "Redstone power: unpowerable".to_owned(),
        }));
        if !block.tags.is_empty() {
            form.push(Widget::Label("Tags:".to_owned()));
            for tag in &block.tags {
                form.push(Widget::Label(format!("    #{tag}")));
            }
        }
        form.push(Widget::Divider);

        if block.can_contain_liquid {
            let slot = form.push(Widget::Toggle {
                label: "waterlogged".to_owned(),
                default: block.waterlogged,
            });
            fields.push(StateField {
                slot,
                kind: FieldKind::Waterlogged,
            });
        }

        for (name, value) in block.permutation.states() {
            let shape = classify(domains.domain(name));
            let widget = match &shape {
                StateShape::Boolean => Widget::Toggle {
                    label: name.clone(),
                    default: value.as_bool().unwrap_or_default(),
                },
                StateShape::Range { min, max } => Widget::Slider {
                    label: name.clone(),
                    min: *min,
                    max: *max,
                    default: value.as_int().map_or(*min, |v| v.clamp(*min, *max)),
                },
                StateShape::Enumeration { values } if values.is_empty() => {
                    log::debug!("No legal values known for `{name}`, leaving it out");
                    continue;
                }
                StateShape::Enumeration { values } => Widget::Dropdown {
                    label: name.clone(),
                    options: values.iter().map(ToString::to_string).collect(),
                    default: values.iter().position(|v| v == value).unwrap_or(0),
                },
            };
            let slot = form.push(widget);
            fields.push(StateField {
                slot,
                kind: FieldKind::State {
                    name: name.clone(),
                    shape,
                },
            });
        }

        Self {
            form,
            fields,
            pos: block.pos,
            type_id: block.type_id().clone(),
        }
    }

    /// Turns submitted values into edits.
    ///
    /// Each field reads its own slot, and an absent slot yields no edit. Any
    /// malformed value rejects the whole response.
    pub fn reconcile(&self, values: &[Option<FormValue>]) -> Result<EditSet, FormError> {
        let mut edits = EditSet::default();

        for field in &self.fields {
            let Some(value) = values.get(field.slot).and_then(Option::as_ref) else {
                continue;
            };
            let mismatch = || FormError::Mismatch {
                field: field.name().to_owned(),
            };

            match (&field.kind, value) {
                (FieldKind::Waterlogged, FormValue::Bool(waterlogged)) => {
                    edits.waterlogged = Some(*waterlogged);
                }
                (FieldKind::State { name, shape }, value) => {
                    let value = shape_value(name, shape, value).ok_or_else(mismatch)??;
                    edits.states.push((name.clone(), value));
                }
                (FieldKind::Waterlogged, _) => return Err(mismatch()),
            }
        }

        Ok(edits)
    }
}

/// Maps a widget answer back into a state value. `None` means the answer has
/// the wrong kind for the shape.
fn shape_value(
    name: &str,
    shape: &StateShape,
    value: &FormValue,
) -> Option<Result<StateValue, FormError>> {
    match (shape, value) {
        (StateShape::Boolean, FormValue::Bool(value)) => Some(Ok(StateValue::Bool(*value))),
        (StateShape::Range { min, max }, FormValue::Number(number)) => {
            if number.fract() != 0.0 || *number < f64::from(*min) || *number > f64::from(*max) {
                return Some(Err(FormError::OutOfRange {
                    field: name.to_owned(),
                    value: number.to_string(),
                }));
            }
            Some(Ok(StateValue::Int(*number as i32)))
        }
        (StateShape::Enumeration { values }, FormValue::Index(index)) => {
            Some(values.get(*index).cloned().ok_or(FormError::NoSuchOption {
                field: name.to_owned(),
                index: *index,
            }))
        }
        _ => None,
    }
}

/// Applies `edits` to the block at `pos`.
///
/// The block is queried again and the edit is refused if its type is no longer
/// `expected_type`. Every value is checked against its domain before anything
/// is written. The liquid flag is written first, then each attribute whose
/// value differs from the current one. Returns the number of writes.
pub fn apply_edits(
    dimension: &mut dyn Dimension,
    pos: BlockPos,
    expected_type: &ResourceLocation,
    edits: &EditSet,
    domains: &dyn StateDomains,
) -> Result<usize, StickError> {
    let block = dimension.get_block(pos)?;
    if !block.is(expected_type) {
        return Err(StickError::StaleTarget(pos));
    }

    for (name, value) in &edits.states {
        if block.permutation.get_state(name).is_none() {
            return Err(WorldError::UnknownState {
                block: block.type_id().to_string(),
                state: name.clone(),
            }
            .into());
        }
        if !classify(domains.domain(name)).admits(value) {
            return Err(WorldError::IllegalValue {
                state: name.clone(),
                value: value.clone(),
            }
            .into());
        }
    }

    let mut writes = 0;
    if let Some(waterlogged) = edits.waterlogged
        && block.can_contain_liquid
        && block.waterlogged != waterlogged
    {
        dimension.set_waterlogged(pos, waterlogged)?;
        writes += 1;
    }

    let mut permutation = block.permutation;
    for (name, value) in &edits.states {
        if permutation.get_state(name) == Some(value) {
            continue;
        }
        permutation = permutation.with_state(name, value.clone())?;
        dimension.set_permutation(pos, permutation.clone())?;
        writes += 1;
    }

    if writes > 0 {
        log::debug!("Applied {writes} edits to {} at {pos}", permutation.type_id());
    }
    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateDomainRegistry;
    use crate::world::memory::MemoryDimension;
    use crate::world::memory::tests::dimension;

    fn domains() -> StateDomainRegistry {
        StateDomainRegistry::vanilla().unwrap()
    }

    fn placed(type_id: &str) -> (MemoryDimension, Block) {
        let mut dim = dimension();
        let pos = BlockPos::new(2, 0, 2);
        dim.set_type(pos, type_id).unwrap();
        let block = dim.get_block(pos).unwrap();
        (dim, block)
    }

    /// The defaults of every widget, as an unchanged submission would send them.
    fn defaults(form: &ModalForm) -> Vec<Option<FormValue>> {
        form.widgets
            .iter()
            .map(|widget| match widget {
                Widget::Toggle { default, .. } => Some(FormValue::Bool(*default)),
                Widget::Slider { default, .. } => Some(FormValue::Number(f64::from(*default))),
                Widget::Dropdown { default, .. } => Some(FormValue::Index(*default)),
                Widget::TextField { default, .. } => Some(FormValue::Text(default.clone())),
                Widget::Header(_) | Widget::Label(_) | Widget::Divider => None,
            })
            .collect()
    }

    #[test]
    fn test_widget_per_shape() {
        let (_, block) = placed("candle");
        let form = StateForm::build(&block, &domains());

        let editable: Vec<&Widget> = form.form.widgets.iter().filter(|w| w.is_editable()).collect();
        assert!(matches!(editable[0], Widget::Toggle { label, .. } if label == "waterlogged"));
        assert!(matches!(editable[1], Widget::Slider { min: 0, max: 3, .. }));
        assert!(matches!(editable[2], Widget::Toggle { label, .. } if label == "lit"));
        assert_eq!(form.fields.len(), 3);
        assert_eq!(form.fields[0].kind, FieldKind::Waterlogged);
    }

    #[test]
    fn test_informational_widgets() {
        let (_, block) = placed("hopper");
        let form = StateForm::build(&block, &domains());
        assert_eq!(form.form.widgets[0], Widget::Header("minecraft:hopper".to_owned()));
        assert!(form.form.widgets.contains(&Widget::Label("Redstone power: 0".to_owned())));

        let (_, block) = placed("stone");
        let form = StateForm::build(&block, &domains());
        assert!(
            form.form
                .widgets
                .contains(&Widget::Label("Redstone power: unpowerable".to_owned()))
        );
        assert!(form.fields.is_empty());
    }

    #[test]
    fn test_enumeration_dropdown_maps_index_back() {
        let (_, block) = placed("chest");
        let domains = domains();
        let form = StateForm::build(&block, &domains);
        let field = &form.fields[1];
        let Widget::Dropdown { options, default, .. } = &form.form.widgets[field.slot] else {
            panic!("expected a dropdown");
        };
        assert_eq!(options[*default], "north");

        let mut values = vec![None; form.form.widgets.len()];
        values[field.slot] = Some(FormValue::Index(3));
        let edits = form.reconcile(&values).unwrap();
        assert_eq!(
            edits.states,
            vec![("minecraft:cardinal_direction".to_owned(), StateValue::from("east"))]
        );
        assert_eq!(edits.waterlogged, None);
    }

    #[test]
    fn test_empty_domain_has_no_widget() {
        let (_, block) = placed("wheat");
        let form = StateForm::build(&block, &StateDomainRegistry::default());
        assert!(form.fields.is_empty());
        assert!(form.form.widgets.iter().all(|w| !w.is_editable()));
    }

    #[test]
    fn test_absent_slot_does_not_shift_fields() {
        let (mut dim, block) = placed("wooden_door");
        let domains = domains();
        let form = StateForm::build(&block, &domains);

        // Leave the first state untouched and answer only the last one.
        let mut values = vec![None; form.form.widgets.len()];
        let last = form.fields.last().unwrap();
        values[last.slot] = Some(FormValue::Bool(true));

        let edits = form.reconcile(&values).unwrap();
        assert_eq!(edits.states, vec![("upper_block_bit".to_owned(), StateValue::Bool(true))]);

        apply_edits(&mut dim, block.pos, &form.type_id, &edits, &domains).unwrap();
        let door = dim.get_block(block.pos).unwrap();
        assert_eq!(door.permutation.get_state("direction"), Some(&StateValue::Int(0)));
        assert_eq!(door.permutation.get_state("upper_block_bit"), Some(&StateValue::Bool(true)));
    }

    #[test]
    fn test_malformed_values_reject_response() {
        let (_, block) = placed("wheat");
        let form = StateForm::build(&block, &domains());
        let slot = form.fields[0].slot;

        let mut values = vec![None; form.form.widgets.len()];
        values[slot] = Some(FormValue::Number(9.0));
        assert!(matches!(form.reconcile(&values), Err(FormError::OutOfRange { .. })));

        values[slot] = Some(FormValue::Number(2.5));
        assert!(matches!(form.reconcile(&values), Err(FormError::OutOfRange { .. })));

        values[slot] = Some(FormValue::Bool(true));
        assert!(matches!(form.reconcile(&values), Err(FormError::Mismatch { .. })));

        values[slot] = Some(FormValue::Number(7.0));
        let edits = form.reconcile(&values).unwrap();
        assert_eq!(edits.states, vec![("growth".to_owned(), StateValue::Int(7))]);

        let (dim, chest) = placed("chest");
        let form = StateForm::build(&chest, &domains());
        let direction = form
            .fields
            .iter()
            .find(|field| field.name() == "minecraft:cardinal_direction")
            .unwrap();
        let mut values = defaults(&form.form);
        values[form.fields[0].slot] = Some(FormValue::Bool(true));
        values[direction.slot] = Some(FormValue::Index(99));
        assert!(matches!(
            form.reconcile(&values),
            Err(FormError::NoSuchOption { index: 99, .. })
        ));
        assert_eq!(dim.get_block(chest.pos).unwrap(), chest);
    }

    #[test]
    fn test_unchanged_submission_is_idempotent() {
        let (mut dim, block) = placed("sea_pickle");
        let domains = domains();
        let form = StateForm::build(&block, &domains);

        let edits = form.reconcile(&defaults(&form.form)).unwrap();
        assert!(!edits.is_empty());
        assert_eq!(apply_edits(&mut dim, block.pos, &form.type_id, &edits, &domains), Ok(0));
        assert_eq!(dim.get_block(block.pos).unwrap(), block);
    }

    #[test]
    fn test_waterlogged_written_first() {
        let (mut dim, block) = placed("oak_stairs");
        let domains = domains();
        let form = StateForm::build(&block, &domains);

        let mut values = defaults(&form.form);
        values[form.fields[0].slot] = Some(FormValue::Bool(true));
        values[form.fields[1].slot] = Some(FormValue::Bool(true));
        let edits = form.reconcile(&values).unwrap();

        assert_eq!(apply_edits(&mut dim, block.pos, &form.type_id, &edits, &domains), Ok(2));
        let stairs = dim.get_block(block.pos).unwrap();
        assert!(stairs.waterlogged);
        assert_eq!(stairs.permutation.get_state("upside_down_bit"), Some(&StateValue::Bool(true)));
    }

    #[test]
    fn test_stale_target_is_refused() {
        let (mut dim, block) = placed("wheat");
        let domains = domains();
        let form = StateForm::build(&block, &domains);
        dim.set_type(block.pos, "stone").unwrap();

        let edits = EditSet {
            waterlogged: None,
            states: vec![("growth".to_owned(), StateValue::Int(3))],
        };
        assert_eq!(
            apply_edits(&mut dim, block.pos, &form.type_id, &edits, &domains),
            Err(StickError::StaleTarget(block.pos))
        );
    }

    #[test]
    fn test_illegal_value_writes_nothing() {
        let (mut dim, block) = placed("candle");
        let domains = domains();
        let edits = EditSet {
            waterlogged: Some(true),
            states: vec![
                ("candles".to_owned(), StateValue::Int(2)),
                ("lit".to_owned(), StateValue::Int(1)),
            ],
        };

        let err = apply_edits(&mut dim, block.pos, block.type_id(), &edits, &domains).unwrap_err();
        assert!(matches!(err, StickError::World(WorldError::IllegalValue { .. })));
        assert_eq!(dim.get_block(block.pos).unwrap(), block);
    }
}
