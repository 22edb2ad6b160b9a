//! Semantic shapes of block state domains.
//!
//! A domain is the ordered list of legal values of one state attribute. Its
//! shape decides which widget edits it: a toggle, a slider or a dropdown.

mod domains;

pub use domains::{StateDomainRegistry, StateDomains};

use crate::world::StateValue;

/// The derived shape of a state domain. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateShape {
    /// Every value is a boolean.
    Boolean,
    /// A contiguous run of integers, both ends inclusive.
    Range {
        /// Lowest value.
        min: i32,
        /// Highest value.
        max: i32,
    },
    /// Anything else, in domain order.
    Enumeration {
        /// The legal values.
        values: Vec<StateValue>,
    },
}

impl StateShape {
    /// Whether `value` belongs to this shape.
    #[must_use]
    pub fn admits(&self, value: &StateValue) -> bool {
        match self {
            Self::Boolean => value.as_bool().is_some(),
            Self::Range { min, max } => value.as_int().is_some_and(|v| (*min..=*max).contains(&v)),
            Self::Enumeration { values } => values.contains(value),
        }
    }
}

/// Classifies a domain.
///
/// An empty domain is an enumeration with zero options.
#[must_use]
pub fn classify(domain: &[StateValue]) -> StateShape {
    if domain.is_empty() {
        return StateShape::Enumeration { values: Vec::new() };
    }

    if domain.iter().all(|value| value.as_bool().is_some()) {
        return StateShape::Boolean;
    }

    let ints: Option<Vec<i32>> = domain.iter().map(StateValue::as_int).collect();
    if let Some(ints) = ints {
        let min = ints.iter().copied().min().unwrap_or_default();
        let max = ints.iter().copied().max().unwrap_or_default();
        if i64::from(max) - i64::from(min) + 1 == ints.len() as i64 {
            return StateShape::Range { min, max };
        }
    }

    StateShape::Enumeration {
        values: domain.to_vec(),
    }
}
