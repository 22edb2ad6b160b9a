//! Lookup of legal values per state attribute.

use rustc_hash::FxHashMap;

use crate::world::StateValue;

const VANILLA_BLOCK_STATES: &str = include_str!("../../../package-content/block_states.json");

/// Supplies the domain of a state attribute by name.
pub trait StateDomains {
    /// The ordered legal values of `state`. Unknown attributes have an empty domain.
    fn domain(&self, state: &str) -> &[StateValue];
}

/// Domains loaded from a JSON object of attribute name to value list.
#[derive(Debug, Clone, Default)]
pub struct StateDomainRegistry {
    domains: FxHashMap<String, Vec<StateValue>>,
}

impl StateDomainRegistry {
    /// Loads the bundled vanilla table.
    pub fn vanilla() -> Result<Self, serde_json::Error> {
        Self::from_json(VANILLA_BLOCK_STATES)
    }

    /// Parses a domain table.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let domains: FxHashMap<String, Vec<StateValue>> = serde_json::from_str(json)?;
        log::debug!("Loaded {} state domains", domains.len());
        Ok(Self { domains })
    }

    /// Adds or replaces a domain.
    pub fn insert(&mut self, state: impl Into<String>, values: Vec<StateValue>) {
        self.domains.insert(state.into(), values);
    }
}

impl StateDomains for StateDomainRegistry {
    fn domain(&self, state: &str) -> &[StateValue] {
        self.domains.get(state).map_or(&[], Vec::as_slice)
    }
}
