//! Per-path state: which unsafe channels of each interesting field have been
//! cleared along the current path.

use super::facts::{FieldFacts, FieldId};

/// Cleared channels of one field. Every transition returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicState {
    cleared_unsafe_properties: im::OrdSet<String>,
    target_cleared: bool,
    observer_cleared: bool,
}

impl DynamicState {
    /// Every channel the facts know about is already cleared.
    pub fn all_cleared(facts: &FieldFacts) -> Self {
        Self {
            cleared_unsafe_properties: facts
                .unsafe_properties_that_may_hold_self
                .iter()
                .cloned()
                .collect(),
            target_cleared: facts.may_target_self,
            observer_cleared: facts.may_observe_self,
        }
    }

    pub fn cleared_unsafe_properties(&self) -> &im::OrdSet<String> {
        &self.cleared_unsafe_properties
    }

    pub fn is_property_cleared(&self, property: &str) -> bool {
        self.cleared_unsafe_properties.contains(property)
    }

    pub fn target_cleared(&self) -> bool {
        self.target_cleared
    }

    pub fn observer_cleared(&self) -> bool {
        self.observer_cleared
    }

    pub fn with_property_cleared(&self, property: &str) -> Self {
        Self {
            cleared_unsafe_properties: self.cleared_unsafe_properties.update(property.to_string()),
            ..self.clone()
        }
    }

    /// `self` was stored into the property again.
    pub fn with_property_uncleared(&self, property: &str) -> Self {
        Self {
            cleared_unsafe_properties: self.cleared_unsafe_properties.without(property),
            ..self.clone()
        }
    }

    pub fn with_target_cleared(&self) -> Self {
        Self {
            target_cleared: true,
            ..self.clone()
        }
    }

    pub fn with_observer_cleared(&self) -> Self {
        Self {
            observer_cleared: true,
            ..self.clone()
        }
    }

    /// What is cleared on both of two converging paths.
    pub fn meet(&self, other: &Self) -> Self {
        Self {
            cleared_unsafe_properties: self
                .cleared_unsafe_properties
                .clone()
                .intersection(other.cleared_unsafe_properties.clone()),
            target_cleared: self.target_cleared && other.target_cleared,
            observer_cleared: self.observer_cleared && other.observer_cleared,
        }
    }
}

/// Everything the checker stores on one path.
///
/// A field without an entry has had nothing cleared. `initial_state_applied`
/// and `current_class` are set at the first statement of the method, since
/// the host has no start-of-method callback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelegatePathState {
    fields: im::HashMap<FieldId, DynamicState>,
    initial_state_applied: bool,
    current_class: Option<String>,
}

impl DelegatePathState {
    pub fn get(&self, field: &FieldId) -> Option<&DynamicState> {
        self.fields.get(field)
    }

    /// State of `field`, absent meaning nothing cleared.
    pub fn field(&self, field: &FieldId) -> DynamicState {
        self.get(field).cloned().unwrap_or_default()
    }

    pub fn with_field(&self, field: FieldId, state: DynamicState) -> Self {
        Self {
            fields: self.fields.update(field, state),
            ..self.clone()
        }
    }

    pub fn initial_state_applied(&self) -> bool {
        self.initial_state_applied
    }

    pub fn current_class(&self) -> Option<&str> {
        self.current_class.as_deref()
    }

    pub fn with_initial_state(&self, class: &str) -> Self {
        Self {
            initial_state_applied: true,
            current_class: Some(class.to_string()),
            ..self.clone()
        }
    }

    /// Merge of two converging paths: a field keeps only what both cleared.
    pub fn meet(&self, other: &Self) -> Self {
        let fields = self
            .fields
            .iter()
            .filter_map(|(field, state)| {
                other
                    .fields
                    .get(field)
                    .map(|theirs| (field.clone(), state.meet(theirs)))
            })
            .collect();
        Self {
            fields,
            initial_state_applied: self.initial_state_applied && other.initial_state_applied,
            current_class: self.current_class.clone().or_else(|| other.current_class.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(properties: &[&str]) -> FieldFacts {
        FieldFacts {
            unsafe_properties_that_may_hold_self: properties
                .iter()
                .map(|p| p.to_string())
                .collect(),
            may_target_self: true,
            may_observe_self: false,
        }
    }

    #[test]
    fn test_clear_then_store_self_again_leaves_property_uncleared() {
        let state = DynamicState::default()
            .with_property_cleared("delegate")
            .with_property_uncleared("delegate");
        assert!(!state.is_property_cleared("delegate"));
    }

    #[test]
    fn test_transitions_do_not_mutate_the_original() {
        let original = DynamicState::default();
        let cleared = original.with_property_cleared("delegate").with_target_cleared();
        assert_eq!(original, DynamicState::default());
        assert!(cleared.is_property_cleared("delegate"));
        assert!(cleared.target_cleared());
    }

    #[test]
    fn test_all_cleared_mirrors_facts() {
        let state = DynamicState::all_cleared(&facts(&["delegate", "dataSource"]));
        assert!(state.is_property_cleared("delegate"));
        assert!(state.is_property_cleared("dataSource"));
        assert!(state.target_cleared());
        assert!(!state.observer_cleared());
    }

    #[test]
    fn test_absent_field_reads_as_nothing_cleared() {
        let path = DelegatePathState::default();
        assert_eq!(path.field(&FieldId::new("_bar")), DynamicState::default());
        assert!(path.get(&FieldId::new("_bar")).is_none());
    }

    #[test]
    fn test_meet_drops_fields_missing_on_one_side() {
        let cleared = DynamicState::default().with_property_cleared("delegate");
        let left = DelegatePathState::default()
            .with_field(FieldId::new("_a"), cleared.clone())
            .with_field(FieldId::new("_b"), cleared.clone());
        let right = DelegatePathState::default().with_field(FieldId::new("_a"), cleared.clone());
        let merged = left.meet(&right);
        assert_eq!(merged.get(&FieldId::new("_a")), Some(&cleared));
        assert!(merged.get(&FieldId::new("_b")).is_none());
    }
}
