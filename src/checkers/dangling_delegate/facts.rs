//! Class-wide facts found by the syntactic scan.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A field of the analyzed class, by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ways in which the object stored in one field may come to reference `self`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldFacts {
    /// Non-owning properties of the field's object that were passed `self`.
    pub unsafe_properties_that_may_hold_self: BTreeSet<String>,
    pub may_target_self: bool,
    pub may_observe_self: bool,
}

impl FieldFacts {
    pub fn is_empty(&self) -> bool {
        self.unsafe_properties_that_may_hold_self.is_empty()
            && !self.may_target_self
            && !self.may_observe_self
    }
}

/// Immutable result of scanning one class implementation.
///
/// Only fields with at least one observed unsafe channel have an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassFacts {
    field_facts: BTreeMap<FieldId, FieldFacts>,
    pseudo_init_methods: BTreeSet<String>,
    has_teardown_method: bool,
    /// Informational: methods registering `self` with a shared singleton.
    shared_observer_facts: BTreeMap<String, BTreeSet<String>>,
}

impl ClassFacts {
    pub fn builder() -> ClassFactsBuilder {
        ClassFactsBuilder::default()
    }

    pub fn field_facts(&self, field: &FieldId) -> Option<&FieldFacts> {
        self.field_facts.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&FieldId, &FieldFacts)> {
        self.field_facts.iter()
    }

    pub fn is_interesting(&self, field: &FieldId) -> bool {
        self.field_facts.contains_key(field)
    }

    pub fn has_interesting_fields(&self) -> bool {
        !self.field_facts.is_empty()
    }

    pub fn is_pseudo_init(&self, method: &str) -> bool {
        self.pseudo_init_methods.contains(method)
    }

    pub fn pseudo_init_methods(&self) -> &BTreeSet<String> {
        &self.pseudo_init_methods
    }

    pub fn has_teardown_method(&self) -> bool {
        self.has_teardown_method
    }

    pub fn shared_observer_facts(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.shared_observer_facts
    }
}

/// Accumulates facts during a scan; every recording is an idempotent union.
#[derive(Debug, Default)]
pub struct ClassFactsBuilder {
    facts: ClassFacts,
}

impl ClassFactsBuilder {
    fn field(&mut self, field: FieldId) -> &mut FieldFacts {
        self.facts.field_facts.entry(field).or_default()
    }

    pub fn field_may_store_self_in_unsafe_property(&mut self, field: FieldId, property: &str) {
        self.field(field)
            .unsafe_properties_that_may_hold_self
            .insert(property.to_string());
    }

    pub fn field_may_target_self(&mut self, field: FieldId) {
        self.field(field).may_target_self = true;
    }

    pub fn field_may_observe_self(&mut self, field: FieldId) {
        self.field(field).may_observe_self = true;
    }

    pub fn shared_object_may_observe_self_in_method(&mut self, singleton: &str, method: &str) {
        self.facts
            .shared_observer_facts
            .entry(singleton.to_string())
            .or_default()
            .insert(method.to_string());
    }

    pub fn pseudo_init_method(&mut self, method: &str) {
        self.facts.pseudo_init_methods.insert(method.to_string());
    }

    pub fn teardown_method(&mut self) {
        self.facts.has_teardown_method = true;
    }

    pub fn build(mut self) -> ClassFacts {
        self.facts.field_facts.retain(|_, facts| !facts.is_empty());
        self.facts
    }
}

/// Facts per class name for one translation unit.
///
/// Filled once per class ahead of path exploration, read-only afterwards,
/// emptied at the end of the translation unit.
#[derive(Debug, Default)]
pub struct ClassFactsCache {
    classes: HashMap<String, ClassFacts>,
}

impl ClassFactsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, leaving the cache untouched, when `class` already has
    /// an entry.
    pub fn insert_if_absent(&mut self, class: impl Into<String>, facts: ClassFacts) -> bool {
        match self.classes.entry(class.into()) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(facts);
                true
            }
        }
    }

    pub fn get(&self, class: &str) -> Option<&ClassFacts> {
        self.classes.get(class)
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn clear(&mut self) {
        self.classes.clear();
    }
}
