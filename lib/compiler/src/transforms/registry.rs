use std::collections::{BTreeMap, HashMap};

use graphql_parser::query::{FragmentDefinition, Value};
use indexmap::IndexMap;
use serde::Serialize;

use crate::directives;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListOperationKind {
    Insert,
    Remove,
    Toggle,
}

impl ListOperationKind {
    pub fn fragment_name(&self, list_name: &str) -> String {
        let suffix = match self {
            ListOperationKind::Insert => directives::INSERT_SUFFIX,
            ListOperationKind::Remove => directives::REMOVE_SUFFIX,
            ListOperationKind::Toggle => directives::TOGGLE_SUFFIX,
        };
        format!("{}{}", list_name, suffix)
    }
}

/// A list declared with `@list(name:)` or `@paginate(name:)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDefinition {
    pub name: String,
    /// The type of the records held by the list.
    pub type_name: String,
    pub connection: bool,
    pub filepath: String,
}

/// A fragment clone with its arguments resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentVariant {
    pub fragment: String,
    pub arguments: BTreeMap<String, Value<'static, String>>,
}

/// Everything the transforms generate that outlives a single document.
#[derive(Debug, Default)]
pub struct FragmentRegistry {
    generated: IndexMap<String, FragmentDefinition<'static, String>>,
    variants: HashMap<String, FragmentVariant>,
    lists: IndexMap<String, ListDefinition>,
}

impl FragmentRegistry {
    /// Returns false when the name is already taken.
    pub fn add_list(&mut self, list: ListDefinition) -> bool {
        if self.lists.contains_key(&list.name) {
            return false;
        }
        self.lists.insert(list.name.clone(), list);
        true
    }

    pub fn list(&self, name: &str) -> Option<&ListDefinition> {
        self.lists.get(name)
    }

    pub fn lists(&self) -> impl Iterator<Item = &ListDefinition> {
        self.lists.values()
    }

    /// Resolves `All_Users_insert` to the `All_Users` list and the insert operation.
    pub fn list_operation(&self, fragment_name: &str) -> Option<(&ListDefinition, ListOperationKind)> {
        [
            (directives::INSERT_SUFFIX, ListOperationKind::Insert),
            (directives::REMOVE_SUFFIX, ListOperationKind::Remove),
            (directives::TOGGLE_SUFFIX, ListOperationKind::Toggle),
        ]
        .into_iter()
        .find_map(|(suffix, kind)| {
            fragment_name
                .strip_suffix(suffix)
                .and_then(|list_name| self.lists.get(list_name))
                .map(|list| (list, kind))
        })
    }

    pub fn add_generated(&mut self, definition: FragmentDefinition<'static, String>) {
        if !self.generated.contains_key(&definition.name) {
            self.generated.insert(definition.name.clone(), definition);
        }
    }

    pub fn is_generated(&self, name: &str) -> bool {
        self.generated.contains_key(name)
    }

    pub fn generated_fragments(&self) -> impl Iterator<Item = &FragmentDefinition<'static, String>> {
        self.generated.values()
    }

    pub fn add_variant(&mut self, name: String, variant: FragmentVariant) {
        self.variants.insert(name, variant);
    }

    pub fn variant(&self, name: &str) -> Option<&FragmentVariant> {
        self.variants.get(name)
    }

    /// The name the fragment was authored under.
    pub fn original_fragment_name<'n>(&'n self, name: &'n str) -> &'n str {
        self.variant(name)
            .map(|variant| variant.fragment.as_str())
            .unwrap_or(name)
    }
}
