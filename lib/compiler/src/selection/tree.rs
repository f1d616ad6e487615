use std::collections::BTreeMap;

use hive_compiler_config::runtime::{ListPosition, ListTarget};
use indexmap::IndexMap;
use serde::Serialize;

use crate::transforms::registry::ListOperationKind;
use crate::utils::value::ArgumentValue;

fn is_false(value: &bool) -> bool {
    !*value
}

/// The compiled selection set of one level of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionTree {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, SelectionNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abstract_fields: Option<AbstractFields>,
    /// Fragments spread at this level, by the name they were authored under.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fragments: IndexMap<String, FragmentReference>,
}

impl SelectionTree {
    /// Every node of the level, the common fields first and then each concrete type's bucket.
    pub fn nodes(&self) -> impl Iterator<Item = &SelectionNode> {
        self.fields.values().chain(
            self.abstract_fields
                .iter()
                .flat_map(|abstract_fields| abstract_fields.fields.values())
                .flat_map(|bucket| bucket.values()),
        )
    }
}

/// Per concrete type field maps of a selection on an interface or a union.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractFields {
    pub fields: IndexMap<String, IndexMap<String, SelectionNode>>,
    /// Concrete types reached through a type condition on another abstract type.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub type_map: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FragmentReference {
    pub arguments: BTreeMap<String, ArgumentValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionNode {
    #[serde(rename = "type")]
    pub type_name: String,
    pub key_raw: String,
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub abstract_has_required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<ListOperation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub updates: Vec<UpdateMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListReference>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, ArgumentValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<ComponentReference>,
    #[serde(skip_serializing_if = "is_false")]
    pub optimistic_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionTree>,
    #[serde(skip_serializing_if = "is_false")]
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveReference {
    pub name: String,
    pub arguments: BTreeMap<String, ArgumentValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UpdateMode {
    Append,
    Prepend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationAction {
    Insert,
    Remove,
    Toggle,
    Delete,
}

impl From<ListOperationKind> for OperationAction {
    fn from(kind: ListOperationKind) -> Self {
        match kind {
            ListOperationKind::Insert => OperationAction::Insert,
            ListOperationKind::Remove => OperationAction::Remove,
            ListOperationKind::Toggle => OperationAction::Toggle,
        }
    }
}

/// A change the runtime applies to a list, or a record deletion, once the response arrives.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOperation {
    pub action: OperationAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<ListPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<ListTarget>,
    #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ArgumentValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub when: Option<ListWhen>,
}

/// The list arguments an operation is restricted to, from `@when` and `@when_not`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWhen {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub must: BTreeMap<String, ArgumentValue>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub must_not: BTreeMap<String, ArgumentValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReference {
    pub name: String,
    pub connection: bool,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prop: Option<String>,
    /// `Type.field` of the component field in the schema.
    pub key: String,
    pub fragment: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, ArgumentValue>,
}
