//! Compiles the final AST of a document into its selection tree.
//!
//! Fragment spreads and inline fragments are flattened into the level they appear in. Under an
//! abstract type every concrete type named by a type condition gets its own field map, which
//! holds the unconditional fields too.

pub mod field_key;
pub mod tree;

use std::collections::{BTreeMap, HashMap};

use graphql_parser::query::{
    Definition, Directive, Field, FragmentDefinition, FragmentSpread, Selection, SelectionSet,
    TypeCondition,
};
use hive_compiler_config::runtime::{FragmentMasking, ListPosition, ListTarget};
use hive_compiler_config::CompilerConfig;
use indexmap::IndexMap;
use tracing::{instrument, trace, warn};

use crate::artifact::refetch::{PaginationMethod, Refetch};
use crate::directives;
use crate::documents::Document;
use crate::error::CompilerError;
use crate::schema::SchemaState;
use crate::transforms::context::definition_root_type;
use crate::transforms::pipeline::{is_pagination_argument, list_name};
use crate::transforms::registry::FragmentRegistry;
use crate::utils::ast::{
    definition_selection_set, directive_argument, find_directive, fragment_type_condition,
    has_directive, is_generated, response_key, TypeExt,
};
use crate::utils::value::{value_as_str, ArgumentValue};
use field_key::{field_key, key_raw};
use tree::{
    AbstractFields, ComponentReference, DirectiveReference, FragmentReference, ListOperation,
    ListReference, ListWhen, OperationAction, SelectionNode, SelectionTree, UpdateMode,
};

const COMPONENT_TYPE: &str = "Component";

/// Compiles the main definition of a document.
#[instrument(level = "trace", skip_all, fields(document = %document.name))]
pub fn compile_selection(
    config: &CompilerConfig,
    schema: &SchemaState,
    registry: &FragmentRegistry,
    document: &Document,
) -> Result<SelectionTree, CompilerError> {
    let definition = document.main_definition().ok_or_else(|| {
        CompilerError::structural("Document does not contain any definition")
            .with_filepath(&document.filepath)
    })?;
    let root_type = definition_root_type(schema, document.kind, definition).ok_or_else(|| {
        CompilerError::type_resolution(format!(
            "The schema does not define a {} type",
            document.kind
        ))
        .with_filepath(&document.filepath)
    })?;

    let fragments = document
        .document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            Definition::Fragment(fragment) => Some((fragment.name.as_str(), fragment)),
            Definition::Operation(_) => None,
        })
        .collect();

    let compiler = SelectionCompiler {
        config,
        schema,
        registry,
        fragments,
        refetch: document.refetch.as_ref(),
    };

    let mut level = Level::default();
    compiler
        .collect(definition_selection_set(definition), None, true, &[], &mut level)
        .map_err(|error| error.or_filepath(&document.filepath))?;
    if !level.operations.is_empty() {
        trace!(count = level.operations.len(), "ignoring list operations outside of a field");
    }

    let (tree, _) = compiler
        .build_tree(root_type, level, &[])
        .map_err(|error| error.or_filepath(&document.filepath))?;
    Ok(tree)
}

struct SelectionCompiler<'a> {
    config: &'a CompilerConfig,
    schema: &'a SchemaState,
    registry: &'a FragmentRegistry,
    fragments: HashMap<&'a str, &'a FragmentDefinition<'static, String>>,
    refetch: Option<&'a Refetch>,
}

/// A selection reached while flattening one level.
enum Collected<'a> {
    Field {
        condition: Option<&'a str>,
        field: &'a Field<'static, String>,
        visible: bool,
        /// Fragments being expanded when the field was reached.
        stack: Vec<&'a str>,
    },
    Component {
        condition: Option<&'a str>,
        spread: &'a FragmentSpread<'static, String>,
        fragment: &'a FragmentDefinition<'static, String>,
        visible: bool,
    },
}

impl Collected<'_> {
    fn condition(&self) -> Option<&str> {
        match self {
            Collected::Field { condition, .. } | Collected::Component { condition, .. } => {
                *condition
            }
        }
    }
}

#[derive(Default)]
struct Level<'a> {
    items: Vec<Collected<'a>>,
    /// Type conditions in the order they were met.
    conditions: Vec<&'a str>,
    fragments: IndexMap<String, FragmentReference>,
    operations: Vec<ListOperation>,
}

struct Occurrence<'a> {
    field: &'a Field<'static, String>,
    visible: bool,
    stack: Vec<&'a str>,
}

/// Every occurrence of one response key in a field map.
enum Group<'a> {
    Fields {
        key_raw: String,
        occurrences: Vec<Occurrence<'a>>,
    },
    Component(SelectionNode),
}

impl Group<'_> {
    fn generated(&self) -> bool {
        match self {
            Group::Fields { occurrences, .. } => occurrences
                .iter()
                .all(|occurrence| is_generated(&occurrence.field.directives)),
            Group::Component(_) => false,
        }
    }
}

impl<'a> SelectionCompiler<'a> {
    fn collect(
        &self,
        selection_set: &'a SelectionSet<'static, String>,
        condition: Option<&'a str>,
        visible: bool,
        stack: &[&'a str],
        level: &mut Level<'a>,
    ) -> Result<(), CompilerError> {
        for item in &selection_set.items {
            match item {
                Selection::Field(field) => level.items.push(Collected::Field {
                    condition,
                    field,
                    visible: visible && !is_generated(&field.directives),
                    stack: stack.to_vec(),
                }),
                Selection::InlineFragment(inline) => {
                    let condition = match &inline.type_condition {
                        Some(TypeCondition::On(type_name)) => {
                            push_condition(level, type_name);
                            Some(type_name.as_str())
                        }
                        None => condition,
                    };
                    self.collect(
                        &inline.selection_set,
                        condition,
                        visible && !is_generated(&inline.directives),
                        stack,
                        level,
                    )?;
                }
                Selection::FragmentSpread(spread) => {
                    self.collect_spread(spread, visible, stack, level)?
                }
            }
        }

        Ok(())
    }

    fn collect_spread(
        &self,
        spread: &'a FragmentSpread<'static, String>,
        visible: bool,
        stack: &[&'a str],
        level: &mut Level<'a>,
    ) -> Result<(), CompilerError> {
        let fragment = *self.fragments.get(spread.fragment_name.as_str()).ok_or_else(|| {
            CompilerError::structural(format!("Fragment {} is not defined", spread.fragment_name))
        })?;
        if stack.contains(&fragment.name.as_str()) {
            return Err(CompilerError::structural(format!(
                "Fragment {} spreads itself",
                self.registry.original_fragment_name(&fragment.name)
            )));
        }

        let condition = fragment_type_condition(fragment);
        push_condition(level, condition);

        let original = self.registry.original_fragment_name(&fragment.name);
        match self.registry.list_operation(original) {
            Some((list, kind)) => level.operations.push(self.list_operation(
                spread,
                &list.name,
                OperationAction::from(kind),
            )),
            None => {
                level.fragments.insert(
                    original.to_string(),
                    FragmentReference {
                        arguments: with_arguments(spread),
                    },
                );
            }
        }

        if has_directive(&spread.directives, directives::COMPONENT_FIELD) {
            level.items.push(Collected::Component {
                condition: Some(condition),
                spread,
                fragment,
                visible,
            });
        }

        let mut stack = stack.to_vec();
        stack.push(fragment.name.as_str());
        self.collect(
            &fragment.selection_set,
            Some(condition),
            visible && !self.masked(spread),
            &stack,
            level,
        )
    }

    fn masked(&self, spread: &FragmentSpread<'static, String>) -> bool {
        if has_directive(&spread.directives, directives::MASK_DISABLE) {
            return false;
        }
        if has_directive(&spread.directives, directives::MASK_ENABLE) {
            return true;
        }
        self.config.default_fragment_masking == FragmentMasking::Enable
    }

    fn list_operation(
        &self,
        spread: &FragmentSpread<'static, String>,
        list: &str,
        action: OperationAction,
    ) -> ListOperation {
        let position = if has_directive(&spread.directives, directives::PREPEND) {
            ListPosition::First
        } else if has_directive(&spread.directives, directives::APPEND) {
            ListPosition::Last
        } else {
            self.config.default_list_position
        };
        let target = if has_directive(&spread.directives, directives::ALL_LISTS) {
            ListTarget::All
        } else {
            self.config.default_list_target
        };
        let parent_id = find_directive(&spread.directives, directives::PARENT_ID)
            .and_then(|directive| directive_argument(directive, directives::PARENT_ID_VALUE_ARG))
            .map(ArgumentValue::from);

        let must = directive_arguments(find_directive(&spread.directives, directives::WHEN));
        let must_not = directive_arguments(find_directive(&spread.directives, directives::WHEN_NOT));
        let when = (!must.is_empty() || !must_not.is_empty()).then_some(ListWhen { must, must_not });

        ListOperation {
            action,
            list: Some(list.to_string()),
            type_name: None,
            position: (action == OperationAction::Insert || action == OperationAction::Toggle)
                .then_some(position),
            target: Some(target),
            parent_id,
            when,
        }
    }

    /// Whether a selection under `condition` applies to values of `type_name`.
    fn applies(&self, condition: Option<&str>, type_name: &str) -> bool {
        match condition {
            None => true,
            Some(condition) if condition == type_name => true,
            Some(condition) => self
                .schema
                .possible_types(condition)
                .iter()
                .any(|possible| possible == type_name),
        }
    }

    /// Returns the tree and whether a field of the level is `@required`.
    fn build_tree(
        &self,
        parent_type: &str,
        level: Level<'a>,
        path: &[String],
    ) -> Result<(SelectionTree, bool), CompilerError> {
        let mut tree = SelectionTree {
            fragments: level.fragments,
            ..Default::default()
        };

        if !self.schema.is_abstract(parent_type) {
            let items = level
                .items
                .iter()
                .filter(|item| self.applies(item.condition(), parent_type));
            let (fields, required) = self.build_fields(parent_type, items, path)?;
            tree.fields = fields;
            return Ok((tree, required));
        }

        let common = level.items.iter().filter(|item| {
            item.condition()
                .map_or(true, |condition| condition == parent_type)
        });
        let (fields, mut required) = self.build_fields(parent_type, common, path)?;
        tree.fields = fields;

        let mut concrete_types: Vec<&str> = Vec::new();
        let mut type_map = IndexMap::new();
        for condition in &level.conditions {
            if *condition == parent_type {
                continue;
            }
            if self.schema.is_abstract(condition) {
                for concrete in self.schema.common_possible_types(parent_type, condition) {
                    type_map
                        .entry(concrete.to_string())
                        .or_insert_with(|| condition.to_string());
                    if !concrete_types.contains(&concrete) {
                        concrete_types.push(concrete);
                    }
                }
            } else if !concrete_types.contains(condition) {
                concrete_types.push(*condition);
            }
        }

        if concrete_types.is_empty() {
            return Ok((tree, required));
        }

        let mut buckets = IndexMap::new();
        for concrete in concrete_types {
            let items = level
                .items
                .iter()
                .filter(|item| self.applies(item.condition(), concrete));
            let (fields, bucket_required) = self.build_fields(concrete, items, path)?;
            required |= bucket_required;
            buckets.insert(concrete.to_string(), fields);
        }

        tree.abstract_fields = Some(AbstractFields {
            fields: buckets,
            type_map,
        });
        Ok((tree, required))
    }

    fn build_fields<'i>(
        &self,
        parent_type: &str,
        items: impl Iterator<Item = &'i Collected<'a>>,
        path: &[String],
    ) -> Result<(IndexMap<String, SelectionNode>, bool), CompilerError>
    where
        'a: 'i,
    {
        let mut groups: IndexMap<String, Group<'a>> = IndexMap::new();

        for item in items {
            match item {
                Collected::Field {
                    field,
                    visible,
                    stack,
                    ..
                } => {
                    let key = response_key(field).to_string();
                    let key_raw = field_key(field, self.config);
                    let occurrence = Occurrence {
                        field,
                        visible: *visible,
                        stack: stack.clone(),
                    };

                    match groups.get_mut(&key) {
                        Some(Group::Fields {
                            key_raw: existing,
                            occurrences,
                        }) if *existing == key_raw => occurrences.push(occurrence),
                        Some(group) => {
                            warn!(
                                field = %key,
                                parent_type = %parent_type,
                                "field selected twice with different arguments, keeping the last one"
                            );
                            *group = Group::Fields {
                                key_raw,
                                occurrences: vec![occurrence],
                            };
                        }
                        None => {
                            groups.insert(
                                key,
                                Group::Fields {
                                    key_raw,
                                    occurrences: vec![occurrence],
                                },
                            );
                        }
                    }
                }
                Collected::Component {
                    spread,
                    fragment,
                    visible,
                    ..
                } => {
                    if let Some((key, node)) = self.component_node(spread, fragment, *visible) {
                        groups.insert(key, Group::Component(node));
                    }
                }
            }
        }

        // Generated selections go after the ones written by the user.
        let (written, generated): (Vec<_>, Vec<_>) =
            groups.into_iter().partition(|(_, group)| !group.generated());

        let mut fields = IndexMap::new();
        let mut required = false;
        for (key, group) in written.into_iter().chain(generated) {
            let node = match group {
                Group::Component(node) => node,
                Group::Fields {
                    key_raw,
                    occurrences,
                } => {
                    let mut field_path = path.to_vec();
                    field_path.push(key.clone());
                    self.compile_field(parent_type, key_raw, &occurrences, &field_path)?
                }
            };
            required |= node.required;
            fields.insert(key, node);
        }

        Ok((fields, required))
    }

    fn compile_field(
        &self,
        parent_type: &str,
        key_raw: String,
        occurrences: &[Occurrence<'a>],
        path: &[String],
    ) -> Result<SelectionNode, CompilerError> {
        let field = occurrences[0].field;
        let schema_field = self.schema.field(parent_type, &field.name).ok_or_else(|| {
            CompilerError::type_resolution(format!(
                "Could not find the field {} on type {}",
                field.name, parent_type
            ))
        })?;
        let type_name = schema_field.field_type.inner_type().to_string();
        let all_directives = || {
            occurrences
                .iter()
                .flat_map(|occurrence| occurrence.field.directives.iter())
        };

        let required = all_directives().any(|directive| directive.name == directives::REQUIRED);
        let mut node = SelectionNode {
            type_name: type_name.clone(),
            key_raw,
            nullable: !required && !schema_field.field_type.is_non_null(),
            required,
            visible: occurrences.iter().any(|occurrence| occurrence.visible),
            optimistic_key: all_directives()
                .any(|directive| directive.name == directives::OPTIMISTIC_KEY),
            ..Default::default()
        };

        for directive in all_directives() {
            if directives::is_delete_directive(&directive.name) {
                let deleted = directive
                    .name
                    .strip_suffix(directives::DELETE_SUFFIX)
                    .unwrap_or(&directive.name);
                let operation = ListOperation {
                    action: OperationAction::Delete,
                    list: None,
                    type_name: Some(deleted.to_string()),
                    position: None,
                    target: None,
                    parent_id: None,
                    when: None,
                };
                if !node.operations.contains(&operation) {
                    node.operations.push(operation);
                }
            } else if !directives::is_internal_directive(&directive.name)
                && !node.directives.iter().any(|known| known.name == directive.name)
            {
                node.directives.push(DirectiveReference {
                    name: directive.name.clone(),
                    arguments: directive_arguments(Some(directive)),
                });
            }
        }

        let paginated = has_directive(&field.directives, directives::PAGINATE);
        if let Some(name) = list_name(field) {
            let (element_type, connection) = self.schema.list_element_type(schema_field);
            node.list = Some(ListReference {
                name: name.to_string(),
                connection,
                type_name: element_type.to_string(),
            });
        }
        if node.list.is_some() || paginated {
            node.filters = field
                .arguments
                .iter()
                .filter(|(name, _)| !is_pagination_argument(name))
                .map(|(name, value)| (name.clone(), ArgumentValue::from(value)))
                .collect();
        }
        node.updates = self.updates(path);

        let selects = occurrences
            .iter()
            .any(|occurrence| !occurrence.field.selection_set.items.is_empty());
        if self.schema.is_composite(&type_name) && selects {
            let mut level = Level::default();
            for occurrence in occurrences {
                self.collect(
                    &occurrence.field.selection_set,
                    None,
                    occurrence.visible,
                    &occurrence.stack,
                    &mut level,
                )?;
            }
            node.operations.append(&mut level.operations);

            let abstract_type = self.schema.is_abstract(&type_name);
            let (selection, child_required) = self.build_tree(&type_name, level, path)?;
            if child_required {
                node.nullable = true;
                node.abstract_has_required = abstract_type
                    && selection
                        .abstract_fields
                        .iter()
                        .flat_map(|abstract_fields| abstract_fields.fields.values())
                        .flat_map(|bucket| bucket.values())
                        .any(|child| child.required);
            }
            node.selection = Some(selection);
        }

        Ok(node)
    }

    /// How the field's value changes when the next page of the document's paginated field arrives.
    fn updates(&self, path: &[String]) -> Vec<UpdateMode> {
        let Some(refetch) = self.refetch else {
            return Vec::new();
        };
        let Some(relative) = path.strip_prefix(refetch.path.as_slice()) else {
            return Vec::new();
        };

        let forward = refetch.direction.forward();
        let backward = refetch.direction.backward();
        let mut updates = Vec::new();
        let relative: Vec<&str> = relative.iter().map(String::as_str).collect();

        match (refetch.method, relative.as_slice()) {
            (PaginationMethod::Offset, []) | (PaginationMethod::Cursor, ["edges"]) => {
                if forward {
                    updates.push(UpdateMode::Append);
                }
                if backward {
                    updates.push(UpdateMode::Prepend);
                }
            }
            (PaginationMethod::Cursor, ["pageInfo", "endCursor" | "hasNextPage"]) if forward => {
                updates.push(UpdateMode::Append);
            }
            (PaginationMethod::Cursor, ["pageInfo", "startCursor" | "hasPreviousPage"])
                if backward =>
            {
                updates.push(UpdateMode::Prepend);
            }
            _ => {}
        }

        updates
    }

    fn component_node(
        &self,
        spread: &FragmentSpread<'static, String>,
        fragment: &FragmentDefinition<'static, String>,
        visible: bool,
    ) -> Option<(String, SelectionNode)> {
        let directive = find_directive(&spread.directives, directives::COMPONENT_FIELD)?;
        let field = directive_argument(directive, directives::COMPONENT_FIELD_FIELD_ARG)
            .and_then(value_as_str)?;
        let prop = directive_argument(directive, directives::COMPONENT_FIELD_PROP_ARG)
            .and_then(value_as_str)
            .map(str::to_string);
        let with = find_directive(&spread.directives, directives::WITH);

        let node = SelectionNode {
            type_name: COMPONENT_TYPE.to_string(),
            key_raw: key_raw(field, with.iter().flat_map(|with| with.arguments.iter())),
            visible,
            component: Some(ComponentReference {
                prop,
                key: format!("{}.{}", fragment_type_condition(fragment), field),
                fragment: self
                    .registry
                    .original_fragment_name(&fragment.name)
                    .to_string(),
                variables: with_arguments(spread),
            }),
            ..Default::default()
        };

        Some((field.to_string(), node))
    }
}

fn push_condition<'a>(level: &mut Level<'a>, condition: &'a str) {
    if !level.conditions.contains(&condition) {
        level.conditions.push(condition);
    }
}

fn directive_arguments(directive: Option<&Directive<'static, String>>) -> BTreeMap<String, ArgumentValue> {
    directive
        .map(|directive| {
            directive
                .arguments
                .iter()
                .map(|(name, value)| (name.clone(), ArgumentValue::from(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn with_arguments(spread: &FragmentSpread<'static, String>) -> BTreeMap<String, ArgumentValue> {
    directive_arguments(find_directive(&spread.directives, directives::WITH))
}
