use graphql_parser::query::{
    Definition, Directive, Field, FragmentDefinition, Mutation, OperationDefinition, Query,
    Selection, SelectionSet, Subscription, Type, Value, VariableDefinition,
};
use graphql_parser::Pos;

use crate::directives;
use crate::documents::DocumentKind;

pub trait TypeExt {
    /// The named type once every list and non-null wrapper is removed.
    fn inner_type(&self) -> &str;
    fn is_non_null(&self) -> bool;
    /// Whether a list wrapper appears anywhere in the type.
    fn is_list(&self) -> bool;
    /// The type without its outer non-null wrapper.
    fn nullable(&self) -> &Self;
    /// The type printed in SDL notation, e.g. `[String!]!`.
    fn print(&self) -> String;
}

impl<'a> TypeExt for Type<'a, String> {
    fn inner_type(&self) -> &str {
        match self {
            Type::NamedType(name) => name.as_str(),
            Type::ListType(inner) => inner.inner_type(),
            Type::NonNullType(inner) => inner.inner_type(),
        }
    }

    fn is_non_null(&self) -> bool {
        matches!(self, Type::NonNullType(_))
    }

    fn is_list(&self) -> bool {
        match self {
            Type::NamedType(_) => false,
            Type::ListType(_) => true,
            Type::NonNullType(inner) => inner.is_list(),
        }
    }

    fn nullable(&self) -> &Self {
        match self {
            Type::NonNullType(inner) => inner,
            other => other,
        }
    }

    fn print(&self) -> String {
        match self {
            Type::NamedType(name) => name.clone(),
            Type::ListType(inner) => format!("[{}]", inner.print()),
            Type::NonNullType(inner) => format!("{}!", inner.print()),
        }
    }
}

/// Replaces the named type inside the list/non-null wrappers.
pub fn rename_inner_type<'a>(ty: &Type<'a, String>, name: &str) -> Type<'a, String> {
    match ty {
        Type::NamedType(_) => Type::NamedType(name.to_string()),
        Type::ListType(inner) => Type::ListType(Box::new(rename_inner_type(inner, name))),
        Type::NonNullType(inner) => Type::NonNullType(Box::new(rename_inner_type(inner, name))),
    }
}

/// Parses a type reference such as `[ID!]!`, as written in `@arguments` declarations.
pub fn parse_type(text: &str) -> Option<Type<'static, String>> {
    let text = text.trim();
    if let Some(inner) = text.strip_suffix('!') {
        return parse_type(inner).map(|inner| Type::NonNullType(Box::new(inner)));
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return parse_type(inner).map(|inner| Type::ListType(Box::new(inner)));
    }
    let valid = text
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && text.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    valid.then(|| Type::NamedType(text.to_string()))
}

pub trait OperationDefinitionExt<'a> {
    fn name(&self) -> Option<&str>;
    fn kind(&self) -> DocumentKind;
    fn selection_set(&self) -> &SelectionSet<'a, String>;
    fn selection_set_mut(&mut self) -> &mut SelectionSet<'a, String>;
    fn variable_definitions(&self) -> &[VariableDefinition<'a, String>];
    /// `None` for the `{ ... }` shorthand, which cannot declare variables.
    fn variable_definitions_mut(&mut self) -> Option<&mut Vec<VariableDefinition<'a, String>>>;
    fn directives(&self) -> &[Directive<'a, String>];
    fn directives_mut(&mut self) -> Option<&mut Vec<Directive<'a, String>>>;
}

impl<'a> OperationDefinitionExt<'a> for OperationDefinition<'a, String> {
    fn name(&self) -> Option<&str> {
        match self {
            OperationDefinition::SelectionSet(_) => None,
            OperationDefinition::Query(query) => query.name.as_deref(),
            OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
            OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
        }
    }

    fn kind(&self) -> DocumentKind {
        match self {
            OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
                DocumentKind::Query
            }
            OperationDefinition::Mutation(_) => DocumentKind::Mutation,
            OperationDefinition::Subscription(_) => DocumentKind::Subscription,
        }
    }

    fn selection_set(&self) -> &SelectionSet<'a, String> {
        match self {
            OperationDefinition::SelectionSet(selection_set) => selection_set,
            OperationDefinition::Query(Query { selection_set, .. }) => selection_set,
            OperationDefinition::Mutation(Mutation { selection_set, .. }) => selection_set,
            OperationDefinition::Subscription(Subscription { selection_set, .. }) => {
                selection_set
            }
        }
    }

    fn selection_set_mut(&mut self) -> &mut SelectionSet<'a, String> {
        match self {
            OperationDefinition::SelectionSet(selection_set) => selection_set,
            OperationDefinition::Query(Query { selection_set, .. }) => selection_set,
            OperationDefinition::Mutation(Mutation { selection_set, .. }) => selection_set,
            OperationDefinition::Subscription(Subscription { selection_set, .. }) => {
                selection_set
            }
        }
    }

    fn variable_definitions(&self) -> &[VariableDefinition<'a, String>] {
        match self {
            OperationDefinition::SelectionSet(_) => &[],
            OperationDefinition::Query(query) => &query.variable_definitions,
            OperationDefinition::Mutation(mutation) => &mutation.variable_definitions,
            OperationDefinition::Subscription(subscription) => &subscription.variable_definitions,
        }
    }

    fn variable_definitions_mut(&mut self) -> Option<&mut Vec<VariableDefinition<'a, String>>> {
        match self {
            OperationDefinition::SelectionSet(_) => None,
            OperationDefinition::Query(query) => Some(&mut query.variable_definitions),
            OperationDefinition::Mutation(mutation) => Some(&mut mutation.variable_definitions),
            OperationDefinition::Subscription(subscription) => {
                Some(&mut subscription.variable_definitions)
            }
        }
    }

    fn directives(&self) -> &[Directive<'a, String>] {
        match self {
            OperationDefinition::SelectionSet(_) => &[],
            OperationDefinition::Query(query) => &query.directives,
            OperationDefinition::Mutation(mutation) => &mutation.directives,
            OperationDefinition::Subscription(subscription) => &subscription.directives,
        }
    }

    fn directives_mut(&mut self) -> Option<&mut Vec<Directive<'a, String>>> {
        match self {
            OperationDefinition::SelectionSet(_) => None,
            OperationDefinition::Query(query) => Some(&mut query.directives),
            OperationDefinition::Mutation(mutation) => Some(&mut mutation.directives),
            OperationDefinition::Subscription(subscription) => Some(&mut subscription.directives),
        }
    }
}

pub fn definition_selection_set<'d, 'a>(
    definition: &'d Definition<'a, String>,
) -> &'d SelectionSet<'a, String> {
    match definition {
        Definition::Operation(operation) => operation.selection_set(),
        Definition::Fragment(fragment) => &fragment.selection_set,
    }
}

pub fn definition_selection_set_mut<'d, 'a>(
    definition: &'d mut Definition<'a, String>,
) -> &'d mut SelectionSet<'a, String> {
    match definition {
        Definition::Operation(operation) => operation.selection_set_mut(),
        Definition::Fragment(fragment) => &mut fragment.selection_set,
    }
}

pub fn fragment_type_condition<'d>(fragment: &'d FragmentDefinition<'_, String>) -> &'d str {
    let graphql_parser::query::TypeCondition::On(type_name) = &fragment.type_condition;
    type_name.as_str()
}

pub fn find_directive<'d, 'a>(
    directives: &'d [Directive<'a, String>],
    name: &str,
) -> Option<&'d Directive<'a, String>> {
    directives.iter().find(|directive| directive.name == name)
}

pub fn has_directive(directives: &[Directive<'_, String>], name: &str) -> bool {
    find_directive(directives, name).is_some()
}

pub fn directive_argument<'d, 'a>(
    directive: &'d Directive<'a, String>,
    name: &str,
) -> Option<&'d Value<'a, String>> {
    directive
        .arguments
        .iter()
        .find(|(arg_name, _)| arg_name == name)
        .map(|(_, value)| value)
}

pub fn field_argument<'d, 'a>(field: &'d Field<'a, String>, name: &str) -> Option<&'d Value<'a, String>> {
    field
        .arguments
        .iter()
        .find(|(arg_name, _)| arg_name == name)
        .map(|(_, value)| value)
}

/// The key of the field in the response: its alias, or its name.
pub fn response_key<'f>(field: &'f Field<'_, String>) -> &'f str {
    field.alias.as_deref().unwrap_or(&field.name)
}

pub fn is_generated(directives: &[Directive<'_, String>]) -> bool {
    has_directive(directives, directives::GENERATED)
}

pub fn empty_selection_set<'a>() -> SelectionSet<'a, String> {
    SelectionSet {
        span: (Pos::default(), Pos::default()),
        items: Vec::new(),
    }
}

pub fn bare_directive<'a>(name: &str) -> Directive<'a, String> {
    Directive {
        position: Pos::default(),
        name: name.to_string(),
        arguments: Vec::new(),
    }
}

/// A field selection added by the compiler, carrying the `@__generated` marker.
pub fn generated_field<'a>(name: &str) -> Field<'a, String> {
    Field {
        position: Pos::default(),
        alias: None,
        name: name.to_string(),
        arguments: Vec::new(),
        directives: vec![bare_directive(directives::GENERATED)],
        selection_set: empty_selection_set(),
    }
}

/// Whether the selection set already selects `name` under its own name.
pub fn selects_field(selection_set: &SelectionSet<'_, String>, name: &str) -> bool {
    selection_set.items.iter().any(|item| match item {
        Selection::Field(field) => response_key(field) == name && field.name == name,
        _ => false,
    })
}

/// Every fragment spread reachable in the selection set, in source order, without duplicates.
pub fn collect_fragment_spreads(selection_set: &SelectionSet<'_, String>, names: &mut Vec<String>) {
    for item in &selection_set.items {
        match item {
            Selection::Field(field) => collect_fragment_spreads(&field.selection_set, names),
            Selection::InlineFragment(inline) => {
                collect_fragment_spreads(&inline.selection_set, names)
            }
            Selection::FragmentSpread(spread) => {
                if !names.contains(&spread.fragment_name) {
                    names.push(spread.fragment_name.clone());
                }
            }
        }
    }
}

/// Collects the names of every variable referenced by the value.
pub fn collect_value_variables(value: &Value<'_, String>, names: &mut Vec<String>) {
    match value {
        Value::Variable(name) => {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        Value::List(items) => {
            for item in items {
                collect_value_variables(item, names);
            }
        }
        Value::Object(fields) => {
            for item in fields.values() {
                collect_value_variables(item, names);
            }
        }
        Value::Int(_)
        | Value::Float(_)
        | Value::String(_)
        | Value::Boolean(_)
        | Value::Null
        | Value::Enum(_) => {}
    }
}

/// Collects the variables referenced by the directives for which `include_directive` returns true,
/// and by every field argument of the selection set.
pub fn collect_selection_variables(
    selection_set: &SelectionSet<'_, String>,
    include_directive: &dyn Fn(&str) -> bool,
    names: &mut Vec<String>,
) {
    for item in &selection_set.items {
        match item {
            Selection::Field(field) => {
                for (_, value) in &field.arguments {
                    collect_value_variables(value, names);
                }
                collect_directive_variables(&field.directives, include_directive, names);
                collect_selection_variables(&field.selection_set, include_directive, names);
            }
            Selection::InlineFragment(inline) => {
                collect_directive_variables(&inline.directives, include_directive, names);
                collect_selection_variables(&inline.selection_set, include_directive, names);
            }
            Selection::FragmentSpread(spread) => {
                collect_directive_variables(&spread.directives, include_directive, names);
            }
        }
    }
}

pub fn collect_directive_variables(
    directives: &[Directive<'_, String>],
    include_directive: &dyn Fn(&str) -> bool,
    names: &mut Vec<String>,
) {
    for directive in directives {
        if !include_directive(&directive.name) {
            continue;
        }
        for (_, value) in &directive.arguments {
            collect_value_variables(value, names);
        }
    }
}
