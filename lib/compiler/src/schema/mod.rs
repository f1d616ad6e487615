use std::collections::HashMap;

use graphql_parser::query::{Field, Selection, SelectionSet};
use graphql_parser::schema::{self as input, Type, Value};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use tracing::instrument;

use crate::documents::DocumentKind;
use crate::utils::ast::TypeExt;
use crate::utils::parsing::SchemaDocument;
use error::SchemaError;

pub mod augment;
pub mod error;

static BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

pub const TYPENAME_FIELD: &str = "__typename";

lazy_static! {
    static ref TYPENAME: SchemaField = SchemaField {
        name: TYPENAME_FIELD.to_string(),
        field_type: Type::NonNullType(Box::new(Type::NamedType("String".to_string()))),
        arguments: Vec::new(),
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Enum,
    Scalar,
    InputObject,
}

impl TypeKind {
    pub fn is_abstract(&self) -> bool {
        matches!(self, TypeKind::Interface | TypeKind::Union)
    }

    /// Whether selections on the type need a selection set.
    pub fn is_composite(&self) -> bool {
        matches!(self, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }
}

#[derive(Debug, Clone)]
pub struct SchemaArgument {
    pub name: String,
    pub value_type: Type<'static, String>,
    pub default_value: Option<Value<'static, String>>,
}

#[derive(Debug, Clone)]
pub struct SchemaField {
    pub name: String,
    pub field_type: Type<'static, String>,
    pub arguments: Vec<SchemaArgument>,
}

impl SchemaField {
    pub fn argument(&self, name: &str) -> Option<&SchemaArgument> {
        self.arguments.iter().find(|argument| argument.name == name)
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.argument(name).is_some()
    }
}

/// An object or an interface.
#[derive(Debug, Clone)]
pub struct CompositeType {
    pub name: String,
    pub fields: IndexMap<String, SchemaField>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub fields: IndexMap<String, SchemaArgument>,
}

#[derive(Debug, Clone)]
pub enum SchemaDefinition {
    Object(CompositeType),
    Interface(CompositeType),
    Union(UnionType),
    Enum(EnumType),
    Scalar(String),
    InputObject(InputObjectType),
}

impl SchemaDefinition {
    pub fn name(&self) -> &str {
        match self {
            SchemaDefinition::Object(object) | SchemaDefinition::Interface(object) => &object.name,
            SchemaDefinition::Union(union_type) => &union_type.name,
            SchemaDefinition::Enum(enum_type) => &enum_type.name,
            SchemaDefinition::Scalar(name) => name,
            SchemaDefinition::InputObject(input_object) => &input_object.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            SchemaDefinition::Object(_) => TypeKind::Object,
            SchemaDefinition::Interface(_) => TypeKind::Interface,
            SchemaDefinition::Union(_) => TypeKind::Union,
            SchemaDefinition::Enum(_) => TypeKind::Enum,
            SchemaDefinition::Scalar(_) => TypeKind::Scalar,
            SchemaDefinition::InputObject(_) => TypeKind::InputObject,
        }
    }

    fn fields(&self) -> Option<&IndexMap<String, SchemaField>> {
        match self {
            SchemaDefinition::Object(object) | SchemaDefinition::Interface(object) => {
                Some(&object.fields)
            }
            _ => None,
        }
    }
}

/// The read-only, typed view of the augmented schema shared by every stage after augmentation.
#[derive(Debug)]
pub struct SchemaState {
    /// Every named type of the schema, built-in scalars included, in definition order.
    pub definitions: IndexMap<String, SchemaDefinition>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    /// Concrete object types of every composite type. An object is its own only possible type.
    possible_types: HashMap<String, Vec<String>>,
}

impl SchemaState {
    #[instrument(level = "trace", skip_all, name = "new_schema_state")]
    pub fn new(schema: &SchemaDocument) -> Result<Self, SchemaError> {
        let mut definitions = IndexMap::new();
        let mut root_operations = (None, None, None);

        for definition in &schema.definitions {
            match definition {
                input::Definition::TypeDefinition(type_definition) => {
                    let built = Self::build_definition(type_definition);
                    definitions.insert(built.name().to_string(), built);
                }
                input::Definition::SchemaDefinition(schema_definition) => {
                    root_operations = (
                        schema_definition.query.clone(),
                        schema_definition.mutation.clone(),
                        schema_definition.subscription.clone(),
                    );
                }
                input::Definition::TypeExtension(_) | input::Definition::DirectiveDefinition(_) => {}
            }
        }

        for scalar in BUILTIN_SCALARS {
            if !definitions.contains_key(scalar) {
                definitions.insert(
                    scalar.to_string(),
                    SchemaDefinition::Scalar(scalar.to_string()),
                );
            }
        }

        let (query, mutation, subscription) = root_operations;
        let default_root = |name: &str| definitions.contains_key(name).then(|| name.to_string());
        let query_type = query
            .or_else(|| default_root("Query"))
            .ok_or(SchemaError::MissingQueryType)?;
        let mutation_type = mutation.or_else(|| default_root("Mutation"));
        let subscription_type = subscription.or_else(|| default_root("Subscription"));

        let possible_types = Self::build_possible_types(&definitions);

        Ok(Self {
            definitions,
            query_type,
            mutation_type,
            subscription_type,
            possible_types,
        })
    }

    fn build_definition(definition: &input::TypeDefinition<'static, String>) -> SchemaDefinition {
        match definition {
            input::TypeDefinition::Object(object) => SchemaDefinition::Object(CompositeType {
                name: object.name.clone(),
                fields: Self::build_fields(&object.fields),
                interfaces: object.implements_interfaces.clone(),
            }),
            input::TypeDefinition::Interface(interface) => {
                SchemaDefinition::Interface(CompositeType {
                    name: interface.name.clone(),
                    fields: Self::build_fields(&interface.fields),
                    interfaces: interface.implements_interfaces.clone(),
                })
            }
            input::TypeDefinition::Union(union_type) => SchemaDefinition::Union(UnionType {
                name: union_type.name.clone(),
                members: union_type.types.clone(),
            }),
            input::TypeDefinition::Enum(enum_type) => SchemaDefinition::Enum(EnumType {
                name: enum_type.name.clone(),
                values: enum_type
                    .values
                    .iter()
                    .map(|value| value.name.clone())
                    .collect(),
            }),
            input::TypeDefinition::Scalar(scalar) => SchemaDefinition::Scalar(scalar.name.clone()),
            input::TypeDefinition::InputObject(input_object) => {
                SchemaDefinition::InputObject(InputObjectType {
                    name: input_object.name.clone(),
                    fields: input_object
                        .fields
                        .iter()
                        .map(|field| (field.name.clone(), Self::build_argument(field)))
                        .collect(),
                })
            }
        }
    }

    fn build_fields(fields: &[input::Field<'static, String>]) -> IndexMap<String, SchemaField> {
        fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    SchemaField {
                        name: field.name.clone(),
                        field_type: field.field_type.clone(),
                        arguments: field.arguments.iter().map(Self::build_argument).collect(),
                    },
                )
            })
            .collect()
    }

    fn build_argument(argument: &input::InputValue<'static, String>) -> SchemaArgument {
        SchemaArgument {
            name: argument.name.clone(),
            value_type: argument.value_type.clone(),
            default_value: argument.default_value.clone(),
        }
    }

    fn build_possible_types(
        definitions: &IndexMap<String, SchemaDefinition>,
    ) -> HashMap<String, Vec<String>> {
        let mut possible_types: HashMap<String, Vec<String>> = HashMap::new();

        for definition in definitions.values() {
            match definition {
                SchemaDefinition::Object(object) => {
                    possible_types.insert(object.name.clone(), vec![object.name.clone()]);
                    for interface in &object.interfaces {
                        possible_types
                            .entry(interface.clone())
                            .or_default()
                            .push(object.name.clone());
                    }
                }
                SchemaDefinition::Interface(interface) => {
                    possible_types.entry(interface.name.clone()).or_default();
                }
                SchemaDefinition::Union(union_type) => {
                    possible_types
                        .entry(union_type.name.clone())
                        .or_default()
                        .extend(union_type.members.iter().cloned());
                }
                _ => {}
            }
        }

        possible_types
    }

    pub fn definition(&self, name: &str) -> Option<&SchemaDefinition> {
        self.definitions.get(name)
    }

    pub fn type_kind(&self, name: &str) -> Option<TypeKind> {
        self.definition(name).map(SchemaDefinition::kind)
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        self.type_kind(name).is_some_and(|kind| kind.is_abstract())
    }

    pub fn is_composite(&self, name: &str) -> bool {
        self.type_kind(name).is_some_and(|kind| kind.is_composite())
    }

    /// Looks up a field of an object or an interface. `__typename` resolves on every composite type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&SchemaField> {
        if field_name == TYPENAME_FIELD {
            return self.is_composite(type_name).then_some(&*TYPENAME);
        }

        self.definition(type_name)
            .and_then(SchemaDefinition::fields)
            .and_then(|fields| fields.get(field_name))
    }

    pub fn has_field(&self, type_name: &str, field_name: &str) -> bool {
        self.field(type_name, field_name).is_some()
    }

    pub fn possible_types(&self, type_name: &str) -> &[String] {
        self.possible_types
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The concrete types that satisfy both type conditions, in the order of `outer`.
    pub fn common_possible_types(&self, outer: &str, inner: &str) -> Vec<&str> {
        let inner_types = self.possible_types(inner);
        self.possible_types(outer)
            .iter()
            .filter(|name| inner_types.contains(name))
            .map(String::as_str)
            .collect()
    }

    pub fn input_fields(&self, type_name: &str) -> Option<&IndexMap<String, SchemaArgument>> {
        match self.definition(type_name) {
            Some(SchemaDefinition::InputObject(input_object)) => Some(&input_object.fields),
            _ => None,
        }
    }

    pub fn enums(&self) -> impl Iterator<Item = &EnumType> {
        self.definitions
            .values()
            .filter_map(|definition| match definition {
                SchemaDefinition::Enum(enum_type) => Some(enum_type),
                _ => None,
            })
    }

    pub fn root_type(&self, kind: DocumentKind) -> Option<&str> {
        match kind {
            DocumentKind::Query => Some(&self.query_type),
            DocumentKind::Mutation => self.mutation_type.as_deref(),
            DocumentKind::Subscription => self.subscription_type.as_deref(),
            DocumentKind::Fragment => None,
        }
    }

    pub fn is_root_type(&self, type_name: &str) -> bool {
        self.query_type == type_name
            || self.mutation_type.as_deref() == Some(type_name)
            || self.subscription_type.as_deref() == Some(type_name)
    }

    /// The `node` type of a connection: a type with `edges { node }` and `pageInfo` fields.
    pub fn connection_node_type(&self, type_name: &str) -> Option<&str> {
        if !self.has_field(type_name, "pageInfo") {
            return None;
        }
        let edges = self.field(type_name, "edges")?;
        let node = self.field(edges.field_type.inner_type(), "node")?;
        Some(node.field_type.inner_type())
    }

    /// The type of the records held by a list field, and whether the field is a connection.
    pub fn list_element_type<'s>(&'s self, field: &'s SchemaField) -> (&'s str, bool) {
        let field_type = field.field_type.inner_type();
        match self.connection_node_type(field_type) {
            Some(node_type) => (node_type, true),
            None => (field_type, false),
        }
    }

    /// Whether every given key field is defined on the type.
    pub fn has_key_fields(&self, type_name: &str, keys: &[String]) -> bool {
        !keys.is_empty() && keys.iter().all(|key| self.has_field(type_name, key))
    }

    /// Visits every field of the selection set, with the type that declares it.
    ///
    /// Fragment spreads are not followed, fragment definitions are walked on their own.
    pub fn walk_fields<'d>(
        &self,
        parent_type: &str,
        selection_set: &'d SelectionSet<'static, String>,
        visit: &mut dyn FnMut(&str, &'d Field<'static, String>, Option<&SchemaField>),
    ) {
        for item in &selection_set.items {
            match item {
                Selection::Field(field) => {
                    let schema_field = self.field(parent_type, &field.name);
                    visit(parent_type, field, schema_field);
                    if let Some(schema_field) = schema_field {
                        self.walk_fields(
                            schema_field.field_type.inner_type(),
                            &field.selection_set,
                            visit,
                        );
                    }
                }
                Selection::InlineFragment(inline) => {
                    let type_name = match &inline.type_condition {
                        Some(graphql_parser::query::TypeCondition::On(name)) => name.as_str(),
                        None => parent_type,
                    };
                    self.walk_fields(type_name, &inline.selection_set, visit);
                }
                Selection::FragmentSpread(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parsing::parse_schema;

    fn state(sdl: &str) -> SchemaState {
        SchemaState::new(&parse_schema(sdl)).unwrap()
    }

    #[test]
    fn possible_types_of_abstract_types() {
        let schema = state(
            r#"
            type Query { node: Node }
            interface Node { id: ID! }
            interface Animal { name: String }
            type User implements Node { id: ID! }
            type Cat implements Node & Animal { id: ID! name: String }
            type Dog implements Animal { name: String }
            union Pet = Dog | Cat
            "#,
        );

        assert_eq!(schema.possible_types("Node"), ["User", "Cat"]);
        assert_eq!(schema.possible_types("Pet"), ["Dog", "Cat"]);
        assert_eq!(schema.possible_types("User"), ["User"]);
        assert_eq!(schema.common_possible_types("Pet", "Node"), vec!["Cat"]);
        assert!(schema.is_abstract("Pet"));
        assert!(!schema.is_abstract("User"));
    }

    #[test]
    fn typename_resolves_on_composite_types_only() {
        let schema = state("type Query { user: User } type User { id: ID! } enum Role { ADMIN }");

        assert_eq!(
            schema.field("User", TYPENAME_FIELD).map(|f| f.field_type.print()),
            Some("String!".to_string())
        );
        assert!(schema.field("Role", TYPENAME_FIELD).is_none());
        assert!(schema.field("String", TYPENAME_FIELD).is_none());
    }

    #[test]
    fn connections_expose_their_node_type() {
        let schema = state(
            r#"
            type Query { users(first: Int): UserConnection! friends(limit: Int): [User!]! }
            type UserConnection { edges: [UserEdge!]! pageInfo: PageInfo! }
            type UserEdge { cursor: String node: User }
            type PageInfo { hasNextPage: Boolean! }
            type User { id: ID! }
            "#,
        );

        let users = schema.field("Query", "users").unwrap();
        let friends = schema.field("Query", "friends").unwrap();

        assert_eq!(schema.list_element_type(users), ("User", true));
        assert_eq!(schema.list_element_type(friends), ("User", false));
    }

    #[test]
    fn missing_query_type_is_an_error() {
        let result = SchemaState::new(&parse_schema("type User { id: ID! }"));
        assert_eq!(result.unwrap_err(), SchemaError::MissingQueryType);
    }
}
