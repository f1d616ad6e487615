//! Names of the directives that are only meaningful to the compiler and the runtime.
//!
//! None of them may reach the server, the printer strips them from every artifact's query.

pub const LIST: &str = "list";
pub const PAGINATE: &str = "paginate";
pub const PREPEND: &str = "prepend";
pub const APPEND: &str = "append";
pub const ALL_LISTS: &str = "allLists";
pub const PARENT_ID: &str = "parentID";
pub const WHEN: &str = "when";
pub const WHEN_NOT: &str = "when_not";
pub const ARGUMENTS: &str = "arguments";
pub const WITH: &str = "with";
pub const CACHE: &str = "cache";
pub const DEDUPE: &str = "dedupe";
pub const MASK_ENABLE: &str = "mask_enable";
pub const MASK_DISABLE: &str = "mask_disable";
pub const REQUIRED: &str = "required";
pub const OPTIMISTIC_KEY: &str = "optimisticKey";
pub const COMPONENT_FIELD: &str = "componentField";
/// Marks selections added by the compiler rather than written by the user.
pub const GENERATED: &str = "__generated";

pub const DELETE_SUFFIX: &str = "_delete";
pub const INSERT_SUFFIX: &str = "_insert";
pub const REMOVE_SUFFIX: &str = "_remove";
pub const TOGGLE_SUFFIX: &str = "_toggle";

// Arguments
pub const LIST_NAME_ARG: &str = "name";
pub const LIST_CONNECTION_ARG: &str = "connection";
pub const PAGINATE_NAME_ARG: &str = "name";
pub const PAGINATE_MODE_ARG: &str = "mode";
pub const PARENT_ID_VALUE_ARG: &str = "value";
pub const CACHE_POLICY_ARG: &str = "policy";
pub const CACHE_PARTIAL_ARG: &str = "partial";
pub const DEDUPE_CANCEL_FIRST_ARG: &str = "cancelFirst";
pub const DEDUPE_MATCH_ARG: &str = "match";
pub const COMPONENT_FIELD_FIELD_ARG: &str = "field";
pub const COMPONENT_FIELD_PROP_ARG: &str = "prop";
pub const ARGUMENT_TYPE_KEY: &str = "type";
pub const ARGUMENT_DEFAULT_KEY: &str = "default";

static INTERNAL_DIRECTIVES: [&str; 18] = [
    LIST,
    PAGINATE,
    PREPEND,
    APPEND,
    ALL_LISTS,
    PARENT_ID,
    WHEN,
    WHEN_NOT,
    ARGUMENTS,
    WITH,
    CACHE,
    DEDUPE,
    MASK_ENABLE,
    MASK_DISABLE,
    REQUIRED,
    OPTIMISTIC_KEY,
    COMPONENT_FIELD,
    GENERATED,
];

/// Whether the directive must be stripped before a query is sent over the wire.
///
/// Every `@<Type>_delete` directive is internal, they are generated per list type.
pub fn is_internal_directive(name: &str) -> bool {
    INTERNAL_DIRECTIVES.contains(&name) || is_delete_directive(name)
}

pub fn is_delete_directive(name: &str) -> bool {
    name.len() > DELETE_SUFFIX.len() && name.ends_with(DELETE_SUFFIX)
}

pub fn delete_directive_name(type_name: &str) -> String {
    format!("{}{}", type_name, DELETE_SUFFIX)
}

/// The SDL that every schema is augmented with.
pub const INTERNAL_SCHEMA: &str = r#"
enum CachePolicy {
  CacheAndNetwork
  CacheOnly
  CacheOrNetwork
  NetworkOnly
  NoCache
}

enum PaginateMode {
  Infinite
  SinglePage
}

enum DedupeMatchMode {
  Variables
  Operation
  None
}

scalar Component

directive @list(name: String!, connection: Boolean) on FIELD

directive @paginate(name: String, mode: PaginateMode) on FIELD

directive @prepend on FRAGMENT_SPREAD

directive @append on FRAGMENT_SPREAD

directive @allLists on FRAGMENT_SPREAD

directive @parentID(value: ID!) on FRAGMENT_SPREAD

directive @when on FRAGMENT_SPREAD

directive @when_not on FRAGMENT_SPREAD

directive @arguments on FRAGMENT_DEFINITION

directive @with on FRAGMENT_SPREAD

directive @cache(policy: CachePolicy, partial: Boolean) on QUERY

directive @dedupe(cancelFirst: Boolean, match: DedupeMatchMode) on QUERY | MUTATION

directive @mask_enable on FRAGMENT_SPREAD

directive @mask_disable on FRAGMENT_SPREAD

directive @required on FIELD

directive @optimisticKey on FIELD

directive @componentField(field: String!, prop: String) on FRAGMENT_DEFINITION | FRAGMENT_SPREAD

directive @__generated on FIELD | INLINE_FRAGMENT
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_directives_are_internal() {
        assert!(is_internal_directive("User_delete"));
        assert!(is_internal_directive(PAGINATE));
        assert!(!is_internal_directive("_delete"));
        assert!(!is_internal_directive("include"));
    }
}
