use graphql_parser::query::{Field, Value};
use hive_compiler_config::runtime::PaginateMode;
use hive_compiler_config::CompilerConfig;

use crate::transforms::pipeline::{is_pagination_argument, paginate_mode};
use crate::utils::value::print_value;

pub const PAGINATED_SUFFIX: &str = "::paginated";

/// The cache key of a field: its name and its arguments sorted by name.
///
/// Fields under `@paginate` in `Infinite` mode leave the pagination arguments out, so every page
/// is written to the same entry. Paginated fields carry the `::paginated` suffix.
pub fn field_key(field: &Field<'static, String>, config: &CompilerConfig) -> String {
    let mode = paginate_mode(field, config);
    let strip_pagination = mode == Some(PaginateMode::Infinite);

    let arguments = field
        .arguments
        .iter()
        .filter(|(name, _)| !(strip_pagination && is_pagination_argument(name)));

    let mut key = key_raw(&field.name, arguments);
    if mode.is_some() {
        key.push_str(PAGINATED_SUFFIX);
    }
    key
}

/// `name(a: 1, b: $b)`, or the bare name without arguments.
pub fn key_raw<'v>(
    name: &str,
    arguments: impl IntoIterator<Item = &'v (String, Value<'static, String>)>,
) -> String {
    let mut arguments: Vec<&(String, Value<'static, String>)> = arguments.into_iter().collect();
    if arguments.is_empty() {
        return name.to_string();
    }
    arguments.sort_by(|(a, _), (b, _)| a.cmp(b));

    format!(
        "{}({})",
        name,
        arguments
            .iter()
            .map(|(argument, value)| format!("{}: {}", argument, print_value(value)))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

#[cfg(test)]
mod tests {
    use graphql_parser::query::{Definition, Selection};

    use super::*;
    use crate::utils::ast::OperationDefinitionExt;
    use crate::utils::parsing::parse_document;

    fn first_field(query: &str) -> Field<'static, String> {
        let document = parse_document(query);
        let Some(Definition::Operation(operation)) = document.definitions.into_iter().next() else {
            panic!("expected an operation");
        };
        match operation.selection_set().items.first() {
            Some(Selection::Field(field)) => field.clone(),
            _ => panic!("expected a field"),
        }
    }

    #[test]
    fn arguments_are_sorted_by_name() {
        let config = CompilerConfig::default();
        assert_eq!(
            field_key(&first_field(r#"{ users(role: ADMIN, filter: "a", ids: [1, 2]) }"#), &config),
            r#"users(filter: "a", ids: [1, 2], role: ADMIN)"#
        );
        assert_eq!(
            field_key(&first_field("{ user(id: $id) }"), &config),
            "user(id: $id)"
        );
        assert_eq!(field_key(&first_field("{ viewer }"), &config), "viewer");
    }

    #[test]
    fn infinite_pagination_drops_page_arguments() {
        let config = CompilerConfig::default();
        assert_eq!(
            field_key(
                &first_field(r#"{ users(first: $first, after: $after, filter: "hello") @paginate }"#),
                &config
            ),
            r#"users(filter: "hello")::paginated"#
        );
        assert_eq!(
            field_key(
                &first_field("{ users(limit: 10, offset: 20) @paginate }"),
                &config
            ),
            "users::paginated"
        );
    }

    #[test]
    fn single_page_keeps_every_argument() {
        let config = CompilerConfig::default();
        assert_eq!(
            field_key(
                &first_field(
                    r#"{ users(first: $first, filter: "hello", after: $after) @paginate(mode: SinglePage) }"#
                ),
                &config
            ),
            r#"users(after: $after, filter: "hello", first: $first)::paginated"#
        );
    }
}
