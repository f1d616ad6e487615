use std::collections::BTreeMap;

use graphql_parser::query::Value;
use serde::Serialize;

/// An argument value as it is stored in artifacts.
///
/// Variables are kept by name, they are resolved by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value")]
pub enum ArgumentValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Enum(String),
    Variable(String),
    List(Vec<ArgumentValue>),
    Object(BTreeMap<String, ArgumentValue>),
    Null,
}

impl<'a> From<&Value<'a, String>> for ArgumentValue {
    fn from(value: &Value<'a, String>) -> Self {
        match value {
            Value::Variable(name) => ArgumentValue::Variable(name.clone()),
            Value::Int(number) => ArgumentValue::Int(number.as_i64().unwrap_or_default()),
            Value::Float(number) => ArgumentValue::Float(*number),
            Value::String(string) => ArgumentValue::String(string.clone()),
            Value::Boolean(boolean) => ArgumentValue::Boolean(*boolean),
            Value::Null => ArgumentValue::Null,
            Value::Enum(name) => ArgumentValue::Enum(name.clone()),
            Value::List(items) => ArgumentValue::List(items.iter().map(Into::into).collect()),
            Value::Object(fields) => ArgumentValue::Object(
                fields
                    .iter()
                    .map(|(key, item)| (key.clone(), item.into()))
                    .collect(),
            ),
        }
    }
}

/// Prints a value in its canonical form: variables as `$name`, strings JSON-escaped,
/// object keys sorted.
pub fn print_value(value: &Value<'_, String>) -> String {
    match value {
        Value::Variable(name) => format!("${}", name),
        Value::Int(number) => number.as_i64().unwrap_or_default().to_string(),
        Value::Float(number) => format!("{:?}", number),
        Value::String(string) => print_string(string),
        Value::Boolean(boolean) => boolean.to_string(),
        Value::Null => "null".to_string(),
        Value::Enum(name) => name.clone(),
        Value::List(items) => format!(
            "[{}]",
            items.iter().map(print_value).collect::<Vec<_>>().join(", ")
        ),
        Value::Object(fields) => format!(
            "{{{}}}",
            fields
                .iter()
                .map(|(key, item)| format!("{}: {}", key, print_value(item)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn print_string(string: &str) -> String {
    serde_json::to_string(string).unwrap_or_else(|_| format!("\"{}\"", string))
}

/// Converts a literal into JSON, used for variable defaults and `@with` values.
pub fn value_to_json(value: &Value<'_, String>) -> serde_json::Value {
    match value {
        Value::Variable(name) => serde_json::Value::String(format!("${}", name)),
        Value::Int(number) => serde_json::Value::from(number.as_i64().unwrap_or_default()),
        Value::Float(number) => serde_json::Number::from_f64(*number)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(string) => serde_json::Value::String(string.clone()),
        Value::Boolean(boolean) => serde_json::Value::Bool(*boolean),
        Value::Null => serde_json::Value::Null,
        Value::Enum(name) => serde_json::Value::String(name.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Object(fields) => serde_json::Value::Object(
            fields
                .iter()
                .map(|(key, item)| (key.clone(), value_to_json(item)))
                .collect(),
        ),
    }
}

/// Replaces every variable found in `scope`.
///
/// Returns `None` when the value itself is a variable missing from the scope, the caller drops the
/// argument in that case. Missing variables nested in lists or objects become `null`.
pub fn substitute_variables<'a>(
    value: &Value<'a, String>,
    scope: &BTreeMap<String, Value<'a, String>>,
) -> Option<Value<'a, String>> {
    match value {
        Value::Variable(name) => scope.get(name).cloned(),
        Value::List(items) => Some(Value::List(
            items
                .iter()
                .map(|item| substitute_variables(item, scope).unwrap_or(Value::Null))
                .collect(),
        )),
        Value::Object(fields) => Some(Value::Object(
            fields
                .iter()
                .map(|(key, item)| {
                    (
                        key.clone(),
                        substitute_variables(item, scope).unwrap_or(Value::Null),
                    )
                })
                .collect(),
        )),
        Value::Int(_)
        | Value::Float(_)
        | Value::String(_)
        | Value::Boolean(_)
        | Value::Null
        | Value::Enum(_) => Some(value.clone()),
    }
}

pub fn value_as_str<'v>(value: &'v Value<'_, String>) -> Option<&'v str> {
    match value {
        Value::String(string) => Some(string.as_str()),
        Value::Enum(name) => Some(name.as_str()),
        _ => None,
    }
}

pub fn value_as_bool(value: &Value<'_, String>) -> Option<bool> {
    match value {
        Value::Boolean(boolean) => Some(*boolean),
        _ => None,
    }
}

pub fn value_as_i64(value: &Value<'_, String>) -> Option<i64> {
    match value {
        Value::Int(number) => number.as_i64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use graphql_parser::query::{Definition, Selection};

    use super::*;
    use crate::utils::ast::OperationDefinitionExt;
    use crate::utils::parsing::parse_document;

    fn first_field_arguments(source: &str) -> Vec<(String, Value<'static, String>)> {
        let document = parse_document(source);
        match &document.definitions[0] {
            Definition::Operation(operation) => match &operation.selection_set().items[0] {
                Selection::Field(field) => field.arguments.clone(),
                _ => panic!("expected a field"),
            },
            _ => panic!("expected an operation"),
        }
    }

    #[test]
    fn prints_canonical_values() {
        let arguments = first_field_arguments(
            r#"{ users(filter: { name: "a\"b", age: 3 }, ids: [1, 2], after: $cursor, order: ASC, exact: true, none: null, ratio: 1.5) }"#,
        );
        let printed: Vec<String> = arguments
            .iter()
            .map(|(name, value)| format!("{}: {}", name, print_value(value)))
            .collect();

        assert_eq!(
            printed,
            vec![
                r#"filter: {age: 3, name: "a\"b"}"#,
                "ids: [1, 2]",
                "after: $cursor",
                "order: ASC",
                "exact: true",
                "none: null",
                "ratio: 1.5",
            ]
        );
    }

    #[test]
    fn substitution_drops_unset_top_level_variables() {
        let arguments = first_field_arguments(r#"{ users(first: $first, filter: [$name]) }"#);
        let mut scope = BTreeMap::new();
        scope.insert(
            "first".to_string(),
            first_field_arguments("{ f(x: 10) }")[0].1.clone(),
        );

        assert_eq!(
            substitute_variables(&arguments[0].1, &scope).map(|v| print_value(&v)),
            Some("10".to_string())
        );
        assert_eq!(
            substitute_variables(&arguments[1].1, &scope).map(|v| print_value(&v)),
            Some("[null]".to_string())
        );
        assert_eq!(
            substitute_variables(&Value::Variable("missing".to_string()), &scope),
            None
        );
    }

    #[test]
    fn argument_values_serialize_with_kind() {
        let arguments = first_field_arguments(r#"{ f(a: "x", b: $v) }"#);
        let values: Vec<ArgumentValue> = arguments.iter().map(|(_, v)| v.into()).collect();

        assert_eq!(
            serde_json::to_string(&values).unwrap(),
            r#"[{"kind":"String","value":"x"},{"kind":"Variable","value":"v"}]"#
        );
    }
}
