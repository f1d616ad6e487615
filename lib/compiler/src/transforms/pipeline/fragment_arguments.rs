use std::collections::{BTreeMap, HashMap};

use graphql_parser::query::{
    Definition, Directive, FragmentDefinition, FragmentSpread, Selection, SelectionSet, Type,
    Value,
};
use tracing::{instrument, trace};
use xxhash_rust::xxh3::xxh3_64;

use crate::directives;
use crate::error::{CompilerError, CompilerErrors};
use crate::schema::SchemaState;
use crate::transforms::context::{definition_root_type, TransformContext};
use crate::transforms::fold::{fold_definition, OwnedSelection, SelectionFolder};
use crate::transforms::registry::{FragmentRegistry, FragmentVariant};
use crate::utils::ast::{
    collect_selection_variables, empty_selection_set, find_directive, fragment_type_condition,
    parse_type, TypeExt,
};
use crate::utils::value::{print_value, substitute_variables, value_as_str};

/// An argument declared by a fragment's `@arguments` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDeclaration {
    pub name: String,
    pub value_type: Type<'static, String>,
    pub default_value: Option<Value<'static, String>>,
}

/// Reads `@arguments(name: {type: "Int", default: 10})`. `None` when the fragment has no arguments.
pub fn argument_declarations(
    fragment: &FragmentDefinition<'static, String>,
) -> Result<Option<Vec<ArgumentDeclaration>>, CompilerError> {
    let Some(directive) = find_directive(&fragment.directives, directives::ARGUMENTS) else {
        return Ok(None);
    };

    directive
        .arguments
        .iter()
        .map(|(name, value)| {
            let invalid = || {
                CompilerError::structural(format!(
                    "Invalid declaration of the argument {} of fragment {}",
                    name, fragment.name
                ))
                .with_description("expected {type: \"<Type>\", default: <value>}")
            };
            let Value::Object(declaration) = value else {
                return Err(invalid());
            };
            let value_type = declaration
                .get(directives::ARGUMENT_TYPE_KEY)
                .and_then(value_as_str)
                .and_then(parse_type)
                .ok_or_else(invalid)?;

            Ok(ArgumentDeclaration {
                name: name.clone(),
                value_type,
                default_value: declaration.get(directives::ARGUMENT_DEFAULT_KEY).cloned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// The name of the fragment clone specialized for the given arguments.
///
/// Equal argument sets always produce the same name, whatever the order they were passed in.
pub fn variant_name(fragment: &str, arguments: &BTreeMap<String, Value<'static, String>>) -> String {
    let canonical = arguments
        .iter()
        .map(|(name, value)| format!("{}:{}", name, print_value(value)))
        .collect::<Vec<_>>()
        .join(",");

    format!("{}_{:08x}", fragment, xxh3_64(canonical.as_bytes()) as u32)
}

/// Specializes every spread of a fragment declaring `@arguments`.
///
/// Each distinct set of resolved arguments gets its own clone of the fragment, with the values
/// substituted in its body, and the spread is renamed to point at the clone.
#[instrument(level = "trace", skip_all)]
pub fn fragment_arguments(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    let mut fragments: HashMap<String, FragmentDefinition<'static, String>> = HashMap::new();
    for document in ctx.documents.iter() {
        for definition in &document.document.definitions {
            if let Definition::Fragment(fragment) = definition {
                fragments.insert(fragment.name.clone(), fragment.clone());
            }
        }
    }
    for fragment in ctx.registry.generated_fragments() {
        fragments
            .entry(fragment.name.clone())
            .or_insert_with(|| fragment.clone());
    }

    let mut errors = CompilerErrors::new();
    let mut folder = ArgumentsFolder {
        schema: ctx.schema,
        fragments: &fragments,
        registry: &mut *ctx.registry,
        in_progress: Vec::new(),
    };

    for document in ctx.documents.iter_mut() {
        for definition in document.document.definitions.iter_mut() {
            let Some(root_type) = definition_root_type(ctx.schema, document.kind, definition)
                .map(str::to_string)
            else {
                continue;
            };
            if let Err(error) = fold_definition(&mut folder, &root_type, definition) {
                errors.push(error.or_filepath(&document.filepath));
            }
        }
    }

    errors.into_result(())
}

struct ArgumentsFolder<'a> {
    schema: &'a SchemaState,
    fragments: &'a HashMap<String, FragmentDefinition<'static, String>>,
    registry: &'a mut FragmentRegistry,
    /// Clones being built, a fragment spreading itself with the same arguments ends here.
    in_progress: Vec<String>,
}

impl SelectionFolder for ArgumentsFolder<'_> {
    type Error = CompilerError;

    fn schema(&self) -> &SchemaState {
        self.schema
    }

    fn fold_fragment_spread(
        &mut self,
        _parent_type: &str,
        spread: FragmentSpread<'static, String>,
    ) -> Result<Vec<OwnedSelection>, CompilerError> {
        Ok(vec![Selection::FragmentSpread(self.resolve_spread(spread)?)])
    }
}

impl ArgumentsFolder<'_> {
    fn resolve_spread(
        &mut self,
        mut spread: FragmentSpread<'static, String>,
    ) -> Result<FragmentSpread<'static, String>, CompilerError> {
        let fragments = self.fragments;
        let Some(fragment) = fragments.get(&spread.fragment_name) else {
            return Ok(spread);
        };

        let passed = find_directive(&spread.directives, directives::WITH)
            .map(|with| with.arguments.clone())
            .unwrap_or_default();
        let declarations = argument_declarations(fragment)?;

        let undeclared = passed.iter().find(|(name, _)| {
            !declarations
                .iter()
                .flatten()
                .any(|declaration| &declaration.name == name)
        });
        if let Some((name, _)) = undeclared {
            return Err(CompilerError::structural(format!(
                "Fragment {} does not declare the argument {}",
                fragment.name, name
            )));
        }

        let Some(declarations) = declarations else {
            return Ok(spread);
        };

        let mut arguments = BTreeMap::new();
        for declaration in &declarations {
            let value = passed
                .iter()
                .find(|(name, _)| name == &declaration.name)
                .map(|(_, value)| value.clone())
                .or_else(|| declaration.default_value.clone());

            match value {
                Some(value) => {
                    arguments.insert(declaration.name.clone(), value);
                }
                None if declaration.value_type.is_non_null() => {
                    return Err(CompilerError::structural(format!(
                        "Fragment {} requires the argument {}",
                        fragment.name, declaration.name
                    ))
                    .with_description(format!(
                        "the argument is declared as {} and has no default value",
                        declaration.value_type.print()
                    )));
                }
                None => {}
            }
        }

        let name = variant_name(&fragment.name, &arguments);
        if !self.registry.is_generated(&name) && !self.in_progress.contains(&name) {
            trace!(fragment = %fragment.name, variant = %name, "specializing fragment");

            self.in_progress.push(name.clone());
            let variant = self.instantiate(fragment, &name, &declarations, &arguments);
            self.in_progress.pop();

            self.registry.add_generated(variant?);
            self.registry.add_variant(
                name.clone(),
                FragmentVariant {
                    fragment: fragment.name.clone(),
                    arguments: arguments.clone(),
                },
            );
        }

        spread.fragment_name = name;
        spread
            .directives
            .retain(|directive| directive.name != directives::WITH);
        if !arguments.is_empty() {
            spread.directives.push(Directive {
                position: spread.position,
                name: directives::WITH.to_string(),
                arguments: arguments.into_iter().collect(),
            });
        }

        Ok(spread)
    }

    fn instantiate(
        &mut self,
        fragment: &FragmentDefinition<'static, String>,
        name: &str,
        declarations: &[ArgumentDeclaration],
        arguments: &BTreeMap<String, Value<'static, String>>,
    ) -> Result<FragmentDefinition<'static, String>, CompilerError> {
        let mut variant = fragment.clone();
        variant.name = name.to_string();
        variant
            .directives
            .retain(|directive| directive.name != directives::ARGUMENTS);

        // Variables the fragment does not declare belong to the operation and stay untouched.
        let mut scope = arguments.clone();
        let mut referenced = Vec::new();
        collect_selection_variables(&variant.selection_set, &|_| true, &mut referenced);
        for variable in referenced {
            if !declarations.iter().any(|declaration| declaration.name == variable) {
                scope
                    .entry(variable.clone())
                    .or_insert(Value::Variable(variable));
            }
        }
        substitute_selection_set(&mut variant.selection_set, &scope);

        let root_type = fragment_type_condition(&variant).to_string();
        let selection_set = std::mem::replace(&mut variant.selection_set, empty_selection_set());
        variant.selection_set = self.fold_selection_set(&root_type, selection_set)?;

        Ok(variant)
    }
}

fn substitute_selection_set(
    selection_set: &mut SelectionSet<'static, String>,
    scope: &BTreeMap<String, Value<'static, String>>,
) {
    for item in selection_set.items.iter_mut() {
        match item {
            Selection::Field(field) => {
                substitute_arguments(&mut field.arguments, scope);
                substitute_directives(&mut field.directives, scope);
                substitute_selection_set(&mut field.selection_set, scope);
            }
            Selection::InlineFragment(inline) => {
                substitute_directives(&mut inline.directives, scope);
                substitute_selection_set(&mut inline.selection_set, scope);
            }
            Selection::FragmentSpread(spread) => {
                substitute_directives(&mut spread.directives, scope);
            }
        }
    }
}

const CONDITIONAL_DIRECTIVES: [&str; 2] = ["include", "skip"];

/// An `@include` or `@skip` whose `if` lost its value is removed, the selection is unconditional.
fn substitute_directives(
    directives: &mut Vec<Directive<'static, String>>,
    scope: &BTreeMap<String, Value<'static, String>>,
) {
    for directive in directives.iter_mut() {
        substitute_arguments(&mut directive.arguments, scope);
    }
    directives.retain(|directive| {
        !CONDITIONAL_DIRECTIVES.contains(&directive.name.as_str())
            || directive.arguments.iter().any(|(name, _)| name == "if")
    });
}

/// Arguments bound to a variable without a value are dropped.
fn substitute_arguments(
    arguments: &mut Vec<(String, Value<'static, String>)>,
    scope: &BTreeMap<String, Value<'static, String>>,
) {
    *arguments = std::mem::take(arguments)
        .into_iter()
        .filter_map(|(name, value)| {
            substitute_variables(&value, scope).map(|value| (name, value))
        })
        .collect();
}
