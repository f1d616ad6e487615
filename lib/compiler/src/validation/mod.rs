//! Read-only checks over the collected documents.
//!
//! Rules never stop at the first problem: every violation is pushed to the context and the whole
//! batch is reported at once.

pub mod rules;

use hive_compiler_config::CompilerConfig;
use tracing::{debug, instrument};

use crate::documents::Document;
use crate::error::{CompilerError, CompilerErrors};
use crate::schema::SchemaState;
use rules::{ComponentFields, ListDirectives, NoKeyAlias, PrependAppend};

pub struct ValidationContext<'a> {
    pub config: &'a CompilerConfig,
    pub schema: &'a SchemaState,
    pub documents: &'a [Document],
    errors: CompilerErrors,
}

impl<'a> ValidationContext<'a> {
    pub fn new(config: &'a CompilerConfig, schema: &'a SchemaState, documents: &'a [Document]) -> Self {
        Self {
            config,
            schema,
            documents,
            errors: CompilerErrors::new(),
        }
    }

    pub fn report_error(&mut self, error: CompilerError) {
        self.errors.push(error);
    }

    pub fn into_errors(self) -> CompilerErrors {
        self.errors
    }
}

pub trait ValidationRule {
    fn error_code<'a>(&self) -> &'a str;
    fn validate(&self, ctx: &mut ValidationContext<'_>);
}

pub struct ValidationPlan {
    pub rules: Vec<Box<dyn ValidationRule>>,
}

impl From<Vec<Box<dyn ValidationRule>>> for ValidationPlan {
    fn from(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }
}

impl ValidationPlan {
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn validate(&self, ctx: &mut ValidationContext<'_>) {
        for rule in &self.rules {
            let before = ctx.errors.len();
            rule.validate(ctx);
            debug!(
                rule = rule.error_code(),
                errors = ctx.errors.len() - before,
                "validation rule done"
            );
        }
    }
}

pub fn default_rules_validation_plan() -> ValidationPlan {
    let rules: Vec<Box<dyn ValidationRule>> = vec![
        Box::new(NoKeyAlias),
        Box::new(ComponentFields),
        Box::new(ListDirectives),
        Box::new(PrependAppend),
    ];

    ValidationPlan::from(rules)
}

/// Runs the default rules. Document and fragment name uniqueness is enforced by the collector.
#[instrument(level = "trace", skip_all)]
pub fn validate_documents(
    config: &CompilerConfig,
    schema: &SchemaState,
    documents: &[Document],
) -> Result<(), CompilerErrors> {
    let mut ctx = ValidationContext::new(config, schema, documents);
    default_rules_validation_plan().validate(&mut ctx);
    ctx.into_errors().into_result(())
}
