//! Document rewrites applied between validation and selection compilation.
//!
//! Every step runs over the whole document set before the next one starts, since later steps
//! depend on what earlier ones generated: the list fragments must exist before fragments are
//! composed, and key fields are only injected once every fragment is in place.

pub mod context;
pub mod fold;
pub mod pipeline;
pub mod registry;

use tracing::{debug, instrument};

use crate::error::CompilerErrors;
use context::TransformContext;

type TransformStep = fn(&mut TransformContext) -> Result<(), CompilerErrors>;

const STEPS: [(&str, TransformStep); 7] = [
    ("list_fragments", pipeline::list_fragments),
    ("expand_component_fields", pipeline::expand_component_fields),
    ("paginate", pipeline::paginate),
    ("fragment_arguments", pipeline::fragment_arguments),
    ("compose_fragments", pipeline::compose_fragments),
    ("add_key_fields", pipeline::add_key_fields),
    ("add_typename", pipeline::add_typename),
];

#[instrument(level = "trace", skip_all)]
pub fn run_transforms(ctx: &mut TransformContext) -> Result<(), CompilerErrors> {
    for (name, step) in STEPS {
        debug!(step = name, documents = ctx.documents.len(), "running transform");
        step(ctx)?;
    }

    Ok(())
}
