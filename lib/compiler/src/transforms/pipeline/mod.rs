mod add_key_fields;
mod add_typename;
mod compose_fragments;
mod expand_component_fields;
mod fragment_arguments;
mod list_fragments;
mod paginate;

pub use add_key_fields::add_key_fields;
pub use add_typename::add_typename;
pub use compose_fragments::compose_fragments;
pub use expand_component_fields::expand_component_fields;
pub use fragment_arguments::{argument_declarations, fragment_arguments, ArgumentDeclaration};
pub use list_fragments::{list_fragments, list_name};
pub use paginate::{is_pagination_argument, paginate, paginate_mode};
