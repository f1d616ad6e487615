mod component_fields;
mod lists;
mod no_key_alias;
mod prepend_append;
pub mod unique_document_names;

pub use component_fields::ComponentFields;
pub use lists::ListDirectives;
pub use no_key_alias::NoKeyAlias;
pub use prepend_append::PrependAppend;
