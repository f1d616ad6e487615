pub mod ast;
pub mod parsing;
pub mod value;
