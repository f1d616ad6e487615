mod artifacts;
mod output;
mod selection;
pub mod testkit;
